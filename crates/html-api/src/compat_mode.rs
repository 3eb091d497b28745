/// Document compatibility mode, as determined by the DOCTYPE.
///
/// @see https://developer.mozilla.org/en-US/docs/Web/HTML/Quirks_Mode_and_Standards_Mode
#[derive(Debug, PartialEq, Eq, Default, Clone, Copy)]
pub enum CompatMode {
    /// > In no-quirks mode, the behavior is (hopefully) the desired behavior
    /// > described by the modern HTML and CSS specifications.
    #[default]
    NoQuirks,

    /// > In quirks mode, layout emulates behavior in Navigator 4 and Internet
    /// > Explorer 5.
    ///
    /// Class names match ASCII case-insensitively and a P element is not
    /// implicitly closed by an opening TABLE.
    Quirks,

    /// Only a handful of layout quirks apply; parsing behaves as no-quirks.
    LimitedQuirks,
}

impl From<&CompatMode> for &str {
    fn from(val: &CompatMode) -> Self {
        match val {
            CompatMode::NoQuirks => "no-quirks",
            CompatMode::Quirks => "quirks",
            CompatMode::LimitedQuirks => "limited-quirks",
        }
    }
}

impl std::fmt::Display for CompatMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.into())
    }
}
