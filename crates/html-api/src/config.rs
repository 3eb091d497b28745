/// Limits shared by the Tag Processor and the HTML Processor.
#[derive(Clone, Debug)]
pub struct ProcessorConfig {
    /// How many user bookmarks may exist at once.
    ///
    /// Bookmarks are remapped on every flush of pending edits, so they are
    /// kept few. Node bookmarks held by the HTML Processor are not counted.
    pub max_bookmarks: usize,

    /// How many times `seek()` may be called over the life of a processor.
    pub max_seek_ops: usize,

    /// Pending edits are applied eagerly once more than this many queue up.
    pub max_pending_updates: usize,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            max_bookmarks: 10,
            max_seek_ops: 1000,
            max_pending_updates: 1000,
        }
    }
}
