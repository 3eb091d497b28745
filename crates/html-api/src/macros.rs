/// Length of the run of bytes matching `$pattern` starting at `$offset`.
///
/// An optional fourth argument bounds the scan to that many bytes.
macro_rules! strspn {
    ($expression:expr, $pattern:pat $(if $guard:expr)?, $offset:expr $(,)?) => {{
        let haystack = &$expression[$offset..];
        haystack
            .iter()
            .position(|&b| !matches!(b, $pattern $(if $guard)?))
            .unwrap_or(haystack.len())
    }};
    ($expression:expr, $pattern:pat $(if $guard:expr)?, $offset:expr, $length:expr $(,)?) => {{
        let haystack = &$expression[$offset..$offset + $length];
        haystack
            .iter()
            .position(|&b| !matches!(b, $pattern $(if $guard)?))
            .unwrap_or(haystack.len())
    }};
}

/// Length of the run of bytes NOT matching `$pattern` starting at `$offset`.
macro_rules! strcspn {
    ($expression:expr, $pattern:pat $(if $guard:expr)?, $offset:expr $(,)?) => {{
        let haystack = &$expression[$offset..];
        haystack
            .iter()
            .position(|&b| matches!(b, $pattern $(if $guard)?))
            .unwrap_or(haystack.len())
    }};
}
