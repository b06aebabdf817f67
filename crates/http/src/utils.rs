//! Utility macros shared by the codec and handler layers.

/// Returns early with `Err($error)` when `$predicate` does not hold.
///
/// Used for bound checks where an oversized line, body or response must be
/// rejected explicitly rather than truncated.
///
/// # Example
///
/// ```ignore
/// ensure!(length <= max_body, ParseError::too_large_body(length, max_body));
/// ```
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error);
        }
    };
}

pub(crate) use ensure;
