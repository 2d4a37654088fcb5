//! Conversion errors.

/// Failure of a whole conversion.
///
/// Malformed lesson syntax never fails a conversion; it degrades to plain
/// text and is reported through warnings instead.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("input is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
}
