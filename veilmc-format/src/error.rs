//! Codec error types.

/// Errors raised while encoding or decoding disguise data.
///
/// Problems confined to a single stored record are not errors; they are
/// counted in a [`DecodeReport`](crate::DecodeReport) instead.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Gzip stream could not be written or read.
    #[error("compression failed: {0}")]
    Compression(#[source] std::io::Error),

    /// The tag tree could not be (de)serialized.
    #[error("tag encoding failed: {0}")]
    Nbt(#[source] fastnbt::error::Error),

    /// The tag tree parsed but does not have the expected shape.
    #[error("malformed disguise data: {0}")]
    Malformed(String),

    /// A byte stream ended before all fields were read.
    #[error("stream truncated while reading {0}")]
    Truncated(&'static str),

    /// A message is structurally invalid.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// Unrecognized message type tag.
    #[error("unknown message tag {0}")]
    UnknownTag(u8),
}

pub type Result<T> = std::result::Result<T, CodecError>;
