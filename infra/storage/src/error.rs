use std::borrow::Cow;

/// Failures of the storage sandbox. `message` names the offending path or namespace.
#[ksafe_derive::ksafe_error]
pub enum StorageError {
    #[error("No such stored file{}: {message}", format_context(.context))]
    FileNotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The path would resolve outside the storage root.
    #[error("Path escapes the storage root{}: {message}", format_context(.context))]
    PathTraversalAttempt { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Namespace rejected{}: {message}", format_context(.context))]
    InvalidNamespace { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Storage I/O error{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },

    /// Stored bytes are not a valid LZ4 frame, usually a compression setting mismatch.
    #[error("Stored data cannot be decompressed{}: {source}", format_context(.context))]
    Decompress { source: lz4_flex::block::DecompressError, context: Option<Cow<'static, str>> },
}
