pub type SeqResult<T> = Result<T, SeqError>;

/// Outcome of `open`/`render` for expected, caller-recoverable conditions.
///
/// Missing files, missing directories and unrecognized extensions are
/// normal runtime conditions and are reported here rather than through
/// [`SeqError`], which is reserved for misuse and environment failures.
#[must_use]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeqStatus {
    Success,
    BadPath,
    UnsupportedExtension,
}

impl SeqStatus {
    pub fn is_success(self) -> bool {
        self == Self::Success
    }
}

#[derive(thiserror::Error, Debug)]
pub enum SeqError {
    #[error("template error: {0}")]
    Template(String),

    #[error("buffer error: {0}")]
    Buffer(String),

    #[error("usage error: {0}")]
    Usage(String),

    #[error("media error: {0}")]
    Media(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SeqError {
    pub fn template(msg: impl Into<String>) -> Self {
        Self::Template(msg.into())
    }

    pub fn buffer(msg: impl Into<String>) -> Self {
        Self::Buffer(msg.into())
    }

    pub fn usage(msg: impl Into<String>) -> Self {
        Self::Usage(msg.into())
    }

    pub fn media(msg: impl Into<String>) -> Self {
        Self::Media(msg.into())
    }
}
