use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to decode {} ({code}): {message}", path.display())]
    Decode {
        path: PathBuf,
        code: &'static str,
        message: String,
    },
    #[error("failed to encode {}: {message}", path.display())]
    Encode { path: PathBuf, message: String },
    #[error(
        "{} is {}x{}, expected {}x{}",
        path.display(),
        found.0,
        found.1,
        expected.0,
        expected.1
    )]
    Dimensions {
        path: PathBuf,
        expected: (u32, u32),
        found: (u32, u32),
    },
    #[error(
        "{} is {}x{}, faces must be square with a power-of-two side of at least {minimum}",
        path.display(),
        found.0,
        found.1
    )]
    FaceSize {
        path: PathBuf,
        minimum: u32,
        found: (u32, u32),
    },
    #[error("{} holds {found} basis images, expected {expected}", folder.display())]
    MissingBasis {
        folder: PathBuf,
        found: usize,
        expected: usize,
    },
    #[error("precondition failed: {0}")]
    Precondition(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

pub(crate) fn precondition<T>(message: impl Into<String>) -> Result<T> {
    Err(Error::Precondition(message.into()))
}
