#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unexpected end of data")]
    UnexpectedEof,

    #[error("invalid message: {0}")]
    InvalidMessage(String),

    #[error("unknown player id: {0}")]
    UnknownPlayer(u8),

    #[error("message length mismatch: declared {declared}, consumed {consumed}")]
    LengthMismatch { declared: usize, consumed: usize },

    #[error("incomplete round: {missing} never observed")]
    IncompleteRound { missing: &'static str },

    #[error("malformed statistics document: {0}")]
    MalformedStats(String),

    #[error("io error: {0}")]
    Io(String),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
