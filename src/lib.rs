mod sys;
mod params;
mod config;
mod command;
mod sample;
mod session;

#[derive(Debug)]
pub enum Error {
    /// The link to the board failed.
    Transport(std::io::Error),
    /// The board stopped sending before the announced amount of data arrived.
    Timeout { expected: usize, received: usize },
    /// The sample stream does not hold the announced number of words.
    ProtocolLengthMismatch { expected: usize, actual: usize },
    UnimplementedCategory(Category),
    /// An acquisition was configured with a category that is not `ADC`.
    NotAnAcquisition(Category),
    /// The sample count or channel count cannot describe a stream from the board.
    InvalidPlan { total_samples: usize, channel_count: usize },
    InvalidText(String),
    InvalidState { operation: &'static str, state: State },
    Other(Box<dyn std::error::Error + Sync + Send + 'static>),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Transport(io_error) =>
                write!(f, "transport I/O error: {}", io_error),
            Self::Timeout { expected, received } =>
                write!(f, "timed out after receiving {} of {} bytes", received, expected),
            Self::ProtocolLengthMismatch { expected, actual } =>
                write!(f, "sample stream out of step: expected {} bytes, got {}", expected, actual),
            Self::UnimplementedCategory(category) =>
                write!(f, "category {} is not supported", category),
            Self::NotAnAcquisition(category) =>
                write!(f, "category {} does not take acquisition parameters", category),
            Self::InvalidPlan { total_samples, channel_count } =>
                write!(f, "cannot decode {} samples over {} channels", total_samples, channel_count),
            Self::InvalidText(text) =>
                write!(f, "text {:?} must be non-empty and contain no whitespace", text),
            Self::InvalidState { operation, state } =>
                write!(f, "cannot {} while the session is {:?}", operation, state),
            Self::Other(error) =>
                write!(f, "{}", error),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            &Self::Transport(ref io_error) => Some(io_error),
            &Self::Other(ref error) => Some(error.as_ref()),
            _ => None
        }
    }
}

impl From<Error> for std::io::Error {
    fn from(error: Error) -> Self {
        match error {
            Error::Transport(io_error) =>
                io_error,
            Error::Timeout { .. } =>
                Self::new(io::ErrorKind::TimedOut, error),
            Error::ProtocolLengthMismatch { .. } | Error::InvalidText(_) =>
                Self::new(io::ErrorKind::InvalidData, error),
            Error::UnimplementedCategory(_) =>
                Self::new(io::ErrorKind::Unsupported, error),
            Error::NotAnAcquisition(_) | Error::InvalidPlan { .. } =>
                Self::new(io::ErrorKind::InvalidInput, error),
            Error::InvalidState { .. } =>
                Self::new(io::ErrorKind::Other, error),
            Error::Other(error) => {
                match error.downcast::<std::io::Error>() {
                    Ok(error) => *error,
                    Err(error) => std::io::Error::new(io::ErrorKind::Other, error)
                }
            }
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        // errors that went through `From<Error> for io::Error` come back unchanged
        match error.downcast::<Self>() {
            Ok(error) => error,
            Err(error) => Error::Transport(error),
        }
    }
}

#[cfg(feature = "hardware")]
impl From<serialport::Error> for Error {
    fn from(error: serialport::Error) -> Self {
        Error::Transport(error.into())
    }
}

pub type Result<T> =
    core::result::Result<T, Error>;

use std::io;

pub use params::{
    Bounds,
    ClampNotice,
    Caps,
    TriggerEdge,
    Category,
    clamp,
    CHANNEL_COUNT,
    SAMPLES_PER_CHANNEL,
    SAMPLE_RATE_PER_CHANNEL,
    TRIGGER_ENABLED,
    TRIGGER_EDGE,
    DEBOUNCE_MICROSECONDS,
};

pub use config::{
    Configuration,
    AdcParameters,
    Finalized,
};

pub use command::{
    Command,
    LINE_TERMINATOR,
};

pub use sample::{
    SampleWord,
    ChannelMask,
    ChannelBuffers,
    demultiplex,
    CHANNEL_SLOTS,
};

pub use session::{
    AcquisitionPlan,
    State,
    Session,
    Acquisition,
};

pub use sys::Transport;

#[cfg(feature = "hardware")]
pub use sys::serial::{
    SerialTransport,
    DEFAULT_BAUD_RATE,
    DEFAULT_TIMEOUT,
};
