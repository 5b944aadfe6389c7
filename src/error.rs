//! Error types for construction-time work.
//!
//! Nothing on the performance path returns these: note and step operations
//! are total and report success as `bool`/`Option`. Errors only come out of
//! configuration validation and note-name parsing.

use std::fmt;

/// Error type for parsing note names such as `"C#4"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The input string was empty
    Empty,
    /// The pitch name was invalid or unrecognized
    InvalidPitch(String),
    /// The octave was invalid or out of range
    InvalidOctave(String),
    /// The name resolves to a pitch outside 0-127
    OutOfRange(i16),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Empty => write!(f, "input string is empty"),
            ParseError::InvalidPitch(s) => write!(f, "invalid pitch name: '{}'", s),
            ParseError::InvalidOctave(s) => write!(f, "invalid octave: '{}'", s),
            ParseError::OutOfRange(n) => write!(f, "pitch {} is outside the MIDI range", n),
        }
    }
}

impl std::error::Error for ParseError {}

/// Error type for rejected [`SynthConfig`](crate::SynthConfig) values.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Sample rate of zero
    ZeroSampleRate,
    /// A clock length that is zero, negative or not finite
    InvalidLength { name: &'static str, seconds: f64 },
    /// More initial steps than the sequencer can hold
    TooManySteps { requested: usize, max: usize },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroSampleRate => write!(f, "sample rate must be greater than 0"),
            ConfigError::InvalidLength { name, seconds } => {
                write!(f, "{} must be a positive number of seconds, got {}", name, seconds)
            }
            ConfigError::TooManySteps { requested, max } => {
                write!(f, "{} initial steps requested, at most {} fit", requested, max)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Crate-level error.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    Parse(ParseError),
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Parse(e) => write!(f, "parse error: {}", e),
            Error::Config(e) => write!(f, "config error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Parse(e) => Some(e),
            Error::Config(e) => Some(e),
        }
    }
}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        Error::Parse(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}
