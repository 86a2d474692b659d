//! Request framing for the case conversion service.
//!
//! One exchange per connection:
//!
//! ```text
//! Request:  <mode>|<message>      mode is one of upper, lower, none
//! Response: <converted message>   raw bytes, no mode, no separator
//!
//! Example:
//! Request:  upper|hello
//! Response: HELLO
//! ```
//!
//! There is no length prefix. The server takes whatever a single read
//! returns (at most `buffer_size - 1` bytes) as the whole request, and a
//! NUL byte inside those bytes terminates the frame early.

pub mod exchange;

pub use exchange::{read_frame, read_request, write_all, ExchangeError};

use bytes::BytesMut;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

/// Separator between the mode and the message.
pub const SEPARATOR: u8 = b'|';

/// Case conversion applied to the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConversionMode {
    Upper,
    Lower,
    /// Leave the message untouched.
    #[default]
    None,
}

impl ConversionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upper => "upper",
            Self::Lower => "lower",
            Self::None => "none",
        }
    }

    /// Match a raw mode token exactly (case-sensitive).
    pub fn from_token(token: &[u8]) -> Option<Self> {
        match token {
            b"upper" => Some(Self::Upper),
            b"lower" => Some(Self::Lower),
            b"none" => Some(Self::None),
            _ => None,
        }
    }
}

impl fmt::Display for ConversionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("conversion type can only be upper, lower, or none (got '{0}')")]
pub struct UnknownMode(pub String);

impl FromStr for ConversionMode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_token(s.as_bytes()).ok_or_else(|| UnknownMode(s.to_string()))
    }
}

/// Malformed request frame. Distinct from I/O failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("invalid format, expected <conversion>|<message>: no separator")]
    MissingSeparator,
    #[error("invalid format, expected <conversion>|<message>: empty conversion")]
    MissingMode,
    #[error("invalid format, expected <conversion>|<message>: empty message")]
    MissingMessage,
    #[error("invalid format, expected <conversion>|<message>: more than one separator")]
    ExtraSeparator,
}

/// A parsed request: the conversion to apply and the message it applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub mode: ConversionMode,
    pub message: BytesMut,
}

impl Request {
    /// Parse the bytes captured from a single read.
    ///
    /// The frame must split into exactly two non-empty tokens around one
    /// separator. A mode token that is not recognized leaves the message
    /// unchanged.
    pub fn parse(mut frame: BytesMut) -> Result<Self, FrameError> {
        if let Some(nul) = frame.iter().position(|&b| b == 0) {
            frame.truncate(nul);
        }

        let sep = frame
            .iter()
            .position(|&b| b == SEPARATOR)
            .ok_or(FrameError::MissingSeparator)?;

        let message = frame.split_off(sep + 1);
        frame.truncate(sep);
        let mode_token = frame;

        if mode_token.is_empty() {
            return Err(FrameError::MissingMode);
        }
        if message.is_empty() {
            return Err(FrameError::MissingMessage);
        }
        if message.contains(&SEPARATOR) {
            return Err(FrameError::ExtraSeparator);
        }

        let mode = ConversionMode::from_token(&mode_token).unwrap_or_else(|| {
            debug!(
                mode = %String::from_utf8_lossy(&mode_token),
                "Unrecognized conversion, passing message through"
            );
            ConversionMode::None
        });

        Ok(Request { mode, message })
    }

    /// Format `<mode>|<message>` for the wire.
    pub fn encode(mode: ConversionMode, message: &[u8]) -> BytesMut {
        let mode = mode.as_str().as_bytes();
        let mut frame = BytesMut::with_capacity(mode.len() + 1 + message.len());
        frame.extend_from_slice(mode);
        frame.extend_from_slice(&[SEPARATOR]);
        frame.extend_from_slice(message);
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &[u8]) -> Result<Request, FrameError> {
        Request::parse(BytesMut::from(input))
    }

    #[test]
    fn test_parse_upper() {
        let request = parse(b"upper|hello").unwrap();
        assert_eq!(request.mode, ConversionMode::Upper);
        assert_eq!(&request.message[..], b"hello");
    }

    #[test]
    fn test_parse_keeps_whitespace() {
        let request = parse(b"lower|Hello World\n").unwrap();
        assert_eq!(request.mode, ConversionMode::Lower);
        assert_eq!(&request.message[..], b"Hello World\n");
    }

    #[test]
    fn test_parse_stops_at_nul() {
        let mut padded = b"none|abc".to_vec();
        padded.resize(127, 0);
        let request = parse(&padded).unwrap();
        assert_eq!(request.mode, ConversionMode::None);
        assert_eq!(&request.message[..], b"abc");
    }

    #[test]
    fn test_parse_unknown_mode_passes_through() {
        let request = parse(b"title|hello").unwrap();
        assert_eq!(request.mode, ConversionMode::None);
        assert_eq!(&request.message[..], b"hello");
    }

    #[test]
    fn test_parse_malformed() {
        assert_eq!(parse(b"upperhello"), Err(FrameError::MissingSeparator));
        assert_eq!(parse(b""), Err(FrameError::MissingSeparator));
        assert_eq!(parse(b"|hello"), Err(FrameError::MissingMode));
        assert_eq!(parse(b"upper|"), Err(FrameError::MissingMessage));
        assert_eq!(parse(b"|"), Err(FrameError::MissingMode));
        assert_eq!(parse(b"upper|a|b"), Err(FrameError::ExtraSeparator));
        assert_eq!(parse(b"upper|\0hello"), Err(FrameError::MissingMessage));
    }

    #[test]
    fn test_encode() {
        let frame = Request::encode(ConversionMode::Lower, b"WORLD");
        assert_eq!(&frame[..], b"lower|WORLD");

        let request = Request::parse(frame).unwrap();
        assert_eq!(request.mode, ConversionMode::Lower);
        assert_eq!(&request.message[..], b"WORLD");
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!("upper".parse::<ConversionMode>(), Ok(ConversionMode::Upper));
        assert_eq!("lower".parse::<ConversionMode>(), Ok(ConversionMode::Lower));
        assert_eq!("none".parse::<ConversionMode>(), Ok(ConversionMode::None));
        assert_eq!(
            "UPPER".parse::<ConversionMode>(),
            Err(UnknownMode("UPPER".to_string()))
        );
        assert_eq!(ConversionMode::default(), ConversionMode::None);
    }
}
