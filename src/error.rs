//! Error taxonomy for device exchanges and dump parsing.
//!
//! Every failure is returned to the immediate caller; nothing here is
//! retried. Variants that interrupt a read keep the text received so far so
//! callers can log or inspect it.

use std::io;

use thiserror::Error;

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, DeviceError>;

/// Errors raised by the command channel, the client façade and the program
/// parser.
#[derive(Error, Debug)]
pub enum DeviceError {
    /// Dial did not succeed within the dial timeout (refused, unreachable,
    /// unresolvable or timed out).
    #[error("connect to {addr} failed: {source}")]
    ConnectFailed {
        /// Address that was dialed.
        addr: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The command could not be fully written.
    #[error("write command failed: {0}")]
    WriteFailed(#[source] io::Error),

    /// The accumulated response exceeded the configured byte cap.
    #[error("response exceeded max size of {limit} bytes")]
    ResponseTooLarge {
        /// Configured cap.
        limit: usize,
        /// Text received before the cap tripped.
        partial: String,
    },

    /// The stream ended before the termination predicate matched.
    #[error("incomplete response (last line={last_line:?})")]
    IncompleteResponse {
        /// Last non-empty trimmed line seen.
        last_line: String,
        /// Everything received before the stream ended.
        partial: String,
    },

    /// The device embedded an error line in an otherwise framed response.
    #[error("{line}")]
    ProtocolError {
        /// The trimmed error line, e.g. `Error unknown plugin`.
        line: String,
    },

    /// A program dump directive had too few tokens.
    #[error("malformed {directive}: {line:?}")]
    MalformedDirective {
        /// Directive keyword.
        directive: &'static str,
        /// The offending trimmed line.
        line: String,
    },

    /// An argument was rejected before anything was sent to the device.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl DeviceError {
    /// Text received before the exchange failed, when the failure kept any.
    pub fn partial_response(&self) -> Option<&str> {
        match self {
            Self::ResponseTooLarge { partial, .. } | Self::IncompleteResponse { partial, .. } => {
                Some(partial)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_error_displays_device_line() {
        let err = DeviceError::ProtocolError {
            line: "Error bad thing".to_string(),
        };
        assert_eq!(err.to_string(), "Error bad thing");
    }

    #[test]
    fn test_incomplete_response_quotes_last_line() {
        let err = DeviceError::IncompleteResponse {
            last_line: "EndConfig".to_string(),
            partial: "PluginConfig Amp\nEndConfig\n".to_string(),
        };
        assert_eq!(err.to_string(), "incomplete response (last line=\"EndConfig\")");
        assert_eq!(err.partial_response(), Some("PluginConfig Amp\nEndConfig\n"));
    }

    #[test]
    fn test_connect_failed_keeps_source() {
        use std::error::Error as _;

        let err = DeviceError::ConnectFailed {
            addr: "127.0.0.1:1".to_string(),
            source: io::Error::new(io::ErrorKind::ConnectionRefused, "refused"),
        };
        assert!(err.source().is_some());
        assert!(err.partial_response().is_none());
    }
}
