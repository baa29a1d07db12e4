//! Stompbox wire protocol: token codec and response termination.
//!
//! # Wire Protocol
//!
//! Commands are single UTF-8 lines terminated by CR-LF:
//!
//! ```text
//! <Verb> <token> <token> ...\r\n
//! ```
//!
//! Responses are newline-delimited (CR-LF or LF) and end with a bare `Ok`,
//! or with a phase-end marker (`EndConfig` / `EndProgram`) followed by `Ok`.
//! A line starting with `Error` reports a failure wherever it appears.
//!
//! See [`codec`] for quoting rules and [`termination`] for end detection.

pub mod codec;
pub mod termination;

pub use codec::{command_line, decode_line, encode_token, normalize_command};
pub use termination::{Termination, TerminationState};
