//! Command channel to the Stompbox control socket.
//!
//! Each [`CommandChannel::exchange`] dials a fresh TCP connection, writes one
//! command line, and reads lines until the caller's stop predicate accepts
//! one. The connection is dropped on every exit path, so a wedged socket
//! from one call can never affect the next.
//!
//! # Lifecycle
//!
//! ```text
//! exchange(cmd, stop)
//!   ├── dial (dial_timeout)           ── ConnectFailed
//!   ├── write cmd (WRITE_TIMEOUT)     ── WriteFailed
//!   └── loop: read line (read_timeout per read)
//!         ├── append bytes, > max_bytes  ── ResponseTooLarge
//!         ├── stop(trimmed, &mut state)  ── Ok(text)
//!         └── EOF / read error           ── IncompleteResponse
//! ```

use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::constants::{
    DEFAULT_DIAL_TIMEOUT, DEFAULT_MAX_BYTES, DEFAULT_READ_TIMEOUT, WRITE_TIMEOUT,
};
use crate::error::{DeviceError, Result};
use crate::protocol::TerminationState;

/// Connection parameters for one device endpoint.
///
/// Immutable once built; cloning is cheap and every clone dials on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandChannel {
    addr: String,
    dial_timeout: Duration,
    read_timeout: Duration,
    max_bytes: usize,
}

impl CommandChannel {
    /// Channel to `addr` (`host:port`) with default timeouts and size cap.
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            dial_timeout: DEFAULT_DIAL_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            max_bytes: DEFAULT_MAX_BYTES,
        }
    }

    /// Set the dial timeout.
    pub fn with_dial_timeout(mut self, timeout: Duration) -> Self {
        self.dial_timeout = timeout;
        self
    }

    /// Set the per-read deadline. A zero duration disables the deadline.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set the response size cap in bytes.
    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Device address.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Dial timeout.
    pub fn dial_timeout(&self) -> Duration {
        self.dial_timeout
    }

    /// Per-read deadline.
    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    /// Response size cap in bytes.
    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Send `command` and read until `stop` accepts a line.
    ///
    /// `command` must already end in CR-LF. `stop` receives every trimmed
    /// line (including empty ones) together with the exchange's
    /// [`TerminationState`]. Invalid UTF-8 in the response is replaced.
    ///
    /// # Errors
    ///
    /// - [`DeviceError::ConnectFailed`] if the dial fails or times out
    /// - [`DeviceError::WriteFailed`] if the command cannot be written
    /// - [`DeviceError::ResponseTooLarge`] once more than `max_bytes` arrive
    /// - [`DeviceError::IncompleteResponse`] if the stream ends first
    pub fn exchange<F>(&self, command: &str, mut stop: F) -> Result<String>
    where
        F: FnMut(&str, &mut TerminationState) -> bool,
    {
        let stream = self.dial()?;
        log::debug!(
            "[Channel] Sending {:?} to {}",
            command.trim_end(),
            self.addr
        );

        stream
            .set_write_timeout(Some(WRITE_TIMEOUT))
            .map_err(DeviceError::WriteFailed)?;
        (&stream)
            .write_all(command.as_bytes())
            .and_then(|()| (&stream).flush())
            .map_err(DeviceError::WriteFailed)?;

        // SO_RCVTIMEO bounds each read syscall, so the deadline restarts
        // with every read instead of covering the whole response.
        let read_timeout = Some(self.read_timeout).filter(|t| !t.is_zero());
        if let Err(e) = stream.set_read_timeout(read_timeout) {
            log::warn!("[Channel] Could not set read timeout on {}: {e}", self.addr);
        }

        let mut reader = BufReader::new(stream);
        let mut response: Vec<u8> = Vec::new();
        let mut line: Vec<u8> = Vec::new();
        let mut state = TerminationState::default();

        loop {
            line.clear();
            // Never buffer more than one byte past the cap, even for a
            // line that never ends.
            let budget = (self.max_bytes.saturating_sub(response.len()) as u64).saturating_add(1);
            let read = (&mut reader).take(budget).read_until(b'\n', &mut line);

            // Bytes read before an error or EOF still count.
            if !line.is_empty() {
                response.extend_from_slice(&line);
                if response.len() > self.max_bytes {
                    log::warn!(
                        "[Channel] Response from {} exceeded {} bytes",
                        self.addr,
                        self.max_bytes
                    );
                    return Err(DeviceError::ResponseTooLarge {
                        limit: self.max_bytes,
                        partial: lossy(&response),
                    });
                }

                let text = String::from_utf8_lossy(&line);
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    state.last_line = trimmed.to_string();
                }
                if stop(trimmed, &mut state) {
                    log::debug!(
                        "[Channel] Response complete ({} bytes) from {}",
                        response.len(),
                        self.addr
                    );
                    return Ok(lossy(&response));
                }
            }

            match read {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) => {
                    log::debug!("[Channel] Read from {} ended: {e}", self.addr);
                    break;
                }
            }
        }

        log::warn!(
            "[Channel] Incomplete response from {} (last line={:?})",
            self.addr,
            state.last_line
        );
        Err(DeviceError::IncompleteResponse {
            last_line: state.last_line,
            partial: lossy(&response),
        })
    }

    /// Resolve the address and dial each candidate until one connects.
    fn dial(&self) -> Result<TcpStream> {
        let connect_failed = |source: io::Error| DeviceError::ConnectFailed {
            addr: self.addr.clone(),
            source,
        };

        let candidates = self.addr.to_socket_addrs().map_err(connect_failed)?;
        let mut last_err = None;
        for candidate in candidates {
            log::debug!("[Channel] Dialing {candidate}");
            match TcpStream::connect_timeout(&candidate, self.dial_timeout) {
                Ok(stream) => return Ok(stream),
                Err(e) => last_err = Some(e),
            }
        }

        Err(connect_failed(last_err.unwrap_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "address resolved to nothing")
        })))
    }
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
