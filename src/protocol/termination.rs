//! Response termination policies.
//!
//! The device has no length prefix. A response ends either at the first bare
//! `Ok` line, or, for dumps, at the first `Ok` that follows the dump's
//! phase-end marker. Dump payloads may legitimately contain a bare `Ok`
//! before the marker, so those must not end the exchange.
//!
//! ```text
//! Dump Config            Dump Program          SetParam ...
//!   PluginConfig ...       SetPreset ...         Ok   <- done
//!   Ok        <- payload   SetChain ...
//!   EndConfig              EndProgram
//!   Ok        <- done      Ok   <- done
//! ```

use crate::constants::ACK_LINE;

/// Mutable per-exchange state handed to the stop predicate.
///
/// Lives only for one read loop.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TerminationState {
    /// The operation's phase-end marker has been seen.
    pub seen_phase_marker: bool,
    /// Last non-empty trimmed line, kept for diagnostics.
    pub last_line: String,
}

/// How an operation recognizes the end of its response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Stop at the first bare acknowledgment line.
    Ack,
    /// Stop at the first acknowledgment line after the given phase marker.
    AfterMarker(&'static str),
}

impl Termination {
    /// Feed one trimmed line; returns `true` when the response is complete.
    pub fn is_complete(self, line: &str, state: &mut TerminationState) -> bool {
        match self {
            Self::Ack => line == ACK_LINE,
            Self::AfterMarker(marker) => {
                if line == marker {
                    state.seen_phase_marker = true;
                    return false;
                }
                state.seen_phase_marker && line == ACK_LINE
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{END_CONFIG, END_PROGRAM};

    fn first_stop(termination: Termination, lines: &[&str]) -> Option<usize> {
        let mut state = TerminationState::default();
        lines
            .iter()
            .position(|line| termination.is_complete(line, &mut state))
    }

    #[test]
    fn test_ack_stops_at_first_ok() {
        assert_eq!(first_stop(Termination::Ack, &["Presets A B", "Ok", "Ok"]), Some(1));
    }

    #[test]
    fn test_ack_ignores_ok_substrings() {
        assert_eq!(first_stop(Termination::Ack, &["Okay", "Ok fine", "NotOk"]), None);
    }

    #[test]
    fn test_marker_skips_early_ok() {
        let lines = ["PluginConfig Amp", "Ok", "EndConfig", "Ok"];
        assert_eq!(first_stop(Termination::AfterMarker(END_CONFIG), &lines), Some(3));
    }

    #[test]
    fn test_marker_without_ok_never_completes() {
        let lines = ["SetPreset Clean", "EndProgram"];
        assert_eq!(first_stop(Termination::AfterMarker(END_PROGRAM), &lines), None);
    }

    #[test]
    fn test_wrong_marker_does_not_arm() {
        let lines = ["EndConfig", "Ok"];
        assert_eq!(first_stop(Termination::AfterMarker(END_PROGRAM), &lines), None);
    }

    #[test]
    fn test_marker_sets_state() {
        let mut state = TerminationState::default();
        assert!(!Termination::AfterMarker(END_CONFIG).is_complete("EndConfig", &mut state));
        assert!(state.seen_phase_marker);
    }
}
