//! Preset list parser.
//!
//! `List Presets` answers with a single header line naming every stored
//! preset, quoted when a name carries whitespace:
//!
//! ```text
//! Presets Clean "Big Lead" Ambient
//! Ok
//! ```

use crate::constants::{ACK_LINE, PRESETS_HEADER};
use crate::protocol::decode_line;

/// Preset names from the raw text of a `List Presets` response, in device
/// order.
pub fn parse_presets(raw: &str) -> Vec<String> {
    raw.lines()
        .flat_map(decode_line)
        .filter(|token| token != PRESETS_HEADER && token != ACK_LINE)
        .collect()
}
