//! Token codec for the Stompbox line protocol.
//!
//! Commands and dump lines are whitespace-separated tokens. A token that
//! carries whitespace or a double quote travels double-quoted, with `"` and
//! `\` escaped by a backslash:
//!
//! ```text
//! SetParam Delay Mode "ping pong"
//! SetParam Amp Label "he said \"hi\""
//! ```
//!
//! This matches how the device reads arguments (C++ `std::quoted`): inside
//! quotes a backslash takes the next character literally, so encoding and
//! decoding are exact inverses for any token that fits on one line.

use std::borrow::Cow;

use crate::constants::CRLF;

const QUOTE: char = '"';
const ESCAPE: char = '\\';

/// Returns `true` if `token` must be quoted to survive tokenization.
fn needs_quoting(token: &str) -> bool {
    token.chars().any(|c| c == QUOTE || c.is_whitespace())
}

/// Encode one argument token for the wire.
///
/// Tokens without whitespace or quotes pass through unchanged.
pub fn encode_token(token: &str) -> Cow<'_, str> {
    if !needs_quoting(token) {
        return Cow::Borrowed(token);
    }

    let mut out = String::with_capacity(token.len() + 2);
    out.push(QUOTE);
    for c in token.chars() {
        if c == QUOTE || c == ESCAPE {
            out.push(ESCAPE);
        }
        out.push(c);
    }
    out.push(QUOTE);
    Cow::Owned(out)
}

/// Split a line into tokens, honoring double quotes.
///
/// Outside quotes, any unicode whitespace separates tokens. An opening quote
/// ends the token in progress; inside quotes a backslash escapes the next
/// character and an unescaped quote closes the token. Empty tokens are
/// dropped. An unterminated quote runs to the end of the line.
pub fn decode_line(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quote = false;
    let mut escaped = false;

    for c in line.chars() {
        if escaped {
            current.push(c);
            escaped = false;
            continue;
        }
        if in_quote && c == ESCAPE {
            escaped = true;
            continue;
        }
        if c == QUOTE {
            flush(&mut tokens, &mut current);
            in_quote = !in_quote;
            continue;
        }
        if !in_quote && c.is_whitespace() {
            flush(&mut tokens, &mut current);
            continue;
        }
        current.push(c);
    }
    flush(&mut tokens, &mut current);

    tokens
}

fn flush(tokens: &mut Vec<String>, current: &mut String) {
    if !current.is_empty() {
        tokens.push(std::mem::take(current));
    }
}

/// Build a CR-LF terminated command line from a verb and argument tokens.
///
/// Each argument is passed through [`encode_token`].
pub fn command_line<S: AsRef<str>>(verb: &str, args: &[S]) -> String {
    let mut line = String::from(verb);
    for arg in args {
        line.push(' ');
        line.push_str(&encode_token(arg.as_ref()));
    }
    line.push_str(CRLF);
    line
}

/// Trim a free-form command and make sure it ends with CR-LF.
pub fn normalize_command(command: &str) -> String {
    let mut line = command.trim().to_string();
    line.push_str(CRLF);
    line
}

/// Returns `true` if `token` cannot be carried inside a single command line.
///
/// Quoting protects whitespace and quotes, but a CR or LF would still end
/// the line on the device side.
pub fn breaks_line(token: &str) -> bool {
    token.contains(['\r', '\n'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_token_passes_through() {
        assert!(matches!(encode_token("foo"), Cow::Borrowed("foo")));
        assert_eq!(encode_token("0.75"), "0.75");
        assert_eq!(encode_token("IR\\Room.wav"), "IR\\Room.wav");
    }

    #[test]
    fn test_quoting_cases() {
        assert_eq!(encode_token("foo bar"), r#""foo bar""#);
        assert_eq!(encode_token("tab\tsep"), "\"tab\tsep\"");
        assert_eq!(encode_token(r#"he"llo"#), r#""he\"llo""#);
        assert_eq!(encode_token("  spaced  "), r#""  spaced  ""#);
        assert_eq!(encode_token(r#"a \ b"#), r#""a \\ b""#);
    }

    #[test]
    fn test_only_quote_and_backslash_are_escaped() {
        assert_eq!(encode_token("a\tb"), "\"a\tb\"");
        assert_eq!(encode_token("x \u{1}"), "\"x \u{1}\"");
        assert_eq!(decode_line("\"x \u{1}\""), vec!["x \u{1}"]);
    }

    #[test]
    fn test_decode_keeps_quoted_whitespace_token() {
        assert_eq!(decode_line(r#"A "   " B"#), vec!["A", "   ", "B"]);
    }

    #[test]
    fn test_decode_plain_command() {
        assert_eq!(
            decode_line("SetParam Gain Level 0.75"),
            vec!["SetParam", "Gain", "Level", "0.75"]
        );
    }

    #[test]
    fn test_decode_quoted_description() {
        assert_eq!(
            decode_line(r#"Description "Clean boost effect" Type Knob"#),
            vec!["Description", "Clean boost effect", "Type", "Knob"]
        );
    }

    #[test]
    fn test_decode_escapes_inside_quotes_only() {
        assert_eq!(decode_line(r#""a \"b\" c""#), vec![r#"a "b" c"#]);
        assert_eq!(decode_line(r#"C:\dir "x\\y""#), vec![r"C:\dir", r"x\y"]);
    }

    #[test]
    fn test_decode_drops_empty_tokens() {
        assert_eq!(decode_line(r#"A "" B"#), vec!["A", "B"]);
        assert!(decode_line("   \t  ").is_empty());
        assert!(decode_line("").is_empty());
    }

    #[test]
    fn test_decode_quote_splits_adjacent_text() {
        assert_eq!(decode_line(r#"abc"def"ghi"#), vec!["abc", "def", "ghi"]);
    }

    #[test]
    fn test_decode_unterminated_quote_runs_to_end() {
        assert_eq!(decode_line(r#"Description "no end here"#), vec!["Description", "no end here"]);
    }

    #[test]
    fn test_round_trip_for_tokens_needing_quotes() {
        let samples = [
            "foo bar",
            "tab\tsep",
            r#"he said "hi""#,
            "  spaced  ",
            "   ",
            r#"trailing\"#,
            r#"mixed \ "quote" and	tab"#,
            "ünïcödé name",
        ];
        for sample in samples {
            let encoded = encode_token(sample);
            assert_eq!(decode_line(&encoded), vec![sample.to_string()], "token {sample:?}");
        }
    }

    #[test]
    fn test_command_line_quotes_arguments() {
        assert_eq!(
            command_line("SetParam", &["Amp", "Label", "he said \"hi\""]),
            "SetParam Amp Label \"he said \\\"hi\\\"\"\r\n"
        );
        assert_eq!(command_line::<&str>("List Presets", &[]), "List Presets\r\n");
    }

    #[test]
    fn test_command_line_echo_decodes_to_tokens() {
        let line = command_line("SetParam", &["Gain", "Level", "0.75"]);
        assert_eq!(decode_line(&line), vec!["SetParam", "Gain", "Level", "0.75"]);
    }

    #[test]
    fn test_normalize_command() {
        assert_eq!(normalize_command("  Dump Program "), "Dump Program\r\n");
        assert_eq!(normalize_command("Dump Program\r\n"), "Dump Program\r\n");
        assert_eq!(normalize_command("Dump Program\n"), "Dump Program\r\n");
    }

    #[test]
    fn test_breaks_line() {
        assert!(breaks_line("a\nb"));
        assert!(breaks_line("a\rb"));
        assert!(!breaks_line("a\tb"));
    }
}
