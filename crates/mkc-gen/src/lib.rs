//! mkc-gen - The pipeline's sinks: formatter, JS emitter, and OpenAPI
//! generator.
//!
//! All three consume a validated [`Program`](mkc_par::Program) and produce
//! text. None of them perform I/O; the driver decides where the output
//! goes.
//!
//! - [`format_program`]: canonical source text (4-space indent, braces on
//!   the introducing line, one blank line between declarations)
//! - [`emit_js`]: an executable program for the host runtime, with effects
//!   routed through the global `__effects` object and routes registered on
//!   `__router`
//! - [`openapi_document`] / [`openapi_json`]: an OpenAPI 3.0.0 description
//!   of the program's API routes

mod fmt;
mod js;
mod openapi;

pub use fmt::format_program;
pub use js::emit_js;
pub use openapi::{openapi_document, openapi_json};

/// Escape a decoded string back into double-quoted source/JS form.
/// The same escape set serves both: the two languages agree on it.
pub(crate) fn escape_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_round_trips_specials() {
        assert_eq!(escape_string("plain"), "plain");
        assert_eq!(escape_string("a\"b"), "a\\\"b");
        assert_eq!(escape_string("line\nbreak"), "line\\nbreak");
        assert_eq!(escape_string("back\\slash"), "back\\\\slash");
    }
}
