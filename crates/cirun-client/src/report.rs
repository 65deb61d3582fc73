//! Console rendering of API results
//!
//! Success output goes to stdout between green rules, failures to stderr
//! between red rules, so scripts can tell them apart by stream and exit code.

use colored::Colorize;
use serde::Serialize;
use serde_json::Value;

const RULE_WIDTH: usize = 80;

/// Key used when a response body is not JSON
pub const RAW_CONTENT_KEY: &str = "responseContent";

fn rule() -> String {
    "─".repeat(RULE_WIDTH)
}

fn pretty<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("<unprintable JSON: {e}>"))
}

/// Print a JSON result framed by green rules on stdout
pub fn print_success_json<T: Serialize + ?Sized>(value: &T) {
    println!("{}", rule().green().bold());
    println!("{}", pretty(value));
    println!("{}", rule().green().bold());
}

/// Print a JSON error payload framed by red rules on stderr
pub fn print_error_json(value: &Value) {
    eprintln!("{}", rule().red().bold());
    eprintln!("{}", pretty(value));
    eprintln!("{}", rule().red().bold());
}

/// Print an error message framed by red rules on stderr
pub fn print_error_message(message: &str) {
    eprintln!("{}", rule().red().bold());
    eprintln!("{}", message.red());
    eprintln!("{}", rule().red().bold());
}

/// Render a failed API exchange on stderr
pub fn render_api_error(status: u16, body: &Value) {
    eprintln!("{}", rule().red().bold());
    eprintln!("{}", format_api_error(status, body));
    eprintln!("{}", rule().red().bold());
}

/// Status line followed by the body, or the raw text when the body was not JSON
pub fn format_api_error(status: u16, body: &Value) -> String {
    let detail = match raw_content(body) {
        Some(text) => text.to_string(),
        None => pretty(body),
    };
    format!("Status code: {status}\n{detail}")
}

/// Raw text of a body that was coerced into `{"responseContent": ...}`
pub fn raw_content(body: &Value) -> Option<&str> {
    match body.as_object() {
        Some(map) if map.len() == 1 => map.get(RAW_CONTENT_KEY).and_then(Value::as_str),
        _ => None,
    }
}
