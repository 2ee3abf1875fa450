//! Terminal formatting for responses.

use colored::Colorize;
use quire::RestResponse;

pub fn status_line(status: u16) -> String {
    let text = format!("HTTP {status}");
    match status {
        200..=299 => format!("{}", text.bright_green()),
        400..=499 => format!("{}", text.yellow()),
        _ => format!("{}", text.red().bold()),
    }
}

pub fn success(text: &str) -> String {
    format!("{}", text.bright_green())
}

pub fn err_line(text: &str) -> String {
    format!("{} {}", "Error:".red().bold(), text)
}

/// Status line followed by the pretty-printed body.
pub fn render(response: &RestResponse) -> String {
    let body = serde_json::to_string_pretty(&response.body)
        .unwrap_or_else(|_| response.body.to_string());
    format!("{}\n{body}", status_line(response.status))
}
