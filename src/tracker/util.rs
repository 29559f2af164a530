use chrono::{Local, TimeZone};

use crate::tracker::error::{Result, TrackerError};

/// Splits `s` in two at the leftmost occurrence of `delim`.
pub fn split_at(s: &str, delim: char) -> Result<(String, String)> {
    match s.split_once(delim) {
        Some((left, right)) => Ok((left.to_string(), right.to_string())),
        None => Err(TrackerError::IllegalArgument(format!(
            "Can't split {} with {}",
            s, delim
        ))),
    }
}

/// Tokenizes a command line respecting backslash escapes and single/double
/// quotes.
pub fn break_into_args(line: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut has_token = false;
    let mut quote: Option<char> = None;

    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(next) = chars.next() {
                    current.push(next);
                    has_token = true;
                }
            }
            c if quote == Some(c) => {
                quote = None;
            }
            '\'' | '"' if quote.is_none() => {
                quote = Some(c);
                has_token = true;
            }
            ' ' if quote.is_none() => {
                if has_token {
                    args.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            c => {
                current.push(c);
                has_token = true;
            }
        }
    }

    if has_token {
        args.push(current);
    }
    args
}

/// Renders seconds since the epoch as local time.
pub fn time_to_string(timestamp: i64) -> String {
    match Local.timestamp_opt(timestamp, 0).single() {
        Some(time) => time.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => timestamp.to_string(),
    }
}

/// Current time as seconds since the epoch.
pub fn unix_now() -> i64 {
    Local::now().timestamp()
}
