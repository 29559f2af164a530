//! Text codec for item change logs.
//!
//! The format is line based. A line consisting solely of an ASCII decimal
//! number opens a timestamp block; every following record line belongs to
//! that timestamp until the next number line. Record lines have the form
//! `key=value` with `\` and newline escaped in the value. The codec
//! round-trips: parsing emitted output yields the original change list.

use crate::tracker::change::Change;

/// Parses the textual representation of a change log. Returns a message
/// describing the defect on broken input; the caller knows which item the
/// data belongs to and wraps the message accordingly.
pub fn parse_changes(text: &str) -> Result<Vec<Change>, String> {
    let mut changes = Vec::new();
    let mut timestamp: Option<i64> = None;

    let mut input = text;
    if let Some(stripped) = input.strip_suffix('\n') {
        input = stripped;
    }
    if input.is_empty() {
        return Ok(changes);
    }

    for line in input.split('\n') {
        if line.is_empty() {
            return Err("empty lines are not expected".to_string());
        }

        if line.as_bytes()[0].is_ascii_digit() {
            match line.parse::<i64>() {
                Ok(ts) => {
                    timestamp = Some(ts);
                    continue;
                }
                Err(_) => {
                    return Err(format!("malformed timestamp line: {}", line));
                }
            }
        }

        let ts = match timestamp {
            Some(ts) => ts,
            None => return Err("wrong field ordering, no timestamp".to_string()),
        };

        let (key, value) = match line.split_once('=') {
            Some((key, _)) if key.is_empty() => {
                return Err(format!("record without a key: {}", line));
            }
            Some((key, value)) => (key, value),
            None => return Err(format!("broken record line: {}", line)),
        };

        changes.push(Change::new(ts, key, decode(value)));
    }

    Ok(changes)
}

/// Writes the change list out in its textual form. A timestamp line is
/// emitted whenever the timestamp differs from the preceding record's.
pub fn emit_changes(changes: &[Change]) -> String {
    let mut out = String::new();

    if changes.is_empty() {
        return out;
    }

    // Anything different from the first timestamp forces the initial line.
    let mut timestamp = changes[0].timestamp() + 1;
    for change in changes {
        if change.timestamp() != timestamp {
            timestamp = change.timestamp();
            out.push_str(&timestamp.to_string());
            out.push('\n');
        }

        out.push_str(change.key());
        out.push('=');
        out.push_str(&encode(change.value()));
        out.push('\n');
    }

    out
}

fn encode(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => encoded.push_str(r"\\"),
            '\n' => encoded.push_str(r"\n"),
            c => encoded.push(c),
        }
    }
    encoded
}

fn decode(value: &str) -> String {
    let mut decoded = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            decoded.push(c);
            continue;
        }

        match chars.next() {
            Some('n') => decoded.push('\n'),
            Some('\\') => decoded.push('\\'),
            Some(other) => {
                decoded.push('\\');
                decoded.push(other);
            }
            None => decoded.push('\\'),
        }
    }
    decoded
}
