//! Small grammars used across the tracker: key names, filter conditions,
//! colorization rules and the `key: value...` argument folding.

use std::str::FromStr;

use strum_macros::EnumString;

/// Comparison operations of the condition grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// `==`, case sensitive equality.
    Eq,
    /// `!=`, case sensitive inequality.
    Ne,
    /// `/` or `=/`, case insensitive substring match.
    IcContains,
    /// `#` or `!/`, case insensitive substring non-match.
    IcNotContain,
}

impl Op {
    /// Applies the operation to a candidate value.
    pub fn test(self, value: &str, rhs: &str) -> bool {
        match self {
            Op::Eq => value == rhs,
            Op::Ne => value != rhs,
            Op::IcContains => ic_contains(value, rhs),
            Op::IcNotContain => !ic_contains(value, rhs),
        }
    }
}

fn ic_contains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// A single `key op value` condition together with its source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cond {
    pub text: String,
    pub key: String,
    pub op: Op,
    pub value: String,
}

/// One element a color rule matches against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matcher {
    /// The `!heading` pseudo-matcher, which applies to the header row.
    Heading,
    Cond(Cond),
}

/// A table decoration rule: the decorations apply to rows matched by at
/// least one of the matchers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorRule {
    pub decors: Vec<Decor>,
    pub matchers: Vec<Matcher>,
}

/// Decoration names of the colorization grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
pub enum Decor {
    #[strum(serialize = "bold")]
    Bold,
    #[strum(serialize = "inv")]
    Inv,
    #[strum(serialize = "def")]
    Def,
    #[strum(serialize = "fg-black")]
    FgBlack,
    #[strum(serialize = "fg-red")]
    FgRed,
    #[strum(serialize = "fg-green")]
    FgGreen,
    #[strum(serialize = "fg-yellow")]
    FgYellow,
    #[strum(serialize = "fg-blue")]
    FgBlue,
    #[strum(serialize = "fg-magenta")]
    FgMagenta,
    #[strum(serialize = "fg-cyan")]
    FgCyan,
    #[strum(serialize = "fg-white")]
    FgWhite,
    #[strum(serialize = "bg-black")]
    BgBlack,
    #[strum(serialize = "bg-red")]
    BgRed,
    #[strum(serialize = "bg-green")]
    BgGreen,
    #[strum(serialize = "bg-yellow")]
    BgYellow,
    #[strum(serialize = "bg-blue")]
    BgBlue,
    #[strum(serialize = "bg-magenta")]
    BgMagenta,
    #[strum(serialize = "bg-cyan")]
    BgCyan,
    #[strum(serialize = "bg-white")]
    BgWhite,
}

/// Length of the longest prefix of `s` that forms a valid key name:
/// `key := (alpha | '_') (alnum | '_' | '-')*`.
pub fn key_name_prefix_len(s: &str) -> usize {
    let bytes = s.as_bytes();
    if bytes.is_empty() || !(bytes[0].is_ascii_alphabetic() || bytes[0] == b'_') {
        return 0;
    }

    bytes
        .iter()
        .skip(1)
        .take_while(|&&b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
        .count()
        + 1
}

/// Whether the whole of `s` is a valid key name.
pub fn is_key_name(s: &str) -> bool {
    !s.is_empty() && key_name_prefix_len(s) == s.len()
}

/// Parses a condition expression: `key op value`, where the value is the
/// remainder of the string trimmed of surrounding whitespace.
pub fn parse_cond(expr: &str) -> Option<Cond> {
    let rest = expr.trim_start();
    let key_len = key_name_prefix_len(rest);
    if key_len == 0 {
        return None;
    }
    let key = &rest[..key_len];

    let rest = rest[key_len..].trim_start();
    let (op, rest) = parse_op(rest)?;

    Some(Cond {
        text: expr.to_string(),
        key: key.to_string(),
        op,
        value: rest.trim().to_string(),
    })
}

fn parse_op(s: &str) -> Option<(Op, &str)> {
    for (token, op) in [
        ("==", Op::Eq),
        ("!=", Op::Ne),
        ("=/", Op::IcContains),
        ("!/", Op::IcNotContain),
        ("/", Op::IcContains),
        ("#", Op::IcNotContain),
    ] {
        if let Some(rest) = s.strip_prefix(token) {
            return Some((op, rest));
        }
    }
    None
}

/// Parses a colorization specification: `rule (';' rule)*` where each rule
/// is one or more decoration names followed by one or more matchers. An
/// all-whitespace specification yields no rules.
pub fn parse_color_rules(spec: &str) -> Option<Vec<ColorRule>> {
    if spec.trim().is_empty() {
        return Some(Vec::new());
    }

    let mut rules = Vec::new();
    for chunk in spec.split(';') {
        rules.push(parse_color_rule(chunk)?);
    }
    Some(rules)
}

fn parse_color_rule(chunk: &str) -> Option<ColorRule> {
    let mut rest = chunk.trim_start();

    let mut decors = Vec::new();
    while let Some((token, after)) = next_word(rest) {
        match Decor::from_str(token) {
            Ok(decor) => {
                decors.push(decor);
                rest = after.trim_start();
            }
            Err(_) => break,
        }
    }
    if decors.is_empty() {
        return None;
    }

    let mut matchers = Vec::new();
    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix("!heading") {
            matchers.push(Matcher::Heading);
            rest = after.trim_start();
            continue;
        }

        let key_len = key_name_prefix_len(rest);
        if key_len == 0 {
            return None;
        }
        let key = &rest[..key_len];

        let after_key = rest[key_len..].trim_start();
        let (op, after_op) = parse_op(after_key)?;
        let after_op = after_op.trim_start();

        let value_len = after_op
            .find(|c: char| c == ' ' || c == '\t')
            .unwrap_or(after_op.len());
        let value = &after_op[..value_len];
        let remaining = &after_op[value_len..];

        let start = chunk.len() - rest.len();
        let end = chunk.len() - remaining.len();
        matchers.push(Matcher::Cond(Cond {
            text: chunk[start..end].to_string(),
            key: key.to_string(),
            op,
            value: value.to_string(),
        }));

        rest = remaining.trim_start();
    }
    if matchers.is_empty() {
        return None;
    }

    Some(ColorRule { decors, matchers })
}

fn next_word(s: &str) -> Option<(&str, &str)> {
    if s.is_empty() {
        return None;
    }
    let end = s.find(|c: char| c.is_whitespace()).unwrap_or(s.len());
    Some((&s[..end], &s[end..]))
}

/// Folds `key: value...` argument forms into `key=value` tokens. A trailing
/// colon opens an assignment that swallows the following tokens until the
/// next well-formed `key=` token resets the parsing.
pub fn parse_paired_args(args: &[String]) -> Vec<String> {
    enum State {
        Regular,
        First,
        Append,
    }

    let mut parsed: Vec<String> = Vec::new();
    let mut state = State::Regular;

    for arg in args {
        if let Some(pos) = arg.find('=') {
            if is_key_name(&arg[..pos]) {
                parsed.push(arg.clone());
                state = State::Regular;
                continue;
            }
        }

        if arg.len() > 1 && arg.ends_with(':') {
            let mut opened = arg[..arg.len() - 1].to_string();
            opened.push('=');
            parsed.push(opened);
            state = State::First;
        } else {
            match state {
                State::First => {
                    parsed.last_mut().unwrap().push_str(arg);
                    state = State::Append;
                }
                State::Append => {
                    let last = parsed.last_mut().unwrap();
                    last.push(' ');
                    last.push_str(arg);
                }
                State::Regular => parsed.push(arg.clone()),
            }
        }
    }

    parsed
}
