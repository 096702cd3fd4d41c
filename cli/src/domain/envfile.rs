//! `.env`-style codec for deployment config files.
//!
//! One `KEY="VALUE"` pair per line, `#` comments, optional `export ` prefix.
//! Double-quoted values understand `\"`, `\\` and `\n`; single-quoted values
//! are literal; bare values end at the first ` #`.

use std::collections::HashMap;

use crate::domain::error::ConfigError;

/// Flat key → value mapping read from a config source.
pub type EnvMap = HashMap<String, String>;

/// Parse config text into a mapping. Later keys win.
///
/// # Errors
///
/// Returns `ConfigError::Malformed` for lines without `=`, empty keys, or
/// unterminated quotes.
pub fn parse(text: &str) -> Result<EnvMap, ConfigError> {
    let mut map = EnvMap::new();
    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);
        let Some((key, rest)) = line.split_once('=') else {
            return Err(malformed(line_no, "expected KEY=VALUE"));
        };
        let key = key.trim();
        if key.is_empty() || key.chars().any(char::is_whitespace) {
            return Err(malformed(line_no, "invalid key"));
        }
        let value = parse_value(rest.trim_start(), line_no)?;
        map.insert(key.to_string(), value);
    }
    Ok(map)
}

fn parse_value(rest: &str, line_no: usize) -> Result<String, ConfigError> {
    if let Some(body) = rest.strip_prefix('"') {
        let mut out = String::with_capacity(body.len());
        let mut chars = body.chars();
        while let Some(c) = chars.next() {
            match c {
                '"' => return Ok(out),
                '\\' => match chars.next() {
                    Some('n') => out.push('\n'),
                    Some(other) => out.push(other),
                    None => break,
                },
                _ => out.push(c),
            }
        }
        return Err(malformed(line_no, "unterminated double quote"));
    }
    if let Some(body) = rest.strip_prefix('\'') {
        return body
            .find('\'')
            .map(|end| body[..end].to_string())
            .ok_or_else(|| malformed(line_no, "unterminated single quote"));
    }
    let bare = rest.split(" #").next().unwrap_or_default();
    Ok(bare.trim().to_string())
}

fn malformed(line: usize, reason: &str) -> ConfigError {
    ConfigError::Malformed {
        line,
        reason: reason.to_string(),
    }
}

/// Render one `KEY="VALUE"` line (with trailing newline).
#[must_use]
pub fn assignment(key: &str, value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            _ => escaped.push(c),
        }
    }
    format!("{key}=\"{escaped}\"\n")
}
