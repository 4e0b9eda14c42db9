//! Parser for `.properties` message bundles.
//!
//! Supports the usual format: `key=value`, `key: value` and `key value`
//! separators, `#` and `!` comment lines, backslash line continuation and the
//! `\t \n \r \f \uXXXX` escapes. Input is already-decoded UTF-8 text.

use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PropertiesError {
    #[error("line {line}: malformed \\uXXXX escape")]
    MalformedUnicodeEscape { line: usize },
}

/// Parse properties text into a key/value map. Later duplicates win.
pub fn parse(input: &str) -> Result<HashMap<String, String>, PropertiesError> {
    let mut entries = HashMap::new();

    for (line_no, logical) in logical_lines(input) {
        let (raw_key, raw_value) = split_key_value(&logical);
        let key = unescape(raw_key, line_no)?;
        let value = unescape(raw_value, line_no)?;
        entries.insert(key, value);
    }

    Ok(entries)
}

/// Join continuation lines and drop blanks/comments.
/// Yields the 1-based number of the first physical line of each entry.
fn logical_lines(input: &str) -> Vec<(usize, String)> {
    let mut lines = Vec::new();
    let mut current: Option<(usize, String)> = None;

    for (idx, physical) in input.lines().enumerate() {
        let trimmed = physical.trim_start();

        let (start, mut text) = match current.take() {
            Some((start, text)) => (start, text),
            None => {
                if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
                    continue;
                }
                (idx + 1, String::new())
            }
        };

        if ends_with_continuation(trimmed) {
            text.push_str(&trimmed[..trimmed.len() - 1]);
            current = Some((start, text));
        } else {
            text.push_str(trimmed);
            lines.push((start, text));
        }
    }

    if let Some(pending) = current {
        lines.push(pending);
    }

    lines
}

/// An odd number of trailing backslashes continues the line.
fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

fn split_key_value(line: &str) -> (&str, &str) {
    let mut escaped = false;
    let mut key_end = line.len();

    for (idx, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' | ' ' | '\t' | '\x0c' => {
                key_end = idx;
                break;
            }
            _ => {}
        }
    }

    let key = &line[..key_end];
    let rest = line[key_end..].trim_start_matches([' ', '\t', '\x0c']);
    let rest = rest
        .strip_prefix(['=', ':'])
        .unwrap_or(rest)
        .trim_start_matches([' ', '\t', '\x0c']);
    (key, rest)
}

fn unescape(raw: &str, line: usize) -> Result<String, PropertiesError> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\x0c'),
            Some('u') => {
                let unit = read_code_unit(&mut chars, line)?;
                let code = match unit {
                    0xD800..=0xDBFF => {
                        let low = match (chars.next(), chars.next()) {
                            (Some('\\'), Some('u')) => read_code_unit(&mut chars, line)?,
                            _ => return Err(PropertiesError::MalformedUnicodeEscape { line }),
                        };
                        if !(0xDC00..=0xDFFF).contains(&low) {
                            return Err(PropertiesError::MalformedUnicodeEscape { line });
                        }
                        0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00)
                    }
                    other => other,
                };
                let decoded =
                    char::from_u32(code).ok_or(PropertiesError::MalformedUnicodeEscape { line })?;
                out.push(decoded);
            }
            Some(other) => out.push(other),
            None => {}
        }
    }

    Ok(out)
}

/// Four hex digits after `\u`, as a UTF-16 code unit.
fn read_code_unit(chars: &mut std::str::Chars<'_>, line: usize) -> Result<u32, PropertiesError> {
    let hex: String = chars.by_ref().take(4).collect();
    if hex.len() != 4 {
        return Err(PropertiesError::MalformedUnicodeEscape { line });
    }
    u32::from_str_radix(&hex, 16).map_err(|_| PropertiesError::MalformedUnicodeEscape { line })
}
