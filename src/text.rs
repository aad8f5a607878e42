//! Line canonicalization and the lexical helpers shared by the pattern table,
//! the encoders and the shell.

fn is_separator(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n' | ',')
}

/// Canonical form of an input line: lowercase, commas turned into spaces,
/// whitespace runs collapsed to one space, no leading or trailing blanks.
pub fn normalize(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut pending_space = false;
    for c in line.chars() {
        if is_separator(c) {
            pending_space = !out.is_empty();
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        out.push(c.to_ascii_lowercase());
    }
    out
}

/// Splits a normalized line into borrowed tokens.
pub fn tokens(normalized: &str) -> Vec<&str> {
    normalized.split(' ').filter(|t| !t.is_empty()).collect()
}

/// `r0`..`r3`
pub fn is_register(tok: &str) -> bool {
    matches!(tok.as_bytes(), [b'r', b'0'..=b'3'])
}

/// `0x[0-9a-f]+` or `[0-9]+`
pub fn is_unsigned(tok: &str) -> bool {
    match tok.strip_prefix("0x") {
        Some(hex) if !hex.is_empty() && hex.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) => true,
        _ => !tok.is_empty() && tok.bytes().all(|b| b.is_ascii_digit()),
    }
}

/// Optional `-` followed by an unsigned literal.
pub fn is_signed(tok: &str) -> bool {
    is_unsigned(tok.strip_prefix('-').unwrap_or(tok))
}

pub fn parse_register(tok: &str) -> Option<u8> {
    if !is_register(tok) {
        return None;
    }
    Some(tok.as_bytes()[1] - b'0')
}

/// Decimal or `0x` hex with an optional leading `-`. Leading zeros stay
/// decimal. Returns `None` when the literal is malformed or overflows `i64`.
pub fn parse_number(tok: &str) -> Option<i64> {
    let (negative, digits) = match tok.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, tok),
    };
    if !is_unsigned(digits) {
        return None;
    }
    let magnitude = match digits.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16).ok()?,
        None => digits.parse::<u64>().ok()?,
    };
    let value = i64::try_from(magnitude).ok()?;
    Some(if negative { -value } else { value })
}
