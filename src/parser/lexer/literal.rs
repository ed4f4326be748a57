//! Decoding of literal tokens into their runtime bytes and numbers.

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumberLiteral {
    Int(i64),
    Float(f64),
}

fn is_label_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_' || c >= 0x80
}

fn is_label_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_' || c >= 0x80
}

/// Whether a double-quoted or heredoc body contains `$name`, `{$` or `${`.
pub fn has_interpolation(body: &[u8]) -> bool {
    let mut i = 0;
    while i < body.len() {
        match body[i] {
            b'\\' => i += 2,
            b'$' => {
                match body.get(i + 1) {
                    Some(b'{') => return true,
                    Some(c) if is_label_start(*c) => return true,
                    _ => {}
                }
                i += 1;
            }
            b'{' if body.get(i + 1) == Some(&b'$') => return true,
            _ => i += 1,
        }
    }
    false
}

/// Decodes any string token (`'..'`, `".."`, heredoc, nowdoc, optionally `b`-prefixed).
pub fn decode_string(raw: &[u8]) -> Vec<u8> {
    let raw = match raw.first() {
        Some(b'b' | b'B') => &raw[1..],
        _ => raw,
    };

    match raw.first() {
        Some(b'\'') => decode_single_quoted(strip_quotes(raw)),
        Some(b'"') => unescape(strip_quotes(raw), Some(b'"')),
        Some(b'`') => unescape(strip_quotes(raw), Some(b'`')),
        Some(b'<') => decode_heredoc(raw),
        _ => raw.to_vec(),
    }
}

fn strip_quotes(raw: &[u8]) -> &[u8] {
    if raw.len() >= 2 {
        &raw[1..raw.len() - 1]
    } else {
        &[]
    }
}

pub fn decode_single_quoted(body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(body.len());
    let mut i = 0;
    while i < body.len() {
        if body[i] == b'\\' && matches!(body.get(i + 1), Some(b'\\' | b'\'')) {
            out.push(body[i + 1]);
            i += 2;
        } else {
            out.push(body[i]);
            i += 1;
        }
    }
    out
}

/// Expands backslash escapes of double-quoted strings. `quote` is the
/// delimiter that may be escaped; heredocs have none.
pub fn unescape(body: &[u8], quote: Option<u8>) -> Vec<u8> {
    let mut out = Vec::with_capacity(body.len());
    let mut i = 0;
    while i < body.len() {
        let c = body[i];
        if c != b'\\' || i + 1 >= body.len() {
            out.push(c);
            i += 1;
            continue;
        }

        let next = body[i + 1];
        i += 2;
        match next {
            b'n' => out.push(b'\n'),
            b't' => out.push(b'\t'),
            b'r' => out.push(b'\r'),
            b'v' => out.push(0x0b),
            b'e' => out.push(0x1b),
            b'f' => out.push(0x0c),
            b'\\' => out.push(b'\\'),
            b'$' => out.push(b'$'),
            q if Some(q) == quote => out.push(q),
            b'0'..=b'7' => {
                let mut value = (next - b'0') as u32;
                let mut taken = 0;
                while taken < 2 && i < body.len() && (b'0'..=b'7').contains(&body[i]) {
                    value = value * 8 + (body[i] - b'0') as u32;
                    i += 1;
                    taken += 1;
                }
                out.push((value & 0xff) as u8);
            }
            b'x' if i < body.len() && body[i].is_ascii_hexdigit() => {
                let mut value = 0u32;
                let mut taken = 0;
                while taken < 2 && i < body.len() && body[i].is_ascii_hexdigit() {
                    value = value * 16 + (body[i] as char).to_digit(16).unwrap_or(0);
                    i += 1;
                    taken += 1;
                }
                out.push(value as u8);
            }
            b'u' if body.get(i) == Some(&b'{') => {
                let close = body[i..].iter().position(|&b| b == b'}');
                let decoded = close.and_then(|close| {
                    let hex = std::str::from_utf8(&body[i + 1..i + close]).ok()?;
                    let code = u32::from_str_radix(hex, 16).ok()?;
                    char::from_u32(code).map(|ch| (ch, close))
                });
                match decoded {
                    Some((ch, close)) => {
                        let mut buf = [0u8; 4];
                        out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
                        i += close + 1;
                    }
                    None => {
                        out.push(b'\\');
                        out.push(b'u');
                    }
                }
            }
            other => {
                out.push(b'\\');
                out.push(other);
            }
        }
    }
    out
}

/// Decodes a complete heredoc/nowdoc token starting at `<<<`.
pub fn decode_heredoc(raw: &[u8]) -> Vec<u8> {
    let mut i = 3;
    while matches!(raw.get(i), Some(b' ' | b'\t')) {
        i += 1;
    }
    let quote = match raw.get(i) {
        Some(q @ (b'\'' | b'"')) => {
            i += 1;
            Some(*q)
        }
        _ => None,
    };
    let label_start = i;
    while raw.get(i).is_some_and(|c| is_label_char(*c)) {
        i += 1;
    }
    let label_len = i - label_start;
    if quote.is_some() {
        i += 1;
    }
    if raw.get(i) == Some(&b'\r') {
        i += 1;
    }
    if raw.get(i) == Some(&b'\n') {
        i += 1;
    }
    let body_start = i.min(raw.len());

    // The closing line is `<indent><label>` at the very end of the token.
    let label_pos = raw.len().saturating_sub(label_len).max(body_start);
    let mut closing_line_start = label_pos;
    while closing_line_start > body_start
        && matches!(raw[closing_line_start - 1], b' ' | b'\t')
    {
        closing_line_start -= 1;
    }
    let indent = label_pos - closing_line_start;

    let mut body_end = closing_line_start;
    if body_end > body_start && raw[body_end - 1] == b'\n' {
        body_end -= 1;
        if body_end > body_start && raw[body_end - 1] == b'\r' {
            body_end -= 1;
        }
    }
    let body = &raw[body_start..body_end.max(body_start)];

    let dedented = if indent > 0 {
        let mut out = Vec::with_capacity(body.len());
        for (n, line) in body.split(|&b| b == b'\n').enumerate() {
            if n > 0 {
                out.push(b'\n');
            }
            let strip = line
                .iter()
                .take(indent)
                .take_while(|c| matches!(c, b' ' | b'\t'))
                .count();
            out.extend_from_slice(&line[strip..]);
        }
        out
    } else {
        body.to_vec()
    };

    if quote == Some(b'\'') {
        dedented
    } else {
        unescape(&dedented, None)
    }
}

/// Parses an integer literal token; values past `i64` become floats like in PHP.
pub fn parse_int(text: &[u8]) -> NumberLiteral {
    let cleaned: Vec<u8> = text.iter().copied().filter(|&c| c != b'_').collect();
    let (digits, radix) = match cleaned.as_slice() {
        [b'0', b'x' | b'X', rest @ ..] => (rest, 16),
        [b'0', b'b' | b'B', rest @ ..] => (rest, 2),
        [b'0', b'o' | b'O', rest @ ..] => (rest, 8),
        [b'0', rest @ ..] if !rest.is_empty() => (rest, 8),
        other => (other, 10),
    };

    let digits = std::str::from_utf8(digits).unwrap_or("0");
    match i64::from_str_radix(digits, radix) {
        Ok(value) => NumberLiteral::Int(value),
        Err(_) if radix == 10 => NumberLiteral::Float(digits.parse().unwrap_or(f64::INFINITY)),
        Err(_) => {
            let mut value = 0f64;
            for c in digits.chars() {
                value = value * radix as f64 + c.to_digit(radix).unwrap_or(0) as f64;
            }
            NumberLiteral::Float(value)
        }
    }
}

pub fn parse_float(text: &[u8]) -> f64 {
    let cleaned: String = text
        .iter()
        .filter(|&&c| c != b'_')
        .map(|&c| c as char)
        .collect();
    cleaned.parse().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_double_quoted_escapes() {
        assert_eq!(decode_string(br#""a\tb\n\x41\101\u{1F600}\q""#), "a\tb\nAA\u{1F600}\\q".as_bytes());
        assert_eq!(decode_string(br#""say \"hi\"""#), b"say \"hi\"");
    }

    #[test]
    fn decodes_single_quoted() {
        assert_eq!(decode_string(br"'it\'s \\ \n'"), br"it's \ \n");
        assert_eq!(decode_string(b"b'bin'"), b"bin");
    }

    #[test]
    fn decodes_indented_heredoc() {
        let raw = b"<<<EOT\n    hello\n      world\\t\n    EOT";
        assert_eq!(decode_string(raw), b"hello\n  world\t");
    }

    #[test]
    fn nowdoc_keeps_escapes() {
        let raw = b"<<<'EOT'\na\\tb\nEOT";
        assert_eq!(decode_string(raw), b"a\\tb");
    }

    #[test]
    fn empty_heredoc() {
        assert_eq!(decode_string(b"<<<EOT\nEOT"), b"");
    }

    #[test]
    fn integer_literals() {
        assert_eq!(parse_int(b"0x1F"), NumberLiteral::Int(31));
        assert_eq!(parse_int(b"0b101"), NumberLiteral::Int(5));
        assert_eq!(parse_int(b"0o17"), NumberLiteral::Int(15));
        assert_eq!(parse_int(b"017"), NumberLiteral::Int(15));
        assert_eq!(parse_int(b"1_000"), NumberLiteral::Int(1000));
        assert_eq!(parse_int(b"0"), NumberLiteral::Int(0));
        assert_eq!(
            parse_int(b"9223372036854775808"),
            NumberLiteral::Float(9223372036854775808.0)
        );
    }

    #[test]
    fn interpolation_detection() {
        assert!(has_interpolation(b"hello $name"));
        assert!(has_interpolation(b"x {$a->b}"));
        assert!(!has_interpolation(b"cost: \\$5 or $ 3"));
    }
}
