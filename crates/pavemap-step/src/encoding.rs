//! ISO 10303-21 string control directives.
//!
//! Read side understands `\\`, `\X\hh`, `\S\c`, `\P?\`, `\X2\...\X0\` and
//! `\X4\...\X0\`. Write side emits printable ASCII as-is and everything else
//! as `\X2\` UTF-16 runs, which every IFC reader accepts.

/// Resolve control directives in the raw text between the quotes.
/// Doubled apostrophes must already be collapsed by the lexer.
pub(crate) fn decode_string(raw: &str) -> String {
    if !raw.contains('\\') {
        return raw.to_string();
    }

    let chars: Vec<char> = raw.chars().collect();
    let mut out = String::with_capacity(raw.len());
    let mut i = 0;

    while i < chars.len() {
        if chars[i] != '\\' {
            out.push(chars[i]);
            i += 1;
            continue;
        }
        let rest = &chars[i..];

        if starts_with(rest, "\\\\") {
            out.push('\\');
            i += 2;
        } else if starts_with(rest, "\\X2\\") {
            match hex_run(&chars, i + 4, 4) {
                Some((units, next)) => {
                    let units: Vec<u16> = units.into_iter().map(|u| u as u16).collect();
                    out.push_str(&String::from_utf16_lossy(&units));
                    i = next;
                }
                None => {
                    out.push('\\');
                    i += 1;
                }
            }
        } else if starts_with(rest, "\\X4\\") {
            match hex_run(&chars, i + 4, 8) {
                Some((points, next)) => {
                    out.extend(points.into_iter().filter_map(char::from_u32));
                    i = next;
                }
                None => {
                    out.push('\\');
                    i += 1;
                }
            }
        } else if starts_with(rest, "\\X\\") && rest.len() >= 5 {
            match hex_value(&rest[3..5]) {
                // ISO 8859-1 maps 1:1 onto the first Unicode block.
                Some(byte) => {
                    out.push(char::from(byte as u8));
                    i += 5;
                }
                None => {
                    out.push('\\');
                    i += 1;
                }
            }
        } else if starts_with(rest, "\\S\\") && rest.len() >= 4 && rest[3].is_ascii() {
            out.push(char::from(rest[3] as u8 + 0x80));
            i += 4;
        } else if rest.len() >= 4 && rest[1] == 'P' && rest[3] == '\\' {
            // Code page switch; only page A (Latin-1) is supported.
            i += 4;
        } else {
            out.push('\\');
            i += 1;
        }
    }

    out
}

/// Encode text for use between apostrophes in a STEP file.
pub(crate) fn encode_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    let mut pending: Vec<u16> = Vec::new();

    for c in s.chars() {
        if (' '..='~').contains(&c) {
            flush_wide(&mut out, &mut pending);
            match c {
                '\'' => out.push_str("''"),
                '\\' => out.push_str("\\\\"),
                _ => out.push(c),
            }
        } else {
            let mut buf = [0u16; 2];
            pending.extend_from_slice(c.encode_utf16(&mut buf));
        }
    }
    flush_wide(&mut out, &mut pending);

    out
}

fn flush_wide(out: &mut String, pending: &mut Vec<u16>) {
    if pending.is_empty() {
        return;
    }
    out.push_str("\\X2\\");
    for unit in pending.iter() {
        out.push_str(&format!("{unit:04X}"));
    }
    out.push_str("\\X0\\");
    pending.clear();
}

fn starts_with(chars: &[char], pattern: &str) -> bool {
    let mut it = chars.iter();
    pattern.chars().all(|p| it.next() == Some(&p))
}

/// Fixed-width hex groups starting at `start`, terminated by `\X0\`.
/// Returns the decoded groups and the index just past the terminator.
fn hex_run(chars: &[char], start: usize, width: usize) -> Option<(Vec<u32>, usize)> {
    let mut values = Vec::new();
    let mut i = start;
    loop {
        if starts_with(&chars[i.min(chars.len())..], "\\X0\\") {
            return Some((values, i + 4));
        }
        if i + width > chars.len() {
            return None;
        }
        values.push(hex_value(&chars[i..i + width])?);
        i += width;
    }
}

fn hex_value(digits: &[char]) -> Option<u32> {
    digits
        .iter()
        .try_fold(0u32, |acc, c| c.to_digit(16).map(|d| acc * 16 + d))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_x2_runs() {
        assert_eq!(decode_string("N\\X2\\00B0\\X0\\_ORDRE"), "N°_ORDRE");
        assert_eq!(decode_string("enrob\\X2\\00E9\\X0\\"), "enrobé");
    }

    #[test]
    fn decodes_latin1_and_shift_directives() {
        assert_eq!(decode_string("enrob\\X\\E9"), "enrobé");
        assert_eq!(decode_string("\\S\\i"), "é");
        assert_eq!(decode_string("a\\\\b"), "a\\b");
    }

    #[test]
    fn malformed_directive_is_kept_literally() {
        assert_eq!(decode_string("\\X2\\00B"), "\\X2\\00B");
        assert_eq!(decode_string("trailing\\"), "trailing\\");
    }

    #[test]
    fn encodes_non_ascii_as_x2() {
        assert_eq!(encode_string("N°_ORDRE"), "N\\X2\\00B0\\X0\\_ORDRE");
        assert_eq!(encode_string("it's"), "it''s");
        assert_eq!(encode_string("a\\b"), "a\\\\b");
    }

    #[test]
    fn encode_then_decode_restores_text() {
        for s in ["enrobé 0/10", "N°_ORDRE", "Grave-Bitume \u{1F6A7}", "C:\\tmp"] {
            let encoded = encode_string(s).replace("''", "'");
            assert_eq!(decode_string(&encoded), s);
        }
    }
}
