//! A hand-rolled base64 codec (standard alphabet, `=` padding, 76-column
//! soft line wrap on encode). Deliberately not the `base64` crate: the
//! wire format wraps long lines with `\r\n` the way the source format
//! does, and decoding is permissive about interspersed whitespace.

use crate::error::ModelError;

const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
const LINE_LEN: usize = 76;
const PAD: u8 = b'=';

fn value_of(c: u8) -> Option<u8> {
    match c {
        b'A'..=b'Z' => Some(c - b'A'),
        b'a'..=b'z' => Some(c - b'a' + 26),
        b'0'..=b'9' => Some(c - b'0' + 52),
        b'+' => Some(62),
        b'/' => Some(63),
        _ => None,
    }
}

/// Encodes `data` with no line wrapping. Used internally wherever a
/// BYTES value needs a compact string form (e.g. `Value::as_string`).
pub fn encode_compact(data: &[u8]) -> String {
    let mut out = String::with_capacity((data.len() + 2) / 3 * 4);
    encode_into(data, &mut out, None);
    out
}

/// Encodes `data` with a soft `\r\n` wrap every 76 output columns, the
/// streaming wire form.
pub fn encode_wrapped(data: &[u8]) -> String {
    let mut out = String::with_capacity((data.len() + 2) / 3 * 4 + data.len() / 57 * 2);
    encode_into(data, &mut out, Some(LINE_LEN));
    out
}

fn encode_into(data: &[u8], out: &mut String, wrap_at: Option<usize>) {
    let mut column = 0;
    let mut push = |c: char, out: &mut String| {
        out.push(c);
        if let Some(width) = wrap_at {
            column += 1;
            if column == width {
                out.push_str("\r\n");
                column = 0;
            }
        }
    };
    for chunk in data.chunks(3) {
        let b0 = chunk[0];
        let b1 = *chunk.get(1).unwrap_or(&0);
        let b2 = *chunk.get(2).unwrap_or(&0);
        let n = ((b0 as u32) << 16) | ((b1 as u32) << 8) | b2 as u32;
        push(ALPHABET[(n >> 18 & 0x3f) as usize] as char, out);
        push(ALPHABET[(n >> 12 & 0x3f) as usize] as char, out);
        push(
            if chunk.len() > 1 {
                ALPHABET[(n >> 6 & 0x3f) as usize] as char
            } else {
                PAD as char
            },
            out,
        );
        push(
            if chunk.len() > 2 {
                ALPHABET[(n & 0x3f) as usize] as char
            } else {
                PAD as char
            },
            out,
        );
    }
}

/// Decodes base64 text, skipping any ASCII whitespace (spaces, tabs,
/// `\r`, `\n`) so both compact and line-wrapped encodings round-trip.
pub fn decode(text: &str) -> Result<Vec<u8>, ModelError> {
    let symbols: Vec<u8> = text
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    if symbols.len() % 4 != 0 {
        return Err(ModelError::IncorrectData(
            "base64 input length is not a multiple of 4".to_string(),
        ));
    }

    let mut out = Vec::with_capacity(symbols.len() / 4 * 3);
    for group in symbols.chunks(4) {
        let pad_count = group.iter().rev().take_while(|&&b| b == PAD).count();
        if pad_count > 2 {
            return Err(ModelError::IncorrectData("too much padding".to_string()));
        }
        let mut n: u32 = 0;
        for (i, &b) in group.iter().enumerate() {
            let digit = if b == PAD {
                if i < 2 {
                    return Err(ModelError::IncorrectData(
                        "padding cannot appear in the first two positions".to_string(),
                    ));
                }
                0
            } else {
                value_of(b).ok_or_else(|| {
                    ModelError::IncorrectData(format!("not a base64 character: {b:#04x}"))
                })? as u32
            };
            n = (n << 6) | digit;
        }
        out.push((n >> 16) as u8);
        if pad_count < 2 {
            out.push((n >> 8) as u8);
        }
        if pad_count < 1 {
            out.push(n as u8);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_empty() {
        assert_eq!(encode_compact(&[]), "");
        assert_eq!(decode("").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn matches_known_vectors() {
        assert_eq!(encode_compact(b"f"), "Zg==");
        assert_eq!(encode_compact(b"fo"), "Zm8=");
        assert_eq!(encode_compact(b"foo"), "Zm9v");
        assert_eq!(encode_compact(b"foobar"), "Zm9vYmFy");
    }

    #[test]
    fn decode_is_inverse_of_encode() {
        let data = (0u8..=255).collect::<Vec<u8>>();
        let encoded = encode_compact(&data);
        assert_eq!(decode(&encoded).unwrap(), data);
    }

    #[test]
    fn wraps_at_76_columns_and_decodes_back() {
        let data = vec![0xAB; 200];
        let wrapped = encode_wrapped(&data);
        assert!(wrapped.lines().all(|l| l.len() <= LINE_LEN));
        assert_eq!(decode(&wrapped).unwrap(), data);
    }

    #[test]
    fn rejects_invalid_character() {
        assert!(decode("#@%^").is_err());
    }

    #[test]
    fn rejects_truncated_length() {
        assert!(decode("Zg").is_err());
    }
}
