//! Keyed positional substitution over the fixed .sea alphabet.
//!
//! # Identity rules
//! Every character the cipher can carry has a 1-based position in
//! [`ALPHABET`].  That position IS the character's numeric value:
//!   - Encryption adds the key character's position, wrapping at N.
//!   - Decryption subtracts it, wrapping back.
//!
//! The alphabet order is frozen.  Reordering or extending it changes every
//! position and silently corrupts every file ever written, so the constant
//! below is non-negotiable.
//!
//! This is an obfuscation layer, not a security boundary: the transform is a
//! running-key shift with a repeating key and offers no resistance to
//! frequency analysis.

use std::collections::HashMap;
use std::sync::OnceLock;
use thiserror::Error;

/// The frozen cipher alphabet: lowercase, uppercase, digits, then a fixed
/// punctuation/space set.  Position in this string (1-based) encodes the
/// numeric value used by the shift.
pub const ALPHABET: &str = "abcdefghijklmnopqrstuvwxyz\
                            ABCDEFGHIJKLMNOPQRSTUVWXYZ\
                            0123456789\
                            .,;:=|!?()[]{}\"'-_/\\@#$%^&* ";

#[derive(Error, Debug)]
pub enum CipherError {
    /// The input contained a character the alphabet cannot represent.
    /// The cipher MUST NOT pass such characters through verbatim.
    #[error("character {ch:?} is missing from the cipher alphabet")]
    UnsupportedCharacter { ch: char },
    /// A shift over an empty key is undefined.
    #[error("cipher key must not be empty")]
    EmptyKey,
}

fn position_map() -> &'static HashMap<char, u32> {
    static MAP: OnceLock<HashMap<char, u32>> = OnceLock::new();
    MAP.get_or_init(|| {
        ALPHABET
            .chars()
            .enumerate()
            .map(|(i, ch)| (ch, i as u32 + 1))
            .collect()
    })
}

/// 1-based position of `ch` in the alphabet.
fn position(ch: char) -> Result<u32, CipherError> {
    position_map()
        .get(&ch)
        .copied()
        .ok_or(CipherError::UnsupportedCharacter { ch })
}

/// Inverse of [`position`].  `pos` must be in `1..=N`.
fn char_at(pos: u32) -> char {
    // The alphabet is pure ASCII, so byte indexing is safe.
    ALPHABET.as_bytes()[(pos - 1) as usize] as char
}

fn key_positions(key: &str) -> Result<Vec<u32>, CipherError> {
    if key.is_empty() {
        return Err(CipherError::EmptyKey);
    }
    key.chars().map(position).collect()
}

/// Encrypt `text` with a repeating `key`.
///
/// For the character at index `i`, the cipher position is
/// `pos(text[i]) + pos(key[i mod |key|])`, reduced by N when it overflows.
/// Both operands are ≥ 1 and their sum ≤ 2N, so a single subtraction
/// suffices — there is no mod-0 case.
pub fn encrypt(text: &str, key: &str) -> Result<String, CipherError> {
    let n = ALPHABET.len() as u32;
    let key = key_positions(key)?;

    let mut out = String::with_capacity(text.len());
    for (i, ch) in text.chars().enumerate() {
        let mut pos = position(ch)? + key[i % key.len()];
        if pos > n {
            pos -= n;
        }
        out.push(char_at(pos));
    }
    Ok(out)
}

/// Decrypt a string produced by [`encrypt`] with the same `key`.
pub fn decrypt(text: &str, key: &str) -> Result<String, CipherError> {
    let n = ALPHABET.len() as i64;
    let key = key_positions(key)?;

    let mut out = String::with_capacity(text.len());
    for (i, ch) in text.chars().enumerate() {
        let mut pos = position(ch)? as i64 - key[i % key.len()] as i64;
        if pos <= 0 {
            pos += n;
        }
        out.push(char_at(pos as u32));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn alphabet_has_no_duplicates() {
        let mut seen = std::collections::HashSet::new();
        for ch in ALPHABET.chars() {
            assert!(seen.insert(ch), "duplicate alphabet character {ch:?}");
        }
    }

    #[test]
    fn roundtrip_simple() {
        let text = "Hello, world. (42)";
        let key = "SECRET";
        let enc = encrypt(text, key).unwrap();
        assert_ne!(enc, text);
        assert_eq!(decrypt(&enc, key).unwrap(), text);
    }

    #[test]
    fn wraps_at_alphabet_end() {
        // Last alphabet char shifted by position 1 must wrap to the front.
        let last = ALPHABET.chars().last().unwrap().to_string();
        let enc = encrypt(&last, "a").unwrap();
        assert_eq!(enc, "a");
        assert_eq!(decrypt(&enc, "a").unwrap(), last);
    }

    #[test]
    fn rejects_unsupported_character() {
        let err = encrypt("héllo", "key").unwrap_err();
        assert!(matches!(err, CipherError::UnsupportedCharacter { ch: 'é' }));
    }

    #[test]
    fn rejects_unsupported_key_character() {
        let err = encrypt("hello", "kéy").unwrap_err();
        assert!(matches!(err, CipherError::UnsupportedCharacter { ch: 'é' }));
    }

    #[test]
    fn rejects_empty_key() {
        assert!(matches!(encrypt("hello", ""), Err(CipherError::EmptyKey)));
        assert!(matches!(decrypt("hello", ""), Err(CipherError::EmptyKey)));
    }

    fn alphabet_string(max_len: usize) -> impl Strategy<Value = String> {
        let chars: Vec<char> = ALPHABET.chars().collect();
        proptest::collection::vec(proptest::sample::select(chars), 0..max_len)
            .prop_map(|v| v.into_iter().collect())
    }

    proptest! {
        #[test]
        fn roundtrip_any_alphabet_text(
            text in alphabet_string(256),
            key in alphabet_string(32).prop_filter("non-empty key", |k| !k.is_empty()),
        ) {
            let enc = encrypt(&text, &key).unwrap();
            prop_assert_eq!(decrypt(&enc, &key).unwrap(), text);
        }
    }
}
