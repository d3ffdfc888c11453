//! Shannon–Fano entropy codec: prefix-code bitstrings + serializable tables.
//!
//! # Code assignment
//! Characters are ranked by frequency (descending), ties broken by first
//! occurrence in the input (ascending).  The ranked list is split
//! recursively into two contiguous groups with near-equal frequency mass;
//! the left group takes a `0` prefix, the right a `1`.  The tie-break makes
//! the table deterministic: two inputs with the same frequency profile and
//! the same first-occurrence order always produce identical tables.
//!
//! # Wire form
//! A table travels next to its bitstring as `char:code` pairs joined by `|`.
//! The character half is percent-encoded, so `:` and `|` can never appear
//! inside it; the code half is binary digits only.  The pair separator is
//! unambiguous by construction.
//!
//! # Decode discipline
//! Decoding is a greedy prefix match.  The accumulator is bounded by
//! [`MAX_CODE_LEN`]; running past that bound, or ending the stream with
//! unmatched bits, means the bitstring and table disagree — decoding MUST
//! fail, never return a partial result.

use percent_encoding::{percent_decode_str, utf8_percent_encode, NON_ALPHANUMERIC};
use std::collections::HashMap;
use thiserror::Error;

/// Upper bound on a single prefix code during decode.  No table produced by
/// [`encode`] on realistic inputs comes close; exceeding it means the
/// bitstream does not belong to the table.
pub const MAX_CODE_LEN: usize = 20;

#[derive(Error, Debug)]
pub enum CodecError {
    /// The input contained a character absent from the code table.
    /// Cannot happen when the table was built from the same text.
    #[error("no code assigned for character {ch:?}")]
    MissingCode { ch: char },
    /// The bitstream cannot be matched against the table.
    #[error("corrupt bitstream at bit {position}: {detail}")]
    CorruptBitstream { position: usize, detail: String },
    /// Two table entries share one code — the table is not invertible.
    /// Indicates a bug in the table builder, not bad input.
    #[error("duplicate code {code:?} for characters {first:?} and {second:?}")]
    DuplicateCode { code: String, first: char, second: char },
    /// A serialized table entry is not `<percent-encoded-char>:<code>`.
    #[error("malformed code table entry {entry:?}")]
    MalformedTable { entry: String },
}

// ── Code table ───────────────────────────────────────────────────────────────

/// Ordered `(character, code)` pairs.  Order follows the frequency ranking
/// used at build time, which keeps the wire form deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeTable {
    entries: Vec<(char, String)>,
}

impl CodeTable {
    #[cfg(test)]
    pub(crate) fn from_entries(entries: Vec<(char, String)>) -> Self {
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[(char, String)] {
        &self.entries
    }

    pub fn code_for(&self, ch: char) -> Option<&str> {
        self.entries
            .iter()
            .find(|(c, _)| *c == ch)
            .map(|(_, code)| code.as_str())
    }

    /// Invert to a `code -> character` map, rejecting duplicate codes.
    pub fn invert(&self) -> Result<HashMap<&str, char>, CodecError> {
        let mut map: HashMap<&str, char> = HashMap::with_capacity(self.entries.len());
        for (ch, code) in &self.entries {
            if let Some(prev) = map.insert(code.as_str(), *ch) {
                return Err(CodecError::DuplicateCode {
                    code: code.clone(),
                    first: prev,
                    second: *ch,
                });
            }
        }
        Ok(map)
    }

    /// Serialize as `char:code` pairs joined by `|`, characters
    /// percent-encoded.  The output never contains `::`, so it can sit to
    /// the right of the payload separator.
    pub fn to_wire(&self) -> String {
        self.entries
            .iter()
            .map(|(ch, code)| {
                let mut buf = [0u8; 4];
                let encoded = utf8_percent_encode(ch.encode_utf8(&mut buf), NON_ALPHANUMERIC);
                format!("{encoded}:{code}")
            })
            .collect::<Vec<_>>()
            .join("|")
    }

    /// Parse the wire form produced by [`CodeTable::to_wire`].
    pub fn from_wire(wire: &str) -> Result<Self, CodecError> {
        if wire.is_empty() {
            return Ok(Self::default());
        }
        let mut entries = Vec::new();
        for pair in wire.split('|') {
            let malformed = || CodecError::MalformedTable { entry: pair.to_string() };
            let (enc_ch, code) = pair.split_once(':').ok_or_else(malformed)?;
            if code.is_empty() || !code.bytes().all(|b| b == b'0' || b == b'1') {
                return Err(malformed());
            }
            let decoded = percent_decode_str(enc_ch)
                .decode_utf8()
                .map_err(|_| malformed())?;
            let mut chars = decoded.chars();
            let ch = chars.next().ok_or_else(malformed)?;
            if chars.next().is_some() {
                return Err(malformed());
            }
            entries.push((ch, code.to_string()));
        }
        Ok(Self { entries })
    }
}

// ── Encoding ─────────────────────────────────────────────────────────────────

/// Result of [`encode`]: the concatenated prefix codes plus the table
/// required to invert them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoded {
    pub bits: String,
    pub table: CodeTable,
}

struct FreqNode {
    ch: char,
    freq: u64,
    first_occurrence: usize,
}

fn frequencies(text: &str) -> Vec<FreqNode> {
    let mut map: HashMap<char, (u64, usize)> = HashMap::new();
    for (i, ch) in text.chars().enumerate() {
        map.entry(ch).or_insert((0, i)).0 += 1;
    }
    let mut nodes: Vec<FreqNode> = map
        .into_iter()
        .map(|(ch, (freq, first_occurrence))| FreqNode { ch, freq, first_occurrence })
        .collect();
    nodes.sort_by(|a, b| {
        b.freq
            .cmp(&a.freq)
            .then(a.first_occurrence.cmp(&b.first_occurrence))
    });
    nodes
}

/// Recursively assign prefix codes to a frequency-ranked slice.
///
/// The split point is the first index where the running sum reaches half the
/// total mass; including vs excluding that element is decided by whichever
/// lands closer to half (ties include).  A slice that yields no split point
/// falls back to "all but the last element".
fn assign_codes(nodes: &[FreqNode], prefix: &str, table: &mut Vec<(char, String)>) {
    match nodes {
        [] => {}
        [node] => {
            let code = if prefix.is_empty() { "0".to_string() } else { prefix.to_string() };
            table.push((node.ch, code));
        }
        _ => {
            let total: u64 = nodes.iter().map(|n| n.freq).sum();
            let half = total as f64 / 2.0;

            let mut left_sum = 0u64;
            let mut split = 0usize;
            for (i, node) in nodes.iter().enumerate() {
                left_sum += node.freq;
                if left_sum as f64 >= half {
                    let without = left_sum - node.freq;
                    let diff_with = (left_sum as f64 - half).abs();
                    let diff_without = (without as f64 - half).abs();
                    split = if diff_with <= diff_without { i + 1 } else { i };
                    break;
                }
            }
            if split == 0 {
                split = nodes.len() - 1;
            }

            assign_codes(&nodes[..split], &format!("{prefix}0"), table);
            assign_codes(&nodes[split..], &format!("{prefix}1"), table);
        }
    }
}

/// Build a Shannon–Fano table over `text` and encode it.
///
/// An empty input produces empty bits and an empty table.
pub fn encode(text: &str) -> Result<Encoded, CodecError> {
    if text.is_empty() {
        return Ok(Encoded { bits: String::new(), table: CodeTable::default() });
    }

    let nodes = frequencies(text);
    let mut entries = Vec::with_capacity(nodes.len());
    assign_codes(&nodes, "", &mut entries);

    let lookup: HashMap<char, &str> =
        entries.iter().map(|(ch, code)| (*ch, code.as_str())).collect();

    let mut bits = String::new();
    for ch in text.chars() {
        let code = lookup.get(&ch).ok_or(CodecError::MissingCode { ch })?;
        bits.push_str(code);
    }

    Ok(Encoded { bits, table: CodeTable { entries } })
}

/// Decode a bitstring against its table.
///
/// Empty bits with an empty table decode to the empty string.  Any bit
/// sequence the table cannot account for is a
/// [`CodecError::CorruptBitstream`].
pub fn decode(bits: &str, table: &CodeTable) -> Result<String, CodecError> {
    if bits.is_empty() && table.is_empty() {
        return Ok(String::new());
    }
    let inverse = table.invert()?;

    let mut out = String::new();
    let mut acc = String::new();
    for (i, bit) in bits.chars().enumerate() {
        acc.push(bit);
        if let Some(&ch) = inverse.get(acc.as_str()) {
            out.push(ch);
            acc.clear();
        } else if acc.len() > MAX_CODE_LEN {
            return Err(CodecError::CorruptBitstream {
                position: i + 1,
                detail: format!("accumulator {acc:?} exceeds {MAX_CODE_LEN} bits"),
            });
        }
    }

    if !acc.is_empty() {
        return Err(CodecError::CorruptBitstream {
            position: bits.len(),
            detail: format!("{} trailing unmatched bit(s)", acc.len()),
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn aaabbc_frequency_order_and_code_lengths() {
        let Encoded { bits, table } = encode("aaabbc").unwrap();

        let ranked: Vec<char> = table.entries().iter().map(|(ch, _)| *ch).collect();
        assert_eq!(ranked, vec!['a', 'b', 'c']);

        // a(3) splits off alone: "0"; b(2) and c(1) share the "1" branch.
        let a = table.code_for('a').unwrap().len();
        let b = table.code_for('b').unwrap().len();
        let c = table.code_for('c').unwrap().len();
        assert!(a < c, "most frequent char must get a shorter code");
        assert!(b <= c);

        assert_eq!(decode(&bits, &table).unwrap(), "aaabbc");
    }

    #[test]
    fn single_symbol_input_gets_code_zero() {
        let Encoded { bits, table } = encode("zzzz").unwrap();
        assert_eq!(table.code_for('z'), Some("0"));
        assert_eq!(bits, "0000");
        assert_eq!(decode(&bits, &table).unwrap(), "zzzz");
    }

    #[test]
    fn empty_input_roundtrip() {
        let enc = encode("").unwrap();
        assert!(enc.bits.is_empty());
        assert!(enc.table.is_empty());
        assert_eq!(decode("", &enc.table).unwrap(), "");
    }

    #[test]
    fn tie_break_is_first_occurrence() {
        // Equal frequencies: ranking must follow first appearance.
        let enc = encode("xyxy").unwrap();
        let ranked: Vec<char> = enc.table.entries().iter().map(|(ch, _)| *ch).collect();
        assert_eq!(ranked, vec!['x', 'y']);
    }

    #[test]
    fn table_satisfies_prefix_property() {
        let enc = encode("the quick brown fox jumps over the lazy dog; 0123456789").unwrap();
        let codes: Vec<&str> = enc.table.entries().iter().map(|(_, c)| c.as_str()).collect();
        for (i, a) in codes.iter().enumerate() {
            for (j, b) in codes.iter().enumerate() {
                if i != j {
                    assert!(!b.starts_with(a), "{a:?} is a prefix of {b:?}");
                }
            }
        }
    }

    #[test]
    fn wire_roundtrip_escapes_separators() {
        // ':' and '|' in the character payload must survive the wire form.
        let text = "a:b|c=d;e\nf a:b|c";
        let enc = encode(text).unwrap();
        let wire = enc.table.to_wire();
        assert!(!wire.contains("::"), "wire form must not contain the payload separator");
        let parsed = CodeTable::from_wire(&wire).unwrap();
        assert_eq!(parsed, enc.table);
        assert_eq!(decode(&enc.bits, &parsed).unwrap(), text);
    }

    #[test]
    fn decode_rejects_trailing_bits() {
        let enc = encode("abcabcab").unwrap();
        let mut bits = enc.bits.clone();
        bits.push('1');
        // Either the extra bit dangles or it corrupts the tail; both are fatal.
        assert!(matches!(
            decode(&bits, &enc.table),
            Err(CodecError::CorruptBitstream { .. })
        ));
    }

    #[test]
    fn decode_rejects_unbounded_accumulator() {
        // No code in this table starts with '1', so the accumulator can
        // never match and must trip the length bound.
        let table = CodeTable::from_entries(vec![
            ('a', "00".into()),
            ('b', "01".into()),
        ]);
        let bits = "1".repeat(MAX_CODE_LEN + 2);
        assert!(matches!(
            decode(&bits, &table),
            Err(CodecError::CorruptBitstream { .. })
        ));
    }

    #[test]
    fn invert_detects_duplicate_codes() {
        let table = CodeTable::from_entries(vec![
            ('a', "01".into()),
            ('b', "01".into()),
        ]);
        assert!(matches!(table.invert(), Err(CodecError::DuplicateCode { .. })));
    }

    #[test]
    fn from_wire_rejects_garbage() {
        assert!(CodeTable::from_wire("a").is_err());
        assert!(CodeTable::from_wire("a:").is_err());
        assert!(CodeTable::from_wire("a:012").is_err());
        assert!(CodeTable::from_wire(":01").is_err());
    }

    proptest! {
        #[test]
        fn roundtrip_any_text(text in "\\PC{0,300}") {
            let enc = encode(&text).unwrap();
            prop_assert_eq!(decode(&enc.bits, &enc.table).unwrap(), text.clone());

            let wire = enc.table.to_wire();
            let parsed = CodeTable::from_wire(&wire).unwrap();
            prop_assert_eq!(decode(&enc.bits, &parsed).unwrap(), text);
        }
    }
}
