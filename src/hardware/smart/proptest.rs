//! Property-Based Tests for the Binary SMART Decoder
//!
//! # Test Properties
//!
//! 1. **Determinism**: decoding the same input twice yields the same map
//! 2. **Resynchronization**: zero padding before a record never hides it
//! 3. **Noise Tolerance**: whitespace and delimiters between hex digits are ignored
//! 4. **Wear Leveling**: id 0xB1 always produces exactly the `_raw`/`_value` pair

#![cfg(test)]

use proptest::prelude::*;

use super::binary::tests::{record, to_hex};
use super::binary::{decode_smart_bytes, decode_smart_hex};

// =============================================================================
// Property Strategies
// =============================================================================

/// One well-formed record with a non-zero id.
fn record_strategy() -> impl Strategy<Value = Vec<u8>> {
    (1u8..=255, any::<u8>(), any::<[u8; 6]>())
        .prop_map(|(id, normalized, raw)| record(id, normalized, raw))
}

/// A header followed by a run of records.
fn stream_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(record_strategy(), 0..16).prop_map(|records| {
        let mut bytes = vec![0x2F, 0x00];
        for r in records {
            bytes.extend(r);
        }
        bytes
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property: decoding is a pure function of its input.
    #[test]
    fn prop_decode_is_deterministic(bytes in stream_strategy()) {
        let hex = to_hex(&bytes);
        prop_assert_eq!(decode_smart_hex(&hex), decode_smart_hex(&hex));
    }

    /// Property: zero bytes ahead of aligned records only cost one byte each.
    #[test]
    fn prop_zero_padding_resyncs(
        bytes in stream_strategy(),
        padding in 1usize..24,
    ) {
        let mut padded = bytes[..2].to_vec();
        padded.extend(std::iter::repeat(0u8).take(padding));
        padded.extend_from_slice(&bytes[2..]);

        prop_assert_eq!(decode_smart_bytes(&padded), decode_smart_bytes(&bytes));
    }

    /// Property: separators between hex digits do not change the result.
    #[test]
    fn prop_separators_are_ignored(bytes in stream_strategy()) {
        let plain = to_hex(&bytes);
        let spaced: String = bytes
            .chunks(2)
            .map(to_hex)
            .collect::<Vec<_>>()
            .join(" \n");

        prop_assert_eq!(decode_smart_hex(&spaced), decode_smart_hex(&plain));
    }

    /// Property: wear leveling is always reported as a pair.
    #[test]
    fn prop_wear_leveling_is_pair(normalized in any::<u8>(), raw in any::<[u8; 6]>()) {
        let attributes = decode_smart_bytes(&record(0xB1, normalized, raw));

        prop_assert_eq!(attributes.len(), 2);
        prop_assert_eq!(attributes["wear_leveling_count_value"], f64::from(normalized));
        prop_assert!(attributes.contains_key("wear_leveling_count_raw"));
    }

    /// Property: temperature never exceeds one byte.
    #[test]
    fn prop_temperature_is_single_byte(raw in any::<[u8; 6]>()) {
        let attributes = decode_smart_bytes(&record(0xC2, 100, raw));
        prop_assert_eq!(attributes["temperature_celsius"], f64::from(raw[0]));
    }
}
