//! Tests for log Entry encoding and decoding
//!
//! These tests verify:
//! - Round-trip encoding for puts, tombstones and namespaces
//! - size() matches the encoded length
//! - Header-only decoding
//! - Edge cases (truncation, unknown marks, empty fields)

use caskkv::log::{Entry, EntryHeader, Mark, HEADER_SIZE};
use caskkv::CaskError;
use proptest::prelude::*;

// =============================================================================
// Round-Trip Tests
// =============================================================================

#[test]
fn test_encode_decode_put() {
    let entry = Entry::put("users", "alice", "admin");

    let bytes = entry.encode().unwrap();
    let recovered = Entry::decode(&bytes).unwrap();

    assert_eq!(recovered, entry);
    assert_eq!(recovered.mark, Mark::Put);
}

#[test]
fn test_encode_decode_tombstone() {
    let entry = Entry::delete("users", "alice");

    let bytes = entry.encode().unwrap();
    let recovered = Entry::decode(&bytes).unwrap();

    assert_eq!(recovered, entry);
    assert!(recovered.is_tombstone());
    assert!(recovered.value.is_empty());
}

#[test]
fn test_encode_decode_empty_namespace() {
    let entry = Entry::put("", "key", "value");

    let bytes = entry.encode().unwrap();
    assert_eq!(bytes.len(), HEADER_SIZE + 3 + 5);

    let recovered = Entry::decode(&bytes).unwrap();
    assert_eq!(recovered.namespace, b"");
}

#[test]
fn test_encode_decode_empty_value() {
    let entry = Entry::put("ns", "key", "");

    let recovered = Entry::decode(&entry.encode().unwrap()).unwrap();

    assert_eq!(recovered, entry);
    assert_eq!(recovered.mark, Mark::Put);
}

#[test]
fn test_decode_ignores_trailing_bytes() {
    let first = Entry::put("a", "k1", "v1");
    let second = Entry::put("b", "k2", "v2");

    let mut bytes = first.encode().unwrap();
    bytes.extend(second.encode().unwrap());

    assert_eq!(Entry::decode(&bytes).unwrap(), first);
    let stride = first.size() as usize;
    assert_eq!(Entry::decode(&bytes[stride..]).unwrap(), second);
}

// =============================================================================
// Size Tests
// =============================================================================

#[test]
fn test_size_matches_encoded_length() {
    let entry = Entry::put("namespace", "some-key", vec![7u8; 300]);

    assert_eq!(entry.size(), entry.encode().unwrap().len() as u64);
    assert_eq!(entry.size(), (HEADER_SIZE + 9 + 8 + 300) as u64);
}

#[test]
fn test_size_recomputed_after_mutation() {
    let mut entry = Entry::put("ns", "k", "short");
    entry.value = b"a considerably longer value".to_vec();

    let bytes = entry.encode().unwrap();
    let header = EntryHeader::decode(&bytes).unwrap();

    assert_eq!(header.value_len as usize, entry.value.len());
    assert_eq!(header.entry_size(), entry.size());
}

// =============================================================================
// Header Tests
// =============================================================================

#[test]
fn test_decode_header_only() {
    let entry = Entry::put("ns", "key", "value");
    let bytes = entry.encode().unwrap();

    let header = EntryHeader::decode(&bytes[..HEADER_SIZE]).unwrap();

    assert_eq!(header.key_len, 3);
    assert_eq!(header.value_len, 5);
    assert_eq!(header.namespace_len, 2);
    assert_eq!(header.mark, Mark::Put);
    assert_eq!(header.payload_len(), 10);
}

#[test]
fn test_decode_header_too_short() {
    let result = EntryHeader::decode(&[0u8; HEADER_SIZE - 1]);

    assert!(matches!(result, Err(CaskError::CorruptRecord { .. })));
}

#[test]
fn test_decode_unknown_mark() {
    let mut bytes = Entry::put("", "k", "v").encode().unwrap();
    bytes[12] = 0xFF;

    let result = Entry::decode(&bytes);

    let err = result.unwrap_err();
    assert!(err.is_corruption());
    assert!(matches!(err, CaskError::CorruptRecord { .. }));
}

#[test]
fn test_decode_truncated_payload() {
    let bytes = Entry::put("ns", "key", "value").encode().unwrap();

    let result = Entry::decode(&bytes[..bytes.len() - 2]);

    assert!(matches!(result, Err(CaskError::TornRecord { .. })));
}

#[test]
fn test_mark_conversion() {
    assert_eq!(Mark::try_from(0u16), Ok(Mark::Put));
    assert_eq!(Mark::try_from(1u16), Ok(Mark::Delete));
    assert_eq!(Mark::try_from(2u16), Err(2));
    assert_eq!(Mark::Delete.as_u16(), 1);
}

// =============================================================================
// Property Tests
// =============================================================================

fn arb_entry() -> impl Strategy<Value = Entry> {
    (
        prop::collection::vec(any::<u8>(), 0..32),
        prop::collection::vec(any::<u8>(), 1..64),
        prop::collection::vec(any::<u8>(), 0..256),
        any::<bool>(),
    )
        .prop_map(|(namespace, key, value, tombstone)| {
            if tombstone {
                Entry::delete(namespace, key)
            } else {
                Entry::put(namespace, key, value)
            }
        })
}

proptest! {
    #[test]
    fn prop_decode_inverts_encode(entry in arb_entry()) {
        let bytes = entry.encode().unwrap();

        prop_assert_eq!(bytes.len() as u64, entry.size());
        prop_assert_eq!(Entry::decode(&bytes).unwrap(), entry);
    }
}
