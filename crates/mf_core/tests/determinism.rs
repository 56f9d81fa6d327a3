//! Byte-level determinism of the JSON output.

mod common;

use common::{synthetic_match, US};
use mf_core::{extract, extract_features_json, ExtractionConfig};
use serde_json::json;
use sha2::{Digest, Sha256};

fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest {
        out.push_str(&format!("{:02x}", b));
    }
    out
}

fn request(seed: u64) -> String {
    json!({
        "schema_version": 1,
        "config": ExtractionConfig::new(US),
        "events": synthetic_match(seed, 250),
    })
    .to_string()
}

#[test]
fn json_output_is_byte_identical_across_runs() {
    let request = request(2024);
    let first = extract_features_json(&request).unwrap();
    let second = extract_features_json(&request).unwrap();
    assert_eq!(sha256_hex(first.as_bytes()), sha256_hex(second.as_bytes()));
}

#[test]
fn different_inputs_hash_differently() {
    let a = extract_features_json(&request(1)).unwrap();
    let b = extract_features_json(&request(2)).unwrap();
    assert_ne!(sha256_hex(a.as_bytes()), sha256_hex(b.as_bytes()));
}

#[test]
fn tables_equal_after_reextraction() {
    let events = synthetic_match(99, 180);
    let config = ExtractionConfig::new(US);
    let first = extract(&events, None, &config).unwrap();
    let second = extract(&events, None, &config).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}
