//! Canonical document serialization and whole-document signatures.
//!
//! Signatures cover the plaintext meta+data pairing, so object keys must be
//! serialized in a deterministic order: two documents with identical key/value
//! pairs but different insertion order must sign identically. Keys are sorted
//! recursively before serialization.

use crate::codec;
use crate::error::CryptoResult;
use crate::provider::CryptoProvider;
use serde_json::Value;
use std::collections::BTreeMap;

/// Serializes a JSON value with all object keys sorted recursively.
pub fn canonicalize(value: &Value) -> String {
    sort_keys(value).to_string()
}

fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<String, Value> = map
                .iter()
                .map(|(k, v)| (k.clone(), sort_keys(v)))
                .collect();
            Value::Object(sorted.into_iter().collect())
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}

/// Signs a canonical document string, returning the base64url signature.
pub fn sign_document(
    provider: &dyn CryptoProvider,
    canonical: &str,
    signing_key: &[u8],
) -> CryptoResult<String> {
    let signature = provider.sign(canonical.as_bytes(), signing_key)?;
    Ok(codec::b64url_encode(&signature))
}

/// Verifies a base64url signature over a canonical document string.
pub fn verify_document_signature(
    provider: &dyn CryptoProvider,
    canonical: &str,
    signature: &str,
    verifying_key: &[u8],
) -> CryptoResult<bool> {
    let raw_signature = codec::b64url_decode(signature)?;
    provider.verify(&raw_signature, canonical.as_bytes(), verifying_key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn canonical_form_sorts_nested_keys() {
        let doc = json!({"b": {"z": 1, "a": [{"k": 2, "c": 3}]}, "a": "x"});
        assert_eq!(
            canonicalize(&doc),
            r#"{"a":"x","b":{"a":[{"c":3,"k":2}],"z":1}}"#
        );
    }
}
