//! Note encryption with per-field signatures under an object-level salt.
//!
//! Notes carry their provenance inside each field: the writer signs every
//! field with a shared object salt, then encrypts the signed value. The salt
//! itself is signed into the note's `signature` slot, so a reader recovers it
//! first and then pins every field signature to it. Mixing fields from two
//! notes therefore breaks verification even when each field's own signature
//! is valid.

use crate::error::ClientResult;
use crate::types::Note;
use sealstore_crypto::{field, AccessKey, CryptoProvider};
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

/// Encrypts and decrypts notes.
pub struct NoteCipher {
    provider: Arc<dyn CryptoProvider>,
}

impl NoteCipher {
    pub fn new(provider: Arc<dyn CryptoProvider>) -> Self {
        Self { provider }
    }

    /// Signs and encrypts all data fields of a note.
    pub fn encrypt_note(
        &self,
        note: &Note,
        access_key: &AccessKey,
        signing_key: &[u8],
    ) -> ClientResult<Note> {
        let salt = Uuid::new_v4().to_string();
        let note_signature = field::sign_field(
            self.provider.as_ref(),
            "signature",
            &salt,
            signing_key,
            None,
        )?;
        let mut data = BTreeMap::new();
        for (name, value) in &note.data {
            let signed = field::sign_field(
                self.provider.as_ref(),
                name,
                value,
                signing_key,
                Some(&salt),
            )?;
            data.insert(
                name.clone(),
                field::encrypt_field(self.provider.as_ref(), &signed, access_key)?,
            );
        }
        let mut encrypted = note.clone();
        encrypted.data = data;
        encrypted.signature = Some(note_signature);
        Ok(encrypted)
    }

    /// Decrypts a note and verifies every field signature.
    ///
    /// The object salt is recovered from the note's signature field; a note
    /// written before field signing existed has no verifiable signature and
    /// its fields pass through the unsigned-fallback path unchanged.
    pub fn decrypt_note(
        &self,
        encrypted: &Note,
        access_key: &AccessKey,
        verifying_key: &[u8],
    ) -> ClientResult<Note> {
        let salt = match &encrypted.signature {
            Some(signature) => {
                let verified = field::verify_field(
                    self.provider.as_ref(),
                    "signature",
                    signature,
                    verifying_key,
                    None,
                )?;
                // An unsigned legacy value comes back unchanged; only a
                // stripped signature header yields the salt.
                (&verified != signature).then_some(verified)
            }
            None => None,
        };
        let mut data = BTreeMap::new();
        for (name, quad) in &encrypted.data {
            let raw = field::decrypt_field(self.provider.as_ref(), quad, access_key)?;
            let plain = field::verify_field(
                self.provider.as_ref(),
                name,
                &raw,
                verifying_key,
                salt.as_deref(),
            )?;
            data.insert(name.clone(), plain);
        }
        let mut decrypted = encrypted.clone();
        decrypted.data = data;
        Ok(decrypted)
    }
}
