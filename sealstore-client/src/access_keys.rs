//! Access key creation, caching, and sharing.
//!
//! One symmetric access key protects all fields of a (writer, user, record
//! type) scope. Keys are created lazily on first write, cached in memory for
//! the life of the client, and shared by re-encrypting them asymmetrically
//! per reader. Concurrent callers for the same scope are coalesced so at most
//! one generation or fetch round-trip happens per scope; unrelated scopes
//! never wait on each other.

use crate::error::{ClientError, ClientResult};
use crate::registry::KeyRegistry;
use crate::types::{ClientPublicKey, EakInfo, KeyPair};
use sealstore_crypto::{akwrap, codec, AccessKey, CryptoError, CryptoProvider};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info};
use uuid::Uuid;

/// Structured cache key for one access key scope.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AkCacheKey {
    pub writer_id: Uuid,
    pub user_id: Uuid,
    pub record_type: String,
}

impl AkCacheKey {
    pub fn new(writer_id: Uuid, user_id: Uuid, record_type: impl Into<String>) -> Self {
        Self {
            writer_id,
            user_id,
            record_type: record_type.into(),
        }
    }
}

impl fmt::Display for AkCacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.writer_id, self.user_id, self.record_type)
    }
}

type AkCell = Arc<OnceCell<AccessKey>>;

/// Manages the per-client access key cache and the sharing operations on it.
pub struct AccessKeyManager {
    provider: Arc<dyn CryptoProvider>,
    registry: Arc<dyn KeyRegistry>,
    client_id: Uuid,
    encryption_keys: KeyPair,
    cache: Mutex<HashMap<AkCacheKey, AkCell>>,
}

impl AccessKeyManager {
    pub fn new(
        provider: Arc<dyn CryptoProvider>,
        registry: Arc<dyn KeyRegistry>,
        client_id: Uuid,
        encryption_keys: KeyPair,
    ) -> Self {
        Self {
            provider,
            registry,
            client_id,
            encryption_keys,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn client_id(&self) -> Uuid {
        self.client_id
    }

    /// Gets the access key for a scope, fetching or lazily creating it.
    ///
    /// Cache miss order: fetch the EAK issued to this client and unwrap it;
    /// if none exists and this client is the writer, generate a fresh key and
    /// publish a self-wrapped EAK. A reader with no shared EAK gets
    /// [`ClientError::KeyUnavailable`].
    ///
    /// Per-scope single-flight: all concurrent callers for one scope await
    /// the same in-flight initialization and observe the same key.
    pub async fn get_or_create(&self, scope: &AkCacheKey) -> ClientResult<AccessKey> {
        let cell = {
            let mut cache = self.cache.lock().await;
            cache
                .entry(scope.clone())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };
        let result = cell
            .get_or_try_init(|| self.fetch_or_generate(scope))
            .await
            .cloned();
        if result.is_err() {
            // Leave no empty cell behind; the next caller reaches the
            // registry again instead of re-awaiting a dead slot.
            let mut cache = self.cache.lock().await;
            if cache.get(scope).is_some_and(|c| c.get().is_none()) {
                cache.remove(scope);
            }
        }
        result
    }

    async fn fetch_or_generate(&self, scope: &AkCacheKey) -> ClientResult<AccessKey> {
        let existing = self
            .registry
            .get_eak(
                scope.writer_id,
                scope.user_id,
                self.client_id,
                &scope.record_type,
            )
            .await?;
        if let Some(eak) = existing {
            debug!(scope = %scope, "unwrapping existing access key");
            return self.unwrap_eak(&eak, scope);
        }
        if scope.writer_id != self.client_id {
            return Err(ClientError::KeyUnavailable(
                scope.to_string(),
                "no access key has been shared with this client".into(),
            ));
        }
        info!(scope = %scope, "creating access key for new scope");
        let ak = AccessKey::random(self.provider.as_ref());
        let self_eak = self.wrap_for_reader(&ak, &self.encryption_keys.public_key)?;
        self.registry
            .put_eak(
                scope.writer_id,
                scope.user_id,
                self.client_id,
                &scope.record_type,
                self_eak,
            )
            .await?;
        Ok(ak)
    }

    /// Wraps an access key for a reader's public key, producing an EAK with
    /// this client as the authorizer. The nonce is fresh per call, so two
    /// wraps of the same key never yield the same ciphertext.
    pub fn wrap_for_reader(
        &self,
        access_key: &AccessKey,
        reader_public_key: &[u8],
    ) -> ClientResult<EakInfo> {
        let eak = akwrap::encrypt_access_key(
            self.provider.as_ref(),
            access_key,
            &self.encryption_keys.private_key,
            reader_public_key,
        )?;
        Ok(EakInfo {
            eak,
            authorizer_id: self.client_id,
            authorizer_public_key: ClientPublicKey {
                curve25519: self.encryption_keys.public_b64(),
            },
            signer_id: None,
            signer_signing_key: None,
        })
    }

    /// Unwraps an EAK issued to this client.
    pub fn unwrap_eak(&self, eak: &EakInfo, scope: &AkCacheKey) -> ClientResult<AccessKey> {
        let authorizer_public = codec::b64url_decode(&eak.authorizer_public_key.curve25519)?;
        akwrap::decrypt_access_key(
            self.provider.as_ref(),
            &eak.eak,
            &authorizer_public,
            &self.encryption_keys.private_key,
        )
        .map_err(|e| match e {
            CryptoError::Decryption(msg) => ClientError::KeyUnavailable(scope.to_string(), msg),
            other => ClientError::Crypto(other),
        })
    }

    /// Shares the access key for a scope this client writes with a reader.
    ///
    /// Creates the writer's own key first if the scope is new.
    pub async fn share_with_reader(
        &self,
        scope: &AkCacheKey,
        reader_id: Uuid,
        reader_public_key: &[u8],
    ) -> ClientResult<()> {
        let ak = self.get_or_create(scope).await?;
        let eak = self.wrap_for_reader(&ak, reader_public_key)?;
        self.registry
            .put_eak(
                scope.writer_id,
                scope.user_id,
                reader_id,
                &scope.record_type,
                eak,
            )
            .await?;
        info!(scope = %scope, reader = %reader_id, "shared access key with reader");
        Ok(())
    }

    /// Revokes a reader's EAK and drops the local cache entry.
    ///
    /// Revocation is not retroactive: a key the revoked reader already
    /// unwrapped and cached on their side stays readable to them until the
    /// scope's access key is rotated by the sharing collaborator. This
    /// protocol alone cannot claw it back.
    pub async fn revoke(&self, scope: &AkCacheKey, reader_id: Uuid) -> ClientResult<()> {
        self.registry
            .delete_eak(scope.writer_id, scope.user_id, reader_id, &scope.record_type)
            .await?;
        self.cache.lock().await.remove(scope);
        info!(scope = %scope, reader = %reader_id, "revoked access key");
        Ok(())
    }
}
