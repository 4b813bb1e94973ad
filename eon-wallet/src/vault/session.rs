//! Vault session management
//!
//! Owns the unlocked [`Wallet`] and the single-slot derived-key cache.
//! The cache holds at most one password's key at a time, is replaced on
//! each unlock and invalidated on any failed decrypt and on lock. A lock
//! epoch counter makes keys derived by in-flight stretches unusable once
//! `lock` has run, even if the stretch completes afterward.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use zeroize::Zeroize;

use crate::account::{Wallet, WalletDocument};
use crate::error::{Error, Result};

use super::{
    decode_salt, decrypt_vault_with_key, derive_vault_key, encrypt_vault, migrate_legacy,
    EncryptedVault, StoredVault, VaultKey,
};

/// Default idle period before the session locks itself
pub const DEFAULT_AUTO_LOCK: Duration = Duration::from_secs(15 * 60);

struct CachedKey {
    password: String,
    key: VaultKey,
    epoch: u64,
}

impl Drop for CachedKey {
    fn drop(&mut self) {
        self.password.zeroize();
    }
}

/// A wallet session: unlocked state plus the derived-key cache
pub struct VaultSession {
    wallet: Mutex<Option<Wallet>>,
    cached_key: Mutex<Option<CachedKey>>,
    epoch: AtomicU64,
    auto_lock: Duration,
    last_used: Mutex<Instant>,
}

impl VaultSession {
    /// Create a session with the default auto-lock period
    pub fn new() -> Self {
        Self::with_auto_lock(DEFAULT_AUTO_LOCK)
    }

    /// Create a session with a custom auto-lock period
    pub fn with_auto_lock(auto_lock: Duration) -> Self {
        Self {
            wallet: Mutex::new(None),
            cached_key: Mutex::new(None),
            epoch: AtomicU64::new(0),
            auto_lock,
            last_used: Mutex::new(Instant::now()),
        }
    }

    /// Unlock the session from a stored vault record.
    ///
    /// Key stretching runs on the blocking pool. Returns the upgraded vault
    /// record when a legacy-format vault was migrated, so the caller can
    /// persist it; `None` otherwise.
    pub async fn unlock(
        &self,
        stored: &StoredVault,
        password: &str,
    ) -> Result<Option<EncryptedVault>> {
        let epoch = self.epoch.load(Ordering::SeqCst);

        match stored {
            StoredVault::Current(vault) => {
                let salt = decode_salt(vault)?;
                let key = match self.cached_key(password, epoch).await {
                    Some(key) => key,
                    None => {
                        let password = password.to_string();
                        tokio::task::spawn_blocking(move || derive_vault_key(&password, &salt))
                            .await
                            .map_err(|e| Error::Unknown(e.to_string()))?
                    }
                };

                match decrypt_vault_with_key(vault, &key) {
                    Ok(document) => {
                        let wallet = Wallet::from_document(&document, None)?;
                        self.install(wallet, password, Some(key), epoch).await?;
                        Ok(None)
                    }
                    Err(e) => {
                        self.invalidate_key().await;
                        Err(e)
                    }
                }
            }
            StoredVault::Legacy(blob) => {
                let blob = blob.clone();
                let password_owned = password.to_string();
                let migrated = tokio::task::spawn_blocking(move || {
                    migrate_legacy(&blob, &password_owned)
                })
                .await
                .map_err(|e| Error::Unknown(e.to_string()))?;

                match migrated {
                    Ok((document, upgraded)) => {
                        let wallet = Wallet::from_document(&document, None)?;
                        self.install(wallet, password, None, epoch).await?;
                        Ok(Some(upgraded))
                    }
                    Err(e) => {
                        self.invalidate_key().await;
                        Err(e)
                    }
                }
            }
        }
    }

    /// Lock the session: bump the epoch, drop the key cache and zeroize the
    /// wallet. Keys derived before the lock are unusable afterward.
    pub async fn lock(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.invalidate_key().await;
        let mut slot = self.wallet.lock().await;
        *slot = None;
        tracing::debug!("vault session locked");
    }

    /// Whether a wallet is currently unlocked
    pub async fn is_unlocked(&self) -> bool {
        self.auto_lock_if_idle().await;
        self.wallet.lock().await.is_some()
    }

    /// Run a closure against the unlocked wallet
    pub async fn with_wallet<R>(&self, f: impl FnOnce(&Wallet) -> R) -> Result<R> {
        self.auto_lock_if_idle().await;
        let slot = self.wallet.lock().await;
        match slot.as_ref() {
            Some(wallet) => {
                self.touch().await;
                Ok(f(wallet))
            }
            None => Err(Error::SessionLocked),
        }
    }

    /// Run a closure that mutates the unlocked wallet
    pub async fn with_wallet_mut<R>(&self, f: impl FnOnce(&mut Wallet) -> R) -> Result<R> {
        self.auto_lock_if_idle().await;
        let mut slot = self.wallet.lock().await;
        match slot.as_mut() {
            Some(wallet) => {
                self.touch().await;
                Ok(f(wallet))
            }
            None => Err(Error::SessionLocked),
        }
    }

    /// Re-encrypt a wallet document for persistence.
    ///
    /// Uses a fresh salt, so the stretch runs on the blocking pool rather
    /// than reusing the cached key.
    pub async fn persist(&self, document: &WalletDocument, password: &str) -> Result<EncryptedVault> {
        let epoch = self.epoch.load(Ordering::SeqCst);
        let document = document.clone();
        let password = password.to_string();

        let vault = tokio::task::spawn_blocking(move || encrypt_vault(&document, &password))
            .await
            .map_err(|e| Error::Unknown(e.to_string()))??;

        if self.epoch.load(Ordering::SeqCst) != epoch {
            return Err(Error::SessionLocked);
        }
        self.touch().await;
        Ok(vault)
    }

    async fn install(
        &self,
        wallet: Wallet,
        password: &str,
        key: Option<VaultKey>,
        epoch: u64,
    ) -> Result<()> {
        let mut slot = self.wallet.lock().await;
        // a lock() that ran while we were stretching wins
        if self.epoch.load(Ordering::SeqCst) != epoch {
            return Err(Error::SessionLocked);
        }
        *slot = Some(wallet);
        drop(slot);

        if let Some(key) = key {
            let mut cached = self.cached_key.lock().await;
            *cached = Some(CachedKey {
                password: password.to_string(),
                key,
                epoch,
            });
        }
        self.touch().await;
        tracing::debug!("vault session unlocked");
        Ok(())
    }

    async fn cached_key(&self, password: &str, epoch: u64) -> Option<VaultKey> {
        let cached = self.cached_key.lock().await;
        cached
            .as_ref()
            .filter(|c| c.epoch == epoch && c.password == password)
            .map(|c| c.key.clone())
    }

    async fn invalidate_key(&self) {
        let mut cached = self.cached_key.lock().await;
        *cached = None;
    }

    async fn auto_lock_if_idle(&self) {
        let idle = {
            let last_used = self.last_used.lock().await;
            last_used.elapsed()
        };
        if idle < self.auto_lock {
            return;
        }
        let unlocked = self.wallet.lock().await.is_some();
        if unlocked {
            tracing::info!(idle_secs = idle.as_secs(), "auto-locking idle session");
            self.lock().await;
        }
    }

    async fn touch(&self) {
        let mut last_used = self.last_used.lock().await;
        *last_used = Instant::now();
    }
}

impl Default for VaultSession {
    fn default() -> Self {
        Self::new()
    }
}
