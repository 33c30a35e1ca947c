//! Handle-scoped entry point.
//!
//! A [`Session`] is the initialized security context every operation runs
//! under. It owns the key store, the three engines and the last-operation
//! metrics. `init` returns a ready session and `deinit` consumes it, so a
//! deinitialized session cannot be used again.

use crate::config::SessionConfig;
use crate::crypto::{AesEngine, GcmEngine, RsaEngine, hardware_acceleration_available};
use crate::error::{Result, SecurityError, SecurityStatus};
use crate::keystore::{KeyLookup, KeyMaterial, KeyStore, STORED_IV_LEN};
use crate::metrics::{OperationKind, OperationMetrics};
use crate::params::{AesParams, GcmOutput, GcmParams, KeyType, RsaParams};
use crate::validate::{self, ParamLimits};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Process-wide session counter; ids are unique for the process lifetime.
static SESSION_COUNTER: AtomicU64 = AtomicU64::new(1);

/// An initialized security context.
pub struct Session {
    id: u64,
    config: SessionConfig,
    keys: Arc<KeyStore>,
    aes: AesEngine,
    rsa: RsaEngine,
    gcm: GcmEngine,
    hardware_acceleration_detected: bool,
    /// Last operation metrics (interior mutability for observability)
    last_metrics: Arc<Mutex<OperationMetrics>>,
}

impl Session {
    /// Initialize a session with default limits.
    pub fn init() -> Result<Self> {
        Self::with_config(SessionConfig::default())
    }

    /// Initialize a session with explicit limits.
    ///
    /// # Errors
    /// `InvalidInputParams` if a limit is zero.
    pub fn with_config(config: SessionConfig) -> Result<Self> {
        config.validate()?;

        let keys = Arc::new(KeyStore::with_capacity(config.max_keys));
        let lookup: Arc<dyn KeyLookup> = keys.clone();
        let id = SESSION_COUNTER.fetch_add(1, Ordering::Relaxed);
        let hardware_acceleration_detected = hardware_acceleration_available();

        info!(
            id,
            max_keys = config.max_keys,
            max_input_len = config.max_input_len,
            hardware_acceleration_detected,
            "session initialized"
        );

        Ok(Self {
            id,
            config,
            aes: AesEngine::new(lookup.clone()),
            rsa: RsaEngine::new(lookup.clone()),
            gcm: GcmEngine::new(lookup),
            keys,
            hardware_acceleration_detected,
            last_metrics: Arc::new(Mutex::new(OperationMetrics::new())),
        })
    }

    /// Tear the session down, dropping (and zeroizing) every stored key.
    pub fn deinit(self) {
        info!(id = self.id, keys = self.keys.len(), "session deinitialized");
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Number of keys currently stored.
    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    pub fn has_key(&self, key_name: &str) -> bool {
        self.keys.contains(key_name)
    }

    pub fn hardware_acceleration_enabled(&self) -> bool {
        self.hardware_acceleration_detected
    }

    /// Get metrics from the last operation
    pub fn last_metrics(&self) -> OperationMetrics {
        self.last_metrics
            .lock()
            .map(|metrics| metrics.clone())
            .unwrap_or_else(|_| OperationMetrics::new())
    }

    // ------------------------------------------------------------------
    // AES
    // ------------------------------------------------------------------

    /// Encrypt with AES in `params.mode`.
    ///
    /// An absent `params.iv` selects the IV stored with the key.
    #[instrument(skip_all, fields(id = self.id, key = key_name, mode = ?params.mode))]
    pub fn aes_encrypt(
        &self,
        params: &AesParams<'_>,
        key_name: &str,
        plaintext: &[u8],
    ) -> Result<Vec<u8>> {
        self.measured(OperationKind::AesEncrypt, plaintext.len(), Vec::len, || {
            let input = self.check_request(params, key_name, plaintext)?;
            self.aes.encrypt(params, key_name, input)
        })
    }

    /// Decrypt with AES in `params.mode`.
    #[instrument(skip_all, fields(id = self.id, key = key_name, mode = ?params.mode))]
    pub fn aes_decrypt(
        &self,
        params: &AesParams<'_>,
        key_name: &str,
        ciphertext: &[u8],
    ) -> Result<Vec<u8>> {
        self.measured(OperationKind::AesDecrypt, ciphertext.len(), Vec::len, || {
            let input = self.check_request(params, key_name, ciphertext)?;
            self.aes.decrypt(params, key_name, input)
        })
    }

    // ------------------------------------------------------------------
    // RSA
    // ------------------------------------------------------------------

    #[instrument(skip_all, fields(id = self.id, key = key_name, scheme = ?params.scheme))]
    pub fn rsa_encrypt(
        &self,
        params: &RsaParams,
        key_name: &str,
        plaintext: &[u8],
    ) -> Result<Vec<u8>> {
        self.measured(OperationKind::RsaEncrypt, plaintext.len(), Vec::len, || {
            let input = self.check_request(params, key_name, plaintext)?;
            self.rsa.encrypt(params, key_name, input)
        })
    }

    #[instrument(skip_all, fields(id = self.id, key = key_name, scheme = ?params.scheme))]
    pub fn rsa_decrypt(
        &self,
        params: &RsaParams,
        key_name: &str,
        ciphertext: &[u8],
    ) -> Result<Vec<u8>> {
        self.measured(OperationKind::RsaDecrypt, ciphertext.len(), Vec::len, || {
            let input = self.check_request(params, key_name, ciphertext)?;
            self.rsa.decrypt(params, key_name, input)
        })
    }

    // ------------------------------------------------------------------
    // AES-GCM
    // ------------------------------------------------------------------

    /// Authenticated encryption; returns the ciphertext and a detached tag.
    #[instrument(skip_all, fields(id = self.id, key = key_name, tag_len = params.tag_len))]
    pub fn gcm_encrypt(
        &self,
        params: &GcmParams<'_>,
        key_name: &str,
        plaintext: &[u8],
    ) -> Result<GcmOutput> {
        let output_len = |out: &GcmOutput| out.ciphertext.len() + out.tag.len();
        self.measured(OperationKind::GcmEncrypt, plaintext.len(), output_len, || {
            let input = self.check_request(params, key_name, plaintext)?;
            self.gcm.encrypt(params, key_name, input)
        })
    }

    /// Authenticated decryption against `params.tag`.
    ///
    /// Any AAD, tag or ciphertext mismatch yields the same
    /// [`CryptoError::AuthenticationFailed`](crate::crypto::CryptoError).
    #[instrument(skip_all, fields(id = self.id, key = key_name, tag_len = params.tag_len))]
    pub fn gcm_decrypt(
        &self,
        params: &GcmParams<'_>,
        key_name: &str,
        ciphertext: &[u8],
    ) -> Result<Vec<u8>> {
        self.measured(OperationKind::GcmDecrypt, ciphertext.len(), Vec::len, || {
            let input = self.check_request(params, key_name, ciphertext)?;
            if params.tag.is_none() {
                return Err(SecurityError::invalid_input("GCM decryption requires a tag"));
            }
            self.gcm.decrypt(params, key_name, input)
        })
    }

    // ------------------------------------------------------------------
    // Key management
    // ------------------------------------------------------------------

    /// Generate a key of `key_type` under `key_name`.
    ///
    /// # Errors
    /// - `InvalidKeyIndex` if the name is empty or already taken
    /// - `KeyStore` if the store is full or generation fails
    #[instrument(skip(self), fields(id = self.id))]
    pub fn key_generate(&self, key_type: KeyType, key_name: &str) -> Result<()> {
        self.measured(OperationKind::KeyGenerate, 0, |_| 0, || {
            let key_name = validate::key_name(Some(key_name))?;
            Ok(self.keys.generate(key_type, key_name)?)
        })
    }

    /// Remove `key_name`, which must be of `key_type`.
    #[instrument(skip(self), fields(id = self.id))]
    pub fn key_remove(&self, key_type: KeyType, key_name: &str) -> Result<()> {
        self.measured(OperationKind::KeyRemove, 0, |_| 0, || {
            let key_name = validate::key_name(Some(key_name))?;
            Ok(self.keys.remove(key_type, key_name)?)
        })
    }

    /// Import caller-provided material under `key_name`.
    #[instrument(skip(self, material), fields(id = self.id, key_type = ?material.key_type()))]
    pub fn key_set(&self, key_name: &str, material: KeyMaterial) -> Result<()> {
        self.measured(OperationKind::KeySet, 0, |_| 0, || {
            let key_name = validate::key_name(Some(key_name))?;
            Ok(self.keys.set(key_name, material)?)
        })
    }

    /// Attach (or replace) the IV used when an AES request carries none.
    #[instrument(skip(self, iv), fields(id = self.id))]
    pub fn key_set_iv(&self, key_name: &str, iv: [u8; STORED_IV_LEN]) -> Result<()> {
        self.measured(OperationKind::KeySet, 0, |_| 0, || {
            let key_name = validate::key_name(Some(key_name))?;
            Ok(self.keys.set_iv(key_name, iv)?)
        })
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Steps 3, 4 and 6 of validation; typed parameters cover steps 1 and 2.
    ///
    /// The C boundary has already run `validate_request`; this pass holds
    /// direct Rust callers to the same order.
    fn check_request<'a, P: ParamLimits>(
        &self,
        params: &P,
        key_name: &str,
        input: &'a [u8],
    ) -> Result<&'a [u8]> {
        validate::key_name(Some(key_name))?;
        let input = validate::input(Some(input), self.config.max_input_len)?;
        params.check_limits()?;
        Ok(input)
    }

    /// Run `op`, then record timing, sizes and outcome as the last metrics.
    fn measured<T>(
        &self,
        kind: OperationKind,
        input_len: usize,
        output_len: impl Fn(&T) -> usize,
        op: impl FnOnce() -> Result<T>,
    ) -> Result<T> {
        let start = Instant::now();
        let result = op();
        let micros = start.elapsed().as_micros() as u64;

        let produced = match &result {
            Ok(value) => {
                let produced = output_len(value);
                debug!(operation = ?kind, micros, input_len, produced, "operation completed");
                produced
            }
            Err(e) => {
                if e.status() == SecurityStatus::Error {
                    warn!(operation = ?kind, error = %e, "operation failed");
                } else {
                    debug!(operation = ?kind, error = %e, "request rejected");
                }
                0
            }
        };

        let metrics = OperationMetrics::new()
            .with_operation(kind, micros, self.hardware_acceleration_detected)
            .with_sizes(input_len, produced)
            .with_outcome(result.is_ok());
        if let Ok(mut last) = self.last_metrics.lock() {
            *last = metrics;
        }

        result
    }
}
