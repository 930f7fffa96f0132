//! Account lock coordination
//!
//! This module provides the [`LockCoordinator`], the mutual-exclusion
//! mechanism that serializes all balance operations on a single account.
//! Locks are named by account number; at most one holder of a given key
//! exists at any instant, and contenders wait up to a configured bound
//! before failing with a lock timeout.
//!
//! # Design
//!
//! Each key maps to a single-permit `tokio::sync::Semaphore` held in a
//! `DashMap`, so operations on different accounts never contend with each
//! other. The returned [`LockHandle`] owns the permit; dropping it releases
//! the lock, which guarantees release on every exit path of the guarded
//! region, including panics and early returns.
//!
//! Only one key is ever held per call chain. Nested acquisition is not
//! supported and nothing in this crate attempts it, which structurally
//! rules out lock-ordering deadlocks.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, warn};

use crate::types::LedgerError;

/// Lock acquisition bounds
#[derive(Debug, Clone)]
pub struct LockConfig {
    /// How long a contender waits for the lock before failing
    pub wait_timeout: Duration,

    /// How long a holder is expected to keep the lock at most
    ///
    /// The in-process backend never revokes a held lock early, since an
    /// early release would let a second attempt interleave with a
    /// still-running body. Holders that exceed the lease are logged.
    pub lease_timeout: Duration,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            wait_timeout: Duration::from_secs(1),
            lease_timeout: Duration::from_secs(15),
        }
    }
}

/// Proof of holding a named lock
///
/// The lock is released when the handle is dropped (or passed to
/// [`LockCoordinator::release`]), making release idempotent-safe and
/// guaranteed on every exit path.
#[derive(Debug)]
pub struct LockHandle {
    key: String,
    acquired_at: Instant,
    lease_timeout: Duration,
    _permit: OwnedSemaphorePermit,
}

impl LockHandle {
    /// The key this handle holds
    pub fn key(&self) -> &str {
        &self.key
    }

    /// How long the lock has been held
    pub fn held_for(&self) -> Duration {
        self.acquired_at.elapsed()
    }
}

impl Drop for LockHandle {
    fn drop(&mut self) {
        let held = self.acquired_at.elapsed();
        if held > self.lease_timeout {
            warn!(
                key = %self.key,
                held_ms = held.as_millis() as u64,
                lease_ms = self.lease_timeout.as_millis() as u64,
                "account lock held beyond its lease"
            );
        }
        debug!(key = %self.key, held_ms = held.as_millis() as u64, "account lock released");
    }
}

/// Named mutual-exclusion coordinator keyed by account number
///
/// At most one [`LockHandle`] per key exists at any instant. Waiters for a
/// held key queue on its semaphore and either acquire within the configured
/// wait bound or fail with [`LedgerError::LockTimeout`], which is distinct
/// from every domain error and safe to retry: the guarded body has not run.
#[derive(Debug, Default)]
pub struct LockCoordinator {
    /// One single-permit semaphore per lock key
    locks: DashMap<String, Arc<Semaphore>>,
    config: LockConfig,
}

impl LockCoordinator {
    /// Create a coordinator with the given bounds
    pub fn new(config: LockConfig) -> Self {
        Self {
            locks: DashMap::new(),
            config,
        }
    }

    /// Acquire the lock for `key`, waiting up to the configured bound
    ///
    /// # Errors
    ///
    /// * `LedgerError::LockTimeout` if the wait bound elapses while another
    ///   holder keeps the key
    /// * `LedgerError::Internal` if the lock backend is unavailable
    pub async fn acquire(&self, key: &str) -> Result<LockHandle, LedgerError> {
        let semaphore = self
            .locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Semaphore::new(1)))
            .clone();

        let permit = match tokio::time::timeout(self.config.wait_timeout, semaphore.acquire_owned())
            .await
        {
            Ok(Ok(permit)) => permit,
            Ok(Err(_)) => {
                return Err(LedgerError::internal("lock backend closed"));
            }
            Err(_) => {
                warn!(
                    key,
                    wait_ms = self.config.wait_timeout.as_millis() as u64,
                    "account lock wait timed out"
                );
                return Err(LedgerError::lock_timeout(key));
            }
        };

        debug!(key, "account lock acquired");
        Ok(LockHandle {
            key: key.to_string(),
            acquired_at: Instant::now(),
            lease_timeout: self.config.lease_timeout,
            _permit: permit,
        })
    }

    /// Release a held lock
    ///
    /// Consuming the handle makes a double release unrepresentable.
    /// Dropping the handle has the same effect, so release still happens
    /// when the guarded region unwinds.
    pub fn release(&self, handle: LockHandle) {
        drop(handle);
    }

    /// The configured bounds
    pub fn config(&self) -> &LockConfig {
        &self.config
    }
}
