//! Test support: serialized, self-restoring environment mutation.
//!
//! Process environment is global, so tests that need to set `REDSHIFT_*`
//! variables hold a [`ScopedEnv`] for their whole body. The guard takes a
//! process-wide lock and puts every touched variable back on drop, including
//! when the test panics.

use std::collections::HashMap;
use std::env;
use std::sync::{Mutex, MutexGuard};

static ENV_LOCK: Mutex<()> = Mutex::new(());

pub struct ScopedEnv {
    saved: HashMap<String, Option<String>>,
    _lock: MutexGuard<'static, ()>,
}

impl ScopedEnv {
    /// Wait for exclusive access to the process environment.
    pub fn acquire() -> Self {
        // A panicking test poisons the lock; its guard has already restored the env.
        let lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Self {
            saved: HashMap::new(),
            _lock: lock,
        }
    }

    fn remember(&mut self, key: &str) {
        self.saved
            .entry(key.to_string())
            .or_insert_with(|| env::var(key).ok());
    }

    pub fn set(&mut self, key: &str, value: &str) -> &mut Self {
        self.remember(key);
        env::set_var(key, value);
        self
    }

    pub fn remove(&mut self, key: &str) -> &mut Self {
        self.remember(key);
        env::remove_var(key);
        self
    }

    /// Remove every key in `keys` for the lifetime of the guard.
    pub fn clear(&mut self, keys: &[&str]) -> &mut Self {
        for key in keys {
            self.remove(key);
        }
        self
    }

    /// Read a variable, returning `None` when unset or empty.
    pub fn get(&self, key: &str) -> Option<String> {
        env::var(key).ok().filter(|v| !v.is_empty())
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (key, previous) in self.saved.drain() {
            match previous {
                Some(value) => env::set_var(&key, value),
                None => env::remove_var(&key),
            }
        }
    }
}
