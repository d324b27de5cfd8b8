// src/apply.rs
//! The save workflow: validate, persist, render, write, reload.

use crate::config::AppConfig;
use crate::error::ApplyError;
use crate::prefs::{write_atomic, PreferenceStore, Preferences};
use crate::relay::RelayController;
use crate::render::render;
use crate::validation::RawPreferences;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Applies preference changes to disk and to the relay.
///
/// Saves are serialized by an internal lock, so two concurrent requests never interleave
/// their store and relay config writes. The last writer wins.
#[derive(Debug)]
pub struct ApplyPipeline {
    store: PreferenceStore,
    relay_config_path: PathBuf,
    relay: RelayController,
    lock: Mutex<()>,
}

impl ApplyPipeline {
    pub fn new(
        store: PreferenceStore,
        relay_config_path: impl Into<PathBuf>,
        relay: RelayController,
    ) -> Self {
        ApplyPipeline {
            store,
            relay_config_path: relay_config_path.into(),
            relay,
            lock: Mutex::new(()),
        }
    }

    pub fn from_config(app_config: &AppConfig) -> Self {
        ApplyPipeline::new(
            PreferenceStore::new(&app_config.prefs_path),
            &app_config.relay_config_path,
            RelayController::from_config(app_config),
        )
    }

    pub fn store(&self) -> &PreferenceStore {
        &self.store
    }

    pub fn relay_config_path(&self) -> &Path {
        &self.relay_config_path
    }

    /// Validates `raw`, stores it, rewrites the relay config and asks the relay to reload.
    ///
    /// Validation and write failures are returned. A failed reload is logged only: the
    /// preferences are already saved and the relay picks them up on its next restart.
    pub async fn apply(&self, raw: &RawPreferences) -> Result<Preferences, ApplyError> {
        let prefs = raw.normalize()?;

        let _guard = self.lock.lock().await;
        self.store.save(&prefs)?;
        self.write_relay_config(&prefs)?;
        let outcome = self.relay.reload().await;

        info!(
            "Applied preferences for stream '{}' (relay: {:?})",
            prefs.stream_path, outcome
        );
        Ok(prefs)
    }

    /// Rewrites the relay config from the stored preferences without reloading.
    ///
    /// Run at startup so the relay config always matches what the store holds.
    pub async fn sync_relay_config(&self) -> Result<Preferences, ApplyError> {
        let _guard = self.lock.lock().await;
        let prefs = self.store.load();
        self.write_relay_config(&prefs)?;
        Ok(prefs)
    }

    fn write_relay_config(&self, prefs: &Preferences) -> Result<(), ApplyError> {
        let text = render(prefs);
        write_atomic(&self.relay_config_path, text.as_bytes()).map_err(|source| {
            ApplyError::RelayConfig {
                path: self.relay_config_path.clone(),
                source,
            }
        })?;
        debug!("Wrote relay config to {}", self.relay_config_path.display());
        Ok(())
    }
}
