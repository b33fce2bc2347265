use std::sync::{Arc, PoisonError, RwLock};

use labelkit_address::Sender;
use serde_json::{Map, Value};

use crate::config::{GenerationConfig, SettingsError};

/// Everything a generation call reads from process-wide state.
#[derive(Debug, Clone, Default)]
pub struct GeneratorSnapshot {
    pub config: GenerationConfig,
    pub sender: Option<Sender>,
}

/// Process-wide sender and config.
///
/// Writers publish a fresh [`GeneratorSnapshot`]; readers hold the `Arc` they
/// got from [`SharedGeneratorState::snapshot`] for the whole call and never
/// see a later update half-applied.
#[derive(Debug, Default)]
pub struct SharedGeneratorState {
    current: RwLock<Arc<GeneratorSnapshot>>,
}

impl SharedGeneratorState {
    pub fn new(config: GenerationConfig, sender: Option<Sender>) -> Self {
        Self {
            current: RwLock::new(Arc::new(GeneratorSnapshot { config, sender })),
        }
    }

    pub fn snapshot(&self) -> Arc<GeneratorSnapshot> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_sender(&self, sender: Option<Sender>) {
        self.publish(|next| next.sender = sender);
    }

    pub fn replace_config(&self, config: GenerationConfig) {
        self.publish(|next| next.config = config);
    }

    /// Applies a shallow merge to the current config. Fails without
    /// publishing anything when the update does not type-check.
    pub fn update_config(&self, update: &Map<String, Value>) -> Result<(), SettingsError> {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = GeneratorSnapshot::clone(&guard);
        next.config.merge(update)?;
        *guard = Arc::new(next);
        Ok(())
    }

    fn publish(&self, op: impl FnOnce(&mut GeneratorSnapshot)) {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = GeneratorSnapshot::clone(&guard);
        op(&mut next);
        *guard = Arc::new(next);
    }
}
