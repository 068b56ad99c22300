// src/context.rs
//! Process-wide engine state
//!
//! One `EngineContext` holds everything the composer, enforcer and validator share:
//! the member reflector, per-subject registries, the global chain-terminator set and
//! the wrapper side table. It is constructed explicitly and passed by reference.

use crate::error::EngineError;
use crate::registry::{ContractRegistry, RegistryState};
use rce_core::config::compile_time::registry::MAX_CHAIN_TERMINATORS;
use rce_core::config::{EngineConfig, RuntimeConfig};
use rce_core::criteria::CheckOptions;
use rce_core::host::{Function, FunctionId, HostReflector, MemberReflector, Subject, SubjectId};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

/// Wrapper identity to original callable
#[derive(Debug, Default)]
pub struct WrapperTable {
    entries: Mutex<HashMap<FunctionId, Function>>,
}

impl WrapperTable {
    fn lock(&self) -> MutexGuard<'_, HashMap<FunctionId, Function>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn record(&self, wrapper: &Function, original: &Function) {
        self.lock().insert(wrapper.id(), original.clone());
    }

    /// Record `wrapper` as the installed guard of `original`, dropping the entry of
    /// `replaced` when it was itself a wrapper
    pub fn replace(&self, replaced: &Function, wrapper: &Function, original: &Function) {
        let mut entries = self.lock();
        entries.remove(&replaced.id());
        entries.insert(wrapper.id(), original.clone());
    }

    pub fn original_of(&self, wrapper: FunctionId) -> Option<Function> {
        self.lock().get(&wrapper).cloned()
    }

    pub fn is_wrapper(&self, function: &Function) -> bool {
        self.lock().contains_key(&function.id())
    }

    /// Original behind `function`, or `function` itself when it is not a wrapper
    pub fn unwrap(&self, function: &Function) -> Function {
        self.original_of(function.id())
            .unwrap_or_else(|| function.clone())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn clear(&self) {
        self.lock().clear();
    }
}

pub struct EngineContext {
    reflector: Arc<dyn MemberReflector>,
    registries: Mutex<HashMap<SubjectId, ContractRegistry>>,
    terminators: RwLock<Vec<SubjectId>>,
    wrappers: Arc<WrapperTable>,
    writer: Mutex<()>,
    config: EngineConfig,
}

impl EngineContext {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_reflector(Arc::new(HostReflector), config)
    }

    pub fn with_reflector(reflector: Arc<dyn MemberReflector>, config: EngineConfig) -> Self {
        Self {
            reflector,
            registries: Mutex::new(HashMap::new()),
            terminators: RwLock::new(Vec::new()),
            wrappers: Arc::new(WrapperTable::default()),
            writer: Mutex::new(()),
            config,
        }
    }

    /// Build a context from the `[engine]` table of a TOML configuration file
    pub fn from_config_file<P: AsRef<Path>>(path: P) -> Result<Self, EngineError> {
        let runtime = RuntimeConfig::load_from_file(path)?;
        Ok(Self::new(runtime.engine))
    }

    pub fn reflector(&self) -> &dyn MemberReflector {
        self.reflector.as_ref()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn options(&self) -> CheckOptions {
        CheckOptions::from(&self.config)
    }

    pub fn wrappers(&self) -> &Arc<WrapperTable> {
        &self.wrappers
    }

    /// Serializes compose, attach and wrap for the whole context
    pub(crate) fn writer(&self) -> MutexGuard<'_, ()> {
        self.writer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn registries(&self) -> MutexGuard<'_, HashMap<SubjectId, ContractRegistry>> {
        self.registries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // ========================================================================
    // Chain terminators
    // ========================================================================

    /// Add a subject beyond which no ancestry walk proceeds
    pub fn register_chain_terminator(&self, subject: &Subject) -> Result<(), EngineError> {
        let mut terminators = self
            .terminators
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if terminators.contains(&subject.id()) {
            return Ok(());
        }
        if terminators.len() >= MAX_CHAIN_TERMINATORS {
            return Err(EngineError::TerminatorLimitExceeded {
                limit: MAX_CHAIN_TERMINATORS,
            });
        }

        terminators.push(subject.id());
        Ok(())
    }

    pub fn is_chain_terminator(&self, subject: SubjectId) -> bool {
        self.terminators
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains(&subject)
    }

    pub fn chain_terminators(&self) -> Vec<SubjectId> {
        self.terminators
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    // ========================================================================
    // Registries
    // ========================================================================

    /// Snapshot of a subject's registry
    pub fn registry(&self, subject: SubjectId) -> Option<ContractRegistry> {
        self.registries().get(&subject).cloned()
    }

    pub fn has_registry(&self, subject: SubjectId) -> bool {
        self.registries().contains_key(&subject)
    }

    pub fn state_of(&self, subject: SubjectId) -> RegistryState {
        self.registries()
            .get(&subject)
            .map(ContractRegistry::state)
            .unwrap_or(RegistryState::Unregistered)
    }

    pub fn registry_count(&self) -> usize {
        self.registries().len()
    }

    pub(crate) fn store_registry(&self, registry: ContractRegistry) {
        self.registries().insert(registry.owner(), registry);
    }

    /// Apply `update` to a stored registry; returns false when none exists
    pub(crate) fn update_registry<F>(&self, subject: SubjectId, update: F) -> bool
    where
        F: FnOnce(&mut ContractRegistry),
    {
        match self.registries().get_mut(&subject) {
            Some(registry) => {
                update(registry);
                true
            }
            None => false,
        }
    }

    /// Drop a subject's registry
    pub fn forget(&self, subject: SubjectId) -> Option<ContractRegistry> {
        self.registries().remove(&subject)
    }

    /// Drop every registry, terminator and wrapper record
    pub fn clear(&self) {
        self.registries().clear();
        self.terminators
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
        self.wrappers.clear();
    }
}

impl Default for EngineContext {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
