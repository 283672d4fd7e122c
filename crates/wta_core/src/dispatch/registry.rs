//! In-process entity type registry.

use crate::dispatch::factory::{ReportStoreFactory, SenderFactory};
use log::info;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, PoisonError, RwLock};

/// Registry lookup errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    UnknownEntityType(String),
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownEntityType(name) => write!(f, "unknown entity type: {name}"),
        }
    }
}

impl Error for RegistryError {}

/// Sender and report-store factories bound to one entity type.
#[derive(Debug, Clone)]
pub struct HandlerPair {
    pub sender: SenderFactory,
    pub report_store: ReportStoreFactory,
}

impl HandlerPair {
    pub fn new(sender: SenderFactory, report_store: ReportStoreFactory) -> Self {
        Self {
            sender,
            report_store,
        }
    }
}

/// Entity type name to handler pair mapping.
///
/// Built once at startup, optionally extended, then passed by reference to
/// orchestrator constructors.
#[derive(Debug, Clone, Default)]
pub struct DispatchRegistry {
    bindings: BTreeMap<String, HandlerPair>,
}

impl DispatchRegistry {
    /// Empty registry without built-in bindings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `name` to a handler pair, replacing any previous binding.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        sender: SenderFactory,
        report_store: ReportStoreFactory,
    ) {
        self.insert(name.into(), HandlerPair::new(sender, report_store));
    }

    /// Applies many bindings; later entries win over earlier ones.
    pub fn extend<I, K>(&mut self, bindings: I)
    where
        I: IntoIterator<Item = (K, HandlerPair)>,
        K: Into<String>,
    {
        for (name, pair) in bindings {
            self.insert(name.into(), pair);
        }
    }

    pub fn resolve(&self, name: &str) -> Result<HandlerPair, RegistryError> {
        self.bindings
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownEntityType(name.to_string()))
    }

    pub fn resolve_sender(&self, name: &str) -> Result<SenderFactory, RegistryError> {
        self.resolve(name).map(|pair| pair.sender)
    }

    pub fn resolve_report_store(&self, name: &str) -> Result<ReportStoreFactory, RegistryError> {
        self.resolve(name).map(|pair| pair.report_store)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Returns sorted entity type names.
    pub fn entity_types(&self) -> Vec<String> {
        self.bindings.keys().cloned().collect()
    }

    fn insert(&mut self, name: String, pair: HandlerPair) {
        let replaced = self.bindings.insert(name.clone(), pair).is_some();
        info!("event=entity_type_register module=dispatch status=ok entity_type={name} replaced={replaced}");
    }
}

/// Registry shared between threads that may still extend it.
///
/// Readers always observe a complete registry: either before or after a write.
#[derive(Debug, Clone, Default)]
pub struct SharedRegistry {
    inner: Arc<RwLock<DispatchRegistry>>,
}

impl SharedRegistry {
    pub fn new(registry: DispatchRegistry) -> Self {
        Self {
            inner: Arc::new(RwLock::new(registry)),
        }
    }

    pub fn register(
        &self,
        name: impl Into<String>,
        sender: SenderFactory,
        report_store: ReportStoreFactory,
    ) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .register(name, sender, report_store);
    }

    pub fn extend<I, K>(&self, bindings: I)
    where
        I: IntoIterator<Item = (K, HandlerPair)>,
        K: Into<String>,
    {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(bindings);
    }

    pub fn resolve(&self, name: &str) -> Result<HandlerPair, RegistryError> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .resolve(name)
    }

    /// Consistent copy for constructing orchestrators.
    pub fn snapshot(&self) -> DispatchRegistry {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
