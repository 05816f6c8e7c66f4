use std::sync::{Arc, OnceLock, RwLock};

use crate::authenticity::AuthenticityClassifier;
use crate::sentiment::SentimentClassifier;

/// Classifiers shared by every request in the process
#[derive(Clone)]
pub struct ClassifierSet {
    pub sentiment: Arc<dyn SentimentClassifier>,
    /// Without an authenticity model every article is trusted.
    pub authenticity: Option<Arc<dyn AuthenticityClassifier>>,
}

static CLASSIFIERS: OnceLock<RwLock<Option<Arc<ClassifierSet>>>> = OnceLock::new();

fn slot() -> &'static RwLock<Option<Arc<ClassifierSet>>> {
    CLASSIFIERS.get_or_init(|| RwLock::new(None))
}

/// Process-wide classifier registry with explicit lifecycle.
///
/// `init` is called once at startup and `teardown` at shutdown; consumers take
/// the `Arc`s they need and hold them as injected dependencies.
pub struct ClassifierRegistry;

impl ClassifierRegistry {
    /// Installs `set` unless classifiers are already loaded, and returns the
    /// installed set.
    pub fn init(set: ClassifierSet) -> Arc<ClassifierSet> {
        let mut guard = slot().write().unwrap_or_else(|e| e.into_inner());
        if let Some(existing) = guard.as_ref() {
            tracing::debug!("Classifier registry already initialized");
            return existing.clone();
        }

        tracing::info!(
            sentiment = set.sentiment.model_name(),
            authenticity = set
                .authenticity
                .as_ref()
                .map(|a| a.model_name())
                .unwrap_or("none"),
            "Classifier registry initialized"
        );
        let set = Arc::new(set);
        *guard = Some(set.clone());
        set
    }

    pub fn get() -> Option<Arc<ClassifierSet>> {
        slot().read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Drops the registry's handle. Returns whether anything was loaded.
    pub fn teardown() -> bool {
        let released = slot()
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .take()
            .is_some();
        if released {
            tracing::info!("Classifier registry torn down");
        }
        released
    }
}
