//! Scripted mock connector for orchestrator and service tests.

use std::collections::HashMap;
use std::sync::Mutex;

use vendo_core::{Connector, Error, ProviderKind, Result, SyncCategory};

/// Scripted outcome for one category pull.
#[derive(Debug, Clone)]
pub enum MockOutcome {
    /// The pull succeeds with this many items.
    Items(u64),
    /// The pull fails with this message.
    Fail(String),
}

/// Mock connector with per-category scripted outcomes.
///
/// Records every `pull_category` invocation so tests can assert call
/// counts and ordering.
///
/// # Examples
///
/// ```
/// use vendo_core::{ProviderKind, SyncCategory};
/// use vendo_test::MockConnector;
///
/// let connector = MockConnector::new(ProviderKind::Shopify)
///     .with_items(SyncCategory::Products, 3)
///     .with_failure(SyncCategory::Customers, "rate limited");
/// ```
#[derive(Debug)]
pub struct MockConnector {
    provider: ProviderKind,
    outcomes: HashMap<SyncCategory, MockOutcome>,
    reachable: bool,
    calls: Mutex<Vec<SyncCategory>>,
}

impl MockConnector {
    /// Create a mock connector for the given provider, with no scripted
    /// categories yet.
    pub fn new(provider: ProviderKind) -> Self {
        Self {
            provider,
            outcomes: HashMap::new(),
            reachable: true,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Script a successful pull returning `count` items.
    pub fn with_items(mut self, category: SyncCategory, count: u64) -> Self {
        self.outcomes.insert(category, MockOutcome::Items(count));
        self
    }

    /// Script a failing pull with the given message.
    pub fn with_failure(mut self, category: SyncCategory, message: impl Into<String>) -> Self {
        self.outcomes
            .insert(category, MockOutcome::Fail(message.into()));
        self
    }

    /// Script the connectivity probe outcome.
    pub fn with_reachable(mut self, reachable: bool) -> Self {
        self.reachable = reachable;
        self
    }

    /// Every `pull_category` invocation, in call order.
    pub fn calls(&self) -> Vec<SyncCategory> {
        self.calls.lock().expect("mock call log poisoned").clone()
    }

    /// How many times one category was pulled.
    pub fn call_count(&self, category: SyncCategory) -> usize {
        self.calls()
            .into_iter()
            .filter(|c| *c == category)
            .count()
    }
}

#[async_trait::async_trait]
impl Connector for MockConnector {
    fn provider(&self) -> ProviderKind {
        self.provider
    }

    fn supports(&self, category: SyncCategory) -> bool {
        self.outcomes.contains_key(&category)
    }

    async fn pull_category(&self, category: SyncCategory) -> Result<u64> {
        self.calls
            .lock()
            .expect("mock call log poisoned")
            .push(category);

        match self.outcomes.get(&category) {
            Some(MockOutcome::Items(count)) => Ok(*count),
            Some(MockOutcome::Fail(message)) => Err(Error::connectivity(message.clone())),
            None => Err(Error::configuration(format!(
                "no scripted outcome for {}",
                category.label()
            ))),
        }
    }

    async fn test_connection(&self) -> bool {
        self.reachable
    }
}
