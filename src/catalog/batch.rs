use crate::catalog::error::CatalogError;
use crate::catalog::ops::create_spell;
use crate::model::Spell;
use crate::store::SpellStore;
use serde::Serialize;
use serde_json::Value;

/// Coarse classification of a failed batch item, for translation into a
/// request-layer status by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureClass {
    /// Undecodable or invalid input (400-class).
    InvalidInput,
    /// The spell's identity already exists (409-class).
    Conflict,
    /// Anything else: store or decode trouble (500-class).
    Internal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BatchOutcome {
    Created,
    Failed {
        message: String,
        class: FailureClass,
    },
}

impl BatchOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, BatchOutcome::Failed { .. })
    }

    fn failed(message: String, class: FailureClass) -> Self {
        BatchOutcome::Failed { message, class }
    }
}

/// Per-item results of a batch create, in input order. Never rolled back:
/// items that succeeded stay created even when siblings fail.
#[derive(Debug, Serialize)]
pub struct BatchResult {
    pub count: usize,
    pub outcomes: Vec<BatchOutcome>,
}

impl BatchResult {
    pub fn some_failed(&self) -> bool {
        self.outcomes.iter().any(BatchOutcome::is_failure)
    }
}

/// Apply create across a set of raw input records. Each item is decoded and
/// created independently; one item's failure is recorded and never stops the
/// items after it.
pub async fn create_many<S: SpellStore>(store: &S, items: Vec<Value>) -> BatchResult {
    let count = items.len();
    let mut outcomes = Vec::with_capacity(count);

    for item in items {
        outcomes.push(create_one(store, item).await);
    }

    BatchResult { count, outcomes }
}

async fn create_one<S: SpellStore>(store: &S, item: Value) -> BatchOutcome {
    let spell: Spell = match serde_json::from_value(item) {
        Ok(spell) => spell,
        Err(e) => return BatchOutcome::failed(e.to_string(), FailureClass::InvalidInput),
    };

    match create_spell(store, &spell).await {
        Ok(()) => BatchOutcome::Created,
        Err(e @ CatalogError::Invalid(_)) => {
            BatchOutcome::failed(e.to_string(), FailureClass::InvalidInput)
        }
        Err(e @ CatalogError::AlreadyExists) => {
            BatchOutcome::failed(e.to_string(), FailureClass::Conflict)
        }
        Err(e) => BatchOutcome::failed(e.to_string(), FailureClass::Internal),
    }
}
