//! Property-based test generators using proptest.
//!
//! Keys and values are drawn from small alphabets so that generated scripts
//! keep colliding on the same keys and values.

use crate::model::ReferenceStore;
use proptest::prelude::*;
use txstore_core::{StoreEngine, StoreResult};

/// Strategy for keys from a small alphabet.
pub fn key_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-e]").expect("Invalid regex")
}

/// Strategy for values from a small alphabet.
pub fn value_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[x-z]{1,2}").expect("Invalid regex")
}

/// Strategy for arbitrary non-empty strings, for round-trip properties.
pub fn any_text_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex(".{1,32}").expect("Invalid regex")
}

/// One step of a generated script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptOp {
    /// Look up a key.
    Get(String),
    /// Set a key.
    Set(String, String),
    /// Delete a key.
    Delete(String),
    /// Count a value.
    Count(String),
    /// Open a transaction.
    Begin,
    /// Commit the innermost transaction.
    Commit,
    /// Roll back the innermost transaction.
    Rollback,
}

/// Observable outcome of a [`ScriptOp`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Operation has no result.
    Unit,
    /// Result of a lookup.
    Value(StoreResult<String>),
    /// Result of a count.
    Count(usize),
    /// Result of commit or rollback.
    Lifecycle(StoreResult<()>),
}

impl ScriptOp {
    /// Applies the step to the reference model.
    pub fn apply_model(&self, model: &mut ReferenceStore) -> Outcome {
        match self {
            Self::Get(key) => Outcome::Value(model.get(key)),
            Self::Set(key, value) => {
                model.set(key, value);
                Outcome::Unit
            }
            Self::Delete(key) => {
                model.delete(key);
                Outcome::Unit
            }
            Self::Count(value) => Outcome::Count(model.count(value)),
            Self::Begin => {
                model.begin();
                Outcome::Unit
            }
            Self::Commit => Outcome::Lifecycle(model.commit()),
            Self::Rollback => Outcome::Lifecycle(model.rollback()),
        }
    }

    /// Submits the step to the engine and waits for its outcome.
    pub fn apply_engine(&self, engine: &StoreEngine) -> Outcome {
        let timeout = crate::fixtures::DEFAULT_TIMEOUT;
        match self {
            Self::Get(key) => Outcome::Value(
                engine
                    .get(key.as_str())
                    .recv_timeout(timeout)
                    .expect("get result"),
            ),
            Self::Set(key, value) => {
                engine.set(key.as_str(), value.as_str());
                Outcome::Unit
            }
            Self::Delete(key) => {
                engine.delete(key.as_str());
                Outcome::Unit
            }
            Self::Count(value) => Outcome::Count(
                engine
                    .count(value.as_str())
                    .recv_timeout(timeout)
                    .expect("count result"),
            ),
            Self::Begin => {
                engine.begin();
                Outcome::Unit
            }
            Self::Commit => Outcome::Lifecycle(
                engine
                    .commit()
                    .recv_timeout(timeout)
                    .expect("commit result"),
            ),
            Self::Rollback => Outcome::Lifecycle(
                engine
                    .rollback()
                    .recv_timeout(timeout)
                    .expect("rollback result"),
            ),
        }
    }
}

/// Strategy for a single script step.
///
/// Writes are weighted above lifecycle operations so scripts build up state.
pub fn script_op_strategy() -> impl Strategy<Value = ScriptOp> {
    prop_oneof![
        3 => key_strategy().prop_map(ScriptOp::Get),
        4 => (key_strategy(), value_strategy()).prop_map(|(k, v)| ScriptOp::Set(k, v)),
        2 => key_strategy().prop_map(ScriptOp::Delete),
        2 => value_strategy().prop_map(ScriptOp::Count),
        2 => Just(ScriptOp::Begin),
        1 => Just(ScriptOp::Commit),
        1 => Just(ScriptOp::Rollback),
    ]
}

/// Strategy for a script of up to `max_len` steps.
pub fn script_strategy(max_len: usize) -> impl Strategy<Value = Vec<ScriptOp>> {
    prop::collection::vec(script_op_strategy(), 0..max_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn keys_are_single_letters(key in key_strategy()) {
            prop_assert_eq!(key.len(), 1);
        }

        #[test]
        fn scripts_respect_length(script in script_strategy(20)) {
            prop_assert!(script.len() < 20);
        }
    }

    #[test]
    fn model_outcomes() {
        let mut model = ReferenceStore::new();
        assert_eq!(
            ScriptOp::Set("a".into(), "x".into()).apply_model(&mut model),
            Outcome::Unit
        );
        assert_eq!(
            ScriptOp::Count("x".into()).apply_model(&mut model),
            Outcome::Count(1)
        );
        assert!(matches!(
            ScriptOp::Commit.apply_model(&mut model),
            Outcome::Lifecycle(Err(_))
        ));
    }
}
