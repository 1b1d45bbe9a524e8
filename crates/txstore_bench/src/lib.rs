//! Benchmark utilities.

use rand::distributions::Alphanumeric;
use rand::Rng;
use txstore_core::StoreEngine;

/// Generate a random alphanumeric string of the specified length.
pub fn random_string(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Generate `count` distinct keys.
pub fn generate_keys(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("key-{i:06}")).collect()
}

/// Generate key/value pairs whose values are drawn from `distinct_values`
/// random strings, so counts have something to find.
pub fn generate_pairs(count: usize, distinct_values: usize) -> Vec<(String, String)> {
    let values: Vec<String> = (0..distinct_values.max(1))
        .map(|_| random_string(8))
        .collect();
    let mut rng = rand::thread_rng();
    generate_keys(count)
        .into_iter()
        .map(|key| {
            let value = values[rng.gen_range(0..values.len())].clone();
            (key, value)
        })
        .collect()
}

/// Writes `pairs` into the engine's current transaction and waits until
/// they have been applied.
pub fn populate(engine: &StoreEngine, pairs: &[(String, String)]) {
    for (key, value) in pairs {
        engine.set(key.clone(), value.clone());
    }
    barrier(engine);
}

/// Waits until every previously submitted operation has been applied.
///
/// A count is admitted only after all earlier writes are released, so its
/// completion marks the point where they are visible.
pub fn barrier(engine: &StoreEngine) {
    let _ = engine.count(String::new()).recv();
}
