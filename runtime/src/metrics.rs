//! Metric names recorded by the store.
//!
//! The store records through the `metrics` facade only. Installing a
//! recorder (Prometheus, logging, or none at all) is the application's call;
//! without one every macro is a no-op.

use metrics::{describe_counter, describe_histogram};

// Re-export metrics macros for use in other modules
pub use metrics::{counter, histogram};

/// Actions dispatched into a store (user intents and effect feedback).
pub const ACTIONS_TOTAL: &str = "authflow.store.actions.total";

/// Effects started, labelled by `type`.
pub const EFFECTS_EXECUTED: &str = "authflow.store.effects.executed";

/// Wall time spent inside `Reducer::reduce`.
pub const REDUCER_DURATION_SECONDS: &str = "authflow.store.reducer.duration_seconds";

/// State snapshots published to subscribers.
pub const SNAPSHOTS_PUBLISHED: &str = "authflow.store.snapshots.published";

/// Register human-readable descriptions for every store metric.
///
/// Call once after installing a recorder.
pub fn describe_store_metrics() {
    describe_counter!(ACTIONS_TOTAL, "Actions dispatched into the store");
    describe_counter!(EFFECTS_EXECUTED, "Effects started by the store");
    describe_histogram!(
        REDUCER_DURATION_SECONDS,
        metrics::Unit::Seconds,
        "Time spent in reducer execution"
    );
    describe_counter!(
        SNAPSHOTS_PUBLISHED,
        "State snapshots published to subscribers"
    );
}
