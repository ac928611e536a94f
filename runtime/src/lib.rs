//! # Authflow Runtime
//!
//! Runtime implementation for the authflow session orchestrator.
//!
//! This crate provides the [`Store`]: the single place where state lives and
//! the only place where it is mutated.
//!
//! ## Core Components
//!
//! - **Store**: owns state, runs the reducer, executes effects
//! - **Snapshots**: every state change is published on a `watch` channel
//!   before `send` returns, so subscribers never miss a transition
//! - **Action broadcast**: actions produced by effects are broadcast after
//!   they have been reduced, which enables request/response dispatch
//!   through [`Store::send_and_wait_for`]
//!
//! ## Example
//!
//! ```ignore
//! use authflow_runtime::Store;
//!
//! let store = Store::new(initial_state, my_reducer, environment);
//!
//! // Send an action and wait for the effects it started
//! store.send(Action::DoSomething).await.wait().await;
//!
//! // Read state
//! let value = store.state(|s| s.some_field).await;
//! ```

use authflow_core::{effect::Effect, reducer::Reducer};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, RwLock};

/// Metric names and descriptions
pub mod metrics;

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum StoreError {
        /// Action broadcast channel closed
        ///
        /// Only happens once every handle to the store has been dropped.
        #[error("Action broadcast channel closed")]
        ChannelClosed,

        /// The action observer fell behind and skipped this many actions
        ///
        /// The awaited action may have been among them. Its effect on state
        /// has already been applied; read the state to find out.
        #[error("Action observer lagged, {0} actions skipped")]
        Lagged(u64),
    }
}

pub use error::StoreError;

/// Handle for tracking effect completion
///
/// Returned by [`Store::send()`]. Waiting on the handle returns once every
/// effect the action started has finished, including the reduction of any
/// action those effects fed back. Effects started *by* fed-back actions are
/// not tracked, and neither are [`Effect::Stream`] subscriptions, which may
/// never end.
///
/// # Example
///
/// ```ignore
/// let mut handle = store.send(Action::Start).await;
/// handle.wait().await;
/// // Every effect from Action::Start has run and its result was reduced
/// ```
#[derive(Clone)]
pub struct EffectHandle {
    effects: Arc<AtomicUsize>,
    completion: watch::Receiver<()>,
}

impl EffectHandle {
    /// Create a new handle and the tracking context that feeds it
    fn new() -> (Self, EffectTracking) {
        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = watch::channel(());

        let handle = Self {
            effects: Arc::clone(&counter),
            completion: rx,
        };

        let tracking = EffectTracking {
            counter,
            notifier: Arc::new(tx),
        };

        (handle, tracking)
    }

    /// Create a handle that's already complete
    #[must_use]
    pub fn completed() -> Self {
        let (_tx, rx) = watch::channel(());

        Self {
            effects: Arc::new(AtomicUsize::new(0)),
            completion: rx,
        }
    }

    /// Whether every tracked effect has finished
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.effects.load(Ordering::SeqCst) == 0
    }

    /// Wait for all tracked effects to complete
    pub async fn wait(&mut self) {
        while self.effects.load(Ordering::SeqCst) > 0 {
            if self.completion.changed().await.is_err() {
                // Every tracker is gone, so nothing is left running
                break;
            }
        }
    }
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("pending_effects", &self.effects.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

/// Internal: effect tracking context passed through effect execution
#[derive(Clone)]
struct EffectTracking {
    counter: Arc<AtomicUsize>,
    notifier: Arc<watch::Sender<()>>,
}

impl EffectTracking {
    /// Effect started
    fn increment(&self) {
        self.counter.fetch_add(1, Ordering::SeqCst);
    }

    /// Effect completed
    fn decrement(&self) {
        if self.counter.fetch_sub(1, Ordering::SeqCst) == 1 {
            // Counter reached zero, notify waiters
            self.notifier.send_replace(());
        }
    }
}

/// Internal: RAII guard that decrements the effect counter on drop
///
/// Keeps the counter honest even if the effect panics.
struct DecrementGuard(EffectTracking);

impl Drop for DecrementGuard {
    fn drop(&mut self) {
        self.0.decrement();
    }
}

/// Store runtime for coordinating reducer execution and effect handling.
pub mod store {
    use super::{
        metrics, Arc, DecrementGuard, Effect, EffectHandle, EffectTracking, Reducer, RwLock,
        StoreError,
    };
    use futures::StreamExt;
    use tokio::sync::{broadcast, watch};

    /// Default capacity of the action broadcast channel.
    const DEFAULT_BROADCAST_CAPACITY: usize = 16;

    /// The Store - runtime coordinator for a reducer
    ///
    /// The Store manages:
    /// 1. State (behind an `RwLock`; every write goes through the reducer)
    /// 2. Reducer (business logic)
    /// 3. Environment (injected collaborators)
    /// 4. Effect execution (with feedback loop)
    /// 5. Snapshot publication to subscribers
    ///
    /// # Type Parameters
    ///
    /// - `S`: State type
    /// - `A`: Action type
    /// - `E`: Environment type
    /// - `R`: Reducer implementation
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: Arc<RwLock<S>>,
        reducer: R,
        environment: E,
        /// Latest state, republished after every reduction that changed it.
        snapshots: Arc<watch::Sender<S>>,
        /// Actions produced by effects, broadcast after they were reduced.
        action_broadcast: broadcast::Sender<A>,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Clone + Send + Sync + 'static,
        A: Clone + Send + 'static,
        S: Clone + PartialEq + Send + Sync + 'static,
        E: Clone + Send + Sync + 'static,
    {
        /// Create a new store with initial state, reducer, and environment
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self::with_broadcast_capacity(
                initial_state,
                reducer,
                environment,
                DEFAULT_BROADCAST_CAPACITY,
            )
        }

        /// Create a store with a custom action broadcast capacity
        ///
        /// Slow observers that fall more than `capacity` actions behind skip
        /// the oldest ones. A capacity of zero is raised to one.
        #[must_use]
        pub fn with_broadcast_capacity(
            initial_state: S,
            reducer: R,
            environment: E,
            capacity: usize,
        ) -> Self {
            let (snapshots, _) = watch::channel(initial_state.clone());
            let (action_broadcast, _) = broadcast::channel(capacity.max(1));

            Self {
                state: Arc::new(RwLock::new(initial_state)),
                reducer,
                environment,
                snapshots: Arc::new(snapshots),
                action_broadcast,
            }
        }

        /// Send an action to the store
        ///
        /// Runs the reducer under the write lock, publishes the new snapshot
        /// if the state changed, then starts the returned effects. By the time
        /// this returns, every subscriber can already observe the new state.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> EffectHandle {
            metrics::counter!(metrics::ACTIONS_TOTAL).increment(1);

            let (handle, tracking) = EffectHandle::new();

            let effects = {
                let mut state = self.state.write().await;

                let span = tracing::debug_span!("reducer_execution");
                let _enter = span.enter();

                let start = std::time::Instant::now();
                let effects = self.reducer.reduce(&mut state, action, &self.environment);
                metrics::histogram!(metrics::REDUCER_DURATION_SECONDS)
                    .record(start.elapsed().as_secs_f64());

                tracing::trace!("Reducer completed, returned {} effects", effects.len());

                self.publish(&state);
                effects
            };

            for effect in effects {
                self.execute_effect(effect, &tracking);
            }

            handle
        }

        /// Send an action and wait for a matching result action
        ///
        /// Designed for request/response dispatch: subscribe to the action
        /// broadcast, send the initial action, then return the first
        /// effect-produced action matching the predicate. When it is
        /// returned, that action has already been reduced.
        ///
        /// No timeout is imposed here; wrap the call in
        /// `tokio::time::timeout` when one is wanted.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ChannelClosed`] if the broadcast channel closes
        /// before a matching action arrives, and [`StoreError::Lagged`] if the
        /// observer fell behind the broadcast before a match was seen.
        pub async fn send_and_wait_for<F>(&self, action: A, predicate: F) -> Result<A, StoreError>
        where
            F: Fn(&A) -> bool,
        {
            // Subscribe BEFORE sending to avoid missing a fast result
            let mut rx = self.action_broadcast.subscribe();

            let _handle = self.send(action).await;

            loop {
                match rx.recv().await {
                    Ok(action) if predicate(&action) => return Ok(action),
                    Ok(_) => {},
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Action observer lagged, {} actions skipped", skipped);
                        return Err(StoreError::Lagged(skipped));
                    },
                    Err(broadcast::error::RecvError::Closed) => {
                        return Err(StoreError::ChannelClosed);
                    },
                }
            }
        }

        /// Subscribe to actions produced by effects
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
            self.action_broadcast.subscribe()
        }

        /// Subscribe to state snapshots
        ///
        /// The receiver starts at the current state and is marked changed
        /// every time a reduction modifies the state.
        #[must_use]
        pub fn subscribe(&self) -> watch::Receiver<S> {
            self.snapshots.subscribe()
        }

        /// Clone of the most recently published state
        #[must_use]
        pub fn snapshot(&self) -> S {
            self.snapshots.borrow().clone()
        }

        /// Read current state via a closure
        ///
        /// ```ignore
        /// let initialized = store.state(|s| s.is_initialized()).await;
        /// ```
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            f(&state)
        }

        fn publish(&self, state: &S) {
            let changed = self.snapshots.send_if_modified(|current| {
                if current == state {
                    false
                } else {
                    current.clone_from(state);
                    true
                }
            });

            if changed {
                metrics::counter!(metrics::SNAPSHOTS_PUBLISHED).increment(1);
                tracing::trace!("Published state snapshot");
            }
        }

        /// Reduce an action produced by an effect, then broadcast it
        async fn feed_back(&self, action: A) {
            let _handle = self.send(action.clone()).await;
            // No receivers is fine
            let _ = self.action_broadcast.send(action);
        }

        fn execute_effect(&self, effect: Effect<A>, tracking: &EffectTracking) {
            match effect {
                Effect::None => {
                    tracing::trace!("Executing Effect::None (no-op)");
                },
                Effect::Future(fut) => {
                    tracing::trace!("Executing Effect::Future");
                    metrics::counter!(metrics::EFFECTS_EXECUTED, "type" => "future").increment(1);

                    tracking.increment();
                    let guard = DecrementGuard(tracking.clone());
                    let store = self.clone();

                    tokio::spawn(async move {
                        let _guard = guard;

                        if let Some(action) = fut.await {
                            tracing::trace!("Effect::Future produced an action, sending to store");
                            store.feed_back(action).await;
                        } else {
                            tracing::trace!("Effect::Future completed with no action");
                        }
                    });
                },
                Effect::Stream(mut stream) => {
                    tracing::trace!("Executing Effect::Stream");
                    metrics::counter!(metrics::EFFECTS_EXECUTED, "type" => "stream").increment(1);

                    let store = self.clone();

                    tokio::spawn(async move {
                        while let Some(action) = stream.next().await {
                            store.feed_back(action).await;
                        }
                        tracing::trace!("Effect::Stream ended");
                    });
                },
                Effect::Parallel(effects) => {
                    tracing::trace!("Executing Effect::Parallel with {} effects", effects.len());
                    metrics::counter!(metrics::EFFECTS_EXECUTED, "type" => "parallel").increment(1);

                    for effect in effects {
                        self.execute_effect(effect, tracking);
                    }
                },
                Effect::Sequential(effects) => {
                    let effect_count = effects.len();
                    tracing::trace!("Executing Effect::Sequential with {} effects", effect_count);
                    metrics::counter!(metrics::EFFECTS_EXECUTED, "type" => "sequential").increment(1);

                    tracking.increment();
                    let guard = DecrementGuard(tracking.clone());
                    let store = self.clone();

                    tokio::spawn(async move {
                        let _guard = guard;

                        for (idx, effect) in effects.into_iter().enumerate() {
                            tracing::trace!(
                                "Executing sequential effect {} of {}",
                                idx + 1,
                                effect_count
                            );

                            let (mut step, step_tracking) = EffectHandle::new();
                            store.execute_effect(effect, &step_tracking);
                            drop(step_tracking);

                            step.wait().await;
                        }
                        tracing::trace!("Effect::Sequential completed");
                    });
                },
            }
        }
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Clone,
        E: Clone,
    {
        fn clone(&self) -> Self {
            Self {
                state: Arc::clone(&self.state),
                reducer: self.reducer.clone(),
                environment: self.environment.clone(),
                snapshots: Arc::clone(&self.snapshots),
                action_broadcast: self.action_broadcast.clone(),
            }
        }
    }
}

// Re-export for convenience
pub use store::Store;

#[cfg(test)]
mod tests {
    use super::*;
    use authflow_core::{smallvec, SmallVec};
    use futures::stream;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct TestState {
        value: i32,
        log: Vec<&'static str>,
    }

    #[derive(Debug, Clone, PartialEq)]
    enum TestAction {
        Increment,
        Touch,
        Record(&'static str),
        ProduceEffect,
        ProduceSequentialEffects,
        ProduceParallelEffects,
        ProduceStream,
        ProduceNothing,
    }

    #[derive(Debug, Clone)]
    struct TestReducer;

    impl Reducer for TestReducer {
        type State = TestState;
        type Action = TestAction;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            match action {
                TestAction::Increment => {
                    state.value += 1;
                    smallvec![Effect::None]
                },
                TestAction::Touch => smallvec![Effect::None],
                TestAction::Record(label) => {
                    state.log.push(label);
                    smallvec![Effect::None]
                },
                TestAction::ProduceEffect => {
                    smallvec![Effect::task(async { TestAction::Increment })]
                },
                TestAction::ProduceSequentialEffects => smallvec![Effect::chain(vec![
                    Effect::Future(Box::pin(async {
                        tokio::task::yield_now().await;
                        Some(TestAction::Record("first"))
                    })),
                    Effect::task(async { TestAction::Record("second") }),
                    Effect::task(async { TestAction::Record("third") }),
                ])],
                TestAction::ProduceParallelEffects => smallvec![Effect::merge(vec![
                    Effect::task(async { TestAction::Increment }),
                    Effect::task(async { TestAction::Increment }),
                    Effect::task(async { TestAction::Increment }),
                ])],
                TestAction::ProduceStream => smallvec![Effect::Stream(Box::pin(stream::iter(
                    vec![TestAction::Record("a"), TestAction::Record("b")]
                )))],
                TestAction::ProduceNothing => {
                    smallvec![Effect::Future(Box::pin(async { None }))]
                },
            }
        }
    }

    fn test_store() -> Store<TestState, TestAction, (), TestReducer> {
        Store::new(TestState::default(), TestReducer, ())
    }

    #[tokio::test]
    async fn test_send_updates_state() {
        let store = test_store();

        let _ = store.send(TestAction::Increment).await;

        assert_eq!(store.state(|s| s.value).await, 1);
        assert_eq!(store.snapshot().value, 1);
    }

    #[tokio::test]
    async fn test_subscribers_see_change_before_send_returns() {
        let store = test_store();
        let mut rx = store.subscribe();
        assert!(!rx.has_changed().unwrap_or(true));

        let _ = store.send(TestAction::Increment).await;

        assert!(rx.has_changed().unwrap_or(false));
        assert_eq!(rx.borrow_and_update().value, 1);
    }

    #[tokio::test]
    async fn test_unchanged_state_is_not_republished() {
        let store = test_store();
        let rx = store.subscribe();

        let _ = store.send(TestAction::Touch).await;

        assert!(!rx.has_changed().unwrap_or(true));
    }

    #[tokio::test]
    async fn test_future_effect_feeds_back_before_handle_completes() {
        let store = test_store();

        let mut handle = store.send(TestAction::ProduceEffect).await;
        handle.wait().await;

        assert!(handle.is_complete());
        assert_eq!(store.state(|s| s.value).await, 1);
    }

    #[tokio::test]
    async fn test_future_without_action() {
        let store = test_store();

        let mut handle = store.send(TestAction::ProduceNothing).await;
        handle.wait().await;

        assert_eq!(store.snapshot(), TestState::default());
    }

    #[tokio::test]
    async fn test_sequential_effects_preserve_order() {
        let store = test_store();

        let mut handle = store.send(TestAction::ProduceSequentialEffects).await;
        handle.wait().await;

        assert_eq!(store.state(|s| s.log.clone()).await, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_parallel_effects_all_complete() {
        let store = test_store();

        let mut handle = store.send(TestAction::ProduceParallelEffects).await;
        handle.wait().await;

        assert_eq!(store.state(|s| s.value).await, 3);
    }

    #[tokio::test]
    async fn test_stream_effect_feeds_every_item() {
        let store = test_store();
        let mut rx = store.subscribe();

        let _ = store.send(TestAction::ProduceStream).await;

        while rx.borrow_and_update().log.len() < 2 {
            if rx.changed().await.is_err() {
                break;
            }
        }
        assert_eq!(store.snapshot().log, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_send_and_wait_for_returns_reduced_action() {
        let store = test_store();

        let result = store
            .send_and_wait_for(TestAction::ProduceEffect, |a| matches!(a, TestAction::Increment))
            .await;

        assert_eq!(result, Ok(TestAction::Increment));
        assert_eq!(store.snapshot().value, 1);
    }

    #[tokio::test]
    async fn test_completed_handle() {
        let mut handle = EffectHandle::completed();
        assert!(handle.is_complete());
        handle.wait().await;
    }
}
