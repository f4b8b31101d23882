/// The async adapters the propagator talks to, plus in-memory versions.
///
/// # Responsibilities
/// - Defines [`DependencyGraph`](adapter::DependencyGraph), which answers
///   "who depends on this property" and records stale marks.
/// - Defines [`EventSink`](adapter::EventSink), which receives stale events.
/// - Provides in-memory implementations for embedding and tests.
pub mod adapter;
/// Collects changed properties during a callback and propagates once.
pub mod deferred;
/// The event emitted for every property marked stale.
pub mod event;
/// Breadth-first staleness propagation over the dependency graph.
///
/// # Responsibilities
/// - Seeds from the direct dependents of each changed property.
/// - Marks each reachable property stale and emits one event for it.
/// - Terminates on cyclic graphs through a per-run processed set.
pub mod propagator;
/// Dependency-first ordering of properties and cycle diagnostics.
pub mod topology;

pub use adapter::{DependencyGraph, EventSink, InMemoryDependencyGraph, MemoryEventSink};
pub use deferred::StaleRecorder;
pub use event::PropertyStaleEvent;
pub use propagator::{PropagationError, StalenessPropagator};
pub use topology::{TopologicalOrder, circular_dependency_error, find_cycle, topological_sort};
