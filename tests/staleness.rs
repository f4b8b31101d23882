use std::{collections::HashMap, sync::Arc};

use anyhow::anyhow;
use async_trait::async_trait;
use computed_props::{
    ErrorCode, PropertyKey, TenantId,
    dependencies::dependency_keys,
    parse,
    staleness::{
        DependencyGraph, EventSink, InMemoryDependencyGraph, MemoryEventSink, PropagationError,
        PropertyStaleEvent, StalenessPropagator, circular_dependency_error, find_cycle,
        topological_sort,
    },
};
use uuid::Uuid;

const TENANT: TenantId = Uuid::from_u128(0x7e);
const ORDER: Uuid = Uuid::from_u128(0x1);
const CUSTOMER: Uuid = Uuid::from_u128(0x2);

fn key(name: &str) -> PropertyKey {
    PropertyKey::new(ORDER, name)
}

fn wire(graph: &Arc<InMemoryDependencyGraph>) -> (StalenessPropagator, Arc<MemoryEventSink>) {
    let sink = Arc::new(MemoryEventSink::new());
    let propagator = StalenessPropagator::new(graph.clone()).with_sink(sink.clone());
    (propagator, sink)
}

fn names(events: &[PropertyStaleEvent]) -> Vec<String> {
    events.iter().map(|event| event.property_name.clone()).collect()
}

/// price -> subtotal -> tax -> total, and subtotal -> total.
fn order_graph() -> Arc<InMemoryDependencyGraph> {
    let graph = Arc::new(InMemoryDependencyGraph::new());
    graph.add_dependency(TENANT, key("subtotal"), key("price"));
    graph.add_dependency(TENANT, key("subtotal"), key("quantity"));
    graph.add_dependency(TENANT, key("tax"), key("subtotal"));
    graph.add_dependency(TENANT, key("total"), key("subtotal"));
    graph.add_dependency(TENANT, key("total"), key("tax"));
    graph
}

#[tokio::test]
async fn marks_transitive_dependents_once_in_breadth_first_order() {
    let graph = order_graph();
    let (propagator, sink) = wire(&graph);

    let events = propagator.propagate_staleness(TENANT, &key("price")).await.unwrap();

    assert_eq!(names(&events), vec!["subtotal", "tax", "total"]);
    assert_eq!(events[0].caused_by, key("price"));
    assert_eq!(events[1].caused_by, key("subtotal"));
    assert_eq!(events[2].caused_by, key("subtotal"));
    assert!(events.iter().all(|event| event.tenant_id == TENANT));

    assert_eq!(sink.events(), events);
    assert_eq!(graph.stale_keys(TENANT), vec![key("subtotal"), key("tax"), key("total")]);
    assert!(!graph.is_stale(TENANT, &key("price")));
}

#[tokio::test]
async fn property_without_dependents_produces_nothing() {
    let graph = order_graph();
    let (propagator, sink) = wire(&graph);

    let events = propagator.propagate_staleness(TENANT, &key("total")).await.unwrap();
    assert!(events.is_empty());
    assert!(sink.events().is_empty());
}

#[tokio::test]
async fn cycles_terminate_without_marking_the_changed_property() {
    let graph = Arc::new(InMemoryDependencyGraph::new());
    graph.add_dependency(TENANT, key("b"), key("a"));
    graph.add_dependency(TENANT, key("c"), key("b"));
    graph.add_dependency(TENANT, key("a"), key("c"));
    let (propagator, _) = wire(&graph);

    let events = propagator.propagate_staleness(TENANT, &key("a")).await.unwrap();
    assert_eq!(names(&events), vec!["b", "c"]);
    assert!(!graph.is_stale(TENANT, &key("a")));
}

#[tokio::test]
async fn batch_deduplicates_changes_and_shared_dependents() {
    let graph = order_graph();
    let (propagator, sink) = wire(&graph);

    let changes = [key("price"), key("quantity"), key("price")];
    let events = propagator.batch_propagate_staleness(TENANT, &changes).await.unwrap();

    assert_eq!(names(&events), vec!["subtotal", "tax", "total"]);
    assert_eq!(sink.take().len(), 3);
}

#[tokio::test]
async fn batch_does_not_mark_properties_that_were_changed_themselves() {
    let graph = order_graph();
    let (propagator, _) = wire(&graph);

    let events = propagator.batch_propagate_staleness(TENANT, &[key("price"), key("tax")])
                           .await
                           .unwrap();
    assert_eq!(names(&events), vec!["subtotal", "total"]);
    assert!(!graph.is_stale(TENANT, &key("tax")));
}

#[tokio::test]
async fn tenants_are_isolated() {
    let graph = order_graph();
    let (propagator, _) = wire(&graph);

    let other = Uuid::from_u128(0x99);
    let events = propagator.propagate_staleness(other, &key("price")).await.unwrap();
    assert!(events.is_empty());
    assert!(graph.stale_keys(TENANT).is_empty());
}

#[tokio::test]
async fn dependencies_span_entities() {
    let graph = Arc::new(InMemoryDependencyGraph::new());
    let expression = parse(&format!("#subtotal * (1 - @{{{CUSTOMER}}}.discount_rate)")).unwrap();
    graph.set_dependencies(TENANT, &key("total"), dependency_keys(&expression, ORDER));
    let (propagator, _) = wire(&graph);

    let changed = PropertyKey::new(CUSTOMER, "discount_rate");
    let events = propagator.propagate_staleness(TENANT, &changed).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].key(), key("total"));
    assert_eq!(events[0].caused_by, changed);
}

#[tokio::test]
async fn redefining_a_property_replaces_its_edges() {
    let graph = order_graph();
    graph.set_dependencies(TENANT, &key("total"), [key("tax")]);
    let (propagator, _) = wire(&graph);

    let events = propagator.propagate_staleness(TENANT, &key("price")).await.unwrap();
    assert_eq!(names(&events), vec!["subtotal", "tax", "total"]);
    assert_eq!(events[2].caused_by, key("tax"));
}

#[tokio::test]
async fn deferred_writes_propagate_once() {
    let graph = order_graph();
    let (propagator, sink) = wire(&graph);

    let (value, events) = propagator.with_deferred_staleness(TENANT, |recorder| async move {
                                        for _ in 0..10 {
                                            recorder.record(ORDER, "price");
                                        }
                                        Ok::<_, anyhow::Error>("saved")
                                    })
                                    .await
                                    .unwrap();
    let deferred_lookups = graph.lookups();

    assert_eq!(value, "saved");
    assert_eq!(names(&events), vec!["subtotal", "tax", "total"]);
    assert_eq!(sink.take().len(), 3);

    let eager = order_graph();
    let (eager_propagator, eager_sink) = wire(&eager);
    for _ in 0..10 {
        eager_propagator.propagate_staleness(TENANT, &key("price")).await.unwrap();
    }
    assert_eq!(eager_sink.events().len(), 30);
    assert_eq!(eager.lookups(), deferred_lookups * 10);
}

#[tokio::test]
async fn deferred_callback_failure_skips_propagation() {
    let graph = order_graph();
    let (propagator, sink) = wire(&graph);

    let result: Result<((), _), _> =
        propagator.with_deferred_staleness(TENANT, |recorder| async move {
                      recorder.record(ORDER, "price");
                      Err(anyhow!("write rejected"))
                  })
                  .await;

    let Err(PropagationError::Callback(source)) = &result else {
        panic!("expected a callback error, got {result:?}");
    };
    assert_eq!(source.to_string(), "write rejected");
    assert_eq!(graph.lookups(), 0);
    assert!(sink.events().is_empty());
}

struct BrokenGraph;

#[async_trait]
impl DependencyGraph for BrokenGraph {
    async fn get_dependents(&self, _tenant: TenantId, _key: &PropertyKey) -> anyhow::Result<Vec<PropertyKey>> {
        Err(anyhow!("connection reset"))
    }

    async fn mark_stale(&self, _tenant: TenantId, _key: &PropertyKey) -> anyhow::Result<()> {
        Ok(())
    }
}

struct RejectingSink;

#[async_trait]
impl EventSink for RejectingSink {
    async fn emit(&self, _event: &PropertyStaleEvent) -> anyhow::Result<()> {
        Err(anyhow!("queue full"))
    }
}

#[tokio::test]
async fn graph_failures_are_reported_with_the_key() {
    let propagator = StalenessPropagator::new(Arc::new(BrokenGraph));
    let err = propagator.propagate_staleness(TENANT, &key("price")).await.unwrap_err();

    let PropagationError::Graph { key: failed, source, .. } = &err else {
        panic!("expected a graph error, got {err:?}");
    };
    assert_eq!(*failed, key("price"));
    assert_eq!(source.to_string(), "connection reset");
    assert!(err.to_string().contains(&key("price").to_string()));
}

#[tokio::test]
async fn sink_failures_stop_propagation() {
    let graph = order_graph();
    let propagator = StalenessPropagator::new(graph.clone()).with_sink(Arc::new(RejectingSink));

    let err = propagator.propagate_staleness(TENANT, &key("price")).await.unwrap_err();
    assert!(matches!(&err, PropagationError::Sink { key: failed, .. } if *failed == key("subtotal")));
    assert_eq!(graph.stale_keys(TENANT), vec![key("subtotal")]);
}

#[test]
fn stale_events_serialize_in_camel_case() {
    let event = PropertyStaleEvent::new(TENANT, &key("total"), key("price"));
    let json = serde_json::to_value(&event).unwrap();

    assert_eq!(json["tenantId"], TENANT.to_string());
    assert_eq!(json["entityId"], ORDER.to_string());
    assert_eq!(json["propertyName"], "total");
    assert_eq!(json["causedBy"]["propertyName"], "price");
    assert!(json["occurredAt"].is_string());

    let back: PropertyStaleEvent = serde_json::from_value(json).unwrap();
    assert_eq!(back, event);
}

fn chain(edges: &[(&str, &[&str])]) -> HashMap<PropertyKey, Vec<PropertyKey>> {
    edges.iter()
         .map(|(name, deps)| (key(name), deps.iter().map(|dep| key(dep)).collect()))
         .collect()
}

#[test]
fn topological_order_puts_dependencies_first() {
    let dependencies = chain(&[("e", &["d"]), ("d", &["c"]), ("c", &["b"]), ("b", &["a"])]);
    let properties: Vec<PropertyKey> = ["e", "c", "a", "d", "b"].map(key).to_vec();

    let sorted = topological_sort(&properties, &dependencies);
    assert!(sorted.is_acyclic());
    assert_eq!(sorted.order, ["a", "b", "c", "d", "e"].map(key).to_vec());
}

#[test]
fn topological_order_ignores_edges_to_unlisted_properties() {
    let dependencies = chain(&[("total", &["subtotal", "external"]), ("subtotal", &[])]);
    let sorted = topological_sort(&[key("total"), key("subtotal")], &dependencies);
    assert_eq!(sorted.order, vec![key("subtotal"), key("total")]);
}

#[test]
fn topological_sort_reports_cycles_and_keeps_going() {
    let dependencies = chain(&[("e", &["d"]),
                               ("d", &["c"]),
                               ("c", &["b"]),
                               ("b", &["d", "a"]),
                               ("a", &[])]);
    let properties: Vec<PropertyKey> = ["a", "b", "c", "d", "e"].map(key).to_vec();

    let sorted = topological_sort(&properties, &dependencies);
    assert!(!sorted.is_acyclic());
    assert_eq!(sorted.circular.len(), 1);

    let circular = sorted.circular_keys();
    assert_eq!(circular.len(), 3);
    for name in ["b", "c", "d"] {
        assert!(circular.contains(&key(name)), "{name} should be on the cycle");
    }

    assert_eq!(sorted.order.len(), properties.len());
    let position = |name: &str| sorted.order.iter().position(|k| *k == key(name)).unwrap();
    assert!(position("a") < position("b"));
    assert!(position("d") < position("e"));
}

#[test]
fn find_cycle_returns_the_shortest_chain() {
    let dependencies = chain(&[("a", &["b", "x"]), ("b", &["c"]), ("c", &["a"]), ("x", &["a"])]);

    let cycle = find_cycle(&key("a"), &dependencies).unwrap();
    assert_eq!(cycle, ["a", "x", "a"].map(key).to_vec());

    let self_loop = chain(&[("a", &["a"])]);
    assert_eq!(find_cycle(&key("a"), &self_loop), Some(["a", "a"].map(key).to_vec()));

    let acyclic = chain(&[("a", &["b"]), ("b", &[])]);
    assert_eq!(find_cycle(&key("a"), &acyclic), None);
}

#[test]
fn cycle_errors_carry_the_chain() {
    let dependencies = chain(&[("total", &["tax"]), ("tax", &["total"])]);
    let cycle = find_cycle(&key("total"), &dependencies).unwrap();

    let error = circular_dependency_error(cycle.clone());
    assert_eq!(error.code, ErrorCode::CircularDependency);
    assert_eq!(error.chain, cycle);
    assert!(error.message.contains(&format!("{} -> {}", key("total"), key("tax"))));
    assert!(error.format_with_source("").contains("= cycle:"));
}
