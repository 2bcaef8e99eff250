//! Service dependency graph derived from retained traces.
//!
//! An edge `parent → child` is recorded whenever a span's `service.name` tag
//! differs from its parent span's tag. Spans without the tag, or whose parent
//! was recorded in another process, contribute nothing.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use parking_lot::RwLock;

use crate::trace::Trace;

/// Set-valued adjacency map of service calls.
pub type ServiceDependencies = BTreeMap<String, BTreeSet<String>>;

#[derive(Debug, Default)]
pub struct DependencyGraph {
    edges: RwLock<ServiceDependencies>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the service edges found in `trace`.
    pub fn observe(&self, trace: &Trace) {
        let services: HashMap<&str, &str> = trace
            .spans
            .iter()
            .filter_map(|s| s.service_tag().map(|svc| (s.span_id.as_str(), svc)))
            .collect();

        let discovered: Vec<(&str, &str)> = trace
            .spans
            .iter()
            .filter_map(|span| {
                let child = span.service_tag()?;
                let parent = services.get(span.parent_span_id.as_deref()?)?;
                (*parent != child).then_some((*parent, child))
            })
            .collect();

        if discovered.is_empty() {
            return;
        }

        let mut edges = self.edges.write();
        for (parent, child) in discovered {
            let inserted = edges
                .entry(parent.to_string())
                .or_default()
                .insert(child.to_string());
            if inserted {
                tracing::debug!(parent = parent, child = child, "New service dependency");
            }
        }
    }

    pub fn edges(&self) -> ServiceDependencies {
        self.edges.read().clone()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.read().values().map(BTreeSet::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::context::TraceContext;
    use crate::trace::span::{Span, SpanStatus};

    fn span(ctx: &TraceContext, service: Option<&str>) -> Span {
        let tags: Vec<(&str, &str)> = service.map(|s| vec![("service.name", s)]).unwrap_or_default();
        let mut span = Span::start(ctx, "op", &tags, "default", 0.0);
        span.finish(1.0, SpanStatus::Ok, None, &[]);
        span
    }

    fn trace_of(spans: Vec<Span>) -> Trace {
        let mut trace = Trace::open(&spans[0], true);
        for s in spans {
            trace.push_span(s);
        }
        trace
    }

    #[test]
    fn test_edges_between_different_services() {
        let gateway = TraceContext::new_root(true);
        let users = gateway.child();
        let db = users.child();
        let users_internal = users.child();

        let trace = trace_of(vec![
            span(&gateway, Some("gateway")),
            span(&users, Some("users")),
            span(&db, Some("postgres")),
            span(&users_internal, Some("users")),
        ]);

        let graph = DependencyGraph::new();
        graph.observe(&trace);

        let edges = graph.edges();
        assert_eq!(edges["gateway"], BTreeSet::from(["users".to_string()]));
        assert_eq!(edges["users"], BTreeSet::from(["postgres".to_string()]));
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn test_missing_tags_leave_a_gap() {
        let gateway = TraceContext::new_root(true);
        let untagged = gateway.child();
        let db = untagged.child();

        let trace = trace_of(vec![
            span(&gateway, Some("gateway")),
            span(&untagged, None),
            span(&db, Some("postgres")),
        ]);

        let graph = DependencyGraph::new();
        graph.observe(&trace);
        assert!(graph.edges().is_empty());
    }

    #[test]
    fn test_repeated_observation_is_idempotent() {
        let a = TraceContext::new_root(true);
        let b = a.child();
        let trace = trace_of(vec![span(&a, Some("a")), span(&b, Some("b"))]);

        let graph = DependencyGraph::new();
        graph.observe(&trace);
        graph.observe(&trace);
        assert_eq!(graph.edge_count(), 1);
    }
}
