//! Topology name to rule lookup

use crate::cache::{self, RuleRegistry};
use crate::error::Result;
use crate::quadrature::{Rule, RuleKind};
use crate::topology::ReferenceTopology;
use std::sync::Arc;

/// Rule variant for a topology name
pub fn rule_kind_for_topology(name: &str) -> Result<RuleKind> {
    ReferenceTopology::from_name(name).map(|topo| topo.rule_kind())
}

/// Cached rule of `order` for the topology `name`
pub fn rule_for_topology(registry: &RuleRegistry, name: &str, order: usize) -> Result<Arc<Rule>> {
    registry.instance(rule_kind_for_topology(name)?, order)
}

/// [`rule_for_topology`] against the global registry
pub fn topo_to_rule(name: &str, order: usize) -> Result<Arc<Rule>> {
    rule_for_topology(cache::global(), name, order)
}
