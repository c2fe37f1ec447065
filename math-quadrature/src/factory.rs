//! Side-rule factory
//!
//! For a topology and a base rule, builds one rule per side by asking the
//! side shape's cache for the base rule's order. Sets are cached by
//! (topology name, identity of the base rule). Each set keeps its base rule
//! alive, so the address used as key cannot be reused by another rule while
//! the entry exists.
//!
//! Alongside the side rules, each set carries the same points mapped into the
//! parent element's parametric space, for evaluating element fields on a
//! side.

use crate::cache::{self, RuleRegistry};
use crate::dispatch::rule_kind_for_topology;
use crate::error::{QuadratureError, Result};
use crate::quadrature::{Rule, RuleKind};
use crate::topology::{ReferenceTopology, TopologyDescriptor};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

/// Rules for every side of one topology, in canonical side order
#[derive(Debug)]
pub struct SideRuleSet {
    topology: String,
    base: Arc<Rule>,
    side_rules: Vec<Arc<Rule>>,
    parent_rules: Vec<Arc<Rule>>,
}

impl SideRuleSet {
    /// Topology name the set was requested for
    pub fn topology(&self) -> &str {
        &self.topology
    }

    /// Rule whose order the side rules were built at
    pub fn base(&self) -> &Arc<Rule> {
        &self.base
    }

    pub fn num_sides(&self) -> usize {
        self.side_rules.len()
    }

    /// Rule for side `side`, in the side's own parametric space
    pub fn get_side_rule(&self, side: usize) -> Result<&Arc<Rule>> {
        self.side_rules
            .get(side)
            .ok_or(QuadratureError::SideOutOfRange {
                side,
                num_sides: self.side_rules.len(),
            })
    }

    /// Points of side `side` mapped into the parent element's parametric space
    ///
    /// Weights are the side rule's own weights.
    pub fn parent_rule(&self, side: usize) -> Result<&Arc<Rule>> {
        self.parent_rules
            .get(side)
            .ok_or(QuadratureError::SideOutOfRange {
                side,
                num_sides: self.parent_rules.len(),
            })
    }

    /// Side rules in side order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Rule>> {
        self.side_rules.iter()
    }
}

type SetKey = (String, usize);

/// Cache of side-rule sets keyed by (topology name, base rule identity)
#[derive(Debug)]
pub struct SideRuleFactory<'r> {
    registry: &'r RuleRegistry,
    sets: Mutex<HashMap<SetKey, Arc<SideRuleSet>>>,
}

impl<'r> SideRuleFactory<'r> {
    /// Factory drawing side rules from `registry`
    pub fn new(registry: &'r RuleRegistry) -> Self {
        Self {
            registry,
            sets: Mutex::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &'r RuleRegistry {
        self.registry
    }

    /// Number of cached sets
    pub fn len(&self) -> usize {
        self.sets.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Side rules for the named topology at `base`'s order
    ///
    /// Each cached set holds its base rule for the lifetime of the factory, so
    /// passing freshly allocated bases adds a new entry every time. Prefer
    /// cached rules from the registry as bases.
    pub fn instance(&self, topology: &str, base: &Arc<Rule>) -> Result<Arc<SideRuleSet>> {
        let topo = ReferenceTopology::from_name(topology)?;
        self.get_or_build(topology, &topo, base)
    }

    /// Side rules for a caller-provided topology, keyed by its name
    pub fn instance_for<T>(&self, topology: &T, base: &Arc<Rule>) -> Result<Arc<SideRuleSet>>
    where
        T: TopologyDescriptor + ?Sized,
    {
        self.get_or_build(topology.name(), topology, base)
    }

    fn get_or_build<T>(&self, name: &str, topo: &T, base: &Arc<Rule>) -> Result<Arc<SideRuleSet>>
    where
        T: TopologyDescriptor + ?Sized,
    {
        let key = (name.to_string(), Arc::as_ptr(base) as usize);
        let mut sets = self.sets.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(set) = sets.get(&key) {
            return Ok(Arc::clone(set));
        }

        let set = Arc::new(self.build(name, topo, base)?);
        log::debug!(
            "Built side rules for {}: {} sides at order {}",
            name,
            set.num_sides(),
            base.order()
        );
        sets.insert(key, Arc::clone(&set));
        Ok(set)
    }

    fn build<T>(&self, name: &str, topo: &T, base: &Arc<Rule>) -> Result<SideRuleSet>
    where
        T: TopologyDescriptor + ?Sized,
    {
        if topo.parametric_dim() < 2 {
            return Err(QuadratureError::UnsupportedOperation {
                operation: "side_rule",
                rule: RuleKind::Line.name(),
            });
        }

        let num_sides = topo.num_sides();
        let mut side_rules = Vec::with_capacity(num_sides);
        let mut parent_rules = Vec::with_capacity(num_sides);
        for side in 0..num_sides {
            let shape = topo
                .side_shape(side)
                .ok_or(QuadratureError::SideOutOfRange { side, num_sides })?;
            let kind = rule_kind_for_topology(shape)?;
            let rule = self.registry.instance(kind, base.order())?;
            parent_rules.push(Arc::new(map_to_parent(topo, side, &rule)?));
            side_rules.push(rule);
        }

        Ok(SideRuleSet {
            topology: name.to_string(),
            base: Arc::clone(base),
            side_rules,
            parent_rules,
        })
    }
}

/// Push a side rule's points through the side's vertex interpolation
fn map_to_parent<T>(topo: &T, side: usize, rule: &Rule) -> Result<Rule>
where
    T: TopologyDescriptor + ?Sized,
{
    let num_sides = topo.num_sides();
    let verts = topo
        .side_vertices(side)
        .ok_or(QuadratureError::SideOutOfRange { side, num_sides })?;
    let pdim = topo.parametric_dim();

    let mut vertex_coords = Vec::with_capacity(verts.len());
    for &v in verts {
        let coords = topo
            .vertex_coords(v)
            .ok_or(QuadratureError::ShapeMismatch {
                what: "vertex coordinates",
                expected: pdim,
                got: 0,
            })?;
        if coords.len() != pdim {
            return Err(QuadratureError::ShapeMismatch {
                what: "vertex coordinates",
                expected: pdim,
                got: coords.len(),
            });
        }
        vertex_coords.push(coords);
    }

    let mut locations = Vec::with_capacity(rule.npoints() * pdim);
    for point in rule.points() {
        let shape = side_shape_functions(rule.kind(), point.coords)?;
        if shape.len() != vertex_coords.len() {
            return Err(QuadratureError::ShapeMismatch {
                what: "side vertices",
                expected: shape.len(),
                got: vertex_coords.len(),
            });
        }
        for d in 0..pdim {
            locations.push(
                shape
                    .iter()
                    .zip(&vertex_coords)
                    .map(|(n, x)| n * x[d])
                    .sum(),
            );
        }
    }

    Rule::arbitrary(pdim, rule.npoints(), &locations, rule.weights())
}

/// Linear (line, triangle) or bilinear (quadrilateral) vertex interpolants
fn side_shape_functions(kind: RuleKind, p: &[f64]) -> Result<Vec<f64>> {
    match kind {
        RuleKind::Line => {
            let s = p[0];
            Ok(vec![0.5 * (1.0 - s), 0.5 * (1.0 + s)])
        }
        RuleKind::Triangle => {
            let (s, t) = (p[0], p[1]);
            Ok(vec![1.0 - s - t, s, t])
        }
        RuleKind::Quadrilateral => {
            let (s, t) = (p[0], p[1]);
            Ok(vec![
                0.25 * (1.0 - s) * (1.0 - t),
                0.25 * (1.0 + s) * (1.0 - t),
                0.25 * (1.0 + s) * (1.0 + t),
                0.25 * (1.0 - s) * (1.0 + t),
            ])
        }
        _ => Err(QuadratureError::UnsupportedOperation {
            operation: "side mapping",
            rule: kind.name(),
        }),
    }
}

/// Process-wide factory bound to the global registry
pub fn global() -> &'static SideRuleFactory<'static> {
    static GLOBAL: OnceLock<SideRuleFactory<'static>> = OnceLock::new();
    GLOBAL.get_or_init(|| SideRuleFactory::new(cache::global()))
}
