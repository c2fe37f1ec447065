//! Per-variant rule caches
//!
//! Each [`RuleCache`] maps order to a shared [`Rule`] and builds a rule the
//! first time its order is requested. The check and the insert happen under
//! one lock, so a (variant, order) pair is built at most once and every caller
//! receives the same `Arc`.
//!
//! Building a quadrilateral or hexahedron rule locks the line cache while the
//! outer cache is held. Dimension strictly decreases along that path, so the
//! lock order is acyclic.

use crate::config::QuadratureConfig;
use crate::error::{QuadratureError, Result};
use crate::quadrature::{NewtonSettings, Rule, RuleKind};
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

/// Lazily populated order -> rule map for one variant
#[derive(Debug)]
pub struct RuleCache {
    kind: RuleKind,
    rules: Mutex<HashMap<usize, Arc<Rule>>>,
}

impl RuleCache {
    fn new(kind: RuleKind) -> Self {
        Self {
            kind,
            rules: Mutex::new(HashMap::new()),
        }
    }

    /// Variant this cache holds
    pub fn kind(&self) -> RuleKind {
        self.kind
    }

    /// Number of orders built so far
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `order` has already been built
    pub fn contains(&self, order: usize) -> bool {
        self.lock().contains_key(&order)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<usize, Arc<Rule>>> {
        // Entries are only inserted fully built, so a poisoned map is still valid
        self.rules.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Already-built rule for `order`, without building one
    pub fn get(&self, order: usize) -> Option<Arc<Rule>> {
        self.lock().get(&order).cloned()
    }

    fn get_or_build<F>(&self, order: usize, build: F) -> Result<Arc<Rule>>
    where
        F: FnOnce() -> Result<Rule>,
    {
        let mut rules = self.lock();
        if let Some(rule) = rules.get(&order) {
            log::trace!("{} rule order {} served from cache", self.kind.name(), order);
            return Ok(Arc::clone(rule));
        }

        let rule = Arc::new(build()?);
        log::debug!(
            "Built {} rule: order {}, {} points",
            self.kind.name(),
            order,
            rule.npoints()
        );
        rules.insert(order, Arc::clone(&rule));
        Ok(rule)
    }
}

/// The five rule caches plus the limits they are built under
#[derive(Debug)]
pub struct RuleRegistry {
    config: QuadratureConfig,
    line: RuleCache,
    quadrilateral: RuleCache,
    triangle: RuleCache,
    hexahedron: RuleCache,
    tetrahedron: RuleCache,
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::from_valid_config(QuadratureConfig::default())
    }
}

impl RuleRegistry {
    /// Registry with default limits
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with custom limits
    pub fn with_config(config: QuadratureConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: QuadratureConfig) -> Self {
        Self {
            config,
            line: RuleCache::new(RuleKind::Line),
            quadrilateral: RuleCache::new(RuleKind::Quadrilateral),
            triangle: RuleCache::new(RuleKind::Triangle),
            hexahedron: RuleCache::new(RuleKind::Hexahedron),
            tetrahedron: RuleCache::new(RuleKind::Tetrahedron),
        }
    }

    pub fn config(&self) -> &QuadratureConfig {
        &self.config
    }

    /// Cache for a variant; arbitrary rules are never cached
    pub fn cache(&self, kind: RuleKind) -> Result<&RuleCache> {
        match kind {
            RuleKind::Arbitrary => Err(QuadratureError::UnsupportedOperation {
                operation: "cached instance",
                rule: kind.name(),
            }),
            RuleKind::Line => Ok(&self.line),
            RuleKind::Quadrilateral => Ok(&self.quadrilateral),
            RuleKind::Triangle => Ok(&self.triangle),
            RuleKind::Hexahedron => Ok(&self.hexahedron),
            RuleKind::Tetrahedron => Ok(&self.tetrahedron),
        }
    }

    /// The shared rule for (kind, order), built on first request
    pub fn instance(&self, kind: RuleKind, order: usize) -> Result<Arc<Rule>> {
        let cache = self.cache(kind)?;
        if order == 0 || order > self.config.max_order {
            return Err(QuadratureError::InvalidOrder {
                order,
                max: self.config.max_order,
            });
        }

        let settings = NewtonSettings::from(&self.config);
        cache.get_or_build(order, || match kind {
            RuleKind::Line => Rule::line(order, settings),
            RuleKind::Quadrilateral => {
                let line = self.line(order)?;
                Ok(Rule::quadrilateral(&line))
            }
            RuleKind::Hexahedron => {
                let line = self.line(order)?;
                Ok(Rule::hexahedron(&line))
            }
            RuleKind::Triangle => Rule::triangle(order, settings),
            RuleKind::Tetrahedron => Rule::tetrahedron(order, settings),
            RuleKind::Arbitrary => Err(QuadratureError::UnsupportedOperation {
                operation: "cached instance",
                rule: kind.name(),
            }),
        })
    }

    pub fn line(&self, order: usize) -> Result<Arc<Rule>> {
        self.instance(RuleKind::Line, order)
    }

    pub fn quadrilateral(&self, order: usize) -> Result<Arc<Rule>> {
        self.instance(RuleKind::Quadrilateral, order)
    }

    pub fn triangle(&self, order: usize) -> Result<Arc<Rule>> {
        self.instance(RuleKind::Triangle, order)
    }

    pub fn hexahedron(&self, order: usize) -> Result<Arc<Rule>> {
        self.instance(RuleKind::Hexahedron, order)
    }

    pub fn tetrahedron(&self, order: usize) -> Result<Arc<Rule>> {
        self.instance(RuleKind::Tetrahedron, order)
    }

    /// Whether `rule` is the instance this registry holds for its (kind, order)
    pub fn owns(&self, rule: &Rule) -> bool {
        self.cache(rule.kind())
            .ok()
            .and_then(|cache| cache.get(rule.order()))
            .is_some_and(|held| std::ptr::eq(Arc::as_ptr(&held), rule))
    }

    /// Rule on the sides of `rule`, at the same order
    ///
    /// Lines and arbitrary point sets have no side rule.
    pub fn side_rule(&self, rule: &Rule) -> Result<Arc<Rule>> {
        let side_kind = rule
            .kind()
            .side_kind()
            .ok_or(QuadratureError::UnsupportedOperation {
                operation: "side_rule",
                rule: rule.name(),
            })?;
        self.instance(side_kind, rule.order())
    }

    /// Rule of the same variant as `rule` at a different order
    pub fn change_order(&self, rule: &Rule, order: usize) -> Result<Arc<Rule>> {
        if rule.kind() == RuleKind::Arbitrary {
            return Err(QuadratureError::UnsupportedOperation {
                operation: "change_order",
                rule: rule.name(),
            });
        }
        self.instance(rule.kind(), order)
    }

    /// Build every (kind, order) pair up front, in parallel
    pub fn warm_up(&self, kinds: &[RuleKind], orders: &[usize]) -> Result<()> {
        let pairs: Vec<(RuleKind, usize)> = kinds
            .iter()
            .flat_map(|&kind| orders.iter().map(move |&order| (kind, order)))
            .collect();

        log::info!("Warming up {} quadrature rules", pairs.len());
        pairs
            .into_par_iter()
            .try_for_each(|(kind, order)| self.instance(kind, order).map(|_| ()))
    }
}

/// Process-wide registry with default limits
pub fn global() -> &'static RuleRegistry {
    static GLOBAL: OnceLock<RuleRegistry> = OnceLock::new();
    GLOBAL.get_or_init(RuleRegistry::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_is_shared() {
        let registry = RuleRegistry::new();
        for kind in RuleKind::CACHED {
            let a = registry.instance(kind, 3).unwrap();
            let b = registry.instance(kind, 3).unwrap();
            assert!(Arc::ptr_eq(&a, &b), "{:?} built twice", kind);
        }
    }

    #[test]
    fn test_distinct_orders_distinct_rules() {
        let registry = RuleRegistry::new();
        let a = registry.line(2).unwrap();
        let b = registry.line(3).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(registry.cache(RuleKind::Line).unwrap().len(), 2);
    }

    #[test]
    fn test_tensor_rules_populate_line_cache() {
        let registry = RuleRegistry::new();
        let line_cache = registry.cache(RuleKind::Line).unwrap();
        assert!(line_cache.is_empty());
        registry.hexahedron(4).unwrap();
        assert!(line_cache.contains(4));
        assert!(!registry.cache(RuleKind::Quadrilateral).unwrap().contains(4));
    }

    #[test]
    fn test_invalid_orders() {
        let registry = RuleRegistry::with_config(QuadratureConfig {
            max_order: 5,
            ..Default::default()
        })
        .unwrap();
        let err = registry.line(0).unwrap_err();
        assert!(matches!(err, QuadratureError::InvalidOrder { order: 0, max: 5 }));
        assert!(registry.quadrilateral(6).unwrap_err().is_precondition());
        assert!(registry.quadrilateral(5).is_ok());
    }

    #[test]
    fn test_arbitrary_not_cached() {
        let registry = RuleRegistry::new();
        assert!(registry.cache(RuleKind::Arbitrary).unwrap_err().is_unsupported());
        assert!(
            registry
                .instance(RuleKind::Arbitrary, 1)
                .unwrap_err()
                .is_unsupported()
        );
    }

    #[test]
    fn test_side_rule_and_change_order() {
        let registry = RuleRegistry::new();
        let hex = registry.hexahedron(3).unwrap();
        let side = registry.side_rule(&hex).unwrap();
        assert!(Arc::ptr_eq(&side, &registry.quadrilateral(3).unwrap()));

        let line = registry.line(3).unwrap();
        assert!(registry.side_rule(&line).unwrap_err().is_unsupported());

        let hex5 = registry.change_order(&hex, 5).unwrap();
        assert_eq!(hex5.kind(), RuleKind::Hexahedron);
        assert_eq!(hex5.order(), 5);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = QuadratureConfig {
            max_newton_iterations: 0,
            ..Default::default()
        };
        assert!(RuleRegistry::with_config(config).is_err());
    }

    #[test]
    fn test_concurrent_requests_share_instance() {
        let registry = RuleRegistry::new();
        let rules: Vec<Arc<Rule>> = (0..16)
            .into_par_iter()
            .map(|_| registry.tetrahedron(6).unwrap())
            .collect();
        assert!(rules.iter().all(|r| Arc::ptr_eq(r, &rules[0])));
        assert_eq!(registry.cache(RuleKind::Tetrahedron).unwrap().len(), 1);
    }

    #[test]
    fn test_warm_up() {
        let registry = RuleRegistry::new();
        registry
            .warm_up(&RuleKind::CACHED, &[1, 2, 3, 4])
            .unwrap();
        for kind in RuleKind::CACHED {
            assert_eq!(registry.cache(kind).unwrap().len(), 4);
        }
        assert!(registry.warm_up(&[RuleKind::Line], &[0]).is_err());
    }

    #[test]
    fn test_global_registry_is_singleton() {
        assert!(std::ptr::eq(global(), global()));
        let a = global().triangle(2).unwrap();
        let b = global().triangle(2).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
