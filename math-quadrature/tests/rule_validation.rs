//! Validation of cached rules against exact monomial integrals
//!
//! Every rule of order q must integrate monomials of total degree 2q - 1
//! exactly on its reference element, and the side-rule machinery must hand
//! out the lower-dimensional rules of the same order.

use approx::assert_abs_diff_eq;
use math_audio_quadrature::quadrature::gauss_legendre;
use math_audio_quadrature::{
    ReferenceTopology, Rule, RuleKind, RuleRegistry, SideRuleFactory, TopologyDescriptor,
    dispatch, factory,
};
use std::sync::Arc;

const MAX_ORDER: usize = 8;

fn factorial(n: usize) -> f64 {
    (1..=n).map(|k| k as f64).product()
}

/// Exact integral of x^a over [-1, 1]
fn interval_moment(a: usize) -> f64 {
    if a % 2 == 1 { 0.0 } else { 2.0 / (a as f64 + 1.0) }
}

/// Exact integral of x^e[0] y^e[1] (z^e[2]) over the reference element
fn exact_moment(kind: RuleKind, e: &[usize]) -> f64 {
    match kind {
        RuleKind::Line | RuleKind::Quadrilateral | RuleKind::Hexahedron => {
            e.iter().map(|&a| interval_moment(a)).product()
        }
        RuleKind::Triangle | RuleKind::Tetrahedron => {
            let total: usize = e.iter().sum();
            let numerator: f64 = e.iter().map(|&a| factorial(a)).product();
            numerator / factorial(total + e.len())
        }
        RuleKind::Arbitrary => unreachable!(),
    }
}

/// All exponent tuples of the given dimension with total degree <= max_degree
fn exponents(dim: usize, max_degree: usize) -> Vec<Vec<usize>> {
    let mut result = vec![vec![]];
    for _ in 0..dim {
        let mut next = Vec::new();
        for e in &result {
            let used: usize = e.iter().sum();
            for a in 0..=(max_degree - used) {
                let mut extended = e.clone();
                extended.push(a);
                next.push(extended);
            }
        }
        result = next;
    }
    result
}

fn check_exactness(rule: &Rule) {
    let kind = rule.kind();
    let dim = rule.parametric_dim();
    let max_degree = 2 * rule.order() - 1;

    for e in exponents(dim, max_degree) {
        let approx = rule
            .integrate(|x| x.iter().zip(&e).map(|(xi, &a)| xi.powi(a as i32)).product())
            .unwrap();
        let exact = exact_moment(kind, &e);
        assert_abs_diff_eq!(approx, exact, epsilon = 1e-12);
    }
}

#[test]
fn test_point_counts_and_weight_sums() {
    let registry = RuleRegistry::new();
    for kind in RuleKind::CACHED {
        for order in 1..=MAX_ORDER {
            let rule = registry.instance(kind, order).unwrap();
            assert_eq!(rule.order(), order);
            assert_eq!(Some(rule.npoints()), kind.num_points(order));
            assert_eq!(Some(rule.parametric_dim()), kind.parametric_dim());
            assert_eq!(rule.locations().len(), rule.npoints() * rule.parametric_dim());

            let weights = rule.weights().unwrap();
            assert_eq!(weights.len(), rule.npoints());
            let sum: f64 = weights.iter().sum();
            assert_abs_diff_eq!(sum, kind.reference_measure().unwrap(), epsilon = 1e-13);
        }
    }
}

#[test]
fn test_rules_integrate_monomials_exactly() {
    let registry = RuleRegistry::new();
    for kind in RuleKind::CACHED {
        for order in 1..=MAX_ORDER {
            check_exactness(&registry.instance(kind, order).unwrap());
        }
    }
}

#[test]
fn test_high_order_line_rule() {
    let registry = RuleRegistry::new();
    check_exactness(&registry.line(40).unwrap());
}

#[test]
fn test_repeated_lookup_returns_same_instance() {
    let registry = RuleRegistry::new();
    for kind in RuleKind::CACHED {
        for order in [1, 4, 7] {
            let a = registry.instance(kind, order).unwrap();
            let b = registry.instance(kind, order).unwrap();
            assert!(Arc::ptr_eq(&a, &b));
        }
    }
}

#[test]
fn test_tensor_rules_match_line_products() {
    let registry = RuleRegistry::new();
    for order in 1..=5 {
        let (x, w) = gauss_legendre(order).unwrap();
        let line = registry.line(order).unwrap();
        assert_eq!(line.locations(), x.as_slice());

        let quad = registry.quadrilateral(order).unwrap();
        let qw = quad.weights().unwrap();
        for i in 0..order {
            for j in 0..order {
                let p = i * order + j;
                assert_eq!(quad.point(p), &[x[i], x[j]]);
                assert_eq!(qw[p], w[i] * w[j]);
            }
        }

        let hex = registry.hexahedron(order).unwrap();
        let hw = hex.weights().unwrap();
        for i in 0..order {
            for j in 0..order {
                for k in 0..order {
                    let p = (i * order + j) * order + k;
                    assert_eq!(hex.point(p), &[x[i], x[j], x[k]]);
                    assert_eq!(hw[p], w[i] * w[j] * w[k]);
                }
            }
        }
    }
}

#[test]
fn test_side_rules_drop_one_dimension() {
    for order in 1..=4 {
        let quad = dispatch::topo_to_rule("QUAD4", order).unwrap();
        let side = quad.side_rule().unwrap();
        assert_eq!(side.kind(), RuleKind::Line);
        assert_eq!(side.order(), order);

        let tri = dispatch::topo_to_rule("TRI3", order).unwrap();
        assert_eq!(tri.side_rule().unwrap().kind(), RuleKind::Line);

        let hex = dispatch::topo_to_rule("HEX8", order).unwrap();
        let side = hex.side_rule().unwrap();
        assert_eq!(side.kind(), RuleKind::Quadrilateral);
        assert_eq!(side.order(), order);

        let tet = dispatch::topo_to_rule("TETRA4", order).unwrap();
        let side = tet.side_rule().unwrap();
        assert_eq!(side.kind(), RuleKind::Triangle);
        assert_eq!(side.order(), order);
    }
}

#[test]
fn test_line_and_arbitrary_have_no_side_rule() {
    let line = dispatch::topo_to_rule("BAR2", 3).unwrap();
    assert!(line.side_rule().unwrap_err().is_unsupported());

    let arbitrary = Rule::arbitrary(2, 1, &[0.0, 0.0], None).unwrap();
    assert!(arbitrary.side_rule().unwrap_err().is_unsupported());
}

#[test]
fn test_change_order_uses_cache() {
    let tri = dispatch::topo_to_rule("TRI3", 2).unwrap();
    let tri5 = tri.change_order(5).unwrap();
    assert_eq!(tri5.kind(), RuleKind::Triangle);
    assert!(Arc::ptr_eq(&tri5, &dispatch::topo_to_rule("TRI6", 5).unwrap()));
}

#[test]
fn test_factory_side_counts() {
    let registry = RuleRegistry::new();
    let factory = SideRuleFactory::new(&registry);

    for topo in [
        ReferenceTopology::Quad4,
        ReferenceTopology::Tri3,
        ReferenceTopology::Hex8,
        ReferenceTopology::Tetra4,
    ] {
        let base = registry.instance(topo.rule_kind(), 3).unwrap();
        let set = factory.instance(topo.name(), &base).unwrap();
        let k = topo.num_sides();
        assert_eq!(set.num_sides(), k);
        for side in 0..k {
            let rule = set.get_side_rule(side).unwrap();
            assert_eq!(rule.order(), 3);
            assert_eq!(Some(rule.kind()), topo.rule_kind().side_kind());
        }
        assert!(set.get_side_rule(k).unwrap_err().is_out_of_range());
    }
}

#[test]
fn test_parent_rules_integrate_side_measure() {
    // Mapping side points into the parent keeps side weights, so integrating a
    // parent-space linear function equals its side integral in side measure.
    let base = dispatch::topo_to_rule("TETRA4", 3).unwrap();
    let set = factory::global().instance("TETRA4", &base).unwrap();

    // Side 1 is the slanted face x + y + z = 1
    let parent = set.parent_rule(1).unwrap();
    for p in parent.points() {
        assert_abs_diff_eq!(p.xi() + p.eta() + p.zeta(), 1.0, epsilon = 1e-14);
    }
    let area = parent.integrate(|_| 1.0).unwrap();
    assert_abs_diff_eq!(area, 0.5, epsilon = 1e-14);

    // Hex face 4 lies on z = -1
    let hex = dispatch::topo_to_rule("HEX8", 2).unwrap();
    let faces = factory::global().instance("HEX8", &hex).unwrap();
    let bottom = faces.parent_rule(4).unwrap();
    assert_eq!(bottom.npoints(), 4);
    for p in bottom.points() {
        assert_abs_diff_eq!(p.zeta(), -1.0, epsilon = 1e-15);
    }
}

#[test]
fn test_unknown_topology_is_rejected() {
    let err = dispatch::topo_to_rule("PYRAMID5", 2).unwrap_err();
    assert!(err.is_unknown_topology());
    assert!(err.to_string().contains("PYRAMID5"));
}
