//! Quadrature rules for reference topologies
//!
//! A [`Rule`] owns the parametric locations and weights for one
//! (variant, order) pair. Every variant except [`RuleKind::Arbitrary`] is
//! built by its cache in [`crate::cache`] and handed out as `Arc<Rule>`, so
//! two lookups of the same key share one instance.
//!
//! Reference elements:
//! - line `[-1, 1]`, quadrilateral `[-1, 1]^2`, hexahedron `[-1, 1]^3`
//! - triangle with vertices (0,0), (1,0), (0,1)
//! - tetrahedron with vertices (0,0,0), (1,0,0), (0,1,0), (0,0,1)

use super::gauss::{NewtonSettings, gauss_jacobi_with, gauss_legendre_with};
use crate::cache;
use crate::error::{QuadratureError, Result};
use ndarray::Array2;
use std::sync::Arc;

/// Rule variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    /// Caller-supplied point set
    Arbitrary,
    /// Gauss-Legendre on [-1, 1]
    Line,
    /// Gauss-Legendre tensor on [-1, 1]^2
    Quadrilateral,
    /// Collapsed Gauss-Jacobi product on the reference triangle
    Triangle,
    /// Gauss-Legendre tensor on [-1, 1]^3
    Hexahedron,
    /// Collapsed Gauss-Jacobi product on the reference tetrahedron
    Tetrahedron,
}

impl RuleKind {
    /// Every cached variant, lowest dimension first
    pub const CACHED: [RuleKind; 5] = [
        RuleKind::Line,
        RuleKind::Quadrilateral,
        RuleKind::Triangle,
        RuleKind::Hexahedron,
        RuleKind::Tetrahedron,
    ];

    /// Short variant name
    pub fn name(&self) -> &'static str {
        match self {
            RuleKind::Arbitrary => "arbitrary",
            RuleKind::Line => "bar",
            RuleKind::Quadrilateral => "quad",
            RuleKind::Triangle => "tri",
            RuleKind::Hexahedron => "hex",
            RuleKind::Tetrahedron => "tetra",
        }
    }

    /// Parametric dimension, `None` for arbitrary point sets
    pub fn parametric_dim(&self) -> Option<usize> {
        match self {
            RuleKind::Arbitrary => None,
            RuleKind::Line => Some(1),
            RuleKind::Quadrilateral | RuleKind::Triangle => Some(2),
            RuleKind::Hexahedron | RuleKind::Tetrahedron => Some(3),
        }
    }

    /// Variant of the rule on this variant's sides
    pub fn side_kind(&self) -> Option<RuleKind> {
        match self {
            RuleKind::Arbitrary | RuleKind::Line => None,
            RuleKind::Quadrilateral | RuleKind::Triangle => Some(RuleKind::Line),
            RuleKind::Hexahedron => Some(RuleKind::Quadrilateral),
            RuleKind::Tetrahedron => Some(RuleKind::Triangle),
        }
    }

    /// Number of points a rule of this variant has at `order`
    pub fn num_points(&self, order: usize) -> Option<usize> {
        match self {
            RuleKind::Arbitrary => None,
            RuleKind::Line => Some(order),
            RuleKind::Quadrilateral | RuleKind::Triangle => Some(order * order),
            RuleKind::Hexahedron | RuleKind::Tetrahedron => Some(order * order * order),
        }
    }

    /// Length, area or volume of the reference element
    pub fn reference_measure(&self) -> Option<f64> {
        match self {
            RuleKind::Arbitrary => None,
            RuleKind::Line => Some(2.0),
            RuleKind::Quadrilateral => Some(4.0),
            RuleKind::Triangle => Some(0.5),
            RuleKind::Hexahedron => Some(8.0),
            RuleKind::Tetrahedron => Some(1.0 / 6.0),
        }
    }
}

/// A single quadrature point borrowed from a rule
#[derive(Debug, Clone, Copy)]
pub struct QuadraturePoint<'a> {
    /// Parametric coordinates, `parametric_dim` long
    pub coords: &'a [f64],
    /// Integration weight, absent for weightless point sets
    pub weight: Option<f64>,
}

impl QuadraturePoint<'_> {
    /// Coordinate `d`, zero beyond the rule's parametric dimension
    #[inline]
    fn coord(&self, d: usize) -> f64 {
        self.coords.get(d).copied().unwrap_or(0.0)
    }

    #[inline]
    pub fn xi(&self) -> f64 {
        self.coord(0)
    }

    #[inline]
    pub fn eta(&self) -> f64 {
        self.coord(1)
    }

    #[inline]
    pub fn zeta(&self) -> f64 {
        self.coord(2)
    }
}

/// Parametric integration points and weights for one (variant, order) pair
#[derive(Debug, PartialEq)]
pub struct Rule {
    kind: RuleKind,
    order: usize,
    npoints: usize,
    pdim: usize,
    locations: Vec<f64>,
    weights: Option<Vec<f64>>,
}

impl Rule {
    /// Wrap caller-supplied parametric coordinates and optional weights
    ///
    /// `pcoords` holds `npoints * pdim` values, point-major. The order of an
    /// arbitrary rule is its point count.
    pub fn arbitrary(
        pdim: usize,
        npoints: usize,
        pcoords: &[f64],
        weights: Option<&[f64]>,
    ) -> Result<Self> {
        if pdim == 0 {
            return Err(QuadratureError::ShapeMismatch {
                what: "parametric dimension",
                expected: 1,
                got: 0,
            });
        }
        if pcoords.len() != npoints * pdim {
            return Err(QuadratureError::ShapeMismatch {
                what: "locations",
                expected: npoints * pdim,
                got: pcoords.len(),
            });
        }
        match weights {
            Some(w) if w.len() != npoints => {
                return Err(QuadratureError::ShapeMismatch {
                    what: "weights",
                    expected: npoints,
                    got: w.len(),
                });
            }
            _ => {}
        }

        Ok(Self {
            kind: RuleKind::Arbitrary,
            order: npoints,
            npoints,
            pdim,
            locations: pcoords.to_vec(),
            weights: weights.map(<[f64]>::to_vec),
        })
    }

    /// Number of quadrature points
    pub fn npoints(&self) -> usize {
        self.npoints
    }

    /// Order the rule was built for
    pub fn order(&self) -> usize {
        self.order
    }

    pub fn parametric_dim(&self) -> usize {
        self.pdim
    }

    pub fn kind(&self) -> RuleKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// Parametric locations, point-major (`npoints * parametric_dim` values)
    pub fn locations(&self) -> &[f64] {
        &self.locations
    }

    /// Weights, one per point
    pub fn weights(&self) -> Option<&[f64]> {
        self.weights.as_deref()
    }

    /// Coordinates of point `i`
    pub fn point(&self, i: usize) -> &[f64] {
        &self.locations[i * self.pdim..(i + 1) * self.pdim]
    }

    /// Iterator over quadrature points
    pub fn points(&self) -> impl Iterator<Item = QuadraturePoint<'_>> {
        self.locations
            .chunks_exact(self.pdim)
            .enumerate()
            .map(|(i, coords)| QuadraturePoint {
                coords,
                weight: self.weights.as_ref().map(|w| w[i]),
            })
    }

    /// Locations as an `npoints x parametric_dim` matrix
    pub fn location_matrix(&self) -> Array2<f64> {
        Array2::from_shape_fn((self.npoints, self.pdim), |(i, d)| {
            self.locations[i * self.pdim + d]
        })
    }

    /// Weighted sum of `f` over the points
    pub fn integrate<F>(&self, f: F) -> Result<f64>
    where
        F: Fn(&[f64]) -> f64,
    {
        let weights = self
            .weights
            .as_ref()
            .ok_or(QuadratureError::UnsupportedOperation {
                operation: "integrate",
                rule: self.name(),
            })?;

        Ok(self
            .locations
            .chunks_exact(self.pdim)
            .zip(weights)
            .map(|(x, w)| f(x) * w)
            .sum())
    }

    /// Rule on this rule's sides, at the same order, from the global registry
    ///
    /// Only valid for rules the global registry built (e.g. through
    /// [`crate::dispatch::topo_to_rule`]); rules from a private
    /// [`RuleRegistry`](crate::RuleRegistry) fail with `ForeignRule` and should
    /// use [`RuleRegistry::side_rule`](crate::RuleRegistry::side_rule) instead.
    pub fn side_rule(&self) -> Result<Arc<Rule>> {
        let registry = self.global_owner()?;
        registry.side_rule(self)
    }

    /// Rule of the same variant at `order`, from the global registry
    ///
    /// Same ownership requirement as [`Rule::side_rule`].
    pub fn change_order(&self, order: usize) -> Result<Arc<Rule>> {
        let registry = self.global_owner()?;
        registry.change_order(self, order)
    }

    fn global_owner(&self) -> Result<&'static cache::RuleRegistry> {
        let registry = cache::global();
        if self.kind != RuleKind::Arbitrary && !registry.owns(self) {
            return Err(QuadratureError::ForeignRule {
                rule: self.name(),
                order: self.order,
            });
        }
        Ok(registry)
    }

    pub(crate) fn line(order: usize, settings: NewtonSettings) -> Result<Self> {
        let (x, w) = gauss_legendre_with(order, settings)?;
        Ok(Self {
            kind: RuleKind::Line,
            order,
            npoints: order,
            pdim: 1,
            locations: x,
            weights: Some(w),
        })
    }

    /// Tensor product of a line rule with itself, first coordinate slowest
    pub(crate) fn quadrilateral(line: &Rule) -> Self {
        let n = line.npoints;
        let x = &line.locations;
        let w = line.weights.as_deref().unwrap_or_default();

        let mut locations = Vec::with_capacity(2 * n * n);
        let mut weights = Vec::with_capacity(n * n);
        for i in 0..n {
            for j in 0..n {
                locations.extend_from_slice(&[x[i], x[j]]);
                weights.push(w[i] * w[j]);
            }
        }

        Self {
            kind: RuleKind::Quadrilateral,
            order: line.order,
            npoints: n * n,
            pdim: 2,
            locations,
            weights: Some(weights),
        }
    }

    pub(crate) fn hexahedron(line: &Rule) -> Self {
        let n = line.npoints;
        let x = &line.locations;
        let w = line.weights.as_deref().unwrap_or_default();

        let mut locations = Vec::with_capacity(3 * n * n * n);
        let mut weights = Vec::with_capacity(n * n * n);
        for i in 0..n {
            for j in 0..n {
                for k in 0..n {
                    locations.extend_from_slice(&[x[i], x[j], x[k]]);
                    weights.push(w[i] * w[j] * w[k]);
                }
            }
        }

        Self {
            kind: RuleKind::Hexahedron,
            order: line.order,
            npoints: n * n * n,
            pdim: 3,
            locations,
            weights: Some(weights),
        }
    }

    /// Collapsed product: `(s (1 - t), t)` with Jacobian `1 - t`
    pub(crate) fn triangle(order: usize, settings: NewtonSettings) -> Result<Self> {
        let (s, ws) = unit_interval(order, 0, settings)?;
        let (t, wt) = unit_interval(order, 1, settings)?;

        let n = order;
        let mut locations = Vec::with_capacity(2 * n * n);
        let mut weights = Vec::with_capacity(n * n);
        for (tj, wj) in t.iter().zip(&wt) {
            for (si, wi) in s.iter().zip(&ws) {
                locations.extend_from_slice(&[si * (1.0 - tj), *tj]);
                weights.push(wi * wj);
            }
        }

        Ok(Self {
            kind: RuleKind::Triangle,
            order,
            npoints: n * n,
            pdim: 2,
            locations,
            weights: Some(weights),
        })
    }

    /// Collapsed product: `(s (1 - t) (1 - r), t (1 - r), r)` with Jacobian
    /// `(1 - t) (1 - r)^2`
    pub(crate) fn tetrahedron(order: usize, settings: NewtonSettings) -> Result<Self> {
        let (s, ws) = unit_interval(order, 0, settings)?;
        let (t, wt) = unit_interval(order, 1, settings)?;
        let (r, wr) = unit_interval(order, 2, settings)?;

        let n = order;
        let mut locations = Vec::with_capacity(3 * n * n * n);
        let mut weights = Vec::with_capacity(n * n * n);
        for (rk, wk) in r.iter().zip(&wr) {
            for (tj, wj) in t.iter().zip(&wt) {
                for (si, wi) in s.iter().zip(&ws) {
                    locations.extend_from_slice(&[
                        si * (1.0 - tj) * (1.0 - rk),
                        tj * (1.0 - rk),
                        *rk,
                    ]);
                    weights.push(wi * wj * wk);
                }
            }
        }

        Ok(Self {
            kind: RuleKind::Tetrahedron,
            order,
            npoints: n * n * n,
            pdim: 3,
            locations,
            weights: Some(weights),
        })
    }
}

/// Gauss-Jacobi rule for `(1 - t)^alpha` moved from [-1, 1] to [0, 1]
fn unit_interval(
    n: usize,
    alpha: u32,
    settings: NewtonSettings,
) -> Result<(Vec<f64>, Vec<f64>)> {
    let (x, w) = gauss_jacobi_with(n, alpha, settings)?;
    let scale = 0.5f64.powi(alpha as i32 + 1);
    Ok((
        x.into_iter().map(|xi| 0.5 * (1.0 + xi)).collect(),
        w.into_iter().map(|wi| wi * scale).collect(),
    ))
}

/// Minimum order for stiffness integration at polynomial degree p
///
/// Derivatives drop one degree, so the integrand has degree 2(p-1) and an
/// order-p rule (exact to 2p-1) suffices.
pub fn required_order_for_stiffness(polynomial_degree: usize) -> usize {
    polynomial_degree.max(1)
}

/// Minimum order for mass integration at polynomial degree p (integrand 2p)
pub fn required_order_for_mass(polynomial_degree: usize) -> usize {
    polynomial_degree + 1
}

/// Cached rule for stiffness matrix integration
pub fn for_stiffness(kind: RuleKind, polynomial_degree: usize) -> Result<Arc<Rule>> {
    cache::global().instance(kind, required_order_for_stiffness(polynomial_degree))
}

/// Cached rule for mass matrix integration
pub fn for_mass(kind: RuleKind, polynomial_degree: usize) -> Result<Arc<Rule>> {
    cache::global().instance(kind, required_order_for_mass(polynomial_degree))
}
