//! Cached quadrature rules for finite element reference topologies
//!
//! This crate produces parametric integration points and weights for lines,
//! quadrilaterals, triangles, hexahedra and tetrahedra at any order, plus the
//! lower-dimensional rules needed to integrate over element sides.
//!
//! # Features
//!
//! - **Point generation**: Gauss-Legendre and Gauss-Jacobi nodes for any point count
//! - **Rules**: tensor products on quads/hexes, collapsed products on simplices
//! - **Caching**: one shared rule per (variant, order), built on first use
//! - **Side rules**: per-side rules for a topology, also mapped into the parent element
//!
//! # Example
//!
//! ```
//! use math_audio_quadrature::{dispatch, factory};
//!
//! let hex = dispatch::topo_to_rule("HEX8", 3)?;
//! assert_eq!(hex.npoints(), 27);
//!
//! let faces = factory::global().instance("HEX8", &hex)?;
//! assert_eq!(faces.get_side_rule(0)?.npoints(), 9);
//! # Ok::<(), math_audio_quadrature::QuadratureError>(())
//! ```

pub mod cache;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod factory;
pub mod quadrature;
pub mod topology;

pub use cache::{RuleCache, RuleRegistry};
pub use config::QuadratureConfig;
pub use error::{QuadratureError, Result};
pub use factory::{SideRuleFactory, SideRuleSet};
pub use quadrature::{QuadraturePoint, Rule, RuleKind};
pub use topology::{ReferenceTopology, TopologyDescriptor};

/// Library version
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
