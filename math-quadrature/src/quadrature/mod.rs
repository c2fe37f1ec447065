//! Numerical quadrature rules for finite element integration
//!
//! Provides Gauss-Legendre points for lines, tensor rules for
//! quadrilaterals and hexahedra, and collapsed Gauss-Jacobi rules for
//! triangles and tetrahedra.

mod gauss;
mod rules;

pub use gauss::{gauss_jacobi, gauss_legendre, gauss_legendre_locations};
pub(crate) use gauss::NewtonSettings;
pub use rules::*;
