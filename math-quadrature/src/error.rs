//! Error types for quadrature rule construction and lookup.
//!
//! Every error here is a programming or configuration error: an unsupported
//! operation on a rule variant, an unknown topology name, a side index past
//! the end of a topology, or a precondition violation on orders and point
//! counts. None of them is transient, so none should be retried.

use thiserror::Error;

/// Errors that can occur while building or querying quadrature rules.
#[derive(Debug, Error)]
pub enum QuadratureError {
    /// The rule variant does not define the requested operation.
    #[error("{operation} is not supported for {rule} rules")]
    UnsupportedOperation {
        /// Name of the operation (e.g. `side_rule`)
        operation: &'static str,
        /// Name of the rule variant
        rule: &'static str,
    },

    /// The topology name has no matching rule variant.
    #[error("unknown topology: {name}")]
    UnknownTopology {
        /// The unrecognized topology name
        name: String,
    },

    /// A side index beyond the topology's side count.
    #[error("side index {side} out of range (topology has {num_sides} sides)")]
    SideOutOfRange {
        /// The requested side index
        side: usize,
        /// Number of sides of the topology
        num_sides: usize,
    },

    /// Gauss point generators need at least one point.
    #[error("invalid point count: {n} (must be >= 1)")]
    InvalidPointCount {
        /// The invalid point count
        n: usize,
    },

    /// Rule order outside `1..=max`.
    #[error("invalid quadrature order: {order} (must be in 1..={max})")]
    InvalidOrder {
        /// The requested order
        order: usize,
        /// Largest order the registry accepts
        max: usize,
    },

    /// Caller-supplied coordinate or weight array has the wrong length.
    #[error("{what} length mismatch: expected {expected}, got {got}")]
    ShapeMismatch {
        /// Which array was mis-sized
        what: &'static str,
        /// Expected length
        expected: usize,
        /// Actual length
        got: usize,
    },

    /// A rule built by a private registry was used with the global one.
    #[error("{rule} rule of order {order} was not built by the global registry")]
    ForeignRule {
        /// Name of the rule variant
        rule: &'static str,
        /// Order of the rule
        order: usize,
    },

    /// Invalid or unreadable configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

/// A specialized `Result` type for quadrature operations.
pub type Result<T> = std::result::Result<T, QuadratureError>;

impl QuadratureError {
    /// Returns `true` if the operation is not defined for the rule variant.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, QuadratureError::UnsupportedOperation { .. })
    }

    /// Returns `true` if this is an unknown topology name.
    pub fn is_unknown_topology(&self) -> bool {
        matches!(self, QuadratureError::UnknownTopology { .. })
    }

    /// Returns `true` if a side index was out of range.
    pub fn is_out_of_range(&self) -> bool {
        matches!(self, QuadratureError::SideOutOfRange { .. })
    }

    /// Returns `true` if a rule was used with a registry that did not build it.
    pub fn is_foreign_rule(&self) -> bool {
        matches!(self, QuadratureError::ForeignRule { .. })
    }

    /// Returns `true` if an argument violated a precondition.
    ///
    /// This includes `InvalidPointCount`, `InvalidOrder` and `ShapeMismatch`.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            QuadratureError::InvalidPointCount { .. }
                | QuadratureError::InvalidOrder { .. }
                | QuadratureError::ShapeMismatch { .. }
        )
    }
}
