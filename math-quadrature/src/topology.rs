//! Reference topologies consumed by the rule dispatcher and side-rule factory
//!
//! Side numbering follows the Exodus convention. Vertex coordinates are given
//! in the parametric space the matching rule is defined on.

use crate::error::{QuadratureError, Result};
use crate::quadrature::RuleKind;

/// Read-only view of an element topology
///
/// The quadrature engine only queries a topology; it never mutates one.
pub trait TopologyDescriptor {
    /// Canonical topology name (e.g. `HEX8`)
    fn name(&self) -> &str;

    fn parametric_dim(&self) -> usize;

    fn num_sides(&self) -> usize;

    /// Topology name of side `side`
    fn side_shape(&self, side: usize) -> Option<&str>;

    /// Element vertex indices of side `side`, in side order
    fn side_vertices(&self, side: usize) -> Option<&[usize]>;

    /// Parametric coordinates of vertex `vertex`
    fn vertex_coords(&self, vertex: usize) -> Option<&[f64]>;
}

/// Built-in reference topologies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceTopology {
    /// 2-node line on [-1, 1]
    Bar2,
    /// 4-node quadrilateral on [-1, 1]^2
    Quad4,
    /// 3-node triangle (0,0), (1,0), (0,1)
    Tri3,
    /// 8-node hexahedron on [-1, 1]^3
    Hex8,
    /// 4-node tetrahedron (0,0,0), (1,0,0), (0,1,0), (0,0,1)
    Tetra4,
}

const BAR2_COORDS: [f64; 2] = [-1.0, 1.0];
const BAR2_SIDES: [&[usize]; 2] = [&[0], &[1]];

#[rustfmt::skip]
const QUAD4_COORDS: [f64; 8] = [
    -1.0, -1.0,
     1.0, -1.0,
     1.0,  1.0,
    -1.0,  1.0,
];
const QUAD4_SIDES: [&[usize]; 4] = [&[0, 1], &[1, 2], &[2, 3], &[3, 0]];

#[rustfmt::skip]
const TRI3_COORDS: [f64; 6] = [
    0.0, 0.0,
    1.0, 0.0,
    0.0, 1.0,
];
const TRI3_SIDES: [&[usize]; 3] = [&[0, 1], &[1, 2], &[2, 0]];

#[rustfmt::skip]
const HEX8_COORDS: [f64; 24] = [
    -1.0, -1.0, -1.0,
     1.0, -1.0, -1.0,
     1.0,  1.0, -1.0,
    -1.0,  1.0, -1.0,
    -1.0, -1.0,  1.0,
     1.0, -1.0,  1.0,
     1.0,  1.0,  1.0,
    -1.0,  1.0,  1.0,
];
const HEX8_SIDES: [&[usize]; 6] = [
    &[0, 1, 5, 4],
    &[1, 2, 6, 5],
    &[2, 3, 7, 6],
    &[0, 4, 7, 3],
    &[0, 3, 2, 1],
    &[4, 5, 6, 7],
];

#[rustfmt::skip]
const TETRA4_COORDS: [f64; 12] = [
    0.0, 0.0, 0.0,
    1.0, 0.0, 0.0,
    0.0, 1.0, 0.0,
    0.0, 0.0, 1.0,
];
const TETRA4_SIDES: [&[usize]; 4] = [&[0, 1, 3], &[1, 2, 3], &[0, 3, 2], &[0, 2, 1]];

impl ReferenceTopology {
    pub const ALL: [ReferenceTopology; 5] = [
        ReferenceTopology::Bar2,
        ReferenceTopology::Quad4,
        ReferenceTopology::Tri3,
        ReferenceTopology::Hex8,
        ReferenceTopology::Tetra4,
    ];

    /// Resolve a topology name, including higher-order and shell aliases
    ///
    /// Aliases share corner layout and sides with their linear topology, so
    /// `HEX27` resolves to `Hex8` and `SHELL4` to `Quad4`.
    pub fn from_name(name: &str) -> Result<Self> {
        let topology = match name {
            "BAR" | "BAR2" | "BAR3" => ReferenceTopology::Bar2,
            "QUAD" | "QUAD4" | "QUAD9" | "SHELL" | "SHELL4" | "SHELL9" => ReferenceTopology::Quad4,
            "TRI" | "TRI3" | "TRI6" | "TRISHELL" | "TRISHELL3" | "TRISHELL6" => {
                ReferenceTopology::Tri3
            }
            "HEX" | "HEX8" | "HEX27" => ReferenceTopology::Hex8,
            "TETRA" | "TETRA4" | "TETRA10" => ReferenceTopology::Tetra4,
            _ => {
                return Err(QuadratureError::UnknownTopology {
                    name: name.to_string(),
                });
            }
        };
        Ok(topology)
    }

    /// Rule variant integrating over this topology
    pub fn rule_kind(&self) -> RuleKind {
        match self {
            ReferenceTopology::Bar2 => RuleKind::Line,
            ReferenceTopology::Quad4 => RuleKind::Quadrilateral,
            ReferenceTopology::Tri3 => RuleKind::Triangle,
            ReferenceTopology::Hex8 => RuleKind::Hexahedron,
            ReferenceTopology::Tetra4 => RuleKind::Tetrahedron,
        }
    }

    pub fn num_vertices(&self) -> usize {
        self.coords().len() / self.dim()
    }

    fn dim(&self) -> usize {
        match self {
            ReferenceTopology::Bar2 => 1,
            ReferenceTopology::Quad4 | ReferenceTopology::Tri3 => 2,
            ReferenceTopology::Hex8 | ReferenceTopology::Tetra4 => 3,
        }
    }

    fn coords(&self) -> &'static [f64] {
        match self {
            ReferenceTopology::Bar2 => &BAR2_COORDS,
            ReferenceTopology::Quad4 => &QUAD4_COORDS,
            ReferenceTopology::Tri3 => &TRI3_COORDS,
            ReferenceTopology::Hex8 => &HEX8_COORDS,
            ReferenceTopology::Tetra4 => &TETRA4_COORDS,
        }
    }

    fn sides(&self) -> &'static [&'static [usize]] {
        match self {
            ReferenceTopology::Bar2 => &BAR2_SIDES,
            ReferenceTopology::Quad4 => &QUAD4_SIDES,
            ReferenceTopology::Tri3 => &TRI3_SIDES,
            ReferenceTopology::Hex8 => &HEX8_SIDES,
            ReferenceTopology::Tetra4 => &TETRA4_SIDES,
        }
    }
}

impl TopologyDescriptor for ReferenceTopology {
    fn name(&self) -> &str {
        match self {
            ReferenceTopology::Bar2 => "BAR2",
            ReferenceTopology::Quad4 => "QUAD4",
            ReferenceTopology::Tri3 => "TRI3",
            ReferenceTopology::Hex8 => "HEX8",
            ReferenceTopology::Tetra4 => "TETRA4",
        }
    }

    fn parametric_dim(&self) -> usize {
        self.dim()
    }

    fn num_sides(&self) -> usize {
        self.sides().len()
    }

    fn side_shape(&self, side: usize) -> Option<&str> {
        if side >= self.num_sides() {
            return None;
        }
        Some(match self {
            ReferenceTopology::Bar2 => "NODE",
            ReferenceTopology::Quad4 | ReferenceTopology::Tri3 => "BAR2",
            ReferenceTopology::Hex8 => "QUAD4",
            ReferenceTopology::Tetra4 => "TRI3",
        })
    }

    fn side_vertices(&self, side: usize) -> Option<&[usize]> {
        self.sides().get(side).copied()
    }

    fn vertex_coords(&self, vertex: usize) -> Option<&[f64]> {
        let dim = self.dim();
        self.coords().get(vertex * dim..(vertex + 1) * dim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases() {
        assert_eq!(ReferenceTopology::from_name("HEX27").unwrap(), ReferenceTopology::Hex8);
        assert_eq!(ReferenceTopology::from_name("SHELL4").unwrap(), ReferenceTopology::Quad4);
        assert_eq!(ReferenceTopology::from_name("TRISHELL3").unwrap(), ReferenceTopology::Tri3);
        assert_eq!(ReferenceTopology::from_name("BAR3").unwrap(), ReferenceTopology::Bar2);
        assert_eq!(ReferenceTopology::from_name("TETRA10").unwrap(), ReferenceTopology::Tetra4);
    }

    #[test]
    fn test_unknown_name() {
        let err = ReferenceTopology::from_name("PYRAMID5").unwrap_err();
        assert!(err.is_unknown_topology());
        // Names are case-sensitive
        assert!(ReferenceTopology::from_name("hex8").is_err());
    }

    #[test]
    fn test_canonical_names_round_trip() {
        for topo in ReferenceTopology::ALL {
            assert_eq!(ReferenceTopology::from_name(topo.name()).unwrap(), topo);
        }
    }

    #[test]
    fn test_side_counts() {
        assert_eq!(ReferenceTopology::Bar2.num_sides(), 2);
        assert_eq!(ReferenceTopology::Quad4.num_sides(), 4);
        assert_eq!(ReferenceTopology::Tri3.num_sides(), 3);
        assert_eq!(ReferenceTopology::Hex8.num_sides(), 6);
        assert_eq!(ReferenceTopology::Tetra4.num_sides(), 4);
    }

    #[test]
    fn test_side_tables_are_consistent() {
        for topo in ReferenceTopology::ALL {
            for side in 0..topo.num_sides() {
                let verts = topo.side_vertices(side).unwrap();
                let expected = match topo.side_shape(side).unwrap() {
                    "NODE" => 1,
                    "BAR2" => 2,
                    "TRI3" => 3,
                    "QUAD4" => 4,
                    other => panic!("unexpected side shape {}", other),
                };
                assert_eq!(verts.len(), expected);
                assert!(verts.iter().all(|&v| v < topo.num_vertices()));
            }
            assert!(topo.side_shape(topo.num_sides()).is_none());
            assert!(topo.side_vertices(topo.num_sides()).is_none());
        }
    }

    #[test]
    fn test_vertex_coords() {
        assert_eq!(ReferenceTopology::Hex8.vertex_coords(6).unwrap(), &[1.0, 1.0, 1.0]);
        assert_eq!(ReferenceTopology::Tri3.vertex_coords(2).unwrap(), &[0.0, 1.0]);
        assert!(ReferenceTopology::Tetra4.vertex_coords(4).is_none());
    }

    #[test]
    fn test_hex_faces_are_planar() {
        // Every hex face fixes exactly one coordinate
        let hex = ReferenceTopology::Hex8;
        for side in 0..hex.num_sides() {
            let verts = hex.side_vertices(side).unwrap();
            let fixed = (0..3)
                .filter(|&d| {
                    let first = hex.vertex_coords(verts[0]).unwrap()[d];
                    verts.iter().all(|&v| hex.vertex_coords(v).unwrap()[d] == first)
                })
                .count();
            assert_eq!(fixed, 1, "side {}", side);
        }
    }
}
