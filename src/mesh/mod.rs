//! Core mesh data structures.
//!
//! This module provides the face-vertex mesh store and the adjacency
//! graph derived from it.
//!
//! # Overview
//!
//! The primary type is [`Mesh`]: flat arrays of vertex positions,
//! optional parallel attribute channels, triangle/quad faces
//! ([`MeshFace`], four indices with the last repeated for triangles),
//! and optional [`Ngon`] groupings.
//!
//! [`Topology`] is the derived adjacency structure: coincident mesh
//! vertices grouped into topological vertices, topological edges with
//! their incident face lists, and faces re-expressed as edge lists. It is
//! built lazily by [`Mesh::topology`] and destroyed by every structural
//! mutation; the surgery operations in [`crate::algo`] consult it and
//! invalidate it for you.
//!
//! # Construction
//!
//! ```
//! use trabec::mesh::{Mesh, MeshFace};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//! ];
//! let mut mesh = Mesh::from_faces(vertices, vec![MeshFace::triangle(0, 1, 2)]).unwrap();
//!
//! let topo = mesh.topology();
//! assert_eq!(topo.vertex_count(), 3);
//! assert_eq!(topo.edge_count(), 3);
//! ```

mod face;
mod ngon;
mod store;
mod topology;

pub use face::MeshFace;
pub use ngon::Ngon;
pub use store::{Color, Mesh};
pub use topology::{EdgeFace, Topology, TopologyEdge, TopologyFace, TopologyVertex, NO_EDGE};

pub(crate) use store::FacePartition;
