//! # Trabec
//!
//! A polygon-mesh topology maintenance and local-surgery library.
//!
//! Trabec keeps a face-vertex mesh (flat vertex arrays with parallel
//! attribute channels, triangle and quad faces, optional n-gon
//! groupings) together with a lazily derived adjacency graph, and
//! performs local surgery on it: edge swaps, edge collapses, face
//! deletion, and connected-component analysis.
//!
//! ## Features
//!
//! - **Face-vertex store**: triangles and quads in one array, with
//!   normals, texture coordinates, and colors running parallel to the
//!   vertices
//! - **Derived topology**: coincident vertices welded into topological
//!   vertices, edges with full incident-face lists (boundary, manifold,
//!   and non-manifold alike)
//! - **Cache discipline**: every structural mutation destroys the
//!   derived caches; queries rebuild them on demand
//! - **Local surgery**: precondition-checked edge swap and edge
//!   collapse that leave the mesh untouched on rejection
//! - **Components**: connected-component labeling and splitting under
//!   configurable adjacency rules
//!
//! ## Quick Start
//!
//! ```
//! use trabec::prelude::*;
//! use nalgebra::Point3;
//!
//! // A unit square split along its diagonal.
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! let mut mesh = Mesh::from_triangles(&vertices, &[[0, 1, 2], [0, 2, 3]]).unwrap();
//!
//! // Query the derived topology.
//! let topo = mesh.topology();
//! assert_eq!(topo.vertex_count(), 4);
//! assert_eq!(topo.edge_count(), 5);
//!
//! // Flip the interior diagonal.
//! let diagonal = {
//!     let topo = mesh.topology();
//!     topo.edge_ids().find(|&e| topo.edge_face_count(e) == 2).unwrap()
//! };
//! assert!(swap_edge(&mut mesh, diagonal));
//! assert_eq!(mesh.face_count(), 2);
//! ```
//!
//! ## Surgery and Caches
//!
//! Operations that mutate the mesh own their cache invalidation: after
//! a successful [`swap_edge`](algo::swap_edge) or
//! [`collapse_edge`](algo::collapse_edge) the next
//! [`Mesh::topology`](mesh::Mesh::topology) call rebuilds the graph from
//! the current arrays. A rejected operation returns `false` and leaves
//! both the mesh and its caches exactly as they were.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod error;
pub mod mesh;

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and functions:
///
/// ```
/// use trabec::prelude::*;
/// ```
pub mod prelude {
    pub use crate::algo::{
        collapse_edge, is_swappable, label_components, split_components, swap_edge,
        ComponentOptions,
    };
    pub use crate::error::{MeshError, Result};
    pub use crate::mesh::{Color, Mesh, MeshFace, Ngon, Topology};
}

// Re-export nalgebra types for convenience
pub use nalgebra;
