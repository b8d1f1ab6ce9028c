//! Local mesh surgery and analysis.
//!
//! Every operation here consults the derived [`Topology`](crate::mesh::Topology)
//! graph, mutates the face-vertex arrays, and destroys the caches it
//! invalidated; callers never manage cache lifetime themselves.
//!
//! Surgery operations ([`swap_edge`], [`collapse_edge`]) check all of
//! their preconditions against a read-only plan before the first write:
//! a `false` return means the mesh was not touched.

mod collapse;
mod components;
mod swap;

pub use collapse::collapse_edge;
pub use components::{label_components, split_components, ComponentOptions};
pub use swap::{is_swappable, swap_edge};
