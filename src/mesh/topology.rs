//! Derived mesh topology graph.
//!
//! [`Topology`] is the canonical adjacency structure the surgery
//! operations query: mesh vertices grouped by exact 3D position into
//! *topological vertices*, unordered pairs of those grouped into
//! *topological edges* carrying the faces that use them, and faces
//! re-expressed as lists of topological edge ids with per-slot
//! orientation flags.
//!
//! The graph is derived data. It is built lazily from a [`Mesh`] on the
//! first query and owns all of its vectors (cross-references are plain
//! indices, never pointers back into the mesh). Whenever the mesh's
//! vertex or face arrays are mutated it is destroyed, never
//! incrementally patched. [`Topology::generation`] records the mesh generation it was
//! built from so downstream code can detect staleness.

use std::collections::HashMap;

use super::store::Mesh;

/// Sentinel for a face side that has no topological edge (both corners of
/// the side occupy the same 3D position).
pub const NO_EDGE: usize = usize::MAX;

/// A group of mesh vertices occupying the same 3D location.
///
/// Coincident vertices may still be attribute-distinct, e.g. at a UV seam
/// or a normal crease.
#[derive(Debug, Clone)]
pub struct TopologyVertex {
    /// Indices of the mesh vertices in this group.
    pub mesh_vertices: Vec<usize>,

    /// Indices of the topological edges touching this vertex.
    pub edges: Vec<usize>,
}

/// One face's use of a topological edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeFace {
    /// The face index.
    pub face: usize,

    /// Which side of the face runs along this edge (0-based slot).
    pub slot: usize,
}

/// An unordered pair of topological vertices and the faces sharing it.
///
/// `faces.len() == 1` is a boundary edge, `== 2` a manifold interior
/// edge, `> 2` a non-manifold edge.
#[derive(Debug, Clone)]
pub struct TopologyEdge {
    /// The two topological vertex ids, stored with `vertices[0] < vertices[1]`.
    pub vertices: [usize; 2],

    /// Faces using this edge, with the side slot each uses.
    pub faces: Vec<EdgeFace>,
}

/// A face expressed in terms of its topological edges.
///
/// Triangles mirror the mesh face convention and repeat the last entry
/// (`edges[3] == edges[2]`).
#[derive(Debug, Clone)]
pub struct TopologyFace {
    /// Topological edge id per face side, [`NO_EDGE`] for degenerate sides.
    pub edges: [usize; 4],

    /// Per-side orientation: `true` when the face traverses the edge from
    /// `vertices[1]` to `vertices[0]`. Two faces of consistent winding
    /// sharing a manifold edge carry opposite flags.
    pub reversed: [bool; 4],
}

/// Canonical adjacency graph derived from a [`Mesh`].
#[derive(Debug, Clone)]
pub struct Topology {
    vertices: Vec<TopologyVertex>,
    edges: Vec<TopologyEdge>,
    faces: Vec<TopologyFace>,
    /// Mesh vertex index -> topological vertex id.
    top_vertex: Vec<usize>,
    generation: u64,
}

/// Position key with both zero encodings collapsed to one group.
#[inline]
fn position_key(p: &nalgebra::Point3<f64>) -> [u64; 3] {
    [(p.x + 0.0).to_bits(), (p.y + 0.0).to_bits(), (p.z + 0.0).to_bits()]
}

impl Topology {
    /// Build the adjacency graph from a mesh snapshot.
    ///
    /// Always succeeds for a structurally valid mesh; a mesh with
    /// out-of-range face indices is a precondition violation surfaced by
    /// the surgery operation that trips over it, not here.
    pub(crate) fn build(mesh: &Mesh, generation: u64) -> Self {
        let positions = mesh.vertices();
        let faces = mesh.faces();

        // Group mesh vertices by exact position.
        let mut vertices: Vec<TopologyVertex> = Vec::new();
        let mut top_vertex: Vec<usize> = Vec::with_capacity(positions.len());
        let mut groups: HashMap<[u64; 3], usize> = HashMap::with_capacity(positions.len());
        for (vi, p) in positions.iter().enumerate() {
            let tv = *groups.entry(position_key(p)).or_insert_with(|| {
                vertices.push(TopologyVertex {
                    mesh_vertices: Vec::new(),
                    edges: Vec::new(),
                });
                vertices.len() - 1
            });
            vertices[tv].mesh_vertices.push(vi);
            top_vertex.push(tv);
        }

        // Walk every face side, looking up or creating its edge.
        let mut edges: Vec<TopologyEdge> = Vec::new();
        let mut edge_map: HashMap<(usize, usize), usize> = HashMap::new();
        let mut top_faces: Vec<TopologyFace> = Vec::with_capacity(faces.len());
        for (fi, face) in faces.iter().enumerate() {
            let mut tf = TopologyFace {
                edges: [NO_EDGE; 4],
                reversed: [false; 4],
            };
            let n = face.corner_count();
            for s in 0..n {
                let (a, b) = face.side(s);
                if a >= top_vertex.len() || b >= top_vertex.len() {
                    continue;
                }
                let (ta, tb) = (top_vertex[a], top_vertex[b]);
                if ta == tb {
                    continue;
                }
                let key = (ta.min(tb), ta.max(tb));
                let ei = *edge_map.entry(key).or_insert_with(|| {
                    edges.push(TopologyEdge {
                        vertices: [key.0, key.1],
                        faces: Vec::new(),
                    });
                    edges.len() - 1
                });
                edges[ei].faces.push(EdgeFace { face: fi, slot: s });
                tf.edges[s] = ei;
                tf.reversed[s] = ta != key.0;
            }
            if n == 3 {
                tf.edges[3] = tf.edges[2];
                tf.reversed[3] = tf.reversed[2];
            }
            top_faces.push(tf);
        }

        // Attach edges to their endpoint vertices.
        for (ei, edge) in edges.iter().enumerate() {
            vertices[edge.vertices[0]].edges.push(ei);
            vertices[edge.vertices[1]].edges.push(ei);
        }

        Self {
            vertices,
            edges,
            faces: top_faces,
            top_vertex,
            generation,
        }
    }

    // ==================== Queries ====================

    /// Number of topological vertices.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of topological edges.
    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Number of topological faces (equals the mesh face count).
    #[inline]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Get a topological vertex, if `tv` is in range.
    #[inline]
    pub fn vertex(&self, tv: usize) -> Option<&TopologyVertex> {
        self.vertices.get(tv)
    }

    /// Get a topological edge, if `e` is in range.
    #[inline]
    pub fn edge(&self, e: usize) -> Option<&TopologyEdge> {
        self.edges.get(e)
    }

    /// Get a topological face, if `f` is in range.
    #[inline]
    pub fn face(&self, f: usize) -> Option<&TopologyFace> {
        self.faces.get(f)
    }

    /// Number of faces incident to edge `e` (0 if out of range).
    #[inline]
    pub fn edge_face_count(&self, e: usize) -> usize {
        self.edges.get(e).map_or(0, |edge| edge.faces.len())
    }

    /// The two topological vertex ids of edge `e`.
    #[inline]
    pub fn edge_vertices(&self, e: usize) -> Option<[usize; 2]> {
        self.edges.get(e).map(|edge| edge.vertices)
    }

    /// Mesh vertex indices coincident at topological vertex `tv`.
    #[inline]
    pub fn vertex_mesh_indices(&self, tv: usize) -> &[usize] {
        self.vertices.get(tv).map_or(&[], |v| v.mesh_vertices.as_slice())
    }

    /// Topological edges touching topological vertex `tv`.
    #[inline]
    pub fn vertex_edges(&self, tv: usize) -> &[usize] {
        self.vertices.get(tv).map_or(&[], |v| v.edges.as_slice())
    }

    /// Topological edge ids bounding face `f` (triangles repeat the last
    /// entry, degenerate sides hold [`NO_EDGE`]).
    #[inline]
    pub fn face_edges(&self, f: usize) -> Option<[usize; 4]> {
        self.faces.get(f).map(|face| face.edges)
    }

    /// The topological vertex a mesh vertex belongs to.
    #[inline]
    pub fn top_vertex(&self, vi: usize) -> Option<usize> {
        self.top_vertex.get(vi).copied()
    }

    /// The mesh generation this graph was built from.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Iterate over all edge ids.
    pub fn edge_ids(&self) -> impl Iterator<Item = usize> + '_ {
        0..self.edges.len()
    }
}
