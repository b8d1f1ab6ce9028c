//! Face-vertex mesh store.
//!
//! [`Mesh`] owns flat arrays of vertex positions, optional per-vertex
//! attribute channels (normals, texture coordinates, colors) that run
//! parallel to the positions, an array of triangle/quad faces, optional
//! per-face normals, and optional n-gon groupings.
//!
//! Derived data (the [`Topology`] graph, the connected-component
//! partition, the "is closed" flag) is cached alongside the arrays and
//! destroyed by every structural mutation. Mutating operations own their
//! cache invalidation; callers never have to remember a separate
//! "destroy topology" step. A generation counter lets downstream code
//! detect that a cached snapshot went stale.

use nalgebra::{Point2, Point3, Vector3};

use crate::error::{MeshError, Result};

use super::face::MeshFace;
use super::ngon::Ngon;
use super::topology::Topology;

/// A vertex color, RGBA with 8 bits per channel.
pub type Color = [u8; 4];

/// Cached connected-component labeling, keyed by the adjacency rule that
/// produced it.
#[derive(Debug, Clone)]
pub(crate) struct FacePartition {
    pub vertex_connections: bool,
    pub topological: bool,
    pub labels: Vec<usize>,
    pub count: usize,
}

/// A polygon mesh with triangle and quad faces.
///
/// Vertex indices are stable identities until a compaction pass
/// ([`Mesh::cull_unused_vertices`]) renumbers them.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub(crate) vertices: Vec<Point3<f64>>,
    pub(crate) normals: Vec<Vector3<f64>>,
    pub(crate) texture_coords: Vec<Point2<f64>>,
    pub(crate) colors: Vec<Color>,
    pub(crate) faces: Vec<MeshFace>,
    pub(crate) face_normals: Vec<Vector3<f64>>,
    pub(crate) ngons: Vec<Ngon>,

    topology: Option<Topology>,
    partition: Option<FacePartition>,
    closed: Option<bool>,
    generation: u64,
}

impl Mesh {
    /// Create a new empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a mesh from vertex positions and faces.
    ///
    /// Every face must reference in-range vertex indices and have
    /// distinct corners (three for triangles, four for quads).
    ///
    /// # Example
    /// ```
    /// use trabec::mesh::{Mesh, MeshFace};
    /// use nalgebra::Point3;
    ///
    /// let vertices = vec![
    ///     Point3::new(0.0, 0.0, 0.0),
    ///     Point3::new(1.0, 0.0, 0.0),
    ///     Point3::new(0.5, 1.0, 0.0),
    /// ];
    /// let mesh = Mesh::from_faces(vertices, vec![MeshFace::triangle(0, 1, 2)]).unwrap();
    /// assert_eq!(mesh.face_count(), 1);
    /// ```
    pub fn from_faces(vertices: Vec<Point3<f64>>, faces: Vec<MeshFace>) -> Result<Self> {
        if faces.is_empty() {
            return Err(MeshError::EmptyMesh);
        }
        for (fi, face) in faces.iter().enumerate() {
            for &vi in &face.vi {
                if vi >= vertices.len() {
                    return Err(MeshError::InvalidVertexIndex { face: fi, vertex: vi });
                }
            }
            if !face.is_valid(vertices.len()) {
                return Err(MeshError::DegenerateFace { face: fi });
            }
        }
        Ok(Self {
            vertices,
            faces,
            ..Self::default()
        })
    }

    /// Build a triangle mesh from positions and index triples.
    pub fn from_triangles(vertices: &[Point3<f64>], triangles: &[[usize; 3]]) -> Result<Self> {
        let faces = triangles
            .iter()
            .map(|&[a, b, c]| MeshFace::triangle(a, b, c))
            .collect();
        Self::from_faces(vertices.to_vec(), faces)
    }

    // ==================== Accessors ====================

    /// Number of vertices.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of faces.
    #[inline]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Vertex positions.
    #[inline]
    pub fn vertices(&self) -> &[Point3<f64>] {
        &self.vertices
    }

    /// Faces.
    #[inline]
    pub fn faces(&self) -> &[MeshFace] {
        &self.faces
    }

    /// Per-vertex normals (empty when the channel is absent).
    #[inline]
    pub fn normals(&self) -> &[Vector3<f64>] {
        &self.normals
    }

    /// Per-vertex texture coordinates (empty when the channel is absent).
    #[inline]
    pub fn texture_coords(&self) -> &[Point2<f64>] {
        &self.texture_coords
    }

    /// Per-vertex colors (empty when the channel is absent).
    #[inline]
    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    /// Per-face normals (empty until [`Mesh::compute_face_normals`]).
    #[inline]
    pub fn face_normals(&self) -> &[Vector3<f64>] {
        &self.face_normals
    }

    /// N-gon groupings.
    #[inline]
    pub fn ngons(&self) -> &[Ngon] {
        &self.ngons
    }

    /// Check if the normal channel is present.
    #[inline]
    pub fn has_normals(&self) -> bool {
        !self.normals.is_empty()
    }

    /// Check if the texture coordinate channel is present.
    #[inline]
    pub fn has_texture_coords(&self) -> bool {
        !self.texture_coords.is_empty()
    }

    /// Check if the color channel is present.
    #[inline]
    pub fn has_colors(&self) -> bool {
        !self.colors.is_empty()
    }

    /// Generation counter, bumped by every structural mutation.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    // ==================== Attribute channels ====================

    /// Set the per-vertex normal channel. Must run parallel to the
    /// vertex array; an empty vector removes the channel.
    pub fn set_normals(&mut self, normals: Vec<Vector3<f64>>) -> Result<()> {
        if !normals.is_empty() && normals.len() != self.vertices.len() {
            return Err(MeshError::ChannelLengthMismatch {
                channel: "normal",
                expected: self.vertices.len(),
                actual: normals.len(),
            });
        }
        self.normals = normals;
        Ok(())
    }

    /// Set the per-vertex texture coordinate channel. Must run parallel
    /// to the vertex array; an empty vector removes the channel.
    pub fn set_texture_coords(&mut self, texture_coords: Vec<Point2<f64>>) -> Result<()> {
        if !texture_coords.is_empty() && texture_coords.len() != self.vertices.len() {
            return Err(MeshError::ChannelLengthMismatch {
                channel: "texture coordinate",
                expected: self.vertices.len(),
                actual: texture_coords.len(),
            });
        }
        self.texture_coords = texture_coords;
        Ok(())
    }

    /// Set the per-vertex color channel. Must run parallel to the vertex
    /// array; an empty vector removes the channel.
    pub fn set_colors(&mut self, colors: Vec<Color>) -> Result<()> {
        if !colors.is_empty() && colors.len() != self.vertices.len() {
            return Err(MeshError::ChannelLengthMismatch {
                channel: "color",
                expected: self.vertices.len(),
                actual: colors.len(),
            });
        }
        self.colors = colors;
        Ok(())
    }

    // ==================== Geometry ====================

    /// Unit normal of face `fi` computed from its corner positions.
    ///
    /// Quads use the cross product of their diagonals. Degenerate faces
    /// yield the zero vector.
    pub fn face_normal(&self, fi: usize) -> Option<Vector3<f64>> {
        let face = self.faces.get(fi)?;
        if face.vi.iter().any(|&vi| vi >= self.vertices.len()) {
            return None;
        }
        Some(self.face_normal_of(face))
    }

    pub(crate) fn face_normal_of(&self, face: &MeshFace) -> Vector3<f64> {
        let p = |i: usize| self.vertices[face.vi[i]];
        let n = if face.is_quad() {
            (p(2) - p(0)).cross(&(p(3) - p(1)))
        } else {
            (p(1) - p(0)).cross(&(p(2) - p(0)))
        };
        let len = n.norm();
        if len > 0.0 {
            n / len
        } else {
            Vector3::zeros()
        }
    }

    /// Populate the per-face normal array from current corner positions.
    pub fn compute_face_normals(&mut self) {
        self.face_normals = (0..self.faces.len())
            .map(|fi| {
                let face = self.faces[fi];
                self.face_normal_of(&face)
            })
            .collect();
    }

    // ==================== N-gons ====================

    /// Add an n-gon grouping, validating its face and vertex references.
    /// Returns the n-gon's index.
    pub fn add_ngon(&mut self, ngon: Ngon) -> Result<usize> {
        if ngon.fi.is_empty() {
            return Err(MeshError::EmptyNgon { list: "face" });
        }
        if ngon.vi.is_empty() {
            return Err(MeshError::EmptyNgon { list: "vertex" });
        }
        for &fi in &ngon.fi {
            if fi >= self.faces.len() {
                return Err(MeshError::InvalidNgonFace { face: fi });
            }
        }
        for &vi in &ngon.vi {
            if vi >= self.vertices.len() {
                return Err(MeshError::InvalidNgonVertex { vertex: vi });
            }
        }
        self.ngons.push(ngon);
        Ok(self.ngons.len() - 1)
    }

    // ==================== Topology cache ====================

    /// The topology graph, built on first query and after every
    /// structural mutation.
    pub fn topology(&mut self) -> &Topology {
        self.ensure_topology();
        self.topology
            .as_ref()
            .expect("topology cache populated by ensure_topology")
    }

    /// Build the topology cache if missing or stale.
    pub(crate) fn ensure_topology(&mut self) {
        let stale = self
            .topology
            .as_ref()
            .map_or(true, |t| t.generation() != self.generation);
        if stale {
            let topo = Topology::build(self, self.generation);
            self.topology = Some(topo);
        }
    }

    /// Borrow the cached topology without (re)building it.
    #[inline]
    pub(crate) fn cached_topology(&self) -> Option<&Topology> {
        self.topology.as_ref()
    }

    /// Take ownership of the (freshly built) topology graph so surgery
    /// operations can read it while mutating the mesh arrays.
    pub(crate) fn take_topology(&mut self) -> Topology {
        self.ensure_topology();
        match self.topology.take() {
            Some(t) => t,
            None => Topology::build(self, self.generation),
        }
    }

    /// Return a topology taken with [`Mesh::take_topology`]. Ignored if
    /// the mesh mutated in between (the graph would be stale).
    pub(crate) fn put_topology(&mut self, topo: Topology) {
        if topo.generation() == self.generation {
            self.topology = Some(topo);
        }
    }

    /// Destroy every derived cache and bump the generation counter.
    /// Called by every operation that mutates the vertex or face arrays.
    pub(crate) fn invalidate_caches(&mut self) {
        self.topology = None;
        self.partition = None;
        self.closed = None;
        self.generation += 1;
    }

    #[inline]
    pub(crate) fn partition_cache(&self) -> Option<&FacePartition> {
        self.partition.as_ref()
    }

    pub(crate) fn set_partition_cache(&mut self, partition: FacePartition) {
        self.partition = Some(partition);
    }

    #[cfg(test)]
    pub(crate) fn clear_caches_for_test(&mut self) {
        self.topology = None;
        self.partition = None;
        self.closed = None;
    }

    // ==================== Queries ====================

    /// Check if the mesh is closed: non-empty and every topological edge
    /// has exactly two incident faces. Cached; invalidated by mutation.
    pub fn is_closed(&mut self) -> bool {
        if let Some(closed) = self.closed {
            return closed;
        }
        self.ensure_topology();
        let closed = match self.cached_topology() {
            Some(topo) => {
                topo.edge_count() > 0 && topo.edge_ids().all(|e| topo.edge_face_count(e) == 2)
            }
            None => false,
        };
        self.closed = Some(closed);
        closed
    }

    /// Check structural validity: faces reference in-range, distinct
    /// corners; attribute channels run parallel to their arrays; n-gon
    /// references are in range.
    pub fn is_valid(&self) -> bool {
        let nv = self.vertices.len();
        if self.faces.iter().any(|f| !f.is_valid(nv)) {
            return false;
        }
        if !self.normals.is_empty() && self.normals.len() != nv {
            return false;
        }
        if !self.texture_coords.is_empty() && self.texture_coords.len() != nv {
            return false;
        }
        if !self.colors.is_empty() && self.colors.len() != nv {
            return false;
        }
        if !self.face_normals.is_empty() && self.face_normals.len() != self.faces.len() {
            return false;
        }
        for ngon in &self.ngons {
            if ngon.fi.is_empty() || ngon.vi.is_empty() {
                return false;
            }
            if ngon.fi.iter().any(|&fi| fi >= self.faces.len()) {
                return false;
            }
            if ngon.vi.iter().any(|&vi| vi >= nv) {
                return false;
            }
        }
        true
    }

    // ==================== Mutation ====================

    /// Delete face `fi`, shifting later faces down one slot.
    ///
    /// Destroys the topology and partition caches and the cached closed
    /// flag, removes the per-face normal if present, and renumbers n-gon
    /// face references (an n-gon left without faces is deleted). Does
    /// *not* compact vertices; callers batching deletions run
    /// [`Mesh::cull_unused_vertices`] once afterwards.
    ///
    /// Returns `false` (and leaves the mesh unchanged) if `fi` is out of
    /// range.
    pub fn delete_face(&mut self, fi: usize) -> bool {
        if fi >= self.faces.len() {
            return false;
        }
        self.invalidate_caches();
        self.faces.remove(fi);
        if !self.face_normals.is_empty() {
            self.face_normals.remove(fi);
        }
        if !self.ngons.is_empty() {
            self.ngons.retain_mut(|ngon| {
                ngon.fi.retain(|&f| f != fi);
                for f in &mut ngon.fi {
                    if *f > fi {
                        *f -= 1;
                    }
                }
                !ngon.fi.is_empty()
            });
        }
        true
    }

    /// Remove vertices referenced by no face and no n-gon, renumbering
    /// all remaining references. Idempotent. Returns the number of
    /// vertices removed.
    pub fn cull_unused_vertices(&mut self) -> usize {
        let nv = self.vertices.len();
        let mut used = vec![false; nv];
        for face in &self.faces {
            for &vi in &face.vi {
                if vi < nv {
                    used[vi] = true;
                }
            }
        }
        for ngon in &self.ngons {
            for &vi in &ngon.vi {
                if vi < nv {
                    used[vi] = true;
                }
            }
        }

        let removed = used.iter().filter(|&&u| !u).count();
        if removed == 0 {
            return 0;
        }

        // Old index -> new index for surviving vertices.
        let mut map = vec![usize::MAX; nv];
        let mut next = 0;
        for (vi, &keep) in used.iter().enumerate() {
            if keep {
                map[vi] = next;
                next += 1;
            }
        }

        fn retain_kept<T>(data: &mut Vec<T>, keep: &[bool]) {
            let mut i = 0;
            data.retain(|_| {
                let kept = keep[i];
                i += 1;
                kept
            });
        }
        retain_kept(&mut self.vertices, &used);
        retain_kept(&mut self.normals, &used);
        retain_kept(&mut self.texture_coords, &used);
        retain_kept(&mut self.colors, &used);

        for face in &mut self.faces {
            for vi in &mut face.vi {
                *vi = map[*vi];
            }
        }
        for ngon in &mut self.ngons {
            for vi in &mut ngon.vi {
                *vi = map[*vi];
            }
        }

        self.invalidate_caches();
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tetrahedron() -> Mesh {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, 0.5, 1.0),
        ];
        let faces = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
        Mesh::from_triangles(&vertices, &faces).unwrap()
    }

    #[test]
    fn test_from_faces_rejects_bad_index() {
        let vertices = vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)];
        let err = Mesh::from_faces(vertices, vec![MeshFace::triangle(0, 1, 2)]).unwrap_err();
        assert!(matches!(err, MeshError::InvalidVertexIndex { face: 0, vertex: 2 }));
    }

    #[test]
    fn test_from_faces_rejects_degenerate() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
        ];
        let err = Mesh::from_faces(vertices, vec![MeshFace::triangle(0, 1, 1)]).unwrap_err();
        assert!(matches!(err, MeshError::DegenerateFace { face: 0 }));
    }

    #[test]
    fn test_channel_length_validation() {
        let mut mesh = tetrahedron();
        assert!(mesh.set_normals(vec![Vector3::z(); 4]).is_ok());
        assert!(mesh.set_normals(vec![Vector3::z(); 3]).is_err());
        assert!(mesh.set_colors(vec![[255, 0, 0, 255]; 4]).is_ok());
        assert!(mesh.has_normals());
        assert!(mesh.has_colors());
        assert!(!mesh.has_texture_coords());
    }

    #[test]
    fn test_tetrahedron_is_closed() {
        let mut mesh = tetrahedron();
        assert!(mesh.is_closed());
        assert!(mesh.delete_face(0));
        assert!(!mesh.is_closed());
    }

    #[test]
    fn test_delete_face_shifts_and_renumbers_ngons() {
        let mut mesh = tetrahedron();
        mesh.compute_face_normals();
        mesh.add_ngon(Ngon::new(vec![0, 1, 2], vec![2, 3])).unwrap();

        let gen = mesh.generation();
        assert!(mesh.delete_face(1));
        assert_eq!(mesh.face_count(), 3);
        assert_eq!(mesh.face_normals().len(), 3);
        assert!(mesh.generation() > gen);
        // Faces 2,3 shifted to 1,2.
        assert_eq!(mesh.ngons()[0].fi, vec![1, 2]);

        // Deleting a face an ngon references drops the reference.
        assert!(mesh.delete_face(1));
        assert_eq!(mesh.ngons()[0].fi, vec![1]);
        assert!(mesh.is_valid());

        assert!(!mesh.delete_face(10));
    }

    #[test]
    fn test_cull_unused_vertices() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0), // unused
            Point3::new(0.5, 1.0, 0.0),
        ];
        let faces = vec![MeshFace::triangle(0, 1, 3)];
        let mut mesh = Mesh::from_faces(vertices, faces).unwrap();
        mesh.set_normals(vec![Vector3::z(); 4]).unwrap();

        assert_eq!(mesh.cull_unused_vertices(), 1);
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.normals().len(), 3);
        assert_eq!(mesh.faces()[0], MeshFace::triangle(0, 1, 2));
        assert!(mesh.is_valid());

        // Idempotent.
        assert_eq!(mesh.cull_unused_vertices(), 0);
    }

    #[test]
    fn test_face_normal() {
        let mesh = tetrahedron();
        let n = mesh.face_normal(0).unwrap();
        // Face [0,2,1] winds clockwise in the z=0 plane: normal points -z.
        assert!(n.z < 0.0);
        assert!((n.norm() - 1.0).abs() < 1e-12);
        assert!(mesh.face_normal(7).is_none());
    }

    #[test]
    fn test_topology_cache_reuse_and_invalidation() {
        let mut mesh = tetrahedron();
        let gen0 = {
            let topo = mesh.topology();
            assert_eq!(topo.edge_count(), 6);
            topo.generation()
        };
        // Unchanged mesh: cache generation stable.
        assert_eq!(mesh.topology().generation(), gen0);

        mesh.delete_face(3);
        let topo = mesh.topology();
        assert_ne!(topo.generation(), gen0);
        assert_eq!(topo.face_count(), 3);
    }
}
