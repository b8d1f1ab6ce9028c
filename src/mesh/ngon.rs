//! N-gon groupings.
//!
//! An n-gon is a polygon assembled from several triangle/quad faces,
//! tracked as a named group for editing and selection. N-gons are a
//! grouping convenience, not a structural requirement: surgery operations
//! keep them consistent where possible and drop stale references where
//! not, but never fail because of one.

/// A polygon built from multiple mesh faces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ngon {
    /// Boundary vertex indices, in polygon order.
    pub vi: Vec<usize>,

    /// Indices of the faces that triangulate this polygon.
    pub fi: Vec<usize>,
}

impl Ngon {
    /// Create an n-gon from boundary vertices and member faces.
    pub fn new(vi: Vec<usize>, fi: Vec<usize>) -> Self {
        Self { vi, fi }
    }

    /// Number of boundary vertices.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vi.len()
    }

    /// Number of member faces.
    #[inline]
    pub fn face_count(&self) -> usize {
        self.fi.len()
    }

    /// Drop consecutive repeated boundary vertices, including the
    /// wrap-around pair. Called after collapse remaps vertex indices.
    pub(crate) fn dedup_boundary(&mut self) {
        self.vi.dedup();
        while self.vi.len() > 1 && self.vi.first() == self.vi.last() {
            self.vi.pop();
        }
    }
}
