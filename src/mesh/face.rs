//! Face representation for triangle/quad meshes.
//!
//! A [`MeshFace`] stores four vertex indices. Quads use all four; a
//! triangle repeats its last corner (`vi[3] == vi[2]`), so both arities
//! share one fixed-size representation and faces can change arity in
//! place (a quad that loses a corner during edge collapse becomes a
//! triangle without moving in the face array).

/// A triangle or quad face, stored as four vertex indices.
///
/// `vi[3] == vi[2]` denotes a triangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshFace {
    /// Corner vertex indices, counter-clockwise.
    pub vi: [usize; 4],
}

impl MeshFace {
    /// Create a triangle face.
    #[inline]
    pub fn triangle(v0: usize, v1: usize, v2: usize) -> Self {
        Self { vi: [v0, v1, v2, v2] }
    }

    /// Create a quad face.
    #[inline]
    pub fn quad(v0: usize, v1: usize, v2: usize, v3: usize) -> Self {
        Self { vi: [v0, v1, v2, v3] }
    }

    /// Check if this face is a triangle.
    #[inline]
    pub fn is_triangle(&self) -> bool {
        self.vi[2] == self.vi[3]
    }

    /// Check if this face is a quad.
    #[inline]
    pub fn is_quad(&self) -> bool {
        self.vi[2] != self.vi[3]
    }

    /// Number of distinct corners (3 for triangles, 4 for quads).
    #[inline]
    pub fn corner_count(&self) -> usize {
        if self.is_quad() {
            4
        } else {
            3
        }
    }

    /// The directed side `s` of this face as a `(from, to)` vertex pair.
    ///
    /// Triangles have sides `(v0,v1)`, `(v1,v2)`, `(v2,v0)`; quads add
    /// `(v2,v3)` and close with `(v3,v0)`.
    #[inline]
    pub fn side(&self, s: usize) -> (usize, usize) {
        let n = self.corner_count();
        (self.vi[s], self.vi[(s + 1) % n])
    }

    /// Iterate over the directed sides of this face.
    pub fn sides(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.corner_count()).map(|s| self.side(s))
    }

    /// Check structural validity: all indices below `vertex_count` and
    /// all corners distinct (triangles: three, quads: four, including
    /// the diagonals).
    pub fn is_valid(&self, vertex_count: usize) -> bool {
        let v = self.vi;
        if v.iter().any(|&vi| vi >= vertex_count) {
            return false;
        }
        if self.is_quad() {
            v[0] != v[1]
                && v[0] != v[2]
                && v[0] != v[3]
                && v[1] != v[2]
                && v[1] != v[3]
                && v[2] != v[3]
        } else {
            v[0] != v[1] && v[1] != v[2] && v[0] != v[2]
        }
    }

    /// Check whether any corner index appears more than it should
    /// (ignoring the triangle convention `vi[3] == vi[2]`).
    #[inline]
    pub(crate) fn has_degenerate_corner(&self) -> bool {
        let v = self.vi;
        if self.is_quad() {
            v[0] == v[1] || v[1] == v[2] || v[2] == v[3] || v[3] == v[0] || v[0] == v[2] || v[1] == v[3]
        } else {
            v[0] == v[1] || v[1] == v[2] || v[0] == v[2]
        }
    }

    /// Rotate corners left by `k` slots, preserving winding.
    #[inline]
    fn rotated(&self, k: usize) -> Self {
        let v = self.vi;
        Self {
            vi: [v[k % 4], v[(k + 1) % 4], v[(k + 2) % 4], v[(k + 3) % 4]],
        }
    }

    /// Repair a face whose corners were remapped and may now repeat.
    ///
    /// A quad with exactly one repeated adjacent corner pair is rotated so
    /// the pair lands in the trailing slots, turning it into a canonical
    /// triangle. Returns `true` if the face is (now) a valid triangle or
    /// quad; `false` if no rotation can rescue it and it should be
    /// removed.
    pub(crate) fn repair(&mut self) -> bool {
        let v = self.vi;
        if self.is_quad() {
            // Diagonal repeats can never form a triangle.
            if v[0] == v[2] || v[1] == v[3] {
                return false;
            }
            let mut dup = None;
            let mut dup_count = 0;
            for s in 0..4 {
                if v[s] == v[(s + 1) % 4] {
                    dup = Some(s);
                    dup_count += 1;
                }
            }
            match (dup, dup_count) {
                (None, _) => true,
                (Some(s), 1) => {
                    // Rotate the repeated pair into slots 2,3.
                    *self = self.rotated((s + 2) % 4);
                    let w = self.vi;
                    w[0] != w[1] && w[1] != w[2] && w[0] != w[2]
                }
                _ => false,
            }
        } else {
            v[0] != v[1] && v[1] != v[2] && v[0] != v[2]
        }
    }
}
