//! Edge swap (diagonal flip).
//!
//! Swapping replaces the two triangles sharing a manifold interior edge
//! with the two triangles spanning the opposite diagonal of their union.
//! Viewing the triangles as `(a, b, c)` and `(b, a, d)` around the shared
//! directed edge `(a, b)`, the swap produces `(b, c, d)` and `(a, d, c)`.
//!
//! Checks run on a read-only plan before anything is written, so a
//! rejected swap leaves the mesh untouched, and [`is_swappable`] can ask
//! the same question without mutating (or even discarding the cached
//! topology).

use crate::mesh::{Mesh, MeshFace, Topology};

#[derive(Debug)]
struct SwapPlan {
    f0: usize,
    f1: usize,
    new_f0: MeshFace,
    new_f1: MeshFace,
}

/// Check whether [`swap_edge`] would succeed on `edge`, without mutating.
pub fn is_swappable(mesh: &mut Mesh, edge: usize) -> bool {
    let topo = mesh.take_topology();
    let ok = plan_swap(mesh, &topo, edge).is_some();
    mesh.put_topology(topo);
    ok
}

/// Flip the diagonal shared by two triangles.
///
/// Preconditions, all checked (any failure returns `false` with no
/// mutation): `edge` exists and has exactly two distinct incident faces,
/// both triangles with valid corners; the faces traverse the edge in
/// opposite directions (consistent manifold winding); the two apex
/// corners sit at distinct topological vertices; both edge endpoints have
/// at least one mesh vertex instance.
///
/// On success the two faces are rewritten in place (face count is
/// unchanged), per-face normals are recomputed when present, and the
/// topology and partition caches are destroyed. Vertex arrays are never
/// touched.
pub fn swap_edge(mesh: &mut Mesh, edge: usize) -> bool {
    let topo = mesh.take_topology();
    let plan = match plan_swap(mesh, &topo, edge) {
        Some(plan) => plan,
        None => {
            mesh.put_topology(topo);
            return false;
        }
    };

    mesh.faces[plan.f0] = plan.new_f0;
    mesh.faces[plan.f1] = plan.new_f1;
    if !mesh.face_normals.is_empty() {
        mesh.face_normals[plan.f0] = mesh.face_normal_of(&plan.new_f0);
        mesh.face_normals[plan.f1] = mesh.face_normal_of(&plan.new_f1);
    }
    mesh.invalidate_caches();
    true
}

fn plan_swap(mesh: &Mesh, topo: &Topology, edge: usize) -> Option<SwapPlan> {
    let e = topo.edge(edge)?;
    if e.faces.len() != 2 {
        return None;
    }
    let (use0, use1) = (e.faces[0], e.faces[1]);
    if use0.face == use1.face {
        return None;
    }

    let face0 = *mesh.faces.get(use0.face)?;
    let face1 = *mesh.faces.get(use1.face)?;
    if !face0.is_triangle() || !face1.is_triangle() {
        return None;
    }
    if !face0.is_valid(mesh.vertex_count()) || !face1.is_valid(mesh.vertex_count()) {
        return None;
    }

    // Consistent winding: the faces must run the edge in opposite
    // directions.
    let tf0 = topo.face(use0.face)?;
    let tf1 = topo.face(use1.face)?;
    if tf0.reversed[use0.slot] == tf1.reversed[use1.slot] {
        return None;
    }

    let [tva, tvb] = e.vertices;
    if topo.vertex_mesh_indices(tva).is_empty() || topo.vertex_mesh_indices(tvb).is_empty() {
        return None;
    }

    // face0's directed side runs a -> b; face1 runs b -> a.
    let (_a0, b0) = face0.side(use0.slot);
    let apex0 = face0.vi[(use0.slot + 2) % 3];
    let (_b1, a1) = face1.side(use1.slot);
    let apex1 = face1.vi[(use1.slot + 2) % 3];

    // Coincident apexes would produce two degenerate slivers.
    if topo.top_vertex(apex0)? == topo.top_vertex(apex1)? {
        return None;
    }

    Some(SwapPlan {
        f0: use0.face,
        f1: use1.face,
        new_f0: MeshFace::triangle(b0, apex0, apex1),
        new_f1: MeshFace::triangle(a1, apex1, apex0),
    })
}
