//! Edge collapse.
//!
//! Collapsing a topological edge merges its two endpoints into one
//! vertex, remaps every incident face, prunes faces that degenerate,
//! repairs n-gon groupings, and compacts the face and vertex arrays.
//!
//! The subtlety is creases: a topological vertex can be backed by
//! several coincident mesh vertices with distinct normals or texture
//! coordinates (a UV seam, a hard shading edge). The collapse works on
//! *duplicated edge records*, one per incident face, keyed by the
//! actual mesh-vertex pair that face uses. Attribute discontinuities
//! survive: positions are merged for every coincident instance, but
//! normals and texture coordinates are written only to the specific pair
//! each record names.
//!
//! All preconditions are checked and all merge data is computed before
//! the first write, so a rejected collapse leaves the mesh untouched.

use nalgebra::{Point2, Point3, Vector3};
use smallvec::SmallVec;

use crate::mesh::{Mesh, Topology};

/// Inline capacity for per-edge scratch buffers. Edge fan-outs are
/// small in practice; larger ones spill to the heap.
const SCRATCH: usize = 8;

/// One duplicated mesh-vertex pair along the collapsed edge, with the
/// merged vertex that will replace it.
#[derive(Debug, Clone, Copy)]
struct EdgeRecord {
    /// Canonical pair, `vi0 < vi1`.
    vi0: usize,
    vi1: usize,
    /// Mesh vertex id both ends map to (an existing index is reused, the
    /// vertex array never grows).
    new_vi: usize,
    new_normal: Option<Vector3<f64>>,
    new_tc: Option<Point2<f64>>,
}

/// Collapse topological edge `edge`, merging its endpoints.
///
/// Preconditions, all checked (any failure returns `false` with no
/// mutation): the edge exists and has at least one incident face, both
/// endpoints have at least one mesh-vertex instance, and every incident
/// face is a valid triangle or quad.
///
/// On success the incident faces are gone (degenerate-pruned) or merged
/// to a smaller arity, attribute channels are updated in lock-step,
/// n-gons referencing pruned faces are shrunk (and deleted when
/// emptied), unused vertices are culled, and the topology and partition
/// caches are destroyed.
pub fn collapse_edge(mesh: &mut Mesh, edge: usize) -> bool {
    let topo = mesh.take_topology();
    let collapsed = collapse_with(mesh, &topo, edge);
    if !collapsed {
        mesh.put_topology(topo);
    }
    collapsed
}

fn collapse_with(mesh: &mut Mesh, topo: &Topology, edge: usize) -> bool {
    // ---------- read-only: preconditions ----------
    let e = match topo.edge(edge) {
        Some(e) => e,
        None => return false,
    };
    if e.faces.is_empty() {
        return false;
    }
    let [tv0, tv1] = e.vertices;
    let inst0 = topo.vertex_mesh_indices(tv0);
    let inst1 = topo.vertex_mesh_indices(tv1);
    if inst0.is_empty() || inst1.is_empty() {
        return false;
    }
    for ef in &e.faces {
        match mesh.faces.get(ef.face) {
            Some(f) if f.is_valid(mesh.vertices.len()) => {}
            _ => return false,
        }
    }

    // ---------- read-only: discover duplicated edges ----------
    let mut records: SmallVec<[EdgeRecord; SCRATCH]> = SmallVec::new();
    for ef in &e.faces {
        let face = mesh.faces[ef.face];
        let mut pair = None;
        for s in 0..face.corner_count() {
            let (a, b) = face.side(s);
            let (ta, tb) = match (topo.top_vertex(a), topo.top_vertex(b)) {
                (Some(ta), Some(tb)) => (ta, tb),
                _ => return false,
            };
            if (ta == tv0 && tb == tv1) || (ta == tv1 && tb == tv0) {
                pair = Some((a.min(b), a.max(b)));
                break;
            }
        }
        let (vi0, vi1) = match pair {
            Some(p) => p,
            None => return false,
        };
        records.push(EdgeRecord {
            vi0,
            vi1,
            new_vi: vi0,
            new_normal: None,
            new_tc: None,
        });
    }
    // Coincident duplicates (creases shared by >2 faces) sort together.
    records.sort_unstable_by_key(|r| (r.vi0, r.vi1));

    // ---------- read-only: merged vertex data ----------
    let has_normals = mesh.has_normals();
    let has_tcs = mesh.has_texture_coords();

    let p0 = average_point(&mesh.vertices, inst0);
    let p1 = average_point(&mesh.vertices, inst1);
    let merged_point = Point3::from((p0.coords + p1.coords) * 0.5);

    if inst0.len() == 1 || inst1.len() == 1 {
        // No crease at one end: a single merged vertex serves every
        // record. Reuse the lowest collapsed index.
        let new_vi = match records.iter().map(|r| r.vi0).min() {
            Some(vi) => vi,
            None => return false,
        };
        let new_normal = if has_normals {
            let n0 = average_vector(&mesh.normals, inst0);
            let n1 = average_vector(&mesh.normals, inst1);
            Some(unitized_or(n0 + n1, n0))
        } else {
            None
        };
        let new_tc = if has_tcs {
            let t0 = average_coords(&mesh.texture_coords, inst0);
            let t1 = average_coords(&mesh.texture_coords, inst1);
            Some(Point2::from((t0 + t1) * 0.5))
        } else {
            None
        };
        for r in records.iter_mut() {
            r.new_vi = new_vi;
            r.new_normal = new_normal;
            r.new_tc = new_tc;
        }
    } else {
        // Both ends are multiply instanced: merge each duplicated pair's
        // attributes on its own, preserving distinct creases through the
        // collapsed location. Positions are all coincident per end, so
        // every pair's midpoint is the shared merged point.
        for r in records.iter_mut() {
            r.new_vi = r.vi0;
            if has_normals {
                let sum = mesh.normals[r.vi0] + mesh.normals[r.vi1];
                r.new_normal = Some(unitized_or(sum, mesh.normals[r.vi0]));
            }
            if has_tcs {
                r.new_tc = Some(Point2::from(
                    (mesh.texture_coords[r.vi0].coords + mesh.texture_coords[r.vi1].coords) * 0.5,
                ));
            }
        }
    }

    // ---------- read-only: old -> new vertex map ----------
    let mut vmap: SmallVec<[(usize, usize); SCRATCH]> = SmallVec::new();
    for r in &records {
        if r.vi0 != r.new_vi {
            vmap.push((r.vi0, r.new_vi));
        }
        if r.vi1 != r.new_vi {
            vmap.push((r.vi1, r.new_vi));
        }
    }
    vmap.sort_unstable();
    vmap.dedup_by(|a, b| a.0 == b.0);
    let lookup = |vi: usize| -> Option<usize> {
        vmap.binary_search_by_key(&vi, |&(old, _)| old)
            .ok()
            .map(|i| vmap[i].1)
    };

    // ---------- mutation: merge positions ----------
    // Every coincident instance at both ends moves, so multiply
    // instanced corners stay coincident.
    for &vi in inst0.iter().chain(inst1.iter()) {
        mesh.vertices[vi] = merged_point;
    }
    // Attribute channels change only on the specific pairs the records
    // name, preserving crease discontinuities.
    for r in &records {
        if let Some(n) = r.new_normal {
            mesh.normals[r.vi0] = n;
            mesh.normals[r.vi1] = n;
        }
        if let Some(tc) = r.new_tc {
            mesh.texture_coords[r.vi0] = tc;
            mesh.texture_coords[r.vi1] = tc;
        }
    }

    // ---------- mutation: remap incident faces ----------
    let mut touched: Vec<usize> = Vec::new();
    for &tv in &[tv0, tv1] {
        for &ei in topo.vertex_edges(tv) {
            if let Some(te) = topo.edge(ei) {
                for ef in &te.faces {
                    touched.push(ef.face);
                }
            }
        }
    }
    touched.sort_unstable();
    touched.dedup();

    let has_face_normals = !mesh.face_normals.is_empty();
    let mut bad_faces: SmallVec<[usize; SCRATCH]> = SmallVec::new();
    for &fi in &touched {
        let mut face = match mesh.faces.get(fi) {
            Some(&f) => f,
            None => continue,
        };
        let mut changed = false;
        for c in 0..4 {
            if let Some(new_vi) = lookup(face.vi[c]) {
                if face.vi[c] != new_vi {
                    face.vi[c] = new_vi;
                    changed = true;
                }
            }
        }
        if !changed {
            continue;
        }
        if face.has_degenerate_corner() && !face.repair() {
            mesh.faces[fi] = face;
            bad_faces.push(fi);
            continue;
        }
        mesh.faces[fi] = face;
        if has_face_normals {
            mesh.face_normals[fi] = mesh.face_normal_of(&face);
        }
    }

    // ---------- mutation: n-gon repair ----------
    if !mesh.ngons.is_empty() {
        for ngon in &mut mesh.ngons {
            let mut remapped = false;
            for vi in &mut ngon.vi {
                if let Some(new_vi) = lookup(*vi) {
                    if *vi != new_vi {
                        *vi = new_vi;
                        remapped = true;
                    }
                }
            }
            if remapped {
                ngon.dedup_boundary();
            }
        }
        if !bad_faces.is_empty() {
            mesh.ngons.retain_mut(|ngon| {
                ngon.fi.retain(|fi| bad_faces.binary_search(fi).is_err());
                !ngon.fi.is_empty()
            });
        }
    }

    // ---------- mutation: compact faces, then vertices ----------
    if !bad_faces.is_empty() {
        let mut face_map = vec![usize::MAX; mesh.faces.len()];
        let mut next = 0;
        for (fi, slot) in face_map.iter_mut().enumerate() {
            if bad_faces.binary_search(&fi).is_err() {
                *slot = next;
                next += 1;
            }
        }
        let mut i = 0;
        mesh.faces.retain(|_| {
            let kept = face_map[i] != usize::MAX;
            i += 1;
            kept
        });
        if has_face_normals {
            let mut i = 0;
            mesh.face_normals.retain(|_| {
                let kept = face_map[i] != usize::MAX;
                i += 1;
                kept
            });
        }
        for ngon in &mut mesh.ngons {
            for fi in &mut ngon.fi {
                *fi = face_map[*fi];
            }
        }
    }

    mesh.invalidate_caches();
    mesh.cull_unused_vertices();

    #[cfg(debug_assertions)]
    {
        if !mesh.is_valid() {
            eprintln!("WARNING: mesh invalid after edge collapse");
        }
    }

    true
}

fn average_point(points: &[Point3<f64>], indices: &[usize]) -> Point3<f64> {
    let mut sum = Vector3::zeros();
    for &vi in indices {
        sum += points[vi].coords;
    }
    Point3::from(sum / indices.len() as f64)
}

fn average_vector(vectors: &[Vector3<f64>], indices: &[usize]) -> Vector3<f64> {
    let mut sum = Vector3::zeros();
    for &vi in indices {
        sum += vectors[vi];
    }
    sum / indices.len() as f64
}

fn average_coords(coords: &[Point2<f64>], indices: &[usize]) -> nalgebra::Vector2<f64> {
    let mut sum = nalgebra::Vector2::zeros();
    for &vi in indices {
        sum += coords[vi].coords;
    }
    sum / indices.len() as f64
}

/// Unitize `v`, falling back to `fallback` when the sum degenerates to
/// (near) zero length.
fn unitized_or(v: Vector3<f64>, fallback: Vector3<f64>) -> Vector3<f64> {
    let len = v.norm();
    if len > 1e-12 {
        v / len
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::{Point2, Point3, Vector3};

    use crate::mesh::{Mesh, MeshFace, Ngon};

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

    /// Topological edge joining mesh vertices `a` and `b`.
    fn edge_between(mesh: &mut Mesh, a: usize, b: usize) -> usize {
        let topo = mesh.topology();
        let (ta, tb) = (topo.top_vertex(a).unwrap(), topo.top_vertex(b).unwrap());
        let key = [ta.min(tb), ta.max(tb)];
        topo.edge_ids()
            .find(|&e| topo.edge_vertices(e) == Some(key))
            .unwrap()
    }

    #[test]
    fn test_collapse_tetrahedron_edge() {
        let mut mesh = tetrahedron();
        let e = edge_between(&mut mesh, 0, 1);
        assert!(collapse_edge(&mut mesh, e));

        // The two incident triangles degenerate and are pruned; the
        // unused endpoint is culled.
        assert_eq!(mesh.face_count(), 2);
        assert_eq!(mesh.vertex_count(), 3);
        assert!(mesh.is_valid());
    }

    #[test]
    fn test_collapse_reduces_faces_on_interior_edge() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let mut mesh = Mesh::from_triangles(&vertices, &[[0, 1, 2], [0, 2, 3]]).unwrap();
        let before = mesh.face_count();
        let e = edge_between(&mut mesh, 0, 2);
        assert!(collapse_edge(&mut mesh, e));
        assert!(mesh.face_count() < before);
        assert!(mesh.is_valid());
    }

    #[test]
    fn test_collapse_merges_to_midpoint() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(1.0, 2.0, 0.0),
            Point3::new(3.0, 2.0, 0.0),
        ];
        let mut mesh = Mesh::from_triangles(&vertices, &[[0, 1, 2], [1, 3, 2]]).unwrap();
        let a = mesh.vertices()[0];
        let b = mesh.vertices()[1];
        let e = edge_between(&mut mesh, 0, 1);
        assert!(collapse_edge(&mut mesh, e));

        // Every position formerly at an endpoint now sits at the edge
        // midpoint; neither original endpoint position survives.
        let merged = Point3::new(1.0, 0.0, 0.0);
        assert!(mesh
            .vertices()
            .iter()
            .any(|p| (p - merged).norm() < 1e-12));
        assert!(mesh
            .vertices()
            .iter()
            .all(|p| (p - a).norm() > 1e-12 && (p - b).norm() > 1e-12));
        assert_eq!(mesh.face_count(), 1);
    }

    #[test]
    fn test_collapse_boundary_edge_of_strip() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(1.5, 1.0, 0.0),
        ];
        let mut mesh = Mesh::from_triangles(&vertices, &[[0, 1, 2], [1, 3, 2]]).unwrap();
        let e = edge_between(&mut mesh, 0, 1);
        assert!(collapse_edge(&mut mesh, e));
        assert_eq!(mesh.face_count(), 1);
        assert!(mesh.is_valid());
    }

    #[test]
    fn test_collapse_quad_becomes_triangle() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let mut mesh = Mesh::from_faces(vertices, vec![MeshFace::quad(0, 1, 2, 3)]).unwrap();
        let e = edge_between(&mut mesh, 0, 1);
        assert!(collapse_edge(&mut mesh, e));

        assert_eq!(mesh.face_count(), 1);
        assert!(mesh.faces()[0].is_triangle());
        assert_eq!(mesh.vertex_count(), 3);
        assert!(mesh.is_valid());
    }

    #[test]
    fn test_collapse_averages_attributes() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(1.0, 2.0, 0.0),
            Point3::new(3.0, 2.0, 0.0),
        ];
        let mut mesh = Mesh::from_triangles(&vertices, &[[0, 1, 2], [1, 3, 2]]).unwrap();
        mesh.set_normals(vec![
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
            Vector3::z(),
            Vector3::z(),
        ])
        .unwrap();
        mesh.set_texture_coords(vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.5, 1.0),
            Point2::new(1.5, 1.0),
        ])
        .unwrap();

        let e = edge_between(&mut mesh, 0, 1);
        assert!(collapse_edge(&mut mesh, e));

        // The merged corner survives in the remaining face with the
        // unitized normal sum and the texture-coordinate midpoint.
        assert_eq!(mesh.face_count(), 1);
        let expected_n = Vector3::new(1.0, 1.0, 0.0).normalize();
        assert!((mesh.normals()[0] - expected_n).norm() < 1e-12);
        assert!((mesh.texture_coords()[0] - Point2::new(0.5, 0.0)).norm() < 1e-12);
        assert!(mesh.is_valid());
    }

    #[test]
    fn test_collapse_preserves_crease_attributes() {
        // Two sheets meeting along a coincident but unwelded edge A-B:
        // sheet one uses vertices 0,1 and sheet two their duplicates 2,3.
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0), // 0: A
            Point3::new(1.0, 0.0, 0.0), // 1: B
            Point3::new(0.0, 0.0, 0.0), // 2: A dup
            Point3::new(1.0, 0.0, 0.0), // 3: B dup
            Point3::new(1.0, 1.0, 0.0), // 4: sheet one apex
            Point3::new(1.0, -1.0, 0.0), // 5: sheet two apex
            Point3::new(2.0, 0.0, 0.0), // 6: sheet one far corner
            Point3::new(2.0, 0.0, 0.0), // 7: sheet two far corner
        ];
        let faces = vec![[0, 1, 4], [1, 6, 4], [3, 2, 5], [7, 3, 5]];
        let mut mesh = Mesh::from_triangles(&vertices, &faces).unwrap();
        let up = Vector3::z();
        let side = Vector3::x();
        mesh.set_normals(vec![up, up, side, side, up, side, up, side])
            .unwrap();

        let e = edge_between(&mut mesh, 0, 1);
        assert!(collapse_edge(&mut mesh, e));

        // One face survives per sheet.
        assert_eq!(mesh.face_count(), 2);
        assert!(mesh.is_valid());

        // The two sheets' merged vertices are coincident in position but
        // keep their own normals.
        let at_merge: Vec<usize> = mesh
            .vertices()
            .iter()
            .enumerate()
            .filter(|(_, p)| (*p - Point3::new(0.5, 0.0, 0.0)).norm() < 1e-12)
            .map(|(vi, _)| vi)
            .collect();
        assert_eq!(at_merge.len(), 2);
        let n0 = mesh.normals()[at_merge[0]];
        let n1 = mesh.normals()[at_merge[1]];
        assert!((n0 - n1).norm() > 0.5);
    }

    #[test]
    fn test_collapse_repairs_ngons() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ];
        let mut mesh =
            Mesh::from_triangles(&vertices, &[[0, 1, 2], [0, 2, 3], [1, 4, 2]]).unwrap();
        mesh.add_ngon(Ngon::new(vec![0, 1, 2, 3], vec![0, 1])).unwrap();

        // Collapsing the quad's diagonal kills both of its triangles;
        // the n-gon loses all faces and is deleted. The third face
        // survives and keeps a valid (renumbered) index space.
        let e = edge_between(&mut mesh, 0, 2);
        assert!(collapse_edge(&mut mesh, e));
        assert!(mesh.ngons().is_empty());
        assert_eq!(mesh.face_count(), 1);
        assert!(mesh.is_valid());
    }

    #[test]
    fn test_collapse_shrinks_partial_ngon() {
        // Strip of three triangles grouped as one ngon; collapsing the
        // leading edge prunes one face and the ngon keeps the rest.
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(1.5, 1.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ];
        let mut mesh =
            Mesh::from_triangles(&vertices, &[[0, 1, 2], [1, 3, 2], [1, 4, 3]]).unwrap();
        mesh.add_ngon(Ngon::new(vec![0, 1, 4, 3, 2], vec![0, 1, 2]))
            .unwrap();

        let e = edge_between(&mut mesh, 0, 1);
        assert!(collapse_edge(&mut mesh, e));
        assert_eq!(mesh.ngons().len(), 1);
        assert_eq!(mesh.ngons()[0].fi.len(), 2);
        assert!(mesh.is_valid());
    }

    #[test]
    fn test_collapse_rejects_out_of_range() {
        let mut mesh = tetrahedron();
        let before = mesh.clone();
        assert!(!collapse_edge(&mut mesh, 42));
        assert_eq!(mesh.faces(), before.faces());
        assert_eq!(mesh.vertices(), before.vertices());
        assert_eq!(mesh.generation(), before.generation());
    }

    #[test]
    fn test_collapse_updates_face_normals() {
        let mut mesh = tetrahedron();
        mesh.compute_face_normals();
        let e = edge_between(&mut mesh, 0, 1);
        assert!(collapse_edge(&mut mesh, e));
        assert_eq!(mesh.face_normals().len(), mesh.face_count());
    }
}
