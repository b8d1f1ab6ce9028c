//! Connected-component labeling and splitting.
//!
//! Faces are grouped into components under a configurable adjacency
//! rule ([`ComponentOptions`]): connectivity through shared edges or
//! through shared vertices, with coincidence judged either topologically
//! (coincident positions weld) or strictly by mesh vertex index.
//!
//! Labeling runs a flood fill over *buckets*: one bucket per connecting
//! element (edge or vertex), holding the faces it touches. A bucket is
//! drained at most once, so the fill is linear in the total face-bucket
//! incidence regardless of component shape.

use rayon::prelude::*;
use smallvec::SmallVec;
use std::collections::HashMap;

use crate::mesh::{FacePartition, Mesh, MeshFace, Ngon, Topology, NO_EDGE};

/// Adjacency rule for component labeling.
///
/// The default treats faces as connected when they share a topological
/// edge: coincident vertices weld, but touching at a single point does
/// not connect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentOptions {
    /// Connect faces that share a vertex, not just an edge.
    pub vertex_connections: bool,
    /// Judge sharing topologically (coincident positions weld) rather
    /// than by strict mesh vertex index.
    pub topological: bool,
}

impl Default for ComponentOptions {
    fn default() -> Self {
        Self {
            vertex_connections: false,
            topological: true,
        }
    }
}

impl ComponentOptions {
    /// Connect faces through shared vertices instead of shared edges.
    pub fn with_vertex_connections(mut self, vertex_connections: bool) -> Self {
        self.vertex_connections = vertex_connections;
        self
    }

    /// Weld coincident vertices when judging adjacency.
    pub fn with_topological(mut self, topological: bool) -> Self {
        self.topological = topological;
        self
    }
}

/// Label every face with its connected component.
///
/// Returns `(labels, count)`: `labels[fi]` is the 1-based component id
/// of face `fi`, and `count` is the number of components. Every face
/// receives a label. The result is cached on the mesh (keyed by the
/// options) until the next structural mutation.
pub fn label_components(mesh: &mut Mesh, options: ComponentOptions) -> (Vec<usize>, usize) {
    if let Some(cached) = mesh.partition_cache() {
        if cached.vertex_connections == options.vertex_connections
            && cached.topological == options.topological
        {
            return (cached.labels.clone(), cached.count);
        }
    }

    let nf = mesh.face_count();
    let mut face_buckets: FaceBuckets = vec![SmallVec::new(); nf];
    let mut bucket_faces: BucketFaces = Vec::new();
    if options.topological {
        let topo = mesh.take_topology();
        fill_topological_buckets(mesh, &topo, options, &mut face_buckets, &mut bucket_faces);
        mesh.put_topology(topo);
    } else {
        fill_strict_buckets(mesh, options, &mut face_buckets, &mut bucket_faces);
    }
    let (labels, count) = flood_fill(nf, &face_buckets, &bucket_faces);

    mesh.set_partition_cache(FacePartition {
        vertex_connections: options.vertex_connections,
        topological: options.topological,
        labels: labels.clone(),
        count,
    });
    (labels, count)
}

/// Split the mesh into one mesh per connected component, in label order.
///
/// Each piece carries the vertices its faces (and wholly contained
/// n-gons) reference, with every present attribute channel extracted in
/// lock-step. An n-gon is kept only when all of its faces land in the
/// same component; one that straddles components is dropped. The source
/// mesh is not modified beyond cache population.
pub fn split_components(mesh: &mut Mesh, options: ComponentOptions) -> Vec<Mesh> {
    let (labels, count) = label_components(mesh, options);
    let mesh = &*mesh;
    (1..=count)
        .into_par_iter()
        .map(|label| extract_component(mesh, &labels, label))
        .collect()
}

// ==================== Flood fill ====================

type FaceBuckets = Vec<SmallVec<[usize; 4]>>;
type BucketFaces = Vec<Vec<usize>>;

fn flood_fill(nf: usize, face_buckets: &FaceBuckets, bucket_faces: &BucketFaces) -> (Vec<usize>, usize) {
    let mut bucket_done = vec![false; bucket_faces.len()];
    let mut labels = vec![0usize; nf];
    let mut count = 0;
    let mut stack: Vec<usize> = Vec::new();

    for seed in 0..nf {
        if labels[seed] != 0 {
            continue;
        }
        count += 1;
        labels[seed] = count;
        stack.push(seed);
        while let Some(fi) = stack.pop() {
            for &b in &face_buckets[fi] {
                if bucket_done[b] {
                    continue;
                }
                bucket_done[b] = true;
                for &other in &bucket_faces[b] {
                    if labels[other] == 0 {
                        labels[other] = count;
                        stack.push(other);
                    }
                }
            }
        }
    }
    (labels, count)
}

/// Buckets under topological welding: topological edges, or topological
/// vertices when connecting through shared vertices.
fn fill_topological_buckets(
    mesh: &Mesh,
    topo: &Topology,
    options: ComponentOptions,
    face_buckets: &mut FaceBuckets,
    bucket_faces: &mut BucketFaces,
) {
    if options.vertex_connections {
        bucket_faces.resize(topo.vertex_count(), Vec::new());
        for (fi, face) in mesh.faces().iter().enumerate() {
            for c in 0..face.corner_count() {
                if let Some(tv) = topo.top_vertex(face.vi[c]) {
                    push_bucket(face_buckets, bucket_faces, fi, tv);
                }
            }
        }
    } else {
        bucket_faces.resize(topo.edge_count(), Vec::new());
        for fi in 0..mesh.face_count() {
            let tf = match topo.face(fi) {
                Some(tf) => tf,
                None => continue,
            };
            let sides = if mesh.faces()[fi].is_triangle() { 3 } else { 4 };
            for s in 0..sides {
                let e = tf.edges[s];
                if e != NO_EDGE {
                    push_bucket(face_buckets, bucket_faces, fi, e);
                }
            }
        }
    }
}

/// Buckets under strict index welding: mesh vertices, or canonical mesh
/// vertex pairs for edge connectivity.
fn fill_strict_buckets(
    mesh: &Mesh,
    options: ComponentOptions,
    face_buckets: &mut FaceBuckets,
    bucket_faces: &mut BucketFaces,
) {
    if options.vertex_connections {
        bucket_faces.resize(mesh.vertex_count(), Vec::new());
        for (fi, face) in mesh.faces().iter().enumerate() {
            for c in 0..face.corner_count() {
                push_bucket(face_buckets, bucket_faces, fi, face.vi[c]);
            }
        }
    } else {
        let mut edge_ids: HashMap<(usize, usize), usize> = HashMap::new();
        for (fi, face) in mesh.faces().iter().enumerate() {
            for s in 0..face.corner_count() {
                let (a, b) = face.side(s);
                if a == b {
                    continue;
                }
                let key = (a.min(b), a.max(b));
                let next = bucket_faces.len();
                let bucket = *edge_ids.entry(key).or_insert(next);
                if bucket == next {
                    bucket_faces.push(Vec::new());
                }
                push_bucket(face_buckets, bucket_faces, fi, bucket);
            }
        }
    }
}

fn push_bucket(
    face_buckets: &mut FaceBuckets,
    bucket_faces: &mut BucketFaces,
    fi: usize,
    bucket: usize,
) {
    // A face touching a bucket twice (a quad's repeated topological
    // vertex, say) is recorded once.
    if face_buckets[fi].contains(&bucket) {
        return;
    }
    face_buckets[fi].push(bucket);
    bucket_faces[bucket].push(fi);
}

// ==================== Extraction ====================

fn extract_component(mesh: &Mesh, labels: &[usize], label: usize) -> Mesh {
    let face_ids: Vec<usize> = (0..mesh.face_count())
        .filter(|&fi| labels[fi] == label)
        .collect();

    // First-seen order keeps extraction deterministic. Only vertices the
    // component's faces reference are carried over.
    let mut vmap = vec![usize::MAX; mesh.vertex_count()];
    let mut order: Vec<usize> = Vec::new();
    for &fi in &face_ids {
        for &vi in &mesh.faces()[fi].vi {
            if vmap[vi] == usize::MAX {
                vmap[vi] = order.len();
                order.push(vi);
            }
        }
    }

    // An n-gon travels with the component only when every face and every
    // boundary vertex is inside it; a partial n-gon is dropped, not
    // truncated.
    let ngon_ids: Vec<usize> = mesh
        .ngons()
        .iter()
        .enumerate()
        .filter(|(_, ngon)| {
            ngon.fi.iter().all(|&fi| labels[fi] == label)
                && ngon.vi.iter().all(|&vi| vmap[vi] != usize::MAX)
        })
        .map(|(ni, _)| ni)
        .collect();

    let gather_points = |src: &[nalgebra::Point3<f64>]| -> Vec<nalgebra::Point3<f64>> {
        order.iter().map(|&vi| src[vi]).collect()
    };
    let vertices = gather_points(mesh.vertices());
    let normals = if mesh.has_normals() {
        order.iter().map(|&vi| mesh.normals()[vi]).collect()
    } else {
        Vec::new()
    };
    let texture_coords = if mesh.has_texture_coords() {
        order.iter().map(|&vi| mesh.texture_coords()[vi]).collect()
    } else {
        Vec::new()
    };
    let colors = if mesh.has_colors() {
        order.iter().map(|&vi| mesh.colors()[vi]).collect()
    } else {
        Vec::new()
    };

    let faces: Vec<MeshFace> = face_ids
        .iter()
        .map(|&fi| {
            let mut face = mesh.faces()[fi];
            for vi in &mut face.vi {
                *vi = vmap[*vi];
            }
            face
        })
        .collect();
    let face_normals = if mesh.face_normals().is_empty() {
        Vec::new()
    } else {
        face_ids.iter().map(|&fi| mesh.face_normals()[fi]).collect()
    };

    // face_ids is sorted, so positions double as the new numbering.
    let ngons: Vec<Ngon> = ngon_ids
        .iter()
        .map(|&ni| {
            let ngon = &mesh.ngons()[ni];
            let vi = ngon.vi.iter().map(|&v| vmap[v]).collect();
            let fi = ngon
                .fi
                .iter()
                .filter_map(|f| face_ids.binary_search(f).ok())
                .collect();
            Ngon::new(vi, fi)
        })
        .collect();

    let mut piece = Mesh::new();
    piece.vertices = vertices;
    piece.normals = normals;
    piece.texture_coords = texture_coords;
    piece.colors = colors;
    piece.faces = faces;
    piece.face_normals = face_normals;
    piece.ngons = ngons;
    piece
}
