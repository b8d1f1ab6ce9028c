//! Benchmarks for topology construction and local surgery.

use criterion::{criterion_group, criterion_main, Criterion};
use nalgebra::Point3;
use trabec::prelude::*;

fn create_grid_mesh(n: usize) -> Mesh {
    let mut vertices = Vec::with_capacity((n + 1) * (n + 1));
    let mut faces = Vec::with_capacity(n * n * 2);

    // Create grid vertices
    for j in 0..=n {
        for i in 0..=n {
            vertices.push(Point3::new(i as f64, j as f64, 0.0));
        }
    }

    // Create triangles
    for j in 0..n {
        for i in 0..n {
            let v00 = j * (n + 1) + i;
            let v10 = v00 + 1;
            let v01 = v00 + (n + 1);
            let v11 = v01 + 1;

            faces.push([v00, v10, v11]);
            faces.push([v00, v11, v01]);
        }
    }

    Mesh::from_triangles(&vertices, &faces).unwrap()
}

fn bench_topology_build(c: &mut Criterion) {
    let base = create_grid_mesh(50);

    c.bench_function("topology_build_50x50", |b| {
        b.iter(|| {
            let mut mesh = base.clone();
            let topo = mesh.topology();
            topo.edge_count()
        });
    });
}

fn bench_edge_swap(c: &mut Criterion) {
    let mut base = create_grid_mesh(20);
    let interior: Vec<usize> = {
        let topo = base.topology();
        topo.edge_ids()
            .filter(|&e| topo.edge_face_count(e) == 2)
            .collect()
    };

    c.bench_function("swap_every_interior_edge_20x20", |b| {
        b.iter(|| {
            let mut mesh = base.clone();
            let mut swapped = 0;
            for &e in &interior {
                if swap_edge(&mut mesh, e) {
                    swapped += 1;
                }
            }
            swapped
        });
    });
}

fn bench_edge_collapse(c: &mut Criterion) {
    let base = create_grid_mesh(20);

    c.bench_function("collapse_sweep_20x20", |b| {
        b.iter(|| {
            let mut mesh = base.clone();
            // Collapse edge 0 of the rebuilt topology until nothing is
            // left to collapse.
            let mut collapsed = 0;
            while mesh.face_count() > 0 && collapse_edge(&mut mesh, 0) {
                collapsed += 1;
            }
            collapsed
        });
    });
}

fn bench_components(c: &mut Criterion) {
    let base = create_grid_mesh(50);

    c.bench_function("label_components_50x50", |b| {
        b.iter(|| {
            let mut mesh = base.clone();
            let (_, count) = label_components(&mut mesh, ComponentOptions::default());
            count
        });
    });

    c.bench_function("label_components_strict_50x50", |b| {
        let options = ComponentOptions::default().with_topological(false);
        b.iter(|| {
            let mut mesh = base.clone();
            let (_, count) = label_components(&mut mesh, options);
            count
        });
    });
}

criterion_group!(
    benches,
    bench_topology_build,
    bench_edge_swap,
    bench_edge_collapse,
    bench_components
);
criterion_main!(benches);
