use criterion::{black_box, criterion_group, criterion_main, Criterion};
use geocluster::Supercluster;

type Point = (f64, f64);

fn get_x(p: &Point) -> Option<f64> {
    Some(p.0)
}

fn get_y(p: &Point) -> Option<f64> {
    Some(p.1)
}

fn create_points(n: usize) -> Vec<Point> {
    (0..n)
        .map(|i| {
            let lon = (i % 360) as f64 - 180.0;
            let lat = ((i / 360) % 180) as f64 - 90.0;
            (lon, lat)
        })
        .collect()
}

fn bench_supercluster(c: &mut Criterion) {
    env_logger::init();

    let points = create_points(5_000);

    let options = Supercluster::<Point>::builder()
        .radius(40.0)
        .extent(512.0)
        .min_points(2)
        .max_zoom(16)
        .build();

    let mut cluster = Supercluster::new(options);

    c.bench_function("load point set", |b| {
        b.iter(|| {
            let _ = cluster.load(black_box(points.clone()), get_x, get_y);
        })
    });

    cluster.load(points, get_x, get_y).unwrap();

    c.bench_function("get clusters and points", |b| {
        b.iter(|| {
            let _ = cluster.get_clusters_and_points(
                black_box(-10.0),
                black_box(-10.0),
                black_box(10.0),
                black_box(10.0),
                black_box(4.0),
            );
        })
    });

    let root_id = cluster.trees[&0]
        .nodes
        .iter()
        .find_map(|n| n.cluster_id())
        .expect("expected at least one cluster at zoom 0 for this point density");

    c.bench_function("get children", |b| {
        b.iter(|| {
            let _ = cluster.get_children(black_box(root_id));
        })
    });
}

criterion_group!(benches, bench_supercluster);
criterion_main!(benches);
