//! Benchmark bundle grid operations.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::f64::consts::PI;

use vitaran_map::{BundleGrid, InterpolatedNdtCost, InverseModel, NdtCost, Point2D, Pose2D};

/// Endpoints of a 360-ray scan inside a rectangular room.
fn room_scan(room_width: f64, room_height: f64, robot: Point2D, num_rays: usize) -> Vec<Point2D> {
    let mut endpoints = Vec::with_capacity(num_rays);
    for i in 0..num_rays {
        let angle = i as f64 * 2.0 * PI / num_rays as f64 - PI;
        let cos_a = angle.cos();
        let sin_a = angle.sin();

        let mut range = f64::MAX;
        if cos_a > 0.0 {
            range = range.min((room_width - robot.x) / cos_a);
        } else if cos_a < 0.0 {
            range = range.min(-robot.x / cos_a);
        }
        if sin_a > 0.0 {
            range = range.min((room_height - robot.y) / sin_a);
        } else if sin_a < 0.0 {
            range = range.min(-robot.y / sin_a);
        }

        endpoints.push(Point2D::new(
            robot.x + range * cos_a,
            robot.y + range * sin_a,
        ));
    }
    endpoints
}

fn bench_ray_integration(c: &mut Criterion) {
    let robot = Point2D::new(2.0, 1.5);
    let endpoints = room_scan(6.0, 4.0, robot, 360);

    c.bench_function("integrate_360_ray_scan", |b| {
        b.iter(|| {
            let map = BundleGrid::new(Pose2D::identity(), 0.5);
            for &end in &endpoints {
                map.add(black_box(robot), black_box(end));
            }
            map
        })
    });
}

fn bench_sampling(c: &mut Criterion) {
    let robot = Point2D::new(2.0, 1.5);
    let map = BundleGrid::new(Pose2D::identity(), 0.5);
    for _ in 0..5 {
        for &end in &room_scan(6.0, 4.0, robot, 360) {
            map.add(robot, end);
        }
    }
    let model = InverseModel::default();

    c.bench_function("sample_non_normalized", |b| {
        b.iter(|| {
            let mut sum = 0.0;
            for i in 0..100 {
                let p = Point2D::new(6.0 * (i as f64 / 100.0), 1.5);
                sum += map.sample_non_normalized(black_box(p), &model);
            }
            sum
        })
    });
}

fn bench_cost_evaluation(c: &mut Criterion) {
    let robot = Point2D::new(2.0, 1.5);
    let map = BundleGrid::new(Pose2D::identity(), 0.5);
    for _ in 0..5 {
        for &end in &room_scan(6.0, 4.0, robot, 360) {
            map.add(robot, end);
        }
    }
    let model = InverseModel::default();

    c.bench_function("direct_cost", |b| {
        let cost = NdtCost::new(&map, &model);
        b.iter(|| {
            let mut sum = 0.0;
            for i in 0..100 {
                let q = [6.0 * (i as f64 / 100.0), 0.05];
                sum += cost.evaluate(black_box(&q));
            }
            sum
        })
    });

    c.bench_function("interpolated_cost", |b| {
        let cost = InterpolatedNdtCost::new(&map, &model, 0.125);
        b.iter(|| {
            let mut sum = 0.0;
            for i in 0..100 {
                let q = [6.0 * (i as f64 / 100.0), 0.05];
                sum += cost.evaluate(black_box(&q));
            }
            sum
        })
    });
}

criterion_group!(
    benches,
    bench_ray_integration,
    bench_sampling,
    bench_cost_evaluation
);
criterion_main!(benches);
