use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;

use job_overlap::algorithms::{count_overlaps, DelaySearch, JobSet};
use job_overlap::models::{ExecutionWindow, Job};

/// `count` windows of `duration` seconds, one every `period` seconds.
fn windows(count: usize, period: f64, duration: f64, offset: f64) -> Vec<ExecutionWindow> {
    (0..count)
        .map(|i| {
            let start = offset + i as f64 * period;
            ExecutionWindow::new(start, start + duration)
        })
        .collect()
}

fn bench_count_overlaps(c: &mut Criterion) {
    let mut group = c.benchmark_group("count_overlaps");

    for &size in &[100usize, 1_000, 5_000] {
        let own = windows(size, 3600.0, 60.0, 0.0);
        let competitors = windows(size, 1800.0, 120.0, 30.0);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| count_overlaps(black_box(&own), black_box(10), black_box(&competitors)));
        });
    }

    group.finish();
}

fn bench_worker_counts(c: &mut Criterion) {
    let mut group = c.benchmark_group("search_workers");

    let own = windows(500, 3600.0, 60.0, 0.0);
    let competitors = windows(2_000, 900.0, 45.0, 10.0);

    for &workers in &[1usize, 2, 4, 8] {
        let search = match DelaySearch::with_workers(workers) {
            Ok(search) => search,
            Err(_) => continue,
        };
        group.bench_with_input(BenchmarkId::from_parameter(workers), &workers, |b, _| {
            b.iter(|| search.search(black_box(&own), 3600, 60, black_box(&competitors)));
        });
    }

    group.finish();
}

fn bench_job_set_pass(c: &mut Criterion) {
    let mut group = c.benchmark_group("job_set_pass");
    group.sample_size(10);

    let jobs: Vec<Job> = (0..20)
        .map(|i| {
            Job::new(
                format!("job-{}", i),
                format!("Job {}", i),
                3600,
                120,
                windows(48, 3600.0, 120.0, (i * 37) as f64),
            )
        })
        .collect();

    group.bench_function("20_jobs", |b| {
        let search = DelaySearch::new();
        b.iter(|| {
            let mut set = JobSet::new(jobs.clone()).unwrap();
            black_box(set.run(&search).unwrap());
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_count_overlaps,
    bench_worker_counts,
    bench_job_set_pass
);
criterion_main!(benches);
