use chicane::model::{Constructor, Driver, Lap, LapTiming, RaceResult, Timeline};
use chicane::standings::project_standings;
use chicane::timeline::{PAGE_SIZE, merge_pages};
use criterion::{Criterion, black_box, criterion_group, criterion_main};

fn build_timeline(total_laps: u32, drivers: usize) -> Timeline {
    (1..=total_laps)
        .map(|number| Lap {
            number,
            timings: (0..drivers)
                .map(|i| LapTiming {
                    driver_id: format!("driver{:02}", i),
                    position: i as u32 + 1,
                    time: format!("1:{:02}.{:03}", 31 + i % 25, number),
                })
                .collect(),
        })
        .collect()
}

fn build_results(drivers: usize) -> Vec<RaceResult> {
    (0..drivers)
        .map(|i| RaceResult {
            position: i as u32 + 1,
            driver: Driver {
                driver_id: format!("driver{:02}", i),
                code: format!("D{:02}", i),
                given_name: String::new(),
                family_name: format!("driver{:02}", i),
                nationality: String::new(),
            },
            constructor: Constructor {
                constructor_id: format!("team{}", i / 2),
                name: format!("Team {}", i / 2),
                nationality: String::new(),
            },
            grid: (drivers - i) as u32,
            laps: 57,
            status: "Finished".to_string(),
            fastest_lap: None,
        })
        .collect()
}

/// Row-paginate a full race the way the upstream API does.
fn paginate(timeline: &Timeline, limit: usize) -> Vec<Vec<Lap>> {
    let rows: Vec<(u32, LapTiming)> = timeline
        .iter()
        .flat_map(|lap| lap.timings.iter().map(|t| (lap.number, t.clone())))
        .collect();
    rows.chunks(limit)
        .map(|chunk| {
            let mut laps: Vec<Lap> = Vec::new();
            for (number, timing) in chunk {
                match laps.last_mut() {
                    Some(lap) if lap.number == *number => lap.timings.push(timing.clone()),
                    _ => laps.push(Lap {
                        number: *number,
                        timings: vec![timing.clone()],
                    }),
                }
            }
            laps
        })
        .collect()
}

fn bench_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconciliation");

    let timeline = build_timeline(57, 20);
    let pages = paginate(&timeline, PAGE_SIZE);

    group.bench_function("merge_full_race", |b| {
        b.iter(|| black_box(merge_pages(pages.clone())));
    });

    group.finish();
}

fn bench_projection(c: &mut Criterion) {
    let mut group = c.benchmark_group("standings");

    let timeline = build_timeline(57, 20);
    let results = build_results(20);

    group.bench_function("project_mid_race", |b| {
        b.iter(|| black_box(project_standings(&results, &timeline, 30)));
    });

    group.bench_function("project_grid", |b| {
        b.iter(|| black_box(project_standings(&results, &timeline, 0)));
    });

    group.finish();
}

criterion_group!(benches, bench_merge, bench_projection);
criterion_main!(benches);
