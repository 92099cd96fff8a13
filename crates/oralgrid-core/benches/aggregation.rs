use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

use oralgrid_core::catalog::Catalog;
use oralgrid_core::export::{export_json, ExportLayout, ExportOptions};
use oralgrid_core::model::{Evaluation, Response, Responses, Status};
use oralgrid_core::statistics::{aggregate_all, SubjectFilter};

fn make_evaluations(catalog: &Catalog, count: usize) -> Vec<Evaluation> {
    (0..count)
        .map(|i| {
            let responses: Responses = catalog
                .criteria()
                .enumerate()
                .map(|(j, c)| {
                    let status = if (i + j) % 3 == 0 {
                        Status::Unsatisfied
                    } else {
                        Status::Satisfied
                    };
                    let remark = if j % 5 == 0 { "à revoir" } else { "" };
                    (c.key(), Response::new(status).with_remark(remark))
                })
                .collect();
            Evaluation {
                timestamp: Utc::now(),
                evaluator: format!("évaluateur {}", i % 4),
                subject: format!("étudiant {}", i % 25),
                responses,
            }
        })
        .collect()
}

fn bench_aggregate(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate_all");
    let catalog = Catalog::builtin();

    for count in [10, 100, 500] {
        let evals = make_evaluations(&catalog, count);
        group.bench_function(format!("n={count}"), |b| {
            b.iter(|| aggregate_all(black_box(&evals), &catalog, &SubjectFilter::All))
        });
    }

    let evals = make_evaluations(&catalog, 500);
    let filter = SubjectFilter::Subject("étudiant 7".into());
    group.bench_function("n=500,filtered", |b| {
        b.iter(|| aggregate_all(black_box(&evals), &catalog, black_box(&filter)))
    });

    group.finish();
}

fn bench_export(c: &mut Criterion) {
    let mut group = c.benchmark_group("export_json");
    let catalog = Catalog::builtin();
    let evals = make_evaluations(&catalog, 200);

    group.bench_function("structured", |b| {
        b.iter(|| export_json(black_box(&evals), &catalog, ExportOptions::default()))
    });

    group.bench_function("legacy,ascii_only", |b| {
        let options = ExportOptions {
            layout: ExportLayout::Legacy,
            ascii_only: true,
        };
        b.iter(|| export_json(black_box(&evals), &catalog, options))
    });

    group.finish();
}

criterion_group!(benches, bench_aggregate, bench_export);
criterion_main!(benches);
