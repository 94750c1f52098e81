use std::{collections::BTreeSet, path::PathBuf};

use criterion::{criterion_group, criterion_main, Criterion};
use owners_rs::{lowest_cost_owner, CandidateMap, Database, MemoryRepo, Owner, SelectionStrategy};

const TOP_DIRS: usize = 20;
const SUB_DIRS: usize = 10;
const FILES_PER_DIR: usize = 5;

fn build_repo() -> MemoryRepo {
    let mut repo = MemoryRepo::new();
    repo.insert("/OWNERS", "# everything\nroot@example.com\n");
    for i in 0..TOP_DIRS {
        repo.insert(
            format!("/dir-{i}/OWNERS"),
            format!("lead-{i}@example.com\nper-file *.gn=build@example.com\n"),
        );
        repo.insert(format!("/dir-{i}/BUILD.gn"), "");
        for j in 0..SUB_DIRS {
            repo.insert(
                format!("/dir-{i}/sub-{j}/OWNERS"),
                format!("dev-{i}-{j}@example.com\ndev-{i}-{}@example.com\n", (j + 1) % SUB_DIRS),
            );
            for k in 0..FILES_PER_DIR {
                repo.insert(format!("/dir-{i}/sub-{j}/file-{k}.rs"), "");
            }
        }
    }
    repo
}

fn changed_files() -> Vec<String> {
    let mut files = Vec::new();
    for i in (0..TOP_DIRS).step_by(3) {
        files.push(format!("dir-{i}/BUILD.gn"));
        for j in (0..SUB_DIRS).step_by(2) {
            files.push(format!("dir-{i}/sub-{j}/file-{}.rs", j % FILES_PER_DIR));
        }
    }
    files
}

fn build_candidates() -> (CandidateMap, BTreeSet<PathBuf>) {
    let mut candidates = CandidateMap::new();
    let mut dirs = BTreeSet::new();
    for i in 0..TOP_DIRS {
        for j in 0..SUB_DIRS {
            let dir = PathBuf::from(format!("dir-{i}/sub-{j}"));
            let dev = Owner::parse(&format!("dev-{i}-{j}@example.com")).unwrap();
            let lead = Owner::parse(&format!("lead-{i}@example.com")).unwrap();
            candidates.insert(dev, &dir, 1);
            candidates.insert(lead, &dir, 2);
            dirs.insert(dir);
        }
    }
    (candidates, dirs)
}

fn reviewers_benchmark(c: &mut Criterion) {
    let repo = build_repo();
    let files = changed_files();

    c.bench_function("reviewers_for", |b| {
        b.iter(|| {
            let mut db = Database::new("/", &repo);
            db.reviewers_for(&files, Some("root@example.com")).unwrap()
        })
    });

    let mut warm = Database::new("/", &repo);
    warm.reviewers_for(&files, None).unwrap();
    c.bench_function("reviewers_for_cached", |b| {
        b.iter(|| warm.reviewers_for(&files, None).unwrap())
    });

    c.bench_function("reviewer_set_for", |b| {
        b.iter(|| {
            let mut db = Database::new("/", &repo);
            db.reviewer_set_for(&files, "root@example.com").unwrap()
        })
    });

    let (candidates, dirs) = build_candidates();
    for (name, strategy) in [
        ("lowest_cost_owner_scaled", SelectionStrategy::default()),
        ("lowest_cost_owner_coverage_first", SelectionStrategy::CoverageFirst),
    ] {
        c.bench_function(name, |b| {
            b.iter(|| lowest_cost_owner(&candidates, &dirs, strategy))
        });
    }
}

criterion_group!(benches, reviewers_benchmark);
criterion_main!(benches);
