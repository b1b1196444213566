//! Concurrency tests: shared caches converge, workers stay independent.

use std::sync::{Arc, Barrier};
use std::thread;

use recorder_codec::CodecCache;
use recorder_common::Value;
use recorder_schema::{Record, SchemaCatalog};
use recorder_test::fixtures::{recorder, Member, Sample, Team, User};
use recorder_test::MockDatabase;

const THREADS: usize = 8;

#[test]
fn test_codec_generation_converges() {
    let catalog = Arc::new(SchemaCatalog::new());
    catalog.register::<Sample>().unwrap();
    let codecs = Arc::new(CodecCache::new());
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let catalog = Arc::clone(&catalog);
            let codecs = Arc::clone(&codecs);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                codecs.get::<Sample>(catalog.as_ref()).unwrap()
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let cached = codecs.get::<Sample>(catalog.as_ref()).unwrap();

    for codec in &results {
        assert!(Arc::ptr_eq(codec, &cached));
    }
    assert_eq!(codecs.len(), 1);
    // Generation may race, at most once per caller
    assert!((1..=THREADS as u64).contains(&codecs.generation_count()));
}

#[test]
fn test_table_derivation_converges() {
    let catalog = Arc::new(SchemaCatalog::new());
    catalog.register::<Member>().unwrap();
    let barrier = Arc::new(Barrier::new(THREADS));

    let tables: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|i| {
                let catalog = &catalog;
                let barrier = &barrier;
                scope.spawn(move || {
                    barrier.wait();
                    if i % 2 == 0 {
                        catalog.table_of::<Member>().unwrap()
                    } else {
                        catalog.table_of::<Team>().unwrap()
                    }
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let member = catalog.table_of::<Member>().unwrap();
    let team = catalog.table_of::<Team>().unwrap();
    for (i, table) in tables.iter().enumerate() {
        let expected = if i % 2 == 0 { &member } else { &team };
        assert!(Arc::ptr_eq(table, expected));
    }
    assert_eq!(catalog.tables().len(), 2);
}

#[test]
fn test_workers_query_in_parallel() {
    let db = MockDatabase::new();
    for i in 0..THREADS {
        db.push_result(vec![vec![
            Value::Long(i as i64),
            Value::Text(format!("user{}", i)),
            Value::Int(20 + i as i32),
        ]]);
    }
    let recorder = recorder(&db);
    let barrier = Barrier::new(THREADS);

    let found: Vec<User> = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|i| {
                let recorder = recorder.clone();
                let barrier = &barrier;
                scope.spawn(move || {
                    let mut worker = recorder.worker();
                    barrier.wait();
                    let user = worker
                        .select::<User>()
                        .unwrap()
                        .where_(User::name)
                        .eq(format!("user{}", i))
                        .first()
                        .unwrap();
                    assert_eq!(worker.plans().stats().misses(), 1);
                    user
                })
            })
            .collect();
        handles
            .into_iter()
            .filter_map(|h| h.join().unwrap())
            .collect()
    });

    // Result sets are handed out in arrival order, so only the set matters
    let mut ages: Vec<i32> = found.iter().map(|u| u.age).collect();
    ages.sort_unstable();
    assert_eq!(ages, (0..THREADS as i32).map(|i| 20 + i).collect::<Vec<_>>());

    assert_eq!(db.pending_results(), 0);
    assert!(db.counts().is_balanced());
    assert_eq!(db.counts().connections_opened, THREADS);
    assert_eq!(recorder.codecs().len(), 1);
    assert!(recorder.catalog().is_registered(&User::record_type()));
}
