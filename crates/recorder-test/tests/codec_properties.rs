//! Property tests: a record written through the insert path and read back
//! through a query comes back unchanged.

use std::sync::Arc;

use proptest::prelude::*;
use recorder_common::Value;
use recorder_schema::{ForeignKey, Opaque, PrimaryKey};
use recorder_test::fixtures::{recorder, Sample, Team, Token};
use recorder_test::MockDatabase;

fn sample_strategy() -> impl Strategy<Value = Sample> {
    (
        (
            any::<i64>(),
            any::<bool>(),
            any::<i8>(),
            any::<i16>(),
            any::<i32>(),
            any::<i64>(),
        ),
        (
            -1.0e6f32..1.0e6f32,
            -1.0e12f64..1.0e12f64,
            "[a-zA-Z0-9 ]{0,24}",
            proptest::option::of(any::<i32>()),
            proptest::option::of("[a-z]{0,8}"),
            any::<i32>(),
            any::<u64>(),
        ),
    )
        .prop_map(
            |(
                (id, flag, tiny, small, count, large),
                (ratio, score, label, maybe_count, maybe_label, team, token),
            )| Sample {
                id: PrimaryKey::of(id),
                flag,
                tiny,
                small,
                count,
                large,
                ratio,
                score,
                label,
                maybe_count,
                maybe_label,
                team: ForeignKey::<Team>::new(team),
                token: Opaque::new(Token(token)),
            },
        )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_insert_then_select_round_trips(sample in sample_strategy()) {
        let db = MockDatabase::new();
        let recorder = recorder(&db);

        recorder.insert(&sample).unwrap();
        let written = db.last_statement().unwrap();
        // The key is caller-assigned, so every column is written
        prop_assert_eq!(written.parameters.len(), 13);
        prop_assert_eq!(written.parameters.get(&1), Some(&Value::Long(*sample.id.get().unwrap())));

        db.push_result(vec![written.parameter_values()]);
        let mut worker = recorder.worker();
        let read = worker.select::<Sample>().unwrap().all().unwrap();

        prop_assert_eq!(read.len(), 1);
        prop_assert_eq!(&read[0], &sample);
        prop_assert!(Arc::ptr_eq(&read[0].token.0, &sample.token.0));
        prop_assert!(db.counts().is_balanced());
    }

    #[test]
    fn prop_null_options_bind_as_null(count in any::<i32>(), label in "[a-z]{1,8}") {
        let db = MockDatabase::new();
        let recorder = recorder(&db);
        let sample = Sample {
            id: PrimaryKey::of(1),
            flag: false,
            tiny: 0,
            small: 0,
            count,
            large: 0,
            ratio: 0.0,
            score: 0.0,
            label,
            maybe_count: None,
            maybe_label: None,
            team: ForeignKey::<Team>::new(1),
            token: Opaque::new(Token(0)),
        };

        recorder.insert(&sample).unwrap();
        let written = db.last_statement().unwrap();
        prop_assert_eq!(written.parameters.get(&10), Some(&Value::Null));
        prop_assert_eq!(written.parameters.get(&11), Some(&Value::Null));
        prop_assert_eq!(written.parameters.get(&5), Some(&Value::Int(count)));
    }
}
