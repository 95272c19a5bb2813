//! Property-based tests for computed column re-evaluation.
//!
//! After any sequence of update batches, every computed cell must equal its
//! combining function applied to the row's current inputs.

use pivotal_computed::{ComputedColumnDef, ComputedEngine, ComputedMethod, Combiner};
use pivotal_core::schema::SchemaBuilder;
use pivotal_core::{DataType, Payload, Value};
use pivotal_storage::{ColumnStore, Transaction};
use proptest::prelude::*;

fn cell() -> impl Strategy<Value = Option<i64>> {
    prop_oneof![1 => Just(None), 4 => (-20i64..20).prop_map(Some)]
}

fn payload_strategy() -> impl Strategy<Value = (Option<usize>, Option<i64>, Option<f64>)> {
    (
        prop::option::of(0usize..16),
        cell(),
        prop::option::of((-40i32..40).prop_map(|v| v as f64 / 4.0)),
    )
}

fn expected(method: ComputedMethod, inputs: &[Value]) -> Value {
    if inputs.iter().any(Value::is_null) {
        Value::Null
    } else {
        method.evaluate(inputs)
    }
}

proptest! {
    #[test]
    fn computed_cells_match_fresh_evaluation(
        batches in prop::collection::vec(prop::collection::vec(payload_strategy(), 1..6), 1..6),
    ) {
        let schema = SchemaBuilder::new("t")
            .add_column("i", DataType::Int64)
            .unwrap()
            .add_column("f", DataType::Float64)
            .unwrap()
            .build()
            .unwrap();
        let mut store = ColumnStore::new(schema);
        let mut engine = ComputedEngine::new();
        engine
            .register(
                &mut store,
                vec![
                    ComputedColumnDef::new("prod", DataType::Float64, ["sum", "f"]).with_func_name("*"),
                    ComputedColumnDef::new("sum", DataType::Float64, ["i", "f"]).with_func_name("+"),
                ],
                1,
            )
            .unwrap();
        let sum = store.schema().get_column_index("sum").unwrap();
        let prod = store.schema().get_column_index("prod").unwrap();

        for (n, batch) in batches.into_iter().enumerate() {
            let mut tx = Transaction::begin(&mut store, n as u64 + 2);
            let mut failed = false;
            for (index, i, f) in batch {
                let mut payload = Payload::new().with("i", i).with("f", f);
                if let Some(index) = index {
                    if index < tx.store().len() {
                        payload = payload.at(index);
                    }
                }
                if tx.apply_payload(&payload).is_err() {
                    failed = true;
                    break;
                }
            }
            if failed {
                tx.rollback().unwrap();
                continue;
            }
            engine.on_update(&mut tx).unwrap();
            tx.commit().unwrap();

            for row in 0..store.len() {
                let i = store.get(0, row);
                let f = store.get(1, row);
                let s = expected(ComputedMethod::Add, &[i, f.clone()])
                    .coerce("sum", DataType::Float64)
                    .unwrap();
                let p = expected(ComputedMethod::Multiply, &[s.clone(), f])
                    .coerce("prod", DataType::Float64)
                    .unwrap();
                prop_assert_eq!(store.get(sum, row), s);
                prop_assert_eq!(store.get(prod, row), p);
            }
        }
    }
}
