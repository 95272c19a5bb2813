//! The computed column engine.
//!
//! Registered computed columns form a DAG keyed by column name. The engine
//! keeps them in topological order and, for each update batch, re-evaluates
//! only the computed columns whose inputs changed, and only on the rows where
//! they changed. Results are written back through the batch's transaction, so
//! downstream computed columns see them within the same batch.

use crate::combiner::{self, Combiner};
use crate::definition::{ComputedColumnDef, ComputedColumnInfo};
use hashbrown::{HashMap, HashSet};
use log::{debug, trace};
use pivotal_core::schema::Column;
use pivotal_core::{ColumnId, Epoch, Error, Result, RowIndex, Value};
use pivotal_storage::{ColumnStore, Transaction};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// A computed column bound to store column ids.
#[derive(Clone)]
struct BoundColumn {
    def: ComputedColumnDef,
    combiner: Arc<dyn Combiner>,
    column: ColumnId,
    inputs: Vec<ColumnId>,
    input_type: Option<pivotal_core::DataType>,
}

/// Maintains every computed column of one table.
#[derive(Clone, Default)]
pub struct ComputedEngine {
    /// In topological order.
    columns: Vec<BoundColumn>,
    by_column: HashMap<ColumnId, usize>,
}

impl ComputedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Returns true if `column` is a computed column.
    pub fn is_computed(&self, column: ColumnId) -> bool {
        self.by_column.contains_key(&column)
    }

    /// Computed column names in evaluation order.
    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.def.column.as_str()).collect()
    }

    /// Registers a batch of definitions and fills them over every row.
    ///
    /// Definitions in one batch may reference each other in any order. The
    /// batch is validated completely before the store is touched; on any
    /// failure the store and engine are left as they were.
    pub fn register(
        &mut self,
        store: &mut ColumnStore,
        defs: Vec<ComputedColumnDef>,
        epoch: Epoch,
    ) -> Result<()> {
        let ordered = self.plan(store, defs)?;

        let first_new = store.schema().len();
        let mut bound = Vec::with_capacity(ordered.len());
        for (def, combiner) in ordered {
            let column = match store.add_column(Column::computed(def.column.clone(), def.data_type)) {
                Ok(column) => column,
                Err(e) => {
                    Self::drop_columns(store, first_new);
                    return Err(e);
                }
            };
            let inputs: Vec<ColumnId> = def
                .inputs
                .iter()
                .filter_map(|name| store.schema().get_column_index(name))
                .collect();
            let input_type = def
                .input_type
                .or_else(|| inputs.first().and_then(|&c| store.schema().column(c)).map(|c| c.data_type()));
            bound.push(BoundColumn {
                def,
                combiner,
                column,
                inputs,
                input_type,
            });
        }

        let mut tx = Transaction::backfill(store, epoch);
        let rows: Vec<RowIndex> = (0..tx.store().len()).collect();
        for column in &bound {
            if let Err(e) = evaluate_rows(&mut tx, column, &rows) {
                tx.rollback()?;
                Self::drop_columns(store, first_new);
                return Err(e);
            }
        }
        tx.commit()?;

        for column in bound {
            debug!(
                "registered computed column {} ({} inputs) over {} rows",
                column.def.column,
                column.inputs.len(),
                rows.len()
            );
            self.by_column.insert(column.column, self.columns.len());
            self.columns.push(column);
        }
        Ok(())
    }

    fn drop_columns(store: &mut ColumnStore, len: usize) {
        while store.schema().len() > len {
            if store.pop_column().is_none() {
                break;
            }
        }
    }

    /// Validates a batch and returns it in topological order.
    fn plan(
        &self,
        store: &ColumnStore,
        defs: Vec<ComputedColumnDef>,
    ) -> Result<Vec<(ComputedColumnDef, Arc<dyn Combiner>)>> {
        let schema = store.schema();
        let mut batch: HashMap<String, usize> = HashMap::new();
        for (i, def) in defs.iter().enumerate() {
            if schema.get_column(&def.column).is_some() || batch.insert(def.column.clone(), i).is_some() {
                return Err(Error::duplicate_column(schema.name(), def.column.as_str()));
            }
        }

        let mut combiners = Vec::with_capacity(defs.len());
        for def in &defs {
            let combiner = def.combiner()?;
            if def.inputs.len() > 2 || combiner.arity() != def.inputs.len() {
                return Err(Error::arity_mismatch(
                    def.column.as_str(),
                    combiner.arity(),
                    def.inputs.len(),
                ));
            }
            for input in &def.inputs {
                if schema.get_column(input).is_none() && !batch.contains_key(input) {
                    return Err(Error::column_not_found(schema.name(), input.as_str()));
                }
            }
            combiners.push(combiner);
        }

        let order = topological_order(&defs, &batch)?;
        let mut slots: Vec<Option<(ComputedColumnDef, Arc<dyn Combiner>)>> =
            defs.into_iter().zip(combiners).map(Some).collect();
        Ok(order.into_iter().filter_map(|i| slots[i].take()).collect())
    }

    /// Re-evaluates computed columns affected by the batch so far.
    pub fn on_update(&self, tx: &mut Transaction<'_>) -> Result<()> {
        for column in &self.columns {
            let rows = if column.inputs.is_empty() {
                tx.changes().inserted_rows()
            } else {
                tx.changes().rows_touching(&column.inputs)
            };
            if rows.is_empty() {
                continue;
            }
            trace!(
                "re-evaluating computed column {} on {} rows",
                column.def.column,
                rows.len()
            );
            evaluate_rows(tx, column, &rows)?;
        }
        Ok(())
    }

    /// Introspection records keyed by column name.
    pub fn describe(&self) -> BTreeMap<String, ComputedColumnInfo> {
        self.columns
            .iter()
            .map(|c| {
                (
                    c.def.column.clone(),
                    ComputedColumnInfo {
                        input_columns: c.def.inputs.clone(),
                        input_type: c.input_type,
                        computation: c.def.computation.clone(),
                        data_type: c.def.data_type,
                    },
                )
            })
            .collect()
    }

    /// `columns` plus every column they transitively derive from.
    pub fn upstream(&self, columns: &[ColumnId]) -> BTreeSet<ColumnId> {
        let mut seen: BTreeSet<ColumnId> = BTreeSet::new();
        let mut stack: Vec<ColumnId> = columns.to_vec();
        while let Some(column) = stack.pop() {
            if !seen.insert(column) {
                continue;
            }
            if let Some(&i) = self.by_column.get(&column) {
                stack.extend(self.columns[i].inputs.iter().copied());
            }
        }
        seen
    }
}

fn evaluate_rows(tx: &mut Transaction<'_>, column: &BoundColumn, rows: &[RowIndex]) -> Result<()> {
    let mut inputs: Vec<Value> = Vec::with_capacity(column.inputs.len());
    for &row in rows {
        inputs.clear();
        inputs.extend(column.inputs.iter().map(|&c| tx.store().get(c, row)));
        let value = combiner::apply(column.combiner.as_ref(), &inputs);
        tx.write_cell(column.column, row, value)?;
    }
    Ok(())
}

/// Orders batch definitions so every definition follows the batch
/// definitions it reads. Fails on a cycle.
fn topological_order(defs: &[ComputedColumnDef], batch: &HashMap<String, usize>) -> Result<Vec<usize>> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Unvisited,
        Visiting,
        Done,
    }

    fn visit(
        i: usize,
        defs: &[ComputedColumnDef],
        batch: &HashMap<String, usize>,
        marks: &mut [Mark],
        order: &mut Vec<usize>,
    ) -> Result<()> {
        match marks[i] {
            Mark::Done => return Ok(()),
            Mark::Visiting => return Err(Error::dependency_cycle(defs[i].column.as_str())),
            Mark::Unvisited => {}
        }
        marks[i] = Mark::Visiting;
        let mut deps: HashSet<usize> = HashSet::new();
        for input in &defs[i].inputs {
            if let Some(&dep) = batch.get(input) {
                if deps.insert(dep) {
                    visit(dep, defs, batch, marks, order)?;
                }
            }
        }
        marks[i] = Mark::Done;
        order.push(i);
        Ok(())
    }

    let mut marks = vec![Mark::Unvisited; defs.len()];
    let mut order = Vec::with_capacity(defs.len());
    for i in 0..defs.len() {
        visit(i, defs, batch, &mut marks, &mut order)?;
    }
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combiner::FnCombiner;
    use pivotal_core::schema::SchemaBuilder;
    use pivotal_core::{DataType, ErrorKind, Payload};

    fn store_with_rows() -> ColumnStore {
        let schema = SchemaBuilder::new("t")
            .add_column("w", DataType::Float64)
            .unwrap()
            .add_column("x", DataType::Int64)
            .unwrap()
            .build()
            .unwrap();
        let mut store = ColumnStore::new(schema);
        let mut tx = Transaction::begin(&mut store, 1);
        for (w, x) in [(1.5, 1i64), (2.5, 2), (3.5, 3), (4.5, 4)] {
            tx.apply_payload(&Payload::new().with("w", w).with("x", x)).unwrap();
        }
        tx.commit().unwrap();
        store
    }

    fn column_values(store: &ColumnStore, name: &str) -> Vec<Value> {
        let id = store.schema().get_column_index(name).unwrap();
        (0..store.len()).map(|r| store.get(id, r)).collect()
    }

    #[test]
    fn test_constant_column() {
        let mut store = store_with_rows();
        let mut engine = ComputedEngine::new();
        engine
            .register(
                &mut store,
                vec![ComputedColumnDef::new("const", DataType::Int64, Vec::<String>::new())
                    .with_func(FnCombiner::constant(1i64))],
                2,
            )
            .unwrap();

        assert_eq!(column_values(&store, "const"), vec![Value::Int64(1); 4]);
        // Registration does not restamp rows.
        assert_eq!(store.row_epoch(0), 1);
    }

    #[test]
    fn test_ratio_column() {
        let mut store = store_with_rows();
        let mut engine = ComputedEngine::new();
        engine
            .register(
                &mut store,
                vec![ComputedColumnDef::new("ratio", DataType::Float64, ["w", "x"])
                    .with_func_name("/")],
                2,
            )
            .unwrap();

        assert_eq!(
            column_values(&store, "ratio"),
            vec![
                Value::Float64(1.5),
                Value::Float64(1.25),
                Value::Float64(3.5 / 3.0),
                Value::Float64(1.125),
            ]
        );
    }

    #[test]
    fn test_self_combination() {
        let mut store = store_with_rows();
        let mut engine = ComputedEngine::new();
        engine
            .register(
                &mut store,
                vec![ComputedColumnDef::new("sum", DataType::Float64, ["x", "x"]).with_func_name("+")],
                2,
            )
            .unwrap();
        assert_eq!(
            column_values(&store, "sum"),
            vec![
                Value::Float64(2.0),
                Value::Float64(4.0),
                Value::Float64(6.0),
                Value::Float64(8.0),
            ]
        );
    }

    #[test]
    fn test_batch_in_any_order() {
        let mut store = store_with_rows();
        let mut engine = ComputedEngine::new();
        engine
            .register(
                &mut store,
                vec![
                    ComputedColumnDef::new("b", DataType::Float64, ["a"]).with_func_name("x^2"),
                    ComputedColumnDef::new("a", DataType::Float64, ["w", "x"]).with_func_name("-"),
                ],
                2,
            )
            .unwrap();

        assert_eq!(engine.names(), vec!["a", "b"]);
        assert_eq!(column_values(&store, "b")[0], Value::Float64(0.25));
    }

    #[test]
    fn test_cycle_is_rejected() {
        let mut store = store_with_rows();
        let mut engine = ComputedEngine::new();
        let err = engine
            .register(
                &mut store,
                vec![
                    ComputedColumnDef::new("a", DataType::Float64, ["b"]).with_func_name("abs"),
                    ComputedColumnDef::new("b", DataType::Float64, ["a"]).with_func_name("abs"),
                ],
                2,
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Arity);
        assert_eq!(store.schema().len(), 2);
        assert!(engine.is_empty());
    }

    #[test]
    fn test_self_reference_is_a_cycle() {
        let mut store = store_with_rows();
        let mut engine = ComputedEngine::new();
        let err = engine
            .register(
                &mut store,
                vec![ComputedColumnDef::new("a", DataType::Float64, ["a"]).with_func_name("abs")],
                2,
            )
            .unwrap_err();
        assert_eq!(err, Error::dependency_cycle("a"));
    }

    #[test]
    fn test_arity_mismatch() {
        let mut store = store_with_rows();
        let mut engine = ComputedEngine::new();
        let err = engine
            .register(
                &mut store,
                vec![ComputedColumnDef::new("a", DataType::Float64, ["w"]).with_func_name("+")],
                2,
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Arity);
    }

    #[test]
    fn test_unknown_input() {
        let mut store = store_with_rows();
        let mut engine = ComputedEngine::new();
        let err = engine
            .register(
                &mut store,
                vec![ComputedColumnDef::new("a", DataType::Float64, ["nope"]).with_func_name("abs")],
                2,
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
    }

    #[test]
    fn test_type_error_rolls_back_registration() {
        let mut store = store_with_rows();
        let mut engine = ComputedEngine::new();
        let err = engine
            .register(
                &mut store,
                vec![
                    ComputedColumnDef::new("ok", DataType::Float64, ["w"]).with_func_name("abs"),
                    ComputedColumnDef::new("bad", DataType::Int64, ["w"]).with_func_name("abs"),
                ],
                2,
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Type);
        assert_eq!(store.schema().len(), 2);
        assert!(engine.is_empty());
    }

    #[test]
    fn test_on_update_only_touches_changed_rows() {
        let mut store = store_with_rows();
        let mut engine = ComputedEngine::new();
        engine
            .register(
                &mut store,
                vec![
                    ComputedColumnDef::new("sum", DataType::Float64, ["w", "x"]).with_func_name("+"),
                    ComputedColumnDef::new("twice", DataType::Float64, ["sum", "sum"]).with_func_name("+"),
                ],
                2,
            )
            .unwrap();

        let mut tx = Transaction::begin(&mut store, 3);
        tx.apply_payload(&Payload::new().with("x", 10i64).at(2)).unwrap();
        engine.on_update(&mut tx).unwrap();
        let changes = tx.commit().unwrap();

        assert_eq!(changes.len(), 1);
        assert_eq!(changes.row(2).unwrap().columns().len(), 3);
        assert_eq!(column_values(&store, "twice")[2], Value::Float64(27.0));
        assert_eq!(column_values(&store, "twice")[1], Value::Float64(9.0));
    }

    #[test]
    fn test_constant_stamped_on_insert() {
        let mut store = store_with_rows();
        let mut engine = ComputedEngine::new();
        engine
            .register(
                &mut store,
                vec![ComputedColumnDef::new("one", DataType::Int64, Vec::<String>::new())
                    .with_func(FnCombiner::constant(1i64))],
                2,
            )
            .unwrap();

        let mut tx = Transaction::begin(&mut store, 3);
        tx.apply_payload(&Payload::new().with("x", 5i64)).unwrap();
        engine.on_update(&mut tx).unwrap();
        tx.commit().unwrap();

        assert_eq!(column_values(&store, "one"), vec![Value::Int64(1); 5]);
    }

    #[test]
    fn test_describe_returns_metadata_verbatim() {
        let mut store = store_with_rows();
        let mut engine = ComputedEngine::new();
        let computation = serde_json::json!({"computed_function_name": "+", "input_type": "float"});
        engine
            .register(
                &mut store,
                vec![ComputedColumnDef::new("sum", DataType::Float64, ["w", "x"])
                    .with_func_name("+")
                    .with_computation(computation.clone())],
                2,
            )
            .unwrap();

        let info = &engine.describe()["sum"];
        assert_eq!(info.input_columns, vec!["w".to_string(), "x".to_string()]);
        assert_eq!(info.input_type, Some(DataType::Float64));
        assert_eq!(info.computation, Some(computation));
        assert_eq!(info.data_type, DataType::Float64);
    }

    #[test]
    fn test_upstream() {
        let mut store = store_with_rows();
        let mut engine = ComputedEngine::new();
        engine
            .register(
                &mut store,
                vec![
                    ComputedColumnDef::new("a", DataType::Float64, ["w"]).with_func_name("abs"),
                    ComputedColumnDef::new("b", DataType::Float64, ["a"]).with_func_name("abs"),
                ],
                2,
            )
            .unwrap();
        let b = store.schema().get_column_index("b").unwrap();
        let upstream: Vec<ColumnId> = engine.upstream(&[b]).into_iter().collect();
        assert_eq!(upstream, vec![0, 2, 3]);
    }
}
