//! Query dispatcher (spec.md §4 / component table "Query dispatcher"):
//! turns one parsed [`ParsedCommand`] into an executed result, resolving
//! column references against the engine's current database and handle
//! references against the caller's [`ClientContext`].
//!
//! This is the seam the reference's `db_manager.c` occupies: parsing
//! (syntax) is already done by [`crate::parser`]; everything here is
//! semantic resolution and execution. One dispatcher call handles exactly
//! one line of the command language; `batch_queries`/`batch_execute`
//! bracket a run of `select` calls that get queued instead of executed
//! immediately (see [`Batch`]).

use std::sync::Arc;

use crate::client_context::ClientContext;
use crate::config::EngineConfig;
use crate::engine::Engine;
use crate::error::{CsError, CsResult};
use crate::index::Bound;
use crate::model::Table;
use crate::ops;
use crate::parser::{self, ParsedCommand};
use crate::result::ResultValue;

/// Outcome of dispatching one command.
pub enum Dispatched {
    /// Nothing to send back beyond an OK status (`create`, `relational_insert`, `batch_queries`).
    Done,
    /// A result ready to print immediately is returned inline (used by
    /// `print`, whose argument vectors are resolved and handed to the
    /// caller so it can drive the wire protocol).
    Print(Vec<ResultValue>),
    /// `shutdown` was requested; the caller should persist and close.
    Shutdown,
}

/// Accumulates selects between `batch_queries` and `batch_execute`.
#[derive(Default)]
pub struct Batch {
    pending: Vec<crate::batch::PendingSelect>,
    open: bool,
}

impl Batch {
    pub fn is_open(&self) -> bool {
        self.open
    }
}

fn resolve_vector(engine: &Engine, context: &ClientContext, name: &str) -> CsResult<ResultValue> {
    if name.contains('.') {
        let (table, col_idx) = engine.resolve_column(name)?;
        Ok(ResultValue::Int(table.columns[col_idx].data.clone()))
    } else {
        context
            .get(name)
            .ok_or_else(|| CsError::ObjectNotFound(format!("handle '{name}' not bound")))
    }
}

fn resolve_int_vector(engine: &Engine, context: &ClientContext, name: &str) -> CsResult<Vec<i32>> {
    let value = resolve_vector(engine, context, name)?;
    value
        .as_int_slice()
        .map(|s| s.to_vec())
        .ok_or_else(|| CsError::ExecutionError(format!("'{name}' is not an INT vector")))
}

fn column_and_index<'a>(engine: &'a Engine, qualified: &str) -> CsResult<(&'a Table, usize)> {
    engine.resolve_column(qualified)
}

/// Dispatches one already-parsed command against `engine`'s current
/// database and the caller's `context`. `home` is the persistence
/// directory used by `shutdown`.
pub fn dispatch(
    cmd: ParsedCommand,
    engine: &mut Engine,
    context: &ClientContext,
    batch: &mut Batch,
) -> CsResult<Dispatched> {
    match cmd.op.as_str() {
        "create" => dispatch_create(&cmd, engine).map(|_| Dispatched::Done),
        "relational_insert" => dispatch_insert(&cmd, engine).map(|_| Dispatched::Done),
        "load" => dispatch_load(&cmd, engine).map(|_| Dispatched::Done),
        "select" => dispatch_select(&cmd, engine, context, batch).map(|_| Dispatched::Done),
        "fetch" => dispatch_fetch(&cmd, engine, context).map(|_| Dispatched::Done),
        "min" => dispatch_min_max(&cmd, engine, context, true).map(|_| Dispatched::Done),
        "max" => dispatch_min_max(&cmd, engine, context, false).map(|_| Dispatched::Done),
        "sum" => dispatch_sum(&cmd, engine, context).map(|_| Dispatched::Done),
        "avg" => dispatch_avg(&cmd, engine, context).map(|_| Dispatched::Done),
        "add" => dispatch_add_sub(&cmd, engine, context, true).map(|_| Dispatched::Done),
        "sub" => dispatch_add_sub(&cmd, engine, context, false).map(|_| Dispatched::Done),
        "join" => dispatch_join(&cmd, engine, context).map(|_| Dispatched::Done),
        "print" => dispatch_print(&cmd, engine, context),
        "batch_queries" => {
            batch.open = true;
            batch.pending.clear();
            Ok(Dispatched::Done)
        }
        "batch_execute" => {
            batch.open = false;
            let pending = std::mem::take(&mut batch.pending);
            crate::batch::execute_batch(pending, &engine.config, context)?;
            Ok(Dispatched::Done)
        }
        "shutdown" => Ok(Dispatched::Shutdown),
        other => Err(CsError::UnknownCommand(other.to_string())),
    }
}

fn dispatch_create(cmd: &ParsedCommand, engine: &mut Engine) -> CsResult<()> {
    let kind = cmd
        .args
        .first()
        .ok_or_else(|| CsError::IncorrectFormat("create requires a kind argument".to_string()))?
        .as_str();
    match kind {
        "db" => {
            let name = parser::unquote(cmd.args.get(1).map(String::as_str).unwrap_or(""));
            if name.is_empty() {
                return Err(CsError::IncorrectFormat("create(db,...) requires a name".to_string()));
            }
            engine.create_database(name);
            Ok(())
        }
        "tbl" => {
            let name = parser::unquote(cmd.args.get(1).map(String::as_str).unwrap_or(""));
            let col_count: usize = cmd
                .args
                .get(3)
                .ok_or_else(|| CsError::IncorrectFormat("create(tbl,...) requires a column count".to_string()))?
                .parse()
                .map_err(|_| CsError::IncorrectFormat("column count must be an integer".to_string()))?;
            let column_names: Vec<String> = (0..col_count).map(|i| format!("col{i}")).collect();
            engine.create_table(name, &column_names)
        }
        "col" => {
            let name = parser::unquote(cmd.args.get(1).map(String::as_str).unwrap_or(""));
            let table_ref = cmd
                .args
                .get(2)
                .ok_or_else(|| CsError::IncorrectFormat("create(col,...) requires a table".to_string()))?;
            let table = engine.resolve_table_mut(table_ref)?;
            if let Some(col) = table.columns.iter_mut().find(|c| c.name.starts_with("col")) {
                col.name = name.to_string();
                Ok(())
            } else {
                Err(CsError::ObjectNotFound(format!("no free column slot on {table_ref}")))
            }
        }
        "idx" => {
            let col_ref = cmd
                .args
                .get(1)
                .ok_or_else(|| CsError::IncorrectFormat("create(idx,...) requires a column".to_string()))?;
            let kind = cmd.args.get(2).map(String::as_str).unwrap_or("btree");
            let use_btree = kind == "btree";
            let max_node_keys = engine.config.max_node_keys;
            let (table_ref, col_name) = col_ref
                .rsplit_once('.')
                .ok_or_else(|| CsError::IncorrectFormat(format!("malformed column reference: {col_ref}")))?;
            let table = engine.resolve_table_mut(table_ref)?;
            let col_idx = table
                .column_index(col_name)
                .ok_or_else(|| CsError::ObjectNotFound(col_ref.clone()))?;
            let clustering = cmd.args.get(3).map(String::as_str) == Some("clustered");
            if clustering {
                table.set_clustering_column(col_idx, max_node_keys, use_btree);
            } else {
                table.create_secondary_index(col_idx, max_node_keys, use_btree);
            }
            Ok(())
        }
        other => Err(CsError::IncorrectFormat(format!("unknown create kind: {other}"))),
    }
}

fn dispatch_insert(cmd: &ParsedCommand, engine: &mut Engine) -> CsResult<()> {
    let table_ref = cmd
        .args
        .first()
        .ok_or_else(|| CsError::IncorrectFormat("relational_insert requires a table".to_string()))?;
    let values: Vec<i32> = cmd.args[1..]
        .iter()
        .map(|s| {
            s.parse::<i32>()
                .map_err(|_| CsError::IncorrectFormat(format!("expected integer value, got '{s}'")))
        })
        .collect::<CsResult<_>>()?;
    let table = engine.resolve_table_mut(table_ref)?;
    table.insert_row(&values)
}

fn dispatch_load(cmd: &ParsedCommand, engine: &mut Engine) -> CsResult<()> {
    let path = cmd
        .args
        .first()
        .ok_or_else(|| CsError::IncorrectFormat("load requires a file path".to_string()))?;
    let contents = std::fs::read_to_string(path)?;
    load_csv(&contents, engine)
}

/// Drives the §4.3 "Load" per-row insert path over in-memory CSV text: the
/// header names the target table (qualified by its first column), each
/// subsequent line is one comma-separated row.
pub fn load_csv(contents: &str, engine: &mut Engine) -> CsResult<()> {
    let mut lines = contents.lines();
    let header = lines
        .next()
        .ok_or_else(|| CsError::IncorrectFormat("empty load payload".to_string()))?;
    let first_col = header
        .split(',')
        .next()
        .ok_or_else(|| CsError::IncorrectFormat("load header missing columns".to_string()))?;
    let table_name = first_col
        .rsplit_once('.')
        .map(|(t, _)| t)
        .unwrap_or(first_col);
    let table_name = table_name.rsplit('.').next().unwrap_or(table_name);

    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let values: Vec<i32> = line
            .split(',')
            .map(|s| {
                s.trim()
                    .parse::<i32>()
                    .map_err(|_| CsError::IncorrectFormat(format!("expected integer, got '{s}'")))
            })
            .collect::<CsResult<_>>()?;
        let table = engine.resolve_table_mut(table_name)?;
        table.insert_row(&values)?;
    }
    Ok(())
}

fn parse_bound(cmd: &ParsedCommand, lo_idx: usize, hi_idx: usize) -> CsResult<Bound> {
    let lo = parser::parse_int_or_null(cmd.args.get(lo_idx).map(String::as_str).unwrap_or("null"))?;
    let hi = parser::parse_int_or_null(cmd.args.get(hi_idx).map(String::as_str).unwrap_or("null"))?;
    Ok(Bound::new(lo, hi))
}

fn dispatch_select(
    cmd: &ParsedCommand,
    engine: &Engine,
    context: &ClientContext,
    batch: &mut Batch,
) -> CsResult<()> {
    let handle = cmd
        .handles
        .first()
        .ok_or_else(|| CsError::IncorrectFormat("select requires a destination handle".to_string()))?
        .clone();

    // select3 form: select(colref, lo, hi); select4 form: select(vec, colref, lo, hi).
    let (base_name, pos_name, lo_idx, hi_idx) = if cmd.args.len() >= 4 {
        (cmd.args[1].clone(), Some(cmd.args[0].clone()), 2, 3)
    } else {
        (cmd.args[0].clone(), None, 1, 2)
    };
    let bound = parse_bound(cmd, lo_idx, hi_idx)?;

    if batch.is_open() {
        let base = Arc::new(resolve_int_vector(engine, context, &base_name)?);
        let pos = pos_name
            .as_deref()
            .map(|n| resolve_int_vector(engine, context, n))
            .transpose()?
            .map(Arc::new);
        batch.pending.push(crate::batch::PendingSelect::new(base, pos, bound, handle));
        return Ok(());
    }

    let positions = if base_name.contains('.') && pos_name.is_none() {
        let (table, col_idx) = column_and_index(engine, &base_name)?;
        let col = &table.columns[col_idx];
        ops::scan::select(&col.data, col.index.as_ref(), None, bound, false)
    } else {
        let base = resolve_int_vector(engine, context, &base_name)?;
        let pos = pos_name
            .as_deref()
            .map(|n| resolve_int_vector(engine, context, n))
            .transpose()?;
        let (index, clustered) = if base_name.contains('.') {
            let (table, col_idx) = column_and_index(engine, &base_name)?;
            let col = &table.columns[col_idx];
            (col.index.clone(), col.clustered)
        } else {
            (None, false)
        };
        // Only a clustering column's own data is physically sorted; an
        // unclustered column's index never makes its `data` a sorted
        // stream, so the scan's early-exit is gated on `clustered` alone.
        ops::scan::select(&base, index.as_ref(), pos.as_deref(), bound, clustered)
    };

    context.put(handle, ResultValue::Int(positions));
    Ok(())
}

fn dispatch_fetch(cmd: &ParsedCommand, engine: &Engine, context: &ClientContext) -> CsResult<()> {
    let handle = cmd
        .handles
        .first()
        .ok_or_else(|| CsError::IncorrectFormat("fetch requires a destination handle".to_string()))?
        .clone();
    let col_ref = cmd
        .args
        .first()
        .ok_or_else(|| CsError::IncorrectFormat("fetch requires a column".to_string()))?;
    let pos_ref = cmd
        .args
        .get(1)
        .ok_or_else(|| CsError::IncorrectFormat("fetch requires a position vector".to_string()))?;
    let (table, col_idx) = column_and_index(engine, col_ref)?;
    let positions = resolve_int_vector(engine, context, pos_ref)?;
    let values = ops::fetch::fetch(&table.columns[col_idx].data, &positions)?;
    context.put(handle, ResultValue::Int(values));
    Ok(())
}

fn dispatch_min_max(cmd: &ParsedCommand, engine: &Engine, context: &ClientContext, is_min: bool) -> CsResult<()> {
    let handle = cmd
        .handles
        .first()
        .ok_or_else(|| CsError::IncorrectFormat("min/max requires a destination handle".to_string()))?
        .clone();
    let result = if cmd.args.len() >= 2 {
        let positions = resolve_int_vector(engine, context, &cmd.args[0])?;
        let values = resolve_int_vector(engine, context, &cmd.args[1])?;
        if is_min {
            ops::aggregate::min_over_positions(&positions, &values)?
        } else {
            ops::aggregate::max_over_positions(&positions, &values)?
        }
    } else {
        let v = resolve_int_vector(engine, context, &cmd.args[0])?;
        if is_min { ops::aggregate::min(&v) } else { ops::aggregate::max(&v) }
    };
    let value = result.ok_or_else(|| CsError::ExecutionError("min/max over an empty vector".to_string()))?;
    context.put(handle, ResultValue::Int(vec![value]));
    Ok(())
}

fn dispatch_sum(cmd: &ParsedCommand, engine: &Engine, context: &ClientContext) -> CsResult<()> {
    let handle = cmd
        .handles
        .first()
        .ok_or_else(|| CsError::IncorrectFormat("sum requires a destination handle".to_string()))?
        .clone();
    let v = resolve_int_vector(engine, context, &cmd.args[0])?;
    context.put(handle, ResultValue::Long(vec![ops::aggregate::sum(&v)]));
    Ok(())
}

fn dispatch_avg(cmd: &ParsedCommand, engine: &Engine, context: &ClientContext) -> CsResult<()> {
    let handle = cmd
        .handles
        .first()
        .ok_or_else(|| CsError::IncorrectFormat("avg requires a destination handle".to_string()))?
        .clone();
    let v = resolve_int_vector(engine, context, &cmd.args[0])?;
    context.put(handle, ResultValue::Double(vec![ops::aggregate::avg(&v)]));
    Ok(())
}

fn dispatch_add_sub(cmd: &ParsedCommand, engine: &Engine, context: &ClientContext, is_add: bool) -> CsResult<()> {
    let handle = cmd
        .handles
        .first()
        .ok_or_else(|| CsError::IncorrectFormat("add/sub requires a destination handle".to_string()))?
        .clone();
    let v1 = resolve_int_vector(engine, context, &cmd.args[0])?;
    let v2 = resolve_int_vector(engine, context, &cmd.args[1])?;
    let out = if is_add { ops::aggregate::add(&v1, &v2)? } else { ops::aggregate::sub(&v1, &v2)? };
    context.put(handle, ResultValue::Int(out));
    Ok(())
}

fn dispatch_join(cmd: &ParsedCommand, engine: &Engine, context: &ClientContext) -> CsResult<()> {
    if cmd.handles.len() != 2 {
        return Err(CsError::IncorrectFormat("join requires two destination handles".to_string()));
    }
    let vals1 = resolve_int_vector(engine, context, &cmd.args[0])?;
    let pos1 = resolve_int_vector(engine, context, &cmd.args[1])?;
    let vals2 = resolve_int_vector(engine, context, &cmd.args[2])?;
    let pos2 = resolve_int_vector(engine, context, &cmd.args[3])?;
    let strategy = cmd.args.get(4).map(String::as_str).unwrap_or("hash");

    let (r1, r2) = match strategy {
        "nested-loop" => ops::join::nested_loop_join(&vals1, &pos1, &vals2, &pos2, engine.config.nested_loop_tile)?,
        _ => ops::join::hash_join(
            &vals1,
            &pos1,
            &vals2,
            &pos2,
            engine.config.hashmap_size,
            engine.config.hashmap_node_size,
        )?,
    };
    context.put(cmd.handles[0].clone(), ResultValue::Int(r1));
    context.put(cmd.handles[1].clone(), ResultValue::Int(r2));
    Ok(())
}

fn dispatch_print(cmd: &ParsedCommand, engine: &Engine, context: &ClientContext) -> CsResult<Dispatched> {
    let values: Vec<ResultValue> = cmd
        .args
        .iter()
        .map(|name| resolve_vector(engine, context, name))
        .collect::<CsResult<_>>()?;
    Ok(Dispatched::Print(values))
}
