//! Catalog persistence: dump/restore the current database to a directory
//! tree (spec.md §6). Multi-byte fields are written little-endian
//! explicitly (spec.md §6 leaves endianness to the implementation).

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use crate::config::EngineConfig;
use crate::engine::Engine;
use crate::error::{CsError, CsResult};
use crate::index::ColumnIndex;
use crate::model::{Column, Database, Table};

pub const MAX_SIZE_NAME: usize = 64;

fn write_padded_name(w: &mut impl Write, name: &str) -> CsResult<()> {
    if name.len() > MAX_SIZE_NAME {
        return Err(CsError::ExecutionError(format!(
            "name '{name}' exceeds MAX_SIZE_NAME ({MAX_SIZE_NAME})"
        )));
    }
    let mut buf = [0u8; MAX_SIZE_NAME];
    buf[..name.len()].copy_from_slice(name.as_bytes());
    w.write_all(&buf)?;
    Ok(())
}

fn read_padded_name(r: &mut impl Read) -> CsResult<String> {
    let mut buf = [0u8; MAX_SIZE_NAME];
    r.read_exact(&mut buf)?;
    let end = buf.iter().position(|&b| b == 0).unwrap_or(MAX_SIZE_NAME);
    Ok(String::from_utf8_lossy(&buf[..end]).into_owned())
}

fn write_u32(w: &mut impl Write, v: u32) -> io::Result<()> {
    w.write_all(&v.to_le_bytes())
}

fn read_u32(r: &mut impl Read) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn write_u64(w: &mut impl Write, v: u64) -> io::Result<()> {
    w.write_all(&v.to_le_bytes())
}

fn read_u64(r: &mut impl Read) -> io::Result<u64> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

fn write_i32_array(w: &mut impl Write, data: &[i32]) -> io::Result<()> {
    for &v in data {
        w.write_all(&v.to_le_bytes())?;
    }
    Ok(())
}

fn read_i32_array(r: &mut impl Read, count: usize) -> io::Result<Vec<i32>> {
    let mut out = Vec::with_capacity(count);
    let mut buf = [0u8; 4];
    for _ in 0..count {
        r.read_exact(&mut buf)?;
        out.push(i32::from_le_bytes(buf));
    }
    Ok(out)
}

const NO_INDEX_COLUMN: u64 = u64::MAX;

fn table_file(dir: &Path, table: &str) -> PathBuf {
    dir.join(format!("{table}.tbl"))
}

fn column_file(dir: &Path, table: &str, column: &str) -> PathBuf {
    dir.join(format!("{table}.{column}.col"))
}

fn index_file(dir: &Path, table: &str, column: &str) -> PathBuf {
    dir.join(format!("{table}.{column}.idx"))
}

/// Writes the full catalog — `all_databases`, then the current database's
/// tables/columns/indexes — under `home`, in the dump order the reference
/// shutdown path uses.
pub fn persist(engine: &Engine, home: &Path) -> CsResult<()> {
    let db = engine.current_db()?;
    fs::create_dir_all(home)?;

    let mut all_databases = fs::File::create(home.join("all_databases"))?;
    write_padded_name(&mut all_databases, &db.name)?;

    let db_dir = home.join(&db.name);
    fs::create_dir_all(&db_dir)?;

    let mut db_file = fs::File::create(db_dir.join("db.meta"))?;
    write_u32(&mut db_file, db.tables.len() as u32)?;
    write_u32(&mut db_file, db.tables_capacity as u32)?;
    for table in &db.tables {
        write_padded_name(&mut db_file, &table.name)?;
    }

    for table in &db.tables {
        persist_table(&db_dir, table)?;
    }
    Ok(())
}

fn persist_table(db_dir: &Path, table: &Table) -> CsResult<()> {
    let mut f = fs::File::create(table_file(db_dir, &table.name))?;
    write_u32(&mut f, table.columns.len() as u32)?;
    write_u32(&mut f, table.capacity as u32)?;
    write_u32(&mut f, table.length as u32)?;
    write_u64(&mut f, table.index_column.map(|i| i as u64).unwrap_or(NO_INDEX_COLUMN))?;
    for col in &table.columns {
        write_padded_name(&mut f, &col.name)?;
    }

    for col in &table.columns {
        persist_column(db_dir, &table.name, col)?;
    }
    Ok(())
}

fn persist_column(db_dir: &Path, table_name: &str, col: &Column) -> CsResult<()> {
    let mut f = fs::File::create(column_file(db_dir, table_name, &col.name))?;
    write_padded_name(&mut f, if col.clustered { "clustered" } else { "unclustered" })?;
    write_i32_array(&mut f, &col.data)?;

    if let Some(index) = &col.index {
        let mut idx_f = fs::File::create(index_file(db_dir, table_name, &col.name))?;
        match index {
            ColumnIndex::Sorted(_) => {
                write_padded_name(&mut idx_f, "sorted")?;
                let mut keys = Vec::new();
                index.enumerate_keys(&mut keys);
                let mut positions = Vec::new();
                index.range_scan(crate::index::Bound::new(None, None), &mut positions);
                write_u32(&mut idx_f, keys.len() as u32)?;
                write_i32_array(&mut idx_f, &keys)?;
                write_i32_array(&mut idx_f, &positions)?;
            }
            ColumnIndex::Btree(_) => {
                write_padded_name(&mut idx_f, "btree")?;
                let mut keys = Vec::new();
                index.enumerate_keys(&mut keys);
                write_u32(&mut idx_f, keys.len() as u32)?;
                write_i32_array(&mut idx_f, &keys)?;
            }
        }
    }
    Ok(())
}

/// Restores the catalog under `home` into a fresh `Engine`. Index contents
/// are rebuilt from the restored column data rather than trusted verbatim
/// from disk — spec.md §4.3 allows any index build strategy as long as the
/// post-state matches per-row insertion, and rebuilding from data sidesteps
/// ever trusting a stale or corrupted index file.
pub fn restore(config: EngineConfig, home: &Path) -> CsResult<Engine> {
    let mut engine = Engine::new(config);

    let all_databases_path = home.join("all_databases");
    if !all_databases_path.exists() {
        return Ok(engine);
    }
    let mut all_databases = fs::File::open(&all_databases_path)?;
    let db_name = read_padded_name(&mut all_databases)?;

    let db_dir = home.join(&db_name);
    let mut db_file = fs::File::open(db_dir.join("db.meta"))?;
    let tables_size = read_u32(&mut db_file)? as usize;
    let tables_capacity = read_u32(&mut db_file)? as usize;
    let mut table_names = Vec::with_capacity(tables_size);
    for _ in 0..tables_size {
        table_names.push(read_padded_name(&mut db_file)?);
    }

    let mut db = Database::with_capacity(db_name, tables_capacity);
    for table_name in table_names {
        let table = restore_table(&db_dir, &table_name, engine.config.max_node_keys)?;
        db.create_table(table)?;
    }

    engine.set_current_db(db);
    Ok(engine)
}

fn restore_table(db_dir: &Path, table_name: &str, max_node_keys: usize) -> CsResult<Table> {
    let mut f = fs::File::open(table_file(db_dir, table_name))?;
    let col_count = read_u32(&mut f)? as usize;
    let col_capacity = read_u32(&mut f)? as usize;
    let table_length = read_u32(&mut f)? as usize;
    let index_column_raw = read_u64(&mut f)?;
    let index_column = if index_column_raw == NO_INDEX_COLUMN {
        None
    } else {
        Some(index_column_raw as usize)
    };

    let mut column_names = Vec::with_capacity(col_count);
    for _ in 0..col_count {
        column_names.push(read_padded_name(&mut f)?);
    }

    let mut table = Table::with_capacity(table_name, &column_names, col_capacity);
    table.length = table_length;

    let mut index_plan: Vec<(usize, bool)> = Vec::new();
    for (i, column_name) in column_names.iter().enumerate() {
        let (data, clustered, use_btree) = restore_column(db_dir, table_name, column_name, table_length)?;
        table.columns[i].data = data;
        table.columns[i].clustered = clustered;
        if let Some(use_btree) = use_btree {
            index_plan.push((i, use_btree));
        }
    }

    for (i, use_btree) in index_plan {
        if Some(i) == index_column {
            table.index_column = None; // cleared so set_clustering_column's assertion holds
            table.set_clustering_column(i, max_node_keys, use_btree);
        } else {
            table.create_secondary_index(i, max_node_keys, use_btree);
        }
    }
    Ok(table)
}

/// Returns `(data, clustered, index_kind)`; `index_kind` is `Some(true)` for
/// a btree index file, `Some(false)` for sorted, `None` if no index file
/// exists for this column.
fn restore_column(
    db_dir: &Path,
    table_name: &str,
    column_name: &str,
    table_length: usize,
) -> CsResult<(Vec<i32>, bool, Option<bool>)> {
    let mut f = fs::File::open(column_file(db_dir, table_name, column_name))?;
    let clustered_flag = read_padded_name(&mut f)?;
    let clustered = clustered_flag == "clustered";
    let data = read_i32_array(&mut f, table_length)?;

    let idx_path = index_file(db_dir, table_name, column_name);
    let use_btree = if idx_path.exists() {
        let mut idx_f = fs::File::open(&idx_path)?;
        let kind = read_padded_name(&mut idx_f)?;
        Some(kind == "btree")
    } else {
        None
    };

    Ok((data, clustered, use_btree))
}
