//! In-memory backend
//!
//! Mirrors the PostgREST behaviour the dashboard relies on so the whole API
//! can run without a Supabase project (`SPPG_STORE=memory`) and so the
//! integration tests can drive real handlers.

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::{Map, Value};
use std::cmp::Ordering;

use super::query::{Filter, Query, SelectSpec};
use super::Database;
use crate::core::finance::realisasi_anggaran;
use crate::models::{scalar_to_string, AppError, AppResult};
use crate::utils::constants::{TABLE_ANGGARAN, TABLE_TRANSAKSI, VIEW_REALISASI_ANGGARAN};

type Row = Map<String, Value>;

/// Tables held in a DashMap, one Vec of rows each
#[derive(Default)]
pub struct MemoryDatabase {
    tables: DashMap<String, Vec<Row>>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert rows as-is (ids are generated when missing)
    pub fn seed(&self, table: &str, rows: Vec<Value>) {
        let mut entry = self.tables.entry(table.to_string()).or_default();
        for row in rows {
            if let Value::Object(mut obj) = row {
                ensure_id(&mut obj);
                entry.push(obj);
            }
        }
    }

    /// Copy of every row in `table`
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.snapshot(table).into_iter().map(Value::Object).collect()
    }

    fn snapshot(&self, table: &str) -> Vec<Row> {
        if table == VIEW_REALISASI_ANGGARAN {
            let anggaran: Vec<Value> = self.rows(TABLE_ANGGARAN);
            let transaksi: Vec<Value> = self.rows(TABLE_TRANSAKSI);
            return realisasi_anggaran(&anggaran, &transaksi)
                .into_iter()
                .filter_map(|v| match v {
                    Value::Object(obj) => Some(obj),
                    _ => None,
                })
                .collect();
        }
        self.tables
            .get(table)
            .map(|rows| rows.value().clone())
            .unwrap_or_default()
    }

    fn project(&self, row: &Row, spec: &SelectSpec) -> Row {
        let mut out = if spec.selects_all() {
            row.clone()
        } else {
            spec.columns()
                .map(|c| (c.to_string(), row.get(c).cloned().unwrap_or(Value::Null)))
                .collect()
        };

        for (relation, columns) in spec.embeds() {
            let fk = row.get(&format!("id_{}", relation)).and_then(scalar_to_string);
            let related = fk.and_then(|fk| {
                self.snapshot(relation)
                    .into_iter()
                    .find(|r| r.get("id").and_then(scalar_to_string).as_deref() == Some(fk.as_str()))
            });
            let value = related
                .map(|r| Value::Object(self.project(&r, columns)))
                .unwrap_or(Value::Null);
            out.insert(relation.to_string(), value);
        }
        out
    }
}

fn ensure_id(row: &mut Row) {
    if !row.contains_key("id") {
        row.insert("id".to_string(), Value::String(uuid::Uuid::new_v4().to_string()));
    }
}

fn matches(row: &Row, filters: &[Filter]) -> bool {
    filters.iter().all(|f| {
        row.get(&f.column)
            .and_then(scalar_to_string)
            .map(|v| v == f.value)
            .unwrap_or(false)
    })
}

fn type_rank(v: &Value) -> u8 {
    match v {
        Value::Bool(_) => 0,
        Value::Number(_) => 1,
        Value::String(_) => 2,
        Value::Array(_) | Value::Object(_) => 3,
        Value::Null => 4,
    }
}

/// Postgres ordering: numbers numerically, text lexically, NULL greatest
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.unwrap_or(&Value::Null);
    let b = b.unwrap_or(&Value::Null);
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .unwrap_or(0.0)
            .partial_cmp(&y.as_f64().unwrap_or(0.0))
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

fn require_filters(filters: &[Filter]) -> AppResult<()> {
    if filters.is_empty() {
        return Err(AppError::bad_request("Update/hapus tanpa filter tidak diizinkan"));
    }
    Ok(())
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn select(&self, table: &str, query: &Query) -> AppResult<Vec<Value>> {
        let spec = match &query.select {
            Some(select) => SelectSpec::parse(select)?,
            None => SelectSpec::default(),
        };

        let mut rows: Vec<Row> = self
            .snapshot(table)
            .into_iter()
            .filter(|r| matches(r, &query.filters))
            .collect();

        if let Some(order) = &query.order {
            rows.sort_by(|a, b| {
                let ord = compare_values(a.get(&order.column), b.get(&order.column));
                if order.ascending {
                    ord
                } else {
                    ord.reverse()
                }
            });
        }

        let offset = query.offset.unwrap_or(0);
        let limit = query.limit.unwrap_or(usize::MAX);

        Ok(rows
            .iter()
            .skip(offset)
            .take(limit)
            .map(|r| Value::Object(self.project(r, &spec)))
            .collect())
    }

    async fn insert(&self, table: &str, rows: Vec<Value>) -> AppResult<Vec<Value>> {
        let mut prepared = Vec::with_capacity(rows.len());
        for row in rows {
            match row {
                Value::Object(mut obj) => {
                    ensure_id(&mut obj);
                    prepared.push(obj);
                }
                _ => return Err(AppError::bad_request("Setiap baris harus berupa objek JSON")),
            }
        }

        let mut entry = self.tables.entry(table.to_string()).or_default();
        entry.extend(prepared.iter().cloned());
        Ok(prepared.into_iter().map(Value::Object).collect())
    }

    async fn update(&self, table: &str, filters: &[Filter], patch: Value) -> AppResult<Vec<Value>> {
        require_filters(filters)?;
        let patch = match patch {
            Value::Object(obj) => obj,
            _ => return Err(AppError::bad_request("Data update harus berupa objek JSON")),
        };

        let mut updated = Vec::new();
        if let Some(mut rows) = self.tables.get_mut(table) {
            for row in rows.iter_mut().filter(|r| matches(r, filters)) {
                for (k, v) in &patch {
                    row.insert(k.clone(), v.clone());
                }
                updated.push(Value::Object(row.clone()));
            }
        }
        Ok(updated)
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> AppResult<Vec<Value>> {
        require_filters(filters)?;
        let mut removed = Vec::new();
        if let Some(mut rows) = self.tables.get_mut(table) {
            rows.retain(|r| {
                if matches(r, filters) {
                    removed.push(Value::Object(r.clone()));
                    false
                } else {
                    true
                }
            });
        }
        Ok(removed)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
