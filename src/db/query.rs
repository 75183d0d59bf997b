//! Query model shared by both storage backends
//!
//! Only the subset the dashboard uses: equality filters, one ordering
//! column, limit/offset and a PostgREST-style `select` with one level of
//! embedded relations.

use std::collections::HashMap;

use crate::models::{AppError, AppResult};

/// Query-string keys that are never treated as filters
pub const RESERVED_PARAMS: [&str; 4] = ["limit", "offset", "order_by", "order"];

/// `column = value`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub column: String,
    pub value: String,
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

/// A read against one table or view
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub select: Option<String>,
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(mut self, columns: &str) -> Self {
        self.select = Some(columns.to_string());
        self
    }

    pub fn eq(mut self, column: &str, value: impl Into<String>) -> Self {
        self.filters.push(Filter::eq(column, value));
        self
    }

    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        self.order = Some(Order {
            column: column.to_string(),
            ascending,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Build a query from `/api/:table` query-string parameters.
    ///
    /// `limit`, `offset`, `order_by` and `order` are reserved; every other
    /// key is an equality filter. `order=desc` sorts descending, any other
    /// value ascending.
    pub fn from_params(params: &HashMap<String, String>) -> AppResult<Self> {
        let mut query = Query::new();

        if let Some(raw) = params.get("limit") {
            query.limit = Some(parse_count("limit", raw)?);
        }
        if let Some(raw) = params.get("offset") {
            query.offset = Some(parse_count("offset", raw)?);
        }
        if let Some(column) = params.get("order_by") {
            validate_identifier(column)?;
            let ascending = !params
                .get("order")
                .map(|o| o.eq_ignore_ascii_case("desc"))
                .unwrap_or(false);
            query.order = Some(Order {
                column: column.clone(),
                ascending,
            });
        }

        // Sorted so the upstream URL is deterministic
        let mut keys: Vec<&String> = params
            .keys()
            .filter(|k| !RESERVED_PARAMS.contains(&k.as_str()))
            .collect();
        keys.sort();
        for key in keys {
            validate_identifier(key)?;
            query.filters.push(Filter::eq(key.as_str(), params[key].as_str()));
        }

        Ok(query)
    }

    /// Encode as PostgREST query pairs
    pub fn to_postgrest(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        pairs.push((
            "select".to_string(),
            self.select
                .as_deref()
                .map(compact_select)
                .unwrap_or_else(|| "*".to_string()),
        ));
        pairs.extend(filter_pairs(&self.filters));
        if let Some(order) = &self.order {
            let dir = if order.ascending { "asc" } else { "desc" };
            pairs.push(("order".to_string(), format!("{}.{}", order.column, dir)));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(offset) = self.offset {
            pairs.push(("offset".to_string(), offset.to_string()));
        }
        pairs
    }
}

/// Encode equality filters as PostgREST pairs (`col=eq.value`)
pub fn filter_pairs(filters: &[Filter]) -> Vec<(String, String)> {
    filters
        .iter()
        .map(|f| (f.column.clone(), format!("eq.{}", f.value)))
        .collect()
}

fn parse_count(key: &str, raw: &str) -> AppResult<usize> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::bad_request(format!("Parameter {} harus berupa angka", key)))
}

/// Table and column names must be plain identifiers
pub fn validate_identifier(name: &str) -> AppResult<()> {
    let ok = !name.is_empty()
        && name.len() <= 63
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if ok {
        Ok(())
    } else {
        Err(AppError::bad_request(format!("Nama tabel/kolom tidak valid: {}", name)))
    }
}

fn compact_select(select: &str) -> String {
    select.chars().filter(|c| !c.is_whitespace()).collect()
}

// ============================================
// Select parsing
// ============================================

/// One item of a select list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectItem {
    All,
    Column(String),
    /// `relation(columns...)`
    Embed { relation: String, columns: SelectSpec },
}

/// Parsed `select` string, e.g. `*, karyawan(nama_lengkap, nama_bank)`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectSpec {
    pub items: Vec<SelectItem>,
}

impl SelectSpec {
    pub fn parse(select: &str) -> AppResult<Self> {
        let compact = compact_select(select);
        let mut items = Vec::new();
        for part in split_top_level(&compact)? {
            if part.is_empty() {
                continue;
            }
            if part == "*" {
                items.push(SelectItem::All);
            } else if let Some(open) = part.find('(') {
                if !part.ends_with(')') {
                    return Err(AppError::bad_request(format!("Select tidak valid: {}", part)));
                }
                let relation = &part[..open];
                validate_identifier(relation)?;
                let inner = &part[open + 1..part.len() - 1];
                items.push(SelectItem::Embed {
                    relation: relation.to_string(),
                    columns: SelectSpec::parse(inner)?,
                });
            } else {
                validate_identifier(part)?;
                items.push(SelectItem::Column(part.to_string()));
            }
        }
        Ok(Self { items })
    }

    /// No explicit select means every column
    pub fn selects_all(&self) -> bool {
        self.items.is_empty() || self.items.iter().any(|i| matches!(i, SelectItem::All))
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.items.iter().filter_map(|i| match i {
            SelectItem::Column(c) => Some(c.as_str()),
            _ => None,
        })
    }

    pub fn embeds(&self) -> impl Iterator<Item = (&str, &SelectSpec)> {
        self.items.iter().filter_map(|i| match i {
            SelectItem::Embed { relation, columns } => Some((relation.as_str(), columns)),
            _ => None,
        })
    }
}

fn split_top_level(s: &str) -> AppResult<Vec<&str>> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return Err(AppError::bad_request("Select tidak valid: kurung tidak seimbang"));
                }
            }
            ',' if depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(AppError::bad_request("Select tidak valid: kurung tidak seimbang"));
    }
    parts.push(&s[start..]);
    Ok(parts)
}
