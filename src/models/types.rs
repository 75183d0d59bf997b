//! Domain row and request types
//!
//! Rows come back from Supabase as loose JSON. Monetary columns can be
//! `numeric` (number) or text depending on how the table was created, so
//! every amount goes through [`amount`].

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ============================================
// Loose JSON helpers
// ============================================

/// Read a monetary value from a number or a numeric string; anything else is 0.
pub fn amount(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()).unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Same as [`amount`] but distinguishes "absent" from zero.
pub fn optional_amount(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

/// Falsy check for required form fields: null, "", 0 and false count as missing.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.trim().is_empty(),
        Value::Number(n) => n.as_f64().map(|v| v == 0.0 || v.is_nan()).unwrap_or(false),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// Render a scalar as the string form used in equality filters.
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn de_amount<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    let v = Value::deserialize(d)?;
    Ok(amount(&v))
}

fn de_optional_amount<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    let v = Value::deserialize(d)?;
    Ok(optional_amount(&v))
}

/// Scalars become text, null becomes ""
fn de_text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    let v = Value::deserialize(d)?;
    Ok(scalar_to_string(&v).unwrap_or_default())
}

/// jsonb arrays may be stored as null
fn de_null_as_empty<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(d)?.unwrap_or_default())
}

// ============================================
// Requests
// ============================================

/// POST /api/finance/budgets
#[derive(Debug, Default, Deserialize)]
pub struct CreateBudgetRequest {
    #[serde(default)]
    pub tahun: Value,
    #[serde(default)]
    pub kategori: Value,
    #[serde(default)]
    pub pagu_dana: Value,
}

/// POST /api/finance/transactions
#[derive(Debug, Default, Deserialize)]
pub struct CreateTransactionRequest {
    #[serde(default)]
    pub id_anggaran: Value,
    #[serde(default)]
    pub tanggal: Value,
    #[serde(default)]
    pub keterangan: Value,
    #[serde(default)]
    pub nominal: Value,
    #[serde(default)]
    pub geo_lat: Value,
    #[serde(default)]
    pub geo_long: Value,
    #[serde(default)]
    pub nama_toko: Value,
}

/// POST /api/finance/employees
#[derive(Debug, Default, Deserialize)]
pub struct CreateEmployeeRequest {
    #[serde(default)]
    pub nama: Value,
    #[serde(default)]
    pub jabatan: Value,
    #[serde(default)]
    pub gaji_pokok: Value,
    #[serde(default)]
    pub no_rekening: Value,
    #[serde(default)]
    pub nama_bank: Value,
}

/// POST /api/finance/payroll/generate
#[derive(Debug, Default, Deserialize)]
pub struct GeneratePayrollRequest {
    /// Payroll period, e.g. "2026-02-01"
    #[serde(default)]
    pub periode: Option<String>,
}

// ============================================
// Rows read back from the database
// ============================================

/// Row of `karyawan`
#[derive(Debug, Clone, Deserialize)]
pub struct Employee {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub nama_lengkap: Option<String>,
    #[serde(default, deserialize_with = "de_amount")]
    pub gaji_pokok: f64,
}

/// Row of `riwayat_gaji` as inserted by a payroll run
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PayrollRecord {
    pub id_karyawan: Value,
    pub periode_bulan: String,
    pub total_terima: f64,
    pub status: String,
    pub tanggal_proses: String,
}

/// Outgoing `transaksi` row used by the report
#[derive(Debug, Clone, Deserialize)]
pub struct ExpenseRow {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub tanggal_transaksi: Option<String>,
    #[serde(default)]
    pub keterangan: Option<String>,
    #[serde(default, deserialize_with = "de_amount")]
    pub nominal: f64,
    #[serde(default)]
    pub nama_toko: Option<String>,
}

/// Embedded `karyawan(...)` reference
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmployeeRef {
    #[serde(default)]
    pub nama_lengkap: Option<String>,
}

/// `riwayat_gaji` row joined with its employee
#[derive(Debug, Clone, Deserialize)]
pub struct PayrollHistoryRow {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub tanggal_proses: Option<String>,
    #[serde(default, deserialize_with = "de_amount")]
    pub total_terima: f64,
    #[serde(default)]
    pub karyawan: Option<EmployeeRef>,
}

/// Row of `stok`
#[derive(Debug, Clone, Deserialize)]
pub struct StockItem {
    #[serde(default, deserialize_with = "de_amount")]
    pub stok_tersedia: f64,
    #[serde(default, deserialize_with = "de_optional_amount")]
    pub stok_minimum: Option<f64>,
}

/// One nutrient of a `nutrition_foods` row (per 100 g)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Nutrient {
    #[serde(default)]
    pub id: Value,
    #[serde(default, deserialize_with = "de_text")]
    pub name: String,
    #[serde(default, deserialize_with = "de_text")]
    pub unit: String,
    #[serde(default, deserialize_with = "de_amount")]
    pub value: f64,
    /// Percent of daily need (AKG)
    #[serde(
        default,
        rename = "dailyValue",
        alias = "daily_value",
        deserialize_with = "de_optional_amount",
        skip_serializing_if = "Option::is_none"
    )]
    pub daily_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// Row of `nutrition_foods` (TKPI reference data)
#[derive(Debug, Clone, Deserialize)]
pub struct NutritionFood {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "de_optional_amount")]
    pub serving_size: Option<f64>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default, deserialize_with = "de_null_as_empty")]
    pub nutrients: Vec<Nutrient>,
}
