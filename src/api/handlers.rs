//! API Request Handlers

use axum::{
    body::Bytes,
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Json, Path, Query as QueryString, State,
    },
    http::StatusCode,
};
use chrono::Utc;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use super::middleware::{RateLimitConfig, RateLimiter};
use super::types::*;
use crate::config::AppConfig;
use crate::core::finance::total_amount;
use crate::core::inventory::is_low_stock;
use crate::core::payroll::default_periode;
use crate::core::{
    build_alerts, build_ledger, build_payroll_rows, scale_label, FinanceSummary, InventoryStats,
    OperationalData, ReportSummary,
};
use crate::db::{query::validate_identifier, select_as, Database, Filter, Query};
use crate::models::*;
use crate::providers::{FoodProduct, OpenFoodFactsClient};
use crate::utils::constants::*;
use crate::utils::TtlCache;

/// Shared application state
pub struct AppState {
    pub db: Arc<dyn Database>,
    pub nutrition: OpenFoodFactsClient,
    pub nutrition_cache: TtlCache<Vec<FoodProduct>>,
    pub rate_limiter: RateLimiter,
    pub api_key: Option<String>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(db: Arc<dyn Database>, config: &AppConfig) -> eyre::Result<Self> {
        Ok(Self {
            db,
            nutrition: OpenFoodFactsClient::new(&config.openfoodfacts_url)?,
            nutrition_cache: TtlCache::with_ttl(config.nutrition_cache_ttl_secs),
            rate_limiter: RateLimiter::new(RateLimitConfig::per_minute(config.rate_limit_per_minute)),
            api_key: config.api_key.clone(),
            start_time: Instant::now(),
        })
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

type FinanceResult<T> = Result<Json<FinanceResponse<T>>, FinanceFailure>;
type FinanceCreated = Result<(StatusCode, Json<FinanceResponse<Vec<Value>>>), FinanceFailure>;
type TableResult<T> = Result<Json<TableResponse<T>>, TableFailure>;

/// Monetary input that must be a number (or numeric string)
fn required_amount(value: &Value, field: &str) -> AppResult<f64> {
    optional_amount(value).ok_or_else(|| AppError::bad_request(format!("{} harus berupa angka", field)))
}

/// `null` instead of `""`/missing for optional form fields
fn or_null(value: Value) -> Value {
    match value {
        Value::String(ref s) if s.trim().is_empty() => Value::Null,
        other => other,
    }
}

fn or_default(value: Value, default: &str) -> Value {
    if is_blank(&value) {
        Value::String(default.to_string())
    } else {
        value
    }
}

// ============================================
// Root & Health
// ============================================

pub async fn root() -> Json<RootMessage> {
    Json(RootMessage {
        message: "Server connected",
    })
}

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<TableResponse<HealthData>> {
    Json(TableResponse::data(HealthData {
        status: "healthy".to_string(),
        version: APP_VERSION.to_string(),
        uptime_seconds: state.uptime_seconds(),
        storage: state.db.backend_name(),
        nutrition_cache: state.nutrition_cache.stats(),
    }))
}

// ============================================
// Finance: budgets (RAB)
// ============================================

pub async fn get_budgets(State(state): State<Arc<AppState>>) -> FinanceResult<Vec<Value>> {
    let query = Query::new().order("tahun_anggaran", false);
    let rows = state.db.select(VIEW_REALISASI_ANGGARAN, &query).await?;
    Ok(Json(FinanceResponse::success(rows)))
}

pub async fn create_budget(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateBudgetRequest>, JsonRejection>,
) -> FinanceCreated {
    let Json(req) = payload?;

    if is_blank(&req.tahun) || is_blank(&req.kategori) || is_blank(&req.pagu_dana) {
        return Err(AppError::bad_request("Data tahun, kategori, dan pagu dana wajib diisi!").into());
    }

    let row = json!({
        "tahun_anggaran": req.tahun,
        "kategori": req.kategori,
        "pagu_dana": req.pagu_dana,
        "status": STATUS_ANGGARAN_DISETUJUI,
    });
    let data = state.db.insert(TABLE_ANGGARAN, vec![row]).await?;

    info!(rows = data.len(), "📒 RAB created");
    Ok((
        StatusCode::CREATED,
        Json(FinanceResponse::with_message("RAB berhasil dibuat", data)),
    ))
}

// ============================================
// Finance: transactions
// ============================================

pub async fn create_transaction(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateTransactionRequest>, JsonRejection>,
) -> FinanceCreated {
    let Json(req) = payload?;

    if is_blank(&req.id_anggaran)
        || is_blank(&req.tanggal)
        || is_blank(&req.nominal)
        || is_blank(&req.keterangan)
    {
        return Err(AppError::bad_request(
            "Data wajib (Anggaran, Tanggal, Nominal, Keterangan) tidak lengkap!",
        )
        .into());
    }
    let nominal = required_amount(&req.nominal, "Nominal")?;

    let row = json!({
        "id_anggaran": req.id_anggaran,
        "tanggal_transaksi": req.tanggal,
        "keterangan": req.keterangan,
        "nominal": nominal,
        "jenis": JENIS_KELUAR,
        "lokasi_lat": or_null(req.geo_lat),
        "lokasi_long": or_null(req.geo_long),
        "nama_toko": or_null(req.nama_toko),
        "diinput_oleh": Value::Null,
    });
    let data = state.db.insert(TABLE_TRANSAKSI, vec![row]).await?;

    info!(nominal, "🧾 Expense recorded");
    Ok((
        StatusCode::CREATED,
        Json(FinanceResponse::with_message("Transaksi belanja berhasil disimpan", data)),
    ))
}

// ============================================
// Finance: employees & payroll
// ============================================

pub async fn get_employees(State(state): State<Arc<AppState>>) -> FinanceResult<Vec<Value>> {
    let query = Query::new().order("nama_lengkap", true);
    let rows = state.db.select(TABLE_KARYAWAN, &query).await?;
    Ok(Json(FinanceResponse::success(rows)))
}

pub async fn add_employee(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateEmployeeRequest>, JsonRejection>,
) -> FinanceCreated {
    let Json(req) = payload?;

    if is_blank(&req.nama) || is_blank(&req.gaji_pokok) {
        return Err(AppError::bad_request("Nama dan Gaji Pokok wajib diisi!").into());
    }
    let gaji_pokok = required_amount(&req.gaji_pokok, "Gaji pokok")?;

    let row = json!({
        "nama_lengkap": req.nama,
        "jabatan": or_default(req.jabatan, DEFAULT_JABATAN),
        "gaji_pokok": gaji_pokok,
        "no_rekening": or_default(req.no_rekening, DEFAULT_REKENING),
        "nama_bank": or_default(req.nama_bank, DEFAULT_REKENING),
        "status_aktif": true,
    });
    let data = state.db.insert(TABLE_KARYAWAN, vec![row]).await?;

    Ok((
        StatusCode::CREATED,
        Json(FinanceResponse::with_message("Karyawan berhasil disimpan", data)),
    ))
}

/// The body is optional here: an empty body runs payroll for today
pub async fn generate_payroll(State(state): State<Arc<AppState>>, body: Bytes) -> FinanceCreated {
    let req: GeneratePayrollRequest = if body.iter().all(u8::is_ascii_whitespace) {
        GeneratePayrollRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::bad_request(format!("Body JSON tidak valid: {}", e)))?
    };

    let now = Utc::now();
    let periode = req
        .periode
        .filter(|p| !p.trim().is_empty())
        .unwrap_or_else(|| default_periode(now));

    let active = Query::new().eq("status_aktif", "true");
    let employees: Vec<Employee> = select_as(state.db.as_ref(), TABLE_KARYAWAN, &active).await?;
    if employees.is_empty() {
        return Err(AppError::bad_request("Tidak ada karyawan aktif untuk digaji.").into());
    }

    let rows = build_payroll_rows(&employees, &periode, now)
        .into_iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<_>, _>>()
        .map_err(AppError::from)?;
    let data = state.db.insert(TABLE_RIWAYAT_GAJI, rows).await?;

    info!(periode = %periode, employees = employees.len(), "💸 Payroll generated");
    Ok((
        StatusCode::CREATED,
        Json(FinanceResponse::with_message(
            format!("Sukses transfer gaji ke {} karyawan!", employees.len()),
            data,
        )),
    ))
}

pub async fn get_payroll_history(State(state): State<Arc<AppState>>) -> FinanceResult<Vec<Value>> {
    let query = Query::new()
        .select("*, karyawan(nama_lengkap, nama_bank, no_rekening)")
        .order("tanggal_proses", false);
    let rows = state.db.select(TABLE_RIWAYAT_GAJI, &query).await?;
    Ok(Json(FinanceResponse::success(rows)))
}

// ============================================
// Finance: report & dashboard
// ============================================

pub async fn get_financial_summary(State(state): State<Arc<AppState>>) -> FinanceResult<Value> {
    let db = state.db.as_ref();

    let budget_q = Query::new().select("pagu_dana");
    let expense_q = Query::new()
        .select("id, tanggal_transaksi, keterangan, nominal, nama_toko")
        .eq("jenis", JENIS_KELUAR)
        .order("tanggal_transaksi", false);
    let payroll_q = Query::new()
        .select("id, tanggal_proses, total_terima, karyawan(nama_lengkap)")
        .order("tanggal_proses", false);

    let (budgets, expenses, payroll) = tokio::try_join!(
        db.select(TABLE_ANGGARAN, &budget_q),
        select_as::<ExpenseRow>(db, TABLE_TRANSAKSI, &expense_q),
        select_as::<PayrollHistoryRow>(db, TABLE_RIWAYAT_GAJI, &payroll_q),
    )?;

    let summary = ReportSummary::compute(total_amount(&budgets, "pagu_dana"), &expenses, &payroll);
    let mutasi = build_ledger(expenses, payroll);

    debug!(entries = mutasi.len(), "Report built");
    Ok(Json(FinanceResponse::success(json!({
        "summary": summary,
        "mutasi": mutasi,
    }))))
}

pub async fn get_dashboard_stats(State(state): State<Arc<AppState>>) -> FinanceResult<Value> {
    let db = state.db.as_ref();

    let budget_q = Query::new().select("pagu_dana");
    let spend_q = Query::new().select("nominal").eq("jenis", JENIS_KELUAR);
    let stock_q = Query::new().select("stok_tersedia, stok_minimum");

    let (budgets, spending, stock) = tokio::try_join!(
        db.select(TABLE_ANGGARAN, &budget_q),
        db.select(TABLE_TRANSAKSI, &spend_q),
        select_as::<StockItem>(db, TABLE_STOK, &stock_q),
    )?;

    let finance = FinanceSummary::compute(
        total_amount(&budgets, "pagu_dana"),
        total_amount(&spending, "nominal"),
    );
    let stok_kritis = stock.iter().filter(|item| is_low_stock(item)).count();
    let alerts = build_alerts(&finance, stok_kritis);

    Ok(Json(FinanceResponse::success(json!({
        "finance": finance,
        "operation": OperationalData::with_stok_kritis(stok_kritis),
        "alerts": alerts,
    }))))
}

// ============================================
// Inventory
// ============================================

pub async fn get_inventory_summary(State(state): State<Arc<AppState>>) -> TableResult<InventoryStats> {
    let db = state.db.as_ref();

    let stock_q = Query::new().select("stok_tersedia, stok_minimum");
    let pending_q = Query::new().select("id").eq("status", STATUS_ORDER_PENDING);

    let (stock, pending) = tokio::try_join!(
        select_as::<StockItem>(db, TABLE_STOK, &stock_q),
        db.select(TABLE_ORDERS, &pending_q),
    )?;

    Ok(Json(TableResponse::data(InventoryStats::compute(&stock, pending.len()))))
}

// ============================================
// Nutrition
// ============================================

pub async fn search_nutrition(
    State(state): State<Arc<AppState>>,
    params: Result<QueryString<NutritionSearchParams>, QueryRejection>,
) -> TableResult<Vec<FoodProduct>> {
    let QueryString(params) = params?;

    let q = params.q.as_deref().map(str::trim).unwrap_or_default();
    if q.is_empty() {
        return Err(AppError::bad_request("Parameter q wajib diisi").into());
    }
    let limit = match params.limit.as_deref().map(str::trim).filter(|l| !l.is_empty()) {
        Some(raw) => raw
            .parse::<usize>()
            .map_err(|_| AppError::bad_request("Parameter limit harus berupa angka"))?,
        None => DEFAULT_NUTRITION_RESULTS,
    }
    .clamp(1, MAX_NUTRITION_RESULTS);

    let cache_key = format!("{}|{}", q, limit);
    if let Some(products) = state.nutrition_cache.get(&cache_key) {
        debug!(query = q, "Nutrition cache hit");
        return Ok(Json(TableResponse::data(products)));
    }

    let products = state
        .nutrition
        .search(q, limit)
        .await
        .map_err(|e| AppError::nutrition_api(e.to_string()))?;
    state.nutrition_cache.set(&cache_key, products.clone());

    Ok(Json(TableResponse::data(products)))
}

pub async fn get_nutrition_label(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    params: Result<QueryString<LabelParams>, QueryRejection>,
) -> TableResult<crate::core::NutritionLabel> {
    let QueryString(params) = params?;

    let serving = match params.serving.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => Some(
            raw.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| AppError::bad_request("Parameter serving harus berupa angka"))?,
        ),
        None => None,
    };

    let query = Query::new().eq("id", id.as_str()).limit(1);
    let food = select_as::<NutritionFood>(state.db.as_ref(), TABLE_NUTRITION_FOODS, &query)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::not_found(format!("Data gizi dengan id {} tidak ditemukan", id)))?;

    Ok(Json(TableResponse::data(scale_label(&food, serving))))
}

// ============================================
// Generic table proxy
// ============================================

pub async fn list_rows(
    State(state): State<Arc<AppState>>,
    Path(table): Path<String>,
    params: Result<QueryString<HashMap<String, String>>, QueryRejection>,
) -> TableResult<Vec<Value>> {
    let QueryString(params) = params?;
    validate_identifier(&table)?;

    let query = Query::from_params(&params)?;
    let rows = state.db.select(&table, &query).await?;
    Ok(Json(TableResponse::data(rows)))
}

pub async fn get_row(
    State(state): State<Arc<AppState>>,
    Path((table, id)): Path<(String, String)>,
) -> TableResult<Value> {
    validate_identifier(&table)?;

    let query = Query::new().eq("id", id.as_str()).limit(1);
    let row = state
        .db
        .select(&table, &query)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::not_found("Data tidak ditemukan"))?;

    Ok(Json(TableResponse::data(row)))
}

pub async fn create_rows(
    State(state): State<Arc<AppState>>,
    Path(table): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<TableResponse<Value>>), TableFailure> {
    let Json(body) = payload?;
    validate_identifier(&table)?;

    let data = match body {
        Value::Object(_) => state
            .db
            .insert(&table, vec![body])
            .await?
            .into_iter()
            .next()
            .unwrap_or(Value::Null),
        Value::Array(rows) if rows.iter().all(Value::is_object) => {
            Value::Array(state.db.insert(&table, rows).await?)
        }
        _ => {
            return Err(AppError::bad_request("Body harus berupa objek atau array objek JSON").into());
        }
    };

    Ok((StatusCode::CREATED, Json(TableResponse::data(data))))
}

pub async fn update_row(
    State(state): State<Arc<AppState>>,
    Path((table, id)): Path<(String, String)>,
    payload: Result<Json<Value>, JsonRejection>,
) -> TableResult<Value> {
    let Json(patch) = payload?;
    validate_identifier(&table)?;
    if !patch.is_object() {
        return Err(AppError::bad_request("Body harus berupa objek JSON").into());
    }

    let updated = state
        .db
        .update(&table, &[Filter::eq("id", id.as_str())], patch)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::not_found("Data tidak ditemukan"))?;

    Ok(Json(TableResponse::data(updated)))
}

pub async fn delete_row(
    State(state): State<Arc<AppState>>,
    Path((table, id)): Path<(String, String)>,
) -> TableResult<()> {
    validate_identifier(&table)?;

    let removed = state.db.delete(&table, &[Filter::eq("id", id.as_str())]).await?;
    if removed.is_empty() {
        return Err(AppError::not_found("Data tidak ditemukan").into());
    }

    Ok(Json(TableResponse::message("Data berhasil dihapus")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_amount() {
        assert_eq!(required_amount(&json!("1500000"), "Nominal").unwrap(), 1_500_000.0);
        let err = required_amount(&json!("sejuta"), "Nominal").unwrap_err();
        assert_eq!(err.code, ErrorCode::ApiBadRequest);
    }

    #[test]
    fn test_form_defaults() {
        assert_eq!(or_default(json!(""), "Staff"), json!("Staff"));
        assert_eq!(or_default(json!("Koki"), "Staff"), json!("Koki"));
        assert_eq!(or_null(json!("")), Value::Null);
        assert_eq!(or_null(json!(-6.2)), json!(-6.2));
    }
}
