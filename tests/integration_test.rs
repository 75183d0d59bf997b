//! Integration tests for the SPPG Dashboard API (full router over the in-memory store)

use axum::{
    body::Body,
    extract::connect_info::MockConnectInfo,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use sppg_dashboard::api::{create_router, AppState};
use sppg_dashboard::{AppConfig, MemoryDatabase};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceExt;

fn app(db: Arc<MemoryDatabase>) -> Router {
    app_with_config(db, AppConfig::default())
}

fn app_with_config(db: Arc<MemoryDatabase>, config: AppConfig) -> Router {
    let state = Arc::new(AppState::new(db, &config).unwrap());
    create_router(state)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    send_raw(app, method, uri, body.map(|b| b.to_string()), &[]).await
}

async fn send_raw(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<String>,
    headers: &[(&str, &str)],
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let request = match body {
        Some(b) => builder
            .header("content-type", "application/json")
            .body(Body::from(b))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

fn seeded_stock() -> Arc<MemoryDatabase> {
    let db = Arc::new(MemoryDatabase::new());
    db.seed(
        "stok",
        vec![
            json!({"id": 1, "nama_barang": "Beras", "kategori": "Pokok", "stok_tersedia": 3, "stok_minimum": 10}),
            json!({"id": 2, "nama_barang": "Minyak", "kategori": "Pokok", "stok_tersedia": 40, "stok_minimum": 10}),
            json!({"id": 3, "nama_barang": "Garam", "kategori": "Bumbu", "stok_tersedia": 2}),
        ],
    );
    db
}

// ============================================
// Root & health
// ============================================

#[tokio::test]
async fn test_root_and_health() {
    let app = app(Arc::new(MemoryDatabase::new()));

    let (status, body) = send(&app, "GET", "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "Server connected"}));

    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["status"], json!("healthy"));
    assert_eq!(body["data"]["storage"], json!("memory"));
}

// ============================================
// Budgets
// ============================================

#[tokio::test]
async fn test_created_budget_appears_in_list() {
    let app = app(Arc::new(MemoryDatabase::new()));

    let (status, body) = send(
        &app,
        "POST",
        "/api/finance/budgets",
        Some(json!({"tahun": 2026, "kategori": "Bahan Baku", "pagu_dana": 50_000_000})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], json!("success"));
    assert_eq!(body["message"], json!("RAB berhasil dibuat"));
    assert_eq!(body["data"][0]["status"], json!("disetujui"));

    let (status, body) = send(&app, "GET", "/api/finance/budgets", None).await;
    assert_eq!(status, StatusCode::OK);
    let rows = body["data"].as_array().unwrap();
    let created = rows
        .iter()
        .find(|r| r["kategori"] == json!("Bahan Baku"))
        .expect("budget listed");
    assert_eq!(created["pagu_dana"], json!(50_000_000));
    assert_eq!(created["terpakai"].as_f64(), Some(0.0));
    assert_eq!(created["sisa_dana"].as_f64(), Some(50_000_000.0));
}

#[tokio::test]
async fn test_budgets_ordered_by_year_desc() {
    let db = Arc::new(MemoryDatabase::new());
    db.seed(
        "anggaran",
        vec![
            json!({"id": 1, "tahun_anggaran": 2025, "kategori": "Lama", "pagu_dana": 1}),
            json!({"id": 2, "tahun_anggaran": 2026, "kategori": "Baru", "pagu_dana": 1}),
        ],
    );
    let app = app(db);

    let (_, body) = send(&app, "GET", "/api/finance/budgets", None).await;
    assert_eq!(body["data"][0]["kategori"], json!("Baru"));
    assert_eq!(body["data"][1]["kategori"], json!("Lama"));
}

#[tokio::test]
async fn test_budget_missing_fields_is_400() {
    let app = app(Arc::new(MemoryDatabase::new()));

    let (status, body) = send(
        &app,
        "POST",
        "/api/finance/budgets",
        Some(json!({"tahun": 2026, "kategori": ""})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], json!("error"));
    assert_eq!(body["message"], json!("Data tahun, kategori, dan pagu dana wajib diisi!"));
}

#[tokio::test]
async fn test_malformed_json_is_400_in_finance_envelope() {
    let app = app(Arc::new(MemoryDatabase::new()));

    let (status, body) = send_raw(
        &app,
        "POST",
        "/api/finance/budgets",
        Some("{tahun: 2026".to_string()),
        &[],
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], json!("error"));
    assert!(body["message"].is_string());
}

// ============================================
// Transactions
// ============================================

#[tokio::test]
async fn test_transaction_recorded_as_outgoing() {
    let db = Arc::new(MemoryDatabase::new());
    let app = app(db.clone());

    let (status, body) = send(
        &app,
        "POST",
        "/api/finance/transactions",
        Some(json!({
            "id_anggaran": 1,
            "tanggal": "2026-02-03",
            "keterangan": "Beli sayur",
            "nominal": "250000",
            "geo_lat": -6.2,
            "geo_long": 106.8,
            "nama_toko": "Pasar Induk"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], json!("Transaksi belanja berhasil disimpan"));

    let rows = db.rows("transaksi");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["jenis"], json!("keluar"));
    assert_eq!(rows[0]["nominal"].as_f64(), Some(250_000.0));
    assert_eq!(rows[0]["tanggal_transaksi"], json!("2026-02-03"));
    assert_eq!(rows[0]["lokasi_lat"], json!(-6.2));
}

#[tokio::test]
async fn test_transaction_missing_fields_is_400() {
    let app = app(Arc::new(MemoryDatabase::new()));

    let (status, body) = send(
        &app,
        "POST",
        "/api/finance/transactions",
        Some(json!({"id_anggaran": 1, "tanggal": "2026-02-03"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], json!("error"));
}

// ============================================
// Employees & payroll
// ============================================

#[tokio::test]
async fn test_add_employee_defaults() {
    let db = Arc::new(MemoryDatabase::new());
    let app = app(db.clone());

    let (status, _) = send(
        &app,
        "POST",
        "/api/finance/employees",
        Some(json!({"nama": "Siti", "gaji_pokok": 3_000_000})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let rows = db.rows("karyawan");
    assert_eq!(rows[0]["nama_lengkap"], json!("Siti"));
    assert_eq!(rows[0]["jabatan"], json!("Staff"));
    assert_eq!(rows[0]["no_rekening"], json!("-"));
    assert_eq!(rows[0]["nama_bank"], json!("-"));
    assert_eq!(rows[0]["status_aktif"], json!(true));

    let (_, body) = send(&app, "GET", "/api/finance/employees", None).await;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_payroll_one_row_per_active_employee() {
    let db = Arc::new(MemoryDatabase::new());
    db.seed(
        "karyawan",
        vec![
            json!({"id": 1, "nama_lengkap": "Siti", "gaji_pokok": 3_000_000, "status_aktif": true}),
            json!({"id": 2, "nama_lengkap": "Budi", "gaji_pokok": "2500000", "status_aktif": true}),
            json!({"id": 3, "nama_lengkap": "Andi", "gaji_pokok": 4_000_000, "status_aktif": false}),
        ],
    );
    let app = app(db.clone());

    let (status, body) = send(
        &app,
        "POST",
        "/api/finance/payroll/generate",
        Some(json!({"periode": "2026-02-01"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], json!("Sukses transfer gaji ke 2 karyawan!"));

    let rows = db.rows("riwayat_gaji");
    assert_eq!(rows.len(), 2);
    for (id, gaji) in [(1, 3_000_000.0), (2, 2_500_000.0)] {
        let matching: Vec<_> = rows.iter().filter(|r| r["id_karyawan"] == json!(id)).collect();
        assert_eq!(matching.len(), 1);
        assert_eq!(matching[0]["total_terima"].as_f64(), Some(gaji));
        assert_eq!(matching[0]["periode_bulan"], json!("2026-02-01"));
        assert_eq!(matching[0]["status"], json!("dibayar"));
    }
    assert!(rows.iter().all(|r| r["id_karyawan"] != json!(3)));
}

#[tokio::test]
async fn test_payroll_without_body_uses_today() {
    let db = Arc::new(MemoryDatabase::new());
    db.seed(
        "karyawan",
        vec![json!({"id": 1, "nama_lengkap": "Siti", "gaji_pokok": 1_000, "status_aktif": true})],
    );
    let app = app(db.clone());

    let (status, _) = send(&app, "POST", "/api/finance/payroll/generate", None).await;
    assert_eq!(status, StatusCode::CREATED);

    let today = chrono::Utc::now().format("%Y-%m-%d").to_string();
    let rows = db.rows("riwayat_gaji");
    assert_eq!(rows[0]["periode_bulan"], json!(today));
}

#[tokio::test]
async fn test_payroll_without_active_employees_is_400() {
    let db = Arc::new(MemoryDatabase::new());
    db.seed(
        "karyawan",
        vec![json!({"id": 1, "nama_lengkap": "Andi", "gaji_pokok": 1_000, "status_aktif": false})],
    );
    let app = app(db.clone());

    let (status, body) = send(
        &app,
        "POST",
        "/api/finance/payroll/generate",
        Some(json!({"periode": "2026-02-01"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], json!("Tidak ada karyawan aktif untuk digaji."));
    assert!(db.rows("riwayat_gaji").is_empty());
}

#[tokio::test]
async fn test_payroll_history_embeds_employee() {
    let db = Arc::new(MemoryDatabase::new());
    db.seed(
        "karyawan",
        vec![json!({"id": 7, "nama_lengkap": "Siti", "nama_bank": "BRI", "no_rekening": "123", "gaji_pokok": 1})],
    );
    db.seed(
        "riwayat_gaji",
        vec![
            json!({"id": "a", "id_karyawan": 7, "total_terima": 1, "tanggal_proses": "2026-01-01T00:00:00.000Z"}),
            json!({"id": "b", "id_karyawan": 7, "total_terima": 1, "tanggal_proses": "2026-02-01T00:00:00.000Z"}),
        ],
    );
    let app = app(db);

    let (status, body) = send(&app, "GET", "/api/finance/payroll/history", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["id"], json!("b"));
    assert_eq!(
        body["data"][0]["karyawan"],
        json!({"nama_lengkap": "Siti", "nama_bank": "BRI", "no_rekening": "123"})
    );
}

// ============================================
// Report & dashboard
// ============================================

#[tokio::test]
async fn test_financial_report() {
    let db = Arc::new(MemoryDatabase::new());
    db.seed("anggaran", vec![json!({"id": 1, "pagu_dana": 10_000_000})]);
    db.seed(
        "transaksi",
        vec![
            json!({"id": 11, "id_anggaran": 1, "tanggal_transaksi": "2026-02-10", "keterangan": "Beras", "nominal": 1_000_000, "jenis": "keluar", "nama_toko": "Toko Makmur"}),
            json!({"id": 12, "id_anggaran": 1, "tanggal_transaksi": "2026-02-20", "keterangan": "Hibah", "nominal": 5_000_000, "jenis": "masuk"}),
        ],
    );
    db.seed("karyawan", vec![json!({"id": 7, "nama_lengkap": "Siti"})]);
    db.seed(
        "riwayat_gaji",
        vec![json!({"id": "g1", "id_karyawan": 7, "total_terima": 2_000_000, "tanggal_proses": "2026-02-15T08:00:00.000Z"})],
    );
    let app = app(db);

    let (status, body) = send(&app, "GET", "/api/finance/report/summary", None).await;
    assert_eq!(status, StatusCode::OK);

    let summary = &body["data"]["summary"];
    assert_eq!(summary["total_anggaran"].as_f64(), Some(10_000_000.0));
    assert_eq!(summary["total_pengeluaran"].as_f64(), Some(3_000_000.0));
    assert_eq!(summary["sisa_dana"].as_f64(), Some(7_000_000.0));
    assert_eq!(summary["detail"]["belanja"].as_f64(), Some(1_000_000.0));
    assert_eq!(summary["detail"]["gaji"].as_f64(), Some(2_000_000.0));

    let mutasi = body["data"]["mutasi"].as_array().unwrap();
    assert_eq!(mutasi.len(), 2);
    assert_eq!(mutasi[0]["tipe"], json!("payroll"));
    assert_eq!(mutasi[0]["keterangan"], json!("Gaji Bulan Ini - Siti"));
    assert_eq!(mutasi[1]["tipe"], json!("expense"));
    assert_eq!(mutasi[1]["keterangan"], json!("Beras (Toko Makmur)"));
}

#[tokio::test]
async fn test_dashboard_serapan_and_alerts() {
    let db = seeded_stock();
    db.seed("anggaran", vec![json!({"id": 1, "pagu_dana": 10_000_000})]);
    db.seed(
        "transaksi",
        vec![
            json!({"id": 1, "nominal": 6_000_000, "jenis": "keluar"}),
            json!({"id": 2, "nominal": "3500000", "jenis": "keluar"}),
            json!({"id": 3, "nominal": 9_000_000, "jenis": "masuk"}),
        ],
    );
    let app = app(db);

    let (status, body) = send(&app, "GET", "/api/finance/dashboard/summary", None).await;
    assert_eq!(status, StatusCode::OK);

    let finance = &body["data"]["finance"];
    assert_eq!(finance["terpakai"].as_f64(), Some(9_500_000.0));
    assert_eq!(finance["sisa"].as_f64(), Some(500_000.0));
    assert_eq!(finance["serapan"], json!(95));

    assert_eq!(body["data"]["operation"]["stok_kritis"], json!(2));
    assert_eq!(body["data"]["operation"]["total_penerima"], json!(1500));

    let levels: Vec<_> = body["data"]["alerts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["level"].clone())
        .collect();
    assert_eq!(levels, vec![json!("critical"), json!("warning"), json!("warning")]);
}

#[tokio::test]
async fn test_dashboard_without_budget_has_zero_serapan() {
    let db = Arc::new(MemoryDatabase::new());
    db.seed("transaksi", vec![json!({"id": 1, "nominal": 100, "jenis": "keluar"})]);
    let app = app(db);

    let (status, body) = send(&app, "GET", "/api/finance/dashboard/summary", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["finance"]["serapan"], json!(0));
    assert_eq!(body["data"]["finance"]["total_anggaran"].as_f64(), Some(0.0));
}

// ============================================
// Inventory & nutrition
// ============================================

#[tokio::test]
async fn test_inventory_summary() {
    let db = seeded_stock();
    db.seed(
        "orders",
        vec![
            json!({"id": 1, "status": "pending"}),
            json!({"id": 2, "status": "pending"}),
            json!({"id": 3, "status": "diterima"}),
        ],
    );
    let app = app(db);

    let (status, body) = send(&app, "GET", "/api/inventory/summary", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"success": true, "data": {"total_items": 3, "low_stock": 2, "active_orders": 2}})
    );
}

#[tokio::test]
async fn test_nutrition_label() {
    let db = Arc::new(MemoryDatabase::new());
    db.seed(
        "nutrition_foods",
        vec![json!({
            "id": "tempe",
            "name": "Tempe Kedelai Murni",
            "serving_size": 100,
            "source": "TKPI 2017",
            "nutrients": [
                {"id": "protein", "name": "Protein", "unit": "g", "value": 20.8, "dailyValue": 35}
            ]
        })],
    );
    let app = app(db);

    let (status, body) = send(&app, "GET", "/api/nutrition/foods/tempe/label?serving=50", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["serving_size"].as_f64(), Some(50.0));
    assert_eq!(body["data"]["nutrients"][0]["adjustedValue"].as_f64(), Some(10.4));
    assert_eq!(body["data"]["nutrients"][0]["adjustedDailyValue"].as_f64(), Some(17.5));

    let (status, body) = send(&app, "GET", "/api/nutrition/foods/tahu/label", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], json!(false));

    let (status, _) = send(&app, "GET", "/api/nutrition/foods/tempe/label?serving=banyak", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_zero_minimum_falls_back_to_default() {
    let db = Arc::new(MemoryDatabase::new());
    db.seed(
        "stok",
        vec![json!({"id": 1, "nama_barang": "Telur", "stok_tersedia": 2, "stok_minimum": 0})],
    );
    let app = app(db);

    let (status, body) = send(&app, "GET", "/api/inventory/summary", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["low_stock"], json!(1));

    let (status, body) = send(&app, "GET", "/api/finance/dashboard/summary", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["operation"]["stok_kritis"], json!(1));
}

#[tokio::test]
async fn test_nutrition_label_with_loose_nutrients() {
    let db = Arc::new(MemoryDatabase::new());
    db.seed(
        "nutrition_foods",
        vec![
            json!({"id": "air", "name": "Air Mineral", "nutrients": null}),
            json!({"id": "susu", "name": "Susu", "nutrients": [{"id": 5, "name": "Kalsium", "unit": "mg", "value": 1}]}),
        ],
    );
    let app = app(db);

    let (status, body) = send(&app, "GET", "/api/nutrition/foods/air/label", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["nutrients"], json!([]));

    let (status, body) = send(&app, "GET", "/api/nutrition/foods/susu/label?serving=200", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["nutrients"][0]["id"], json!(5));
    assert_eq!(body["data"]["nutrients"][0]["adjustedValue"].as_f64(), Some(2.0));
}

#[tokio::test]
async fn test_nutrition_search_requires_query() {
    let app = app(Arc::new(MemoryDatabase::new()));

    let (status, body) = send(&app, "GET", "/api/nutrition/search?q=%20", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"], json!("Parameter q wajib diisi"));
}

// ============================================
// Generic table proxy
// ============================================

#[tokio::test]
async fn test_list_with_filters_order_and_limit() {
    let app = app(seeded_stock());

    let (status, body) = send(
        &app,
        "GET",
        "/api/stok?kategori=Pokok&order_by=stok_tersedia&order=desc&limit=1",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["nama_barang"], json!("Minyak"));

    let (status, _) = send(&app, "GET", "/api/stok?limit=semua", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_row_by_id() {
    let app = app(seeded_stock());

    let (status, body) = send(&app, "GET", "/api/stok/2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["nama_barang"], json!("Minyak"));

    let (status, body) = send(&app, "GET", "/api/stok/99", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"success": false, "error": "Data tidak ditemukan"}));
}

#[tokio::test]
async fn test_put_returns_404_or_updated_row() {
    let app = app(seeded_stock());

    let (status, body) = send(&app, "PUT", "/api/stok/99", Some(json!({"stok_tersedia": 5}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], json!(false));

    let (status, body) = send(&app, "PUT", "/api/stok/1", Some(json!({"stok_tersedia": 25}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], json!(1));
    assert_eq!(body["data"]["stok_tersedia"], json!(25));
    assert_eq!(body["data"]["nama_barang"], json!("Beras"));
}

#[tokio::test]
async fn test_post_object_and_array() {
    let db = Arc::new(MemoryDatabase::new());
    let app = app(db.clone());

    let (status, body) = send(&app, "POST", "/api/pemasok", Some(json!({"nama": "CV Tani"}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["data"].is_object());
    assert!(body["data"]["id"].is_string());

    let (status, body) = send(
        &app,
        "POST",
        "/api/pemasok",
        Some(json!([{"nama": "UD Laut"}, {"nama": "PT Susu"}])),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(2));
    assert_eq!(db.rows("pemasok").len(), 3);

    let (status, _) = send(&app, "POST", "/api/pemasok", Some(json!("teks"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_row() {
    let db = seeded_stock();
    let app = app(db.clone());

    let (status, body) = send(&app, "DELETE", "/api/stok/3", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "message": "Data berhasil dihapus"}));
    assert_eq!(db.rows("stok").len(), 2);

    let (status, _) = send(&app, "DELETE", "/api/stok/3", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_table_name_is_400() {
    let app = app(Arc::new(MemoryDatabase::new()));

    let (status, body) = send(&app, "GET", "/api/bad-name", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
}

// ============================================
// Middleware
// ============================================

#[tokio::test]
async fn test_api_key_required_when_configured() {
    let config = AppConfig {
        api_key: Some("rahasia".to_string()),
        ..AppConfig::default()
    };
    let app = app_with_config(seeded_stock(), config);

    let (status, body) = send(&app, "GET", "/api/stok", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], json!(false));

    let (status, _) = send_raw(&app, "GET", "/api/stok", None, &[("x-api-key", "salah")]).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send_raw(&app, "GET", "/api/stok", None, &[("x-api-key", "rahasia")]).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_rate_limit() {
    let config = AppConfig {
        rate_limit_per_minute: 2,
        ..AppConfig::default()
    };
    let app = app_with_config(seeded_stock(), config);
    let client = [("x-forwarded-for", "10.0.0.1")];

    for _ in 0..2 {
        let (status, _) = send_raw(&app, "GET", "/api/stok", None, &client).await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, body) = send_raw(&app, "GET", "/api/stok", None, &client).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["success"], json!(false));

    // Health stays reachable
    let (status, _) = send_raw(&app, "GET", "/health", None, &client).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_rate_limit_buckets_by_peer_without_proxy_headers() {
    let config = AppConfig {
        rate_limit_per_minute: 1,
        ..AppConfig::default()
    };
    let state = Arc::new(AppState::new(seeded_stock(), &config).unwrap());
    let peer_a: SocketAddr = "192.168.1.10:40000".parse().unwrap();
    let peer_b: SocketAddr = "192.168.1.11:40000".parse().unwrap();
    let from_a = create_router(state.clone()).layer(MockConnectInfo(peer_a));
    let from_b = create_router(state).layer(MockConnectInfo(peer_b));

    let (status, _) = send(&from_a, "GET", "/api/stok", None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&from_a, "GET", "/api/stok", None).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

    let (status, _) = send(&from_b, "GET", "/api/stok", None).await;
    assert_eq!(status, StatusCode::OK);
}
