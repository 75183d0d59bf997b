//! Budget realisation, absorption percentage and dashboard alerts

use serde::Serialize;
use serde_json::{json, Value};

use crate::models::{amount, scalar_to_string};
use crate::utils::constants::{
    HIGH_ABSORPTION_PERCENT, JENIS_KELUAR, LOW_CASH_THRESHOLD, OPERASIONAL_DISTRIBUSI_HARI_INI,
    OPERASIONAL_KEPUASAN, OPERASIONAL_TOTAL_PENERIMA,
};

/// Sum a monetary column over loose rows
pub fn total_amount(rows: &[Value], column: &str) -> f64 {
    rows.iter()
        .map(|r| r.get(column).map(amount).unwrap_or(0.0))
        .sum()
}

/// `round(terpakai / anggaran * 100)`, 0 when there is no budget
pub fn serapan_percent(terpakai: f64, anggaran: f64) -> i64 {
    if anggaran > 0.0 {
        (terpakai / anggaran * 100.0).round() as i64
    } else {
        0
    }
}

/// `finance` block of the dashboard summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinanceSummary {
    pub total_anggaran: f64,
    pub terpakai: f64,
    pub sisa: f64,
    pub serapan: i64,
}

impl FinanceSummary {
    pub fn compute(total_anggaran: f64, terpakai: f64) -> Self {
        Self {
            total_anggaran,
            terpakai,
            sisa: total_anggaran - terpakai,
            serapan: serapan_percent(terpakai, total_anggaran),
        }
    }
}

/// `operation` block of the dashboard summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationalData {
    pub total_penerima: u64,
    pub distribusi_hari_ini: u64,
    pub kepuasan: u64,
    pub stok_kritis: usize,
}

impl OperationalData {
    pub fn with_stok_kritis(stok_kritis: usize) -> Self {
        Self {
            total_penerima: OPERASIONAL_TOTAL_PENERIMA,
            distribusi_hari_ini: OPERASIONAL_DISTRIBUSI_HARI_INI,
            kepuasan: OPERASIONAL_KEPUASAN,
            stok_kritis,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Critical,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub level: AlertLevel,
    pub pesan: String,
}

impl Alert {
    fn new(level: AlertLevel, pesan: impl Into<String>) -> Self {
        Self {
            level,
            pesan: pesan.into(),
        }
    }
}

/// Dashboard alerts, most severe first
pub fn build_alerts(summary: &FinanceSummary, stok_kritis: usize) -> Vec<Alert> {
    let mut alerts = Vec::new();

    if summary.sisa < LOW_CASH_THRESHOLD {
        alerts.push(Alert::new(
            AlertLevel::Critical,
            "⚠️ Kas Operasional Menipis (Di bawah 5 Juta)!",
        ));
    }
    if summary.serapan > HIGH_ABSORPTION_PERCENT {
        alerts.push(Alert::new(
            AlertLevel::Warning,
            "⚠️ Anggaran hampir habis (Serapan > 90%).",
        ));
    }
    if stok_kritis > 0 {
        alerts.push(Alert::new(
            AlertLevel::Warning,
            format!("📦 {} item stok di bawah batas minimum.", stok_kritis),
        ));
    }

    alerts
}

/// Rows of `view_realisasi_anggaran`: each budget line with what has been
/// spent against it (`terpakai`) and what remains (`sisa_dana`).
pub fn realisasi_anggaran(anggaran: &[Value], transaksi: &[Value]) -> Vec<Value> {
    anggaran
        .iter()
        .map(|row| {
            let id = row.get("id").and_then(scalar_to_string);
            let pagu = row.get("pagu_dana").map(amount).unwrap_or(0.0);
            let terpakai: f64 = transaksi
                .iter()
                .filter(|t| t.get("jenis").and_then(Value::as_str) == Some(JENIS_KELUAR))
                .filter(|t| id.is_some() && t.get("id_anggaran").and_then(scalar_to_string) == id)
                .map(|t| t.get("nominal").map(amount).unwrap_or(0.0))
                .sum();

            json!({
                "id_anggaran": row.get("id").cloned().unwrap_or(Value::Null),
                "tahun_anggaran": row.get("tahun_anggaran").cloned().unwrap_or(Value::Null),
                "kategori": row.get("kategori").cloned().unwrap_or(Value::Null),
                "pagu_dana": row.get("pagu_dana").cloned().unwrap_or(Value::Null),
                "status": row.get("status").cloned().unwrap_or(Value::Null),
                "terpakai": terpakai,
                "sisa_dana": pagu - terpakai,
            })
        })
        .collect()
}
