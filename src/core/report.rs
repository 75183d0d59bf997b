//! Financial report: totals plus a single ledger of spending and salaries

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::cmp::Ordering;

use crate::models::{ExpenseRow, PayrollHistoryRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerType {
    Expense,
    Payroll,
}

/// One line of `mutasi`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerEntry {
    pub id: Value,
    pub tanggal: Option<String>,
    pub kategori: String,
    pub keterangan: String,
    pub masuk: f64,
    pub keluar: f64,
    pub tipe: LedgerType,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpendingBreakdown {
    pub belanja: f64,
    pub gaji: f64,
}

/// `summary` block of the report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSummary {
    pub total_anggaran: f64,
    pub total_pengeluaran: f64,
    pub sisa_dana: f64,
    pub detail: SpendingBreakdown,
}

impl ReportSummary {
    pub fn compute(total_anggaran: f64, expenses: &[ExpenseRow], payroll: &[PayrollHistoryRow]) -> Self {
        let belanja: f64 = expenses.iter().map(|e| e.nominal).sum();
        let gaji: f64 = payroll.iter().map(|p| p.total_terima).sum();
        let total_pengeluaran = belanja + gaji;

        Self {
            total_anggaran,
            total_pengeluaran,
            sisa_dana: total_anggaran - total_pengeluaran,
            detail: SpendingBreakdown { belanja, gaji },
        }
    }
}

/// Parse the date formats Supabase hands back (timestamptz, timestamp, date)
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Newest first; entries without a readable date go last
fn newest_first(a: &LedgerEntry, b: &LedgerEntry) -> Ordering {
    let da = a.tanggal.as_deref().and_then(parse_date);
    let db = b.tanggal.as_deref().and_then(parse_date);
    match (da, db) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Merge spending and payroll into one ledger sorted by date
pub fn build_ledger(expenses: Vec<ExpenseRow>, payroll: Vec<PayrollHistoryRow>) -> Vec<LedgerEntry> {
    let belanja = expenses.into_iter().map(|item| LedgerEntry {
        id: item.id,
        tanggal: item.tanggal_transaksi,
        kategori: "Belanja Operasional".to_string(),
        keterangan: format!(
            "{} ({})",
            item.keterangan.unwrap_or_default(),
            item.nama_toko
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| "Toko".to_string())
        ),
        masuk: 0.0,
        keluar: item.nominal,
        tipe: LedgerType::Expense,
    });

    let gaji = payroll.into_iter().map(|item| {
        let nama = item
            .karyawan
            .and_then(|k| k.nama_lengkap)
            .unwrap_or_else(|| "-".to_string());
        LedgerEntry {
            id: item.id,
            tanggal: item.tanggal_proses,
            kategori: "Gaji Karyawan".to_string(),
            keterangan: format!("Gaji Bulan Ini - {}", nama),
            masuk: 0.0,
            keluar: item.total_terima,
            tipe: LedgerType::Payroll,
        }
    });

    let mut mutasi: Vec<LedgerEntry> = belanja.chain(gaji).collect();
    mutasi.sort_by(newest_first);
    mutasi
}
