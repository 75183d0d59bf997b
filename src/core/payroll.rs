//! Payroll run: one salary row per active employee

use chrono::{DateTime, SecondsFormat, Utc};

use crate::models::{Employee, PayrollRecord};
use crate::utils::constants::STATUS_GAJI_DIBAYAR;

/// Period used when the request does not name one (today, `YYYY-MM-DD`)
pub fn default_periode(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%d").to_string()
}

/// Full base salary for everyone; attendance deductions are not modelled.
pub fn build_payroll_rows(employees: &[Employee], periode: &str, now: DateTime<Utc>) -> Vec<PayrollRecord> {
    let tanggal_proses = now.to_rfc3339_opts(SecondsFormat::Millis, true);
    employees
        .iter()
        .map(|emp| PayrollRecord {
            id_karyawan: emp.id.clone(),
            periode_bulan: periode.to_string(),
            total_terima: emp.gaji_pokok,
            status: STATUS_GAJI_DIBAYAR.to_string(),
            tanggal_proses: tanggal_proses.clone(),
        })
        .collect()
}
