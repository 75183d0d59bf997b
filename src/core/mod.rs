//! Core Module - Business calculations
//!
//! Pure functions over rows already fetched by the handlers; nothing here
//! touches the network.

pub mod finance;
pub mod inventory;
pub mod nutrition;
pub mod payroll;
pub mod report;

pub use finance::{build_alerts, serapan_percent, Alert, AlertLevel, FinanceSummary, OperationalData};
pub use inventory::InventoryStats;
pub use nutrition::{scale_label, NutritionLabel};
pub use payroll::build_payroll_rows;
pub use report::{build_ledger, LedgerEntry, ReportSummary};
