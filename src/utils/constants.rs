//! Constants Module - Single Source of Truth
//!
//! Table names, thresholds and default settings used across the app.

// ============================================
// APPLICATION CONSTANTS
// ============================================

/// Application name
pub const APP_NAME: &str = "SPPG Dashboard";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// User-Agent for outgoing HTTP requests
pub const USER_AGENT: &str = concat!("sppg-dashboard/", env!("CARGO_PKG_VERSION"));

// ============================================
// TABLES
// ============================================

pub const TABLE_ANGGARAN: &str = "anggaran";
pub const TABLE_TRANSAKSI: &str = "transaksi";
pub const TABLE_KARYAWAN: &str = "karyawan";
pub const TABLE_RIWAYAT_GAJI: &str = "riwayat_gaji";
pub const TABLE_STOK: &str = "stok";
pub const TABLE_ORDERS: &str = "orders";
pub const TABLE_NUTRITION_FOODS: &str = "nutrition_foods";

/// Budget realisation view (pagu vs. realised spending)
pub const VIEW_REALISASI_ANGGARAN: &str = "view_realisasi_anggaran";

// ============================================
// DOMAIN VALUES
// ============================================

/// `transaksi.jenis` for spending
pub const JENIS_KELUAR: &str = "keluar";

/// Status given to every newly created budget line
pub const STATUS_ANGGARAN_DISETUJUI: &str = "disetujui";

/// Status given to every payroll row
pub const STATUS_GAJI_DIBAYAR: &str = "dibayar";

/// Status of an order still waiting for delivery
pub const STATUS_ORDER_PENDING: &str = "pending";

pub const DEFAULT_JABATAN: &str = "Staff";
pub const DEFAULT_REKENING: &str = "-";

// ============================================
// THRESHOLDS
// ============================================

/// Below this remaining balance the dashboard raises a critical alert (Rupiah)
pub const LOW_CASH_THRESHOLD: f64 = 5_000_000.0;

/// Above this absorption percentage the dashboard raises a warning
pub const HIGH_ABSORPTION_PERCENT: i64 = 90;

/// Minimum stock used when a `stok` row has no `stok_minimum`
pub const DEFAULT_STOK_MINIMUM: f64 = 5.0;

/// Serving size bounds for nutrition labels (grams)
pub const MIN_SERVING_GRAMS: f64 = 1.0;
pub const MAX_SERVING_GRAMS: f64 = 1000.0;

/// Reference portion of TKPI nutrient values (grams)
pub const TKPI_REFERENCE_GRAMS: f64 = 100.0;

// ============================================
// OPERATIONAL PLACEHOLDERS
// ============================================
// Beneficiary/distribution data is owned by another team and not in the
// database yet; the dashboard reports these fixed figures until it is.

pub const OPERASIONAL_TOTAL_PENERIMA: u64 = 1500;
pub const OPERASIONAL_DISTRIBUSI_HARI_INI: u64 = 1450;
pub const OPERASIONAL_KEPUASAN: u64 = 94;

// ============================================
// DEFAULT SETTINGS
// ============================================

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3001;

/// Database request timeout (seconds)
pub const DEFAULT_DB_TIMEOUT_SECS: u64 = 10;

/// Read retry attempts against Supabase
pub const DEFAULT_DB_MAX_RETRIES: u32 = 3;

/// In-flight HTTP requests before new ones wait
pub const MAX_CONCURRENT_REQUESTS: usize = 512;

/// Requests per minute per client
pub const DEFAULT_RATE_LIMIT_PER_MINUTE: u32 = 300;

/// Nutrition search cache TTL (seconds)
pub const DEFAULT_NUTRITION_CACHE_TTL_SECS: u64 = 300;

/// OpenFoodFacts base URL
pub const DEFAULT_OPENFOODFACTS_URL: &str = "https://world.openfoodfacts.org";

/// Max products returned by a nutrition search
pub const MAX_NUTRITION_RESULTS: usize = 50;
pub const DEFAULT_NUTRITION_RESULTS: usize = 5;
