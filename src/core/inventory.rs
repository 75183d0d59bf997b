//! Inventory overview numbers (stock opname page header)

use serde::Serialize;

use crate::models::StockItem;
use crate::utils::constants::DEFAULT_STOK_MINIMUM;

/// Below its minimum (default 5 when the row has none or it is not positive)
pub fn is_low_stock(item: &StockItem) -> bool {
    let minimum = item
        .stok_minimum
        .filter(|m| *m > 0.0)
        .unwrap_or(DEFAULT_STOK_MINIMUM);
    item.stok_tersedia < minimum
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryStats {
    pub total_items: usize,
    pub low_stock: usize,
    pub active_orders: usize,
}

impl InventoryStats {
    pub fn compute(items: &[StockItem], active_orders: usize) -> Self {
        Self {
            total_items: items.len(),
            low_stock: items.iter().filter(|i| is_low_stock(i)).count(),
            active_orders,
        }
    }
}
