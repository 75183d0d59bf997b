//! OpenFoodFacts API Client
//!
//! Used for packaged-product lookups on the nutrition page. TKPI data for
//! raw ingredients lives in our own `nutrition_foods` table.
//!
//! API: {base}/cgi/search.pl?search_terms=..&search_simple=1&action=process&json=1
//! Free, no API key required

use eyre::{eyre, Result, WrapErr};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

use crate::utils::constants::{MAX_NUTRITION_RESULTS, USER_AGENT};

/// Search response (only the fields we read)
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub products: Vec<RawProduct>,
}

#[derive(Debug, Deserialize)]
pub struct RawProduct {
    #[serde(default)]
    pub product_name: Option<String>,
    /// Barcode; usually a string but some records carry a number
    #[serde(default)]
    pub code: Value,
    #[serde(default)]
    pub nutriments: Value,
}

/// Product as returned by `/api/nutrition/search`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoodProduct {
    pub name: Option<String>,
    pub id: Value,
    pub nutriments: Value,
}

impl From<RawProduct> for FoodProduct {
    fn from(p: RawProduct) -> Self {
        Self {
            name: p.product_name,
            id: p.code,
            nutriments: p.nutriments,
        }
    }
}

/// OpenFoodFacts API client
pub struct OpenFoodFactsClient {
    client: reqwest::Client,
    base_url: String,
}

impl OpenFoodFactsClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(10))
            .build()
            .wrap_err("Failed to build OpenFoodFacts HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Search products by free text, keeping the first `limit` hits
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<FoodProduct>> {
        let url = format!("{}/cgi/search.pl", self.base_url);
        let limit = limit.clamp(1, MAX_NUTRITION_RESULTS);

        info!("🔍 OpenFoodFacts: searching \"{}\"", query);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("search_terms", query),
                ("search_simple", "1"),
                ("action", "process"),
                ("json", "1"),
            ])
            .send()
            .await
            .map_err(|e| eyre!("OpenFoodFacts request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(eyre!("OpenFoodFacts API error: {}", response.status()));
        }

        let data: SearchResponse = response
            .json()
            .await
            .map_err(|e| eyre!("Failed to parse OpenFoodFacts response: {}", e))?;

        debug!(total = data.products.len(), limit, "OpenFoodFacts results");

        Ok(data
            .products
            .into_iter()
            .take(limit)
            .map(FoodProduct::from)
            .collect())
    }
}
