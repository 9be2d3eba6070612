use rusqlite::Row;
use serde::{Deserialize, Serialize};

/// One catalog row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: i64,
    pub game_id: Option<i64>,
    pub game_name: Option<String>,
    pub commodity_name: String,
    pub commodity_hash_name: Option<String>,
    pub icon_url: Option<String>,
    pub on_sale_count: Option<i64>,
    pub price: Option<f64>,
    pub steam_price: Option<f64>,
    pub steam_usd_price: Option<f64>,
    pub type_name: Option<String>,
    pub exterior: Option<String>,
    pub exterior_color: Option<String>,
    pub rarity: Option<String>,
    pub rarity_color: Option<String>,
    pub quality: Option<String>,
    pub quality_color: Option<String>,
    pub have_lease: Option<bool>,
    /// RFC 3339 UTC timestamp of the first write.
    pub created_at: String,
    /// RFC 3339 UTC timestamp of the latest write.
    pub updated_at: String,
}

impl Item {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            game_id: row.get("game_id")?,
            game_name: row.get("game_name")?,
            commodity_name: row.get("commodity_name")?,
            commodity_hash_name: row.get("commodity_hash_name")?,
            icon_url: row.get("icon_url")?,
            on_sale_count: row.get("on_sale_count")?,
            price: row.get("price")?,
            steam_price: row.get("steam_price")?,
            steam_usd_price: row.get("steam_usd_price")?,
            type_name: row.get("type_name")?,
            exterior: row.get("exterior")?,
            exterior_color: row.get("exterior_color")?,
            rarity: row.get("rarity")?,
            rarity_color: row.get("rarity_color")?,
            quality: row.get("quality")?,
            quality_color: row.get("quality_color")?,
            have_lease: row.get("have_lease")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

/// Aggregate figures over the whole catalog.
///
/// Price aggregates ignore NULL prices and are `None` when no row has one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogStats {
    pub total: i64,
    pub avg_price: Option<f64>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub total_on_sale: i64,
}

/// How a smart upsert resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// The id was new and the full record was stored.
    Inserted,
    /// The id existed and only market fields changed.
    Updated,
}

/// Tally of a smart batch upsert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsertSummary {
    pub new: usize,
    pub updated: usize,
    pub failed: usize,
    /// Records written, `new + updated`.
    pub total: usize,
}

impl UpsertSummary {
    pub(crate) fn record(&mut self, outcome: UpsertOutcome) {
        match outcome {
            UpsertOutcome::Inserted => self.new += 1,
            UpsertOutcome::Updated => self.updated += 1,
        }
        self.total = self.new + self.updated;
    }

    pub(crate) fn record_failure(&mut self) {
        self.failed += 1;
    }

    /// Adds another summary into this one.
    pub fn absorb(&mut self, other: Self) {
        self.new += other.new;
        self.updated += other.updated;
        self.failed += other.failed;
        self.total = self.new + self.updated;
    }
}
