//! Per-connection store handle.

use chrono::{SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, Params, TransactionBehavior, params};
use tracing::{debug, info, warn};

use crate::STORE_TARGET;
use crate::catalog::Catalog;
use crate::errors::StoreError;
use crate::item::{CatalogStats, Item, UpsertOutcome, UpsertSummary};
use crate::record::ItemRecord;
use crate::schema::{self, ITEM_COLUMNS};

/// One connection to the catalog database.
///
/// Writes take `&mut self` and hold the catalog's write gate for their whole
/// duration. Batch writes run in a single `BEGIN IMMEDIATE` transaction that
/// commits once; a record that fails is counted and skipped, the rest of the
/// batch still commits.
#[derive(Debug)]
pub struct ItemStore {
    conn: Connection,
    catalog: Catalog,
}

impl ItemStore {
    pub(crate) fn new(conn: Connection, catalog: Catalog) -> Self {
        Self { conn, catalog }
    }

    /// Writes every field of `record`, replacing an existing row with the same
    /// id but keeping its creation time.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::MissingId`] when the record has no id (or id 0) and
    /// [`StoreError::Sqlite`] when the row violates a table constraint.
    pub fn insert(&mut self, record: &ItemRecord) -> Result<(), StoreError> {
        let id = record.key().ok_or(StoreError::MissingId)?;
        let _gate = self.catalog.write_gate()?;
        write_full(&self.conn, id, record)?;
        Ok(())
    }

    /// Inserts each record in turn and returns how many succeeded.
    ///
    /// # Errors
    ///
    /// Per-record failures are logged and counted, not returned. Errors come
    /// only from the transaction itself.
    pub fn insert_batch(&mut self, records: &[ItemRecord]) -> Result<usize, StoreError> {
        let _gate = self.catalog.write_gate()?;
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let mut inserted = 0_usize;
        for record in records {
            let Some(id) = record.key() else {
                warn!(target: STORE_TARGET, "skipping record without id");
                continue;
            };
            match write_full(&tx, id, record) {
                Ok(()) => inserted += 1,
                Err(error) => warn!(target: STORE_TARGET, id, %error, "insert failed"),
            }
        }
        tx.commit()?;

        info!(
            target: STORE_TARGET,
            inserted,
            total = records.len(),
            "batch insert complete"
        );
        Ok(inserted)
    }

    /// Stores a new item in full, or refreshes only the market fields of an
    /// existing one.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::MissingId`] when the record has no id (or id 0) and
    /// [`StoreError::Sqlite`] when the write fails.
    pub fn upsert_smart(&mut self, record: &ItemRecord) -> Result<UpsertOutcome, StoreError> {
        let id = record.key().ok_or(StoreError::MissingId)?;
        let _gate = self.catalog.write_gate()?;
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let outcome = merge(&tx, id, record)?;
        tx.commit()?;
        Ok(outcome)
    }

    /// Applies [`ItemStore::upsert_smart`] to every record in one transaction.
    ///
    /// # Errors
    ///
    /// Records without an id or failing at the storage layer are tallied in
    /// [`UpsertSummary::failed`]. Errors come only from the transaction
    /// itself.
    pub fn upsert_batch_smart(
        &mut self,
        records: &[ItemRecord],
    ) -> Result<UpsertSummary, StoreError> {
        let _gate = self.catalog.write_gate()?;
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let mut summary = UpsertSummary::default();
        for record in records {
            let Some(id) = record.key() else {
                summary.record_failure();
                continue;
            };
            match merge(&tx, id, record) {
                Ok(outcome) => summary.record(outcome),
                Err(error) => {
                    warn!(target: STORE_TARGET, id, %error, "smart upsert failed");
                    summary.record_failure();
                }
            }
        }
        tx.commit()?;

        info!(
            target: STORE_TARGET,
            new = summary.new,
            updated = summary.updated,
            failed = summary.failed,
            "smart batch upsert complete"
        );
        Ok(summary)
    }

    /// Items whose display name contains `name`, ASCII case-insensitively.
    ///
    /// `%`, `_` and `\` in `name` match literally. Results are ordered by
    /// price with unpriced items last.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlite`] when the query fails.
    pub fn query_by_name(&self, name: &str) -> Result<Vec<Item>, StoreError> {
        let pattern = format!("%{}%", escape_like(name));
        self.query_items(
            &format!(
                "SELECT {ITEM_COLUMNS} FROM items WHERE commodity_name LIKE ?1 ESCAPE '\\' \
                 ORDER BY price IS NULL, price, id"
            ),
            [pattern],
        )
    }

    /// Items priced within `min..=max`, cheapest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlite`] when the query fails.
    pub fn query_by_price_range(&self, min: f64, max: f64) -> Result<Vec<Item>, StoreError> {
        if min.partial_cmp(&max).is_none_or(|order| order.is_gt()) {
            return Ok(Vec::new());
        }
        self.query_items(
            &format!(
                "SELECT {ITEM_COLUMNS} FROM items WHERE price BETWEEN ?1 AND ?2 \
                 ORDER BY price, id"
            ),
            params![min, max],
        )
    }

    /// The `limit` lowest priced items. Unpriced items never appear.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlite`] when the query fails.
    pub fn cheapest(&self, limit: u32) -> Result<Vec<Item>, StoreError> {
        self.query_items(
            &format!(
                "SELECT {ITEM_COLUMNS} FROM items WHERE price IS NOT NULL \
                 ORDER BY price, id LIMIT ?1"
            ),
            [limit],
        )
    }

    /// Up to `limit` rows in id order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlite`] when the query fails.
    pub fn dump(&self, limit: u32) -> Result<Vec<Item>, StoreError> {
        self.query_items(
            &format!("SELECT {ITEM_COLUMNS} FROM items ORDER BY id LIMIT ?1"),
            [limit],
        )
    }

    /// Looks up one item.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlite`] when the query fails.
    pub fn get(&self, id: i64) -> Result<Option<Item>, StoreError> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = ?1"))?;
        let item = stmt.query_row([id], Item::from_row).optional()?;
        Ok(item)
    }

    /// Aggregate figures over the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlite`] when the query fails.
    pub fn stats(&self) -> Result<CatalogStats, StoreError> {
        let stats = self.conn.query_row(schema::STATS, [], |row| {
            Ok(CatalogStats {
                total: row.get(0)?,
                avg_price: row.get(1)?,
                min_price: row.get(2)?,
                max_price: row.get(3)?,
                total_on_sale: row.get(4)?,
            })
        })?;
        Ok(stats)
    }

    /// Deletes every item and returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlite`] when the delete fails.
    pub fn clear_all(&mut self) -> Result<usize, StoreError> {
        let _gate = self.catalog.write_gate()?;
        let removed = self.conn.execute("DELETE FROM items", [])?;
        info!(target: STORE_TARGET, removed, "catalog cleared");
        Ok(removed)
    }

    /// Closes the connection, reporting any failure to do so.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Close`] when SQLite refuses to close.
    pub fn close(self) -> Result<(), StoreError> {
        self.conn
            .close()
            .map_err(|(_, source)| StoreError::Close(source))?;
        debug!(target: STORE_TARGET, "store handle closed");
        Ok(())
    }

    fn query_items<P: Params>(&self, sql: &str, params: P) -> Result<Vec<Item>, StoreError> {
        let mut stmt = self.conn.prepare_cached(sql)?;
        let items = stmt
            .query_map(params, Item::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }
}

fn write_full(conn: &Connection, id: i64, record: &ItemRecord) -> rusqlite::Result<()> {
    let now = timestamp();
    conn.prepare_cached(schema::UPSERT_FULL)?.execute(params![
        id,
        record.game_id,
        record.game_name,
        record.commodity_name,
        record.commodity_hash_name,
        record.icon_url,
        record.on_sale_count,
        record.price(),
        record.steam_price(),
        record.steam_usd_price(),
        record.type_name,
        record.exterior,
        record.exterior_color,
        record.rarity,
        record.rarity_color,
        record.quality,
        record.quality_color,
        record.have_lease,
        now,
    ])?;
    Ok(())
}

fn merge(conn: &Connection, id: i64, record: &ItemRecord) -> rusqlite::Result<UpsertOutcome> {
    let exists = conn
        .prepare_cached("SELECT 1 FROM items WHERE id = ?1")?
        .query_row([id], |_| Ok(()))
        .optional()?
        .is_some();
    if !exists {
        write_full(conn, id, record)?;
        return Ok(UpsertOutcome::Inserted);
    }

    conn.prepare_cached(schema::UPDATE_MARKET)?.execute(params![
        id,
        record.on_sale_count,
        record.price(),
        record.steam_price(),
        record.steam_usd_price(),
        timestamp(),
    ])?;
    Ok(UpsertOutcome::Updated)
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Escapes `LIKE` wildcards so `input` matches literally under `ESCAPE '\'`.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::plain("Redline", "Redline")]
    #[case::percent("100%", "100\\%")]
    #[case::underscore("a_b", "a\\_b")]
    #[case::backslash("a\\b", "a\\\\b")]
    fn escapes_like_wildcards(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(escape_like(input), expected);
    }

    #[test]
    fn timestamps_are_utc_with_microseconds() {
        let stamp = timestamp();
        assert!(stamp.ends_with('Z'), "{stamp}");
        let fraction = stamp
            .rsplit('.')
            .next()
            .expect("fractional seconds")
            .trim_end_matches('Z');
        assert_eq!(fraction.len(), 6, "{stamp}");
    }
}
