//! Table layout and statements.

use rusqlite::Connection;

pub(crate) fn create(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r"
        CREATE TABLE IF NOT EXISTS items (
          id INTEGER PRIMARY KEY,
          game_id INTEGER,
          game_name TEXT,
          commodity_name TEXT NOT NULL,
          commodity_hash_name TEXT,
          icon_url TEXT,
          on_sale_count INTEGER,
          price REAL,
          steam_price REAL,
          steam_usd_price REAL,
          type_name TEXT,
          exterior TEXT,
          exterior_color TEXT,
          rarity TEXT,
          rarity_color TEXT,
          quality TEXT,
          quality_color TEXT,
          have_lease INTEGER,
          created_at TEXT NOT NULL,
          updated_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_items_commodity_name ON items(commodity_name);
        CREATE INDEX IF NOT EXISTS idx_items_price ON items(price);
        CREATE INDEX IF NOT EXISTS idx_items_updated_at ON items(updated_at);
        ",
    )
}

/// Column list shared by every item query, in `Item` field order.
pub(crate) const ITEM_COLUMNS: &str = "id, game_id, game_name, commodity_name, \
    commodity_hash_name, icon_url, on_sale_count, price, steam_price, steam_usd_price, \
    type_name, exterior, exterior_color, rarity, rarity_color, quality, quality_color, \
    have_lease, created_at, updated_at";

// Full write. A conflicting id overwrites every field except `created_at`.
pub(crate) const UPSERT_FULL: &str = "
    INSERT INTO items (
      id, game_id, game_name, commodity_name, commodity_hash_name,
      icon_url, on_sale_count, price, steam_price, steam_usd_price,
      type_name, exterior, exterior_color, rarity, rarity_color,
      quality, quality_color, have_lease, created_at, updated_at
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?19)
    ON CONFLICT(id) DO UPDATE SET
      game_id = excluded.game_id,
      game_name = excluded.game_name,
      commodity_name = excluded.commodity_name,
      commodity_hash_name = excluded.commodity_hash_name,
      icon_url = excluded.icon_url,
      on_sale_count = excluded.on_sale_count,
      price = excluded.price,
      steam_price = excluded.steam_price,
      steam_usd_price = excluded.steam_usd_price,
      type_name = excluded.type_name,
      exterior = excluded.exterior,
      exterior_color = excluded.exterior_color,
      rarity = excluded.rarity,
      rarity_color = excluded.rarity_color,
      quality = excluded.quality,
      quality_color = excluded.quality_color,
      have_lease = excluded.have_lease,
      updated_at = excluded.updated_at";

pub(crate) const UPDATE_MARKET: &str = "
    UPDATE items SET
      on_sale_count = ?2,
      price = ?3,
      steam_price = ?4,
      steam_usd_price = ?5,
      updated_at = ?6
    WHERE id = ?1";

pub(crate) const STATS: &str = "
    SELECT COUNT(*), AVG(price), MIN(price), MAX(price), COALESCE(SUM(on_sale_count), 0)
    FROM items";
