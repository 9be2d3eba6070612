//! Ingestion shape of an item and numeric coercion.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// An item as delivered by the marketplace feed.
///
/// Keys follow the feed's camelCase convention and unknown keys are ignored.
/// Price fields stay as raw JSON because the feed mixes strings, numbers and
/// nulls; they are coerced with [`to_float`] on every write.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ItemRecord {
    pub id: Option<i64>,
    pub game_id: Option<i64>,
    pub game_name: Option<String>,
    pub commodity_name: Option<String>,
    pub commodity_hash_name: Option<String>,
    pub icon_url: Option<String>,
    pub on_sale_count: Option<i64>,
    pub price: Value,
    pub steam_price: Value,
    pub steam_usd_price: Value,
    pub type_name: Option<String>,
    pub exterior: Option<String>,
    pub exterior_color: Option<String>,
    pub rarity: Option<String>,
    pub rarity_color: Option<String>,
    pub quality: Option<String>,
    pub quality_color: Option<String>,
    #[serde(deserialize_with = "deserialize_flag")]
    pub have_lease: Option<bool>,
}

impl ItemRecord {
    /// Decodes one record from a JSON value.
    ///
    /// # Errors
    ///
    /// Fails when a typed field holds a value of the wrong kind, for example a
    /// string `id`.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Row key of the record. An id of zero counts as absent.
    #[must_use]
    pub fn key(&self) -> Option<i64> {
        self.id.filter(|id| *id != 0)
    }

    pub(crate) fn price(&self) -> Option<f64> {
        to_float(&self.price)
    }

    pub(crate) fn steam_price(&self) -> Option<f64> {
        to_float(&self.steam_price)
    }

    pub(crate) fn steam_usd_price(&self) -> Option<f64> {
        to_float(&self.steam_usd_price)
    }
}

/// Converts a loosely typed JSON value into a finite float.
///
/// Numbers convert directly. Strings are trimmed and parsed. Everything else,
/// including blank strings, booleans and non-finite results, yields `None`.
#[must_use]
pub fn to_float(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                None
            } else {
                trimmed.parse::<f64>().ok()
            }
        }
        _ => None,
    };
    parsed.filter(|number| number.is_finite())
}

/// Accepts `true`/`false` or an integer where non-zero means set.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    let flag = Option::<Flag>::deserialize(deserializer)?;
    Ok(flag.map(|flag| match flag {
        Flag::Bool(value) => value,
        Flag::Int(value) => value != 0,
    }))
}
