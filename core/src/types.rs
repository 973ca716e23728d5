//! Domain DTOs for the drug API.
//!
//! # Design
//! These types mirror the mock-server's schema but are defined independently.
//! Integration tests catch any schema drift between the two crates.
//!
//! Backends differ in how they print timestamps (RFC 3339 with an offset, or a
//! naive ISO-8601 string in UTC), so `Drug` accepts both and always writes
//! RFC 3339.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single drug record returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Drug {
    pub id: String,
    pub name: String,
    pub category: String,
    pub description: String,
    pub active_ingredients: Vec<String>,
    pub dosage_forms: Vec<String>,
    #[serde(default)]
    pub side_effects: Vec<String>,
    #[serde(default)]
    pub contraindications: Vec<String>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl Drug {
    /// True when every field except the timestamps matches.
    pub fn same_content(&self, other: &Drug) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.category == other.category
            && self.description == other.description
            && self.active_ingredients == other.active_ingredients
            && self.dosage_forms == other.dosage_forms
            && self.side_effects == other.side_effects
            && self.contraindications == other.contraindications
    }
}

/// Payload for `POST /drugs` and `PUT /drugs/{id}`.
///
/// Produced by `DrugForm::validate`, so it only ever carries non-blank
/// `name`/`category`/`description` and non-empty required lists.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DrugDraft {
    pub name: String,
    pub category: String,
    pub description: String,
    pub active_ingredients: Vec<String>,
    pub dosage_forms: Vec<String>,
    pub side_effects: Vec<String>,
    pub contraindications: Vec<String>,
}

/// A drug classification label.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl Category {
    pub fn from_name(name: &str) -> Self {
        Self {
            id: slugify(name),
            name: name.to_string(),
            description: String::new(),
        }
    }
}

/// `/categories` answers either with bare names or with full objects.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum CategoryEntry {
    Name(String),
    Full(Category),
}

impl From<CategoryEntry> for Category {
    fn from(entry: CategoryEntry) -> Self {
        match entry {
            CategoryEntry::Name(name) => Category::from_name(&name),
            CategoryEntry::Full(category) => category,
        }
    }
}

/// Lower-case `name` and join its whitespace-separated words with `-`.
pub fn slugify(name: &str) -> String {
    name.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

/// Query filter for `GET /drugs`.
///
/// `None` and empty strings are never sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrugFilter {
    pub name: Option<String>,
    pub category: Option<String>,
    pub ingredient: Option<String>,
    pub created_after: Option<String>,
    pub created_before: Option<String>,
    pub skip: Option<u32>,
    pub limit: Option<u32>,
}

impl DrugFilter {
    pub fn by_name(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Self::default()
        }
    }

    /// Set `skip`/`limit` for a 1-based display page.
    pub fn page(mut self, page: u32, items_per_page: u32) -> Self {
        self.skip = Some(page.saturating_sub(1).saturating_mul(items_per_page));
        self.limit = Some(items_per_page);
        self
    }

    /// Key/value pairs that carry a value, in a stable order.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let text = [
            ("name", &self.name),
            ("category", &self.category),
            ("ingredient", &self.ingredient),
            ("created_after", &self.created_after),
            ("created_before", &self.created_before),
        ];
        let mut pairs: Vec<(&'static str, String)> = text
            .into_iter()
            .filter_map(|(key, value)| match value.as_deref() {
                Some(v) if !v.is_empty() => Some((key, v.to_string())),
                _ => None,
            })
            .collect();
        if let Some(skip) = self.skip {
            pairs.push(("skip", skip.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        pairs
    }

    /// Percent-encoded query string without the leading `?`.
    pub fn to_query_string(&self) -> String {
        self.query_pairs()
            .iter()
            .map(|(key, value)| format!("{key}={}", urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

mod timestamp {
    use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Micros, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        if let Ok(dt) = DateTime::parse_from_rfc3339(&raw) {
            return Ok(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| naive.and_utc())
            .map_err(|e| de::Error::custom(format!("invalid timestamp {raw:?}: {e}")))
    }
}
