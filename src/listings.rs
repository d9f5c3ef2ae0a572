//! The listings queries: filter, projection and sort construction, count
//! criteria, and console formatting of result records.

use bson::{Bson, Document as BsonDocument, doc};
use serde::{Deserialize, Serialize};

use crate::errors::DbError;

/// Fields returned by the scan query.
pub const SCAN_FIELDS: &[&str] = &[
    "id",
    "price",
    "neighbourhood_cleansed",
    "accommodates",
    "smart_location",
    "minimum_nights_avg_ntm",
];

/// `price <= price_limit AND minimum_nights_avg_ntm == min_nights_limit`
#[must_use]
pub fn scan_filter(price_limit: i32, min_nights_limit: i32) -> BsonDocument {
    doc! {
        "price": { "$lte": price_limit },
        "minimum_nights_avg_ntm": { "$eq": min_nights_limit },
    }
}

#[must_use]
pub fn scan_projection() -> BsonDocument {
    let mut projection = doc! { "_id": 0 };
    for field in SCAN_FIELDS {
        projection.insert(*field, 1);
    }
    projection
}

#[must_use]
pub fn scan_sort() -> BsonDocument {
    doc! { "price": 1 }
}

/// One scan-query input pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanInput {
    pub price_limit: i32,
    pub min_nights_limit: i32,
}

impl ScanInput {
    #[must_use]
    pub const fn new(price_limit: i32, min_nights_limit: i32) -> Self {
        Self { price_limit, min_nights_limit }
    }
}

/// Inclusive zipcode bounds. A range only counts as supplied when
/// `start >= 0 && end > 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZipcodeRange {
    pub start: i32,
    pub end: i32,
}

impl ZipcodeRange {
    #[must_use]
    pub const fn is_usable(&self) -> bool {
        self.start >= 0 && self.end > 0
    }
}

/// Selects how the count query narrows listings before the bedroom test.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountCriteria {
    pub zipcode: Option<ZipcodeRange>,
    pub city: Option<String>,
}

impl CountCriteria {
    #[must_use]
    pub const fn zipcodes(start: i32, end: i32) -> Self {
        Self { zipcode: Some(ZipcodeRange { start, end }), city: None }
    }

    #[must_use]
    pub fn city(name: impl Into<String>) -> Self {
        Self { zipcode: None, city: Some(name.into()) }
    }

    /// Builds the count filter.
    ///
    /// # Errors
    /// `InvalidArgument` when neither a usable zipcode range nor a non-empty
    /// city is given, or when both are.
    pub fn filter(&self, bedroom_limit: i32) -> Result<BsonDocument, DbError> {
        let range = self.zipcode.filter(ZipcodeRange::is_usable);
        let city = self.city.as_deref().filter(|c| !c.is_empty());
        match (range, city) {
            (Some(r), None) => Ok(doc! {
                "zipcode": { "$gte": r.start, "$lte": r.end },
                "bedrooms": { "$gt": bedroom_limit },
            }),
            (None, Some(c)) => Ok(doc! {
                "city": { "$eq": c },
                "bedrooms": { "$gt": bedroom_limit },
            }),
            (Some(_), Some(_)) => Err(DbError::InvalidArgument(
                "both a zipcode range and a city were given; supply exactly one".into(),
            )),
            (None, None) => Err(DbError::InvalidArgument(
                "count query needs a zipcode range (start >= 0, end > 0) or a city name".into(),
            )),
        }
    }

    /// Short human description used in summary lines.
    #[must_use]
    pub fn describe(&self) -> String {
        match (&self.zipcode, &self.city) {
            (Some(r), _) if r.is_usable() => format!("in zipcodes {}-{}", r.start, r.end),
            (_, Some(c)) if !c.is_empty() => format!("in the city of {c}"),
            _ => "with no location filter".to_string(),
        }
    }
}

/// Renders a scalar for console output without BSON's string quoting.
#[must_use]
pub fn display_value(v: &Bson) -> String {
    match v {
        Bson::String(s) => s.clone(),
        Bson::Double(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{f:.0}"),
        Bson::Double(f) => format!("{f:.2}"),
        Bson::Int32(i) => i.to_string(),
        Bson::Int64(i) => i.to_string(),
        Bson::Null => "n/a".to_string(),
        other => other.to_string(),
    }
}

fn field(doc: &BsonDocument, key: &str) -> String {
    doc.get(key).map_or_else(|| "?".to_string(), display_value)
}

/// Header printed before the records of one scan query.
#[must_use]
pub fn scan_header(input: ScanInput) -> String {
    format!(
        "Here are all of the {}-night stays that cost at most ${}:\n{}",
        input.min_nights_limit,
        input.price_limit,
        "-".repeat(50)
    )
}

/// One console line for a projected listing.
#[must_use]
pub fn format_listing(doc: &BsonDocument) -> String {
    let mut line = format!(
        "Book out at listing #{} in {} - {}",
        field(doc, "id"),
        field(doc, "neighbourhood_cleansed"),
        field(doc, "smart_location"),
    );
    if let Some(n) = doc.get("accommodates") {
        line.push_str(&format!(", which accommodates {} people,", display_value(n)));
    }
    line.push_str(&format!(
        " for {} night(s) at ${}!",
        field(doc, "minimum_nights_avg_ntm"),
        field(doc, "price")
    ));
    line
}
