//! Club financial record types
//!
//! Defines the per-club snapshot record that every other module consumes,
//! together with its canonical text rendering used for embeddings.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

#[cfg(test)]
use proptest::prelude::*;
#[cfg(test)]
use proptest_derive::Arbitrary;

/// One club's financial snapshot for one reporting period.
///
/// Field names match the persisted `ffp_data_<period>.json` files. Monetary
/// fields are signed, in whole currency units (pounds), and whole amounts
/// serialize as JSON integers the way the collector writes them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(test, derive(Arbitrary))]
pub struct ClubRecord {
    /// Stable club identifier (e.g. `arsenal`)
    #[cfg_attr(test, proptest(strategy = "\"[a-z][a-z-]{1,15}\""))]
    pub club: String,

    /// Reporting period (season end year)
    #[cfg_attr(test, proptest(strategy = "2000i32..2035"))]
    pub year: i32,

    #[serde(default, serialize_with = "serialize_amount")]
    #[cfg_attr(test, proptest(strategy = "-1.0e10f64..1.0e10f64"))]
    pub revenue: f64,

    #[serde(default, serialize_with = "serialize_amount")]
    #[cfg_attr(test, proptest(strategy = "-1.0e10f64..1.0e10f64"))]
    pub wages: f64,

    #[serde(default, serialize_with = "serialize_amount")]
    #[cfg_attr(test, proptest(strategy = "-1.0e10f64..1.0e10f64"))]
    pub transfer_spending: f64,

    #[serde(default, serialize_with = "serialize_amount")]
    #[cfg_attr(test, proptest(strategy = "-1.0e10f64..1.0e10f64"))]
    pub net_spend: f64,

    #[serde(default, serialize_with = "serialize_amount")]
    #[cfg_attr(test, proptest(strategy = "-1.0e10f64..1.0e10f64"))]
    pub profit_loss: f64,

    #[serde(default, serialize_with = "serialize_amount")]
    #[cfg_attr(test, proptest(strategy = "-1.0e10f64..1.0e10f64"))]
    pub debt: f64,

    #[serde(default, serialize_with = "serialize_amount")]
    #[cfg_attr(test, proptest(strategy = "-1.0e10f64..1.0e10f64"))]
    pub squad_cost: f64,

    /// Financial Fair Play compliance status
    #[serde(default)]
    pub ffp_compliance: Compliance,

    /// When the source collected this record. Offset-less timestamps are
    /// read as UTC.
    #[serde(
        default,
        deserialize_with = "deserialize_scraped_at",
        skip_serializing_if = "Option::is_none"
    )]
    #[cfg_attr(test, proptest(value = "None"))]
    pub scraped_at: Option<DateTime<Utc>>,

    /// Any additional source fields, kept verbatim
    #[serde(flatten)]
    #[cfg_attr(test, proptest(value = "BTreeMap::new()"))]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl ClubRecord {
    /// Create a record with all metrics zeroed and compliance unknown
    pub fn new(club: impl Into<String>, year: i32) -> Self {
        Self {
            club: club.into(),
            year,
            revenue: 0.0,
            wages: 0.0,
            transfer_spending: 0.0,
            net_spend: 0.0,
            profit_loss: 0.0,
            debt: 0.0,
            squad_cost: 0.0,
            ffp_compliance: Compliance::Unknown,
            scraped_at: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_revenue(mut self, revenue: f64) -> Self {
        self.revenue = revenue;
        self
    }

    pub fn with_wages(mut self, wages: f64) -> Self {
        self.wages = wages;
        self
    }

    pub fn with_transfer_spending(mut self, spending: f64) -> Self {
        self.transfer_spending = spending;
        self
    }

    pub fn with_net_spend(mut self, net_spend: f64) -> Self {
        self.net_spend = net_spend;
        self
    }

    pub fn with_profit_loss(mut self, profit_loss: f64) -> Self {
        self.profit_loss = profit_loss;
        self
    }

    pub fn with_debt(mut self, debt: f64) -> Self {
        self.debt = debt;
        self
    }

    pub fn with_squad_cost(mut self, squad_cost: f64) -> Self {
        self.squad_cost = squad_cost;
        self
    }

    pub fn with_compliance(mut self, compliance: Compliance) -> Self {
        self.ffp_compliance = compliance;
        self
    }

    /// Entity identifier used as the document id in the vector index
    pub fn entity_id(&self) -> &str {
        &self.club
    }

    /// Reporting period of this record
    pub fn period(&self) -> i32 {
        self.year
    }

    /// Canonical, human-readable rendering of the record.
    ///
    /// This is a pure function of the known fields: equal records always
    /// render to byte-identical text. `scraped_at` and `extra` are excluded so
    /// that re-collecting unchanged figures does not force a re-embed.
    pub fn rendered_text(&self) -> String {
        format!(
            "Club: {}\n\
             Year: {}\n\
             Revenue: {}\n\
             Wages: {}\n\
             Transfer Spending: {}\n\
             Net Spend: {}\n\
             Profit/Loss: {}\n\
             Debt: {}\n\
             Squad Cost: {}\n\
             FFP Compliance: {}",
            self.club,
            self.year,
            format_millions(self.revenue),
            format_millions(self.wages),
            format_millions(self.transfer_spending),
            format_millions(self.net_spend),
            format_millions(self.profit_loss),
            format_millions(self.debt),
            format_millions(self.squad_cost),
            self.ffp_compliance.label(),
        )
    }

    /// The full record as a JSON value, as stored in document metadata
    pub fn to_metadata(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

/// Format an amount in pounds as `£<millions>M` with one decimal place
fn format_millions(amount: f64) -> String {
    format!("£{:.1}M", amount / 1_000_000.0)
}

/// Largest magnitude below which every whole f64 is an exact i64
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

fn serialize_amount<S: Serializer>(amount: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if amount.fract() == 0.0 && amount.abs() < MAX_EXACT_INTEGER {
        serializer.serialize_i64(*amount as i64)
    } else {
        serializer.serialize_f64(*amount)
    }
}

/// Parse a collection timestamp, with or without a UTC offset
pub fn parse_scraped_at(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn deserialize_scraped_at<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(value) => parse_scraped_at(&value).map(Some).ok_or_else(|| {
            de::Error::invalid_value(de::Unexpected::Str(&value), &"an ISO 8601 timestamp")
        }),
    }
}

/// Tri-state FFP compliance flag.
///
/// Source data has used both booleans and strings for this field, so
/// deserialization accepts either (and `null`), while serialization always
/// emits the canonical lowercase string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(test, derive(Arbitrary))]
pub enum Compliance {
    Compliant,
    NonCompliant,
    Unknown,
}

impl Default for Compliance {
    fn default() -> Self {
        Compliance::Unknown
    }
}

impl Compliance {
    /// Canonical serialized form
    pub fn as_str(&self) -> &'static str {
        match self {
            Compliance::Compliant => "compliant",
            Compliance::NonCompliant => "non_compliant",
            Compliance::Unknown => "unknown",
        }
    }

    /// Label used in rendered text
    pub fn label(&self) -> &'static str {
        match self {
            Compliance::Compliant => "Yes",
            Compliance::NonCompliant => "No",
            Compliance::Unknown => "Unknown",
        }
    }

    /// Parse from any of the spellings seen in source data
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compliant" | "yes" | "true" | "y" => Some(Compliance::Compliant),
            "non_compliant" | "non-compliant" | "noncompliant" | "no" | "false" | "n" => {
                Some(Compliance::NonCompliant)
            }
            "unknown" | "" => Some(Compliance::Unknown),
            _ => None,
        }
    }
}

impl From<bool> for Compliance {
    fn from(value: bool) -> Self {
        if value {
            Compliance::Compliant
        } else {
            Compliance::NonCompliant
        }
    }
}

impl fmt::Display for Compliance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Compliance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Compliance {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ComplianceVisitor;

        impl<'de> Visitor<'de> for ComplianceVisitor {
            type Value = Compliance;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a boolean, null, or a compliance string")
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<Compliance, E> {
                Ok(Compliance::from(v))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Compliance, E> {
                Compliance::parse(v)
                    .ok_or_else(|| E::invalid_value(de::Unexpected::Str(v), &self))
            }

            fn visit_unit<E: de::Error>(self) -> Result<Compliance, E> {
                Ok(Compliance::Unknown)
            }

            fn visit_none<E: de::Error>(self) -> Result<Compliance, E> {
                Ok(Compliance::Unknown)
            }

            fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Compliance, D::Error> {
                d.deserialize_any(self)
            }
        }

        deserializer.deserialize_any(ComplianceVisitor)
    }
}
