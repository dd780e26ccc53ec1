//! Fundamentals report and company metadata types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Raw fundamentals report: report-date label to field name to raw value.
///
/// Labels are whatever the provider emitted (`2024-03-31`,
/// `2024-03-31T00:00:00`, ...); values may be numbers, numeric strings or
/// junk. The merger decides what is usable.
pub type RawFundamentals = BTreeMap<String, BTreeMap<String, Value>>;

/// A fundamentals field the merger knows how to carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FundamentalField {
    /// Total assets.
    TotalAssets,
    /// Total liabilities.
    TotalLiabilities,
    /// Ordinary shares outstanding.
    SharesOutstanding,
}

impl FundamentalField {
    /// Every recognized field.
    pub const ALL: [Self; 3] = [
        Self::TotalAssets,
        Self::TotalLiabilities,
        Self::SharesOutstanding,
    ];

    /// Provider labels accepted for this field.
    #[must_use]
    pub const fn aliases(&self) -> &'static [&'static str] {
        match self {
            Self::TotalAssets => &["TotalAssets", "Total Assets", "totalAssets", "Assets"],
            Self::TotalLiabilities => &[
                "TotalLiab",
                "TotalLiabilities",
                "Total Liabilities",
                "TotalLiabilitiesNetMinorityInterest",
                "Total Liabilities Net Minority Interest",
                "Liabilities",
            ],
            Self::SharesOutstanding => &[
                "OrdinarySharesNumber",
                "Ordinary Shares Number",
                "SharesOutstanding",
                "Shares Outstanding",
                "sharesOutstanding",
                "CommonStockSharesOutstanding",
            ],
        }
    }

    /// Resolves a provider label to a field.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|field| field.aliases().contains(&label))
    }

    /// Column name used in exported tables.
    #[must_use]
    pub const fn column_name(&self) -> &'static str {
        match self {
            Self::TotalAssets => "total_assets",
            Self::TotalLiabilities => "total_liabilities",
            Self::SharesOutstanding => "shares_outstanding",
        }
    }
}

impl fmt::Display for FundamentalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

/// Values of the recognized fundamentals fields for one date.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FundamentalValues {
    /// Total assets.
    pub total_assets: Option<f64>,
    /// Total liabilities.
    pub total_liabilities: Option<f64>,
    /// Ordinary shares outstanding.
    pub shares_outstanding: Option<f64>,
}

impl FundamentalValues {
    /// Returns the value of a field.
    #[must_use]
    pub const fn get(&self, field: FundamentalField) -> Option<f64> {
        match field {
            FundamentalField::TotalAssets => self.total_assets,
            FundamentalField::TotalLiabilities => self.total_liabilities,
            FundamentalField::SharesOutstanding => self.shares_outstanding,
        }
    }

    /// Sets the value of a field.
    pub fn set(&mut self, field: FundamentalField, value: Option<f64>) {
        match field {
            FundamentalField::TotalAssets => self.total_assets = value,
            FundamentalField::TotalLiabilities => self.total_liabilities = value,
            FundamentalField::SharesOutstanding => self.shares_outstanding = value,
        }
    }

    /// Returns true if no field has a value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        FundamentalField::ALL
            .iter()
            .all(|field| self.get(*field).is_none())
    }
}

/// Company metadata used for ratio derivation.
///
/// Built leniently from a provider's flat info map: non-numeric values are
/// treated as absent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyInfo {
    /// Display name.
    pub name: Option<String>,
    /// Book value per share, as reported.
    pub book_value: Option<f64>,
    /// Enterprise value.
    pub enterprise_value: Option<f64>,
    /// Shares outstanding.
    pub shares_outstanding: Option<f64>,
    /// Total assets.
    pub total_assets: Option<f64>,
}

impl CompanyInfo {
    /// Extracts the known fields from a flat info map.
    #[must_use]
    pub fn from_fields(fields: &Map<String, Value>) -> Self {
        let number = |key: &str| fields.get(key).and_then(numeric_value);
        let name = ["longName", "shortName", "name"]
            .into_iter()
            .filter_map(|key| fields.get(key).and_then(Value::as_str))
            .map(str::trim)
            .find(|name| !name.is_empty())
            .map(str::to_string);

        Self {
            name,
            book_value: number("bookValue"),
            enterprise_value: number("enterpriseValue"),
            shares_outstanding: number("sharesOutstanding"),
            total_assets: number("totalAssets"),
        }
    }
}

/// Reads a finite number from a JSON number or numeric string.
#[must_use]
pub fn numeric_value(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

/// Returns the value only if it is present and non-zero.
#[must_use]
pub fn truthy(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v != 0.0)
}
