//! The canonical market-data schema and its alias table.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{MedallionError, Result};
use crate::table::ColumnType;

/// A business-meaningful field every dataset is normalized toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    /// Market segment (RX, e-commerce, retail, ...).
    Market,
    /// Product or item name.
    Product,
    /// Sales region.
    Region,
    /// Reporting period or order date.
    Period,
    /// Sales metric (amount or quantity).
    Sales,
}

impl CanonicalField {
    /// All canonical fields in schema order.
    pub const ALL: [CanonicalField; 5] = [
        CanonicalField::Market,
        CanonicalField::Product,
        CanonicalField::Region,
        CanonicalField::Period,
        CanonicalField::Sales,
    ];

    /// Column name used in normalized tables.
    pub fn name(&self) -> &'static str {
        match self {
            CanonicalField::Market => "market",
            CanonicalField::Product => "product",
            CanonicalField::Region => "region",
            CanonicalField::Period => "period",
            CanonicalField::Sales => "sales",
        }
    }

    /// Type values of this field are coerced to.
    pub fn column_type(&self) -> ColumnType {
        match self {
            CanonicalField::Market | CanonicalField::Product | CanonicalField::Region => {
                ColumnType::Categorical
            }
            CanonicalField::Period => ColumnType::Date,
            CanonicalField::Sales => ColumnType::Numeric,
        }
    }

    /// Look up a field by its canonical column name.
    pub fn from_column_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CanonicalField {
    type Err = MedallionError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_column_name(&normalize_header(s))
            .ok_or_else(|| MedallionError::Config(format!("Unknown canonical field '{}'", s)))
    }
}

/// Normalize a header for alias matching: drop all whitespace (including
/// embedded newlines and ideographic spaces) and lowercase.
pub fn normalize_header(header: &str) -> String {
    header
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Mapping of canonical field to the source headers recognized for it.
///
/// A field's own name is always recognized and need not be listed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AliasTable {
    aliases: IndexMap<CanonicalField, Vec<String>>,
}

impl AliasTable {
    /// Create an alias table with no aliases beyond the canonical names.
    pub fn new() -> Self {
        Self {
            aliases: IndexMap::new(),
        }
    }

    /// Add aliases for a field.
    pub fn with_aliases<I, S>(mut self, field: CanonicalField, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases
            .entry(field)
            .or_default()
            .extend(aliases.into_iter().map(Into::into));
        self
    }

    /// Aliases configured for a field.
    pub fn aliases(&self, field: CanonicalField) -> &[String] {
        self.aliases.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Build the normalized-header lookup.
    ///
    /// Fails if the same normalized alias is claimed by two fields.
    pub fn lookup(&self) -> Result<HashMap<String, CanonicalField>> {
        let mut lookup = HashMap::new();

        for field in CanonicalField::ALL {
            lookup.insert(field.name().to_string(), field);
        }

        for (&field, aliases) in &self.aliases {
            for alias in aliases {
                let key = normalize_header(alias);
                if key.is_empty() {
                    return Err(MedallionError::Config(format!(
                        "Blank alias configured for '{}'",
                        field
                    )));
                }
                match lookup.insert(key.clone(), field) {
                    Some(existing) if existing != field => {
                        return Err(MedallionError::Config(format!(
                            "Alias '{}' is claimed by both '{}' and '{}'",
                            alias, existing, field
                        )));
                    }
                    _ => {}
                }
            }
        }

        Ok(lookup)
    }

    /// Check the table for conflicting or blank aliases.
    pub fn validate(&self) -> Result<()> {
        self.lookup().map(|_| ())
    }
}

impl Default for AliasTable {
    /// Aliases seen in the market spreadsheets this engine was built for:
    /// English headers plus the Chinese and mixed headers of the source
    /// workbooks.
    fn default() -> Self {
        Self::new()
            .with_aliases(
                CanonicalField::Market,
                ["市场", "市场类型", "市场类别", "渠道", "segment", "channel", "market type"],
            )
            .with_aliases(
                CanonicalField::Product,
                ["产品", "产品名称", "ItemName", "ItemName产品名称", "item", "item name", "sku"],
            )
            .with_aliases(
                CanonicalField::Region,
                ["区域", "地区", "省份", "大区", "area", "province", "territory"],
            )
            .with_aliases(
                CanonicalField::Period,
                [
                    "日期",
                    "订单日期",
                    "月份",
                    "OrderDate",
                    "OrderDate订单日期",
                    "ReportMonth",
                    "date",
                    "month",
                    "order date",
                ],
            )
            .with_aliases(
                CanonicalField::Sales,
                [
                    "销售额",
                    "销量",
                    "数量",
                    "QTY",
                    "QTY数量",
                    "quantity",
                    "amount",
                    "revenue",
                    "sales amount",
                ],
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header("  Order\nDate "), "orderdate");
        assert_eq!(normalize_header("QTY 数量"), "qty数量");
        assert_eq!(normalize_header("销售额\u{3000}"), "销售额");
    }

    #[test]
    fn test_default_lookup_resolves_chinese_headers() {
        let lookup = AliasTable::default().lookup().unwrap();
        assert_eq!(lookup.get("市场"), Some(&CanonicalField::Market));
        assert_eq!(lookup.get("产品"), Some(&CanonicalField::Product));
        assert_eq!(lookup.get("销售额"), Some(&CanonicalField::Sales));
        assert_eq!(lookup.get("itemname产品名称"), Some(&CanonicalField::Product));
        assert_eq!(lookup.get("sales"), Some(&CanonicalField::Sales));
    }

    #[test]
    fn test_conflicting_alias_rejected() {
        let table = AliasTable::new()
            .with_aliases(CanonicalField::Market, ["channel"])
            .with_aliases(CanonicalField::Region, ["Channel"]);
        assert!(matches!(table.validate(), Err(MedallionError::Config(_))));
    }

    #[test]
    fn test_alias_cannot_shadow_canonical_name() {
        let table = AliasTable::new().with_aliases(CanonicalField::Sales, ["market"]);
        assert!(table.validate().is_err());
    }

    #[test]
    fn test_alias_table_json_shape() {
        let table = AliasTable::new().with_aliases(CanonicalField::Market, ["市场"]);
        let json = serde_json::to_string(&table).unwrap();
        assert_eq!(json, r#"{"market":["市场"]}"#);
    }

    #[test]
    fn test_field_from_str() {
        assert_eq!("Sales".parse::<CanonicalField>().unwrap(), CanonicalField::Sales);
        assert!("volume".parse::<CanonicalField>().is_err());
    }
}
