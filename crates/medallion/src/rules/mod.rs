//! Business rules applied during enrichment.
//!
//! A rule is a named, pure table-to-table transform. The registry maps
//! rule names from configuration to rule instances.

mod builtin;

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{MedallionError, Result, RuleError};
use crate::schema::CanonicalField;
use crate::table::DataTable;

pub use builtin::{
    MARKET_TYPE, TOTAL_SALES, add_period_features, drop_incomplete_rows, market_share,
    null_below_min_sales, sum_sales_by_market, sum_sales_by_market_period, tag_market_type,
};

/// Parameters of the built-in rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSettings {
    /// Sales below this are nulled by `null_below_min_sales`.
    pub min_sales: f64,
}

impl Default for RuleSettings {
    fn default() -> Self {
        Self { min_sales: 1.0 }
    }
}

impl RuleSettings {
    pub fn validate(&self) -> Result<()> {
        if !self.min_sales.is_finite() {
            return Err(MedallionError::Config(format!(
                "Minimum sales {} must be a finite number",
                self.min_sales
            )));
        }
        Ok(())
    }
}

type Transform = dyn Fn(&DataTable) -> std::result::Result<DataTable, RuleError> + Send + Sync;

/// A named transform from one table to another.
#[derive(Clone)]
pub struct BusinessRule {
    name: String,
    transform: Arc<Transform>,
}

impl BusinessRule {
    /// Create a rule from a closure.
    pub fn new<F>(name: impl Into<String>, transform: F) -> Self
    where
        F: Fn(&DataTable) -> std::result::Result<DataTable, RuleError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            transform: Arc::new(transform),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Apply the rule. The input is never modified.
    pub fn apply(&self, table: &DataTable) -> std::result::Result<DataTable, RuleError> {
        (self.transform)(table)
    }
}

impl fmt::Debug for BusinessRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BusinessRule")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Rules addressable by name, in registration order.
#[derive(Debug, Clone, Default)]
pub struct RuleRegistry {
    rules: IndexMap<String, BusinessRule>,
}

impl RuleRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in rules.
    ///
    /// `required_fields` parameterizes `drop_incomplete_rows`.
    pub fn with_builtins(required_fields: &[CanonicalField], settings: &RuleSettings) -> Self {
        let mut registry = Self::new();
        registry.register(sum_sales_by_market());
        registry.register(sum_sales_by_market_period());
        registry.register(add_period_features());
        registry.register(market_share());
        registry.register(drop_incomplete_rows(required_fields.to_vec()));
        registry.register(null_below_min_sales(settings.min_sales));
        registry.register(tag_market_type());
        registry
    }

    /// Add a rule, replacing any rule with the same name.
    pub fn register(&mut self, rule: BusinessRule) {
        self.rules.insert(rule.name.clone(), rule);
    }

    pub fn get(&self, name: &str) -> Option<&BusinessRule> {
        self.rules.get(name)
    }

    /// Registered rule names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.rules.keys().map(String::as_str).collect()
    }

    /// Look up rules by name, preserving the requested order.
    pub fn resolve<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<BusinessRule>> {
        names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                self.get(name).cloned().ok_or_else(|| {
                    MedallionError::Config(format!(
                        "Unknown business rule '{}' (available: {})",
                        name,
                        self.names().join(", ")
                    ))
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Value;

    #[test]
    fn test_builtins_are_registered_in_order() {
        let registry = RuleRegistry::with_builtins(&[CanonicalField::Sales], &RuleSettings::default());
        assert_eq!(
            registry.names(),
            vec![
                "sum_sales_by_market",
                "sum_sales_by_market_period",
                "add_period_features",
                "market_share",
                "drop_incomplete_rows",
                "null_below_min_sales",
                "tag_market_type",
            ]
        );
    }

    #[test]
    fn test_resolve_keeps_requested_order() {
        let registry = RuleRegistry::with_builtins(&[CanonicalField::Sales], &RuleSettings::default());
        let rules = registry
            .resolve(&["market_share", "sum_sales_by_market"])
            .unwrap();
        assert_eq!(rules[0].name(), "market_share");
        assert_eq!(rules[1].name(), "sum_sales_by_market");
    }

    #[test]
    fn test_unknown_rule_is_config_error() {
        let registry = RuleRegistry::with_builtins(&[], &RuleSettings::default());
        let err = registry.resolve(&["no_such_rule"]).unwrap_err();
        assert!(matches!(err, MedallionError::Config(_)));
        assert!(err.to_string().contains("no_such_rule"));
    }

    #[test]
    fn test_custom_rule() {
        let mut registry = RuleRegistry::new();
        registry.register(BusinessRule::new("first_row", |t: &DataTable| {
            let mut out = DataTable::empty(t.columns.clone());
            if let Some(row) = t.rows.first() {
                out.push_row(row.clone());
            }
            Ok(out)
        }));

        let table = DataTable::from_rows(
            vec!["a".into()],
            vec![vec![Value::text("x")], vec![Value::text("y")]],
        );
        let out = registry.get("first_row").unwrap().apply(&table).unwrap();
        assert_eq!(out.row_count(), 1);
        assert_eq!(table.row_count(), 2);
    }
}
