//! Workplace profile records and the column layout shared by the CSV files,
//! the feature pipeline and the prediction boundary.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const ROLE: &str = "role";
pub const USES_DESIGN_TOOLS: &str = "uses_design_tools";
pub const USES_OFFICE_APPS: &str = "uses_office_apps";
pub const REQUIRES_WINDOWS_ONLY_APPS: &str = "requires_windows_only_apps";
pub const MOBILITY: &str = "mobility";
pub const SECURITY_SENSITIVITY: &str = "security_sensitivity";
pub const BUDGET_SENSITIVITY: &str = "budget_sensitivity";
pub const PREFERRED_OS: &str = "preferred_os";
/// Training label column; absent from inference input.
pub const LABEL_COLUMN: &str = "recommend_mac";

/// Feature columns in file order.
pub const FEATURE_COLUMNS: [&str; 8] = [
    ROLE,
    USES_DESIGN_TOOLS,
    USES_OFFICE_APPS,
    REQUIRES_WINDOWS_ONLY_APPS,
    MOBILITY,
    SECURITY_SENSITIVITY,
    BUDGET_SENSITIVITY,
    PREFERRED_OS,
];

/// Columns that are one-hot encoded.
pub const CATEGORICAL_COLUMNS: [&str; 5] = [
    ROLE,
    MOBILITY,
    SECURITY_SENSITIVITY,
    BUDGET_SENSITIVITY,
    PREFERRED_OS,
];

/// Binary columns passed through unchanged.
pub const INDICATOR_COLUMNS: [&str; 3] =
    [USES_DESIGN_TOOLS, USES_OFFICE_APPS, REQUIRES_WINDOWS_ONLY_APPS];

/// Error returned when a string is outside an enumerated domain.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {domain} value: {value:?}")]
pub struct UnknownVariant {
    pub domain: &'static str,
    pub value: String,
}

macro_rules! categorical_enum {
    ($(#[$meta:meta])* $name:ident, $domain:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value {
                    $($text => Ok($name::$variant),)+
                    _ => Err(UnknownVariant {
                        domain: $domain,
                        value: value.to_string(),
                    }),
                }
            }
        }
    };
}

categorical_enum!(
    /// Job role of the employee.
    Role, "role", {
        Developer => "Developer",
        Designer => "Designer",
        Marketing => "Marketing",
        Management => "Management",
        Support => "Support",
        DataScientist => "DataScientist",
    }
);

categorical_enum!(
    /// Three-step scale used for mobility, security and budget sensitivity.
    Level, "level", {
        Low => "low",
        Medium => "medium",
        High => "high",
    }
);

categorical_enum!(
    /// Operating system the employee prefers.
    OsPreference, "preferred_os", {
        Mac => "mac",
        Windows => "windows",
        Linux => "linux",
        NoPreference => "none",
    }
);

/// Check `value` against the domain of a categorical `column` and return its
/// canonical text.
pub fn canonical_category(column: &str, value: &str) -> Result<&'static str, UnknownVariant> {
    match column {
        ROLE => value.parse::<Role>().map(Role::as_str),
        MOBILITY | SECURITY_SENSITIVITY | BUDGET_SENSITIVITY => {
            value.parse::<Level>().map(Level::as_str)
        }
        PREFERRED_OS => value.parse::<OsPreference>().map(OsPreference::as_str),
        _ => Err(UnknownVariant {
            domain: "categorical column",
            value: column.to_string(),
        }),
    }
}

/// One synthesized workplace profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub role: Role,
    pub uses_design_tools: bool,
    pub uses_office_apps: bool,
    pub requires_windows_only_apps: bool,
    pub mobility: Level,
    pub security_sensitivity: Level,
    pub budget_sensitivity: Level,
    pub preferred_os: OsPreference,
    /// Ground-truth label; `None` for inference input.
    pub recommend_mac: Option<bool>,
}

/// A single cell of an untyped row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Indicator(u8),
    Category(String),
}

impl FieldValue {
    pub fn category(value: impl Into<String>) -> Self {
        FieldValue::Category(value.into())
    }

    pub fn indicator(value: bool) -> Self {
        FieldValue::Indicator(u8::from(value))
    }
}

/// Column-name to value map used at the loader and prediction boundaries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord {
    fields: BTreeMap<String, FieldValue>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the feature columns of a typed record. The label is not included.
    pub fn from_record(record: &Record) -> Self {
        let mut raw = Self::new();
        raw.insert(ROLE, FieldValue::category(record.role.as_str()));
        raw.insert(USES_DESIGN_TOOLS, FieldValue::indicator(record.uses_design_tools));
        raw.insert(USES_OFFICE_APPS, FieldValue::indicator(record.uses_office_apps));
        raw.insert(
            REQUIRES_WINDOWS_ONLY_APPS,
            FieldValue::indicator(record.requires_windows_only_apps),
        );
        raw.insert(MOBILITY, FieldValue::category(record.mobility.as_str()));
        raw.insert(
            SECURITY_SENSITIVITY,
            FieldValue::category(record.security_sensitivity.as_str()),
        );
        raw.insert(
            BUDGET_SENSITIVITY,
            FieldValue::category(record.budget_sensitivity.as_str()),
        );
        raw.insert(PREFERRED_OS, FieldValue::category(record.preferred_os.as_str()));
        raw
    }

    pub fn insert(&mut self, column: impl Into<String>, value: FieldValue) -> Option<FieldValue> {
        self.fields.insert(column.into(), value)
    }

    pub fn remove(&mut self, column: &str) -> Option<FieldValue> {
        self.fields.remove(column)
    }

    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.fields.get(column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.fields.contains_key(column)
    }

    /// Column names in sorted order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<(String, FieldValue)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enums_parse_their_own_text() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), *role);
        }
        assert_eq!("none".parse::<OsPreference>().unwrap(), OsPreference::NoPreference);
        let err = "Chef".parse::<Role>().unwrap_err();
        assert_eq!(err.domain, "role");
    }

    #[test]
    fn canonical_category_checks_the_column_domain() {
        assert_eq!(canonical_category(MOBILITY, "high"), Ok("high"));
        assert_eq!(canonical_category(PREFERRED_OS, "none"), Ok("none"));
        assert!(canonical_category(PREFERRED_OS, "MAC").is_err());
        assert!(canonical_category(BUDGET_SENSITIVITY, "extreme").is_err());
        assert!(canonical_category(USES_DESIGN_TOOLS, "1").is_err());
    }

    #[test]
    fn raw_record_parses_mixed_json() {
        let raw: RawRecord =
            serde_json::from_str(r#"{"role": "Designer", "uses_design_tools": 1}"#).unwrap();
        assert_eq!(raw.get(ROLE), Some(&FieldValue::category("Designer")));
        assert_eq!(raw.get(USES_DESIGN_TOOLS), Some(&FieldValue::Indicator(1)));
    }

    #[test]
    fn from_record_covers_every_feature_column() {
        let record = Record {
            role: Role::Support,
            uses_design_tools: false,
            uses_office_apps: true,
            requires_windows_only_apps: true,
            mobility: Level::Low,
            security_sensitivity: Level::Medium,
            budget_sensitivity: Level::High,
            preferred_os: OsPreference::Windows,
            recommend_mac: Some(false),
        };
        let raw = RawRecord::from_record(&record);
        let mut expected: Vec<&str> = FEATURE_COLUMNS.to_vec();
        expected.sort();
        assert_eq!(raw.columns().collect::<Vec<_>>(), expected);
        assert!(!raw.contains(LABEL_COLUMN));
    }
}
