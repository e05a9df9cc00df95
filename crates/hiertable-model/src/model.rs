// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::Deserialize;
use std::collections::BTreeMap;

/// Headers discovered by (or configured for) a table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableMetadata {
    pub headers: Vec<String>,
    pub column_count: usize,
}

impl TableMetadata {
    pub fn from_headers(headers: Vec<String>) -> Self {
        let column_count = headers.len();
        Self {
            headers,
            column_count,
        }
    }

    pub fn contains(&self, header: &str) -> bool {
        self.headers.iter().any(|known| known == header)
    }
}

/// One match value per hierarchy level, root first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryPath(Vec<String>);

impl CategoryPath {
    pub fn new<I, S>(levels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(levels.into_iter().map(Into::into).collect())
    }

    /// Splits `a/b/c` into levels; blank segments are dropped.
    pub fn parse(raw: &str) -> Self {
        Self::new(
            raw.split('/')
                .map(str::trim)
                .filter(|level| !level.is_empty()),
        )
    }

    pub fn levels(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn joined(&self) -> String {
        self.0.join("/")
    }
}

impl std::fmt::Display for CategoryPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

/// Column name to value pairs in insertion order. Re-inserting a column
/// replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnValues(Vec<(String, String)>);

/// Formatted cell values of one row, in discovery order.
pub type RowData = ColumnValues;

/// New cell values keyed by column name.
pub type EditRequest = ColumnValues;

impl ColumnValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) {
        let column = column.into();
        let value = value.into();
        match self.0.iter_mut().find(|(name, _)| *name == column) {
            Some(entry) => entry.1 = value,
            None => self.0.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for ColumnValues
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut values = Self::new();
        for (column, value) in iter {
            values.insert(column, value);
        }
        values
    }
}

impl IntoIterator for ColumnValues {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Result of an operation that has no data to return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    pub success: bool,
    pub message: String,
}

impl StepOutcome {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// Separators used to recognize and re-render numeric cell text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumberLocale {
    /// `1,234.50`
    #[default]
    En,
    /// `1.234,50`
    Eu,
}

impl NumberLocale {
    pub const fn group_separator(self) -> char {
        match self {
            Self::En => ',',
            Self::Eu => '.',
        }
    }

    pub const fn decimal_separator(self) -> char {
        match self {
            Self::En => '.',
            Self::Eu => ',',
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "en" => Some(Self::En),
            "eu" => Some(Self::Eu),
            _ => None,
        }
    }
}

/// Per-table settings, read once when a table is constructed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TableSettings {
    #[serde(default)]
    pub headers: Vec<String>,
    pub hierarchy_column: Option<String>,
    #[serde(default)]
    pub hierarchy_list: Vec<String>,
    pub category_column: Option<String>,
    #[serde(default)]
    pub number_locale: NumberLocale,
}

impl TableSettings {
    /// Reads the property-style keys `headers`, `hierarchyColumn`,
    /// `hierarchyList`, `categoryColumn` and `numberLocale`. Unknown keys are
    /// ignored.
    pub fn from_properties(properties: &BTreeMap<String, String>) -> anyhow::Result<Self> {
        let mut settings = Self::default();
        if let Some(headers) = properties.get("headers") {
            settings.headers = split_comma_list(headers);
        }
        if let Some(column) = properties.get("hierarchyColumn") {
            settings.hierarchy_column = Some(column.clone());
        }
        if let Some(list) = properties.get("hierarchyList") {
            settings.hierarchy_list = split_comma_list(list);
        }
        if let Some(column) = properties.get("categoryColumn") {
            settings.category_column = Some(column.clone());
        }
        if let Some(locale) = properties.get("numberLocale") {
            settings.number_locale = NumberLocale::parse(locale).ok_or_else(|| {
                anyhow::anyhow!("numberLocale {locale:?} is not supported; use \"en\" or \"eu\"")
            })?;
        }
        Ok(settings)
    }

    /// The category column, if set to something other than whitespace.
    pub fn category_column(&self) -> Option<&str> {
        self.category_column
            .as_deref()
            .filter(|column| !column.trim().is_empty())
    }

    pub fn hierarchy_column(&self) -> Option<&str> {
        self.hierarchy_column
            .as_deref()
            .filter(|column| !column.trim().is_empty())
    }
}

pub fn split_comma_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{CategoryPath, ColumnValues, NumberLocale, TableSettings};
    use anyhow::Result;
    use std::collections::BTreeMap;

    #[test]
    fn category_path_parse_drops_blank_levels() {
        let path = CategoryPath::parse(" Assets / /Current Assets/Cash/");
        assert_eq!(path.levels(), ["Assets", "Current Assets", "Cash"]);
        assert_eq!(path.joined(), "Assets/Current Assets/Cash");
    }

    #[test]
    fn column_values_replace_in_place() {
        let mut values = ColumnValues::new();
        values.insert("city", "Austin");
        values.insert("zip", "78701");
        values.insert("city", "Seattle");

        assert_eq!(
            values.iter().collect::<Vec<_>>(),
            vec![("city", "Seattle"), ("zip", "78701")]
        );
    }

    #[test]
    fn settings_read_property_map() -> Result<()> {
        let properties = BTreeMap::from([
            ("headers".to_owned(), "Account, Balance,,Notes".to_owned()),
            ("hierarchyColumn".to_owned(), "Row Type".to_owned()),
            ("hierarchyList".to_owned(), "Group,Account".to_owned()),
            ("categoryColumn".to_owned(), "Account".to_owned()),
            ("numberLocale".to_owned(), "EU".to_owned()),
            ("label".to_owned(), "ignored".to_owned()),
        ]);

        let settings = TableSettings::from_properties(&properties)?;
        assert_eq!(settings.headers, ["Account", "Balance", "Notes"]);
        assert_eq!(settings.hierarchy_column(), Some("Row Type"));
        assert_eq!(settings.hierarchy_list, ["Group", "Account"]);
        assert_eq!(settings.category_column(), Some("Account"));
        assert_eq!(settings.number_locale, NumberLocale::Eu);
        Ok(())
    }

    #[test]
    fn blank_category_column_reads_as_unset() -> Result<()> {
        let properties = BTreeMap::from([("categoryColumn".to_owned(), "  ".to_owned())]);
        let settings = TableSettings::from_properties(&properties)?;
        assert_eq!(settings.category_column(), None);
        Ok(())
    }

    #[test]
    fn unknown_locale_is_rejected() {
        let properties = BTreeMap::from([("numberLocale".to_owned(), "fr".to_owned())]);
        let error = TableSettings::from_properties(&properties)
            .expect_err("unsupported locale should fail");
        assert!(error.to_string().contains("\"fr\""));
    }
}
