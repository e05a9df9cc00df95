// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Request and reply shapes of the injected tree scripts.
//!
//! A request names the match column and the `/`-joined path to match; the
//! script replies with a JSON array of `{"name": .., "value": ..}` objects.
//! An empty object anywhere in the reply means the script could not follow
//! the path.

use anyhow::{Context, Result};
use hiertable_model::{CategoryPath, EditRequest, RowData, TableError};
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    row_type_column: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    row_type_hierarchy: Option<String>,
    match_column: &'a str,
    match_hierarchy: String,
    already_collapsed: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    edits: Vec<CellEdit<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fetch_column: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct CellEdit<'a> {
    column: &'a str,
    value: &'a str,
}

impl<'a> ScriptRequest<'a> {
    pub fn new(
        match_column: &'a str,
        path: &CategoryPath,
        hierarchy_column: Option<&'a str>,
        hierarchy_list: &[String],
        already_collapsed: bool,
    ) -> Self {
        Self {
            row_type_column: hierarchy_column,
            row_type_hierarchy: (!hierarchy_list.is_empty()).then(|| hierarchy_list.join("/")),
            match_column,
            match_hierarchy: path.joined(),
            already_collapsed,
            edits: Vec::new(),
            fetch_column: None,
        }
    }

    pub fn with_edits(mut self, edits: &'a EditRequest) -> Self {
        self.edits = edits
            .iter()
            .map(|(column, value)| CellEdit { column, value })
            .collect();
        self
    }

    pub fn with_fetch_column(mut self, column: &'a str) -> Self {
        self.fetch_column = Some(column);
        self
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context("encode script request")
    }
}

/// Folds `{name, value}` entries into a row. Values are trimmed; entries
/// without a string `name` or without `value` are skipped.
pub fn parse_row_reply(reply: Option<&str>) -> Result<RowData> {
    let mut row = RowData::new();
    for entry in reply_entries(reply)? {
        if let Some(name) = entry.get("name").and_then(Value::as_str)
            && let Some(value) = entry.get("value")
        {
            row.insert(name, value_text(value).trim());
        }
    }
    Ok(row)
}

/// Collects the trimmed values of the entries named `column`.
pub fn parse_child_reply(reply: Option<&str>, column: &str) -> Result<Vec<String>> {
    let mut values = Vec::new();
    for entry in reply_entries(reply)? {
        if entry.get("name").and_then(Value::as_str) == Some(column)
            && let Some(value) = entry.get("value")
        {
            values.push(value_text(value).trim().to_owned());
        }
    }
    Ok(values)
}

fn reply_entries(reply: Option<&str>) -> Result<Vec<Map<String, Value>>> {
    let raw = reply.ok_or_else(|| {
        TableError::ScriptReply("unable to fetch data from hierarchical table".to_owned())
    })?;
    let parsed: Value = serde_json::from_str(raw)
        .map_err(|error| TableError::ScriptReply(format!("reply is not JSON: {error}")))?;
    let Value::Array(items) = parsed else {
        return Err(TableError::ScriptReply(format!("expected a JSON array, got {raw}")).into());
    };

    let mut entries = Vec::with_capacity(items.len());
    for item in items {
        let Value::Object(entry) = item else {
            continue;
        };
        if entry.is_empty() {
            return Err(TableError::ScriptReply(
                "unable to fetch data with the specified match criteria".to_owned(),
            )
            .into());
        }
        entries.push(entry);
    }
    Ok(entries)
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
