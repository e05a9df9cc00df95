// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::format::normalize_space;
use anyhow::{Context, Result};
use hiertable_model::{AutomationDriver, ElementId, Query};
use tracing::info;

/// Header labels of the table, in column order.
pub fn discover_headers<D>(driver: &mut D, table: ElementId) -> Result<Vec<String>>
where
    D: AutomationDriver + ?Sized,
{
    let query = Query::HeaderCells;
    info!(%table, query = %query, "scanning for hierarchical table structure");
    let elements = driver
        .find_elements(table, &query)
        .context("find header row")?;

    let mut headers = Vec::with_capacity(elements.len());
    for element in elements {
        let label = driver
            .attribute(element, "Name")
            .with_context(|| format!("read header label of {element}"))?;
        headers.push(normalize_space(&label.unwrap_or_default()));
    }
    Ok(headers)
}

pub fn first_row<D>(driver: &mut D, table: ElementId) -> Result<Option<ElementId>>
where
    D: AutomationDriver + ?Sized,
{
    driver
        .find_first(table, &Query::FirstRow)
        .context("find first row")
}
