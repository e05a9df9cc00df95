// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::scroll::scroll_until_on_screen;
use anyhow::{Context, Result};
use hiertable_model::{
    AutomationDriver, CategoryPath, ElementId, ExpansionState, KeySequence, Query,
};
use tracing::debug;

/// Walks `path` one level at a time from the table's first row, expanding
/// every matched row, and returns the row matched by the last level.
///
/// Returns `Ok(None)` as soon as a level has no match. Each level is looked
/// up only under the row matched by the previous level, so a miss is never
/// retried elsewhere in the tree.
pub fn expand_to_match<D>(
    driver: &mut D,
    table: ElementId,
    category_column: &str,
    path: &CategoryPath,
    expansion: &mut ExpansionState,
) -> Result<Option<ElementId>>
where
    D: AutomationDriver + ?Sized,
{
    if path.is_empty() {
        return Ok(None);
    }

    driver
        .send_keys(table, &KeySequence::home())
        .context("move to first row")?;
    expansion.mark_expanded();

    let expand = KeySequence::expand();
    let mut current = table;
    for (level, value) in path.levels().iter().enumerate() {
        let query = Query::RowByCategory {
            column: category_column.to_owned(),
            value: value.clone(),
        };
        let Some(matched) = driver
            .find_first(current, &query)
            .with_context(|| format!("find row matching {value:?}"))?
        else {
            debug!(level, value = %value, "no row matches, giving up");
            return Ok(None);
        };
        debug!(level, value = %value, row = %matched, "found row matching");

        scroll_until_on_screen(driver, table, matched)?;
        driver
            .send_keys(matched, &expand)
            .with_context(|| format!("expand row matching {value:?}"))?;
        current = matched;
    }

    Ok(Some(current))
}
