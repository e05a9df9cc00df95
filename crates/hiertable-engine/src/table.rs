// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::expander::expand_to_match;
use crate::format::{CellFormatter, normalize_space};
use crate::locator::{discover_headers, first_row};
use crate::scripted::{ScriptRequest, parse_child_reply, parse_row_reply};
use anyhow::{Context, Result, anyhow};
use hiertable_model::{
    AutomationDriver, CategoryPath, EditRequest, ElementId, ExpansionState, KeySequence, Query,
    RowData, StepOutcome, TableError, TableMetadata, TableSettings, TreeScript,
};
use tracing::{debug, info, warn};

/// How a table is automated. Chosen once, when the table is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Injected scripts read and edit the tree in one round trip.
    Scripted,
    /// Rows are expanded and edited through synthetic input.
    Manual,
}

impl Strategy {
    pub fn for_driver<D: AutomationDriver + ?Sized>(driver: &D) -> Self {
        if driver.supports_scripting() {
            Self::Scripted
        } else {
            Self::Manual
        }
    }
}

/// A tree-structured table control.
///
/// Row handles are looked up fresh by every operation; nothing found during
/// one call is reused by the next.
pub struct HierTable<D> {
    driver: D,
    element: ElementId,
    label: String,
    settings: TableSettings,
    strategy: Strategy,
    formatter: CellFormatter,
    metadata: TableMetadata,
    expansion: ExpansionState,
}

impl<D: AutomationDriver> HierTable<D> {
    pub fn new(
        driver: D,
        element: ElementId,
        label: impl Into<String>,
        settings: TableSettings,
    ) -> Self {
        let strategy = Strategy::for_driver(&driver);
        let formatter = CellFormatter::new(settings.number_locale, strategy == Strategy::Manual);
        let metadata = TableMetadata::from_headers(settings.headers.clone());
        Self {
            driver,
            element,
            label: label.into(),
            settings,
            strategy,
            formatter,
            metadata,
            expansion: ExpansionState::default(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn headers(&self) -> &[String] {
        &self.metadata.headers
    }

    pub fn column_count(&self) -> usize {
        self.metadata.column_count
    }

    /// Detached copy of the known headers.
    pub fn metadata(&self) -> TableMetadata {
        self.metadata.clone()
    }

    pub fn expansion(&self) -> ExpansionState {
        self.expansion
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    pub fn into_driver(self) -> D {
        self.driver
    }

    /// Discovers headers if none are known yet, then checks that the table
    /// has at least one row.
    ///
    /// A table without a header row is not an error: headers stay empty and
    /// `column_count()` is zero.
    pub fn scan_structure(&mut self) -> Result<()> {
        if self.metadata.headers.is_empty() {
            let headers = discover_headers(&mut self.driver, self.element)
                .with_context(|| format!("scan hierarchical table '{}'", self.label))?;
            if headers.is_empty() {
                warn!(table = %self.label, "no header row found");
                self.metadata = TableMetadata::default();
                return Ok(());
            }
            info!(table = %self.label, columns = headers.len(), "discovered headers");
            self.metadata = TableMetadata::from_headers(headers);
        }

        if first_row(&mut self.driver, self.element)?.is_none() {
            return Err(TableError::NotFound(format!(
                "unable to retrieve first row of hierarchical table '{}'",
                self.label
            ))
            .into());
        }
        Ok(())
    }

    /// Forgets the known headers and scans again.
    pub fn rescan_structure(&mut self) -> Result<()> {
        self.metadata = TableMetadata::default();
        self.scan_structure()
    }

    pub fn contains_header(&mut self, header: &str) -> Result<bool> {
        self.ensure_scanned()?;
        Ok(self.metadata.contains(header))
    }

    /// Reads the row at the end of `path`.
    ///
    /// `Ok(None)` when the path is empty, when the category column is not
    /// one of the headers, or (manual strategy) when a level has no match.
    pub fn get_row(&mut self, path: &CategoryPath) -> Result<Option<RowData>> {
        let category = self.require_category_column()?;
        if path.is_empty() {
            return Ok(None);
        }
        if !self.contains_header(&category)? {
            warn!(table = %self.label, column = %category, "category column is not a header");
            return Ok(None);
        }

        match self.strategy {
            Strategy::Scripted => {
                let payload = self.request(&category, path).to_json()?;
                let reply = self.run_script(TreeScript::GetRow, &payload)?;
                parse_row_reply(reply.as_deref())
                    .with_context(|| format!("read row {path} of '{}'", self.label))
                    .map(Some)
            }
            Strategy::Manual => {
                let Some(row) = self.expand(&category, path)? else {
                    return Ok(None);
                };
                let cells = self
                    .driver
                    .find_elements(row, &Query::EditableCells)
                    .with_context(|| format!("find cells of row {path}"))?;

                let mut data = RowData::new();
                for cell in cells {
                    let name = self.driver.attribute(cell, "Name")?.unwrap_or_default();
                    let value = self.formatter.read_cell(&mut self.driver, cell)?;
                    data.insert(normalize_space(&name), value);
                }
                Ok(Some(data))
            }
        }
    }

    /// Writes `edits` into the row at the end of `path` and returns the
    /// resulting cell values.
    ///
    /// Every column is validated against the headers before anything is
    /// touched. Under the manual strategy each cell is edited on its own: a
    /// cell that cannot be edited reports `ERROR: <message>` as its value and
    /// the remaining cells are still edited.
    pub fn edit_cells(
        &mut self,
        path: &CategoryPath,
        edits: &EditRequest,
    ) -> Result<Option<RowData>> {
        if edits.is_empty() {
            return Err(TableError::Precondition("no name-value pairs found".to_owned()).into());
        }
        let category = self.require_category_column()?;
        self.ensure_scanned()?;

        let invalid = edits
            .columns()
            .filter(|column| !self.metadata.contains(column))
            .collect::<Vec<_>>();
        if !invalid.is_empty() {
            return Err(
                TableError::Precondition(format!("invalid columns: {}", invalid.join(", "))).into(),
            );
        }

        match self.strategy {
            Strategy::Scripted => {
                let payload = self.request(&category, path).with_edits(edits).to_json()?;
                let reply = self.run_script(TreeScript::EditCells, &payload)?;
                parse_row_reply(reply.as_deref())
                    .with_context(|| format!("edit row {path} of '{}'", self.label))
                    .map(Some)
            }
            Strategy::Manual => {
                let Some(row) = self.expand(&category, path)? else {
                    return Ok(None);
                };

                let mut outcome = RowData::new();
                for (column, value) in edits.iter() {
                    match self.edit_cell(row, column, value) {
                        Ok(text) => outcome.insert(column, text),
                        Err(error) => {
                            warn!(column, value, %error, "cell edit failed");
                            outcome.insert(column, format!("ERROR: {error}"));
                        }
                    }
                }
                Ok(Some(outcome))
            }
        }
    }

    /// Values of `column` in the child rows of the row at the end of `path`.
    pub fn get_child_values(
        &mut self,
        path: &CategoryPath,
        column: &str,
    ) -> Result<Option<Vec<String>>> {
        let category = self.require_category_column()?;
        if column.trim().is_empty() {
            return Err(TableError::Precondition("no fetch column given".to_owned()).into());
        }
        if !self.contains_header(&category)? {
            warn!(table = %self.label, column = %category, "category column is not a header");
            return Ok(None);
        }

        match self.strategy {
            Strategy::Scripted => {
                let payload = self
                    .request(&category, path)
                    .with_fetch_column(column)
                    .to_json()?;
                let reply = self.run_script(TreeScript::GetChild, &payload)?;
                parse_child_reply(reply.as_deref(), column)
                    .with_context(|| format!("fetch {column:?} under {path}"))
                    .map(Some)
            }
            Strategy::Manual => {
                let Some(row) = self.expand(&category, path)? else {
                    return Ok(None);
                };
                let cells = self
                    .driver
                    .find_elements(
                        row,
                        &Query::ChildCells {
                            column: column.to_owned(),
                        },
                    )
                    .with_context(|| format!("find {column:?} cells under {path}"))?;

                let mut values = Vec::with_capacity(cells.len());
                for cell in cells {
                    values.push(self.formatter.read_cell(&mut self.driver, cell)?);
                }
                Ok(Some(values))
            }
        }
    }

    /// Collapses every row of the table.
    pub fn collapse_all(&mut self) -> Result<StepOutcome> {
        match self.strategy {
            Strategy::Scripted => {
                self.driver
                    .execute_script(TreeScript::CollapseAll, self.element, None)
                    .with_context(|| format!("collapse all rows of '{}'", self.label))?;
            }
            Strategy::Manual => {
                let collapse = KeySequence::collapse();
                let rows = self
                    .driver
                    .find_elements(self.element, &Query::VisibleRows)
                    .context("find visible rows")?;
                debug!(table = %self.label, rows = rows.len(), "collapsing row by row");
                for row in rows {
                    self.driver
                        .send_keys(row, &collapse)
                        .with_context(|| format!("collapse row {row}"))?;
                }
            }
        }

        self.expansion.mark_collapsed();
        Ok(StepOutcome::success(format!(
            "collapsed all rows in hierarchical table '{}'",
            self.label
        )))
    }

    fn require_category_column(&self) -> Result<String> {
        self.settings
            .category_column()
            .map(str::to_owned)
            .ok_or_else(|| TableError::Precondition("no categoryColumn found".to_owned()).into())
    }

    fn ensure_scanned(&mut self) -> Result<()> {
        if self.metadata.headers.is_empty() {
            self.scan_structure()?;
        }
        Ok(())
    }

    fn request<'a>(&'a self, category: &'a str, path: &CategoryPath) -> ScriptRequest<'a> {
        ScriptRequest::new(
            category,
            path,
            self.settings.hierarchy_column(),
            &self.settings.hierarchy_list,
            self.expansion.already_collapsed(),
        )
    }

    fn run_script(&mut self, script: TreeScript, payload: &str) -> Result<Option<String>> {
        debug!(table = %self.label, %script, payload, "running tree script");
        let reply = self
            .driver
            .execute_script(script, self.element, Some(payload));
        self.expansion.mark_expanded();
        reply.with_context(|| format!("run {script} on '{}'", self.label))
    }

    fn expand(&mut self, category: &str, path: &CategoryPath) -> Result<Option<ElementId>> {
        let row = expand_to_match(
            &mut self.driver,
            self.element,
            category,
            path,
            &mut self.expansion,
        )?;
        if row.is_none() {
            debug!(table = %self.label, %path, "category path did not resolve");
        }
        Ok(row)
    }

    fn edit_cell(&mut self, row: ElementId, column: &str, value: &str) -> Result<String> {
        let cell = self
            .driver
            .find_first(
                row,
                &Query::Cell {
                    column: column.to_owned(),
                },
            )?
            .ok_or_else(|| anyhow!("no editable cell for column {column:?}"))?;
        self.driver.clear(cell)?;
        self.driver.send_keys(cell, &KeySequence::text(value))?;
        self.formatter.read_cell(&mut self.driver, cell)
    }
}
