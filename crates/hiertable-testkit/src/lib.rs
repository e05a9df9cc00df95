// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use hiertable_model::{
    AutomationDriver, BoundingRectangle, ElementId, KeySequence, Keystroke, Query, TreeScript,
};
use serde_json::{Value, json};
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

pub const TABLE: ElementId = ElementId::new(1);
pub const ROW_HEIGHT: i32 = 20;
pub const DEFAULT_VIEWPORT: BoundingRectangle = BoundingRectangle::new(0, 100, 400, 200);
pub const RENDER_MARGIN: i32 = 40;

const DEMO_HEADERS: [&str; 3] = ["Account", "Balance", "Notes"];

/// One driver call, recorded in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverCall {
    Find {
        scope: ElementId,
        query: Query,
    },
    Script {
        script: TreeScript,
        target: ElementId,
        payload: Option<String>,
    },
    Keys {
        target: ElementId,
        keys: KeySequence,
    },
    Wheel {
        amount: i32,
        x: i32,
        y: i32,
    },
    Bounds {
        element: ElementId,
    },
    Clear {
        element: ElementId,
    },
}

impl DriverCall {
    /// Calls that change the control's contents.
    pub fn is_mutation(&self) -> bool {
        match self {
            Self::Clear { .. } => true,
            Self::Keys { keys, .. } => keys
                .keystrokes()
                .iter()
                .any(|keystroke| matches!(keystroke, Keystroke::Text(_))),
            Self::Script { script, .. } => *script == TreeScript::EditCells,
            Self::Find { .. } | Self::Wheel { .. } | Self::Bounds { .. } => false,
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Table,
    Header {
        name: String,
    },
    Row {
        children: Vec<ElementId>,
        cells: Vec<ElementId>,
        expanded: bool,
    },
    Cell {
        row: ElementId,
        column: String,
        value: String,
    },
}

/// In-memory tree table behind an [`AutomationDriver`].
///
/// The header row occupies the top `ROW_HEIGHT` pixels of the viewport and
/// rows follow it in display order, `ROW_HEIGHT` pixels each. Rows that are collapsed away,
/// or more than the render margin outside the viewport, have no geometry.
/// Scripts answer from queued replies first and otherwise evaluate against
/// the tree.
#[derive(Debug, Clone)]
pub struct FakeDesktop {
    scripting: bool,
    nodes: BTreeMap<ElementId, Node>,
    headers: Vec<ElementId>,
    roots: Vec<ElementId>,
    next_id: u64,
    viewport: Option<BoundingRectangle>,
    scroll_offset: i32,
    replies: HashMap<TreeScript, VecDeque<Option<String>>>,
    rejected_columns: BTreeSet<String>,
    textless_columns: BTreeSet<String>,
    calls: Vec<DriverCall>,
}

impl FakeDesktop {
    pub fn new(headers: &[&str]) -> Self {
        let mut desktop = Self {
            scripting: false,
            nodes: BTreeMap::from([(TABLE, Node::Table)]),
            headers: Vec::new(),
            roots: Vec::new(),
            next_id: TABLE.get() + 1,
            viewport: Some(DEFAULT_VIEWPORT),
            scroll_offset: 0,
            replies: HashMap::new(),
            rejected_columns: BTreeSet::new(),
            textless_columns: BTreeSet::new(),
            calls: Vec::new(),
        };
        for name in headers {
            let id = desktop.allocate(Node::Header {
                name: (*name).to_owned(),
            });
            desktop.headers.push(id);
        }
        desktop
    }

    pub fn with_scripting(mut self, scripting: bool) -> Self {
        self.scripting = scripting;
        self
    }

    pub fn with_viewport(mut self, viewport: Option<BoundingRectangle>) -> Self {
        self.viewport = viewport;
        self
    }

    /// Adds a collapsed row under `parent` (or at the top level).
    pub fn add_row(&mut self, parent: Option<ElementId>, cells: &[(&str, &str)]) -> ElementId {
        let row = self.allocate(Node::Row {
            children: Vec::new(),
            cells: Vec::new(),
            expanded: false,
        });
        let cell_ids = cells
            .iter()
            .map(|(column, value)| {
                self.allocate(Node::Cell {
                    row,
                    column: (*column).to_owned(),
                    value: (*value).to_owned(),
                })
            })
            .collect::<Vec<_>>();
        if let Some(Node::Row { cells, .. }) = self.nodes.get_mut(&row) {
            *cells = cell_ids;
        }

        match parent {
            Some(parent) => {
                if let Some(Node::Row { children, .. }) = self.nodes.get_mut(&parent) {
                    children.push(row);
                }
            }
            None => self.roots.push(row),
        }
        row
    }

    /// Queues the reply for the next call of `script`; `None` is a null reply.
    pub fn queue_script_reply(&mut self, script: TreeScript, reply: Option<&str>) {
        self.replies
            .entry(script)
            .or_default()
            .push_back(reply.map(str::to_owned));
    }

    /// Typing into a `column` cell fails from now on.
    pub fn reject_text_entry(&mut self, column: &str) {
        self.rejected_columns.insert(column.to_owned());
    }

    /// `column` cells stop exposing text and only answer `Name`.
    pub fn hide_text(&mut self, column: &str) {
        self.textless_columns.insert(column.to_owned());
    }

    pub fn set_scroll_offset(&mut self, offset: i32) {
        self.scroll_offset = offset.clamp(0, self.max_scroll_offset());
    }

    pub fn scroll_offset(&self) -> i32 {
        self.scroll_offset
    }

    pub fn set_expanded(&mut self, row: ElementId, value: bool) {
        if let Some(Node::Row { expanded, .. }) = self.nodes.get_mut(&row) {
            *expanded = value;
        }
    }

    pub fn cell_value(&self, row: ElementId, column: &str) -> Option<&str> {
        self.cell_of(row, column).and_then(|cell| match self.nodes.get(&cell) {
            Some(Node::Cell { value, .. }) => Some(value.as_str()),
            _ => None,
        })
    }

    pub fn calls(&self) -> &[DriverCall] {
        &self.calls
    }

    pub fn scripts(&self) -> Vec<(TreeScript, Option<String>)> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                DriverCall::Script {
                    script, payload, ..
                } => Some((*script, payload.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn keys_sent(&self) -> Vec<(ElementId, KeySequence)> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                DriverCall::Keys { target, keys } => Some((*target, keys.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn wheel_amounts(&self) -> Vec<i32> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                DriverCall::Wheel { amount, .. } => Some(*amount),
                _ => None,
            })
            .collect()
    }

    pub fn count_keys(&self, keys: &KeySequence) -> usize {
        self.keys_sent()
            .iter()
            .filter(|(_, sent)| sent == keys)
            .count()
    }

    pub fn has_mutations(&self) -> bool {
        self.calls.iter().any(DriverCall::is_mutation)
    }

    /// Rows in display order: top-level rows, each followed by the rows of
    /// its expanded subtree.
    pub fn displayed_rows(&self) -> Vec<ElementId> {
        let mut out = Vec::new();
        for root in &self.roots {
            self.collect_displayed(*root, &mut out);
        }
        out
    }

    fn collect_displayed(&self, row: ElementId, out: &mut Vec<ElementId>) {
        out.push(row);
        if let Some(Node::Row {
            children,
            expanded: true,
            ..
        }) = self.nodes.get(&row)
        {
            for child in children {
                self.collect_displayed(*child, out);
            }
        }
    }

    fn allocate(&mut self, node: Node) -> ElementId {
        let id = ElementId::new(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, node);
        id
    }

    fn max_scroll_offset(&self) -> i32 {
        let Some(viewport) = self.viewport else {
            return 0;
        };
        let content = i32::try_from(self.displayed_rows().len())
            .unwrap_or(i32::MAX)
            .saturating_mul(ROW_HEIGHT);
        content
            .saturating_add(ROW_HEIGHT)
            .saturating_sub(viewport.height)
            .max(0)
    }

    fn children_of(&self, row: ElementId) -> &[ElementId] {
        match self.nodes.get(&row) {
            Some(Node::Row { children, .. }) => children,
            _ => &[],
        }
    }

    fn exposed_children(&self, scope: ElementId) -> Vec<ElementId> {
        match self.nodes.get(&scope) {
            Some(Node::Table) => self.roots.clone(),
            Some(Node::Row {
                children,
                expanded: true,
                ..
            }) => children.clone(),
            _ => Vec::new(),
        }
    }

    fn cell_of(&self, row: ElementId, column: &str) -> Option<ElementId> {
        let Some(Node::Row { cells, .. }) = self.nodes.get(&row) else {
            return None;
        };
        cells.iter().copied().find(|cell| {
            matches!(self.nodes.get(cell), Some(Node::Cell { column: name, .. }) if name == column)
        })
    }

    fn cells_of(&self, row: ElementId) -> Vec<ElementId> {
        match self.nodes.get(&row) {
            Some(Node::Row { cells, .. }) => cells.clone(),
            _ => Vec::new(),
        }
    }

    fn row_bounds(&self, row: ElementId) -> Option<BoundingRectangle> {
        let viewport = self.viewport?;
        let index = self.displayed_rows().iter().position(|shown| *shown == row)?;
        let y = viewport.y + (i32::try_from(index).ok()? + 1) * ROW_HEIGHT - self.scroll_offset;
        if y < viewport.top() - RENDER_MARGIN || y > viewport.bottom() + RENDER_MARGIN {
            return None;
        }
        Some(BoundingRectangle::new(
            viewport.x,
            y,
            viewport.width,
            ROW_HEIGHT,
        ))
    }

    fn cells_as_reply(&self, row: ElementId) -> Vec<Value> {
        self.cells_of(row)
            .into_iter()
            .filter_map(|cell| match self.nodes.get(&cell) {
                Some(Node::Cell { column, value, .. }) => {
                    Some(json!({ "name": column, "value": value }))
                }
                _ => None,
            })
            .collect()
    }

    fn set_cell_value(&mut self, cell: ElementId, text: String) {
        if let Some(Node::Cell { value, .. }) = self.nodes.get_mut(&cell) {
            *value = text;
        }
    }

    fn collapse_everything(&mut self) {
        for node in self.nodes.values_mut() {
            if let Node::Row { expanded, .. } = node {
                *expanded = false;
            }
        }
        self.scroll_offset = 0;
    }

    /// Walks `matchHierarchy` from the top level, expanding matched rows the
    /// way the injected scripts do.
    fn resolve_scripted_path(&mut self, request: &Value) -> Result<Option<ElementId>> {
        let column = request
            .get("matchColumn")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow!("request lacks matchColumn"))?
            .to_owned();
        let path = request
            .get("matchHierarchy")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned();
        let collapsed = request
            .get("alreadyCollapsed")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if !collapsed {
            self.collapse_everything();
        }

        let mut candidates = self.roots.clone();
        let mut matched = None;
        for level in path.split('/').filter(|level| !level.is_empty()) {
            let Some(row) = candidates
                .iter()
                .copied()
                .find(|row| self.cell_value(*row, &column) == Some(level))
            else {
                return Ok(None);
            };
            self.set_expanded(row, true);
            candidates = self.children_of(row).to_vec();
            matched = Some(row);
        }
        Ok(matched)
    }

    fn evaluate_script(
        &mut self,
        script: TreeScript,
        payload: Option<&str>,
    ) -> Result<Option<String>> {
        if script == TreeScript::CollapseAll {
            self.collapse_everything();
            return Ok(None);
        }

        let raw = payload.ok_or_else(|| anyhow!("{script} requires a payload"))?;
        let request: Value =
            serde_json::from_str(raw).with_context(|| format!("decode {script} payload"))?;
        let Some(row) = self.resolve_scripted_path(&request)? else {
            return Ok(Some("[{}]".to_owned()));
        };

        let reply = match script {
            TreeScript::GetRow => self.cells_as_reply(row),
            TreeScript::EditCells => {
                let edits = request
                    .get("edits")
                    .and_then(Value::as_array)
                    .cloned()
                    .unwrap_or_default();
                for edit in edits {
                    let (Some(column), Some(value)) = (
                        edit.get("column").and_then(Value::as_str),
                        edit.get("value").and_then(Value::as_str),
                    ) else {
                        continue;
                    };
                    if let Some(cell) = self.cell_of(row, column) {
                        self.set_cell_value(cell, value.to_owned());
                    }
                }
                self.cells_as_reply(row)
            }
            TreeScript::GetChild => {
                let fetch = request
                    .get("fetchColumn")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_owned();
                self.children_of(row)
                    .to_vec()
                    .into_iter()
                    .filter_map(|child| {
                        self.cell_value(child, &fetch)
                            .map(|value| json!({ "name": fetch, "value": value }))
                    })
                    .collect()
            }
            TreeScript::CollapseAll => Vec::new(),
        };
        Ok(Some(Value::Array(reply).to_string()))
    }
}

impl AutomationDriver for FakeDesktop {
    fn supports_scripting(&self) -> bool {
        self.scripting
    }

    fn find_elements(&mut self, scope: ElementId, query: &Query) -> Result<Vec<ElementId>> {
        self.calls.push(DriverCall::Find {
            scope,
            query: query.clone(),
        });
        if !self.nodes.contains_key(&scope) {
            bail!("stale element {scope}");
        }

        let found = match query {
            Query::HeaderCells if scope == TABLE => self.headers.clone(),
            Query::FirstRow if scope == TABLE => self.roots.first().copied().into_iter().collect(),
            Query::VisibleRows if scope == TABLE => self.displayed_rows(),
            Query::RowByCategory { column, value } => self
                .exposed_children(scope)
                .into_iter()
                .find(|row| self.cell_value(*row, column) == Some(value.as_str()))
                .into_iter()
                .collect(),
            Query::Cell { column } => self.cell_of(scope, column).into_iter().collect(),
            Query::EditableCells => self.cells_of(scope),
            Query::ChildCells { column } => self
                .exposed_children(scope)
                .into_iter()
                .filter_map(|child| self.cell_of(child, column))
                .collect(),
            _ => Vec::new(),
        };
        Ok(found)
    }

    fn execute_script(
        &mut self,
        script: TreeScript,
        target: ElementId,
        payload: Option<&str>,
    ) -> Result<Option<String>> {
        self.calls.push(DriverCall::Script {
            script,
            target,
            payload: payload.map(str::to_owned),
        });
        if !self.scripting {
            bail!("control does not support script {script}");
        }

        if let Some(reply) = self
            .replies
            .get_mut(&script)
            .and_then(VecDeque::pop_front)
        {
            return Ok(reply);
        }
        self.evaluate_script(script, payload)
    }

    fn send_keys(&mut self, target: ElementId, keys: &KeySequence) -> Result<()> {
        self.calls.push(DriverCall::Keys {
            target,
            keys: keys.clone(),
        });

        match self.nodes.get(&target).cloned() {
            Some(Node::Table) if *keys == KeySequence::home() => {
                self.scroll_offset = 0;
            }
            Some(Node::Row { .. }) if *keys == KeySequence::expand() => {
                self.set_expanded(target, true);
            }
            Some(Node::Row { .. }) if *keys == KeySequence::collapse() => {
                self.set_expanded(target, false);
                self.set_scroll_offset(self.scroll_offset);
            }
            Some(Node::Cell { column, value, .. }) => {
                if self.rejected_columns.contains(&column) {
                    bail!("element not interactable: {column}");
                }
                let mut typed = value;
                for keystroke in keys.keystrokes() {
                    if let Keystroke::Text(text) = keystroke {
                        typed.push_str(text);
                    }
                }
                self.set_cell_value(target, typed);
            }
            Some(_) => {}
            None => bail!("stale element {target}"),
        }
        Ok(())
    }

    fn mouse_wheel(&mut self, amount: i32, x: i32, y: i32) -> Result<()> {
        self.calls.push(DriverCall::Wheel { amount, x, y });
        self.set_scroll_offset(self.scroll_offset + amount);
        Ok(())
    }

    fn bounds(&mut self, element: ElementId) -> Result<Option<BoundingRectangle>> {
        self.calls.push(DriverCall::Bounds { element });
        let rect = match self.nodes.get(&element) {
            Some(Node::Table) => self.viewport,
            Some(Node::Header { .. }) => self.viewport.map(|viewport| {
                BoundingRectangle::new(viewport.x, viewport.y, viewport.width, ROW_HEIGHT)
            }),
            Some(Node::Row { .. }) => self.row_bounds(element),
            Some(Node::Cell { row, .. }) => self.row_bounds(*row),
            None => None,
        };
        Ok(rect)
    }

    fn text(&mut self, element: ElementId) -> Result<Option<String>> {
        match self.nodes.get(&element) {
            Some(Node::Cell { column, .. }) if self.textless_columns.contains(column) => Ok(None),
            Some(Node::Cell { value, .. }) => Ok(Some(value.clone())),
            Some(_) => Ok(None),
            None => bail!("stale element {element}"),
        }
    }

    fn attribute(&mut self, element: ElementId, name: &str) -> Result<Option<String>> {
        let value = match (self.nodes.get(&element), name) {
            (Some(Node::Header { name: label }), "Name") => Some(label.clone()),
            (Some(Node::Cell { column, .. }), "Name") => Some(column.clone()),
            (Some(Node::Cell { value, .. }), "Value") => Some(value.clone()),
            (Some(_), _) => None,
            (None, _) => bail!("stale element {element}"),
        };
        Ok(value)
    }

    fn clear(&mut self, element: ElementId) -> Result<()> {
        self.calls.push(DriverCall::Clear { element });
        match self.nodes.get(&element) {
            Some(Node::Cell { .. }) => {
                self.set_cell_value(element, String::new());
                Ok(())
            }
            Some(_) => bail!("element {element} is not editable"),
            None => bail!("stale element {element}"),
        }
    }
}

/// A chart of accounts deep and long enough to need scrolling.
pub fn demo_desktop() -> FakeDesktop {
    let mut desktop = FakeDesktop::new(&DEMO_HEADERS);

    let assets = desktop.add_row(None, &[("Account", "Assets"), ("Balance", "187450.5")]);
    let current = desktop.add_row(
        Some(assets),
        &[("Account", "Current Assets"), ("Balance", "62450.5")],
    );
    desktop.add_row(
        Some(current),
        &[
            ("Account", "Cash"),
            ("Balance", "48210.25"),
            ("Notes", "Operating account"),
        ],
    );
    desktop.add_row(
        Some(current),
        &[
            ("Account", "Receivables"),
            ("Balance", "14240.25"),
            ("Notes", ""),
        ],
    );
    let fixed = desktop.add_row(
        Some(assets),
        &[("Account", "Fixed Assets"), ("Balance", "125000.00")],
    );
    desktop.add_row(
        Some(fixed),
        &[
            ("Account", "Equipment"),
            ("Balance", "125000"),
            ("Notes", "Depreciated yearly"),
        ],
    );

    let liabilities = desktop.add_row(
        None,
        &[("Account", "Liabilities"), ("Balance", "-1,234.50")],
    );
    desktop.add_row(
        Some(liabilities),
        &[
            ("Account", "Payables"),
            ("Balance", "-1,234.50"),
            ("Notes", "Net 30"),
        ],
    );

    let expenses = desktop.add_row(None, &[("Account", "Expenses"), ("Balance", "9120.75")]);
    for month in 1..=24 {
        let account = format!("Period {month:02}");
        let balance = format!("{}.{:02}", 300 + month * 7, month);
        desktop.add_row(
            Some(expenses),
            &[("Account", &account), ("Balance", &balance), ("Notes", "")],
        );
    }
    desktop.add_row(None, &[("Account", "Equity"), ("Balance", "186215.75")]);
    desktop
}

#[cfg(test)]
mod tests {
    use super::{FakeDesktop, TABLE, demo_desktop};
    use anyhow::Result;
    use hiertable_model::{AutomationDriver, KeySequence, Query, TreeScript};

    #[test]
    fn expanding_a_row_exposes_its_children() -> Result<()> {
        let mut desktop = FakeDesktop::new(&["Name"]);
        let parent = desktop.add_row(None, &[("Name", "Parent")]);
        let child = desktop.add_row(Some(parent), &[("Name", "Child")]);
        let query = Query::RowByCategory {
            column: "Name".to_owned(),
            value: "Child".to_owned(),
        };

        assert!(desktop.find_elements(parent, &query)?.is_empty());
        desktop.send_keys(parent, &KeySequence::expand())?;
        assert_eq!(desktop.find_elements(parent, &query)?, vec![child]);
        assert_eq!(desktop.displayed_rows(), vec![parent, child]);
        Ok(())
    }

    #[test]
    fn far_rows_have_no_geometry() -> Result<()> {
        let mut desktop = demo_desktop();
        let rows = desktop.find_elements(TABLE, &Query::VisibleRows)?;
        let expenses = rows[2];
        desktop.send_keys(expenses, &KeySequence::expand())?;
        let last = *desktop
            .displayed_rows()
            .last()
            .expect("demo has rows");

        assert!(desktop.bounds(expenses)?.is_some());
        assert!(desktop.bounds(last)?.is_none());
        Ok(())
    }

    #[test]
    fn scripts_fail_without_scripting_support() {
        let mut desktop = FakeDesktop::new(&["Name"]);
        let error = desktop
            .execute_script(TreeScript::CollapseAll, TABLE, None)
            .expect_err("manual-only control should reject scripts");
        assert!(error.to_string().contains("collapse-all"));
    }

    #[test]
    fn queued_replies_take_precedence() -> Result<()> {
        let mut desktop = FakeDesktop::new(&["Name"]).with_scripting(true);
        desktop.queue_script_reply(TreeScript::GetRow, Some("[]"));
        desktop.queue_script_reply(TreeScript::GetRow, None);

        assert_eq!(
            desktop.execute_script(TreeScript::GetRow, TABLE, Some("{}"))?,
            Some("[]".to_owned())
        );
        assert_eq!(
            desktop.execute_script(TreeScript::GetRow, TABLE, Some("{}"))?,
            None
        );
        Ok(())
    }
}
