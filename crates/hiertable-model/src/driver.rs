// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{BoundingRectangle, ElementId};
use anyhow::Result;

/// Scripts a scripting-capable driver injects into the tree control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TreeScript {
    CollapseAll,
    GetRow,
    EditCells,
    GetChild,
}

impl TreeScript {
    pub const ALL: [Self; 4] = [
        Self::CollapseAll,
        Self::GetRow,
        Self::EditCells,
        Self::GetChild,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CollapseAll => "collapse-all",
            Self::GetRow => "get-row",
            Self::EditCells => "edit-cells",
            Self::GetChild => "get-child",
        }
    }
}

impl std::fmt::Display for TreeScript {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structural lookups the engine issues against the tree control. Drivers
/// may evaluate the variants natively or run the XPath from `Display`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// Header items of the control's column header row.
    HeaderCells,
    /// The first data row of the control.
    FirstRow,
    /// Every data row currently exposed (expanded and rendered).
    VisibleRows,
    /// First data row under the scope whose `column` cell shows `value`.
    RowByCategory { column: String, value: String },
    /// The editable cell for `column` within a row.
    Cell { column: String },
    /// Every editable cell within a row.
    EditableCells,
    /// The `column` cells of the child rows under a row.
    ChildCells { column: String },
}

const DATA_ITEM: &str = "*[@ControlType='ControlType.DataItem']";

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HeaderCells => f.write_str(
                "*[@ControlType='ControlType.Header']/*[@ControlType='ControlType.HeaderItem']",
            ),
            Self::FirstRow => write!(f, "{DATA_ITEM}[1]"),
            Self::VisibleRows => f.write_str(DATA_ITEM),
            Self::RowByCategory { column, value } => write!(
                f,
                "*[@ControlType='ControlType.DataItem' and ./*[@Name={} and @Value={}]][1]",
                xpath_literal(column),
                xpath_literal(value)
            ),
            Self::Cell { column } => write!(
                f,
                "*[@ControlType='ControlType.Edit' and @Name={}]",
                xpath_literal(column)
            ),
            Self::EditableCells => f.write_str("*[@ControlType='ControlType.Edit']"),
            Self::ChildCells { column } => {
                write!(f, "{DATA_ITEM}/*[@Name={}]", xpath_literal(column))
            }
        }
    }
}

/// Quotes `value` as an XPath 1.0 string literal.
pub fn xpath_literal(value: &str) -> String {
    if !value.contains('\'') {
        return format!("'{value}'");
    }
    if !value.contains('"') {
        return format!("\"{value}\"");
    }

    let parts = value
        .split('\'')
        .map(|part| format!("'{part}'"))
        .collect::<Vec<_>>()
        .join(", \"'\", ");
    format!("concat({parts})")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keystroke {
    Chord(String),
    Text(String),
}

/// Synthetic keyboard input, delivered to one element in a single call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySequence(Vec<Keystroke>);

impl KeySequence {
    pub fn chords(chords: &[&str]) -> Self {
        Self(
            chords
                .iter()
                .map(|chord| Keystroke::Chord((*chord).to_owned()))
                .collect(),
        )
    }

    pub fn text(value: &str) -> Self {
        Self(vec![Keystroke::Text(value.to_owned())])
    }

    pub fn home() -> Self {
        Self::chords(&["CTRL-HOME"])
    }

    pub fn expand() -> Self {
        Self::chords(&["CTRL-SPACE", "RIGHT"])
    }

    pub fn collapse() -> Self {
        Self::chords(&["CTRL-SPACE", "LEFT"])
    }

    pub fn keystrokes(&self) -> &[Keystroke] {
        &self.0
    }
}

impl std::fmt::Display for KeySequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for keystroke in &self.0 {
            match keystroke {
                Keystroke::Chord(chord) => write!(f, "[{chord}]")?,
                Keystroke::Text(text) => f.write_str(&text.replace('[', "[["))?,
            }
        }
        Ok(())
    }
}

/// The platform accessibility driver the engine automates through.
///
/// Every call blocks on the live UI. Implementations report "geometry
/// unavailable" as `Ok(None)` from [`AutomationDriver::bounds`], never as an
/// error.
pub trait AutomationDriver {
    /// Whether the control accepts the injected [`TreeScript`]s.
    fn supports_scripting(&self) -> bool;

    fn find_elements(&mut self, scope: ElementId, query: &Query) -> Result<Vec<ElementId>>;

    fn find_first(&mut self, scope: ElementId, query: &Query) -> Result<Option<ElementId>> {
        Ok(self.find_elements(scope, query)?.into_iter().next())
    }

    /// Runs `script` against `target`; `Ok(None)` is a null reply.
    fn execute_script(
        &mut self,
        script: TreeScript,
        target: ElementId,
        payload: Option<&str>,
    ) -> Result<Option<String>>;

    fn send_keys(&mut self, target: ElementId, keys: &KeySequence) -> Result<()>;

    /// Wheel input at screen position (`x`, `y`); positive `amount` scrolls down.
    fn mouse_wheel(&mut self, amount: i32, x: i32, y: i32) -> Result<()>;

    fn bounds(&mut self, element: ElementId) -> Result<Option<BoundingRectangle>>;

    fn text(&mut self, element: ElementId) -> Result<Option<String>>;

    fn attribute(&mut self, element: ElementId, name: &str) -> Result<Option<String>>;

    fn clear(&mut self, element: ElementId) -> Result<()>;
}

impl<D: AutomationDriver + ?Sized> AutomationDriver for &mut D {
    fn supports_scripting(&self) -> bool {
        (**self).supports_scripting()
    }

    fn find_elements(&mut self, scope: ElementId, query: &Query) -> Result<Vec<ElementId>> {
        (**self).find_elements(scope, query)
    }

    fn find_first(&mut self, scope: ElementId, query: &Query) -> Result<Option<ElementId>> {
        (**self).find_first(scope, query)
    }

    fn execute_script(
        &mut self,
        script: TreeScript,
        target: ElementId,
        payload: Option<&str>,
    ) -> Result<Option<String>> {
        (**self).execute_script(script, target, payload)
    }

    fn send_keys(&mut self, target: ElementId, keys: &KeySequence) -> Result<()> {
        (**self).send_keys(target, keys)
    }

    fn mouse_wheel(&mut self, amount: i32, x: i32, y: i32) -> Result<()> {
        (**self).mouse_wheel(amount, x, y)
    }

    fn bounds(&mut self, element: ElementId) -> Result<Option<BoundingRectangle>> {
        (**self).bounds(element)
    }

    fn text(&mut self, element: ElementId) -> Result<Option<String>> {
        (**self).text(element)
    }

    fn attribute(&mut self, element: ElementId, name: &str) -> Result<Option<String>> {
        (**self).attribute(element, name)
    }

    fn clear(&mut self, element: ElementId) -> Result<()> {
        (**self).clear(element)
    }
}

#[cfg(test)]
mod tests {
    use super::{KeySequence, Query, TreeScript, xpath_literal};

    #[test]
    fn xpath_literal_picks_a_safe_quote() {
        assert_eq!(xpath_literal("Cash"), "'Cash'");
        assert_eq!(xpath_literal("Owner's Equity"), "\"Owner's Equity\"");
        assert_eq!(
            xpath_literal("a'b\"c"),
            "concat('a', \"'\", 'b\"c')".to_owned()
        );
    }

    #[test]
    fn category_query_renders_column_and_value() {
        let query = Query::RowByCategory {
            column: "Account".to_owned(),
            value: "Cash".to_owned(),
        };
        let rendered = query.to_string();
        assert!(rendered.contains("@Name='Account'"));
        assert!(rendered.contains("@Value='Cash'"));
    }

    #[test]
    fn key_sequences_render_chords_and_text() {
        assert_eq!(KeySequence::expand().to_string(), "[CTRL-SPACE][RIGHT]");
        assert_eq!(KeySequence::text("a[b").to_string(), "a[[b");
    }

    #[test]
    fn script_names_are_stable() {
        let names = TreeScript::ALL.map(TreeScript::as_str);
        assert_eq!(names, ["collapse-all", "get-row", "edit-cells", "get-child"]);
    }
}
