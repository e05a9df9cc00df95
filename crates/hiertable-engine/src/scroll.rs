// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Mouse-wheel search that brings a row inside its container's viewport.
//!
//! A target without geometry is treated as far off-screen in an unknown
//! direction: the search first scrolls down, then, if the target is still
//! without geometry, scrolls up. Both phases are bounded, so a target that
//! is too far away is left where it is.

use anyhow::{Context, Result};
use hiertable_model::{AutomationDriver, BoundingRectangle, ElementId};
use tracing::debug;

/// Pixels per wheel step.
pub const SCROLL_STEP: i32 = 15;
/// Wheel steps per phase.
pub const MAX_SCROLL_ATTEMPTS: usize = 15;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrollReport {
    pub scrolls: usize,
    pub visible: bool,
}

pub fn scroll_until_on_screen<D>(
    driver: &mut D,
    container: ElementId,
    target: ElementId,
) -> Result<ScrollReport>
where
    D: AutomationDriver + ?Sized,
{
    let Some(view) = snapshot(driver, container) else {
        debug!(%container, "container geometry unavailable, not scrolling");
        return Ok(ScrollReport::default());
    };
    let (from_x, from_y) = view.center();

    let mut target_y = snapshot(driver, target).map(|rect| rect.y);
    if is_visible(&view, target_y) {
        return Ok(ScrollReport {
            scrolls: 0,
            visible: true,
        });
    }

    let mut scrolls = 0usize;
    for _ in 0..MAX_SCROLL_ATTEMPTS {
        let amount = match target_y {
            Some(y) if y <= view.bottom() => -SCROLL_STEP,
            _ => SCROLL_STEP,
        };
        wheel(driver, amount, from_x, from_y)?;
        scrolls += 1;

        target_y = snapshot(driver, target).map(|rect| rect.y);
        if is_visible(&view, target_y) {
            return Ok(ScrollReport {
                scrolls,
                visible: true,
            });
        }
    }

    if target_y.is_none() {
        for _ in 0..MAX_SCROLL_ATTEMPTS {
            wheel(driver, -SCROLL_STEP, from_x, from_y)?;
            scrolls += 1;

            target_y = snapshot(driver, target).map(|rect| rect.y);
            if target_y.is_some_and(|y| y >= view.top()) {
                break;
            }
        }
    }

    Ok(ScrollReport {
        scrolls,
        visible: is_visible(&view, target_y),
    })
}

fn is_visible(view: &BoundingRectangle, target_y: Option<i32>) -> bool {
    target_y.is_some_and(|y| view.contains_y(y))
}

fn snapshot<D>(driver: &mut D, element: ElementId) -> Option<BoundingRectangle>
where
    D: AutomationDriver + ?Sized,
{
    match driver.bounds(element) {
        Ok(rect) => rect,
        Err(error) => {
            debug!(%element, %error, "bounding rectangle unavailable");
            None
        }
    }
}

fn wheel<D>(driver: &mut D, amount: i32, x: i32, y: i32) -> Result<()>
where
    D: AutomationDriver + ?Sized,
{
    debug!(
        direction = if amount < 0 { "up" } else { "down" },
        pixels = amount.abs(),
        "scrolling"
    );
    driver
        .mouse_wheel(amount, x, y)
        .with_context(|| format!("scroll by {amount} at ({x}, {y})"))
}

#[cfg(test)]
mod tests {
    use super::{SCROLL_STEP, ScrollReport, scroll_until_on_screen};
    use anyhow::Result;
    use hiertable_model::ElementId;
    use hiertable_testkit::{FakeDesktop, TABLE, demo_desktop};

    /// Demo desktop with `Expenses` expanded: 28 displayed rows, `Period NN`
    /// at display index `NN + 2`, and row `i` at `y = 120 + 20 * i`.
    fn expanded_expenses() -> (FakeDesktop, Vec<ElementId>) {
        let mut desktop = demo_desktop();
        let expenses = desktop.displayed_rows()[2];
        desktop.set_expanded(expenses, true);
        let rows = desktop.displayed_rows();
        (desktop, rows)
    }

    #[test]
    fn visible_row_needs_no_scrolling() -> Result<()> {
        let (mut desktop, rows) = expanded_expenses();
        let report = scroll_until_on_screen(&mut desktop, TABLE, rows[0])?;
        assert_eq!(
            report,
            ScrollReport {
                scrolls: 0,
                visible: true
            }
        );
        assert!(desktop.wheel_amounts().is_empty());
        Ok(())
    }

    #[test]
    fn row_below_viewport_scrolls_down() -> Result<()> {
        let (mut desktop, rows) = expanded_expenses();
        let report = scroll_until_on_screen(&mut desktop, TABLE, rows[11])?;
        assert!(report.visible);
        assert_eq!(report.scrolls, 3);
        assert_eq!(desktop.wheel_amounts(), vec![SCROLL_STEP; 3]);
        Ok(())
    }

    #[test]
    fn missing_container_geometry_skips_scrolling() -> Result<()> {
        let mut desktop = demo_desktop().with_viewport(None);
        let first = desktop.displayed_rows()[0];
        let report = scroll_until_on_screen(&mut desktop, TABLE, first)?;
        assert_eq!(report, ScrollReport::default());
        assert!(desktop.wheel_amounts().is_empty());
        Ok(())
    }

    #[test]
    fn unreachable_row_stops_after_both_phases() -> Result<()> {
        let (mut desktop, rows) = expanded_expenses();
        let report = scroll_until_on_screen(&mut desktop, TABLE, rows[26])?;
        assert!(!report.visible);
        assert_eq!(report.scrolls, 30);

        let amounts = desktop.wheel_amounts();
        assert_eq!(amounts[..15], [SCROLL_STEP; 15]);
        assert_eq!(amounts[15..], [-SCROLL_STEP; 15]);
        Ok(())
    }

    #[test]
    fn row_above_viewport_is_found_scrolling_up() -> Result<()> {
        let (mut desktop, rows) = expanded_expenses();
        desktop.set_scroll_offset(380);
        assert_eq!(desktop.scroll_offset(), 380);

        let report = scroll_until_on_screen(&mut desktop, TABLE, rows[11])?;
        assert!(report.visible);
        assert_eq!(report.scrolls, 25);
        let amounts = desktop.wheel_amounts();
        assert!(amounts[..15].iter().all(|amount| *amount == SCROLL_STEP));
        assert!(amounts[15..].iter().all(|amount| *amount == -SCROLL_STEP));
        Ok(())
    }

    #[test]
    fn upward_search_stops_when_row_reaches_viewport_top() -> Result<()> {
        let (mut desktop, rows) = expanded_expenses();
        desktop.set_scroll_offset(380);

        // Row 12 climbs from y = -20 in steps of 15 and lands on y = 100, the
        // viewport's top edge, after eight upward steps.
        let report = scroll_until_on_screen(&mut desktop, TABLE, rows[12])?;
        assert_eq!(report.scrolls, 23);
        assert!(!report.visible);
        assert_eq!(desktop.scroll_offset(), 260);
        Ok(())
    }
}
