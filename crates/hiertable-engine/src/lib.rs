// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod expander;
pub mod format;
pub mod locator;
pub mod scripted;
pub mod scroll;
pub mod table;

pub use expander::expand_to_match;
pub use format::{CellFormatter, normalize_space};
pub use scroll::{MAX_SCROLL_ATTEMPTS, SCROLL_STEP, ScrollReport, scroll_until_on_screen};
pub use table::{HierTable, Strategy};
