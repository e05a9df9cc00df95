// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

/// What the engine knows about the control's expanded nodes.
///
/// Only the scripted strategy reads this: it tells the injected script
/// whether remnants of an earlier traversal must be collapsed before
/// matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpansionState {
    already_collapsed: bool,
}

impl Default for ExpansionState {
    fn default() -> Self {
        Self {
            already_collapsed: true,
        }
    }
}

impl ExpansionState {
    pub const fn already_collapsed(self) -> bool {
        self.already_collapsed
    }

    pub fn mark_collapsed(&mut self) {
        self.already_collapsed = true;
    }

    /// Some nodes may now be expanded.
    pub fn mark_expanded(&mut self) {
        self.already_collapsed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::ExpansionState;

    #[test]
    fn starts_collapsed_and_toggles() {
        let mut state = ExpansionState::default();
        assert!(state.already_collapsed());

        state.mark_expanded();
        assert!(!state.already_collapsed());

        state.mark_collapsed();
        state.mark_collapsed();
        assert!(state.already_collapsed());
    }
}
