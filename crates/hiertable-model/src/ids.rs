// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::fmt;

// Element handles are only valid until the next scroll or expand; never cache
// them across table operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementId(u64);

impl ElementId {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for ElementId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::ElementId;

    #[test]
    fn handles_display_with_a_hash() {
        let id = ElementId::from(42);
        assert_eq!(id.get(), 42);
        assert_eq!(id, ElementId::new(42));
        assert_eq!(id.to_string(), "#42");
    }
}
