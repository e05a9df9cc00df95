// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

/// Snapshot of an element's on-screen geometry in screen pixels.
///
/// Drivers return `None` instead of a rectangle when the element is
/// off-screen or stale, so a zero-sized rectangle still means "rendered".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingRectangle {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl BoundingRectangle {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub const fn top(&self) -> i32 {
        self.y
    }

    pub const fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub const fn center(&self) -> (i32, i32) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }

    /// True when `y` lies strictly between the top and bottom edges.
    pub const fn contains_y(&self, y: i32) -> bool {
        y > self.top() && y < self.bottom()
    }
}
