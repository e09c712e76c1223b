use std::fmt;

use serde::{Deserialize, Serialize};

/// Upper bound of each axis in the normalized absolute coordinate space
pub const NORMALIZED_MAX: i32 = 65535;

/// A point in device pixels on the virtual screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: i32,
    pub y: i32,
}

impl ScreenPoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Translate by the given offset, saturating at the `i32` range
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }
}

impl fmt::Display for ScreenPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A point in the `[0, 65535]` per-axis space used by absolute injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct NormalizedPoint {
    pub x: i32,
    pub y: i32,
}

impl NormalizedPoint {
    /// Create a normalized point, clamping both axes into range
    pub fn new(x: i32, y: i32) -> Self {
        Self {
            x: x.clamp(0, NORMALIZED_MAX),
            y: y.clamp(0, NORMALIZED_MAX),
        }
    }
}

impl fmt::Display for NormalizedPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Resolution of the primary display in device pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScreenSize {
    pub width: i32,
    pub height: i32,
}

impl ScreenSize {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    pub const fn contains(&self, point: ScreenPoint) -> bool {
        point.x >= 0 && point.y >= 0 && point.x < self.width && point.y < self.height
    }
}

impl fmt::Display for ScreenSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Axis-aligned rectangle; `right` and `bottom` are exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(left: i32, top: i32, width: i32, height: i32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub const fn right(&self) -> i32 {
        self.left + self.width
    }

    pub const fn bottom(&self) -> i32 {
        self.top + self.height
    }

    pub const fn origin(&self) -> ScreenPoint {
        ScreenPoint::new(self.left, self.top)
    }

    /// Centre point, rounding toward the top-left like integer size halving
    pub const fn center(&self) -> ScreenPoint {
        ScreenPoint::new(self.left + self.width / 2, self.top + self.height / 2)
    }

    pub const fn contains(&self, point: ScreenPoint) -> bool {
        point.x >= self.left
            && point.y >= self.top
            && point.x < self.right()
            && point.y < self.bottom()
    }

    /// The same rectangle moved by `origin`, e.g. client to screen space
    pub const fn translate(&self, origin: ScreenPoint) -> Self {
        Self::new(
            self.left.saturating_add(origin.x),
            self.top.saturating_add(origin.y),
            self.width,
            self.height,
        )
    }
}
