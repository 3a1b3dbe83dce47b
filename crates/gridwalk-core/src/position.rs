//! Integer grid coordinates.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A cell on the unbounded integer grid that tracks are placed on.
///
/// `x` grows to the right and `y` grows downwards. Coordinates carry no unit
/// beyond "one grid cell".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate.
    pub x: i64,
    /// Vertical coordinate.
    pub y: i64,
}

impl Position {
    /// The origin cell, where every navigation starts.
    pub const ORIGIN: Self = Self { x: 0, y: 0 };

    /// Creates a position from its coordinates.
    #[must_use]
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Returns this position shifted by `offset`, component-wise.
    ///
    /// Components saturate at the `i64` bounds instead of overflowing.
    #[must_use]
    pub const fn offset_by(self, offset: Self) -> Self {
        Self {
            x: self.x.saturating_add(offset.x),
            y: self.y.saturating_add(offset.y),
        }
    }

    /// Returns `true` for the origin cell.
    #[must_use]
    pub const fn is_origin(self) -> bool {
        self.x == 0 && self.y == 0
    }
}

impl From<(i64, i64)> for Position {
    fn from((x, y): (i64, i64)) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
