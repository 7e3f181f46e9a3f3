//! Pixel-coordinate boxes for region decodes.
//!
//! A host asks the decoders for a [`Rect`] of pixels at a time: one row for
//! row-pull hosts, a tile or the full image otherwise.
//!
//! # Coordinate System
//!
//! - Origin (0, 0) is at the **top-left** corner
//! - X increases to the right
//! - Y increases downward
//!
//! Sources that store scanlines bottom-up are flipped by the decoders, not
//! by this type.
//!
//! ```text
//! (0,0) ────────► X
//!   │
//!   │   ┌──────────┐
//!   │   │  Decode  │
//!   │   │   box    │
//!   │   └──────────┘
//!   ▼
//!   Y
//! ```
//!
//! # Usage
//!
//! ```rust
//! use deeprat_core::Rect;
//!
//! let rect = Rect::new(10, 20, 100, 50);
//! assert!(rect.contains(15, 25));
//! assert!(!rect.contains(5, 25));
//!
//! let bounds = Rect::from_size(64, 64);
//! assert!(bounds.contains_rect(&Rect::new(0, 0, 64, 1)));
//! ```

use std::fmt;
use std::str::FromStr;

/// A rectangle defined by origin (x, y) and dimensions (width, height).
///
/// The rectangle is inclusive on the left/top edges and exclusive on the
/// right/bottom edges. A rectangle with zero width or height is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    /// X coordinate of the left edge (inclusive)
    pub x: u32,
    /// Y coordinate of the top edge (inclusive)
    pub y: u32,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Rect {
    /// Creates a new rectangle with the given origin and dimensions.
    #[inline]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Creates a rectangle from origin (0, 0) with given dimensions.
    ///
    /// # Example
    ///
    /// ```rust
    /// use deeprat_core::Rect;
    ///
    /// let rect = Rect::from_size(1920, 1080);
    /// assert_eq!(rect.x, 0);
    /// assert_eq!(rect.area(), 1920 * 1080);
    /// ```
    #[inline]
    pub const fn from_size(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Creates a one-pixel-high rectangle covering columns `x..right` of row `y`.
    #[inline]
    pub const fn row(y: u32, x: u32, right: u32) -> Self {
        Self::new(x, y, right.saturating_sub(x), 1)
    }

    /// Returns the X coordinate of the right edge (exclusive).
    #[inline]
    pub const fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Returns the Y coordinate of the bottom edge (exclusive).
    #[inline]
    pub const fn bottom(&self) -> u32 {
        self.y + self.height
    }

    /// Returns the area of the rectangle in pixels.
    #[inline]
    pub const fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Returns `true` if the rectangle has zero area.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Returns `true` if the point (px, py) is inside this rectangle.
    ///
    /// # Example
    ///
    /// ```rust
    /// use deeprat_core::Rect;
    ///
    /// let rect = Rect::new(10, 10, 100, 100);
    /// assert!(rect.contains(10, 10));
    /// assert!(rect.contains(109, 109));
    /// assert!(!rect.contains(110, 110));
    /// ```
    #[inline]
    pub const fn contains(&self, px: u32, py: u32) -> bool {
        px >= self.x && px < self.right() && py >= self.y && py < self.bottom()
    }

    /// Returns `true` if this rectangle fully contains another.
    ///
    /// Edges are compared in 64 bits, so a host-supplied box whose right or
    /// bottom edge does not fit in `u32` is simply not contained.
    #[inline]
    pub const fn contains_rect(&self, other: &Rect) -> bool {
        let right = other.x as u64 + other.width as u64;
        let bottom = other.y as u64 + other.height as u64;
        other.x >= self.x
            && other.y >= self.y
            && right <= self.x as u64 + self.width as u64
            && bottom <= self.y as u64 + self.height as u64
    }

    /// Returns an iterator over the row indices of this rectangle, top to bottom.
    #[inline]
    pub fn rows(&self) -> std::ops::Range<u32> {
        self.y..self.bottom()
    }

    /// Returns an iterator over all (x, y) coordinates in this rectangle.
    ///
    /// Iterates row by row, left to right, top to bottom.
    ///
    /// # Example
    ///
    /// ```rust
    /// use deeprat_core::Rect;
    ///
    /// let rect = Rect::new(0, 0, 2, 2);
    /// let coords: Vec<_> = rect.iter_coords().collect();
    /// assert_eq!(coords, vec![(0, 0), (1, 0), (0, 1), (1, 1)]);
    /// ```
    #[inline]
    pub fn iter_coords(&self) -> impl Iterator<Item = (u32, u32)> + use<> {
        let (left, right) = (self.x, self.right());
        (self.y..self.bottom()).flat_map(move |y| (left..right).map(move |x| (x, y)))
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Rect({}, {}, {}x{})",
            self.x, self.y, self.width, self.height
        )
    }
}

/// Parses `"x,y,w,h"`.
impl FromStr for Rect {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(crate::Error::invalid_box(s, "expected x,y,w,h"));
        }
        let mut values = [0u32; 4];
        for (slot, part) in values.iter_mut().zip(&parts) {
            *slot = part
                .parse()
                .map_err(|_| crate::Error::invalid_box(s, format!("bad component '{}'", part)))?;
        }
        Ok(Rect::new(values[0], values[1], values[2], values[3]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_edges() {
        let r = Rect::new(10, 20, 100, 50);
        assert_eq!(r.right(), 110);
        assert_eq!(r.bottom(), 70);
        assert_eq!(r.area(), 5000);
    }

    #[test]
    fn test_rect_row() {
        let r = Rect::row(3, 2, 6);
        assert_eq!(r, Rect::new(2, 3, 4, 1));
        assert!(Rect::row(3, 6, 2).is_empty());
    }

    #[test]
    fn test_rect_contains_rect() {
        let bounds = Rect::from_size(10, 10);
        assert!(bounds.contains_rect(&Rect::new(0, 0, 10, 10)));
        assert!(bounds.contains_rect(&Rect::new(9, 9, 1, 1)));
        assert!(!bounds.contains_rect(&Rect::new(9, 9, 2, 1)));
    }

    #[test]
    fn test_rect_contains_rect_past_u32() {
        let bounds = Rect::from_size(4, 4);
        assert!(!bounds.contains_rect(&Rect::new(u32::MAX, 0, 2, 1)));
        assert!(!bounds.contains_rect(&Rect::new(0, 1, 1, u32::MAX)));
        assert!(!bounds.contains_rect(&Rect::new(u32::MAX, u32::MAX, u32::MAX, u32::MAX)));
    }

    #[test]
    fn test_rect_rows_and_coords() {
        let r = Rect::new(1, 4, 2, 2);
        assert_eq!(r.rows().collect::<Vec<_>>(), vec![4, 5]);
        let coords: Vec<_> = r.iter_coords().collect();
        assert_eq!(coords, vec![(1, 4), (2, 4), (1, 5), (2, 5)]);
    }

    #[test]
    fn test_rect_parse() {
        let r: Rect = "1, 2,3,4".parse().unwrap();
        assert_eq!(r, Rect::new(1, 2, 3, 4));
        assert!("1,2,3".parse::<Rect>().is_err());
        let err = "1,2,x,4".parse::<Rect>().unwrap_err();
        assert!(err.to_string().contains("'x'"));
    }
}
