//! Row-major 2D field storage
//!
//! A landscape is three fields of identical dimensions: cell states,
//! moisture and burn timers. All share this container.

use serde::{Deserialize, Serialize};

/// Offsets of the 8 Moore neighbours as `(dx, dy)`.
pub const MOORE_OFFSETS: [(i32, i32); 8] = [
    (1, 0),
    (0, 1),
    (-1, 0),
    (0, -1),
    (-1, -1),
    (1, -1),
    (-1, 1),
    (1, 1),
];

/// One value per grid cell, stored flat
///
/// Cell `(x, y)` lives at `y * width + x`; `width` counts columns and
/// `height` counts rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldData<T> {
    /// Row-major cell values
    pub data: Vec<T>,
    /// Grid width in cells
    pub width: usize,
    /// Grid height in cells
    pub height: usize,
}

impl<T: Copy + Default> FieldData<T> {
    /// `width × height` cells of `T::default()`
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self::with_value(width, height, T::default())
    }
}

impl<T: Copy> FieldData<T> {
    /// `width × height` copies of `value`
    #[must_use]
    pub fn with_value(width: usize, height: usize, value: T) -> Self {
        Self {
            data: vec![value; width * height],
            width,
            height,
        }
    }

    /// Build a field from row-major data.
    ///
    /// Returns `None` when `data.len() != width * height`.
    #[must_use]
    pub fn from_vec(width: usize, height: usize, data: Vec<T>) -> Option<Self> {
        (data.len() == width * height).then_some(Self {
            data,
            width,
            height,
        })
    }

    /// Cells in row-major order
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Total number of cells
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Flat index of `(x, y)`
    #[inline]
    #[must_use]
    pub fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    /// `(x, y)` of a flat index
    #[inline]
    #[must_use]
    pub fn coords(&self, index: usize) -> (usize, usize) {
        (index % self.width, index / self.width)
    }

    /// Value of cell `(x, y)`
    ///
    /// # Panics
    ///
    /// When `x >= width` or `y >= height`
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> T {
        assert!(
            x < self.width && y < self.height,
            "Coordinates out of bounds"
        );
        self.data[y * self.width + x]
    }

    /// Overwrite cell `(x, y)`
    ///
    /// # Panics
    ///
    /// When `x >= width` or `y >= height`
    pub fn set(&mut self, x: usize, y: usize, value: T) {
        assert!(
            x < self.width && y < self.height,
            "Coordinates out of bounds"
        );
        self.data[y * self.width + x] = value;
    }

    /// Number of cells matching a predicate
    pub fn count_where(&self, predicate: impl Fn(T) -> bool) -> usize {
        self.data.iter().filter(|&&v| predicate(v)).count()
    }

    /// In-bounds Moore neighbours of `(x, y)` as `(nx, ny)`
    pub fn moore_neighbors(&self, x: usize, y: usize) -> impl Iterator<Item = (usize, usize)> {
        let (width, height) = (self.width as i32, self.height as i32);
        let (x, y) = (x as i32, y as i32);
        MOORE_OFFSETS.iter().filter_map(move |&(dx, dy)| {
            let (nx, ny) = (x + dx, y + dy);
            (nx >= 0 && nx < width && ny >= 0 && ny < height).then_some((nx as usize, ny as usize))
        })
    }

    /// Rows as slices, top to bottom
    pub fn rows(&self) -> std::slice::Chunks<'_, T> {
        self.data.chunks(self.width.max(1))
    }
}
