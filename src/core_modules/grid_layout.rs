// THEORY:
// The `GridLayout` decides where each processed frame lands on the display. It is a
// pure coordinate calculator: given a column and a row it returns the top-left pixel
// position of that cell. It owns no images and no display state.
//
// Every cell has the same size, and cells are separated by a fixed horizontal and
// vertical padding:
//
//     x = base_x + col * (cell_width + padding_x)
//     y = base_y + row * (cell_height + padding_y)
//
// Indices are not bounds-checked. Negative or very large columns and rows simply
// extrapolate along the same lattice, which lets callers place panels to the left
// of or above the origin. Positions are computed in i64; an i32 index times an
// i32 step cannot overflow it, and only a cell size near u32::MAX combined with an
// index near i32::MAX reaches the i64 range, where the result saturates.

use serde::{Deserialize, Serialize};

/// A (column, row) pair addressing one cell of the layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridCell {
    pub column: i32,
    pub row: i32,
}

impl GridCell {
    pub const fn new(column: i32, row: i32) -> Self {
        Self { column, row }
    }
}

/// Fixed-size cell lattice anchored at (base_x, base_y).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridLayout {
    base_x: i32,
    base_y: i32,
    cell_width: u32,
    cell_height: u32,
    padding_x: i32,
    padding_y: i32,
}

impl GridLayout {
    pub const fn new(
        base_x: i32,
        base_y: i32,
        cell_width: u32,
        cell_height: u32,
        padding_x: i32,
        padding_y: i32,
    ) -> Self {
        Self {
            base_x,
            base_y,
            cell_width,
            cell_height,
            padding_x,
            padding_y,
        }
    }

    /// Top-left pixel position of the cell at (col, row).
    pub fn position(&self, col: i32, row: i32) -> (i64, i64) {
        let x = Self::axis(self.base_x, col, self.cell_width, self.padding_x);
        let y = Self::axis(self.base_y, row, self.cell_height, self.padding_y);
        (x, y)
    }

    fn axis(base: i32, index: i32, cell: u32, padding: i32) -> i64 {
        let step = i64::from(cell) + i64::from(padding);
        i64::from(base).saturating_add(i64::from(index).saturating_mul(step))
    }

    pub fn cell_position(&self, cell: GridCell) -> (i64, i64) {
        self.position(cell.column, cell.row)
    }

    pub fn cell_width(&self) -> u32 {
        self.cell_width
    }

    pub fn cell_height(&self) -> u32 {
        self.cell_height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LAYOUT: GridLayout = GridLayout::new(10, 20, 160, 120, 10, 30);

    #[test]
    fn origin_is_base_offset() {
        assert_eq!(LAYOUT.position(0, 0), (10, 20));
    }

    #[test]
    fn steps_are_cell_size_plus_padding() {
        for col in -3..5 {
            for row in -3..5 {
                let (x, y) = LAYOUT.position(col, row);
                let (left_x, left_y) = LAYOUT.position(col - 1, row);
                let (up_x, up_y) = LAYOUT.position(col, row - 1);
                assert_eq!((x - left_x, y - left_y), (170, 0));
                assert_eq!((x - up_x, y - up_y), (0, 150));
            }
        }
    }

    #[test]
    fn negative_indices_extrapolate() {
        assert_eq!(LAYOUT.position(-1, -1), (-160, -130));
        assert_eq!(LAYOUT.cell_position(GridCell::new(2, 4)), (350, 620));
    }

    #[test]
    fn large_indices_extrapolate_without_overflow() {
        let layout = GridLayout::new(10, 10, 160, 120, 10, 30);
        assert_eq!(layout.position(20_000_000, 0), (3_400_000_010, 10));
        assert_eq!(layout.position(i32::MIN, i32::MAX), (10 + i32::MIN as i64 * 170, 10 + i32::MAX as i64 * 150));
    }

    #[test]
    fn cell_sizes_beyond_i32_stay_exact() {
        let wide = GridLayout::new(0, 0, 3_000_000_000, u32::MAX, 0, 0);
        assert_eq!(wide.position(1, 1), (3_000_000_000, u32::MAX as i64));
        assert_eq!(
            wide.position(i32::MAX, 0).0,
            i32::MAX as i64 * 3_000_000_000
        );
        let widest = GridLayout::new(i32::MAX, i32::MIN, u32::MAX, u32::MAX, i32::MAX, i32::MAX);
        assert_eq!(widest.position(i32::MAX, i32::MIN), (i64::MAX, i64::MIN));
    }

    #[test]
    fn deserializes_from_json() {
        let layout: GridLayout = serde_json::from_str(
            r#"{"base_x":10,"base_y":20,"cell_width":160,"cell_height":120,"padding_x":10,"padding_y":30}"#,
        )
        .expect("valid layout");
        assert_eq!(layout, LAYOUT);
    }
}
