//! The Connect Four board: a flat, row-major array of optional chips.

use serde::{Deserialize, Serialize};

use super::constants::{COLUMNS, ROWS};
use super::game::ChipType;

/// `board[r][c]` in spec terms is `cells[r * COLUMNS + c]` here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    cells: Vec<Option<ChipType>>,
}

impl Board {
    pub fn empty() -> Self {
        Self {
            cells: vec![None; ROWS * COLUMNS],
        }
    }

    fn index(row: usize, column: usize) -> usize {
        row * COLUMNS + column
    }

    pub fn get(&self, row: usize, column: usize) -> Option<ChipType> {
        self.cells[Self::index(row, column)]
    }

    pub fn set(&mut self, row: usize, column: usize, chip: ChipType) {
        self.cells[Self::index(row, column)] = Some(chip);
    }

    /// Largest empty row index in `column`, or `None` if the column is full.
    /// This is the gravity resolution step of spec §4.2.
    pub fn lowest_empty_row(&self, column: usize) -> Option<usize> {
        (0..ROWS).rev().find(|&row| self.get(row, column).is_none())
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    /// Run length through `(row, column)` along the `(dr, dc)` axis,
    /// counting the placed chip itself plus both directions (spec §4.2:
    /// `forward + backward - 1`).
    pub fn run_length(&self, row: usize, column: usize, dr: isize, dc: isize) -> usize {
        let chip = match self.get(row, column) {
            Some(c) => c,
            None => return 0,
        };
        1 + self.count_direction(row, column, dr, dc, chip)
            + self.count_direction(row, column, -dr, -dc, chip)
    }

    fn count_direction(
        &self,
        row: usize,
        column: usize,
        dr: isize,
        dc: isize,
        chip: ChipType,
    ) -> usize {
        let mut count = 0;
        let mut r = row as isize + dr;
        let mut c = column as isize + dc;
        while r >= 0 && c >= 0 && (r as usize) < ROWS && (c as usize) < COLUMNS {
            if self.get(r as usize, c as usize) == Some(chip) {
                count += 1;
                r += dr;
                c += dc;
            } else {
                break;
            }
        }
        count
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::empty()
    }
}
