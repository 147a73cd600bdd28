//! 4x4 GPIO matrix keypad.

use centrifuge_core::hal::Keypad;
use embassy_stm32::gpio::{Input, Output};
use embassy_time::{Duration, block_for};

const KEY_MAP: [[char; 4]; 4] = [
    ['1', '2', '3', 'A'],
    ['4', '5', '6', 'B'],
    ['7', '8', '9', 'C'],
    ['*', '0', '#', 'D'],
];

/// Row settle time after driving a row low.
const ROW_SETTLE: Duration = Duration::from_micros(5);

/// Rows are driven low one at a time; columns are pulled up.
pub struct MatrixKeypad {
    rows: [Output<'static>; 4],
    cols: [Input<'static>; 4],
    held: Option<char>,
}

impl MatrixKeypad {
    pub fn new(rows: [Output<'static>; 4], cols: [Input<'static>; 4]) -> Self {
        Self {
            rows,
            cols,
            held: None,
        }
    }

    fn scan(&mut self) -> Option<char> {
        let mut found = None;
        for (row_index, row) in self.rows.iter_mut().enumerate() {
            row.set_low();
            block_for(ROW_SETTLE);
            if found.is_none() {
                found = self
                    .cols
                    .iter()
                    .position(Input::is_low)
                    .map(|col_index| KEY_MAP[row_index][col_index]);
            }
            row.set_high();
        }
        found
    }
}

impl Keypad for MatrixKeypad {
    fn read_key(&mut self) -> Option<char> {
        let current = self.scan();
        let fresh = current.filter(|key| self.held != Some(*key));
        self.held = current;
        fresh
    }
}
