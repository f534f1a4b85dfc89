// Copyright (C) 2025 Paul Hampson
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License version 3 as  published by the
// Free Software Foundation.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more
// details.
//
// You should have received a copy of the GNU General Public License along with
// this program.  If not, see <https://www.gnu.org/licenses/>.

//! What the core needs from the kiosk front panel: a 16x2 character display and a
//! 4x4 keypad. Screen flows live with their owners and only talk to these traits.

/// Key used to confirm a prompt.
pub const CONFIRM_KEY: char = '#';
/// Key used to back out of a prompt.
pub const CANCEL_KEY: char = '*';

pub trait CharacterDisplay {
    const ROWS: u8 = 2;
    const COLUMNS: u8 = 16;

    fn clear(&mut self);

    fn set_cursor(&mut self, row: u8, column: u8);

    fn write_char(&mut self, character: char);

    /// Writes `text` from the given position. Characters past the last column are dropped.
    fn write_str_at(&mut self, row: u8, column: u8, text: &str) {
        self.set_cursor(row, column);
        let room = Self::COLUMNS.saturating_sub(column) as usize;
        for character in text.chars().take(room) {
            self.write_char(character);
        }
    }

    /// Clears the screen and shows one line per row.
    fn show(&mut self, top: &str, bottom: &str) {
        self.clear();
        self.write_str_at(0, 0, top);
        self.write_str_at(1, 0, bottom);
    }
}

#[allow(async_fn_in_trait)]
pub trait Keypad {
    /// Waits for the next key press and returns its legend.
    async fn wait_for_key(&mut self) -> char;

    /// Key pressed since the last call, if any.
    fn poll_key(&mut self) -> Option<char>;
}
