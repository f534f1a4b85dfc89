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

//! Keypad entry of passwords and prices. `#` finishes an entry, `*` deletes the last
//! character and `D` is the decimal point.

use crate::application::admin::{MAX_PASSWORD_LENGTH, PRICE_DECIMAL_PLACES};
use crate::hmi::{CANCEL_KEY, CONFIRM_KEY, CharacterDisplay, Keypad};
use heapless::String;

pub const MAX_PRICE_DIGITS: usize = 8;
pub const DECIMAL_POINT_KEY: char = 'D';
/// Price entry starts after the currency sign.
const PRICE_COLUMN: u8 = 1;

/// Reads up to six digits on the bottom row, echoing `*` for each.
pub async fn read_password<K, DISP>(keypad: &mut K, display: &mut DISP) -> String<MAX_PASSWORD_LENGTH>
where
    K: Keypad,
    DISP: CharacterDisplay,
{
    let mut password = String::new();
    while password.len() < MAX_PASSWORD_LENGTH {
        match keypad.wait_for_key().await {
            CONFIRM_KEY => break,
            CANCEL_KEY => {
                if password.pop().is_some() {
                    erase_at(display, password.len() as u8);
                }
            }
            key if key.is_ascii_digit() => {
                if password.push(key).is_err() {
                    break;
                }
                display.write_char('*');
            }
            _ => {}
        }
    }
    password
}

/// Reads a price on the bottom row. Extra decimals and a second decimal point are ignored.
pub async fn read_price_entry<K, DISP>(keypad: &mut K, display: &mut DISP) -> String<MAX_PRICE_DIGITS>
where
    K: Keypad,
    DISP: CharacterDisplay,
{
    let mut entry: String<MAX_PRICE_DIGITS> = String::new();
    while entry.len() < MAX_PRICE_DIGITS {
        let decimals = entry.split_once('.').map(|(_, decimals)| decimals.len());
        match keypad.wait_for_key().await {
            CONFIRM_KEY => break,
            CANCEL_KEY => {
                if entry.pop().is_some() {
                    erase_at(display, PRICE_COLUMN + entry.len() as u8);
                }
            }
            key if key.is_ascii_digit() => {
                if decimals.is_some_and(|count| count >= PRICE_DECIMAL_PLACES) {
                    continue;
                }
                if entry.push(key).is_err() {
                    break;
                }
                display.write_char(key);
            }
            DECIMAL_POINT_KEY if decimals.is_none() && !entry.is_empty() => {
                if entry.push('.').is_err() {
                    break;
                }
                display.write_char('.');
            }
            _ => {}
        }
    }
    entry
}

fn erase_at<DISP: CharacterDisplay>(display: &mut DISP, column: u8) {
    display.set_cursor(1, column);
    display.write_char(' ');
    display.set_cursor(1, column);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::admin::parse_price;
    use crate::test_support::{RecordingDisplay, ScriptedKeypad};
    use embassy_futures::block_on;

    #[test]
    fn password_is_masked() {
        let mut keypad = ScriptedKeypad::new("12A34#");
        let mut display = RecordingDisplay::default();
        display.set_cursor(1, 0);
        let password = block_on(read_password(&mut keypad, &mut display));
        assert_eq!(password.as_str(), "1234");
        assert_eq!(display.row(1), "****");
    }

    #[test]
    fn password_backspace() {
        let mut keypad = ScriptedKeypad::new("*129*3#");
        let mut display = RecordingDisplay::default();
        display.set_cursor(1, 0);
        let password = block_on(read_password(&mut keypad, &mut display));
        assert_eq!(password.as_str(), "123");
        assert_eq!(display.row(1), "***");
    }

    #[test]
    fn password_stops_at_six_digits() {
        let mut keypad = ScriptedKeypad::new("12345678#");
        let mut display = RecordingDisplay::default();
        let password = block_on(read_password(&mut keypad, &mut display));
        assert_eq!(password.as_str(), "123456");
        assert_eq!(keypad.remaining(), 3);
    }

    #[test]
    fn price_entry_with_decimals() {
        let mut keypad = ScriptedKeypad::new("D12D5D678#");
        let mut display = RecordingDisplay::default();
        display.set_cursor(1, 1);
        let entry = block_on(read_price_entry(&mut keypad, &mut display));
        assert_eq!(entry.as_str(), "12.567");
        assert_eq!(display.row(1), " 12.567");
        assert_eq!(parse_price(&entry), Ok(12.567));
    }

    #[test]
    fn deleting_the_point_allows_a_new_one() {
        let mut keypad = ScriptedKeypad::new("9D**8D25#");
        let mut display = RecordingDisplay::default();
        display.set_cursor(1, 1);
        let entry = block_on(read_price_entry(&mut keypad, &mut display));
        assert_eq!(entry.as_str(), "8.25");
        assert_eq!(display.row(1), " 8.25");
    }
}
