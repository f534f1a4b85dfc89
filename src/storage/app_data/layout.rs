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

//! Fixed memory map of the kiosk records inside the 1 KiB store.
//!
//! ```text
//! 0x0000  password       16 bytes, terminated
//! 0x0010  prices         5 x f32
//! 0x0024  total income   f64
//! 0x002C  item names     5 x 16 bytes, terminated
//! 0x007C  first-time latch
//! 0x007D  scale          f64
//! 0x0085  offset         i32
//! 0x0089  calibrated latch
//! 0x008A  reserved to the end of the store
//! ```

use crate::storage::eeprom::{EEPROM_SIZE, NonVolatileStore, NvError};
use embedded_storage::Storage;

pub const NUM_ITEMS: u8 = 5;

/// Longest password or item name in bytes. Each slot holds one more byte for the terminator.
pub const MAX_STRING_LENGTH: usize = 15;
pub const STRING_SLOT_SIZE: u16 = (MAX_STRING_LENGTH + 1) as u16;

/// Upper price limit. Checked against the `f32` value that is actually stored, so
/// entries that round up past it are refused.
pub const MAX_PRICE: f64 = 999_999.99;

pub const PASSWORD_ADDRESS: u16 = 0x0000;
pub const PRICES_ADDRESS: u16 = 0x0010;
pub const PRICE_SIZE: u16 = 4;
pub const TOTAL_INCOME_ADDRESS: u16 = 0x0024;
pub const NAMES_ADDRESS: u16 = 0x002C;
pub const FIRST_TIME_FLAG_ADDRESS: u16 = 0x007C;
pub const SCALE_ADDRESS: u16 = 0x007D;
pub const OFFSET_ADDRESS: u16 = 0x0085;
pub const CALIBRATED_FLAG_ADDRESS: u16 = 0x0089;
pub const RESERVED_ADDRESS: u16 = 0x008A;

pub const FIRST_TIME_SENTINEL: u8 = 0xAA;
pub const CALIBRATED_SENTINEL: u8 = 0x55;

pub const DEFAULT_PASSWORD: &str = "0000";
pub const DEFAULT_ITEMS: [(&str, f32); NUM_ITEMS as usize] = [
    ("Apple", 10.0),
    ("Orange", 20.0),
    ("Mango", 35.0),
    ("Strawberry", 50.0),
    ("Banana", 70.0),
];

const _: () = {
    assert!(PASSWORD_ADDRESS + STRING_SLOT_SIZE <= PRICES_ADDRESS);
    assert!(PRICES_ADDRESS + PRICE_SIZE * NUM_ITEMS as u16 <= TOTAL_INCOME_ADDRESS);
    assert!(TOTAL_INCOME_ADDRESS + 8 <= NAMES_ADDRESS);
    assert!(NAMES_ADDRESS + STRING_SLOT_SIZE * NUM_ITEMS as u16 <= FIRST_TIME_FLAG_ADDRESS);
    assert!(FIRST_TIME_FLAG_ADDRESS < SCALE_ADDRESS);
    assert!(SCALE_ADDRESS + 8 <= OFFSET_ADDRESS);
    assert!(OFFSET_ADDRESS + 4 <= CALIBRATED_FLAG_ADDRESS);
    assert!(CALIBRATED_FLAG_ADDRESS < RESERVED_ADDRESS);
    assert!((RESERVED_ADDRESS as usize) < EEPROM_SIZE);
};

/// Address of the price slot for a 1-based item index. Caller validates the index.
pub(crate) fn price_address(index: u8) -> u16 {
    PRICES_ADDRESS + PRICE_SIZE * (index as u16 - 1)
}

pub(crate) fn name_address(index: u8) -> u16 {
    NAMES_ADDRESS + STRING_SLOT_SIZE * (index as u16 - 1)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LatchState {
    Set,
    Unset,
}

/// One-way flag stored as a single byte. Only the exact sentinel value counts as set,
/// so an erased cell reads as unset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Latch {
    pub address: u16,
    pub sentinel: u8,
}

pub const FIRST_TIME: Latch = Latch {
    address: FIRST_TIME_FLAG_ADDRESS,
    sentinel: FIRST_TIME_SENTINEL,
};

pub const CALIBRATED: Latch = Latch {
    address: CALIBRATED_FLAG_ADDRESS,
    sentinel: CALIBRATED_SENTINEL,
};

impl Latch {
    pub fn state<S: Storage>(&self, store: &mut NonVolatileStore<S>) -> Result<LatchState, NvError> {
        match store.read_byte(self.address)? {
            value if value == self.sentinel => Ok(LatchState::Set),
            _ => Ok(LatchState::Unset),
        }
    }

    pub fn set<S: Storage>(&self, store: &mut NonVolatileStore<S>) -> Result<(), NvError> {
        store.write_byte(self.address, self.sentinel)
    }
}
