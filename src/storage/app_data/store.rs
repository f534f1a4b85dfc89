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

use super::AppDataError;
use super::layout::{
    self, CALIBRATED, DEFAULT_ITEMS, DEFAULT_PASSWORD, FIRST_TIME, LatchState, MAX_PRICE,
    MAX_STRING_LENGTH, NUM_ITEMS, OFFSET_ADDRESS, PASSWORD_ADDRESS, SCALE_ADDRESS,
    STRING_SLOT_SIZE, TOTAL_INCOME_ADDRESS,
};
use crate::storage::eeprom::{NonVolatileStore, NvError};
use crate::weight::Calibration;
use embedded_storage::Storage;
use heapless::String;

/// Validated access to the kiosk records.
///
/// Every check happens before the first byte is written, so a rejected call leaves
/// storage untouched. Storage faults are reported as [`AppDataError::Storage`]
/// whatever their cause. The most recent failure is also kept in
/// [`Self::last_error`].
pub struct AppDataStore<S> {
    eeprom: NonVolatileStore<S>,
    last_error: Option<AppDataError>,
}

impl<S> AppDataStore<S>
where
    S: Storage,
{
    pub fn new(eeprom: NonVolatileStore<S>) -> Self {
        Self {
            eeprom,
            last_error: None,
        }
    }

    /// Writes the factory defaults unless the first-time latch is already set. The
    /// latch is written last so an interrupted run is simply repeated on the next boot.
    ///
    /// Returns `true` when the defaults were written.
    pub fn initialize(&mut self) -> Result<bool, AppDataError> {
        if !self.is_first_time() {
            debug!("Application data already initialised");
            return Ok(false);
        }

        info!("First start, writing application data defaults");
        self.save_password(DEFAULT_PASSWORD)?;
        for (index, (_, price)) in (1..=NUM_ITEMS).zip(DEFAULT_ITEMS.iter()) {
            self.save_item_price(index, *price)?;
        }
        for (index, (name, _)) in (1..=NUM_ITEMS).zip(DEFAULT_ITEMS.iter()) {
            self.save_item_name(index, name)?;
        }
        self.save_total_income(0.0)?;
        self.mark_as_initialized()?;
        Ok(true)
    }

    /// `true` unless the first-time latch holds its sentinel. An unreadable latch
    /// counts as first time.
    pub fn is_first_time(&mut self) -> bool {
        let state = FIRST_TIME.state(&mut self.eeprom);
        !matches!(self.storage(state), Ok(LatchState::Set))
    }

    pub fn mark_as_initialized(&mut self) -> Result<(), AppDataError> {
        let result = FIRST_TIME.set(&mut self.eeprom);
        self.storage(result)
    }

    /// Erases the whole store and writes the defaults again. Calibration is lost.
    pub fn factory_reset(&mut self) -> Result<(), AppDataError> {
        warn!("Factory reset of application data");
        let result = self.eeprom.erase();
        self.storage(result)?;
        self.initialize().map(|_| ())
    }

    pub fn save_password(&mut self, password: &str) -> Result<(), AppDataError> {
        self.check_length(password)?;
        let result = self.eeprom.write_string(PASSWORD_ADDRESS, password);
        self.storage(result)
    }

    /// Exact comparison against the stored password. A read failure never matches.
    pub fn verify_password(&mut self, candidate: &str) -> bool {
        if candidate.len() > MAX_STRING_LENGTH {
            return false;
        }
        let mut stored = [0u8; STRING_SLOT_SIZE as usize];
        let result = self.eeprom.read_string(PASSWORD_ADDRESS, &mut stored);
        match self.storage(result) {
            Ok(length) => &stored[..length] == candidate.as_bytes(),
            Err(_) => false,
        }
    }

    pub fn save_item_price(&mut self, index: u8, price: f32) -> Result<(), AppDataError> {
        self.check_index(index)?;
        if !(0.0..=MAX_PRICE).contains(&(price as f64)) {
            warn!("Rejected price for item {}", index);
            return self.fail(AppDataError::InvalidPrice);
        }
        let result = self.eeprom.write_f32(layout::price_address(index), price);
        self.storage(result)
    }

    /// Price as stored. An erased slot reads back as NaN.
    pub fn load_item_price(&mut self, index: u8) -> Result<f32, AppDataError> {
        self.check_index(index)?;
        let result = self.eeprom.read_f32(layout::price_address(index));
        self.storage(result)
    }

    pub fn save_item_name(&mut self, index: u8, name: &str) -> Result<(), AppDataError> {
        self.check_index(index)?;
        self.check_length(name)?;
        let result = self.eeprom.write_string(layout::name_address(index), name);
        self.storage(result)
    }

    /// Stored name, byte for byte. A slot that does not hold UTF-8 text, such as an
    /// erased one, is a storage error.
    pub fn load_item_name(&mut self, index: u8) -> Result<String<16>, AppDataError> {
        self.check_index(index)?;
        let mut raw = [0u8; STRING_SLOT_SIZE as usize];
        let result = self.eeprom.read_string(layout::name_address(index), &mut raw);
        let length = self.storage(result)?;

        let Ok(text) = core::str::from_utf8(&raw[..length]) else {
            warn!("Name of item {} is not valid text", index);
            return self.fail(AppDataError::Storage);
        };
        let mut name = String::new();
        if name.push_str(text).is_err() {
            return self.fail(AppDataError::StringTooLong);
        }
        Ok(name)
    }

    pub fn save_total_income(&mut self, income: f64) -> Result<(), AppDataError> {
        self.check_income(income)?;
        let result = self.eeprom.write_f64(TOTAL_INCOME_ADDRESS, income);
        self.storage(result)
    }

    pub fn load_total_income(&mut self) -> Result<f64, AppDataError> {
        let result = self.eeprom.read_f64(TOTAL_INCOME_ADDRESS);
        self.storage(result)
    }

    /// Adds `amount` to the running total and returns the new total. `amount` may be
    /// negative as long as the total stays at or above zero.
    pub fn add_to_total_income(&mut self, amount: f64) -> Result<f64, AppDataError> {
        let total = self.load_total_income()? + amount;
        self.save_total_income(total)?;
        debug!("Total income now {}", total);
        Ok(total)
    }

    /// Stores scale then offset, then sets the calibrated latch.
    pub fn save_calibration(&mut self, calibration: &Calibration) -> Result<(), AppDataError> {
        let result = self.eeprom.write_f64(SCALE_ADDRESS, calibration.scale);
        self.storage(result)?;
        let result = self
            .eeprom
            .write_integer(OFFSET_ADDRESS, calibration.offset as u32, 4);
        self.storage(result)?;
        self.mark_as_calibrated()
    }

    /// Raw stored values. Only meaningful when [`Self::is_calibrated`] is `true`.
    pub fn load_calibration(&mut self) -> Result<Calibration, AppDataError> {
        let result = self.eeprom.read_f64(SCALE_ADDRESS);
        let scale = self.storage(result)?;
        let result = self.eeprom.read_integer(OFFSET_ADDRESS, 4);
        let offset = self.storage(result)? as i32;
        Ok(Calibration { scale, offset })
    }

    pub fn is_calibrated(&mut self) -> bool {
        let state = CALIBRATED.state(&mut self.eeprom);
        matches!(self.storage(state), Ok(LatchState::Set))
    }

    pub fn mark_as_calibrated(&mut self) -> Result<(), AppDataError> {
        let result = CALIBRATED.set(&mut self.eeprom);
        self.storage(result)
    }

    pub fn last_error(&self) -> Option<AppDataError> {
        self.last_error
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    pub fn eeprom(&mut self) -> &mut NonVolatileStore<S> {
        &mut self.eeprom
    }

    pub fn release(self) -> NonVolatileStore<S> {
        self.eeprom
    }

    fn check_index(&mut self, index: u8) -> Result<(), AppDataError> {
        if !(1..=NUM_ITEMS).contains(&index) {
            warn!("Item index {} out of range", index);
            return self.fail(AppDataError::InvalidIndex);
        }
        Ok(())
    }

    fn check_length(&mut self, text: &str) -> Result<(), AppDataError> {
        if text.len() > MAX_STRING_LENGTH {
            warn!("Text of {} bytes is too long", text.len());
            return self.fail(AppDataError::StringTooLong);
        }
        Ok(())
    }

    fn check_income(&mut self, income: f64) -> Result<(), AppDataError> {
        if !income.is_finite() || income < 0.0 {
            warn!("Rejected total income {}", income);
            return self.fail(AppDataError::InvalidIncome);
        }
        Ok(())
    }

    fn storage<T>(&mut self, result: Result<T, NvError>) -> Result<T, AppDataError> {
        result.or_else(|error| {
            warn!("Application data storage error: {:?}", error);
            self.fail(error.into())
        })
    }

    fn fail<T>(&mut self, error: AppDataError) -> Result<T, AppDataError> {
        self.last_error = Some(error);
        Err(error)
    }
}
