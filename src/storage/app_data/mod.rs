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

//! Kiosk records (password, item catalogue, income, calibration) at fixed addresses
//! of the [`NonVolatileStore`](crate::storage::eeprom::NonVolatileStore).

use crate::storage::eeprom::NvError;
use strum::IntoStaticStr;

pub mod layout;
mod store;

pub use store::AppDataStore;

/// Errors returned by [`AppDataStore`]. Converting to `&'static str` gives a message
/// short enough for one line of the kiosk display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AppDataError {
    #[strum(serialize = "Invalid item")]
    InvalidIndex,
    #[strum(serialize = "Text too long")]
    StringTooLong,
    #[strum(serialize = "Invalid price")]
    InvalidPrice,
    #[strum(serialize = "Invalid income")]
    InvalidIncome,
    #[strum(serialize = "EEPROM error")]
    Storage,
    /// Reserved for callers that require the first-time defaults to be in place.
    #[strum(serialize = "Not initialised")]
    NotInitialized,
    /// Reserved for callers that require a stored calibration.
    #[strum(serialize = "Not calibrated")]
    NotCalibrated,
}

impl From<NvError> for AppDataError {
    fn from(_: NvError) -> Self {
        AppDataError::Storage
    }
}
