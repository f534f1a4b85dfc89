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

#![cfg_attr(not(test), no_std)]

//! Core of the fruit weighing kiosk: an EEPROM-style byte store with the kiosk's
//! application data mapped on top of it, and the HX711 load cell acquisition and
//! calibration path that turns raw bridge counts into kilograms.

#[macro_use]
mod fmt;

pub mod application;
pub mod hmi;
pub mod storage;
pub mod weight;

#[cfg(test)]
mod test_support;
