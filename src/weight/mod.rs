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

pub mod calibration;
pub mod interface;
pub mod weight;

/// Conversion between raw ADC counts and kilograms: `kg = (raw - offset) / scale`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Calibration {
    /// Counts per kilogram. Never zero once accepted by a [`weight::WeightScale`].
    pub scale: f64,
    /// Raw reading with nothing on the platter.
    pub offset: i32,
}

impl Calibration {
    pub const DEFAULT_SCALE: f64 = 1.0;
    pub const DEFAULT_OFFSET: i32 = 0;
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            scale: Self::DEFAULT_SCALE,
            offset: Self::DEFAULT_OFFSET,
        }
    }
}

#[allow(async_fn_in_trait)]
pub trait WeighingSystem {
    type Error;

    /// Takes the current load as the new zero.
    async fn tare(&mut self) -> Result<(), Self::Error>;

    /// Sets the span from a known reference load placed on a tared platter.
    async fn calibrate(&mut self, reference_kg: f64) -> Result<(), Self::Error>;

    async fn get_weight_kg(&mut self) -> Result<f64, Self::Error>;

    fn calibration(&self) -> Calibration;
}
