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

use crate::weight::Calibration;
use strum::{EnumCount, EnumIter};

pub mod hx711;
pub mod simulated;
pub mod switched;

#[allow(async_fn_in_trait)]
pub trait AsyncStrainGaugeInterface {
    type Error;

    /// Initialise the gauge and make it ready for taking readings. Will put it into an initalized,
    /// powered up state.
    async fn initialize(&mut self) -> Result<(), Self::Error>;

    /// Gets next raw reading from the strain gauge. If the gauge is powered down then
    /// this function is expected to power up the device and get the reading.
    async fn get_next_reading(&mut self) -> Result<i32, Self::Error>;

    /// Power down the strain gauge
    async fn power_down(&mut self) -> Result<(), Self::Error>;

    /// Power up the strain gauge
    async fn power_up(&mut self) -> Result<(), Self::Error>;

    /// Return the number of bits supported by the ADC
    fn get_adc_bit_count(&self) -> usize;

    /// Told about every scale or offset change made by the owner of the gauge.
    fn calibration_changed(&mut self, _calibration: &Calibration) {}
}

/// Channel and gain used for the conversion after the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumIter, EnumCount)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Hx711Gain {
    #[default]
    Gain128,
    Gain64,
    Gain32ChannelB,
}

impl Hx711Gain {
    /// Extra clock pulses after the 24 data bits that select this gain.
    pub fn pulse_count(&self) -> usize {
        match self {
            Hx711Gain::Gain128 => 1,
            Hx711Gain::Gain64 => 3,
            Hx711Gain::Gain32ChannelB => 2,
        }
    }

    pub fn value(&self) -> u8 {
        match self {
            Hx711Gain::Gain128 => 128,
            Hx711Gain::Gain64 => 64,
            Hx711Gain::Gain32ChannelB => 32,
        }
    }

    /// Unknown values select channel A at 128.
    pub fn from_value(value: u8) -> Self {
        match value {
            64 => Hx711Gain::Gain64,
            32 => Hx711Gain::Gain32ChannelB,
            _ => Hx711Gain::Gain128,
        }
    }
}
