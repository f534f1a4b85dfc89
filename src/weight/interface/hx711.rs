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

use crate::weight::interface::{AsyncStrainGaugeInterface, Hx711Gain};

const CLK_PULSE_US: u32 = 2;
const READY_POLL_INTERVAL_US: u32 = 10;
/// Upper bound on the ready wait, about half a second. A healthy bridge converts at 10 or 80 Hz.
pub const READY_TIMEOUT_POLLS: u32 = 50_000;
const POWER_DOWN_HOLD_US: u32 = 70;
const POWER_UP_SETTLE_MS: u32 = 200;
const VALID_DATA_BITS: usize = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<OutPinE, InPinE> {
    OutPin(OutPinE),
    InPin(InPinE),
    /// The data line never went low to signal a finished conversion.
    ReadyTimeout,
}

/// Bit-banged HX711 24 bit bridge ADC.
///
/// `D` must provide both the blocking delay used for the clock pulses, which run
/// inside a critical section, and the async delay used while waiting for data.
pub struct Hx711<CLK, DATA, D> {
    clock_pin: CLK,
    data_pin: DATA,
    delay: D,
    gain: Hx711Gain,
    powered_up: bool,
}

impl<CLK, DATA, D, ClkE, DataE> Hx711<CLK, DATA, D>
where
    CLK: embedded_hal::digital::OutputPin<Error = ClkE>,
    DATA: embedded_hal::digital::InputPin<Error = DataE>,
    D: embedded_hal::delay::DelayNs + embedded_hal_async::delay::DelayNs,
{
    pub fn new(clock_pin: CLK, data_pin: DATA, delay: D, gain: Hx711Gain) -> Self {
        Self {
            clock_pin,
            data_pin,
            delay,
            gain,
            powered_up: false,
        }
    }

    /// Takes effect from the conversion after the next reading.
    pub fn set_gain(&mut self, gain: Hx711Gain) {
        self.gain = gain;
    }

    pub fn gain(&self) -> Hx711Gain {
        self.gain
    }

    async fn wait_ready(&mut self) -> Result<(), Error<ClkE, DataE>> {
        for _ in 0..READY_TIMEOUT_POLLS {
            if self.data_pin.is_low().map_err(Error::InPin)? {
                return Ok(());
            }
            embedded_hal_async::delay::DelayNs::delay_us(&mut self.delay, READY_POLL_INTERVAL_US)
                .await;
        }
        warn!("HX711 not ready after {} polls", READY_TIMEOUT_POLLS);
        Err(Error::ReadyTimeout)
    }

    fn clock_pulse(&mut self) -> Result<bool, Error<ClkE, DataE>> {
        self.clock_pin.set_high().map_err(Error::OutPin)?;
        embedded_hal::delay::DelayNs::delay_us(&mut self.delay, CLK_PULSE_US);
        let data_sample = self.data_pin.is_high().map_err(Error::InPin)?;
        self.clock_pin.set_low().map_err(Error::OutPin)?;
        embedded_hal::delay::DelayNs::delay_us(&mut self.delay, CLK_PULSE_US);
        Ok(data_sample)
    }

    fn shift_in(&mut self) -> Result<i32, Error<ClkE, DataE>> {
        let mut data: u32 = 0;
        for _ in 0..VALID_DATA_BITS {
            data <<= 1;
            if self.clock_pulse()? {
                data |= 0x1;
            }
        }
        // selects the gain of the following conversion
        for _ in 0..self.gain.pulse_count() {
            self.clock_pulse()?;
        }

        // extend sign of bit 23
        Ok(((data << 8) as i32) >> 8)
    }
}

impl<CLK, DATA, D, ClkE, DataE> AsyncStrainGaugeInterface for Hx711<CLK, DATA, D>
where
    CLK: embedded_hal::digital::OutputPin<Error = ClkE>,
    DATA: embedded_hal::digital::InputPin<Error = DataE>,
    D: embedded_hal::delay::DelayNs + embedded_hal_async::delay::DelayNs,
{
    type Error = Error<ClkE, DataE>;

    async fn initialize(&mut self) -> Result<(), Self::Error> {
        self.power_up().await?;
        embedded_hal_async::delay::DelayNs::delay_ms(&mut self.delay, POWER_UP_SETTLE_MS).await;
        debug!("HX711 initialised, gain {}", self.gain.value());
        Ok(())
    }

    async fn get_next_reading(&mut self) -> Result<i32, Self::Error> {
        if !self.powered_up {
            self.power_up().await?;
        }

        self.wait_ready().await?;
        let reading = critical_section::with(|_| self.shift_in())?;
        trace!("HX711 raw reading {}", reading);
        Ok(reading)
    }

    async fn power_down(&mut self) -> Result<(), Self::Error> {
        self.clock_pin.set_low().map_err(Error::OutPin)?;
        embedded_hal_async::delay::DelayNs::delay_us(&mut self.delay, CLK_PULSE_US).await;
        self.clock_pin.set_high().map_err(Error::OutPin)?;
        embedded_hal_async::delay::DelayNs::delay_us(&mut self.delay, POWER_DOWN_HOLD_US).await;
        self.powered_up = false;
        Ok(())
    }

    async fn power_up(&mut self) -> Result<(), Self::Error> {
        self.clock_pin.set_low().map_err(Error::OutPin)?;
        self.powered_up = true;
        Ok(())
    }

    fn get_adc_bit_count(&self) -> usize {
        VALID_DATA_BITS
    }
}
