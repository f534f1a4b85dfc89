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
use crate::weight::interface::AsyncStrainGaugeInterface;
use core::convert::Infallible;

/// Simulated time that passes between two readings.
pub const SIMULATION_STEP_MS: u32 = 100;
const SECOND_LOAD_FROM_MS: u32 = 2_000;
const SECOND_LOAD_UNTIL_MS: u32 = 5_000;
const FIRST_LOAD_KG: f64 = 1.0;
const SECOND_LOAD_KG: f64 = 2.0;

const NOISE_KG: [f64; 11] = [
    -0.005, -0.004, -0.003, -0.002, -0.001, 0.0, 0.001, 0.002, 0.003, 0.004, 0.005,
];

/// Deterministic load pattern for bench work without a load cell.
///
/// 1 kg until 2 s of simulated time, 2 kg until 5 s, then 1 kg again, each with a
/// repeating ramp of noise between -5 g and +5 g. Each reading advances the clock by
/// [`SIMULATION_STEP_MS`]. Readings are produced in raw counts through the current
/// calibration, so a scale using that calibration reports the pattern in kilograms.
pub struct SimulatedStrainGauge {
    calibration: Calibration,
    elapsed_ms: u32,
    pattern_active: bool,
}

impl SimulatedStrainGauge {
    pub fn new(calibration: Calibration) -> Self {
        Self {
            calibration,
            elapsed_ms: 0,
            pattern_active: false,
        }
    }

    /// Load on the platter at `elapsed_ms` into the pattern.
    pub fn target_kg(elapsed_ms: u32) -> f64 {
        let noise = NOISE_KG[((elapsed_ms / SIMULATION_STEP_MS) as usize) % NOISE_KG.len()];
        let load = if (SECOND_LOAD_FROM_MS..SECOND_LOAD_UNTIL_MS).contains(&elapsed_ms) {
            SECOND_LOAD_KG
        } else {
            FIRST_LOAD_KG
        };
        load + noise
    }

    /// Restarts the pattern from zero at the next reading.
    pub fn reset(&mut self) {
        self.pattern_active = false;
        self.elapsed_ms = 0;
    }

    pub fn elapsed_ms(&self) -> u32 {
        self.elapsed_ms
    }

    pub fn is_pattern_active(&self) -> bool {
        self.pattern_active
    }

    pub fn calibration(&self) -> Calibration {
        self.calibration
    }

    pub fn next_raw(&mut self) -> i32 {
        if !self.pattern_active {
            self.pattern_active = true;
            self.elapsed_ms = 0;
        }

        let kg = Self::target_kg(self.elapsed_ms);
        self.elapsed_ms = self.elapsed_ms.saturating_add(SIMULATION_STEP_MS);

        let raw = self.calibration.offset as f64 + self.calibration.scale * kg;
        // round half away from zero, `as` saturates at the i32 limits
        let raw = (if raw >= 0.0 { raw + 0.5 } else { raw - 0.5 }) as i32;
        trace!("Simulated {} kg as raw {}", kg, raw);
        raw
    }
}

impl Default for SimulatedStrainGauge {
    fn default() -> Self {
        Self::new(Calibration::default())
    }
}

impl AsyncStrainGaugeInterface for SimulatedStrainGauge {
    type Error = Infallible;

    async fn initialize(&mut self) -> Result<(), Self::Error> {
        self.reset();
        Ok(())
    }

    async fn get_next_reading(&mut self) -> Result<i32, Self::Error> {
        Ok(self.next_raw())
    }

    async fn power_down(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    async fn power_up(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn get_adc_bit_count(&self) -> usize {
        24
    }

    fn calibration_changed(&mut self, calibration: &Calibration) {
        self.calibration = *calibration;
    }
}
