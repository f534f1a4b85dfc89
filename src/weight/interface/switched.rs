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
use crate::weight::interface::simulated::SimulatedStrainGauge;

/// Real gauge with a [`SimulatedStrainGauge`] that can stand in for it at runtime.
///
/// Enabling and starting the simulation have the same effect, as do disabling and
/// stopping it. Every toggle restarts the simulated pattern. While simulating, the
/// hardware is not touched.
pub struct SwitchableStrainGauge<G> {
    hardware: G,
    simulator: SimulatedStrainGauge,
    simulation_enabled: bool,
}

impl<G> SwitchableStrainGauge<G>
where
    G: AsyncStrainGaugeInterface,
{
    pub fn new(hardware: G, simulation_enabled: bool) -> Self {
        Self {
            hardware,
            simulator: SimulatedStrainGauge::default(),
            simulation_enabled,
        }
    }

    pub fn enable_simulation(&mut self) {
        self.set_simulation(true);
    }

    pub fn disable_simulation(&mut self) {
        self.set_simulation(false);
    }

    pub fn start_simulation_pattern(&mut self) {
        self.set_simulation(true);
    }

    pub fn stop_simulation_pattern(&mut self) {
        self.set_simulation(false);
    }

    pub fn is_simulation_enabled(&self) -> bool {
        self.simulation_enabled
    }

    pub fn simulator(&self) -> &SimulatedStrainGauge {
        &self.simulator
    }

    pub fn hardware(&self) -> &G {
        &self.hardware
    }

    pub fn hardware_mut(&mut self) -> &mut G {
        &mut self.hardware
    }

    fn set_simulation(&mut self, enabled: bool) {
        debug!("Load cell simulation enabled: {}", enabled);
        self.simulation_enabled = enabled;
        self.simulator.reset();
    }
}

impl<G> AsyncStrainGaugeInterface for SwitchableStrainGauge<G>
where
    G: AsyncStrainGaugeInterface,
{
    type Error = G::Error;

    async fn initialize(&mut self) -> Result<(), Self::Error> {
        self.simulator.reset();
        if self.simulation_enabled {
            info!("Load cell simulation active, hardware not initialised");
            return Ok(());
        }
        self.hardware.initialize().await
    }

    async fn get_next_reading(&mut self) -> Result<i32, Self::Error> {
        if self.simulation_enabled {
            return Ok(self.simulator.next_raw());
        }
        self.hardware.get_next_reading().await
    }

    async fn power_down(&mut self) -> Result<(), Self::Error> {
        if self.simulation_enabled {
            return Ok(());
        }
        self.hardware.power_down().await
    }

    async fn power_up(&mut self) -> Result<(), Self::Error> {
        if self.simulation_enabled {
            return Ok(());
        }
        self.hardware.power_up().await
    }

    fn get_adc_bit_count(&self) -> usize {
        self.hardware.get_adc_bit_count()
    }

    fn calibration_changed(&mut self, calibration: &Calibration) {
        self.simulator.calibration_changed(calibration);
        self.hardware.calibration_changed(calibration);
    }
}
