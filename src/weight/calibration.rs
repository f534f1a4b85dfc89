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

use crate::hmi::{CONFIRM_KEY, CharacterDisplay, Keypad};
use crate::storage::app_data::{AppDataError, AppDataStore};
use crate::weight::{Calibration, WeighingSystem};
use core::fmt::Write;
use embedded_storage::Storage;
use heapless::String;

/// Reference load the kiosk ships with.
pub const DEFAULT_REFERENCE_KG: f64 = 1.0;
/// Shown when the reference weight is too wide for one display line.
const REFERENCE_PROMPT: &str = "Place reference";

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalibrationError<WeighingE> {
    Weighing(WeighingE),
    Storage(AppDataError),
}

impl<WeighingE> From<AppDataError> for CalibrationError<WeighingE> {
    fn from(error: AppDataError) -> Self {
        CalibrationError::Storage(error)
    }
}

/// Which steps of a guided calibration the operator confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GuidedCalibration {
    pub tared: bool,
    /// Calibration written to storage, if the span step was confirmed.
    pub saved: Option<Calibration>,
}

/// Tare, span and persistence of the scale calibration.
pub struct CalibrationManager {
    reference_kg: f64,
}

impl CalibrationManager {
    pub fn new(reference_kg: f64) -> Self {
        Self { reference_kg }
    }

    pub fn reference_kg(&self) -> f64 {
        self.reference_kg
    }

    /// Stored calibration when the calibrated latch is set, defaults otherwise.
    pub fn restore<S: Storage>(app_data: &mut AppDataStore<S>) -> Calibration {
        if !app_data.is_calibrated() {
            info!("Scale not calibrated, using defaults");
            return Calibration::default();
        }

        match app_data.load_calibration() {
            Ok(calibration) => {
                debug!(
                    "Calibration loaded. Scale: {}, offset: {}",
                    calibration.scale,
                    calibration.offset
                );
                calibration
            }
            Err(error) => {
                warn!("Unable to load calibration: {:?}", error);
                Calibration::default()
            }
        }
    }

    /// Zeroes the scale. Run with the platter empty.
    pub async fn tare<W: WeighingSystem>(
        &self,
        scale: &mut W,
    ) -> Result<(), CalibrationError<W::Error>> {
        scale.tare().await.map_err(CalibrationError::Weighing)
    }

    /// Sets the span with the reference load on the platter.
    pub async fn span<W: WeighingSystem>(
        &self,
        scale: &mut W,
    ) -> Result<Calibration, CalibrationError<W::Error>> {
        scale
            .calibrate(self.reference_kg)
            .await
            .map_err(CalibrationError::Weighing)?;
        Ok(scale.calibration())
    }

    /// Writes the current calibration and sets the calibrated latch.
    pub fn persist<W: WeighingSystem, S: Storage>(
        &self,
        scale: &W,
        app_data: &mut AppDataStore<S>,
    ) -> Result<Calibration, AppDataError> {
        let calibration = scale.calibration();
        app_data.save_calibration(&calibration)?;
        info!(
            "Calibration saved. Scale: {}, offset: {}",
            calibration.scale,
            calibration.offset
        );
        Ok(calibration)
    }

    /// Walks the operator through tare and span on the front panel. Each step runs only
    /// if the operator confirms it, and a confirmed span is saved straight away.
    pub async fn run_guided<W, S, DISP, K>(
        &self,
        scale: &mut W,
        app_data: &mut AppDataStore<S>,
        display: &mut DISP,
        keypad: &mut K,
    ) -> Result<GuidedCalibration, CalibrationError<W::Error>>
    where
        W: WeighingSystem,
        S: Storage,
        DISP: CharacterDisplay,
        K: Keypad,
    {
        let mut outcome = GuidedCalibration::default();

        display.show("Remove weight", "Press # to tare");
        if keypad.wait_for_key().await == CONFIRM_KEY {
            self.tare(scale).await?;
            display.show("Tare Done!", "");
            outcome.tared = true;
        }

        let mut prompt: String<16> = String::new();
        if write!(prompt, "Place {:.3} KG", self.reference_kg).is_err() {
            prompt.clear();
            prompt.push_str(REFERENCE_PROMPT).ok();
        }
        display.show(&prompt, "Press # to cal.");
        if keypad.wait_for_key().await != CONFIRM_KEY {
            return Ok(outcome);
        }

        self.span(scale).await?;
        display.show("Calibrated!", "");
        match self.persist(scale, app_data) {
            Ok(calibration) => {
                display.show("Cal. Saved!", "");
                outcome.saved = Some(calibration);
                Ok(outcome)
            }
            Err(error) => {
                let reason: &'static str = error.into();
                display.show("Save Failed!", reason);
                Err(error.into())
            }
        }
    }
}

impl Default for CalibrationManager {
    fn default() -> Self {
        Self::new(DEFAULT_REFERENCE_KG)
    }
}
