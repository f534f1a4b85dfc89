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

use crate::weight::interface::AsyncStrainGaugeInterface;
use crate::weight::{Calibration, WeighingSystem};
use embedded_hal_async::delay::DelayNs;

/// Readings averaged for tare and span.
pub const CALIBRATION_MEASUREMENTS: u8 = 10;
const SETTLE_DELAY_MS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<StrainGaugeE> {
    StrainGaugeReadingError(StrainGaugeE),
    /// Span reference must be heavier than nothing.
    InvalidReferenceWeight,
}

/// Turns raw gauge readings into kilograms.
///
/// The gauge is told about every scale or offset change, which lets a simulated
/// gauge produce counts that read back as its intended load.
pub struct WeightScale<StrainGauge, D> {
    strain_gauge: StrainGauge,
    delay: D,
    calibration: Calibration,
}

impl<StrainGauge, StrainGaugeE, D> WeightScale<StrainGauge, D>
where
    StrainGauge: AsyncStrainGaugeInterface<Error = StrainGaugeE>,
    D: DelayNs,
{
    /// Initialises the gauge. A zero or non-finite scale in `calibration` is replaced
    /// by the default.
    pub async fn new(
        mut strain_gauge: StrainGauge,
        delay: D,
        calibration: Calibration,
    ) -> Result<Self, Error<StrainGaugeE>> {
        strain_gauge.initialize().await.map_err(Error::StrainGaugeReadingError)?;
        let mut scale = Self {
            strain_gauge,
            delay,
            calibration,
        };
        if !scale.set_scale(calibration.scale) {
            scale.calibration.scale = Calibration::DEFAULT_SCALE;
            scale.calibration_changed();
        }
        debug!(
            "Weight scale ready. Scale: {}, offset: {}",
            scale.calibration.scale,
            scale.calibration.offset
        );
        Ok(scale)
    }

    pub async fn read_raw(&mut self) -> Result<i32, Error<StrainGaugeE>> {
        self.strain_gauge
            .get_next_reading()
            .await
            .map_err(Error::StrainGaugeReadingError)
    }

    /// Mean of `times` readings, one settling delay after each. Zero is taken as one.
    pub async fn read_average(&mut self, times: u8) -> Result<i32, Error<StrainGaugeE>> {
        let times = times.max(1);
        let mut sum: i64 = 0;
        for _ in 0..times {
            sum += self.read_raw().await? as i64;
            self.delay.delay_ms(SETTLE_DELAY_MS).await;
        }
        Ok((sum / times as i64) as i32)
    }

    /// Load in kilograms. Anything below the tare point reads as 0.
    pub async fn get_weight_kg(&mut self) -> Result<f64, Error<StrainGaugeE>> {
        let reading = self.read_average(1).await?;
        let tared_reading = reading as i64 - self.calibration.offset as i64;
        let kg = tared_reading as f64 / self.calibration.scale;
        trace!("Reading = {}, weight = {} kg", reading, kg);
        Ok(if kg > 0.0 { kg } else { 0.0 })
    }

    pub async fn tare(&mut self) -> Result<(), Error<StrainGaugeE>> {
        let offset = self.read_average(CALIBRATION_MEASUREMENTS).await?;
        self.set_offset(offset);
        debug!("Tare offset = {}", offset);
        Ok(())
    }

    /// Span against `reference_kg` on the platter. The offset is not touched, so
    /// tare first.
    pub async fn calibrate(&mut self, reference_kg: f64) -> Result<(), Error<StrainGaugeE>> {
        if !(reference_kg > 0.0) {
            warn!("Rejected calibration reference of {} kg", reference_kg);
            return Err(Error::InvalidReferenceWeight);
        }

        let reading = self.read_average(CALIBRATION_MEASUREMENTS).await?;
        let tared_reading = reading as i64 - self.calibration.offset as i64;
        let scale = tared_reading as f64 / reference_kg;
        if scale == 0.0 {
            warn!("Calibration produced a zero scale, keeping the default");
            self.calibration.scale = Calibration::DEFAULT_SCALE;
            self.calibration_changed();
        } else {
            self.calibration.scale = scale;
            self.calibration_changed();
        }
        debug!("Calibration counts per kg = {}", self.calibration.scale);
        Ok(())
    }

    /// Ignores zero and non-finite values. Returns whether the scale was taken.
    pub fn set_scale(&mut self, scale: f64) -> bool {
        if scale == 0.0 || !scale.is_finite() {
            warn!("Rejected scale {}", scale);
            return false;
        }
        self.calibration.scale = scale;
        self.calibration_changed();
        true
    }

    pub fn set_offset(&mut self, offset: i32) {
        self.calibration.offset = offset;
        self.calibration_changed();
    }

    pub fn set_calibration(&mut self, calibration: Calibration) {
        self.set_offset(calibration.offset);
        self.set_scale(calibration.scale);
    }

    pub fn scale(&self) -> f64 {
        self.calibration.scale
    }

    pub fn offset(&self) -> i32 {
        self.calibration.offset
    }

    pub fn calibration(&self) -> Calibration {
        self.calibration
    }

    pub async fn power_down(&mut self) -> Result<(), Error<StrainGaugeE>> {
        self.strain_gauge.power_down().await.map_err(Error::StrainGaugeReadingError)
    }

    pub async fn power_up(&mut self) -> Result<(), Error<StrainGaugeE>> {
        self.strain_gauge.power_up().await.map_err(Error::StrainGaugeReadingError)
    }

    pub fn strain_gauge(&self) -> &StrainGauge {
        &self.strain_gauge
    }

    pub fn strain_gauge_mut(&mut self) -> &mut StrainGauge {
        &mut self.strain_gauge
    }

    fn calibration_changed(&mut self) {
        self.strain_gauge.calibration_changed(&self.calibration);
    }
}

impl<StrainGauge, StrainGaugeE, D> WeighingSystem for WeightScale<StrainGauge, D>
where
    StrainGauge: AsyncStrainGaugeInterface<Error = StrainGaugeE>,
    D: DelayNs,
{
    type Error = Error<StrainGaugeE>;

    async fn tare(&mut self) -> Result<(), Self::Error> {
        WeightScale::tare(self).await
    }

    async fn calibrate(&mut self, reference_kg: f64) -> Result<(), Self::Error> {
        WeightScale::calibrate(self, reference_kg).await
    }

    async fn get_weight_kg(&mut self) -> Result<f64, Self::Error> {
        WeightScale::get_weight_kg(self).await
    }

    fn calibration(&self) -> Calibration {
        WeightScale::calibration(self)
    }
}
