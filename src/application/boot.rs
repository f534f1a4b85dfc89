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

use crate::storage::app_data::{AppDataError, AppDataStore};
use crate::storage::eeprom::{NonVolatileStore, NvConfig};
use crate::weight::calibration::CalibrationManager;
use crate::weight::interface::AsyncStrainGaugeInterface;
use crate::weight::weight::{self, WeightScale};
use embedded_hal_async::delay::DelayNs;
use embedded_storage::Storage;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BootError<StrainGaugeE> {
    AppData(AppDataError),
    Weighing(weight::Error<StrainGaugeE>),
}

/// Everything the kiosk loop needs once the board is up.
pub struct FruitScale<S, StrainGauge, D> {
    pub app_data: AppDataStore<S>,
    pub weight_scale: WeightScale<StrainGauge, D>,
    /// `false` when no calibration was stored and defaults are in use. The kiosk should
    /// run the guided calibration before selling anything.
    pub calibrated: bool,
}

/// Brings up storage, writes the factory defaults on first start, restores the stored
/// calibration and initialises the load cell with it.
pub async fn boot<S, StrainGauge, D>(
    backend: S,
    nv_config: NvConfig,
    strain_gauge: StrainGauge,
    delay: D,
) -> Result<FruitScale<S, StrainGauge, D>, BootError<StrainGauge::Error>>
where
    S: Storage,
    StrainGauge: AsyncStrainGaugeInterface,
    D: DelayNs,
{
    let mut app_data = AppDataStore::new(NonVolatileStore::new(backend, nv_config));

    match app_data.initialize() {
        Ok(true) => info!("Factory defaults written"),
        Ok(false) => {}
        Err(e) => {
            error!("Application data initialisation failed: {:?}", e);
            return Err(BootError::AppData(e));
        }
    }

    let calibrated = app_data.is_calibrated();
    let calibration = CalibrationManager::restore(&mut app_data);

    let weight_scale = WeightScale::new(strain_gauge, delay, calibration)
        .await
        .map_err(|e| {
            error!("Load cell initialisation failed");
            BootError::Weighing(e)
        })?;

    info!("Boot complete. Calibrated: {}", calibrated);
    Ok(FruitScale {
        app_data,
        weight_scale,
        calibrated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::ram::RamEeprom;
    use crate::test_support::{FlakyStorage, NoopDelay, ScriptedStrainGauge, init_logging};
    use crate::weight::Calibration;
    use crate::weight::interface::simulated::SimulatedStrainGauge;
    use embassy_futures::block_on;

    #[test]
    fn first_boot_writes_defaults_and_runs_uncalibrated() {
        init_logging();
        let mut kiosk = block_on(boot(
            RamEeprom::new(),
            NvConfig::default(),
            ScriptedStrainGauge::constant(0),
            NoopDelay,
        ))
        .unwrap();

        assert!(!kiosk.calibrated);
        assert!(!kiosk.app_data.is_first_time());
        assert_eq!(kiosk.app_data.load_item_price(1), Ok(10.0));
        assert_eq!(kiosk.weight_scale.calibration(), Calibration::default());
        assert!(kiosk.weight_scale.strain_gauge().initialized);
    }

    #[test]
    fn later_boot_restores_calibration() {
        let calibration = Calibration {
            scale: 21_000.0,
            offset: 84_000,
        };
        let mut first = block_on(boot(
            RamEeprom::new(),
            NvConfig::default(),
            ScriptedStrainGauge::constant(0),
            NoopDelay,
        ))
        .unwrap();
        first.app_data.save_item_price(4, 55.5).unwrap();
        first.app_data.save_calibration(&calibration).unwrap();
        let image = first.app_data.release().release();

        let mut kiosk = block_on(boot(
            image,
            NvConfig::default(),
            SimulatedStrainGauge::default(),
            NoopDelay,
        ))
        .unwrap();
        assert!(kiosk.calibrated);
        assert_eq!(kiosk.weight_scale.calibration(), calibration);
        assert_eq!(kiosk.app_data.load_item_price(4), Ok(55.5));

        let kg = block_on(kiosk.weight_scale.get_weight_kg()).unwrap();
        assert!((kg - 0.995).abs() < 1e-4);
    }

    #[test]
    fn storage_failure_stops_boot() {
        let result = block_on(boot(
            FlakyStorage::failing_after(3),
            NvConfig::default(),
            ScriptedStrainGauge::constant(0),
            NoopDelay,
        ));
        assert!(matches!(result, Err(BootError::AppData(AppDataError::Storage))));
    }

    #[test]
    fn gauge_failure_stops_boot() {
        let result = block_on(boot(
            RamEeprom::new(),
            NvConfig::default(),
            ScriptedStrainGauge::failing_init(),
            NoopDelay,
        ));
        assert!(matches!(result, Err(BootError::Weighing(_))));
    }
}
