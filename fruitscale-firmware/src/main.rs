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

#![no_std]
#![no_main]

use core::cell::RefCell;

use defmt::{error, info, warn};
use embassy_embedded_hal::flash::partition::BlockingPartition;
use embassy_executor::Spawner;
use embassy_rp::flash::{Blocking, ERASE_SIZE, Flash};
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::peripherals::FLASH;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_time::{Delay, Duration, Ticker, Timer};
use embedded_storage::nor_flash::RmwNorFlashStorage;
use fruitscale::application::boot::boot;
use fruitscale::storage::eeprom::NvConfig;
use fruitscale::weight::interface::Hx711Gain;
use fruitscale::weight::interface::hx711::Hx711;
use fruitscale::weight::interface::switched::SwitchableStrainGauge;
use static_cell::StaticCell;
#[allow(unused_imports)]
use {defmt_rtt as _, panic_probe as _};

const FLASH_SIZE: usize = 2 * 1024 * 1024;
/// The kiosk data lives in the last flash sector.
const NV_PARTITION_OFFSET: u32 = (FLASH_SIZE - ERASE_SIZE) as u32;
const WEIGHT_UPDATE_PERIOD: Duration = Duration::from_millis(100);

type BlockingFlash = Flash<'static, FLASH, Blocking, FLASH_SIZE>;

static FLASH_MUTEX: StaticCell<Mutex<NoopRawMutex, RefCell<BlockingFlash>>> = StaticCell::new();
static MERGE_BUFFER: StaticCell<[u8; ERASE_SIZE]> = StaticCell::new();

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    let p = embassy_rp::init(Default::default());

    let flash = Flash::<_, _, FLASH_SIZE>::new_blocking(p.FLASH);
    let flash = FLASH_MUTEX.init(Mutex::new(RefCell::new(flash)));
    let nv_partition = BlockingPartition::new(flash, NV_PARTITION_OFFSET, ERASE_SIZE as u32);
    let eeprom = RmwNorFlashStorage::new(nv_partition, MERGE_BUFFER.init([0; ERASE_SIZE]));

    let hx711 = Hx711::new(
        Output::new(p.PIN_14, Level::Low),
        Input::new(p.PIN_15, Pull::None),
        Delay,
        Hx711Gain::Gain128,
    );
    let strain_gauge = SwitchableStrainGauge::new(hx711, cfg!(feature = "simulate"));

    let mut kiosk = match boot(eeprom, NvConfig::default(), strain_gauge, Delay).await {
        Ok(kiosk) => kiosk,
        Err(e) => {
            error!("Boot failed: {:?}", e);
            loop {
                Timer::after_secs(1).await;
            }
        }
    };

    if !kiosk.calibrated {
        warn!("Scale not calibrated, weights use the default calibration");
    }

    let mut ticker = Ticker::every(WEIGHT_UPDATE_PERIOD);
    loop {
        match kiosk.weight_scale.get_weight_kg().await {
            Ok(kg) => info!("Weight: {} kg", kg),
            Err(e) => warn!("Weight reading failed: {:?}", e),
        }
        ticker.next().await;
    }
}
