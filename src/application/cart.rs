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

use crate::hmi::{CANCEL_KEY, CONFIRM_KEY, CharacterDisplay, Keypad};
use crate::storage::app_data::{AppDataError, AppDataStore};
use crate::weight::WeighingSystem;
use core::fmt::Write;
use embedded_storage::Storage;
use heapless::String;
use strum::IntoStaticStr;

/// Shown instead of a weight that does not fit on the display.
const OVER_RANGE: &str = "Over range";

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CartError {
    #[strum(serialize = "Cart is empty")]
    Empty,
    #[strum(serialize = "Payment Failed!")]
    Payment(AppDataError),
    #[strum(serialize = "Item unavailable")]
    Item(AppDataError),
}

/// Running total for one customer.
#[derive(Debug, Default)]
pub struct Cart {
    total: f64,
    items: u8,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prices `weight_kg` of item `index` and adds it to the total. Returns the line price.
    pub fn add_item<S: Storage>(
        &mut self,
        app_data: &mut AppDataStore<S>,
        index: u8,
        weight_kg: f64,
    ) -> Result<f64, CartError> {
        let price_per_kg = app_data.load_item_price(index).map_err(CartError::Item)?;
        let line_total = weight_kg * price_per_kg as f64;
        self.total += line_total;
        self.items = self.items.saturating_add(1);
        debug!(
            "Item {}: {} kg at {} = {}, cart total {}",
            index,
            weight_kg,
            price_per_kg,
            line_total,
            self.total
        );
        Ok(line_total)
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn item_count(&self) -> u8 {
        self.items
    }

    /// Books the total as income and empties the cart. The cart is kept if the booking
    /// fails so the customer can retry. Returns the new total income.
    pub fn checkout<S: Storage>(&mut self, app_data: &mut AppDataStore<S>) -> Result<f64, CartError> {
        if !(self.total > 0.0) {
            return Err(CartError::Empty);
        }
        let income = app_data
            .add_to_total_income(self.total)
            .map_err(CartError::Payment)?;
        info!("Payment of {} taken", self.total);
        self.cancel();
        Ok(income)
    }

    pub fn cancel(&mut self) {
        self.total = 0.0;
        self.items = 0;
    }
}

/// Shows the live weight until the customer confirms with `#`, which returns the last
/// reading, or cancels with `*`, which returns `None`.
pub async fn weigh_until_confirmed<W, DISP, K>(
    scale: &mut W,
    display: &mut DISP,
    keypad: &mut K,
) -> Result<Option<f64>, W::Error>
where
    W: WeighingSystem,
    DISP: CharacterDisplay,
    K: Keypad,
{
    display.show("Weight:", "");
    loop {
        let weight_kg = scale.get_weight_kg().await?;

        let mut line: String<16> = String::new();
        if write!(line, "{:.3} kg", weight_kg).is_err() {
            line.clear();
            line.push_str(OVER_RANGE).ok();
        }
        display.write_str_at(1, 0, "                ");
        display.write_str_at(1, 0, &line);

        match keypad.poll_key() {
            Some(CONFIRM_KEY) => return Ok(Some(weight_kg)),
            Some(CANCEL_KEY) => return Ok(None),
            _ => {}
        }
    }
}
