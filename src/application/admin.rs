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

use crate::storage::app_data::layout::MAX_PRICE;
use crate::storage::app_data::{AppDataError, AppDataStore};
use embedded_storage::Storage;
use strum::IntoStaticStr;

pub const MAX_LOGIN_ATTEMPTS: u8 = 3;
pub const MIN_PASSWORD_LENGTH: usize = 4;
pub const MAX_PASSWORD_LENGTH: usize = 6;
pub const PRICE_DECIMAL_PLACES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdminError {
    #[strum(serialize = "Wrong Password!")]
    WrongPassword,
    #[strum(serialize = "Invalid Format!")]
    InvalidPasswordFormat,
    #[strum(serialize = "Not Matching!")]
    PasswordMismatch,
    #[strum(serialize = "Invalid Price!")]
    InvalidPrice,
    #[strum(serialize = "Update Failed!")]
    Data(AppDataError),
}

impl From<AppDataError> for AdminError {
    fn from(error: AppDataError) -> Self {
        AdminError::Data(error)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LoginOutcome {
    Granted,
    Denied { remaining: u8 },
    /// No attempts left. Stays locked until a new login session is started.
    LockedOut,
}

/// One admin login session with a limited number of password attempts.
pub struct AdminLogin {
    remaining: u8,
}

impl AdminLogin {
    pub fn new() -> Self {
        Self {
            remaining: MAX_LOGIN_ATTEMPTS,
        }
    }

    pub fn remaining(&self) -> u8 {
        self.remaining
    }

    pub fn attempt<S: Storage>(&mut self, app_data: &mut AppDataStore<S>, password: &str) -> LoginOutcome {
        if self.remaining == 0 {
            return LoginOutcome::LockedOut;
        }
        if app_data.verify_password(password) {
            info!("Admin access granted");
            return LoginOutcome::Granted;
        }

        self.remaining -= 1;
        warn!("Wrong admin password, {} attempts left", self.remaining);
        match self.remaining {
            0 => LoginOutcome::LockedOut,
            remaining => LoginOutcome::Denied { remaining },
        }
    }
}

impl Default for AdminLogin {
    fn default() -> Self {
        Self::new()
    }
}

/// New passwords are 4 to 6 digits.
pub fn is_valid_password(password: &str) -> bool {
    (MIN_PASSWORD_LENGTH..=MAX_PASSWORD_LENGTH).contains(&password.len())
        && password.bytes().all(|b| b.is_ascii_digit())
}

pub fn change_password<S: Storage>(
    app_data: &mut AppDataStore<S>,
    current: &str,
    new: &str,
    confirmation: &str,
) -> Result<(), AdminError> {
    if !app_data.verify_password(current) {
        return Err(AdminError::WrongPassword);
    }
    if !is_valid_password(new) {
        return Err(AdminError::InvalidPasswordFormat);
    }
    if new != confirmation {
        return Err(AdminError::PasswordMismatch);
    }
    app_data.save_password(new)?;
    info!("Admin password changed");
    Ok(())
}

/// Parses a keypad price entry: digits with at most one decimal point, which may not
/// lead, and at most three decimals.
pub fn parse_price(entry: &str) -> Result<f32, AdminError> {
    let (whole, decimals) = match entry.split_once('.') {
        Some((whole, decimals)) => (whole, decimals),
        None => (entry, ""),
    };
    let digits_only = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    if whole.is_empty()
        || !digits_only(whole)
        || !digits_only(decimals)
        || decimals.len() > PRICE_DECIMAL_PLACES
    {
        return Err(AdminError::InvalidPrice);
    }

    let price: f32 = entry.parse().map_err(|_| AdminError::InvalidPrice)?;
    if !(0.0..=MAX_PRICE).contains(&(price as f64)) {
        return Err(AdminError::InvalidPrice);
    }
    Ok(price)
}

/// Validates and stores a new price per kilogram. Returns the stored price.
pub fn update_item_price<S: Storage>(
    app_data: &mut AppDataStore<S>,
    index: u8,
    entry: &str,
) -> Result<f32, AdminError> {
    let price = parse_price(entry)?;
    app_data.save_item_price(index, price)?;
    info!("Price of item {} set to {}", index, price);
    Ok(price)
}

pub fn reset_income<S: Storage>(app_data: &mut AppDataStore<S>) -> Result<(), AdminError> {
    app_data.save_total_income(0.0)?;
    info!("Total income reset");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::eeprom::{NonVolatileStore, NvConfig};
    use crate::storage::ram::RamEeprom;

    fn app_data() -> AppDataStore<RamEeprom> {
        let mut store =
            AppDataStore::new(NonVolatileStore::new(RamEeprom::new(), NvConfig::default()));
        store.initialize().unwrap();
        store
    }

    #[test]
    fn three_wrong_attempts_lock_the_session() {
        let mut store = app_data();
        let mut login = AdminLogin::new();
        assert_eq!(login.attempt(&mut store, "1111"), LoginOutcome::Denied { remaining: 2 });
        assert_eq!(login.attempt(&mut store, "2222"), LoginOutcome::Denied { remaining: 1 });
        assert_eq!(login.attempt(&mut store, "3333"), LoginOutcome::LockedOut);
        assert_eq!(login.attempt(&mut store, "0000"), LoginOutcome::LockedOut);
        assert_eq!(login.remaining(), 0);
    }

    #[test]
    fn correct_password_is_granted_after_a_miss() {
        let mut store = app_data();
        let mut login = AdminLogin::new();
        assert_eq!(login.attempt(&mut store, "1234"), LoginOutcome::Denied { remaining: 2 });
        assert_eq!(login.attempt(&mut store, "0000"), LoginOutcome::Granted);
    }

    #[test]
    fn password_policy() {
        assert!(is_valid_password("1234"));
        assert!(is_valid_password("123456"));
        assert!(!is_valid_password("123"));
        assert!(!is_valid_password("1234567"));
        assert!(!is_valid_password("12a4"));
        assert!(!is_valid_password(""));
    }

    #[test]
    fn change_password_checks_every_field() {
        let mut store = app_data();
        assert_eq!(
            change_password(&mut store, "9999", "1234", "1234"),
            Err(AdminError::WrongPassword)
        );
        assert_eq!(
            change_password(&mut store, "0000", "12", "12"),
            Err(AdminError::InvalidPasswordFormat)
        );
        assert_eq!(
            change_password(&mut store, "0000", "1234", "1235"),
            Err(AdminError::PasswordMismatch)
        );
        assert!(store.verify_password("0000"));

        assert_eq!(change_password(&mut store, "0000", "4321", "4321"), Ok(()));
        assert!(store.verify_password("4321"));
        assert!(!store.verify_password("0000"));
    }

    #[test]
    fn price_entries() {
        assert_eq!(parse_price("12"), Ok(12.0));
        assert_eq!(parse_price("12.5"), Ok(12.5));
        assert_eq!(parse_price("0.125"), Ok(0.125));
        assert_eq!(parse_price("7."), Ok(7.0));
        assert_eq!(parse_price("0"), Ok(0.0));
        assert_eq!(parse_price("999999.9"), Ok(999_999.9));

        for bad in ["", ".5", "1.2345", "1.2.3", "12a", "-1", "1000000", "999999.99", "1e3"] {
            assert_eq!(parse_price(bad), Err(AdminError::InvalidPrice), "{bad}");
        }
    }

    #[test]
    fn price_update_is_stored() {
        let mut store = app_data();
        assert_eq!(update_item_price(&mut store, 2, "22.75"), Ok(22.75));
        assert_eq!(store.load_item_price(2), Ok(22.75));

        assert_eq!(
            update_item_price(&mut store, 9, "1"),
            Err(AdminError::Data(AppDataError::InvalidIndex))
        );
        assert_eq!(update_item_price(&mut store, 2, "abc"), Err(AdminError::InvalidPrice));
        assert_eq!(store.load_item_price(2), Ok(22.75));
    }

    #[test]
    fn income_reset() {
        let mut store = app_data();
        store.add_to_total_income(123.0).unwrap();
        reset_income(&mut store).unwrap();
        assert_eq!(store.load_total_income(), Ok(0.0));
    }

    #[test]
    fn error_messages() {
        let message: &'static str = AdminError::Data(AppDataError::Storage).into();
        assert_eq!(message, "Update Failed!");
        let message: &'static str = AdminError::PasswordMismatch.into();
        assert_eq!(message, "Not Matching!");
    }
}
