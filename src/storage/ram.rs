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

use embedded_storage::{ReadStorage, Storage};

use super::eeprom::{EEPROM_SIZE, ERASED_BYTE};

/// Out of range access on a [`RamEeprom`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RamEepromError;

/// EEPROM image held in RAM. Starts fully erased.
///
/// Used on the host and as a stand-in when no persistent device is fitted.
#[derive(Clone)]
pub struct RamEeprom {
    cells: [u8; EEPROM_SIZE],
}

impl RamEeprom {
    pub fn new() -> Self {
        Self {
            cells: [ERASED_BYTE; EEPROM_SIZE],
        }
    }

    pub fn from_image(cells: [u8; EEPROM_SIZE]) -> Self {
        Self { cells }
    }

    pub fn image(&self) -> &[u8; EEPROM_SIZE] {
        &self.cells
    }

    fn span(&self, offset: u32, length: usize) -> Result<core::ops::Range<usize>, RamEepromError> {
        let start = offset as usize;
        let end = start.checked_add(length).ok_or(RamEepromError)?;
        if end > self.cells.len() {
            return Err(RamEepromError);
        }
        Ok(start..end)
    }
}

impl Default for RamEeprom {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadStorage for RamEeprom {
    type Error = RamEepromError;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        let span = self.span(offset, bytes.len())?;
        bytes.copy_from_slice(&self.cells[span]);
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.cells.len()
    }
}

impl Storage for RamEeprom {
    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        let span = self.span(offset, bytes.len())?;
        self.cells[span].copy_from_slice(bytes);
        Ok(())
    }
}
