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

use embedded_storage::Storage;

/// Number of addressable bytes, the size of the AVR on-chip EEPROM the layout was made for.
pub const EEPROM_SIZE: usize = 1024;

/// Value of an erased cell, also returned by [`NonVolatileStore::read_byte_or_erased`]
/// when the address is out of range.
pub const ERASED_BYTE: u8 = 0xFF;

const STRING_TERMINATOR: u8 = 0x00;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NvError {
    /// The requested span is not inside the store. Also used for an unsupported
    /// integer width or an empty output buffer.
    AddressOutOfRange,
    /// The backing device refused the access.
    Device,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NvMode {
    #[default]
    Polling,
    /// Accepted for completeness. Accesses still complete synchronously.
    Interrupt,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProgrammingMode {
    #[default]
    EraseAndWrite,
    EraseOnly,
    WriteOnly,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NvConfig {
    pub mode: NvMode,
    pub programming_mode: ProgrammingMode,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NvStatus {
    Ready,
    Busy,
}

/// Byte addressable persistent store with typed helpers.
///
/// Every access validates the whole span `[address, address + len)` before the first
/// byte is touched. Multi-byte writes are then performed one byte at a time in
/// ascending address order, so a device fault part way through leaves the earlier
/// bytes written and the later ones untouched.
///
/// Each failing call both returns its error and records it in a per-store last
/// error slot.
pub struct NonVolatileStore<S> {
    storage: S,
    config: NvConfig,
    last_error: Option<NvError>,
}

impl<S> NonVolatileStore<S>
where
    S: Storage,
{
    pub fn new(storage: S, config: NvConfig) -> Self {
        if config.mode == NvMode::Interrupt {
            warn!("Interrupt driven EEPROM mode requested, accesses will complete synchronously");
        }
        let store = Self {
            storage,
            config,
            last_error: None,
        };
        debug!(
            "EEPROM initialised. Capacity: {} bytes, programming mode: {:?}",
            store.capacity(),
            config.programming_mode
        );
        store
    }

    pub fn config(&self) -> NvConfig {
        self.config
    }

    /// Usable bytes. Never more than [`EEPROM_SIZE`] even if the backing device is larger.
    pub fn capacity(&self) -> usize {
        core::cmp::min(EEPROM_SIZE, self.storage.capacity())
    }

    pub fn is_ready(&self) -> bool {
        true
    }

    pub fn status(&self) -> NvStatus {
        if self.is_ready() {
            NvStatus::Ready
        } else {
            NvStatus::Busy
        }
    }

    pub fn last_error(&self) -> Option<NvError> {
        self.last_error
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Gives back the backing device.
    pub fn release(self) -> S {
        self.storage
    }

    pub fn write_byte(&mut self, address: u16, value: u8) -> Result<(), NvError> {
        self.check_span(address, 1)?;
        self.program(address, value)
    }

    pub fn read_byte(&mut self, address: u16) -> Result<u8, NvError> {
        self.check_span(address, 1)?;
        self.fetch(address)
    }

    /// Total form of [`Self::read_byte`]: yields [`ERASED_BYTE`] on failure and leaves
    /// the reason in [`Self::last_error`].
    pub fn read_byte_or_erased(&mut self, address: u16) -> u8 {
        self.read_byte(address).unwrap_or(ERASED_BYTE)
    }

    pub fn write_block(&mut self, address: u16, data: &[u8]) -> Result<(), NvError> {
        self.check_span(address, data.len())?;
        for (address, value) in (address..).zip(data.iter()) {
            self.program(address, *value)?;
        }
        Ok(())
    }

    pub fn read_block(&mut self, address: u16, data: &mut [u8]) -> Result<(), NvError> {
        self.check_span(address, data.len())?;
        for (address, value) in (address..).zip(data.iter_mut()) {
            *value = self.fetch(address)?;
        }
        Ok(())
    }

    /// Writes the bytes of `text` followed by a terminator.
    pub fn write_string(&mut self, address: u16, text: &str) -> Result<(), NvError> {
        let bytes = text.as_bytes();
        self.check_span(address, bytes.len() + 1)?;
        self.write_block(address, bytes)?;
        self.program(address + bytes.len() as u16, STRING_TERMINATOR)
    }

    /// Reads a terminated string into `out`, stopping at the terminator or after
    /// `out.len() - 1` bytes. `out` is always terminated. Returns the string length.
    pub fn read_string(&mut self, address: u16, out: &mut [u8]) -> Result<usize, NvError> {
        if out.is_empty() {
            return self.fail(NvError::AddressOutOfRange);
        }
        self.check_span(address, 1)?;

        let mut length = 0;
        while length < out.len() - 1 {
            let current = self.read_byte(address.wrapping_add(length as u16))?;
            if current == STRING_TERMINATOR {
                break;
            }
            out[length] = current;
            length += 1;
        }
        out[length] = STRING_TERMINATOR;
        Ok(length)
    }

    /// Little endian integer of `size` bytes, which must be 2 or 4.
    pub fn write_integer(&mut self, address: u16, value: u32, size: u8) -> Result<(), NvError> {
        let size = self.check_integer_size(size)?;
        self.write_block(address, &value.to_le_bytes()[..size])
    }

    pub fn read_integer(&mut self, address: u16, size: u8) -> Result<u32, NvError> {
        let size = self.check_integer_size(size)?;
        let mut bytes = [0u8; 4];
        self.read_block(address, &mut bytes[..size])?;
        Ok(u32::from_le_bytes(bytes))
    }

    pub fn write_f32(&mut self, address: u16, value: f32) -> Result<(), NvError> {
        self.write_block(address, &value.to_bits().to_le_bytes())
    }

    pub fn read_f32(&mut self, address: u16) -> Result<f32, NvError> {
        let mut bytes = [0u8; 4];
        self.read_block(address, &mut bytes)?;
        Ok(f32::from_bits(u32::from_le_bytes(bytes)))
    }

    pub fn write_f64(&mut self, address: u16, value: f64) -> Result<(), NvError> {
        self.write_block(address, &value.to_bits().to_le_bytes())
    }

    pub fn read_f64(&mut self, address: u16) -> Result<f64, NvError> {
        let mut bytes = [0u8; 8];
        self.read_block(address, &mut bytes)?;
        Ok(f64::from_bits(u64::from_le_bytes(bytes)))
    }

    /// Factory reset: every cell back to [`ERASED_BYTE`].
    pub fn erase(&mut self) -> Result<(), NvError> {
        warn!("Erasing {} bytes of EEPROM", self.capacity());
        for address in 0..self.capacity() as u16 {
            self.program(address, ERASED_BYTE)?;
        }
        Ok(())
    }

    fn check_span(&mut self, address: u16, length: usize) -> Result<(), NvError> {
        let end = address as usize + core::cmp::max(length, 1);
        if end > self.capacity() {
            warn!(
                "EEPROM access of {} bytes at 0x{:x} is out of range",
                length,
                address
            );
            return self.fail(NvError::AddressOutOfRange);
        }
        Ok(())
    }

    fn check_integer_size(&mut self, size: u8) -> Result<usize, NvError> {
        match size {
            2 | 4 => Ok(size as usize),
            _ => {
                warn!("Unsupported EEPROM integer width: {}", size);
                self.fail(NvError::AddressOutOfRange)
            }
        }
    }

    fn program(&mut self, address: u16, value: u8) -> Result<(), NvError> {
        match self.storage.write(address as u32, &[value]) {
            Ok(()) => Ok(()),
            Err(_) => {
                warn!("EEPROM device failed writing 0x{:x}", address);
                self.fail(NvError::Device)
            }
        }
    }

    fn fetch(&mut self, address: u16) -> Result<u8, NvError> {
        let mut value = [ERASED_BYTE];
        match self.storage.read(address as u32, &mut value) {
            Ok(()) => Ok(value[0]),
            Err(_) => {
                warn!("EEPROM device failed reading 0x{:x}", address);
                self.fail(NvError::Device)
            }
        }
    }

    fn fail<T>(&mut self, error: NvError) -> Result<T, NvError> {
        self.last_error = Some(error);
        Err(error)
    }
}
