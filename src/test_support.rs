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

//! Host side fakes shared by the unit tests.

use crate::hmi::{CharacterDisplay, Keypad};
use crate::storage::eeprom::{EEPROM_SIZE, ERASED_BYTE};
use crate::weight::Calibration;
use crate::weight::interface::AsyncStrainGaugeInterface;
use core::cell::RefCell;
use core::convert::Infallible;
use std::collections::VecDeque;
use std::rc::Rc;
use std::string::String;
use std::vec::Vec;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Delay that returns immediately.
pub struct NoopDelay;

impl embedded_hal::delay::DelayNs for NoopDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

impl embedded_hal_async::delay::DelayNs for NoopDelay {
    async fn delay_ns(&mut self, _ns: u32) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptError {
    Exhausted,
    Init,
}

/// Gauge that replays a list of readings.
pub struct ScriptedStrainGauge {
    readings: VecDeque<i32>,
    repeat: Option<i32>,
    fail_init: bool,
    pub initialized: bool,
    pub powered_down: bool,
    pub reads: usize,
    pub last_calibration: Option<Calibration>,
}

impl ScriptedStrainGauge {
    pub fn new(readings: &[i32]) -> Self {
        Self {
            readings: readings.iter().copied().collect(),
            repeat: None,
            fail_init: false,
            initialized: false,
            powered_down: false,
            reads: 0,
            last_calibration: None,
        }
    }

    pub fn constant(reading: i32) -> Self {
        Self {
            repeat: Some(reading),
            ..Self::new(&[])
        }
    }

    pub fn failing_init() -> Self {
        Self {
            fail_init: true,
            ..Self::new(&[])
        }
    }
}

impl AsyncStrainGaugeInterface for ScriptedStrainGauge {
    type Error = ScriptError;

    async fn initialize(&mut self) -> Result<(), Self::Error> {
        if self.fail_init {
            return Err(ScriptError::Init);
        }
        self.initialized = true;
        Ok(())
    }

    async fn get_next_reading(&mut self) -> Result<i32, Self::Error> {
        let reading = self
            .readings
            .pop_front()
            .or(self.repeat)
            .ok_or(ScriptError::Exhausted)?;
        self.reads += 1;
        Ok(reading)
    }

    async fn power_down(&mut self) -> Result<(), Self::Error> {
        self.powered_down = true;
        Ok(())
    }

    async fn power_up(&mut self) -> Result<(), Self::Error> {
        self.powered_down = false;
        Ok(())
    }

    fn get_adc_bit_count(&self) -> usize {
        24
    }

    fn calibration_changed(&mut self, calibration: &Calibration) {
        self.last_calibration = Some(*calibration);
    }
}

#[derive(Default)]
struct ChipState {
    samples: VecDeque<i32>,
    busy_polls: usize,
    ready_seen: bool,
    clock_high: bool,
    shifting: Option<u32>,
    edges: usize,
    gain_pulses: Vec<usize>,
}

impl ChipState {
    fn rising_edge(&mut self) {
        if self.shifting.is_some() {
            self.edges += 1;
        } else if self.ready_seen {
            if let Some(sample) = self.samples.pop_front() {
                self.shifting = Some(sample as u32 & 0x00FF_FFFF);
                self.edges = 1;
                self.ready_seen = false;
            }
        }
    }

    fn finish_conversion(&mut self) {
        if self.shifting.take().is_some() {
            self.gain_pulses.push(self.edges.saturating_sub(24));
            self.edges = 0;
        }
    }

    fn data_high(&mut self) -> bool {
        if let Some(word) = self.shifting {
            if (1..=24).contains(&self.edges) {
                return (word >> (24 - self.edges)) & 0x1 == 0x1;
            }
            if self.clock_high {
                // gain pulses, DOUT stays high
                return true;
            }
            self.finish_conversion();
        }
        if self.busy_polls > 0 {
            self.busy_polls -= 1;
            return true;
        }
        if self.samples.is_empty() {
            return true;
        }
        self.ready_seen = true;
        false
    }
}

/// HX711 chip model behind a pair of `embedded-hal` pins.
///
/// DOUT goes low when a sample is queued. The next rising clock edge starts shifting it
/// out MSB first. Rising edges after the 24th are counted as gain selection pulses.
pub struct FakeHx711 {
    state: Rc<RefCell<ChipState>>,
}

pub struct FakeClockPin {
    state: Rc<RefCell<ChipState>>,
}

pub struct FakeDataPin {
    state: Rc<RefCell<ChipState>>,
}

impl FakeHx711 {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(ChipState::default())),
        }
    }

    pub fn clock_pin(&self) -> FakeClockPin {
        FakeClockPin {
            state: self.state.clone(),
        }
    }

    pub fn data_pin(&self) -> FakeDataPin {
        FakeDataPin {
            state: self.state.clone(),
        }
    }

    pub fn queue_samples(&self, samples: &[i32]) {
        self.state.borrow_mut().samples.extend(samples.iter().copied());
    }

    /// DOUT stays high for this many polls before the next sample is offered.
    pub fn stay_busy_for(&self, polls: usize) {
        self.state.borrow_mut().busy_polls = polls;
    }

    pub fn clock_is_high(&self) -> bool {
        self.state.borrow().clock_high
    }

    /// Gain pulses seen after each completed reading.
    pub fn gain_pulses(&self) -> Vec<usize> {
        let mut state = self.state.borrow_mut();
        state.finish_conversion();
        state.gain_pulses.clone()
    }
}

impl embedded_hal::digital::ErrorType for FakeClockPin {
    type Error = Infallible;
}

impl embedded_hal::digital::OutputPin for FakeClockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.state.borrow_mut().clock_high = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        let mut state = self.state.borrow_mut();
        if !state.clock_high {
            state.clock_high = true;
            state.rising_edge();
        }
        Ok(())
    }
}

impl embedded_hal::digital::ErrorType for FakeDataPin {
    type Error = Infallible;
}

impl embedded_hal::digital::InputPin for FakeDataPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.state.borrow_mut().data_high())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.state.borrow_mut().data_high())
    }
}

/// Keypad that replays scripted presses. `wait_for_key` and `poll_key` have separate
/// scripts.
pub struct ScriptedKeypad {
    presses: VecDeque<char>,
    polls: VecDeque<Option<char>>,
}

impl ScriptedKeypad {
    pub fn new(presses: &str) -> Self {
        Self {
            presses: presses.chars().collect(),
            polls: VecDeque::new(),
        }
    }

    pub fn polled(polls: &[Option<char>]) -> Self {
        Self {
            presses: VecDeque::new(),
            polls: polls.iter().copied().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.presses.len()
    }
}

impl Keypad for ScriptedKeypad {
    async fn wait_for_key(&mut self) -> char {
        self.presses.pop_front().expect("keypad script exhausted")
    }

    fn poll_key(&mut self) -> Option<char> {
        self.polls.pop_front().flatten()
    }
}

/// 16x2 display that keeps its contents and every string written to it.
pub struct RecordingDisplay {
    rows: [[char; 16]; 2],
    cursor: (u8, u8),
    written: Vec<String>,
}

impl Default for RecordingDisplay {
    fn default() -> Self {
        Self {
            rows: [[' '; 16]; 2],
            cursor: (0, 0),
            written: Vec::new(),
        }
    }
}

impl RecordingDisplay {
    pub fn row(&self, row: usize) -> String {
        let text: String = self.rows[row].iter().collect();
        text.trim_end().into()
    }

    pub fn has_shown(&self, text: &str) -> bool {
        self.written.iter().any(|written| written == text)
    }
}

impl CharacterDisplay for RecordingDisplay {
    fn clear(&mut self) {
        self.rows = [[' '; 16]; 2];
        self.cursor = (0, 0);
    }

    fn set_cursor(&mut self, row: u8, column: u8) {
        self.cursor = (row, column);
    }

    fn write_char(&mut self, character: char) {
        let (row, column) = self.cursor;
        if (row as usize) < self.rows.len() && (column as usize) < 16 {
            self.rows[row as usize][column as usize] = character;
        }
        self.cursor = (row, column.saturating_add(1));
    }

    fn write_str_at(&mut self, row: u8, column: u8, text: &str) {
        self.written.push(text.into());
        self.set_cursor(row, column);
        for character in text.chars().take(16usize.saturating_sub(column as usize)) {
            self.write_char(character);
        }
    }
}

/// Storage backend that can be told to fail, for fault injection.
pub struct FlakyStorage {
    cells: Vec<u8>,
    writes_left: Option<usize>,
    reads_fail: bool,
}

#[derive(Debug)]
pub struct InjectedFault;

impl FlakyStorage {
    /// 1 KiB backend that accepts `writes` single byte writes and then fails.
    pub fn failing_after(writes: usize) -> Self {
        Self {
            writes_left: Some(writes),
            ..Self::with_capacity(EEPROM_SIZE)
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cells: vec![ERASED_BYTE; capacity],
            writes_left: None,
            reads_fail: false,
        }
    }

    pub fn fail_reads(&mut self) {
        self.reads_fail = true;
    }

    pub fn heal(&mut self) {
        self.writes_left = None;
        self.reads_fail = false;
    }

    pub fn byte(&self, address: usize) -> u8 {
        self.cells[address]
    }
}

impl embedded_storage::ReadStorage for FlakyStorage {
    type Error = InjectedFault;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        if self.reads_fail {
            return Err(InjectedFault);
        }
        let start = offset as usize;
        let end = start + bytes.len();
        bytes.copy_from_slice(self.cells.get(start..end).ok_or(InjectedFault)?);
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.cells.len()
    }
}

impl embedded_storage::Storage for FlakyStorage {
    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        if let Some(writes_left) = self.writes_left.as_mut() {
            if *writes_left == 0 {
                return Err(InjectedFault);
            }
            *writes_left -= 1;
        }
        let start = offset as usize;
        let end = start + bytes.len();
        self.cells
            .get_mut(start..end)
            .ok_or(InjectedFault)?
            .copy_from_slice(bytes);
        Ok(())
    }
}
