//! Recording mocks for the collaborator traits.
//!
//! All mocks built from the same [`EventLog`] append to it, so a test can
//! assert the exact interleaving of pin, supply, delay and bus activity.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, OutputPin};
use embedded_hal_async::delay::DelayNs;

use crate::descriptor::{DsiConfig, VideoMode};
use crate::interface::{DsiHost, McuBridge};
use crate::nvmem::{NvmemStore, OutOfRange, SliceStore};
use crate::of::PropertySource;
use crate::power::{Backlight, Regulator};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line {
    Enable,
    Reset,
    SpiSdi,
    SpiScl,
    SpiCs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Supply {
    Vsp,
    Vsn,
    Power,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    DelayNs(u32),
    DelayUs(u32),
    DelayMs(u32),
    Pin(Line, bool),
    Supply(Supply, bool),
    DsiAttach(DsiConfig),
    DsiDetach,
    DsiGeneric(Vec<u8>),
    DsiDcs(Vec<u8>),
    Mcu(u8, u32),
    Backlight(bool),
}

#[derive(Debug, Clone, Default)]
pub struct EventLog(Rc<RefCell<Vec<Event>>>);

impl EventLog {
    pub fn push(&self, event: Event) {
        self.0.borrow_mut().push(event);
    }

    /// Returns and clears the recorded events.
    pub fn take(&self) -> Vec<Event> {
        self.0.take()
    }
}

pub struct MockDelay {
    log: EventLog,
}

impl MockDelay {
    pub fn new(log: &EventLog) -> Self {
        Self { log: log.clone() }
    }
}

impl DelayNs for MockDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.log.push(Event::DelayNs(ns));
    }

    async fn delay_us(&mut self, us: u32) {
        self.log.push(Event::DelayUs(us));
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.log.push(Event::DelayMs(ms));
    }
}

pub struct MockPin {
    log: EventLog,
    line: Line,
}

impl MockPin {
    pub fn new(log: &EventLog, line: Line) -> Self {
        Self {
            log: log.clone(),
            line,
        }
    }
}

impl ErrorType for MockPin {
    type Error = Infallible;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.log.push(Event::Pin(self.line, false));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.log.push(Event::Pin(self.line, true));
        Ok(())
    }
}

/// DSI host whose writes can be made to fail by call index.
pub struct MockDsiHost {
    log: EventLog,
    writes: usize,
    failing: Vec<usize>,
    fail_link: bool,
}

impl MockDsiHost {
    pub fn new(log: &EventLog) -> Self {
        Self {
            log: log.clone(),
            writes: 0,
            failing: Vec::new(),
            fail_link: false,
        }
    }

    /// Makes attach and detach fail.
    pub fn fail_link(&mut self) {
        self.fail_link = true;
    }

    /// Makes the `index`th write fail without reaching the bus.
    pub fn fail_on(&mut self, index: usize) {
        self.failing.push(index);
    }

    fn write(&mut self, event: Event) -> Result<(), ()> {
        let index = self.writes;
        self.writes += 1;
        if self.failing.contains(&index) {
            return Err(());
        }
        self.log.push(event);
        Ok(())
    }
}

impl DsiHost for MockDsiHost {
    type Error = ();

    fn attach(&mut self, config: &DsiConfig) -> Result<(), Self::Error> {
        if self.fail_link {
            return Err(());
        }
        self.log.push(Event::DsiAttach(*config));
        Ok(())
    }

    fn detach(&mut self) -> Result<(), Self::Error> {
        if self.fail_link {
            return Err(());
        }
        self.log.push(Event::DsiDetach);
        Ok(())
    }

    async fn generic_write(&mut self, payload: &[u8]) -> Result<(), Self::Error> {
        self.write(Event::DsiGeneric(payload.to_vec()))
    }

    async fn dcs_write_buffer(&mut self, payload: &[u8]) -> Result<(), Self::Error> {
        self.write(Event::DsiDcs(payload.to_vec()))
    }
}

pub struct MockMcu {
    log: EventLog,
}

impl MockMcu {
    pub fn new(log: &EventLog) -> Self {
        Self { log: log.clone() }
    }
}

impl McuBridge for MockMcu {
    fn send_mcu_command(&mut self, op: u8, value: u32) {
        self.log.push(Event::Mcu(op, value));
    }
}

pub struct MockRegulator {
    log: EventLog,
    supply: Supply,
    enabled: bool,
    fail_enable: bool,
}

impl MockRegulator {
    pub fn new(log: &EventLog, supply: Supply) -> Self {
        Self {
            log: log.clone(),
            supply,
            enabled: false,
            fail_enable: false,
        }
    }

    /// Sets the output state without recording an event.
    pub fn force_state(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Makes every enable attempt fail.
    pub fn fail_enable(&mut self) {
        self.fail_enable = true;
    }
}

impl Regulator for MockRegulator {
    type Error = ();

    fn enable(&mut self) -> Result<(), Self::Error> {
        if self.fail_enable {
            return Err(());
        }
        self.enabled = true;
        self.log.push(Event::Supply(self.supply, true));
        Ok(())
    }

    fn disable(&mut self) -> Result<(), Self::Error> {
        self.enabled = false;
        self.log.push(Event::Supply(self.supply, false));
        Ok(())
    }

    fn is_enabled(&mut self) -> bool {
        self.enabled
    }
}

pub struct MockBacklight {
    log: EventLog,
}

impl MockBacklight {
    pub fn new(log: &EventLog) -> Self {
        Self { log: log.clone() }
    }
}

impl Backlight for MockBacklight {
    fn set_power(&mut self, on: bool) {
        self.log.push(Event::Backlight(on));
    }
}

/// EEPROM image that counts the reads issued against it.
pub struct MockEeprom {
    image: Vec<u8>,
    reads: usize,
}

impl MockEeprom {
    pub fn new(image: Vec<u8>) -> Self {
        Self { image, reads: 0 }
    }

    pub fn reads(&self) -> usize {
        self.reads
    }
}

impl NvmemStore for MockEeprom {
    type Error = OutOfRange;

    fn read(&mut self, offset: u32, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.reads += 1;
        SliceStore::new(&self.image).read(offset, buf)
    }
}

#[derive(Debug, Clone)]
enum Value {
    U32(u32),
    Bytes(Vec<u8>),
    Str(String),
}

/// In-memory device node.
#[derive(Debug, Clone, Default)]
pub struct Properties {
    values: BTreeMap<&'static str, Value>,
    mode: Option<VideoMode>,
}

impl Properties {
    pub fn u32(mut self, name: &'static str, value: u32) -> Self {
        self.values.insert(name, Value::U32(value));
        self
    }

    pub fn bytes(mut self, name: &'static str, value: &[u8]) -> Self {
        self.values.insert(name, Value::Bytes(value.to_vec()));
        self
    }

    pub fn string(mut self, name: &'static str, value: &str) -> Self {
        self.values.insert(name, Value::Str(value.into()));
        self
    }

    /// Adds a boolean (empty) property.
    pub fn flag(self, name: &'static str) -> Self {
        self.bytes(name, &[])
    }

    pub fn mode(mut self, mode: VideoMode) -> Self {
        self.mode = Some(mode);
        self
    }
}

impl PropertySource for Properties {
    fn read_u32(&self, name: &str) -> Option<u32> {
        match self.values.get(name)? {
            Value::U32(v) => Some(*v),
            _ => None,
        }
    }

    fn read_bytes(&self, name: &str) -> Option<&[u8]> {
        match self.values.get(name)? {
            Value::Bytes(v) => Some(v),
            Value::Str(s) => Some(s.as_bytes()),
            Value::U32(_) => Some(&[]),
        }
    }

    fn read_string(&self, name: &str) -> Option<&str> {
        match self.values.get(name)? {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    fn native_mode(&self) -> Option<VideoMode> {
        self.mode
    }
}
