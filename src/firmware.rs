//! Panel descriptors stored in a panel EEPROM.
//!
//! The image starts with a fixed 96 byte little-endian header:
//!
//! | offset | field            |
//! |--------|------------------|
//! | 0      | magic            |
//! | 4      | vendor, 16 bytes |
//! | 20     | model, 32 bytes  |
//! | 52     | version, 8 bytes |
//! | 60     | timing entry     |
//! | 68     | init entry       |
//! | 76     | exit entry       |
//! | 84     | touch entry      |
//! | 92     | image size       |
//!
//! Each entry is an `(offset, length)` pair of `u32`s pointing into the image.

use alloc::borrow::Cow;
use alloc::vec;
use alloc::vec::Vec;

use heapless::String;

use crate::descriptor::{
    parse_sequence, FirmwareError, LoadError, PanelDescriptor, SequenceKind, VideoMode,
};
use crate::nvmem::NvmemStore;
use crate::of::{read_delays, PropertySource};

/// Expected header magic.
pub const FIRMWARE_MAGIC: u32 = 0xDEAD_5A5A;

/// Size of the image header.
pub const HEADER_LEN: usize = 96;

/// Location of a blob inside the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Entry {
    pub offset: u32,
    pub length: u32,
}

impl Entry {
    fn from_le_bytes(raw: &[u8; 8]) -> Self {
        Self {
            offset: u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]),
            length: u32::from_le_bytes([raw[4], raw[5], raw[6], raw[7]]),
        }
    }

    /// Checks that the entry lies within an image of `size` bytes.
    fn check(&self, size: u32) -> Result<(), FirmwareError> {
        match self.offset.checked_add(self.length) {
            Some(end) if end <= size => Ok(()),
            _ => Err(FirmwareError::EntryOutOfBounds {
                offset: self.offset,
                length: self.length,
            }),
        }
    }
}

/// Decoded image header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirmwareHeader {
    pub magic: u32,
    pub vendor: String<16>,
    pub model: String<32>,
    pub version: String<8>,
    pub timing: Entry,
    pub init_seq: Entry,
    pub exit_seq: Entry,
    /// Touchscreen configuration, not used by the panel.
    pub touchscreen: Entry,
    pub firmware_size: u32,
}

fn field<const N: usize>(raw: &[u8; HEADER_LEN], at: usize) -> [u8; N] {
    let mut out = [0; N];
    out.copy_from_slice(&raw[at..at + N]);
    out
}

fn text<const N: usize>(raw: &[u8; N]) -> String<N> {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(N);
    core::str::from_utf8(&raw[..end])
        .ok()
        .and_then(|s| String::try_from(s).ok())
        .unwrap_or_default()
}

impl FirmwareHeader {
    /// Decodes a header. Strings are cut at the first NUL, invalid UTF-8
    /// decodes as an empty string.
    pub fn parse(raw: &[u8; HEADER_LEN]) -> Self {
        Self {
            magic: u32::from_le_bytes(field(raw, 0)),
            vendor: text(&field(raw, 4)),
            model: text(&field(raw, 20)),
            version: text(&field(raw, 52)),
            timing: Entry::from_le_bytes(&field(raw, 60)),
            init_seq: Entry::from_le_bytes(&field(raw, 68)),
            exit_seq: Entry::from_le_bytes(&field(raw, 76)),
            touchscreen: Entry::from_le_bytes(&field(raw, 84)),
            firmware_size: u32::from_le_bytes(field(raw, 92)),
        }
    }

    fn validate(&self) -> Result<(), FirmwareError> {
        if self.magic != FIRMWARE_MAGIC {
            return Err(FirmwareError::BadMagic(self.magic));
        }
        if self.firmware_size == 0 {
            return Err(FirmwareError::EmptyImage);
        }
        self.timing.check(self.firmware_size)?;
        self.init_seq.check(self.firmware_size)?;
        self.exit_seq.check(self.firmware_size)
    }
}

fn read_entry<S: NvmemStore>(store: &mut S, entry: Entry) -> Result<Vec<u8>, LoadError<S::Error>> {
    let mut buf = vec![0; entry.length as usize];
    store.read(entry.offset, &mut buf).map_err(LoadError::Storage)?;
    Ok(buf)
}

/// Loads a descriptor from the image in `store`.
///
/// The delays are not part of the image and are read from `props`.
pub fn load_firmware_descriptor<S, P>(
    store: &mut S,
    props: &P,
) -> Result<PanelDescriptor, LoadError<S::Error>>
where
    S: NvmemStore,
    P: PropertySource + ?Sized,
{
    let mut raw = [0; HEADER_LEN];
    store.read(0, &mut raw).map_err(|e| {
        log::error!("failed to read firmware header: {e:?}");
        LoadError::Storage(e)
    })?;

    let header = FirmwareHeader::parse(&raw);
    header.validate().map_err(|e| {
        log::error!("invalid eeprom firmware: {e:?}");
        LoadError::InvalidFirmware(e)
    })?;

    log::info!("lcd firmware magic: {:x}", header.magic);
    log::info!(
        "lcd firmware version: {}, size: {}",
        header.version,
        header.firmware_size
    );
    log::info!("lcd vendor: {}, model: {}", header.vendor, header.model);

    let timing = Entry {
        length: header.timing.length.min(VideoMode::RECORD_LEN as u32),
        ..header.timing
    };
    let vm = VideoMode::from_le_bytes(&read_entry(store, timing)?);
    let init = read_entry(store, header.init_seq)?;
    let exit = read_entry(store, header.exit_seq)?;

    let mut desc = PanelDescriptor {
        modes: Cow::Owned(vec![vm.to_display_mode()]),
        bus_flags: vm.bus_flags(),
        delay: read_delays(props),
        ..PanelDescriptor::EMPTY
    };
    desc.init_seq = Some(parse_sequence(SequenceKind::Init, &init).map_err(LoadError::widen)?);
    desc.exit_seq = Some(parse_sequence(SequenceKind::Exit, &exit).map_err(LoadError::widen)?);

    Ok(desc)
}
