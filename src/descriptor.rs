//! Panel descriptors.
//!
//! A descriptor bundles everything that is fixed for a panel model: its
//! modes or timing ranges, power sequencing delays, bus format and the
//! optional init/exit command sequences. Descriptors are immutable once
//! built and shared by every panel instance of that model.

use alloc::borrow::Cow;
use core::convert::Infallible;
use core::fmt;

use embedded_graphics_core::geometry::Size;

use crate::command::{CommandSequence, SequenceError};

/// Power sequencing delays in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DelayProfile {
    /// Time for the panel to become ready after power on and enable-GPIO assert.
    pub prepare: u32,
    /// Time to show the first valid frame after video starts.
    pub enable: u32,
    /// Time for the panel to turn the display off.
    pub disable: u32,
    /// Time for the panel to power down completely.
    pub unprepare: u32,
    /// Reset pulse length.
    pub reset: u32,
    /// Wait between reset release and the init sequence.
    pub init: u32,
}

impl DelayProfile {
    pub const NONE: Self = Self {
        prepare: 0,
        enable: 0,
        disable: 0,
        unprepare: 0,
        reset: 0,
        init: 0,
    };
}

/// DRM style mode flags.
pub mod mode_flags {
    pub const PHSYNC: u32 = 1 << 0;
    pub const NHSYNC: u32 = 1 << 1;
    pub const PVSYNC: u32 = 1 << 2;
    pub const NVSYNC: u32 = 1 << 3;
    pub const INTERLACE: u32 = 1 << 4;
    pub const DBLSCAN: u32 = 1 << 5;
    pub const DBLCLK: u32 = 1 << 12;
}

/// Bus flags describing the pixel data and DE signal polarity.
pub mod bus_flags {
    pub const DE_LOW: u32 = 1 << 0;
    pub const DE_HIGH: u32 = 1 << 1;
    pub const PIXDATA_POSEDGE: u32 = 1 << 2;
    pub const PIXDATA_NEGEDGE: u32 = 1 << 3;
}

/// Display timing flags as stored in a [`VideoMode`].
pub mod display_flags {
    pub const HSYNC_LOW: u32 = 1 << 0;
    pub const HSYNC_HIGH: u32 = 1 << 1;
    pub const VSYNC_LOW: u32 = 1 << 2;
    pub const VSYNC_HIGH: u32 = 1 << 3;
    pub const DE_LOW: u32 = 1 << 4;
    pub const DE_HIGH: u32 = 1 << 5;
    pub const PIXDATA_POSEDGE: u32 = 1 << 6;
    pub const PIXDATA_NEGEDGE: u32 = 1 << 7;
    pub const INTERLACED: u32 = 1 << 8;
    pub const DOUBLESCAN: u32 = 1 << 9;
    pub const DOUBLECLK: u32 = 1 << 10;
}

/// Media bus formats.
pub mod bus_format {
    pub const RGB565_1X16: u32 = 0x1017;
    pub const RGB666_1X18: u32 = 0x1009;
    pub const RGB666_1X7X3_SPWG: u32 = 0x1010;
    pub const RGB888_1X24: u32 = 0x100a;
    pub const RGB888_1X7X4_SPWG: u32 = 0x1011;
    pub const RGB888_1X7X4_JEIDA: u32 = 0x1012;
}

/// A fixed display mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DisplayMode {
    /// Pixel clock in kHz.
    pub clock: u32,
    pub hdisplay: u16,
    pub hsync_start: u16,
    pub hsync_end: u16,
    pub htotal: u16,
    pub vdisplay: u16,
    pub vsync_start: u16,
    pub vsync_end: u16,
    pub vtotal: u16,
    pub vrefresh: u32,
    /// See [`mode_flags`].
    pub flags: u32,
}

/// A `(min, typ, max)` timing range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimingEntry {
    pub min: u32,
    pub typ: u32,
    pub max: u32,
}

impl TimingEntry {
    pub const fn new(min: u32, typ: u32, max: u32) -> Self {
        Self { min, typ, max }
    }

    pub const fn fixed(value: u32) -> Self {
        Self::new(value, value, value)
    }
}

/// Timing ranges accepted by a panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DisplayTiming {
    /// Pixel clock in Hz.
    pub pixelclock: TimingEntry,
    pub hactive: TimingEntry,
    pub hfront_porch: TimingEntry,
    pub hback_porch: TimingEntry,
    pub hsync_len: TimingEntry,
    pub vactive: TimingEntry,
    pub vfront_porch: TimingEntry,
    pub vback_porch: TimingEntry,
    pub vsync_len: TimingEntry,
    /// See [`display_flags`].
    pub flags: u32,
}

/// A single native video mode, as stored in firmware images and device trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VideoMode {
    /// Pixel clock in Hz.
    pub pixelclock: u32,
    pub hactive: u32,
    pub hfront_porch: u32,
    pub hback_porch: u32,
    pub hsync_len: u32,
    pub vactive: u32,
    pub vfront_porch: u32,
    pub vback_porch: u32,
    pub vsync_len: u32,
    /// See [`display_flags`].
    pub flags: u32,
}

impl VideoMode {
    /// Size of the little-endian record.
    pub const RECORD_LEN: usize = 40;

    /// Decodes a record of ten little-endian `u32`s.
    ///
    /// Missing trailing bytes read as zero, extra bytes are ignored.
    pub fn from_le_bytes(raw: &[u8]) -> Self {
        let mut record = [0u8; Self::RECORD_LEN];
        let len = raw.len().min(Self::RECORD_LEN);
        record[..len].copy_from_slice(&raw[..len]);

        let field = |i: usize| {
            u32::from_le_bytes([
                record[i * 4],
                record[i * 4 + 1],
                record[i * 4 + 2],
                record[i * 4 + 3],
            ])
        };

        Self {
            pixelclock: field(0),
            hactive: field(1),
            hfront_porch: field(2),
            hback_porch: field(3),
            hsync_len: field(4),
            vactive: field(5),
            vfront_porch: field(6),
            vback_porch: field(7),
            vsync_len: field(8),
            flags: field(9),
        }
    }

    pub fn to_display_mode(&self) -> DisplayMode {
        use display_flags::*;

        // horizontal and vertical values are limited to the mode's u16 range
        let clamp = |v: u32| u16::try_from(v).unwrap_or(u16::MAX);

        let hsync_start = self.hactive.saturating_add(self.hfront_porch);
        let hsync_end = hsync_start.saturating_add(self.hsync_len);
        let htotal = hsync_end.saturating_add(self.hback_porch);
        let vsync_start = self.vactive.saturating_add(self.vfront_porch);
        let vsync_end = vsync_start.saturating_add(self.vsync_len);
        let vtotal = vsync_end.saturating_add(self.vback_porch);

        let mut flags = 0;
        if self.flags & HSYNC_HIGH != 0 {
            flags |= mode_flags::PHSYNC;
        } else if self.flags & HSYNC_LOW != 0 {
            flags |= mode_flags::NHSYNC;
        }
        if self.flags & VSYNC_HIGH != 0 {
            flags |= mode_flags::PVSYNC;
        } else if self.flags & VSYNC_LOW != 0 {
            flags |= mode_flags::NVSYNC;
        }
        if self.flags & INTERLACED != 0 {
            flags |= mode_flags::INTERLACE;
        }
        if self.flags & DOUBLESCAN != 0 {
            flags |= mode_flags::DBLSCAN;
        }
        if self.flags & DOUBLECLK != 0 {
            flags |= mode_flags::DBLCLK;
        }

        let total = u64::from(htotal) * u64::from(vtotal);
        let vrefresh = if total == 0 {
            0
        } else {
            ((u64::from(self.pixelclock) + total / 2) / total) as u32
        };

        DisplayMode {
            clock: self.pixelclock / 1000,
            hdisplay: clamp(self.hactive),
            hsync_start: clamp(hsync_start),
            hsync_end: clamp(hsync_end),
            htotal: clamp(htotal),
            vdisplay: clamp(self.vactive),
            vsync_start: clamp(vsync_start),
            vsync_end: clamp(vsync_end),
            vtotal: clamp(vtotal),
            vrefresh,
            flags,
        }
    }

    /// Bus flags implied by the DE and pixel clock polarity flags.
    pub fn bus_flags(&self) -> u32 {
        use display_flags::*;

        let mut flags = 0;
        if self.flags & PIXDATA_POSEDGE != 0 {
            flags |= bus_flags::PIXDATA_POSEDGE;
        }
        if self.flags & PIXDATA_NEGEDGE != 0 {
            flags |= bus_flags::PIXDATA_NEGEDGE;
        }
        if self.flags & DE_LOW != 0 {
            flags |= bus_flags::DE_LOW;
        }
        if self.flags & DE_HIGH != 0 {
            flags |= bus_flags::DE_HIGH;
        }
        flags
    }
}

/// DSI link parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DsiConfig {
    /// Host mode flags (video, burst, sync pulse, ...).
    pub flags: u32,
    /// Pixel format on the link.
    pub format: u32,
    /// Number of data lanes.
    pub lanes: u32,
}

/// DSI mode flags used by the built-in panel table.
pub mod dsi_mode {
    pub const VIDEO: u32 = 1 << 0;
    pub const VIDEO_BURST: u32 = 1 << 1;
    pub const VIDEO_SYNC_PULSE: u32 = 1 << 2;
    pub const CLOCK_NON_CONTINUOUS: u32 = 1 << 10;
}

/// DSI pixel formats.
pub mod dsi_format {
    pub const RGB888: u32 = 0;
    pub const RGB666: u32 = 1;
    pub const RGB666_PACKED: u32 = 2;
    pub const RGB565: u32 = 3;
}

/// Everything fixed about a panel model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelDescriptor {
    pub modes: Cow<'static, [DisplayMode]>,
    pub timings: Cow<'static, [DisplayTiming]>,
    /// Bits per color channel.
    pub bpc: u32,
    /// Active area size in millimeters.
    pub size: (u32, u32),
    pub delay: DelayProfile,
    pub bus_format: u32,
    /// See [`bus_flags`].
    pub bus_flags: u32,
    pub init_seq: Option<CommandSequence>,
    pub exit_seq: Option<CommandSequence>,
    pub dsi: Option<DsiConfig>,
}

impl Default for PanelDescriptor {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl PanelDescriptor {
    /// Descriptor without modes, delays or sequences.
    pub const EMPTY: Self = Self {
        modes: Cow::Borrowed(&[]),
        timings: Cow::Borrowed(&[]),
        bpc: 0,
        size: (0, 0),
        delay: DelayProfile::NONE,
        bus_format: 0,
        bus_flags: 0,
        init_seq: None,
        exit_seq: None,
        dsi: None,
    };

    /// Resolution of the preferred mode, falling back to the typical timing.
    pub fn resolution(&self) -> Option<Size> {
        if let Some(mode) = self.modes.first() {
            return Some(Size::new(mode.hdisplay.into(), mode.vdisplay.into()));
        }
        self.timings
            .first()
            .map(|t| Size::new(t.hactive.typ, t.vactive.typ))
    }

    /// Active area in millimeters.
    pub fn physical_size(&self) -> Size {
        Size::new(self.size.0, self.size.1)
    }
}

impl<'a> From<&'a PanelDescriptor> for Cow<'a, PanelDescriptor> {
    fn from(desc: &'a PanelDescriptor) -> Self {
        Cow::Borrowed(desc)
    }
}

impl From<PanelDescriptor> for Cow<'_, PanelDescriptor> {
    fn from(desc: PanelDescriptor) -> Self {
        Cow::Owned(desc)
    }
}

/// Which of a descriptor's sequences an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceKind {
    Init,
    Exit,
}

impl fmt::Display for SequenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init => f.write_str("init"),
            Self::Exit => f.write_str("exit"),
        }
    }
}

/// Reasons a firmware image is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirmwareError {
    /// The header magic is not the expected constant.
    BadMagic(u32),
    /// The header declares a zero sized image.
    EmptyImage,
    /// An entry reaches past the declared image size.
    EntryOutOfBounds { offset: u32, length: u32 },
}

/// Error loading a descriptor.
///
/// Loading never yields a partially filled descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadError<E = Infallible> {
    /// An init or exit sequence could not be parsed.
    MalformedSequence {
        kind: SequenceKind,
        error: SequenceError,
    },
    /// The firmware image is not usable.
    InvalidFirmware(FirmwareError),
    /// Reading the nonvolatile store failed.
    Storage(E),
}

impl<E: fmt::Debug> fmt::Display for LoadError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedSequence { kind, error } => {
                write!(f, "failed to parse {kind} sequence: {error}")
            }
            Self::InvalidFirmware(FirmwareError::BadMagic(magic)) => {
                write!(f, "invalid firmware magic {magic:#010x}")
            }
            Self::InvalidFirmware(FirmwareError::EmptyImage) => {
                f.write_str("invalid firmware: empty image")
            }
            Self::InvalidFirmware(FirmwareError::EntryOutOfBounds { offset, length }) => write!(
                f,
                "invalid firmware: entry {offset:#x}+{length:#x} outside the image"
            ),
            Self::Storage(e) => write!(f, "failed to read firmware: {e:?}"),
        }
    }
}

impl LoadError {
    /// Widens an error that cannot carry a storage failure.
    pub fn widen<E>(self) -> LoadError<E> {
        match self {
            Self::MalformedSequence { kind, error } => LoadError::MalformedSequence { kind, error },
            Self::InvalidFirmware(e) => LoadError::InvalidFirmware(e),
            Self::Storage(never) => match never {},
        }
    }
}

/// Parses one of a descriptor's sequences.
pub fn parse_sequence(kind: SequenceKind, raw: &[u8]) -> Result<CommandSequence, LoadError> {
    CommandSequence::parse(raw).map_err(|error| {
        log::error!("failed to parse {kind} sequence: {error}");
        LoadError::MalformedSequence { kind, error }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(fields: [u32; 10]) -> Vec<u8> {
        fields.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    #[test]
    fn video_mode_record() {
        let raw = record([
            148_500_000,
            1920,
            88,
            148,
            44,
            1080,
            4,
            36,
            5,
            display_flags::HSYNC_HIGH | display_flags::VSYNC_LOW | display_flags::DE_HIGH,
        ]);
        let vm = VideoMode::from_le_bytes(&raw);

        let mode = vm.to_display_mode();
        assert_eq!(mode.clock, 148_500);
        assert_eq!(
            (mode.hdisplay, mode.hsync_start, mode.hsync_end, mode.htotal),
            (1920, 2008, 2052, 2200)
        );
        assert_eq!(
            (mode.vdisplay, mode.vsync_start, mode.vsync_end, mode.vtotal),
            (1080, 1084, 1089, 1125)
        );
        assert_eq!(mode.vrefresh, 60);
        assert_eq!(mode.flags, mode_flags::PHSYNC | mode_flags::NVSYNC);
        assert_eq!(vm.bus_flags(), bus_flags::DE_HIGH);
    }

    #[test]
    fn short_video_mode_record_is_zero_padded() {
        let raw = record([9_000_000, 480, 2, 2, 41, 272, 2, 2, 10, 0]);
        let vm = VideoMode::from_le_bytes(&raw[..24]);

        assert_eq!(vm.hactive, 480);
        assert_eq!(vm.vactive, 272);
        assert_eq!(vm.vfront_porch, 0);
        assert_eq!(vm.flags, 0);
    }

    #[test]
    fn resolution_from_mode_or_timing() {
        let mut desc = PanelDescriptor::EMPTY;
        assert_eq!(desc.resolution(), None);

        desc.timings = Cow::Owned(vec![DisplayTiming {
            hactive: TimingEntry::fixed(800),
            vactive: TimingEntry::fixed(480),
            ..Default::default()
        }]);
        assert_eq!(desc.resolution(), Some(Size::new(800, 480)));

        desc.modes = Cow::Owned(vec![DisplayMode {
            hdisplay: 1024,
            vdisplay: 600,
            ..Default::default()
        }]);
        assert_eq!(desc.resolution(), Some(Size::new(1024, 600)));

        desc.size = (154, 86);
        assert_eq!(desc.physical_size(), Size::new(154, 86));
    }
}
