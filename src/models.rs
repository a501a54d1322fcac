//! Panel models.
//!
//! Compatible string tables for panels on a parallel/LVDS bus ("platform")
//! and for panels behind a DSI host. The generic `simple-panel` and
//! `simple-panel-dsi` entries have no descriptor of their own; theirs is
//! loaded from the device tree or the panel EEPROM.

#[cfg(feature = "builtin-panels")]
use alloc::borrow::Cow;

use crate::descriptor::PanelDescriptor;
#[cfg(feature = "builtin-panels")]
use crate::descriptor::{DelayProfile, DisplayMode, DisplayTiming, DsiConfig};

#[cfg(feature = "builtin-panels")]
mod dsi;
#[cfg(feature = "builtin-panels")]
mod platform;

#[cfg(feature = "builtin-panels")]
pub use dsi::*;
#[cfg(feature = "builtin-panels")]
pub use platform::*;

/// Result of a compatible string lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelMatch {
    /// A built-in panel.
    Static(&'static PanelDescriptor),
    /// A generic panel whose descriptor must be loaded at probe time.
    Dynamic,
}

/// One compatible string table entry.
#[derive(Debug, Clone, Copy)]
pub struct OfMatch {
    pub compatible: &'static str,
    pub data: Option<&'static PanelDescriptor>,
}

impl OfMatch {
    pub const fn new(compatible: &'static str, data: &'static PanelDescriptor) -> Self {
        Self {
            compatible,
            data: Some(data),
        }
    }

    pub const fn generic(compatible: &'static str) -> Self {
        Self {
            compatible,
            data: None,
        }
    }

    fn to_match(self) -> PanelMatch {
        match self.data {
            Some(desc) => PanelMatch::Static(desc),
            None => PanelMatch::Dynamic,
        }
    }
}

static PLATFORM_GENERIC: [OfMatch; 1] = [OfMatch::generic("simple-panel")];
static DSI_GENERIC: [OfMatch; 1] = [OfMatch::generic("simple-panel-dsi")];

#[cfg(feature = "builtin-panels")]
fn platform_tables() -> [&'static [OfMatch]; 2] {
    [&PLATFORM_GENERIC, PLATFORM_PANELS]
}

#[cfg(not(feature = "builtin-panels"))]
fn platform_tables() -> [&'static [OfMatch]; 1] {
    [&PLATFORM_GENERIC]
}

#[cfg(feature = "builtin-panels")]
fn dsi_tables() -> [&'static [OfMatch]; 2] {
    [&DSI_GENERIC, DSI_PANELS]
}

#[cfg(not(feature = "builtin-panels"))]
fn dsi_tables() -> [&'static [OfMatch]; 1] {
    [&DSI_GENERIC]
}

fn lookup(tables: &[&'static [OfMatch]], compatible: &str) -> Option<PanelMatch> {
    tables
        .iter()
        .flat_map(|table| table.iter())
        .find(|entry| entry.compatible == compatible)
        .map(|entry| entry.to_match())
}

/// Looks up a panel on a parallel/LVDS bus.
pub fn lookup_platform(compatible: &str) -> Option<PanelMatch> {
    lookup(&platform_tables(), compatible)
}

/// Looks up a panel behind a DSI host.
pub fn lookup_dsi(compatible: &str) -> Option<PanelMatch> {
    lookup(&dsi_tables(), compatible)
}

/// Builds a mode from `(active, front porch, sync length, back porch)` tuples.
#[cfg(feature = "builtin-panels")]
pub(crate) const fn mode(
    clock: u32,
    h: (u16, u16, u16, u16),
    v: (u16, u16, u16, u16),
    vrefresh: u32,
    flags: u32,
) -> DisplayMode {
    DisplayMode {
        clock,
        hdisplay: h.0,
        hsync_start: h.0 + h.1,
        hsync_end: h.0 + h.1 + h.2,
        htotal: h.0 + h.1 + h.2 + h.3,
        vdisplay: v.0,
        vsync_start: v.0 + v.1,
        vsync_end: v.0 + v.1 + v.2,
        vtotal: v.0 + v.1 + v.2 + v.3,
        vrefresh,
        flags,
    }
}

#[cfg(feature = "builtin-panels")]
pub(crate) const fn panel(
    modes: &'static [DisplayMode],
    bpc: u32,
    size: (u32, u32),
    delay: DelayProfile,
    bus_format: u32,
    bus_flags: u32,
) -> PanelDescriptor {
    PanelDescriptor {
        modes: Cow::Borrowed(modes),
        timings: Cow::Borrowed(&[]),
        bpc,
        size,
        delay,
        bus_format,
        bus_flags,
        init_seq: None,
        exit_seq: None,
        dsi: None,
    }
}

#[cfg(feature = "builtin-panels")]
pub(crate) const fn timed_panel(
    timings: &'static [DisplayTiming],
    bpc: u32,
    size: (u32, u32),
    delay: DelayProfile,
    bus_format: u32,
    bus_flags: u32,
) -> PanelDescriptor {
    PanelDescriptor {
        modes: Cow::Borrowed(&[]),
        timings: Cow::Borrowed(timings),
        bpc,
        size,
        delay,
        bus_format,
        bus_flags,
        init_seq: None,
        exit_seq: None,
        dsi: None,
    }
}

#[cfg(feature = "builtin-panels")]
pub(crate) const fn dsi_panel(
    modes: &'static [DisplayMode],
    bpc: u32,
    size: (u32, u32),
    dsi: DsiConfig,
) -> PanelDescriptor {
    PanelDescriptor {
        modes: Cow::Borrowed(modes),
        timings: Cow::Borrowed(&[]),
        bpc,
        size,
        delay: DelayProfile::NONE,
        bus_format: 0,
        bus_flags: 0,
        init_seq: None,
        exit_seq: None,
        dsi: Some(dsi),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generic_entries_are_dynamic() {
        assert_eq!(lookup_platform("simple-panel"), Some(PanelMatch::Dynamic));
        assert_eq!(lookup_dsi("simple-panel-dsi"), Some(PanelMatch::Dynamic));
        assert_eq!(lookup_platform("simple-panel-dsi"), None);
        assert_eq!(lookup_dsi("simple-panel"), None);
        assert_eq!(lookup_platform("acme,unknown"), None);
    }

    #[cfg(feature = "builtin-panels")]
    #[test]
    fn mode_from_porches() {
        let m = mode(9000, (480, 2, 41, 2), (272, 2, 10, 2), 60, 0);
        assert_eq!((m.hsync_start, m.hsync_end, m.htotal), (482, 523, 525));
        assert_eq!((m.vsync_start, m.vsync_end, m.vtotal), (274, 284, 286));
    }

    #[cfg(feature = "builtin-panels")]
    #[test]
    fn builtin_panels() {
        use crate::descriptor::dsi_format;
        use embedded_graphics_core::geometry::Size;

        let Some(PanelMatch::Static(desc)) = lookup_platform("auo,g070vvn01") else {
            panic!("auo,g070vvn01 missing");
        };
        assert!(desc.modes.is_empty());
        assert_eq!(desc.resolution(), Some(Size::new(800, 480)));
        assert_eq!(desc.delay.prepare, 200);
        assert_eq!(desc.delay.unprepare, 1000);

        let Some(PanelMatch::Static(desc)) = lookup_platform("boe,nv101wxmn51") else {
            panic!("boe,nv101wxmn51 missing");
        };
        assert_eq!(desc.modes.len(), 2);

        let Some(PanelMatch::Static(desc)) = lookup_dsi("lg,ld070wx3-sl01") else {
            panic!("lg,ld070wx3-sl01 missing");
        };
        let dsi = desc.dsi.unwrap();
        assert_eq!(dsi.lanes, 4);
        assert_eq!(dsi.format, dsi_format::RGB888);
        assert_eq!(desc.resolution(), Some(Size::new(800, 1280)));

        // dsi panels are not reachable through the platform table
        assert_eq!(lookup_platform("lg,ld070wx3-sl01"), None);
    }
}
