//! Binding a panel to the resources of a board.

use alloc::borrow::Cow;
use core::fmt;

use embedded_hal::digital::OutputPin;

use crate::descriptor::{LoadError, PanelDescriptor};
use crate::interface::{
    DsiHost, DsiTransport, McuBridge, McuTransport, SpiTransport, Transport, TransportKind,
};
use crate::models::{lookup_dsi, lookup_platform, PanelMatch};
use crate::nvmem::NvmemStore;
use crate::of::{load_dsi_descriptor, load_of_descriptor, property, PropertySource};
use crate::power::{Backlight, PowerRails, Regulator, RegulatorBulk};
use crate::Panel;

/// Why a resource could not be handed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceError {
    /// The resource does not exist.
    Missing,
    /// The resource exists but is not ready yet; probing may be retried.
    Deferred,
}

/// A resource requested while probing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Supply(&'static str),
    Gpio(&'static str),
    McuBridge,
    Backlight,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Supply(name) => write!(f, "{name} supply"),
            Self::Gpio(name) => write!(f, "{name} GPIO"),
            Self::McuBridge => f.write_str("mcu bridge"),
            Self::Backlight => f.write_str("backlight"),
        }
    }
}

/// Error probing a panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeError {
    /// No table entry matches the compatible string.
    UnknownCompatible,
    /// The descriptor of a generic panel could not be loaded.
    Descriptor(LoadError),
    /// A required resource is not available.
    ResourceUnavailable { resource: Resource, deferred: bool },
    /// The DSI host refused to attach the panel.
    DsiAttach,
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownCompatible => f.write_str("unknown compatible"),
            Self::Descriptor(e) => write!(f, "failed to load descriptor: {e}"),
            Self::ResourceUnavailable {
                resource,
                deferred: true,
            } => write!(f, "{resource} not ready"),
            Self::ResourceUnavailable { resource, .. } => write!(f, "failed to get {resource}"),
            Self::DsiAttach => f.write_str("failed to attach dsi device"),
        }
    }
}

/// Hands out the resources wired to a panel.
pub trait Board {
    type Pin: OutputPin;
    type Supply: Regulator;
    type Dsi: DsiHost;
    type Mcu: McuBridge;
    type Backlight: Backlight;
    type Store: NvmemStore;

    /// The DSI host, if the panel sits on a DSI link.
    fn dsi_host(&mut self) -> Option<Self::Dsi>;

    fn supply(&mut self, name: &str) -> Result<Self::Supply, ResourceError>;

    /// An optional GPIO. `Ok(None)` if the board does not wire it.
    fn gpio(&mut self, name: &str) -> Result<Option<Self::Pin>, ResourceError>;

    /// The backlight, `Ok(None)` if the panel has none.
    fn backlight(&mut self) -> Result<Option<Self::Backlight>, ResourceError>;

    /// The display controller's MCU command path.
    fn mcu_bridge(&mut self) -> Result<Self::Mcu, ResourceError>;

    /// The panel EEPROM, if any.
    fn eeprom(&mut self) -> Option<Self::Store>;
}

/// Transport built from a board's resources.
pub type BoardTransport<B> = Transport<
    <B as Board>::Dsi,
    <B as Board>::Pin,
    <B as Board>::Pin,
    <B as Board>::Pin,
    <B as Board>::Mcu,
>;

/// `vsp`/`vsn` bulk plus the `power` supply of a board.
pub type BoardPower<B> =
    PowerRails<RegulatorBulk<<B as Board>::Supply, 2>, <B as Board>::Supply>;

/// Panel built by [`probe`].
pub type BoardPanel<B> = Panel<
    'static,
    BoardTransport<B>,
    BoardPower<B>,
    <B as Board>::Pin,
    <B as Board>::Pin,
    <B as Board>::Backlight,
>;

fn acquire<T>(resource: Resource, result: Result<T, ResourceError>) -> Result<T, ProbeError> {
    result.map_err(|e| {
        let deferred = e == ResourceError::Deferred;
        if deferred {
            log::debug!("{resource} not ready, deferring");
        } else {
            log::error!("failed to get {resource}");
        }
        ProbeError::ResourceUnavailable { resource, deferred }
    })
}

fn required_gpio<B: Board>(board: &mut B, name: &'static str) -> Result<B::Pin, ProbeError> {
    acquire(Resource::Gpio(name), board.gpio(name))?.ok_or_else(|| {
        log::error!("failed to request {name}");
        ProbeError::ResourceUnavailable {
            resource: Resource::Gpio(name),
            deferred: false,
        }
    })
}

fn descriptor<B, P>(
    board: &mut B,
    props: &P,
    compatible: &str,
    dsi: bool,
) -> Result<Cow<'static, PanelDescriptor>, ProbeError>
where
    B: Board,
    P: PropertySource + ?Sized,
{
    let found = if dsi {
        lookup_dsi(compatible)
    } else {
        lookup_platform(compatible)
    };

    let loaded = match found.ok_or(ProbeError::UnknownCompatible)? {
        PanelMatch::Static(desc) => return Ok(Cow::Borrowed(desc)),
        PanelMatch::Dynamic if dsi => load_dsi_descriptor(board.eeprom().as_mut(), props),
        PanelMatch::Dynamic => load_of_descriptor(props),
    };

    loaded.map(Cow::Owned).map_err(ProbeError::Descriptor)
}

/// Builds an unprepared panel for the device `compatible` on `board`.
///
/// A board with a DSI host is matched against the DSI table, any other
/// against the platform table. The command transport is the MCU bridge if
/// `rockchip,cmd-type` selects it, otherwise the DSI host if there is one,
/// otherwise bit-banged SPI if selected. A DSI link is attached with the
/// descriptor's link parameters once every other resource is in hand.
pub fn probe<B, P>(board: &mut B, props: &P, compatible: &str) -> Result<BoardPanel<B>, ProbeError>
where
    B: Board,
    P: PropertySource + ?Sized,
{
    let host = board.dsi_host();
    let descriptor = descriptor(board, props, compatible, host.is_some())?;

    let main = acquire(Resource::Supply("power"), board.supply("power"))?;
    let vsp = acquire(Resource::Supply("vsp"), board.supply("vsp"))?;
    let vsn = acquire(Resource::Supply("vsn"), board.supply("vsn"))?;

    let enable = acquire(Resource::Gpio("enable"), board.gpio("enable"))?;
    let reset = acquire(Resource::Gpio("reset"), board.gpio("reset"))?;

    let cmd_type = props
        .read_string(property::CMD_TYPE)
        .map_or(TransportKind::None, TransportKind::from_cmd_type);

    let mut transport = match (cmd_type, host) {
        (TransportKind::Mcu, _) => {
            let bridge = acquire(Resource::McuBridge, board.mcu_bridge())?;
            Transport::Mcu(McuTransport::new(bridge))
        }
        (_, Some(host)) => Transport::Dsi(DsiTransport::new(host)),
        (TransportKind::Spi, None) => {
            let sdi = required_gpio(board, "spi-sdi")?;
            let scl = required_gpio(board, "spi-scl")?;
            let cs = acquire(Resource::Gpio("spi-cs"), board.gpio("spi-cs"))?;
            Transport::Spi(SpiTransport::new(sdi, scl, cs))
        }
        _ => Transport::None,
    };

    let power = PowerRails::new(RegulatorBulk::new([vsp, vsn]), main)
        .inverted(props.read_bool(property::POWER_INVERT));

    let backlight = acquire(Resource::Backlight, board.backlight())?;

    if let Transport::Dsi(dsi) = &mut transport {
        let config = descriptor.dsi.unwrap_or_default();
        dsi.attach(&config).map_err(|e| {
            log::error!("failed to attach dsi device: {e:?}");
            ProbeError::DsiAttach
        })?;
    }

    Ok(Panel {
        descriptor,
        transport,
        power,
        enable_gpio: enable,
        reset_gpio: reset,
        backlight,
        prepared: false,
        enabled: false,
        last_fault: None,
    })
}
