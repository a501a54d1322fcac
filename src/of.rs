//! Descriptors described by device-tree style properties.

use alloc::borrow::Cow;
use alloc::vec;

use crate::descriptor::{
    parse_sequence, DelayProfile, LoadError, PanelDescriptor, SequenceKind, VideoMode,
};
use crate::nvmem::NvmemStore;

/// Property names understood by the loaders.
pub mod property {
    pub const PREPARE_DELAY_MS: &str = "prepare-delay-ms";
    pub const ENABLE_DELAY_MS: &str = "enable-delay-ms";
    pub const DISABLE_DELAY_MS: &str = "disable-delay-ms";
    pub const UNPREPARE_DELAY_MS: &str = "unprepare-delay-ms";
    pub const RESET_DELAY_MS: &str = "reset-delay-ms";
    pub const INIT_DELAY_MS: &str = "init-delay-ms";
    pub const INIT_SEQUENCE: &str = "panel-init-sequence";
    pub const EXIT_SEQUENCE: &str = "panel-exit-sequence";
    pub const BPC: &str = "bpc";
    pub const BUS_FORMAT: &str = "bus-format";
    pub const WIDTH_MM: &str = "width-mm";
    pub const HEIGHT_MM: &str = "height-mm";
    pub const DSI_FLAGS: &str = "dsi,flags";
    pub const DSI_FORMAT: &str = "dsi,format";
    pub const DSI_LANES: &str = "dsi,lanes";
    pub const CMD_TYPE: &str = "rockchip,cmd-type";
    pub const POWER_INVERT: &str = "power-invert";
}

/// Read access to a device node's properties.
pub trait PropertySource {
    fn read_u32(&self, name: &str) -> Option<u32>;

    fn read_bytes(&self, name: &str) -> Option<&[u8]>;

    fn read_string(&self, name: &str) -> Option<&str>;

    /// `true` if the property is present.
    fn read_bool(&self, name: &str) -> bool {
        self.read_bytes(name).is_some()
    }

    /// Native display mode described by the node, if any.
    fn native_mode(&self) -> Option<VideoMode> {
        None
    }
}

impl<T: PropertySource + ?Sized> PropertySource for &T {
    fn read_u32(&self, name: &str) -> Option<u32> {
        T::read_u32(self, name)
    }

    fn read_bytes(&self, name: &str) -> Option<&[u8]> {
        T::read_bytes(self, name)
    }

    fn read_string(&self, name: &str) -> Option<&str> {
        T::read_string(self, name)
    }

    fn read_bool(&self, name: &str) -> bool {
        T::read_bool(self, name)
    }

    fn native_mode(&self) -> Option<VideoMode> {
        T::native_mode(self)
    }
}

/// Reads the six delay properties. Absent properties are zero.
pub fn read_delays<P: PropertySource + ?Sized>(props: &P) -> DelayProfile {
    let ms = |name| props.read_u32(name).unwrap_or(0);

    DelayProfile {
        prepare: ms(property::PREPARE_DELAY_MS),
        enable: ms(property::ENABLE_DELAY_MS),
        disable: ms(property::DISABLE_DELAY_MS),
        unprepare: ms(property::UNPREPARE_DELAY_MS),
        reset: ms(property::RESET_DELAY_MS),
        init: ms(property::INIT_DELAY_MS),
    }
}

/// Builds a descriptor for a generic panel from its properties.
pub fn load_of_descriptor<P: PropertySource + ?Sized>(
    props: &P,
) -> Result<PanelDescriptor, LoadError> {
    let mut desc = PanelDescriptor::default();

    if let Some(vm) = props.native_mode() {
        desc.modes = Cow::Owned(vec![vm.to_display_mode()]);
        desc.bus_flags = vm.bus_flags();

        let read = |name| props.read_u32(name).unwrap_or(0);
        desc.bpc = read(property::BPC);
        desc.bus_format = read(property::BUS_FORMAT);
        desc.size = (read(property::WIDTH_MM), read(property::HEIGHT_MM));
    }

    desc.delay = read_delays(props);

    if let Some(raw) = props.read_bytes(property::INIT_SEQUENCE) {
        desc.init_seq = Some(parse_sequence(SequenceKind::Init, raw)?);
    }
    if let Some(raw) = props.read_bytes(property::EXIT_SEQUENCE) {
        desc.exit_seq = Some(parse_sequence(SequenceKind::Exit, raw)?);
    }

    Ok(desc)
}

/// Overrides the DSI link parameters present in the properties.
pub fn apply_dsi_properties<P: PropertySource + ?Sized>(desc: &mut PanelDescriptor, props: &P) {
    let mut dsi = desc.dsi.unwrap_or_default();

    if let Some(flags) = props.read_u32(property::DSI_FLAGS) {
        dsi.flags = flags;
    }
    if let Some(format) = props.read_u32(property::DSI_FORMAT) {
        dsi.format = format;
    }
    if let Some(lanes) = props.read_u32(property::DSI_LANES) {
        dsi.lanes = lanes;
    }

    desc.dsi = Some(dsi);
}

/// Builds a descriptor for a generic DSI panel.
///
/// A firmware image in `store` takes precedence; if there is none or it is
/// unusable, the descriptor comes from the properties. The DSI link
/// parameters are always taken from the properties.
pub fn load_dsi_descriptor<S, P>(
    store: Option<&mut S>,
    props: &P,
) -> Result<PanelDescriptor, LoadError>
where
    S: NvmemStore,
    P: PropertySource + ?Sized,
{
    let mut desc = match firmware_descriptor(store, props) {
        Some(desc) => desc,
        None => load_of_descriptor(props)?,
    };

    apply_dsi_properties(&mut desc, props);
    Ok(desc)
}

#[cfg(feature = "firmware")]
fn firmware_descriptor<S, P>(store: Option<&mut S>, props: &P) -> Option<PanelDescriptor>
where
    S: NvmemStore,
    P: PropertySource + ?Sized,
{
    match crate::firmware::load_firmware_descriptor(store?, props) {
        Ok(desc) => {
            log::info!("found firmware desc data");
            Some(desc)
        }
        Err(e) => {
            log::info!("not found firmware desc data ({e}), using defaults");
            None
        }
    }
}

#[cfg(not(feature = "firmware"))]
fn firmware_descriptor<S, P>(_store: Option<&mut S>, _props: &P) -> Option<PanelDescriptor>
where
    S: NvmemStore,
    P: PropertySource + ?Sized,
{
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::_mock::{MockEeprom, Properties};
    use crate::command::SequenceError;
    use crate::descriptor::{bus_flags, display_flags, DsiConfig};

    #[test]
    fn empty_node_gives_empty_descriptor() {
        let desc = load_of_descriptor(&Properties::default()).unwrap();
        assert_eq!(desc, PanelDescriptor::EMPTY);
    }

    #[test]
    fn delays_and_sequences() {
        let props = Properties::default()
            .u32(property::PREPARE_DELAY_MS, 10)
            .u32(property::ENABLE_DELAY_MS, 5)
            .u32(property::RESET_DELAY_MS, 20)
            .bytes(property::INIT_SEQUENCE, &[0x05, 120, 1, 0x11, 0x05, 20, 1, 0x29])
            .bytes(property::EXIT_SEQUENCE, &[0x05, 0, 1, 0x28]);

        let desc = load_of_descriptor(&props).unwrap();

        assert_eq!(
            desc.delay,
            DelayProfile {
                prepare: 10,
                enable: 5,
                reset: 20,
                ..DelayProfile::NONE
            }
        );
        assert_eq!(desc.init_seq.as_ref().map(|s| s.len()), Some(2));
        assert_eq!(desc.exit_seq.as_ref().map(|s| s.len()), Some(1));
        assert!(desc.modes.is_empty());
    }

    #[test]
    fn native_mode_brings_bus_properties() {
        let vm = VideoMode {
            pixelclock: 51_200_000,
            hactive: 1024,
            hfront_porch: 160,
            hback_porch: 140,
            hsync_len: 20,
            vactive: 600,
            vfront_porch: 12,
            vback_porch: 20,
            vsync_len: 3,
            flags: display_flags::DE_HIGH | display_flags::PIXDATA_NEGEDGE,
        };
        let props = Properties::default()
            .mode(vm)
            .u32(property::BPC, 8)
            .u32(property::BUS_FORMAT, 0x100a)
            .u32(property::WIDTH_MM, 154)
            .u32(property::HEIGHT_MM, 86);

        let desc = load_of_descriptor(&props).unwrap();

        assert_eq!(desc.modes.as_ref(), &[vm.to_display_mode()]);
        assert_eq!(desc.bus_flags, bus_flags::DE_HIGH | bus_flags::PIXDATA_NEGEDGE);
        assert_eq!((desc.bpc, desc.bus_format, desc.size), (8, 0x100a, (154, 86)));
    }

    #[test]
    fn bus_properties_need_a_native_mode() {
        let props = Properties::default().u32(property::BPC, 8);
        assert_eq!(load_of_descriptor(&props).unwrap().bpc, 0);
    }

    #[test]
    fn malformed_exit_sequence_fails_the_load() {
        let props = Properties::default()
            .bytes(property::INIT_SEQUENCE, &[0x05, 0, 1, 0x11])
            .bytes(property::EXIT_SEQUENCE, &[0x05, 0, 3, 0x28]);

        assert_eq!(
            load_of_descriptor(&props),
            Err(LoadError::MalformedSequence {
                kind: SequenceKind::Exit,
                error: SequenceError::PayloadOverrun {
                    offset: 0,
                    declared: 3,
                    remaining: 1,
                },
            })
        );
    }

    #[test]
    fn dsi_properties_override_link_parameters() {
        let props = Properties::default()
            .u32(property::DSI_LANES, 2)
            .u32(property::DSI_FORMAT, 3);

        let desc = load_dsi_descriptor(None::<&mut MockEeprom>, &props).unwrap();

        assert_eq!(
            desc.dsi,
            Some(DsiConfig {
                flags: 0,
                format: 3,
                lanes: 2,
            })
        );
    }

    #[cfg(feature = "firmware")]
    #[test]
    fn dsi_falls_back_to_properties_on_bad_firmware() {
        let mut eeprom = MockEeprom::new(vec![0; 128]);
        let props = Properties::default()
            .u32(property::ENABLE_DELAY_MS, 7)
            .bytes(property::INIT_SEQUENCE, &[0x05, 0, 1, 0x11]);

        let desc = load_dsi_descriptor(Some(&mut eeprom), &props).unwrap();

        assert_eq!(eeprom.reads(), 1);
        assert_eq!(desc.delay.enable, 7);
        assert_eq!(desc.init_seq.map(|s| s.len()), Some(1));
    }
}
