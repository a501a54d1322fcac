//! [super::Panel] builder module

use alloc::borrow::Cow;

use embedded_hal::digital::{self, OutputPin};

use crate::{
    descriptor::PanelDescriptor,
    interface::CommandTransport,
    power::{Backlight, NoBacklight, NoPower, PowerControl},
    Panel,
};

/// Builder for [Panel] instances.
///
/// Only the descriptor and the transport are required. Supplies, GPIOs and
/// the backlight default to placeholders that do nothing.
pub struct Builder<'d, T, P, EN, RST, BL> {
    descriptor: Cow<'d, PanelDescriptor>,
    transport: T,
    power: P,
    enable: Option<EN>,
    reset: Option<RST>,
    backlight: Option<BL>,
}

impl<'d, T> Builder<'d, T, NoPower, NoPin, NoPin, NoBacklight>
where
    T: CommandTransport,
{
    #[must_use]
    pub fn new(descriptor: impl Into<Cow<'d, PanelDescriptor>>, transport: T) -> Self {
        Self {
            descriptor: descriptor.into(),
            transport,
            power: NoPower,
            enable: None,
            reset: None,
            backlight: None,
        }
    }
}

impl<'d, T, P, EN, RST, BL> Builder<'d, T, P, EN, RST, BL>
where
    T: CommandTransport,
    P: PowerControl,
    EN: OutputPin,
    RST: OutputPin,
    BL: Backlight,
{
    #[must_use]
    pub fn power<P2: PowerControl>(self, power: P2) -> Builder<'d, T, P2, EN, RST, BL> {
        Builder {
            descriptor: self.descriptor,
            transport: self.transport,
            power,
            enable: self.enable,
            reset: self.reset,
            backlight: self.backlight,
        }
    }

    #[must_use]
    pub fn enable_pin<EN2: OutputPin>(self, enable: EN2) -> Builder<'d, T, P, EN2, RST, BL> {
        Builder {
            descriptor: self.descriptor,
            transport: self.transport,
            power: self.power,
            enable: Some(enable),
            reset: self.reset,
            backlight: self.backlight,
        }
    }

    #[must_use]
    pub fn reset_pin<RST2: OutputPin>(self, reset: RST2) -> Builder<'d, T, P, EN, RST2, BL> {
        Builder {
            descriptor: self.descriptor,
            transport: self.transport,
            power: self.power,
            enable: self.enable,
            reset: Some(reset),
            backlight: self.backlight,
        }
    }

    #[must_use]
    pub fn backlight<BL2: Backlight>(self, backlight: BL2) -> Builder<'d, T, P, EN, RST, BL2> {
        Builder {
            descriptor: self.descriptor,
            transport: self.transport,
            power: self.power,
            enable: self.enable,
            reset: self.reset,
            backlight: Some(backlight),
        }
    }

    /// Builds an unprepared panel. No hardware is touched.
    pub fn build(self) -> Panel<'d, T, P, EN, RST, BL> {
        Panel {
            descriptor: self.descriptor,
            transport: self.transport,
            power: self.power,
            enable_gpio: self.enable,
            reset_gpio: self.reset,
            backlight: self.backlight,
            prepared: false,
            enabled: false,
            last_fault: None,
        }
    }
}

/// Placeholder for an absent GPIO.
pub enum NoPin {}

impl digital::OutputPin for NoPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        match *self {}
    }
    fn set_high(&mut self) -> Result<(), Self::Error> {
        match *self {}
    }
}

impl digital::ErrorType for NoPin {
    type Error = core::convert::Infallible;
}
