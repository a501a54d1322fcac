#![cfg_attr(not(test), no_std)]
#![allow(async_fn_in_trait)]

//! This crate provides a generic asynchronous power and timing sequencer for
//! simple display panels.
//!
//! A panel model is described by a [`PanelDescriptor`](descriptor::PanelDescriptor):
//! its modes, power sequencing delays and optional init/exit command
//! sequences. Descriptors come from the built-in [`models`] table, from
//! device-tree style properties ([`of`]) or from a panel EEPROM
//! ([`firmware`], behind the `firmware` feature).
//!
//! A [`Panel`] drives one physical panel through the four lifecycle
//! transitions `prepare`, `enable`, `disable` and `unprepare`, sending the
//! command sequences over DSI, bit-banged SPI or an MCU bridge.
//!
//! ## Example
//! ```rust,ignore
//! let mut panel = Builder::new(&models::AUO_G070VVN01, NoTransport)
//!     .power(rails)
//!     .enable_pin(enable)
//!     .reset_pin(reset)
//!     .backlight(backlight)
//!     .build();
//!
//! panel.prepare(&mut delay).await?;
//! panel.enable(&mut delay).await;
//! ```

extern crate alloc;

use alloc::borrow::Cow;

use embedded_hal::digital::OutputPin;
use embedded_hal_async::delay::DelayNs;

pub mod command;
pub mod descriptor;
pub mod interface;
pub mod models;
pub mod nvmem;
pub mod of;
pub mod power;
pub mod probe;

#[cfg(feature = "firmware")]
pub mod firmware;

mod builder;
pub use builder::*;

#[cfg(test)]
mod _mock;

use descriptor::{DisplayMode, DisplayTiming, PanelDescriptor, SequenceKind};
use interface::{panel_sleep, CommandTransport, TransmitError, TransportKind};
use power::{Backlight, PowerControl, PowerError};

/// A command sequence that did not go through cleanly.
///
/// Lifecycle transitions never fail because of the command channel; the last
/// such problem is kept here instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceFault {
    pub kind: SequenceKind,
    /// Set if the sequence was aborted.
    pub error: Option<TransmitError>,
    /// Commands that failed or were skipped.
    pub failed: usize,
}

/// Panel driver structure.
pub struct Panel<'d, T, P, EN, RST, BL> {
    descriptor: Cow<'d, PanelDescriptor>,
    transport: T,
    power: P,
    enable_gpio: Option<EN>,
    reset_gpio: Option<RST>,
    backlight: Option<BL>,
    prepared: bool,
    enabled: bool,
    last_fault: Option<SequenceFault>,
}

fn drive<PIN: OutputPin>(pin: &mut Option<PIN>, high: bool, name: &str) {
    if let Some(pin) = pin {
        let result = if high { pin.set_high() } else { pin.set_low() };
        if let Err(e) = result {
            log::warn!("failed to drive {name} gpio: {e:?}");
        }
    }
}

impl<'d, T, P, EN, RST, BL> Panel<'d, T, P, EN, RST, BL>
where
    T: CommandTransport,
    P: PowerControl,
    EN: OutputPin,
    RST: OutputPin,
    BL: Backlight,
{
    /// Powers the panel up and sends the init sequence.
    ///
    /// On an MCU transport the init sequence is sent by [`Self::enable`]
    /// instead. Only a supply failure is reported, the panel then stays
    /// unprepared.
    pub async fn prepare<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), PowerError<P::Error>> {
        if self.prepared {
            return Ok(());
        }

        self.power.enable_supplies().map_err(|e| {
            log::error!("failed to enable supply: {e}");
            e
        })?;

        let ms = self.descriptor.delay;
        drive(&mut self.enable_gpio, true, "enable");
        panel_sleep(delay, ms.prepare).await;

        drive(&mut self.reset_gpio, true, "reset");
        panel_sleep(delay, ms.reset).await;
        drive(&mut self.reset_gpio, false, "reset");
        panel_sleep(delay, ms.init).await;

        if self.sends_on_prepare() {
            self.send_sequence(SequenceKind::Init, delay).await;
        }

        self.prepared = true;
        log::debug!("panel prepared");
        Ok(())
    }

    /// Turns the display on.
    ///
    /// Does nothing if the panel is not prepared.
    pub async fn enable<D: DelayNs>(&mut self, delay: &mut D) {
        if self.enabled {
            return;
        }
        if !self.prepared {
            log::warn!("enable requested on an unprepared panel");
            return;
        }

        if self.transport.kind() == TransportKind::Mcu {
            self.send_sequence(SequenceKind::Init, delay).await;
        }

        panel_sleep(delay, self.descriptor.delay.enable).await;

        if let Some(backlight) = self.backlight.as_mut() {
            backlight.set_power(true);
        }

        self.enabled = true;
        log::debug!("panel enabled");
    }

    /// Turns the display off.
    pub async fn disable<D: DelayNs>(&mut self, delay: &mut D) {
        if !self.enabled {
            return;
        }

        if let Some(backlight) = self.backlight.as_mut() {
            backlight.set_power(false);
        }

        panel_sleep(delay, self.descriptor.delay.disable).await;

        if self.transport.kind() == TransportKind::Mcu {
            self.send_sequence(SequenceKind::Exit, delay).await;
        }

        self.enabled = false;
        log::debug!("panel disabled");
    }

    /// Sends the exit sequence and powers the panel down.
    ///
    /// An enabled panel is disabled first.
    pub async fn unprepare<D: DelayNs>(&mut self, delay: &mut D) {
        if !self.prepared {
            return;
        }
        if self.enabled {
            self.disable(delay).await;
        }

        if self.sends_on_prepare() {
            self.send_sequence(SequenceKind::Exit, delay).await;
        }

        drive(&mut self.reset_gpio, true, "reset");
        drive(&mut self.enable_gpio, false, "enable");

        if let Err(e) = self.power.disable_supplies() {
            log::warn!("failed to disable supply: {e}");
        }

        panel_sleep(delay, self.descriptor.delay.unprepare).await;

        self.prepared = false;
        log::debug!("panel unprepared");
    }

    /// Takes over a panel the bootloader left running.
    ///
    /// With `on` set, the supplies are enabled so their use counts match the
    /// hardware state, and the panel is marked prepared and enabled without
    /// sending anything. With `on` cleared this does nothing.
    pub fn loader_protect(&mut self, on: bool) -> Result<(), PowerError<P::Error>> {
        if on {
            self.power.enable_supplies().map_err(|e| {
                log::error!("failed to enable supply: {e}");
                e
            })?;
            self.prepared = true;
            self.enabled = true;
        }
        Ok(())
    }

    /// Quiesces the panel for system shutdown.
    ///
    /// The panel is disabled, then, if prepared, held in reset with its
    /// supplies off. The exit sequence is not sent and the panel is still
    /// reported as prepared afterwards.
    pub async fn shutdown<D: DelayNs>(&mut self, delay: &mut D) {
        self.disable(delay).await;

        if self.prepared {
            drive(&mut self.reset_gpio, true, "reset");
            drive(&mut self.enable_gpio, false, "enable");
            if let Err(e) = self.power.disable_supplies() {
                log::warn!("failed to disable supply: {e}");
            }
        }
    }

    /// Powers the panel down, detaches a DSI link and releases the parts.
    pub async fn remove<D: DelayNs>(
        mut self,
        delay: &mut D,
    ) -> (T, P, Option<EN>, Option<RST>, Option<BL>) {
        self.disable(delay).await;
        self.unprepare(delay).await;
        self.transport.detach();
        self.release()
    }

    /// Releases the transport, supplies, GPIOs and backlight.
    pub fn release(self) -> (T, P, Option<EN>, Option<RST>, Option<BL>) {
        (
            self.transport,
            self.power,
            self.enable_gpio,
            self.reset_gpio,
            self.backlight,
        )
    }

    /// Fixed modes of the panel, preferred first.
    pub fn modes(&self) -> &[DisplayMode] {
        &self.descriptor.modes
    }

    /// Copies up to `out.len()` timing ranges into `out` and returns how
    /// many the panel has in total.
    pub fn timings(&self, out: &mut [DisplayTiming]) -> usize {
        let timings = &self.descriptor.timings;
        for (dst, src) in out.iter_mut().zip(timings.iter()) {
            *dst = *src;
        }
        timings.len()
    }

    pub fn descriptor(&self) -> &PanelDescriptor {
        &self.descriptor
    }

    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Most recent command sequence problem, if any.
    pub fn last_fault(&self) -> Option<SequenceFault> {
        self.last_fault
    }

    pub fn transport_kind(&self) -> TransportKind {
        self.transport.kind()
    }

    fn sends_on_prepare(&self) -> bool {
        matches!(
            self.transport.kind(),
            TransportKind::Dsi | TransportKind::Spi
        )
    }

    async fn send_sequence<D: DelayNs>(&mut self, kind: SequenceKind, delay: &mut D) {
        let seq = match kind {
            SequenceKind::Init => self.descriptor.init_seq.as_ref(),
            SequenceKind::Exit => self.descriptor.exit_seq.as_ref(),
        };
        let Some(seq) = seq else {
            return;
        };

        match self.transport.transmit(seq, delay).await {
            Ok(report) if report.is_clean() => {}
            Ok(report) => {
                log::warn!("{} {kind} commands failed or were skipped", report.failed);
                self.last_fault = Some(SequenceFault {
                    kind,
                    error: None,
                    failed: report.failed,
                });
            }
            Err(e) => {
                log::error!("failed to send {kind} sequence: {e}");
                self.last_fault = Some(SequenceFault {
                    kind,
                    error: Some(e),
                    failed: 0,
                });
            }
        }
    }
}
