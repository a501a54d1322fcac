//! Command transports.
//!
//! Every transport replays a parsed [`CommandSequence`] over its own wire and
//! honours the per-command delays in between.

mod dsi;
pub use dsi::*;

mod spi;
pub use spi::*;

mod mcu;
pub use mcu::*;

use core::fmt;

use embedded_hal::digital::OutputPin;
use embedded_hal_async::delay::DelayNs;

use crate::command::CommandSequence;

/// Kind of transport a panel is driven over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// MIPI-DSI generic / DCS writes.
    Dsi,
    /// Bit-banged 3-wire SPI.
    Spi,
    /// Display controller MCU interface in bypass mode.
    Mcu,
    /// No command channel, sequences are not sent.
    None,
}

impl TransportKind {
    /// Parses a `cmd-type` string.
    ///
    /// Strings starting with `spi` or `mcu` select those transports, anything
    /// else selects the default of the bus the panel sits on.
    pub fn from_cmd_type(s: &str) -> Self {
        if s.starts_with("spi") {
            Self::Spi
        } else if s.starts_with("mcu") {
            Self::Mcu
        } else {
            Self::None
        }
    }
}

/// Outcome of a transmit call that ran to the end of the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransmitReport {
    /// Commands handed to the wire.
    pub sent: usize,
    /// Commands whose write failed or that were skipped for lack of a
    /// payload. These are logged and not retried.
    pub failed: usize,
}

impl TransmitReport {
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

/// Error aborting a transmit call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransmitError {
    /// The opcode of command `index` is not understood by the transport.
    /// Commands after it were not sent.
    UnsupportedCommand { index: usize, opcode: u8 },
}

impl fmt::Display for TransmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedCommand { index, opcode } => {
                write!(f, "unsupported command type {opcode:#04x} at index {index}")
            }
        }
    }
}

/// A channel able to replay a command sequence.
pub trait CommandTransport {
    /// Kind of this transport.
    fn kind(&self) -> TransportKind;

    /// Drops the transport's link to the panel. Failures are logged.
    fn detach(&mut self) {}

    /// Sends all commands of `seq` in order, sleeping for each command's
    /// delay after it has been sent.
    async fn transmit<D: DelayNs>(
        &mut self,
        seq: &CommandSequence,
        delay: &mut D,
    ) -> Result<TransmitReport, TransmitError>;
}

impl<T: CommandTransport + ?Sized> CommandTransport for &mut T {
    fn kind(&self) -> TransportKind {
        T::kind(self)
    }

    fn detach(&mut self) {
        T::detach(self)
    }

    async fn transmit<D: DelayNs>(
        &mut self,
        seq: &CommandSequence,
        delay: &mut D,
    ) -> Result<TransmitReport, TransmitError> {
        T::transmit(self, seq, delay).await
    }
}

/// Sleeps for `ms` milliseconds.
///
/// Short waits (up to 20 ms) go through the microsecond delay, longer ones
/// through the millisecond delay. Zero does not touch the delay at all.
pub async fn panel_sleep<D: DelayNs>(delay: &mut D, ms: u32) {
    match ms {
        0 => {}
        1..=20 => delay.delay_us(ms * 1000).await,
        _ => delay.delay_ms(ms).await,
    }
}

/// Transport for panels without a command channel.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTransport;

impl CommandTransport for NoTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::None
    }

    async fn transmit<D: DelayNs>(
        &mut self,
        _seq: &CommandSequence,
        _delay: &mut D,
    ) -> Result<TransmitReport, TransmitError> {
        Ok(TransmitReport::default())
    }
}

/// Transport selected at runtime.
///
/// Unused variants can be filled with [`NoDsi`], [`NoMcu`] and
/// [`NoPin`](crate::NoPin).
pub enum Transport<H, SDI, SCL, CS, M> {
    Dsi(DsiTransport<H>),
    Spi(SpiTransport<SDI, SCL, CS>),
    Mcu(McuTransport<M>),
    None,
}

impl<H, SDI, SCL, CS, M> CommandTransport for Transport<H, SDI, SCL, CS, M>
where
    H: DsiHost,
    SDI: OutputPin,
    SCL: OutputPin,
    CS: OutputPin,
    M: McuBridge,
{
    fn kind(&self) -> TransportKind {
        match self {
            Self::Dsi(_) => TransportKind::Dsi,
            Self::Spi(_) => TransportKind::Spi,
            Self::Mcu(_) => TransportKind::Mcu,
            Self::None => TransportKind::None,
        }
    }

    fn detach(&mut self) {
        if let Self::Dsi(dsi) = self {
            dsi.detach();
        }
    }

    async fn transmit<D: DelayNs>(
        &mut self,
        seq: &CommandSequence,
        delay: &mut D,
    ) -> Result<TransmitReport, TransmitError> {
        match self {
            Self::Dsi(dsi) => dsi.transmit(seq, delay).await,
            Self::Spi(spi) => spi.transmit(seq, delay).await,
            Self::Mcu(mcu) => mcu.transmit(seq, delay).await,
            Self::None => NoTransport.transmit(seq, delay).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;
    use crate::_mock::{Event, EventLog, MockDelay};

    #[test]
    fn sleep_tiers() {
        let log = EventLog::default();
        let mut delay = MockDelay::new(&log);

        block_on(async {
            panel_sleep(&mut delay, 0).await;
            panel_sleep(&mut delay, 15).await;
            panel_sleep(&mut delay, 20).await;
            panel_sleep(&mut delay, 25).await;
        });

        assert_eq!(
            log.take(),
            [
                Event::DelayUs(15_000),
                Event::DelayUs(20_000),
                Event::DelayMs(25),
            ]
        );
    }

    #[test]
    fn cmd_type_strings() {
        assert_eq!(TransportKind::from_cmd_type("spi"), TransportKind::Spi);
        assert_eq!(TransportKind::from_cmd_type("spi-3wire"), TransportKind::Spi);
        assert_eq!(TransportKind::from_cmd_type("mcu"), TransportKind::Mcu);
        assert_eq!(TransportKind::from_cmd_type("default"), TransportKind::None);
        assert_eq!(TransportKind::from_cmd_type(""), TransportKind::None);
    }

    #[test]
    fn no_transport_sends_nothing() {
        let log = EventLog::default();
        let mut delay = MockDelay::new(&log);
        let seq = CommandSequence::parse(&[0x05, 50, 1, 0x11]).unwrap();

        let report = block_on(NoTransport.transmit(&seq, &mut delay)).unwrap();

        assert_eq!(report, TransmitReport::default());
        assert!(log.take().is_empty());
    }
}
