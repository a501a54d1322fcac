use embedded_hal::digital::{OutputPin, PinState};
use embedded_hal_async::delay::DelayNs;

use super::{panel_sleep, CommandTransport, TransmitError, TransmitReport, TransportKind};
use crate::command::CommandSequence;

/// Half period of the bit-banged clock in µs.
const HALF_PERIOD_US: u32 = 10;

/// Framing of a single SPI word, taken from the command opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpiFrame {
    /// 3-line 9-bit, leading bit low.
    Command,
    /// 3-line 9-bit, leading bit high.
    Data,
    /// 4-line 8-bit, no leading bit.
    Raw,
}

impl From<u8> for SpiFrame {
    fn from(opcode: u8) -> Self {
        match opcode {
            0 => Self::Command,
            1 => Self::Data,
            _ => Self::Raw,
        }
    }
}

/// Value carried by a command payload.
///
/// Two byte payloads are read big endian, anything else uses the first byte.
pub fn spi_value(payload: &[u8]) -> Option<u16> {
    match payload {
        [] => None,
        [hi, lo] => Some(u16::from_be_bytes([*hi, *lo])),
        [b, ..] => Some(u16::from(*b)),
    }
}

/// Bit-banged 3-wire SPI transport.
pub struct SpiTransport<SDI, SCL, CS> {
    sdi: SDI,
    scl: SCL,
    cs: Option<CS>,
}

fn drive<P: OutputPin>(pin: &mut P, level: bool) {
    // GPIO writes are not expected to fail on this path
    pin.set_state(PinState::from(level)).ok();
}

impl<SDI, SCL, CS> SpiTransport<SDI, SCL, CS>
where
    SDI: OutputPin,
    SCL: OutputPin,
    CS: OutputPin,
{
    /// Create new transport, parking all lines high.
    pub fn new(mut sdi: SDI, mut scl: SCL, mut cs: Option<CS>) -> Self {
        if let Some(cs) = cs.as_mut() {
            drive(cs, true);
        }
        drive(&mut sdi, true);
        drive(&mut scl, true);

        Self { sdi, scl, cs }
    }

    /// Release the pins back, deconstructing the transport
    pub fn release(self) -> (SDI, SCL, Option<CS>) {
        (self.sdi, self.scl, self.cs)
    }

    async fn clock_bit<D: DelayNs>(&mut self, level: bool, delay: &mut D) {
        drive(&mut self.sdi, level);
        drive(&mut self.scl, false);
        delay.delay_us(HALF_PERIOD_US).await;
        drive(&mut self.scl, true);
        delay.delay_us(HALF_PERIOD_US).await;
    }

    /// Clocks out one word. Only the low eight bits of `value` reach the wire.
    pub async fn write_word<D: DelayNs>(&mut self, frame: SpiFrame, value: u16, delay: &mut D) {
        if let Some(cs) = self.cs.as_mut() {
            drive(cs, false);
        }

        match frame {
            SpiFrame::Command => self.clock_bit(false, delay).await,
            SpiFrame::Data => self.clock_bit(true, delay).await,
            SpiFrame::Raw => {}
        }

        for bit in (0..8).rev() {
            self.clock_bit(value & (1 << bit) != 0, delay).await;
        }

        if let Some(cs) = self.cs.as_mut() {
            drive(cs, true);
        }
    }
}

impl<SDI, SCL, CS> CommandTransport for SpiTransport<SDI, SCL, CS>
where
    SDI: OutputPin,
    SCL: OutputPin,
    CS: OutputPin,
{
    fn kind(&self) -> TransportKind {
        TransportKind::Spi
    }

    async fn transmit<D: DelayNs>(
        &mut self,
        seq: &CommandSequence,
        delay: &mut D,
    ) -> Result<TransmitReport, TransmitError> {
        let mut report = TransmitReport::default();

        for (index, cmd) in seq.iter().enumerate() {
            match spi_value(cmd.payload()) {
                Some(value) => {
                    self.write_word(SpiFrame::from(cmd.opcode()), value, delay)
                        .await;
                    report.sent += 1;
                }
                None => {
                    log::warn!("skipping spi cmd {index} without payload");
                    report.failed += 1;
                }
            }

            panel_sleep(delay, u32::from(cmd.delay_ms())).await;
        }

        Ok(report)
    }
}
