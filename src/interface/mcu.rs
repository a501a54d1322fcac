use embedded_hal_async::delay::DelayNs;

use super::{panel_sleep, CommandTransport, TransmitError, TransmitReport, TransportKind};
use crate::command::CommandSequence;

/// Reserved MCU bridge operations.
pub mod mcu_op {
    /// Write a command byte.
    pub const WRCMD: u8 = 0;
    /// Write a data byte.
    pub const WRDATA: u8 = 1;
    /// Enter (`1`) or leave (`0`) bypass mode.
    pub const SETBYPASS: u8 = 2;
}

/// Command injection path of a display controller's MCU interface.
pub trait McuBridge {
    fn send_mcu_command(&mut self, op: u8, value: u32);
}

impl<T: McuBridge + ?Sized> McuBridge for &mut T {
    fn send_mcu_command(&mut self, op: u8, value: u32) {
        T::send_mcu_command(self, op, value)
    }
}

/// Placeholder for a [`Transport`](super::Transport) without an MCU bridge.
pub enum NoMcu {}

impl McuBridge for NoMcu {
    fn send_mcu_command(&mut self, _op: u8, _value: u32) {
        match *self {}
    }
}

/// Sends command sequences through an MCU bridge, bracketed by bypass mode.
pub struct McuTransport<M> {
    bridge: M,
}

impl<M> McuTransport<M>
where
    M: McuBridge,
{
    pub fn new(bridge: M) -> Self {
        Self { bridge }
    }

    pub fn release(self) -> M {
        self.bridge
    }
}

impl<M> CommandTransport for McuTransport<M>
where
    M: McuBridge,
{
    fn kind(&self) -> TransportKind {
        TransportKind::Mcu
    }

    async fn transmit<D: DelayNs>(
        &mut self,
        seq: &CommandSequence,
        delay: &mut D,
    ) -> Result<TransmitReport, TransmitError> {
        let mut report = TransmitReport::default();

        self.bridge.send_mcu_command(mcu_op::SETBYPASS, 1);
        for (index, cmd) in seq.iter().enumerate() {
            match cmd.payload().first() {
                Some(&value) => {
                    self.bridge.send_mcu_command(cmd.opcode(), u32::from(value));
                    report.sent += 1;
                }
                None => {
                    log::warn!("skipping mcu cmd {index} without payload");
                    report.failed += 1;
                }
            }

            panel_sleep(delay, u32::from(cmd.delay_ms())).await;
        }
        self.bridge.send_mcu_command(mcu_op::SETBYPASS, 0);

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;
    use crate::_mock::{Event, EventLog, MockDelay, MockMcu};

    #[test]
    fn brackets_sequence_in_bypass_mode() {
        let log = EventLog::default();
        let mut delay = MockDelay::new(&log);
        let mut mcu = McuTransport::new(MockMcu::new(&log));
        let seq = CommandSequence::parse(&[
            mcu_op::WRCMD, 0, 1, 0x11, //
            mcu_op::WRDATA, 50, 2, 0x29, 0xFF,
        ])
        .unwrap();

        let report = block_on(mcu.transmit(&seq, &mut delay)).unwrap();

        assert_eq!(report.sent, 2);
        assert_eq!(
            log.take(),
            [
                Event::Mcu(mcu_op::SETBYPASS, 1),
                Event::Mcu(mcu_op::WRCMD, 0x11),
                Event::Mcu(mcu_op::WRDATA, 0x29),
                Event::DelayMs(50),
                Event::Mcu(mcu_op::SETBYPASS, 0),
            ]
        );
    }

    #[test]
    fn empty_payload_is_skipped_and_counted() {
        let log = EventLog::default();
        let mut delay = MockDelay::new(&log);
        let mut mcu = McuTransport::new(MockMcu::new(&log));
        let seq = CommandSequence::parse(&[
            mcu_op::WRCMD, 10, 0, //
            mcu_op::WRCMD, 0, 1, 0x29,
        ])
        .unwrap();

        let report = block_on(mcu.transmit(&seq, &mut delay)).unwrap();

        assert_eq!(report, TransmitReport { sent: 1, failed: 1 });
        assert_eq!(
            log.take(),
            [
                Event::Mcu(mcu_op::SETBYPASS, 1),
                Event::DelayUs(10_000),
                Event::Mcu(mcu_op::WRCMD, 0x29),
                Event::Mcu(mcu_op::SETBYPASS, 0),
            ]
        );
    }

    #[test]
    fn empty_sequence_still_toggles_bypass() {
        let log = EventLog::default();
        let mut delay = MockDelay::new(&log);
        let mut mcu = McuTransport::new(MockMcu::new(&log));

        block_on(mcu.transmit(&CommandSequence::EMPTY, &mut delay)).unwrap();

        assert_eq!(
            log.take(),
            [
                Event::Mcu(mcu_op::SETBYPASS, 1),
                Event::Mcu(mcu_op::SETBYPASS, 0),
            ]
        );
    }
}
