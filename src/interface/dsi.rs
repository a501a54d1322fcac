use core::convert::Infallible;

use embedded_hal_async::delay::DelayNs;

use super::{panel_sleep, CommandTransport, TransmitError, TransmitReport, TransportKind};
use crate::command::CommandSequence;
use crate::descriptor::DsiConfig;

/// MIPI-DSI data types accepted in command sequences.
pub mod data_type {
    pub const GENERIC_SHORT_WRITE_0_PARAM: u8 = 0x03;
    pub const GENERIC_SHORT_WRITE_1_PARAM: u8 = 0x13;
    pub const GENERIC_SHORT_WRITE_2_PARAM: u8 = 0x23;
    pub const GENERIC_LONG_WRITE: u8 = 0x29;
    pub const DCS_SHORT_WRITE: u8 = 0x05;
    pub const DCS_SHORT_WRITE_PARAM: u8 = 0x15;
    pub const DCS_LONG_WRITE: u8 = 0x39;
}

/// DSI host link management and write primitives.
pub trait DsiHost {
    /// Error type
    type Error: core::fmt::Debug;

    /// Configures the link for the panel and attaches it to the host.
    fn attach(&mut self, config: &DsiConfig) -> Result<(), Self::Error>;

    /// Detaches the panel from the host.
    fn detach(&mut self) -> Result<(), Self::Error>;

    /// Sends `payload` as a generic (non-DCS) write.
    async fn generic_write(&mut self, payload: &[u8]) -> Result<(), Self::Error>;

    /// Sends `payload` as a DCS write, the first byte being the DCS command.
    async fn dcs_write_buffer(&mut self, payload: &[u8]) -> Result<(), Self::Error>;
}

impl<T: DsiHost + ?Sized> DsiHost for &mut T {
    type Error = T::Error;

    fn attach(&mut self, config: &DsiConfig) -> Result<(), Self::Error> {
        T::attach(self, config)
    }

    fn detach(&mut self) -> Result<(), Self::Error> {
        T::detach(self)
    }

    async fn generic_write(&mut self, payload: &[u8]) -> Result<(), Self::Error> {
        T::generic_write(self, payload).await
    }

    async fn dcs_write_buffer(&mut self, payload: &[u8]) -> Result<(), Self::Error> {
        T::dcs_write_buffer(self, payload).await
    }
}

/// Placeholder for a [`Transport`](super::Transport) without a DSI host.
pub enum NoDsi {}

impl DsiHost for NoDsi {
    type Error = Infallible;

    fn attach(&mut self, _config: &DsiConfig) -> Result<(), Self::Error> {
        match *self {}
    }

    fn detach(&mut self) -> Result<(), Self::Error> {
        match *self {}
    }

    async fn generic_write(&mut self, _payload: &[u8]) -> Result<(), Self::Error> {
        match *self {}
    }

    async fn dcs_write_buffer(&mut self, _payload: &[u8]) -> Result<(), Self::Error> {
        match *self {}
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DsiWrite {
    Generic,
    Dcs,
}

impl DsiWrite {
    fn from_data_type(opcode: u8) -> Option<Self> {
        use data_type::*;

        match opcode {
            GENERIC_SHORT_WRITE_0_PARAM
            | GENERIC_SHORT_WRITE_1_PARAM
            | GENERIC_SHORT_WRITE_2_PARAM
            | GENERIC_LONG_WRITE => Some(Self::Generic),
            DCS_SHORT_WRITE | DCS_SHORT_WRITE_PARAM | DCS_LONG_WRITE => Some(Self::Dcs),
            _ => None,
        }
    }
}

/// Sends command sequences through a DSI host.
pub struct DsiTransport<H> {
    host: H,
}

impl<H> DsiTransport<H>
where
    H: DsiHost,
{
    pub fn new(host: H) -> Self {
        Self { host }
    }

    /// Attaches the panel with the given link parameters.
    pub fn attach(&mut self, config: &DsiConfig) -> Result<(), H::Error> {
        self.host.attach(config)
    }

    /// Release the DSI host
    pub fn release(self) -> H {
        self.host
    }
}

impl<H> CommandTransport for DsiTransport<H>
where
    H: DsiHost,
{
    fn kind(&self) -> TransportKind {
        TransportKind::Dsi
    }

    fn detach(&mut self) {
        if let Err(e) = self.host.detach() {
            log::error!("failed to detach from DSI host: {e:?}");
        }
    }

    async fn transmit<D: DelayNs>(
        &mut self,
        seq: &CommandSequence,
        delay: &mut D,
    ) -> Result<TransmitReport, TransmitError> {
        let mut report = TransmitReport::default();

        for (index, cmd) in seq.iter().enumerate() {
            let result = match DsiWrite::from_data_type(cmd.opcode()) {
                Some(DsiWrite::Generic) => self.host.generic_write(cmd.payload()).await,
                Some(DsiWrite::Dcs) => self.host.dcs_write_buffer(cmd.payload()).await,
                None => {
                    return Err(TransmitError::UnsupportedCommand {
                        index,
                        opcode: cmd.opcode(),
                    })
                }
            };

            report.sent += 1;
            if let Err(e) = result {
                log::error!("failed to write dcs cmd {index}: {e:?}");
                report.failed += 1;
            }

            panel_sleep(delay, u32::from(cmd.delay_ms())).await;
        }

        Ok(report)
    }
}
