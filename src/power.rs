//! Supplies and backlight.

use core::convert::Infallible;
use core::fmt;

/// A single voltage regulator.
pub trait Regulator {
    /// Error type
    type Error: core::fmt::Debug;

    fn enable(&mut self) -> Result<(), Self::Error>;

    fn disable(&mut self) -> Result<(), Self::Error>;

    /// Current hardware state of the output.
    fn is_enabled(&mut self) -> bool;
}

impl<T: Regulator + ?Sized> Regulator for &mut T {
    type Error = T::Error;

    fn enable(&mut self) -> Result<(), Self::Error> {
        T::enable(self)
    }

    fn disable(&mut self) -> Result<(), Self::Error> {
        T::disable(self)
    }

    fn is_enabled(&mut self) -> bool {
        T::is_enabled(self)
    }
}

/// A group of regulators switched together.
///
/// Members are enabled in order and disabled in reverse order. If enabling a
/// member fails, the members enabled before it are switched off again.
pub struct RegulatorBulk<R, const N: usize> {
    supplies: [R; N],
}

impl<R, const N: usize> RegulatorBulk<R, N>
where
    R: Regulator,
{
    pub fn new(supplies: [R; N]) -> Self {
        Self { supplies }
    }

    pub fn release(self) -> [R; N] {
        self.supplies
    }
}

impl<R, const N: usize> Regulator for RegulatorBulk<R, N>
where
    R: Regulator,
{
    type Error = R::Error;

    fn enable(&mut self) -> Result<(), Self::Error> {
        for i in 0..N {
            if let Err(e) = self.supplies[i].enable() {
                for enabled in self.supplies[..i].iter_mut().rev() {
                    enabled.disable().ok();
                }
                return Err(e);
            }
        }
        Ok(())
    }

    fn disable(&mut self) -> Result<(), Self::Error> {
        let mut result = Ok(());
        for supply in self.supplies.iter_mut().rev() {
            if let Err(e) = supply.disable() {
                result = Err(e);
            }
        }
        result
    }

    fn is_enabled(&mut self) -> bool {
        self.supplies.iter_mut().all(|s| s.is_enabled())
    }
}

/// Placeholder for panels with no controllable supply.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRegulator;

impl Regulator for NoRegulator {
    type Error = Infallible;

    fn enable(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn disable(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn is_enabled(&mut self) -> bool {
        false
    }
}

/// Error switching panel supplies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerError<E> {
    /// The bulk (`vsp`/`vsn`) group failed.
    Bulk(E),
    /// The main `power` supply failed.
    Main(E),
}

impl<E: fmt::Debug> fmt::Display for PowerError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bulk(e) => write!(f, "failed to switch bulk supplies: {e:?}"),
            Self::Main(e) => write!(f, "failed to switch power supply: {e:?}"),
        }
    }
}

/// Switches the supplies of a panel as one unit.
pub trait PowerControl {
    /// Error type
    type Error: core::fmt::Debug;

    fn enable_supplies(&mut self) -> Result<(), PowerError<Self::Error>>;

    fn disable_supplies(&mut self) -> Result<(), PowerError<Self::Error>>;
}

/// Panel without controllable supplies.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPower;

impl PowerControl for NoPower {
    type Error = Infallible;

    fn enable_supplies(&mut self) -> Result<(), PowerError<Self::Error>> {
        Ok(())
    }

    fn disable_supplies(&mut self) -> Result<(), PowerError<Self::Error>> {
        Ok(())
    }
}

/// Bulk supplies plus the main `power` supply.
///
/// With `invert` set, the main supply is driven opposite to the bulk group:
/// it is switched off while the panel is powered and back on when the panel
/// is powered down, before the bulk group goes off.
pub struct PowerRails<B, R> {
    bulk: B,
    main: R,
    invert: bool,
}

impl<B, R> PowerRails<B, R>
where
    B: Regulator,
    R: Regulator<Error = B::Error>,
{
    pub fn new(bulk: B, main: R) -> Self {
        Self {
            bulk,
            main,
            invert: false,
        }
    }

    /// Drive the main supply with inverted polarity.
    #[must_use]
    pub fn inverted(mut self, invert: bool) -> Self {
        self.invert = invert;
        self
    }

    pub fn is_inverted(&self) -> bool {
        self.invert
    }

    pub fn release(self) -> (B, R) {
        (self.bulk, self.main)
    }
}

impl<B, R> PowerControl for PowerRails<B, R>
where
    B: Regulator,
    R: Regulator<Error = B::Error>,
{
    type Error = B::Error;

    fn enable_supplies(&mut self) -> Result<(), PowerError<Self::Error>> {
        self.bulk.enable().map_err(PowerError::Bulk)?;

        if self.invert {
            if self.main.is_enabled() {
                if let Err(e) = self.main.disable() {
                    log::warn!("failed to disable inverted power supply: {e:?}");
                }
            }
        } else {
            self.main.enable().map_err(PowerError::Main)?;
        }

        Ok(())
    }

    fn disable_supplies(&mut self) -> Result<(), PowerError<Self::Error>> {
        if self.invert {
            if !self.main.is_enabled() {
                self.main.enable().map_err(PowerError::Main)?;
            }
        } else if let Err(e) = self.main.disable() {
            log::warn!("failed to disable power supply: {e:?}");
        }

        if let Err(e) = self.bulk.disable() {
            log::warn!("failed to disable bulk supplies: {e:?}");
        }

        Ok(())
    }
}

/// Panel backlight.
pub trait Backlight {
    /// Unblank (`true`) or power down (`false`) the backlight.
    fn set_power(&mut self, on: bool);
}

impl<T: Backlight + ?Sized> Backlight for &mut T {
    fn set_power(&mut self, on: bool) {
        T::set_power(self, on)
    }
}

/// Placeholder for panels without a backlight.
pub enum NoBacklight {}

impl Backlight for NoBacklight {
    fn set_power(&mut self, _on: bool) {
        match *self {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::_mock::{Event, EventLog, MockRegulator, Supply};

    fn rails(log: &EventLog) -> PowerRails<RegulatorBulk<MockRegulator, 2>, MockRegulator> {
        PowerRails::new(
            RegulatorBulk::new([
                MockRegulator::new(log, Supply::Vsp),
                MockRegulator::new(log, Supply::Vsn),
            ]),
            MockRegulator::new(log, Supply::Power),
        )
    }

    #[test]
    fn normal_polarity() {
        let log = EventLog::default();
        let mut power = rails(&log);

        power.enable_supplies().unwrap();
        power.disable_supplies().unwrap();

        assert_eq!(
            log.take(),
            [
                Event::Supply(Supply::Vsp, true),
                Event::Supply(Supply::Vsn, true),
                Event::Supply(Supply::Power, true),
                Event::Supply(Supply::Power, false),
                Event::Supply(Supply::Vsn, false),
                Event::Supply(Supply::Vsp, false),
            ]
        );
    }

    #[test]
    fn inverted_polarity_normalizes_main_before_bulk_teardown() {
        let log = EventLog::default();
        let mut power = rails(&log).inverted(true);
        // left on by the bootloader
        power.main.force_state(true);

        power.enable_supplies().unwrap();
        power.disable_supplies().unwrap();

        assert_eq!(
            log.take(),
            [
                Event::Supply(Supply::Vsp, true),
                Event::Supply(Supply::Vsn, true),
                Event::Supply(Supply::Power, false),
                Event::Supply(Supply::Power, true),
                Event::Supply(Supply::Vsn, false),
                Event::Supply(Supply::Vsp, false),
            ]
        );
    }

    #[test]
    fn inverted_polarity_rechecks_main_state() {
        let log = EventLog::default();
        let mut power = rails(&log).inverted(true);

        // main already off: nothing to switch on enable
        power.enable_supplies().unwrap();
        power.main.force_state(true);
        // main already on: nothing to switch on disable
        power.disable_supplies().unwrap();

        assert_eq!(
            log.take(),
            [
                Event::Supply(Supply::Vsp, true),
                Event::Supply(Supply::Vsn, true),
                Event::Supply(Supply::Vsn, false),
                Event::Supply(Supply::Vsp, false),
            ]
        );
    }

    #[test]
    fn bulk_failure_rolls_back() {
        let log = EventLog::default();
        let mut vsn = MockRegulator::new(&log, Supply::Vsn);
        vsn.fail_enable();
        let mut power = PowerRails::new(
            RegulatorBulk::new([MockRegulator::new(&log, Supply::Vsp), vsn]),
            MockRegulator::new(&log, Supply::Power),
        );

        assert!(matches!(
            power.enable_supplies(),
            Err(PowerError::Bulk(_))
        ));
        assert_eq!(
            log.take(),
            [
                Event::Supply(Supply::Vsp, true),
                Event::Supply(Supply::Vsp, false),
            ]
        );
    }
}
