//! Device chrome: orientation lock and status bar.
//!
//! Best effort. Failures are reported but never roll back the fullscreen
//! flag.

use crate::error::ChromeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Portrait,
    Landscape,
}

pub trait DeviceChrome {
    fn lock_orientation(&mut self, orientation: Orientation) -> Result<(), ChromeError>;

    fn set_status_bar_hidden(&mut self, hidden: bool) -> Result<(), ChromeError>;
}

/// For hosts without orientation or a status bar.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoChrome;

impl DeviceChrome for NoChrome {
    fn lock_orientation(&mut self, _orientation: Orientation) -> Result<(), ChromeError> {
        Ok(())
    }

    fn set_status_bar_hidden(&mut self, _hidden: bool) -> Result<(), ChromeError> {
        Ok(())
    }
}
