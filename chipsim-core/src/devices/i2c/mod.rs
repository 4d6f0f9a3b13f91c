use crate::devices::prelude::*;

use crate::bus::I2COp;

pub mod devices;
pub mod prelude;

/// A device living on an I2C bus. The bus controller drives every callback;
/// devices never initiate a transaction on their own.
pub trait I2CDevice: Device {
    /// Called when the controller addresses the bus. Returns `true` if the
    /// device participates in the transaction.
    fn connect(&mut self, addr: u8, op: I2COp) -> bool;
    fn read(&mut self) -> BusResult<u8>;
    /// Returns `true` to acknowledge the byte.
    fn write(&mut self, data: u8) -> BusResult<bool>;
}

impl Device for Box<dyn I2CDevice> {
    fn kind(&self) -> &'static str {
        (**self).kind()
    }

    fn label(&self) -> Option<&'static str> {
        (**self).label()
    }

    fn probe(&self, offset: u32) -> Probe<'_> {
        (**self).probe(offset)
    }
}
