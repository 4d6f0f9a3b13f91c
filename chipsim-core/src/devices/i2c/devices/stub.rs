use crate::devices::i2c::prelude::*;

/// Generic stub i2c device. Accepts every transaction addressed to it, but
/// reads/writes result in Error-level StubRead/StubWrites.
///
/// Stands in for chips that are wired onto a board but not emulated yet.
#[derive(Debug)]
pub struct Stub {
    label: &'static str,
}

impl Stub {
    pub fn new(label: &'static str) -> Stub {
        Stub { label }
    }
}

impl Device for Stub {
    fn kind(&self) -> &'static str {
        "Stub"
    }

    fn label(&self) -> Option<&'static str> {
        Some(self.label)
    }

    fn probe(&self, _offset: u32) -> Probe<'_> {
        Probe::Unmapped
    }
}

impl I2CDevice for Stub {
    fn connect(&mut self, _addr: u8, _op: I2COp) -> bool {
        true
    }

    fn read(&mut self) -> BusResult<u8> {
        Err(StubRead(Error, 0))
    }

    fn write(&mut self, _data: u8) -> BusResult<bool> {
        Err(StubWrite(Error, ()))
    }
}
