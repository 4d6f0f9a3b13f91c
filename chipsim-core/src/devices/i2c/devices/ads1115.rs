use crate::devices::i2c::prelude::*;

use crate::pins::{PinBank, PinError, PinLevel, PinMode};

/// Fixed 7-bit bus address (ADDR pin tied to GND).
pub const ADDRESS: u8 = 0x48;

const_assert!(ADDRESS < 0x80);

/// Value produced by the default conversion step.
pub const DEFAULT_CONVERSION: u16 = 1234;

/// Produces a conversion result from the contents of the config register.
///
/// Invoked exactly once per bus read.
pub trait Converter {
    fn convert(&mut self, config: u8) -> u16;
}

impl<F> Converter for F
where
    F: FnMut(u8) -> u16,
{
    fn convert(&mut self, config: u8) -> u16 {
        self(config)
    }
}

/// Always yields the same value, regardless of configuration.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FixedConversion(pub u16);

impl Default for FixedConversion {
    fn default() -> FixedConversion {
        FixedConversion(DEFAULT_CONVERSION)
    }
}

impl Converter for FixedConversion {
    fn convert(&mut self, _config: u8) -> u16 {
        self.0
    }
}

/// ADS1115 - 16-bit I2C ADC
///
/// Only the bus-visible surface is emulated: writes land in the config
/// register verbatim, and reads return the low byte of a freshly "converted"
/// result. There is no register pointer, so every access hits one of the two
/// registers depending on the transfer direction.
pub struct Ads1115 {
    config: u8,
    conversion: u16,
    converter: Box<dyn Converter>,

    scl: PinLevel,
    sda: PinLevel,
}

impl std::fmt::Debug for Ads1115 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ads1115")
            .field("config", &self.config)
            .field("conversion", &self.conversion)
            .field("converter", &"<dyn Converter>")
            .finish()
    }
}

impl Ads1115 {
    /// Returns a new Ads1115 using the fixed default conversion value.
    pub fn new(pins: &mut PinBank) -> Result<Ads1115, PinError> {
        Ads1115::with_converter(pins, FixedConversion::default())
    }

    /// Returns a new Ads1115 with a custom conversion step. Claims the `SCL`
    /// and `SDA` pins as inputs.
    pub fn with_converter(
        pins: &mut PinBank,
        converter: impl Converter + 'static,
    ) -> Result<Ads1115, PinError> {
        Ok(Ads1115 {
            config: 0,
            conversion: 0,
            converter: Box::new(converter),

            scl: pins.init("SCL", PinMode::Input)?,
            sda: pins.init("SDA", PinMode::Input)?,
        })
    }

    /// Last byte written by the controller.
    pub fn config(&self) -> u8 {
        self.config
    }

    /// Result of the most recent conversion.
    pub fn conversion(&self) -> u16 {
        self.conversion
    }

    fn convert(&mut self) {
        self.conversion = self.converter.convert(self.config);
    }
}

impl Device for Ads1115 {
    fn kind(&self) -> &'static str {
        "Ads1115"
    }

    fn probe(&self, offset: u32) -> Probe<'_> {
        let reg = match offset {
            0x00 => "Conversion",
            0x01 => "Config",
            _ => return Probe::Unmapped,
        };

        Probe::Register(reg)
    }
}

impl I2CDevice for Ads1115 {
    fn connect(&mut self, addr: u8, op: I2COp) -> bool {
        trace!(
            target: "ADS1115",
            "connect {:#04x?} ({:?}) scl={} sda={}",
            addr,
            op,
            self.scl.is_high(),
            self.sda.is_high()
        );
        addr == ADDRESS
    }

    fn read(&mut self) -> BusResult<u8> {
        self.convert();
        Ok(self.conversion as u8)
    }

    fn write(&mut self, data: u8) -> BusResult<bool> {
        self.config = data;
        Ok(true)
    }
}
