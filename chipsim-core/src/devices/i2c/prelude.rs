pub use crate::bus::I2COp;
pub use crate::devices::i2c::I2CDevice;
pub use crate::devices::prelude::*;
