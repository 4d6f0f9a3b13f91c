//! Host-side I2C bus controller.

use bit_field::BitField;

use crate::devices::i2c::I2CDevice;
use crate::devices::Probe;
use crate::error::{BusException::*, BusResult};

mod access;

pub use access::BusAccess;

/// Lowest address probed by [`I2CBus::scan`] (0x00-0x07 are reserved).
pub const SCAN_START_ADDR: u8 = 0x08;
/// Highest address probed by [`I2CBus::scan`] (0x78-0x7f are reserved).
pub const SCAN_END_ADDR: u8 = 0x77;

/// Direction of an I2C transaction.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum I2COp {
    Read,
    Write,
}

impl I2COp {
    /// R/W bit as sent on the wire after the 7-bit address.
    pub fn into_bit(self) -> bool {
        match self {
            I2COp::Read => true,
            I2COp::Write => false,
        }
    }

    pub fn from_bit(bit: bool) -> Self {
        if bit {
            I2COp::Read
        } else {
            I2COp::Write
        }
    }
}

/// Encode the byte a controller puts on the wire to address `addr`.
///
/// top 7 bits: address
/// bit 0: 1 = read, 0 = write
///
/// Only the low 7 bits of `addr` are used.
pub fn address_byte(addr: u8, op: I2COp) -> u8 {
    *0u8.set_bits(1..=7, addr.get_bits(0..7))
        .set_bit(0, op.into_bit())
}

#[derive(Debug, Copy, Clone)]
struct I2CTransaction {
    op: I2COp,
    addr: u8,
}

/// I2C Controller
///
/// Owns every device registered on the bus. A transaction begins with
/// [`start`](I2CBus::start), which asks the device registered at the target
/// address whether it participates, and ends with [`stop`](I2CBus::stop).
/// Bytes are moved one at a time with [`read`](I2CBus::read) and
/// [`write`](I2CBus::write).
pub struct I2CBus {
    devices: Vec<Option<Box<dyn I2CDevice>>>,
    txn: Option<I2CTransaction>,
}

impl std::fmt::Debug for I2CBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("I2CBus")
            .field("devices", &"[...; 128]")
            .field("txn", &self.txn)
            .finish()
    }
}

impl Default for I2CBus {
    fn default() -> I2CBus {
        I2CBus::new()
    }
}

impl I2CBus {
    pub fn new() -> I2CBus {
        I2CBus {
            devices: (0..128).map(|_| None).collect(),
            txn: None,
        }
    }

    /// Register a new i2c device with the controller, placing it at the given
    /// address. Returns any previously registered device at that address.
    ///
    /// Panics if `addr > 127`
    pub fn register_device(
        &mut self,
        addr: u8,
        device: Box<dyn I2CDevice>,
    ) -> Option<Box<dyn I2CDevice>> {
        assert!(addr < 128, "i2c addresses cannot be greater than 127!");
        if matches!(self.txn, Some(txn) if txn.addr == addr) {
            self.txn = None;
        }
        std::mem::replace(&mut self.devices[addr as usize], Some(device))
    }

    /// Returns the device registered at `addr`, if any.
    pub fn device(&self, addr: u8) -> Option<&dyn I2CDevice> {
        self.devices.get(addr as usize)?.as_deref()
    }

    /// Returns the address of the device currently taking part in a
    /// transaction, along with the transaction direction.
    pub fn active(&self) -> Option<(u8, I2COp)> {
        self.txn.map(|txn| (txn.addr, txn.op))
    }

    /// Begin (or repeat-start) a transaction. Returns `true` if a device
    /// acknowledged the address.
    ///
    /// A `false` return leaves the bus idle. This is the only way a device can
    /// turn down a transaction, and it's not an error.
    pub fn start(&mut self, addr: u8, op: I2COp) -> bool {
        self.txn = None;

        let acked = match self.devices.get_mut(addr as usize) {
            Some(Some(device)) => device.connect(addr, op),
            _ => false,
        };

        if acked {
            self.txn = Some(I2CTransaction { op, addr });
        }

        debug!(
            target: "I2C",
            "start {:#04x?} ({:?}) [{:#04x?}] -> {}",
            addr,
            op,
            address_byte(addr, op),
            if acked { "ACK" } else { "NACK" }
        );
        acked
    }

    /// Begin a transaction from a raw address byte (see [`address_byte`]).
    pub fn start_byte(&mut self, byte: u8) -> bool {
        self.start(byte.get_bits(1..=7), I2COp::from_bit(byte.get_bit(0)))
    }

    /// End the current transaction (if any).
    pub fn stop(&mut self) {
        if let Some(txn) = self.txn.take() {
            debug!(target: "I2C", "stop {:#04x?}", txn.addr);
        }
    }

    fn addressed(&mut self, op: I2COp) -> BusResult<(u8, &mut Box<dyn I2CDevice>)> {
        let txn = match self.txn {
            Some(txn) => txn,
            None => {
                return Err(ContractViolation {
                    msg: format!("{:?} with no addressed device", op),
                    severity: log::Level::Warn,
                    // nobody drives SDA, so the pull-ups win
                    stub_val: match op {
                        I2COp::Read => Some(0xff),
                        I2COp::Write => None,
                    },
                })
            }
        };

        if txn.op != op {
            return Err(ContractViolation {
                msg: format!("{:?} during a {:?} transaction", op, txn.op),
                severity: log::Level::Error,
                stub_val: None,
            });
        }

        match self.devices[txn.addr as usize] {
            Some(ref mut device) => Ok((txn.addr, device)),
            None => Err(Fatal(format!(
                "no device registered at active address {:#04x?}",
                txn.addr
            ))),
        }
    }

    /// Read a single byte from the addressed device.
    pub fn read(&mut self) -> BusResult<u8> {
        let (addr, device) = self.addressed(I2COp::Read)?;

        match device.read() {
            Ok(val) => {
                trace!(target: "I2C", "{}", BusAccess::new(I2COp::Read, addr, val));
                Ok(val)
            }
            // add i2c context
            Err(e) => Err(I2CException {
                access: BusAccess::new(I2COp::Read, addr, e.stub_val().unwrap_or(0)),
                in_device: Probe::from_device(&*device, 0).to_string(),
                e: Box::new(e),
            }),
        }
    }

    /// Write a single byte to the addressed device. Returns whether the device
    /// acknowledged the byte.
    pub fn write(&mut self, data: u8) -> BusResult<bool> {
        let (addr, device) = self.addressed(I2COp::Write)?;

        match device.write(data) {
            Ok(ack) => {
                trace!(target: "I2C", "{}", BusAccess::new(I2COp::Write, addr, data));
                Ok(ack)
            }
            Err(e) => Err(I2CException {
                access: BusAccess::new(I2COp::Write, addr, data),
                in_device: Probe::from_device(&*device, 0).to_string(),
                e: Box::new(e),
            }),
        }
    }

    /// Probe every non-reserved address with an address-only write, returning
    /// the addresses that acknowledged. Leaves the bus idle.
    pub fn scan(&mut self) -> Vec<u8> {
        let mut found = Vec::new();
        for addr in SCAN_START_ADDR..=SCAN_END_ADDR {
            if self.start(addr, I2COp::Write) {
                found.push(addr);
            }
            self.stop();
        }
        found
    }
}
