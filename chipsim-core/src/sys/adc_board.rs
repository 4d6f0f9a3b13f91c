use thiserror::Error;

use crate::bus::{BusAccess, I2CBus, I2COp};
use crate::devices::i2c::devices::{self as i2c, Ads1115, Converter, FixedConversion};
use crate::error::{BusExceptionCtx, FatalBusResult};
use crate::pins::{PinBank, PinError};
use crate::script::{Command, Script};

#[derive(Error, Debug)]
pub enum BoardError {
    #[error("could not register pins: {0}")]
    Pins(#[from] PinError),
    #[error("address {0:#04x} is already in use")]
    AddressInUse(u8),
    #[error("{0:#04x} is not a 7-bit address")]
    InvalidAddress(u8),
}

/// Board-level knobs.
#[derive(Debug, Clone)]
pub struct BoardConfig {
    /// Value produced by the ADC's conversion step.
    pub conversion: u16,
    /// Addresses to populate with stub devices.
    pub stubs: Vec<u8>,
}

impl Default for BoardConfig {
    fn default() -> BoardConfig {
        BoardConfig {
            conversion: i2c::DEFAULT_CONVERSION,
            stubs: Vec::new(),
        }
    }
}

/// An address that nobody acknowledged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Nack {
    pub line: usize,
    pub addr: u8,
}

/// Outcome of replaying a script.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Every byte the controller read, in order.
    pub reads: Vec<u8>,
    /// `start`s that were not acknowledged.
    pub nacks: Vec<Nack>,
    /// Number of written bytes the addressed device didn't acknowledge.
    pub write_nacks: usize,
}

/// A single ADS1115 wired to a host I2C controller.
#[derive(Debug)]
pub struct AdcBoard {
    bus: I2CBus,
    pins: PinBank,
}

impl AdcBoard {
    /// Returns a new board whose ADC produces `cfg.conversion` on every read.
    pub fn new(cfg: BoardConfig) -> Result<AdcBoard, BoardError> {
        let conversion = FixedConversion(cfg.conversion);
        AdcBoard::with_converter(cfg, conversion)
    }

    /// Returns a new board using a custom conversion step.
    /// `cfg.conversion` is ignored.
    pub fn with_converter(
        cfg: BoardConfig,
        converter: impl Converter + 'static,
    ) -> Result<AdcBoard, BoardError> {
        let mut pins = PinBank::new();
        let mut bus = I2CBus::new();

        let adc = Ads1115::with_converter(&mut pins, converter)?;
        bus.register_device(i2c::ADDRESS, Box::new(adc));

        for addr in cfg.stubs {
            if addr >= 0x80 {
                return Err(BoardError::InvalidAddress(addr));
            }
            if bus.device(addr).is_some() {
                return Err(BoardError::AddressInUse(addr));
            }
            bus.register_device(addr, Box::new(i2c::Stub::new("unemulated")));
        }

        info!(target: "BOARD", "pins: {:?}", pins.names().collect::<Vec<_>>());

        Ok(AdcBoard { bus, pins })
    }

    pub fn bus(&self) -> &I2CBus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut I2CBus {
        &mut self.bus
    }

    pub fn pins(&self) -> &PinBank {
        &self.pins
    }

    pub fn pins_mut(&mut self) -> &mut PinBank {
        &mut self.pins
    }

    fn exception_ctx(&self, kind: I2COp, val: u8) -> BusExceptionCtx {
        let addr = self.bus.active().map(|(addr, _)| addr).unwrap_or(0);
        BusExceptionCtx {
            access: BusAccess::new(kind, addr, val),
            in_device: "I2CBus".into(),
        }
    }

    /// Replay `script` against the bus. Non-fatal bus exceptions are logged
    /// and the run continues. The bus is left idle afterwards, even if the run
    /// hit a fatal exception.
    pub fn run(&mut self, script: &Script) -> FatalBusResult<RunReport> {
        let res = self.replay(script);
        self.bus.stop();
        res
    }

    fn replay(&mut self, script: &Script) -> FatalBusResult<RunReport> {
        let mut report = RunReport::default();

        for (line, cmd) in script.commands() {
            match *cmd {
                Command::Start { addr, op } => {
                    if !self.bus.start(addr, op) {
                        warn!(target: "I2C", "line {}: no device acknowledged {:#04x}", line, addr);
                        report.nacks.push(Nack { line, addr });
                    }
                }
                Command::Read { count } => {
                    for _ in 0..count {
                        let val = match self.bus.read() {
                            Ok(val) => val,
                            Err(e) => {
                                let val = e.stub_val().unwrap_or(0);
                                let ctx = self.exception_ctx(I2COp::Read, val);
                                e.resolve("I2C", ctx)?;
                                val
                            }
                        };
                        report.reads.push(val);
                    }
                }
                Command::Write(ref data) => {
                    for &b in data {
                        match self.bus.write(b) {
                            Ok(true) => {}
                            Ok(false) => report.write_nacks += 1,
                            Err(e) => {
                                let ctx = self.exception_ctx(I2COp::Write, b);
                                e.resolve("I2C", ctx)?;
                                report.write_nacks += 1;
                            }
                        }
                    }
                }
                Command::Stop => self.bus.stop(),
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::error::BusException;
    use crate::pins::PinMode;

    fn run(board: &mut AdcBoard, script: &str) -> FatalBusResult<RunReport> {
        board.run(&script.parse().unwrap())
    }

    #[test]
    fn configure_then_sample() {
        let mut board = AdcBoard::new(BoardConfig::default()).unwrap();
        let report = run(
            &mut board,
            "start 0x48 w\nwrite 0x80\nstart 0x48 r\nread\nstop",
        )
        .unwrap();
        assert_eq!(report.reads, vec![210]);
        assert!(report.nacks.is_empty());
        assert_eq!(report.write_nacks, 0);
        assert_eq!(board.bus().active(), None);
    }

    #[test]
    fn wrong_address_is_reported_not_fatal() {
        let mut board = AdcBoard::new(BoardConfig::default()).unwrap();
        let report = run(&mut board, "start 0x49 r\nread").unwrap();
        assert_eq!(report.nacks, vec![Nack { line: 1, addr: 0x49 }]);
        // idle bus reads back as all ones
        assert_eq!(report.reads, vec![0xff]);
    }

    #[test]
    fn configured_conversion_value() {
        let cfg = BoardConfig {
            conversion: 0xbeef,
            ..BoardConfig::default()
        };
        let mut board = AdcBoard::new(cfg).unwrap();
        let report = run(&mut board, "start 0x48 r\nread 2").unwrap();
        assert_eq!(report.reads, vec![0xef, 0xef]);
    }

    #[test]
    fn custom_converter() {
        let mut board =
            AdcBoard::with_converter(BoardConfig::default(), |config: u8| config as u16 * 2)
                .unwrap();
        let report = run(
            &mut board,
            "start 0x48 w\nwrite 0x10\nstart 0x48 r\nread\nstart 0x48 w\nwrite 0x90\nstart 0x48 r\nread",
        )
        .unwrap();
        assert_eq!(report.reads, vec![0x20, 0x20]);
    }

    #[test]
    fn stubbed_devices() {
        let cfg = BoardConfig {
            stubs: vec![0x20],
            ..BoardConfig::default()
        };
        let mut board = AdcBoard::new(cfg).unwrap();
        assert_eq!(board.bus_mut().scan(), vec![0x20, 0x48]);

        let report = run(&mut board, "start 0x20 w\nwrite 1 2\nstart 0x20 r\nread").unwrap();
        assert_eq!(report.reads, vec![0]);
        assert_eq!(report.write_nacks, 2);
    }

    #[test]
    fn bad_stub_addresses() {
        let cfg = BoardConfig {
            stubs: vec![0x48],
            ..BoardConfig::default()
        };
        assert!(matches!(
            AdcBoard::new(cfg),
            Err(BoardError::AddressInUse(0x48))
        ));

        let cfg = BoardConfig {
            stubs: vec![0x80],
            ..BoardConfig::default()
        };
        assert!(matches!(
            AdcBoard::new(cfg),
            Err(BoardError::InvalidAddress(0x80))
        ));
    }

    #[test]
    fn direction_mismatch_is_fatal() {
        let mut board = AdcBoard::new(BoardConfig::default()).unwrap();
        let e = run(&mut board, "start 0x48 w\nread").unwrap_err();
        assert!(matches!(e.reason(), BusException::ContractViolation { .. }));
        assert_eq!(board.bus().active(), None);

        // the board is still usable afterwards
        let report = run(&mut board, "start 0x48 r\nread").unwrap();
        assert_eq!(report.reads, vec![210]);
    }

    #[test]
    fn registers_bus_pins() {
        let mut board = AdcBoard::new(BoardConfig::default()).unwrap();
        assert_eq!(board.pins().mode("SCL"), Some(PinMode::Input));
        assert_eq!(board.pins().mode("SDA"), Some(PinMode::Input));
        board.pins_mut().drive("SDA", true).unwrap();
        assert!(board.pins().is_high("SDA").unwrap());
    }
}
