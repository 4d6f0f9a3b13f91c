use thiserror::Error;

use crate::bus::BusAccess;

pub type BusResult<T> = Result<T, BusException>;
pub type FatalBusResult<T> = Result<T, FatalBusException>;

/// Exception resulting from a bus access.
#[derive(Debug, Clone)]
pub enum BusException {
    // -- Non-Fatal Errors -- //
    /// Device is using a stubbed read implementation.
    StubRead(log::Level, u8),
    /// Device is using a stubbed write implementation.
    StubWrite(log::Level, ()),

    // -- Internal Emulator Errors -- //
    /// An unrecoverable error which should immediately terminate execution.
    Fatal(String),

    // -- Wrappers -- //
    /// Denotes exception as having occurred inside an addressed i2c device.
    I2CException {
        e: Box<BusException>,
        // context
        access: BusAccess,
        in_device: String,
    },

    // -- Controller Violations -- //
    /// Performed an unexpected action on the bus.
    ///
    /// e.g: reading without addressing a device first, reading in the middle
    /// of a write transaction, etc...
    ContractViolation {
        msg: String,
        severity: log::Level,
        stub_val: Option<u8>,
    },
}

/// Context around a BusException.
#[derive(Debug, Clone)]
pub struct BusExceptionCtx {
    pub access: BusAccess,
    pub in_device: String,
}

impl std::fmt::Display for BusExceptionCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[addr {:#04x?}][{}]", self.access.addr, self.in_device)
    }
}

/// An unrecoverable bus exception.
#[derive(Debug, Clone, Error)]
#[error("{context} fatal bus exception: {reason:?}")]
pub struct FatalBusException {
    context: BusExceptionCtx,
    reason: BusException,
}

impl FatalBusException {
    pub fn reason(&self) -> &BusException {
        &self.reason
    }
}

impl BusException {
    /// The value the controller should observe in place of a failed read, if
    /// the exception provides one.
    pub fn stub_val(&self) -> Option<u8> {
        use BusException::*;
        match self {
            StubRead(_, val) => Some(*val),
            ContractViolation { stub_val, .. } => *stub_val,
            I2CException { e, .. } => e.stub_val(),
            _ => None,
        }
    }

    /// Handle the bus exception, potentially returning a FatalBusException.
    pub fn resolve(self, target: &'static str, ctx: BusExceptionCtx) -> FatalBusResult<()> {
        macro_rules! blog {
            (($level:ident, $ctx:ident) => ($($args:tt)*)) => {
                if log_enabled!(target: target, $level) {
                    let $ctx = $ctx;
                    log!(target: target, $level, $($args)*)
                }
            };
        }

        use BusException::*;
        match self {
            StubRead(level, _) => {
                blog! { (level, ctx) => ("{} stubbed read ({})", ctx, ctx.access) }
            }
            StubWrite(level, ()) => {
                blog! { (level, ctx) => ("{} stubbed write ({})", ctx, ctx.access) }
            }
            I2CException {
                e,
                access,
                in_device,
            } => e.resolve(target, BusExceptionCtx { access, in_device })?,
            ContractViolation {
                msg,
                severity,
                stub_val,
            } => {
                if severity == log::Level::Error {
                    return Err(FatalBusException {
                        context: ctx,
                        reason: ContractViolation {
                            msg,
                            severity,
                            stub_val,
                        },
                    });
                } else {
                    blog! { (severity, ctx) => ("{} {}", ctx, msg) }
                }
            }
            Fatal(_) => {
                return Err(FatalBusException {
                    context: ctx,
                    reason: self,
                })
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{BusAccess, I2COp};

    fn ctx() -> BusExceptionCtx {
        BusExceptionCtx {
            access: BusAccess::new(I2COp::Read, 0x48, 0),
            in_device: "test".into(),
        }
    }

    #[test]
    fn stubs_are_not_fatal() {
        assert!(BusException::StubRead(log::Level::Error, 0)
            .resolve("test", ctx())
            .is_ok());
        assert!(BusException::StubWrite(log::Level::Warn, ())
            .resolve("test", ctx())
            .is_ok());
    }

    #[test]
    fn error_level_contract_violation_is_fatal() {
        let e = BusException::ContractViolation {
            msg: "bad".into(),
            severity: log::Level::Error,
            stub_val: None,
        };
        let fatal = e.resolve("test", ctx()).unwrap_err();
        assert!(matches!(fatal.reason(), BusException::ContractViolation { .. }));

        let e = BusException::ContractViolation {
            msg: "meh".into(),
            severity: log::Level::Warn,
            stub_val: Some(0xff),
        };
        assert!(e.resolve("test", ctx()).is_ok());
    }

    #[test]
    fn wrapped_exceptions_resolve_with_inner_context() {
        let e = BusException::I2CException {
            e: Box::new(BusException::Fatal("boom".into())),
            access: BusAccess::new(I2COp::Write, 0x10, 0x80),
            in_device: "Stub:a".into(),
        };
        assert_eq!(e.stub_val(), None);

        let fatal = e.resolve("test", ctx()).unwrap_err();
        assert!(fatal.to_string().starts_with("[addr 0x10][Stub:a]"));
    }

    #[test]
    fn stub_val_looks_through_wrappers() {
        let e = BusException::I2CException {
            e: Box::new(BusException::StubRead(log::Level::Info, 0x5a)),
            access: BusAccess::new(I2COp::Read, 0x10, 0),
            in_device: "Stub".into(),
        };
        assert_eq!(e.stub_val(), Some(0x5a));
    }
}
