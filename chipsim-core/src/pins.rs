//! Named pin registry shared by the host simulation and emulated chips.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;

/// Electrical direction of a pin, from the chip's point of view.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PinMode {
    /// Driven by the host, observed by the chip.
    Input,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PinError {
    #[error("pin `{0}` is already registered")]
    AlreadyRegistered(&'static str),
    #[error("no pin named `{0}`")]
    UnknownPin(String),
}

/// A chip's read-only view of one of its pins.
#[derive(Debug, Clone)]
pub struct PinLevel {
    level: Arc<AtomicBool>,
}

impl PinLevel {
    pub fn is_high(&self) -> bool {
        self.level.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
struct Pin {
    mode: PinMode,
    level: Arc<AtomicBool>,
}

/// Pins registered by a chip. Only the host drives them (through the bank);
/// the chip holds a [`PinLevel`] per pin.
#[derive(Debug, Default)]
pub struct PinBank {
    changed: bool,
    pins: BTreeMap<&'static str, Pin>,
}

impl PinBank {
    pub fn new() -> PinBank {
        PinBank::default()
    }

    /// Register a new pin, returning the chip's view of the line. Lines start
    /// low.
    pub fn init(&mut self, name: &'static str, mode: PinMode) -> Result<PinLevel, PinError> {
        if self.pins.contains_key(name) {
            return Err(PinError::AlreadyRegistered(name));
        }

        let level = Arc::new(AtomicBool::new(false));
        debug!(target: "PIN", "registered {} ({:?})", name, mode);
        self.pins.insert(
            name,
            Pin {
                mode,
                level: Arc::clone(&level),
            },
        );

        Ok(PinLevel { level })
    }

    /// Mode of the named pin, if registered.
    pub fn mode(&self, name: &str) -> Option<PinMode> {
        self.pins.get(name).map(|pin| pin.mode)
    }

    /// Names of all registered pins, in lexicographic order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.pins.keys().copied()
    }

    /// Drive the named line from the host side.
    pub fn drive(&mut self, name: &str, high: bool) -> Result<(), PinError> {
        let pin = self
            .pins
            .get(name)
            .ok_or_else(|| PinError::UnknownPin(name.into()))?;

        if pin.level.swap(high, Ordering::SeqCst) != high {
            trace!(target: "PIN", "{} -> {}", name, if high { "high" } else { "low" });
            self.changed = true;
        }
        Ok(())
    }

    /// Current level of the named line.
    pub fn is_high(&self, name: &str) -> Result<bool, PinError> {
        self.pins
            .get(name)
            .map(|pin| pin.level.load(Ordering::SeqCst))
            .ok_or_else(|| PinError::UnknownPin(name.into()))
    }

    /// Checks if any line changed level since the last call.
    pub fn check_and_clear_changed(&mut self) -> bool {
        std::mem::replace(&mut self.changed, false)
    }
}
