use super::I2COp;

/// Encodes a single byte transferred over the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusAccess {
    pub kind: I2COp,
    pub addr: u8,
    pub val: u8,
}

impl BusAccess {
    pub fn new(kind: I2COp, addr: u8, val: u8) -> BusAccess {
        BusAccess { kind, addr, val }
    }
}

impl std::fmt::Display for BusAccess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            I2COp::Read => write!(f, "r8({:#04x?}) // {:#04x?}", self.addr, self.val),
            I2COp::Write => write!(f, "w8({:#04x?}, {:#04x?})", self.addr, self.val),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(
            BusAccess::new(I2COp::Read, 0x48, 0xd2).to_string(),
            "r8(0x48) // 0xd2"
        );
        assert_eq!(
            BusAccess::new(I2COp::Write, 0x48, 0x80).to_string(),
            "w8(0x48, 0x80)"
        );
    }
}
