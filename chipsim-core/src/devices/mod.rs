pub mod i2c;
pub mod prelude;

/// Common trait implemented by all emulated devices.
pub trait Device {
    /// The name of the emulated device.
    fn kind(&self) -> &'static str;

    /// A unique label identifying this particular instance of the device.
    fn label(&self) -> Option<&'static str> {
        None
    }

    /// Query what register is being accessed at the given offset.
    ///
    /// I2C devices without a register pointer ignore `offset`.
    fn probe(&self, offset: u32) -> Probe<'_>;
}

/// Describes what lies at a particular device offset.
#[derive(Debug)]
pub enum Probe<'a> {
    /// Nothing is mapped at the offset.
    Unmapped,
    /// A named register.
    Register(&'static str),
    /// A device nested within another device.
    Device {
        device: &'a dyn Device,
        next: Box<Probe<'a>>,
    },
}

impl<'a> Probe<'a> {
    /// Construct a probe rooted at `device`.
    pub fn from_device(device: &'a dyn Device, offset: u32) -> Probe<'a> {
        Probe::Device {
            device,
            next: Box::new(device.probe(offset)),
        }
    }
}

impl std::fmt::Debug for dyn Device + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind())
    }
}

impl std::fmt::Display for Probe<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Probe::Unmapped => write!(f, "<unmapped>"),
            Probe::Register(name) => write!(f, "{}", name),
            Probe::Device { device, next } => {
                match device.label() {
                    Some(label) => write!(f, "{}:{}", device.kind(), label)?,
                    None => write!(f, "{}", device.kind())?,
                }
                match **next {
                    Probe::Unmapped => Ok(()),
                    ref next => write!(f, " > {}", next),
                }
            }
        }
    }
}
