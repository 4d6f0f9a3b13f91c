mod ads1115;
mod stub;

pub use ads1115::*;
pub use stub::*;
