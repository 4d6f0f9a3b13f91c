#[macro_use]
extern crate static_assertions;

#[macro_use]
extern crate log;

pub mod bus;
pub mod devices;
pub mod error;
pub mod pins;
pub mod script;
pub mod sys;
