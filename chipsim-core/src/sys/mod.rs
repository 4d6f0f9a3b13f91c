pub mod adc_board;

pub use adc_board::{AdcBoard, BoardConfig, BoardError, Nack, RunReport};
