pub mod favorites;
pub mod ports;
pub mod preview;
