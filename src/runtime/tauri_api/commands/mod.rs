pub mod favorites;
pub mod preview;
pub mod settings;
pub mod shared;
