pub mod config;
pub mod emitter;
pub mod host;
pub mod settings_store;
