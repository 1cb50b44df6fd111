pub mod adapters;
pub mod core;
pub mod runtime;

#[cfg(feature = "desktop")]
pub use runtime::tauri_api::{init, init_with_host};
