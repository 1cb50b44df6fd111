pub mod chat;
pub mod emitter;
pub mod store;
