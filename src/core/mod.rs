pub mod account;
pub mod app;
pub mod character;
pub mod chat_stream;
pub mod config;
pub mod device;
pub mod message;
pub mod session_store;
