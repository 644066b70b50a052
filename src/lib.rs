//! Whispi is a terminal client for chatting with hosted AI characters.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`api`] defines the wire payloads and the HTTP client for the backend's
//!   callable functions.
//! - [`core`] owns client state, the reducer that drives it, the streaming
//!   reply consumer, character filtering, and local persistence.
//! - [`ui`] renders the terminal interface and runs the interactive event
//!   loop.
//! - [`cli`] parses arguments and implements the one-shot subcommands.
//!
//! The binary (`src/main.rs`) routes through [`crate::cli::main`], which
//! dispatches into [`ui::chat_loop`] for interactive sessions.

pub mod api;
pub mod cli;
pub mod core;
pub mod logging;
pub mod ui;
pub mod utils;
