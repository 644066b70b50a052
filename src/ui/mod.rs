//! Terminal UI layer for interactive chat sessions.
//!
//! - [`chat_loop`]: the event loop that turns key presses into
//!   [`crate::core::app::AppAction`]s and runs the resulting commands.
//! - [`renderer`] and [`picker`]: frame composition.
//!
//! This layer presents and captures interaction state; [`crate::core`] owns
//! the state transitions and backend coordination.

pub mod chat_loop;
pub mod picker;
pub mod renderer;
