//! Input handlers.

pub mod keyboard;

pub use keyboard::{handle_key_event, KeyAction};
