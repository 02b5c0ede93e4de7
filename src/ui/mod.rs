//! Terminal UI widgets and layout.

pub mod layout;
pub mod modal;
pub mod session_pane;
pub mod toast;
