//! System-level modules
//!
//! Process plumbing shared by every execution mode.

pub mod logging;

pub use logging::init_logging;
