pub mod args;
mod structs;

pub use structs::*;
