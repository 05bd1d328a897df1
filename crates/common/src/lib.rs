//! Process-wide helpers shared by the binaries.

pub mod utils;
