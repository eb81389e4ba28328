//! Rulebox library exports for testing

pub mod audio;
pub mod core;
pub mod input;
pub mod runner;
pub mod script;

#[cfg(test)]
pub mod test_support;
