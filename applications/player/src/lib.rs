//! Lyra Player - headless front end
//!
//! Wires configuration, logging, the data store, and a `Session` together
//! behind a line-oriented command shell.

pub mod commands;
pub mod config;
pub mod demo;
pub mod logging;
pub mod shell;
