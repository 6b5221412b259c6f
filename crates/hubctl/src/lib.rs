//! hubctl - command-line front end for the Hub engagement services
//!
//! The binary is a thin wrapper; parsing, execution and rendering live here
//! so they can be tested directly.

pub mod cli;
pub mod commands;
pub mod display;
