//! Browse, edit and connect to the hosts of an OpenSSH client config.
//!
//! The [`ssh_config`] module is the round-trip parser and writer; everything else is the
//! desktop application around it.

pub mod app;
pub mod cli;
pub mod error;
pub mod io;
pub mod keys;
pub mod launcher;
pub mod logging;
pub mod ssh_config;
pub mod visits;

pub use error::{Error, Result};
