//! Command-line front end for the grapher series engines.

pub mod cli;
pub mod commands;
pub mod logging;
pub mod summary;
