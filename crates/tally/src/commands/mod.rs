//! Command dispatch.

pub mod config_cmd;
pub mod show;
