//! Subcommand implementations.

pub mod ask;
pub mod chat;
pub mod init;
pub mod status;
