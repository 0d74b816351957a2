//! Subcommand implementations

pub mod ast;
pub mod init;
pub mod render;
