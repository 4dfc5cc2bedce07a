pub mod commands;
pub mod init;
pub mod render;
pub mod select;

pub use commands::Command;
