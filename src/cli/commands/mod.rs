//! Subcommands of the `deeptictactoe` binary

pub mod evaluate;
pub mod train;
