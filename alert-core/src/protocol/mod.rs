//! Serial command protocol shared between firmware and emulator targets.
//!
//! Bytes are framed into lines by [`line`], parsed into a [`grammar::Command`]
//! and executed by [`commands::CommandExecutor`], which answers with exactly
//! one [`response::Response`] line.

pub mod catalog;
pub mod commands;
pub mod grammar;
pub mod line;
pub mod response;

pub use commands::CommandExecutor;
pub use grammar::{Command, LedTarget, Rejection, parse};
pub use line::{Line, LineAssembler, LineError, MAX_LINE_LEN};
pub use response::{AckTag, Response};
