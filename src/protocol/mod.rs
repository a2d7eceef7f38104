//! Driver protocol handling.
//!
//! A line-oriented text protocol for driving the battle phase from a
//! terminal or a parent process. Game states and plans travel as JSON.

pub mod parser;

pub use parser::{parse_command, parse_side, Command, ProtocolError, SideRef};
