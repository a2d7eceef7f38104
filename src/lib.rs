//! Arrakeen battle-phase engine library.
//!
//! Exposes the board representation, battle determination and resolution,
//! rule options, announcements, the driver protocol, and the random
//! simulator for use by integration tests and the binary entry points.

pub mod battle;
pub mod board;
pub mod config;
pub mod engine;
pub mod notify;
pub mod protocol;
pub mod simulate;
