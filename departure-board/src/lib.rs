//! Live public transport departure board.
//!
//! Periodically queries a transit service for the next connections of a few
//! configured trips and shows them on a small character display and a
//! terminal.

pub mod board;
pub mod config;
pub mod display;
pub mod domain;
pub mod store;
pub mod transit;
