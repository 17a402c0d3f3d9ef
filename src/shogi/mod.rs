//! Implementation of the shogi environment: board primitives, position
//! mutation and the branching game record.

pub mod board;
pub mod core;
pub mod record;
