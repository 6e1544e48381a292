//! Hanoi puzzle domain: boards and move rules

pub mod board;
pub mod rules;

pub use board::{Board, Slot};
pub use rules::{Move, MoveError, MoveRules};
