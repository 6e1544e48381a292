//! Move rules for the multi-tower Hanoi puzzle

use super::board::{Board, Slot};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// One plan step: `stone` goes from `from` to `to` between `step` and `step + 1`
///
/// `from == to` is an idle step; the encoding allows it so that plans
/// shorter than the horizon still have a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    pub step: usize,
    pub stone: usize,
    pub from: Slot,
    pub to: Slot,
}

impl Move {
    pub fn is_idle(&self) -> bool {
        self.from == self.to
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: Move stone {} at tower {} at position {} to tower {} to position {}.",
            self.step, self.stone, self.from.tower, self.from.position, self.to.tower, self.to.position
        )
    }
}

/// Ways a move can be illegal on a given board
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("{0} is outside the board")]
    OutOfBounds(Slot),
    #[error("stone {stone} is not on {slot}")]
    StoneNotAtSource { stone: usize, slot: Slot },
    #[error("stone {stone} on {slot} is covered by stone {above}")]
    NotOnTop { stone: usize, slot: Slot, above: usize },
    #[error("{slot} is occupied by stone {occupant}")]
    DestinationOccupied { slot: Slot, occupant: usize },
    #[error("stone {stone} would float on {slot}")]
    Unsupported { stone: usize, slot: Slot },
    #[error("stone {stone} would rest on smaller stone {below} on {slot}")]
    SmallerBelow { stone: usize, below: usize, slot: Slot },
}

/// Hanoi move rules
pub struct MoveRules;

impl MoveRules {
    /// Board after `mv`, or why `mv` is illegal
    pub fn apply(board: &Board, mv: &Move) -> Result<Board, MoveError> {
        for slot in [mv.from, mv.to] {
            if !board.contains(slot) {
                return Err(MoveError::OutOfBounds(slot));
            }
        }

        if board.get(mv.from) != Some(mv.stone) {
            return Err(MoveError::StoneNotAtSource { stone: mv.stone, slot: mv.from });
        }

        if mv.is_idle() {
            return Ok(board.clone());
        }

        if let Some(above) = board.get(Slot::new(mv.from.tower, mv.from.position + 1)) {
            return Err(MoveError::NotOnTop { stone: mv.stone, slot: mv.from, above });
        }

        let mut next = board.clone();
        next.take(mv.from);

        if let Some(occupant) = next.get(mv.to) {
            return Err(MoveError::DestinationOccupied { slot: mv.to, occupant });
        }

        if mv.to.position > 0 {
            match next.get(Slot::new(mv.to.tower, mv.to.position - 1)) {
                None => return Err(MoveError::Unsupported { stone: mv.stone, slot: mv.to }),
                Some(below) if below < mv.stone => {
                    return Err(MoveError::SmallerBelow { stone: mv.stone, below, slot: mv.to })
                }
                Some(_) => {}
            }
        }

        let idx = next.index(mv.to.tower, mv.to.position);
        next.slots[idx] = Some(mv.stone);
        Ok(next)
    }

    /// Every legal non-idle move on `board`
    pub fn legal_moves(board: &Board, step: usize) -> Vec<Move> {
        let mut moves = Vec::new();
        for from_tower in 0..board.towers {
            let Some((from, stone)) = board.top(from_tower) else {
                continue;
            };
            for to_tower in (0..board.towers).filter(|&w| w != from_tower) {
                let to = Slot::new(to_tower, board.tower_height(to_tower));
                let mv = Move { step, stone, from, to };
                if Self::apply(board, &mv).is_ok() {
                    moves.push(mv);
                }
            }
        }
        moves
    }
}
