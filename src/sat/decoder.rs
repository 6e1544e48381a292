//! Reconstruction of plans from solver models

use super::constraints::Dimensions;
use super::solver::Valuation;
use super::variables::{PredicateKey, StoneStateKey, VariableManager};
use crate::hanoi::{Board, Move, Slot};
use crate::plan::Plan;
use log::debug;
use std::time::Duration;
use thiserror::Error;

/// A valuation that does not describe a plan of the encoded problem
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("inconsistent valuation: stone {stone} has no position at step {step}")]
    NoPosition { step: usize, stone: usize },
    #[error("inconsistent valuation: stone {stone} occupies {count} positions at step {step}")]
    MultiplePositions { step: usize, stone: usize, count: usize },
    #[error("inconsistent valuation: stones {first} and {second} share {slot} at step {step}")]
    SlotConflict { step: usize, slot: Slot, first: usize, second: usize },
    #[error("inconsistent valuation: no action chosen at step {step}")]
    NoAction { step: usize },
    #[error("inconsistent valuation: {count} actions chosen at step {step}")]
    MultipleActions { step: usize, count: usize },
    #[error("valuation has no value for {key} (variable {id})")]
    MissingValue { key: PredicateKey, id: i32 },
    #[error("{0} was never encoded")]
    UnallocatedKey(PredicateKey),
}

/// Reads boards and moves back out of a model, one step at a time
pub struct PlanDecoder<'a> {
    variables: &'a VariableManager,
    dims: Dimensions,
    horizon: usize,
}

impl<'a> PlanDecoder<'a> {
    pub fn new(variables: &'a VariableManager, dims: Dimensions, horizon: usize) -> Self {
        Self { variables, dims, horizon }
    }

    /// Decode every snapshot and move; the first inconsistency aborts
    pub fn decode(&self, valuation: &Valuation) -> Result<Plan, DecodeError> {
        let mut snapshots = Vec::with_capacity(self.horizon + 1);
        let mut moves = Vec::with_capacity(self.horizon);

        for t in 0..=self.horizon {
            let board = self.decode_board(t, valuation)?;
            debug!("Step {}:\n{}", t, board);
            snapshots.push(board);

            if t < self.horizon {
                let mv = self.decode_move(t, valuation)?;
                debug!("{}", mv);
                moves.push(mv);
            }
        }

        Ok(Plan {
            stones: self.dims.stones,
            towers: self.dims.towers,
            horizon: self.horizon,
            snapshots,
            moves,
            solve_time: Duration::ZERO,
        })
    }

    fn value(&self, key: impl Into<PredicateKey>, valuation: &Valuation) -> Result<bool, DecodeError> {
        let key = key.into();
        let var = self
            .variables
            .lookup(key)
            .ok_or(DecodeError::UnallocatedKey(key))?;
        valuation
            .value(var.id())
            .ok_or(DecodeError::MissingValue { key, id: var.id() })
    }

    /// Board at step `t`; every stone must hold exactly one slot
    pub fn decode_board(&self, t: usize, valuation: &Valuation) -> Result<Board, DecodeError> {
        let mut board = Board::new(self.dims.towers, self.dims.stones);

        for stone in 0..self.dims.stones {
            let mut occupied = Vec::new();
            for (w, p) in self.dims.slots() {
                if self.value(StoneStateKey::new(t, stone, w, p), valuation)? {
                    occupied.push(Slot::new(w, p));
                }
            }

            let slot = match occupied.as_slice() {
                [slot] => *slot,
                [] => return Err(DecodeError::NoPosition { step: t, stone }),
                _ => {
                    return Err(DecodeError::MultiplePositions {
                        step: t,
                        stone,
                        count: occupied.len(),
                    })
                }
            };

            if let Some(first) = board.get(slot) {
                return Err(DecodeError::SlotConflict { step: t, slot, first, second: stone });
            }
            let idx = board.index(slot.tower, slot.position);
            board.slots[idx] = Some(stone);
        }

        Ok(board)
    }

    /// The single action chosen at step `t`
    pub fn decode_move(&self, t: usize, valuation: &Valuation) -> Result<Move, DecodeError> {
        let mut chosen = Vec::new();
        for action in self.dims.actions(t) {
            if self.value(action, valuation)? {
                chosen.push(action);
            }
        }

        match chosen.as_slice() {
            [action] => Ok(Move {
                step: t,
                stone: action.stone,
                from: Slot::new(action.from_tower, action.from_pos),
                to: Slot::new(action.to_tower, action.to_pos),
            }),
            [] => Err(DecodeError::NoAction { step: t }),
            _ => Err(DecodeError::MultipleActions { step: t, count: chosen.len() }),
        }
    }
}
