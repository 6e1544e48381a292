//! Board representation for the multi-tower Hanoi puzzle

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A (tower, position) location; position 0 is the bottom of the tower
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Slot {
    pub tower: usize,
    pub position: usize,
}

impl Slot {
    pub fn new(tower: usize, position: usize) -> Self {
        Self { tower, position }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tower {} at position {}", self.tower, self.position)
    }
}

/// Towers × positions grid of stone ids. Larger ids are larger stones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub towers: usize,
    pub height: usize,
    pub slots: Vec<Option<usize>>,
}

impl Board {
    /// Create a new empty board
    pub fn new(towers: usize, height: usize) -> Self {
        Self {
            towers,
            height,
            slots: vec![None; towers * height],
        }
    }

    /// All `stones` stacked on `tower`, largest at the bottom
    pub fn stacked(stones: usize, towers: usize, tower: usize) -> Result<Self> {
        let mut board = Self::new(towers, stones);
        for stone in 0..stones {
            board.place(Slot::new(tower, stones - 1 - stone), stone)?;
        }
        Ok(board)
    }

    #[inline]
    pub fn index(&self, tower: usize, position: usize) -> usize {
        tower * self.height + position
    }

    pub fn contains(&self, slot: Slot) -> bool {
        slot.tower < self.towers && slot.position < self.height
    }

    /// Stone at a slot; out of bounds slots are empty
    pub fn get(&self, slot: Slot) -> Option<usize> {
        if self.contains(slot) {
            self.slots[self.index(slot.tower, slot.position)]
        } else {
            None
        }
    }

    /// Put a stone on an empty slot
    pub fn place(&mut self, slot: Slot, stone: usize) -> Result<()> {
        if !self.contains(slot) {
            anyhow::bail!("Slot ({}, {}) out of bounds for {}x{} board", slot.tower, slot.position, self.towers, self.height);
        }
        let idx = self.index(slot.tower, slot.position);
        if let Some(occupant) = self.slots[idx] {
            anyhow::bail!("Cannot place stone {} on {}: occupied by stone {}", stone, slot, occupant);
        }
        self.slots[idx] = Some(stone);
        Ok(())
    }

    /// Remove and return the stone at a slot
    pub fn take(&mut self, slot: Slot) -> Option<usize> {
        if !self.contains(slot) {
            return None;
        }
        let idx = self.index(slot.tower, slot.position);
        self.slots[idx].take()
    }

    /// Stones of one tower, bottom to top, `None` for empty slots
    pub fn tower(&self, tower: usize) -> &[Option<usize>] {
        let start = self.index(tower, 0);
        &self.slots[start..start + self.height]
    }

    pub fn position_of(&self, stone: usize) -> Option<Slot> {
        self.slots
            .iter()
            .position(|&occupant| occupant == Some(stone))
            .map(|idx| Slot::new(idx / self.height, idx % self.height))
    }

    /// Number of stones on a tower
    pub fn tower_height(&self, tower: usize) -> usize {
        self.tower(tower).iter().filter(|slot| slot.is_some()).count()
    }

    /// Topmost stone of a tower with its slot
    pub fn top(&self, tower: usize) -> Option<(Slot, usize)> {
        self.tower(tower)
            .iter()
            .enumerate()
            .rev()
            .find_map(|(position, &occupant)| occupant.map(|stone| (Slot::new(tower, position), stone)))
    }

    pub fn stone_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Check that every stone appears once and each tower is a gap-free
    /// stack of strictly decreasing stones from the bottom up
    pub fn check_well_formed(&self, stones: usize) -> Result<()> {
        for stone in 0..stones {
            let count = self.slots.iter().filter(|&&occupant| occupant == Some(stone)).count();
            if count != 1 {
                anyhow::bail!("Stone {} appears {} times", stone, count);
            }
        }
        if self.stone_count() != stones {
            anyhow::bail!("Board holds {} stones, expected {}", self.stone_count(), stones);
        }

        for tower in 0..self.towers {
            let column = self.tower(tower);
            for position in 1..self.height {
                match (column[position - 1], column[position]) {
                    (None, Some(stone)) => {
                        anyhow::bail!("Stone {} floats over an empty slot on tower {}", stone, tower)
                    }
                    (Some(below), Some(stone)) if below <= stone => {
                        anyhow::bail!("Stone {} rests on smaller stone {} on tower {}", stone, below, tower)
                    }
                    _ => {}
                }
            }
        }

        Ok(())
    }
}

/// One line per tower, bottom first: `0 | 2 1 0`
impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for tower in 0..self.towers {
            write!(f, "{} |", tower)?;
            for occupant in self.tower(tower) {
                match occupant {
                    Some(stone) => write!(f, " {}", stone)?,
                    None => write!(f, " .")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
