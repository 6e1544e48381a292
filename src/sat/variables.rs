//! Variable management for the planning SAT encoding

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::ops::Neg;

/// "Stone `stone` occupies `position` on `tower` at step `t`"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StoneStateKey {
    pub t: usize,
    pub stone: usize,
    pub tower: usize,
    pub position: usize,
}

/// "At step `t`, move `stone` from (`from_tower`, `from_pos`) to (`to_tower`, `to_pos`)"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActionKey {
    pub t: usize,
    pub stone: usize,
    pub from_tower: usize,
    pub from_pos: usize,
    pub to_tower: usize,
    pub to_pos: usize,
}

/// Any predicate that owns a SAT variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PredicateKey {
    Stone(StoneStateKey),
    Action(ActionKey),
}

impl StoneStateKey {
    pub fn new(t: usize, stone: usize, tower: usize, position: usize) -> Self {
        Self { t, stone, tower, position }
    }
}

impl ActionKey {
    pub fn new(
        t: usize,
        stone: usize,
        from_tower: usize,
        from_pos: usize,
        to_tower: usize,
        to_pos: usize,
    ) -> Self {
        Self { t, stone, from_tower, from_pos, to_tower, to_pos }
    }

    /// The state predicate this action requires at step `t`
    pub fn precondition(&self) -> StoneStateKey {
        StoneStateKey::new(self.t, self.stone, self.from_tower, self.from_pos)
    }

    /// The state predicate this action establishes at step `t + 1`
    pub fn effect(&self) -> StoneStateKey {
        StoneStateKey::new(self.t + 1, self.stone, self.to_tower, self.to_pos)
    }
}

impl From<StoneStateKey> for PredicateKey {
    fn from(key: StoneStateKey) -> Self {
        PredicateKey::Stone(key)
    }
}

impl From<ActionKey> for PredicateKey {
    fn from(key: ActionKey) -> Self {
        PredicateKey::Action(key)
    }
}

impl fmt::Display for StoneStateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Stone(t={}, s={}, w={}, p={})",
            self.t, self.stone, self.tower, self.position
        )
    }
}

impl fmt::Display for ActionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Action(t={}, s={}, w={}, p={}, W={}, P={})",
            self.t, self.stone, self.from_tower, self.from_pos, self.to_tower, self.to_pos
        )
    }
}

impl fmt::Display for PredicateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredicateKey::Stone(key) => key.fmt(f),
            PredicateKey::Action(key) => key.fmt(f),
        }
    }
}

/// A predicate paired with its signed SAT identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Variable {
    key: PredicateKey,
    id: i32,
}

impl Variable {
    /// The predicate this variable stands for
    pub fn key(&self) -> PredicateKey {
        self.key
    }

    /// Signed identifier, as written to DIMACS
    pub fn id(&self) -> i32 {
        self.id
    }

    /// Unsigned identifier shared by both polarities
    pub fn index(&self) -> i32 {
        self.id.abs()
    }

    pub fn is_positive(&self) -> bool {
        self.id > 0
    }
}

impl Neg for Variable {
    type Output = Variable;

    fn neg(self) -> Variable {
        Variable { key: self.key, id: -self.id }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.key, self.id)
    }
}

/// Append-only registry mapping predicates to dense SAT identifiers
#[derive(Debug)]
pub struct VariableManager {
    /// Map from predicate to SAT variable ID (positive integer)
    variable_map: HashMap<PredicateKey, i32>,
    /// Reverse direction, `keys[id - 1]`
    keys: Vec<PredicateKey>,
    /// Next available variable ID
    next_id: i32,
    stones: usize,
    towers: usize,
}

impl VariableManager {
    /// Create a new registry for a problem with the given stone and tower counts
    pub fn new(stones: usize, towers: usize) -> Self {
        Self {
            variable_map: HashMap::new(),
            keys: Vec::new(),
            next_id: 1, // SAT variables start from 1
            stones,
            towers,
        }
    }

    /// Get or create the variable for the given predicate
    pub fn variable_for(&mut self, key: impl Into<PredicateKey>) -> Variable {
        let key = key.into();
        if let Some(&id) = self.variable_map.get(&key) {
            return Variable { key, id };
        }

        debug_assert!(self.in_bounds(&key), "{} outside {}x{} problem", key, self.stones, self.towers);

        let id = self.next_id;
        self.next_id += 1;
        self.variable_map.insert(key, id);
        self.keys.push(key);
        Variable { key, id }
    }

    /// Variable for "stone `s` at (`w`, `p`) at step `t`"
    pub fn stone(&mut self, t: usize, s: usize, w: usize, p: usize) -> Variable {
        self.variable_for(StoneStateKey::new(t, s, w, p))
    }

    /// Variable for "move stone `s` from (`w`, `p`) to (`to_w`, `to_p`) at step `t`"
    pub fn action(&mut self, t: usize, s: usize, w: usize, p: usize, to_w: usize, to_p: usize) -> Variable {
        self.variable_for(ActionKey::new(t, s, w, p, to_w, to_p))
    }

    /// Negated literal of an existing variable; never allocates
    pub fn negate(&self, variable: Variable) -> Variable {
        -variable
    }

    /// Existing variable for a predicate, if one was allocated
    pub fn lookup(&self, key: impl Into<PredicateKey>) -> Option<Variable> {
        let key = key.into();
        self.variable_map.get(&key).map(|&id| Variable { key, id })
    }

    /// Predicate owning an identifier of either sign
    pub fn key_for(&self, id: i32) -> Option<PredicateKey> {
        let index = usize::try_from(id.unsigned_abs()).ok()?.checked_sub(1)?;
        self.keys.get(index).copied()
    }

    /// Get the total number of variables created
    pub fn variable_count(&self) -> usize {
        self.keys.len()
    }

    fn in_bounds(&self, key: &PredicateKey) -> bool {
        match key {
            PredicateKey::Stone(k) => {
                k.stone < self.stones && k.tower < self.towers && k.position < self.stones
            }
            PredicateKey::Action(k) => {
                k.stone < self.stones
                    && k.from_tower < self.towers
                    && k.to_tower < self.towers
                    && k.from_pos < self.stones
                    && k.to_pos < self.stones
            }
        }
    }

    /// Get statistics about variable usage
    pub fn statistics(&self) -> VariableStatistics {
        let stone_variables = self
            .keys
            .iter()
            .filter(|key| matches!(key, PredicateKey::Stone(_)))
            .count();

        VariableStatistics {
            total_variables: self.variable_count(),
            stone_variables,
            action_variables: self.variable_count() - stone_variables,
        }
    }
}

/// Statistics about variable usage
#[derive(Debug, Clone)]
pub struct VariableStatistics {
    pub total_variables: usize,
    pub stone_variables: usize,
    pub action_variables: usize,
}

impl fmt::Display for VariableStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Variable Statistics:")?;
        writeln!(f, "  Total variables: {}", self.total_variables)?;
        writeln!(f, "  Stone variables: {}", self.stone_variables)?;
        writeln!(f, "  Action variables: {}", self.action_variables)?;
        Ok(())
    }
}
