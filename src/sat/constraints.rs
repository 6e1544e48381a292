//! Clause families for the Tower of Hanoi planning encoding
//!
//! Every family is a lazy iterator over [`KeyClause`]s: clauses phrased in
//! terms of predicate keys rather than SAT identifiers. The encoder resolves
//! keys against the [`VariableManager`](super::VariableManager) as clauses
//! are pulled, so identifiers are assigned in emission order and the whole
//! formula never has to sit in memory.

use super::variables::{ActionKey, PredicateKey, StoneStateKey, Variable};
use crate::config::FrameAxioms;
use itertools::{iproduct, Either};
use std::fmt;
use std::iter;

/// A predicate with a polarity, before it has been given an identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Literal {
    pub key: PredicateKey,
    pub positive: bool,
}

impl Literal {
    pub fn pos(key: impl Into<PredicateKey>) -> Self {
        Self { key: key.into(), positive: true }
    }

    pub fn neg(key: impl Into<PredicateKey>) -> Self {
        Self { key: key.into(), positive: false }
    }
}

/// A clause over predicate keys
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyClause {
    pub literals: Vec<Literal>,
}

impl KeyClause {
    /// Create a new clause from literals
    pub fn new(literals: Vec<Literal>) -> Self {
        Self { literals }
    }

    /// Create a unit clause (single literal)
    pub fn unit(literal: Literal) -> Self {
        Self { literals: vec![literal] }
    }

    /// Create a binary clause (two literals)
    pub fn binary(lit1: Literal, lit2: Literal) -> Self {
        Self { literals: vec![lit1, lit2] }
    }

    pub fn len(&self) -> usize {
        self.literals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }
}

/// Represents a SAT clause (disjunction of literals)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub literals: Vec<Variable>,
}

impl Clause {
    /// Create a new clause from literals
    pub fn new(literals: Vec<Variable>) -> Self {
        Self { literals }
    }

    /// Signed identifiers, in clause order
    pub fn ids(&self) -> impl Iterator<Item = i32> + '_ {
        self.literals.iter().map(Variable::id)
    }

    /// Check if clause is empty (unsatisfiable)
    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    /// Check if clause is unit
    pub fn is_unit(&self) -> bool {
        self.literals.len() == 1
    }

    /// DIMACS line: signed identifiers terminated by `0`
    pub fn to_dimacs(&self) -> String {
        let mut line = String::new();
        for id in self.ids() {
            line.push_str(&id.to_string());
            line.push(' ');
        }
        line.push('0');
        line
    }
}

/// Clause rendered with predicate names, `Stone(t=0, s=1, w=0, p=0):-3 ... 0`
impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for var in &self.literals {
            write!(f, "{} ", var)?;
        }
        write!(f, "0")
    }
}

/// Board dimensions shared by all clause families
///
/// Every tower has `stones` positions, enough to hold the whole stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub stones: usize,
    pub towers: usize,
}

impl Dimensions {
    pub fn new(stones: usize, towers: usize) -> Self {
        Self { stones, towers }
    }

    /// Every (tower, position) pair in lexicographic order
    pub fn slots(&self) -> impl Iterator<Item = (usize, usize)> + Clone {
        iproduct!(0..self.towers, 0..self.stones)
    }

    pub fn slot_count(&self) -> usize {
        self.towers * self.stones
    }

    /// Every action at step `t`, ordered by (stone, from, to)
    pub fn actions(&self, t: usize) -> impl Iterator<Item = ActionKey> + Clone {
        iproduct!(0..self.stones, self.slots(), self.slots())
            .map(move |(s, (w, p), (to_w, to_p))| ActionKey::new(t, s, w, p, to_w, to_p))
    }

    pub fn action_count(&self) -> usize {
        self.stones * self.slot_count() * self.slot_count()
    }
}

/// Options that change the shape, not the models, of the formula
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodingOptions {
    pub frame_axioms: FrameAxioms,
    /// Emit each symmetric mutual-exclusion clause once instead of twice
    pub symmetry_pruning: bool,
}

impl Default for EncodingOptions {
    fn default() -> Self {
        Self {
            frame_axioms: FrameAxioms::Explicit,
            symmetry_pruning: false,
        }
    }
}

/// Pair filter for mutual-exclusion families: distinct ordered pairs, or
/// only `a < b` when pruning.
fn keep_pair<T: Ord>(a: &T, b: &T, pruning: bool) -> bool {
    if pruning {
        a < b
    } else {
        a != b
    }
}

/// Unit clauses placing the whole stack on `tower` at step `t`, largest at the bottom
pub fn single_tower(dims: Dimensions, t: usize, tower: usize) -> impl Iterator<Item = KeyClause> {
    let n = dims.stones;
    (0..n).map(move |s| KeyClause::unit(Literal::pos(StoneStateKey::new(t, s, tower, n - 1 - s))))
}

/// Clauses forcing a single well-formed board at step `t`
pub fn state_axioms(
    dims: Dimensions,
    t: usize,
    options: EncodingOptions,
) -> impl Iterator<Item = KeyClause> {
    let n = dims.stones;
    let pruning = options.symmetry_pruning;
    let at = move |s: usize, w: usize, p: usize| StoneStateKey::new(t, s, w, p);

    // Each stone somewhere
    let at_least_one = (0..n).map(move |s| {
        KeyClause::new(dims.slots().map(|(w, p)| Literal::pos(at(s, w, p))).collect())
    });

    // Each stone in at most one slot
    let at_most_one = iproduct!(0..n, dims.slots(), dims.slots())
        .filter(move |(_, a, b)| keep_pair(a, b, pruning))
        .map(move |(s, (w, p), (other_w, other_p))| {
            KeyClause::binary(Literal::neg(at(s, w, p)), Literal::neg(at(s, other_w, other_p)))
        });

    // At most one stone per slot
    let one_per_slot = iproduct!(0..n, dims.slots(), 0..n)
        .filter(move |(s, _, other)| keep_pair(s, other, pruning))
        .map(move |(s, (w, p), other)| {
            KeyClause::binary(Literal::neg(at(s, w, p)), Literal::neg(at(other, w, p)))
        });

    // No smaller stone directly beneath
    let no_smaller_below = iproduct!(0..n, 0..dims.towers, 1..n).flat_map(move |(s, w, p)| {
        (0..s).map(move |smaller| {
            KeyClause::binary(Literal::neg(at(s, w, p)), Literal::neg(at(smaller, w, p - 1)))
        })
    });

    // Some larger stone directly beneath
    let larger_below = iproduct!(0..n, 0..dims.towers, 1..n).map(move |(s, w, p)| {
        let mut literals = vec![Literal::neg(at(s, w, p))];
        literals.extend((s + 1..n).map(|larger| Literal::pos(at(larger, w, p - 1))));
        KeyClause::new(literals)
    });

    at_least_one
        .chain(at_most_one)
        .chain(one_per_slot)
        .chain(no_smaller_below)
        .chain(larger_below)
}

/// Clauses choosing exactly one action at step `t` and linking it to steps `t` and `t + 1`
pub fn action_axioms(
    dims: Dimensions,
    t: usize,
    options: EncodingOptions,
) -> impl Iterator<Item = KeyClause> {
    let pruning = options.symmetry_pruning;
    let explicit_frames = options.frame_axioms == FrameAxioms::Explicit;

    let at_most_one = iproduct!(dims.actions(t), dims.actions(t))
        .filter(move |(a, b)| keep_pair(a, b, pruning))
        .map(|(a, b)| KeyClause::binary(Literal::neg(a), Literal::neg(b)));

    let at_least_one =
        iter::once_with(move || KeyClause::new(dims.actions(t).map(Literal::pos).collect()));

    let transitions = dims.actions(t).flat_map(move |action| {
        let precondition = KeyClause::binary(Literal::neg(action), Literal::pos(action.precondition()));
        let effect = KeyClause::binary(Literal::neg(action), Literal::pos(action.effect()));

        let frames = if explicit_frames {
            Either::Left(explicit_frame_axioms(dims, action))
        } else {
            Either::Right(iter::empty::<KeyClause>())
        };

        iter::once(precondition).chain(iter::once(effect)).chain(frames)
    });

    let successor_state = if explicit_frames {
        Either::Left(iter::empty::<KeyClause>())
    } else {
        Either::Right(successor_state_axioms(dims, t))
    };

    at_most_one
        .chain(at_least_one)
        .chain(transitions)
        .chain(successor_state)
}

/// Every stone other than the moved one keeps its slot across `action`
fn explicit_frame_axioms(dims: Dimensions, action: ActionKey) -> impl Iterator<Item = KeyClause> {
    let t = action.t;
    iproduct!(0..dims.stones, dims.slots())
        .filter(move |&(other, _)| other != action.stone)
        .map(move |(other, (w, p))| {
            KeyClause::new(vec![
                Literal::neg(action),
                Literal::neg(StoneStateKey::new(t, other, w, p)),
                Literal::pos(StoneStateKey::new(t + 1, other, w, p)),
            ])
        })
}

/// A stone leaves a slot between `t` and `t + 1` only through an action moving it from there
fn successor_state_axioms(dims: Dimensions, t: usize) -> impl Iterator<Item = KeyClause> {
    iproduct!(0..dims.stones, dims.slots()).map(move |(s, (w, p))| {
        let mut literals = vec![
            Literal::neg(StoneStateKey::new(t, s, w, p)),
            Literal::pos(StoneStateKey::new(t + 1, s, w, p)),
        ];
        literals.extend(
            dims.slots()
                .map(|(to_w, to_p)| Literal::pos(ActionKey::new(t, s, w, p, to_w, to_p))),
        );
        KeyClause::new(literals)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stone(t: usize, s: usize, w: usize, p: usize) -> PredicateKey {
        StoneStateKey::new(t, s, w, p).into()
    }

    #[test]
    fn test_single_tower_descending() {
        let clauses: Vec<_> = single_tower(Dimensions::new(3, 3), 4, 2).collect();
        assert_eq!(clauses.len(), 3);
        assert_eq!(clauses[0], KeyClause::unit(Literal::pos(StoneStateKey::new(4, 0, 2, 2))));
        assert_eq!(clauses[2], KeyClause::unit(Literal::pos(StoneStateKey::new(4, 2, 2, 0))));
    }

    #[test]
    fn test_state_axioms_ordering() {
        let dims = Dimensions::new(2, 2);
        let clauses: Vec<_> = state_axioms(dims, 0, EncodingOptions::default()).collect();

        // First clause: stone 0 somewhere among the 4 slots
        assert_eq!(clauses[0].len(), 4);
        assert!(clauses[0].literals.iter().all(|l| l.positive));
        assert_eq!(clauses[0].literals[0].key, stone(0, 0, 0, 0));
        assert_eq!(clauses[0].literals[3].key, stone(0, 0, 1, 1));

        // Then the ordered at-most-one pairs for stone 0
        assert_eq!(
            clauses[2],
            KeyClause::binary(
                Literal::neg(StoneStateKey::new(0, 0, 0, 0)),
                Literal::neg(StoneStateKey::new(0, 0, 0, 1))
            )
        );

        // Last clause: larger-below requirement for the largest stone has no candidates
        let last = clauses.last().unwrap();
        assert_eq!(last.literals, vec![Literal::neg(StoneStateKey::new(0, 1, 1, 1))]);
    }

    #[test]
    fn test_state_axiom_counts() {
        let dims = Dimensions::new(3, 2);
        let slots = dims.slot_count();
        let n = dims.stones;
        let m = dims.towers;

        let ordered = state_axioms(dims, 1, EncodingOptions::default()).count();
        let expected = n
            + n * slots * (slots - 1)
            + slots * n * (n - 1)
            + m * (n - 1) * n * (n - 1) / 2
            + n * m * (n - 1);
        assert_eq!(ordered, expected);

        let pruned = state_axioms(
            dims,
            1,
            EncodingOptions { symmetry_pruning: true, ..EncodingOptions::default() },
        )
        .count();
        let expected_pruned = n
            + n * slots * (slots - 1) / 2
            + slots * n * (n - 1) / 2
            + m * (n - 1) * n * (n - 1) / 2
            + n * m * (n - 1);
        assert_eq!(pruned, expected_pruned);
    }

    #[test]
    fn test_position_zero_has_no_support_clause() {
        let dims = Dimensions::new(2, 2);
        let support: Vec<_> = state_axioms(dims, 0, EncodingOptions::default())
            .filter(|c| !c.is_empty() && !c.literals[0].positive)
            .filter(|c| c.literals.iter().skip(1).all(|l| l.positive))
            .collect();

        for clause in support {
            match clause.literals[0].key {
                PredicateKey::Stone(key) => assert!(key.position >= 1),
                PredicateKey::Action(_) => panic!("state axioms mention no actions"),
            }
        }
    }

    #[test]
    fn test_single_stone_state_has_no_stacking_rules() {
        let dims = Dimensions::new(1, 3);
        let clauses: Vec<_> = state_axioms(dims, 0, EncodingOptions::default()).collect();
        // One ALO clause plus 3 * 2 ordered AMO pairs
        assert_eq!(clauses.len(), 1 + 6);
    }

    #[test]
    fn test_action_axiom_counts() {
        let dims = Dimensions::new(2, 2);
        let actions = dims.action_count();
        assert_eq!(actions, 2 * 4 * 4);

        let explicit = action_axioms(dims, 0, EncodingOptions::default()).count();
        assert_eq!(
            explicit,
            actions * (actions - 1) + 1 + 2 * actions + actions * (dims.stones - 1) * dims.slot_count()
        );

        let compact = action_axioms(
            dims,
            0,
            EncodingOptions { frame_axioms: FrameAxioms::SuccessorState, symmetry_pruning: true },
        )
        .count();
        assert_eq!(
            compact,
            actions * (actions - 1) / 2 + 1 + 2 * actions + dims.stones * dims.slot_count()
        );
    }

    #[test]
    fn test_transition_clauses_follow_each_action() {
        let dims = Dimensions::new(2, 2);
        let actions = dims.action_count();
        let clauses: Vec<_> = action_axioms(dims, 3, EncodingOptions::default())
            .skip(actions * (actions - 1) + 1)
            .take(2 + 4)
            .collect();

        let first = ActionKey::new(3, 0, 0, 0, 0, 0);
        assert_eq!(clauses[0], KeyClause::binary(Literal::neg(first), Literal::pos(StoneStateKey::new(3, 0, 0, 0))));
        assert_eq!(clauses[1], KeyClause::binary(Literal::neg(first), Literal::pos(StoneStateKey::new(4, 0, 0, 0))));
        assert_eq!(
            clauses[2],
            KeyClause::new(vec![
                Literal::neg(first),
                Literal::neg(StoneStateKey::new(3, 1, 0, 0)),
                Literal::pos(StoneStateKey::new(4, 1, 0, 0)),
            ])
        );
    }

    #[test]
    fn test_successor_state_clause_shape() {
        let dims = Dimensions::new(2, 3);
        let clauses: Vec<_> = successor_state_axioms(dims, 0).collect();
        assert_eq!(clauses.len(), dims.stones * dims.slot_count());
        assert_eq!(clauses[0].len(), 2 + dims.slot_count());
        assert_eq!(clauses[0].literals[0], Literal::neg(StoneStateKey::new(0, 0, 0, 0)));
        assert_eq!(clauses[0].literals[1], Literal::pos(StoneStateKey::new(1, 0, 0, 0)));
        assert_eq!(clauses[0].literals[2], Literal::pos(ActionKey::new(0, 0, 0, 0, 0, 0)));
    }

    #[test]
    fn test_clause_rendering() {
        let mut vm = crate::sat::VariableManager::new(2, 2);
        let a = vm.stone(0, 0, 0, 1);
        let b = vm.stone(0, 1, 0, 0);
        let clause = Clause::new(vec![-a, b]);

        assert_eq!(clause.to_dimacs(), "-1 2 0");
        assert_eq!(
            clause.to_string(),
            "Stone(t=0, s=0, w=0, p=1):-1 Stone(t=0, s=1, w=0, p=0):2 0"
        );
    }
}
