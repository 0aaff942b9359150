//! Uniform random policy

use rand::{RngCore, seq::IndexedRandom};

use crate::{
    Error, Result,
    ports::Policy,
    tictactoe::{Action, EncodedState},
};

/// Picks uniformly among the legal actions
///
/// Stateless; all randomness comes from the rng handed in by the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomPolicy;

impl RandomPolicy {
    pub fn new() -> Self {
        Self
    }
}

/// Uniform choice shared by the random policy and epsilon-greedy exploration
pub(crate) fn choose_uniform(actions: &[Action], rng: &mut dyn RngCore) -> Result<Action> {
    actions
        .choose(rng)
        .copied()
        .ok_or(Error::EmptyActionSet)
}

impl Policy for RandomPolicy {
    fn select_move(
        &self,
        _state: &EncodedState,
        actions: &[Action],
        rng: &mut dyn RngCore,
    ) -> Result<Action> {
        choose_uniform(actions, rng)
    }

    fn name(&self) -> &str {
        "Random"
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::tictactoe::{Board, Seat};

    #[test]
    fn test_random_policy_picks_legal_actions() {
        let board = Board::from_string("XO.X.O...").unwrap();
        let state = board.encode(Seat::One);
        let actions = board.legal_actions();
        let mut rng = StdRng::seed_from_u64(3);

        let mut seen = HashSet::new();
        for _ in 0..200 {
            let action = RandomPolicy.select_move(&state, &actions, &mut rng).unwrap();
            assert!(actions.contains(&action));
            seen.insert(action);
        }
        assert_eq!(seen.len(), actions.len());
    }

    #[test]
    fn test_random_policy_is_reproducible() {
        let board = Board::new();
        let state = board.encode(Seat::One);
        let actions = board.legal_actions();

        let picks = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            (0..20)
                .map(|_| RandomPolicy.select_move(&state, &actions, &mut rng).unwrap())
                .collect::<Vec<_>>()
        };
        assert_eq!(picks(11), picks(11));
    }

    #[test]
    fn test_empty_action_set_is_an_error() {
        let state = Board::new().encode(Seat::One);
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            RandomPolicy.select_move(&state, &[], &mut rng),
            Err(Error::EmptyActionSet)
        ));
    }
}
