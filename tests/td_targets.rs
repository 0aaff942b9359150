//! TD(0) target construction over engine-produced histories

mod common;

use common::{CellValues, play_scripted};
use deeptictactoe::{
    Error,
    policies::RandomPolicy,
    q_learning::{DEFAULT_GAMMA, build_training_set, td_targets},
    tictactoe::{Game, GameResult, Seat},
};
use proptest::prelude::*;
use rand::{SeedableRng, rngs::StdRng};

fn ramp() -> CellValues {
    CellValues([0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9])
}

#[test]
fn test_top_row_scenario_targets() {
    let history = play_scripted(&[0, 3, 1, 4, 2]);
    let examples = td_targets(&history, &ramp(), DEFAULT_GAMMA).unwrap();

    // Seat one: bootstrap, bootstrap, win
    assert_eq!(examples[2].target, 1.0);
    // Seat two: bootstrap, loss
    assert_eq!(examples[4].target, -1.0);

    // Seat one's second turn still offers cell 8 (value 0.9)
    let expected = DEFAULT_GAMMA * 0.9;
    assert!((examples[0].target - expected).abs() < 1e-12);
    assert!((examples[1].target - expected).abs() < 1e-12);
    assert!((examples[3].target - expected).abs() < 1e-12);
}

#[test]
fn test_bootstrap_only_considers_legal_successor_actions() {
    // Seat one ends up holding cell 8, so its later turns never see it
    let history = play_scripted(&[8, 0, 4, 1, 2, 6, 3, 5, 7]);
    let examples = td_targets(&history, &ramp(), 0.5).unwrap();

    let seat_one = history.turns(Seat::One);
    for (i, turn) in seat_one.iter().enumerate().skip(1) {
        let best = turn
            .actions
            .iter()
            .map(|a| ramp().0[a.index()])
            .fold(f64::NEG_INFINITY, f64::max);
        assert!((examples[i - 1].target - 0.5 * best).abs() < 1e-12);
    }
}

#[test]
fn test_draws_get_zero_terminal_targets() {
    let history = play_scripted(&[0, 1, 2, 4, 3, 5, 7, 6, 8]);
    assert_eq!(history.result(), GameResult::Draw);

    let examples = td_targets(&history, &ramp(), DEFAULT_GAMMA).unwrap();
    let seat_one_len = history.turns(Seat::One).len();
    assert_eq!(examples[seat_one_len - 1].target, 0.0);
    assert_eq!(examples.last().unwrap().target, 0.0);
}

#[test]
fn test_training_set_is_union_of_games() {
    let histories = vec![
        play_scripted(&[0, 3, 1, 4, 2]),
        play_scripted(&[0, 1, 2, 4, 3, 5, 7, 6, 8]),
    ];
    let examples = build_training_set(&histories, &ramp(), DEFAULT_GAMMA).unwrap();
    assert_eq!(examples.len(), 14);
}

#[test]
fn test_partly_nan_approximator_is_rejected() {
    let history = play_scripted(&[0, 3, 1, 4, 2]);
    let mut values = ramp().0;
    values[8] = f64::NAN;

    let err = td_targets(&history, &CellValues(values), DEFAULT_GAMMA).unwrap_err();
    match err {
        Error::NonFiniteEstimate { value, action } => {
            assert!(value.is_nan());
            assert_eq!(action.index(), 8);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_diverged_approximator_is_rejected() {
    let history = play_scripted(&[0, 3, 1, 4, 2]);
    for value in [f64::NAN, f64::INFINITY] {
        assert!(matches!(
            td_targets(&history, &CellValues([value; 9]), DEFAULT_GAMMA),
            Err(Error::NonFiniteEstimate { .. })
        ));
    }
}

proptest! {
    #[test]
    fn prop_targets_are_bounded_and_terminal_rewards_exact(seed in any::<u64>()) {
        let random = RandomPolicy::new();
        let history = Game::new(&random, &random)
            .play(&mut StdRng::seed_from_u64(seed))
            .unwrap();
        let examples = td_targets(&history, &ramp(), DEFAULT_GAMMA).unwrap();

        prop_assert_eq!(examples.len(), history.total_moves());
        for example in &examples {
            prop_assert!(example.target.abs() <= 1.0);
        }

        let mut offset = 0;
        for seat in Seat::ALL {
            let turns = history.turns(seat);
            let last = &examples[offset + turns.len() - 1];
            prop_assert_eq!(last.target, history.result().reward_for(seat));
            prop_assert_eq!(last.action, turns[turns.len() - 1].action);
            offset += turns.len();
        }
    }
}
