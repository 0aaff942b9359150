//! Game engine behavior: scenarios and properties over random play

mod common;

use common::{Scripted, play_scripted};
use deeptictactoe::{
    Error,
    policies::RandomPolicy,
    tictactoe::{Action, Board, Game, GameResult, GameStatus, MAX_PLIES, Seat},
};
use proptest::prelude::*;
use rand::{SeedableRng, rngs::StdRng};

/// Seat one takes the top row while seat two plays the middle row
#[test]
fn test_top_row_win_at_fifth_ply() {
    let history = play_scripted(&[0, 3, 1, 4, 2]);

    assert_eq!(history.result(), GameResult::SeatOneWin);
    assert_eq!(history.result().code(), 1);
    assert_eq!(history.turns(Seat::One).len(), 3);
    assert_eq!(history.turns(Seat::Two).len(), 2);

    let last = history.turns(Seat::One).last().unwrap();
    assert_eq!(last.action, Action::new(0, 2).unwrap());
    // Seat one sees its own marks as +1 and the opponent's as -1
    assert_eq!(last.state.values(), &[1, 1, 0, -1, -1, 0, 0, 0, 0]);
    assert_eq!(last.actions.len(), 5);
}

#[test]
fn test_draw_fills_the_board() {
    let history = play_scripted(&[0, 1, 2, 4, 3, 5, 7, 6, 8]);
    assert_eq!(history.result(), GameResult::Draw);
    assert_eq!(history.total_moves(), 9);
}

#[test]
fn test_illegal_move_is_fatal() {
    let seat_one = Scripted::new(&[4, 0]);
    let seat_two = Scripted::new(&[4]);
    let mut rng = StdRng::seed_from_u64(0);
    let mut game = Game::new(&seat_one, &seat_two);

    let err = game.play(&mut rng).unwrap_err();
    assert!(matches!(err, Error::IllegalMove { seat: Seat::Two, .. }));
    assert_eq!(game.status(), GameStatus::InProgress);
}

#[test]
fn test_play_after_terminal_is_rejected() {
    let random = RandomPolicy::new();
    let mut rng = StdRng::seed_from_u64(17);
    let mut game = Game::new(&random, &random);

    let history = game.play(&mut rng).unwrap();
    assert!(matches!(game.play(&mut rng), Err(Error::GameOver)));
    assert_eq!(game.history(), Some(&history));
}

proptest! {
    #[test]
    fn prop_random_games_terminate_with_consistent_history(seed in any::<u64>()) {
        let random = RandomPolicy::new();
        let mut rng = StdRng::seed_from_u64(seed);
        let mut game = Game::new(&random, &random);
        let history = game.play(&mut rng).unwrap();

        prop_assert!(history.total_moves() >= 5);
        prop_assert!(history.total_moves() <= MAX_PLIES);

        let one = history.turns(Seat::One).len();
        let two = history.turns(Seat::Two).len();
        prop_assert!(one == two || one == two + 1);

        // Replay the turns on a fresh board and compare the result
        let mut board = Board::new();
        let mut expected_actions = board.legal_actions().len();
        for ply in 0..history.total_moves() {
            let seat = if ply % 2 == 0 { Seat::One } else { Seat::Two };
            let turn = &history.turns(seat)[ply / 2];

            prop_assert_eq!(turn.actions.len(), expected_actions);
            prop_assert_eq!(&turn.actions, &board.legal_actions());
            prop_assert_eq!(turn.state, board.encode(seat));
            prop_assert_eq!(board.encode(seat).negated(), board.encode(seat.opponent()));
            prop_assert!(turn.actions.contains(&turn.action));

            board.mark(turn.action, seat).unwrap();
            expected_actions -= 1;
            prop_assert!(board.mark(turn.action, seat.opponent()).is_err());
        }

        prop_assert_eq!(board.result(), Some(history.result()));
        match history.result() {
            GameResult::SeatOneWin => prop_assert!(board.has_won(Seat::One)),
            GameResult::SeatTwoWin => prop_assert!(board.has_won(Seat::Two)),
            GameResult::Draw => {
                prop_assert!(board.is_full());
                prop_assert!(board.winner().is_none());
            }
        }
    }

    #[test]
    fn prop_same_seed_same_game(seed in any::<u64>()) {
        let random = RandomPolicy::new();
        let first = Game::new(&random, &random)
            .play(&mut StdRng::seed_from_u64(seed))
            .unwrap();
        let second = Game::new(&random, &random)
            .play(&mut StdRng::seed_from_u64(seed))
            .unwrap();
        prop_assert_eq!(first, second);
    }
}
