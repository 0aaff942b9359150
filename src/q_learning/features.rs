//! Input features for (state, action) pairs

use crate::tictactoe::{Action, CELL_COUNT, EncodedState};

/// Length of the feature vector: encoded board followed by a one-hot action
pub const FEATURE_LEN: usize = 2 * CELL_COUNT;

/// Encode a state and an action as a network input.
///
/// The first nine entries copy the perspective-relative board, the last nine
/// one-hot encode the row-major action index.
pub fn encode(state: &EncodedState, action: Action) -> [f64; FEATURE_LEN] {
    let mut x = [0.0; FEATURE_LEN];
    for (slot, &value) in x.iter_mut().zip(state.values().iter()) {
        *slot = f64::from(value);
    }
    x[CELL_COUNT + action.index()] = 1.0;
    x
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_layout() {
        let state = EncodedState::new([1, -1, 0, 0, 1, 0, 0, 0, -1]);
        let x = encode(&state, Action::new(2, 1).unwrap());

        assert_eq!(&x[..9], &[1.0, -1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, -1.0]);
        let one_hot: Vec<usize> = (9..18).filter(|&i| x[i] == 1.0).collect();
        assert_eq!(one_hot, vec![9 + 7]);
        assert_eq!(x[9..].iter().sum::<f64>(), 1.0);
    }
}
