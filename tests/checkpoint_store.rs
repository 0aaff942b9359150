//! Checkpoint persistence through both store adapters

mod common;

use common::{small_network, small_network_config};
use deeptictactoe::{
    Error,
    adapters::{InMemoryCheckpointStore, MsgPackCheckpointStore},
    ports::{Approximator, Checkpoint, CheckpointMetadata, CheckpointStore},
    q_learning::QNetwork,
    tictactoe::{Board, Seat},
};

fn assert_same_q_values(a: &QNetwork, b: &QNetwork) {
    for layout in [".........", "X...O....", "XO.XO...."] {
        let board = Board::from_string(layout).unwrap();
        for seat in Seat::ALL {
            let state = board.encode(seat);
            let actions = board.legal_actions();
            assert_eq!(a.q_values(&state, &actions), b.q_values(&state, &actions));
        }
    }
}

fn save_network(store: &dyn CheckpointStore, network: &QNetwork, id: u32) {
    let metadata = CheckpointMetadata {
        epoch: id,
        approximator: network.name().to_string(),
        ..CheckpointMetadata::default()
    };
    store
        .save(&Checkpoint::new(id, network.snapshot().unwrap(), metadata))
        .unwrap();
}

#[test]
fn test_msgpack_roundtrip_reproduces_q_values() {
    let dir = tempfile::tempdir().unwrap();
    let store = MsgPackCheckpointStore::new(dir.path()).unwrap();
    let network = small_network(31);
    save_network(&store, &network, 6);

    assert!(dir.path().join("checkpoint_6.msgpack").exists());
    let restored = QNetwork::load(&store, Some(6), small_network_config(0)).unwrap();
    assert_same_q_values(&network, &restored);

    let checkpoint = store.load(6).unwrap();
    assert_eq!(checkpoint.version, Checkpoint::VERSION);
    assert_eq!(checkpoint.metadata.approximator, "QNetwork");
}

#[test]
fn test_stores_agree() {
    let dir = tempfile::tempdir().unwrap();
    let on_disk = MsgPackCheckpointStore::new(dir.path()).unwrap();
    let in_memory = InMemoryCheckpointStore::new();
    let network = small_network(32);

    for store in [&on_disk as &dyn CheckpointStore, &in_memory] {
        save_network(store, &network, 2);
        save_network(store, &network, 10);
        assert_eq!(store.ids().unwrap(), vec![2, 10]);
        assert!(store.contains(10));
        assert!(!store.contains(4));
        assert!(matches!(
            store.load(4),
            Err(Error::CheckpointNotFound { id: 4 })
        ));
    }

    assert_eq!(on_disk.load(10).unwrap(), in_memory.load(10).unwrap());
}

#[test]
fn test_overwriting_a_checkpoint_replaces_it() {
    let dir = tempfile::tempdir().unwrap();
    let store = MsgPackCheckpointStore::new(dir.path()).unwrap();
    save_network(&store, &small_network(1), 2);
    let newer = small_network(2);
    save_network(&store, &newer, 2);

    let restored = QNetwork::load(&store, Some(2), small_network_config(0)).unwrap();
    assert_same_q_values(&newer, &restored);
}
