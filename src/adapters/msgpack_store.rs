//! MessagePack implementation of the checkpoint store.
//!
//! Each checkpoint lives in its own file, `checkpoint_<id>.msgpack`, inside a
//! single directory.

use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use crate::{
    Result,
    error::Error,
    ports::{Checkpoint, CheckpointId, CheckpointStore},
};

const FILE_PREFIX: &str = "checkpoint_";
const FILE_EXTENSION: &str = "msgpack";

/// Directory-backed checkpoint store using rmp_serde.
///
/// # Examples
///
/// ```no_run
/// use deeptictactoe::adapters::MsgPackCheckpointStore;
/// use deeptictactoe::ports::CheckpointStore;
///
/// let store = MsgPackCheckpointStore::new("checkpoints")?;
/// let latest = store.ids()?.last().copied();
/// # Ok::<(), deeptictactoe::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct MsgPackCheckpointStore {
    dir: PathBuf,
}

impl MsgPackCheckpointStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|source| Error::Io {
            operation: format!("create checkpoint directory {dir:?}"),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File path used for a checkpoint id
    pub fn path_for(&self, id: CheckpointId) -> PathBuf {
        self.dir.join(format!("{FILE_PREFIX}{id}.{FILE_EXTENSION}"))
    }

    fn parse_id(path: &Path) -> Option<CheckpointId> {
        if path.extension().and_then(|ext| ext.to_str()) != Some(FILE_EXTENSION) {
            return None;
        }
        path.file_stem()?
            .to_str()?
            .strip_prefix(FILE_PREFIX)?
            .parse()
            .ok()
    }
}

impl CheckpointStore for MsgPackCheckpointStore {
    fn save(&self, checkpoint: &Checkpoint) -> Result<()> {
        let path = self.path_for(checkpoint.id);
        let file = File::create(&path).map_err(|source| Error::Io {
            operation: format!("create file {path:?}"),
            source,
        })?;
        let mut writer = BufWriter::new(file);

        rmp_serde::encode::write(&mut writer, checkpoint).map_err(|e| {
            Error::SerializationContext {
                operation: "serialize checkpoint to MessagePack".to_string(),
                message: e.to_string(),
            }
        })?;
        writer.flush().map_err(|source| Error::Io {
            operation: format!("flush file {path:?}"),
            source,
        })?;

        Ok(())
    }

    fn load(&self, id: CheckpointId) -> Result<Checkpoint> {
        let path = self.path_for(id);
        if !path.is_file() {
            return Err(Error::CheckpointNotFound { id });
        }

        let file = File::open(&path).map_err(|source| Error::Io {
            operation: format!("open file {path:?}"),
            source,
        })?;

        let checkpoint: Checkpoint = rmp_serde::decode::from_read(BufReader::new(file))
            .map_err(|e| Error::SerializationContext {
                operation: "deserialize checkpoint from MessagePack".to_string(),
                message: e.to_string(),
            })?;

        if checkpoint.version != Checkpoint::VERSION {
            return Err(Error::SerializationContext {
                operation: format!("load checkpoint {id}"),
                message: format!(
                    "unsupported format version {} (expected {})",
                    checkpoint.version,
                    Checkpoint::VERSION
                ),
            });
        }

        Ok(checkpoint)
    }

    fn contains(&self, id: CheckpointId) -> bool {
        self.path_for(id).is_file()
    }

    fn ids(&self) -> Result<Vec<CheckpointId>> {
        let entries = fs::read_dir(&self.dir).map_err(|source| Error::Io {
            operation: format!("list checkpoint directory {:?}", self.dir),
            source,
        })?;

        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry?;
            if let Some(id) = Self::parse_id(&entry.path()) {
                ids.push(id);
            }
        }
        ids.sort_unstable();
        Ok(ids)
    }
}
