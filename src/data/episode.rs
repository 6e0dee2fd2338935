//! Few-shot episodes

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Right-padded raw token sequences with their true lengths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceGroup {
    pub sequences: Vec<Vec<u32>>,
    pub lengths: Vec<usize>,
}

impl SequenceGroup {
    /// Group whose lengths are the full row lengths.
    pub fn from_sequences(sequences: Vec<Vec<u32>>) -> Self {
        let lengths = sequences.iter().map(Vec::len).collect();
        Self { sequences, lengths }
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }
}

/// One meta-learning task: support, query and distractor sets, each a list
/// of groups (episode index × sequence index × token index).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Episode {
    pub support: Vec<SequenceGroup>,
    pub query: Vec<SequenceGroup>,
    #[serde(default)]
    pub other_query: Vec<SequenceGroup>,
}

impl Episode {
    /// Copy keeping only the first group of every set.
    pub fn first_group(&self) -> Self {
        Self {
            support: self.support.iter().take(1).cloned().collect(),
            query: self.query.iter().take(1).cloned().collect(),
            other_query: self.other_query.iter().take(1).cloned().collect(),
        }
    }

    /// Query sequences across all groups.
    pub fn query_count(&self) -> usize {
        self.query.iter().map(SequenceGroup::len).sum()
    }
}

/// Load episodes from a JSON array file.
pub fn load_episodes<P: AsRef<Path>>(path: P) -> Result<Vec<Episode>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::io(format!("reading episodes from {}", path.display()), e))?;
    let episodes: Vec<Episode> = serde_json::from_str(&content)
        .map_err(|e| Error::Data(format!("{}: {e}", path.display())))?;
    if episodes.is_empty() {
        return Err(Error::Data(format!("{}: file contains no episodes", path.display())));
    }
    Ok(episodes)
}
