// Copyright 2026 Phoenix Datasets Contributors
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

mod phoenix;

pub use phoenix::{AlignedSequence, PhoenixCorpus};

use crate::error::DatasetError;
use crate::vocab::LookupTable;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One annotated sample of a corpus split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleRecord {
    /// Unique identifier, stable across splits
    pub id: String,

    /// Identifier of the performing signer
    pub signer: String,

    /// Split-qualified reference to the on-disk frame directory
    pub folder: String,

    /// Whitespace-tokenized gloss sentence, order significant
    pub annotation: Vec<String>,
}

/// # Corpus
/// Capability interface for one corpus variant: manifest loading, frame path
/// resolution and default vocabulary construction, plus the per-corpus frame
/// normalization constants.
///
/// Implementations are selected at dataset construction time; the loaded
/// records and the built vocabulary are immutable afterwards.
pub trait Corpus {
    /// Loads a split's manifest into records ordered by id.
    fn load_data_frame(&self, split: &str) -> Result<Vec<SampleRecord>, DatasetError>;

    /// Resolves a record to its frame files in temporal (filename) order.
    fn resolve_frames(&self, record: &SampleRecord) -> Result<Vec<PathBuf>, DatasetError>;

    /// Per-channel pixel mean used for frame normalization.
    fn mean(&self) -> [f32; 3];

    /// Per-channel pixel standard deviation used for frame normalization.
    fn std(&self) -> [f32; 3];

    /// Builds the default vocabulary from the training split's annotations,
    /// with the unknown slot reserved so dev/test out of vocabulary glosses
    /// encode instead of failing.
    fn create_vocab(&self) -> Result<LookupTable, DatasetError> {
        let records = self.load_data_frame("train")?;
        let sentences: Vec<Vec<String>> = records
            .into_iter()
            .map(|record| record.annotation)
            .collect();
        Ok(LookupTable::new(&sentences, true))
    }
}
