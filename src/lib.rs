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

//! # Phoenix datasets
//!
//! Dataset wrappers for the RWTH-PHOENIX-Weather 2014 sign language corpus:
//! corpus loading and indexing, frame subsampling, gloss vocabulary
//! construction, per-example frame decoding and batch collation, plus glue
//! for the official sclite-based evaluation.
//!
//! ```no_run
//! use phoenix_datasets::{collate, DatasetConfig, PhoenixVideoTextDataset};
//!
//! # fn main() -> Result<(), phoenix_datasets::DatasetError> {
//! let config = DatasetConfig {
//!     p_drop: 0.5,
//!     ..DatasetConfig::new("train")
//! };
//! let train =
//!     PhoenixVideoTextDataset::from_root("data/phoenix-2014-multisigner", config, None)?;
//!
//! let vocab = train.vocab();
//! let batch = collate(vec![train.get(0)?, train.get(1)?]);
//! assert_eq!(batch.label.len(), batch.video.len());
//! # Ok(())
//! # }
//! ```

pub mod collate;
pub mod corpus;
pub mod dataset;
pub mod error;
pub mod evaluator;
pub mod sampler;
pub mod transform;
pub mod vocab;

pub use crate::collate::{collate, Batch, DeprecationTracker};
pub use crate::corpus::{Corpus, PhoenixCorpus, SampleRecord};
pub use crate::dataset::{DatasetConfig, Example, PhoenixVideoTextDataset, VideoTextDataset};
pub use crate::error::DatasetError;
pub use crate::evaluator::{EvaluationReport, PhoenixEvaluator};
pub use crate::sampler::FrameSampler;
pub use crate::transform::FrameTransform;
pub use crate::vocab::LookupTable;
