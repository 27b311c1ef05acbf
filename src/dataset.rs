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

use crate::corpus::{Corpus, PhoenixCorpus, SampleRecord};
use crate::error::DatasetError;
use crate::sampler::FrameSampler;
use crate::transform::{CropOffset, FrameTransform};
use crate::vocab::LookupTable;
use ndarray::{Array4, Axis};
use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Dataset construction parameters. Defaults match the corpus conventions:
/// no frame dropping, random drop and random crop enabled, 256x256 base
/// frames cropped to 224x224.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Corpus split, e.g. train/dev/test
    pub split: String,
    /// Proportion of frames to drop
    #[serde(default)]
    pub p_drop: f64,
    /// If true, drop random frames, else drop at an even stride
    #[serde(default = "default_true")]
    pub random_drop: bool,
    /// If true, crop each frame at a random offset, else at the center
    #[serde(default = "default_true")]
    pub random_crop: bool,
    /// Frame size after resize, (height, width)
    #[serde(default = "default_base_size")]
    pub base_size: [u32; 2],
    /// Frame size after crop, (height, width)
    #[serde(default = "default_crop_size")]
    pub crop_size: [u32; 2],
}

fn default_true() -> bool {
    true
}

fn default_base_size() -> [u32; 2] {
    [256, 256]
}

fn default_crop_size() -> [u32; 2] {
    [224, 224]
}

impl DatasetConfig {
    pub fn new<S: Into<String>>(split: S) -> DatasetConfig {
        DatasetConfig {
            split: split.into(),
            p_drop: 0.0,
            random_drop: true,
            random_crop: true,
            base_size: default_base_size(),
            crop_size: default_crop_size(),
        }
    }
}

/// One materialized dataset item.
///
/// `video` is a `(frames, channels, height, width)` tensor of the subsampled
/// transformed frames; `label` is the annotation encoded through the
/// vocabulary. Frame subsampling and annotation length are independent, so
/// `video.shape()[0]` does not in general equal `label.len()`.
#[derive(Debug, Clone)]
pub struct Example {
    pub id: String,
    pub signer: String,
    pub annotation: Vec<String>,
    pub video: Array4<f32>,
    pub label: Vec<i64>,
}

/// # Video-text dataset
/// Randomly-indexable view over one corpus split.
///
/// Composes the corpus index, the frame sampler and the vocabulary: `get`
/// resolves a record's frame files, subsamples them, decodes and transforms
/// the kept frames in parallel, and encodes the annotation.
///
/// The corpus records and the vocabulary are loaded once at construction and
/// immutable afterwards, so one instance can be shared by a pool of workers
/// fetching disjoint indices. The randomness of a `get` call is local to the
/// call; use `get_with_rng` with a seeded generator for reproducible frame
/// selection.
pub struct VideoTextDataset<C: Corpus> {
    corpus: C,
    records: Vec<SampleRecord>,
    vocab: Arc<LookupTable>,
    sampler: FrameSampler,
    transform: FrameTransform,
    random_crop: bool,
}

/// The dataset over the PHOENIX-2014 multisigner corpus.
pub type PhoenixVideoTextDataset = VideoTextDataset<PhoenixCorpus>;

impl PhoenixVideoTextDataset {
    /// Opens the PHOENIX-2014 corpus at `root` (the folder containing
    /// `annotations/` and `features/`).
    pub fn from_root<P: AsRef<Path>>(
        root: P,
        config: DatasetConfig,
        vocab: Option<Arc<LookupTable>>,
    ) -> Result<PhoenixVideoTextDataset, DatasetError> {
        VideoTextDataset::new(PhoenixCorpus::new(root), config, vocab)
    }
}

impl<C: Corpus + Sync> VideoTextDataset<C> {
    /// Builds a dataset over one split.
    ///
    /// All construction-time checks (drop rate range, crop geometry, manifest
    /// presence, vocabulary availability) run here so that iteration cannot
    /// fail late on configuration problems. When `vocab` is `None` the corpus
    /// builds its default training-split vocabulary; pass the train dataset's
    /// `vocab()` to dev/test instances so all splits share one index space.
    pub fn new(
        corpus: C,
        config: DatasetConfig,
        vocab: Option<Arc<LookupTable>>,
    ) -> Result<VideoTextDataset<C>, DatasetError> {
        let sampler = FrameSampler::new(config.p_drop, config.random_drop)?;
        let transform = FrameTransform::new(
            config.base_size,
            config.crop_size,
            corpus.mean(),
            corpus.std(),
        )?;
        let records = corpus.load_data_frame(&config.split)?;
        let vocab = match vocab {
            Some(vocab) => vocab,
            None => Arc::new(corpus.create_vocab()?),
        };

        Ok(VideoTextDataset {
            corpus,
            records,
            vocab,
            sampler,
            transform,
            random_crop: config.random_crop,
        })
    }

    /// Number of records in the split.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The vocabulary in use, shareable with other dataset instances.
    pub fn vocab(&self) -> Arc<LookupTable> {
        Arc::clone(&self.vocab)
    }

    /// The loaded records, ordered by id.
    pub fn records(&self) -> &[SampleRecord] {
        &self.records
    }

    /// Materializes one example with call-local randomness.
    pub fn get(&self, index: usize) -> Result<Example, DatasetError> {
        self.get_with_rng(index, &mut rand::thread_rng())
    }

    /// Materializes one example, drawing frame-drop and crop randomness from
    /// `rng`. Two calls with identically seeded generators select the same
    /// frames and crops.
    pub fn get_with_rng<R: Rng + ?Sized>(
        &self,
        index: usize,
        rng: &mut R,
    ) -> Result<Example, DatasetError> {
        let record = self.records.get(index).ok_or_else(|| {
            DatasetError::IndexOutOfRange(format!(
                "dataset index {} not in [0, {})",
                index,
                self.records.len()
            ))
        })?;

        let frames = self.corpus.resolve_frames(record)?;
        let selected = self.sampler.select(frames.len(), rng);
        // offsets are drawn up front so the decode fan-out needs no rng
        let offsets: Vec<CropOffset> = selected
            .iter()
            .map(|_| {
                if self.random_crop {
                    self.transform.random_offset(rng)
                } else {
                    self.transform.center_offset()
                }
            })
            .collect();

        let tensors = selected
            .into_par_iter()
            .zip(offsets)
            .map(|(frame_index, offset)| self.transform.apply(&frames[frame_index], offset))
            .collect::<Result<Vec<_>, _>>()?;

        let (channels, height, width) = self.transform.output_shape();
        let video = if tensors.is_empty() {
            Array4::zeros((0, channels, height, width))
        } else {
            let views: Vec<_> = tensors.iter().map(|tensor| tensor.view()).collect();
            ndarray::stack(Axis(0), &views).map_err(|e| {
                DatasetError::InvalidConfig(format!("cannot stack frame tensors: {}", e))
            })?
        };

        let label = self.vocab.convert_tokens_to_ids(&record.annotation)?;

        Ok(Example {
            id: record.id.clone(),
            signer: record.signer.clone(),
            annotation: record.annotation.clone(),
            video,
            label,
        })
    }
}

//==============================
// Unit tests
//==============================
#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::fs;
    use std::path::Path;

    fn write_corpus(root: &Path, split: &str, samples: &[(&str, &str, usize)]) {
        let manifest_dir = root.join("annotations").join("manual");
        fs::create_dir_all(&manifest_dir).unwrap();
        let mut manifest = String::from("id|folder|signer|annotation\n");
        for (id, annotation, n_frames) in samples {
            manifest.push_str(&format!("{0}|{0}/1/*.png|Signer01|{1}\n", id, annotation));
            let frame_dir = root
                .join("features")
                .join("fullFrame-210x260px")
                .join(split)
                .join(id)
                .join("1");
            fs::create_dir_all(&frame_dir).unwrap();
            for frame in 0..*n_frames {
                RgbImage::from_pixel(16, 16, Rgb([frame as u8 * 10, 0, 0]))
                    .save(frame_dir.join(format!("images{:04}.png", frame + 1)))
                    .unwrap();
            }
        }
        fs::write(manifest_dir.join(format!("{}.corpus.csv", split)), manifest).unwrap();
    }

    fn small_config(split: &str) -> DatasetConfig {
        DatasetConfig {
            base_size: [8, 8],
            crop_size: [6, 6],
            random_crop: false,
            ..DatasetConfig::new(split)
        }
    }

    #[test]
    fn test_get_shapes_and_labels() -> anyhow::Result<()> {
        //        Given
        let root = tempfile::tempdir()?;
        write_corpus(root.path(), "train", &[("001", "A B", 4), ("002", "B C", 3)]);
        let dataset =
            PhoenixVideoTextDataset::from_root(root.path(), small_config("train"), None)?;

        //        When
        let example = dataset.get(0)?;

        //        Then
        assert_eq!(dataset.len(), 2);
        assert_eq!(example.id, "001");
        assert_eq!(example.signer, "Signer01");
        assert_eq!(example.annotation, vec!["A", "B"]);
        assert_eq!(example.video.shape(), &[4, 3, 6, 6]);
        assert_eq!(example.label, vec![0, 1]);
        Ok(())
    }

    #[test]
    fn test_index_out_of_range() -> anyhow::Result<()> {
        //        Given
        let root = tempfile::tempdir()?;
        write_corpus(root.path(), "train", &[("001", "A", 2)]);
        let dataset =
            PhoenixVideoTextDataset::from_root(root.path(), small_config("train"), None)?;

        //        When & Then
        assert!(matches!(
            dataset.get(1),
            Err(DatasetError::IndexOutOfRange(_))
        ));
        Ok(())
    }

    #[test]
    fn test_shared_vocab_across_splits() -> anyhow::Result<()> {
        //        Given
        let root = tempfile::tempdir()?;
        write_corpus(root.path(), "train", &[("001", "A B", 2), ("002", "B C", 2)]);
        write_corpus(root.path(), "dev", &[("101", "C OOV-GLOSS", 2)]);
        let train =
            PhoenixVideoTextDataset::from_root(root.path(), small_config("train"), None)?;

        //        When
        let dev = PhoenixVideoTextDataset::from_root(
            root.path(),
            small_config("dev"),
            Some(train.vocab()),
        )?;
        let example = dev.get(0)?;

        //        Then
        // C keeps the train index, the unseen gloss maps to the unk slot
        assert_eq!(example.label, vec![2, 3]);
        assert_eq!(train.vocab().size(), 4);
        Ok(())
    }

    #[test]
    fn test_full_drop_yields_empty_video() -> anyhow::Result<()> {
        //        Given
        let root = tempfile::tempdir()?;
        write_corpus(root.path(), "train", &[("001", "A B", 5)]);
        let config = DatasetConfig {
            p_drop: 1.0,
            ..small_config("train")
        };
        let dataset = PhoenixVideoTextDataset::from_root(root.path(), config, None)?;

        //        When
        let example = dataset.get(0)?;

        //        Then
        assert_eq!(example.video.shape(), &[0, 3, 6, 6]);
        // labels are not subsampled along with the frames
        assert_eq!(example.label.len(), 2);
        Ok(())
    }

    #[test]
    fn test_seeded_get_reproducible() -> anyhow::Result<()> {
        //        Given
        let root = tempfile::tempdir()?;
        write_corpus(root.path(), "train", &[("001", "A B", 10)]);
        let config = DatasetConfig {
            p_drop: 0.5,
            ..small_config("train")
        };
        let dataset = PhoenixVideoTextDataset::from_root(root.path(), config, None)?;

        //        When
        let first = dataset.get_with_rng(0, &mut StdRng::seed_from_u64(11))?;
        let second = dataset.get_with_rng(0, &mut StdRng::seed_from_u64(11))?;

        //        Then
        assert_eq!(first.video.shape(), second.video.shape());
        assert_eq!(first.video, second.video);
        Ok(())
    }

    #[test]
    fn test_invalid_drop_rate_fails_at_construction() -> anyhow::Result<()> {
        //        Given
        let root = tempfile::tempdir()?;
        write_corpus(root.path(), "train", &[("001", "A", 2)]);
        let config = DatasetConfig {
            p_drop: 1.5,
            ..small_config("train")
        };

        //        When & Then
        assert!(matches!(
            PhoenixVideoTextDataset::from_root(root.path(), config, None),
            Err(DatasetError::InvalidDropRate(_))
        ));
        Ok(())
    }
}
