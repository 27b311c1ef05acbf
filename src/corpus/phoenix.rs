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

use crate::corpus::{Corpus, SampleRecord};
use crate::error::DatasetError;
use itertools::Itertools;
use log::warn;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Frame variant used by this crate, the full RGB frames of the multisigner
/// release.
const FRAME_TYPE: &str = "fullFrame-210x260px";

/// Number of aligned training sequences in the PHOENIX-2014 release. The
/// alignment loader checks against this to catch silent corpus drift.
const EXPECTED_ALIGNMENT_ROWS: usize = 5671;

#[derive(Debug, Deserialize)]
struct ManifestRow {
    id: String,
    folder: String,
    signer: String,
    annotation: String,
}

#[derive(Debug)]
struct ClassRow {
    signstate: String,
    classlabel: i64,
}

/// One sequence of the merged frame-state alignment table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignedSequence {
    /// Gloss sentence derived from the per-frame sign states
    pub annotation: Vec<String>,

    /// Per-frame sign states (gloss plus trailing state digit), frame order
    pub signstate: Vec<String>,
}

/// # PHOENIX-2014 corpus
/// Manifest and frame-directory conventions of the RWTH-PHOENIX-Weather 2014
/// multisigner release.
///
/// Manifests live under `annotations/manual/<split>.corpus.csv` and are
/// `|`-delimited; frames live under `features/fullFrame-210x260px/<split>/...`
/// as zero-padded PNG sequences; the automatic frame alignment of the train
/// split lives under `annotations/automatic/`.
pub struct PhoenixCorpus {
    root: PathBuf,
    expected_alignment_rows: usize,
}

impl PhoenixCorpus {
    /// Normalization constants computed over the training split frames.
    pub const MEAN: [f32; 3] = [0.537_240_3, 0.527_285_5, 0.519_55];
    pub const STD: [f32; 3] = [1.0, 1.0, 1.0];

    /// `root` is the dataset folder containing `annotations/` and
    /// `features/`, e.g. `data/phoenix-2014-multisigner`.
    pub fn new<P: AsRef<Path>>(root: P) -> PhoenixCorpus {
        PhoenixCorpus {
            root: root.as_ref().to_path_buf(),
            expected_alignment_rows: EXPECTED_ALIGNMENT_ROWS,
        }
    }

    #[cfg(test)]
    fn with_expected_alignment_rows(mut self, expected_rows: usize) -> PhoenixCorpus {
        self.expected_alignment_rows = expected_rows;
        self
    }

    /// Loads the automatic per-frame alignment of the training split, merged
    /// into one gloss/signstate sentence pair per sequence id.
    pub fn load_alignment(&self) -> Result<BTreeMap<String, AlignedSequence>, DatasetError> {
        let dirname = self.root.join("annotations").join("automatic");

        let classes = read_space_delimited(&dirname.join("trainingClasses.txt"), true)?;
        let classes: HashMap<i64, String> = classes
            .into_iter()
            .map(|row| parse_class_row(&row).map(|class| (class.classlabel, class.signstate)))
            .collect::<Result<_, _>>()?;

        let alignment = read_space_delimited(&dirname.join("train.alignment"), false)?;

        let mut merged: BTreeMap<String, AlignedSequence> = BTreeMap::new();
        for row in alignment {
            if row.len() != 2 {
                return Err(DatasetError::CorpusLoad(format!(
                    "alignment row has {} fields, expected 2",
                    row.len()
                )));
            }
            let classlabel: i64 = row[1].parse().map_err(|_| {
                DatasetError::CorpusLoad(format!("invalid alignment class label: {}", row[1]))
            })?;
            let signstate = classes.get(&classlabel).ok_or_else(|| {
                DatasetError::CorpusLoad(format!(
                    "alignment class label {} missing from trainingClasses.txt",
                    classlabel
                ))
            })?;
            // frame paths look like .../fullFrame-210x260px/train/<id...>/1/<frame>.png;
            // the sequence id is everything between the split segment and the camera part
            let segments: Vec<&str> = row[0].split('/').collect();
            if segments.len() < 6 {
                return Err(DatasetError::CorpusLoad(format!(
                    "alignment frame path too short: {}",
                    row[0]
                )));
            }
            let id = segments[3..segments.len() - 2].join("/");

            let sequence = merged.entry(id).or_insert_with(|| AlignedSequence {
                annotation: Vec::new(),
                signstate: Vec::new(),
            });
            sequence
                .annotation
                .push(signstate.trim_end_matches(|c| matches!(c, '0'..='2')).to_owned());
            sequence.signstate.push(signstate.clone());
        }

        if merged.len() != self.expected_alignment_rows {
            return Err(DatasetError::CorpusLoad(format!(
                "alignment file is not correct, expected {} entries but got {}",
                self.expected_alignment_rows,
                merged.len()
            )));
        }
        Ok(merged)
    }

    fn load_split(&self, split: &str, aligned: bool) -> Result<Vec<SampleRecord>, DatasetError> {
        let path = self
            .root
            .join("annotations")
            .join("manual")
            .join(format!("{}.corpus.csv", split));
        let reader = csv::ReaderBuilder::new()
            .delimiter(b'|')
            .from_path(&path)
            .map_err(|e| {
                DatasetError::CorpusLoad(format!("cannot open manifest {}: {}", path.display(), e))
            })?;

        let mut records = Vec::new();
        for row in reader.into_deserialize() {
            let row: ManifestRow = row.map_err(|e| {
                DatasetError::CorpusLoad(format!(
                    "malformed manifest row in {}: {}",
                    path.display(),
                    e
                ))
            })?;
            records.push(SampleRecord {
                id: row.id,
                signer: row.signer,
                folder: format!("{}/{}", split, strip_last_segment(&row.folder)),
                annotation: row
                    .annotation
                    .split_whitespace()
                    .map(str::to_owned)
                    .collect(),
            });
        }

        if aligned {
            let alignment = self.load_alignment()?;
            records.retain(|record| alignment.contains_key(&record.id));
            for record in &mut records {
                record.annotation = alignment[&record.id].annotation.clone();
            }
        }

        records.sort_by(|a, b| a.id.cmp(&b.id));
        let duplicates = records.iter().map(|r| &r.id).duplicates().count();
        if duplicates > 0 {
            warn!(
                "{} duplicate sample ids in {} split manifest",
                duplicates, split
            );
        }
        Ok(records)
    }

    /// Like `load_data_frame`, but with the manifest annotation of the train
    /// split replaced by the gloss sentence of the automatic frame alignment.
    /// Only ids present in both tables are returned.
    pub fn load_data_frame_aligned(
        &self,
        split: &str,
    ) -> Result<Vec<SampleRecord>, DatasetError> {
        if split != "train" {
            return Err(DatasetError::CorpusLoad(format!(
                "alignment is only available for the train split, not {}",
                split
            )));
        }
        self.load_split(split, true)
    }
}

impl Corpus for PhoenixCorpus {
    fn load_data_frame(&self, split: &str) -> Result<Vec<SampleRecord>, DatasetError> {
        self.load_split(split, false)
    }

    fn resolve_frames(&self, record: &SampleRecord) -> Result<Vec<PathBuf>, DatasetError> {
        let dir = self
            .root
            .join("features")
            .join(FRAME_TYPE)
            .join(&record.folder);
        let entries = std::fs::read_dir(&dir).map_err(|e| {
            DatasetError::MissingFrames(format!("{} ({}): {}", record.id, dir.display(), e))
        })?;

        let mut frames: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().map_or(false, |ext| ext == "png"))
            .collect();
        if frames.is_empty() {
            return Err(DatasetError::MissingFrames(format!(
                "{} ({})",
                record.id,
                dir.display()
            )));
        }
        frames.sort();
        Ok(frames)
    }

    fn mean(&self) -> [f32; 3] {
        PhoenixCorpus::MEAN
    }

    fn std(&self) -> [f32; 3] {
        PhoenixCorpus::STD
    }
}

fn strip_last_segment(folder: &str) -> &str {
    match folder.rfind('/') {
        Some(position) => &folder[..position],
        None => folder,
    }
}

/// Space-delimited reader shared by the alignment file pair. The corpus uses
/// the literal string `NULL` as a real gloss, so values are kept verbatim.
fn read_space_delimited(path: &Path, has_headers: bool) -> Result<Vec<Vec<String>>, DatasetError> {
    let reader = csv::ReaderBuilder::new()
        .delimiter(b' ')
        .has_headers(has_headers)
        .from_path(path)
        .map_err(|e| {
            DatasetError::CorpusLoad(format!("cannot open {}: {}", path.display(), e))
        })?;
    reader
        .into_records()
        .map(|row| {
            row.map(|fields| fields.iter().map(str::to_owned).collect())
                .map_err(|e| {
                    DatasetError::CorpusLoad(format!("malformed row in {}: {}", path.display(), e))
                })
        })
        .collect()
}

fn parse_class_row(row: &[String]) -> Result<ClassRow, DatasetError> {
    if row.len() != 2 {
        return Err(DatasetError::CorpusLoad(format!(
            "class row has {} fields, expected 2",
            row.len()
        )));
    }
    Ok(ClassRow {
        signstate: row[0].clone(),
        classlabel: row[1].parse().map_err(|_| {
            DatasetError::CorpusLoad(format!("invalid class label: {}", row[1]))
        })?,
    })
}
