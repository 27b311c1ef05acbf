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

use crate::error::DatasetError;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// String representation used when decoding the reserved unknown slot.
pub const UNK_TOKEN: &str = "unk";

pub(crate) fn swap_key_values(input_hashmap: &HashMap<String, i64>) -> HashMap<i64, String> {
    input_hashmap
        .iter()
        .map(|(key, &value)| (value, key.clone()))
        .collect()
}

/// # Gloss lookup table
/// Bidirectional mapping between gloss tokens and dense indices.
///
/// Indices are assigned by lexicographic position over the deduplicated token
/// set, so two tables built from the same token multiset are identical. When
/// `allow_unk` is set, one extra trailing slot is reserved and out of
/// vocabulary tokens encode to it instead of failing.
///
/// The table is immutable after construction and can be shared across
/// train/dev/test dataset instances (typically behind an `Arc`) to guarantee
/// a single consistent index space.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupTable {
    /// A mapping of gloss tokens to indices (i.e. the encoder base)
    values: HashMap<String, i64>,

    /// A mapping of indices to gloss tokens (i.e. the decoder base)
    #[serde(skip)]
    indices: HashMap<i64, String>,

    /// If set, out of vocabulary tokens map to the trailing unknown slot
    allow_unk: bool,
}

impl LookupTable {
    /// Builds a table from sentences (token sequences).
    ///
    /// Tokens are flattened over all sentences, deduplicated and sorted
    /// lexicographically before index assignment.
    pub fn new<S, T>(sentences: &[S], allow_unk: bool) -> LookupTable
    where
        S: AsRef<[T]>,
        T: AsRef<str>,
    {
        let values: HashMap<String, i64> = sentences
            .iter()
            .flat_map(|sentence| sentence.as_ref().iter())
            .map(|token| token.as_ref())
            .sorted()
            .dedup()
            .enumerate()
            .map(|(index, token)| (token.to_owned(), index as i64))
            .collect();
        let indices = swap_key_values(&values);

        LookupTable {
            values,
            indices,
            allow_unk,
        }
    }

    /// Reads a table previously written with `to_file`.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<LookupTable, DatasetError> {
        let f = File::open(path.as_ref()).map_err(|e| {
            DatasetError::CorpusLoad(format!(
                "vocabulary file {} not found: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        let mut table: LookupTable = serde_json::from_reader(BufReader::new(f))?;
        table.indices = swap_key_values(&table.values);
        Ok(table)
    }

    /// Writes the table as JSON so other processes can reuse the exact same
    /// index assignment.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), DatasetError> {
        let f = File::create(path.as_ref())?;
        serde_json::to_writer(BufWriter::new(f), self)?;
        Ok(())
    }

    /// Converts a gloss token to its index.
    ///
    /// Out of vocabulary tokens yield the reserved unknown index when
    /// `allow_unk` is set and `DatasetError::UnknownToken` otherwise.
    pub fn token_to_id(&self, token: &str) -> Result<i64, DatasetError> {
        match self.values.get(token) {
            Some(index) => Ok(*index),
            None if self.allow_unk => Ok(self.size() as i64 - 1),
            None => Err(DatasetError::UnknownToken(token.to_owned())),
        }
    }

    /// Converts an index back to its gloss token. The reserved unknown slot
    /// decodes to the literal `"unk"`.
    pub fn id_to_token(&self, id: i64) -> Result<&str, DatasetError> {
        if id < 0 || id >= self.size() as i64 {
            return Err(DatasetError::IndexOutOfRange(format!(
                "index {} not in [0, {})",
                id,
                self.size()
            )));
        }
        match self.indices.get(&id) {
            Some(token) => Ok(token),
            None => Ok(UNK_TOKEN),
        }
    }

    /// Converts a sequence of tokens to a sequence of indices.
    pub fn convert_tokens_to_ids<T: AsRef<str>>(
        &self,
        tokens: &[T],
    ) -> Result<Vec<i64>, DatasetError> {
        tokens
            .iter()
            .map(|token| self.token_to_id(token.as_ref()))
            .collect()
    }

    /// Number of known tokens plus one for the unknown slot if reserved.
    pub fn size(&self) -> usize {
        self.values.len() + self.allow_unk as usize
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn allows_unk(&self) -> bool {
        self.allow_unk
    }
}

impl fmt::Display for LookupTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut entries: Vec<(&str, i64)> = self
            .values
            .iter()
            .map(|(token, &index)| (token.as_str(), index))
            .collect();
        entries.sort_by_key(|entry| entry.1);
        let mut map = f.debug_map();
        for (token, index) in entries {
            map.entry(&token, &index);
        }
        if self.allow_unk {
            map.entry(&UNK_TOKEN, &(self.size() as i64 - 1));
        }
        map.finish()
    }
}

//==============================
// Unit tests
//==============================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_sorted_deduplicated() {
        //        Given
        let sentences = vec![
            vec!["REGEN", "WOLKE"],
            vec!["WOLKE", "SONNE"],
            vec!["SONNE"],
        ];

        //        When
        let vocab = LookupTable::new(&sentences, false);

        //        Then
        assert_eq!(vocab.size(), 3);
        assert_eq!(vocab.token_to_id("REGEN").unwrap(), 0);
        assert_eq!(vocab.token_to_id("SONNE").unwrap(), 1);
        assert_eq!(vocab.token_to_id("WOLKE").unwrap(), 2);
    }

    #[test]
    fn test_unk_slot_appended() {
        //        Given
        let sentences = vec![vec!["A", "B"], vec!["B", "C"]];

        //        When
        let vocab = LookupTable::new(&sentences, true);

        //        Then
        assert_eq!(vocab.size(), 4);
        assert_eq!(vocab.token_to_id("A").unwrap(), 0);
        assert_eq!(vocab.token_to_id("B").unwrap(), 1);
        assert_eq!(vocab.token_to_id("C").unwrap(), 2);
        assert_eq!(vocab.token_to_id("OOV-GLOSS").unwrap(), 3);
        assert_eq!(vocab.id_to_token(3).unwrap(), "unk");
    }

    #[test]
    fn test_unknown_token_rejected_without_unk() {
        //        Given
        let vocab = LookupTable::new(&[vec!["A", "B"]], false);

        //        When
        let result = vocab.token_to_id("OOV-GLOSS");

        //        Then
        assert!(matches!(result, Err(DatasetError::UnknownToken(_))));
    }

    #[test]
    fn test_decode_out_of_range() {
        //        Given
        let vocab = LookupTable::new(&[vec!["A", "B"], vec!["B", "C"]], true);

        //        When & Then
        assert!(matches!(
            vocab.id_to_token(4),
            Err(DatasetError::IndexOutOfRange(_))
        ));
        assert!(matches!(
            vocab.id_to_token(-1),
            Err(DatasetError::IndexOutOfRange(_))
        ));
    }

    #[test]
    fn test_roundtrip_known_tokens() {
        //        Given
        let vocab = LookupTable::new(&[vec!["REGEN", "SONNE", "WOLKE"]], true);

        //        When & Then
        for token in &["REGEN", "SONNE", "WOLKE"] {
            let id = vocab.token_to_id(token).unwrap();
            assert_eq!(vocab.id_to_token(id).unwrap(), *token);
        }
    }

    #[test]
    fn test_stable_across_rebuilds() {
        //        Given
        let sentences = vec![vec!["B", "A"], vec!["C", "A"]];

        //        When
        let first = LookupTable::new(&sentences, true);
        let second = LookupTable::new(&sentences, true);

        //        Then
        for token in &["A", "B", "C"] {
            assert_eq!(
                first.token_to_id(token).unwrap(),
                second.token_to_id(token).unwrap()
            );
        }
    }

    #[test]
    fn test_encode_sentence() {
        //        Given
        let vocab = LookupTable::new(&[vec!["A", "B"], vec!["B", "C"]], true);

        //        When
        let ids = vocab.convert_tokens_to_ids(&["A", "B"]).unwrap();

        //        Then
        assert_eq!(ids, vec![0, 1]);
    }

    #[test]
    fn test_json_roundtrip() -> anyhow::Result<()> {
        //        Given
        let vocab = LookupTable::new(&[vec!["A", "B"], vec!["B", "C"]], true);
        let file = tempfile::NamedTempFile::new()?;

        //        When
        vocab.to_file(file.path())?;
        let reloaded = LookupTable::from_file(file.path())?;

        //        Then
        assert_eq!(reloaded.size(), vocab.size());
        assert!(reloaded.allows_unk());
        for token in &["A", "B", "C"] {
            assert_eq!(
                reloaded.token_to_id(token).unwrap(),
                vocab.token_to_id(token).unwrap()
            );
            let id = reloaded.token_to_id(token).unwrap();
            assert_eq!(reloaded.id_to_token(id).unwrap(), *token);
        }
        Ok(())
    }
}
