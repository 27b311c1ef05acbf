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

use crate::dataset::Example;
use lazy_static::lazy_static;
use log::warn;
use ndarray::Array4;
use std::collections::HashSet;
use std::sync::Mutex;

lazy_static! {
    static ref DEPRECATIONS: DeprecationTracker = DeprecationTracker::new();
}

/// Process-wide record of deprecated fields that have already been warned
/// about. Created empty at process start and mutated at most once per field
/// name; there is no reset short of a process restart.
///
/// `Batch::text` uses a process-global instance; an own instance can be
/// injected through `Batch::text_with_tracker` where the global lifecycle is
/// unwanted (e.g. tests).
#[derive(Debug, Default)]
pub struct DeprecationTracker {
    warned: Mutex<HashSet<&'static str>>,
}

impl DeprecationTracker {
    pub fn new() -> DeprecationTracker {
        DeprecationTracker::default()
    }

    /// Returns true on the first call for `field`, false afterwards.
    pub fn first_use(&self, field: &'static str) -> bool {
        // a poisoned lock degrades to a duplicate warning at worst
        let mut warned = match self.warned.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        warned.insert(field)
    }
}

/// Field-aligned batch of examples.
///
/// Every field holds one entry per input example, in input order. `video`
/// entries are the per-example `(frames, channels, height, width)` stacks;
/// frame counts differ between examples, so videos are kept as a list rather
/// than padded into a single tensor.
#[derive(Debug, Clone, Default)]
pub struct Batch {
    pub id: Vec<String>,
    pub signer: Vec<String>,
    pub annotation: Vec<Vec<String>>,
    pub video: Vec<Array4<f32>>,
    pub label: Vec<Vec<i64>>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_empty()
    }

    /// Deprecated alias for `label`, kept for backward compatibility with
    /// consumers of the historical `text` batch field. Warns once per
    /// process, then stays silent.
    #[deprecated(note = "use the label field instead")]
    pub fn text(&self) -> &[Vec<i64>] {
        self.text_with_tracker(&DEPRECATIONS)
    }

    /// `text` with an injected tracker instead of the process-global one.
    pub fn text_with_tracker(&self, tracker: &DeprecationTracker) -> &[Vec<i64>] {
        if tracker.first_use("text") {
            warn!("obtaining the label through the batch text field is deprecated, use label instead");
        }
        &self.label
    }
}

/// Combines examples into one batch, preserving input order in every field.
pub fn collate(examples: Vec<Example>) -> Batch {
    let mut batch = Batch::default();
    for example in examples {
        batch.id.push(example.id);
        batch.signer.push(example.signer);
        batch.annotation.push(example.annotation);
        batch.video.push(example.video);
        batch.label.push(example.label);
    }
    batch
}

//==============================
// Unit tests
//==============================
#[cfg(test)]
mod tests {
    use super::*;

    fn example(id: &str, label: Vec<i64>, frames: usize) -> Example {
        Example {
            id: id.to_owned(),
            signer: "Signer01".to_owned(),
            annotation: label.iter().map(|i| format!("G{}", i)).collect(),
            video: Array4::zeros((frames, 3, 2, 2)),
            label,
        }
    }

    #[test]
    fn test_collate_preserves_order_and_length() {
        //        Given
        let examples = vec![
            example("001", vec![0, 1], 4),
            example("002", vec![1, 2], 3),
            example("003", vec![2], 5),
        ];

        //        When
        let batch = collate(examples);

        //        Then
        assert_eq!(batch.len(), 3);
        assert_eq!(batch.id, vec!["001", "002", "003"]);
        assert_eq!(batch.signer.len(), 3);
        assert_eq!(batch.annotation.len(), 3);
        assert_eq!(batch.label, vec![vec![0, 1], vec![1, 2], vec![2]]);
        assert_eq!(batch.video.len(), 3);
        assert_eq!(batch.video[0].shape(), &[4, 3, 2, 2]);
        assert_eq!(batch.video[1].shape(), &[3, 3, 2, 2]);
    }

    #[test]
    fn test_collate_empty() {
        //        When
        let batch = collate(vec![]);

        //        Then
        assert!(batch.is_empty());
        assert!(batch.video.is_empty());
        assert!(batch.label.is_empty());
    }

    #[test]
    fn test_text_aliases_label() {
        //        Given
        let batch = collate(vec![example("001", vec![0, 1], 1)]);
        let tracker = DeprecationTracker::new();

        //        When & Then
        assert_eq!(batch.text_with_tracker(&tracker), batch.label.as_slice());
    }

    #[test]
    fn test_deprecation_warns_once_per_field() {
        //        Given
        let tracker = DeprecationTracker::new();

        //        When & Then
        assert!(tracker.first_use("text"));
        assert!(!tracker.first_use("text"));
        assert!(!tracker.first_use("text"));
        assert!(tracker.first_use("other"));
    }
}
