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
use rand::seq::SliceRandom;
use rand::Rng;

/// # Frame sampler
/// Selects which frame indices of a video to keep under a drop-probability
/// policy.
///
/// Two modes exist. Random mode keeps a uniformly random subset of
/// `round(n * (1 - p_drop))` frames in their original temporal order, with
/// fresh randomness per call so parallel out-of-order fetches stay
/// independent. Deterministic mode walks the frame range at stride
/// `1 / (1 - p_drop)` and rounds each position to the nearest frame;
/// rounding may repeat a frame, which is accepted in favour of even spacing.
///
/// `p_drop == 1` keeps nothing: legal in random mode (the caller receives an
/// empty selection), rejected at construction in deterministic mode where the
/// stride would be undefined.
#[derive(Debug, Clone, Copy)]
pub struct FrameSampler {
    p_drop: f64,
    random: bool,
}

impl FrameSampler {
    pub fn new(p_drop: f64, random: bool) -> Result<FrameSampler, DatasetError> {
        if !(0.0..=1.0).contains(&p_drop) {
            return Err(DatasetError::InvalidDropRate(format!(
                "p_drop value {} is out of range [0, 1]",
                p_drop
            )));
        }
        if !random && p_drop >= 1.0 {
            return Err(DatasetError::InvalidDropRate(
                "p_drop = 1 is undefined for deterministic sampling (infinite stride)".to_owned(),
            ));
        }
        Ok(FrameSampler { p_drop, random })
    }

    /// Returns the kept indices into `[0, n)`, monotonically non-decreasing.
    ///
    /// `p_drop == 0` returns all of `[0, n)` unchanged in both modes.
    pub fn select<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Vec<usize> {
        let p_kept = 1.0 - self.p_drop;
        if self.random {
            let mut indices: Vec<usize> = (0..n).collect();
            indices.shuffle(rng);
            indices.truncate((n as f64 * p_kept).round() as usize);
            indices.sort_unstable();
            indices
        } else {
            let stride = 1.0 / p_kept;
            let mut indices = Vec::new();
            let mut step = 0usize;
            loop {
                let position = step as f64 * stride;
                if position >= n as f64 {
                    break;
                }
                indices.push((position.round() as usize).min(n.saturating_sub(1)));
                step += 1;
            }
            indices
        }
    }

    pub fn p_drop(&self) -> f64 {
        self.p_drop
    }

    pub fn is_random(&self) -> bool {
        self.random
    }
}
