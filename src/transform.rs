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
use image::imageops::FilterType;
use ndarray::Array3;
use rand::Rng;
use std::path::Path;

/// Top-left corner of a crop window, in pixels of the resized frame.
pub type CropOffset = (u32, u32);

/// # Frame transform
/// Decodes one frame file into a normalized channel-first tensor.
///
/// The pipeline is resize to `base_size`, crop to `crop_size`, scale to
/// `[0, 1]` and normalize per channel with the corpus mean and standard
/// deviation. The crop offset is an explicit argument so that callers can
/// draw all offsets for a video up front and then decode frames in
/// parallel without sharing a random source.
#[derive(Debug, Clone)]
pub struct FrameTransform {
    base_size: [u32; 2],
    crop_size: [u32; 2],
    mean: [f32; 3],
    std: [f32; 3],
}

impl FrameTransform {
    pub fn new(
        base_size: [u32; 2],
        crop_size: [u32; 2],
        mean: [f32; 3],
        std: [f32; 3],
    ) -> Result<FrameTransform, DatasetError> {
        if crop_size[0] > base_size[0] || crop_size[1] > base_size[1] {
            return Err(DatasetError::InvalidConfig(format!(
                "crop size {:?} exceeds base size {:?}",
                crop_size, base_size
            )));
        }
        Ok(FrameTransform {
            base_size,
            crop_size,
            mean,
            std,
        })
    }

    /// Output tensor shape, `(channels, height, width)`.
    pub fn output_shape(&self) -> (usize, usize, usize) {
        (3, self.crop_size[0] as usize, self.crop_size[1] as usize)
    }

    /// Draws a uniform crop offset within the resized frame.
    pub fn random_offset<R: Rng + ?Sized>(&self, rng: &mut R) -> CropOffset {
        let max_y = self.base_size[0] - self.crop_size[0];
        let max_x = self.base_size[1] - self.crop_size[1];
        (rng.gen_range(0..=max_x), rng.gen_range(0..=max_y))
    }

    /// The centered crop offset, used outside training-style sampling.
    pub fn center_offset(&self) -> CropOffset {
        (
            (self.base_size[1] - self.crop_size[1]) / 2,
            (self.base_size[0] - self.crop_size[0]) / 2,
        )
    }

    /// Decodes and transforms a single frame file.
    pub fn apply(&self, path: &Path, offset: CropOffset) -> Result<Array3<f32>, DatasetError> {
        let frame = image::open(path)?;
        let (crop_h, crop_w) = (self.crop_size[0], self.crop_size[1]);
        // resize_exact takes (width, height); sizes are stored (height, width)
        let frame = frame
            .resize_exact(self.base_size[1], self.base_size[0], FilterType::Triangle)
            .crop_imm(offset.0, offset.1, crop_w, crop_h)
            .to_rgb8();

        let mut tensor = Array3::<f32>::zeros((3, crop_h as usize, crop_w as usize));
        for (x, y, pixel) in frame.enumerate_pixels() {
            for channel in 0..3 {
                tensor[[channel, y as usize, x as usize]] = (pixel[channel] as f32 / 255.0
                    - self.mean[channel])
                    / self.std[channel];
            }
        }
        Ok(tensor)
    }
}
