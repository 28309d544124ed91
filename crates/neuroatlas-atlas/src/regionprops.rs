// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Spatial properties of a region mask.

use neuroatlas_structures::{BoundingBox, Volume};
use std::fmt;

/// Size and location of a selected region in one space
#[derive(Debug, Clone, PartialEq)]
pub struct RegionProps {
    pub region: String,
    pub space: String,
    pub voxel_count: usize,
    /// Physical volume, in cubic units of the space
    pub volume: f64,
    /// Center of mass in physical coordinates; `None` for empty masks
    pub centroid: Option<[f64; 3]>,
    /// Physical extent of the voxel centers; `None` for empty masks
    pub bounding_box: Option<BoundingBox>,
}

impl RegionProps {
    pub fn from_mask(region: impl Into<String>, space: impl Into<String>, mask: &Volume) -> Self {
        let affine = mask.affine();
        let mut voxel_count = 0usize;
        let mut sum = [0.0f64; 3];
        let mut extent: Option<BoundingBox> = None;

        for voxel in mask.nonzero_voxels() {
            let point = affine.apply([voxel[0] as f64, voxel[1] as f64, voxel[2] as f64]);
            voxel_count += 1;
            for axis in 0..3 {
                sum[axis] += point[axis];
            }
            extent = Some(match extent {
                Some(bbox) => BoundingBox::from_corners(
                    [
                        bbox.min[0].min(point[0]),
                        bbox.min[1].min(point[1]),
                        bbox.min[2].min(point[2]),
                    ],
                    [
                        bbox.max[0].max(point[0]),
                        bbox.max[1].max(point[1]),
                        bbox.max[2].max(point[2]),
                    ],
                ),
                None => BoundingBox::from_corners(point, point),
            });
        }

        let centroid = (voxel_count > 0).then(|| {
            let n = voxel_count as f64;
            [sum[0] / n, sum[1] / n, sum[2] / n]
        });

        Self {
            region: region.into(),
            space: space.into(),
            voxel_count,
            volume: voxel_count as f64 * affine.voxel_volume(),
            centroid,
            bounding_box: extent,
        }
    }
}

impl fmt::Display for RegionProps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} in {}: {} voxels, volume {:.2}",
            self.region, self.space, self.voxel_count, self.volume
        )?;
        if let Some(c) = self.centroid {
            write!(f, ", centroid ({:.2}, {:.2}, {:.2})", c[0], c[1], c[2])?;
        }
        Ok(())
    }
}
