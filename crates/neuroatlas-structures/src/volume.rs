// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Image volumes with their voxel-to-physical affine transform.

Values are stored as `f32` regardless of the map type: label indices,
probabilities, template intensities and binary masks all fit.
*/

use ahash::AHashSet;
use ndarray::{Array3, Zip};
use serde::{Deserialize, Serialize};

use crate::error::{AtlasDataError, AtlasDataResult};

/// Homogeneous 4x4 transform from voxel indices to physical coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine([[f64; 4]; 4]);

impl Affine {
    pub fn new(rows: [[f64; 4]; 4]) -> Self {
        Self(rows)
    }

    pub fn identity() -> Self {
        let mut rows = [[0.0; 4]; 4];
        for (i, row) in rows.iter_mut().enumerate() {
            row[i] = 1.0;
        }
        Self(rows)
    }

    /// Isotropic scaling by `voxel_size` followed by a translation
    pub fn from_scale_and_origin(voxel_size: f64, origin: [f64; 3]) -> Self {
        let mut affine = Self::identity();
        for axis in 0..3 {
            affine.0[axis][axis] = voxel_size;
            affine.0[axis][3] = origin[axis];
        }
        affine
    }

    pub fn rows(&self) -> &[[f64; 4]; 4] {
        &self.0
    }

    /// Transform a point
    pub fn apply(&self, point: [f64; 3]) -> [f64; 3] {
        let m = &self.0;
        let mut out = [0.0; 3];
        for (i, value) in out.iter_mut().enumerate() {
            *value = m[i][0] * point[0] + m[i][1] * point[1] + m[i][2] * point[2] + m[i][3];
        }
        out
    }

    /// Inverse transform, by Gauss-Jordan elimination with partial pivoting
    ///
    /// # Errors
    /// Fails for singular matrices.
    pub fn inverse(&self) -> AtlasDataResult<Affine> {
        let mut a = self.0;
        let mut inv = Self::identity().0;

        for col in 0..4 {
            let pivot = (col..4)
                .max_by(|&x, &y| a[x][col].abs().total_cmp(&a[y][col].abs()))
                .unwrap_or(col);
            if a[pivot][col].abs() < 1e-12 {
                return Err(AtlasDataError::BadParameters(format!(
                    "affine {:?} is not invertible",
                    self.0
                )));
            }
            a.swap(col, pivot);
            inv.swap(col, pivot);

            let scale = a[col][col];
            for k in 0..4 {
                a[col][k] /= scale;
                inv[col][k] /= scale;
            }

            for row in 0..4 {
                if row == col {
                    continue;
                }
                let factor = a[row][col];
                if factor == 0.0 {
                    continue;
                }
                for k in 0..4 {
                    a[row][k] -= factor * a[col][k];
                    inv[row][k] -= factor * inv[col][k];
                }
            }
        }

        Ok(Affine(inv))
    }

    /// Physical volume of a single voxel (absolute determinant of the linear part)
    pub fn voxel_volume(&self) -> f64 {
        let m = &self.0;
        let det = m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
            - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
            + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0]);
        det.abs()
    }
}

impl Default for Affine {
    fn default() -> Self {
        Self::identity()
    }
}

/// Axis-aligned box in physical coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl BoundingBox {
    /// Smallest box containing both corners, in any order
    pub fn from_corners(a: [f64; 3], b: [f64; 3]) -> Self {
        let mut min = [0.0; 3];
        let mut max = [0.0; 3];
        for axis in 0..3 {
            min[axis] = a[axis].min(b[axis]);
            max[axis] = a[axis].max(b[axis]);
        }
        Self { min, max }
    }

    pub fn contains(&self, point: [f64; 3]) -> bool {
        (0..3).all(|axis| point[axis] >= self.min[axis] && point[axis] <= self.max[axis])
    }
}

/// A 3D image with its affine
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    data: Array3<f32>,
    affine: Affine,
}

impl Volume {
    pub fn new(data: Array3<f32>, affine: Affine) -> Self {
        Self { data, affine }
    }

    pub fn data(&self) -> &Array3<f32> {
        &self.data
    }

    pub fn affine(&self) -> &Affine {
        &self.affine
    }

    pub fn shape(&self) -> [usize; 3] {
        let (x, y, z) = self.data.dim();
        [x, y, z]
    }

    /// Value at a voxel, `None` outside the grid (including negative indices)
    pub fn value_at(&self, voxel: [i64; 3]) -> Option<f32> {
        let shape = self.shape();
        let mut index = [0usize; 3];
        for axis in 0..3 {
            if voxel[axis] < 0 || voxel[axis] as usize >= shape[axis] {
                return None;
            }
            index[axis] = voxel[axis] as usize;
        }
        Some(self.data[index])
    }

    /// Binary mask of voxels strictly above `threshold`
    pub fn threshold(&self, threshold: f32) -> Volume {
        Volume {
            data: self.data.mapv(|v| if v > threshold { 1.0 } else { 0.0 }),
            affine: self.affine,
        }
    }

    /// Binary mask of voxels whose label is one of `labels`
    pub fn select_labels(&self, labels: &AHashSet<u32>) -> Volume {
        Volume {
            data: self.data.mapv(|v| {
                let label = v.round();
                if label > 0.0 && labels.contains(&(label as u32)) {
                    1.0
                } else {
                    0.0
                }
            }),
            affine: self.affine,
        }
    }

    /// Voxel-wise maximum of two volumes on the same grid
    ///
    /// # Errors
    /// Fails if the shapes or affines differ.
    pub fn union(&self, other: &Volume) -> AtlasDataResult<Volume> {
        if self.data.dim() != other.data.dim() || self.affine != other.affine {
            return Err(AtlasDataError::BadParameters(format!(
                "cannot combine volumes of shape {:?} and {:?} on different grids",
                self.shape(),
                other.shape()
            )));
        }
        let mut data = self.data.clone();
        Zip::from(&mut data)
            .and(&other.data)
            .for_each(|a, &b| *a = a.max(b));
        Ok(Volume {
            data,
            affine: self.affine,
        })
    }

    /// Indices of all nonzero voxels
    pub fn nonzero_voxels(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        self.data
            .indexed_iter()
            .filter(|(_, &v)| v != 0.0)
            .map(|((x, y, z), _)| [x, y, z])
    }

    /// Convert a physical coordinate into the voxel containing it.
    ///
    /// Rounds half up, so points half a voxel or more below the grid map to
    /// negative indices rather than onto the first voxel. Non-finite
    /// coordinates are rejected.
    pub fn physical_to_voxel(&self, point: [f64; 3]) -> AtlasDataResult<[i64; 3]> {
        let voxel = self.affine.inverse()?.apply(point);
        if !voxel.iter().all(|v| v.is_finite()) {
            return Err(AtlasDataError::BadParameters(format!(
                "coordinate {:?} has no voxel position",
                point
            )));
        }
        Ok([
            (voxel[0] + 0.5).floor() as i64,
            (voxel[1] + 0.5).floor() as i64,
            (voxel[2] + 0.5).floor() as i64,
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: [f64; 3], b: [f64; 3]) -> bool {
        (0..3).all(|i| (a[i] - b[i]).abs() < 1e-9)
    }

    #[test]
    fn test_inverse_round_trip() {
        let affine = Affine::new([
            [0.0, -2.0, 0.0, 90.0],
            [1.5, 0.0, 0.0, -126.0],
            [0.0, 0.0, 2.0, -72.0],
            [0.0, 0.0, 0.0, 1.0],
        ]);
        let inverse = affine.inverse().unwrap();
        let point = [3.0, 7.0, 11.0];
        assert!(approx(inverse.apply(affine.apply(point)), point));
    }

    #[test]
    fn test_singular_affine_rejected() {
        let mut rows = *Affine::identity().rows();
        rows[2][2] = 0.0;
        assert!(Affine::new(rows).inverse().is_err());
    }

    #[test]
    fn test_voxel_volume() {
        let affine = Affine::from_scale_and_origin(2.0, [0.0; 3]);
        assert!((affine.voxel_volume() - 8.0).abs() < 1e-12);
    }

    #[test]
    fn test_value_at_bounds() {
        let volume = Volume::new(Array3::from_elem((2, 3, 4), 1.0), Affine::identity());
        assert_eq!(volume.value_at([1, 2, 3]), Some(1.0));
        assert_eq!(volume.value_at([2, 0, 0]), None);
        assert_eq!(volume.value_at([0, -1, 0]), None);
    }

    #[test]
    fn test_select_labels_and_union() {
        let mut data = Array3::zeros((3, 1, 1));
        data[[0, 0, 0]] = 1.0;
        data[[1, 0, 0]] = 2.0;
        data[[2, 0, 0]] = 3.0;
        let labels = Volume::new(data, Affine::identity());

        let left = labels.select_labels(&[1].into_iter().collect());
        let right = labels.select_labels(&[3].into_iter().collect());
        let both = left.union(&right).unwrap();

        let voxels: Vec<_> = both.nonzero_voxels().collect();
        assert_eq!(voxels, vec![[0, 0, 0], [2, 0, 0]]);
    }

    #[test]
    fn test_physical_to_voxel_rounds_half_up() {
        let volume = Volume::new(
            Array3::zeros((10, 10, 10)),
            Affine::from_scale_and_origin(2.0, [-10.0, -10.0, -10.0]),
        );
        // (x + 10) / 2 = 2.5 -> 3
        assert_eq!(volume.physical_to_voxel([-5.0, -6.0, -10.0]).unwrap(), [3, 2, 0]);
        // (x + 10) / 2 = -0.5 -> 0, the lower edge of the first voxel
        assert_eq!(volume.physical_to_voxel([-11.0, -10.0, -10.0]).unwrap(), [0, 0, 0]);
        // (x + 10) / 2 = -0.6 -> -1, outside the grid
        assert_eq!(volume.physical_to_voxel([-11.2, -10.0, -10.0]).unwrap(), [-1, 0, 0]);
        assert_eq!(volume.value_at([-1, 0, 0]), None);
    }

    #[test]
    fn test_physical_to_voxel_rejects_non_finite() {
        let volume = Volume::new(Array3::zeros((2, 2, 2)), Affine::identity());
        for point in [[f64::NAN, 0.0, 0.0], [0.0, f64::INFINITY, 0.0], [0.0, 0.0, f64::NEG_INFINITY]] {
            let err = volume.physical_to_voxel(point).unwrap_err();
            assert!(matches!(err, AtlasDataError::BadParameters(_)), "{:?}", point);
        }
    }
}
