//! Host-side view of the compute shader's voxel grid
//!
//! The compute shader evaluates the scene at `R x R x R` points spread
//! evenly between `minBound` and `maxBound` and writes distance `(x, y, z)`
//! to `sdfData[z*R*R + y*R + x]`. These helpers let a host size the SSBO,
//! dispatch enough workgroups and read samples back.

use glam::{UVec3, Vec3};

/// Must match `local_size_{x,y,z}` in the compute header
pub const WORKGROUP_SIZE: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoxelGrid {
    pub resolution: u32,
    pub min_bound: Vec3,
    pub max_bound: Vec3,
}

impl VoxelGrid {
    pub fn new(resolution: u32, min_bound: Vec3, max_bound: Vec3) -> Self {
        Self {
            resolution,
            min_bound,
            max_bound,
        }
    }

    /// Cube of side `2 * half_extent` centred on the origin
    pub fn centered(resolution: u32, half_extent: f32) -> Self {
        Self::new(
            resolution,
            Vec3::splat(-half_extent),
            Vec3::splat(half_extent),
        )
    }

    /// Number of floats in the SSBO
    pub fn cell_count(&self) -> usize {
        let r = self.resolution as usize;
        r * r * r
    }

    /// SSBO size in bytes
    pub fn buffer_size(&self) -> usize {
        self.cell_count() * std::mem::size_of::<f32>()
    }

    pub fn contains(&self, cell: UVec3) -> bool {
        cell.cmplt(UVec3::splat(self.resolution)).all()
    }

    /// Flat index of a cell, or `None` outside the grid
    pub fn index(&self, cell: UVec3) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }
        let r = self.resolution as usize;
        Some(cell.z as usize * r * r + cell.y as usize * r + cell.x as usize)
    }

    /// Inverse of [`VoxelGrid::index`]
    pub fn coords(&self, index: usize) -> Option<UVec3> {
        if index >= self.cell_count() {
            return None;
        }
        let r = self.resolution as usize;
        Some(UVec3::new(
            (index % r) as u32,
            ((index / r) % r) as u32,
            (index / (r * r)) as u32,
        ))
    }

    /// World-space position sampled for a cell
    pub fn sample_point(&self, cell: UVec3) -> Vec3 {
        let steps = self.resolution.saturating_sub(1).max(1) as f32;
        let t = cell.as_vec3() / steps;
        self.min_bound + (self.max_bound - self.min_bound) * t
    }

    /// Workgroup counts for `glDispatchCompute`
    pub fn workgroups(&self) -> UVec3 {
        UVec3::splat(self.resolution.div_ceil(WORKGROUP_SIZE))
    }

    /// Every cell in buffer order
    pub fn cells(&self) -> impl Iterator<Item = UVec3> + '_ {
        (0..self.cell_count()).filter_map(|i| self.coords(i))
    }
}
