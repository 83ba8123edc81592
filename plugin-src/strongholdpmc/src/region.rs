//! Block positions and the cuboid volume a stronghold claims.
//!
//! Pure value types with no world access, so area rules can be tested on their own.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Integer voxel coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Axis-aligned, inclusive cuboid. `min <= max` on every axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpatialRegion {
    min: BlockPos,
    max: BlockPos,
}

impl SpatialRegion {
    /// Create a region from two arbitrary corners. Corners are sorted into min/max.
    #[must_use]
    pub fn new(a: BlockPos, b: BlockPos) -> Self {
        Self {
            min: BlockPos::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: BlockPos::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    /// The single-block region `{pos, pos}`.
    #[must_use]
    pub const fn point(pos: BlockPos) -> Self {
        Self { min: pos, max: pos }
    }

    /// Volume claimed by a stronghold anchored at `anchor`.
    ///
    /// Reaches `radius` blocks horizontally, `height` blocks up and
    /// `underground_limit` blocks down.
    #[must_use]
    pub fn around(anchor: BlockPos, radius: u32, height: u32, underground_limit: u32) -> Self {
        let clamp = |n: u32| i32::try_from(n).unwrap_or(i32::MAX);
        let r = clamp(radius);
        Self::new(
            BlockPos::new(
                anchor.x.saturating_sub(r),
                anchor.y.saturating_sub(clamp(underground_limit)),
                anchor.z.saturating_sub(r),
            ),
            BlockPos::new(
                anchor.x.saturating_add(r),
                anchor.y.saturating_add(clamp(height)),
                anchor.z.saturating_add(r),
            ),
        )
    }

    #[must_use]
    pub const fn min(&self) -> BlockPos {
        self.min
    }

    #[must_use]
    pub const fn max(&self) -> BlockPos {
        self.max
    }

    /// Whether `pos` lies in the region. Both corners count as inside.
    #[must_use]
    pub const fn contains(&self, pos: BlockPos) -> bool {
        pos.x >= self.min.x
            && pos.x <= self.max.x
            && pos.y >= self.min.y
            && pos.y <= self.max.y
            && pos.z >= self.min.z
            && pos.z <= self.max.z
    }

    /// Returns true if the two regions share at least one block.
    #[must_use]
    pub const fn intersects(&self, other: &Self) -> bool {
        self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
            && self.min.z <= other.max.z
            && other.min.z <= self.max.z
    }
}

impl fmt::Display for SpatialRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.min, self.max)
    }
}
