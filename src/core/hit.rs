// Copyright @yucwang 2026

use crate::core::interior::InteriorStack;
use crate::math::constants::Vector2f;

/// Compact reference to a ray/surface intersection that the shading
/// resolver can turn back into full shading data.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct HitDescriptor {
    pub object: u32,
    pub primitive: u32,
    pub barycentrics: Vector2f,
}

impl HitDescriptor {
    pub const INVALID_OBJECT: u32 = u32::MAX;

    pub fn new(object: u32, primitive: u32, barycentrics: Vector2f) -> Self {
        Self { object, primitive, barycentrics }
    }

    /// Sentinel for "the ray missed".
    pub fn invalid() -> Self {
        Self { object: Self::INVALID_OBJECT, primitive: 0, barycentrics: Vector2f::zeros() }
    }

    pub fn is_valid(&self) -> bool {
        self.object != Self::INVALID_OBJECT
    }
}

impl Default for HitDescriptor {
    fn default() -> Self {
        Self::invalid()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RayFlags(u8);

impl RayFlags {
    pub const NONE: Self = Self(0);
    /// Report the nearest intersection along the ray.
    pub const CLOSEST_HIT: Self = Self(1 << 0);
    /// Stop at the first intersection found, in any order.
    pub const ACCEPT_FIRST_HIT: Self = Self(1 << 1);
    /// Candidate hits are filtered through the payload's interior stack.
    pub const RESOLVE_NESTED: Self = Self(1 << 2);

    pub fn contains(self, other: Self) -> bool {
        (self.0 & other.0) != 0
    }
}

impl std::ops::BitOr for RayFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for RayFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowPayload {
    pub visible: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScatterPayload {
    pub hit: HitDescriptor,
    /// Interior accumulator; false intersections skipped during traversal
    /// are recorded here and committed by the caller.
    pub interior: InteriorStack,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RayPayload {
    Shadow(ShadowPayload),
    Scatter(ScatterPayload),
}
