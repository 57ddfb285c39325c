// Copyright @yucwang 2026

use crate::core::hit::{RayFlags, RayPayload};
use crate::math::ray::Ray3f;

/// Ray/scene intersection backend.
///
/// Shadow payloads report `visible = true` only when nothing was found in
/// `[min_t, max_t]`. Scatter payloads receive the closest accepted hit, or
/// the invalid sentinel on a miss. With `RayFlags::RESOLVE_NESTED` every
/// candidate hit is first offered to `InteriorStack::resolve_candidate` on
/// the payload's interior, and rejected candidates are skipped.
pub trait RayCastService: Sync {
    fn trace(&self, ray: &Ray3f, flags: RayFlags, payload: &mut RayPayload);
}
