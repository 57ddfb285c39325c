// Copyright @yucwang 2023

use crate::math::constants::{ Float, Vector3f };

// Squared length below which a tangent vector counts as degenerate.
const DEGENERATE_LENGTH_SQUARED: Float = 1e-12;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    pub x: Vector3f,
    pub y: Vector3f,
    pub z: Vector3f
}

impl Default for Frame {
    fn default() -> Self {
        Frame {
            x: Vector3f::new(1.0, 0.0, 0.0),
            y: Vector3f::new(0.0, 1.0, 0.0),
            z: Vector3f::new(0.0, 0.0, 1.0)
        }
    }
}

impl Frame {
    pub fn new(new_x: Vector3f, new_y: Vector3f, new_z: Vector3f) -> Frame {
        Frame {
            x: new_x,
            y: new_y,
            z: new_z
        }
    }

    /// Builds an orthonormal frame whose z axis is `n`.
    pub fn from_normal(n: &Vector3f) -> Frame {
        let up = if n.z.abs() < 0.999 {
            Vector3f::new(0.0, 0.0, 1.0)
        } else {
            Vector3f::new(1.0, 0.0, 0.0)
        };
        let tangent = n.cross(&up).normalize();
        let bitangent = n.cross(&tangent).normalize();
        Frame::new(tangent, bitangent, *n)
    }

    /// Builds a frame from a normal and a (possibly unnormalized) tangent.
    /// The bitangent is derived, so a tangent parallel to the normal leaves
    /// a degenerate frame behind; see `is_degenerate`.
    pub fn from_tangent(n: &Vector3f, tangent: &Vector3f) -> Frame {
        let bitangent = n.cross(tangent);
        let bitangent = bitangent / bitangent.norm();
        let tangent = bitangent.cross(n);
        Frame::new(tangent, bitangent, *n)
    }

    /// True when the bitangent collapsed to (near) zero length or is NaN.
    pub fn is_degenerate(&self) -> bool {
        // Written so that NaN lands in the degenerate branch.
        !(self.y.norm_squared() > DEGENERATE_LENGTH_SQUARED)
    }

    /// Rebuilds the frame from the normal if the tangent basis is unusable.
    /// Returns whether a repair happened.
    pub fn repair(&mut self) -> bool {
        if self.is_degenerate() {
            *self = Frame::from_normal(&self.z);
            true
        } else {
            false
        }
    }

    pub fn to_local(&self, v: &Vector3f) -> Vector3f {
        Vector3f::new(v.dot(&self.x), v.dot(&self.y), v.dot(&self.z))
    }

    pub fn from_local(&self, v: &Vector3f) -> Vector3f {
        v.x * self.x + v.y * self.y + v.z * self.z
    }
}
