// Copyright @yucwang 2026

use crate::core::scene::Scene;
use crate::math::bitmap::Bitmap;

pub trait Renderer {
    /// Renders the renderer's camera of `scene`. An empty bitmap means the
    /// camera does not exist or has no pixels.
    fn render(&self, scene: &mut Scene) -> Bitmap;
}
