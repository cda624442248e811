//! Per-frame counters

/// What the last [`Renderer::render`](super::Renderer::render) call did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Mesh nodes found in the scene
    pub meshes: usize,
    /// Mesh nodes skipped because they were hidden
    pub invisible_meshes: usize,
    /// Light nodes found, before truncation to the slot count
    pub lights: usize,
    /// Draws issued into the shadow map
    pub shadow_draw_calls: usize,
    /// Draws issued by the color pass
    pub draw_calls: usize,
}

impl FrameStats {
    /// Draws across both passes
    pub const fn total_draw_calls(&self) -> usize {
        self.shadow_draw_calls + self.draw_calls
    }
}
