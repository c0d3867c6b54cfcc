//! Ordered render passes assembled each tick.

use crate::host::MeshHandle;

/// One render pass: the meshes to submit this tick, in traversal order.
/// Actual draw order is decided by the host from each mesh's priority.
#[derive(Clone, Debug)]
pub struct RenderPass {
    pub name: String,
    pub meshes: Vec<MeshHandle>,
}

impl RenderPass {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            meshes: Vec::new(),
        }
    }
}

/// Ordered list of render passes. Pass 0 is the default pass, cleared and
/// rebuilt every tick; the frame is never retained across ticks without a
/// rebuild.
#[derive(Clone, Debug)]
pub struct RenderFrame {
    passes: Vec<RenderPass>,
}

impl RenderFrame {
    pub fn new() -> Self {
        Self {
            passes: vec![RenderPass::new("default")],
        }
    }

    /// Clear the default pass's mesh list at the start of `prepare_render`.
    pub fn begin_frame(&mut self) {
        self.passes[0].meshes.clear();
    }

    pub fn add_mesh_to_default_pass(&mut self, mesh: MeshHandle) {
        self.passes[0].meshes.push(mesh);
    }

    pub fn default_pass(&self) -> &RenderPass {
        &self.passes[0]
    }

    pub fn passes(&self) -> &[RenderPass] {
        &self.passes
    }

    pub fn mesh_count(&self) -> usize {
        self.passes.iter().map(|p| p.meshes.len()).sum()
    }
}

impl Default for RenderFrame {
    fn default() -> Self {
        Self::new()
    }
}
