//! Per-instance bookkeeping of native GPU handles, grouped by kind.
//!
//! Every native resource allocated through an engine instance's factory is
//! registered here before use, and bulk-released exactly once in dependency
//! order: meshes detach from the scene graph first, then geometries and
//! materials give up their buffers/shaders, then textures, then raw buffers.

use hashbrown::HashSet;
use serde::{Deserialize, Serialize};

use crate::host::{
    BufferHandle, GeometryHandle, HostEngine, MaterialHandle, MeshHandle, TextureHandle,
};

/// Capability tag for native resource dispatch.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Mesh,
    Geometry,
    Material,
    Texture,
    Buffer,
}

impl ResourceKind {
    /// Teardown iterates kinds in reverse dependency direction.
    pub const TEARDOWN_ORDER: [ResourceKind; 5] = [
        ResourceKind::Mesh,
        ResourceKind::Geometry,
        ResourceKind::Material,
        ResourceKind::Texture,
        ResourceKind::Buffer,
    ];
}

/// Kind-tagged native handle, the unit the host engine destroys.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct RawHandle {
    pub kind: ResourceKind,
    pub index: u64,
}

impl From<MeshHandle> for RawHandle {
    fn from(h: MeshHandle) -> Self {
        Self { kind: ResourceKind::Mesh, index: h.0 }
    }
}

impl From<GeometryHandle> for RawHandle {
    fn from(h: GeometryHandle) -> Self {
        Self { kind: ResourceKind::Geometry, index: h.0 }
    }
}

impl From<MaterialHandle> for RawHandle {
    fn from(h: MaterialHandle) -> Self {
        Self { kind: ResourceKind::Material, index: h.0 }
    }
}

impl From<TextureHandle> for RawHandle {
    fn from(h: TextureHandle) -> Self {
        Self { kind: ResourceKind::Texture, index: h.0 }
    }
}

impl From<BufferHandle> for RawHandle {
    fn from(h: BufferHandle) -> Self {
        Self { kind: ResourceKind::Buffer, index: h.0 }
    }
}

/// Bulk-disposal registry of native GPU handles, one bucket per kind.
#[derive(Debug, Default)]
pub struct ResourceSet {
    meshes: HashSet<u64>,
    geometries: HashSet<u64>,
    materials: HashSet<u64>,
    textures: HashSet<u64>,
    buffers: HashSet<u64>,
    disposed: bool,
}

impl ResourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn bucket_mut(&mut self, kind: ResourceKind) -> &mut HashSet<u64> {
        match kind {
            ResourceKind::Mesh => &mut self.meshes,
            ResourceKind::Geometry => &mut self.geometries,
            ResourceKind::Material => &mut self.materials,
            ResourceKind::Texture => &mut self.textures,
            ResourceKind::Buffer => &mut self.buffers,
        }
    }

    fn bucket(&self, kind: ResourceKind) -> &HashSet<u64> {
        match kind {
            ResourceKind::Mesh => &self.meshes,
            ResourceKind::Geometry => &self.geometries,
            ResourceKind::Material => &self.materials,
            ResourceKind::Texture => &self.textures,
            ResourceKind::Buffer => &self.buffers,
        }
    }

    /// Register a native handle. Returns false if it was already tracked.
    pub fn register(&mut self, handle: RawHandle) -> bool {
        self.bucket_mut(handle.kind).insert(handle.index)
    }

    pub fn contains(&self, handle: RawHandle) -> bool {
        self.bucket(handle.kind).contains(&handle.index)
    }

    pub fn count(&self, kind: ResourceKind) -> usize {
        self.bucket(kind).len()
    }

    pub fn total(&self) -> usize {
        ResourceKind::TEARDOWN_ORDER
            .iter()
            .map(|k| self.bucket(*k).len())
            .sum()
    }

    #[inline]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Destroy and unregister every tracked handle, kinds in teardown order.
    /// Idempotent: an already-cleared set performs no host-engine calls.
    pub fn dispose(&mut self, host: &mut dyn HostEngine) {
        if self.disposed {
            return;
        }
        for kind in ResourceKind::TEARDOWN_ORDER {
            let handles: Vec<u64> = self.bucket_mut(kind).drain().collect();
            for index in handles {
                host.destroy_resource(RawHandle { kind, index });
            }
        }
        self.disposed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingHost {
        destroyed: Vec<RawHandle>,
    }

    impl HostEngine for RecordingHost {
        fn create_entity(&mut self, _parent: Option<crate::host::EntityHandle>) -> crate::host::EntityHandle {
            crate::host::EntityHandle(0)
        }
        fn destroy_entity(&mut self, _entity: crate::host::EntityHandle) {}
        fn set_parent(&mut self, _entity: crate::host::EntityHandle, _parent: crate::host::EntityHandle) {}
        fn entity_look_at(&mut self, _entity: crate::host::EntityHandle, _target: [f32; 3]) {}
        fn camera_position(&self) -> Option<[f32; 3]> {
            None
        }
        fn create_buffer(&mut self, _desc: &crate::host::BufferDescriptor) -> BufferHandle {
            BufferHandle(0)
        }
        fn create_geometry(&mut self, _desc: &crate::host::GeometryDescriptor) -> GeometryHandle {
            GeometryHandle(0)
        }
        fn create_texture(&mut self, _options: &crate::scene::TextureOptions) -> TextureHandle {
            TextureHandle(0)
        }
        fn create_material(&mut self, _desc: &crate::host::MaterialDescriptor) -> MaterialHandle {
            MaterialHandle(0)
        }
        fn create_mesh(&mut self, _desc: &crate::host::MeshDescriptor) -> MeshHandle {
            MeshHandle(0)
        }
        fn destroy_resource(&mut self, handle: RawHandle) {
            self.destroyed.push(handle);
        }
        fn set_material_param(
            &mut self,
            _material: MaterialHandle,
            _name: &str,
            _value: crate::host::MaterialParam,
        ) {
        }
        fn set_mesh_priority(&mut self, _mesh: MeshHandle, _priority: f32) {}
        fn set_mesh_visible(&mut self, _mesh: MeshHandle, _visible: bool) {}
        fn submit(&mut self, _meshes: &[MeshHandle]) {}
        fn start_video(&mut self, _texture: TextureHandle) {}
        fn offload_texture(&mut self, _texture: TextureHandle) {}
        fn take_render_errors(&mut self) -> Vec<String> {
            Vec::new()
        }
    }

    #[test]
    fn dispose_follows_teardown_order() {
        let mut set = ResourceSet::new();
        set.register(BufferHandle(1).into());
        set.register(TextureHandle(2).into());
        set.register(MaterialHandle(3).into());
        set.register(GeometryHandle(4).into());
        set.register(MeshHandle(5).into());

        let mut host = RecordingHost::default();
        set.dispose(&mut host);

        let kinds: Vec<ResourceKind> = host.destroyed.iter().map(|h| h.kind).collect();
        assert_eq!(kinds, ResourceKind::TEARDOWN_ORDER.to_vec());
    }

    #[test]
    fn dispose_is_idempotent() {
        let mut set = ResourceSet::new();
        set.register(MeshHandle(1).into());
        let mut host = RecordingHost::default();
        set.dispose(&mut host);
        assert_eq!(host.destroyed.len(), 1);
        set.dispose(&mut host);
        assert_eq!(host.destroyed.len(), 1, "no second round of destroy calls");
    }

    #[test]
    fn register_deduplicates() {
        let mut set = ResourceSet::new();
        assert!(set.register(MeshHandle(7).into()));
        assert!(!set.register(MeshHandle(7).into()));
        assert_eq!(set.count(ResourceKind::Mesh), 1);
    }
}
