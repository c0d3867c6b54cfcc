//! Per-composition engine scope.
//!
//! One instance per composition, never shared: every native resource a
//! composition needs is created through this scope so that disposing one
//! composition cannot free a resource still referenced by another. The
//! instance owns the composition's scene-graph root entity and the
//! ResourceSet that makes bulk teardown possible.

use crate::host::{
    BufferDescriptor, BufferHandle, EntityHandle, GeometryDescriptor, GeometryHandle, HostEngine,
    MaterialDescriptor, MaterialHandle, MeshDescriptor, MeshHandle, TextureHandle,
};
use crate::priority::PriorityResolver;
use crate::resource::ResourceSet;
use crate::scene::TextureOptions;

/// Scoped resource factory and scene-graph root for one composition.
#[derive(Debug)]
pub struct EngineInstance {
    resolver: PriorityResolver,
    root_entity: EntityHandle,
    resources: ResourceSet,
    disposed: bool,
}

impl EngineInstance {
    /// Create the instance scope: a fresh root entity parented under the
    /// display host's entity, with the user-assigned priority band base.
    pub fn new(host: &mut dyn HostEngine, parent: EntityHandle, priority: i32) -> Self {
        let root_entity = host.create_entity(Some(parent));
        Self {
            resolver: PriorityResolver::new(priority),
            root_entity,
            resources: ResourceSet::new(),
            disposed: false,
        }
    }

    #[inline]
    pub fn root_entity(&self) -> EntityHandle {
        self.root_entity
    }

    #[inline]
    pub fn priority(&self) -> i32 {
        self.resolver.base()
    }

    pub fn resolver(&self) -> &PriorityResolver {
        &self.resolver
    }

    pub fn resolver_mut(&mut self) -> &mut PriorityResolver {
        &mut self.resolver
    }

    pub fn resources(&self) -> &ResourceSet {
        &self.resources
    }

    /// Parent an entity under this composition's root.
    pub fn add_entity(&mut self, host: &mut dyn HostEngine, entity: EntityHandle) {
        host.set_parent(entity, self.root_entity);
    }

    pub fn create_buffer(
        &mut self,
        host: &mut dyn HostEngine,
        desc: &BufferDescriptor,
    ) -> BufferHandle {
        let handle = host.create_buffer(desc);
        self.resources.register(handle.into());
        handle
    }

    pub fn create_geometry(
        &mut self,
        host: &mut dyn HostEngine,
        desc: &GeometryDescriptor,
    ) -> GeometryHandle {
        let handle = host.create_geometry(desc);
        self.resources.register(handle.into());
        handle
    }

    pub fn create_texture(
        &mut self,
        host: &mut dyn HostEngine,
        options: &TextureOptions,
    ) -> TextureHandle {
        let handle = host.create_texture(options);
        self.resources.register(handle.into());
        handle
    }

    pub fn create_material(
        &mut self,
        host: &mut dyn HostEngine,
        desc: &MaterialDescriptor,
    ) -> MaterialHandle {
        let handle = host.create_material(desc);
        self.resources.register(handle.into());
        handle
    }

    pub fn create_mesh(&mut self, host: &mut dyn HostEngine, desc: &MeshDescriptor) -> MeshHandle {
        let handle = host.create_mesh(desc);
        self.resources.register(handle.into());
        handle
    }

    #[inline]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Release every tracked native resource and the root entity.
    /// Destroyed exactly once; a second call performs no host-engine calls.
    pub fn dispose(&mut self, host: &mut dyn HostEngine) {
        if self.disposed {
            return;
        }
        self.resources.dispose(host);
        host.destroy_entity(self.root_entity);
        self.disposed = true;
    }
}
