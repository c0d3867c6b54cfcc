//! Host-engine seam: entities, transforms, GPU resource factory, and render
//! submission.
//!
//! The runtime never talks to a concrete engine. Everything it needs from
//! the host — entity parenting, resource creation/destruction, material
//! parameter binding, ordered mesh submission — goes through this trait,
//! passed `&mut` into the operations that need it.

use serde::{Deserialize, Serialize};

use crate::resource::RawHandle;
use crate::scene::TextureOptions;

/// Opaque host scene-graph entity.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct EntityHandle(pub u64);

/// Opaque native GPU buffer.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct BufferHandle(pub u64);

/// Opaque native geometry (vertex/index layout bound to buffers).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct GeometryHandle(pub u64);

/// Opaque native texture.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct TextureHandle(pub u64);

/// Opaque native material (shader program + state + uniforms).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct MaterialHandle(pub u64);

/// Opaque native mesh renderer component.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct MeshHandle(pub u64);

/// Creation parameters for a raw GPU buffer.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BufferDescriptor {
    pub label: String,
    pub byte_length: usize,
}

/// Creation parameters for a geometry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GeometryDescriptor {
    pub label: String,
    pub vertex_buffer: BufferHandle,
    pub index_buffer: Option<BufferHandle>,
    pub vertex_count: u32,
}

/// Creation parameters for a material.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MaterialDescriptor {
    pub label: String,
    pub texture: Option<TextureHandle>,
    pub blending: bool,
    pub depth_test: bool,
}

/// Creation parameters for a mesh renderer component. The host creates the
/// backing entity itself and parents it under `parent`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MeshDescriptor {
    pub label: String,
    pub geometry: GeometryHandle,
    pub material: MaterialHandle,
    pub parent: EntityHandle,
}

/// Value written into a named material parameter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum MaterialParam {
    Float(f32),
    Vec2([f32; 2]),
    Vec4([f32; 4]),
    Matrix4([f32; 16]),
}

/// Services the host rendering engine provides to the runtime.
pub trait HostEngine {
    /// Create a scene-graph entity, optionally parented.
    fn create_entity(&mut self, parent: Option<EntityHandle>) -> EntityHandle;
    fn destroy_entity(&mut self, entity: EntityHandle);
    fn set_parent(&mut self, entity: EntityHandle, parent: EntityHandle);
    /// Turn an entity's transform toward a world-space point.
    fn entity_look_at(&mut self, entity: EntityHandle, target: [f32; 3]);
    /// World-space camera position, when the host exposes a camera.
    fn camera_position(&self) -> Option<[f32; 3]>;

    fn create_buffer(&mut self, desc: &BufferDescriptor) -> BufferHandle;
    fn create_geometry(&mut self, desc: &GeometryDescriptor) -> GeometryHandle;
    fn create_texture(&mut self, options: &TextureOptions) -> TextureHandle;
    fn create_material(&mut self, desc: &MaterialDescriptor) -> MaterialHandle;
    fn create_mesh(&mut self, desc: &MeshDescriptor) -> MeshHandle;
    /// Destroy a native resource and unregister it from the host's resource
    /// manager. Dispatched uniformly by kind tag.
    fn destroy_resource(&mut self, handle: RawHandle);

    fn set_material_param(&mut self, material: MaterialHandle, name: &str, value: MaterialParam);
    /// Assign the normalized draw-order value the host sorts by.
    fn set_mesh_priority(&mut self, mesh: MeshHandle, priority: f32);
    fn set_mesh_visible(&mut self, mesh: MeshHandle, visible: bool);

    /// Submit an ordered mesh list for this frame.
    fn submit(&mut self, meshes: &[MeshHandle]);
    /// (Re)start playback of a video-sourced texture.
    fn start_video(&mut self, texture: TextureHandle);
    /// Release a texture's GPU memory while the owning composition keeps its
    /// playback state, pending a later reload.
    fn offload_texture(&mut self, texture: TextureHandle);
    /// Drain render errors the host accumulated since the last call.
    fn take_render_errors(&mut self) -> Vec<String>;
}
