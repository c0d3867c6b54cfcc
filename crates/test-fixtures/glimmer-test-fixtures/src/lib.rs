//! Shared fixtures for glimmer integration tests: a recording mock host
//! engine, a scriptable mock scene loader, and canned scene builders.

use std::collections::{HashMap, HashSet};

use anyhow::{Context, Result};
use once_cell::sync::Lazy;

use glimmer_player_core::{
    BufferDescriptor, BufferHandle, EndBehavior, EntityHandle, GeometryDescriptor, GeometryHandle,
    HostEngine, InteractBehavior, InteractSpec, ItemSpec, LoadOptions, LoadPoll, MaterialDescriptor,
    MaterialHandle, MaterialParam, MeshDescriptor, MeshHandle, RawHandle, ReloadPoll, RenderLevel,
    RendererKind, RendererSpec, RequestId, Scene, SceneLoader, SceneSource, SceneStatistic,
    TextureFilter, TextureHandle, TextureOptions, TextureSource, TextureWrap,
};

static FIXTURE_SCENE: Lazy<Scene> = Lazy::new(|| {
    let raw = include_str!("../fixtures/simple_scene.json");
    serde_json::from_str(raw).expect("fixture scene should parse")
});

/// The canned scene stored under `fixtures/simple_scene.json`.
pub fn fixture_scene() -> Scene {
    FIXTURE_SCENE.clone()
}

/// Parse a scene from JSON text, with context on failure.
pub fn load_scene_json(text: &str) -> Result<Scene> {
    serde_json::from_str(text).context("failed to parse scene JSON")
}

/// Sprite item spec with the given local render order.
pub fn sprite_item(name: &str, local_priority: u32) -> ItemSpec {
    ItemSpec {
        id: format!("{name}-id"),
        name: name.to_string(),
        delay: 0.0,
        duration: 2.0,
        content: Some(RendererSpec {
            kind: RendererKind::Sprite,
            local_priority,
            texture: Some(0),
            size: [1.0, 1.0],
        }),
        interact: None,
        children: Vec::new(),
    }
}

/// Two-sprite scene with one image texture. Duration 2s, freeze at end.
pub fn simple_scene(name: &str) -> Scene {
    Scene {
        name: name.to_string(),
        duration: 2.0,
        end_behavior: EndBehavior::Freeze,
        render_level: RenderLevel::A,
        items: vec![sprite_item("front", 1), sprite_item("back", 0)],
        texture_options: vec![TextureOptions {
            name: format!("{name}/atlas"),
            source: TextureSource::Image {
                url: format!("https://assets.example.com/{name}.png"),
            },
            wrap: TextureWrap::Clamp,
            filter: TextureFilter::Bilinear,
            flip_y: false,
        }],
        statistic: SceneStatistic { load_time_ms: 5.0 },
    }
}

/// Scene declaring the low render-quality tier.
pub fn low_quality_scene(name: &str) -> Scene {
    Scene {
        render_level: RenderLevel::B,
        ..simple_scene(name)
    }
}

/// Scene whose composition self-destroys at its 1s duration.
pub fn disposing_scene(name: &str) -> Scene {
    Scene {
        duration: 1.0,
        end_behavior: EndBehavior::Dispose,
        ..simple_scene(name)
    }
}

/// Scene with a full-surface interactive region.
pub fn interactive_scene(name: &str, behavior: InteractBehavior) -> Scene {
    let mut scene = simple_scene(name);
    scene.items.push(ItemSpec {
        id: format!("{name}-hit-id"),
        name: format!("{name}-hit"),
        delay: 0.0,
        duration: 2.0,
        content: None,
        interact: Some(InteractSpec {
            behavior,
            bounds: [0.0, 0.0, 1.0, 1.0],
        }),
        children: Vec::new(),
    });
    scene
}

/// Scene with one video-sourced texture.
pub fn video_scene(name: &str) -> Scene {
    let mut scene = simple_scene(name);
    scene.texture_options.push(TextureOptions {
        name: format!("{name}/video"),
        source: TextureSource::Video {
            url: format!("https://assets.example.com/{name}.mp4"),
        },
        wrap: TextureWrap::Repeat,
        filter: TextureFilter::Bilinear,
        flip_y: false,
    });
    scene
}

/// Recording implementation of `HostEngine`. Every create/destroy and
/// submission is captured so tests can assert teardown order, idempotence,
/// and per-tick submission batches.
#[derive(Default)]
pub struct MockHostEngine {
    next_handle: u64,
    pub created: Vec<RawHandle>,
    pub destroyed: Vec<RawHandle>,
    pub entities_created: Vec<EntityHandle>,
    pub entities_destroyed: Vec<EntityHandle>,
    pub parents: HashMap<u64, u64>,
    pub submissions: Vec<Vec<MeshHandle>>,
    pub look_at_calls: Vec<(EntityHandle, [f32; 3])>,
    pub camera: Option<[f32; 3]>,
    pub videos_started: Vec<TextureHandle>,
    pub offloaded: Vec<TextureHandle>,
    pub material_params: Vec<(MaterialHandle, String, MaterialParam)>,
    pub mesh_priorities: HashMap<u64, f32>,
    pub mesh_visibility: HashMap<u64, bool>,
    render_errors: Vec<String>,
}

impl MockHostEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    /// Queue a render error for the next `take_render_errors` drain.
    pub fn inject_render_error(&mut self, message: impl Into<String>) {
        self.render_errors.push(message.into());
    }

    /// Number of destroy calls recorded for one resource kind.
    pub fn destroyed_of_kind(&self, kind: glimmer_player_core::ResourceKind) -> usize {
        self.destroyed.iter().filter(|h| h.kind == kind).count()
    }
}

impl HostEngine for MockHostEngine {
    fn create_entity(&mut self, parent: Option<EntityHandle>) -> EntityHandle {
        let entity = EntityHandle(self.alloc());
        if let Some(parent) = parent {
            self.parents.insert(entity.0, parent.0);
        }
        self.entities_created.push(entity);
        entity
    }

    fn destroy_entity(&mut self, entity: EntityHandle) {
        self.entities_destroyed.push(entity);
    }

    fn set_parent(&mut self, entity: EntityHandle, parent: EntityHandle) {
        self.parents.insert(entity.0, parent.0);
    }

    fn entity_look_at(&mut self, entity: EntityHandle, target: [f32; 3]) {
        self.look_at_calls.push((entity, target));
    }

    fn camera_position(&self) -> Option<[f32; 3]> {
        self.camera
    }

    fn create_buffer(&mut self, _desc: &BufferDescriptor) -> BufferHandle {
        let handle = BufferHandle(self.alloc());
        self.created.push(handle.into());
        handle
    }

    fn create_geometry(&mut self, _desc: &GeometryDescriptor) -> GeometryHandle {
        let handle = GeometryHandle(self.alloc());
        self.created.push(handle.into());
        handle
    }

    fn create_texture(&mut self, _options: &TextureOptions) -> TextureHandle {
        let handle = TextureHandle(self.alloc());
        self.created.push(handle.into());
        handle
    }

    fn create_material(&mut self, _desc: &MaterialDescriptor) -> MaterialHandle {
        let handle = MaterialHandle(self.alloc());
        self.created.push(handle.into());
        handle
    }

    fn create_mesh(&mut self, _desc: &MeshDescriptor) -> MeshHandle {
        let handle = MeshHandle(self.alloc());
        self.created.push(handle.into());
        handle
    }

    fn destroy_resource(&mut self, handle: RawHandle) {
        self.destroyed.push(handle);
    }

    fn set_material_param(&mut self, material: MaterialHandle, name: &str, value: MaterialParam) {
        self.material_params.push((material, name.to_string(), value));
    }

    fn set_mesh_priority(&mut self, mesh: MeshHandle, priority: f32) {
        self.mesh_priorities.insert(mesh.0, priority);
    }

    fn set_mesh_visible(&mut self, mesh: MeshHandle, visible: bool) {
        self.mesh_visibility.insert(mesh.0, visible);
    }

    fn submit(&mut self, meshes: &[MeshHandle]) {
        self.submissions.push(meshes.to_vec());
    }

    fn start_video(&mut self, texture: TextureHandle) {
        self.videos_started.push(texture);
    }

    fn offload_texture(&mut self, texture: TextureHandle) {
        self.offloaded.push(texture);
    }

    fn take_render_errors(&mut self) -> Vec<String> {
        std::mem::take(&mut self.render_errors)
    }
}

/// Scriptable implementation of `SceneLoader`. By default every load and
/// reload settles on the first poll; `hold()` / `hold_reloads()` keep them
/// pending until explicitly released, which is how the race tests stage
/// out-of-order completion.
#[derive(Default)]
pub struct MockSceneLoader {
    scenes: HashMap<u32, Scene>,
    failures: HashMap<u32, String>,
    hold_loads: bool,
    released_loads: HashSet<u32>,
    hold_reloads: bool,
    released_reloads: HashSet<u32>,
    reload_requests: HashSet<u32>,
    pub load_begins: usize,
    pub reload_begins: usize,
}

impl MockSceneLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep subsequent loads pending until `release` is called for them.
    pub fn hold(&mut self) {
        self.hold_loads = true;
    }

    pub fn release(&mut self, request: RequestId) {
        self.released_loads.insert(request.0);
    }

    pub fn release_all(&mut self) {
        let all: Vec<u32> = self.scenes.keys().copied().collect();
        self.released_loads.extend(all);
    }

    /// Make the given request fail instead of producing a scene.
    pub fn fail(&mut self, request: RequestId, reason: impl Into<String>) {
        self.failures.insert(request.0, reason.into());
    }

    /// Keep texture reloads pending until `release_reloads` is called.
    pub fn hold_reloads(&mut self) {
        self.hold_reloads = true;
    }

    pub fn release_reloads(&mut self) {
        let all: Vec<u32> = self.reload_requests.iter().copied().collect();
        self.released_reloads.extend(all);
    }

    fn scene_for(source: &SceneSource) -> Scene {
        match source {
            SceneSource::Scene(scene) => (**scene).clone(),
            SceneSource::Url(url) => simple_scene(url),
            SceneSource::Json(value) => {
                serde_json::from_value(value.clone()).unwrap_or_else(|_| simple_scene("json-scene"))
            }
        }
    }
}

impl SceneLoader for MockSceneLoader {
    fn begin_load(&mut self, request: RequestId, source: &SceneSource, _options: &LoadOptions) {
        self.load_begins += 1;
        self.scenes.insert(request.0, Self::scene_for(source));
    }

    fn poll_load(&mut self, request: RequestId) -> LoadPoll {
        if let Some(reason) = self.failures.get(&request.0) {
            return LoadPoll::Failed(reason.clone());
        }
        if self.hold_loads && !self.released_loads.contains(&request.0) {
            return LoadPoll::Pending;
        }
        match self.scenes.remove(&request.0) {
            Some(scene) => LoadPoll::Ready(scene),
            None => LoadPoll::Failed(format!("unknown load request {}", request.0)),
        }
    }

    fn begin_texture_reload(&mut self, request: RequestId, _textures: &[TextureHandle]) {
        self.reload_begins += 1;
        self.reload_requests.insert(request.0);
    }

    fn poll_reload(&mut self, request: RequestId) -> ReloadPoll {
        if self.hold_reloads && !self.released_reloads.contains(&request.0) {
            return ReloadPoll::Pending;
        }
        self.reload_requests.remove(&request.0);
        ReloadPoll::Done
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_scene_parses() {
        let scene = fixture_scene();
        assert_eq!(scene.name, "fixture");
        assert_eq!(scene.items.len(), 2);
        assert_eq!(scene.texture_options.len(), 1);
        assert_eq!(scene.statistic.load_time_ms, 12.5);
    }

    #[test]
    fn load_scene_json_reports_parse_failures() {
        assert!(load_scene_json("{ not json").is_err());
    }
}
