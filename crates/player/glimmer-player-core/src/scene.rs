//! Scene data contract and the external scene-loader seam.
//!
//! The loader is the asynchronous collaborator: loads and texture reloads
//! are begun with a request id and polled to completion by the display
//! host's `pump`, outside the tick's critical section. The runtime performs
//! no IO of its own.

use serde::{Deserialize, Serialize};

use crate::host::TextureHandle;
use crate::ids::RequestId;

/// Render quality tier a scene was authored for.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum RenderLevel {
    S,
    #[default]
    A,
    /// Low tier: loading such a scene downgrades the shared ticker to the
    /// reduced frame rate.
    B,
}

/// What happens when a composition's clock passes its duration.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum EndBehavior {
    /// Hold the last frame.
    #[default]
    Freeze,
    /// Wrap the clock and restart the item tree.
    Restart,
    /// Self-destroy; dropped from the live list on the next tick.
    Dispose,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum TextureWrap {
    #[default]
    Clamp,
    Repeat,
    Mirror,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum TextureFilter {
    Point,
    #[default]
    Bilinear,
}

/// Where a texture's pixels come from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TextureSource {
    /// 1x1 white placeholder.
    None,
    Data { width: u32, height: u32 },
    Image { url: String },
    Video { url: String },
}

/// Loader-provided texture creation options.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TextureOptions {
    pub name: String,
    pub source: TextureSource,
    pub wrap: TextureWrap,
    pub filter: TextureFilter,
    pub flip_y: bool,
}

impl TextureOptions {
    /// 1x1 white texture, the renderer fallback.
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: TextureSource::None,
            wrap: TextureWrap::Clamp,
            filter: TextureFilter::Bilinear,
            flip_y: false,
        }
    }
}

/// Renderable content kind of an item.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum RendererKind {
    Sprite,
    Text,
    Mesh,
}

/// Parsed renderer content of an item.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RendererSpec {
    pub kind: RendererKind,
    /// Render order within the composition.
    pub local_priority: u32,
    /// Index into the scene's `texture_options`, if textured.
    pub texture: Option<usize>,
    pub size: [f32; 2],
}

/// How a hit on an interactive item is handled.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum InteractBehavior {
    /// Emit a `click` event on the host surface.
    Notify,
    /// Resume the player (the documented tap-to-resume path).
    ResumePlayer,
}

/// Parsed interaction content of an item. Bounds are a normalized
/// `[x, y, width, height]` rectangle; hit geometry beyond that is the
/// loader's concern.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InteractSpec {
    pub behavior: InteractBehavior,
    pub bounds: [f32; 4],
}

/// One node of a parsed scene's item tree.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ItemSpec {
    pub id: String,
    pub name: String,
    /// Seconds into the composition before the item activates.
    pub delay: f32,
    /// Seconds the item stays active.
    pub duration: f32,
    pub content: Option<RendererSpec>,
    pub interact: Option<InteractSpec>,
    /// Children, including referenced pre-composition content inlined by
    /// the loader.
    pub children: Vec<ItemSpec>,
}

impl ItemSpec {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            delay: 0.0,
            duration: f32::MAX,
            content: None,
            interact: None,
            children: Vec::new(),
        }
    }
}

/// Load-time measurements reported by the loader.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SceneStatistic {
    pub load_time_ms: f64,
}

/// A parsed, playable scene description, as returned by the loader.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Scene {
    pub name: String,
    /// Composition duration in seconds.
    pub duration: f32,
    pub end_behavior: EndBehavior,
    pub render_level: RenderLevel,
    pub items: Vec<ItemSpec>,
    pub texture_options: Vec<TextureOptions>,
    pub statistic: SceneStatistic,
}

/// What a load request points at.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum SceneSource {
    Url(String),
    Json(serde_json::Value),
    /// Already-parsed scene, passed through untouched.
    Scene(Box<Scene>),
}

/// Options applied when loading a scene into a composition.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoadOptions {
    /// Start playing as soon as the load finalizes.
    pub autoplay: bool,
    /// Keep the composition's root entity facing the host camera.
    pub billboard: bool,
    /// Base draw-order offset of the composition's priority band.
    pub priority: i32,
    pub speed: f32,
    /// Environment tag forwarded to the loader.
    pub env: String,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            autoplay: true,
            billboard: false,
            priority: 0,
            speed: 1.0,
            env: String::new(),
        }
    }
}

/// Poll result of a pending scene load.
#[derive(Clone, Debug)]
pub enum LoadPoll {
    Pending,
    Ready(Scene),
    Failed(String),
}

/// Poll result of a pending texture reload.
#[derive(Clone, Debug)]
pub enum ReloadPoll {
    Pending,
    Done,
    Failed(String),
}

/// External scene loader. Implementations own the network fetch and parse;
/// the runtime only begins requests and polls them from its scheduler step.
pub trait SceneLoader {
    fn begin_load(&mut self, request: RequestId, source: &SceneSource, options: &LoadOptions);
    fn poll_load(&mut self, request: RequestId) -> LoadPoll;
    /// Begin refetching the given textures after an offload.
    fn begin_texture_reload(&mut self, request: RequestId, textures: &[TextureHandle]);
    fn poll_reload(&mut self, request: RequestId) -> ReloadPoll;
}
