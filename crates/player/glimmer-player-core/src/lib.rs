//! Glimmer player core (engine-agnostic)
//!
//! The runtime that owns, schedules, and tears down GPU-backed playback
//! instances of pre-parsed animated scenes inside a host rendering engine's
//! scene graph. Scene parsing and the host engine itself are external
//! collaborators behind the `SceneLoader` and `HostEngine` traits; the core
//! performs no IO and owns no thread.

pub mod composition;
pub mod config;
pub mod display;
pub mod engine_instance;
pub mod error;
pub mod events;
pub mod host;
pub mod ids;
pub mod item;
pub mod priority;
pub mod render_frame;
pub mod resource;
pub mod scene;
pub mod ticker;

// Re-exports for consumers (embedders)
pub use composition::{Composition, CompositionStatistic, PlaybackState};
pub use config::PlayerConfig;
pub use display::{CompletedLoad, DisplayHost, DisplayOptions};
pub use engine_instance::EngineInstance;
pub use error::PlayerError;
pub use events::{
    CollectingListener, EventDispatcher, EventListener, MessageItem, MessagePhrase, PlayerEvent,
    Region,
};
pub use host::{
    BufferDescriptor, BufferHandle, EntityHandle, GeometryDescriptor, GeometryHandle, HostEngine,
    MaterialDescriptor, MaterialHandle, MaterialParam, MeshDescriptor, MeshHandle, TextureHandle,
};
pub use ids::{CompositionId, IdAllocator, RequestId};
pub use item::{RendererBehavior, RendererComponent, VfxItem};
pub use priority::PriorityResolver;
pub use render_frame::{RenderFrame, RenderPass};
pub use resource::{RawHandle, ResourceKind, ResourceSet};
pub use scene::{
    EndBehavior, InteractBehavior, InteractSpec, ItemSpec, LoadOptions, LoadPoll, ReloadPoll,
    RenderLevel, RendererKind, RendererSpec, Scene, SceneLoader, SceneSource, SceneStatistic,
    TextureFilter, TextureOptions, TextureSource, TextureWrap,
};
pub use ticker::Ticker;
