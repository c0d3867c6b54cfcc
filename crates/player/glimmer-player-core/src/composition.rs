//! A loaded, playable instance of a scene.

use uuid::Uuid;

use crate::engine_instance::EngineInstance;
use crate::events::{MessageItem, Region};
use crate::host::{HostEngine, TextureHandle};
use crate::ids::CompositionId;
use crate::item::{
    advance_items, gather_renderer_components, hit_test_items, reset_items, VfxItem,
};
use crate::render_frame::RenderFrame;
use crate::scene::{EndBehavior, InteractBehavior, RenderLevel};

/// Playback lifecycle of a composition. `Disposed` is terminal.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PlaybackState {
    Created,
    Playing,
    Paused,
    Disposed,
}

/// Load/first-frame measurements carried by a composition.
#[derive(Clone, Debug, Default)]
pub struct CompositionStatistic {
    pub load_time_ms: f64,
    pub first_frame_time_ms: f64,
}

/// Everything `DisplayHost` assembles before constructing a composition.
pub(crate) struct CompositionParts {
    pub id: CompositionId,
    pub name: String,
    pub index: i32,
    pub billboard: bool,
    pub speed: f32,
    pub duration: f32,
    pub end_behavior: EndBehavior,
    pub render_level: RenderLevel,
    pub items: Vec<VfxItem>,
    pub instance: EngineInstance,
    pub textures: Vec<TextureHandle>,
    pub video_textures: Vec<TextureHandle>,
    pub load_time_ms: f64,
}

/// One playable instance of a parsed scene: its item tree, render frame,
/// clock, and the engine instance scoping its native resources.
#[derive(Debug)]
pub struct Composition {
    id: CompositionId,
    uid: Uuid,
    pub name: String,
    index: i32,
    pub billboard: bool,
    /// True once playback has been started at least once.
    pub started: bool,
    pub speed: f32,
    state: PlaybackState,
    pub statistic: CompositionStatistic,
    /// Composition clock, seconds.
    time: f32,
    duration: f32,
    end_behavior: EndBehavior,
    render_level: RenderLevel,
    items: Vec<VfxItem>,
    render_frame: RenderFrame,
    instance: EngineInstance,
    textures: Vec<TextureHandle>,
    video_textures: Vec<TextureHandle>,
    texture_offloaded: bool,
    destroyed: bool,
    ended: bool,
    pending_messages: Vec<MessageItem>,
}

impl Composition {
    pub(crate) fn new(parts: CompositionParts) -> Self {
        Self {
            id: parts.id,
            uid: Uuid::new_v4(),
            name: parts.name,
            index: parts.index,
            billboard: parts.billboard,
            started: false,
            speed: parts.speed,
            state: PlaybackState::Created,
            statistic: CompositionStatistic {
                load_time_ms: parts.load_time_ms,
                first_frame_time_ms: 0.0,
            },
            time: 0.0,
            duration: parts.duration.max(0.0),
            end_behavior: parts.end_behavior,
            render_level: parts.render_level,
            items: parts.items,
            render_frame: RenderFrame::new(),
            instance: parts.instance,
            textures: parts.textures,
            video_textures: parts.video_textures,
            texture_offloaded: false,
            destroyed: false,
            ended: false,
            pending_messages: Vec::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> CompositionId {
        self.id
    }

    /// Globally unique instance tag, carried on event payloads.
    #[inline]
    pub fn uid(&self) -> Uuid {
        self.uid
    }

    #[inline]
    pub fn index(&self) -> i32 {
        self.index
    }

    #[inline]
    pub fn set_index(&mut self, index: i32) {
        self.index = index;
    }

    #[inline]
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    #[inline]
    pub fn time(&self) -> f32 {
        self.time
    }

    #[inline]
    pub fn duration(&self) -> f32 {
        self.duration
    }

    #[inline]
    pub fn render_level(&self) -> RenderLevel {
        self.render_level
    }

    pub fn items(&self) -> &[VfxItem] {
        &self.items
    }

    pub fn render_frame(&self) -> &RenderFrame {
        &self.render_frame
    }

    pub fn instance(&self) -> &EngineInstance {
        &self.instance
    }

    pub fn textures(&self) -> &[TextureHandle] {
        &self.textures
    }

    #[inline]
    pub fn is_texture_offloaded(&self) -> bool {
        self.texture_offloaded
    }

    #[inline]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed || self.state == PlaybackState::Disposed
    }

    /// True once the clock has passed the composition's duration.
    #[inline]
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Start or continue playback. Restarts video textures so that they
    /// never block the tick later.
    pub fn play(&mut self, host: &mut dyn HostEngine) {
        if self.state == PlaybackState::Disposed {
            log::warn!("play called on disposed composition {}", self.name);
            return;
        }
        self.state = PlaybackState::Playing;
        self.started = true;
        self.update_video(host);
    }

    /// Freeze the clock; the assembled frame stays visible.
    pub fn pause(&mut self) {
        if matches!(self.state, PlaybackState::Playing | PlaybackState::Created) {
            self.state = PlaybackState::Paused;
        }
    }

    /// Absolute seek, then play.
    pub fn goto_and_play(&mut self, time: f32, host: &mut dyn HostEngine) {
        self.seek(time, host);
        self.play(host);
    }

    /// Absolute seek, then stay paused on the sought frame.
    pub fn goto_and_stop(&mut self, time: f32, host: &mut dyn HostEngine) {
        self.seek(time, host);
        self.started = true;
        if self.state != PlaybackState::Disposed {
            self.state = PlaybackState::Paused;
        }
    }

    fn seek(&mut self, time: f32, host: &mut dyn HostEngine) {
        if self.state == PlaybackState::Disposed {
            return;
        }
        self.time = time.clamp(0.0, self.duration);
        self.ended = false;
        self.sync_items(host);
    }

    /// Advance the composition clock by `dt` virtual milliseconds, scaled by
    /// the per-composition speed, then rebuild the render frame.
    pub fn update(&mut self, dt_ms: f32, host: &mut dyn HostEngine) {
        if self.is_destroyed() {
            return;
        }
        if self.state == PlaybackState::Playing {
            self.time += dt_ms / 1000.0 * self.speed;
            if self.time >= self.duration && self.duration > 0.0 {
                self.handle_end(host);
            } else if self.time < 0.0 {
                // Reverse playback bottomed out.
                self.time = 0.0;
            }
            if self.is_destroyed() {
                return;
            }
            self.sync_items(host);
        }
        self.prepare_render(host);
    }

    /// Nudge the clock by a signed seconds offset regardless of play state,
    /// reflecting the result immediately.
    pub fn forward(&mut self, seconds: f32, host: &mut dyn HostEngine) {
        if self.is_destroyed() {
            return;
        }
        self.time = (self.time + seconds).clamp(0.0, self.duration);
        self.sync_items(host);
        self.prepare_render(host);
    }

    fn handle_end(&mut self, host: &mut dyn HostEngine) {
        self.ended = true;
        match self.end_behavior {
            EndBehavior::Freeze => {
                self.time = self.duration;
            }
            EndBehavior::Restart => {
                let over = self.time - self.duration;
                self.time = if self.duration > 0.0 { over % self.duration } else { 0.0 };
                reset_items(&mut self.items, host);
            }
            EndBehavior::Dispose => {
                self.destroyed = true;
            }
        }
    }

    fn sync_items(&mut self, host: &mut dyn HostEngine) {
        let mut raw = Vec::new();
        advance_items(&mut self.items, self.time, host, &mut raw);
        let uid = self.uid.to_string();
        self.pending_messages.extend(raw.into_iter().map(|(item_name, phrase)| MessageItem {
            item_name,
            composition_id: uid.clone(),
            phrase,
        }));
    }

    /// Clear the default pass and regather renderer components from the
    /// item tree in traversal order.
    pub fn prepare_render(&mut self, host: &mut dyn HostEngine) {
        self.render_frame.begin_frame();
        let Self {
            items,
            instance,
            render_frame,
            ..
        } = self;
        gather_renderer_components(items, instance.resolver(), render_frame, host);
    }

    /// (Re)start playback of video-sourced textures. Invoked on every
    /// activation; must not block the tick.
    pub fn update_video(&mut self, host: &mut dyn HostEngine) {
        for texture in &self.video_textures {
            host.start_video(*texture);
        }
    }

    /// Release texture memory while keeping playback state. The composition
    /// is skipped by the tick until `resume` reloads its textures.
    pub fn offload_textures(&mut self, host: &mut dyn HostEngine) {
        if self.texture_offloaded || self.is_destroyed() {
            return;
        }
        for texture in &self.textures {
            host.offload_texture(*texture);
        }
        self.texture_offloaded = true;
    }

    /// Called when a texture reload settles.
    pub fn mark_textures_resident(&mut self) {
        self.texture_offloaded = false;
    }

    /// Hit regions for a normalized surface point, in traversal order.
    pub fn hit_test(&self, x: f32, y: f32) -> Vec<(Region, InteractBehavior)> {
        let mut out = Vec::new();
        hit_test_items(&self.items, x, y, &mut out);
        out
    }

    /// Drain item lifetime messages collected since the last call.
    pub fn take_messages(&mut self) -> Vec<MessageItem> {
        std::mem::take(&mut self.pending_messages)
    }

    /// Release the engine instance's ResourceSet and mark the composition
    /// terminal. Idempotent; a second call performs no host-engine calls.
    pub fn dispose(&mut self, host: &mut dyn HostEngine) {
        if self.state == PlaybackState::Disposed {
            return;
        }
        self.state = PlaybackState::Disposed;
        self.destroyed = true;
        self.instance.dispose(host);
    }
}
