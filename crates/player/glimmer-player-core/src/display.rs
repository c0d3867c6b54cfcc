//! Display host: the attachment point in the host scene graph.
//!
//! Owns the shared ticker, the event bridge, the live composition list, and
//! the public load/play/pause/resume/dispose contract. Scene loads and
//! texture reloads are begun against the external loader and settled by
//! `pump`, the single-threaded scheduler step that runs outside the tick's
//! critical section.

use std::time::Instant;

use crate::composition::{Composition, CompositionParts};
use crate::config::PlayerConfig;
use crate::engine_instance::EngineInstance;
use crate::error::PlayerError;
use crate::events::{EventDispatcher, EventListener, PlayerEvent};
use crate::host::{EntityHandle, HostEngine, TextureHandle};
use crate::ids::{CompositionId, IdAllocator, RequestId};
use crate::item::instantiate_items;
use crate::scene::{
    LoadOptions, LoadPoll, ReloadPoll, RenderLevel, Scene, SceneLoader, SceneSource, TextureSource,
};
use crate::ticker::Ticker;

/// Parameters binding a display host to its engine context.
#[derive(Clone, Debug)]
pub struct DisplayOptions {
    /// Host entity every composition root is parented under.
    pub entity: EntityHandle,
    /// Render surface size, used to interpret click coordinates.
    pub width: u32,
    pub height: u32,
    pub interactive: bool,
}

/// Result of one settled scene load, reported by `pump` in request order.
#[derive(Debug)]
pub struct CompletedLoad {
    pub request: RequestId,
    pub result: Result<CompositionId, PlayerError>,
}

#[derive(Debug)]
struct PendingLoad {
    request: RequestId,
    index: i32,
    options: LoadOptions,
    started: Instant,
}

#[derive(Debug)]
struct PendingReload {
    request: RequestId,
    composition: CompositionId,
}

#[derive(Debug)]
struct Sequence {
    chain: Vec<CompositionId>,
    cursor: usize,
}

/// Session-scoped owner of every live composition.
pub struct DisplayHost {
    cfg: PlayerConfig,
    ids: IdAllocator,
    compositions: Vec<Composition>,
    /// Monotonic counter reserving draw/update order for new compositions.
    /// Rebased to the live count after every tick.
    base_composition_index: i32,
    ticker: Ticker,
    events: EventDispatcher,
    speed: f32,
    auto_playing: bool,
    disposed: bool,
    resume_pending: bool,
    initialized: bool,
    root_entity: Option<EntityHandle>,
    width: u32,
    height: u32,
    interactive: bool,
    pending_loads: Vec<PendingLoad>,
    pending_reloads: Vec<PendingReload>,
    sequences: Vec<Sequence>,
}

impl DisplayHost {
    /// Create an unbound display host. `initialize` must be called before
    /// scenes can be loaded.
    pub fn new(cfg: PlayerConfig) -> Result<Self, PlayerError> {
        cfg.validate()?;
        let max_events = cfg.max_events_per_tick;
        let target_fps = cfg.target_fps;
        Ok(Self {
            cfg,
            ids: IdAllocator::new(),
            compositions: Vec::new(),
            base_composition_index: 0,
            ticker: Ticker::new(target_fps),
            events: EventDispatcher::new(max_events),
            speed: 1.0,
            auto_playing: false,
            disposed: false,
            resume_pending: false,
            initialized: false,
            root_entity: None,
            width: 0,
            height: 0,
            interactive: false,
            pending_loads: Vec::new(),
            pending_reloads: Vec::new(),
            sequences: Vec::new(),
        })
    }

    /// Bind to one host-engine context and entity, and start the ticker.
    /// May be called only once; a repeat call is a logged no-op so it can
    /// never silently duplicate resources.
    pub fn initialize(&mut self, _host: &mut dyn HostEngine, options: DisplayOptions) {
        if self.initialized {
            log::warn!("display host already initialized, ignoring re-initialization");
            return;
        }
        self.root_entity = Some(options.entity);
        self.width = options.width;
        self.height = options.height;
        self.interactive = options.interactive;
        self.ticker = Ticker::new(self.cfg.target_fps);
        self.ticker.start();
        self.initialized = true;
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    #[inline]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Paused whenever the ticker is not generating frames.
    #[inline]
    pub fn is_paused(&self) -> bool {
        self.ticker.is_paused()
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.speed
    }

    #[inline]
    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    #[inline]
    pub fn interactive(&self) -> bool {
        self.interactive
    }

    #[inline]
    pub fn set_interactive(&mut self, interactive: bool) {
        self.interactive = interactive;
    }

    #[inline]
    pub fn ticker(&self) -> &Ticker {
        &self.ticker
    }

    #[inline]
    pub fn base_composition_index(&self) -> i32 {
        self.base_composition_index
    }

    pub fn add_event_listener(&mut self, listener: Box<dyn EventListener>) {
        self.events.add_listener(listener);
    }

    /// All live compositions. Do not rely on ordering between ticks; the
    /// list is re-sorted by index every tick.
    pub fn get_compositions(&self) -> &[Composition] {
        &self.compositions
    }

    /// First matching composition by name, if any.
    pub fn get_composition_by_name(&self, name: &str) -> Option<&Composition> {
        self.compositions.iter().find(|c| c.name == name)
    }

    pub fn get_composition(&self, id: CompositionId) -> Option<&Composition> {
        self.compositions.iter().find(|c| c.id() == id)
    }

    pub fn get_composition_mut(&mut self, id: CompositionId) -> Option<&mut Composition> {
        self.compositions.iter_mut().find(|c| c.id() == id)
    }

    /// Currently playing composition; the first one when several play.
    pub fn current_composition(&self) -> Option<&Composition> {
        self.compositions.first()
    }

    fn ensure_ready(&self) -> Result<EntityHandle, PlayerError> {
        if self.disposed {
            return Err(PlayerError::DisposedDuringLoad);
        }
        self.root_entity.ok_or(PlayerError::NotInitialized)
    }

    /// Begin loading one scene. The composition index is reserved now, so
    /// relative draw order follows request order even if a later request
    /// settles first. The composition itself appears once `pump` settles
    /// the load.
    pub fn load_scene(
        &mut self,
        loader: &mut dyn SceneLoader,
        source: SceneSource,
        options: LoadOptions,
    ) -> Result<RequestId, PlayerError> {
        self.ensure_ready()?;
        let index = self.base_composition_index;
        self.base_composition_index += 1;
        let request = self.ids.alloc_request();
        loader.begin_load(request, &source, &options);
        self.pending_loads.push(PendingLoad {
            request,
            index,
            options,
            started: Instant::now(),
        });
        self.ticker.start();
        Ok(request)
    }

    /// Begin loading a batch of scenes; the whole index range is reserved up
    /// front, so the array order is the draw order regardless of which
    /// request settles first.
    pub fn load_scene_batch(
        &mut self,
        loader: &mut dyn SceneLoader,
        sources: Vec<SceneSource>,
        options: LoadOptions,
    ) -> Result<Vec<RequestId>, PlayerError> {
        self.ensure_ready()?;
        let base = self.base_composition_index;
        self.base_composition_index += sources.len() as i32;
        let mut requests = Vec::with_capacity(sources.len());
        for (offset, source) in sources.iter().enumerate() {
            let request = self.ids.alloc_request();
            loader.begin_load(request, source, &options);
            self.pending_loads.push(PendingLoad {
                request,
                index: base + offset as i32,
                options: options.clone(),
                started: Instant::now(),
            });
            requests.push(request);
        }
        self.ticker.start();
        Ok(requests)
    }

    /// Begin a standalone scene fetch that creates no composition. Poll it
    /// with `poll_asset`.
    pub fn load_asset(
        &mut self,
        loader: &mut dyn SceneLoader,
        source: &SceneSource,
        options: &LoadOptions,
    ) -> RequestId {
        let request = self.ids.alloc_request();
        loader.begin_load(request, source, options);
        request
    }

    /// Poll a standalone asset fetch started with `load_asset`.
    pub fn poll_asset(
        &mut self,
        loader: &mut dyn SceneLoader,
        request: RequestId,
    ) -> Option<Result<Scene, PlayerError>> {
        match loader.poll_load(request) {
            LoadPoll::Pending => None,
            LoadPoll::Ready(scene) => Some(Ok(scene)),
            LoadPoll::Failed(reason) => Some(Err(PlayerError::SceneLoad { reason })),
        }
    }

    /// Scheduler step: settle pending scene loads and texture reloads.
    /// Called by the embedder between ticks, never from inside one.
    /// Completed loads are reported in request order.
    pub fn pump(
        &mut self,
        loader: &mut dyn SceneLoader,
        host: &mut dyn HostEngine,
    ) -> Vec<CompletedLoad> {
        let mut completed = Vec::new();

        let pending = std::mem::take(&mut self.pending_loads);
        for load in pending {
            match loader.poll_load(load.request) {
                LoadPoll::Pending => self.pending_loads.push(load),
                LoadPoll::Failed(reason) => completed.push(CompletedLoad {
                    request: load.request,
                    result: Err(PlayerError::SceneLoad { reason }),
                }),
                LoadPoll::Ready(scene) => {
                    let request = load.request;
                    // The host may have been torn down while the load was
                    // suspended; the half-built composition must not be
                    // registered.
                    let result = if self.disposed {
                        Err(PlayerError::DisposedDuringLoad)
                    } else {
                        self.finalize_load(load, scene, host)
                    };
                    completed.push(CompletedLoad { request, result });
                }
            }
        }
        completed.sort_by_key(|c| c.request.0);

        let reloads = std::mem::take(&mut self.pending_reloads);
        for reload in reloads {
            match loader.poll_reload(reload.request) {
                ReloadPoll::Pending => self.pending_reloads.push(reload),
                ReloadPoll::Done => {
                    // References captured before the suspension may be
                    // stale; re-validate liveness by id before applying.
                    if let Some(comp) = self
                        .compositions
                        .iter_mut()
                        .find(|c| c.id() == reload.composition)
                    {
                        comp.mark_textures_resident();
                    }
                }
                ReloadPoll::Failed(reason) => {
                    log::error!("texture reload failed: {reason}");
                    self.events.dispatch(PlayerEvent::RenderError {
                        message: format!("texture reload failed: {reason}"),
                    });
                }
            }
        }
        if self.resume_pending && self.pending_reloads.is_empty() {
            self.finish_resume();
        }

        self.events.process_queue();
        completed
    }

    fn finalize_load(
        &mut self,
        load: PendingLoad,
        scene: Scene,
        host: &mut dyn HostEngine,
    ) -> Result<CompositionId, PlayerError> {
        let root = self.root_entity.ok_or(PlayerError::NotInitialized)?;

        let mut instance = EngineInstance::new(host, root, load.options.priority);
        let textures: Vec<TextureHandle> = scene
            .texture_options
            .iter()
            .map(|options| instance.create_texture(host, options))
            .collect();
        let video_textures: Vec<TextureHandle> = scene
            .texture_options
            .iter()
            .zip(&textures)
            .filter(|(options, _)| matches!(options.source, TextureSource::Video { .. }))
            .map(|(_, handle)| *handle)
            .collect();
        let items = instantiate_items(&scene.items, &mut instance, host, &textures);

        // Low-end scenes lower the shared clock for the whole host.
        if scene.render_level == RenderLevel::B {
            let fps = self.ticker.fps().min(self.cfg.reduced_fps);
            self.ticker.set_fps(fps);
        }

        let id = self.ids.alloc_composition();
        let mut composition = Composition::new(CompositionParts {
            id,
            name: scene.name,
            index: load.index,
            billboard: load.options.billboard,
            speed: load.options.speed,
            duration: scene.duration,
            end_behavior: scene.end_behavior,
            render_level: scene.render_level,
            items,
            instance,
            textures,
            video_textures,
            load_time_ms: scene.statistic.load_time_ms,
        });

        if load.options.autoplay {
            self.auto_playing = true;
            composition.play(host);
        } else {
            composition.pause();
        }

        let first_frame_ms =
            load.started.elapsed().as_secs_f64() * 1000.0 + scene.statistic.load_time_ms;
        composition.statistic.first_frame_time_ms = first_frame_ms;
        log::info!("first frame: [{}] {:.4}ms", composition.name, first_frame_ms);

        self.compositions.push(composition);
        self.ticker.start();
        Ok(id)
    }

    /// Feed elapsed wall time; runs one tick when a virtual frame is due.
    pub fn advance(&mut self, elapsed_ms: f32, host: &mut dyn HostEngine) {
        if let Some(dt) = self.ticker.advance(elapsed_ms) {
            self.tick(dt, host);
        }
    }

    /// One virtual frame: update every live composition in index order and
    /// submit their render frames.
    pub fn tick(&mut self, dt_ms: f32, host: &mut dyn HostEngine) {
        if !self.initialized || self.disposed {
            return;
        }
        let dt = dt_ms.min(self.cfg.max_frame_delta_ms) * self.speed;

        // Render errors pause ticking rather than unwinding: a throw here
        // would halt every other live composition. Caller may resume.
        let render_errors = host.take_render_errors();
        if let Some(first) = render_errors.into_iter().next() {
            self.events.dispatch(PlayerEvent::RenderError { message: first });
            self.ticker.pause();
        }

        self.compositions.sort_by_key(|c| c.index());

        let comps = std::mem::take(&mut self.compositions);
        let existed = comps.len();
        let mut skipped_offloaded = false;
        let mut updated_any = false;
        let mut live = Vec::with_capacity(existed);
        for mut comp in comps {
            if comp.is_texture_offloaded() {
                // Keep playback state; skip until textures are reloaded.
                skipped_offloaded = true;
                log::error!("composition {} texture offloaded, skip render", comp.name);
                live.push(comp);
                continue;
            }
            if !comp.is_destroyed() {
                comp.update(dt, host);
                updated_any = true;
            }
            if comp.is_destroyed() {
                comp.dispose(host);
            } else {
                live.push(comp);
            }
        }
        self.compositions = live;
        self.base_composition_index = self.compositions.len() as i32;

        let mut messages = Vec::new();
        for comp in &mut self.compositions {
            messages.append(&mut comp.take_messages());
        }
        for message in messages {
            self.events.dispatch(PlayerEvent::Message(message));
        }

        self.advance_sequences(host);

        if skipped_offloaded && !updated_any && existed > 0 {
            self.events.dispatch(PlayerEvent::RenderError {
                message: "render attempted while texture offloaded".to_string(),
            });
            self.ticker.pause();
            self.events.process_queue();
            return;
        }

        if !self.is_paused() {
            if let Some(camera) = host.camera_position() {
                for comp in &self.compositions {
                    if comp.billboard {
                        host.entity_look_at(comp.instance().root_entity(), camera);
                    }
                }
            }
            for comp in &self.compositions {
                host.submit(&comp.render_frame().default_pass().meshes);
            }
            if self.auto_playing {
                self.events.dispatch(PlayerEvent::Update { playing: true });
            }
        }
        self.events.process_queue();
    }

    fn advance_sequences(&mut self, host: &mut dyn HostEngine) {
        let Self {
            sequences,
            compositions,
            ..
        } = self;
        for seq in sequences.iter_mut() {
            while seq.cursor < seq.chain.len() {
                let current = seq.chain[seq.cursor];
                let still_running = compositions
                    .iter()
                    .find(|c| c.id() == current)
                    .map(|c| !c.is_ended() && !c.is_destroyed())
                    .unwrap_or(false);
                if still_running {
                    break;
                }
                seq.cursor += 1;
                if let Some(next_id) = seq.chain.get(seq.cursor).copied() {
                    if let Some(next) = compositions.iter_mut().find(|c| c.id() == next_id) {
                        next.play(host);
                    }
                }
            }
        }
        sequences.retain(|s| s.cursor < s.chain.len());
    }

    /// Play every loaded composition and mark the host as autoplaying.
    pub fn play(&mut self, host: &mut dyn HostEngine) {
        self.auto_playing = true;
        for comp in &mut self.compositions {
            comp.play(host);
        }
        self.ticker.start();
    }

    /// Chain compositions so each starts when its predecessor ends.
    pub fn play_sequence(&mut self, chain: Vec<CompositionId>, host: &mut dyn HostEngine) {
        let Some(first) = chain.first().copied() else {
            return;
        };
        if let Some(comp) = self.get_composition_mut(first) {
            comp.play(host);
        }
        self.sequences.push(Sequence { chain, cursor: 0 });
        self.ticker.start();
    }

    /// Stop the ticker. Idempotent; a paused host stays paused.
    pub fn pause(&mut self) {
        if self.is_paused() {
            return;
        }
        self.ticker.pause();
        self.events.dispatch(PlayerEvent::Pause);
        self.events
            .dispatch(PlayerEvent::Update { playing: false });
        self.events.process_queue();
    }

    /// Release every live composition's texture memory, keeping playback
    /// state. `resume` reloads before playback visually continues.
    pub fn offload_textures(&mut self, host: &mut dyn HostEngine) {
        for comp in &mut self.compositions {
            comp.offload_textures(host);
        }
    }

    /// Resume ticking, reloading texture resources first when paused. A
    /// second call while one is in flight returns without side effects.
    pub fn resume(&mut self, loader: &mut dyn SceneLoader) -> Result<(), PlayerError> {
        if self.resume_pending {
            return Ok(());
        }
        if self.disposed {
            return Ok(());
        }
        if self.is_paused() {
            self.resume_pending = true;
            for comp in &self.compositions {
                let request = self.ids.alloc_request();
                loader.begin_texture_reload(request, comp.textures());
                self.pending_reloads.push(PendingReload {
                    request,
                    composition: comp.id(),
                });
            }
            if self.pending_reloads.is_empty() {
                self.finish_resume();
            }
            return Ok(());
        }
        self.ticker.resume();
        Ok(())
    }

    fn finish_resume(&mut self) {
        self.resume_pending = false;
        for comp in &mut self.compositions {
            comp.mark_textures_resident();
        }
        self.ticker.resume();
        self.events.dispatch(PlayerEvent::Update { playing: true });
        self.events.process_queue();
    }

    /// Seek every composition to `time` (seconds) and play.
    pub fn goto_and_play(&mut self, time: f32, host: &mut dyn HostEngine) {
        self.auto_playing = true;
        let was_paused = self.is_paused();
        for comp in &mut self.compositions {
            comp.goto_and_play(time, host);
        }
        if was_paused {
            // Reflect the seek immediately even though ticking was off.
            self.tick(0.0, host);
        }
        self.ticker.start();
    }

    /// Seek every composition to `time` (seconds) and stay paused there.
    pub fn goto_and_stop(&mut self, time: f32, host: &mut dyn HostEngine) {
        self.auto_playing = false;
        for comp in &mut self.compositions {
            comp.goto_and_stop(time, host);
        }
        if self.is_paused() {
            self.tick(0.0, host);
        }
        self.events
            .dispatch(PlayerEvent::Update { playing: false });
        self.events.process_queue();
    }

    /// Nudge one composition's clock by a signed seconds offset, outside
    /// normal ticking.
    pub fn forward_composition_time(
        &mut self,
        id: CompositionId,
        seconds: f32,
        host: &mut dyn HostEngine,
    ) {
        if seconds == 0.0 {
            return;
        }
        if let Some(comp) = self.get_composition_mut(id) {
            comp.forward(seconds, host);
        }
    }

    /// Route a click on the render surface (normalized coordinates) through
    /// the live compositions' hit regions.
    pub fn handle_click(
        &mut self,
        x: f32,
        y: f32,
        loader: &mut dyn SceneLoader,
    ) -> Result<(), PlayerError> {
        if !self.interactive {
            return Ok(());
        }
        let mut resume_requested = false;
        let mut clicks = Vec::new();
        for comp in &self.compositions {
            for (region, behavior) in comp.hit_test(x, y) {
                match behavior {
                    crate::scene::InteractBehavior::Notify => clicks.push(PlayerEvent::Click {
                        region,
                        composition_id: comp.uid().to_string(),
                        composition_name: comp.name.clone(),
                    }),
                    crate::scene::InteractBehavior::ResumePlayer => resume_requested = true,
                }
            }
        }
        for click in clicks {
            self.events.dispatch(click);
        }
        self.events.process_queue();
        if resume_requested {
            self.resume(loader)?;
        }
        Ok(())
    }

    /// Stub kept for API compatibility with hosts exposing GPU timers.
    /// Invoking it is an assertion failure to fix, not a runtime path.
    pub fn report_gpu_time(&self, _time_ms: f64) -> Result<(), PlayerError> {
        Err(PlayerError::NotImplemented {
            method: "report_gpu_time",
        })
    }

    /// Dispose every composition without disposing the host itself; index
    /// numbering restarts for subsequently loaded compositions.
    pub fn destroy_current_compositions(&mut self, host: &mut dyn HostEngine) {
        for comp in &mut self.compositions {
            comp.dispose(host);
        }
        self.compositions.clear();
        self.sequences.clear();
        self.base_composition_index = 0;
    }

    /// Tear the host down: pause, release every composition's resources,
    /// clear the live list. In-flight loads fail at the next `pump` with
    /// `DisposedDuringLoad`. Idempotent.
    pub fn dispose(&mut self, host: &mut dyn HostEngine) {
        if self.disposed {
            return;
        }
        self.pause();
        for comp in &mut self.compositions {
            comp.dispose(host);
        }
        self.compositions.clear();
        self.sequences.clear();
        self.pending_reloads.clear();
        self.resume_pending = false;
        self.disposed = true;
        self.ticker.stop();
    }

    /// Dispose the named composition(s) only, then resume the remaining
    /// ones — the documented recovery path for single-composition memory
    /// reclamation. The implicit resume can be turned off via
    /// `PlayerConfig::resume_on_targeted_dispose`.
    pub fn dispose_composition(
        &mut self,
        name: &str,
        host: &mut dyn HostEngine,
        loader: &mut dyn SceneLoader,
    ) -> Result<(), PlayerError> {
        if !self.compositions.iter().any(|c| c.name == name) {
            return Ok(());
        }
        self.pause();
        for comp in self.compositions.iter_mut().filter(|c| c.name == name) {
            comp.dispose(host);
        }
        self.compositions.retain(|c| !c.is_destroyed());
        if self.cfg.resume_on_targeted_dispose {
            self.resume(loader)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for DisplayHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DisplayHost")
            .field("compositions", &self.compositions.len())
            .field("base_composition_index", &self.base_composition_index)
            .field("disposed", &self.disposed)
            .field("resume_pending", &self.resume_pending)
            .field("paused", &self.is_paused())
            .finish()
    }
}
