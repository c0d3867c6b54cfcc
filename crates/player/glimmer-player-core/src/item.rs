//! Runtime item tree and renderer-component behaviors.
//!
//! Items are instantiated from loader specs through the owning engine
//! instance's factory, so every native handle lands in that instance's
//! ResourceSet. Per-kind render behavior is an interface with default
//! implementations plus an override table keyed by kind tag.

use crate::engine_instance::EngineInstance;
use crate::events::{MessagePhrase, Region};
use crate::host::{
    BufferDescriptor, GeometryDescriptor, GeometryHandle, HostEngine, MaterialDescriptor,
    MaterialHandle, MaterialParam, MeshDescriptor, MeshHandle, TextureHandle,
};
use crate::priority::PriorityResolver;
use crate::render_frame::RenderFrame;
use crate::scene::{
    InteractBehavior, InteractSpec, ItemSpec, RendererKind, TextureFilter, TextureOptions,
    TextureSource, TextureWrap,
};

// Quad layout shared by sprite/text content: 4 vertices, position + uv.
const QUAD_VERTEX_BYTES: usize = 4 * 5 * 4;
const QUAD_INDEX_BYTES: usize = 6 * 2;

/// Renderable content attached to an item.
#[derive(Debug)]
pub struct RendererComponent {
    pub kind: RendererKind,
    pub mesh: MeshHandle,
    pub geometry: GeometryHandle,
    pub material: MaterialHandle,
    pub texture: Option<TextureHandle>,
    pub local_priority: u32,
    pub size: [f32; 2],
    /// Set on first render, after the effective draw order is bound.
    pub started: bool,
}

/// One node of a composition's live item tree.
#[derive(Debug)]
pub struct VfxItem {
    pub id: String,
    pub name: String,
    pub delay: f32,
    pub duration: f32,
    /// Local elapsed seconds inside the item's active window.
    pub time: f32,
    pub active: bool,
    pub ended: bool,
    pub enabled: bool,
    pub content: Option<RendererComponent>,
    pub interact: Option<InteractSpec>,
    pub children: Vec<VfxItem>,
}

/// Per-kind renderer hooks. Defaults cover plain meshes; variants override
/// only what differs.
pub trait RendererBehavior {
    /// First-render hook: bind the normalized draw order the host sorts by.
    fn on_start(
        &self,
        component: &RendererComponent,
        resolver: &PriorityResolver,
        host: &mut dyn HostEngine,
    ) {
        host.set_mesh_priority(component.mesh, resolver.effective(component.local_priority));
    }

    /// Per-frame hook, called while the owning item is active and enabled.
    fn render(&self, _component: &RendererComponent, _host: &mut dyn HostEngine) {}
}

struct MeshBehavior;
struct SpriteBehavior;
struct TextBehavior;

impl RendererBehavior for MeshBehavior {}

impl RendererBehavior for SpriteBehavior {
    fn render(&self, component: &RendererComponent, host: &mut dyn HostEngine) {
        host.set_material_param(component.material, "_Size", MaterialParam::Vec2(component.size));
    }
}

impl RendererBehavior for TextBehavior {
    fn render(&self, component: &RendererComponent, host: &mut dyn HostEngine) {
        host.set_material_param(component.material, "_Size", MaterialParam::Vec2(component.size));
    }
}

/// Override table, dispatched by kind tag.
pub(crate) fn behavior_for(kind: RendererKind) -> &'static dyn RendererBehavior {
    match kind {
        RendererKind::Mesh => &MeshBehavior,
        RendererKind::Sprite => &SpriteBehavior,
        RendererKind::Text => &TextBehavior,
    }
}

/// Build the live item tree from loader specs, creating every native
/// resource through the instance factory.
pub(crate) fn instantiate_items(
    specs: &[ItemSpec],
    instance: &mut EngineInstance,
    host: &mut dyn HostEngine,
    textures: &[TextureHandle],
) -> Vec<VfxItem> {
    specs
        .iter()
        .map(|spec| instantiate_item(spec, instance, host, textures))
        .collect()
}

fn instantiate_item(
    spec: &ItemSpec,
    instance: &mut EngineInstance,
    host: &mut dyn HostEngine,
    textures: &[TextureHandle],
) -> VfxItem {
    let content = spec.content.as_ref().map(|renderer| {
        let vertex_buffer = instance.create_buffer(
            host,
            &BufferDescriptor {
                label: format!("{}/vertices", spec.name),
                byte_length: QUAD_VERTEX_BYTES,
            },
        );
        let index_buffer = instance.create_buffer(
            host,
            &BufferDescriptor {
                label: format!("{}/indices", spec.name),
                byte_length: QUAD_INDEX_BYTES,
            },
        );
        let geometry = instance.create_geometry(
            host,
            &GeometryDescriptor {
                label: spec.name.clone(),
                vertex_buffer,
                index_buffer: Some(index_buffer),
                vertex_count: 4,
            },
        );

        // Text renders from its own glyph atlas; everything else samples a
        // scene texture when one is assigned.
        let texture = match renderer.kind {
            RendererKind::Text => Some(instance.create_texture(
                host,
                &TextureOptions {
                    name: format!("{}/glyphs", spec.name),
                    source: TextureSource::Data {
                        width: renderer.size[0].max(1.0) as u32,
                        height: renderer.size[1].max(1.0) as u32,
                    },
                    wrap: TextureWrap::Clamp,
                    filter: TextureFilter::Bilinear,
                    flip_y: true,
                },
            )),
            _ => renderer.texture.and_then(|idx| textures.get(idx).copied()),
        };

        let material = instance.create_material(
            host,
            &MaterialDescriptor {
                label: spec.name.clone(),
                texture,
                blending: !matches!(renderer.kind, RendererKind::Mesh),
                depth_test: matches!(renderer.kind, RendererKind::Mesh),
            },
        );
        let mesh = instance.create_mesh(
            host,
            &MeshDescriptor {
                label: spec.name.clone(),
                geometry,
                material,
                parent: instance.root_entity(),
            },
        );
        // Items spawn outside their active window; shown on activation.
        host.set_mesh_visible(mesh, false);
        instance.resolver_mut().register_local(renderer.local_priority);

        RendererComponent {
            kind: renderer.kind,
            mesh,
            geometry,
            material,
            texture,
            local_priority: renderer.local_priority,
            size: renderer.size,
            started: false,
        }
    });

    let children = instantiate_items(&spec.children, instance, host, textures);

    VfxItem {
        id: spec.id.clone(),
        name: spec.name.clone(),
        delay: spec.delay,
        duration: spec.duration,
        time: 0.0,
        active: false,
        ended: false,
        enabled: true,
        content,
        interact: spec.interact.clone(),
        children,
    }
}

/// Advance item clocks to composition time `t` (seconds), toggling
/// visibility and collecting Begin/End lifetime messages. Child clocks are
/// relative to their parent's delay.
pub(crate) fn advance_items(
    items: &mut [VfxItem],
    t: f32,
    host: &mut dyn HostEngine,
    messages: &mut Vec<(String, MessagePhrase)>,
) {
    for item in items {
        let window_end = item.delay + item.duration;
        let was_active = item.active;
        let active = item.enabled && t >= item.delay && t < window_end;
        item.time = (t - item.delay).clamp(0.0, item.duration);
        item.active = active;

        if active && !was_active {
            item.ended = false;
            messages.push((item.name.clone(), MessagePhrase::Begin));
            if let Some(content) = &item.content {
                host.set_mesh_visible(content.mesh, true);
            }
        } else if !active && was_active {
            item.ended = t >= window_end;
            messages.push((item.name.clone(), MessagePhrase::End));
            if let Some(content) = &item.content {
                host.set_mesh_visible(content.mesh, false);
            }
        }

        advance_items(&mut item.children, t - item.delay, host, messages);
    }
}

/// Reset clocks and activation for a restarted composition. Lifetime
/// messages are emitted by the next advance.
pub(crate) fn reset_items(items: &mut [VfxItem], host: &mut dyn HostEngine) {
    for item in items {
        item.time = 0.0;
        if item.active {
            if let Some(content) = &item.content {
                host.set_mesh_visible(content.mesh, false);
            }
        }
        item.active = false;
        item.ended = false;
        reset_items(&mut item.children, host);
    }
}

/// Append active-and-enabled renderer components to the default pass in
/// traversal order. Submission order is traversal order; the host performs
/// the actual sort from each mesh's bound priority.
pub(crate) fn gather_renderer_components(
    items: &mut [VfxItem],
    resolver: &PriorityResolver,
    frame: &mut RenderFrame,
    host: &mut dyn HostEngine,
) {
    for item in items {
        if !item.active || !item.enabled {
            continue;
        }
        if let Some(content) = &mut item.content {
            let behavior = behavior_for(content.kind);
            if !content.started {
                behavior.on_start(content, resolver, host);
                content.started = true;
            }
            behavior.render(content, host);
            frame.add_mesh_to_default_pass(content.mesh);
        }
        gather_renderer_components(&mut item.children, resolver, frame, host);
    }
}

/// Collect hit regions for a normalized surface point.
pub(crate) fn hit_test_items(
    items: &[VfxItem],
    x: f32,
    y: f32,
    out: &mut Vec<(Region, InteractBehavior)>,
) {
    for item in items {
        if item.active && item.enabled {
            if let Some(interact) = &item.interact {
                let [bx, by, bw, bh] = interact.bounds;
                if x >= bx && x <= bx + bw && y >= by && y <= by + bh {
                    out.push((
                        Region {
                            name: item.name.clone(),
                            id: item.id.clone(),
                            position: [x, y],
                        },
                        interact.behavior,
                    ));
                }
            }
            hit_test_items(&item.children, x, y, out);
        }
    }
}
