//! Resource teardown: ordering, idempotence, targeted dispose.

use glimmer_player_core::{
    DisplayHost, DisplayOptions, HostEngine, LoadOptions, PlayerConfig, ResourceKind, SceneSource,
};
use glimmer_test_fixtures::{simple_scene, MockHostEngine, MockSceneLoader};

// simple_scene: 2 sprite items x (2 buffers + geometry + material + mesh)
// plus one scene texture.
const RESOURCES_PER_COMPOSITION: usize = 2 * 5 + 1;

fn make_display(host: &mut MockHostEngine) -> DisplayHost {
    let mut display = DisplayHost::new(PlayerConfig::default()).unwrap();
    let entity = host.create_entity(None);
    display.initialize(
        host,
        DisplayOptions {
            entity,
            width: 512,
            height: 512,
            interactive: false,
        },
    );
    display
}

fn load_one(
    display: &mut DisplayHost,
    loader: &mut MockSceneLoader,
    host: &mut MockHostEngine,
    name: &str,
) {
    display
        .load_scene(
            loader,
            SceneSource::Scene(Box::new(simple_scene(name))),
            LoadOptions::default(),
        )
        .unwrap();
    display.pump(loader, host);
}

#[test]
fn dispose_destroys_kinds_in_dependency_order() {
    let mut host = MockHostEngine::new();
    let mut loader = MockSceneLoader::new();
    let mut display = make_display(&mut host);
    load_one(&mut display, &mut loader, &mut host, "a");

    display.dispose(&mut host);

    assert_eq!(host.destroyed.len(), RESOURCES_PER_COMPOSITION);
    let order = ResourceKind::TEARDOWN_ORDER;
    let position = |kind: ResourceKind| order.iter().position(|k| *k == kind).unwrap();
    let kinds: Vec<usize> = host.destroyed.iter().map(|h| position(h.kind)).collect();
    let mut sorted = kinds.clone();
    sorted.sort_unstable();
    assert_eq!(kinds, sorted, "destroy calls must follow teardown order");
    // The composition root entity goes away too.
    assert_eq!(host.entities_destroyed.len(), 1);
}

#[test]
fn double_dispose_is_a_noop() {
    let mut host = MockHostEngine::new();
    let mut loader = MockSceneLoader::new();
    let mut display = make_display(&mut host);
    load_one(&mut display, &mut loader, &mut host, "a");

    display.dispose(&mut host);
    let first_round = host.destroyed.len();
    let first_entities = host.entities_destroyed.len();
    assert!(first_round > 0);

    display.dispose(&mut host);
    assert_eq!(host.destroyed.len(), first_round, "no second destroy round");
    assert_eq!(host.entities_destroyed.len(), first_entities);
}

#[test]
fn targeted_dispose_keeps_the_rest_alive_and_resumes() {
    let mut host = MockHostEngine::new();
    let mut loader = MockSceneLoader::new();
    let mut display = make_display(&mut host);
    for name in ["a", "b", "c"] {
        load_one(&mut display, &mut loader, &mut host, name);
    }

    display
        .dispose_composition("b", &mut host, &mut loader)
        .unwrap();

    assert_eq!(display.get_compositions().len(), 2);
    assert!(display.get_composition_by_name("b").is_none());
    // Only b's resources were released.
    assert_eq!(host.destroyed.len(), RESOURCES_PER_COMPOSITION);
    // The implicit resume reloads the two survivors, once each.
    assert_eq!(loader.reload_begins, 2);

    display.pump(&mut loader, &mut host);
    assert!(!display.is_paused());

    // The survivors keep ticking.
    let before: Vec<f32> = display.get_compositions().iter().map(|c| c.time()).collect();
    display.tick(16.0, &mut host);
    let after: Vec<f32> = display.get_compositions().iter().map(|c| c.time()).collect();
    for (b, a) in before.iter().zip(&after) {
        assert!(a > b, "composition should keep advancing after targeted dispose");
    }
}

#[test]
fn targeted_dispose_can_skip_the_implicit_resume() {
    let mut host = MockHostEngine::new();
    let mut loader = MockSceneLoader::new();
    let cfg = PlayerConfig::default().with_resume_on_targeted_dispose(false);
    let mut display = DisplayHost::new(cfg).unwrap();
    let entity = host.create_entity(None);
    display.initialize(
        &mut host,
        DisplayOptions {
            entity,
            width: 512,
            height: 512,
            interactive: false,
        },
    );
    for name in ["a", "b"] {
        load_one(&mut display, &mut loader, &mut host, name);
    }

    display
        .dispose_composition("a", &mut host, &mut loader)
        .unwrap();

    assert_eq!(display.get_compositions().len(), 1);
    assert_eq!(loader.reload_begins, 0);
    assert!(display.is_paused(), "stays paused until an explicit resume");
}

#[test]
fn destroy_current_compositions_resets_index_numbering() {
    let mut host = MockHostEngine::new();
    let mut loader = MockSceneLoader::new();
    let mut display = make_display(&mut host);
    for name in ["a", "b"] {
        load_one(&mut display, &mut loader, &mut host, name);
    }

    display.destroy_current_compositions(&mut host);
    assert!(display.get_compositions().is_empty());
    assert_eq!(display.base_composition_index(), 0);
    assert!(!display.is_disposed());

    load_one(&mut display, &mut loader, &mut host, "fresh");
    assert_eq!(display.get_composition_by_name("fresh").unwrap().index(), 0);
}

#[test]
fn disposal_is_scoped_per_composition() {
    let mut host = MockHostEngine::new();
    let mut loader = MockSceneLoader::new();
    let mut display = make_display(&mut host);
    for name in ["a", "b"] {
        load_one(&mut display, &mut loader, &mut host, name);
    }
    assert_eq!(host.created.len(), 2 * RESOURCES_PER_COMPOSITION);

    display
        .dispose_composition("a", &mut host, &mut loader)
        .unwrap();

    // b's resources are untouched; factories are never shared.
    assert_eq!(host.destroyed.len(), RESOURCES_PER_COMPOSITION);
    let b = display.get_composition_by_name("b").unwrap();
    assert_eq!(b.instance().resources().total(), RESOURCES_PER_COMPOSITION);
}
