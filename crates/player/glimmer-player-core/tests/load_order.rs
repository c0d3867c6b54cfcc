//! Load ordering and load/dispose race coverage.

use glimmer_player_core::{
    DisplayHost, DisplayOptions, HostEngine, LoadOptions, PlayerConfig, PlayerError, SceneSource,
};
use glimmer_test_fixtures::{simple_scene, MockHostEngine, MockSceneLoader};

fn make_display(host: &mut MockHostEngine) -> DisplayHost {
    let mut display = DisplayHost::new(PlayerConfig::default()).unwrap();
    let entity = host.create_entity(None);
    display.initialize(
        host,
        DisplayOptions {
            entity,
            width: 512,
            height: 512,
            interactive: true,
        },
    );
    display
}

fn scene_source(name: &str) -> SceneSource {
    SceneSource::Scene(Box::new(simple_scene(name)))
}

#[test]
fn indices_follow_request_order_not_completion_order() {
    let mut host = MockHostEngine::new();
    let mut loader = MockSceneLoader::new();
    let mut display = make_display(&mut host);

    loader.hold();
    let slow = display
        .load_scene(&mut loader, scene_source("slow"), LoadOptions::default())
        .unwrap();
    let fast = display
        .load_scene(&mut loader, scene_source("fast"), LoadOptions::default())
        .unwrap();

    // The fast load settles first but keeps the later index.
    loader.release(fast);
    let completed = display.pump(&mut loader, &mut host);
    assert_eq!(completed.len(), 1);
    let fast_id = *completed[0].result.as_ref().unwrap();
    assert_eq!(display.get_composition(fast_id).unwrap().index(), 1);

    loader.release(slow);
    let completed = display.pump(&mut loader, &mut host);
    let slow_id = *completed[0].result.as_ref().unwrap();
    assert_eq!(display.get_composition(slow_id).unwrap().index(), 0);

    // After a tick the live list is sorted by index: slow renders first.
    display.tick(16.0, &mut host);
    let names: Vec<&str> = display
        .get_compositions()
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(names, vec!["slow", "fast"]);
}

#[test]
fn batch_reserves_contiguous_indices_in_array_order() {
    let mut host = MockHostEngine::new();
    let mut loader = MockSceneLoader::new();
    let mut display = make_display(&mut host);

    let requests = display
        .load_scene_batch(
            &mut loader,
            vec![scene_source("one"), scene_source("two")],
            LoadOptions::default(),
        )
        .unwrap();
    assert_eq!(requests.len(), 2);

    let completed = display.pump(&mut loader, &mut host);
    assert_eq!(completed.len(), 2);
    // Reported in request order regardless of poll order.
    assert_eq!(completed[0].request, requests[0]);
    assert_eq!(completed[1].request, requests[1]);

    assert_eq!(display.get_composition_by_name("one").unwrap().index(), 0);
    assert_eq!(display.get_composition_by_name("two").unwrap().index(), 1);

    // A later single load continues the reservation.
    display
        .load_scene(&mut loader, scene_source("three"), LoadOptions::default())
        .unwrap();
    display.pump(&mut loader, &mut host);
    assert_eq!(display.get_composition_by_name("three").unwrap().index(), 2);
}

#[test]
fn dispose_during_inflight_load_fails_cleanly() {
    let mut host = MockHostEngine::new();
    let mut loader = MockSceneLoader::new();
    let mut display = make_display(&mut host);

    loader.hold();
    let request = display
        .load_scene(&mut loader, scene_source("late"), LoadOptions::default())
        .unwrap();

    display.dispose(&mut host);
    loader.release(request);

    let completed = display.pump(&mut loader, &mut host);
    assert_eq!(completed.len(), 1);
    assert!(matches!(
        completed[0].result,
        Err(PlayerError::DisposedDuringLoad)
    ));
    // The half-built composition was never registered.
    assert!(display.get_compositions().is_empty());
}

#[test]
fn load_on_disposed_host_is_rejected_immediately() {
    let mut host = MockHostEngine::new();
    let mut loader = MockSceneLoader::new();
    let mut display = make_display(&mut host);

    display.dispose(&mut host);
    let result = display.load_scene(&mut loader, scene_source("x"), LoadOptions::default());
    assert!(matches!(result, Err(PlayerError::DisposedDuringLoad)));
}

#[test]
fn loader_failure_propagates_to_the_caller() {
    let mut host = MockHostEngine::new();
    let mut loader = MockSceneLoader::new();
    let mut display = make_display(&mut host);

    let request = display
        .load_scene(&mut loader, scene_source("broken"), LoadOptions::default())
        .unwrap();
    loader.fail(request, "404 scene not found");

    let completed = display.pump(&mut loader, &mut host);
    match &completed[0].result {
        Err(PlayerError::SceneLoad { reason }) => assert!(reason.contains("404")),
        other => panic!("expected SceneLoad error, got {other:?}"),
    }
    assert!(display.get_compositions().is_empty());
}

#[test]
fn json_sources_load_through_the_loader() {
    let mut host = MockHostEngine::new();
    let mut loader = MockSceneLoader::new();
    let mut display = make_display(&mut host);

    let value = serde_json::to_value(glimmer_test_fixtures::fixture_scene()).unwrap();
    display
        .load_scene(&mut loader, SceneSource::Json(value), LoadOptions::default())
        .unwrap();
    display.pump(&mut loader, &mut host);

    let comp = display.get_composition_by_name("fixture").unwrap();
    assert_eq!(comp.statistic.load_time_ms, 12.5);
    assert_eq!(comp.items().len(), 2);
}

#[test]
fn load_before_initialize_is_rejected() {
    let mut loader = MockSceneLoader::new();
    let mut display = DisplayHost::new(PlayerConfig::default()).unwrap();
    let result = display.load_scene(&mut loader, scene_source("x"), LoadOptions::default());
    assert!(matches!(result, Err(PlayerError::NotInitialized)));
}

#[test]
fn load_asset_yields_a_scene_without_a_composition() {
    let mut host = MockHostEngine::new();
    let mut loader = MockSceneLoader::new();
    let mut display = make_display(&mut host);

    let request = display.load_asset(&mut loader, &scene_source("solo"), &LoadOptions::default());
    let scene = display.poll_asset(&mut loader, request).unwrap().unwrap();
    assert_eq!(scene.name, "solo");
    assert!(display.get_compositions().is_empty());
}
