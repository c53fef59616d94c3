use reflex_core::constants::{SETTLE_DELAY_MS, TARGET_HEIGHT, TARGET_WIDTH};
use reflex_core::{
    DeviceType, EngineConfig, EngineEvent, EnginePhase, EvasionEngine, PointerEvent, Point,
};

const ARENA_W: f64 = 1_280.0;
const ARENA_H: f64 = 720.0;

fn engine(device: DeviceType, seed: u32) -> EvasionEngine {
    let mut engine = EvasionEngine::new(EngineConfig::for_device(device), seed);
    engine.measure_arena(ARENA_W, ARENA_H, 0);
    engine
}

/// One near miss per settle window, pointer dead on the target centre.
fn near_misses(engine: &mut EvasionEngine, count: u64) {
    for round in 0..count {
        let center = engine.target_center();
        let now = round * SETTLE_DELAY_MS;
        assert!(
            engine.on_pointer_moved(PointerEvent::mouse(center.x, center.y), now),
            "round {round} should relocate"
        );
    }
}

#[test]
fn every_fifth_near_miss_levels_up() {
    let mut five = engine(DeviceType::Desktop, 1);
    near_misses(&mut five, 5);
    assert_eq!(five.level(), 2);

    let mut nine = engine(DeviceType::Desktop, 2);
    near_misses(&mut nine, 9);
    assert_eq!(nine.level(), 2);

    let mut ten = engine(DeviceType::Desktop, 3);
    near_misses(&mut ten, 10);
    assert_eq!(ten.level(), 3);
    assert_eq!(ten.attempts(), 10);

    let level_ups = ten
        .drain_events()
        .into_iter()
        .filter(|event| matches!(event, EngineEvent::LevelUp { .. }))
        .count();
    assert_eq!(level_ups, 2);
}

#[test]
fn level_up_shrinks_the_escape_radius() {
    let mut engine = engine(DeviceType::Desktop, 4);
    let before = engine.difficulty();
    near_misses(&mut engine, 5);
    let after = engine.difficulty();
    assert!(after.escape_radius < before.escape_radius);
    assert!(after.escape_min_distance > before.escape_min_distance);
}

#[test]
fn rapid_pointer_bursts_relocate_once_per_window() {
    let mut engine = engine(DeviceType::Desktop, 5);
    let mut relocations = 0;
    // 60 events over 290ms, always chasing the current centre.
    for step in 0..60u64 {
        let center = engine.target_center();
        if engine.on_pointer_moved(PointerEvent::mouse(center.x, center.y), 10 + step * 5) {
            relocations += 1;
        }
    }
    assert_eq!(relocations, 1);
    assert_eq!(engine.attempts(), 1);
    assert_eq!(engine.phase(), EnginePhase::Escaping);
}

#[test]
fn relocations_stay_in_bounds() {
    let mut engine = engine(DeviceType::Desktop, 6);
    near_misses(&mut engine, 40);
    for event in engine.drain_events() {
        if let EngineEvent::Relocated { to, .. } = event {
            assert!((0.0..=ARENA_W - TARGET_WIDTH).contains(&to.x), "{to:?}");
            assert!((0.0..=ARENA_H - TARGET_HEIGHT).contains(&to.y), "{to:?}");
        }
    }
}

#[test]
fn same_seed_replays_identically() {
    let positions = |seed| {
        let mut engine = engine(DeviceType::Desktop, seed);
        near_misses(&mut engine, 12);
        engine
            .drain_events()
            .into_iter()
            .filter_map(|event| match event {
                EngineEvent::Relocated { to, .. } => Some(to),
                _ => None,
            })
            .collect::<Vec<Point>>()
    };
    assert_eq!(positions(77), positions(77));
    assert_ne!(positions(77), positions(78));
}

#[test]
fn touch_round_on_mobile_produces_outcome() {
    let mut engine = EvasionEngine::new(EngineConfig::for_device(DeviceType::Mobile), 8);
    engine.measure_arena(390.0, 844.0, 1_000);

    let center = engine.target_center();
    assert!(!engine.on_pointer_moved(PointerEvent::mouse(center.x, center.y), 1_100));
    assert!(engine.on_pointer_moved(PointerEvent::touch(center.x, center.y), 1_200));

    let outcome = engine.on_target_activated(9_700).expect("round running");
    assert_eq!(outcome.time_taken_seconds, 8.0);
    assert_eq!(outcome.attempts, 1);
    assert_eq!(outcome.max_level, 1);

    let events = engine.drain_events();
    assert!(matches!(events.last(), Some(EngineEvent::Activated(o)) if *o == outcome));
}
