//! Integration tests for full episode behavior
//!
//! These exercise the complete per-tick pipeline: action application,
//! physiology, hazards, hunters, trophy, death evaluation, observation.

use veldt::agents::heuristic::HeuristicAgent;
use veldt::agents::Agent;
use veldt::core::config::Config;
use veldt::core::types::{Action, CauseOfDeath, EpisodeOutcome, GridPos};
use veldt::sim::engine::Engine;

#[test]
fn test_vitals_bounded_over_full_episode() {
    let mut config = Config::default();
    config.sim.max_steps = 200;
    config.difficulty.drain_multiplier = 2.0;
    config.difficulty.hazard_multiplier = 2.0;

    let mut engine = Engine::new(config, 42);
    let mut agent = HeuristicAgent::new();

    for _ in 0..200 {
        if engine.done() {
            break;
        }
        let obs = engine.observe();
        let decision = agent.decide(&obs);
        engine.step(decision.action, None);

        let o = &engine.organism;
        for (name, v) in [
            ("hydration", o.hydration),
            ("energy", o.energy),
            ("fatigue", o.fatigue),
            ("injury", o.injury),
            ("infection", o.infection),
        ] {
            assert!(
                (0.0..=100.0).contains(&v),
                "{} left [0,100]: {}",
                name,
                v
            );
        }
    }
}

#[test]
fn test_hunter_kill_sets_hunted_cause() {
    let mut config = Config::default();
    config.hunters.enabled = true;
    config.hunters.count = 1;
    config.hunters.spawn_margin = 5;

    let mut engine = Engine::new(config, 42);
    // Teleport the hunter onto the organism so the kill is immediate
    engine.hunters.hunters[0].pos = engine.organism.pos;
    let result = engine.step(Action::Rest, None);

    assert!(!result.alive);
    assert_eq!(engine.organism.cause_of_death, CauseOfDeath::Hunted);
    assert!(result.events.iter().any(|e| e.contains("hunter #0")));
    assert_eq!(engine.summary().outcome, EpisodeOutcome::Died);
}

#[test]
fn test_hunted_cause_survives_later_death_checks() {
    let mut config = Config::default();
    config.hunters.enabled = true;
    config.hunters.count = 1;
    config.hunters.spawn_margin = 5;

    let mut engine = Engine::new(config, 42);
    // Also dehydrated on the same tick: the kill must win the label
    engine.organism.hydration = 0.5;
    engine.hunters.hunters[0].pos = engine.organism.pos;
    engine.step(Action::Rest, None);

    assert_eq!(engine.organism.cause_of_death, CauseOfDeath::Hunted);
}

#[test]
fn test_trophy_win_ends_episode() {
    let mut config = Config::default();
    config.trophy.enabled = true;
    config.trophy.min_distance_from_spawn = 10;

    let mut engine = Engine::new(config, 42);
    engine.organism.pos = engine.trophy.pos;
    let result = engine.step(Action::Rest, None);

    assert!(result.trophy_won);
    assert!(engine.done());
    assert_eq!(engine.summary().outcome, EpisodeOutcome::TrophyFound);

    // A further step is a no-op
    let steps_logged = engine.replay.steps.len();
    engine.step(Action::Rest, None);
    assert_eq!(engine.replay.steps.len(), steps_logged);
}

#[test]
fn test_observation_never_leaks_detection_radius() {
    let mut config = Config::default();
    config.hunters.enabled = true;
    config.hunters.count = 8;
    config.hunters.spawn_margin = 2;
    config.fog_of_war.enabled = true;
    config.fog_of_war.visibility_radius = 1000; // everything visible
    config.sim.max_steps = 40;

    let mut engine = Engine::new(config, 42);
    let mut agent = HeuristicAgent::new();

    for _ in 0..40 {
        if engine.done() {
            break;
        }
        let obs = engine.observe();
        let json = serde_json::to_string(&obs).unwrap();
        assert!(
            !json.contains("detection_radius") && !json.contains("radius"),
            "observation leaked hidden hunter parameters"
        );
        assert!(
            !obs.visible_hunters.is_empty(),
            "with unlimited visibility, hunters must be visible"
        );
        let decision = agent.decide(&obs);
        engine.step(decision.action, None);
    }
}

#[test]
fn test_directional_hint_withheld_between_intervals() {
    let mut config = Config::default();
    config.trophy.enabled = true;
    config.trophy.hint_interval = 5;
    config.sim.max_steps = 12;

    let mut engine = Engine::new(config, 42);
    for step in 0..12u64 {
        if engine.done() {
            break;
        }
        let obs = engine.observe();
        let hint = obs.trophy.expect("trophy enabled, hint always present");
        if step % 5 == 0 {
            assert!(
                hint.direction.is_some(),
                "step {}: interval tick must carry a direction",
                step
            );
        } else {
            assert!(
                hint.direction.is_none(),
                "step {}: off-interval tick leaked a direction",
                step
            );
        }
        engine.step(Action::Rest, None);
    }
}

#[test]
fn test_mask_respected_at_map_corner() {
    let config = Config::default();
    let mut engine = Engine::new(config, 42);
    engine.organism.pos = GridPos::new(0, 0);
    let obs = engine.observe();
    assert!(!obs.action_mask.contains(&Action::MoveN));
    assert!(!obs.action_mask.contains(&Action::MoveW));
    assert!(obs.action_mask.contains(&Action::Rest));
}

#[test]
fn test_step_budget_leaves_running_outcome() {
    let mut config = Config::default();
    config.sim.max_steps = 5;
    let mut agent = HeuristicAgent::new();
    let replay = veldt::eval::run_episode(&config, 4242, &mut agent).unwrap();
    let summary = replay.summary.unwrap();
    if summary.cause_of_death == CauseOfDeath::Alive {
        assert_eq!(summary.outcome, EpisodeOutcome::Running);
        assert_eq!(summary.survived_steps, 5);
    }
}
