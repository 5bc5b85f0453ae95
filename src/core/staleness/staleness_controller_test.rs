use super::*;
use crate::StalenessConfig;

fn battle_result_like() -> StalenessConfig {
    StalenessConfig {
        stale_limit: 20,
        probe_interval: 2,
        deep_stale_limit: Some(100),
        deep_probe_interval: 5,
        permanent_stop: Some(200),
    }
}

fn supporter_like() -> StalenessConfig {
    StalenessConfig {
        stale_limit: 3,
        probe_interval: 5,
        deep_stale_limit: None,
        deep_probe_interval: 10,
        permanent_stop: None,
    }
}

/// Drive the controller with a schema that never changes. Records the state a
/// tick started in and the decision taken, until `max_ticks` or a stop.
fn run_unchanged(
    controller: &mut StalenessController,
    max_ticks: usize,
) -> Vec<(StalenessState, ReadDecision)> {
    let mut trace = Vec::new();
    for _ in 0..max_ticks {
        let state = controller.state();
        let decision = controller.poll(None);
        if let ReadDecision::Read(_) = decision {
            controller.observe(false);
        }
        trace.push((state, decision));
        if decision == ReadDecision::Stopped {
            break;
        }
    }
    trace
}

#[test]
fn starts_fresh_with_full_reads() {
    let mut controller = StalenessController::new(battle_result_like());
    assert_eq!(controller.state(), StalenessState::Fresh);
    assert_eq!(controller.poll(None), ReadDecision::Read(ReadMode::Full));
    assert_eq!(controller.stale_count(), 0);
}

#[test]
fn unchanged_schema_walks_every_state_once_and_never_returns() {
    let mut controller = StalenessController::new(battle_result_like());
    let trace = run_unchanged(&mut controller, 1_000);

    let mut seen: Vec<StalenessState> = Vec::new();
    for state in trace.iter().map(|(s, _)| *s).chain(std::iter::once(controller.state())) {
        if let Some(last) = seen.last() {
            assert!(state >= *last, "went back from {:?} to {:?}", last, state);
        }
        if seen.last() != Some(&state) {
            seen.push(state);
        }
    }

    assert_eq!(
        seen,
        vec![
            StalenessState::Fresh,
            StalenessState::Stale,
            StalenessState::DeepStale,
            StalenessState::PermanentStop
        ]
    );
    assert!(controller.is_stopped());
    assert_eq!(controller.poll(None), ReadDecision::Stopped);
}

#[test]
fn enters_stale_after_stale_limit_reads() {
    let mut controller = StalenessController::new(battle_result_like());
    for _ in 0..19 {
        assert_eq!(controller.poll(None), ReadDecision::Read(ReadMode::Full));
        controller.observe(false);
        assert_eq!(controller.state(), StalenessState::Fresh);
    }
    assert_eq!(controller.poll(None), ReadDecision::Read(ReadMode::Full));
    controller.observe(false);
    assert_eq!(controller.state(), StalenessState::Stale);
}

#[test]
fn stale_reads_only_every_probe_interval() {
    let mut controller = StalenessController::new(supporter_like());
    for _ in 0..3 {
        controller.poll(None);
        controller.observe(false);
    }
    assert_eq!(controller.state(), StalenessState::Stale);

    let decisions: Vec<ReadDecision> = (0..10)
        .map(|_| {
            let d = controller.poll(None);
            if let ReadDecision::Read(_) = d {
                controller.observe(false);
            }
            d
        })
        .collect();
    let reads = decisions.iter().filter(|d| matches!(d, ReadDecision::Read(_))).count();

    assert_eq!(reads, 2);
    assert!(decisions
        .iter()
        .all(|d| matches!(d, ReadDecision::Skip | ReadDecision::Read(ReadMode::StaleProbe))));
}

#[test]
fn skipped_ticks_do_not_reset_counter() {
    let mut controller = StalenessController::new(supporter_like());
    for _ in 0..3 {
        controller.poll(None);
        controller.observe(false);
    }
    let before = controller.stale_count();
    assert_eq!(controller.poll(None), ReadDecision::Skip);
    assert_eq!(controller.stale_count(), before + 1);
}

#[test]
fn deep_stale_slows_reads_further() {
    let mut controller = StalenessController::new(battle_result_like());
    let trace = run_unchanged(&mut controller, 1_000);

    let stale_reads = trace
        .iter()
        .filter(|(s, d)| *s == StalenessState::Stale && matches!(d, ReadDecision::Read(_)))
        .count();
    let deep_reads = trace
        .iter()
        .filter(|(s, d)| *s == StalenessState::DeepStale && matches!(d, ReadDecision::Read(_)))
        .count();

    // Stale covers counts 21..=100 at interval 2, deep covers 101..=199 at interval 5.
    assert_eq!(stale_reads, 40);
    assert_eq!(deep_reads, 19);
}

#[test]
fn change_returns_to_fresh() {
    let mut controller = StalenessController::new(supporter_like());
    for _ in 0..8 {
        if let ReadDecision::Read(_) = controller.poll(None) {
            controller.observe(false);
        }
    }
    assert_eq!(controller.state(), StalenessState::Stale);

    controller.observe(true);
    assert_eq!(controller.state(), StalenessState::Fresh);
    assert_eq!(controller.stale_count(), 0);
    assert_eq!(controller.poll(None), ReadDecision::Read(ReadMode::Full));
}

#[test]
fn probe_interval_override_applies_to_stale_only() {
    let mut controller = StalenessController::new(supporter_like());
    for _ in 0..3 {
        controller.poll(None);
        controller.observe(false);
    }
    // Override 1 reads on every stale tick.
    for _ in 0..4 {
        assert_eq!(controller.poll(Some(1)), ReadDecision::Read(ReadMode::StaleProbe));
    }
}

fn reads_in(
    controller: &mut StalenessController,
    ticks: usize,
) -> usize {
    (0..ticks)
        .filter(|_| matches!(controller.poll(None), ReadDecision::Read(_)))
        .count()
}

#[test]
fn counter_saturates_without_permanent_stop() {
    let mut controller = StalenessController::new(supporter_like());
    for _ in 0..3 {
        controller.poll(None);
        controller.observe(false);
    }
    for _ in 0..20_000 {
        controller.poll(None);
    }
    assert_eq!(controller.stale_count(), 10_000);
    assert_eq!(controller.state(), StalenessState::Stale);
    assert!(!controller.is_stopped());

    // The schedule keeps its period past the ceiling.
    assert_eq!(reads_in(&mut controller, 100), 20);
}

#[test]
fn saturated_counter_keeps_reading_with_non_dividing_interval() {
    let mut controller = StalenessController::new(StalenessConfig {
        probe_interval: 3,
        ..supporter_like()
    });
    for _ in 0..3 {
        controller.poll(None);
        controller.observe(false);
    }
    for _ in 0..20_000 {
        controller.poll(None);
    }
    assert_eq!(controller.stale_count(), 10_000);

    assert_eq!(reads_in(&mut controller, 99), 33);

    // A change seen on one of those reads still brings it back.
    controller.observe(true);
    assert_eq!(controller.state(), StalenessState::Fresh);
}

#[test]
fn reset_keeps_permanent_stop_and_rearm_clears_it() {
    let mut controller = StalenessController::new(battle_result_like());
    run_unchanged(&mut controller, 1_000);
    assert!(controller.is_stopped());

    controller.reset();
    assert_eq!(controller.state(), StalenessState::PermanentStop);
    assert_eq!(controller.poll(None), ReadDecision::Stopped);

    controller.rearm();
    assert_eq!(controller.state(), StalenessState::Fresh);
    assert_eq!(controller.poll(None), ReadDecision::Read(ReadMode::Full));
}

#[test]
fn observe_after_stop_is_ignored() {
    let mut controller = StalenessController::new(supporter_like());
    controller.force_stop();
    controller.observe(true);
    controller.observe(false);
    assert_eq!(controller.stale_count(), 0);
    assert_eq!(controller.state(), StalenessState::PermanentStop);
}
