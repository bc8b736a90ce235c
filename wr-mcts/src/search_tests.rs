use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use wr_core::belief::Belief;
use wr_core::catalog::Catalog;
use wr_core::config::PlannerConfig;

use crate::results::ActionResult;
use crate::search::{PlanError, Planner};
use crate::tree::Tree;

fn planner() -> Planner {
    Planner::new(Catalog::standard(), PlannerConfig::default()).unwrap()
}

fn run(
    total_min: f64,
    total_max: f64,
    mass_used: f64,
    iterations: u32,
    seed: u64,
) -> (Planner, Tree) {
    let p = planner();
    let belief = Belief::new(total_min, total_max).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let tree = p.plan(belief, mass_used, iterations, &mut rng).unwrap();
    (p, tree)
}

fn result<'a>(results: &'a [ActionResult], key: &str) -> &'a ActionResult {
    results
        .iter()
        .find(|r| r.key == key)
        .unwrap_or_else(|| panic!("no result for {key}"))
}

#[test]
fn fresh_hole_prefers_a_battleship_and_collapses_reliably() {
    let (p, tree) = run(1800.0, 2200.0, 0.0, 100_000, 7);
    let results = p.action_results(&tree);

    let top = &results[0];
    assert!(
        top.key.starts_with("BS_"),
        "expected a battleship on top, got {} (score {})",
        top.key,
        top.strategy_score
    );
    assert!(
        top.success_rate > 0.85,
        "top success_rate too low: {}",
        top.success_rate
    );

    let dist = p.trip_distribution(&tree);
    assert!(!dist.is_empty());
    let mode = dist
        .iter()
        .max_by(|a, b| a.pct.total_cmp(&b.pct))
        .unwrap()
        .trips;
    assert!((3..=7).contains(&mode), "trip mode out of range: {mode}");
}

#[test]
fn bs_cold_hot_takes_a_handful_of_trips_on_a_fresh_hole() {
    let (p, tree) = run(1800.0, 2200.0, 0.0, 100_000, 7);
    let results = p.action_results(&tree);
    let r = result(&results, "BS_COLD_HOT");
    assert!(
        (3.0..=7.0).contains(&r.avg_steps),
        "BS_COLD_HOT avg_steps out of range: {}",
        r.avg_steps
    );
}

#[test]
fn partially_rolled_hole_still_prefers_a_battleship() {
    let (p, tree) = run(1800.0, 2200.0, 1000.0, 100_000, 13);
    let results = p.action_results(&tree);

    assert!(results[0].key.starts_with("BS_"), "top: {}", results[0].key);

    let best_bs = results
        .iter()
        .find(|r| r.key.starts_with("BS_"))
        .expect("some battleship explored");
    assert!(
        (1.0..=5.0).contains(&best_bs.avg_steps),
        "{} avg_steps out of range: {}",
        best_bs.key,
        best_bs.avg_steps
    );
}

#[test]
fn outbound_risk_is_priced_into_the_success_rate() {
    // Belief [100, 200] and a 134 outbound: about a third of the possible
    // worlds roll the pilot on the way out.
    let (p, tree) = run(100.0, 200.0, 0.0, 100_000, 3);
    let results = p.action_results(&tree);
    let r = result(&results, "HIC_HOT");
    assert!(
        r.success_rate > 0.5 && r.success_rate < 0.95,
        "HIC_HOT success_rate out of range: {}",
        r.success_rate
    );
    assert!(!r.guaranteed_safe);
}

#[test]
fn narrow_range_trip_estimate_is_bias_corrected() {
    let (p, tree) = run(200.0, 600.0, 0.0, 100_000, 5);
    let results = p.action_results(&tree);
    let r = result(&results, "HIC_HOT");
    assert!(
        r.avg_steps > 1.3 && r.avg_steps < 3.0,
        "HIC_HOT avg_steps out of range: {}",
        r.avg_steps
    );
}

#[test]
fn node_statistics_invariants_hold() {
    let (p, tree) = run(1800.0, 2200.0, 0.0, 20_000, 11);

    for (id, n) in tree.nodes() {
        assert!(n.successes <= n.visits, "node {id}");
        assert!(n.wins >= 0.0, "node {id}");
        assert!(n.wins <= n.successes as f64 + 1e-9, "node {id}");
        let hist_total: u64 = n.terminal_trips.values().sum();
        assert!(hist_total <= n.successes, "node {id}");

        for (aid, _) in p.catalog().iter() {
            let stats = tree.action_stats(id, aid);
            assert!(stats.visits <= n.visits, "node {id} action {aid}");
        }

        if let Some(parent) = n.parent {
            let pn = tree.node(parent);
            assert!(n.mass_used >= pn.mass_used, "node {id}");
            assert_eq!(n.depth, pn.depth + 1, "node {id}");
            // Beliefs only narrow along a path (up to fp round-off).
            assert!(n.total_belief.min >= pn.total_belief.min - 1e-9, "node {id}");
            assert!(n.total_belief.max <= pn.total_belief.max + 1e-9, "node {id}");
        }
    }
}

#[test]
fn guaranteed_safe_actions_keep_their_observed_rate() {
    let (p, tree) = run(1800.0, 2200.0, 0.0, 20_000, 17);
    for r in p.action_results(&tree) {
        if r.guaranteed_safe && r.visits > 0 {
            let observed = r.successes as f64 / r.visits as f64;
            assert!(
                (r.success_rate - observed).abs() < 1e-12,
                "{}: surfaced {} observed {}",
                r.key,
                r.success_rate,
                observed
            );
        }
    }
}

#[test]
fn ranking_is_total_and_stable() {
    let (p, tree) = run(1800.0, 2200.0, 0.0, 20_000, 19);
    let results = p.action_results(&tree);
    for w in results.windows(2) {
        let (a, b) = (&w[0], &w[1]);
        assert!(
            a.strategy_score > b.strategy_score
                || (a.strategy_score == b.strategy_score && a.avg_steps <= b.avg_steps),
            "ranking violated between {} and {}",
            a.key,
            b.key
        );
    }
}

#[test]
fn same_seed_gives_the_same_plan() {
    let (p1, t1) = run(1800.0, 2200.0, 0.0, 5_000, 42);
    let (p2, t2) = run(1800.0, 2200.0, 0.0, 5_000, 42);

    let r1 = p1.action_results(&t1);
    let r2 = p2.action_results(&t2);
    assert_eq!(r1.len(), r2.len());
    for (a, b) in r1.iter().zip(&r2) {
        assert_eq!(a.key, b.key);
        assert_eq!(a.visits, b.visits);
        assert_eq!(a.wins.to_bits(), b.wins.to_bits());
    }
    assert_eq!(p1.sequence(&t1), p2.sequence(&t2));
}

#[test]
fn every_root_action_gets_explored() {
    let (p, tree) = run(1800.0, 2200.0, 0.0, 10_000, 23);
    let results = p.action_results(&tree);
    // All five catalog entries are applicable from this belief, and the
    // unexplored-pair scan guarantees each is tried.
    assert_eq!(results.len(), p.catalog().len());
}

#[test]
fn strict_filter_prunes_featherweight_round_trips() {
    let cfg = PlannerConfig {
        strict_action_filter: true,
        ..PlannerConfig::default()
    };
    let p = Planner::new(Catalog::standard(), cfg).unwrap();
    let belief = Belief::new(1800.0, 2200.0).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(29);
    let tree = p.plan(belief, 0.0, 10_000, &mut rng).unwrap();
    let results = p.action_results(&tree);

    // remaining.max / max_reasonable_trips = 2200 / 9 > 212, so the cold HIC
    // is never worth a slot while safe battleships exist.
    assert!(!results.iter().any(|r| r.key == "HIC_COLD"));
    assert!(results.iter().any(|r| r.key == "BS_HOT_HOT"));
}

#[test]
fn zero_iterations_yields_an_empty_summary() {
    let (p, tree) = run(1800.0, 2200.0, 0.0, 0, 0);
    assert!(p.action_results(&tree).is_empty());
    assert!(p.trip_distribution(&tree).is_empty());
    assert!(p.best_action(&tree).is_none());
    assert!(p.sequence(&tree).is_empty());
    assert_eq!(tree.len(), 1);
}

#[test]
fn best_action_tracks_visits() {
    let (p, tree) = run(1800.0, 2200.0, 0.0, 20_000, 31);
    let best = p.best_action(&tree).expect("explored something");
    let max_visits = p
        .action_results(&tree)
        .iter()
        .map(|r| r.visits)
        .max()
        .unwrap();
    assert_eq!(best.visits, max_visits);
    assert!(best.guaranteed_safe);
}

#[test]
fn sequence_descends_most_visited_children() {
    let (p, tree) = run(1800.0, 2200.0, 0.0, 20_000, 37);
    let seq = p.sequence(&tree);
    assert!(!seq.is_empty());
    for key in &seq {
        assert!(p.catalog().find(key).is_some(), "unknown key {key}");
    }
}

#[test]
fn invalid_inputs_are_refused() {
    let p = planner();
    let mut rng = ChaCha8Rng::seed_from_u64(0);

    let ok = Belief::new(100.0, 200.0).unwrap();
    assert!(matches!(
        p.plan(ok, -1.0, 10, &mut rng),
        Err(PlanError::InvalidMassUsed { .. })
    ));

    // Fields are public; a caller can break the constructor's invariant.
    let broken = Belief { min: 200.0, max: 100.0 };
    assert!(matches!(
        p.plan(broken, 0.0, 10, &mut rng),
        Err(PlanError::InvalidBelief { .. })
    ));
}

#[test]
fn bad_config_is_refused_up_front() {
    let cfg = PlannerConfig {
        trip_decay: 0.0,
        ..PlannerConfig::default()
    };
    assert!(matches!(
        Planner::new(Catalog::standard(), cfg),
        Err(PlanError::InvalidConfig { .. })
    ));

    let cfg = PlannerConfig {
        max_depth: 0,
        ..PlannerConfig::default()
    };
    assert!(matches!(
        Planner::new(Catalog::standard(), cfg),
        Err(PlanError::InvalidConfig { .. })
    ));
}

#[test]
fn degenerate_belief_plans_without_panicking() {
    // A point belief: the total is known exactly.
    let (p, tree) = run(2000.0, 2000.0, 0.0, 2_000, 41);
    let results = p.action_results(&tree);
    assert!(!results.is_empty());
    for r in &results {
        assert!(r.success_rate >= 0.0 && r.success_rate <= 1.0 + 1e-9);
    }
}
