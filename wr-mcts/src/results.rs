//! Ranked recommendations and trip statistics extracted from a search tree.

use wr_core::catalog::{Action, ActionId};
use wr_core::observe::Observation;

use crate::node::NodeId;
use crate::search::Planner;
use crate::tree::{ActionStats, Tree};

/// Belief intervals narrower than this are treated as a point.
const DEGENERATE_EPS: f64 = 1e-9;

/// Trip buckets below this probability are dropped from the distribution.
const MIN_TRIP_PCT: f64 = 0.01;

/// One ranked root action.
#[derive(Debug, Clone)]
pub struct ActionResult {
    pub key: String,
    pub action: Action,
    pub visits: u64,
    pub wins: f64,
    pub successes: u64,
    /// Observed success rate scaled by the outbound-survival probability
    /// under the full root belief.
    pub success_rate: f64,
    /// Decayed score scaled the same way; the ranking key.
    pub strategy_score: f64,
    /// Expected round trips to collapse, bias-corrected for narrow ranges.
    pub avg_steps: f64,
    /// Mass of one full round trip.
    pub mass: f64,
    /// True when no possible world rolls the pilot on the outbound.
    pub guaranteed_safe: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TripBucket {
    pub trips: u16,
    pub pct: f64,
}

/// Single headline recommendation: the most-visited root action.
#[derive(Debug, Clone)]
pub struct BestAction {
    pub key: String,
    pub action: Action,
    pub visits: u64,
    pub wins: f64,
    /// Win ratio over this action's visits.
    pub success_rate: f64,
    pub guaranteed_safe: bool,
}

impl Planner {
    /// Aggregate the root's children into a ranked recommendation list.
    ///
    /// The search only expands subtrees where the sampled world survives the
    /// outbound, so raw subtree statistics are conditioned on survival. Both
    /// rates are therefore scaled by `p_safe_outbound`, the fraction of the
    /// root remaining-belief interval the outbound survives; and the
    /// trip average is blended toward the true single-trip probability when
    /// the conditioning visibly skews it low.
    pub fn action_results(&self, tree: &Tree) -> Vec<ActionResult> {
        let root = tree.node(Tree::ROOT);
        let r = root.remaining_belief();
        let width = r.max - r.min;

        let mut results = Vec::new();
        for (aid, entry) in self.catalog().iter() {
            let stats = tree.action_stats(Tree::ROOT, aid);
            if stats.visits == 0 {
                continue;
            }
            let observed_rate = stats.successes as f64 / stats.visits as f64;
            let observed_score = stats.wins / stats.visits as f64;
            let observed_avg = if stats.successes > 0 {
                stats.trip_sum as f64 / stats.successes as f64
            } else {
                0.0
            };

            let out = entry.action.out;
            let p_safe = if width <= DEGENERATE_EPS {
                if out <= r.min {
                    1.0
                } else {
                    0.0
                }
            } else if out <= r.min {
                1.0
            } else {
                (r.max - out).max(0.0) / width
            };

            let valid_range = r.max - out;
            let p_one_trip = if valid_range > 0.0 {
                (valid_range.min(entry.action.back) / valid_range).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let avg_steps = if p_one_trip < 0.95 && observed_avg < 1.5 {
                p_one_trip + 2.0 * (1.0 - p_one_trip)
            } else {
                observed_avg
            };

            results.push(ActionResult {
                key: entry.key.clone(),
                action: entry.action,
                visits: stats.visits,
                wins: stats.wins,
                successes: stats.successes,
                success_rate: p_safe * observed_rate,
                strategy_score: p_safe * observed_score,
                avg_steps,
                mass: entry.action.round_trip(),
                guaranteed_safe: r.min > out,
            });
        }

        results.sort_by(|a, b| {
            b.strategy_score
                .total_cmp(&a.strategy_score)
                .then(a.avg_steps.total_cmp(&b.avg_steps))
        });
        results
    }

    /// Probability distribution over the number of round trips to collapse,
    /// from the root's terminal histogram. Buckets are weighted by
    /// `decay^trips`, consistent with the `wins` normalizer.
    pub fn trip_distribution(&self, tree: &Tree) -> Vec<TripBucket> {
        let root = tree.node(Tree::ROOT);
        if root.wins <= 0.0 {
            return Vec::new();
        }
        let decay = self.config().trip_decay;
        let mut out: Vec<TripBucket> = root
            .terminal_trips
            .iter()
            .map(|(&trips, &count)| TripBucket {
                trips,
                pct: count as f64 * decay.powi(i32::from(trips)) / root.wins,
            })
            .filter(|b| b.pct >= MIN_TRIP_PCT)
            .collect();
        out.sort_by_key(|b| b.trips);
        out
    }

    /// The most-visited root action, or None when nothing was explored.
    pub fn best_action(&self, tree: &Tree) -> Option<BestAction> {
        let r = tree.node(Tree::ROOT).remaining_belief();
        let mut best: Option<(ActionId, ActionStats)> = None;
        for (aid, _) in self.catalog().iter() {
            let stats = tree.action_stats(Tree::ROOT, aid);
            if stats.visits == 0 {
                continue;
            }
            if best.map_or(true, |(_, b)| stats.visits > b.visits) {
                best = Some((aid, stats));
            }
        }
        best.map(|(aid, stats)| {
            let entry = self.catalog().get(aid);
            BestAction {
                key: entry.key.clone(),
                action: entry.action,
                visits: stats.visits,
                wins: stats.wins,
                success_rate: stats.wins / stats.visits as f64,
                guaranteed_safe: r.min > entry.action.out,
            }
        })
    }

    /// Greedy most-visited descent from the root. A diagnostic: real play
    /// replans after every observed jump.
    pub fn sequence(&self, tree: &Tree) -> Vec<String> {
        let mut out = Vec::new();
        let mut node_id = Tree::ROOT;
        loop {
            let mut best_action: Option<(ActionId, u64)> = None;
            for (aid, _) in self.catalog().iter() {
                let stats = tree.action_stats(node_id, aid);
                if stats.visits == 0 {
                    continue;
                }
                if best_action.map_or(true, |(_, v)| stats.visits > v) {
                    best_action = Some((aid, stats.visits));
                }
            }
            let Some((aid, _)) = best_action else {
                break;
            };

            let mut best_child: Option<(NodeId, u64)> = None;
            for obs in Observation::ALL {
                if let Some(cid) = tree.child(node_id, aid, obs) {
                    let visits = tree.node(cid).visits;
                    if best_child.map_or(true, |(_, v)| visits > v) {
                        best_child = Some((cid, visits));
                    }
                }
            }
            let Some((cid, _)) = best_child else {
                break;
            };

            out.push(self.catalog().get(aid).key.clone());
            node_id = cid;
        }
        out
    }
}
