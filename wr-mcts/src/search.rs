//! The POMCTS planning loop.
//!
//! Each iteration samples a true hole mass from the root belief, descends the
//! tree branching on (action, observation) pairs, plays the remainder out
//! with a greedy high-mass policy, and backs a decayed success score up the
//! visited path. An iteration fails when the sampled world strands the pilot
//! (no survivable outbound) or the trip cap runs out before the hole closes.

use rand::Rng;
use thiserror::Error;
use wr_core::belief::Belief;
use wr_core::catalog::{ActionId, Catalog, CatalogEntry, CatalogError};
use wr_core::config::PlannerConfig;
use wr_core::observe::{observe, update_total_belief, Observation};

use crate::node::{Node, NodeId};
use crate::tree::Tree;

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("invalid config: {msg}")]
    InvalidConfig { msg: &'static str },
    #[error("invalid total-mass belief [{min}, {max}]")]
    InvalidBelief { min: f64, max: f64 },
    #[error("mass used must be finite and >= 0, got {mass_used}")]
    InvalidMassUsed { mass_used: f64 },
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// A validated catalog + configuration pair. One planner serves any number
/// of `plan` calls; each call owns and returns its own tree.
pub struct Planner {
    cfg: PlannerConfig,
    catalog: Catalog,
}

impl Planner {
    pub fn new(catalog: Catalog, cfg: PlannerConfig) -> Result<Self, PlanError> {
        if !(cfg.ucb_constant.is_finite() && cfg.ucb_constant >= 0.0) {
            return Err(PlanError::InvalidConfig {
                msg: "ucb_constant must be finite and >= 0",
            });
        }
        if !(cfg.trip_decay.is_finite() && cfg.trip_decay > 0.0 && cfg.trip_decay <= 1.0) {
            return Err(PlanError::InvalidConfig {
                msg: "trip_decay must be in (0, 1]",
            });
        }
        if cfg.max_depth == 0 {
            return Err(PlanError::InvalidConfig {
                msg: "max_depth must be > 0",
            });
        }
        let s = cfg.observe.shrink_threshold;
        let c = cfg.observe.crit_threshold;
        if !(c.is_finite() && s.is_finite() && 0.0 < c && c < s && s < 1.0) {
            return Err(PlanError::InvalidConfig {
                msg: "thresholds must satisfy 0 < crit < shrink < 1",
            });
        }
        if cfg.strict_action_filter && cfg.max_reasonable_trips == 0 {
            return Err(PlanError::InvalidConfig {
                msg: "max_reasonable_trips must be > 0 when the strict filter is on",
            });
        }
        catalog.validate()?;
        Ok(Self { cfg, catalog })
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.cfg
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Run `iterations` search iterations from a fresh root and return the
    /// tree for result extraction.
    pub fn plan<R: Rng>(
        &self,
        total_belief: Belief,
        mass_used: f64,
        iterations: u32,
        rng: &mut R,
    ) -> Result<Tree, PlanError> {
        // Belief is validated at construction; re-check here to catch values
        // that were mutated through the public fields.
        if !(total_belief.min.is_finite() && total_belief.max.is_finite())
            || total_belief.min < 0.0
            || total_belief.min > total_belief.max
        {
            return Err(PlanError::InvalidBelief {
                min: total_belief.min,
                max: total_belief.max,
            });
        }
        if !(mass_used.is_finite() && mass_used >= 0.0) {
            return Err(PlanError::InvalidMassUsed { mass_used });
        }

        let mut tree = Tree::new(Node::root(total_belief, mass_used));
        for _ in 0..iterations {
            self.iterate(&mut tree, rng);
        }
        Ok(tree)
    }

    /// One sample -> select/expand -> rollout -> backup pass.
    fn iterate<R: Rng>(&self, tree: &mut Tree, rng: &mut R) {
        let (belief, root_used) = {
            let root = tree.node(Tree::ROOT);
            (root.total_belief, root.mass_used)
        };
        let true_mass = if belief.max > belief.min {
            rng.gen_range(belief.min..=belief.max)
        } else {
            belief.min
        };

        let mut mass_used = root_used;
        let mut remaining = true_mass - mass_used;
        let mut path: Vec<NodeId> = vec![Tree::ROOT];
        let mut node_id = Tree::ROOT;
        let mut rolled_out = false;

        // Selection + expansion.
        loop {
            if tree.node(node_id).is_terminal() {
                break;
            }

            let valid = self.valid_actions(tree.node(node_id));
            if valid.is_empty() {
                break;
            }

            // First unexplored (action, observation) pair reachable in the
            // sampled world, in catalog order.
            let mut selected: Option<(ActionId, f64, Observation, bool)> = None;
            for &(aid, entry) in &valid {
                if remaining <= entry.action.out {
                    continue;
                }
                let new_used = mass_used + entry.action.round_trip();
                let obs = observe(true_mass, new_used, &self.cfg.observe);
                if !tree.has_child(node_id, aid, obs) {
                    selected = Some((aid, new_used, obs, true));
                    break;
                }
            }

            // All pairs known here: exploit with UCB1.
            if selected.is_none() {
                let mut best: Option<(ActionId, f64)> = None;
                for &(aid, entry) in &valid {
                    if remaining <= entry.action.out {
                        continue;
                    }
                    let score = tree.ucb1(node_id, aid, self.cfg.ucb_constant);
                    if best.map_or(true, |(_, b)| score > b) {
                        best = Some((aid, score));
                    }
                }
                if let Some((aid, _)) = best {
                    let entry = self.catalog.get(aid);
                    let new_used = mass_used + entry.action.round_trip();
                    let obs = observe(true_mass, new_used, &self.cfg.observe);
                    selected = Some((aid, new_used, obs, false));
                }
            }

            // Every survivable jump would roll the pilot in this world.
            let Some((aid, new_used, obs, needs_expansion)) = selected else {
                rolled_out = true;
                break;
            };

            // Recheck before committing the jump.
            if remaining <= self.catalog.get(aid).action.out {
                rolled_out = true;
                break;
            }

            mass_used = new_used;
            remaining = true_mass - mass_used;

            let child_id = match tree.child(node_id, aid, obs) {
                Some(cid) => cid,
                None => {
                    let parent = tree.node(node_id);
                    // Sampled-world observations keep the interval nonempty
                    // except when the +1 discretization overshoots a
                    // sub-unit-wide interval; keep the parent bounds then.
                    let child_belief =
                        update_total_belief(parent.total_belief, mass_used, obs, &self.cfg.observe)
                            .unwrap_or(parent.total_belief);
                    let child = Node::child(
                        child_belief,
                        mass_used,
                        parent.depth + 1,
                        node_id,
                        aid,
                        obs,
                    );
                    tree.insert_child(node_id, aid, obs, child)
                }
            };
            path.push(child_id);
            node_id = child_id;

            if remaining <= 0.0 {
                // The sampled world collapsed inside the tree.
                break;
            }
            if needs_expansion {
                // Fresh leaf; hand off to the rollout.
                break;
            }
        }

        // Rollout: greedy heaviest round trip, no new tree nodes.
        let mut trips = tree.node(node_id).depth;
        let mut scratch_belief = tree.node(node_id).total_belief;
        while !rolled_out && remaining > 0.0 && trips < self.cfg.max_depth {
            let mut pick: Option<(ActionId, f64)> = None;
            for (aid, entry) in self.catalog.iter() {
                if remaining <= entry.action.out {
                    continue;
                }
                let rt = entry.action.round_trip();
                // Strict > keeps catalog order as the tie-break.
                if pick.map_or(true, |(_, best)| rt > best) {
                    pick = Some((aid, rt));
                }
            }
            let Some((aid, _)) = pick else {
                rolled_out = true;
                break;
            };
            mass_used += self.catalog.get(aid).action.round_trip();
            remaining = true_mass - mass_used;
            trips += 1;

            // Mirror the inference a pilot would run mid-roll. The greedy
            // policy does not consult it yet.
            let obs = observe(true_mass, mass_used, &self.cfg.observe);
            scratch_belief =
                update_total_belief(scratch_belief, mass_used, obs, &self.cfg.observe)
                    .unwrap_or(scratch_belief);
        }
        let _ = scratch_belief;

        // Backpropagation.
        let success = !rolled_out && remaining <= 0.0;
        let score = if success {
            self.cfg.trip_decay.powi(trips as i32)
        } else {
            0.0
        };
        for &nid in &path {
            tree.node_mut(nid).record_visit(success, trips, score);
        }
    }

    /// Actions applicable from a node's remaining belief: at least one
    /// possible world survives the outbound. With the strict filter on,
    /// additionally drop round trips too light to close the hole within
    /// `max_reasonable_trips`, unless pruning would drop every
    /// guaranteed-safe jump.
    pub(crate) fn valid_actions<'c>(&'c self, node: &Node) -> Vec<(ActionId, &'c CatalogEntry)> {
        let r = node.remaining_belief();
        let mut out: Vec<(ActionId, &CatalogEntry)> = self
            .catalog
            .iter()
            .filter(|(_, e)| r.max > e.action.out)
            .collect();
        if !self.cfg.strict_action_filter {
            return out;
        }
        let floor = r.max / f64::from(self.cfg.max_reasonable_trips);
        let efficient = |e: &CatalogEntry| e.action.round_trip() >= floor;
        if !out.iter().any(|&(_, e)| efficient(e) && r.min > e.action.out) {
            return out;
        }
        out.retain(|&(_, e)| efficient(e));
        out
    }
}
