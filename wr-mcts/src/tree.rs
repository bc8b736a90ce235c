//! Arena-backed tree with a flat (node, action, observation) child index.

use rustc_hash::FxHashMap;
use wr_core::catalog::ActionId;
use wr_core::observe::Observation;

use crate::node::{Node, NodeId};

/// Visit/win totals for one action, aggregated across its observation
/// children.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActionStats {
    pub visits: u64,
    pub wins: f64,
    pub successes: u64,
    /// Sum of trips * count over the children's terminal histograms.
    pub trip_sum: u64,
}

/// The search tree for one `plan` call. Nodes live in a vec arena; the
/// two-level action -> observation child index collapses to a flat map keyed
/// by all three parts.
pub struct Tree {
    nodes: Vec<Node>,
    children: FxHashMap<(NodeId, ActionId, Observation), NodeId>,
}

impl Tree {
    pub const ROOT: NodeId = 0;

    pub fn new(root: Node) -> Self {
        Self {
            nodes: vec![root],
            children: FxHashMap::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id as usize]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id as usize]
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (i as NodeId, n))
    }

    pub fn child(&self, parent: NodeId, action: ActionId, obs: Observation) -> Option<NodeId> {
        self.children.get(&(parent, action, obs)).copied()
    }

    pub fn has_child(&self, parent: NodeId, action: ActionId, obs: Observation) -> bool {
        self.children.contains_key(&(parent, action, obs))
    }

    /// Insert a child under an (action, observation) slot. Only the search's
    /// expansion step may call this; a slot is filled at most once.
    pub fn insert_child(
        &mut self,
        parent: NodeId,
        action: ActionId,
        obs: Observation,
        node: Node,
    ) -> NodeId {
        debug_assert!(!self.has_child(parent, action, obs));
        let id = self.nodes.len() as NodeId;
        self.nodes.push(node);
        self.children.insert((parent, action, obs), id);
        id
    }

    /// Sum stats for `action` across its observation children; zeros when
    /// nothing is expanded under it.
    pub fn action_stats(&self, parent: NodeId, action: ActionId) -> ActionStats {
        let mut stats = ActionStats::default();
        for obs in Observation::ALL {
            if let Some(cid) = self.child(parent, action, obs) {
                let c = self.node(cid);
                stats.visits += c.visits;
                stats.wins += c.wins;
                stats.successes += c.successes;
                for (&trips, &count) in &c.terminal_trips {
                    stats.trip_sum += trips as u64 * count;
                }
            }
        }
        stats
    }

    /// UCB1 for `action` at `parent`, aggregated over observation children.
    /// Unvisited actions score infinite so each gets tried at least once.
    pub fn ucb1(&self, parent: NodeId, action: ActionId, c: f64) -> f64 {
        let stats = self.action_stats(parent, action);
        if stats.visits == 0 {
            return f64::INFINITY;
        }
        let parent_visits = (self.node(parent).visits as f64).max(1.0);
        let exploitation = stats.wins / stats.visits as f64;
        let exploration = c * (parent_visits.ln() / stats.visits as f64).sqrt();
        exploitation + exploration
    }
}
