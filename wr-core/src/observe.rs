//! Visual observations and the Bayesian total-mass update.
//!
//! The game reports a wormhole's state as one of four visual buckets keyed to
//! the *remaining fraction* `remaining / total`:
//! - `collapsed` if remaining <= 0
//! - `crit`      if fraction <= crit_threshold (default 0.10)
//! - `shrink`    if fraction <= shrink_threshold (default 0.50)
//! - `fresh`     otherwise
//!
//! Because the fraction depends on the unknown total, each reported bucket
//! bounds the total through the thresholds; `update_total_belief` applies
//! that narrowing.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::belief::Belief;

/// Remaining-fraction thresholds for the visual buckets.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ObserveParams {
    /// Fraction at or below which the hole reads "shrink".
    #[serde(default = "default_shrink_threshold")]
    pub shrink_threshold: f64,
    /// Fraction at or below which the hole reads "crit".
    #[serde(default = "default_crit_threshold")]
    pub crit_threshold: f64,
}

fn default_shrink_threshold() -> f64 {
    0.50
}

fn default_crit_threshold() -> f64 {
    0.10
}

impl Default for ObserveParams {
    fn default() -> Self {
        Self {
            shrink_threshold: default_shrink_threshold(),
            crit_threshold: default_crit_threshold(),
        }
    }
}

/// Visual state of the hole as reported in-game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Observation {
    Fresh,
    Shrink,
    Crit,
    Collapsed,
}

impl Observation {
    pub const ALL: [Observation; 4] = [
        Observation::Fresh,
        Observation::Shrink,
        Observation::Crit,
        Observation::Collapsed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Observation::Fresh => "fresh",
            Observation::Shrink => "shrink",
            Observation::Crit => "crit",
            Observation::Collapsed => "collapsed",
        }
    }

    pub fn parse(s: &str) -> Option<Observation> {
        match s.to_ascii_lowercase().as_str() {
            "fresh" => Some(Observation::Fresh),
            "shrink" => Some(Observation::Shrink),
            "crit" => Some(Observation::Crit),
            "collapsed" => Some(Observation::Collapsed),
            _ => None,
        }
    }
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum ObserveError {
    #[error(
        "observation {obs} inconsistent with total-mass belief [{min}, {max}] at used={mass_used}"
    )]
    InconsistentObservation {
        obs: Observation,
        min: f64,
        max: f64,
        mass_used: f64,
    },
}

/// Map a true total mass and cumulative mass-used to the bucket the game
/// would show.
pub fn observe(true_mass: f64, mass_used: f64, params: &ObserveParams) -> Observation {
    let remaining = true_mass - mass_used;
    if remaining <= 0.0 {
        return Observation::Collapsed;
    }
    let fraction = remaining / true_mass;
    if fraction <= params.crit_threshold {
        Observation::Crit
    } else if fraction <= params.shrink_threshold {
        Observation::Shrink
    } else {
        Observation::Fresh
    }
}

/// Narrow a total-mass belief under the constraint that `obs` was reported
/// after `mass_used` had gone through the hole.
///
/// With thresholds `s` (shrink) and `c` (crit):
/// - fresh:  remaining > s*total      =>  total > used/(1-s)
/// - shrink: c*total < remaining <= s*total
///                                    =>  used/(1-c) < total <= used/(1-s)
/// - crit:   remaining <= c*total     =>  total <= used/(1-c)
/// - collapsed: no constraint on the total.
///
/// The `+1.0` on the lower bounds keeps the strict inequalities strict after
/// discretizing to whole-million bounds.
pub fn update_total_belief(
    belief: Belief,
    mass_used: f64,
    obs: Observation,
    params: &ObserveParams,
) -> Result<Belief, ObserveError> {
    let mut min = belief.min;
    let mut max = belief.max;
    match obs {
        Observation::Fresh => {
            min = min.max(mass_used / (1.0 - params.shrink_threshold) + 1.0);
        }
        Observation::Shrink => {
            min = min.max(mass_used / (1.0 - params.crit_threshold) + 1.0);
            max = max.min(mass_used / (1.0 - params.shrink_threshold));
        }
        Observation::Crit => {
            max = max.min(mass_used / (1.0 - params.crit_threshold));
        }
        Observation::Collapsed => {}
    }
    if min > max {
        return Err(ObserveError::InconsistentObservation {
            obs,
            min: belief.min,
            max: belief.max,
            mass_used,
        });
    }
    Ok(Belief { min, max })
}
