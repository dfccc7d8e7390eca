//! Prioritization weights.
//!
//! Weights are exported alongside the rules for a downstream allocator.
//! They are edited here (individually, from a preset, or from a ranking)
//! but never interpreted.

use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::schema::header_key;

/// Allocation criteria a weight can be assigned to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Criterion {
    PriorityLevel,
    RequestedTaskFulfillment,
    Fairness,
    WorkloadBalance,
    PhasePreference,
}

impl Criterion {
    pub const ALL: [Criterion; 5] = [
        Criterion::PriorityLevel,
        Criterion::RequestedTaskFulfillment,
        Criterion::Fairness,
        Criterion::WorkloadBalance,
        Criterion::PhasePreference,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Criterion::PriorityLevel => "priorityLevel",
            Criterion::RequestedTaskFulfillment => "requestedTaskFulfillment",
            Criterion::Fairness => "fairness",
            Criterion::WorkloadBalance => "workloadBalance",
            Criterion::PhasePreference => "phasePreference",
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Criterion {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let key = header_key(s);
        Criterion::ALL
            .into_iter()
            .find(|c| header_key(c.as_str()) == key)
            .or(match key.as_str() {
                "priority" => Some(Criterion::PriorityLevel),
                "fulfillment" | "fulfilment" => Some(Criterion::RequestedTaskFulfillment),
                "workload" => Some(Criterion::WorkloadBalance),
                "phase" | "phases" => Some(Criterion::PhasePreference),
                _ => None,
            })
            .ok_or_else(|| {
                let names: Vec<&str> = Criterion::ALL.iter().map(|c| c.as_str()).collect();
                anyhow!("Unknown criterion '{}'. Expected one of: {}", s, names.join(", "))
            })
    }
}

/// Named weight profiles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    Balanced,
    MaximizeFulfillment,
    FairDistribution,
    MinimizeWorkload,
}

impl Preset {
    pub const ALL: [Preset; 4] = [
        Preset::Balanced,
        Preset::MaximizeFulfillment,
        Preset::FairDistribution,
        Preset::MinimizeWorkload,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Preset::Balanced => "balanced",
            Preset::MaximizeFulfillment => "maximize-fulfillment",
            Preset::FairDistribution => "fair-distribution",
            Preset::MinimizeWorkload => "minimize-workload",
        }
    }

    pub fn weights(&self) -> PriorityWeights {
        let [priority_level, requested_task_fulfillment, fairness, workload_balance, phase_preference] =
            match self {
                Preset::Balanced => [0.2, 0.2, 0.2, 0.2, 0.2],
                Preset::MaximizeFulfillment => [0.3, 0.4, 0.1, 0.1, 0.1],
                Preset::FairDistribution => [0.1, 0.15, 0.4, 0.25, 0.1],
                Preset::MinimizeWorkload => [0.1, 0.15, 0.15, 0.45, 0.15],
            };
        PriorityWeights {
            priority_level,
            requested_task_fulfillment,
            fairness,
            workload_balance,
            phase_preference,
        }
    }
}

impl FromStr for Preset {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let key = header_key(s);
        Preset::ALL
            .into_iter()
            .find(|p| header_key(p.as_str()) == key)
            .ok_or_else(|| {
                let names: Vec<&str> = Preset::ALL.iter().map(|p| p.as_str()).collect();
                anyhow!("Unknown preset '{}'. Expected one of: {}", s, names.join(", "))
            })
    }
}

/// One weight in [0, 1] per criterion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorityWeights {
    pub priority_level: f64,
    pub requested_task_fulfillment: f64,
    pub fairness: f64,
    pub workload_balance: f64,
    pub phase_preference: f64,
}

impl Default for PriorityWeights {
    fn default() -> Self {
        Preset::Balanced.weights()
    }
}

impl PriorityWeights {
    pub fn get(&self, criterion: Criterion) -> f64 {
        match criterion {
            Criterion::PriorityLevel => self.priority_level,
            Criterion::RequestedTaskFulfillment => self.requested_task_fulfillment,
            Criterion::Fairness => self.fairness,
            Criterion::WorkloadBalance => self.workload_balance,
            Criterion::PhasePreference => self.phase_preference,
        }
    }

    fn slot(&mut self, criterion: Criterion) -> &mut f64 {
        match criterion {
            Criterion::PriorityLevel => &mut self.priority_level,
            Criterion::RequestedTaskFulfillment => &mut self.requested_task_fulfillment,
            Criterion::Fairness => &mut self.fairness,
            Criterion::WorkloadBalance => &mut self.workload_balance,
            Criterion::PhasePreference => &mut self.phase_preference,
        }
    }

    /// Set one weight; must be a finite number in [0, 1]
    pub fn set(&mut self, criterion: Criterion, weight: f64) -> Result<()> {
        if !weight.is_finite() || !(0.0..=1.0).contains(&weight) {
            bail!("Weight for {} must be between 0 and 1, got {}", criterion, weight);
        }
        *self.slot(criterion) = weight;
        Ok(())
    }

    /// Rank-sum weights: the first of `n` ranked criteria gets `n`, the last
    /// gets 1, unranked ones get 0, then everything is normalized.
    pub fn from_ranking(ranking: &[Criterion]) -> Result<Self> {
        if ranking.is_empty() {
            bail!("Ranking must name at least one criterion");
        }
        let mut weights = PriorityWeights {
            priority_level: 0.0,
            requested_task_fulfillment: 0.0,
            fairness: 0.0,
            workload_balance: 0.0,
            phase_preference: 0.0,
        };
        let n = ranking.len();
        for (position, criterion) in ranking.iter().enumerate() {
            if ranking[..position].contains(criterion) {
                bail!("Criterion {} is ranked more than once", criterion);
            }
            *weights.slot(*criterion) = (n - position) as f64;
        }
        Ok(weights.normalized())
    }

    pub fn total(&self) -> f64 {
        Criterion::ALL.iter().map(|c| self.get(*c)).sum()
    }

    /// Scale weights to sum to 1. All-zero weights stay all-zero.
    pub fn normalized(&self) -> Self {
        let total = self.total();
        if total <= 0.0 {
            return self.clone();
        }
        let mut out = self.clone();
        for criterion in Criterion::ALL {
            *out.slot(criterion) = self.get(criterion) / total;
        }
        out
    }

    /// Criteria ordered by descending weight, ties in declaration order
    pub fn ranked(&self) -> Vec<(Criterion, f64)> {
        let mut ranked: Vec<(Criterion, f64)> =
            Criterion::ALL.iter().map(|c| (*c, self.get(*c))).collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }
}
