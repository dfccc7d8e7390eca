//! Allocation rules.
//!
//! Rules are configuration: they are authored, validated against the
//! dataset and exported to `rules.json`. Nothing in this crate schedules
//! work with them.

pub mod author;
pub mod schema;
pub mod suggest;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::priorities::PriorityWeights;

/// Which group column a slot restriction applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupKind {
    Client,
    Worker,
}

/// Scope of a precedence override
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverrideScope {
    Global,
    Specific,
}

/// A single allocation rule, tagged by `type` in JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Rule {
    /// Tasks that must run together
    CoRun { tasks: Vec<String> },
    /// A client or worker group must share at least `min_common_slots` phases
    #[serde(rename_all = "camelCase")]
    SlotRestriction {
        group_kind: GroupKind,
        group: String,
        min_common_slots: u32,
    },
    /// Cap on slots per phase for every worker in a group
    #[serde(rename_all = "camelCase")]
    LoadLimit {
        worker_group: String,
        max_slots_per_phase: u32,
    },
    /// Phases a task may run in
    #[serde(rename_all = "camelCase")]
    PhaseWindow {
        task: String,
        allowed_phases: Vec<u32>,
    },
    /// Rule template applied to rows whose ID matches `regex`
    PatternMatch {
        regex: String,
        template: String,
        #[serde(default)]
        params: serde_json::Map<String, serde_json::Value>,
    },
    /// Explicit priority between rules, globally or for one target
    PrecedenceOverride {
        scope: OverrideScope,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<String>,
        priority: u32,
    },
}

impl Rule {
    /// The JSON `type` tag of this rule
    pub fn type_name(&self) -> &'static str {
        match self {
            Rule::CoRun { .. } => "coRun",
            Rule::SlotRestriction { .. } => "slotRestriction",
            Rule::LoadLimit { .. } => "loadLimit",
            Rule::PhaseWindow { .. } => "phaseWindow",
            Rule::PatternMatch { .. } => "patternMatch",
            Rule::PrecedenceOverride { .. } => "precedenceOverride",
        }
    }

    /// Structural checks that do not need the dataset.
    pub fn check_shape(&self) -> Result<()> {
        match self {
            Rule::CoRun { tasks } => {
                let mut distinct: Vec<&str> = tasks.iter().map(|t| t.trim()).collect();
                distinct.sort_unstable();
                distinct.dedup();
                if distinct.len() < 2 || distinct.iter().any(|t| t.is_empty()) {
                    bail!("coRun needs at least two distinct, non-empty task IDs");
                }
            }
            Rule::SlotRestriction {
                group,
                min_common_slots,
                ..
            } => {
                if group.trim().is_empty() {
                    bail!("slotRestriction needs a group");
                }
                if *min_common_slots == 0 {
                    bail!("slotRestriction.minCommonSlots must be at least 1");
                }
            }
            Rule::LoadLimit { worker_group, .. } => {
                if worker_group.trim().is_empty() {
                    bail!("loadLimit needs a workerGroup");
                }
            }
            Rule::PhaseWindow {
                task,
                allowed_phases,
            } => {
                if task.trim().is_empty() {
                    bail!("phaseWindow needs a task");
                }
                if allowed_phases.is_empty() || allowed_phases.contains(&0) {
                    bail!("phaseWindow.allowedPhases must list phases numbered from 1");
                }
            }
            Rule::PatternMatch { regex, .. } => {
                regex::Regex::new(regex)
                    .map_err(|e| anyhow::anyhow!("patternMatch.regex does not compile: {}", e))?;
            }
            Rule::PrecedenceOverride { scope, target, .. } => {
                if *scope == OverrideScope::Specific
                    && target.as_deref().map_or(true, |t| t.trim().is_empty())
                {
                    bail!("precedenceOverride with scope 'specific' needs a target");
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::CoRun { tasks } => write!(f, "coRun: {} run together", tasks.join(", ")),
            Rule::SlotRestriction {
                group_kind,
                group,
                min_common_slots,
            } => write!(
                f,
                "slotRestriction: {} group '{}' shares at least {} slot(s)",
                match group_kind {
                    GroupKind::Client => "client",
                    GroupKind::Worker => "worker",
                },
                group,
                min_common_slots
            ),
            Rule::LoadLimit {
                worker_group,
                max_slots_per_phase,
            } => write!(
                f,
                "loadLimit: worker group '{}' takes at most {} slot(s) per phase",
                worker_group, max_slots_per_phase
            ),
            Rule::PhaseWindow {
                task,
                allowed_phases,
            } => {
                let phases: Vec<String> = allowed_phases.iter().map(|p| p.to_string()).collect();
                write!(f, "phaseWindow: {} only in phases {}", task, phases.join(","))
            }
            Rule::PatternMatch {
                regex, template, ..
            } => write!(f, "patternMatch: /{}/ applies '{}'", regex, template),
            Rule::PrecedenceOverride {
                scope,
                target,
                priority,
            } => match (scope, target) {
                (OverrideScope::Specific, Some(target)) => {
                    write!(f, "precedenceOverride: {} gets priority {}", target, priority)
                }
                _ => write!(f, "precedenceOverride: global priority {}", priority),
            },
        }
    }
}

/// Ordered list of rules
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    pub rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Append a rule after shape checks; returns its index
    pub fn add(&mut self, rule: Rule) -> Result<usize> {
        rule.check_shape()?;
        if self.rules.contains(&rule) {
            bail!("An identical rule already exists");
        }
        self.rules.push(rule);
        Ok(self.rules.len() - 1)
    }

    /// Remove the rule at a zero-based index
    pub fn remove(&mut self, index: usize) -> Result<Rule> {
        if index >= self.rules.len() {
            bail!(
                "No rule at index {} ({} rule(s) defined)",
                index,
                self.rules.len()
            );
        }
        Ok(self.rules.remove(index))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }
}

/// Contents of `rules.json`: rules plus priority weights
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RulesDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub priorities: PriorityWeights,
}

impl RulesDocument {
    pub fn rule_set(&self) -> RuleSet {
        RuleSet::new(self.rules.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rule_json_shape() {
        let rule = Rule::SlotRestriction {
            group_kind: GroupKind::Worker,
            group: "GroupA".to_string(),
            min_common_slots: 2,
        };
        let value = serde_json::to_value(&rule).unwrap();
        assert_eq!(
            value,
            json!({"type": "slotRestriction", "groupKind": "worker", "group": "GroupA", "minCommonSlots": 2})
        );
    }

    #[test]
    fn test_rule_from_json() {
        let rule: Rule =
            serde_json::from_value(json!({"type": "coRun", "tasks": ["T1", "T2"]})).unwrap();
        assert_eq!(
            rule,
            Rule::CoRun {
                tasks: vec!["T1".to_string(), "T2".to_string()]
            }
        );

        let rule: Rule = serde_json::from_value(
            json!({"type": "precedenceOverride", "scope": "global", "priority": 3}),
        )
        .unwrap();
        assert_eq!(rule.type_name(), "precedenceOverride");
    }

    #[test]
    fn test_check_shape() {
        let same_task = Rule::CoRun {
            tasks: vec!["T1".to_string(), "T1".to_string()],
        };
        assert!(same_task.check_shape().is_err());

        let bad_regex = Rule::PatternMatch {
            regex: "(".to_string(),
            template: "x".to_string(),
            params: Default::default(),
        };
        assert!(bad_regex.check_shape().is_err());

        let no_target = Rule::PrecedenceOverride {
            scope: OverrideScope::Specific,
            target: None,
            priority: 1,
        };
        assert!(no_target.check_shape().is_err());

        let zero_phase = Rule::PhaseWindow {
            task: "T1".to_string(),
            allowed_phases: vec![0, 1],
        };
        assert!(zero_phase.check_shape().is_err());
    }

    #[test]
    fn test_rule_set_add_and_remove() {
        let mut set = RuleSet::default();
        let rule = Rule::LoadLimit {
            worker_group: "GroupA".to_string(),
            max_slots_per_phase: 2,
        };
        assert_eq!(set.add(rule.clone()).unwrap(), 0);
        assert!(set.add(rule.clone()).is_err());
        assert!(set.remove(3).is_err());
        assert_eq!(set.remove(0).unwrap(), rule);
        assert!(set.is_empty());
    }

    #[test]
    fn test_display() {
        let rule = Rule::PhaseWindow {
            task: "T3".to_string(),
            allowed_phases: vec![1, 2],
        };
        assert_eq!(rule.to_string(), "phaseWindow: T3 only in phases 1,2");
    }
}
