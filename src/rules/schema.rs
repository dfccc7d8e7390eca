//! JSON Schema for rule objects.
//!
//! Rule JSON comes from users and from AI answers, so it is checked against
//! the schema first to give precise error locations, then deserialized and
//! shape-checked.

use anyhow::{anyhow, bail, Context, Result};
use serde_json::Value;

use super::Rule;

/// Schema every rule object must satisfy
pub const RULE_SCHEMA: &str = r##"{
  "$schema": "https://json-schema.org/draft/2020-12/schema",
  "type": "object",
  "required": ["type"],
  "oneOf": [
    {
      "properties": {
        "type": {"const": "coRun"},
        "tasks": {"type": "array", "items": {"type": "string", "minLength": 1}, "minItems": 2}
      },
      "required": ["tasks"]
    },
    {
      "properties": {
        "type": {"const": "slotRestriction"},
        "groupKind": {"enum": ["client", "worker"]},
        "group": {"type": "string", "minLength": 1},
        "minCommonSlots": {"type": "integer", "minimum": 1}
      },
      "required": ["groupKind", "group", "minCommonSlots"]
    },
    {
      "properties": {
        "type": {"const": "loadLimit"},
        "workerGroup": {"type": "string", "minLength": 1},
        "maxSlotsPerPhase": {"type": "integer", "minimum": 0}
      },
      "required": ["workerGroup", "maxSlotsPerPhase"]
    },
    {
      "properties": {
        "type": {"const": "phaseWindow"},
        "task": {"type": "string", "minLength": 1},
        "allowedPhases": {"type": "array", "items": {"type": "integer", "minimum": 1}, "minItems": 1}
      },
      "required": ["task", "allowedPhases"]
    },
    {
      "properties": {
        "type": {"const": "patternMatch"},
        "regex": {"type": "string", "minLength": 1},
        "template": {"type": "string"},
        "params": {"type": "object"}
      },
      "required": ["regex", "template"]
    },
    {
      "properties": {
        "type": {"const": "precedenceOverride"},
        "scope": {"enum": ["global", "specific"]},
        "target": {"type": "string"},
        "priority": {"type": "integer", "minimum": 0}
      },
      "required": ["scope", "priority"]
    }
  ]
}"##;

/// Compile the rule schema
pub fn rule_validator() -> Result<jsonschema::Validator> {
    let schema: Value =
        serde_json::from_str(RULE_SCHEMA).context("Failed to parse built-in rule schema")?;
    jsonschema::validator_for(&schema)
        .map_err(|e| anyhow!("Failed to compile rule schema: {}", e))
}

/// Schema errors for a candidate rule, formatted with their JSON path
pub fn schema_errors(value: &Value) -> Result<Vec<String>> {
    let validator = rule_validator()?;
    Ok(validator
        .iter_errors(value)
        .map(|e| {
            let path = e.instance_path.to_string();
            if path.is_empty() {
                e.to_string()
            } else {
                format!("at '{}': {}", path, e)
            }
        })
        .collect())
}

/// Turn a JSON value into a checked [`Rule`].
pub fn parse_rule(value: &Value) -> Result<Rule> {
    let errors = schema_errors(value)?;
    if !errors.is_empty() {
        bail!("Rule does not match the rule schema:\n  {}", errors.join("\n  "));
    }

    let rule: Rule = serde_json::from_value(value.clone()).context("Failed to read rule")?;
    rule.check_shape()?;
    Ok(rule)
}

/// Parse rule JSON text
pub fn parse_rule_str(text: &str) -> Result<Rule> {
    let value: Value = serde_json::from_str(text).context("Rule is not valid JSON")?;
    parse_rule(&value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_schema_compiles() {
        assert!(rule_validator().is_ok());
    }

    #[test]
    fn test_parse_valid_rules() {
        let rule = parse_rule(&json!({"type": "loadLimit", "workerGroup": "GroupA", "maxSlotsPerPhase": 2}))
            .unwrap();
        assert_eq!(rule.type_name(), "loadLimit");

        let rule = parse_rule_str(r#"{"type": "patternMatch", "regex": "^T1", "template": "phaseWindow"}"#)
            .unwrap();
        assert_eq!(rule.type_name(), "patternMatch");
    }

    #[test]
    fn test_parse_rejects_schema_violations() {
        let err = parse_rule(&json!({"type": "coRun", "tasks": ["T1"]})).unwrap_err();
        assert!(err.to_string().contains("rule schema"));

        let err = parse_rule(&json!({"type": "teleport"})).unwrap_err();
        assert!(err.to_string().contains("rule schema"));

        let err = parse_rule(&json!({"type": "phaseWindow", "task": "T1", "allowedPhases": [0]}))
            .unwrap_err();
        assert!(err.to_string().contains("rule schema"));
    }

    #[test]
    fn test_parse_runs_shape_checks() {
        let err = parse_rule(&json!({"type": "patternMatch", "regex": "(", "template": "x"}))
            .unwrap_err();
        assert!(err.to_string().contains("does not compile"));
    }

    #[test]
    fn test_parse_rule_str_rejects_bad_json() {
        assert!(parse_rule_str("{not json").is_err());
    }
}
