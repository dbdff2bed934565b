//! Transformation chain building and ordering checks.
//!
//! Declared order follows the bundler's loader convention: the engine applies
//! a chain from the last declared stage to the first. A stylesheet chain
//! declared as `[extract, rewrite, compile]` therefore compiles first, then
//! rewrites the compiled CSS text, then hands it to extraction. The builder
//! never reorders; it only verifies.

use super::{RuleError, RuleSet, SourceKind, SourceRule, StageKind, TransformStage};

/// The chain for a matched rule, verbatim and in declared order.
pub fn build_chain(rule: &SourceRule) -> &[TransformStage] {
    rule.stages()
}

/// Stage kinds of a rule's chain, in declared order.
pub fn chain_kinds(rule: &SourceRule) -> Vec<StageKind> {
    rule.stages().iter().map(TransformStage::kind).collect()
}

/// A stylesheet chain that carries its own compile stage starts out as
/// pre-compiled-language text (e.g. SCSS).
fn is_precompiled(rule: &SourceRule) -> bool {
    rule.kind() == SourceKind::Style && rule.has_stage(StageKind::Compile)
}

fn order_error(rule: &SourceRule, message: &str) -> RuleError {
    RuleError::ChainOrder { rule: rule.name().to_string(), message: message.to_string() }
}

/// Check that a rule's declared chain is well ordered.
pub fn validate_chain(rule: &SourceRule) -> Result<(), RuleError> {
    let stages = rule.stages();
    if stages.is_empty() {
        return Err(order_error(rule, "declares no stages"));
    }

    for terminal in [StageKind::Copy, StageKind::Discard] {
        if rule.has_stage(terminal) && stages.len() > 1 {
            return Err(order_error(rule, &format!("a {} stage must be the only stage", terminal)));
        }
    }

    let extract = rule.stage_position(StageKind::Extract);
    if let Some(position) = extract {
        if position != 0 {
            return Err(order_error(rule, "extraction must be the first declared stage"));
        }
    }

    if let Some(rewrite) = rule.stage_position(StageKind::Rewrite) {
        if extract.is_some_and(|e| rewrite <= e) {
            return Err(order_error(rule, "rewrite must be declared after extraction"));
        }
        match rule.stage_position(StageKind::Compile) {
            Some(compile) if is_precompiled(rule) && rewrite > compile => {
                return Err(order_error(
                    rule,
                    "rewrite must be declared before compilation of pre-compiled stylesheet text",
                ));
            }
            Some(compile) if !is_precompiled(rule) && rewrite < compile => {
                return Err(order_error(rule, "rewrite must be declared after compilation"));
            }
            _ => {}
        }
    }

    Ok(())
}

/// Validate every rule in the set.
pub fn validate_rule_set(rules: &RuleSet) -> Result<(), RuleError> {
    rules.iter().try_for_each(validate_chain)
}
