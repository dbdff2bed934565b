//! The standard rule table.
//!
//! Rules are declared most-specific-first:
//!
//! | rule               | claims                                   | chain                      |
//! |--------------------|------------------------------------------|----------------------------|
//! | `scripts`          | `.js`/`.jsx` outside `node_modules`      | compile                    |
//! | `vendor-styles`    | the vendor stylesheet, by file name      | extract, rewrite, compile  |
//! | `discarded-styles` | plain `.css` under a discarded component | discard                    |
//! | `styles`           | every other `.css`/`.scss`               | extract, compile           |
//! | `static-assets`    | the listed copy files                    | copy                       |
//!
//! The generic `styles` rule also lists the vendor and discarded patterns as
//! exclusions, so no stylesheet is claimed by two rules even if the table is
//! reordered.
//!
//! With `styles.vendor.content` set, the vendor rule also requires the file
//! content to match, and discovery reads source content to evaluate it.

use regex::escape;

use super::{
    validate_rule_set, Replacement, RuleError, RuleSet, SourceKind, SourceMatcher, SourceRule,
    TransformStage,
};
use crate::config::PipelineSettings;

pub const SCRIPT_RULE: &str = "scripts";
pub const VENDOR_STYLE_RULE: &str = "vendor-styles";
pub const DISCARDED_STYLE_RULE: &str = "discarded-styles";
pub const STYLE_RULE: &str = "styles";
pub const STATIC_ASSET_RULE: &str = "static-assets";

/// Matcher for a stylesheet identified by exact file name, in any directory.
fn file_name_matcher(file: &str) -> Result<SourceMatcher, RuleError> {
    SourceMatcher::pattern(&format!("(^|/){}$", escape(file)))
}

/// Vendor matcher: the file name, and the content marker when one is set.
fn vendor_matcher(file: &str, content: Option<&str>) -> Result<SourceMatcher, RuleError> {
    let name = file_name_matcher(file)?;
    match content {
        Some(pattern) => Ok(SourceMatcher::AllOf(vec![name, SourceMatcher::content(pattern)?])),
        None => Ok(name),
    }
}

fn script_rule(settings: &PipelineSettings) -> Result<SourceRule, RuleError> {
    let scripts = &settings.scripts;
    let mut rule = SourceRule::new(SCRIPT_RULE, SourceKind::Script, SourceMatcher::pattern(&scripts.test)?)
        .stage(TransformStage::compile(scripts.loader.as_str()));
    for fragment in &scripts.exclude {
        rule = rule.exclude(SourceMatcher::path_contains(fragment.as_str()));
    }
    Ok(rule)
}

fn vendor_style_rule(settings: &PipelineSettings, matcher: SourceMatcher) -> SourceRule {
    let replacements: Vec<Replacement> = settings
        .styles
        .vendor
        .rewrite
        .iter()
        .map(|r| Replacement::new(r.search.as_str(), r.replace.as_str()))
        .collect();

    let rule = SourceRule::new(VENDOR_STYLE_RULE, SourceKind::Style, matcher)
        .stage(TransformStage::extract());
    let rule = if replacements.is_empty() {
        rule
    } else {
        rule.stage(TransformStage::rewrite(&replacements))
    };
    rule.stage(TransformStage::compile(settings.styles.compiler.as_str()))
}

fn discard_matcher(fragments: &[String]) -> Result<SourceMatcher, RuleError> {
    Ok(SourceMatcher::AllOf(vec![
        SourceMatcher::pattern(r"\.css$")?,
        SourceMatcher::AnyOf(
            fragments.iter().map(|f| SourceMatcher::path_contains(f.as_str())).collect(),
        ),
    ]))
}

/// Build and validate the standard rule table from settings.
pub fn standard_rules(settings: &PipelineSettings) -> Result<RuleSet, RuleError> {
    let styles = &settings.styles;
    let mut rules = vec![script_rule(settings)?];

    let vendor = if styles.vendor.enabled {
        let matcher = vendor_matcher(&styles.vendor.file, styles.vendor.content.as_deref())?;
        rules.push(vendor_style_rule(settings, matcher.clone()));
        Some(matcher)
    } else {
        None
    };

    let discard = if styles.discard.is_empty() {
        None
    } else {
        let matcher = discard_matcher(&styles.discard)?;
        rules.push(
            SourceRule::new(DISCARDED_STYLE_RULE, SourceKind::Style, matcher.clone())
                .stage(TransformStage::discard()),
        );
        Some(matcher)
    };

    let mut generic = SourceRule::new(STYLE_RULE, SourceKind::Style, SourceMatcher::pattern(&styles.test)?)
        .stage(TransformStage::extract())
        .stage(TransformStage::compile(styles.compiler.as_str()));
    for exclusion in vendor.into_iter().chain(discard) {
        generic = generic.exclude(exclusion);
    }
    rules.push(generic);

    if !settings.copy.files.is_empty() {
        let files = settings.copy.files.iter().map(|f| SourceMatcher::exact(f.as_str())).collect();
        rules.push(
            SourceRule::new(STATIC_ASSET_RULE, SourceKind::Asset, SourceMatcher::AnyOf(files))
                .stage(TransformStage::copy()),
        );
    }

    let rules = RuleSet::new(rules)?;
    validate_rule_set(&rules)?;
    tracing::debug!(rules = rules.len(), "declared standard rule table");
    Ok(rules)
}
