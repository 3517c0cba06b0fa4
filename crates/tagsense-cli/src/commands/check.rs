//! Check command implementation.

use crate::cli::{CheckArgs, PolicyArg};
use crate::error::Result;
use crate::output::Formatter;
use serde::Serialize;
use tagsense_domain::{MatchPolicy, TagRegistry};
use tagsense_tags::TagRequirements;

/// Result of evaluating a requirement against a tag set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckOutcome {
    /// Tags the subject has
    pub tags: String,
    /// Required tags
    pub require: String,
    /// Ignored tags
    pub ignore: String,
    /// Query policy
    pub policy: PolicyArg,
    /// Whether the requirement matched
    pub matched: bool,
}

/// Evaluate a requirement without printing anything.
pub fn evaluate(args: &CheckArgs) -> Result<CheckOutcome> {
    let mut registry = TagRegistry::new();
    let tags = registry.request_all(non_empty(&args.tags))?;
    let required = registry.request_all(non_empty(&args.require))?;
    let ignored = registry.request_all(non_empty(&args.ignore))?;

    let requirements =
        TagRequirements::new(required, ignored).with_policy(MatchPolicy::from(args.policy));
    let matched = requirements.matches(&tags);
    tracing::debug!(tags = %tags, matched, "Evaluated requirement");

    Ok(CheckOutcome {
        tags: tags.to_string(),
        require: requirements.required().to_string(),
        ignore: requirements.ignored().to_string(),
        policy: args.policy,
        matched,
    })
}

/// Execute the check command, returning whether the requirement matched.
pub fn execute_check(args: CheckArgs, formatter: &Formatter) -> Result<bool> {
    let outcome = evaluate(&args)?;
    println!("{}", formatter.format_check(&outcome)?);
    Ok(outcome.matched)
}

/// `--tags ""` yields one empty entry; treat it as no tags at all
fn non_empty(names: &[String]) -> impl Iterator<Item = &str> {
    names.iter().map(|n| n.trim()).filter(|n| !n.is_empty())
}
