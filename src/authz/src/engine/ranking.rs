//! Specificity ranking of matching rules
//!
//! Candidates are ordered by four descending keys, each only breaking ties
//! in the one before it:
//!
//! 1. resource pattern specificity
//! 2. subject pattern specificity
//! 3. action pattern specificity
//! 4. timestamp (most recent first)
//!
//! Rules that tie on all four resolve to the later log position.

use crate::policy::AclRule;
use std::cmp::Ordering;

/// Ordering where the higher-ranked rule sorts first
pub fn compare(a: &AclRule, b: &AclRule) -> Ordering {
    let desc = |x: f64, y: f64| y.total_cmp(&x);

    desc(a.resource_pattern.specificity(), b.resource_pattern.specificity())
        .then_with(|| desc(a.subject_pattern.specificity(), b.subject_pattern.specificity()))
        .then_with(|| desc(a.action_pattern.specificity(), b.action_pattern.specificity()))
        .then_with(|| b.timestamp.cmp(&a.timestamp))
        .then_with(|| b.sequence.cmp(&a.sequence))
}

/// Sort candidates best-first
pub fn rank(candidates: &mut [&AclRule]) {
    candidates.sort_by(|a, b| compare(a, b));
}

/// The deciding rule among candidates, if any
pub fn select<'a>(candidates: impl IntoIterator<Item = &'a AclRule>) -> Option<&'a AclRule> {
    candidates.into_iter().min_by(|a, b| compare(a, b))
}
