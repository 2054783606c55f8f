//! The pattern catalog: one immutable registry of line-shape matchers.
//!
//! Built once at startup and passed by reference into the classifier.
//! Each family owns an ordered subset; within a subset more specific
//! shapes come before generic fallbacks. The family-agnostic subset
//! (unified logging, safepoints, headers) runs last.

use crate::event::{CollectorFamily, Event};

use super::{ClassifyContext, Matcher, cms, g1, header, parallel, safepoint, serial, shenandoah, unified};

pub struct PatternCatalog {
    family_sets: Vec<(CollectorFamily, &'static [Matcher])>,
    agnostic: Vec<&'static [Matcher]>,
}

impl Default for PatternCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl PatternCatalog {
    pub fn new() -> Self {
        Self {
            family_sets: vec![
                (CollectorFamily::Cms, cms::MATCHERS),
                (CollectorFamily::G1, g1::MATCHERS),
                (CollectorFamily::Parallel, parallel::MATCHERS),
                (CollectorFamily::Serial, serial::MATCHERS),
                (CollectorFamily::Shenandoah, shenandoah::MATCHERS),
            ],
            agnostic: vec![unified::MATCHERS, safepoint::MATCHERS, header::MATCHERS],
        }
    }

    /// Try every subset in matching order: the current family's subset
    /// first (it disambiguates shapes that collide across families), the
    /// remaining family subsets in fixed order (family-specific shapes
    /// from other families still classify, which is how the pipeline
    /// learns the family mid-log), then the agnostic subset.
    pub fn try_match(&self, line: &str, ctx: &ClassifyContext) -> Option<Event> {
        if ctx.family != CollectorFamily::Unknown
            && let Some(set) = self.family_set(ctx.family)
            && let Some(event) = run_set(set, line, ctx)
        {
            return Some(event);
        }

        for &(family, set) in &self.family_sets {
            if family == ctx.family {
                continue;
            }
            if let Some(event) = run_set(set, line, ctx) {
                return Some(event);
            }
        }

        for set in &self.agnostic {
            if let Some(event) = run_set(set, line, ctx) {
                return Some(event);
            }
        }
        None
    }

    fn family_set(&self, family: CollectorFamily) -> Option<&'static [Matcher]> {
        self.family_sets
            .iter()
            .find(|(f, _)| *f == family)
            .map(|(_, set)| *set)
    }
}

fn run_set(set: &[Matcher], line: &str, ctx: &ClassifyContext) -> Option<Event> {
    set.iter().find_map(|matcher| matcher(line, ctx))
}
