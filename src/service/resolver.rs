//! Candidate-list construction for the model fallback loop.
//!
//! Everything here is pure: identifiers in, ordered identifiers out.
//! Suffix handling is exact string matching and case-sensitive.

use std::collections::HashSet;

use crate::types::{ApiVersion, GeminiModelList};

pub const MODELS_PREFIX: &str = "models/";
pub const LATEST_SUFFIX: &str = "-latest";
pub const PINNED_SUFFIX: &str = "-001";

pub fn strip_models_prefix(id: &str) -> &str {
    id.strip_prefix(MODELS_PREFIX).unwrap_or(id)
}

pub fn strip_latest(id: &str) -> &str {
    id.strip_suffix(LATEST_SUFFIX).unwrap_or(id)
}

pub fn strip_pinned(id: &str) -> &str {
    id.strip_suffix(PINNED_SUFFIX).unwrap_or(id)
}

/// Name actually sent for `version`; `v1beta` rejects alias and pinned suffixes.
pub fn model_for_version(candidate: &str, version: ApiVersion) -> &str {
    match version {
        ApiVersion::V1 => candidate,
        ApiVersion::V1beta => strip_pinned(strip_latest(candidate)),
    }
}

/// Listed models worth promoting ahead of the fallback tail.
pub fn is_relevant_listing(id: &str) -> bool {
    id.contains("gemini") && (id.contains("flash") || id.contains("pro"))
}

/// Whether `candidate` and a listed `available` id name the same model.
pub fn matches_available(candidate: &str, available: &str) -> bool {
    available == candidate
        || strip_latest(available) == candidate
        || strip_pinned(available) == candidate
        || strip_latest(candidate) == available
        || strip_pinned(candidate) == available
}

/// Generate-capable models reported by the listing endpoints, `models/` stripped.
///
/// Empty whenever listing was skipped or failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AvailableModels {
    ids: Vec<String>,
}

impl AvailableModels {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge listings in the given order, keeping first occurrences.
    pub fn from_listings<'a>(listings: impl IntoIterator<Item = &'a GeminiModelList>) -> Self {
        let ids = listings
            .into_iter()
            .flat_map(GeminiModelList::generate_capable)
            .map(strip_models_prefix);
        Self {
            ids: dedup_ordered(ids),
        }
    }

    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            ids: dedup_ordered(ids.into_iter().map(|s| strip_models_prefix(s.as_ref()).to_string())),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    pub fn matches(&self, candidate: &str) -> bool {
        self.iter().any(|av| matches_available(candidate, av))
    }

    pub fn sample(&self, limit: usize) -> Vec<String> {
        self.ids.iter().take(limit).cloned().collect()
    }
}

/// How the available set shaped the final list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Narrowing {
    /// No available set; full list used as built.
    Unfiltered,
    /// Full list reduced to entries the listing confirmed.
    Narrowed,
    /// Listing returned models but none matched; full list kept.
    NoMatch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidatePlan {
    pub candidates: Vec<String>,
    pub narrowing: Narrowing,
}

/// Ordered union of the requested model, its alias-free form, relevant listed
/// models and the fallback tail, de-duplicated by first occurrence.
pub fn build_candidates(
    requested: &str,
    available: &AvailableModels,
    fallback: &[String],
) -> Vec<String> {
    let requested = strip_models_prefix(requested.trim());
    let without_latest = strip_latest(requested);

    let ordered = [requested, without_latest]
        .into_iter()
        .chain(available.iter().filter(|id| is_relevant_listing(id)))
        .chain(fallback.iter().map(String::as_str))
        .filter(|id| !id.is_empty())
        .map(str::to_string);
    dedup_ordered(ordered)
}

/// Restrict `full` to models the listing knows about, keeping `full` when
/// there is nothing to narrow against or nothing survives.
pub fn narrow(full: Vec<String>, available: &AvailableModels) -> CandidatePlan {
    if available.is_empty() {
        return CandidatePlan {
            candidates: full,
            narrowing: Narrowing::Unfiltered,
        };
    }
    let narrowed: Vec<String> = full
        .iter()
        .filter(|c| available.matches(c))
        .cloned()
        .collect();
    if narrowed.is_empty() {
        CandidatePlan {
            candidates: full,
            narrowing: Narrowing::NoMatch,
        }
    } else {
        CandidatePlan {
            candidates: narrowed,
            narrowing: Narrowing::Narrowed,
        }
    }
}

pub fn plan_candidates(
    requested: &str,
    available: &AvailableModels,
    fallback: &[String],
) -> CandidatePlan {
    narrow(build_candidates(requested, available, fallback), available)
}

fn dedup_ordered<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .map(Into::into)
        .filter(|id| seen.insert(id.clone()))
        .collect()
}
