use std::collections::HashSet;

use crate::scrape::snapshot::VisualCandidate;

/// Collapse duplicate source URLs, keeping the first-discovered metadata,
/// then order by rendered area (largest first). Ties keep their original
/// discovery order. Returns the capped list and the pre-cap count.
pub fn dedup_and_rank(
    candidates: Vec<VisualCandidate>,
    cap: usize,
) -> (Vec<VisualCandidate>, usize) {
    let mut seen = HashSet::new();
    let mut unique: Vec<VisualCandidate> = candidates
        .into_iter()
        .filter(|c| seen.insert(c.source_url.clone()))
        .collect();

    // sort_by_key is stable, so equal areas preserve discovery order
    unique.sort_by_key(|c| std::cmp::Reverse(c.area()));

    let total = unique.len();
    unique.truncate(cap);
    (unique, total)
}

/// Size constraints applied by the image-extraction endpoint.
#[derive(Debug, Clone, Copy)]
pub struct SizeFilter {
    pub min_width: u32,
    pub min_height: u32,
    /// When false, candidates must additionally be at least 100x100
    pub include_small: bool,
}

impl SizeFilter {
    pub fn matches(&self, candidate: &VisualCandidate) -> bool {
        if candidate.width < self.min_width || candidate.height < self.min_height {
            return false;
        }
        if !self.include_small && (candidate.width < 100 || candidate.height < 100) {
            return false;
        }
        true
    }
}

/// Apply a size filter, then truncate to `limit`.
pub fn filter_by_size(
    candidates: &[VisualCandidate],
    filter: SizeFilter,
    limit: usize,
) -> Vec<VisualCandidate> {
    candidates
        .iter()
        .filter(|c| filter.matches(c))
        .take(limit)
        .cloned()
        .collect()
}
