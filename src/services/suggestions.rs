//! Subrental suggestions for actionable conflicts

use std::cmp::Ordering;

use crate::{
    config::InventoryConfig,
    models::{
        inventory::ProviderSuggestion, ConflictAnalysis, DateRange, Provider, SubrentalSuggestion,
    },
};

/// Which conflicts are worth surfacing, and how many providers to propose
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriagePolicy {
    pub min_actionable_deficit: i64,
    pub min_actionable_bookings: usize,
    pub max_providers: usize,
}

impl Default for TriagePolicy {
    fn default() -> Self {
        Self {
            min_actionable_deficit: 2,
            min_actionable_bookings: 2,
            max_providers: 3,
        }
    }
}

impl From<&InventoryConfig> for TriagePolicy {
    fn from(config: &InventoryConfig) -> Self {
        Self {
            min_actionable_deficit: config.min_actionable_deficit,
            min_actionable_bookings: config.min_actionable_bookings,
            max_providers: config.max_suggested_providers,
        }
    }
}

impl TriagePolicy {
    /// Overbooked, and either contested by several events or short by several units
    pub fn is_actionable(&self, conflict: &ConflictAnalysis) -> bool {
        conflict.deficit > 0
            && (conflict.affected_bookings.len() >= self.min_actionable_bookings
                || conflict.deficit >= self.min_actionable_deficit)
    }
}

/// Providers serving `location`, preferred first, then by reliability.
/// The sort is stable: ties keep directory order. Without a location every
/// provider is eligible.
pub fn rank_providers<'a>(providers: &'a [Provider], location: Option<&str>, limit: usize) -> Vec<&'a Provider> {
    let mut matching: Vec<&Provider> = providers
        .iter()
        .filter(|p| location.map_or(true, |loc| p.covers_location(loc)))
        .collect();

    matching.sort_by(|a, b| {
        b.preferred
            .cmp(&a.preferred)
            .then_with(|| b.rating().partial_cmp(&a.rating()).unwrap_or(Ordering::Equal))
    });
    matching.truncate(limit);
    matching
}

/// Build suggestions for the actionable conflicts dated inside `window`
pub fn suggest(
    conflicts: &[ConflictAnalysis],
    providers: &[Provider],
    window: &DateRange,
    policy: &TriagePolicy,
) -> Vec<SubrentalSuggestion> {
    conflicts
        .iter()
        .filter(|c| window.contains(c.date) && policy.is_actionable(c))
        .map(|conflict| {
            let location = conflict
                .affected_bookings
                .first()
                .and_then(|b| b.location.clone())
                .filter(|l| !l.trim().is_empty());

            let ranked: Vec<ProviderSuggestion> =
                rank_providers(providers, location.as_deref(), policy.max_providers)
                    .into_iter()
                    .map(|p| ProviderSuggestion {
                        provider_id: p.id,
                        company_name: p.company_name.clone(),
                        preferred: p.preferred,
                        reliability_rating: p.reliability_rating,
                        geographic_coverage: p.geographic_coverage.clone(),
                    })
                    .collect();

            if ranked.is_empty() {
                tracing::debug!(
                    equipment_id = %conflict.equipment_id,
                    date = %conflict.date,
                    location = ?location,
                    "No provider serves this location"
                );
            }

            SubrentalSuggestion {
                equipment_id: conflict.equipment_id,
                equipment_name: conflict.equipment_name.clone(),
                date: conflict.date,
                deficit: conflict.deficit,
                severity: conflict.severity,
                location,
                affected_bookings: conflict.affected_bookings.clone(),
                providers: ranked,
            }
        })
        .collect()
}
