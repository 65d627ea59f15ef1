//! Conflict analysis: overbooked (equipment, date) pairs and their severity

use std::collections::HashMap;

use chrono::NaiveDate;
use uuid::Uuid;

use super::usage::UsageIndex;
use crate::{
    config::InventoryConfig,
    models::{ConflictAnalysis, EffectiveStock, Severity},
};

/// Ratio thresholds of the severity tiers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeverityThresholds {
    pub high: f64,
    pub medium: f64,
}

impl Default for SeverityThresholds {
    fn default() -> Self {
        Self { high: 0.5, medium: 0.2 }
    }
}

impl From<&InventoryConfig> for SeverityThresholds {
    fn from(config: &InventoryConfig) -> Self {
        Self {
            high: config.severity_high_ratio,
            medium: config.severity_medium_ratio,
        }
    }
}

impl SeverityThresholds {
    /// deficit / effective stock; nothing in stock counts as fully short
    pub fn ratio(deficit: i64, effective_stock: i64) -> f64 {
        if effective_stock <= 0 {
            1.0
        } else {
            deficit as f64 / effective_stock as f64
        }
    }

    pub fn classify(&self, deficit: i64, effective_stock: i64) -> Severity {
        let ratio = Self::ratio(deficit, effective_stock);
        if ratio > self.high {
            Severity::High
        } else if ratio > self.medium {
            Severity::Medium
        } else {
            Severity::Low
        }
    }
}

/// Compare usage against effective stock and emit one record per overbooked pair.
///
/// Pairs are visited in booking discovery order. A pair with usage but no stock
/// figure is skipped and logged rather than reported as a conflict.
pub fn analyze(
    stock: &[EffectiveStock],
    usage: &UsageIndex,
    thresholds: &SeverityThresholds,
) -> Vec<ConflictAnalysis> {
    let by_key: HashMap<(Uuid, NaiveDate), &EffectiveStock> = stock
        .iter()
        .map(|s| ((s.equipment_id, s.date), s))
        .collect();

    let mut conflicts = Vec::new();
    for ((equipment_id, date), bucket) in usage.iter() {
        let Some(stock) = by_key.get(&(*equipment_id, *date)) else {
            tracing::warn!(
                equipment_id = %equipment_id,
                date = %date,
                "No stock figure for booked equipment, skipping conflict check"
            );
            continue;
        };

        let deficit = (bucket.total_used - stock.effective_stock).max(0);
        if deficit == 0 {
            continue;
        }

        let mut breakdown = (*stock).clone();
        breakdown.total_used = bucket.total_used;
        breakdown.deficit = deficit;

        conflicts.push(ConflictAnalysis {
            equipment_id: *equipment_id,
            equipment_name: stock.equipment_name.clone(),
            date: *date,
            deficit,
            ratio: SeverityThresholds::ratio(deficit, stock.effective_stock),
            severity: thresholds.classify(deficit, stock.effective_stock),
            affected_bookings: bucket.bookings.clone(),
            stock: breakdown,
        });
    }
    conflicts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Booking;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, day).unwrap()
    }

    fn stock(equipment_id: Uuid, date: NaiveDate, effective: i64) -> EffectiveStock {
        EffectiveStock {
            equipment_id,
            equipment_name: "Truss 3m".to_string(),
            date,
            base_stock: effective,
            virtual_additions: 0,
            virtual_reductions: 0,
            effective_stock: effective,
            total_used: 0,
            deficit: 0,
            sources: vec![],
        }
    }

    fn booking(equipment_id: Uuid, date: NaiveDate, quantity: i32, event: &str) -> Booking {
        Booking {
            id: Uuid::new_v4(),
            equipment_id,
            event_id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            date,
            quantity,
            event_name: event.to_string(),
            project_name: "Summer tour".to_string(),
            location: Some("Oslo".to_string()),
        }
    }

    #[test]
    fn test_severity_tiers() {
        let t = SeverityThresholds::default();
        assert_eq!(t.classify(1, 7), Severity::Low);
        assert_eq!(t.classify(1, 5), Severity::Low);
        assert_eq!(t.classify(2, 5), Severity::Medium);
        assert_eq!(t.classify(3, 5), Severity::High);
        assert_eq!(t.classify(5, 5), Severity::High);
    }

    #[test]
    fn test_zero_stock_is_maximal_ratio() {
        assert_eq!(SeverityThresholds::ratio(1, 0), 1.0);
        assert_eq!(SeverityThresholds::default().classify(1, 0), Severity::High);
    }

    #[test]
    fn test_severity_is_monotonic_in_deficit() {
        let t = SeverityThresholds::default();
        for effective in 1..40 {
            let mut previous = Severity::Low;
            for deficit in 1..100 {
                let current = t.classify(deficit, effective);
                assert!(current >= previous, "deficit {} stock {}", deficit, effective);
                previous = current;
            }
        }
    }

    #[test]
    fn test_custom_thresholds() {
        let t = SeverityThresholds { high: 0.9, medium: 0.1 };
        assert_eq!(t.classify(4, 5), Severity::Medium);
        assert_eq!(t.classify(5, 5), Severity::High);
    }

    #[test]
    fn test_two_events_over_stock() {
        let id = Uuid::new_v4();
        let bookings = vec![booking(id, d(2), 5, "Load-in"), booking(id, d(2), 3, "Show")];
        let usage = UsageIndex::aggregate(&bookings);

        let conflicts = analyze(&[stock(id, d(2), 7)], &usage, &SeverityThresholds::default());
        assert_eq!(conflicts.len(), 1);
        let c = &conflicts[0];
        assert_eq!(c.deficit, 1);
        assert_eq!(c.stock.total_used, 8);
        assert_eq!(c.severity, Severity::Low);
        assert!((c.ratio - 1.0 / 7.0).abs() < 1e-9);
        let events: Vec<&str> = c.affected_bookings.iter().map(|b| b.event_name.as_str()).collect();
        assert_eq!(events, vec!["Load-in", "Show"]);
    }

    #[test]
    fn test_no_conflict_without_deficit() {
        let id = Uuid::new_v4();
        let usage = UsageIndex::aggregate(&[booking(id, d(2), 5, "Show")]);
        assert!(analyze(&[stock(id, d(2), 5)], &usage, &SeverityThresholds::default()).is_empty());
        assert!(analyze(&[stock(id, d(3), 0)], &UsageIndex::default(), &SeverityThresholds::default()).is_empty());
    }

    #[test]
    fn test_missing_stock_is_skipped_not_reported() {
        let id = Uuid::new_v4();
        let usage = UsageIndex::aggregate(&[booking(id, d(2), 50, "Show")]);
        assert!(analyze(&[], &usage, &SeverityThresholds::default()).is_empty());
    }
}
