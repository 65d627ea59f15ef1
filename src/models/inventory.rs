//! Derived inventory results: effective stock, conflicts and subrental suggestions

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::{booking::AffectedBooking, enums::Severity};
use crate::error::{AppError, AppResult};

// ---------------------------------------------------------------------------
// DateRange
// ---------------------------------------------------------------------------

/// Inclusive calendar date range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> AppResult<Self> {
        if end < start {
            return Err(AppError::Validation(format!(
                "end date {} is before start date {}",
                end, start
            )));
        }
        Ok(Self { start, end })
    }

    pub fn single(date: NaiveDate) -> Self {
        Self { start: date, end: date }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        start <= self.end && self.start <= end
    }

    /// Number of days, both ends included
    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }

    /// Fails when the range is longer than `max_days`
    pub fn ensure_max_days(&self, max_days: i64) -> AppResult<()> {
        if self.len_days() > max_days {
            return Err(AppError::Validation(format!(
                "date range of {} days exceeds the maximum of {} days",
                self.len_days(),
                max_days
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Effective stock
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StockSourceKind {
    /// Confirmed subrental (virtual addition)
    Subrental,
    /// Confirmed repair / loss (virtual reduction)
    Reduction,
}

/// One record contributing to a virtual addition or reduction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StockSource {
    pub kind: StockSourceKind,
    pub record_id: Uuid,
    pub provider_id: Option<Uuid>,
    pub quantity: i64,
    #[schema(value_type = Option<String>)]
    pub cost: Option<Decimal>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Effective stock of an equipment on one date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EffectiveStock {
    pub equipment_id: Uuid,
    pub equipment_name: String,
    pub date: NaiveDate,
    pub base_stock: i64,
    pub virtual_additions: i64,
    pub virtual_reductions: i64,
    /// base + additions - reductions, never below zero
    pub effective_stock: i64,
    pub total_used: i64,
    pub deficit: i64,
    pub sources: Vec<StockSource>,
}

impl EffectiveStock {
    /// Units still free once bookings are served
    pub fn available(&self) -> i64 {
        (self.effective_stock - self.total_used).max(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UnknownCause {
    /// An upstream table could not be read
    UpstreamUnavailable,
    /// The equipment is not in the equipment directory
    EquipmentMissing,
}

/// An (equipment, date) pair whose availability could not be determined
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UnknownAvailability {
    pub equipment_id: Uuid,
    pub date: NaiveDate,
    pub cause: UnknownCause,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct StockReport {
    pub stock: Vec<EffectiveStock>,
    pub unknown: Vec<UnknownAvailability>,
}

impl StockReport {
    pub fn is_complete(&self) -> bool {
        self.unknown.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Conflicts
// ---------------------------------------------------------------------------

/// Overbooking of an equipment on one date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ConflictAnalysis {
    pub equipment_id: Uuid,
    pub equipment_name: String,
    pub date: NaiveDate,
    pub stock: EffectiveStock,
    pub deficit: i64,
    /// deficit / effective stock (1.0 when nothing is in stock)
    pub ratio: f64,
    pub severity: Severity,
    /// Competing bookings in discovery order
    pub affected_bookings: Vec<AffectedBooking>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ConflictReport {
    pub conflicts: Vec<ConflictAnalysis>,
    pub unknown: Vec<UnknownAvailability>,
}

impl ConflictReport {
    pub fn is_complete(&self) -> bool {
        self.unknown.is_empty()
    }
}

/// Conflict query as received at the boundary
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct ConflictFilter {
    #[validate(length(max = 1000))]
    pub equipment_ids: Option<Vec<Uuid>>,
    /// Explicit dates; combined with start/end they are clipped to that range
    #[validate(length(min = 1, max = 1000))]
    pub dates: Option<Vec<NaiveDate>>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Only conflicts in which this project has a booking
    pub project_id: Option<Uuid>,
    /// Overrides the configured computation timeout
    #[validate(range(min = 1, max = 600000))]
    pub timeout_ms: Option<u64>,
}

/// Validated, normalized conflict scope. Also the cache key of conflict results.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConflictScope {
    /// Sorted and deduplicated; `None` means every booked equipment
    pub equipment_ids: Option<Vec<Uuid>>,
    /// Sorted and deduplicated, never empty
    pub dates: Vec<NaiveDate>,
    /// Smallest range covering `dates`
    pub range: DateRange,
    pub project_id: Option<Uuid>,
}

impl ConflictFilter {
    pub fn into_scope(self, max_range_days: i64) -> AppResult<ConflictScope> {
        self.validate()?;

        let range = match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => Some(DateRange::new(start, end)?),
            (None, None) => None,
            _ => {
                return Err(AppError::Validation(
                    "start_date and end_date must be given together".to_string(),
                ))
            }
        };

        let mut dates: Vec<NaiveDate> = match (self.dates, range) {
            (Some(dates), Some(range)) => dates.into_iter().filter(|d| range.contains(*d)).collect(),
            (Some(dates), None) => dates,
            (None, Some(range)) => {
                range.ensure_max_days(max_range_days)?;
                range.days().collect()
            }
            (None, None) => {
                return Err(AppError::Validation(
                    "either dates or start_date/end_date is required".to_string(),
                ))
            }
        };
        dates.sort_unstable();
        dates.dedup();

        let (first, last) = match (dates.first(), dates.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => {
                return Err(AppError::Validation(
                    "no requested date falls inside start_date/end_date".to_string(),
                ))
            }
        };
        let covering = DateRange::new(first, last)?;
        covering.ensure_max_days(max_range_days)?;

        let equipment_ids = self.equipment_ids.map(|mut ids| {
            ids.sort_unstable();
            ids.dedup();
            ids
        });

        Ok(ConflictScope {
            equipment_ids,
            dates,
            range: covering,
            project_id: self.project_id,
        })
    }
}

// ---------------------------------------------------------------------------
// Subrental suggestions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProviderSuggestion {
    pub provider_id: Uuid,
    pub company_name: String,
    pub preferred: bool,
    pub reliability_rating: Option<f64>,
    pub geographic_coverage: Vec<String>,
}

/// Ranked providers proposed for an actionable conflict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SubrentalSuggestion {
    pub equipment_id: Uuid,
    pub equipment_name: String,
    pub date: NaiveDate,
    pub deficit: i64,
    pub severity: Severity,
    /// Location of the first affected booking, used for provider matching
    pub location: Option<String>,
    pub affected_bookings: Vec<AffectedBooking>,
    /// Empty when no provider serves the location
    pub providers: Vec<ProviderSuggestion>,
}

/// Visible date window of the suggestions query
#[derive(Debug, Deserialize, Validate, IntoParams, ToSchema)]
pub struct SuggestionQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Overrides the configured computation timeout
    #[validate(range(min = 1, max = 600000))]
    pub timeout_ms: Option<u64>,
}

impl SuggestionQuery {
    pub fn window(&self) -> AppResult<DateRange> {
        self.validate()?;
        DateRange::new(self.start_date, self.end_date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, day).unwrap()
    }

    #[test]
    fn test_date_range_rejects_inverted_bounds() {
        assert!(DateRange::new(d(3), d(1)).is_err());
        let range = DateRange::new(d(1), d(3)).unwrap();
        assert_eq!(range.len_days(), 3);
        assert_eq!(range.days().collect::<Vec<_>>(), vec![d(1), d(2), d(3)]);
    }

    #[test]
    fn test_date_range_overlap() {
        let range = DateRange::new(d(5), d(10)).unwrap();
        assert!(range.overlaps(d(1), d(5)));
        assert!(range.overlaps(d(10), d(20)));
        assert!(!range.overlaps(d(1), d(4)));
        assert!(!range.overlaps(d(11), d(12)));
    }

    #[test]
    fn test_filter_from_range() {
        let scope = ConflictFilter {
            start_date: Some(d(1)),
            end_date: Some(d(3)),
            ..Default::default()
        }
        .into_scope(366)
        .unwrap();
        assert_eq!(scope.dates, vec![d(1), d(2), d(3)]);
        assert_eq!(scope.range, DateRange::new(d(1), d(3)).unwrap());
    }

    #[test]
    fn test_filter_dates_are_clipped_sorted_and_deduped() {
        let scope = ConflictFilter {
            dates: Some(vec![d(9), d(2), d(2), d(20)]),
            start_date: Some(d(1)),
            end_date: Some(d(10)),
            ..Default::default()
        }
        .into_scope(366)
        .unwrap();
        assert_eq!(scope.dates, vec![d(2), d(9)]);
        assert_eq!(scope.range, DateRange::new(d(2), d(9)).unwrap());
    }

    #[test]
    fn test_filter_requires_dates() {
        assert!(ConflictFilter::default().into_scope(366).is_err());
        let half_open = ConflictFilter {
            start_date: Some(d(1)),
            ..Default::default()
        };
        assert!(half_open.into_scope(366).is_err());
    }

    #[test]
    fn test_filter_enforces_max_range() {
        let filter = ConflictFilter {
            start_date: Some(d(1)),
            end_date: Some(d(30)),
            ..Default::default()
        };
        assert!(filter.into_scope(7).is_err());
    }

    #[test]
    fn test_filter_rejects_empty_dates() {
        let filter = ConflictFilter {
            dates: Some(vec![]),
            ..Default::default()
        };
        assert!(filter.into_scope(366).is_err());
    }
}
