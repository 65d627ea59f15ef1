//! Inventory engine: effective stock, conflicts and subrental suggestions
//!
//! Every computation reads each upstream table once, concurrently where the
//! reads are independent, and runs under a deadline. A timed-out computation
//! returns [`AppError::Timeout`] and nothing else. Results with pairs of
//! unknown availability are returned but never cached.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use uuid::Uuid;

use super::{
    cache::{CacheKey, CachePolicy, CachedResult, DerivedCache},
    conflicts::{self, SeverityThresholds},
    invalidation::{InvalidationBus, InvalidationEvent},
    suggestions::{self, TriagePolicy},
    usage::UsageIndex,
    virtual_stock::VirtualStockCalculator,
};
use crate::{
    config::InventoryConfig,
    error::{AppError, AppResult},
    models::{
        Booking, ConflictFilter, ConflictReport, ConflictScope, DateRange, EffectiveStock,
        Equipment, InvalidationScope, ReductionRecord, StockReport, SubrentalOrderItem,
        SubrentalSuggestion, UnknownAvailability, UnknownCause,
    },
    repository::{InventorySource, SourceQuery},
};

/// Stock-side upstream data of one computation
struct StockData {
    equipment: Vec<Equipment>,
    subrentals: Vec<SubrentalOrderItem>,
    reductions: Vec<ReductionRecord>,
}

/// Join the stock-side reads; on failure, name every table that failed
fn combine_stock_reads(
    equipment: AppResult<Vec<Equipment>>,
    subrentals: AppResult<Vec<SubrentalOrderItem>>,
    reductions: AppResult<Vec<ReductionRecord>>,
) -> Result<StockData, String> {
    match (equipment, subrentals, reductions) {
        (Ok(equipment), Ok(subrentals), Ok(reductions)) => Ok(StockData {
            equipment,
            subrentals,
            reductions,
        }),
        (equipment, subrentals, reductions) => Err([
            ("equipment", equipment.err()),
            ("subrental orders", subrentals.err()),
            ("reductions", reductions.err()),
        ]
        .into_iter()
        .filter_map(|(table, error)| error.map(|e| format!("{}: {}", table, e)))
        .collect::<Vec<_>>()
        .join("; ")),
    }
}

fn dated_in<'a>(bookings: &'a [Booking], dates: &'a HashSet<NaiveDate>) -> impl Iterator<Item = &'a Booking> {
    bookings.iter().filter(move |b| dates.contains(&b.date))
}

fn unknown_pairs(
    pairs: impl IntoIterator<Item = (Uuid, NaiveDate)>,
    cause: UnknownCause,
    reason: &str,
) -> Vec<UnknownAvailability> {
    pairs
        .into_iter()
        .map(|(equipment_id, date)| UnknownAvailability {
            equipment_id,
            date,
            cause,
            reason: reason.to_string(),
        })
        .collect()
}

#[derive(Clone)]
pub struct InventoryEngine {
    source: Arc<dyn InventorySource>,
    cache: DerivedCache,
    bus: InvalidationBus,
    thresholds: SeverityThresholds,
    triage: TriagePolicy,
    timeout: Duration,
    max_range_days: i64,
}

impl InventoryEngine {
    pub fn new(source: Arc<dyn InventorySource>, cache: DerivedCache, bus: InvalidationBus, config: &InventoryConfig) -> Self {
        Self {
            source,
            cache,
            bus,
            thresholds: SeverityThresholds::from(config),
            triage: TriagePolicy::from(config),
            timeout: config.computation_timeout(),
            max_range_days: config.max_range_days,
        }
    }

    /// Engine with its own cache and bus, built from configuration
    pub fn from_config(source: Arc<dyn InventorySource>, config: &InventoryConfig) -> Self {
        let cache = DerivedCache::new(CachePolicy::from(config));
        let bus = InvalidationBus::new(cache.clone());
        Self::new(source, cache, bus, config)
    }

    /// Same engine (sharing cache and bus) with another computation deadline
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        Self {
            timeout,
            ..self.clone()
        }
    }

    pub fn bus(&self) -> &InvalidationBus {
        &self.bus
    }

    pub fn cache(&self) -> &DerivedCache {
        &self.cache
    }

    pub fn max_range_days(&self) -> i64 {
        self.max_range_days
    }

    async fn within_deadline<T>(&self, what: &str, work: impl Future<Output = AppResult<T>>) -> AppResult<T> {
        match tokio::time::timeout(self.timeout, work).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.timeout.as_millis() as u64,
                    "{} cancelled at deadline, partial results discarded",
                    what
                );
                Err(AppError::Timeout(format!(
                    "{} did not complete within {} ms",
                    what,
                    self.timeout.as_millis()
                )))
            }
        }
    }

    // -----------------------------------------------------------------------
    // Effective stock
    // -----------------------------------------------------------------------

    /// Effective stock for every (equipment, date) of the batch
    #[tracing::instrument(skip(self, equipment_ids, range), fields(equipment = equipment_ids.len(), start = %range.start, end = %range.end))]
    pub async fn effective_stock(&self, equipment_ids: &[Uuid], range: DateRange) -> AppResult<StockReport> {
        range.ensure_max_days(self.max_range_days)?;

        let mut ids = equipment_ids.to_vec();
        ids.sort_unstable();
        ids.dedup();

        let key = CacheKey::Stock {
            equipment_ids: ids.clone(),
            range,
        };
        if let Some(CachedResult::Stock(report)) = self.cache.get(&key).await {
            tracing::debug!("Effective stock served from cache");
            return Ok(report.as_ref().clone());
        }

        let generation = self.cache.generation().await;
        let report = self
            .within_deadline("Effective stock computation", self.compute_stock(&ids, range))
            .await?;

        if report.is_complete() {
            self.cache
                .insert(key, CachedResult::Stock(Arc::new(report.clone())), generation)
                .await;
        }
        Ok(report)
    }

    async fn compute_stock(&self, ids: &[Uuid], range: DateRange) -> AppResult<StockReport> {
        if ids.is_empty() {
            return Ok(StockReport::default());
        }

        let query = SourceQuery::new(Some(ids.to_vec()), range);
        let (equipment, bookings, subrentals, reductions) = tokio::join!(
            self.source.equipment(ids),
            self.source.bookings(&query),
            self.source.subrental_items(&query),
            self.source.reductions(&query),
        );

        let dates: Vec<NaiveDate> = range.days().collect();
        let all_pairs = || ids.iter().flat_map(|id| dates.iter().map(move |d| (*id, *d)));

        let bookings = match bookings {
            Ok(bookings) => bookings,
            Err(e) => {
                tracing::error!("Bookings unavailable: {}", e);
                let reason = format!("bookings: {}", e);
                return Ok(StockReport {
                    stock: Vec::new(),
                    unknown: unknown_pairs(all_pairs(), UnknownCause::UpstreamUnavailable, &reason),
                });
            }
        };
        let data = match combine_stock_reads(equipment, subrentals, reductions) {
            Ok(data) => data,
            Err(reason) => {
                tracing::error!("Stock data unavailable: {}", reason);
                return Ok(StockReport {
                    stock: Vec::new(),
                    unknown: unknown_pairs(all_pairs(), UnknownCause::UpstreamUnavailable, &reason),
                });
            }
        };

        let usage = UsageIndex::aggregate(&bookings);
        let calculator = VirtualStockCalculator::new(&data.subrentals, &data.reductions);
        let directory: HashMap<Uuid, &Equipment> = data.equipment.iter().map(|e| (e.id, e)).collect();

        let mut report = StockReport::default();
        let mut found: Vec<Equipment> = Vec::with_capacity(ids.len());
        for id in ids {
            match directory.get(id) {
                Some(equipment) => found.push((*equipment).clone()),
                None => {
                    tracing::warn!(equipment_id = %id, "Equipment not found in directory");
                    report.unknown.extend(unknown_pairs(
                        dates.iter().map(|d| (*id, *d)),
                        UnknownCause::EquipmentMissing,
                        "equipment not found in directory",
                    ));
                }
            }
        }
        report.stock = calculator.calculate(&found, &dates, &usage);
        Ok(report)
    }

    // -----------------------------------------------------------------------
    // Conflicts
    // -----------------------------------------------------------------------

    /// Validate a boundary filter and analyze conflicts in its scope
    pub async fn conflicts(&self, filter: ConflictFilter) -> AppResult<ConflictReport> {
        let scope = filter.into_scope(self.max_range_days)?;
        self.conflicts_in_scope(scope).await
    }

    #[tracing::instrument(skip(self, scope), fields(days = scope.dates.len(), start = %scope.range.start, end = %scope.range.end))]
    pub async fn conflicts_in_scope(&self, scope: ConflictScope) -> AppResult<ConflictReport> {
        let key = CacheKey::Conflicts(scope.clone());
        if let Some(CachedResult::Conflicts(report)) = self.cache.get(&key).await {
            tracing::debug!("Conflicts served from cache");
            return Ok(report.as_ref().clone());
        }

        let generation = self.cache.generation().await;
        let report = self
            .within_deadline("Conflict analysis", self.compute_conflicts(&scope))
            .await?;

        if report.is_complete() {
            self.cache
                .insert(key, CachedResult::Conflicts(Arc::new(report.clone())), generation)
                .await;
        }
        Ok(report)
    }

    async fn compute_conflicts(&self, scope: &ConflictScope) -> AppResult<ConflictReport> {
        if scope.equipment_ids.as_ref().is_some_and(|ids| ids.is_empty()) {
            return Ok(ConflictReport::default());
        }

        let wanted: HashSet<NaiveDate> = scope.dates.iter().copied().collect();
        let query = SourceQuery::new(scope.equipment_ids.clone(), scope.range);

        let (bookings, stock_data) = match &scope.equipment_ids {
            Some(ids) => {
                let (equipment, bookings, subrentals, reductions) = tokio::join!(
                    self.source.equipment(ids),
                    self.source.bookings(&query),
                    self.source.subrental_items(&query),
                    self.source.reductions(&query),
                );
                let bookings = match bookings {
                    Ok(bookings) => bookings,
                    Err(e) => {
                        tracing::error!("Bookings unavailable: {}", e);
                        let reason = format!("bookings: {}", e);
                        let pairs = ids.iter().flat_map(|id| scope.dates.iter().map(move |d| (*id, *d)));
                        return Ok(ConflictReport {
                            conflicts: Vec::new(),
                            unknown: unknown_pairs(pairs, UnknownCause::UpstreamUnavailable, &reason),
                        });
                    }
                };
                (bookings, combine_stock_reads(equipment, subrentals, reductions))
            }
            None => {
                // Booked equipment is only known once bookings are in
                let (bookings, subrentals, reductions) = tokio::join!(
                    self.source.bookings(&query),
                    self.source.subrental_items(&query),
                    self.source.reductions(&query),
                );
                let bookings = bookings
                    .map_err(|e| AppError::UpstreamUnavailable(format!("bookings: {}", e)))?;
                let ids = UsageIndex::aggregate(dated_in(&bookings, &wanted)).equipment_ids();
                let equipment = self.source.equipment(&ids).await;
                (bookings, combine_stock_reads(equipment, subrentals, reductions))
            }
        };

        let usage = UsageIndex::aggregate(dated_in(&bookings, &wanted));

        let data = match stock_data {
            Ok(data) => data,
            Err(reason) => {
                tracing::error!("Stock data unavailable: {}", reason);
                return Ok(ConflictReport {
                    conflicts: Vec::new(),
                    unknown: unknown_pairs(usage.keys(), UnknownCause::UpstreamUnavailable, &reason),
                });
            }
        };

        let calculator = VirtualStockCalculator::new(&data.subrentals, &data.reductions);
        let directory: HashMap<Uuid, &Equipment> = data.equipment.iter().map(|e| (e.id, e)).collect();

        let mut stock: Vec<EffectiveStock> = Vec::with_capacity(usage.len());
        let mut unknown = Vec::new();
        for (equipment_id, date) in usage.keys() {
            match directory.get(&equipment_id) {
                Some(equipment) => stock.push(calculator.effective_stock(equipment, date, &usage)),
                None => unknown.extend(unknown_pairs(
                    [(equipment_id, date)],
                    UnknownCause::EquipmentMissing,
                    "equipment not found in directory",
                )),
            }
        }

        let mut conflicts = conflicts::analyze(&stock, &usage, &self.thresholds);
        if let Some(project_id) = scope.project_id {
            conflicts.retain(|c| c.affected_bookings.iter().any(|b| b.project_id == project_id));
        }

        tracing::debug!(
            pairs = usage.len(),
            conflicts = conflicts.len(),
            unknown = unknown.len(),
            "Conflict analysis complete"
        );
        Ok(ConflictReport { conflicts, unknown })
    }

    // -----------------------------------------------------------------------
    // Suggestions
    // -----------------------------------------------------------------------

    /// Ranked subrental providers for the actionable conflicts of the visible window
    #[tracing::instrument(skip(self, window), fields(start = %window.start, end = %window.end))]
    pub async fn subrental_suggestions(&self, window: DateRange) -> AppResult<Vec<SubrentalSuggestion>> {
        window.ensure_max_days(self.max_range_days)?;
        let scope = ConflictScope {
            equipment_ids: None,
            dates: window.days().collect(),
            range: window,
            project_id: None,
        };

        let (report, providers) = tokio::join!(
            self.conflicts_in_scope(scope),
            self.within_deadline("Provider directory read", self.source.providers()),
        );
        let report = report?;
        let providers = providers.map_err(|e| match e {
            timeout @ AppError::Timeout(_) => timeout,
            other => AppError::UpstreamUnavailable(format!("providers: {}", other)),
        })?;

        if !report.is_complete() {
            tracing::warn!(
                unknown = report.unknown.len(),
                "Some pairs have unknown availability and get no suggestion"
            );
        }
        Ok(suggestions::suggest(&report.conflicts, &providers, &window, &self.triage))
    }

    // -----------------------------------------------------------------------
    // Single-pair queries
    // -----------------------------------------------------------------------

    async fn stock_on(&self, equipment_id: Uuid, date: NaiveDate) -> AppResult<EffectiveStock> {
        let mut report = self.effective_stock(&[equipment_id], DateRange::single(date)).await?;
        if let Some(unknown) = report.unknown.pop() {
            return Err(match unknown.cause {
                UnknownCause::EquipmentMissing => {
                    AppError::NotFound(format!("Equipment {} not found", equipment_id))
                }
                UnknownCause::UpstreamUnavailable => AppError::UpstreamUnavailable(unknown.reason),
            });
        }
        report
            .stock
            .pop()
            .ok_or_else(|| AppError::Internal(format!("No stock computed for equipment {}", equipment_id)))
    }

    /// Whether booking `additional_usage` more units would exceed effective stock
    pub async fn is_overbooked(&self, equipment_id: Uuid, date: NaiveDate, additional_usage: i64) -> AppResult<bool> {
        if additional_usage < 0 {
            return Err(AppError::Validation(
                "additional_usage must not be negative".to_string(),
            ));
        }
        let stock = self.stock_on(equipment_id, date).await?;
        Ok(stock.total_used.saturating_add(additional_usage) > stock.effective_stock)
    }

    /// Units still free on `date`
    pub async fn availability(&self, equipment_id: Uuid, date: NaiveDate) -> AppResult<i64> {
        Ok(self.stock_on(equipment_id, date).await?.available())
    }

    // -----------------------------------------------------------------------
    // Invalidation
    // -----------------------------------------------------------------------

    /// Clear derived results after an upstream mutation. Returns once the cache is empty.
    pub async fn invalidate(&self, scope: InvalidationScope, equipment_id: Option<Uuid>) -> InvalidationEvent {
        self.bus.publish(scope, equipment_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::source::MockInventorySource;
    use tokio_test::{assert_err, assert_ok};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, day).unwrap()
    }

    fn speaker(id: Uuid) -> Equipment {
        Equipment {
            id,
            name: "Line array".to_string(),
            stock_method: "manual".to_string(),
            manual_stock: Some(4),
            available_units: 0,
        }
    }

    fn booking(equipment_id: Uuid, quantity: i32) -> Booking {
        Booking {
            id: Uuid::new_v4(),
            equipment_id,
            event_id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            date: d(2),
            quantity,
            event_name: "Festival".to_string(),
            project_name: "Summer".to_string(),
            location: None,
        }
    }

    fn engine(mock: MockInventorySource) -> InventoryEngine {
        InventoryEngine::from_config(Arc::new(mock), &InventoryConfig::default())
    }

    #[tokio::test]
    async fn test_bookings_outage_reports_unknown_not_clean() {
        let id = Uuid::new_v4();
        let mut mock = MockInventorySource::new();
        mock.expect_equipment().returning(move |_| Ok(vec![speaker(id)]));
        mock.expect_bookings()
            .returning(|_| Err(AppError::UpstreamUnavailable("connection reset".to_string())));
        mock.expect_subrental_items().returning(|_| Ok(vec![]));
        mock.expect_reductions().returning(|_| Ok(vec![]));
        let engine = engine(mock);

        let report = assert_ok!(engine.effective_stock(&[id], DateRange::new(d(1), d(3)).unwrap()).await);
        assert!(report.stock.is_empty());
        assert_eq!(report.unknown.len(), 3);
        assert!(report.unknown.iter().all(|u| u.cause == UnknownCause::UpstreamUnavailable));
        assert!(engine.cache().is_empty().await);

        let err = assert_err!(engine.availability(id, d(2)).await);
        assert!(matches!(err, AppError::UpstreamUnavailable(_)));
    }

    #[tokio::test]
    async fn test_stock_outage_marks_booked_pairs_unknown() {
        let id = Uuid::new_v4();
        let mut mock = MockInventorySource::new();
        mock.expect_bookings().returning(move |_| Ok(vec![booking(id, 9)]));
        mock.expect_equipment().returning(move |_| Ok(vec![speaker(id)]));
        mock.expect_subrental_items()
            .returning(|_| Err(AppError::Internal("timeout".to_string())));
        mock.expect_reductions().returning(|_| Ok(vec![]));
        let engine = engine(mock);

        let filter = ConflictFilter {
            dates: Some(vec![d(2)]),
            ..Default::default()
        };
        let report = assert_ok!(engine.conflicts(filter).await);
        assert!(report.conflicts.is_empty());
        assert_eq!(report.unknown.len(), 1);
        assert_eq!(report.unknown[0].equipment_id, id);
        assert!(report.unknown[0].reason.contains("subrental orders"));
    }

    #[tokio::test]
    async fn test_unscoped_conflicts_fail_when_bookings_are_unreadable() {
        let mut mock = MockInventorySource::new();
        mock.expect_bookings()
            .returning(|_| Err(AppError::Internal("pool closed".to_string())));
        mock.expect_subrental_items().returning(|_| Ok(vec![]));
        mock.expect_reductions().returning(|_| Ok(vec![]));
        mock.expect_equipment().never();
        let engine = engine(mock);

        let filter = ConflictFilter {
            dates: Some(vec![d(2)]),
            ..Default::default()
        };
        let err = assert_err!(engine.conflicts(filter).await);
        assert!(matches!(err, AppError::UpstreamUnavailable(_)));
    }

    #[tokio::test]
    async fn test_missing_equipment_is_not_found_for_single_queries() {
        let mut mock = MockInventorySource::new();
        mock.expect_equipment().returning(|_| Ok(vec![]));
        mock.expect_bookings().returning(|_| Ok(vec![]));
        mock.expect_subrental_items().returning(|_| Ok(vec![]));
        mock.expect_reductions().returning(|_| Ok(vec![]));
        let engine = engine(mock);

        let err = assert_err!(engine.is_overbooked(Uuid::new_v4(), d(2), 1).await);
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_negative_additional_usage_is_rejected() {
        let engine = engine(MockInventorySource::new());
        let err = assert_err!(engine.is_overbooked(Uuid::new_v4(), d(2), -1).await);
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_huge_additional_usage_is_overbooked() {
        let id = Uuid::new_v4();
        let mut mock = MockInventorySource::new();
        mock.expect_equipment().returning(move |_| Ok(vec![speaker(id)]));
        mock.expect_bookings().returning(move |_| Ok(vec![booking(id, 1)]));
        mock.expect_subrental_items().returning(|_| Ok(vec![]));
        mock.expect_reductions().returning(|_| Ok(vec![]));
        let engine = engine(mock);

        assert!(assert_ok!(engine.is_overbooked(id, d(2), i64::MAX).await));
        assert!(!assert_ok!(engine.is_overbooked(id, d(2), 3).await));
    }

    #[tokio::test]
    async fn test_each_table_is_read_once_per_batch() {
        let id = Uuid::new_v4();
        let mut mock = MockInventorySource::new();
        mock.expect_equipment().times(1).returning(move |_| Ok(vec![speaker(id)]));
        mock.expect_bookings().times(1).returning(|_| Ok(vec![]));
        mock.expect_subrental_items().times(1).returning(|_| Ok(vec![]));
        mock.expect_reductions().times(1).returning(|_| Ok(vec![]));
        let engine = engine(mock);

        let range = DateRange::new(d(1), d(30)).unwrap();
        let report = assert_ok!(engine.effective_stock(&[id], range).await);
        assert_eq!(report.stock.len(), 30);

        // second call is served from cache
        let again = assert_ok!(engine.effective_stock(&[id], range).await);
        assert_eq!(again.stock, report.stock);
    }

    #[tokio::test]
    async fn test_range_longer_than_limit_is_rejected() {
        let config = InventoryConfig {
            max_range_days: 7,
            ..Default::default()
        };
        let engine = InventoryEngine::from_config(Arc::new(MockInventorySource::new()), &config);
        let err = assert_err!(
            engine
                .effective_stock(&[Uuid::new_v4()], DateRange::new(d(1), d(30)).unwrap())
                .await
        );
        assert!(matches!(err, AppError::Validation(_)));
    }
}
