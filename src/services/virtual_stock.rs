//! Virtual stock calculation
//!
//! Effective stock of an equipment on a date is its base stock, plus the
//! quantities of confirmed subrentals covering that date, minus the quantities
//! of confirmed reductions covering that date, clamped at zero.
//!
//! Adjustment records are indexed by equipment once per batch so that a whole
//! (equipment × date) grid is served from a single read of each table.

use std::collections::HashMap;

use chrono::NaiveDate;
use uuid::Uuid;

use super::usage::UsageIndex;
use crate::models::{
    inventory::{StockSource, StockSourceKind},
    EffectiveStock, Equipment, ReductionRecord, StockAdjustment, SubrentalOrderItem,
};

/// Subrental and reduction records of one batch, grouped by equipment
#[derive(Debug, Default)]
pub struct VirtualStockCalculator<'a> {
    additions: HashMap<Uuid, Vec<&'a SubrentalOrderItem>>,
    reductions: HashMap<Uuid, Vec<&'a ReductionRecord>>,
}

impl<'a> VirtualStockCalculator<'a> {
    /// Index the records, skipping uncommitted and malformed ones
    pub fn new(subrentals: &'a [SubrentalOrderItem], reductions: &'a [ReductionRecord]) -> Self {
        Self {
            additions: index_by_equipment(subrentals, "subrental order item"),
            reductions: index_by_equipment(reductions, "reduction record"),
        }
    }

    /// Effective stock of `equipment` on `date`, with usage taken from `usage`
    pub fn effective_stock(&self, equipment: &Equipment, date: NaiveDate, usage: &UsageIndex) -> EffectiveStock {
        let mut sources = Vec::new();

        let virtual_additions: i64 = self
            .additions
            .get(&equipment.id)
            .into_iter()
            .flatten()
            .filter(|item| item.covers(date))
            .map(|item| {
                sources.push(StockSource {
                    kind: StockSourceKind::Subrental,
                    record_id: item.id,
                    provider_id: Some(item.provider_id),
                    quantity: i64::from(item.quantity),
                    cost: item.cost,
                    start_date: item.start_date,
                    end_date: item.end_date,
                });
                i64::from(item.quantity)
            })
            .sum();

        let virtual_reductions: i64 = self
            .reductions
            .get(&equipment.id)
            .into_iter()
            .flatten()
            .filter(|record| record.covers(date))
            .map(|record| {
                sources.push(StockSource {
                    kind: StockSourceKind::Reduction,
                    record_id: record.id,
                    provider_id: None,
                    quantity: i64::from(record.quantity),
                    cost: None,
                    start_date: record.start_date,
                    end_date: record.end_date,
                });
                i64::from(record.quantity)
            })
            .sum();

        let base_stock = equipment.base_stock();
        let effective_stock = (base_stock + virtual_additions - virtual_reductions).max(0);
        let total_used = usage.total_used(equipment.id, date);

        EffectiveStock {
            equipment_id: equipment.id,
            equipment_name: equipment.name.clone(),
            date,
            base_stock,
            virtual_additions,
            virtual_reductions,
            effective_stock,
            total_used,
            deficit: (total_used - effective_stock).max(0),
            sources,
        }
    }

    /// Effective stock for every date, equipment by equipment
    pub fn calculate(
        &self,
        equipment: &[Equipment],
        dates: &[NaiveDate],
        usage: &UsageIndex,
    ) -> Vec<EffectiveStock> {
        equipment
            .iter()
            .flat_map(|e| dates.iter().map(move |date| self.effective_stock(e, *date, usage)))
            .collect()
    }
}

fn index_by_equipment<'a, T: StockAdjustment>(records: &'a [T], label: &str) -> HashMap<Uuid, Vec<&'a T>> {
    let mut index: HashMap<Uuid, Vec<&'a T>> = HashMap::new();
    for record in records {
        if !record.order_status().is_committed() {
            continue;
        }
        if let Some(problem) = record.inconsistency() {
            tracing::warn!(
                record_id = %record.record_id(),
                equipment_id = %record.equipment_id(),
                "Skipping {}: {}",
                label,
                problem
            );
            continue;
        }
        index.entry(record.equipment_id()).or_default().push(record);
    }
    index
}
