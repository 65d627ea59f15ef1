//! Booking aggregation: committed usage per (equipment, date)

use chrono::NaiveDate;
use indexmap::{IndexMap, IndexSet};
use uuid::Uuid;

use crate::models::{AffectedBooking, Booking};

/// Usage of one equipment on one date
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UsageBucket {
    pub total_used: i64,
    /// Bookings in discovery order
    pub bookings: Vec<AffectedBooking>,
}

/// Usage buckets keyed by (equipment, date), iterated in discovery order
#[derive(Debug, Clone, Default)]
pub struct UsageIndex {
    buckets: IndexMap<(Uuid, NaiveDate), UsageBucket>,
}

impl UsageIndex {
    /// Sum booking quantities per (equipment, date).
    /// Negative quantities are malformed and skipped; zero-quantity lines carry no usage.
    pub fn aggregate<'a>(bookings: impl IntoIterator<Item = &'a Booking>) -> Self {
        let mut buckets: IndexMap<(Uuid, NaiveDate), UsageBucket> = IndexMap::new();

        for booking in bookings {
            if booking.quantity < 0 {
                tracing::warn!(
                    booking_id = %booking.id,
                    quantity = booking.quantity,
                    "Skipping booking with negative quantity"
                );
                continue;
            }
            if booking.quantity == 0 {
                continue;
            }

            let bucket = buckets
                .entry((booking.equipment_id, booking.date))
                .or_default();
            bucket.total_used += i64::from(booking.quantity);
            bucket.bookings.push(AffectedBooking::from(booking));
        }

        Self { buckets }
    }

    pub fn get(&self, equipment_id: Uuid, date: NaiveDate) -> Option<&UsageBucket> {
        self.buckets.get(&(equipment_id, date))
    }

    pub fn total_used(&self, equipment_id: Uuid, date: NaiveDate) -> i64 {
        self.get(equipment_id, date).map_or(0, |b| b.total_used)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&(Uuid, NaiveDate), &UsageBucket)> {
        self.buckets.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = (Uuid, NaiveDate)> + '_ {
        self.buckets.keys().copied()
    }

    /// Booked equipment, deduplicated, in discovery order
    pub fn equipment_ids(&self) -> Vec<Uuid> {
        let ids: IndexSet<Uuid> = self.buckets.keys().map(|(equipment_id, _)| *equipment_id).collect();
        ids.into_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn booking(equipment_id: Uuid, day: u32, quantity: i32, event: &str) -> Booking {
        Booking {
            id: Uuid::new_v4(),
            equipment_id,
            event_id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            date: NaiveDate::from_ymd_opt(2025, 6, day).unwrap(),
            quantity,
            event_name: event.to_string(),
            project_name: "Festival".to_string(),
            location: None,
        }
    }

    #[test]
    fn test_quantities_are_summed_per_bucket() {
        let speaker = Uuid::new_v4();
        let mixer = Uuid::new_v4();
        let bookings = vec![
            booking(speaker, 2, 5, "Rigging"),
            booking(mixer, 2, 1, "Rigging"),
            booking(speaker, 2, 3, "Show"),
            booking(speaker, 3, 4, "Show"),
        ];

        let usage = UsageIndex::aggregate(&bookings);
        assert_eq!(usage.len(), 3);
        let day2 = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        assert_eq!(usage.total_used(speaker, day2), 8);
        assert_eq!(usage.total_used(mixer, day2), 1);

        let names: Vec<&str> = usage
            .get(speaker, day2)
            .unwrap()
            .bookings
            .iter()
            .map(|b| b.event_name.as_str())
            .collect();
        assert_eq!(names, vec!["Rigging", "Show"]);
    }

    #[test]
    fn test_negative_and_zero_quantities_are_ignored() {
        let speaker = Uuid::new_v4();
        let bookings = vec![booking(speaker, 2, -3, "Broken"), booking(speaker, 2, 0, "Empty")];
        let usage = UsageIndex::aggregate(&bookings);
        assert!(usage.is_empty());
    }

    #[test]
    fn test_equipment_ids_in_discovery_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let bookings = vec![booking(b, 1, 1, "x"), booking(a, 1, 1, "y"), booking(b, 2, 1, "z")];
        assert_eq!(UsageIndex::aggregate(&bookings).equipment_ids(), vec![b, a]);
    }

    #[test]
    fn test_equipment_ids_over_a_wide_window() {
        let ids: Vec<Uuid> = (0..50).map(|_| Uuid::new_v4()).collect();
        let bookings: Vec<Booking> = (1..=28)
            .flat_map(|day| ids.iter().map(move |id| booking(*id, day, 1, "Tour")))
            .collect();
        let usage = UsageIndex::aggregate(&bookings);
        assert_eq!(usage.len(), 50 * 28);
        assert_eq!(usage.equipment_ids(), ids);
    }
}
