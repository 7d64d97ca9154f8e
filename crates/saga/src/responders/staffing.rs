//! Staffing responder: assigns cleaners to the booking window.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::CleanerId;
use tokio::sync::RwLock;

use crate::booking_fulfillment::SOURCE_STAFFING;
use crate::error::{Result, SagaError};
use crate::events::{AssignedCleaner, BookingCreationEvent, CapabilityReply, Schedule};
use crate::responders::CapabilityResponder;

/// Source of cleaner availability.
#[async_trait]
pub trait StaffDirectory: Send + Sync {
    /// Reserves `count` cleaners for the whole window, or none at all.
    async fn allocate(&self, window: Schedule, count: usize) -> Result<Vec<AssignedCleaner>>;

    /// Frees the given cleaners for the window.
    ///
    /// Returns how many assignments were removed.
    async fn release(&self, window: Schedule, cleaners: &[CleanerId]) -> Result<usize>;
}

/// In-memory staff roster.
///
/// A cleaner is never assigned to two overlapping windows.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStaffDirectory {
    roster: Arc<Vec<AssignedCleaner>>,
    assignments: Arc<RwLock<HashMap<CleanerId, Vec<Schedule>>>>,
}

impl InMemoryStaffDirectory {
    pub fn new(roster: Vec<AssignedCleaner>) -> Self {
        Self {
            roster: Arc::new(roster),
            assignments: Arc::default(),
        }
    }

    /// Creates a roster of `size` generated cleaners.
    pub fn with_pool_size(size: usize) -> Self {
        let roster = (1..=size)
            .map(|n| AssignedCleaner {
                id: CleanerId::new(),
                name: format!("Cleaner {n:02}"),
            })
            .collect();
        Self::new(roster)
    }

    pub fn roster_size(&self) -> usize {
        self.roster.len()
    }

    /// Returns how many cleaners hold at least one assignment.
    pub async fn busy_count(&self) -> usize {
        self.assignments.read().await.len()
    }

    /// Returns how many windows a cleaner is booked for.
    pub async fn assignment_count(&self, cleaner: CleanerId) -> usize {
        self.assignments
            .read()
            .await
            .get(&cleaner)
            .map_or(0, Vec::len)
    }
}

#[async_trait]
impl StaffDirectory for InMemoryStaffDirectory {
    async fn allocate(&self, window: Schedule, count: usize) -> Result<Vec<AssignedCleaner>> {
        if !window.is_valid() {
            return Err(SagaError::InvalidSchedule(format!(
                "{} is not before {}",
                window.start, window.end
            )));
        }

        let mut assignments = self.assignments.write().await;
        let free: Vec<&AssignedCleaner> = self
            .roster
            .iter()
            .filter(|cleaner| {
                assignments
                    .get(&cleaner.id)
                    .is_none_or(|windows| !windows.iter().any(|w| w.overlaps(&window)))
            })
            .collect();

        if free.len() < count {
            return Err(SagaError::InsufficientStaff {
                requested: count,
                available: free.len(),
            });
        }

        let crew: Vec<AssignedCleaner> = free.into_iter().take(count).cloned().collect();
        for cleaner in &crew {
            assignments.entry(cleaner.id).or_default().push(window);
        }
        Ok(crew)
    }

    async fn release(&self, window: Schedule, cleaners: &[CleanerId]) -> Result<usize> {
        let mut assignments = self.assignments.write().await;
        let mut released = 0;
        for id in cleaners {
            let Some(windows) = assignments.get_mut(id) else {
                continue;
            };
            if let Some(position) = windows.iter().position(|w| *w == window) {
                windows.swap_remove(position);
                released += 1;
            }
            if windows.is_empty() {
                assignments.remove(id);
            }
        }
        Ok(released)
    }
}

/// Replies with a crew of one cleaner for the main service plus one per addon.
pub struct StaffingResponder<D: StaffDirectory> {
    directory: D,
}

impl<D: StaffDirectory> StaffingResponder<D> {
    pub fn new(directory: D) -> Self {
        Self { directory }
    }
}

#[async_trait]
impl<D: StaffDirectory + 'static> CapabilityResponder for StaffingResponder<D> {
    fn source(&self) -> &'static str {
        SOURCE_STAFFING
    }

    #[tracing::instrument(skip_all, fields(source = SOURCE_STAFFING, quote_id = %event.base.quote_id))]
    async fn respond(&self, event: &BookingCreationEvent) -> Option<CapabilityReply> {
        let crew_size = 1 + event.addons.len();

        match self.directory.allocate(event.base.schedule, crew_size).await {
            Ok(cleaners) => {
                tracing::debug!(crew_size, "Cleaners assigned");
                Some(CapabilityReply::staffing(SOURCE_STAFFING, cleaners))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Staff allocation failed");
                Some(CapabilityReply::failure(SOURCE_STAFFING, e.to_string()))
            }
        }
    }

    #[tracing::instrument(skip_all, fields(source = SOURCE_STAFFING, quote_id = %event.base.quote_id))]
    async fn compensate(&self, event: &BookingCreationEvent, reply: &CapabilityReply) {
        let Some(cleaners) = &reply.cleaners else {
            return;
        };
        let ids: Vec<CleanerId> = cleaners.iter().map(|cleaner| cleaner.id).collect();

        match self.directory.release(event.base.schedule, &ids).await {
            Ok(released) => tracing::info!(released, "Cleaners released"),
            Err(e) => tracing::error!(error = %e, "Failed to release cleaners"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use common::{CustomerId, QuoteId};
    use domain::{HomeType, ServiceSpecification};

    use crate::events::{AddonService, Address, BookingBase};

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, hour, 0, 0).unwrap()
    }

    fn window(from: u32, to: u32) -> Schedule {
        Schedule::new(at(from), at(to))
    }

    fn booking(schedule: Schedule) -> BookingCreationEvent {
        BookingCreationEvent {
            base: BookingBase {
                cust_id: CustomerId::new(),
                customer_first_name: "Ana".to_string(),
                customer_last_name: "Reyes".to_string(),
                address: Address {
                    address_human: "12 Mango St".to_string(),
                    address_lat: 14.55,
                    address_lng: 121.02,
                },
                schedule,
                dirty_scale: 1,
                payment_status: String::new(),
                review_status: String::new(),
                photos: Vec::new(),
                quote_id: QuoteId::new(),
            },
            main_service: ServiceSpecification::general(HomeType::House, 40.0),
            addons: vec![AddonService::from(ServiceSpecification::post_construction(
                20.0,
            ))],
        }
    }

    #[tokio::test]
    async fn allocates_requested_crew() {
        let directory = InMemoryStaffDirectory::with_pool_size(3);

        let crew = directory.allocate(window(9, 12), 2).await.unwrap();

        assert_eq!(crew.len(), 2);
        assert_ne!(crew[0].id, crew[1].id);
        assert_eq!(directory.assignment_count(crew[0].id).await, 1);
    }

    #[tokio::test]
    async fn overlapping_windows_do_not_share_cleaners() {
        let directory = InMemoryStaffDirectory::with_pool_size(3);

        let morning = directory.allocate(window(9, 12), 2).await.unwrap();
        let overlap = directory.allocate(window(11, 14), 1).await.unwrap();

        assert!(!morning.iter().any(|c| c.id == overlap[0].id));

        let result = directory.allocate(window(10, 11), 1).await;
        assert!(matches!(
            result,
            Err(SagaError::InsufficientStaff {
                requested: 1,
                available: 0
            })
        ));
    }

    #[tokio::test]
    async fn adjacent_windows_reuse_cleaners() {
        let directory = InMemoryStaffDirectory::with_pool_size(1);

        directory.allocate(window(9, 12), 1).await.unwrap();
        let afternoon = directory.allocate(window(12, 15), 1).await.unwrap();

        assert_eq!(directory.assignment_count(afternoon[0].id).await, 2);
    }

    #[tokio::test]
    async fn insufficient_staff_assigns_nobody() {
        let directory = InMemoryStaffDirectory::with_pool_size(2);

        let result = directory.allocate(window(9, 12), 3).await;

        assert!(matches!(
            result,
            Err(SagaError::InsufficientStaff {
                requested: 3,
                available: 2
            })
        ));
        assert_eq!(directory.allocate(window(9, 12), 2).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn released_cleaners_can_be_booked_again() {
        let directory = InMemoryStaffDirectory::with_pool_size(1);
        let crew = directory.allocate(window(9, 12), 1).await.unwrap();
        let ids: Vec<CleanerId> = crew.iter().map(|c| c.id).collect();

        // Only the exact window is released
        assert_eq!(directory.release(window(9, 11), &ids).await.unwrap(), 0);
        assert_eq!(directory.release(window(9, 12), &ids).await.unwrap(), 1);

        assert_eq!(directory.assignment_count(ids[0]).await, 0);
        assert_eq!(directory.allocate(window(10, 11), 1).await.unwrap()[0].id, ids[0]);
    }

    #[tokio::test]
    async fn compensation_frees_the_assigned_crew() {
        let directory = InMemoryStaffDirectory::with_pool_size(2);
        let responder = StaffingResponder::new(directory.clone());
        let event = booking(window(9, 12));

        let reply = responder.respond(&event).await.unwrap();
        let crew = reply.cleaners.clone().unwrap();
        assert!(responder.respond(&event).await.unwrap().is_error());

        responder.compensate(&event, &reply).await;

        assert_eq!(directory.assignment_count(crew[0].id).await, 0);
        assert_eq!(directory.busy_count().await, 0);
        assert!(responder.respond(&event).await.unwrap().cleaners.is_some());
    }

    #[tokio::test]
    async fn rejects_inverted_window() {
        let directory = InMemoryStaffDirectory::with_pool_size(2);
        let start = at(12);

        let result = directory
            .allocate(Schedule::new(start, start - Duration::hours(1)), 1)
            .await;

        assert!(matches!(result, Err(SagaError::InvalidSchedule(_))));
    }
}
