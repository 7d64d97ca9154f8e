//! Inventory responder: reserves a cleaning kit per requested service.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use domain::ServiceType;
use serde::{Deserialize, Serialize};

use crate::booking_fulfillment::SOURCE_INVENTORY;
use crate::error::{Result, SagaError};
use crate::events::{BookingCreationEvent, CapabilityReply, Equipment, Resource};
use crate::responders::CapabilityResponder;

/// Equipment and consumables needed for one service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Kit {
    pub equipments: Vec<Equipment>,
    pub resources: Vec<Resource>,
}

/// Source of the kit each service category needs.
#[async_trait]
pub trait InventoryCatalog: Send + Sync {
    async fn kit(&self, service: ServiceType) -> Result<Kit>;
}

fn equipment(name: &str, quantity: u32) -> Equipment {
    Equipment {
        name: name.to_string(),
        quantity,
    }
}

fn resource(name: &str, quantity: u32, unit: &str) -> Resource {
    Resource {
        name: name.to_string(),
        quantity,
        unit: unit.to_string(),
    }
}

/// In-memory catalog keyed by service category.
#[derive(Debug, Clone)]
pub struct InMemoryInventoryCatalog {
    kits: Arc<HashMap<ServiceType, Kit>>,
}

impl InMemoryInventoryCatalog {
    pub fn new(kits: HashMap<ServiceType, Kit>) -> Self {
        Self {
            kits: Arc::new(kits),
        }
    }
}

impl Default for InMemoryInventoryCatalog {
    fn default() -> Self {
        let kits = HashMap::from([
            (
                ServiceType::General,
                Kit {
                    equipments: vec![equipment("Vacuum cleaner", 1), equipment("Mop", 1)],
                    resources: vec![
                        resource("All-purpose cleaner", 1, "bottle"),
                        resource("Microfiber cloth", 4, "piece"),
                    ],
                },
            ),
            (
                ServiceType::Couch,
                Kit {
                    equipments: vec![equipment("Upholstery extractor", 1)],
                    resources: vec![resource("Upholstery shampoo", 1, "bottle")],
                },
            ),
            (
                ServiceType::Mattress,
                Kit {
                    equipments: vec![equipment("UV mattress vacuum", 1)],
                    resources: vec![resource("Fabric sanitizer", 1, "bottle")],
                },
            ),
            (
                ServiceType::Car,
                Kit {
                    equipments: vec![
                        equipment("Pressure washer", 1),
                        equipment("Wet/dry vacuum", 1),
                    ],
                    resources: vec![
                        resource("Car shampoo", 1, "bottle"),
                        resource("Tire shine", 1, "can"),
                    ],
                },
            ),
            (
                ServiceType::PostConstruction,
                Kit {
                    equipments: vec![
                        equipment("Industrial vacuum", 1),
                        equipment("Floor scrubber", 1),
                    ],
                    resources: vec![
                        resource("Heavy-duty degreaser", 2, "bottle"),
                        resource("Trash bag", 10, "piece"),
                    ],
                },
            ),
        ]);
        Self::new(kits)
    }
}

#[async_trait]
impl InventoryCatalog for InMemoryInventoryCatalog {
    async fn kit(&self, service: ServiceType) -> Result<Kit> {
        self.kits
            .get(&service)
            .cloned()
            .ok_or_else(|| SagaError::Inventory(format!("no kit configured for {service}")))
    }
}

/// Replies with one kit for the main service and one per addon.
pub struct InventoryResponder<C: InventoryCatalog> {
    catalog: C,
}

impl<C: InventoryCatalog> InventoryResponder<C> {
    pub fn new(catalog: C) -> Self {
        Self { catalog }
    }

    async fn kits_for(&self, event: &BookingCreationEvent) -> Result<Kit> {
        let mut combined = Kit::default();
        for service in event.services() {
            let kit = self.catalog.kit(service.service_type()).await?;
            combined.equipments.extend(kit.equipments);
            combined.resources.extend(kit.resources);
        }
        Ok(combined)
    }
}

#[async_trait]
impl<C: InventoryCatalog + 'static> CapabilityResponder for InventoryResponder<C> {
    fn source(&self) -> &'static str {
        SOURCE_INVENTORY
    }

    #[tracing::instrument(skip_all, fields(source = SOURCE_INVENTORY, quote_id = %event.base.quote_id))]
    async fn respond(&self, event: &BookingCreationEvent) -> Option<CapabilityReply> {
        match self.kits_for(event).await {
            Ok(kit) => Some(CapabilityReply::inventory(
                SOURCE_INVENTORY,
                kit.equipments,
                kit.resources,
            )),
            Err(e) => {
                tracing::warn!(error = %e, "Inventory allocation failed");
                Some(CapabilityReply::failure(SOURCE_INVENTORY, e.to_string()))
            }
        }
    }
}
