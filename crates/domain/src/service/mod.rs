//! Service specifications: what the customer asked to have cleaned.

pub mod codes;

use serde::{Deserialize, Serialize};

pub use codes::{BedType, HomeType, SeatType, VehicleClass};

/// Main-service category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceType {
    General,
    Couch,
    Mattress,
    Car,
    PostConstruction,
}

impl ServiceType {
    /// All categories, in declaration order.
    pub const ALL: [ServiceType; 5] = [
        ServiceType::General,
        ServiceType::Couch,
        ServiceType::Mattress,
        ServiceType::Car,
        ServiceType::PostConstruction,
    ];

    /// Returns the wire code of the category.
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::General => "GENERAL",
            ServiceType::Couch => "COUCH",
            ServiceType::Mattress => "MATTRESS",
            ServiceType::Car => "CAR",
            ServiceType::PostConstruction => "POST_CONSTRUCTION",
        }
    }
}

impl std::fmt::Display for ServiceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully specified cleaning service.
///
/// Exactly one category is populated; on the wire this is
/// `{"serviceType": "CAR", "details": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "serviceType",
    content = "details",
    rename_all = "SCREAMING_SNAKE_CASE"
)]
pub enum ServiceSpecification {
    General(GeneralCleaningDetails),
    Couch(CouchCleaningDetails),
    Mattress(MattressCleaningDetails),
    Car(CarCleaningDetails),
    PostConstruction(PostConstructionDetails),
}

impl ServiceSpecification {
    /// Returns the category of this specification.
    pub fn service_type(&self) -> ServiceType {
        match self {
            ServiceSpecification::General(_) => ServiceType::General,
            ServiceSpecification::Couch(_) => ServiceType::Couch,
            ServiceSpecification::Mattress(_) => ServiceType::Mattress,
            ServiceSpecification::Car(_) => ServiceType::Car,
            ServiceSpecification::PostConstruction(_) => ServiceType::PostConstruction,
        }
    }

    /// Returns the label used for quotes and addon price lines.
    pub fn label(&self) -> &'static str {
        self.service_type().as_str()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneralCleaningDetails {
    pub home_type: HomeType,
    #[serde(default)]
    pub sqm: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouchCleaningDetails {
    #[serde(default)]
    pub couches: Vec<CouchItem>,
    #[serde(default)]
    pub bed_pillows: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouchItem {
    pub couch_type: SeatType,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MattressCleaningDetails {
    #[serde(default)]
    pub mattresses: Vec<MattressItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MattressItem {
    pub bed_type: BedType,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarCleaningDetails {
    #[serde(default)]
    pub cars: Vec<CarItem>,
    #[serde(default)]
    pub child_seats: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarItem {
    pub car_type: VehicleClass,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostConstructionDetails {
    pub sqm: f64,
}

// Convenience constructors
impl ServiceSpecification {
    /// Creates a general cleaning specification.
    pub fn general(home_type: impl Into<HomeType>, sqm: f64) -> Self {
        ServiceSpecification::General(GeneralCleaningDetails {
            home_type: home_type.into(),
            sqm,
        })
    }

    /// Creates a car cleaning specification.
    pub fn car(cars: Vec<(VehicleClass, u32)>, child_seats: u32) -> Self {
        ServiceSpecification::Car(CarCleaningDetails {
            cars: cars
                .into_iter()
                .map(|(car_type, quantity)| CarItem { car_type, quantity })
                .collect(),
            child_seats,
        })
    }

    /// Creates a couch cleaning specification.
    pub fn couch(couches: Vec<(SeatType, u32)>, bed_pillows: u32) -> Self {
        ServiceSpecification::Couch(CouchCleaningDetails {
            couches: couches
                .into_iter()
                .map(|(couch_type, quantity)| CouchItem {
                    couch_type,
                    quantity,
                })
                .collect(),
            bed_pillows,
        })
    }

    /// Creates a mattress cleaning specification.
    pub fn mattress(mattresses: Vec<(BedType, u32)>) -> Self {
        ServiceSpecification::Mattress(MattressCleaningDetails {
            mattresses: mattresses
                .into_iter()
                .map(|(bed_type, quantity)| MattressItem { bed_type, quantity })
                .collect(),
        })
    }

    /// Creates a post-construction cleaning specification.
    pub fn post_construction(sqm: f64) -> Self {
        ServiceSpecification::PostConstruction(PostConstructionDetails { sqm })
    }
}
