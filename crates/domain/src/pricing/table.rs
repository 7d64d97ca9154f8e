//! Pricing rules as configuration data.
//!
//! A [`PricingTable`] is plain serde data so the rates can be shipped as a
//! JSON file and swapped without a rebuild. All prices are whole major units.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PricingError, Result};
use crate::service::{BedType, HomeType, SeatType, VehicleClass};

/// The full set of unit prices and surcharges used by the pricing engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingTable {
    pub general: GeneralRates,
    pub car: CarRates,
    pub couch: CouchRates,
    pub mattress: MattressRates,
    pub post_construction: PostConstructionRates,
}

/// General cleaning: a home-type match wins, otherwise area bands apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralRates {
    /// Flat price by home-type code.
    pub home_types: BTreeMap<String, i64>,
    /// Area bands in ascending `max_sqm` order; the first band that fits wins.
    pub area_bands: Vec<AreaBand>,
    /// Rate per square meter beyond the last band.
    pub per_sqm: i64,
}

/// A flat price for every area up to and including `max_sqm`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaBand {
    pub max_sqm: f64,
    pub price: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarRates {
    /// Unit price by vehicle-class code.
    pub vehicles: BTreeMap<String, i64>,
    pub child_seat: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouchRates {
    /// Unit price by seating-type code.
    pub seats: BTreeMap<String, i64>,
    pub bed_pillow: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MattressRates {
    /// Unit price by bed-type code.
    pub beds: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostConstructionRates {
    pub per_sqm: i64,
}

fn rates<K: AsRef<str>>(entries: impl IntoIterator<Item = (K, i64)>) -> BTreeMap<String, i64> {
    entries
        .into_iter()
        .map(|(code, price)| (code.as_ref().to_string(), price))
        .collect()
}

impl Default for PricingTable {
    fn default() -> Self {
        Self {
            general: GeneralRates {
                home_types: rates([(HomeType::CondoRoom.as_str(), 2000)]),
                area_bands: vec![
                    AreaBand {
                        max_sqm: 30.0,
                        price: 2000,
                    },
                    AreaBand {
                        max_sqm: 50.0,
                        price: 2500,
                    },
                    AreaBand {
                        max_sqm: 100.0,
                        price: 5000,
                    },
                ],
                per_sqm: 50,
            },
            car: CarRates {
                vehicles: rates([
                    (VehicleClass::Sedan.as_str(), 3250),
                    (VehicleClass::Mpv.as_str(), 4000),
                    (VehicleClass::Suv.as_str(), 4000),
                    (VehicleClass::Van.as_str(), 5200),
                    (VehicleClass::Pickup.as_str(), 3600),
                    (VehicleClass::SmallCar.as_str(), 1750),
                ]),
                child_seat: 250,
            },
            couch: CouchRates {
                seats: rates([
                    (SeatType::Stool.as_str(), 250),
                    (SeatType::Ottoman.as_str(), 300),
                    (SeatType::DiningChair.as_str(), 350),
                    (SeatType::OfficeChair.as_str(), 400),
                    (SeatType::Armchair.as_str(), 600),
                    (SeatType::Recliner.as_str(), 800),
                    (SeatType::Loveseat.as_str(), 1000),
                    (SeatType::ThreeSeater.as_str(), 1400),
                    (SeatType::FourSeater.as_str(), 1750),
                    (SeatType::SofaBed.as_str(), 1800),
                    (SeatType::LShaped.as_str(), 2000),
                    (SeatType::UShaped.as_str(), 2500),
                ]),
                bed_pillow: 100,
            },
            mattress: MattressRates {
                beds: rates([
                    (BedType::Single.as_str(), 1000),
                    (BedType::SuperSingle.as_str(), 1250),
                    (BedType::Double.as_str(), 1500),
                    (BedType::Queen.as_str(), 1800),
                    (BedType::King.as_str(), 2200),
                    (BedType::CaliforniaKing.as_str(), 2500),
                ]),
            },
            post_construction: PostConstructionRates { per_sqm: 50 },
        }
    }
}

impl PricingTable {
    /// Parses and validates a table from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        let table: PricingTable = serde_json::from_str(json)?;
        table.validate()?;
        Ok(table)
    }

    /// Reads, parses and validates a table from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Checks that every price is non-negative and the area bands ascend.
    pub fn validate(&self) -> Result<()> {
        let flat = self
            .general
            .home_types
            .iter()
            .chain(&self.car.vehicles)
            .chain(&self.couch.seats)
            .chain(&self.mattress.beds);
        for (code, price) in flat {
            if *price < 0 {
                return Err(PricingError::InvalidTable(format!(
                    "negative price {price} for {code}"
                )));
            }
        }

        let surcharges = [
            ("general.per_sqm", self.general.per_sqm),
            ("car.child_seat", self.car.child_seat),
            ("couch.bed_pillow", self.couch.bed_pillow),
            ("post_construction.per_sqm", self.post_construction.per_sqm),
        ];
        for (name, price) in surcharges {
            if price < 0 {
                return Err(PricingError::InvalidTable(format!(
                    "negative rate {price} for {name}"
                )));
            }
        }

        let mut previous = f64::NEG_INFINITY;
        for band in &self.general.area_bands {
            if !band.max_sqm.is_finite() || band.max_sqm <= previous {
                return Err(PricingError::InvalidTable(format!(
                    "area bands must ascend, found {} after {}",
                    band.max_sqm, previous
                )));
            }
            if band.price < 0 {
                return Err(PricingError::InvalidTable(format!(
                    "negative price {} for band up to {} sqm",
                    band.price, band.max_sqm
                )));
            }
            previous = band.max_sqm;
        }

        Ok(())
    }
}
