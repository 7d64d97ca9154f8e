//! Deterministic pricing engine.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{PricingError, Result};
use crate::money::Money;
use crate::pricing::table::PricingTable;
use crate::service::{
    CarCleaningDetails, CouchCleaningDetails, GeneralCleaningDetails, MattressCleaningDetails,
    PostConstructionDetails, ServiceSpecification, ServiceType,
};

/// Price of one addon line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddonPrice {
    pub name: String,
    pub price: Money,
}

/// Main service plus addons, priced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceSummary {
    pub main_service: String,
    pub subtotal: Money,
    pub addons: Vec<AddonPrice>,
    pub addon_total: Money,
    pub total: Money,
}

/// Turns service specifications into currency amounts.
///
/// Pure: no I/O, and the same input always yields the same output. Codes
/// missing from the table price as zero rather than failing.
#[derive(Debug, Clone, Default)]
pub struct PricingEngine {
    table: Arc<PricingTable>,
}

impl PricingEngine {
    /// Creates an engine over the given table.
    pub fn new(table: PricingTable) -> Self {
        Self {
            table: Arc::new(table),
        }
    }

    /// Returns the table this engine prices with.
    pub fn table(&self) -> &PricingTable {
        &self.table
    }

    /// Prices a single service specification.
    pub fn price(&self, spec: &ServiceSpecification) -> Result<Money> {
        match spec {
            ServiceSpecification::General(details) => self.price_general(details),
            ServiceSpecification::Couch(details) => self.price_couch(details),
            ServiceSpecification::Mattress(details) => self.price_mattress(details),
            ServiceSpecification::Car(details) => self.price_car(details),
            ServiceSpecification::PostConstruction(details) => {
                self.price_post_construction(details)
            }
        }
    }

    /// Prices a main service and its addons.
    ///
    /// `total = subtotal + Σ addon`, each addon priced by [`Self::price`].
    pub fn quote(
        &self,
        main: &ServiceSpecification,
        addons: &[ServiceSpecification],
    ) -> Result<PriceSummary> {
        let subtotal = self.price(main)?;
        let addons = addons
            .iter()
            .map(|addon| {
                Ok(AddonPrice {
                    name: addon.label().to_string(),
                    price: self.price(addon)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let overflow = || PricingError::AmountOverflow {
            service: main.service_type(),
        };
        let addon_total = addons
            .iter()
            .try_fold(Money::zero(), |acc, addon| acc.checked_add(addon.price))
            .ok_or_else(overflow)?;
        let total = subtotal.checked_add(addon_total).ok_or_else(overflow)?;

        Ok(PriceSummary {
            main_service: main.label().to_string(),
            subtotal,
            addons,
            addon_total,
            total,
        })
    }

    fn price_general(&self, details: &GeneralCleaningDetails) -> Result<Money> {
        let rates = &self.table.general;
        let sqm = checked_area(ServiceType::General, details.sqm)?;

        if let Some(price) = rates.home_types.get(details.home_type.as_str()) {
            return Ok(Money::from_major(*price));
        }

        match rates.area_bands.iter().find(|band| sqm <= band.max_sqm) {
            Some(band) => Ok(Money::from_major(band.price)),
            None => Money::from_major(rates.per_sqm)
                .checked_scale(sqm)
                .ok_or(PricingError::AmountOverflow {
                    service: ServiceType::General,
                }),
        }
    }

    fn price_car(&self, details: &CarCleaningDetails) -> Result<Money> {
        let rates = &self.table.car;
        if details.cars.iter().all(|car| car.quantity == 0) && details.child_seats == 0 {
            return Err(PricingError::EmptySpecification {
                service: ServiceType::Car,
            });
        }

        let vehicles = details
            .cars
            .iter()
            .map(|car| (unit_price(&rates.vehicles, car.car_type.as_str()), car.quantity));
        let seats = (Money::from_major(rates.child_seat), details.child_seats);
        sum_lines(ServiceType::Car, vehicles.chain([seats]))
    }

    fn price_couch(&self, details: &CouchCleaningDetails) -> Result<Money> {
        let rates = &self.table.couch;
        let no_couches = details.couches.iter().all(|couch| couch.quantity == 0);
        if no_couches && details.bed_pillows == 0 {
            return Err(PricingError::EmptySpecification {
                service: ServiceType::Couch,
            });
        }

        let couches = details.couches.iter().map(|couch| {
            (
                unit_price(&rates.seats, couch.couch_type.as_str()),
                couch.quantity,
            )
        });
        let pillows = (Money::from_major(rates.bed_pillow), details.bed_pillows);
        sum_lines(ServiceType::Couch, couches.chain([pillows]))
    }

    fn price_mattress(&self, details: &MattressCleaningDetails) -> Result<Money> {
        let rates = &self.table.mattress;
        if details.mattresses.iter().all(|bed| bed.quantity == 0) {
            return Err(PricingError::EmptySpecification {
                service: ServiceType::Mattress,
            });
        }

        let beds = details
            .mattresses
            .iter()
            .map(|bed| (unit_price(&rates.beds, bed.bed_type.as_str()), bed.quantity));
        sum_lines(ServiceType::Mattress, beds)
    }

    fn price_post_construction(&self, details: &PostConstructionDetails) -> Result<Money> {
        let sqm = checked_area(ServiceType::PostConstruction, details.sqm)?;
        if sqm == 0.0 {
            return Err(PricingError::EmptySpecification {
                service: ServiceType::PostConstruction,
            });
        }
        Money::from_major(self.table.post_construction.per_sqm)
            .checked_scale(sqm)
            .ok_or(PricingError::AmountOverflow {
                service: ServiceType::PostConstruction,
            })
    }
}

/// Sums `unit price × quantity` lines without wrapping.
fn sum_lines(
    service: ServiceType,
    lines: impl IntoIterator<Item = (Money, u32)>,
) -> Result<Money> {
    lines
        .into_iter()
        .try_fold(Money::zero(), |acc, (unit, quantity)| {
            unit.checked_multiply(quantity)
                .and_then(|line| acc.checked_add(line))
        })
        .ok_or(PricingError::AmountOverflow { service })
}

fn checked_area(service: ServiceType, sqm: f64) -> Result<f64> {
    if !sqm.is_finite() || sqm < 0.0 {
        return Err(PricingError::InvalidArea { service, sqm });
    }
    Ok(sqm)
}

fn unit_price(rates: &std::collections::BTreeMap<String, i64>, code: &str) -> Money {
    match rates.get(code) {
        Some(price) => Money::from_major(*price),
        None => {
            tracing::debug!(code, "no rate for code, pricing at zero");
            Money::zero()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::{BedType, HomeType, SeatType, VehicleClass};

    fn engine() -> PricingEngine {
        PricingEngine::default()
    }

    #[test]
    fn test_car_two_sedans_and_a_child_seat() {
        let spec = ServiceSpecification::car(vec![(VehicleClass::Sedan, 2)], 1);
        assert_eq!(engine().price(&spec).unwrap(), Money::from_major(6750));
    }

    #[test]
    fn test_car_mixed_fleet() {
        let spec = ServiceSpecification::car(
            vec![
                (VehicleClass::Van, 1),
                (VehicleClass::SmallCar, 2),
                (VehicleClass::Pickup, 1),
            ],
            0,
        );
        // 5200 + 2 * 1750 + 3600
        assert_eq!(engine().price(&spec).unwrap(), Money::from_major(12_300));
    }

    #[test]
    fn test_car_unknown_class_prices_zero() {
        let spec = ServiceSpecification::car(vec![("TANK".into(), 3)], 2);
        assert_eq!(engine().price(&spec).unwrap(), Money::from_major(500));
    }

    #[test]
    fn test_general_house_uses_area_band() {
        let spec = ServiceSpecification::general(HomeType::House, 40.0);
        assert_eq!(engine().price(&spec).unwrap(), Money::from_major(2500));
    }

    #[test]
    fn test_general_condo_room_matches_home_type() {
        let spec = ServiceSpecification::general(HomeType::CondoRoom, 0.0);
        assert_eq!(engine().price(&spec).unwrap(), Money::from_major(2000));

        // Home type takes precedence over a large area
        let spec = ServiceSpecification::general(HomeType::CondoRoom, 400.0);
        assert_eq!(engine().price(&spec).unwrap(), Money::from_major(2000));
    }

    #[test]
    fn test_general_band_edges() {
        let cases = [
            (0.0, 2000),
            (30.0, 2000),
            (30.5, 2500),
            (50.0, 2500),
            (100.0, 5000),
            (101.0, 5050),
        ];
        for (sqm, expected) in cases {
            let spec = ServiceSpecification::general(HomeType::House, sqm);
            assert_eq!(
                engine().price(&spec).unwrap(),
                Money::from_major(expected),
                "sqm = {sqm}"
            );
        }
    }

    #[test]
    fn test_general_fractional_area_rounds_to_minor_unit() {
        let spec = ServiceSpecification::general(HomeType::House, 120.333);
        // 50 * 120.333 = 6016.65
        assert_eq!(engine().price(&spec).unwrap(), Money::from_cents(601_665));
    }

    #[test]
    fn test_general_negative_area_is_invalid() {
        let spec = ServiceSpecification::general(HomeType::House, -1.0);
        assert!(matches!(
            engine().price(&spec),
            Err(PricingError::InvalidArea { .. })
        ));
    }

    #[test]
    fn test_couch_seats_and_pillows() {
        let spec = ServiceSpecification::couch(
            vec![(SeatType::ThreeSeater, 1), (SeatType::Armchair, 2)],
            3,
        );
        // 1400 + 2 * 600 + 3 * 100
        assert_eq!(engine().price(&spec).unwrap(), Money::from_major(2900));
    }

    #[test]
    fn test_mattress_unlisted_bed_prices_zero() {
        let spec = ServiceSpecification::mattress(vec![
            (BedType::Queen, 2),
            (BedType::Unknown("HAMMOCK".into()), 1),
        ]);
        assert_eq!(engine().price(&spec).unwrap(), Money::from_major(3600));
    }

    #[test]
    fn test_post_construction_is_flat_per_sqm() {
        let spec = ServiceSpecification::post_construction(80.0);
        assert_eq!(engine().price(&spec).unwrap(), Money::from_major(4000));
    }

    #[test]
    fn test_empty_specifications_are_errors() {
        let empties = [
            ServiceSpecification::car(vec![], 0),
            ServiceSpecification::car(vec![(VehicleClass::Sedan, 0)], 0),
            ServiceSpecification::couch(vec![], 0),
            ServiceSpecification::mattress(vec![]),
            ServiceSpecification::post_construction(0.0),
        ];
        for spec in empties {
            assert!(
                matches!(
                    engine().price(&spec),
                    Err(PricingError::EmptySpecification { .. })
                ),
                "{spec:?}"
            );
        }
    }

    #[test]
    fn test_quote_sums_addons_then_adds_subtotal() {
        let main = ServiceSpecification::general(HomeType::House, 40.0);
        let addons = vec![
            ServiceSpecification::car(vec![(VehicleClass::Sedan, 2)], 1),
            ServiceSpecification::mattress(vec![(BedType::King, 1)]),
        ];

        let summary = engine().quote(&main, &addons).unwrap();
        assert_eq!(summary.main_service, "GENERAL");
        assert_eq!(summary.subtotal, Money::from_major(2500));
        assert_eq!(summary.addons.len(), 2);
        assert_eq!(summary.addons[0].name, "CAR");
        assert_eq!(summary.addons[0].price, Money::from_major(6750));
        assert_eq!(summary.addons[1].name, "MATTRESS");
        assert_eq!(summary.addons[1].price, Money::from_major(2200));
        assert_eq!(summary.addon_total, Money::from_major(8950));
        assert_eq!(summary.total, Money::from_major(11_450));
    }

    #[test]
    fn test_quote_without_addons() {
        let main = ServiceSpecification::post_construction(10.0);
        let summary = engine().quote(&main, &[]).unwrap();
        assert!(summary.addons.is_empty());
        assert_eq!(summary.addon_total, Money::zero());
        assert_eq!(summary.total, summary.subtotal);
    }

    #[test]
    fn test_quote_fails_on_empty_addon() {
        let main = ServiceSpecification::post_construction(10.0);
        let addons = vec![ServiceSpecification::mattress(vec![])];
        assert!(engine().quote(&main, &addons).is_err());
    }

    #[test]
    fn test_pricing_is_deterministic() {
        let engine = engine();
        let main = ServiceSpecification::general(HomeType::House, 77.7);
        let addons = vec![ServiceSpecification::couch(vec![(SeatType::LShaped, 1)], 2)];
        assert_eq!(
            engine.quote(&main, &addons).unwrap(),
            engine.quote(&main, &addons).unwrap()
        );
    }

    #[test]
    fn test_car_quantities_beyond_u32_sum() {
        let spec: ServiceSpecification = serde_json::from_value(serde_json::json!({
            "serviceType": "CAR",
            "details": {
                "cars": [
                    {"carType": "SEDAN", "quantity": u32::MAX},
                    {"carType": "SEDAN", "quantity": 1}
                ],
                "childSeats": 0
            }
        }))
        .unwrap();

        let expected = Money::from_major(3250 * (i64::from(u32::MAX) + 1));
        assert_eq!(engine().price(&spec).unwrap(), expected);
    }

    #[test]
    fn test_quantities_that_cancel_out_in_u32_are_not_empty() {
        let half = 1u32 << 31;
        let spec =
            ServiceSpecification::mattress(vec![(BedType::Queen, half), (BedType::Queen, half)]);
        assert!(engine().price(&spec).is_ok());
    }

    #[test]
    fn test_overflowing_price_is_an_error() {
        let mut table = PricingTable::default();
        table.car.vehicles.insert("SEDAN".to_string(), i64::MAX / 100);
        let engine = PricingEngine::new(table);
        let spec = ServiceSpecification::car(vec![(VehicleClass::Sedan, 2)], 0);

        assert!(matches!(
            engine.price(&spec),
            Err(PricingError::AmountOverflow {
                service: ServiceType::Car
            })
        ));
    }

    #[test]
    fn test_overflowing_area_is_an_error() {
        let spec = ServiceSpecification::post_construction(1e300);
        assert!(matches!(
            engine().price(&spec),
            Err(PricingError::AmountOverflow { .. })
        ));
    }

    #[test]
    fn test_custom_table_changes_rates() {
        let mut table = PricingTable::default();
        table.car.vehicles.insert("SEDAN".to_string(), 3500);
        let engine = PricingEngine::new(table);
        let spec = ServiceSpecification::car(vec![(VehicleClass::Sedan, 1)], 0);
        assert_eq!(engine.price(&spec).unwrap(), Money::from_major(3500));
    }
}
