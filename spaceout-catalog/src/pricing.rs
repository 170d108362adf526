use serde::{Deserialize, Serialize};
use spaceout_core::{CoreError, CoreResult};
use crate::currency::MINOR_PER_UNIT;
use crate::trip::{Destination, TravelClass, TripConfiguration};

/// Rate card for the pricing engine. Rates are whole base-currency units;
/// the breakdown is produced in minor units.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PricingConfig {
    /// Cost per pkm before the class multiplier and `unit_scale`.
    pub base_cost_per_distance_unit: i64,

    /// Scale applied to the distance charge.
    pub unit_scale: i64,

    pub life_support_cost_per_day: i64,

    pub hibernation_cost_per_day: i64,

    pub cargo_cost_per_kg: i64,

    /// Tax in basis points of the subtotal (1800 = 18%).
    pub tax_rate_bps: i64,

    /// Flat spaceport fee added after tax.
    pub facility_fee: i64,

    pub max_cargo_kg: u32,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            base_cost_per_distance_unit: 2_500,
            unit_scale: 1_000,
            life_support_cost_per_day: 15_000,
            hibernation_cost_per_day: 7_000,
            cargo_cost_per_kg: 500,
            tax_rate_bps: 1_800,
            facility_fee: 150_000,
            max_cargo_kg: 200,
        }
    }
}

/// Ceiling for every per-unit rate and fee, in whole base-currency units.
/// Together with [`MAX_UNIT_SCALE`] it keeps the widest intermediate
/// product in `price` far inside `i128`.
pub const MAX_RATE: i64 = 1_000_000_000;
pub const MAX_UNIT_SCALE: i64 = 1_000_000;
pub const MAX_TAX_RATE_BPS: i64 = 10_000;

impl PricingConfig {
    pub fn validate(&self) -> CoreResult<()> {
        let rates = [
            ("life_support_cost_per_day", self.life_support_cost_per_day),
            ("hibernation_cost_per_day", self.hibernation_cost_per_day),
            ("cargo_cost_per_kg", self.cargo_cost_per_kg),
            ("facility_fee", self.facility_fee),
        ];
        if let Some((name, value)) = rates.iter().find(|(_, v)| !(0..=MAX_RATE).contains(v)) {
            return Err(CoreError::InvalidParameter(format!(
                "{} must be between 0 and {}, got {}",
                name, MAX_RATE, value
            )));
        }
        if !(1..=MAX_RATE).contains(&self.base_cost_per_distance_unit) {
            return Err(CoreError::InvalidParameter(format!(
                "base_cost_per_distance_unit must be between 1 and {}, got {}",
                MAX_RATE, self.base_cost_per_distance_unit
            )));
        }
        if !(1..=MAX_UNIT_SCALE).contains(&self.unit_scale) {
            return Err(CoreError::InvalidParameter(format!(
                "unit_scale must be between 1 and {}, got {}",
                MAX_UNIT_SCALE, self.unit_scale
            )));
        }
        if !(0..=MAX_TAX_RATE_BPS).contains(&self.tax_rate_bps) {
            return Err(CoreError::InvalidParameter(format!(
                "tax_rate_bps must be between 0 and {}, got {}",
                MAX_TAX_RATE_BPS, self.tax_rate_bps
            )));
        }
        Ok(())
    }
}

/// Itemized quote in minor units.
///
/// `subtotal == base_travel + life_support + hibernation_cargo` and
/// `total == subtotal + tax + facility_fee` hold exactly.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PriceBreakdown {
    pub base_travel_minor: i64,
    pub life_support_minor: i64,
    pub hibernation_cargo_minor: i64,
    pub subtotal_minor: i64,
    pub tax_minor: i64,
    pub facility_fee_minor: i64,
    pub total_minor: i64,
}

/// Deterministic trip pricing. Holds only its rate card, so it is safe to
/// share across threads and call repeatedly.
#[derive(Debug, Clone)]
pub struct PricingEngine {
    config: PricingConfig,
}

impl Default for PricingEngine {
    fn default() -> Self {
        Self { config: PricingConfig::default() }
    }
}

impl PricingEngine {
    pub fn new(config: PricingConfig) -> CoreResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    /// Validate raw parameters against the rate card's cargo bound.
    pub fn configure_trip(
        &self,
        destination: Destination,
        travel_class: TravelClass,
        hibernation_days: u32,
        cargo_kg: u32,
    ) -> CoreResult<TripConfiguration> {
        TripConfiguration::new(destination, travel_class, hibernation_days, cargo_kg, self.config.max_cargo_kg)
    }

    pub fn compute_price(
        &self,
        destination: Destination,
        travel_class: TravelClass,
        hibernation_days: u32,
        cargo_kg: u32,
    ) -> CoreResult<PriceBreakdown> {
        let trip = self.configure_trip(destination, travel_class, hibernation_days, cargo_kg)?;
        self.price(&trip)
    }

    pub fn price(&self, trip: &TripConfiguration) -> CoreResult<PriceBreakdown> {
        if trip.cargo_kg() > self.config.max_cargo_kg {
            return Err(CoreError::InvalidParameter(format!(
                "cargo_kg {} exceeds the {} kg allowance",
                trip.cargo_kg(),
                self.config.max_cargo_kg
            )));
        }

        let c = &self.config;
        let dest = trip.destination().spec();
        let class = trip.travel_class().spec();
        let minor = MINOR_PER_UNIT as i128;

        // rate * (distance_milli / 1000) * (bps / 10_000) * unit_scale
        let base_travel = div_round_half_up(
            c.base_cost_per_distance_unit as i128
                * minor
                * dest.distance_milli as i128
                * class.multiplier_bps as i128
                * c.unit_scale as i128,
            1_000 * 10_000,
        );
        let life_support = c.life_support_cost_per_day as i128 * dest.nominal_days as i128 * minor;
        let hibernation_cargo = (c.hibernation_cost_per_day as i128 * trip.hibernation_days() as i128
            + c.cargo_cost_per_kg as i128 * trip.cargo_kg() as i128)
            * minor;

        let subtotal = base_travel + life_support + hibernation_cargo;
        let tax = div_round_half_up(subtotal * c.tax_rate_bps as i128, 10_000);
        let facility_fee = c.facility_fee as i128 * minor;
        let total = subtotal + tax + facility_fee;

        Ok(PriceBreakdown {
            base_travel_minor: narrow(base_travel)?,
            life_support_minor: narrow(life_support)?,
            hibernation_cargo_minor: narrow(hibernation_cargo)?,
            subtotal_minor: narrow(subtotal)?,
            tax_minor: narrow(tax)?,
            facility_fee_minor: narrow(facility_fee)?,
            total_minor: narrow(total)?,
        })
    }
}

/// Non-negative division rounding halves away from zero.
fn div_round_half_up(numerator: i128, denominator: i128) -> i128 {
    (numerator + denominator / 2) / denominator
}

fn narrow(value: i128) -> CoreResult<i64> {
    i64::try_from(value)
        .map_err(|_| CoreError::InvalidParameter(format!("price component {} overflows the amount range", value)))
}
