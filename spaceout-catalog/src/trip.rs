use serde::{Deserialize, Serialize};
use spaceout_core::{CoreError, CoreResult};

/// Bodies the service flies to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    Moon,
    Mars,
    Europa,
}

/// Static route data for a destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DestinationSpec {
    pub name: &'static str,
    /// Distance in thousandths of a pkm, so 0.384 pkm stays exact.
    pub distance_milli: i64,
    pub nominal_days: u32,
}

const DESTINATIONS: [(Destination, DestinationSpec); 3] = [
    (Destination::Moon, DestinationSpec { name: "Moon", distance_milli: 384, nominal_days: 3 }),
    (Destination::Mars, DestinationSpec { name: "Mars", distance_milli: 120_000, nominal_days: 180 }),
    (Destination::Europa, DestinationSpec { name: "Europa", distance_milli: 628_000, nominal_days: 550 }),
];

impl Destination {
    pub const ALL: [Destination; 3] = [Destination::Moon, Destination::Mars, Destination::Europa];

    pub fn spec(&self) -> &'static DestinationSpec {
        // The table is indexed in declaration order.
        &DESTINATIONS[*self as usize].1
    }

    /// Distance in pkm, for display.
    pub fn distance(&self) -> f64 {
        self.spec().distance_milli as f64 / 1000.0
    }

    pub fn nominal_days(&self) -> u32 {
        self.spec().nominal_days
    }
}

impl std::str::FromStr for Destination {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "moon" => Ok(Destination::Moon),
            "mars" => Ok(Destination::Mars),
            "europa" => Ok(Destination::Europa),
            other => Err(CoreError::InvalidParameter(format!("unknown destination '{}'", other))),
        }
    }
}

/// Cabin class; ordered by price multiplier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum TravelClass {
    Standard,
    Research,
    Comfort,
    Executive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassSpec {
    pub name: &'static str,
    /// Multiplier in basis points, 10_000 == 1.0x.
    pub multiplier_bps: i64,
}

const CLASSES: [(TravelClass, ClassSpec); 4] = [
    (TravelClass::Standard, ClassSpec { name: "Standard", multiplier_bps: 10_000 }),
    (TravelClass::Research, ClassSpec { name: "Research", multiplier_bps: 11_500 }),
    (TravelClass::Comfort, ClassSpec { name: "Comfort", multiplier_bps: 13_500 }),
    (TravelClass::Executive, ClassSpec { name: "Executive", multiplier_bps: 18_000 }),
];

impl TravelClass {
    pub const ALL: [TravelClass; 4] = [
        TravelClass::Standard,
        TravelClass::Research,
        TravelClass::Comfort,
        TravelClass::Executive,
    ];

    pub fn spec(&self) -> &'static ClassSpec {
        &CLASSES[*self as usize].1
    }

    pub fn multiplier(&self) -> f64 {
        self.spec().multiplier_bps as f64 / 10_000.0
    }
}

impl std::str::FromStr for TravelClass {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(TravelClass::Standard),
            "research" => Ok(TravelClass::Research),
            "comfort" => Ok(TravelClass::Comfort),
            "executive" => Ok(TravelClass::Executive),
            other => Err(CoreError::InvalidParameter(format!("unknown travel class '{}'", other))),
        }
    }
}

/// Validated trip parameters. Only constructible through [`TripConfiguration::new`],
/// so a value in hand is always in range.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct TripConfiguration {
    destination: Destination,
    travel_class: TravelClass,
    hibernation_days: u32,
    cargo_kg: u32,
}

impl TripConfiguration {
    /// Out-of-range values are rejected, never clamped.
    pub fn new(
        destination: Destination,
        travel_class: TravelClass,
        hibernation_days: u32,
        cargo_kg: u32,
        max_cargo_kg: u32,
    ) -> CoreResult<Self> {
        let max_days = destination.nominal_days();
        if hibernation_days > max_days {
            return Err(CoreError::InvalidParameter(format!(
                "hibernation_days {} exceeds the {} day voyage to {}",
                hibernation_days,
                max_days,
                destination.spec().name
            )));
        }
        if cargo_kg > max_cargo_kg {
            return Err(CoreError::InvalidParameter(format!(
                "cargo_kg {} exceeds the {} kg allowance",
                cargo_kg, max_cargo_kg
            )));
        }

        Ok(Self { destination, travel_class, hibernation_days, cargo_kg })
    }

    pub fn destination(&self) -> Destination {
        self.destination
    }

    pub fn travel_class(&self) -> TravelClass {
        self.travel_class
    }

    pub fn hibernation_days(&self) -> u32 {
        self.hibernation_days
    }

    pub fn cargo_kg(&self) -> u32 {
        self.cargo_kg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_tables_match_enum_order() {
        for (i, dest) in Destination::ALL.iter().enumerate() {
            assert_eq!(DESTINATIONS[i].0, *dest);
        }
        for (i, class) in TravelClass::ALL.iter().enumerate() {
            assert_eq!(CLASSES[i].0, *class);
        }
    }

    #[test]
    fn test_class_multipliers_increase_with_order() {
        let bps: Vec<i64> = TravelClass::ALL.iter().map(|c| c.spec().multiplier_bps).collect();
        assert!(bps.windows(2).all(|w| w[0] < w[1]));
        assert!(bps.iter().all(|b| *b >= 10_000));
        assert!((TravelClass::Comfort.multiplier() - 1.35).abs() < 1e-12);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("Mars".parse::<Destination>().unwrap(), Destination::Mars);
        assert_eq!(" executive ".parse::<TravelClass>().unwrap(), TravelClass::Executive);
        assert!(matches!("pluto".parse::<Destination>(), Err(CoreError::InvalidParameter(_))));
        assert!(matches!("steerage".parse::<TravelClass>(), Err(CoreError::InvalidParameter(_))));
    }

    #[test]
    fn test_trip_bounds_are_inclusive() {
        assert!(TripConfiguration::new(Destination::Moon, TravelClass::Standard, 3, 200, 200).is_ok());
        assert!(TripConfiguration::new(Destination::Moon, TravelClass::Standard, 0, 0, 200).is_ok());
    }

    #[test]
    fn test_trip_rejects_out_of_range() {
        let too_long = TripConfiguration::new(Destination::Moon, TravelClass::Standard, 4, 0, 200);
        assert!(matches!(too_long, Err(CoreError::InvalidParameter(msg)) if msg.contains("Moon")));

        let too_heavy = TripConfiguration::new(Destination::Mars, TravelClass::Comfort, 90, 201, 200);
        assert!(matches!(too_heavy, Err(CoreError::InvalidParameter(_))));
    }

    #[test]
    fn test_destination_display_distance() {
        assert!((Destination::Moon.distance() - 0.384).abs() < 1e-12);
        assert_eq!(Destination::Europa.nominal_days(), 550);
    }
}
