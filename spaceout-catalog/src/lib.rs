pub mod trip;
pub mod pricing;
pub mod currency;

pub use trip::{Destination, TravelClass, TripConfiguration};
pub use pricing::{PriceBreakdown, PricingConfig, PricingEngine};
