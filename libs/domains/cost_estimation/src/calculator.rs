//! Monthly cost extrapolation.

use crate::models::PriceQuote;
use crate::pricing_map::PRIVATE_ENDPOINT_TYPE;

/// Average hours per month
pub const HOURS_PER_MONTH: f64 = 730.0;

/// Hourly price charged for a private endpoint when the catalog has no entry
pub const PRIVATE_ENDPOINT_FALLBACK_PRICE: f64 = 0.01;

const HOURLY_UNIT: &str = "1 Hour";

pub fn is_hourly(unit_of_measure: &str) -> bool {
    unit_of_measure.to_lowercase().contains("hour")
}

/// Monthly cost of `quantity` units billed at `unit_price` per `unit_of_measure`
pub fn monthly_cost(unit_price: f64, unit_of_measure: &str, quantity: f64) -> f64 {
    if is_hourly(unit_of_measure) {
        unit_price * HOURS_PER_MONTH * quantity
    } else {
        // GB, operation and flat units are all billed per unit of usage
        unit_price * quantity
    }
}

/// Usage text shown next to a priced resource
pub fn usage_description(unit_of_measure: &str, quantity: f64, description: &str) -> String {
    if description == "-" && is_hourly(unit_of_measure) {
        format!("{quantity:.0} x {HOURS_PER_MONTH:.0} hours")
    } else {
        description.to_string()
    }
}

/// Built-in price for resource types that must never drop out of the total
pub fn fallback_quote(resource_type: &str) -> Option<PriceQuote> {
    (resource_type == PRIVATE_ENDPOINT_TYPE)
        .then(|| PriceQuote::new(PRIVATE_ENDPOINT_FALLBACK_PRICE, HOURLY_UNIT))
}
