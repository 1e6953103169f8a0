//! Training module catalog types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a module is billed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingType {
    /// Price per realized hour.
    Hourly,
    /// Flat price per session.
    Fixed,
    /// Agreed case by case; billed at the default hourly rate.
    Negotiable,
}

impl PricingType {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Hourly => "hourly",
            Self::Fixed => "fixed",
            Self::Negotiable => "negotiable",
        }
    }

    /// Parses from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "hourly" => Some(Self::Hourly),
            "fixed" => Some(Self::Fixed),
            "negotiable" => Some(Self::Negotiable),
            _ => None,
        }
    }

    /// Revenue of one completed session.
    ///
    /// Hourly bills realized hours at `price`, fixed bills `price` once.
    /// Negotiable modules and modules without a price fall back to
    /// `default_rate` per realized hour.
    #[must_use]
    pub fn revenue(
        &self,
        price: Option<Decimal>,
        hours_realized: Decimal,
        default_rate: Decimal,
    ) -> Decimal {
        match (self, price) {
            (Self::Hourly, Some(rate)) => hours_realized * rate,
            (Self::Fixed, Some(flat)) => flat,
            _ => hours_realized * default_rate,
        }
    }
}

impl fmt::Display for PricingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The copyable content of a catalog module.
///
/// Everything except identity and timestamps, which storage assigns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleContent {
    /// Short unique code, e.g. `PY-101`.
    pub code: String,
    /// Display title.
    pub title: String,
    /// Long description.
    pub description: Option<String>,
    /// Nominal duration of one session.
    pub duration_hours: Decimal,
    /// Billing model.
    pub pricing_type: PricingType,
    /// Price (per hour or per session depending on `pricing_type`).
    pub price: Option<Decimal>,
    /// Learning objectives.
    pub objectives: Vec<String>,
    /// Prerequisites.
    pub prerequisites: Vec<String>,
    /// RNCP certification code.
    pub rncp_code: Option<String>,
    /// Free-form pedagogical metadata.
    pub metadata: serde_json::Value,
    /// Skill terms.
    pub skills: Vec<String>,
    /// Category terms.
    pub categories: Vec<String>,
    /// Whether the module can be scheduled.
    pub is_active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(PricingType::Hourly, Some(dec!(80)), dec!(3), dec!(240))]
    #[case(PricingType::Fixed, Some(dec!(500)), dec!(3), dec!(500))]
    #[case(PricingType::Fixed, Some(dec!(500)), dec!(0), dec!(500))]
    #[case(PricingType::Negotiable, Some(dec!(999)), dec!(2), dec!(100))]
    #[case(PricingType::Hourly, None, dec!(2), dec!(100))]
    #[case(PricingType::Fixed, None, dec!(1.5), dec!(75))]
    fn test_revenue(
        #[case] pricing: PricingType,
        #[case] price: Option<Decimal>,
        #[case] hours: Decimal,
        #[case] expected: Decimal,
    ) {
        assert_eq!(pricing.revenue(price, hours, dec!(50)), expected);
    }

    #[test]
    fn test_pricing_parse() {
        assert_eq!(PricingType::parse("FIXED"), Some(PricingType::Fixed));
        assert_eq!(PricingType::parse("free"), None);
        assert_eq!(PricingType::Negotiable.to_string(), "negotiable");
    }
}
