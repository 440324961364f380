use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::service::ServiceCategory;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuoteInput {
    pub category: ServiceCategory,
    pub distance_miles: Decimal,
    pub crew_size: u32,
    pub hours: u32,
}

/// Itemized pricing result. Full precision is kept internally; callers
/// present `total_rounded` when reading the figure to the caller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuoteBreakdown {
    pub category: ServiceCategory,
    pub crew_size: u32,
    pub hours: u32,
    pub distance_miles: Decimal,
    pub hourly_rate: Decimal,
    pub subtotal: Decimal,
    pub travel_fee: Decimal,
    pub service_charge: Decimal,
    pub total: Decimal,
}

impl QuoteBreakdown {
    pub fn total_rounded(&self) -> Decimal {
        self.total.round()
    }
}

pub trait PricingEngine: Send + Sync {
    fn price(&self, input: &QuoteInput) -> QuoteBreakdown;
}

#[derive(Default)]
pub struct DeterministicPricingEngine;

impl PricingEngine for DeterministicPricingEngine {
    fn price(&self, input: &QuoteInput) -> QuoteBreakdown {
        price_move(input)
    }
}

struct RateCard {
    base: Decimal,
    distance_rate: Decimal,
    crew_rate: Decimal,
    charge_rate: Decimal,
    travel_rate: Option<Decimal>,
}

fn rate_card(category: ServiceCategory) -> RateCard {
    match category {
        ServiceCategory::FullService => RateCard {
            base: Decimal::new(19_250, 2),
            distance_rate: Decimal::new(75, 2),
            crew_rate: Decimal::new(5_500, 2),
            charge_rate: Decimal::new(14, 2),
            travel_rate: None,
        },
        ServiceCategory::LaborOnly => RateCard {
            base: Decimal::new(11_250, 2),
            distance_rate: Decimal::new(75, 2),
            crew_rate: Decimal::new(4_000, 2),
            charge_rate: Decimal::new(8, 2),
            travel_rate: Some(Decimal::new(160, 2)),
        },
    }
}

pub fn price_move(input: &QuoteInput) -> QuoteBreakdown {
    let card = rate_card(input.category);
    let extra_crew = Decimal::from(input.crew_size.saturating_sub(2));

    let hourly_rate =
        card.base + input.distance_miles * card.distance_rate + extra_crew * card.crew_rate;
    let subtotal = hourly_rate * Decimal::from(input.hours);
    let travel_fee = card
        .travel_rate
        .map(|rate| input.distance_miles * Decimal::TWO * rate)
        .unwrap_or(Decimal::ZERO);
    let service_charge = subtotal * card.charge_rate;
    let total = subtotal + travel_fee + service_charge;

    QuoteBreakdown {
        category: input.category,
        crew_size: input.crew_size,
        hours: input.hours,
        distance_miles: input.distance_miles,
        hourly_rate,
        subtotal,
        travel_fee,
        service_charge,
        total,
    }
}

/// Job-duration estimate by distance tier. The caller never supplies hours.
pub fn estimated_hours(category: ServiceCategory, distance_miles: Decimal) -> u32 {
    let tiers: [(i64, u32); 3] = match category {
        ServiceCategory::FullService => [(10, 3), (25, 4), (50, 6)],
        ServiceCategory::LaborOnly => [(10, 3), (25, 4), (50, 5)],
    };
    let ceiling = match category {
        ServiceCategory::FullService => 8,
        ServiceCategory::LaborOnly => 6,
    };

    for (limit, hours) in tiers {
        if distance_miles <= Decimal::from(limit) {
            return hours;
        }
    }
    ceiling
}

/// Crew sizing from home details. Two movers by default; larger homes and
/// heavy items each add one, capped at four.
pub fn crew_for(max_bedrooms: u32, heavy_items: bool) -> u32 {
    let mut crew = 2;
    if max_bedrooms >= 4 {
        crew += 1;
    }
    if heavy_items {
        crew += 1;
    }
    crew.min(4)
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use crate::domain::service::ServiceCategory;

    use super::{crew_for, estimated_hours, price_move, QuoteInput};

    fn quote(category: ServiceCategory, distance: i64, crew: u32, hours: u32) -> super::QuoteBreakdown {
        price_move(&QuoteInput {
            category,
            distance_miles: Decimal::from(distance),
            crew_size: crew,
            hours,
        })
    }

    #[test]
    fn full_service_reference_figures_hold_exactly() {
        let short = quote(ServiceCategory::FullService, 10, 2, 4);
        assert_eq!(short.hourly_rate, Decimal::new(20_000, 2));
        assert_eq!(short.subtotal, Decimal::new(80_000, 2));
        assert_eq!(short.service_charge, Decimal::new(11_200, 2));
        assert_eq!(short.total, Decimal::new(91_200, 2));

        let medium = quote(ServiceCategory::FullService, 25, 2, 4);
        assert_eq!(medium.hourly_rate, Decimal::new(21_125, 2));
        assert_eq!(medium.total, Decimal::new(96_330, 2));

        let long = quote(ServiceCategory::FullService, 50, 3, 6);
        assert_eq!(long.hourly_rate, Decimal::new(28_500, 2));
        assert_eq!(long.total, Decimal::new(194_940, 2));
    }

    #[test]
    fn labor_only_adds_round_trip_travel_fee() {
        let breakdown = quote(ServiceCategory::LaborOnly, 10, 2, 3);
        assert_eq!(breakdown.hourly_rate, Decimal::new(12_000, 2));
        assert_eq!(breakdown.subtotal, Decimal::new(36_000, 2));
        assert_eq!(breakdown.travel_fee, Decimal::new(3_200, 2));
        assert_eq!(breakdown.service_charge, Decimal::new(2_880, 2));
        assert_eq!(breakdown.total, Decimal::new(42_080, 2));
    }

    #[test]
    fn pricing_is_idempotent_for_fixed_inputs() {
        let first = quote(ServiceCategory::FullService, 25, 2, 4);
        let second = quote(ServiceCategory::FullService, 25, 2, 4);
        assert_eq!(first, second);
    }

    #[test]
    fn totals_increase_strictly_with_crew_size() {
        let mut previous = Decimal::ZERO;
        for crew in 2..=4 {
            let breakdown = quote(ServiceCategory::FullService, 25, crew, 4);
            assert!(
                breakdown.total > previous,
                "crew {crew} should cost more than crew {}",
                crew - 1
            );
            previous = breakdown.total;
        }

        let two = quote(ServiceCategory::FullService, 25, 2, 4);
        let three = quote(ServiceCategory::FullService, 25, 3, 4);
        let four = quote(ServiceCategory::FullService, 25, 4, 4);
        assert_eq!(three.total - two.total, four.total - three.total);
    }

    #[test]
    fn presented_total_rounds_to_whole_currency_units() {
        let breakdown = quote(ServiceCategory::FullService, 25, 2, 4);
        assert_eq!(breakdown.total_rounded(), Decimal::from(963));
        assert_eq!(breakdown.total, Decimal::new(96_330, 2));
    }

    #[test]
    fn hour_estimates_follow_distance_tiers() {
        let full = ServiceCategory::FullService;
        assert_eq!(estimated_hours(full, Decimal::from(8)), 3);
        assert_eq!(estimated_hours(full, Decimal::from(10)), 3);
        assert_eq!(estimated_hours(full, Decimal::from(24)), 4);
        assert_eq!(estimated_hours(full, Decimal::from(50)), 6);
        assert_eq!(estimated_hours(full, Decimal::from(80)), 8);

        let labor = ServiceCategory::LaborOnly;
        assert_eq!(estimated_hours(labor, Decimal::from(10)), 3);
        assert_eq!(estimated_hours(labor, Decimal::from(40)), 5);
        assert_eq!(estimated_hours(labor, Decimal::from(60)), 6);
    }

    #[test]
    fn crew_sizing_caps_at_four() {
        assert_eq!(crew_for(2, false), 2);
        assert_eq!(crew_for(4, false), 3);
        assert_eq!(crew_for(3, true), 3);
        assert_eq!(crew_for(5, true), 4);
    }
}
