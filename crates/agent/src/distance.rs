use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;

use moveline_core::script::states::RouteSource;

#[derive(Clone, Debug, PartialEq)]
pub struct RouteEstimate {
    pub miles: Decimal,
    pub drive_minutes: i64,
}

#[async_trait]
pub trait DistanceService: Send + Sync {
    async fn lookup(&self, pickup: &str, delivery: &str) -> Result<RouteEstimate>;
}

/// Geocoding/routing service behind a JSON HTTP API.
pub struct HttpDistanceService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpDistanceService {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self { client, base_url: base_url.into() }
    }
}

#[derive(Deserialize)]
struct RouteResponse {
    miles: f64,
    minutes: i64,
}

#[async_trait]
impl DistanceService for HttpDistanceService {
    async fn lookup(&self, pickup: &str, delivery: &str) -> Result<RouteEstimate> {
        let url = format!("{}/route", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .get(&url)
            .query(&[("origin", pickup), ("destination", delivery)])
            .send()
            .await
            .context("distance request failed")?;
        if !response.status().is_success() {
            return Err(anyhow!("distance service returned status {}", response.status()));
        }
        let payload: RouteResponse =
            response.json().await.context("distance response was not valid JSON")?;
        let miles = Decimal::from_f64_retain(payload.miles)
            .ok_or_else(|| anyhow!("distance service returned non-finite mileage"))?;
        Ok(RouteEstimate { miles: miles.round_dp(1), drive_minutes: payload.minutes })
    }
}

/// Stand-in used when geocoding is disabled in config; forces the fallback
/// table on every lookup.
#[derive(Default)]
pub struct UnavailableDistanceService;

#[async_trait]
impl DistanceService for UnavailableDistanceService {
    async fn lookup(&self, _pickup: &str, _delivery: &str) -> Result<RouteEstimate> {
        Err(anyhow!("distance service is disabled"))
    }
}

// Service-area city pairs with typical mileage and drive time. Symmetric.
const CITY_PAIRS: &[(&str, &str, i64, i64)] = &[
    ("austin", "round rock", 20, 28),
    ("austin", "pflugerville", 17, 25),
    ("austin", "georgetown", 28, 35),
    ("austin", "san marcos", 32, 38),
    ("austin", "cedar park", 19, 27),
    ("austin", "kyle", 22, 28),
    ("round rock", "georgetown", 10, 15),
    ("round rock", "pflugerville", 8, 13),
    ("san marcos", "kyle", 11, 15),
    ("austin", "san antonio", 80, 85),
];

const DEFAULT_MILES: i64 = 15;
const DEFAULT_MINUTES: i64 = 30;

/// Deterministic estimate used when the geocoding service is unavailable.
/// Known city pairs come from the table; anything else gets the in-town
/// default so the turn never fails.
pub fn fallback_route(pickup: &str, delivery: &str) -> (RouteEstimate, RouteSource) {
    let from = city_of(pickup);
    let to = city_of(delivery);

    if let (Some(from), Some(to)) = (&from, &to) {
        for (a, b, miles, minutes) in CITY_PAIRS {
            if (from == a && to == b) || (from == b && to == a) {
                return (
                    RouteEstimate { miles: Decimal::from(*miles), drive_minutes: *minutes },
                    RouteSource::FallbackTable,
                );
            }
        }
        if from == to {
            return (
                RouteEstimate { miles: Decimal::from(8), drive_minutes: 18 },
                RouteSource::FallbackTable,
            );
        }
    }

    (
        RouteEstimate {
            miles: Decimal::from(DEFAULT_MILES),
            drive_minutes: DEFAULT_MINUTES,
        },
        RouteSource::Default,
    )
}

/// Resolves a route, degrading from the live service to the table. Never
/// fails: a wrong-but-plausible estimate beats a dead call.
pub async fn resolve_route(
    service: &dyn DistanceService,
    pickup: &str,
    delivery: &str,
    timeout: Duration,
) -> (RouteEstimate, RouteSource) {
    match tokio::time::timeout(timeout, service.lookup(pickup, delivery)).await {
        Ok(Ok(estimate)) => (estimate, RouteSource::Service),
        Ok(Err(error)) => {
            tracing::debug!(
                event_name = "distance.lookup.degraded",
                error = %error,
                "distance lookup failed; using fallback table"
            );
            fallback_route(pickup, delivery)
        }
        Err(_) => {
            tracing::debug!(
                event_name = "distance.lookup.timeout",
                timeout_ms = timeout.as_millis() as u64,
                "distance lookup timed out; using fallback table"
            );
            fallback_route(pickup, delivery)
        }
    }
}

/// Rightmost comma-separated segment that still names a place once state
/// abbreviations and zip codes are dropped.
fn city_of(address: &str) -> Option<String> {
    for segment in address.rsplit(',') {
        let segment = segment.trim().to_ascii_lowercase();
        let words: Vec<&str> = segment
            .split_whitespace()
            .filter(|word| {
                let is_zip = word.chars().all(|ch| ch.is_ascii_digit());
                let is_state = word.len() == 2 && word.chars().all(|ch| ch.is_ascii_alphabetic());
                !is_zip && !is_state
            })
            .collect();
        if !words.is_empty() {
            return Some(words.join(" "));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use rust_decimal::Decimal;

    use moveline_core::script::states::RouteSource;

    use super::{
        city_of, fallback_route, resolve_route, DistanceService, RouteEstimate,
        UnavailableDistanceService,
    };

    struct SlowService;

    #[async_trait]
    impl DistanceService for SlowService {
        async fn lookup(&self, _pickup: &str, _delivery: &str) -> anyhow::Result<RouteEstimate> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(RouteEstimate { miles: Decimal::from(99), drive_minutes: 99 })
        }
    }

    #[test]
    fn city_extraction_drops_state_and_zip() {
        assert_eq!(city_of("100 Elm St, Austin"), Some("austin".to_owned()));
        assert_eq!(city_of("100 Elm St, Austin TX 78701"), Some("austin".to_owned()));
        assert_eq!(city_of("200 Oak St, Round Rock, TX"), Some("round rock".to_owned()));
        assert_eq!(city_of(""), None);
    }

    #[test]
    fn known_city_pairs_hit_the_table_in_either_direction() {
        let (estimate, source) = fallback_route("1 A St, Austin", "2 B St, Round Rock");
        assert_eq!(source, RouteSource::FallbackTable);
        assert_eq!(estimate.miles, Decimal::from(20));

        let (reverse, source) = fallback_route("2 B St, Round Rock", "1 A St, Austin");
        assert_eq!(source, RouteSource::FallbackTable);
        assert_eq!(reverse.miles, estimate.miles);
    }

    #[test]
    fn unknown_cities_get_the_default_estimate() {
        let (estimate, source) = fallback_route("1 A St, Smallville", "2 B St, Metropolis");
        assert_eq!(source, RouteSource::Default);
        assert_eq!(estimate.miles, Decimal::from(15));
        assert_eq!(estimate.drive_minutes, 30);
    }

    #[tokio::test]
    async fn disabled_service_degrades_to_fallback() {
        let (estimate, source) = resolve_route(
            &UnavailableDistanceService,
            "1 A St, Austin",
            "2 B St, Georgetown",
            Duration::from_millis(100),
        )
        .await;
        assert_eq!(source, RouteSource::FallbackTable);
        assert_eq!(estimate.miles, Decimal::from(28));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_service_times_out_into_fallback() {
        let (estimate, source) = resolve_route(
            &SlowService,
            "1 A St, Nowhere",
            "2 B St, Elsewhere",
            Duration::from_millis(200),
        )
        .await;
        assert_eq!(source, RouteSource::Default);
        assert_eq!(estimate.miles, Decimal::from(15));
    }
}
