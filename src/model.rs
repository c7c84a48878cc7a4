use std::ops::RangeInclusive;

use chrono::{Days, NaiveDate};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// A synthetic order row, shaped after the destination table.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRecord {
    pub order_id: u64,
    pub user_id: u32,
    pub amount: f64,
    pub created_at: NaiveDate,
}

/// Value ranges the generator draws from. All bounds are inclusive.
#[derive(Debug, Clone)]
pub struct GenerationProfile {
    pub user_ids: RangeInclusive<u32>,
    pub amounts: RangeInclusive<f64>,
    pub dates: RangeInclusive<NaiveDate>,
}

impl Default for GenerationProfile {
    fn default() -> Self {
        let start = NaiveDate::from_ymd_opt(2023, 1, 1).expect("valid calendar date");
        let end = NaiveDate::from_ymd_opt(2023, 12, 31).expect("valid calendar date");
        GenerationProfile {
            user_ids: 1000..=9999,
            amounts: 10.0..=5000.0,
            dates: start..=end,
        }
    }
}

/// Produces batches of synthetic orders with sequential identifiers and
/// uniformly drawn field values.
pub struct OrderGenerator {
    rng: SmallRng,
    profile: GenerationProfile,
}

impl OrderGenerator {
    pub fn new(profile: GenerationProfile) -> Self {
        OrderGenerator {
            rng: SmallRng::from_os_rng(),
            profile,
        }
    }

    /// A generator with a fixed seed reproduces the exact same records,
    /// which keeps test runs and repeated demo loads comparable.
    pub fn seeded(profile: GenerationProfile, seed: u64) -> Self {
        OrderGenerator {
            rng: SmallRng::seed_from_u64(seed),
            profile,
        }
    }

    /// Generates `count` records with identifiers
    /// `start_id ..= start_id + count - 1`, in order. Pure in-memory work,
    /// no side effects.
    pub fn generate_batch(&mut self, start_id: u64, count: u64) -> Vec<OrderRecord> {
        let day_span = (*self.profile.dates.end() - *self.profile.dates.start()).num_days() as u64;
        let mut records = Vec::with_capacity(count as usize);
        for order_id in start_id..start_id + count {
            let user_id = self.rng.random_range(self.profile.user_ids.clone());
            let amount = round_cents(self.rng.random_range(self.profile.amounts.clone()));
            let day_offset = self.rng.random_range(0..=day_span);
            let created_at = *self.profile.dates.start() + Days::new(day_offset);
            records.push(OrderRecord {
                order_id,
                user_id,
                amount,
                created_at,
            });
        }
        records
    }
}

/// Rounds half away from zero to two fractional digits.
fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}
