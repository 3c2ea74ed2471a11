//! Synthetic profile generation
//!
//! Each schema field yields a value by type:
//! - `string`: `{field}_{token}` with a 6-character base-36 token
//! - `number`: integer in `[0, 10000)`
//! - `id`: epoch milliseconds, `_`, random numeric suffix
//!
//! The random source and the clock are owned by the generator so batches can
//! be reproduced from a seed.

use crate::types::{Field, FieldType, Profile, Schema};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::Value;
use std::sync::Arc;

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Length of the random token in generated strings
pub const STRING_TOKEN_LEN: usize = 6;

/// Exclusive upper bound of generated numbers
pub const NUMBER_UPPER_BOUND: u32 = 10_000;

/// Exclusive upper bound of the random suffix of generated ids
pub const ID_SUFFIX_UPPER_BOUND: u64 = 1_000_000_000_000;

/// Largest batch a single generation may produce
pub const MAX_BATCH_SIZE: usize = 100_000;

/// Source of wall-clock time for id values
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Current time, epoch milliseconds
    fn now_millis(&self) -> i64;
}

/// System wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Clock frozen at one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.0
    }
}

/// Coerce free-form count input to a batch size
///
/// The leading integer of the text is used (`"12 profiles"` is 12). Text with
/// no leading integer, zero and negative values all become 1.
#[must_use]
pub fn coerce_count(input: &str) -> usize {
    let t = input.trim_start();
    let (negative, rest) = match t.as_bytes().first() {
        Some(b'-') => (true, &t[1..]),
        Some(b'+') => (false, &t[1..]),
        _ => (false, t),
    };

    let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
    if digits.is_empty() || negative {
        return 1;
    }

    // digits only, so the sole failure is overflow
    let n = digits.parse::<usize>().unwrap_or(usize::MAX);
    n.max(1)
}

/// Generates synthetic profiles from schemas
#[derive(Debug)]
pub struct ProfileGenerator {
    rng: StdRng,
    clock: Arc<dyn Clock>,
}

impl ProfileGenerator {
    /// Generator seeded from OS entropy
    #[must_use]
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Generator with a fixed seed
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            clock: Arc::new(SystemClock),
        }
    }

    /// Generator seeded when `seed` is set, from entropy otherwise
    #[must_use]
    pub fn from_optional_seed(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::from_entropy, Self::from_seed)
    }

    /// With clock
    #[inline]
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Generate `count` profiles from `schema`
    ///
    /// `count` is clamped to `1..=MAX_BATCH_SIZE`.
    pub fn generate(&mut self, schema: &Schema, count: usize) -> Vec<Profile> {
        let count = count.clamp(1, MAX_BATCH_SIZE);
        let profiles: Vec<Profile> = (0..count).map(|_| self.profile(schema)).collect();
        tracing::debug!(schema = %schema.name, count, "generated profiles");
        profiles
    }

    /// Generate one profile with exactly the schema's field names
    pub fn profile(&mut self, schema: &Schema) -> Profile {
        schema
            .fields
            .iter()
            .map(|field| (field.name.clone(), self.value(field)))
            .collect()
    }

    /// Generate one value for `field`
    pub fn value(&mut self, field: &Field) -> Value {
        match field.field_type {
            FieldType::String => Value::String(format!("{}_{}", field.name, self.token())),
            FieldType::Number => Value::from(self.rng.random_range(0..NUMBER_UPPER_BOUND)),
            FieldType::Id => {
                let suffix = self.rng.random_range(0..ID_SUFFIX_UPPER_BOUND);
                Value::String(format!("{}_{}", self.clock.now_millis(), suffix))
            }
        }
    }

    fn token(&mut self) -> String {
        (0..STRING_TOKEN_LEN)
            .map(|_| BASE36[self.rng.random_range(0..BASE36.len())] as char)
            .collect()
    }
}

impl Default for ProfileGenerator {
    fn default() -> Self {
        Self::from_entropy()
    }
}
