//! Stateless bounded samplers.

use rand::{Rng, RngCore};

use crate::errors::GenerationError;

pub const DECIMAL_PLACES: i32 = 4;
pub const DEFAULT_TEXT_LEN: usize = 20;

const ALPHA: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const ALPHANUMERIC: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

pub fn random_bool(rng: &mut dyn RngCore) -> bool {
    rng.random_bool(0.5)
}

/// Sample from `[min, max)`.
pub fn random_int(rng: &mut dyn RngCore, min: i32, max: i32) -> Result<i32, GenerationError> {
    if min >= max {
        return Err(GenerationError::argument("int", "min must be < max"));
    }
    Ok(rng.random_range(min..max))
}

/// Sample from `[min, max)`.
pub fn random_long(rng: &mut dyn RngCore, min: i64, max: i64) -> Result<i64, GenerationError> {
    if min >= max {
        return Err(GenerationError::argument("long", "min must be < max"));
    }
    Ok(rng.random_range(min..max))
}

/// Sample from `[min, max)` and round to [`DECIMAL_PLACES`].
///
/// Ranges wider than `f64::MAX` overflow to a non-finite value, which callers
/// surface as an unsupported value.
pub fn random_double(rng: &mut dyn RngCore, min: f64, max: f64) -> Result<f64, GenerationError> {
    if !min.is_finite() || !max.is_finite() || min > max {
        return Err(GenerationError::argument(
            "double",
            "bounds must be finite with min <= max",
        ));
    }
    let scaled = rng.random::<f64>() * (max - min);
    Ok(round_places(scaled + min, DECIMAL_PLACES))
}

/// Round half away from zero. Values too large to carry a fraction are
/// returned as-is.
pub fn round_places(value: f64, places: i32) -> f64 {
    if !value.is_finite() || value.abs() >= 1e15 {
        return value;
    }
    let factor = 10_f64.powi(places);
    (value * factor).round() / factor
}

pub fn random_alpha(rng: &mut dyn RngCore, len: usize) -> String {
    random_from_charset(rng, ALPHA, len)
}

pub fn random_alphanumeric(rng: &mut dyn RngCore, len: usize) -> String {
    random_from_charset(rng, ALPHANUMERIC, len)
}

fn random_from_charset(rng: &mut dyn RngCore, charset: &[u8], len: usize) -> String {
    (0..len)
        .map(|_| charset[rng.random_range(0..charset.len())] as char)
        .collect()
}

/// Random version 4 UUID built from RNG bytes.
pub fn random_uuid(rng: &mut dyn RngCore) -> String {
    let mut bytes = [0_u8; 16];
    rng.fill_bytes(&mut bytes);
    uuid::Builder::from_random_bytes(bytes)
        .into_uuid()
        .to_string()
}

/// Uniform choice; `None` for an empty slice.
pub fn choose<'a, T>(rng: &mut dyn RngCore, values: &'a [T]) -> Option<&'a T> {
    if values.is_empty() {
        return None;
    }
    values.get(rng.random_range(0..values.len()))
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    #[test]
    fn rounds_to_four_places() {
        assert_eq!(round_places(1.234_56, DECIMAL_PLACES), 1.2346);
        assert_eq!(round_places(-0.000_04, DECIMAL_PLACES), -0.0);
        assert_eq!(round_places(f64::MAX, DECIMAL_PLACES), f64::MAX);
    }

    #[test]
    fn alphanumeric_uses_charset() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let value = random_alphanumeric(&mut rng, 64);
        assert_eq!(value.len(), 64);
        assert!(value.chars().all(|ch| ch.is_ascii_alphanumeric()));
    }

    #[test]
    fn uuid_is_version_four() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let value = random_uuid(&mut rng);
        let parsed = uuid::Uuid::parse_str(&value).expect("valid uuid");
        assert_eq!(parsed.get_version_num(), 4);
    }
}
