//! Room password generation and handling.
//!
//! A room password is an ordered sequence of single-character digits whose
//! length is discovered from the UI at lock time. Generation is deterministic
//! under a seed so a failing run can be replayed digit for digit.

use crate::result::{CandadoError, CandadoResult};

/// Deterministic seed for reproducible password generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Seed(u64);

impl Seed {
    /// Create a seed from a u64 value
    #[must_use]
    pub const fn from_u64(value: u64) -> Self {
        Self(value)
    }

    /// Create a seed from the current wall clock
    #[must_use]
    pub fn from_entropy() -> Self {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| u64::from(d.subsec_nanos()) ^ d.as_secs())
            .unwrap_or(0x5eed);
        Self(nanos)
    }

    /// Get the raw seed value
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

/// Simple xorshift64 PRNG, enough for digit streams
#[derive(Debug, Clone)]
struct Xorshift64 {
    state: u64,
}

impl Xorshift64 {
    const fn new(seed: Seed) -> Self {
        // Ensure non-zero state
        let state = if seed.0 == 0 { 1 } else { seed.0 };
        Self { state }
    }

    const fn next(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }
}

/// Seeded source of random decimal digits
#[derive(Debug, Clone)]
pub struct DigitGenerator {
    rng: Xorshift64,
}

impl DigitGenerator {
    /// Create a generator from a seed
    #[must_use]
    pub const fn new(seed: Seed) -> Self {
        Self {
            rng: Xorshift64::new(seed),
        }
    }

    /// Next digit in `'0'..='9'`
    pub fn next_digit(&mut self) -> char {
        let digit = (self.rng.next() % 10) as u8;
        char::from(b'0' + digit)
    }
}

/// The password guarding a locked room.
///
/// Length is fixed at creation and every entry attempt for the same lock
/// period must supply exactly this many digits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomPassword {
    digits: String,
}

impl RoomPassword {
    /// Generate a password of `len` random digits
    #[must_use]
    pub fn generate(len: usize, digits: &mut DigitGenerator) -> Self {
        let digits = (0..len).map(|_| digits.next_digit()).collect();
        Self { digits }
    }

    /// Build a password from an existing digit string
    pub fn from_digits(digits: impl Into<String>) -> CandadoResult<Self> {
        let digits = digits.into();
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(CandadoError::session(format!(
                "not a digit sequence: {digits:?}"
            )));
        }
        Ok(Self { digits })
    }

    /// Number of digits
    #[must_use]
    pub fn len(&self) -> usize {
        self.digits.len()
    }

    /// Whether the password has no digits
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.digits.is_empty()
    }

    /// The digits as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.digits
    }

    /// A password of the same length guaranteed to differ from this one.
    ///
    /// The first digit is rotated by one, the rest are kept, so the result
    /// always has exactly one mismatching position regardless of length.
    #[must_use]
    pub fn mismatched(&self) -> Self {
        let mut chars: Vec<char> = self.digits.chars().collect();
        if let Some(first) = chars.first_mut() {
            let rotated = (*first as u8 - b'0' + 1) % 10;
            *first = char::from(b'0' + rotated);
        }
        Self {
            digits: chars.into_iter().collect(),
        }
    }
}

impl std::fmt::Display for RoomPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.digits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod digit_generator_tests {
        use super::*;

        #[test]
        fn test_deterministic_under_same_seed() {
            let mut a = DigitGenerator::new(Seed::from_u64(42));
            let mut b = DigitGenerator::new(Seed::from_u64(42));
            for _ in 0..100 {
                assert_eq!(a.next_digit(), b.next_digit());
            }
        }

        #[test]
        fn test_digits_in_range() {
            let mut digits = DigitGenerator::new(Seed::from_u64(7));
            for _ in 0..1000 {
                assert!(digits.next_digit().is_ascii_digit());
            }
        }

        #[test]
        fn test_zero_seed_is_usable() {
            let mut digits = DigitGenerator::new(Seed::default());
            assert!(digits.next_digit().is_ascii_digit());
        }
    }

    mod room_password_tests {
        use super::*;

        #[test]
        fn test_generate_has_requested_length() {
            let mut digits = DigitGenerator::new(Seed::from_u64(9));
            for len in [1, 4, 6, 12] {
                let password = RoomPassword::generate(len, &mut digits);
                assert_eq!(password.len(), len);
                assert!(password.as_str().chars().all(|c| c.is_ascii_digit()));
            }
        }

        #[test]
        fn test_from_digits_rejects_non_digits() {
            assert!(RoomPassword::from_digits("12a4").is_err());
            assert!(RoomPassword::from_digits("").is_err());
            assert!(RoomPassword::from_digits("0042").is_ok());
        }

        #[test]
        fn test_mismatched_same_length_always_differs() {
            let mut digits = DigitGenerator::new(Seed::from_u64(1234));
            for len in 1..=10 {
                let password = RoomPassword::generate(len, &mut digits);
                let wrong = password.mismatched();
                assert_eq!(wrong.len(), password.len());
                assert_ne!(wrong, password);
            }
        }

        #[test]
        fn test_mismatched_rotates_nine_to_zero() {
            let password = RoomPassword::from_digits("91").unwrap();
            assert_eq!(password.mismatched().as_str(), "01");
        }

        #[test]
        fn test_display_shows_digits() {
            let password = RoomPassword::from_digits("123456").unwrap();
            assert_eq!(password.to_string(), "123456");
        }
    }
}
