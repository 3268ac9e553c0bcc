//! Worker count resolution.
//!
//! A pool is configured with either an explicit thread count or [`ThreadCount::Auto`].
//! Auto picks a count that divides the work evenly when that costs little
//! parallelism, otherwise it uses every hardware thread:
//!
//! ```text
//! g = gcd(hardware_threads, item_count)
//! if g > 0.75 * hardware_threads { g } else { hardware_threads }
//! ```

use crate::error::PoolError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

/// Requested number of worker threads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThreadCount {
    /// Let the resolver decide from hardware concurrency and item count
    #[default]
    Auto,
    Fixed(NonZeroUsize),
}

impl ThreadCount {
    pub fn fixed(threads: usize) -> Result<Self, PoolError> {
        NonZeroUsize::new(threads)
            .map(ThreadCount::Fixed)
            .ok_or_else(|| invalid_count(&threads.to_string()))
    }

    /// Resolve against the detected hardware concurrency
    pub fn resolve(self, item_count: usize) -> usize {
        resolve_thread_count(self, item_count, num_cpus::get())
    }
}

/// Accepts a positive integer, or `-1` for auto
impl TryFrom<i64> for ThreadCount {
    type Error = PoolError;

    fn try_from(requested: i64) -> Result<Self, Self::Error> {
        match requested {
            -1 => Ok(ThreadCount::Auto),
            n if n > 0 => usize::try_from(n)
                .map_err(|_| invalid_count(&n.to_string()))
                .and_then(ThreadCount::fixed),
            n => Err(invalid_count(&n.to_string())),
        }
    }
}

impl FromStr for ThreadCount {
    type Err = PoolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("auto") {
            return Ok(ThreadCount::Auto);
        }
        let requested: i64 = s.parse().map_err(|_| invalid_count(s))?;
        ThreadCount::try_from(requested)
    }
}

impl fmt::Display for ThreadCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThreadCount::Auto => f.write_str("auto"),
            ThreadCount::Fixed(n) => write!(f, "{n}"),
        }
    }
}

impl Serialize for ThreadCount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ThreadCount::Auto => serializer.serialize_str("auto"),
            ThreadCount::Fixed(n) => serializer.serialize_u64(n.get() as u64),
        }
    }
}

impl<'de> Deserialize<'de> for ThreadCount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(i64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => ThreadCount::try_from(n),
            Raw::Text(s) => s.parse(),
        }
        .map_err(serde::de::Error::custom)
    }
}

fn invalid_count(requested: &str) -> PoolError {
    PoolError::InvalidConfiguration(format!(
        "thread count must be \"auto\" or a positive integer, got `{requested}`"
    ))
}

/// Turn a requested thread count into a concrete positive worker count.
///
/// Pure: the caller supplies the hardware concurrency so the rule can be
/// checked deterministically.
pub fn resolve_thread_count(
    requested: ThreadCount,
    item_count: usize,
    hardware_threads: usize,
) -> usize {
    match requested {
        ThreadCount::Fixed(n) => n.get(),
        ThreadCount::Auto => {
            let hardware_threads = hardware_threads.max(1);
            let g = gcd(hardware_threads, item_count);
            // g > 0.75 * hardware_threads, compared in u128
            if g as u128 * 4 > hardware_threads as u128 * 3 {
                g
            } else {
                hardware_threads
            }
        }
    }
}

fn gcd(mut a: usize, mut b: usize) -> usize {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gcd() {
        assert_eq!(gcd(8, 12), 4);
        assert_eq!(gcd(8, 24), 8);
        assert_eq!(gcd(4, 20), 4);
        assert_eq!(gcd(7, 0), 7);
        assert_eq!(gcd(0, 5), 5);
    }

    #[test]
    fn test_auto_falls_back_to_hardware_threads() {
        // gcd = 4, threshold = 6
        assert_eq!(resolve_thread_count(ThreadCount::Auto, 12, 8), 8);
    }

    #[test]
    fn test_auto_uses_gcd_above_threshold() {
        // gcd = 8, threshold = 6
        assert_eq!(resolve_thread_count(ThreadCount::Auto, 24, 8), 8);
        // gcd = 4, threshold = 3
        assert_eq!(resolve_thread_count(ThreadCount::Auto, 20, 4), 4);
    }

    #[test]
    fn test_auto_with_no_items() {
        assert_eq!(resolve_thread_count(ThreadCount::Auto, 0, 6), 6);
    }

    #[test]
    fn test_auto_with_huge_hardware_override() {
        let huge = usize::MAX / 2;
        assert_eq!(resolve_thread_count(ThreadCount::Auto, 12, huge), huge);
        assert_eq!(resolve_thread_count(ThreadCount::Auto, 0, usize::MAX), usize::MAX);
        assert_eq!(resolve_thread_count(ThreadCount::Auto, 10, usize::MAX), usize::MAX);
    }

    #[test]
    fn test_fixed_ignores_hardware() {
        let requested = ThreadCount::fixed(5).unwrap();
        assert_eq!(resolve_thread_count(requested, 3, 64), 5);
    }

    #[test]
    fn test_invalid_counts_rejected() {
        assert!(matches!(
            ThreadCount::fixed(0),
            Err(PoolError::InvalidConfiguration(_))
        ));
        assert!(ThreadCount::try_from(0).is_err());
        assert!(ThreadCount::try_from(-2).is_err());
        assert!("many".parse::<ThreadCount>().is_err());
        assert!("1.5".parse::<ThreadCount>().is_err());
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!("auto".parse::<ThreadCount>().unwrap(), ThreadCount::Auto);
        assert_eq!("AUTO".parse::<ThreadCount>().unwrap(), ThreadCount::Auto);
        assert_eq!("-1".parse::<ThreadCount>().unwrap(), ThreadCount::Auto);
        assert_eq!(
            "12".parse::<ThreadCount>().unwrap(),
            ThreadCount::fixed(12).unwrap()
        );
        assert_eq!(ThreadCount::Auto.to_string(), "auto");
        assert_eq!(ThreadCount::fixed(3).unwrap().to_string(), "3");
    }

    #[test]
    fn test_serde_accepts_text_and_numbers() {
        let auto: ThreadCount = serde_json::from_str(r#""auto""#).unwrap();
        let fixed: ThreadCount = serde_json::from_str("4").unwrap();
        let legacy: ThreadCount = serde_json::from_str("-1").unwrap();

        assert_eq!(auto, ThreadCount::Auto);
        assert_eq!(fixed, ThreadCount::fixed(4).unwrap());
        assert_eq!(legacy, ThreadCount::Auto);
        assert!(serde_json::from_str::<ThreadCount>("0").is_err());
        assert_eq!(serde_json::to_string(&fixed).unwrap(), "4");
    }

    #[test]
    fn test_resolve_uses_host() {
        assert!(ThreadCount::Auto.resolve(10) >= 1);
    }
}
