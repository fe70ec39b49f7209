use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Which records a flush writes out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersistMode {
    /// Only the records added since the last successful flush. The file
    /// then holds just that batch, so a restart recovers the last batch only.
    #[default]
    Suffix,
    /// The whole log on every flush.
    Cumulative,
}

impl PersistMode {
    /// Index range of the log to write, given the current watermark and log
    /// length. Empty when nothing new has been appended since the last flush,
    /// regardless of mode.
    pub fn range(self, watermark: usize, len: usize) -> Range<usize> {
        let watermark = watermark.min(len);
        if watermark == len {
            return len..len;
        }
        match self {
            PersistMode::Suffix => watermark..len,
            PersistMode::Cumulative => 0..len,
        }
    }
}

impl fmt::Display for PersistMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistMode::Suffix => write!(f, "suffix"),
            PersistMode::Cumulative => write!(f, "cumulative"),
        }
    }
}

impl FromStr for PersistMode {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "suffix" => Ok(PersistMode::Suffix),
            "cumulative" => Ok(PersistMode::Cumulative),
            other => Err(StoreError::UnknownMode(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffix_range() {
        assert_eq!(PersistMode::Suffix.range(3, 5), 3..5);
        assert_eq!(PersistMode::Suffix.range(0, 2), 0..2);
    }

    #[test]
    fn test_cumulative_range() {
        assert_eq!(PersistMode::Cumulative.range(3, 5), 0..5);
    }

    #[test]
    fn test_nothing_new_is_empty_in_both_modes() {
        assert!(PersistMode::Suffix.range(4, 4).is_empty());
        assert!(PersistMode::Cumulative.range(4, 4).is_empty());
        assert!(PersistMode::Cumulative.range(0, 0).is_empty());
    }

    #[test]
    fn test_parse_mode() {
        assert_eq!("suffix".parse::<PersistMode>().unwrap(), PersistMode::Suffix);
        assert_eq!(" Cumulative ".parse::<PersistMode>().unwrap(), PersistMode::Cumulative);
        assert!("append".parse::<PersistMode>().is_err());
    }
}
