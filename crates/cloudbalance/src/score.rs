use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Two-level score: any hard improvement outweighs every soft one.
///
/// Field order gives the derived `Ord` its hard-first comparison. Higher
/// is better; a feasible solution has `hard == 0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct HardSoftScore {
    pub hard: i64,
    pub soft: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid hard/soft score '{0}', expected e.g. '-8hard/-1soft'")]
pub struct ScoreParseError(String);

impl HardSoftScore {
    pub const ZERO: HardSoftScore = HardSoftScore { hard: 0, soft: 0 };

    pub const fn of(hard: i64, soft: i64) -> Self {
        Self { hard, soft }
    }

    pub fn is_feasible(&self) -> bool {
        self.hard >= 0
    }
}

impl fmt::Display for HardSoftScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}hard/{}soft", self.hard, self.soft)
    }
}

impl FromStr for HardSoftScore {
    type Err = ScoreParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ScoreParseError(s.to_string());
        let (hard, soft) = s.trim().split_once('/').ok_or_else(err)?;
        let hard = hard.strip_suffix("hard").ok_or_else(err)?;
        let soft = soft.strip_suffix("soft").ok_or_else(err)?;
        Ok(Self {
            hard: hard.parse().map_err(|_| err())?,
            soft: soft.parse().map_err(|_| err())?,
        })
    }
}

impl From<HardSoftScore> for String {
    fn from(score: HardSoftScore) -> String {
        score.to_string()
    }
}

impl TryFrom<String> for HardSoftScore {
    type Error = ScoreParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl Add for HardSoftScore {
    type Output = HardSoftScore;

    fn add(self, rhs: Self) -> Self {
        Self::of(self.hard + rhs.hard, self.soft + rhs.soft)
    }
}

impl Sub for HardSoftScore {
    type Output = HardSoftScore;

    fn sub(self, rhs: Self) -> Self {
        Self::of(self.hard - rhs.hard, self.soft - rhs.soft)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hard_outweighs_soft() {
        assert!(HardSoftScore::of(0, -1000) > HardSoftScore::of(-1, 0));
        assert!(HardSoftScore::of(-1, -1) > HardSoftScore::of(-1, -2));
        assert_eq!(HardSoftScore::default(), HardSoftScore::ZERO);
    }

    #[test]
    fn test_display_and_parse() {
        let score = HardSoftScore::of(-8, -1);
        assert_eq!(score.to_string(), "-8hard/-1soft");
        assert_eq!("-8hard/-1soft".parse::<HardSoftScore>().unwrap(), score);
        assert_eq!(" 0hard/12soft ".parse::<HardSoftScore>().unwrap(), HardSoftScore::of(0, 12));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in ["", "-8hard", "-8/-1", "xhard/1soft", "1hard/ysoft", "1soft/1hard"] {
            assert!(bad.parse::<HardSoftScore>().is_err(), "{bad}");
        }
    }

    #[test]
    fn test_arithmetic() {
        let a = HardSoftScore::of(-3, -10);
        let b = HardSoftScore::of(-5, 4);
        assert_eq!(a + b, HardSoftScore::of(-8, -6));
        assert_eq!(a - b, HardSoftScore::of(2, -14));
        assert_eq!(a + b - b, a);
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&HardSoftScore::of(-8, -1)).unwrap();
        assert_eq!(json, "\"-8hard/-1soft\"");
        let back: HardSoftScore = serde_json::from_str(&json).unwrap();
        assert_eq!(back, HardSoftScore::of(-8, -1));
        assert!(serde_json::from_str::<HardSoftScore>("\"nope\"").is_err());
    }

    #[test]
    fn test_feasibility() {
        assert!(HardSoftScore::of(0, -50).is_feasible());
        assert!(!HardSoftScore::of(-1, 0).is_feasible());
    }
}
