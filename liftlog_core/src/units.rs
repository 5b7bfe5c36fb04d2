//! Mass units and conversions.
//!
//! Kilograms are the canonical unit: weights are stored in kg and converted
//! to the display unit only at the edges (input parsing, output formatting).

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Pounds per kilogram
pub const LB_PER_KG: f64 = 2.2046226218;

/// Display unit for all user-facing weights
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    #[default]
    Kg,
    Lb,
}

impl Unit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Kg => "kg",
            Unit::Lb => "lb",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Unit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "kg" | "kgs" | "kilograms" => Ok(Unit::Kg),
            "lb" | "lbs" | "pounds" => Ok(Unit::Lb),
            other => Err(Error::Validation(format!("unknown unit '{}'", other))),
        }
    }
}

pub fn kg_to_lb(kg: f64) -> f64 {
    kg * LB_PER_KG
}

pub fn lb_to_kg(lb: f64) -> f64 {
    lb / LB_PER_KG
}

/// Convert a value expressed in `unit` to kilograms
pub fn to_kg(value: f64, unit: Unit) -> f64 {
    match unit {
        Unit::Kg => value,
        Unit::Lb => lb_to_kg(value),
    }
}

/// Convert kilograms to `unit`
pub fn from_kg(kg: f64, unit: Unit) -> f64 {
    match unit {
        Unit::Kg => kg,
        Unit::Lb => kg_to_lb(kg),
    }
}

/// Round to one decimal place, half away from zero.
///
/// Presentation only; computations keep the unrounded value. Values that
/// round to zero come back as `0.0`, never `-0.0`.
pub fn round1(value: f64) -> f64 {
    let rounded = (value * 10.0).round() / 10.0;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Format a display-unit value with one decimal, e.g. `"116.7 kg"`
pub fn format_weight(value: f64, unit: Unit) -> String {
    format!("{:.1} {}", round1(value), unit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kg_lb_roundtrip() {
        for kg in [0.0, 1.0, 20.0, 102.5, 333.3] {
            let back = lb_to_kg(kg_to_lb(kg));
            assert!((back - kg).abs() < 1e-9, "{} -> {}", kg, back);
        }
    }

    #[test]
    fn test_known_conversion() {
        assert!((kg_to_lb(100.0) - 220.46226218).abs() < 1e-9);
        assert!((to_kg(220.46226218, Unit::Lb) - 100.0).abs() < 1e-9);
        assert_eq!(to_kg(80.0, Unit::Kg), 80.0);
        assert_eq!(from_kg(80.0, Unit::Kg), 80.0);
    }

    #[test]
    fn test_round1_half_away_from_zero() {
        assert_eq!(round1(116.666), 116.7);
        assert_eq!(round1(0.25), 0.3);
        assert_eq!(round1(-0.25), -0.3);
        assert_eq!(round1(10.0), 10.0);
    }

    #[test]
    fn test_round1_drops_negative_zero() {
        assert!(round1(-0.04).is_sign_positive());
        assert!(round1(-0.0).is_sign_positive());
        assert_eq!(format!("{:.1}", round1(-0.04)), "0.0");
    }

    #[test]
    fn test_parse_unit() {
        assert_eq!("kg".parse::<Unit>().unwrap(), Unit::Kg);
        assert_eq!("LB".parse::<Unit>().unwrap(), Unit::Lb);
        assert_eq!(" lbs ".parse::<Unit>().unwrap(), Unit::Lb);
        assert!("stone".parse::<Unit>().is_err());
    }

    #[test]
    fn test_unit_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Unit::Lb).unwrap(), "\"lb\"");
        let unit: Unit = serde_json::from_str("\"kg\"").unwrap();
        assert_eq!(unit, Unit::Kg);
    }

    #[test]
    fn test_format_weight() {
        assert_eq!(format_weight(100.0, Unit::Kg), "100.0 kg");
        assert_eq!(format_weight(from_kg(100.0, Unit::Lb), Unit::Lb), "220.5 lb");
        assert_eq!(format_weight(-0.04, Unit::Kg), "0.0 kg");
    }
}
