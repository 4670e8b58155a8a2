//! A minimal arbitrary-precision decimal: an unscaled integer plus a
//! base-10 scale, matching the wire shape in the binary codec exactly
//! (no general-purpose decimal crate is pulled in since nothing beyond
//! this shape is needed).

use std::fmt;
use std::str::FromStr;

use num_bigint::BigInt;

/// `value == unscaled * 10^(-scale)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BigDecimal {
    pub unscaled: BigInt,
    pub scale: i32,
}

impl BigDecimal {
    pub fn new(unscaled: BigInt, scale: i32) -> Self {
        BigDecimal { unscaled, scale }
    }

    pub fn is_zero(&self) -> bool {
        self.unscaled == BigInt::from(0)
    }
}

impl fmt::Display for BigDecimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let negative = self.unscaled < BigInt::from(0);
        let digits = self.unscaled.magnitude().to_str_radix(10);
        if self.scale <= 0 {
            let zeros = "0".repeat((-self.scale) as usize);
            if negative {
                write!(f, "-")?;
            }
            write!(f, "{digits}{zeros}")
        } else {
            let scale = self.scale as usize;
            if negative {
                write!(f, "-")?;
            }
            if digits.len() <= scale {
                let pad = "0".repeat(scale - digits.len() + 1);
                write!(f, "0.{pad}{digits}")
            } else {
                let (whole, frac) = digits.split_at(digits.len() - scale);
                write!(f, "{whole}.{frac}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid decimal literal: {0}")]
pub struct ParseBigDecimalError(pub String);

impl FromStr for BigDecimal {
    type Err = ParseBigDecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (mantissa, exponent) = match s.split_once(['e', 'E']) {
            Some((m, e)) => (
                m,
                e.parse::<i32>()
                    .map_err(|_| ParseBigDecimalError(s.to_string()))?,
            ),
            None => (s, 0),
        };
        let (sign, rest) = match mantissa.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, mantissa.strip_prefix('+').unwrap_or(mantissa)),
        };
        let (int_part, frac_part) = match rest.split_once('.') {
            Some((a, b)) => (a, b),
            None => (rest, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(ParseBigDecimalError(s.to_string()));
        }
        if !int_part.bytes().all(|b| b.is_ascii_digit())
            || !frac_part.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(ParseBigDecimalError(s.to_string()));
        }
        let digits = format!("{int_part}{frac_part}");
        let digits = if digits.is_empty() { "0" } else { &digits };
        let mut unscaled =
            BigInt::from_str(digits).map_err(|_| ParseBigDecimalError(s.to_string()))?;
        if sign {
            unscaled = -unscaled;
        }
        let scale = frac_part.len() as i32 - exponent;
        Ok(BigDecimal { unscaled, scale })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_and_parses() {
        let d: BigDecimal = "123.45".parse().unwrap();
        assert_eq!(d.to_string(), "123.45");
        let d: BigDecimal = "-0.5".parse().unwrap();
        assert_eq!(d.to_string(), "-0.5");
        let d = BigDecimal::new(BigInt::from(5), -2);
        assert_eq!(d.to_string(), "500");
    }
}
