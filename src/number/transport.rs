use std::{fmt, str::FromStr};

use serde::{
    de::{self, Visitor},
    Deserialize, Deserializer, Serialize, Serializer,
};

use super::{NumberError, ScaledNumber};

const SEPARATOR: char = '|';

impl ScaledNumber {
    /// Lossless `"<mantissa>|<exponent>"` form used for persistence.
    ///
    /// The mantissa uses the shortest decimal text that parses back to the
    /// identical `f64`.
    pub fn to_transport_string(&self) -> String {
        format!("{}{}{}", self.mantissa, SEPARATOR, self.exponent)
    }

    /// Parses a transport string, falling back to [`ScaledNumber::ZERO`] on
    /// empty or malformed input.
    pub fn from_transport_string(raw: &str) -> Self {
        raw.parse().unwrap_or(Self::ZERO)
    }
}

impl FromStr for ScaledNumber {
    type Err = NumberError;

    /// Strict counterpart of [`ScaledNumber::from_transport_string`].
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let malformed = || NumberError::Malformed(raw.to_string());
        let mut parts = raw.split(SEPARATOR);
        let (Some(mantissa), Some(exponent), None) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(malformed());
        };
        let mantissa: f64 = mantissa
            .trim()
            .replace(',', "")
            .parse()
            .map_err(|_| malformed())?;
        let exponent: i64 = exponent.trim().parse().map_err(|_| malformed())?;
        Self::try_new(mantissa, exponent).map_err(|_| malformed())
    }
}

impl Serialize for ScaledNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_transport_string())
    }
}

impl<'de> Deserialize<'de> for ScaledNumber {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ScaledNumberVisitor)
    }
}

/// Accepts transport strings as well as plain JSON numbers.
struct ScaledNumberVisitor;

impl<'de> Visitor<'de> for ScaledNumberVisitor {
    type Value = ScaledNumber;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a `mantissa|exponent` string or a finite number")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<ScaledNumber, E> {
        value.parse().map_err(E::custom)
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<ScaledNumber, E> {
        ScaledNumber::from_raw(value).map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<ScaledNumber, E> {
        Ok(ScaledNumber::from(value))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<ScaledNumber, E> {
        Ok(ScaledNumber::from(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_string_is_pipe_delimited() {
        assert_eq!(ScaledNumber::new(1.5, 2).to_transport_string(), "1.5|2");
        assert_eq!(ScaledNumber::new(1.0, 30).to_transport_string(), "1|30");
        assert_eq!(ScaledNumber::ZERO.to_transport_string(), "0|0");
        assert_eq!(ScaledNumber::new(-7.25, -3).to_transport_string(), "-7.25|-3");
    }

    #[test]
    fn transport_round_trip_is_exact() {
        let samples = [
            ScaledNumber::from_raw(std::f64::consts::PI * 1e40).unwrap(),
            ScaledNumber::from_raw(1.0 / 3.0).unwrap(),
            ScaledNumber::new(999.999_999_999, 12_345),
            ScaledNumber::new(-1.000_000_000_1, -7),
        ];
        for value in samples {
            let decoded = ScaledNumber::from_transport_string(&value.to_transport_string());
            assert_eq!(decoded.mantissa().to_bits(), value.mantissa().to_bits());
            assert_eq!(decoded.exponent(), value.exponent());
        }
    }

    #[test]
    fn malformed_transport_falls_back_to_zero() {
        for raw in ["", "12", "abc|3", "1.5|x", "1|2|3", "NaN|0", "inf|1"] {
            assert_eq!(ScaledNumber::from_transport_string(raw), ScaledNumber::ZERO, "{raw}");
            assert!(raw.parse::<ScaledNumber>().is_err(), "{raw}");
        }
    }

    #[test]
    fn parsing_tolerates_grouping_and_renormalizes() {
        assert_eq!(
            ScaledNumber::from_transport_string("1,500|0"),
            ScaledNumber::new(1.5, 1)
        );
        assert_eq!(
            ScaledNumber::from_transport_string(" 2.5 | 3 "),
            ScaledNumber::new(2.5, 3)
        );
    }

    #[test]
    fn serde_accepts_strings_and_numbers() {
        let from_text: ScaledNumber = serde_json::from_str("\"4.5|6\"").unwrap();
        assert_eq!(from_text, ScaledNumber::new(4.5, 6));
        let from_int: ScaledNumber = serde_json::from_str("2500").unwrap();
        assert_eq!(from_int, ScaledNumber::new(2.5, 1));
        let from_float: ScaledNumber = serde_json::from_str("0.5").unwrap();
        assert_eq!(from_float, ScaledNumber::new(500.0, -1));
        assert_eq!(
            serde_json::to_string(&ScaledNumber::new(3.0, 1)).unwrap(),
            "\"3|1\""
        );
        assert!(serde_json::from_str::<ScaledNumber>("\"oops\"").is_err());
    }
}
