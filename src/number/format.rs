use std::fmt;

use super::ScaledNumber;

const SHORT_SUFFIXES: [&str; 5] = ["", "K", "M", "B", "T"];
const ALPHABET_LEN: i64 = 26;

impl ScaledNumber {
    /// Human-readable rendering with a magnitude suffix.
    ///
    /// Values below one thousand are printed in full with digit grouping;
    /// larger values print the mantissa followed by `K`, `M`, `B`, `T`, then
    /// `aa`, `ab`, … for every further power of one thousand.
    pub fn format_compact(&self, decimals: usize) -> String {
        if self.is_zero() {
            return "0".to_string();
        }
        if self.exponent < 1 {
            return format_grouped(self.to_f64(), decimals);
        }
        format!(
            "{:.*}{}",
            decimals,
            self.mantissa,
            magnitude_suffix(self.exponent)
        )
    }
}

impl fmt::Display for ScaledNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_compact(f.precision().unwrap_or(2)))
    }
}

/// Suffix for a thousands exponent: `""`, `K`, `M`, `B`, `T`, then a base-26
/// lowercase sequence of at least two letters starting at `aa`.
pub fn magnitude_suffix(exponent: i64) -> String {
    if exponent < 0 {
        return String::new();
    }
    if let Some(label) = usize::try_from(exponent)
        .ok()
        .and_then(|idx| SHORT_SUFFIXES.get(idx))
    {
        return (*label).to_string();
    }
    let mut index = exponent - SHORT_SUFFIXES.len() as i64;
    let mut letters = Vec::new();
    loop {
        letters.push(char::from(b'a' + (index % ALPHABET_LEN) as u8));
        index /= ALPHABET_LEN;
        if letters.len() >= 2 && index == 0 {
            break;
        }
    }
    letters.into_iter().rev().collect()
}

/// Fixed-point rendering with `,` thousands grouping.
pub fn format_grouped(value: f64, decimals: usize) -> String {
    let body = format!("{:.*}", decimals, value);
    match body.find('.') {
        Some(pos) => format!("{}{}", group_integer(&body[..pos]), &body[pos..]),
        None => group_integer(&body),
    }
}

fn group_integer(int_part: &str) -> String {
    match int_part.strip_prefix('-') {
        Some(digits) => format!("-{}", group_digits(digits)),
        None => group_digits(int_part),
    }
}

fn group_digits(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (count, ch) in digits.chars().rev().enumerate() {
        if count != 0 && count % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped.chars().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_suffixes_cover_first_magnitudes() {
        assert_eq!(ScaledNumber::new(1.5, 1).format_compact(2), "1.50K");
        assert_eq!(ScaledNumber::new(12.0, 2).format_compact(1), "12.0M");
        assert_eq!(ScaledNumber::new(3.25, 4).format_compact(2), "3.25T");
    }

    #[test]
    fn alphabetic_suffixes_follow_the_table() {
        assert_eq!(ScaledNumber::new(1.0, 5).format_compact(0), "1aa");
        assert_eq!(magnitude_suffix(5 + 25), "az");
        assert_eq!(magnitude_suffix(5 + 26), "ba");
        assert_eq!(magnitude_suffix(5 + 26 * 26), "baa");
    }

    #[test]
    fn small_values_render_in_full() {
        assert_eq!(ScaledNumber::new(999.5, 0).format_compact(2), "999.50");
        assert_eq!(ScaledNumber::new(250.0, -1).format_compact(3), "0.250");
        assert_eq!(ScaledNumber::ZERO.format_compact(2), "0");
        assert_eq!(ScaledNumber::new(-42.0, 0).format_compact(0), "-42");
    }

    #[test]
    fn grouping_inserts_separators() {
        assert_eq!(format_grouped(1_234_567.891, 2), "1,234,567.89");
        assert_eq!(format_grouped(-1000.0, 0), "-1,000");
        assert_eq!(format_grouped(12.0, 1), "12.0");
    }

    #[test]
    fn display_honours_precision() {
        let value = ScaledNumber::new(7.126, 2);
        assert_eq!(value.to_string(), "7.13M");
        assert_eq!(format!("{value:.1}"), "7.1M");
    }
}
