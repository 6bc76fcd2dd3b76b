//! Local value normalization applied after the oracle accepts an answer.
//!
//! The oracle is asked to normalize too; these rules make the result
//! deterministic. A rule that cannot interpret a value returns `None` and the
//! oracle's value is kept as-is.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};

use super::schema::Normalizer;

/// A whole value that is one amount: optional currency marks, an optional
/// magnitude word, nothing else.
static AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ix)^
        (?:usd\s*)?
        (?P<neg>-)?\s*\$?\s*(?P<neg2>-)?
        (?P<amount>\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?|\.\d+)
        \s*(?P<scale>k|thousand|mm|m|million|bn|b|billion)?
        \s*(?:usd|dollars?|bucks)?
        $",
    )
    .expect("valid amount regex")
});

const AFFIRMATIVE: &[&str] = &[
    "yes", "y", "yeah", "yep", "yup", "sure", "true", "correct", "affirmative", "ok", "okay", "did",
];

const NEGATIVE: &[&str] = &[
    "no", "n", "nope", "nah", "false", "never", "not", "none", "didn", "haven", "hasn", "don",
];

/// Opening words that settle the answer on their own.
const LEADING_YES: &[&str] = &[
    "yes", "y", "yeah", "yep", "yup", "sure", "true", "correct", "affirmative", "ok", "okay",
];

const LEADING_NO: &[&str] = &["no", "n", "nope", "nah", "false", "never"];

impl Normalizer {
    /// Normalize a non-empty value. Returns `None` when the rule does not
    /// apply to this input.
    pub fn apply(&self, value: &str) -> Option<String> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        match self {
            Self::None => None,
            Self::Currency2dp => currency_2dp(value),
            Self::SsnDigitsOnly => ssn_digits(value),
            Self::BoolYesNo => yes_no(value),
        }
    }

    /// Normalize, falling back to the trimmed input.
    pub fn normalize(&self, value: &str) -> String {
        self.apply(value).unwrap_or_else(|| value.trim().to_string())
    }
}

/// `300` → `300.00`, `$1,234.5` → `1234.50`, `$72k` → `72000.00`.
///
/// Anything besides a single amount (`12,5`, `about 300`, `100-200`) is left
/// to the oracle.
fn currency_2dp(value: &str) -> Option<String> {
    let caps = AMOUNT.captures(value)?;
    let digits = caps["amount"].replace(',', "");
    let digits = if digits.starts_with('.') {
        format!("0{digits}")
    } else {
        digits
    };
    let mut amount = Decimal::from_str(&digits).ok()?;

    if let Some(scale) = caps.name("scale") {
        let factor: u64 = match scale.as_str().to_ascii_lowercase().as_str() {
            "k" | "thousand" => 1_000,
            "m" | "mm" | "million" => 1_000_000,
            _ => 1_000_000_000,
        };
        amount = amount.checked_mul(Decimal::from(factor))?;
    }
    if caps.name("neg").is_some() || caps.name("neg2").is_some() {
        amount.set_sign_negative(true);
    }

    let mut amount = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    amount.rescale(2);
    Some(amount.to_string())
}

/// Nine digits in any layout: `123-45-6789`, `123 45 6789`, `123456789`.
fn ssn_digits(value: &str) -> Option<String> {
    let digits: String = value.chars().filter(|c| c.is_ascii_digit()).collect();
    (digits.len() == 9).then_some(digits)
}

/// An opening yes/no word decides (`Sure, why not` is a yes). Otherwise the
/// answer must lean one way only; mixed signals are left to the oracle.
fn yes_no(value: &str) -> Option<String> {
    let lowered = value.to_lowercase();
    let words: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    let verdict = |yes: bool| Some(if yes { "Yes" } else { "No" }.to_string());

    match words.first() {
        Some(first) if LEADING_YES.contains(first) => return verdict(true),
        Some(first) if LEADING_NO.contains(first) => return verdict(false),
        _ => {}
    }

    let negative = words.iter().any(|w| NEGATIVE.contains(w));
    let affirmative = words.iter().any(|w| AFFIRMATIVE.contains(w));
    match (affirmative, negative) {
        (true, false) => verdict(true),
        (false, true) => verdict(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn currency_pads_whole_numbers() {
        assert_eq!(Normalizer::Currency2dp.apply("300").as_deref(), Some("300.00"));
        assert_eq!(Normalizer::Currency2dp.apply("0").as_deref(), Some("0.00"));
    }

    #[test]
    fn currency_strips_symbols_and_separators() {
        assert_eq!(Normalizer::Currency2dp.apply("$1,234.5").as_deref(), Some("1234.50"));
        assert_eq!(Normalizer::Currency2dp.apply("72,500 dollars").as_deref(), Some("72500.00"));
        assert_eq!(Normalizer::Currency2dp.apply("USD 1,200").as_deref(), Some("1200.00"));
        assert_eq!(Normalizer::Currency2dp.apply("-$42").as_deref(), Some("-42.00"));
    }

    #[test]
    fn currency_scales_magnitude_words() {
        assert_eq!(Normalizer::Currency2dp.apply("$72k").as_deref(), Some("72000.00"));
        assert_eq!(Normalizer::Currency2dp.apply("1.5 million").as_deref(), Some("1500000.00"));
        assert_eq!(Normalizer::Currency2dp.apply("2.25M").as_deref(), Some("2250000.00"));
        assert_eq!(Normalizer::Currency2dp.apply("3 thousand dollars").as_deref(), Some("3000.00"));
    }

    #[test]
    fn currency_leaves_ambiguous_amounts_alone() {
        assert!(Normalizer::Currency2dp.apply("12,5").is_none());
        assert_eq!(Normalizer::Currency2dp.normalize("12,5"), "12,5");
        assert!(Normalizer::Currency2dp.apply("about 72,500 dollars").is_none());
        assert!(Normalizer::Currency2dp.apply("100-200").is_none());
        assert!(Normalizer::Currency2dp.apply("$72 and some change").is_none());
    }

    #[test]
    fn currency_rounds_to_cents() {
        assert_eq!(Normalizer::Currency2dp.apply("19.999").as_deref(), Some("20.00"));
        assert_eq!(Normalizer::Currency2dp.apply("10.005").as_deref(), Some("10.01"));
        assert_eq!(Normalizer::Currency2dp.apply("-42").as_deref(), Some("-42.00"));
    }

    #[test]
    fn currency_output_is_exact_decimal() {
        let out = Normalizer::Currency2dp.normalize("$13,850");
        assert_eq!(Decimal::from_str(&out).unwrap(), dec!(13850.00));
        assert_eq!(Decimal::from_str(&out).unwrap().scale(), 2);
    }

    #[test]
    fn currency_without_digits_is_not_applied() {
        assert!(Normalizer::Currency2dp.apply("a lot").is_none());
        assert_eq!(Normalizer::Currency2dp.normalize(" a lot "), "a lot");
    }

    #[test]
    fn ssn_accepts_any_separator_layout() {
        for input in ["123-45-6789", "123 45 6789", "123456789", "ssn is 123.45.6789"] {
            assert_eq!(
                Normalizer::SsnDigitsOnly.apply(input).as_deref(),
                Some("123456789"),
                "input {input:?}"
            );
        }
    }

    #[test]
    fn ssn_wrong_length_is_not_applied() {
        assert!(Normalizer::SsnDigitsOnly.apply("12345").is_none());
        assert_eq!(Normalizer::SsnDigitsOnly.normalize("12345"), "12345");
    }

    #[test]
    fn yes_no_reads_conversational_answers() {
        assert_eq!(Normalizer::BoolYesNo.apply("yes, sure").as_deref(), Some("Yes"));
        assert_eq!(Normalizer::BoolYesNo.apply("YEP").as_deref(), Some("Yes"));
        assert_eq!(Normalizer::BoolYesNo.apply("No, I didn't").as_deref(), Some("No"));
        assert_eq!(Normalizer::BoolYesNo.apply("nope").as_deref(), Some("No"));
        assert_eq!(Normalizer::BoolYesNo.apply("I didn't").as_deref(), Some("No"));
        assert_eq!(Normalizer::BoolYesNo.apply("I did").as_deref(), Some("Yes"));
    }

    #[test]
    fn yes_no_opening_word_wins_over_later_negation() {
        for input in ["Sure, why not", "Yes, no problem", "Yes, I don't mind"] {
            assert_eq!(Normalizer::BoolYesNo.apply(input).as_deref(), Some("Yes"), "input {input:?}");
        }
        assert_eq!(Normalizer::BoolYesNo.apply("No, not this year").as_deref(), Some("No"));
    }

    #[test]
    fn yes_no_mixed_signals_are_not_applied() {
        assert!(Normalizer::BoolYesNo.apply("I did not").is_none());
        assert_eq!(Normalizer::BoolYesNo.normalize("I did not"), "I did not");
    }

    #[test]
    fn yes_no_unclear_is_not_applied() {
        assert!(Normalizer::BoolYesNo.apply("bitcoin").is_none());
    }

    #[test]
    fn none_and_empty_never_apply() {
        assert!(Normalizer::None.apply("Single").is_none());
        assert_eq!(Normalizer::None.normalize(" Single "), "Single");
        assert!(Normalizer::Currency2dp.apply("   ").is_none());
        assert_eq!(Normalizer::Currency2dp.normalize(""), "");
    }
}
