//! Anchored line parsers for the supported statement layouts.
//!
//! Layouts (after normalization, logical order):
//!   DualColumn:                 ₪ 120.00 $ 32.50 רגילה AMAZON MKTPLACE 02/03/2024
//!   SingleColumn:               15/03/2024 NETFLIX.COM ₪ 45.90
//!   SingleColumnTrailingSymbol: 15/03/2024 שופרסל דיל 212.40 ₪
//!
//! Each line is tried against the layouts in `Dialect::PRIORITY` order and the
//! first full match wins.

use std::str::FromStr;

use anyhow::Result;
use regex::{Captures, Regex};
use rust_decimal::Decimal;
use whatif_core::script::is_latin_dominant;
use whatif_core::{Currency, Dialect, Money, Transaction};

use crate::date::DateNormalizer;
use crate::types::LineError;

pub(crate) const CURRENCY: &str = r"[₪$€£]";
pub(crate) const AMOUNT: &str = r"\d[\d,]*(?:\.\d+)?";
pub(crate) const DATE: &str = r"\d{4}[./-]\d{1,2}[./-]\d{1,2}|\d{1,2}[./-]\d{1,2}[./-](?:\d{4}|\d{2})";

pub struct TransactionParser {
    patterns: Vec<(Dialect, Regex)>,
    money_re: Regex,
    dates: DateNormalizer,
    default_currency: Currency,
}

impl TransactionParser {
    /// `transaction_types` are the optional type-column tokens of dual-column statements.
    pub fn new(
        transaction_types: &[String],
        dates: DateNormalizer,
        default_currency: Currency,
    ) -> Result<Self> {
        let money = format!(r"{CURRENCY}\s?{AMOUNT}|{AMOUNT}\s?{CURRENCY}|{AMOUNT}");

        let mut types: Vec<&str> = transaction_types
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect();
        // Longest first so "הוראת קבע" is not cut short by a shorter token.
        types.sort_by_key(|t| std::cmp::Reverse(t.chars().count()));
        let kind = if types.is_empty() {
            String::new()
        } else {
            let alts: Vec<String> = types.iter().map(|t| regex::escape(t)).collect();
            format!(r"(?:(?P<kind>{})\s+)?", alts.join("|"))
        };

        let mut patterns = Vec::new();
        for dialect in Dialect::PRIORITY {
            let pattern = match dialect {
                Dialect::DualColumn => format!(
                    r"^(?P<charged>{money})\s+(?P<original>{money})\s+{kind}(?P<desc>.+?)\s+(?P<date>{DATE})$"
                ),
                Dialect::SingleColumn => format!(
                    r"^(?P<date>{DATE})\s+(?P<desc>.+?)\s+(?P<cur>{CURRENCY})\s?(?P<amount>{AMOUNT})$"
                ),
                Dialect::SingleColumnTrailingSymbol => format!(
                    r"^(?P<date>{DATE})\s+(?P<desc>.+?)\s+(?P<amount>{AMOUNT})\s?(?P<cur>{CURRENCY})$"
                ),
            };
            patterns.push((dialect, Regex::new(&pattern)?));
        }

        Ok(Self {
            patterns,
            money_re: Regex::new(&format!(r"^(?P<cur>{CURRENCY})?\s?(?P<amount>{AMOUNT})\s?(?P<cur_after>{CURRENCY})?$"))?,
            dates,
            default_currency,
        })
    }

    /// Parse one transaction-candidate line.
    pub fn parse_line(&self, line: &str, page: usize) -> Result<Transaction, LineError> {
        let (dialect, caps) = self
            .patterns
            .iter()
            .find_map(|(dialect, re)| re.captures(line).map(|caps| (*dialect, caps)))
            .ok_or(LineError::NoShape)?;

        let date = self.dates.normalize(&caps["date"])?;

        // A repeated symbol column ("₪ 45.90 ₪") must not leak into the merchant.
        let merchant_text = caps["desc"]
            .trim_matches(|c: char| c.is_whitespace() || Currency::is_symbol(c))
            .to_string();
        if merchant_text.is_empty() {
            return Err(LineError::EmptyMerchant);
        }

        let (charged, original) = match dialect {
            Dialect::DualColumn => {
                let charged = self.parse_money(&caps["charged"], None)?;
                let original = self.parse_money(&caps["original"], Some(charged.currency))?;
                (charged, Some(original))
            }
            Dialect::SingleColumn | Dialect::SingleColumnTrailingSymbol => {
                (self.symbol_and_amount(&caps)?, None)
            }
        };

        Ok(Transaction {
            date: date.date,
            has_latin_script: is_latin_dominant(&merchant_text),
            merchant_text,
            amount: charged.amount,
            currency: charged.currency,
            original,
            kind: caps.name("kind").map(|m| m.as_str().to_string()),
            dialect,
            page,
            date_ambiguous: date.ambiguous,
        })
    }

    fn symbol_and_amount(&self, caps: &Captures<'_>) -> Result<Money, LineError> {
        let currency = caps["cur"]
            .chars()
            .next()
            .and_then(Currency::from_symbol)
            .unwrap_or(self.default_currency);
        Ok(Money::new(parse_amount(&caps["amount"])?, currency))
    }

    /// A money token carries its symbol before or after the number, or none at all.
    fn parse_money(&self, token: &str, fallback: Option<Currency>) -> Result<Money, LineError> {
        let caps = self
            .money_re
            .captures(token.trim())
            .ok_or_else(|| LineError::BadAmount(token.to_string()))?;
        let currency = caps
            .name("cur")
            .or_else(|| caps.name("cur_after"))
            .and_then(|m| m.as_str().chars().next())
            .and_then(Currency::from_symbol)
            .or(fallback)
            .unwrap_or(self.default_currency);
        Ok(Money::new(parse_amount(&caps["amount"])?, currency))
    }
}

/// Strip "," grouping separators and parse a non-negative decimal.
///
/// "," is always a grouping separator, so "12,34" parses as 1234.
pub fn parse_amount(raw: &str) -> Result<Decimal, LineError> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    let amount =
        Decimal::from_str(&cleaned).map_err(|_| LineError::BadAmount(raw.to_string()))?;
    if amount.is_sign_negative() {
        return Err(LineError::BadAmount(raw.to_string()));
    }
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn parser() -> TransactionParser {
        let types = vec!["רגילה".to_string(), "תשלומים".to_string(), "הוראת קבע".to_string()];
        TransactionParser::new(&types, DateNormalizer::default(), Currency::Ils).unwrap()
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1,234.56").unwrap(), dec!(1234.56));
        assert_eq!(parse_amount("1234").unwrap(), dec!(1234));
        assert_eq!(parse_amount("12,34").unwrap(), dec!(1234));
        assert!(matches!(parse_amount("-5.00"), Err(LineError::BadAmount(_))));
        assert!(matches!(parse_amount("abc"), Err(LineError::BadAmount(_))));
        assert!(matches!(parse_amount(""), Err(LineError::BadAmount(_))));
    }

    #[test]
    fn test_single_column_line() {
        let t = parser().parse_line("15/03/2024 NETFLIX.COM ₪ 45.90", 0).unwrap();
        assert_eq!(t.dialect, Dialect::SingleColumn);
        assert_eq!(t.date, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        assert_eq!(t.merchant_text, "NETFLIX.COM");
        assert_eq!(t.amount, dec!(45.90));
        assert_eq!(t.currency, Currency::Ils);
        assert!(t.has_latin_script);
        assert_eq!(t.original, None);
    }

    #[test]
    fn test_trailing_symbol_line() {
        let t = parser().parse_line("01/04/2024 שופרסל דיל 1,212.40 ₪", 2).unwrap();
        assert_eq!(t.dialect, Dialect::SingleColumnTrailingSymbol);
        assert_eq!(t.merchant_text, "שופרסל דיל");
        assert_eq!(t.amount, dec!(1212.40));
        assert!(!t.has_latin_script);
        assert_eq!(t.page, 2);
    }

    #[test]
    fn test_dual_column_line_with_type() {
        let t = parser()
            .parse_line("₪ 120.00 $ 32.50 רגילה AMAZON MKTPLACE 02/03/2024", 0)
            .unwrap();
        assert_eq!(t.dialect, Dialect::DualColumn);
        assert_eq!(t.merchant_text, "AMAZON MKTPLACE");
        assert_eq!(t.amount, dec!(120.00));
        assert_eq!(t.currency, Currency::Ils);
        assert_eq!(t.original, Some(Money::new(dec!(32.50), Currency::Usd)));
        assert_eq!(t.kind.as_deref(), Some("רגילה"));
        assert_eq!(t.date, NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
    }

    #[test]
    fn test_dual_column_multiword_type_and_bare_amounts() {
        let t = parser()
            .parse_line("19.90 19.90 $ הוראת קבע SPOTIFY 10-01-24", 0)
            .unwrap();
        assert_eq!(t.kind.as_deref(), Some("הוראת קבע"));
        assert_eq!(t.merchant_text, "SPOTIFY");
        // Bare charged amount takes the statement default
        assert_eq!(t.currency, Currency::Ils);
        assert_eq!(t.original.unwrap().currency, Currency::Usd);
        assert_eq!(t.date, NaiveDate::from_ymd_opt(2024, 1, 10).unwrap());
    }

    #[test]
    fn test_date_and_amount_only_is_no_shape() {
        // No description between date and amount
        assert_eq!(parser().parse_line("15/03/2024 ₪ 45.90", 0), Err(LineError::NoShape));
    }

    #[test]
    fn test_blank_description_is_empty_merchant() {
        let p = parser();
        assert_eq!(p.parse_line("15/03/2024 \t ₪ 45.90", 0), Err(LineError::EmptyMerchant));
        // A description made only of a stray symbol is empty too
        assert_eq!(p.parse_line("15/03/2024 ₪ ₪ 45.90", 0), Err(LineError::EmptyMerchant));
    }

    #[test]
    fn test_repeated_symbol_stays_out_of_merchant() {
        let t = parser().parse_line("15/03/2024 NETFLIX.COM ₪ 45.90 ₪", 0).unwrap();
        assert_eq!(t.merchant_text, "NETFLIX.COM");
        assert_eq!(t.amount, dec!(45.90));
        assert_eq!(t.currency, Currency::Ils);

        let t = parser().parse_line("15/03/2024 $ AMAZON.COM $ 12.00", 0).unwrap();
        assert_eq!(t.merchant_text, "AMAZON.COM");
        assert_eq!(t.currency, Currency::Usd);
    }

    #[test]
    fn test_unknown_shape() {
        assert_eq!(
            parser().parse_line("₪ 45.90 total for 15/03/2024 and more", 0),
            Err(LineError::NoShape)
        );
    }

    #[test]
    fn test_bad_date_is_reported() {
        assert!(matches!(
            parser().parse_line("31/02/2024 NETFLIX.COM ₪ 45.90", 0),
            Err(LineError::BadDate(_))
        ));
    }
}
