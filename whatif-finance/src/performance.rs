//! Hypothetical outcome of buying the merchant's shares instead.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::debug;
use whatif_core::{MatchResult, Money, PerformanceRecord, Unavailable};

use crate::prices::PriceService;
use crate::rates::RateSource;

pub struct PerformanceCalculator<'a> {
    prices: &'a dyn PriceService,
    rates: &'a dyn RateSource,
}

impl<'a> PerformanceCalculator<'a> {
    pub fn new(prices: &'a dyn PriceService, rates: &'a dyn RateSource) -> Self {
        Self { prices, rates }
    }

    /// Every failure is local to this match; the caller moves on to the next one.
    pub fn evaluate(
        &self,
        matched: &MatchResult,
        today: NaiveDate,
    ) -> Result<PerformanceRecord, Unavailable> {
        let txn = &matched.transaction;
        if txn.date > today {
            return Err(Unavailable::FutureDate(txn.date));
        }

        let pricing = matched.company.exchange.pricing_currency();
        let invested = self
            .rates
            .convert(txn.amount, txn.currency, pricing)
            .ok_or(Unavailable::NoConversionRate {
                from: txn.currency,
                to: pricing,
            })?;

        let symbol = matched.company.quote_symbol();
        let series = self
            .prices
            .price_series(&symbol, txn.date)
            .map_err(|e| Unavailable::LookupFailed(format!("{e:#}")))?;
        let entry = series
            .iter()
            .find(|p| p.date >= txn.date)
            .ok_or(Unavailable::NoPriceHistory)?;
        if entry.close.is_zero() {
            return Err(Unavailable::ZeroEntryPrice);
        }

        let current = self
            .prices
            .current_price(&symbol)
            .map_err(|e| Unavailable::LookupFailed(format!("{e:#}")))?
            .ok_or(Unavailable::NoCurrentPrice)?;

        let delta = current - entry.close;
        let shares = invested / entry.close;
        let value_change = (shares * delta).round_dp(2);
        let percent_change = (delta / entry.close * Decimal::ONE_HUNDRED).round_dp(2);
        debug!(
            %symbol,
            entry = %entry.close,
            %current,
            %percent_change,
            "evaluated"
        );

        Ok(PerformanceRecord {
            matched: matched.clone(),
            entry_date: entry.date,
            entry_price: entry.close,
            current_price: current,
            invested: Money::new(invested.round_dp(2), pricing),
            percent_change,
            value_change,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prices::PricePoint;
    use crate::rates::FixedRates;
    use anyhow::{Result, bail};
    use rust_decimal_macros::dec;
    use std::cell::RefCell;
    use whatif_core::{CompanyRecord, Currency, Dialect, Exchange, MatchConfidence, Transaction};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    struct FakePrices {
        series: Vec<PricePoint>,
        current: Option<Decimal>,
        fail: bool,
        symbols: RefCell<Vec<String>>,
    }

    impl FakePrices {
        fn new(series: Vec<PricePoint>, current: Option<Decimal>) -> Self {
            Self {
                series,
                current,
                fail: false,
                symbols: RefCell::new(Vec::new()),
            }
        }
    }

    impl PriceService for FakePrices {
        fn price_series(&self, symbol: &str, start: NaiveDate) -> Result<Vec<PricePoint>> {
            self.symbols.borrow_mut().push(symbol.to_string());
            if self.fail {
                bail!("connection reset");
            }
            Ok(self.series.iter().filter(|p| p.date >= start).copied().collect())
        }

        fn current_price(&self, _symbol: &str) -> Result<Option<Decimal>> {
            Ok(self.current)
        }
    }

    fn matched(amount: Decimal, currency: Currency, on: NaiveDate, exchange: Exchange) -> MatchResult {
        MatchResult {
            transaction: Transaction {
                date: on,
                merchant_text: "NETFLIX.COM".to_string(),
                amount,
                currency,
                has_latin_script: true,
                original: None,
                kind: None,
                dialect: Dialect::SingleColumn,
                page: 0,
                date_ambiguous: false,
            },
            company: CompanyRecord::new("Netflix", "NFLX", exchange, &["netflix"]),
            match_confidence: MatchConfidence::Exact,
            match_score: None,
        }
    }

    fn series() -> Vec<PricePoint> {
        vec![
            PricePoint { date: date(2024, 3, 14), close: dec!(8) },
            PricePoint { date: date(2024, 3, 18), close: dec!(10) },
            PricePoint { date: date(2024, 3, 19), close: dec!(11) },
        ]
    }

    #[test]
    fn test_converts_and_uses_first_close_on_or_after_date() {
        let prices = FakePrices::new(series(), Some(dec!(15)));
        let rates = FixedRates::default();
        let calc = PerformanceCalculator::new(&prices, &rates);

        // Saturday purchase, first close is the following Monday
        let m = matched(dec!(100), Currency::Ils, date(2024, 3, 16), Exchange::Nasdaq);
        let rec = calc.evaluate(&m, date(2024, 6, 1)).unwrap();

        assert_eq!(rec.entry_date, date(2024, 3, 18));
        assert_eq!(rec.entry_price, dec!(10));
        assert_eq!(rec.current_price, dec!(15));
        assert_eq!(rec.invested, Money::new(dec!(27.00), Currency::Usd));
        assert_eq!(rec.value_change, dec!(13.50));
        assert_eq!(rec.percent_change, dec!(50.00));
        assert!(rec.is_gain());
    }

    #[test]
    fn test_same_currency_passes_amount_through() {
        let prices = FakePrices::new(series(), Some(dec!(5)));
        let rates = FixedRates::default();
        let calc = PerformanceCalculator::new(&prices, &rates);

        let m = matched(dec!(50), Currency::Ils, date(2024, 3, 18), Exchange::Tase);
        let rec = calc.evaluate(&m, date(2024, 6, 1)).unwrap();

        assert_eq!(rec.invested, Money::new(dec!(50), Currency::Ils));
        assert_eq!(rec.value_change, dec!(-25.00));
        assert_eq!(rec.percent_change, dec!(-50.00));
        assert_eq!(prices.symbols.borrow().as_slice(), ["NFLX.TA"]);
    }

    #[test]
    fn test_future_date_is_rejected_before_lookup() {
        let prices = FakePrices::new(series(), Some(dec!(15)));
        let rates = FixedRates::default();
        let calc = PerformanceCalculator::new(&prices, &rates);

        let m = matched(dec!(10), Currency::Usd, date(2030, 1, 1), Exchange::Nasdaq);
        assert_eq!(
            calc.evaluate(&m, date(2024, 6, 1)),
            Err(Unavailable::FutureDate(date(2030, 1, 1)))
        );
        assert!(prices.symbols.borrow().is_empty());
    }

    #[test]
    fn test_empty_series_is_unavailable() {
        let prices = FakePrices::new(Vec::new(), Some(dec!(15)));
        let rates = FixedRates::default();
        let calc = PerformanceCalculator::new(&prices, &rates);

        let m = matched(dec!(10), Currency::Usd, date(2024, 3, 18), Exchange::Nasdaq);
        assert_eq!(calc.evaluate(&m, date(2024, 6, 1)), Err(Unavailable::NoPriceHistory));
    }

    #[test]
    fn test_lookup_error_degrades() {
        let mut prices = FakePrices::new(series(), Some(dec!(15)));
        prices.fail = true;
        let rates = FixedRates::default();
        let calc = PerformanceCalculator::new(&prices, &rates);

        let m = matched(dec!(10), Currency::Usd, date(2024, 3, 18), Exchange::Nasdaq);
        match calc.evaluate(&m, date(2024, 6, 1)) {
            Err(Unavailable::LookupFailed(msg)) => assert!(msg.contains("connection reset")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_missing_current_price() {
        let prices = FakePrices::new(series(), None);
        let rates = FixedRates::default();
        let calc = PerformanceCalculator::new(&prices, &rates);

        let m = matched(dec!(10), Currency::Usd, date(2024, 3, 18), Exchange::Nasdaq);
        assert_eq!(calc.evaluate(&m, date(2024, 6, 1)), Err(Unavailable::NoCurrentPrice));
    }

    #[test]
    fn test_missing_rate() {
        let prices = FakePrices::new(series(), Some(dec!(15)));
        let rates = FixedRates { gbp: Decimal::ZERO, ..FixedRates::default() };
        let calc = PerformanceCalculator::new(&prices, &rates);

        let m = matched(dec!(10), Currency::Ils, date(2024, 3, 18), Exchange::Lse);
        assert_eq!(
            calc.evaluate(&m, date(2024, 6, 1)),
            Err(Unavailable::NoConversionRate { from: Currency::Ils, to: Currency::Gbp })
        );
    }
}
