//! Multi-symbol adjustment.
//!
//! Each symbol is adjusted independently with one shared `PriceAdjuster`.
//! A failure for one symbol does not affect the others.

use rayon::prelude::*;
use tracing::warn;

use crate::adjuster::{AdjustError, PriceAdjuster};
use crate::config::AdjustConfig;
use crate::domain::{AdjustedSeries, PriceSeries, RawAction};

/// Raw inputs for one symbol.
#[derive(Debug, Clone)]
pub struct SymbolInput {
    pub symbol: String,
    pub prices: PriceSeries,
    pub actions: Vec<RawAction>,
}

/// Result for one symbol, in input order.
#[derive(Debug, Clone)]
pub struct SymbolOutput {
    pub symbol: String,
    pub result: Result<AdjustedSeries, AdjustError>,
}

/// Adjust every symbol in parallel with the same configuration.
pub fn adjust_universe(inputs: &[SymbolInput], config: AdjustConfig) -> Vec<SymbolOutput> {
    let adjuster = PriceAdjuster::new(config);

    inputs
        .par_iter()
        .map(|input| {
            let result = adjuster.adjust(&input.prices, &input.actions);
            if let Err(e) = &result {
                warn!(symbol = %input.symbol, error = %e, "adjustment failed");
            }
            SymbolOutput {
                symbol: input.symbol.clone(),
                result,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn input(symbol: &str, actions: Vec<RawAction>) -> SymbolInput {
        SymbolInput {
            symbol: symbol.to_string(),
            prices: PriceSeries::from_pairs((1..=4).map(|d| (day(d), 100.0))).unwrap(),
            actions,
        }
    }

    #[test]
    fn results_keep_input_order() {
        let inputs: Vec<SymbolInput> = ["AAA", "BBB", "CCC", "DDD"]
            .iter()
            .map(|s| input(s, Vec::new()))
            .collect();
        let outputs = adjust_universe(&inputs, AdjustConfig::default());
        let symbols: Vec<&str> = outputs.iter().map(|o| o.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["AAA", "BBB", "CCC", "DDD"]);
    }

    #[test]
    fn one_failure_does_not_poison_others() {
        let inputs = vec![
            input("GOOD", vec![RawAction::new("2024-01-03", "SPLIT", "2:1")]),
            input("BAD", vec![RawAction::new("2024-01-03", "SPLIT", "x")]),
        ];
        let outputs = adjust_universe(&inputs, AdjustConfig::default());

        let good = outputs[0].result.as_ref().unwrap();
        assert_eq!(good.closes(), vec![50.0, 50.0, 100.0, 100.0]);
        assert!(matches!(
            outputs[1].result,
            Err(AdjustError::MalformedAction(_))
        ));
    }
}
