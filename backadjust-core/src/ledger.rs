//! Corporate-action ledger: raw feed records to typed, date-sorted events.
//!
//! Parsing is strict: the first record whose date, kind or value cannot be
//! read fails the whole normalization. Nothing is dropped or coerced.
//!
//! Accepted input:
//! - date: `YYYY-MM-DD`
//! - kind: `SPLIT` or `DIVIDEND` (case-insensitive)
//! - split value: `N:K`, `N/K`, or a bare number read as N/K
//! - dividend value: a plain decimal cash amount

use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::{ActionKind, CorporateAction, RawAction};

/// A raw action record that cannot become a `CorporateAction`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MalformedActionError {
    #[error("action record {index}: unparsable date '{value}' (expected YYYY-MM-DD)")]
    Date { index: usize, value: String },

    #[error("action record {index}: unknown action kind '{value}' (expected SPLIT or DIVIDEND)")]
    Kind { index: usize, value: String },

    #[error("action record {index}: unparsable {kind} value '{value}'")]
    Value {
        index: usize,
        kind: ActionKind,
        value: String,
    },

    #[error("{kind} on {date}: value {value} out of range ({reason})")]
    OutOfRange {
        date: NaiveDate,
        kind: ActionKind,
        value: f64,
        reason: &'static str,
    },
}

/// Date-sorted corporate actions for one instrument.
///
/// Sorting is stable, so same-date events keep their feed order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CorporateActionLedger {
    events: Vec<CorporateAction>,
}

impl CorporateActionLedger {
    /// Parse and sort raw feed records.
    pub fn normalize(raw: &[RawAction]) -> Result<Self, MalformedActionError> {
        let events = raw
            .iter()
            .enumerate()
            .map(|(index, record)| parse_record(index, record))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_actions(events))
    }

    /// Build a ledger from already-typed actions.
    pub fn from_actions(mut events: Vec<CorporateAction>) -> Self {
        events.sort_by_key(|e| e.date());
        Self { events }
    }

    pub fn events(&self) -> &[CorporateAction] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn split_events(&self) -> Vec<CorporateAction> {
        self.events_of(ActionKind::Split)
    }

    pub fn dividend_events(&self) -> Vec<CorporateAction> {
        self.events_of(ActionKind::Dividend)
    }

    fn events_of(&self, kind: ActionKind) -> Vec<CorporateAction> {
        self.events
            .iter()
            .filter(|e| e.kind() == kind)
            .copied()
            .collect()
    }
}

fn parse_record(index: usize, record: &RawAction) -> Result<CorporateAction, MalformedActionError> {
    let date = NaiveDate::parse_from_str(record.date.trim(), "%Y-%m-%d").map_err(|_| {
        MalformedActionError::Date {
            index,
            value: record.date.clone(),
        }
    })?;

    let kind = ActionKind::from_tag(&record.action).ok_or_else(|| MalformedActionError::Kind {
        index,
        value: record.action.clone(),
    })?;

    let value = match kind {
        ActionKind::Split => parse_split_ratio(&record.value),
        ActionKind::Dividend => parse_number(&record.value),
    }
    .ok_or_else(|| MalformedActionError::Value {
        index,
        kind,
        value: record.value.clone(),
    })?;

    CorporateAction::new(date, kind, value)
}

/// `"N:K"`, `"N/K"` or a bare number, as N/K.
fn parse_split_ratio(text: &str) -> Option<f64> {
    let text = text.trim();
    match text.split_once(|c: char| c == ':' || c == '/') {
        Some((new_shares, old_shares)) => {
            Some(parse_number(new_shares)? / parse_number(old_shares)?)
        }
        None => parse_number(text),
    }
}

fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn normalize_sorts_by_date() {
        let raw = vec![
            RawAction::new("2024-06-03", "DIVIDEND", "0.50"),
            RawAction::new("2024-01-02", "SPLIT", "2:1"),
            RawAction::new("2024-03-01", "DIVIDEND", "0.25"),
        ];
        let ledger = CorporateActionLedger::normalize(&raw).unwrap();
        let dates: Vec<_> = ledger.events().iter().map(|e| e.date()).collect();
        assert_eq!(
            dates,
            vec![date("2024-01-02"), date("2024-03-01"), date("2024-06-03")]
        );
    }

    #[test]
    fn partitions_keep_order() {
        let raw = vec![
            RawAction::new("2024-06-03", "DIVIDEND", "0.50"),
            RawAction::new("2024-05-01", "SPLIT", "3:1"),
            RawAction::new("2024-01-02", "SPLIT", "2:1"),
            RawAction::new("2024-03-01", "DIVIDEND", "0.25"),
        ];
        let ledger = CorporateActionLedger::normalize(&raw).unwrap();

        let splits = ledger.split_events();
        assert_eq!(splits.len(), 2);
        assert_eq!(splits[0].raw_value(), 2.0);
        assert_eq!(splits[1].raw_value(), 3.0);

        let dividends = ledger.dividend_events();
        assert_eq!(dividends.len(), 2);
        assert_eq!(dividends[0].raw_value(), 0.25);
        assert_eq!(dividends[1].raw_value(), 0.50);
    }

    #[test]
    fn same_date_events_keep_feed_order() {
        let raw = vec![
            RawAction::new("2024-03-01", "DIVIDEND", "0.10"),
            RawAction::new("2024-03-01", "DIVIDEND", "0.20"),
        ];
        let ledger = CorporateActionLedger::normalize(&raw).unwrap();
        assert_eq!(ledger.events()[0].raw_value(), 0.10);
        assert_eq!(ledger.events()[1].raw_value(), 0.20);
    }

    #[test]
    fn split_ratio_formats() {
        assert_eq!(parse_split_ratio("2:1"), Some(2.0));
        assert_eq!(parse_split_ratio("1/4"), Some(0.25));
        assert_eq!(parse_split_ratio(" 3 : 2 "), Some(1.5));
        assert_eq!(parse_split_ratio("0.5"), Some(0.5));
        assert_eq!(parse_split_ratio("two"), None);
        assert_eq!(parse_split_ratio("2:"), None);
    }

    #[test]
    fn bad_date_is_reported_with_index() {
        let raw = vec![
            RawAction::new("2024-01-02", "SPLIT", "2:1"),
            RawAction::new("02/01/2024", "DIVIDEND", "0.5"),
        ];
        let err = CorporateActionLedger::normalize(&raw).unwrap_err();
        assert_eq!(
            err,
            MalformedActionError::Date {
                index: 1,
                value: "02/01/2024".into()
            }
        );
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let raw = vec![RawAction::new("2024-01-02", "SPINOFF", "1")];
        let err = CorporateActionLedger::normalize(&raw).unwrap_err();
        assert!(matches!(err, MalformedActionError::Kind { index: 0, .. }));
    }

    #[test]
    fn unparsable_value_is_rejected() {
        let raw = vec![RawAction::new("2024-01-02", "DIVIDEND", "$0.50")];
        let err = CorporateActionLedger::normalize(&raw).unwrap_err();
        assert!(matches!(
            err,
            MalformedActionError::Value {
                kind: ActionKind::Dividend,
                ..
            }
        ));
    }

    #[test]
    fn zero_denominator_split_is_out_of_range() {
        let raw = vec![RawAction::new("2024-01-02", "SPLIT", "2:0")];
        let err = CorporateActionLedger::normalize(&raw).unwrap_err();
        assert!(matches!(err, MalformedActionError::OutOfRange { .. }));
    }

    #[test]
    fn empty_input_gives_empty_ledger() {
        let ledger = CorporateActionLedger::normalize(&[]).unwrap();
        assert!(ledger.is_empty());
        assert!(ledger.split_events().is_empty());
    }
}
