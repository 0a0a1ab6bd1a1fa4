//! Corporate actions: the events that make historical closes incomparable.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ledger::MalformedActionError;

/// Kind of corporate action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    Split,
    Dividend,
}

impl ActionKind {
    /// Feed tag for this kind ("SPLIT" / "DIVIDEND").
    pub fn tag(&self) -> &'static str {
        match self {
            ActionKind::Split => "SPLIT",
            ActionKind::Dividend => "DIVIDEND",
        }
    }

    /// Parse a feed tag. Case and surrounding whitespace are ignored.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.trim();
        if tag.eq_ignore_ascii_case("SPLIT") {
            Some(ActionKind::Split)
        } else if tag.eq_ignore_ascii_case("DIVIDEND") {
            Some(ActionKind::Dividend)
        } else {
            None
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A typed, validated corporate action.
///
/// `raw_value` is the N/K share ratio for a split (new shares per old share)
/// and the cash amount per share for a dividend. Fields are private so a
/// constructed action cannot be altered. Deserialization goes through
/// [`CorporateAction::new`], so it enforces the same ranges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ActionFields")]
pub struct CorporateAction {
    date: NaiveDate,
    kind: ActionKind,
    raw_value: f64,
}

#[derive(Deserialize)]
struct ActionFields {
    date: NaiveDate,
    kind: ActionKind,
    raw_value: f64,
}

impl TryFrom<ActionFields> for CorporateAction {
    type Error = MalformedActionError;

    fn try_from(fields: ActionFields) -> Result<Self, Self::Error> {
        Self::new(fields.date, fields.kind, fields.raw_value)
    }
}

impl CorporateAction {
    /// Build an action, rejecting values no feed should produce.
    ///
    /// Splits need a finite ratio > 0; dividends need a finite amount >= 0.
    pub fn new(
        date: NaiveDate,
        kind: ActionKind,
        raw_value: f64,
    ) -> Result<Self, MalformedActionError> {
        let reason = match kind {
            ActionKind::Split if !raw_value.is_finite() => Some("split ratio must be finite"),
            ActionKind::Split if raw_value <= 0.0 => Some("split ratio must be positive"),
            ActionKind::Dividend if !raw_value.is_finite() => {
                Some("dividend amount must be finite")
            }
            ActionKind::Dividend if raw_value < 0.0 => Some("dividend amount must not be negative"),
            _ => None,
        };

        match reason {
            Some(reason) => Err(MalformedActionError::OutOfRange {
                date,
                kind,
                value: raw_value,
                reason,
            }),
            None => Ok(Self {
                date,
                kind,
                raw_value,
            }),
        }
    }

    /// An N:K split: every K old shares become N new shares.
    pub fn split(
        date: NaiveDate,
        new_shares: f64,
        old_shares: f64,
    ) -> Result<Self, MalformedActionError> {
        Self::new(date, ActionKind::Split, new_shares / old_shares)
    }

    /// A cash dividend of `amount` per share, keyed on its ex-date.
    pub fn dividend(date: NaiveDate, amount: f64) -> Result<Self, MalformedActionError> {
        Self::new(date, ActionKind::Dividend, amount)
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn kind(&self) -> ActionKind {
        self.kind
    }

    pub fn raw_value(&self) -> f64 {
        self.raw_value
    }

    pub fn is_split(&self) -> bool {
        self.kind == ActionKind::Split
    }
}

/// Unparsed action record as delivered by a corporate-action feed.
///
/// All three fields are kept as text; `CorporateActionLedger::normalize`
/// does the parsing and reports the first record it cannot read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawAction {
    pub date: String,
    #[serde(alias = "kind")]
    pub action: String,
    pub value: String,
}

impl RawAction {
    pub fn new(
        date: impl Into<String>,
        action: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            date: date.into(),
            action: action.into(),
            value: value.into(),
        }
    }
}
