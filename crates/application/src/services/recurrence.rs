//! Recurrence engine
//!
//! Computes the next occurrence of a cron expression after a reference
//! instant. Expressions are interpreted in UTC. Reminders carry standard
//! 5-field expressions; the `cron` crate wants a seconds field, so a `0`
//! is prepended before parsing. 6- and 7-field expressions pass through
//! untouched.

use std::borrow::Cow;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use cron::Schedule;
use tracing::warn;

/// The smallest instant strictly after `reference` matching `expression`
///
/// Returns `None` when the expression does not parse or the schedule has no
/// further occurrences.
#[must_use]
pub fn next_occurrence(expression: &str, reference: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let normalized = normalize(expression);
    let schedule = match Schedule::from_str(&normalized) {
        Ok(schedule) => schedule,
        Err(e) => {
            warn!(expression, error = %e, "Unparseable recurrence expression");
            return None;
        },
    };
    schedule.after(&reference).next()
}

/// Check whether an expression parses at all
#[must_use]
pub fn is_valid(expression: &str) -> bool {
    Schedule::from_str(&normalize(expression)).is_ok()
}

fn normalize(expression: &str) -> Cow<'_, str> {
    if expression.split_whitespace().count() == 5 {
        Cow::Owned(format!("0 {expression}"))
    } else {
        Cow::Borrowed(expression)
    }
}
