//! Day-set reconciliation planning.
//!
//! [`plan_day_set`] compares the days a project currently has with the
//! requested list and decides which rows to keep, create, re-note and
//! remove. The repository applies the plan inside a transaction.

use std::collections::{BTreeMap, HashSet};

use time::Date;
use uuid::Uuid;

use crate::models::{Day, DayEntry};

/// Row changes that turn the current day set into the requested one
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DayPlan {
    /// Dates to insert, ascending
    pub create: Vec<DayEntry>,
    /// Existing day id and the note that replaces its current one
    pub renote: Vec<(Uuid, String)>,
    /// Existing day ids no longer requested
    pub remove: Vec<Uuid>,
    /// First and last requested date
    pub bounds: (Option<Date>, Option<Date>),
}

impl DayPlan {
    pub fn is_noop(&self) -> bool {
        self.create.is_empty() && self.renote.is_empty() && self.remove.is_empty()
    }
}

/// Sort entries by date and collapse duplicates.
///
/// For a repeated date the last explicit note wins; an absent note never
/// erases one given earlier in the same request.
pub fn normalize(entries: Vec<DayEntry>) -> Vec<DayEntry> {
    let mut by_date: BTreeMap<Date, Option<String>> = BTreeMap::new();
    for entry in entries {
        let slot = by_date.entry(entry.date).or_default();
        if entry.info.is_some() {
            *slot = entry.info;
        }
    }

    by_date
        .into_iter()
        .map(|(date, info)| DayEntry::new(date, info))
        .collect()
}

/// Min and max of a set of dates
pub fn bounds_of<I>(dates: I) -> (Option<Date>, Option<Date>)
where
    I: IntoIterator<Item = Date>,
{
    dates.into_iter().fold((None, None), |(min, max), date| {
        (
            Some(min.map_or(date, |m: Date| m.min(date))),
            Some(max.map_or(date, |m: Date| m.max(date))),
        )
    })
}

/// Plan the reconciliation of `existing` rows against `requested` entries
pub fn plan_day_set(existing: &[Day], requested: Vec<DayEntry>) -> DayPlan {
    let requested = normalize(requested);
    let wanted: HashSet<Date> = requested.iter().map(|e| e.date).collect();

    let mut plan = DayPlan {
        bounds: (
            requested.first().map(|e| e.date),
            requested.last().map(|e| e.date),
        ),
        ..Default::default()
    };

    // First row per date survives; stray duplicates are dropped
    let mut kept: BTreeMap<Date, &Day> = BTreeMap::new();
    for day in existing {
        if wanted.contains(&day.date) && !kept.contains_key(&day.date) {
            kept.insert(day.date, day);
        } else {
            plan.remove.push(day.id);
        }
    }

    for entry in requested {
        match kept.get(&entry.date) {
            Some(day) => {
                if let Some(info) = entry.info {
                    if day.info.as_deref() != Some(info.as_str()) {
                        plan.renote.push((day.id, info));
                    }
                }
            }
            None => plan.create.push(entry),
        }
    }

    plan
}
