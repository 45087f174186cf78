//! Calendar aggregation.
//!
//! Folds the days of a profile's projects into a busy/free view for a
//! particular viewer. What a viewer may see:
//!
//! | viewer      | project                          | placement |
//! |-------------|----------------------------------|-----------|
//! | anonymous   | pending proposal                 | hidden    |
//! | anonymous   | anything else                    | daysOff   |
//! | owner       | created by the owner / days off  | daysOff   |
//! | owner       | created by someone else          | days      |
//! | third party | created by the viewer            | days      |
//! | third party | pending proposal of someone else | hidden    |
//! | third party | anything else                    | daysOff   |
//!
//! Canceled projects are inert and never show up, whichever party canceled
//! them (this covers hiding what the asker canceled).

use std::collections::BTreeSet;

use time::Date;
use uuid::Uuid;

use crate::models::{
    format_date, Calendar, CalendarDay, CalendarQuery, OffersCalendar, Project, ProjectKind,
    ProjectSummary,
};

/// Where a day lands in the calendar response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Shown with project details
    Detail,
    /// Opaque busy date
    Busy,
    Hidden,
}

/// Decide how `project` on `owner`'s calendar is shown to `asker`
pub fn placement(project: &Project, owner: Uuid, asker: Option<Uuid>) -> Placement {
    match asker {
        None if project.is_wait => Placement::Hidden,
        None => Placement::Busy,
        Some(asker) if asker == owner => match project.kind(false) {
            ProjectKind::Proposal { .. } => Placement::Detail,
            _ => Placement::Busy,
        },
        Some(asker) if project.creator_id == Some(asker) => Placement::Detail,
        Some(_) if project.is_wait => Placement::Hidden,
        Some(_) => Placement::Busy,
    }
}

pub fn in_range(date: Date, start: Option<Date>, end: Option<Date>) -> bool {
    start.is_none_or(|start| date >= start) && end.is_none_or(|end| date <= end)
}

fn in_scope(query: &CalendarQuery, day: &CalendarDay) -> bool {
    let project = &day.project;

    project.user_id == Some(query.owner)
        && Some(project.id) != query.excluding_project_id
        && project.canceled.is_none()
        && in_range(day.date, query.start, query.end)
}

/// Build the calendar of `query.owner` as seen by `query.asker`
pub fn aggregate(query: &CalendarQuery, days: Vec<CalendarDay>) -> Calendar {
    let mut calendar = Calendar::default();
    let mut busy: BTreeSet<Date> = BTreeSet::new();

    for day in days.into_iter().filter(|day| in_scope(query, day)) {
        match placement(&day.project, query.owner, query.asker) {
            Placement::Detail => {
                calendar
                    .days
                    .entry(format_date(day.date))
                    .or_default()
                    .push(ProjectSummary::of(&day.project, day.info));
            }
            Placement::Busy => {
                busy.insert(day.date);
            }
            Placement::Hidden => {}
        }
    }

    calendar.days_off = busy.into_iter().map(format_date).collect();
    calendar
}

/// Days of the projects `asker` proposed to other calendars (or left open)
pub fn aggregate_offers(
    asker: Uuid,
    start: Option<Date>,
    end: Option<Date>,
    excluding_project_id: Option<Uuid>,
    days: Vec<CalendarDay>,
) -> OffersCalendar {
    let mut offers = OffersCalendar::default();

    for day in days {
        let project = &day.project;
        let offered = project.creator_id == Some(asker)
            && project.user_id != Some(asker)
            && project.canceled.is_none()
            && Some(project.id) != excluding_project_id
            && in_range(day.date, start, end);

        if offered {
            offers
                .days
                .entry(format_date(day.date))
                .or_default()
                .push(ProjectSummary::of(project, day.info));
        }
    }

    offers
}
