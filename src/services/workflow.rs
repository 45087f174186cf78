//! Project proposal / confirmation state machine.
//!
//! Transitions are planned here without touching storage. Each plan carries
//! the notifications it implies; the caller emits them only after the
//! transaction that applies the plan has committed.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{NewProject, Party, Project, ProjectKind, ProjectPatch};

/// Lifecycle state derived from the project flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "by")]
pub enum ProjectState {
    DaysOff,
    SelfOwned,
    /// Offer without an owner yet
    Open,
    Pending,
    Confirmed,
    Paid,
    Canceled(Party),
}

impl ProjectState {
    pub fn of(project: &Project) -> Self {
        if let Some(party) = project.canceled {
            return Self::Canceled(party);
        }

        match project.kind(false) {
            ProjectKind::DaysOff { .. } => Self::DaysOff,
            ProjectKind::SelfOwned { .. } => Self::SelfOwned,
            ProjectKind::OpenOffer { .. } | ProjectKind::Folder { .. } => Self::Open,
            ProjectKind::Proposal { .. } if project.is_paid => Self::Paid,
            ProjectKind::Proposal { .. } if project.is_wait => Self::Pending,
            ProjectKind::Proposal { .. } => Self::Confirmed,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Paid | Self::Canceled(_))
    }
}

/// How the acting profile relates to a project
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Owner,
    Creator,
    /// Owner and creator at once (self-owned project)
    Both,
    Stranger,
}

pub fn role_of(project: &Project, actor: Uuid) -> Role {
    let owner = project.user_id == Some(actor);
    let creator = project.creator_id == Some(actor);
    match (owner, creator) {
        (true, true) => Role::Both,
        (true, false) => Role::Owner,
        (false, true) => Role::Creator,
        (false, false) => Role::Stranger,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Created,
    Accepted,
    Declined,
    Updated,
    Canceled,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "create",
            Self::Accepted => "accept",
            Self::Declined => "decline",
            Self::Updated => "update",
            Self::Canceled => "cancel",
        }
    }

    /// Notification topic for delivery channels
    pub fn topic(&self) -> &'static str {
        match self {
            Self::Created => "project.create",
            Self::Accepted => "project.accept",
            Self::Declined => "project.decline",
            Self::Updated => "project.update",
            Self::Canceled => "project.cancel",
        }
    }
}

/// Notification owed to the party that did not act
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectEvent {
    pub kind: EventKind,
    pub project_id: Uuid,
    pub recipient: Uuid,
    pub actor: Uuid,
}

impl ProjectEvent {
    fn to_other_party(kind: EventKind, project: &Project, actor: Uuid) -> Option<Self> {
        let recipient = if project.user_id == Some(actor) {
            project.creator_id
        } else {
            project.user_id
        }?;

        (recipient != actor).then_some(Self {
            kind,
            project_id: project.id,
            recipient,
            actor,
        })
    }
}

/// Confirmation flags written by a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flags {
    pub is_wait: bool,
    pub confirmed: bool,
}

impl Flags {
    pub const SETTLED: Flags = Flags {
        is_wait: false,
        confirmed: true,
    };
    pub const AWAITING: Flags = Flags {
        is_wait: true,
        confirmed: false,
    };
    /// Written together with `canceled`
    pub const CANCELED: Flags = Flags {
        is_wait: true,
        confirmed: true,
    };

    pub fn of(project: &Project) -> Self {
        Self {
            is_wait: project.is_wait,
            confirmed: project.confirmed,
        }
    }
}

/// What happens to the current row when it must give way
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retire {
    SoftCancel(Party),
    HardDelete,
}

#[derive(Debug, Clone)]
pub enum UpdatePlan {
    /// Update the row in place
    Apply {
        patch: ProjectPatch,
        flags: Flags,
        events: Vec<ProjectEvent>,
    },
    /// Owner changed: retire this row and create a new project from the patch
    Reassign {
        retire: Retire,
        patch: ProjectPatch,
        events: Vec<ProjectEvent>,
    },
}

#[derive(Debug, Clone)]
pub enum DeletePlan {
    SoftCancel {
        party: Party,
        events: Vec<ProjectEvent>,
    },
    HardDelete,
}

/// Flags of a new project: only a project someone puts on their own calendar
/// starts confirmed
pub fn initial_flags(user: Option<Uuid>, creator: Option<Uuid>) -> Flags {
    if creator.is_some() && user == creator {
        Flags::SETTLED
    } else {
        Flags::AWAITING
    }
}

/// Fill in creator and confirmation flags for a project `actor` is creating
pub fn prepare_create(actor: Uuid, new: &mut NewProject) {
    new.creator_id = Some(actor);

    let flags = initial_flags(new.user_id, new.creator_id);
    if flags != Flags::SETTLED {
        // A proposer cannot mark their own offer paid
        new.is_paid = false;
    }
    new.is_wait = flags.is_wait;
    new.confirmed = flags.confirmed;
}

/// Notifications for a freshly created project
pub fn creation_events(project: &Project, actor: Uuid) -> Vec<ProjectEvent> {
    if !project.kind(false).has_counterparty() {
        return Vec::new();
    }
    ProjectEvent::to_other_party(EventKind::Created, project, actor)
        .into_iter()
        .collect()
}

fn check_mutable(project: &Project, role: Role) -> AppResult<()> {
    if role == Role::Stranger {
        return Err(AppError::Forbidden(
            "Not a party of this project".to_string(),
        ));
    }

    match ProjectState::of(project) {
        ProjectState::DaysOff => Err(AppError::Validation(
            "Days off are managed through /api/daysoff".to_string(),
        )),
        state if state.is_terminal() => Err(AppError::Validation(
            "Paid and canceled projects cannot be changed".to_string(),
        )),
        _ => Ok(()),
    }
}

/// Plan an update of `project` by `actor`
pub fn plan_update(
    project: &Project,
    has_children: bool,
    actor: Uuid,
    mut patch: ProjectPatch,
) -> AppResult<UpdatePlan> {
    let role = role_of(project, actor);
    check_mutable(project, role)?;
    let kind = project.kind(has_children);

    if patch.changes_owner(project) {
        if !matches!(role, Role::Creator | Role::Both) {
            return Err(AppError::Forbidden(
                "Only the creator can move a project to another calendar".to_string(),
            ));
        }
        if has_children {
            return Err(AppError::Validation(
                "A folder cannot be moved to another calendar".to_string(),
            ));
        }

        let (retire, events) = if kind.has_counterparty() {
            (
                Retire::SoftCancel(Party::Creator),
                ProjectEvent::to_other_party(EventKind::Canceled, project, actor)
                    .into_iter()
                    .collect(),
            )
        } else {
            (Retire::HardDelete, Vec::new())
        };
        patch.strip_payment();
        return Ok(UpdatePlan::Reassign {
            retire,
            patch,
            events,
        });
    }

    let current = Flags::of(project);
    let plan = match role {
        Role::Both => UpdatePlan::Apply {
            patch,
            flags: current,
            events: Vec::new(),
        },
        Role::Creator if kind.has_counterparty() => {
            // Re-editing an offer sends it back for confirmation
            patch.strip_payment();
            UpdatePlan::Apply {
                events: ProjectEvent::to_other_party(EventKind::Updated, project, actor)
                    .into_iter()
                    .collect(),
                patch,
                flags: Flags::AWAITING,
            }
        }
        Role::Creator => {
            patch.strip_payment();
            UpdatePlan::Apply {
                patch,
                flags: current,
                events: Vec::new(),
            }
        }
        Role::Owner => {
            let (flags, kind) = if project.is_wait {
                (Flags::SETTLED, EventKind::Accepted)
            } else {
                (current, EventKind::Updated)
            };
            UpdatePlan::Apply {
                patch,
                flags,
                events: ProjectEvent::to_other_party(kind, project, actor)
                    .into_iter()
                    .collect(),
            }
        }
        Role::Stranger => {
            return Err(AppError::Forbidden(
                "Not a party of this project".to_string(),
            ))
        }
    };

    Ok(plan)
}

/// Plan the deletion of `project` by `actor`
pub fn plan_delete(project: &Project, has_children: bool, actor: Uuid) -> AppResult<DeletePlan> {
    let role = role_of(project, actor);
    if role == Role::Stranger {
        return Err(AppError::Forbidden(
            "Not a party of this project".to_string(),
        ));
    }
    if has_children {
        return Err(AppError::Validation(
            "Folder still contains projects".to_string(),
        ));
    }

    // History without a counterparty, or already settled by a cancellation
    let state = ProjectState::of(project);
    if matches!(state, ProjectState::Canceled(_)) || !project.kind(false).has_counterparty() {
        return Ok(DeletePlan::HardDelete);
    }
    if state == ProjectState::Paid {
        return Err(AppError::Validation(
            "A paid project cannot be canceled".to_string(),
        ));
    }

    let (party, kind) = match role {
        Role::Owner if project.is_wait => (Party::User, EventKind::Declined),
        Role::Owner => (Party::User, EventKind::Canceled),
        _ => (Party::Creator, EventKind::Canceled),
    };

    Ok(DeletePlan::SoftCancel {
        party,
        events: ProjectEvent::to_other_party(kind, project, actor)
            .into_iter()
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::project::fixtures::project;
    use crate::models::{DayEntry, Pricing, ProjectField};

    fn new_project(user: Option<Uuid>) -> NewProject {
        NewProject {
            user_id: user,
            creator_id: None,
            client_id: None,
            parent_id: None,
            title: "Shoot".to_string(),
            pricing: Pricing::Unpriced,
            info: String::new(),
            is_paid: true,
            is_wait: false,
            confirmed: false,
            days: vec![DayEntry::new(time::macros::date!(2024 - 07 - 10), None)],
        }
    }

    fn pending(owner: Uuid, creator: Uuid) -> Project {
        let mut p = project(Some(owner), Some(creator));
        p.is_wait = true;
        p.confirmed = false;
        p
    }

    #[test]
    fn test_self_project_is_settled_on_create() {
        let a = Uuid::new_v4();
        let mut new = new_project(Some(a));
        prepare_create(a, &mut new);

        assert_eq!(new.creator_id, Some(a));
        assert!(!new.is_wait);
        assert!(new.confirmed);
        assert!(new.is_paid);
    }

    #[test]
    fn test_proposal_awaits_confirmation() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut new = new_project(Some(a));
        prepare_create(b, &mut new);

        assert!(new.is_wait);
        assert!(!new.confirmed);
        assert!(!new.is_paid);
    }

    #[test]
    fn test_creation_notifies_owner() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let events = creation_events(&pending(a, b), b);

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::Created);
        assert_eq!(events[0].recipient, a);

        assert!(creation_events(&project(Some(a), Some(a)), a).is_empty());
    }

    #[test]
    fn test_owner_accepts_pending() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let plan = plan_update(&pending(a, b), false, a, ProjectPatch::default()).unwrap();

        match plan {
            UpdatePlan::Apply { flags, events, .. } => {
                assert_eq!(flags, Flags::SETTLED);
                assert_eq!(events[0].kind, EventKind::Accepted);
                assert_eq!(events[0].recipient, b);
            }
            other => panic!("unexpected plan {:?}", other),
        }
    }

    #[test]
    fn test_creator_edit_resets_confirmation_and_strips_payment() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut confirmed = project(Some(a), Some(b));
        confirmed.is_wait = false;

        let patch = ProjectPatch {
            fields: vec![ProjectField::IsPaid(true)],
            ..Default::default()
        };

        match plan_update(&confirmed, false, b, patch).unwrap() {
            UpdatePlan::Apply {
                patch,
                flags,
                events,
            } => {
                assert!(patch.fields.is_empty());
                assert_eq!(flags, Flags::AWAITING);
                assert_eq!(events[0].kind, EventKind::Updated);
                assert_eq!(events[0].recipient, a);
            }
            other => panic!("unexpected plan {:?}", other),
        }
    }

    #[test]
    fn test_stranger_is_rejected() {
        let p = pending(Uuid::new_v4(), Uuid::new_v4());
        assert!(matches!(
            plan_update(&p, false, Uuid::new_v4(), ProjectPatch::default()),
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            plan_delete(&p, false, Uuid::new_v4()),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn test_canceled_project_is_inert() {
        let a = Uuid::new_v4();
        let mut p = pending(a, Uuid::new_v4());
        p.canceled = Some(Party::User);

        assert!(matches!(
            plan_update(&p, false, a, ProjectPatch::default()),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(plan_delete(&p, false, a), Ok(DeletePlan::HardDelete)));
    }

    #[test]
    fn test_reassign_soft_cancels_proposal() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        let patch = ProjectPatch {
            user: Some(Some(c)),
            ..Default::default()
        };

        match plan_update(&pending(a, b), false, b, patch).unwrap() {
            UpdatePlan::Reassign { retire, events, .. } => {
                assert_eq!(retire, Retire::SoftCancel(Party::Creator));
                assert_eq!(events[0].kind, EventKind::Canceled);
                assert_eq!(events[0].recipient, a);
            }
            other => panic!("unexpected plan {:?}", other),
        }
    }

    #[test]
    fn test_reassign_self_project_deletes_it() {
        let a = Uuid::new_v4();
        let patch = ProjectPatch {
            user: Some(Some(Uuid::new_v4())),
            ..Default::default()
        };

        match plan_update(&project(Some(a), Some(a)), false, a, patch).unwrap() {
            UpdatePlan::Reassign { retire, events, .. } => {
                assert_eq!(retire, Retire::HardDelete);
                assert!(events.is_empty());
            }
            other => panic!("unexpected plan {:?}", other),
        }
    }

    #[test]
    fn test_owner_cannot_reassign() {
        let a = Uuid::new_v4();
        let patch = ProjectPatch {
            user: Some(Some(Uuid::new_v4())),
            ..Default::default()
        };

        assert!(matches!(
            plan_update(&pending(a, Uuid::new_v4()), false, a, patch),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn test_delete_self_is_hard() {
        let a = Uuid::new_v4();
        assert!(matches!(
            plan_delete(&project(Some(a), Some(a)), false, a),
            Ok(DeletePlan::HardDelete)
        ));
    }

    #[test]
    fn test_owner_declines_pending() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        match plan_delete(&pending(a, b), false, a).unwrap() {
            DeletePlan::SoftCancel { party, events } => {
                assert_eq!(party, Party::User);
                assert_eq!(events[0].kind, EventKind::Declined);
                assert_eq!(events[0].recipient, b);
            }
            DeletePlan::HardDelete => panic!("proposal must not be deleted"),
        }
    }

    #[test]
    fn test_creator_cancels_confirmed() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut confirmed = project(Some(a), Some(b));
        confirmed.is_wait = false;

        match plan_delete(&confirmed, false, b).unwrap() {
            DeletePlan::SoftCancel { party, events } => {
                assert_eq!(party, Party::Creator);
                assert_eq!(events[0].kind, EventKind::Canceled);
                assert_eq!(events[0].recipient, a);
            }
            DeletePlan::HardDelete => panic!("proposal must not be deleted"),
        }
    }

    #[test]
    fn test_paid_proposal_cannot_be_canceled() {
        let a = Uuid::new_v4();
        let mut paid = project(Some(a), Some(Uuid::new_v4()));
        paid.is_paid = true;

        assert!(matches!(
            plan_delete(&paid, false, a),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_non_empty_folder_cannot_be_deleted() {
        let a = Uuid::new_v4();
        assert!(matches!(
            plan_delete(&project(Some(a), Some(a)), true, a),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_state_derivation() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        assert_eq!(ProjectState::of(&project(Some(a), None)), ProjectState::DaysOff);
        assert_eq!(ProjectState::of(&project(Some(a), Some(a))), ProjectState::SelfOwned);
        assert_eq!(ProjectState::of(&project(None, Some(b))), ProjectState::Open);
        assert_eq!(ProjectState::of(&pending(a, b)), ProjectState::Pending);

        let mut canceled = pending(a, b);
        canceled.canceled = Some(Party::Creator);
        assert_eq!(
            ProjectState::of(&canceled),
            ProjectState::Canceled(Party::Creator)
        );
        assert!(ProjectState::of(&canceled).is_terminal());

        let mut paid = project(Some(a), Some(b));
        paid.is_paid = true;
        assert_eq!(ProjectState::of(&paid), ProjectState::Paid);

        // Paying yourself does not freeze your own project
        let mut own = project(Some(a), Some(a));
        own.is_paid = true;
        assert_eq!(ProjectState::of(&own), ProjectState::SelfOwned);
    }

    #[test]
    fn test_paid_proposal_is_frozen() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut paid = project(Some(a), Some(b));
        paid.is_paid = true;

        let retitle = || ProjectPatch {
            fields: vec![ProjectField::Title("W2".to_string())],
            ..Default::default()
        };
        for actor in [a, b] {
            assert!(matches!(
                plan_update(&paid, false, actor, retitle()),
                Err(AppError::Validation(_))
            ));
        }

        let move_away = ProjectPatch {
            user: Some(Some(Uuid::new_v4())),
            ..Default::default()
        };
        assert!(matches!(
            plan_update(&paid, false, b, move_away),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_owner_marks_confirmed_proposal_paid() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let confirmed = project(Some(a), Some(b));
        let patch = ProjectPatch {
            fields: vec![ProjectField::IsPaid(true)],
            ..Default::default()
        };

        match plan_update(&confirmed, false, a, patch).unwrap() {
            UpdatePlan::Apply { patch, flags, .. } => {
                assert_eq!(patch.fields.len(), 1);
                assert_eq!(flags, Flags::SETTLED);
            }
            other => panic!("unexpected plan {:?}", other),
        }
    }
}
