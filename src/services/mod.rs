pub mod auth;
pub mod calendar;
pub mod days;
pub mod notification;
pub mod workflow;

pub use auth::{AuthService, Claims};
pub use days::{plan_day_set, DayPlan};
pub use notification::{dispatch, LogSender, NotificationSender, OutboundMessage, WebhookSender};
pub use workflow::{DeletePlan, EventKind, ProjectEvent, ProjectState, UpdatePlan};
