//! Domain model (ids, policy, comments, schedule, errors).

pub mod ids;
pub mod policy;
pub mod comment;
pub mod schedule;
pub mod errors;

pub use self::ids::{CommentId, Id, IdMarker, RunId};
pub use self::policy::{
    PeriodUnit, RetentionMode, RetentionPolicy, MAX_PERIOD, MIN_PERIOD, retention_seconds,
};
pub use self::comment::{CommentKind, CommentRecord, EligibilityFilter, NewComment};
pub use self::schedule::{PURGE_ACTION, Recurrence, ScheduledJob};
pub use self::errors::RetentionError;
