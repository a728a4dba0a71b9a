pub mod attendance;
pub mod course;
pub mod facilitator;
pub mod import_job;
pub mod officer;
pub mod session;
pub mod session_facilitator;
pub mod session_feedback;
pub mod token;
pub mod user;

use std::time::Duration;

use sqlx::PgPool;

use crate::config::AppConfig;
use crate::database::store::Store;

pub use attendance::{Attendance, AttendanceListFilter};
pub use course::{Course, CourseListFilter};
pub use facilitator::{Facilitator, FacilitatorListFilter};
pub use import_job::{ImportJob, ImportJobListFilter};
pub use officer::{Officer, OfficerListFilter};
pub use session::{Session, SessionListFilter};
pub use session_facilitator::{SessionFacilitator, SessionFacilitatorListFilter};
pub use session_feedback::{SessionFeedback, SessionFeedbackListFilter};
pub use token::{Token, TokenScope, TokenStore};
pub use user::{User, UserStore};

/// All data stores for the application, sharing one connection pool.
#[derive(Clone)]
pub struct Models {
    pub officers: Store<Officer>,
    pub courses: Store<Course>,
    pub sessions: Store<Session>,
    pub facilitators: Store<Facilitator>,
    pub attendance: Store<Attendance>,
    pub session_facilitators: Store<SessionFacilitator>,
    pub session_feedback: Store<SessionFeedback>,
    pub import_jobs: Store<ImportJob>,
    pub users: UserStore,
    pub tokens: TokenStore,
}

impl Models {
    pub fn new(pool: PgPool, config: &AppConfig) -> Self {
        let timeout = Duration::from_secs(config.database.query_timeout_secs);
        Self {
            officers: Store::new(pool.clone(), timeout),
            courses: Store::new(pool.clone(), timeout),
            sessions: Store::new(pool.clone(), timeout),
            facilitators: Store::new(pool.clone(), timeout),
            attendance: Store::new(pool.clone(), timeout),
            session_facilitators: Store::new(pool.clone(), timeout),
            session_feedback: Store::new(pool.clone(), timeout),
            import_jobs: Store::new(pool.clone(), timeout),
            users: UserStore::new(pool.clone(), timeout),
            tokens: TokenStore::new(pool, timeout),
        }
    }
}
