pub mod attendance;
pub mod courses;
pub mod facilitators;
pub mod healthcheck;
pub mod import_jobs;
pub mod officers;
pub mod session_facilitators;
pub mod session_feedback;
pub mod sessions;
pub mod tokens;
pub mod users;
