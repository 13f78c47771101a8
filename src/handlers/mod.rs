pub mod assignments_handler;
pub mod auth_handler;
pub mod health;
pub mod hospitals_handler;
pub mod metrics;
pub mod patients_handler;
pub mod resources_handler;
pub mod triage_handler;
pub mod users_handler;

pub use health::health_check;
pub use metrics::{metrics_handler, setup_metrics_recorder, MetricsState};
