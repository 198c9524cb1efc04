mod handlers;
mod helpers;
mod reports;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};

use crate::core::config::Settings;
use crate::core::state::AppState;

pub(crate) fn router(settings: &Settings) -> Router<AppState> {
    let report_body_limit = settings.iep().report_body_limit();

    Router::new()
        .route("/class", get(handlers::class_reports))
        .route("/student/:student_id", get(handlers::get_report))
        .route("/objective/:objective_id/support-level", put(handlers::update_support_level))
        .route(
            "/student/:student_id/objective/:objective_id/support-level",
            put(handlers::update_support_level_legacy),
        )
        .route(
            "/student/:student_id/objective/:objective_id/remarks",
            put(handlers::update_remarks),
        )
        .route("/student/:student_id/bulk-update", put(handlers::bulk_update))
        .route(
            "/student/:student_id/refresh-interventions",
            put(handlers::refresh_interventions),
        )
        .route(
            "/student/:student_id/send-report",
            post(reports::send_report).layer(DefaultBodyLimit::max(report_body_limit)),
        )
        .route("/student/:student_id/reports", get(reports::list_sent_reports))
}
