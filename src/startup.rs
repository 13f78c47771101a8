use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    response::Html,
    routing::{delete, get, post, put},
    Json, Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::{handlers, middleware, openapi::ApiDoc};

pub fn build_router(state: Arc<crate::AppState>) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin("http://localhost:3000".parse::<HeaderValue>().unwrap())
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .allow_credentials(true);

    // Auth routes
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth_handler::register))
        .route("/login", post(handlers::auth_handler::login))
        .route("/logout", post(handlers::auth_handler::logout))
        .route("/me", get(handlers::auth_handler::get_me));

    // User management routes
    let user_routes = Router::new()
        .route("/", get(handlers::users_handler::get_users))
        // Must come before /{id} to prevent route shadowing
        .route("/pending", get(handlers::users_handler::get_pending_users))
        .route("/{id}", get(handlers::users_handler::get_user))
        .route("/{id}/approve", post(handlers::users_handler::approve_user))
        .route("/{id}/reject", post(handlers::users_handler::reject_user))
        .route("/{id}/activate", post(handlers::users_handler::activate_user))
        .route("/{id}/deactivate", post(handlers::users_handler::deactivate_user));

    // Hospital routes
    let hospital_routes = Router::new()
        .route("/", get(handlers::hospitals_handler::get_hospitals))
        .route("/", post(handlers::hospitals_handler::create_hospital))
        .route("/{id}", get(handlers::hospitals_handler::get_hospital))
        .route("/{id}", put(handlers::hospitals_handler::update_hospital));

    // Resource routes
    let resource_routes = Router::new()
        .route("/", get(handlers::resources_handler::get_resources))
        .route("/", post(handlers::resources_handler::create_resource))
        .route("/available", get(handlers::resources_handler::get_available_resources))
        .route("/{id}", get(handlers::resources_handler::get_resource))
        .route("/{id}", put(handlers::resources_handler::update_resource))
        .route("/{id}", delete(handlers::resources_handler::delete_resource));

    // Patient routes, including the nested clinical sub-records
    let patient_routes = Router::new()
        .route("/", get(handlers::patients_handler::get_patients))
        .route("/", post(handlers::patients_handler::create_patient))
        .route("/{id}", get(handlers::patients_handler::get_patient))
        .route("/{id}", put(handlers::patients_handler::update_patient))
        .route("/{id}", delete(handlers::patients_handler::delete_patient))
        .route("/{id}/reassign", post(handlers::patients_handler::reassign_patient))
        .route(
            "/{id}/observations",
            get(handlers::patients_handler::get_observations)
                .post(handlers::patients_handler::create_observation),
        )
        .route(
            "/{id}/diagnosis",
            get(handlers::patients_handler::get_diagnoses)
                .post(handlers::patients_handler::create_diagnosis),
        )
        .route(
            "/{id}/tests",
            get(handlers::patients_handler::get_test_orders)
                .post(handlers::patients_handler::create_test_order),
        )
        .route(
            "/{id}/prescriptions",
            get(handlers::patients_handler::get_prescriptions)
                .post(handlers::patients_handler::create_prescription),
        )
        .route(
            "/{id}/notes",
            get(handlers::patients_handler::get_notes)
                .post(handlers::patients_handler::create_note),
        )
        .route(
            "/{id}/labs",
            get(handlers::patients_handler::get_lab_reports)
                .post(handlers::patients_handler::create_lab_report),
        );

    // Assignment routes (read-only) and analytics
    let assignment_routes =
        Router::new().route("/", get(handlers::assignments_handler::get_assignments));
    let analytics_routes = Router::new().route(
        "/assignment-times",
        get(handlers::assignments_handler::get_assignment_times),
    );

    // Triage
    let triage_routes = Router::new().route("/", post(handlers::triage_handler::suggest_triage));

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics_handler))
        .nest("/api/auth", auth_routes)
        .nest("/api/users", user_routes)
        .nest("/api/hospitals", hospital_routes)
        .nest("/api/resources", resource_routes)
        .nest("/api/patients", patient_routes)
        .nest("/api/assignments", assignment_routes)
        .nest("/api/analytics", analytics_routes)
        .nest("/api/triage", triage_routes)
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .route("/swagger-ui", get(swagger_ui))
        .layer(axum_middleware::from_fn(middleware::metrics_middleware))
        .layer(axum_middleware::from_fn(middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn swagger_ui() -> Html<&'static str> {
    Html(r#"
<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Wardflow API Documentation</title>
    <link rel="stylesheet" type="text/css" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css" />
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-standalone-preset.js"></script>
    <script>
        window.onload = () => {
            window.ui = SwaggerUIBundle({
                url: '/api-docs/openapi.json',
                dom_id: '#swagger-ui',
                presets: [
                    SwaggerUIBundle.presets.apis,
                    SwaggerUIStandalonePreset
                ],
                layout: "StandaloneLayout"
            });
        };
    </script>
</body>
</html>
    "#)
}
