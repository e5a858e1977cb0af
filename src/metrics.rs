/// Metrics and telemetry for the portfolio service
///
/// Provides Prometheus-compatible metrics for monitoring:
/// - HTTP request counts and latencies
/// - Content store fetch outcomes per collection
/// - Contact submission outcomes
/// - Category selections and mounted sessions
/// - Background job execution

use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, register_int_gauge, Encoder, HistogramVec,
    IntCounterVec, IntGauge, TextEncoder,
};

lazy_static! {
    // ========== HTTP Metrics ==========

    /// Total HTTP requests by method, path, and status
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .unwrap();

    /// HTTP request duration in seconds
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request latencies in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .unwrap();

    // ========== Content Metrics ==========

    /// Content fetches by collection and outcome
    pub static ref CONTENT_FETCHES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "content_fetches_total",
        "Total number of content store fetches",
        &["collection", "outcome"]
    )
    .unwrap();

    /// Content fetch duration in seconds
    pub static ref CONTENT_FETCH_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "content_fetch_duration_seconds",
        "Content store fetch latencies in seconds",
        &["collection"],
        vec![0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .unwrap();

    /// Category selections by collection
    pub static ref CATEGORY_SELECTIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "category_selections_total",
        "Total number of category filter changes",
        &["collection"]
    )
    .unwrap();

    // ========== Contact Metrics ==========

    /// Contact submissions by outcome (invalid, submitted, failed)
    pub static ref CONTACT_SUBMISSIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "contact_submissions_total",
        "Total number of contact form submissions",
        &["outcome"]
    )
    .unwrap();

    // ========== Session Metrics ==========

    /// Currently mounted sessions
    pub static ref ACTIVE_SESSIONS: IntGauge = register_int_gauge!(
        "active_sessions",
        "Number of mounted page sessions"
    )
    .unwrap();

    // ========== Background Job Metrics ==========

    /// Background job executions by type and status
    pub static ref BACKGROUND_JOBS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "background_jobs_total",
        "Total number of background job executions",
        &["job_type", "status"]
    )
    .unwrap();
}

/// Render metrics in Prometheus text format
pub fn render_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "failed to encode metrics");
        return String::new();
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Record an HTTP request
pub fn record_http_request(method: &str, path: &str, status: u16, duration: f64) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration);
}

/// Record a content fetch
pub fn record_content_fetch(collection: &str, success: bool, duration: f64) {
    CONTENT_FETCHES_TOTAL
        .with_label_values(&[collection, if success { "success" } else { "failure" }])
        .inc();
    CONTENT_FETCH_DURATION_SECONDS
        .with_label_values(&[collection])
        .observe(duration);
}

/// Record a category change
pub fn record_category_selection(collection: &str) {
    CATEGORY_SELECTIONS_TOTAL
        .with_label_values(&[collection])
        .inc();
}

/// Record a contact submission attempt
pub fn record_contact_submission(outcome: &str) {
    CONTACT_SUBMISSIONS_TOTAL
        .with_label_values(&[outcome])
        .inc();
}

/// Record a background job execution
pub fn record_background_job(job_type: &str, status: &str) {
    BACKGROUND_JOBS_TOTAL
        .with_label_values(&[job_type, status])
        .inc();
}
