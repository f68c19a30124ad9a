//! HTTP API for the payslip engine.
//!
//! A small REST surface over the composer, the period resolver and the
//! layout engine, built on [`axum`](https://crates.io/crates/axum).
//! Clients post an employee record and a period and receive either the
//! computed payslip model as JSON or the rendered PDF.  The API never
//! writes files, sends email or touches the sent log; those belong to
//! the batch run.

use crate::engine::compose;
use crate::layout::{self, CompanyProfile};
use crate::models::{EmployeeRecord, PayPeriod};
use crate::pdf::render_pdf;
use crate::period;
use anyhow::Result;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Application state shared across requests.
pub struct AppState {
    pub company: CompanyProfile,
    /// SVG source of the logo, already checked at start-up.
    pub logo: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PayslipRequest {
    pub record: EmployeeRecord,
    pub period: PayPeriod,
}

#[derive(Debug, Deserialize)]
pub struct PeriodsRequest {
    pub joining_date: NaiveDate,
    pub current_date: NaiveDate,
    #[serde(default)]
    pub all_past: bool,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let body = Json(serde_json::json!({ "error": message.into() }));
    (status, body).into_response()
}

fn unprocessable_record() -> Response {
    error_response(
        StatusCode::BAD_REQUEST,
        "record needs both employee_id and full_name",
    )
}

/// Build the API router around `state`.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/payslip", post(payslip_handler))
        .route("/api/payslip/pdf", post(payslip_pdf_handler))
        .route("/api/periods", post(periods_handler))
        .with_state(state)
}

/// Handler for POST /api/payslip
async fn payslip_handler(Json(input): Json<PayslipRequest>) -> Response {
    if !input.record.is_processable() {
        return unprocessable_record();
    }
    match compose(&input.record, input.period) {
        Ok(model) => (StatusCode::OK, Json(model)).into_response(),
        Err(err) => error_response(StatusCode::UNPROCESSABLE_ENTITY, err.to_string()),
    }
}

/// Handler for POST /api/payslip/pdf
async fn payslip_pdf_handler(
    State(app_state): State<Arc<AppState>>,
    Json(input): Json<PayslipRequest>,
) -> Response {
    if !input.record.is_processable() {
        return unprocessable_record();
    }
    let model = match compose(&input.record, input.period) {
        Ok(model) => model,
        Err(err) => return error_response(StatusCode::UNPROCESSABLE_ENTITY, err.to_string()),
    };
    let page = layout::render(
        &model,
        &input.record,
        &app_state.company,
        app_state.logo.as_deref(),
    );
    for warning in &page.warnings {
        warn!(employee = %input.record.employee_id, "{warning}");
    }
    let title = format!("Payslip {} {}", input.record.full_name, input.period);
    match render_pdf(&page, &title) {
        Ok(bytes) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/pdf")],
            bytes,
        )
            .into_response(),
        Err(err) => error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

/// Handler for POST /api/periods
async fn periods_handler(Json(input): Json<PeriodsRequest>) -> Json<Vec<PayPeriod>> {
    Json(period::resolve(
        input.joining_date,
        input.current_date,
        input.all_past,
    ))
}

/// Launch the API server on `addr`.  Runs until the process is
/// interrupted.
pub async fn serve(addr: &str, state: AppState) -> Result<()> {
    let router = build_router(Arc::new(state));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "server listening");
    axum::serve(listener, router).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Rgb;
    use crate::logo::DEFAULT_LOGO_SVG;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn router() -> Router {
        build_router(Arc::new(AppState {
            company: CompanyProfile {
                name: "Arun Arudra".into(),
                address_lines: vec!["Bengaluru".into()],
                brand_color: Rgb::BLACK,
            },
            logo: Some(DEFAULT_LOGO_SVG.to_string()),
        }))
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn sample_record() -> serde_json::Value {
        serde_json::json!({
            "employee_id": "AA001",
            "full_name": "Arun Kumar",
            "date_of_joining": "27-08-2025",
            "compensation": { "basic": "23500", "hra": "11750" },
            "attendance": { "total_working_days": "20", "actual_payable_days": "19" },
            "deductions": { "professional_tax": "200" }
        })
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn composes_a_payslip() {
        let request = post_json(
            "/api/payslip",
            serde_json::json!({
                "record": sample_record(),
                "period": { "year": 2025, "month": 11 }
            }),
        );
        let response = router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["earnings"][0]["label"], "Basic");
        assert_eq!(body["days"]["loss_of_pay_days"], "1");
        assert!(body["net_salary_in_words"].as_str().unwrap().ends_with("only"));
    }

    #[tokio::test]
    async fn rejects_a_record_without_a_name() {
        let request = post_json(
            "/api/payslip",
            serde_json::json!({
                "record": { "employee_id": "AA001" },
                "period": { "year": 2025, "month": 11 }
            }),
        );
        let response = router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(json_body(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn rejects_an_invalid_month() {
        let request = post_json(
            "/api/payslip",
            serde_json::json!({
                "record": sample_record(),
                "period": { "year": 2025, "month": 13 }
            }),
        );
        let response = router().oneshot(request).await.unwrap();
        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn oversized_amount_is_rejected_without_crashing() {
        let mut record = sample_record();
        record["compensation"]["basic"] = "79228162514264337593543950335".into();
        for uri in ["/api/payslip", "/api/payslip/pdf"] {
            let request = post_json(
                uri,
                serde_json::json!({
                    "record": record.clone(),
                    "period": { "year": 2025, "month": 11 }
                }),
            );
            let response = router().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
            let body = json_body(response).await;
            assert!(body["error"].as_str().unwrap().contains("Basic"));
        }
    }

    #[tokio::test]
    async fn lists_periods_since_joining() {
        let request = post_json(
            "/api/periods",
            serde_json::json!({
                "joining_date": "2024-11-20",
                "current_date": "2025-02-10",
                "all_past": true
            }),
        );
        let response = router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let periods: Vec<PayPeriod> = serde_json::from_value(json_body(response).await).unwrap();
        assert_eq!(periods.len(), 4);
        assert_eq!(periods[0], PayPeriod::new(2024, 11).unwrap());
        assert_eq!(periods[3], PayPeriod::new(2025, 2).unwrap());
    }

    #[tokio::test]
    async fn renders_a_pdf() {
        let request = post_json(
            "/api/payslip/pdf",
            serde_json::json!({
                "record": sample_record(),
                "period": { "year": 2025, "month": 11 }
            }),
        );
        let response = router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/pdf"
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
