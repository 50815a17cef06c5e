// Ledger Keeper - Web Server
// REST API over the per-kind ledgers with Axum

use anyhow::{Context, Result};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use ledger_keeper::{
    config::Config, logging, BudgetLine, EntryKind, Fields, Ledger, LedgerError, Ledgers,
    Listing, Record, Report, ReportScope, Store,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }
}

impl ApiResponse<()> {
    fn failed(message: String) -> Self {
        Self {
            success: false,
            data: (),
            error: Some(message),
        }
    }
}

type ApiResult<T> = std::result::Result<Json<ApiResponse<T>>, ApiError>;

struct ApiError(LedgerError);

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError(err)
    }
}

fn status_for(err: &LedgerError) -> StatusCode {
    match err {
        LedgerError::Validation(_) | LedgerError::InvalidField { .. } => StatusCode::BAD_REQUEST,
        LedgerError::NotFound { .. } => StatusCode::NOT_FOUND,
        LedgerError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            error!(error = %self.0, "request failed");
        }
        (status, Json(ApiResponse::failed(self.0.to_string()))).into_response()
    }
}

#[derive(Deserialize)]
struct SearchParams {
    field: String,
    value: String,
}

#[derive(Deserialize)]
struct ScopeParams {
    scope: Option<String>,
}

impl ScopeParams {
    fn resolve(&self, default: ReportScope) -> Result<ReportScope, LedgerError> {
        match self.scope.as_deref() {
            Some(raw) => raw.parse(),
            None => Ok(default),
        }
    }
}

#[derive(Serialize)]
struct Created {
    id: i64,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/:kind/entries
async fn list_entries<K: EntryKind>(State(ledger): State<Ledger<K>>) -> ApiResult<Listing<K>> {
    Ok(Json(ApiResponse::ok(ledger.listing()?)))
}

/// POST /api/:kind/entries
async fn create_entry<K: EntryKind>(
    State(ledger): State<Ledger<K>>,
    Json(fields): Json<Fields>,
) -> std::result::Result<(StatusCode, Json<ApiResponse<Created>>), ApiError> {
    let id = ledger.add_entry(&fields)?;
    info!(kind = %K::KIND, id, "entry created");
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(Created { id }))))
}

/// GET /api/:kind/entries/:id
async fn get_entry<K: EntryKind>(
    State(ledger): State<Ledger<K>>,
    Path(id): Path<i64>,
) -> ApiResult<Record<K>> {
    Ok(Json(ApiResponse::ok(ledger.get(id)?)))
}

/// DELETE /api/:kind/entries/:id
async fn delete_entry<K: EntryKind>(
    State(ledger): State<Ledger<K>>,
    Path(id): Path<i64>,
) -> ApiResult<Created> {
    ledger.remove_entry(id)?;
    info!(kind = %K::KIND, id, "entry removed");
    Ok(Json(ApiResponse::ok(Created { id })))
}

/// GET /api/:kind/search?field=&value=
async fn search_entries<K: EntryKind>(
    State(ledger): State<Ledger<K>>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Listing<K>> {
    let listing = Listing::from_result(ledger.search(&params.field, &params.value))?;
    Ok(Json(ApiResponse::ok(listing)))
}

/// GET /api/:kind/month/:token
async fn month_entries<K: EntryKind>(
    State(ledger): State<Ledger<K>>,
    Path(token): Path<String>,
) -> ApiResult<Listing<K>> {
    let listing = Listing::from_result(ledger.by_month(&token))?;
    Ok(Json(ApiResponse::ok(listing)))
}

/// GET /api/:kind/report?scope=all|current|YYYY-MM
async fn report<K: EntryKind>(
    State(ledger): State<Ledger<K>>,
    Query(params): Query<ScopeParams>,
) -> ApiResult<Report> {
    let scope = params.resolve(ReportScope::AllTime)?;
    Ok(Json(ApiResponse::ok(ledger.report(scope)?)))
}

/// GET /api/budget-status?scope=
async fn budget_status(
    State(ledgers): State<Ledgers>,
    Query(params): Query<ScopeParams>,
) -> ApiResult<Vec<BudgetLine>> {
    let scope = params.resolve(ReportScope::CurrentMonth)?;
    Ok(Json(ApiResponse::ok(ledgers.budget_status(scope)?)))
}

/// Routes for one kind, nested under `/api/<kind>`.
fn kind_routes<K: EntryKind>(ledger: Ledger<K>) -> Router {
    Router::new()
        .route("/entries", get(list_entries::<K>).post(create_entry::<K>))
        .route("/entries/:id", get(get_entry::<K>).delete(delete_entry::<K>))
        .route("/search", get(search_entries::<K>))
        .route("/month/:token", get(month_entries::<K>))
        .route("/report", get(report::<K>))
        .with_state(ledger)
}

fn api_routes(ledgers: Ledgers) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/budget-status", get(budget_status))
        .with_state(ledgers.clone())
        .nest(&format!("/{}", ledgers.income.kind()), kind_routes(ledgers.income))
        .nest(&format!("/{}", ledgers.expenses.kind()), kind_routes(ledgers.expenses))
        .nest(&format!("/{}", ledgers.budgets.kind()), kind_routes(ledgers.budgets))
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load(None)?;
    logging::init_tracing(&config.log_filter);

    println!("🌐 Ledger Keeper v{} - Web Server", ledger_keeper::VERSION);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    config.ensure_database_dir()?;
    let store = Store::open(&config.database_path).with_context(|| {
        format!("Failed to open database {}", config.database_path.display())
    })?;
    info!(path = %config.database_path.display(), "database opened");

    let ledgers = Ledgers::new(Arc::new(store));

    let app = Router::new()
        .nest("/api", api_routes(ledgers))
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_address))?;

    println!("\n🚀 Server running on http://{}", config.bind_address);
    println!("   API: http://{}/api/expense/entries", config.bind_address);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .await
        .context("Server stopped with an error")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(status_for(&LedgerError::validation("bad")), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_for(&LedgerError::NotFound { kind: "expense", id: 999 }),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&LedgerError::Storage("locked".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_scope_defaults() {
        let params = ScopeParams { scope: None };
        assert_eq!(params.resolve(ReportScope::CurrentMonth).unwrap(), ReportScope::CurrentMonth);

        let params = ScopeParams { scope: Some("13-2024".into()) };
        assert!(params.resolve(ReportScope::AllTime).is_err());
    }
}
