//! # API Server Module
//!
//! ## Purpose
//! REST API server exposing the inventory operations to the browser
//! frontend: listings, CRUD, duplicate checks, reference-price lookup, and
//! autocomplete suggestions.
//!
//! ## Input/Output Specification
//! - **Input**: HTTP requests with camelCase query parameters and JSON
//!   bodies matching the frontend's existing shapes
//! - **Output**: JSON envelopes with a `success` flag, payload, and a
//!   human-readable `message` where the UI shows one
//! - **Error mapping**: invalid input → 400, unknown id → 404, duplicate
//!   rejection → 409, anything else → 500
//!
//! ## Key Features
//! - CORS support for the web frontend
//! - Dates accepted as either plain calendar days or full RFC 3339 instants
//! - Duplicate conflicts carry the conflicting record's field values

use crate::engine::ListView;
use crate::errors::{Result, StockError};
use crate::matching::DuplicateCandidate;
use crate::normalize::normalize_date_to_day;
use crate::pricing::PriceCandidate;
use crate::query::ListParams;
use crate::storage::{ModelUpdate, NewModel, QuantityOp};
use crate::{AppState, InventoryModel, ModelId};
use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer, Result as ActixResult};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;

/// API server wrapping the shared application state
pub struct ApiServer {
    app_state: AppState,
}

/// Query parameters for duplicate checks
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateCheckQuery {
    #[serde(default)]
    pub model_name: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub colour: String,
    pub purchase_date: Option<String>,
    pub purchased_in_warranty: Option<bool>,
    pub exclude_id: Option<ModelId>,
}

/// Query parameters for the reference-price check
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceCheckQuery {
    #[serde(default)]
    pub model_name: String,
    #[serde(default)]
    pub company: String,
    pub purchase_date: Option<String>,
    pub purchased_in_warranty: Option<bool>,
}

/// Query parameters for suggestion endpoints
#[derive(Debug, Deserialize)]
pub struct SuggestQuery {
    pub search: Option<String>,
}

/// Query parameters for the listing endpoint
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub search: Option<String>,
    pub company: Option<String>,
    pub colour: Option<String>,
    pub stock_status: Option<String>,
    pub warranty: Option<String>,
    pub limit: Option<usize>,
    pub view: Option<String>,
}

/// JSON body for record creation
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateModelRequest {
    #[serde(default)]
    pub model_name: String,
    #[serde(default)]
    pub company: String,
    pub colour: Option<String>,
    pub quantity: Option<u32>,
    pub purchase_price: Option<f64>,
    pub purchased_in_warranty: Option<bool>,
    pub purchase_date: Option<String>,
}

/// JSON body for record updates; absent fields are left unchanged
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateModelRequest {
    pub model_name: Option<String>,
    pub company: Option<String>,
    pub colour: Option<String>,
    pub quantity: Option<u32>,
    pub purchase_price: Option<f64>,
    pub purchased_in_warranty: Option<bool>,
    pub purchase_date: Option<String>,
}

/// JSON body for quantity mutations
#[derive(Debug, Deserialize)]
pub struct QuantityRequest {
    pub quantity: u32,
    #[serde(rename = "type")]
    pub op: Option<String>,
}

impl ApiServer {
    /// Create a new API server
    pub fn new(app_state: AppState) -> Self {
        Self { app_state }
    }

    /// Run the API server until the process is stopped
    pub async fn run(self) -> Result<()> {
        let config = self.app_state.config.clone();
        let bind_addr = format!("{}:{}", config.server.host, config.server.port);
        let app_state = self.app_state;

        tracing::info!("Starting API server on {}", bind_addr);

        let server = HttpServer::new(move || {
            let cors = if app_state.config.server.enable_cors {
                Cors::permissive()
            } else {
                Cors::default()
            };

            App::new()
                .wrap(cors)
                .app_data(web::Data::new(app_state.clone()))
                .route("/health", web::get().to(health_handler))
                .service(
                    web::scope("/api/models")
                        .route("/check-duplicate", web::get().to(check_duplicate_handler))
                        .route(
                            "/check-duplicate-edit",
                            web::get().to(check_duplicate_edit_handler),
                        )
                        .route(
                            "/check-purchase-price",
                            web::get().to(check_purchase_price_handler),
                        )
                        .route("/suggestions", web::get().to(model_suggestions_handler))
                        .route(
                            "/company-suggestions",
                            web::get().to(company_suggestions_handler),
                        )
                        .route("/all-model-names", web::get().to(all_model_names_handler))
                        .route("/all-companies", web::get().to(all_companies_handler))
                        .route("/analytics", web::get().to(analytics_handler))
                        .route("", web::get().to(list_models_handler))
                        .route("", web::post().to(create_model_handler))
                        .route("/{id}", web::get().to(get_model_handler))
                        .route("/{id}", web::put().to(update_model_handler))
                        .route("/{id}", web::delete().to(delete_model_handler))
                        .route("/{id}/quantity", web::put().to(update_quantity_handler)),
                )
        })
        .workers(config.server.workers)
        .bind(&bind_addr)
        .map_err(|e| StockError::Internal {
            message: format!("Failed to bind server to {}: {}", bind_addr, e),
        })?
        .run();

        server.await.map_err(|e| StockError::Internal {
            message: format!("Server error: {}", e),
        })?;

        Ok(())
    }
}

/// Parse a date parameter that may be a plain calendar day or a full
/// RFC 3339 instant. Unparseable values are treated as absent; the matching
/// logic then reports no match rather than failing the request.
fn parse_date_param(value: Option<&str>) -> Option<DateTime<Utc>> {
    let value = value?.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Some(instant.with_timezone(&Utc));
    }
    if let Ok(day) = value.parse::<NaiveDate>() {
        return Some(day.and_hms_opt(0, 0, 0)?.and_utc());
    }
    tracing::debug!(value, "unparseable date parameter ignored");
    None
}

/// Translate an error into the response the frontend expects.
fn error_response(e: &StockError) -> HttpResponse {
    let body = json!({
        "success": false,
        "message": e.to_string(),
    });
    match e {
        StockError::InvalidInput { .. } | StockError::ValidationFailed { .. } => {
            HttpResponse::BadRequest().json(body)
        }
        StockError::NotFound { .. } => HttpResponse::NotFound().json(body),
        StockError::DuplicateModel { .. } => HttpResponse::Conflict().json(body),
        _ => {
            tracing::error!(category = e.category(), error = %e, "request failed");
            HttpResponse::InternalServerError().json(body)
        }
    }
}

fn duplicate_message(record: &InventoryModel) -> String {
    format!(
        "A model with identical details already exists (Name: {}, Company: {}, Colour: {}, Date: {}, Warranty: {})",
        record.model_name,
        record.company,
        record.colour,
        normalize_date_to_day(record.purchase_date),
        record.purchased_in_warranty,
    )
}

async fn check_duplicate_handler(
    app_state: web::Data<AppState>,
    query: web::Query<DuplicateCheckQuery>,
) -> ActixResult<HttpResponse> {
    let candidate = DuplicateCandidate {
        model_name: query.model_name.clone(),
        company: query.company.clone(),
        colour: query.colour.clone(),
        purchase_date: parse_date_param(query.purchase_date.as_deref()),
        purchased_in_warranty: query.purchased_in_warranty,
    };

    match app_state.engine.check_duplicate(&candidate).await {
        Ok(result) => {
            let message = match &result.matched {
                Some(record) => duplicate_message(record),
                None => "No exact duplicate found - creation allowed".to_string(),
            };
            Ok(HttpResponse::Ok().json(json!({
                "success": true,
                "exists": result.exists,
                "model": result.matched,
                "message": message,
            })))
        }
        Err(e) => Ok(error_response(&e)),
    }
}

async fn check_duplicate_edit_handler(
    app_state: web::Data<AppState>,
    query: web::Query<DuplicateCheckQuery>,
) -> ActixResult<HttpResponse> {
    let exclude_id = match query.exclude_id {
        Some(id) => id,
        None => {
            return Ok(error_response(&StockError::InvalidInput {
                message: "Missing required parameters for duplicate check".to_string(),
            }))
        }
    };

    let candidate = DuplicateCandidate {
        model_name: query.model_name.clone(),
        company: query.company.clone(),
        colour: query.colour.clone(),
        purchase_date: parse_date_param(query.purchase_date.as_deref()),
        purchased_in_warranty: query.purchased_in_warranty,
    };

    match app_state
        .engine
        .check_duplicate_for_edit(&candidate, exclude_id)
        .await
    {
        Ok(result) => {
            let message = if result.exists {
                "A model with these details already exists"
            } else {
                "No duplicate found"
            };
            Ok(HttpResponse::Ok().json(json!({
                "success": true,
                "exists": result.exists,
                "message": message,
            })))
        }
        Err(e) => Ok(error_response(&e)),
    }
}

async fn check_purchase_price_handler(
    app_state: web::Data<AppState>,
    query: web::Query<PriceCheckQuery>,
) -> ActixResult<HttpResponse> {
    let candidate = PriceCandidate {
        model_name: query.model_name.clone(),
        company: query.company.clone(),
        purchase_date: parse_date_param(query.purchase_date.as_deref()),
        purchased_in_warranty: query.purchased_in_warranty,
    };

    let result = app_state.engine.check_reference_price(&candidate).await;
    let message = match &result.reference {
        Some(record) => format!(
            "Found existing purchase price of {} for {} {} ({})",
            record.purchase_price, record.model_name, record.company, record.colour
        ),
        None => "No existing purchase price found for models with these details".to_string(),
    };

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "hasPrice": result.has_price,
        "purchasePrice": result.price,
        "referenceModel": result.reference,
        "message": message,
    })))
}

async fn model_suggestions_handler(
    app_state: web::Data<AppState>,
    query: web::Query<SuggestQuery>,
) -> ActixResult<HttpResponse> {
    let suggestions = app_state
        .engine
        .suggest_model_names(query.search.as_deref().unwrap_or(""))
        .await;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "suggestions": suggestions,
    })))
}

async fn company_suggestions_handler(
    app_state: web::Data<AppState>,
    query: web::Query<SuggestQuery>,
) -> ActixResult<HttpResponse> {
    let companies = app_state
        .engine
        .suggest_companies(query.search.as_deref().unwrap_or(""))
        .await;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "companies": companies,
    })))
}

async fn all_model_names_handler(app_state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    match app_state.engine.all_model_names().await {
        Ok(names) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "modelNames": names,
            "total": names.len(),
        }))),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn all_companies_handler(app_state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    match app_state.engine.all_companies().await {
        Ok(companies) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "companies": companies,
            "total": companies.len(),
        }))),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn list_models_handler(
    app_state: web::Data<AppState>,
    query: web::Query<ListQuery>,
) -> ActixResult<HttpResponse> {
    let params = ListParams {
        search: query.search.clone(),
        company: query.company.clone(),
        colour: query.colour.clone(),
        stock_status: query.stock_status.clone(),
        warranty: query.warranty.clone(),
    };
    let view = ListView::parse(query.view.as_deref());

    match app_state.engine.list_models(&params, view, query.limit).await {
        Ok(listing) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": listing.data,
            "total": listing.total,
            "filters": {
                "companies": listing.companies,
                "colours": listing.colours,
            },
        }))),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn create_model_handler(
    app_state: web::Data<AppState>,
    request: web::Json<CreateModelRequest>,
) -> ActixResult<HttpResponse> {
    let request = request.into_inner();
    let quantity = match request.quantity {
        Some(q) => q,
        None => {
            return Ok(error_response(&StockError::InvalidInput {
                message: "Please provide modelName, company, and quantity".to_string(),
            }))
        }
    };

    let input = NewModel {
        model_name: request.model_name,
        company: request.company,
        colour: request.colour,
        quantity,
        purchase_price: request.purchase_price,
        purchased_in_warranty: request.purchased_in_warranty,
        purchase_date: parse_date_param(request.purchase_date.as_deref()),
    };

    match app_state.engine.create_model(input).await {
        Ok(record) => Ok(HttpResponse::Created().json(json!({
            "success": true,
            "data": record,
        }))),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn get_model_handler(
    app_state: web::Data<AppState>,
    path: web::Path<ModelId>,
) -> ActixResult<HttpResponse> {
    let id = path.into_inner();
    match app_state.engine.get_model(id).await {
        Ok(Some(record)) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": record,
        }))),
        Ok(None) => Ok(error_response(&StockError::NotFound { id: id.to_string() })),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn update_model_handler(
    app_state: web::Data<AppState>,
    path: web::Path<ModelId>,
    request: web::Json<UpdateModelRequest>,
) -> ActixResult<HttpResponse> {
    let request = request.into_inner();
    let update = ModelUpdate {
        model_name: request.model_name,
        company: request.company,
        colour: request.colour,
        quantity: request.quantity,
        purchase_price: request.purchase_price,
        purchased_in_warranty: request.purchased_in_warranty,
        purchase_date: parse_date_param(request.purchase_date.as_deref()),
    };

    match app_state.engine.update_model(path.into_inner(), update).await {
        Ok(record) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": record,
        }))),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn delete_model_handler(
    app_state: web::Data<AppState>,
    path: web::Path<ModelId>,
) -> ActixResult<HttpResponse> {
    match app_state.engine.delete_model(path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Model deleted successfully",
        }))),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn update_quantity_handler(
    app_state: web::Data<AppState>,
    path: web::Path<ModelId>,
    request: web::Json<QuantityRequest>,
) -> ActixResult<HttpResponse> {
    let op = QuantityOp::parse(request.op.as_deref());
    match app_state
        .engine
        .update_quantity(path.into_inner(), request.quantity, op)
        .await
    {
        Ok(record) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": record,
        }))),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn analytics_handler(app_state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    match app_state.engine.analytics().await {
        Ok(analytics) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": analytics,
        }))),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn health_handler(app_state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let engine_status = match app_state.engine.health_check().await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };
    let storage_status = match app_state.store.health_check().await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    let healthy = engine_status == "healthy" && storage_status == "healthy";
    Ok(HttpResponse::Ok().json(json!({
        "status": if healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "components": {
            "engine": engine_status,
            "storage": storage_status,
        },
    })))
}
