use crate::application::NlQueryUseCase;
use crate::domain::error::AppError;
use crate::infrastructure::config::ServerConfig;
use actix_cors::Cors;
use actix_web::error::InternalError;
use actix_web::{dev::Server, get, post, web, App, HttpRequest, HttpResponse, HttpServer, Responder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};
use validator::{Validate, ValidationErrors};

pub const MISSING_PROMPT_MESSAGE: &str = "Missing 'prompt' in the request body.";

/// Immutable state shared by all workers.
pub struct AppState {
    pub nl_query: NlQueryUseCase,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PromptRequest {
    #[validate(
        required(message = "Missing 'prompt' in the request body."),
        length(min = 1, message = "Prompt cannot be empty.")
    )]
    pub prompt: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub tables: usize,
}

fn first_validation_message(errors: &ValidationErrors) -> String {
    errors
        .field_errors()
        .values()
        .flat_map(|errs| errs.iter())
        .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| errors.to_string())
}

fn error_response(err: &AppError) -> HttpResponse {
    let body = ErrorBody {
        error: err.to_string(),
    };
    if err.is_client_error() {
        warn!(error = %err, "Rejected request");
        HttpResponse::BadRequest().json(body)
    } else {
        error!(error = %err, "Request failed");
        HttpResponse::InternalServerError().json(body)
    }
}

/// Validated prompt text, or the error to send back.
fn prompt_from(req: &PromptRequest) -> Result<&str, AppError> {
    req.validate()
        .map_err(|e| AppError::ValidationError(first_validation_message(&e)))?;
    req.prompt
        .as_deref()
        .ok_or_else(|| AppError::ValidationError(MISSING_PROMPT_MESSAGE.to_string()))
}

#[post("/generate-and-execute")]
async fn generate_and_execute(
    data: web::Data<AppState>,
    req: web::Json<PromptRequest>,
) -> impl Responder {
    let prompt = match prompt_from(&req) {
        Ok(prompt) => prompt,
        Err(e) => return error_response(&e),
    };
    info!(prompt, "Generating and executing query");

    match data.nl_query.generate_and_execute(prompt).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => error_response(&e),
    }
}

#[post("/generate-query")]
async fn generate_query(data: web::Data<AppState>, req: web::Json<PromptRequest>) -> impl Responder {
    let prompt = match prompt_from(&req) {
        Ok(prompt) => prompt,
        Err(e) => return error_response(&e),
    };
    info!(prompt, "Generating query");

    match data.nl_query.generate_only(prompt).await {
        Ok(generated) => HttpResponse::Ok().json(generated),
        Err(e) => error_response(&e),
    }
}

#[get("/health")]
async fn health(data: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        tables: data.nl_query.schema().len(),
    })
}

/// Malformed or non-JSON bodies become a 400 with the usual error shape.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req: &HttpRequest| {
        let message = format!("Invalid request body: {}", err);
        warn!(error = %err, "Rejected malformed JSON body");
        InternalError::from_response(
            err,
            HttpResponse::BadRequest().json(ErrorBody { error: message }),
        )
        .into()
    })
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .service(generate_and_execute)
        .service(generate_query)
        .service(health);
}

fn cors(origin: Option<&str>) -> Cors {
    match origin {
        Some(origin) => Cors::default()
            .allowed_origin(origin)
            .allow_any_method()
            .allow_any_header(),
        None => Cors::permissive(),
    }
}

pub fn start_server(state: Arc<AppState>, config: &ServerConfig) -> std::io::Result<Server> {
    let data = web::Data::from(state);
    let origin = config.cors_origin.clone();

    let server = HttpServer::new(move || {
        App::new()
            .wrap(cors(origin.as_deref()))
            .app_data(data.clone())
            .configure(configure)
    })
    .bind((config.host.as_str(), config.port))?
    .run();

    info!(host = %config.host, port = config.port, "HTTP server listening");
    Ok(server)
}
