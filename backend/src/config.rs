use crate::engine::index::InvertedIndex;
use crate::engine::query::QueryExecutor;
use crate::engine::store::SegmentStore;
use crate::models::AdminToken;
use crate::services::ingest_service::IngestCoordinator;
use crate::AppState;
use anyhow::Result;
use env_logger::Builder;
use lazy_static::lazy_static;
use log::{info, LevelFilter};
use rocket::http::{Method, Status};
use rocket::request::{FromRequest, Outcome};
use rocket::Request;
use rocket_cors::{AllowedHeaders, AllowedOrigins, CorsOptions};
use std::env;
use std::path::Path;
use std::sync::Arc;

lazy_static! {
    pub static ref ADMIN_TOKEN: String =
        env::var("ADMIN_TOKEN").unwrap_or_else(|_| "default_admin_token".to_string());
    pub static ref DATA_DIR: String = env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string());
    pub static ref ALLOWED_ORIGIN: String =
        env::var("ALLOWED_ORIGIN").unwrap_or_else(|_| "http://localhost:8080".to_string());
    pub static ref MAX_SEGMENTS_PER_VIDEO: usize = env::var("MAX_SEGMENTS_PER_VIDEO")
        .unwrap_or_else(|_| "20000".to_string())
        .parse::<usize>()
        .unwrap_or(20000);
}

pub fn init_logger() {
    Builder::new().filter_level(LevelFilter::Info).init();
    info!("Starting Rocket backend...");
}

pub fn load_environment() {
    dotenv::dotenv().ok();
}

/// Build the shared application state rooted at the given data directory:
/// open the segment store, rebuild the inverted index from it and wire up
/// the ingest coordinator and query executor.
pub fn build_app_state(data_dir: &Path) -> Result<AppState> {
    let store = Arc::new(SegmentStore::open(data_dir)?);
    let index = Arc::new(InvertedIndex::new());
    store.reindex_into(&index);

    let coordinator = Arc::new(IngestCoordinator::new(store.clone(), index.clone()));
    let executor = QueryExecutor::new(store.clone(), index);

    Ok(AppState {
        store,
        coordinator,
        executor,
    })
}

pub fn create_app_state() -> Result<AppState> {
    let data_dir = &*DATA_DIR;
    info!("Opening segment store at: {data_dir}");
    build_app_state(Path::new(data_dir))
}

pub fn create_cors() -> Result<rocket_cors::Cors> {
    let cors = CorsOptions::default()
        .allowed_origins(AllowedOrigins::some_exact(&[ALLOWED_ORIGIN.as_str()]))
        .allowed_methods(
            vec![
                Method::Get,
                Method::Post,
                Method::Put,
                Method::Delete,
                Method::Options,
            ]
            .into_iter()
            .map(From::from)
            .collect(),
        )
        .allowed_headers(AllowedHeaders::some(&[
            "Authorization",
            "Accept",
            "Content-Type",
        ]))
        .allow_credentials(true)
        .to_cors()
        .map_err(|e| anyhow::anyhow!("Failed to create CORS options: {}", e))?;

    Ok(cors)
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AdminToken {
    type Error = &'static str;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let token = request
            .headers()
            .get_one("Authorization")
            .and_then(|auth| auth.strip_prefix("Bearer "));

        match token {
            Some(t) => {
                if t == &*ADMIN_TOKEN {
                    Outcome::Success(AdminToken(t.to_string()))
                } else {
                    Outcome::Error((Status::Unauthorized, "Invalid token"))
                }
            }
            None => Outcome::Error((Status::Unauthorized, "Missing token")),
        }
    }
}
