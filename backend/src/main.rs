#[macro_use]
extern crate rocket;

mod api;
mod config;
mod engine;
mod models;
mod services;
mod utils;


use crate::engine::query::QueryExecutor;
use crate::engine::store::SegmentStore;
use crate::services::ingest_service::IngestCoordinator;
use rocket::{Build, Rocket};
use std::sync::Arc;

pub struct AppState {
    pub store: Arc<SegmentStore>,
    pub coordinator: Arc<IngestCoordinator>,
    pub executor: QueryExecutor,
}

fn build_rocket(state: AppState) -> Rocket<Build> {
    let cors = config::create_cors().expect("Failed to create CORS options");
    rocket::build()
        .manage(state)
        .attach(cors)
        .mount("/api/search", routes![api::search_transcripts])
        .mount("/api/channel", routes![api::get_channel])
        .mount("/api/video", routes![api::list_videos, api::get_video])
        .mount(
            "/api/admin",
            routes![
                api::register_channel,
                api::ingest_video,
                api::delete_video,
                api::abort_ingest,
                api::ingest_status,
                api::admin_stats
            ],
        )
}

#[launch]
fn rocket() -> _ {
    config::load_environment();
    config::init_logger();
    let state = config::create_app_state().expect("Failed to open segment store");
    build_rocket(state)
}
