use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn api_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .merge(file_routes(config))
        .routes(routes!(handlers::health::api_health))
        .routes(routes!(handlers::health::healthz))
        .routes(routes!(handlers::client_log::submit_client_log))
}

fn file_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::files::upload_file,
            handlers::files::list_files
        ))
        .routes(routes!(
            handlers::files::download_file,
            handlers::files::delete_file
        ))
        .layer(handlers::files::files_body_limit(
            config.upload.max_file_size,
        ))
}
