use actix_web::http::header;
use actix_web::http::StatusCode;
use actix_web::middleware::{DefaultHeaders, ErrorHandlers, Logger};
use actix_web::{App, HttpServer};
use env_logger::Env;
use insightcast::app_config::APP_CONFIG;
use insightcast::db::init_db;
use insightcast::middleware::ClientCtx;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    init_lib_mods();
    init_our_mods();
    init_db(std::env::var("DATABASE_URL").expect("DATABASE_URL must be set.")).await;

    let bind = (
        APP_CONFIG.server.bind_address.clone(),
        APP_CONFIG.server.port,
    );
    log::info!("Starting {} on {}:{}", APP_CONFIG.site.name, bind.0, bind.1);

    HttpServer::new(move || {
        // Order of middleware IS IMPORTANT and is in REVERSE EXECUTION ORDER.
        // However, services are read top->down, higher traffic routes should be
        // placed higher
        App::new()
            // Security headers - applied to all responses
            .wrap(
                DefaultHeaders::new()
                    .add((header::X_FRAME_OPTIONS, "DENY"))
                    .add((header::X_CONTENT_TYPE_OPTIONS, "nosniff"))
                    .add(("Referrer-Policy", "strict-origin-when-cross-origin")),
            )
            .wrap(
                ErrorHandlers::new()
                    .handler(StatusCode::BAD_REQUEST, insightcast::web::error::render_400)
                    .handler(StatusCode::UNAUTHORIZED, insightcast::web::error::render_401)
                    .handler(StatusCode::FORBIDDEN, insightcast::web::error::render_403)
                    .handler(StatusCode::NOT_FOUND, insightcast::web::error::render_404)
                    .handler(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        insightcast::web::error::render_500,
                    ),
            )
            .wrap(ClientCtx::default())
            .wrap(Logger::new("%a %{User-Agent}i"))
            .configure(insightcast::web::configure)
            .service(actix_files::Files::new(
                "/uploads",
                insightcast::filesystem::upload_dir(),
            ))
    })
    .bind(bind)?
    .run()
    .await
}

/// Initialize third party crates we rely on but don't have control over.
fn init_lib_mods() {
    // This should be calls to crates without any transformative work applied.
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
}

/// Initialize all local mods.
/// Panics
fn init_our_mods() {
    // This should be a list of simple function calls.
    // Each module should work mostly independent of others.
    // This way, we can unit test individual modules without loading the entire application.
    insightcast::app_config::init();
    insightcast::session::init();
    insightcast::filesystem::init();
}
