use actix_web::{App, HttpServer, middleware, web};

use homedesk::config::Config;
use homedesk::models::attachment::FileStore;
use homedesk::{db, handlers};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));
    let config = Config::from_env();

    let Some(database_url) = config.database_url.clone() else {
        log::error!("DATABASE_URL is not set");
        return Err(std::io::Error::other("DATABASE_URL is not set"));
    };
    let pool = db::init_pool(&database_url)
        .await
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    db::run_migrations(&pool)
        .await
        .map_err(|e| std::io::Error::other(e.to_string()))?;

    // The upload directory is provisioned by deployment; a missing one makes
    // file parts fail with 507 while the rest of an update still works.
    if !config.upload_dir.is_dir() {
        log::warn!(
            "upload directory {} does not exist, file uploads will be refused",
            config.upload_dir.display()
        );
    }
    let store = FileStore::new(config.upload_dir.clone(), config.public_url.clone());

    let bind = config.bind.clone();
    log::info!(
        "Starting server at http://{bind} (auto project creation {})",
        if config.auto_create_project { "on" } else { "off" }
    );

    let pool = web::Data::new(pool);
    let store = web::Data::new(store);
    let config = web::Data::new(config);

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(pool.clone())
            .app_data(store.clone())
            .app_data(config.clone())
            .service(web::scope("/api").configure(handlers::configure))
    })
    .bind(bind)?
    .run()
    .await
}
