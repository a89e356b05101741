#[macro_use]
extern crate log;

use actix_web::middleware::Logger;
use actix_web::{App, HttpServer};
use cas_sso_discord::{error_pages, routes, session_middleware, Config, Gateway, RunMode, VERSION};
use dotenv::dotenv;
use std::env;
use std::process;

#[actix_rt::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    let run_mode = RunMode::from_flag(env::var("DEBUG").ok().as_deref());
    let default_filter = if run_mode.is_diagnostic() { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!("Invalid configuration: {}", err);
            process::exit(1);
        }
    };
    let gateway = match Gateway::from_config(&config) {
        Ok(gateway) => gateway,
        Err(err) => {
            error!("{}", err);
            process::exit(1);
        }
    };

    info!("### Launching {} v{}", config.app_name, VERSION);
    info!("### {}", config.app_description);
    if run_mode.is_diagnostic() {
        info!("### Diagnostic mode enabled");
    }
    info!(
        "### Kept CAS attributes: {:?}",
        gateway.attribute_filter().keys().collect::<Vec<_>>()
    );
    info!("### Listening on {}:{}", config.host, config.port);

    let bind_address = config.bind_address();
    HttpServer::new(move || {
        App::new()
            .wrap(error_pages())
            .wrap(session_middleware(&config))
            .wrap(Logger::default())
            .app_data(gateway.clone())
            .configure(routes::configure)
    })
    .bind(bind_address)?
    .run()
    .await
}
