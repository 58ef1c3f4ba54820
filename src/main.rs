use fanout::Manager;
use log::*;
use service::config::Config;
use service::logging::Logger;
use std::sync::Arc;
use web::AppState;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let config = Config::new();
    Logger::init_logger(&config);

    info!("Starting relay in {} mode", config.runtime_env());

    let service_state = service::AppState::new(config);
    let app_state = AppState::new(service_state, Arc::new(Manager::new()));

    web::init_server(app_state).await
}
