use anyhow::Result;

use clone_api::api::config::ApiConfig;
use clone_api::api::start_server;
use clone_api::utils::logger::init_logger;

#[actix_web::main]
async fn main() -> Result<()> {
    let config = ApiConfig::from_env();
    let _ = init_logger(&config.log_dir);

    start_server("127.0.0.1", 8080, Some(config)).await?;

    Ok(())
}
