use anyhow::Context;
use cardly::domain::config::{ApiConfig, LoggingConfig};
use cardly::domain::constants::APP_NAME;
use cardly::kernel::config::load_config;
use cardly_logger::{Logger, LoggerError, parse_level};
use cardly_server::Server;

fn init_logger(cfg: &LoggingConfig) -> Result<Logger, LoggerError> {
    let builder = Logger::builder().name(APP_NAME).level(parse_level(&cfg.level)?);
    let builder = match &cfg.filter {
        Some(filter) => builder.env_filter(filter),
        None => builder,
    };
    match &cfg.path {
        Some(path) => builder.path(path).json(cfg.json).init(),
        None => builder.init(),
    }
}

#[cardly_runtime::main(high_performance)]
async fn main() -> anyhow::Result<()> {
    let cfg: ApiConfig = load_config(Some("server")).context("Critical: Configuration is malformed")?;
    let _log = init_logger(&cfg.logging)?;

    Server::builder().config(cfg).build().await?.run().await
}
