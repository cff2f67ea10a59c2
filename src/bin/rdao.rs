use clap::Parser;
use redis_dao::cli::{run_command, CliArgs};
use redis_dao::RedisService;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
  let args = CliArgs::parse();

  // Logged after init: the filter level comes from the file
  let source = args.config_source();
  let config = args.load_config(source.as_deref())?;

  tracing_subscriber::registry()
    .with(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.level.clone().into()),
    )
    .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
    .init();

  match &source {
    Some(path) => tracing::info!("Loaded config from {}", path.display()),
    None => tracing::debug!("No config file found, using defaults"),
  }

  if !config.redis.is_configured() {
    anyhow::bail!("no Redis host configured");
  }

  let service = RedisService::connect(&config.redis, &config.service).await?;
  let output = run_command(&service, &args.command).await?;
  println!("{}", serde_json::to_string_pretty(&output)?);
  Ok(())
}
