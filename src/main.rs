use anyhow::Result;
use serde_json::json;

use forecastfx::config::Config;
use forecastfx::gateway::ForecastGateway;
use forecastfx::logging::{self, obj, v_num, v_str, Domain, Level};

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::from_env();
    logging::log(
        Level::Info,
        Domain::System,
        "startup",
        obj(&[
            ("api_base", v_str(&cfg.api_base)),
            ("timeout_secs", json!(cfg.http_timeout_secs)),
            ("max_retries", json!(cfg.max_retries)),
        ]),
    );

    let gateway = ForecastGateway::new(&cfg)?;

    match gateway.warm_catalog().await {
        Ok(models) => {
            logging::log(
                Level::Info,
                Domain::System,
                "catalog_ready",
                obj(&[("models", v_num(models.len() as f64))]),
            );
        }
        Err(err) => {
            // Startup survives a cold backend; panels retry on demand.
            logging::log(
                Level::Warn,
                Domain::System,
                "catalog_unavailable",
                obj(&[("error", v_str(&err.to_string()))]),
            );
        }
    }

    Ok(())
}
