use serde_json::{json, Value};
use std::time::{Duration, Instant};

use crate::cli::utils::{output_details, output_error, output_success};
use crate::cli::OutputFormat;

pub fn health_url(base: &str) -> anyhow::Result<url::Url> {
    let base = url::Url::parse(base)?;
    Ok(base.join("/health")?)
}

pub async fn ping(base_url: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let url = health_url(base_url)?;
    let client = reqwest::Client::builder().timeout(Duration::from_secs(10)).build()?;

    let started = Instant::now();
    let response = client.get(url.clone()).send().await?;
    let elapsed_ms = started.elapsed().as_millis();
    let status = response.status();
    let body: Value = response.json().await.unwrap_or(Value::Null);

    if status.is_success() {
        output_success(
            &output_format,
            &format!("{} is healthy ({} ms)", base_url, elapsed_ms),
            Some(json!({ "url": url.as_str(), "status": status.as_u16(), "elapsed_ms": elapsed_ms, "health": body })),
        )?;
        output_details(&output_format, &[("database", body["data"]["database"].to_string())]);
        Ok(())
    } else {
        output_error(
            &output_format,
            &format!("{} responded {} ({} ms)", base_url, status, elapsed_ms),
            Some("UNHEALTHY"),
        )?;
        anyhow::bail!("server is unhealthy")
    }
}
