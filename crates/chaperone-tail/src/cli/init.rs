/*
[INPUT]:  Output path for the starter configuration
[OUTPUT]: Generated YAML configuration file
[POS]:    CLI initialization layer
[UPDATE]: When TailConfig schema changes
*/

use anyhow::{Context, Result, bail};
use console::style;
use std::path::Path;

use chaperone_adapter::{Category, TailSource};
use chaperone_tail::TailConfig;

pub fn starter_config() -> TailConfig {
    TailConfig {
        targets: vec![TailSource::command(Category::Deploy, "sddc")],
        ..TailConfig::default()
    }
}

pub fn run_init(output: &Path) -> Result<()> {
    if output.exists() {
        bail!("{} already exists; remove it first", output.display());
    }
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create {}", parent.display()))?;
    }

    let yaml = serde_yaml::to_string(&starter_config()).context("serialize config")?;
    std::fs::write(output, yaml).with_context(|| format!("write {}", output.display()))?;

    println!(
        "{} {}",
        style("Configuration written to").green(),
        style(output.display()).bold()
    );
    println!(
        "{}",
        style("Set server.session_id to the sessionid cookie of a logged-in operator.").dim()
    );
    Ok(())
}
