use anyhow::Context;
use denoise_compare::config::CONFIG_ENV_VAR;
use denoise_compare::core::load_pretrained;
use denoise_compare::PipelineConfig;
use std::path::PathBuf;

fn load_config() -> anyhow::Result<PipelineConfig> {
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from));

    match path {
        Some(path) => PipelineConfig::from_file(&path)
            .with_context(|| format!("failed to load configuration {}", path.display())),
        None => {
            log::info!("No configuration given, using defaults");
            Ok(PipelineConfig::default())
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = load_config()?;
    config.validate().context("invalid configuration")?;
    log::debug!("Configuration: {:?}", config);

    let denoiser = load_pretrained(&config.model).context("pretrained denoiser unavailable")?;
    let outcome = denoise_compare::run(&config, denoiser.as_ref()).context("comparison failed")?;

    println!("{}", outcome.report.to_table());
    log::debug!(
        "Report: {}",
        serde_json::to_string(&outcome.report).unwrap_or_default()
    );

    if config.show_window {
        show(&outcome)?;
    }

    Ok(())
}

#[cfg(feature = "viewer")]
fn show(outcome: &denoise_compare::PipelineOutcome) -> anyhow::Result<()> {
    denoise_compare::viewer::show_report(&outcome.images, &outcome.report)
        .context("failed to display report window")
}

#[cfg(not(feature = "viewer"))]
fn show(_outcome: &denoise_compare::PipelineOutcome) -> anyhow::Result<()> {
    log::warn!("Built without the `viewer` feature; skipping report window");
    Ok(())
}
