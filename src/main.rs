//! quire - a static site generator.

use anyhow::{Context, Result, bail};
use clap::Parser;
use quire::{
    cli::Cli,
    config::SiteConfig,
    log,
    page::source::FsContentSource,
    site::{BuildReport, FsSink, Site},
    template::FsTemplateSource,
};
use std::path::Path;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let content = FsContentSource::new(
        &config.build.content,
        &config.base.language,
        &config.base.all_languages(),
    );
    let theme_layouts = config.theme_layouts();
    let layouts = FsTemplateSource::new(&config.build.layouts, theme_layouts.as_deref());
    let site = Site::new(&config, &content, &layouts);

    let report = if cli.is_check() {
        site.check()?
    } else {
        let sink = FsSink::new(&config.build.output, config.build.clean)
            .with_context(|| format!("failed to prepare `{}`", config.build.output.display()))?;
        site.build(&sink)?
    };

    summarize(&report);
    Ok(())
}

/// Load and validate configuration from CLI arguments
fn load_config(cli: &Cli) -> Result<SiteConfig> {
    let root = cli.root.as_deref().unwrap_or(Path::new("./"));
    let config_path = root.join(&cli.config);

    if !config_path.exists() {
        bail!("Config file not found: {}", config_path.display());
    }

    let mut config = SiteConfig::from_path(&config_path)?;
    config.update_with_cli(cli);
    config.validate()?;
    Ok(config)
}

fn summarize(report: &BuildReport) {
    log!(
        "build";
        "{} files, {} resources in {}ms",
        report.artifacts.len(),
        report.resources,
        report.elapsed_ms
    );
}
