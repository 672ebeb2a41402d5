//! CLI configuration: shared `tally_config` loading plus `GlobalOpts`
//! overrides (--base-url, --insecure, --timeout).

use clap::ValueEnum;

use tally_config::{Config, Profile};
use tally_core::AggregationConfig;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;

/// Everything a data command needs once flags and file are merged.
#[derive(Debug)]
pub struct Resolved {
    pub aggregation: AggregationConfig,
    pub output: OutputFormat,
}

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Output format: flag, then `defaults.output`, then table.
pub fn output_format(global: &GlobalOpts, config: &Config) -> OutputFormat {
    global.output.unwrap_or_else(|| {
        OutputFormat::from_str(&config.defaults.output, true).unwrap_or(OutputFormat::Table)
    })
}

/// Build the runtime config from the config file, profile, and CLI overrides.
pub fn resolve(global: &GlobalOpts) -> Result<Resolved, CliError> {
    let cfg = tally_config::load_config()?;
    let profile_name = active_profile_name(global, &cfg);

    let mut profile = if let Some(profile) = cfg.profiles.get(&profile_name) {
        profile.clone()
    } else if global.profile.is_some() {
        // An explicitly requested profile must exist.
        let mut available: Vec<&str> = cfg.profiles.keys().map(String::as_str).collect();
        available.sort_unstable();
        return Err(CliError::ProfileNotFound {
            name: profile_name,
            available: if available.is_empty() {
                "(none)".into()
            } else {
                available.join(", ")
            },
        });
    } else {
        // No profile -- build from flags / env alone.
        let url = global
            .base_url
            .as_deref()
            .ok_or_else(|| CliError::NoConfig {
                path: tally_config::config_path().display().to_string(),
            })?;
        Profile::from_base_url(url)
    };

    if let Some(ref url) = global.base_url {
        profile.base_url.clone_from(url);
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }

    tracing::debug!(profile = %profile_name, base_url = %profile.base_url, "resolved profile");

    Ok(Resolved {
        aggregation: tally_config::profile_to_aggregation_config(&profile, &cfg.defaults)?,
        output: output_format(global, &cfg),
    })
}
