use std::path::Path;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use tutor_schedule::SchedulingConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub log_level: String,
    #[serde(default)]
    pub scheduling: SchedulingConfig,
}

impl Settings {
    /// Defaults, then a TOML file, then `TUTOR_SCHEDULE_*` environment
    /// variables (`__` separates nested keys, e.g.
    /// `TUTOR_SCHEDULE_SCHEDULING__SLOT_STEP_MINUTES=15`).
    ///
    /// Without an explicit path, `tutor-schedule.toml` in the working
    /// directory is read if present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) => File::from(p).required(true),
            None => File::with_name("tutor-schedule").required(false),
        };

        let settings = Config::builder()
            .set_default("log_level", "info")?
            .add_source(file)
            .add_source(
                Environment::with_prefix("TUTOR_SCHEDULE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("failed to load configuration")?
            .try_deserialize::<Settings>()
            .context("invalid configuration")?;

        settings
            .scheduling
            .validate()
            .context("invalid scheduling configuration")?;
        Ok(settings)
    }
}
