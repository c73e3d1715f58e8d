use anyhow::{bail, Context, Result};

/// Tunables of the page behavior.
///
/// `Default` carries the production values; the browser build always uses it.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteConfig {
    // Language
    pub storage_key: String,

    // Navigation
    pub scroll_threshold: f64,

    // Animations
    pub reveal_threshold: f64,
    pub reveal_root_margin: String,
    pub reveal_duration_secs: f64,
    pub reveal_offset_px: f64,
    pub stagger_step_secs: f64,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            storage_key: "appsecdays-lang".to_string(),
            scroll_threshold: 50.0,
            reveal_threshold: 0.1,
            reveal_root_margin: "0px".to_string(),
            reveal_duration_secs: 0.6,
            reveal_offset_px: 20.0,
            stagger_step_secs: 0.1,
        }
    }
}

impl SiteConfig {
    /// Defaults overridden by `SITE_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let config = Self {
            storage_key: std::env::var("SITE_STORAGE_KEY").unwrap_or(defaults.storage_key),
            scroll_threshold: parse_var("SITE_SCROLL_THRESHOLD")?
                .unwrap_or(defaults.scroll_threshold),
            reveal_threshold: parse_var("SITE_REVEAL_THRESHOLD")?
                .unwrap_or(defaults.reveal_threshold),
            stagger_step_secs: parse_var("SITE_STAGGER_STEP")?
                .unwrap_or(defaults.stagger_step_secs),
            ..defaults
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.storage_key.trim().is_empty() {
            bail!("SITE_STORAGE_KEY must not be empty");
        }
        if self.scroll_threshold.is_nan() || self.scroll_threshold < 0.0 {
            bail!("SITE_SCROLL_THRESHOLD must be >= 0, got {}", self.scroll_threshold);
        }
        if !(0.0..=1.0).contains(&self.reveal_threshold) {
            bail!(
                "SITE_REVEAL_THRESHOLD must be between 0 and 1, got {}",
                self.reveal_threshold
            );
        }
        if self.stagger_step_secs.is_nan() || self.stagger_step_secs < 0.0 {
            bail!("SITE_STAGGER_STEP must be >= 0, got {}", self.stagger_step_secs);
        }
        Ok(())
    }
}

fn parse_var(name: &str) -> Result<Option<f64>> {
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{} is not a number: '{}'", name, value)),
        Err(_) => Ok(None),
    }
}
