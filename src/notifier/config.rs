use serde::{Deserialize, Serialize};

pub const DEFAULT_SLACK_API_BASE: &str = "https://slack.com/api";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Slack,
    Null,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotifierConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub provider: ProviderKind,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub channel: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Pause after each photo in a bulk send
    #[serde(default = "default_pacing_millis")]
    pub pacing_millis: u64,
}

fn default_api_base() -> String {
    DEFAULT_SLACK_API_BASE.to_string()
}

fn default_pacing_millis() -> u64 {
    1000
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: ProviderKind::default(),
            token: String::new(),
            channel: String::new(),
            api_base: default_api_base(),
            pacing_millis: default_pacing_millis(),
        }
    }
}

impl NotifierConfig {
    /// Fill unset values from `SLACK_ENABLED`, `SLACK_TOKEN` and `SLACK_CHANNEL`.
    pub fn with_env_fallback(mut self) -> Self {
        self.apply_env(|key| std::env::var(key).ok());
        self
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if !self.enabled
            && let Some(flag) = lookup("SLACK_ENABLED")
        {
            self.enabled = flag.eq_ignore_ascii_case("true");
        }
        if self.token.is_empty() {
            self.token = lookup("SLACK_TOKEN").unwrap_or_default();
        }
        if self.channel.is_empty() {
            self.channel = lookup("SLACK_CHANNEL").unwrap_or_default();
        }
    }

    pub fn has_credentials(&self) -> bool {
        !self.token.is_empty() && !self.channel.is_empty()
    }
}
