use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct ClientConfig {
    /// Result cap for one discovery query.
    #[serde(default = "default_discover_limit")]
    pub discover_limit: usize,
    /// Age bounds used when the user has no persisted discovery settings.
    #[serde(default = "default_age_min")]
    pub default_age_min: i32,
    #[serde(default = "default_age_max")]
    pub default_age_max: i32,
}

fn default_discover_limit() -> usize {
    50
}
fn default_age_min() -> i32 {
    18
}
fn default_age_max() -> i32 {
    99
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            discover_limit: default_discover_limit(),
            default_age_min: default_age_min(),
            default_age_max: default_age_max(),
        }
    }
}

impl ClientConfig {
    pub fn load() -> anyhow::Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("ZIM").separator("__"))
            .build()?;
        Ok(config.try_deserialize()?)
    }
}
