use serde::Deserialize;

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    pub db_url: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub jwt_secret: String,
    /// Lifetime of issued bearer tokens.
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,
    /// Origin allowed to call the API from a browser.
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
    /// Path under which every JSON endpoint is mounted.
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_builder(config::Config::builder().add_source(config::Environment::default()))
    }

    pub(crate) fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> anyhow::Result<Self> {
        let config: Config = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.jwt_secret.is_empty() {
            anyhow::bail!("JWT_SECRET must not be empty");
        }
        if !self.api_prefix.starts_with('/') || self.api_prefix.len() < 2 {
            anyhow::bail!("API_PREFIX must start with '/' and name a path, got '{}'", self.api_prefix);
        }
        if self.token_ttl_hours <= 0 {
            anyhow::bail!("TOKEN_TTL_HOURS must be positive");
        }
        Ok(())
    }
}

fn default_port() -> u16 {
    8080
}

fn default_token_ttl_hours() -> i64 {
    24
}

fn default_cors_origin() -> String {
    "http://localhost:3000".to_string()
}

fn default_api_prefix() -> String {
    "/api".to_string()
}
