use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Origin of the calculator UI allowed to call the API cross-origin.
    pub ui_origin: Option<String>,
    /// Deployment environment; `production` hides validation detail from logs.
    pub app_env: String,
    pub rate_limit_max_requests: u32,
    pub rate_limit_window_secs: u64,
    pub rate_limit_max_clients: u64,
    pub max_body_bytes: usize,
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            ui_origin: None,
            app_env: "development".to_string(),
            rate_limit_max_requests: 10,
            rate_limit_window_secs: 60,
            rate_limit_max_clients: 100_000,
            max_body_bytes: 10_000,
            request_timeout_secs: 10,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let config = Self {
            port: parse_var("PORT", defaults.port)
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            ui_origin: std::env::var("UI_ORIGIN")
                .ok()
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .map(|origin| {
                    if !origin.starts_with("http://") && !origin.starts_with("https://") {
                        anyhow::bail!("UI_ORIGIN must start with http:// or https://");
                    }
                    Ok(origin)
                })
                .transpose()?,
            app_env: std::env::var("APP_ENV")
                .ok()
                .map(|env| env.trim().to_lowercase())
                .filter(|env| !env.is_empty())
                .unwrap_or(defaults.app_env),
            rate_limit_max_requests: parse_var(
                "RATE_LIMIT_MAX_REQUESTS",
                defaults.rate_limit_max_requests,
            )
            .and_then(require_positive("RATE_LIMIT_MAX_REQUESTS"))?,
            rate_limit_window_secs: parse_var(
                "RATE_LIMIT_WINDOW_SECS",
                defaults.rate_limit_window_secs,
            )
            .and_then(require_positive("RATE_LIMIT_WINDOW_SECS"))?,
            rate_limit_max_clients: parse_var(
                "RATE_LIMIT_MAX_CLIENTS",
                defaults.rate_limit_max_clients,
            )
            .and_then(require_positive("RATE_LIMIT_MAX_CLIENTS"))?,
            max_body_bytes: parse_var("MAX_BODY_BYTES", defaults.max_body_bytes)
                .and_then(require_positive("MAX_BODY_BYTES"))?,
            request_timeout_secs: parse_var("REQUEST_TIMEOUT_SECS", defaults.request_timeout_secs)
                .and_then(require_positive("REQUEST_TIMEOUT_SECS"))?,
        };

        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Server Port: {}", config.port);
        tracing::debug!("Environment: {}", config.app_env);
        match config.ui_origin {
            Some(ref origin) => tracing::info!("CORS origin allowed: {}", origin),
            None => tracing::warn!("UI_ORIGIN not set, cross-origin requests will not be allowed"),
        }
        tracing::debug!(
            "Rate limit: {} requests per {}s",
            config.rate_limit_max_requests,
            config.rate_limit_window_secs
        );

        Ok(config)
    }

    pub fn is_production(&self) -> bool {
        self.app_env == "production"
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Reads `name` from the environment, falling back to `default` when unset or blank.
fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> anyhow::Result<T> {
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} must be a valid number, got '{}'", name, raw)),
        _ => Ok(default),
    }
}

fn require_positive<T>(name: &'static str) -> impl Fn(T) -> anyhow::Result<T>
where
    T: PartialOrd + Default,
{
    move |value| {
        if value <= T::default() {
            anyhow::bail!("{} must be greater than zero", name);
        }
        Ok(value)
    }
}
