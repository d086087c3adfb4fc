use std::borrow::Cow;
use std::net::SocketAddr;

/// Runtime configuration, read from environment variables with fallbacks.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: Cow<'static, str>,
    pub port: u16,
    /// `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub run_migrations: bool,
    pub seed_demo: bool,
}

impl AppConfig {
    /// Build configuration from `APP_HOST`, `APP_PORT`, `DATABASE_URL`,
    /// `DB_MAX_CONNECTIONS`, `RUN_MIGRATIONS` and `SEED_DEMO`.
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let host = lookup("APP_HOST")
            .map(Cow::Owned)
            .unwrap_or(defaults.host);
        let port = match lookup("APP_PORT") {
            Some(raw) => raw.parse().map_err(|_| format!("Invalid APP_PORT: {}", raw))?,
            None => defaults.port,
        };
        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());
        let max_connections = match lookup("DB_MAX_CONNECTIONS") {
            Some(raw) => raw
                .parse()
                .map_err(|_| format!("Invalid DB_MAX_CONNECTIONS: {}", raw))?,
            None => defaults.max_connections,
        };
        let run_migrations = match lookup("RUN_MIGRATIONS") {
            Some(raw) => parse_flag("RUN_MIGRATIONS", &raw)?,
            None => defaults.run_migrations,
        };
        let seed_demo = match lookup("SEED_DEMO") {
            Some(raw) => parse_flag("SEED_DEMO", &raw)?,
            None => defaults.seed_demo,
        };

        Ok(Self {
            host,
            port,
            database_url,
            max_connections,
            run_migrations,
            seed_demo,
        })
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| format!("Invalid bind address {}:{}", self.host, self.port))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: Cow::Borrowed("0.0.0.0"),
            port: 3000,
            database_url: None,
            max_connections: 10,
            run_migrations: true,
            seed_demo: false,
        }
    }
}

fn parse_flag(name: &str, raw: &str) -> Result<bool, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(format!("Invalid {}: {}", name, raw)),
    }
}
