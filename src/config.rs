use std::{env, fmt, time::Duration};

/// Development-only signing secret used when `ACCESS_TOKEN_SECRET` is unset locally.
pub const LOCAL_DEV_SECRET: &str = "local-development-access-token-secret";

/// ConfigError
///
/// Reasons the configuration cannot be assembled at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set in production")]
    Missing(&'static str),
    #[error("{0} must not be empty")]
    Empty(&'static str),
    #[error("{var} has an invalid value: {value:?}")]
    Invalid { var: &'static str, value: String },
}

/// TokenSecret
///
/// The signing secret. Debug output is redacted so the config can be logged.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenSecret(String);

impl TokenSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Exposes the raw secret bytes for key construction.
    pub fn expose(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for TokenSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// AppConfig
///
/// Holds the application's configuration. Immutable once loaded, and pulled into
/// handlers through the shared state via FromRef.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls logging format and development fallbacks.
    pub env: Env,
    // Host the HTTP server binds to: an IP literal or a resolvable name such as `localhost`.
    pub host: String,
    // Port the HTTP server binds to.
    pub port: u16,
    // Secret used to sign and verify access tokens.
    pub token_secret: TokenSecret,
    // Lifetime of issued tokens; `None` issues tokens without an expiry.
    pub token_ttl: Option<Duration>,
    // Whether the post store starts with the two demo posts.
    pub seed_demo_posts: bool,
}

/// Env
///
/// The runtime context: `Local` allows development fallbacks, `Production`
/// demands every secret explicitly.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// default
    ///
    /// A non-panicking configuration for tests and state scaffolding.
    fn default() -> Self {
        Self {
            env: Env::Local,
            host: "127.0.0.1".to_string(),
            port: 3000,
            token_secret: TokenSecret::new(LOCAL_DEV_SECRET),
            token_ttl: None,
            seed_demo_posts: false,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables (after `.env` has been
    /// applied by the caller).
    ///
    /// # Errors
    /// Fails when a production secret is missing or a numeric/boolean variable
    /// cannot be parsed, so the process never starts half-configured.
    pub fn load() -> Result<Self, ConfigError> {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let token_secret = match (env, env::var("ACCESS_TOKEN_SECRET")) {
            (_, Ok(secret)) if secret.is_empty() => {
                return Err(ConfigError::Empty("ACCESS_TOKEN_SECRET"));
            }
            (_, Ok(secret)) => TokenSecret::new(secret),
            (Env::Production, Err(_)) => return Err(ConfigError::Missing("ACCESS_TOKEN_SECRET")),
            // Local fallback; the developer should still set a real secret.
            (Env::Local, Err(_)) => TokenSecret::new(LOCAL_DEV_SECRET),
        };

        // Name resolution happens at bind time, so only emptiness is checked here.
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        if host.is_empty() {
            return Err(ConfigError::Empty("HOST"));
        }
        let port = parse_var::<u16>("PORT")?.unwrap_or(3000);

        // Token lifetime must be positive and fit a signed unix timestamp.
        let token_ttl = match parse_var::<u64>("TOKEN_TTL_SECS")? {
            Some(secs) if secs == 0 || i64::try_from(secs).is_err() => {
                return Err(ConfigError::Invalid {
                    var: "TOKEN_TTL_SECS",
                    value: secs.to_string(),
                });
            }
            ttl => ttl.map(Duration::from_secs),
        };

        let seed_demo_posts = parse_var::<bool>("SEED_DEMO_POSTS")?.unwrap_or(env == Env::Local);

        Ok(Self {
            env,
            host,
            port,
            token_secret,
            token_ttl,
            seed_demo_posts,
        })
    }
}

// Unset variables yield `None`; set but unparseable ones are an error.
fn parse_var<T: std::str::FromStr>(var: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(var) {
        Ok(value) => value
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { var, value }),
        Err(_) => Ok(None),
    }
}
