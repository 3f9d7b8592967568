use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Deserialize;

/// Default API base for the Moonshot platform.
///
/// Note: the international endpoint is `api.moonshot.ai`, not `.cn`.
pub const KIMI_DEFAULT_BASE: &str = "https://api.moonshot.ai";
/// Environment variable holding the bearer key.
pub const ENV_MOONSHOT_API_KEY: &str = "MOONSHOT_API_KEY";

/// Authentication credential for the Moonshot API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KimiAuth {
    /// Bearer token (the only scheme Moonshot supports)
    Bearer(String),
    /// No credential configured
    None,
}

/// Configuration for the Kimi client: API base and credentials.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KimiConfig {
    api_base: String,
    #[serde(skip)]
    auth: KimiAuth,
}

impl Default for KimiConfig {
    fn default() -> Self {
        let auth = std::env::var(ENV_MOONSHOT_API_KEY)
            .ok()
            .map_or(KimiAuth::None, KimiAuth::Bearer);

        Self {
            api_base: KIMI_DEFAULT_BASE.into(),
            auth,
        }
    }
}

impl KimiConfig {
    /// Creates a configuration from the environment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the API base URL (scheme + host, no trailing slash).
    #[must_use]
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    /// Sets the bearer API key explicitly.
    #[must_use]
    pub fn with_api_key(mut self, k: impl Into<String>) -> Self {
        self.auth = KimiAuth::Bearer(k.into());
        self
    }

    /// Returns the configured API base.
    #[must_use]
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Validates that a credential is present.
    ///
    /// # Errors
    ///
    /// Returns [`KimiError::Config`] if no bearer token is configured.
    pub fn validate_auth(&self) -> Result<(), crate::error::KimiError> {
        match &self.auth {
            KimiAuth::None => Err(crate::error::KimiError::Config(format!(
                "Missing Moonshot credentials: set {ENV_MOONSHOT_API_KEY}"
            ))),
            KimiAuth::Bearer(_) => Ok(()),
        }
    }
}

/// Provides authentication and endpoint configuration to [`crate::Client`].
pub trait Config: Send + Sync {
    /// Request headers (auth, content type).
    fn headers(&self) -> HeaderMap;
    /// Full URL for an API path.
    fn url(&self, path: &str) -> String;
    /// Extra query parameters applied to every request.
    fn query(&self) -> Vec<(&str, &str)>;

    /// Validates that authentication credentials are present.
    ///
    /// # Errors
    ///
    /// Returns an error if authentication is not properly configured.
    fn validate_auth(&self) -> Result<(), crate::error::KimiError>;
}

impl Config for KimiConfig {
    fn headers(&self) -> HeaderMap {
        let mut h = HeaderMap::new();

        h.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let KimiAuth::Bearer(t) = &self.auth {
            let v = format!("Bearer {t}");
            if let Ok(value) = HeaderValue::from_str(&v) {
                h.insert(AUTHORIZATION, value);
            }
        }

        h
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    fn query(&self) -> Vec<(&str, &str)> {
        vec![]
    }

    fn validate_auth(&self) -> Result<(), crate::error::KimiError> {
        self.validate_auth()
    }
}
