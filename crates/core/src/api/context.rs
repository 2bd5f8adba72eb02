/// Everything a client needs to talk to one platform deployment. Built once
/// and injected; nothing in the core reads ambient globals for this.
#[derive(Clone, Debug)]
pub struct ApiContext {
    base_url: String,
    api_token: Option<String>,
}

/// Env var holding `key:secret` API credentials for the platform.
pub const TOKEN_ENV_VAR: &str = "SURGVIEW_API_TOKEN";

impl ApiContext {
    pub fn new(base_url: impl Into<String>, api_token: Option<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            api_token: api_token.filter(|t| !t.trim().is_empty()),
        }
    }

    /// Context with credentials taken from [`TOKEN_ENV_VAR`], if set.
    pub fn from_env(base_url: impl Into<String>) -> Self {
        Self::new(base_url, std::env::var(TOKEN_ENV_VAR).ok())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_token(&self) -> Option<&str> {
        self.api_token.as_deref()
    }

    /// Full URL for a whitelisted platform method.
    pub fn method_url(&self, method: &str) -> String {
        format!("{}/api/method/{}", self.base_url, method)
    }
}
