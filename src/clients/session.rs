use reqwest::RequestBuilder;

/// Credentials for the backend, passed explicitly to every client that needs them.
#[derive(Clone, Default)]
pub struct SessionContext {
    access_token: Option<String>,
    api_key: Option<String>,
}

impl SessionContext {
    /// Anonymous session. Customer-facing tracking needs nothing more.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    /// Adds the session's headers to a request.
    pub fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = match &self.api_key {
            Some(key) => builder.header("apikey", key),
            None => builder,
        };
        match &self.access_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("has_token", &self.access_token.is_some())
            .field("has_api_key", &self.api_key.is_some())
            .finish()
    }
}
