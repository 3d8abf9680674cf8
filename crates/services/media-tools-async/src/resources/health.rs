use reqwest::{Method, StatusCode};

use crate::{
    client::Client,
    config::{Config, HDR_API_KEY},
    error::MediaToolsError,
    types::health::ApiHealth,
};

/// API resource for the `/health/` endpoint
pub struct Health<'c, C: Config> {
    client: &'c Client<C>,
}

impl<'c, C: Config> Health<'c, C> {
    /// Creates a new Health resource
    #[must_use]
    pub const fn new(client: &'c Client<C>) -> Self {
        Self { client }
    }

    /// Checks the API. Anything other than a 200 answer counts as unhealthy.
    ///
    /// # Errors
    ///
    /// Returns a configuration error only when the base URL is missing or invalid.
    pub async fn check(&self) -> Result<ApiHealth, MediaToolsError> {
        self.client.api_base()?;

        match self
            .client
            .send_public::<()>(Method::GET, "/health/", Some(HDR_API_KEY), None)
            .await
        {
            Ok((status, _)) if status == StatusCode::OK => Ok(ApiHealth::Healthy),
            Ok((status, _)) => {
                tracing::debug!(status = status.as_u16(), "health check answered non-200");
                Ok(ApiHealth::Unhealthy)
            }
            Err(e @ MediaToolsError::Config(_)) => Err(e),
            Err(e) => {
                tracing::debug!(error = %e, "health check failed");
                Ok(ApiHealth::Unhealthy)
            }
        }
    }
}

impl<C: Config> crate::Client<C> {
    /// Returns the Health API resource
    #[must_use]
    pub const fn health(&self) -> Health<'_, C> {
        Health::new(self)
    }
}
