use crate::{
    client::Client,
    config::Config,
    error::MediaToolsError,
    tools::ToolRequest,
    types::tool::{ResultView, ToolResponse},
};

/// A processed submission: the parsed body plus what to show for it
#[derive(Debug, Clone)]
pub struct ToolOutcome {
    /// Parsed response body
    pub response: ToolResponse,
    /// Resolved link and raw JSON
    pub view: ResultView,
}

/// API resource for the per-tool processing endpoints
pub struct Tools<'c, C: Config> {
    client: &'c Client<C>,
}

impl<'c, C: Config> Tools<'c, C> {
    /// Creates a new Tools resource
    #[must_use]
    pub const fn new(client: &'c Client<C>) -> Self {
        Self { client }
    }

    /// Sends `request` as one multipart POST to its tool's endpoint
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the request fails validation or the
    /// client is misconfigured, otherwise any error the request produces.
    pub async fn submit(&self, request: ToolRequest) -> Result<ToolResponse, MediaToolsError> {
        let spec = request.spec();
        let progress = request.progress_sink();
        let form = request.into_form()?;
        tracing::debug!(tool = spec.id, path = spec.path, "submitting tool request");
        let response = self.client.post_multipart(spec.path, form).await?;
        if let Some(sink) = progress {
            sink.send_replace(100);
        }
        Ok(response)
    }

    /// Like [`Tools::submit`], also resolving the result link
    ///
    /// # Errors
    ///
    /// See [`Tools::submit`].
    pub async fn run(&self, request: ToolRequest) -> Result<ToolOutcome, MediaToolsError> {
        let default_filename = request.spec().default_filename;
        let response = self.submit(request).await?;
        let view = ResultView::new(&response, &self.client.api_base()?, default_filename);
        Ok(ToolOutcome { response, view })
    }
}

impl<C: Config> crate::Client<C> {
    /// Returns the Tools API resource
    #[must_use]
    pub const fn tools(&self) -> Tools<'_, C> {
        Tools::new(self)
    }
}
