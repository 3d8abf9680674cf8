use crate::{client::Client, config::Config, error::MediaToolsError, types::job::JobPayload};

/// API resource for the `/jobs/{id}` endpoint
pub struct Jobs<'c, C: Config> {
    client: &'c Client<C>,
}

impl<'c, C: Config> Jobs<'c, C> {
    /// Creates a new Jobs resource
    #[must_use]
    pub const fn new(client: &'c Client<C>) -> Self {
        Self { client }
    }

    /// Fetches the current state of a job
    ///
    /// # Errors
    ///
    /// Returns a configuration error for a blank id, otherwise any error the
    /// request produces.
    pub async fn get(&self, job_id: &str) -> Result<JobPayload, MediaToolsError> {
        let job_id = job_id.trim();
        if job_id.is_empty() {
            return Err(MediaToolsError::Config("Job id must not be empty".into()));
        }
        self.client
            .get(&format!("/jobs/{}", urlencoding::encode(job_id)))
            .await
    }
}

impl<C: Config> crate::Client<C> {
    /// Returns the Jobs API resource
    #[must_use]
    pub const fn jobs(&self) -> Jobs<'_, C> {
        Jobs::new(self)
    }
}
