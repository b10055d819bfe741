use crate::clients::http::{endpoint, get_json};
use crate::clients::session::SessionContext;
use crate::framework::SourceError;
use crate::model::{RestaurantId, RestaurantProfile};
use reqwest::{Client, Url};
use tracing::{instrument, warn};

/// Restaurant Profile Service client: `GET {base}/menu/{restaurant_id}`.
#[derive(Debug, Clone)]
pub struct HttpProfileClient {
    client: Client,
    base_url: Url,
    session: SessionContext,
}

impl HttpProfileClient {
    pub fn new(client: Client, base_url: Url, session: SessionContext) -> Self {
        Self {
            client,
            base_url,
            session,
        }
    }

    #[instrument(skip(self, id), fields(restaurant_id = %id))]
    pub async fn fetch(&self, id: &RestaurantId) -> Result<RestaurantProfile, SourceError> {
        let url = endpoint(&self.base_url, &["menu", id.as_str()])?;
        get_json(&self.client, &self.session, url).await
    }

    /// Fetches the profile, falling back to the default branding on any failure.
    pub async fn fetch_or_fallback(&self, id: &RestaurantId) -> RestaurantProfile {
        match self.fetch(id).await {
            Ok(profile) => profile,
            Err(e) => {
                warn!(restaurant_id = %id, error = %e, "Using fallback restaurant profile");
                RestaurantProfile::fallback()
            }
        }
    }
}
