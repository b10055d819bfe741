use crate::clients::http::{endpoint, get_json};
use crate::clients::session::SessionContext;
use crate::framework::{SnapshotSource, SourceError};
use crate::model::{Order, OrderId};
use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::{info, instrument, warn};

/// Order Query Service client: `GET {base}/orders/{id}/status`.
#[derive(Debug, Clone)]
pub struct HttpOrderSource {
    client: Client,
    base_url: Url,
    session: SessionContext,
}

impl HttpOrderSource {
    pub fn new(client: Client, base_url: Url, session: SessionContext) -> Self {
        info!(%base_url, "Creating order query client");
        Self {
            client,
            base_url,
            session,
        }
    }

    pub fn status_url(&self, id: &OrderId) -> Result<Url, SourceError> {
        endpoint(&self.base_url, &["orders", id.as_str(), "status"])
    }
}

#[async_trait]
impl SnapshotSource<Order> for HttpOrderSource {
    #[instrument(skip(self, id), fields(order_id = %id))]
    async fn fetch(&self, id: &OrderId) -> Result<Order, SourceError> {
        let url = self.status_url(id)?;
        let order: Order = get_json(&self.client, &self.session, url).await.map_err(|e| {
            warn!(error = %e, "Order lookup failed");
            e
        })?;

        if order.id != *id {
            warn!(returned = %order.id, "Order lookup returned a different id");
            return Err(SourceError::Malformed(format!(
                "expected order {id}, got {}",
                order.id
            )));
        }
        Ok(order)
    }
}
