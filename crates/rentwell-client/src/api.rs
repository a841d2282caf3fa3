//! Typed calls for every rental API route.

use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use rentwell_core::{
    Availability, BookingRequest, Item, ItemChanges, ItemDraft, RentalDetail, RentalStatus,
};

use crate::error::{ClientError, ClientResult};

/// Where the API lives and who is calling it.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// e.g. `"http://localhost:8080"`. A path prefix such as `/api` is kept.
    pub base_url: String,
    /// Bearer token for the signed-in user.
    pub token: String,
}

/// `POST /rentals` result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedRental {
    pub id: String,
    /// The idempotency key had been used before; no new rental was made.
    pub replayed: bool,
}

/// A rental's status after an action.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub id: String,
    pub status: RentalStatus,
}

/// An item with its live availability, as `GET /items/{id}` returns it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemView {
    #[serde(flatten)]
    pub item: Item,
    pub availability: Availability,
}

#[derive(Debug, Deserialize)]
struct IdBody {
    id: String,
}

#[derive(Debug, Deserialize)]
struct RentalList {
    rentals: Vec<RentalDetail>,
}

#[derive(Debug, Serialize)]
struct ListingBody {
    listed: bool,
}

/// HTTP client for the rental API.
#[derive(Debug, Clone)]
pub struct RentalClient {
    config: ClientConfig,
    http: Client,
}

impl RentalClient {
    /// Create a new client from the given configuration.
    #[must_use]
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            http: Client::new(),
        }
    }

    /// The same client acting as another user.
    #[must_use]
    pub fn with_token(&self, token: impl Into<String>) -> Self {
        Self {
            config: ClientConfig {
                base_url: self.config.base_url.clone(),
                token: token.into(),
            },
            http: self.http.clone(),
        }
    }

    // =========================================================================
    // Rentals
    // =========================================================================

    /// `POST /rentals`. The same `request_key` never creates two rentals.
    pub async fn create_rental(
        &self,
        request: &BookingRequest,
        request_key: Option<&str>,
    ) -> ClientResult<CreatedRental> {
        let mut builder = self.request(Method::POST, &["rentals"])?.json(request);
        if let Some(key) = request_key {
            builder = builder.header("Idempotency-Key", key);
        }

        let response = Self::check(builder.send().await?).await?;
        let replayed = response.status() == reqwest::StatusCode::OK;
        let body: IdBody = response.json().await?;

        Ok(CreatedRental {
            id: body.id,
            replayed,
        })
    }

    /// `GET /rentals`: the caller's own rentals, newest first.
    pub async fn my_rentals(&self) -> ClientResult<Vec<RentalDetail>> {
        let list: RentalList = self.get(&["rentals"]).await?;
        Ok(list.rentals)
    }

    /// `GET /rentals/my-items`: rentals of the caller's items.
    pub async fn rentals_of_my_items(&self) -> ClientResult<Vec<RentalDetail>> {
        let list: RentalList = self.get(&["rentals", "my-items"]).await?;
        Ok(list.rentals)
    }

    /// `GET /rentals/check/{item_id}`
    pub async fn check_availability(&self, item_id: &str) -> ClientResult<Availability> {
        self.get(&["rentals", "check", item_id]).await
    }

    /// `GET /rentals/{id}`
    pub async fn get_rental(&self, rental_id: &str) -> ClientResult<RentalDetail> {
        self.get(&["rentals", rental_id]).await
    }

    /// `PUT /rentals/{id}/pickup`
    pub async fn confirm_pickup(&self, rental_id: &str) -> ClientResult<StatusChange> {
        self.send_empty(Method::PUT, &["rentals", rental_id, "pickup"])
            .await
    }

    /// `PUT /rentals/{id}/return`
    pub async fn confirm_return(&self, rental_id: &str) -> ClientResult<StatusChange> {
        self.send_empty(Method::PUT, &["rentals", rental_id, "return"])
            .await
    }

    /// `PUT /rentals/{id}/complete`
    pub async fn complete(&self, rental_id: &str) -> ClientResult<StatusChange> {
        self.send_empty(Method::PUT, &["rentals", rental_id, "complete"])
            .await
    }

    /// `DELETE /rentals/{id}`
    pub async fn cancel(&self, rental_id: &str) -> ClientResult<StatusChange> {
        self.send_empty(Method::DELETE, &["rentals", rental_id])
            .await
    }

    // =========================================================================
    // Items
    // =========================================================================

    /// `POST /items`
    pub async fn create_item(&self, draft: &ItemDraft) -> ClientResult<Item> {
        let builder = self.request(Method::POST, &["items"])?.json(draft);
        Ok(Self::check(builder.send().await?).await?.json().await?)
    }

    /// `GET /items/{id}`
    pub async fn get_item(&self, item_id: &str) -> ClientResult<ItemView> {
        self.get(&["items", item_id]).await
    }

    /// `PUT /items/{id}`
    pub async fn update_item(&self, item_id: &str, changes: &ItemChanges) -> ClientResult<Item> {
        let builder = self.request(Method::PUT, &["items", item_id])?.json(changes);
        Ok(Self::check(builder.send().await?).await?.json().await?)
    }

    /// `PUT /items/{id}/listing`
    pub async fn set_listing(&self, item_id: &str, listed: bool) -> ClientResult<Item> {
        let builder = self
            .request(Method::PUT, &["items", item_id, "listing"])?
            .json(&ListingBody { listed });
        Ok(Self::check(builder.send().await?).await?.json().await?)
    }

    // =========================================================================
    // Plumbing
    // =========================================================================

    /// Appends `segments` to the base URL, percent-encoding each one, so an
    /// id can never add path segments or a query of its own.
    fn url(&self, segments: &[&str]) -> ClientResult<Url> {
        let invalid = || ClientError::BaseUrl(self.config.base_url.clone());

        let mut url = Url::parse(&self.config.base_url).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|()| invalid())?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> ClientResult<RequestBuilder> {
        let url = self.url(segments)?;
        debug!(%method, %url, "Rental API request");
        Ok(self
            .http
            .request(method, url)
            .bearer_auth(&self.config.token))
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> ClientResult<T> {
        self.send_empty(Method::GET, segments).await
    }

    /// Sends a request without a body and decodes the JSON answer.
    async fn send_empty<T: DeserializeOwned>(
        &self,
        method: Method,
        segments: &[&str],
    ) -> ClientResult<T> {
        let response = self.request(method, segments)?.send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// Passes 2xx responses through and maps the rest to [`ClientError`].
    async fn check(response: Response) -> ClientResult<Response> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        debug!(%status, body = %text, "Rental API error");
        Err(ClientError::from_response(status, &text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> RentalClient {
        RentalClient::new(ClientConfig {
            base_url: base_url.to_string(),
            token: "t".to_string(),
        })
    }

    #[test]
    fn test_ids_stay_inside_their_segment() {
        let url = client("http://localhost:8080")
            .url(&["items", "a/b?c=d#e"])
            .unwrap();
        assert_eq!(url.path(), "/items/a%2Fb%3Fc=d%23e");
        assert!(url.query().is_none());
        assert!(url.fragment().is_none());
    }

    #[test]
    fn test_base_path_is_kept() {
        let url = client("http://localhost:8080/api/")
            .url(&["rentals", "r-1", "pickup"])
            .unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/rentals/r-1/pickup");
    }

    #[test]
    fn test_bad_base_url() {
        assert!(matches!(
            client("not a url").url(&["rentals"]),
            Err(ClientError::BaseUrl(_))
        ));
        assert!(matches!(
            client("mailto:ops@example.com").url(&["rentals"]),
            Err(ClientError::BaseUrl(_))
        ));
    }
}
