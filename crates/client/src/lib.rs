//! HTTP persistence collaborator for the billfold engine.
//!
//! [`BillsClient`] speaks to the dashboard's REST backend (`bills/`
//! resource) and implements [`engine::BillRepository`], folding transport
//! and backend failures into the engine's [`PersistenceError`].
use api_types::bill::{BillNew, BillUpdate, BillView};
use engine::{Bill, BillId, BillInput, BillPatch, BillRepository, PersistenceError};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use thiserror::Error;

mod convert;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid base url: {0}")]
    BaseUrl(String),
    #[error("unauthorized")]
    Unauthorized,
    #[error("forbidden")]
    Forbidden,
    #[error("not found")]
    NotFound,
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("validation rejected: {0}")]
    Validation(String),
    #[error("server error: {0}")]
    Server(String),
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

/// Client for the `bills/` REST resource.
#[derive(Debug, Clone)]
pub struct BillsClient {
    base_url: Url,
    http: reqwest::Client,
}

impl BillsClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let base_url =
            Url::parse(base_url).map_err(|err| ClientError::BaseUrl(err.to_string()))?;
        Ok(Self {
            base_url,
            http: reqwest::Client::new(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(path)
            .map_err(|err| ClientError::BaseUrl(format!("invalid endpoint {path}: {err}")))
    }

    async fn error_for(res: reqwest::Response) -> ClientError {
        let status = res.status();
        let body = res
            .json::<ErrorResponse>()
            .await
            .map(|err| err.error)
            .unwrap_or_else(|_| "unknown error".to_string());

        match status.as_u16() {
            401 => ClientError::Unauthorized,
            403 => ClientError::Forbidden,
            404 => ClientError::NotFound,
            409 => ClientError::Conflict(body),
            400 | 422 => ClientError::Validation(body),
            _ => ClientError::Server(body),
        }
    }

    pub async fn list_bills(&self) -> Result<Vec<BillView>, ClientError> {
        let res = self.http.get(self.endpoint("bills/")?).send().await?;

        if res.status().is_success() {
            return res.json::<Vec<BillView>>().await.map_err(ClientError::from);
        }
        Err(Self::error_for(res).await)
    }

    pub async fn create_bill(&self, payload: &BillNew) -> Result<BillView, ClientError> {
        let res = self
            .http
            .post(self.endpoint("bills/")?)
            .json(payload)
            .send()
            .await?;

        if res.status().is_success() {
            return res.json::<BillView>().await.map_err(ClientError::from);
        }
        Err(Self::error_for(res).await)
    }

    /// Applies a partial update. The backend may answer with the updated
    /// record (200) or with no body at all (204).
    pub async fn update_bill(
        &self,
        id: BillId,
        payload: &BillUpdate,
    ) -> Result<Option<BillView>, ClientError> {
        let res = self
            .http
            .patch(self.endpoint(&format!("bills/{id}/"))?)
            .json(payload)
            .send()
            .await?;

        match res.status() {
            StatusCode::NO_CONTENT => Ok(None),
            status if status.is_success() => {
                res.json::<BillView>().await.map(Some).map_err(ClientError::from)
            }
            _ => Err(Self::error_for(res).await),
        }
    }

    /// Deletes one bill, or its whole recurring series when `delete_series`
    /// is set; the backend removes the siblings server-side.
    pub async fn delete_bill(&self, id: BillId, delete_series: bool) -> Result<(), ClientError> {
        let mut endpoint = self.endpoint(&format!("bills/{id}/"))?;
        if delete_series {
            endpoint.query_pairs_mut().append_pair("delete_series", "true");
        }
        let res = self.http.delete(endpoint).send().await?;

        if res.status().is_success() {
            return Ok(());
        }
        Err(Self::error_for(res).await)
    }
}

impl From<ClientError> for PersistenceError {
    fn from(err: ClientError) -> Self {
        PersistenceError(err.to_string())
    }
}

impl BillRepository for BillsClient {
    async fn list(&self) -> Result<Vec<Bill>, PersistenceError> {
        let views = self.list_bills().await.map_err(PersistenceError::from)?;
        Ok(views.into_iter().map(convert::bill_from_view).collect())
    }

    async fn create(&self, input: &BillInput) -> Result<Bill, PersistenceError> {
        let payload = convert::new_from_input(input);
        let view = self
            .create_bill(&payload)
            .await
            .map_err(PersistenceError::from)?;
        Ok(convert::bill_from_view(view))
    }

    async fn update(
        &self,
        id: BillId,
        patch: &BillPatch,
    ) -> Result<Option<Bill>, PersistenceError> {
        let payload = convert::update_from_patch(patch);
        let view = self
            .update_bill(id, &payload)
            .await
            .map_err(PersistenceError::from)?;
        Ok(view.map(convert::bill_from_view))
    }

    async fn delete(&self, id: BillId, delete_series: bool) -> Result<(), PersistenceError> {
        self.delete_bill(id, delete_series)
            .await
            .map_err(PersistenceError::from)
    }
}
