/*
[INPUT]:  Read-only query parameters
[OUTPUT]: Market and account state from the info endpoint
[POS]:    Info layer - unauthenticated read client
[UPDATE]: When adding read queries consumed by trading flows
*/

use serde::Serialize;

use crate::errors::Result;
use crate::http::{BaseUrl, ClientConfig, HttpClient};
use crate::types::{AllMids, UserState};

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum InfoRequest<'a> {
    AllMids,
    ClearinghouseState { user: &'a str },
}

/// Unauthenticated client: read operations only. Trading operations live on
/// the authenticated `ExchangeClient`, so calling them here is a type-level
/// impossibility rather than a runtime gate.
#[derive(Debug, Clone)]
pub struct InfoClient {
    http: HttpClient,
}

impl InfoClient {
    pub fn new(base_url: BaseUrl) -> Result<Self> {
        Ok(Self {
            http: HttpClient::new(base_url)?,
        })
    }

    pub fn with_config(base_url: BaseUrl, config: ClientConfig) -> Result<Self> {
        Ok(Self {
            http: HttpClient::with_config(base_url, config)?,
        })
    }

    pub(crate) fn from_http(http: HttpClient) -> Self {
        Self { http }
    }

    /// Mid prices for every coin, keyed by canonical coin id.
    pub async fn all_mids(&self) -> Result<AllMids> {
        self.http.post("/info", &InfoRequest::AllMids).await
    }

    /// Clearinghouse state (positions, margin) for a user address.
    pub async fn user_state(&self, user: &str) -> Result<UserState> {
        self.http
            .post("/info", &InfoRequest::ClearinghouseState { user })
            .await
    }
}
