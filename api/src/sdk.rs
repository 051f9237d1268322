use minetally_types::Envelope;
use reqwest::Url;
use serde::de::DeserializeOwned;

use crate::{
    error::ApiError,
    state::{Amount, Payment, ShareSample, WorkerIdentity},
};

/// The remote data the poller and reports consume.
///
/// Every method fails with `ApiError::TransientFetch` when the call fails or
/// the response can't be used; callers skip that data and retry later.
#[allow(async_fn_in_trait)]
pub trait PoolSource {
    async fn fetch_workers(&self, address: &str) -> Result<Vec<WorkerIdentity>, ApiError>;

    async fn fetch_share_history(
        &self,
        address: &str,
        worker_name: &str,
    ) -> Result<Vec<ShareSample>, ApiError>;

    async fn fetch_payments(&self, address: &str) -> Result<Vec<Payment>, ApiError>;

    async fn fetch_balance(&self, address: &str) -> Result<Amount, ApiError>;
}

/// client for the nanopool http api
pub struct NanopoolClient {
    http_client: reqwest::Client,
    /// e.g. https://api.nanopool.org/v1/eth
    base_url: Url,
}

impl NanopoolClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url)
            .map_err(|err| ApiError::ConfigMalformed(format!("api url '{}': {}", base_url, err)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::ConfigMalformed(format!(
                "api url '{}' cannot be a base",
                base_url
            )));
        }
        Ok(Self {
            http_client: reqwest::Client::new(),
            base_url,
        })
    }

    fn url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::TransientFetch(format!("invalid api url {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// GETs the url and unwraps the status envelope.
    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ApiError> {
        let url = self.url(segments)?;
        log::debug!("GET {}", url);
        let envelope = self
            .http_client
            .get(url.clone())
            .send()
            .await?
            .error_for_status()?
            .json::<Envelope<T>>()
            .await?;
        if !envelope.status {
            return Err(ApiError::TransientFetch(format!(
                "{}: {}",
                url,
                envelope.error.unwrap_or_else(|| "status false".to_string())
            )));
        }
        envelope
            .data
            .ok_or_else(|| ApiError::TransientFetch(format!("{}: missing data", url)))
    }
}

impl PoolSource for NanopoolClient {
    async fn fetch_workers(&self, address: &str) -> Result<Vec<WorkerIdentity>, ApiError> {
        let workers = self
            .get::<Vec<minetally_types::Worker>>(&["workers", address])
            .await?;
        Ok(workers.into_iter().map(WorkerIdentity::from).collect())
    }

    async fn fetch_share_history(
        &self,
        address: &str,
        worker_name: &str,
    ) -> Result<Vec<ShareSample>, ApiError> {
        let shares = self
            .get::<Vec<minetally_types::Shares>>(&["shareratehistory", address, worker_name])
            .await?;
        Ok(shares.into_iter().map(ShareSample::from).collect())
    }

    async fn fetch_payments(&self, address: &str) -> Result<Vec<Payment>, ApiError> {
        let payments = self
            .get::<Vec<minetally_types::Payment>>(&["payments", address])
            .await?;
        payments.into_iter().map(Payment::try_from).collect()
    }

    async fn fetch_balance(&self, address: &str) -> Result<Amount, ApiError> {
        let balance = self.get::<f64>(&["balance", address]).await?;
        Amount::from_coins(balance)
            .ok_or_else(|| ApiError::TransientFetch(format!("invalid balance {}", balance)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        matchers::{method, path},
        Mock, MockServer, ResponseTemplate,
    };

    const ADDRESS: &str = "0xdeadbeef";

    async fn mount(server: &MockServer, route: &str, response: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(response)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_fetch_workers() {
        let server = MockServer::start().await;
        mount(
            &server,
            "/workers/0xdeadbeef",
            ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": true,
                "data": [
                    {"uid": 16818403, "id": "DESKTOP-AH56HCB", "hashrate": 0, "lastShare": 1620277013, "rating": 20062},
                    {"uid": 20029185, "id": "LAPTOP-707IIDV9", "hashrate": 0, "lastShare": 1620277218, "rating": 9236}
                ]
            })),
        )
        .await;

        let client = NanopoolClient::new(&server.uri()).unwrap();
        let workers = client.fetch_workers(ADDRESS).await.unwrap();
        assert_eq!(
            workers,
            vec![
                WorkerIdentity::new(16818403, "DESKTOP-AH56HCB"),
                WorkerIdentity::new(20029185, "LAPTOP-707IIDV9"),
            ]
        );
    }

    #[tokio::test]
    async fn test_fetch_share_history_with_base_path() {
        let server = MockServer::start().await;
        mount(
            &server,
            "/v1/eth/shareratehistory/0xdeadbeef/rig-1",
            ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": true,
                "data": [{"date": 1620277200, "shares": 12}, {"date": 1620276600, "shares": 9}]
            })),
        )
        .await;

        let client = NanopoolClient::new(&format!("{}/v1/eth", server.uri())).unwrap();
        let samples = client.fetch_share_history(ADDRESS, "rig-1").await.unwrap();
        assert_eq!(
            samples,
            vec![ShareSample::new(1620277200, 12), ShareSample::new(1620276600, 9)]
        );
    }

    #[tokio::test]
    async fn test_fetch_payments_and_balance() {
        let server = MockServer::start().await;
        mount(
            &server,
            "/payments/0xdeadbeef",
            ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": true,
                "data": [{"date": 1620000000, "txHash": "0xabc", "amount": 0.25, "confirmed": false}]
            })),
        )
        .await;
        mount(
            &server,
            "/balance/0xdeadbeef",
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"status": true, "data": 0.5})),
        )
        .await;

        let client = NanopoolClient::new(&server.uri()).unwrap();
        let payments = client.fetch_payments(ADDRESS).await.unwrap();
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].amount, Amount::from_units(250_000_000));
        assert!(!payments[0].confirmed);
        assert_eq!(payments[0].tx_hash, "0xabc");

        let balance = client.fetch_balance(ADDRESS).await.unwrap();
        assert_eq!(balance, Amount::from_units(500_000_000));
    }

    #[tokio::test]
    async fn test_status_false_is_transient() {
        let server = MockServer::start().await;
        mount(
            &server,
            "/workers/0xdeadbeef",
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"status": false, "error": "No workers"})),
        )
        .await;

        let client = NanopoolClient::new(&server.uri()).unwrap();
        let err = client.fetch_workers(ADDRESS).await.unwrap_err();
        assert!(err.is_transient());
        assert!(err.to_string().contains("No workers"));
    }

    #[tokio::test]
    async fn test_http_error_is_transient() {
        let server = MockServer::start().await;
        mount(&server, "/payments/0xdeadbeef", ResponseTemplate::new(500)).await;

        let client = NanopoolClient::new(&server.uri()).unwrap();
        assert!(client.fetch_payments(ADDRESS).await.unwrap_err().is_transient());
    }

    #[tokio::test]
    async fn test_malformed_body_is_transient() {
        let server = MockServer::start().await;
        mount(
            &server,
            "/shareratehistory/0xdeadbeef/rig-1",
            ResponseTemplate::new(200).set_body_string("<html>rate limited</html>"),
        )
        .await;

        let client = NanopoolClient::new(&server.uri()).unwrap();
        let err = client.fetch_share_history(ADDRESS, "rig-1").await.unwrap_err();
        assert!(err.is_transient());
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            NanopoolClient::new("not a url"),
            Err(ApiError::ConfigMalformed(_))
        ));
    }
}
