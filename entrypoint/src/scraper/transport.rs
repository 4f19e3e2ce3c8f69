use common::record::ProductRecord;
use crawler::{
    errors::CrawlerError, request::RequestBuilder, traits::StatusCode,
    unprotected::UnprotectedCrawler,
};
use serde_json::json;
use tracing::{debug, error, info};

#[derive(Debug)]
pub(crate) enum TransportResult {
    Accepted { status: StatusCode },
    Rejected { status: StatusCode, body: String },
    Failed(CrawlerError),
}

impl TransportResult {
    pub(crate) fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }
}

/// Hands a whole record set to the ingestion endpoint in one request.
///
/// Nothing is retried here, a failed hand-off is reported and the operator
/// re-runs the scrape.
pub(crate) struct BatchTransporter {
    crawler: UnprotectedCrawler,
    endpoint: String,
}

impl BatchTransporter {
    pub(crate) fn new(crawler: UnprotectedCrawler, endpoint: impl Into<String>) -> Self {
        Self {
            crawler,
            endpoint: endpoint.into(),
        }
    }

    pub(crate) async fn submit(&self, records: &[ProductRecord]) -> TransportResult {
        info!("Sending {} products to API...", records.len());

        let request = RequestBuilder::new()
            .set_url(&self.endpoint)
            .set_json_body(json!({ "products": records }))
            .add_header("Accept", "application/json")
            .build();

        let response = match self.crawler.make_web_request(request).await {
            Ok(response) => response,
            Err(err) => {
                error!("Could not reach the API at {}: {err}", self.endpoint);

                return TransportResult::Failed(err);
            }
        };

        if !response.status.is_success() {
            error!("API error: {} {}", response.status, response.body);

            return TransportResult::Rejected {
                status: response.status,
                body: response.body,
            };
        }

        info!("Successfully sent to API");
        debug!("API response: {}", response.body);

        TransportResult::Accepted {
            status: response.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Json, Router, extract::State, http::StatusCode as AxumStatus, routing::post};
    use common::record::Price;
    use crawler::unprotected::FetchOptions;
    use serde_json::Value;
    use tokio::net::TcpListener;

    use super::*;

    type Received = Arc<Mutex<Vec<Value>>>;

    async fn serve(status: AxumStatus) -> (String, Received) {
        let received: Received = Arc::default();

        let app = Router::new()
            .route(
                "/api/import",
                post(
                    move |State(received): State<Received>, Json(body): Json<Value>| async move {
                        received.lock().unwrap().push(body);

                        (status, "{\"message\":\"done\"}")
                    },
                ),
            )
            .with_state(received.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{address}/api/import"), received)
    }

    fn transporter(endpoint: &str) -> BatchTransporter {
        BatchTransporter::new(UnprotectedCrawler::new(FetchOptions::default()).unwrap(), endpoint)
    }

    fn records() -> Vec<ProductRecord> {
        vec![
            ProductRecord::new("Widget", Price::from_cents(123450), "https://s.test/p/1")
                .with_description(""),
        ]
    }

    #[tokio::test]
    async fn sends_all_records_in_one_batch() {
        let (endpoint, received) = serve(AxumStatus::ACCEPTED).await;

        let result = transporter(&endpoint).submit(&records()).await;

        assert!(result.is_accepted());

        let received = received.lock().unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0]["products"][0]["name"], "Widget");
        assert_eq!(received[0]["products"][0]["price"], 1234.5);
    }

    #[tokio::test]
    async fn non_success_status_is_reported_with_body() {
        let (endpoint, received) = serve(AxumStatus::INTERNAL_SERVER_ERROR).await;

        let result = transporter(&endpoint).submit(&records()).await;

        match result {
            TransportResult::Rejected { status, body } => {
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
                assert!(body.contains("done"));
            }
            other => panic!("expected a rejection, got {other:?}"),
        }

        // no retry
        assert_eq!(received.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_reported_not_raised() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        drop(listener);

        let result = transporter(&format!("http://{address}/api/import"))
            .submit(&records())
            .await;

        assert!(matches!(result, TransportResult::Failed(_)));
    }
}
