use reqwest::{Client, StatusCode, Url};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// The HTTP endpoint under test. Cloned into every trial.
#[derive(Clone, Debug)]
pub struct HttpTarget {
    client: Client,
    url: Url,
    queries: Arc<[(String, String)]>,
    next_query: Arc<AtomicUsize>,
    ignore_status: bool,
}

impl HttpTarget {
    pub fn new(client: Client, url: Url, queries: Vec<(String, String)>, ignore_status: bool) -> Self {
        Self {
            client,
            url,
            queries: queries.into(),
            next_query: Arc::new(AtomicUsize::new(0)),
            ignore_status,
        }
    }

    /// One trial: a GET of the target URL, body included.
    ///
    /// Error statuses are failures unless `ignore_status` is set, in which case only transport
    /// errors are.
    pub async fn request(self) -> Result<StatusCode, reqwest::Error> {
        let mut req = self.client.get(self.url.clone());
        if let Some((key, value)) = self.next_query() {
            req = req.query(&[(key, value)]);
        }

        let res = req.send().await?;
        let res = if self.ignore_status {
            res
        } else {
            res.error_for_status()?
        };

        let status = res.status();
        res.bytes().await?;
        Ok(status)
    }

    fn next_query(&self) -> Option<&(String, String)> {
        if self.queries.is_empty() {
            return None;
        }
        let idx = self.next_query.fetch_add(1, Ordering::Relaxed);
        self.queries.get(idx % self.queries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    async fn mock_url(path: &str) -> Url {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(mock_service::serve(listener));
        Url::parse(&format!("http://{addr}{path}")).unwrap()
    }

    #[test]
    fn queries_rotate() {
        let target = HttpTarget::new(
            Client::new(),
            Url::parse("http://localhost/deals/").unwrap(),
            vec![
                ("search".to_string(), "spa".to_string()),
                ("search".to_string(), "hotel".to_string()),
            ],
            false,
        );
        let clone = target.clone();

        assert_eq!(target.next_query().unwrap().1, "spa");
        assert_eq!(clone.next_query().unwrap().1, "hotel");
        assert_eq!(target.next_query().unwrap().1, "spa");
    }

    #[test]
    fn no_queries() {
        let target = HttpTarget::new(
            Client::new(),
            Url::parse("http://localhost/").unwrap(),
            vec![],
            false,
        );
        assert!(target.next_query().is_none());
    }

    #[tokio::test]
    async fn error_status_is_a_failure() {
        let url = mock_url("/status/503").await;

        let target = HttpTarget::new(Client::new(), url.clone(), vec![], false);
        let err = target.request().await.unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::SERVICE_UNAVAILABLE));

        let target = HttpTarget::new(Client::new(), url, vec![], true);
        assert_eq!(
            target.request().await.unwrap(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[tokio::test]
    async fn search_request() {
        let url = mock_url("/deals/").await;
        let target = HttpTarget::new(
            Client::new(),
            url,
            vec![("search".to_string(), "restaurant".to_string())],
            false,
        );
        assert_eq!(target.request().await.unwrap(), StatusCode::OK);
    }
}
