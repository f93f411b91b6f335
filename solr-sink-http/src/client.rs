use super::config::SolrConfig;
use super::types::{command_stream, error_message, update_body, ListCollectionsResponse};
use solr_sink::{AdminTransport, DispatchTransport, SinkError, UpdateRequest};
use std::time::Duration;

/// HTTP client for one Solr cluster: collections admin plus direct update
/// dispatch. Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct SolrClient {
    config: SolrConfig,
    http_client: reqwest::Client,
}

impl SolrClient {
    pub fn new(config: SolrConfig) -> Result<Self, SinkError> {
        config.validate()?;
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SinkError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    pub fn config(&self) -> &SolrConfig {
        &self.config
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.username {
            Some(user) => builder.basic_auth(user, self.config.password.as_deref()),
            None => builder,
        }
    }

    async fn execute(
        &self,
        builder: reqwest::RequestBuilder,
        what: &str,
    ) -> Result<String, SinkError> {
        let response = self
            .authorize(builder)
            .send()
            .await
            .map_err(|e| SinkError::Transport(format!("{} failed: {}", what, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SinkError::Transport(format!("{}: failed to read response: {}", what, e)))?;

        if !status.is_success() {
            return Err(SinkError::Server {
                status: status.as_u16(),
                message: format!("{}: {}", what, error_message(&body)),
            });
        }
        Ok(body)
    }

    /// `{url}/{collection}/update`, with the collection name encoded as a
    /// single path segment.
    fn update_url(&self, collection: &str) -> Result<reqwest::Url, SinkError> {
        let mut url = reqwest::Url::parse(self.config.base_url())
            .map_err(|e| SinkError::Config(format!("invalid Solr URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| SinkError::Config(format!("Solr URL {} cannot be a base", self.config.url)))?
            .pop_if_empty()
            .push(collection)
            .push("update");
        Ok(url)
    }

    fn update_query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![("wt", "json".to_string())];
        if let Some(ms) = self.config.commit_within_ms {
            query.push(("commitWithin", ms.to_string()));
        }
        query
    }

    async fn post_update(&self, collection: &str, body: String) -> Result<(), SinkError> {
        let builder = self
            .http_client
            .post(self.update_url(collection)?)
            .query(&self.update_query())
            .header("Content-Type", "application/json")
            .body(body);
        self.execute(builder, &format!("update {}", collection))
            .await
            .map(|_| ())
    }

    /// Send several requests as one ordered command stream.
    pub async fn send_commands(
        &self,
        collection: &str,
        requests: &[UpdateRequest],
    ) -> Result<(), SinkError> {
        if requests.is_empty() {
            return Ok(());
        }
        let body = command_stream(requests)?;
        tracing::debug!(
            "[SOLR] {} <- {} request(s) in one command stream",
            collection,
            requests.len()
        );
        self.post_update(collection, body).await
    }
}

impl AdminTransport for SolrClient {
    async fn list_collections(&self) -> Result<Vec<String>, SinkError> {
        let url = format!("{}/admin/collections", self.config.base_url());
        let builder = self
            .http_client
            .get(&url)
            .query(&[("action", "LIST"), ("wt", "json")]);
        let body = self.execute(builder, "list collections").await?;
        let resp: ListCollectionsResponse = serde_json::from_str(&body)?;
        Ok(resp.collections)
    }

    async fn create_collection(
        &self,
        name: &str,
        num_shards: u32,
        replication_factor: u32,
        max_shards_per_node: u32,
    ) -> Result<(), SinkError> {
        let url = format!("{}/admin/collections", self.config.base_url());
        let builder = self.http_client.get(&url).query(&[
            ("action", "CREATE".to_string()),
            ("name", name.to_string()),
            ("numShards", num_shards.to_string()),
            ("replicationFactor", replication_factor.to_string()),
            ("maxShardsPerNode", max_shards_per_node.to_string()),
            ("wt", "json".to_string()),
        ]);
        let what = format!("create collection {}", name);
        let body = self.execute(builder, &what).await?;

        // Per-node failures come back with a 200 and a "failure" block.
        if let Ok(v) = serde_json::from_str::<serde_json::Value>(&body) {
            if v.get("failure").is_some() {
                return Err(SinkError::Server {
                    status: 200,
                    message: format!("{}: {}", what, error_message(&body)),
                });
            }
        }
        Ok(())
    }
}

impl DispatchTransport for SolrClient {
    async fn send(&mut self, collection: &str, request: &UpdateRequest) -> Result<(), SinkError> {
        if request.is_empty() {
            return Ok(());
        }
        tracing::trace!(
            "[SOLR] {} <- {} x{}",
            collection,
            request.kind(),
            request.len()
        );
        self.post_update(collection, update_body(request)?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solr_sink::convert::text_document;
    use wiremock::matchers::{body_string, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> SolrClient {
        SolrClient::new(SolrConfig {
            url: server.uri(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_rejects_invalid_config() {
        let result = SolrClient::new(SolrConfig {
            url: "ftp://nope".into(),
            ..Default::default()
        });
        assert!(matches!(result, Err(SinkError::Config(_))));
    }

    #[tokio::test]
    async fn test_list_collections() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/admin/collections"))
            .and(query_param("action", "LIST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "responseHeader": {"status": 0, "QTime": 1},
                "collections": ["products", "users"]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let names = client_for(&server).list_collections().await.unwrap();
        assert_eq!(names, vec!["products", "users"]);
    }

    #[tokio::test]
    async fn test_create_collection_passes_parameters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/admin/collections"))
            .and(query_param("action", "CREATE"))
            .and(query_param("name", "orders"))
            .and(query_param("numShards", "2"))
            .and(query_param("replicationFactor", "3"))
            .and(query_param("maxShardsPerNode", "4"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "responseHeader": {"status": 0},
                "success": {}
            })))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server)
            .create_collection("orders", 2, 3, 4)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_create_collection_rejection_is_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/admin/collections"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "responseHeader": {"status": 400},
                "error": {"msg": "numShards is a required param", "code": 400}
            })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .create_collection("orders", 1, 1, 1)
            .await
            .unwrap_err();
        match err {
            SinkError::Server { status, message } => {
                assert_eq!(status, 400);
                assert!(message.contains("numShards is a required param"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_collection_failure_block_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/admin/collections"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "responseHeader": {"status": 0},
                "failure": {"node1:8983_solr": "Could not create core"}
            })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .create_collection("orders", 1, 1, 1)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Could not create core"));
    }

    #[tokio::test]
    async fn test_send_add_posts_document_array() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/products/update"))
            .and(query_param("commitWithin", "1000"))
            .and(body_string(r#"[{"id":"p1","title":"Pan"}]"#))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "responseHeader": {"status": 0}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut client = SolrClient::new(SolrConfig {
            url: server.uri(),
            commit_within_ms: Some(1000),
            ..Default::default()
        })
        .unwrap();
        let req = UpdateRequest::Add(vec![text_document(&[("id", "p1"), ("title", "Pan")])]);
        client.send("products", &req).await.unwrap();
    }

    #[tokio::test]
    async fn test_send_delete_posts_ids() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/products/update"))
            .and(body_string(r#"{"delete":["p1","p2"]}"#))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let mut client = client_for(&server);
        let req = UpdateRequest::Delete(vec!["p1".into(), "p2".into()]);
        client.send("products", &req).await.unwrap();
    }

    #[tokio::test]
    async fn test_update_path_keeps_base_path_and_encodes_collection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/solr/a%2Fb%20c%3F/update"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let mut client = SolrClient::new(SolrConfig {
            url: format!("{}/solr/", server.uri()),
            ..Default::default()
        })
        .unwrap();
        client
            .send("a/b c?", &UpdateRequest::Delete(vec!["x".into()]))
            .await
            .unwrap();

        let received = server.received_requests().await.unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].url.query(), Some("wt=json"));
    }

    #[tokio::test]
    async fn test_server_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let mut client = client_for(&server);
        let err = client
            .send("products", &UpdateRequest::Delete(vec!["x".into()]))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            SinkError::Server {
                status: 503,
                message: "update products: overloaded".into()
            }
        );
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_error() {
        let mut client = SolrClient::new(SolrConfig {
            url: "http://127.0.0.1:1".into(),
            timeout_secs: 2,
            ..Default::default()
        })
        .unwrap();
        let err = client
            .send("products", &UpdateRequest::Delete(vec!["x".into()]))
            .await
            .unwrap_err();
        assert!(matches!(err, SinkError::Transport(_)));
    }

    #[tokio::test]
    async fn test_basic_auth_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/admin/collections"))
            // "solr:SolrRocks"
            .and(wiremock::matchers::header(
                "authorization",
                "Basic c29scjpTb2xyUm9ja3M=",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "collections": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = SolrClient::new(SolrConfig {
            url: server.uri(),
            username: Some("solr".into()),
            password: Some("SolrRocks".into()),
            ..Default::default()
        })
        .unwrap();
        assert!(client.list_collections().await.unwrap().is_empty());
    }
}
