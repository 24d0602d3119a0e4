use crate::{
    config::Profile,
    grafana::datasource::{Datasource, DatasourceSpec},
    metrics,
};
use anyhow::Context;
use reqwest::{Method, RequestBuilder, Response, StatusCode, header::ACCEPT};

pub mod datasource;

pub struct Grafana {
    profile: Profile,
    client: reqwest::Client,
}

impl Grafana {
    /// Create a new Grafana instance
    pub fn new(profile: Profile) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(profile.insecure)
            .timeout(profile.timeout)
            .build()?;

        Ok(Self { profile, client })
    }

    /// Get datasources from Grafana
    #[tracing::instrument(skip(self))]
    pub async fn get_datasources(&self) -> anyhow::Result<Vec<Datasource>> {
        tracing::debug!("Fetching datasources from Grafana");

        let response = self
            .send(Method::GET, "/api/datasources", None)
            .await?
            .error_for_status()
            .context("Failed to list data sources")?
            .json::<Vec<Datasource>>()
            .await
            .context("Failed to decode data source list")?;

        Ok(response)
    }

    /// Find a datasource by name
    #[tracing::instrument(skip(self))]
    pub async fn get_datasource(&self, name: &str) -> anyhow::Result<Option<Datasource>> {
        let datasource = self
            .get_datasources()
            .await?
            .into_iter()
            .find(|ds| ds.name == name);

        Ok(datasource)
    }

    /// Create a new datasource
    #[tracing::instrument(skip(self, spec), fields(name = %spec.name))]
    pub async fn create_datasource(&self, spec: &DatasourceSpec) -> anyhow::Result<()> {
        tracing::info!("Creating data source");

        self.send(Method::POST, "/api/datasources", Some(spec))
            .await?
            .error_for_status()
            .with_context(|| format!("Failed to create data source {}", spec.name))?;

        Ok(())
    }

    /// Replace an existing datasource with the given spec
    #[tracing::instrument(skip(self, spec), fields(name = %spec.name))]
    pub async fn update_datasource(&self, id: u64, spec: &DatasourceSpec) -> anyhow::Result<()> {
        tracing::info!("Updating data source");

        self.send(Method::PUT, &format!("/api/datasources/{}", id), Some(spec))
            .await?
            .error_for_status()
            .with_context(|| format!("Failed to update data source {}", spec.name))?;

        Ok(())
    }

    /// Delete a datasource. The response status is returned unchecked.
    #[tracing::instrument(skip(self))]
    pub async fn delete_datasource(&self, id: u64) -> anyhow::Result<StatusCode> {
        tracing::info!("Deleting data source");

        let response = self
            .send(Method::DELETE, &format!("/api/datasources/{}", id), None)
            .await?;

        Ok(response.status())
    }

    /// Build an authenticated request against the profile's Grafana
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let request = self
            .client
            .request(method, format!("{}{}", self.profile.url, path))
            .header(ACCEPT, "application/json");

        match (&self.profile.token, &self.profile.user) {
            (Some(token), _) => request.bearer_auth(token),
            (None, Some(user)) => request.basic_auth(user, self.profile.password.as_ref()),
            (None, None) => request,
        }
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&DatasourceSpec>,
    ) -> anyhow::Result<Response> {
        let _timer = metrics::grafana::request_timer(&method);

        let mut request = self.request(method.clone(), path);
        if let Some(body) = body {
            request = request.json(body);
        }

        match request.send().await {
            Ok(response) => {
                metrics::grafana::record_request(&method, response.status().as_str());
                Ok(response)
            }
            Err(e) => {
                metrics::grafana::record_request(&method, "error");
                Err(anyhow::Error::new(e).context(format!("{} {} failed", method, path)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn grafana(server: &MockServer) -> Grafana {
        let profile =
            Profile::new(server.uri(), Some("test-token".into()), None, None, false).unwrap();
        Grafana::new(profile).unwrap()
    }

    #[tokio::test]
    async fn lookup_sends_token_and_finds_by_name() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/datasources"))
            .and(header("authorization", "Bearer test-token"))
            .and(header("accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 1, "orgId": 1, "name": "graphite", "type": "graphite"},
                {"id": 2, "orgId": 1, "name": "influxdb", "type": "influxdb"},
            ])))
            .expect(2)
            .mount(&server)
            .await;

        let grafana = grafana(&server);

        let found = grafana.get_datasource("influxdb").await.unwrap().unwrap();
        assert_eq!(found.id, 2);

        assert!(grafana.get_datasource("loki").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn lookup_fails_on_error_status() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/datasources"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        assert!(grafana(&server).get_datasource("influxdb").await.is_err());
    }

    #[tokio::test]
    async fn basic_auth_is_used_without_token() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/datasources"))
            .and(header("authorization", "Basic YWRtaW46YWRtaW4="))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let profile = Profile::new(server.uri(), None, None, None, false)
            .unwrap()
            .with_basic_auth(Some("admin".into()), Some("admin".into()));
        let grafana = Grafana::new(profile).unwrap();

        assert!(grafana.get_datasources().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_and_update_send_full_body() {
        let server = MockServer::start().await;
        let spec = DatasourceSpec::new("influxdb", "influxdb", "http://localhost:8086");
        let body = serde_json::Value::Object(spec.to_map().unwrap());

        Mock::given(method("POST"))
            .and(path("/api/datasources"))
            .and(body_json(&body))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("PUT"))
            .and(path("/api/datasources/5"))
            .and(body_json(&body))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let grafana = grafana(&server);
        grafana.create_datasource(&spec).await.unwrap();
        grafana.update_datasource(5, &spec).await.unwrap();
    }

    #[tokio::test]
    async fn create_fails_on_error_status() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/datasources"))
            .respond_with(ResponseTemplate::new(409))
            .mount(&server)
            .await;

        let spec = DatasourceSpec::new("influxdb", "influxdb", "http://localhost:8086");
        let err = grafana(&server).create_datasource(&spec).await.unwrap_err();

        assert!(format!("{:#}", err).contains("Failed to create data source influxdb"));
    }

    #[tokio::test]
    async fn delete_returns_status_unchecked() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/api/datasources/9"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let status = grafana(&server).delete_datasource(9).await.unwrap();
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
