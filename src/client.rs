use crate::{
    config::SoftoneConfig,
    error::SoftoneResult,
    params::{flatten_params, merge_overrides},
    response::{normalize, GatewayResponse, GATEWAY_CONTENT_TYPE},
    session::{read_state, SessionApi, SessionState},
};
use log::debug;
use reqwest::{header, Client, Method};
use serde_json::{Map, Value};
use std::sync::{Arc, RwLock};
use url::Url;

/// Main SoftOne gateway client.
///
/// Cloning is cheap; clones share the underlying HTTP client and the cached
/// session token.
#[derive(Clone)]
pub struct SoftoneClient {
    http: Client,
    service_url: Url,
    pub(crate) config: SoftoneConfig,
    pub(crate) session: Arc<RwLock<SessionState>>,
}

impl SoftoneClient {
    /// Create a new client. Validates the configuration (https-only URLs,
    /// required credentials) before any network I/O, then runs the
    /// auto-login chain when the config requests it.
    pub async fn new(config: SoftoneConfig) -> SoftoneResult<Self> {
        let (service_url, dev_url) = config.validate()?;

        let mut builder = Client::builder().user_agent(concat!(
            "Softone REST API - Rust Client/",
            env!("CARGO_PKG_VERSION")
        ));
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        Self::from_parts(http, service_url, dev_url, config).await
    }

    /// Create a client with a custom pre-built reqwest client. This is the
    /// escape hatch for transport options (proxies, TLS settings, extra
    /// default headers) the configuration surface does not cover.
    pub async fn with_client(http: Client, config: SoftoneConfig) -> SoftoneResult<Self> {
        let (service_url, dev_url) = config.validate()?;
        Self::from_parts(http, service_url, dev_url, config).await
    }

    /// Point the client at an arbitrary service URL, bypassing only the URL
    /// normalization. Used by the in-crate mock-gateway tests.
    #[cfg(test)]
    pub(crate) async fn with_service_url(
        config: SoftoneConfig,
        service_url: Url,
    ) -> SoftoneResult<Self> {
        config.validate()?;
        Self::from_parts(Client::new(), service_url.clone(), service_url, config).await
    }

    async fn from_parts(
        http: Client,
        service_url: Url,
        dev_url: Url,
        config: SoftoneConfig,
    ) -> SoftoneResult<Self> {
        let service_url = if config.sandbox { dev_url } else { service_url };

        let client = Self {
            http,
            service_url,
            config,
            session: Arc::new(RwLock::new(SessionState::Unauthenticated)),
        };

        if client.config.auto_login {
            client.session().auto_login().await?;
        }

        Ok(client)
    }

    /// The gateway URL requests are sent to (production or sandbox,
    /// depending on the `sandbox` flag)
    pub fn service_url(&self) -> &Url {
        &self.service_url
    }

    /// The configured transport-level response encoding knob
    pub fn response_encoding(&self) -> &str {
        &self.config.response_encoding
    }

    /// Session operations (login, authenticate, auto-login)
    pub fn session(&self) -> SessionApi<'_> {
        SessionApi::new(self)
    }

    /// The currently cached session token, if any
    pub fn session_token(&self) -> Option<String> {
        read_state(&self.session).token().map(str::to_string)
    }

    /// GET request to the gateway
    pub async fn get(&self, data: Value) -> SoftoneResult<GatewayResponse> {
        self.get_with(data, None, "").await
    }

    /// GET request with query parameters and a custom endpoint suffix
    pub async fn get_with(
        &self,
        data: Value,
        params: Option<Value>,
        endpoint: &str,
    ) -> SoftoneResult<GatewayResponse> {
        let payload = self.service_payload(data);
        self.request(Method::GET, &payload, params.as_ref(), endpoint)
            .await
    }

    /// POST request to the gateway
    pub async fn post(&self, data: Value) -> SoftoneResult<GatewayResponse> {
        self.post_with(data, None, "").await
    }

    /// POST request with query parameters and a custom endpoint suffix
    pub async fn post_with(
        &self,
        data: Value,
        params: Option<Value>,
        endpoint: &str,
    ) -> SoftoneResult<GatewayResponse> {
        let payload = self.service_payload(data);
        self.request(Method::POST, &payload, params.as_ref(), endpoint)
            .await
    }

    /// Assemble a service payload: the configured appId, the session token
    /// (only while one is cached; the field is omitted entirely otherwise),
    /// then the caller's data, which wins on conflicts.
    fn service_payload(&self, data: Value) -> Value {
        let mut payload = Map::new();
        payload.insert("appId".to_string(), self.config.app_id.clone());
        if let Some(token) = self.session_token() {
            payload.insert("clientID".to_string(), Value::String(token));
        }
        merge_overrides(&mut payload, Some(data));
        Value::Object(payload)
    }

    /// Issue a request and normalize the response. Every response goes
    /// through the content-type check and windows-1253 decode.
    pub(crate) async fn request(
        &self,
        method: Method,
        payload: &Value,
        params: Option<&Value>,
        endpoint: &str,
    ) -> SoftoneResult<GatewayResponse> {
        // custom endpoint suffixes are appended verbatim to the service URL
        let url = if endpoint.is_empty() {
            self.service_url.clone()
        } else {
            let base = self.service_url.as_str().trim_end_matches('/');
            Url::parse(&format!("{base}{endpoint}"))?
        };

        debug!("HTTP {} {}", method, url);

        let mut request = self
            .http
            .request(method, url)
            .header(header::ACCEPT, "application/json")
            .header(header::CONTENT_TYPE, GATEWAY_CONTENT_TYPE)
            .body(serde_json::to_string(payload)?);

        if let Some(params) = params {
            let query = flatten_params(params);
            if !query.is_empty() {
                request = request.query(&query);
            }
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?;

        normalize(status, content_type.as_deref(), &body)
    }
}
