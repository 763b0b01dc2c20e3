use crate::{
    client::SoftoneClient,
    error::{SoftoneError, SoftoneResult},
    models::TenantContext,
    params::merge_overrides,
    response::GatewayResponse,
};
use log::{debug, info};
use reqwest::Method;
use serde_json::{Map, Value};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Session lifecycle of a client instance. A token is only ever stored from
/// a response with HTTP status 200 and `success == true`; failed attempts
/// leave any previously cached token untouched.
#[derive(Debug, Clone)]
pub(crate) enum SessionState {
    Unauthenticated,
    Authenticated { client_id: String },
}

impl SessionState {
    pub fn token(&self) -> Option<&str> {
        match self {
            Self::Unauthenticated => None,
            Self::Authenticated { client_id } => Some(client_id),
        }
    }
}

pub(crate) fn read_state(lock: &RwLock<SessionState>) -> RwLockReadGuard<'_, SessionState> {
    match lock.read() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn write_state(lock: &RwLock<SessionState>) -> RwLockWriteGuard<'_, SessionState> {
    match lock.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Session operations: the login/authenticate state machine that produces
/// and caches the gateway session token (`clientID`).
pub struct SessionApi<'a> {
    client: &'a SoftoneClient,
}

impl<'a> SessionApi<'a> {
    pub(crate) fn new(client: &'a SoftoneClient) -> Self {
        Self { client }
    }

    /// Bare login request.
    ///
    /// Sends `{service: "login", username, password, appId}` plus the
    /// optional login metadata, merged with `overrides` (caller fields win).
    /// Never mutates the cached token; a successful response carries the
    /// issued `clientID` and, for tenant selection, the `objs` array.
    pub async fn login(&self, overrides: Option<Value>) -> SoftoneResult<GatewayResponse> {
        let config = &self.client.config;
        info!("Logging in as {}", config.username);

        let mut payload = Map::new();
        payload.insert("service".to_string(), Value::String("login".to_string()));
        payload.insert("username".to_string(), Value::String(config.username.clone()));
        payload.insert("password".to_string(), Value::String(config.password.clone()));
        payload.insert("appId".to_string(), config.app_id.clone());
        if let Some(login_date) = &config.login_date {
            payload.insert("logindate".to_string(), Value::String(login_date.clone()));
        }
        if let Some(offset) = &config.timezone_offset {
            payload.insert("timezoneoffset".to_string(), Value::String(offset.clone()));
        }
        merge_overrides(&mut payload, overrides);

        self.client
            .request(Method::POST, &Value::Object(payload), None, "")
            .await
    }

    /// Scope an existing bare session to a tenant.
    ///
    /// Sends `{service: "authenticate", clientID (current token, when set),
    /// COMPANY, BRANCH, MODULE, REFID}` merged with `overrides` (caller
    /// fields win). On HTTP 200 with `success == true` the response
    /// `clientID` replaces the cached token.
    pub async fn authenticate(&self, overrides: Option<Value>) -> SoftoneResult<GatewayResponse> {
        let config = &self.client.config;
        info!("Authenticating session");

        let mut payload = Map::new();
        payload.insert(
            "service".to_string(),
            Value::String("authenticate".to_string()),
        );
        if let Some(token) = self.token() {
            payload.insert("clientID".to_string(), Value::String(token));
        }
        if let Some(company) = &config.tenant.company {
            payload.insert("COMPANY".to_string(), company.clone());
        }
        if let Some(branch) = &config.tenant.branch {
            payload.insert("BRANCH".to_string(), branch.clone());
        }
        if let Some(module) = &config.tenant.module {
            payload.insert("MODULE".to_string(), module.clone());
        }
        if let Some(ref_id) = &config.tenant.ref_id {
            payload.insert("REFID".to_string(), ref_id.clone());
        }
        merge_overrides(&mut payload, overrides);

        let response = self
            .client
            .request(Method::POST, &Value::Object(payload), None, "")
            .await?;

        self.capture_token(&response);
        Ok(response)
    }

    /// Combined login + authenticate, the fast path when the tenant is
    /// known upfront.
    ///
    /// Requires company, branch, module and refId to all be configured;
    /// fails with [`SoftoneError::Configuration`] naming the first missing
    /// field otherwise. On HTTP 200 with `success == true` the response
    /// `clientID` replaces the cached token.
    pub async fn login_authenticate(
        &self,
        overrides: Option<Value>,
    ) -> SoftoneResult<GatewayResponse> {
        let config = &self.client.config;
        let tenant = &config.tenant;

        // Checked in this fixed order; the error names the first gap.
        let company = tenant.company.as_ref().ok_or_else(|| {
            SoftoneError::configuration("Company is required for loginAuthenticate")
        })?;
        let branch = tenant.branch.as_ref().ok_or_else(|| {
            SoftoneError::configuration("Branch is required for loginAuthenticate")
        })?;
        let module = tenant.module.as_ref().ok_or_else(|| {
            SoftoneError::configuration("Module is required for loginAuthenticate")
        })?;
        let ref_id = tenant.ref_id.as_ref().ok_or_else(|| {
            SoftoneError::configuration("Refid is required for loginAuthenticate")
        })?;

        info!("Logging in as {} with tenant context", config.username);

        let mut payload = Map::new();
        payload.insert("SERVICE".to_string(), Value::String("login".to_string()));
        payload.insert("USERNAME".to_string(), Value::String(config.username.clone()));
        payload.insert("PASSWORD".to_string(), Value::String(config.password.clone()));
        payload.insert("APPID".to_string(), config.app_id.clone());
        payload.insert("COMPANY".to_string(), company.clone());
        payload.insert("BRANCH".to_string(), branch.clone());
        payload.insert("MODULE".to_string(), module.clone());
        payload.insert("REFID".to_string(), ref_id.clone());
        if let Some(login_date) = &config.login_date {
            payload.insert("logindate".to_string(), Value::String(login_date.clone()));
        }
        if let Some(offset) = &config.timezone_offset {
            payload.insert("timezoneoffset".to_string(), Value::String(offset.clone()));
        }
        merge_overrides(&mut payload, overrides);

        let response = self
            .client
            .request(Method::POST, &Value::Object(payload), None, "")
            .await?;

        self.capture_token(&response);
        Ok(response)
    }

    /// Run the full session-establishment chain and cache the resulting
    /// token.
    ///
    /// With a complete tenant context this is a single `loginAuthenticate`
    /// call. Otherwise a bare `login` is followed by `authenticate` against
    /// a tenant context resolved field-by-field from the configuration,
    /// falling back to `objs[login_objs]` of the login response. Any
    /// gateway-reported failure or non-200 status in the chain fails with
    /// [`SoftoneError::Session`].
    ///
    /// Runs automatically during construction when the `auto_login` flag is
    /// set, and can be called again at any time; success overwrites the
    /// cached token, failure leaves it untouched. There is no single-flight
    /// guard: concurrent callers may each run the chain independently.
    pub async fn auto_login(&self) -> SoftoneResult<()> {
        if self.client.config.tenant.is_complete() {
            let login = self.login_authenticate(None).await?;
            if !login.is_http_ok() || !login.success() {
                return Err(SoftoneError::session(format!(
                    "Softone loginAuthenticate failed. Request error code: {}. Softone error: {}",
                    login.status,
                    login.error().unwrap_or("unknown")
                )));
            }
            debug!("auto-login via loginAuthenticate succeeded");
            return Ok(());
        }

        let login = self.login(None).await?;

        if login.is_http_ok() && login.success() {
            let tenant = TenantContext::resolve(
                &self.client.config.tenant,
                login.objs(),
                self.client.config.login_objs,
            )?;

            let mut auth_data = Map::new();
            if let Some(client_id) = login.client_id() {
                auth_data.insert(
                    "clientID".to_string(),
                    Value::String(client_id.to_string()),
                );
            }
            if let Value::Object(fields) = serde_json::to_value(&tenant)? {
                auth_data.extend(fields);
            }

            let authenticate = self.authenticate(Some(Value::Object(auth_data))).await?;

            if authenticate.is_http_ok() && authenticate.success() {
                debug!("auto-login via login + authenticate succeeded");
                Ok(())
            } else if authenticate.is_http_ok() {
                Err(SoftoneError::session(format!(
                    "Softone authenticate failed. Softone error: {}",
                    authenticate.error().unwrap_or("unknown")
                )))
            } else {
                Err(SoftoneError::session(format!(
                    "Softone authenticate failed. Request error code: {}. Message: {}",
                    authenticate.status,
                    authenticate.error().unwrap_or("")
                )))
            }
        } else if login.is_http_ok() {
            Err(SoftoneError::session(format!(
                "Softone login failed. Softone error: {}",
                login.error().unwrap_or("unknown")
            )))
        } else {
            Err(SoftoneError::session(format!(
                "Softone login failed. Request error code: {}. Message: {}",
                login.status,
                login.error().unwrap_or("")
            )))
        }
    }

    /// The currently cached session token, if any
    pub fn token(&self) -> Option<String> {
        read_state(&self.client.session).token().map(str::to_string)
    }

    /// Whether a session token is currently cached
    pub fn is_authenticated(&self) -> bool {
        read_state(&self.client.session).token().is_some()
    }

    /// Drop the cached token, returning the client to the unauthenticated
    /// state. Subsequent requests omit `clientID` until the next successful
    /// authenticate.
    pub fn reset(&self) {
        *write_state(&self.client.session) = SessionState::Unauthenticated;
        debug!("session token cleared");
    }

    /// Cache the token from a response, but only when the response proves a
    /// valid session: HTTP 200, success flag set, clientID present.
    fn capture_token(&self, response: &GatewayResponse) {
        if response.is_http_ok() && response.success() {
            if let Some(client_id) = response.client_id() {
                *write_state(&self.client.session) = SessionState::Authenticated {
                    client_id: client_id.to_string(),
                };
                debug!("session token cached");
            }
        }
    }
}
