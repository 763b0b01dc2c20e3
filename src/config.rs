use std::time::Duration;

use serde_json::Value;
use url::Url;

use crate::error::{SoftoneError, SoftoneResult};
use crate::models::PartialTenant;

/// Fixed path every SoftOne installation serves the gateway under.
const SERVICE_PATH: &str = "/s1services";

/// Client configuration for [`SoftoneClient`](crate::SoftoneClient).
///
/// Required fields are taken by [`SoftoneConfig::new`]; everything else is
/// set through the chainable methods:
///
/// ```no_run
/// use softone_client::SoftoneConfig;
///
/// let config = SoftoneConfig::new("https://demo.oncloud.gr", "demo", "demo", 157)
///     .company(1000)
///     .branch(1000)
///     .module(0)
///     .ref_id(1)
///     .auto_login(true);
/// ```
#[derive(Debug, Clone)]
pub struct SoftoneConfig {
    pub(crate) url: String,
    pub(crate) dev_url: Option<String>,
    pub(crate) username: String,
    pub(crate) password: String,
    pub(crate) app_id: Value,

    pub(crate) tenant: PartialTenant,

    pub(crate) login_date: Option<String>,
    pub(crate) timezone_offset: Option<String>,

    pub(crate) sandbox: bool,
    pub(crate) auto_login: bool,
    pub(crate) login_objs: usize,
    pub(crate) response_encoding: String,
    pub(crate) timeout: Option<Duration>,
}

impl SoftoneConfig {
    /// Create a configuration with the required fields. `app_id` is passed
    /// to the gateway verbatim, so both numeric ids and strings work.
    pub fn new(
        url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        app_id: impl Into<Value>,
    ) -> Self {
        Self {
            url: url.into(),
            dev_url: None,
            username: username.into(),
            password: password.into(),
            app_id: app_id.into(),
            tenant: PartialTenant::default(),
            login_date: None,
            timezone_offset: None,
            sandbox: false,
            auto_login: false,
            login_objs: 0,
            response_encoding: "utf8".to_string(),
            timeout: None,
        }
    }

    /// Explicit sandbox gateway URL. When unset, one is derived from `url`
    /// by prefixing the host with `dev-`.
    pub fn dev_url(mut self, dev_url: impl Into<String>) -> Self {
        self.dev_url = Some(dev_url.into());
        self
    }

    /// Tenant company, used by `authenticate`/`loginAuthenticate`
    pub fn company(mut self, company: impl Into<Value>) -> Self {
        self.tenant.company = Some(company.into());
        self
    }

    /// Tenant branch
    pub fn branch(mut self, branch: impl Into<Value>) -> Self {
        self.tenant.branch = Some(branch.into());
        self
    }

    /// Tenant module
    pub fn module(mut self, module: impl Into<Value>) -> Self {
        self.tenant.module = Some(module.into());
        self
    }

    /// Tenant reference id
    pub fn ref_id(mut self, ref_id: impl Into<Value>) -> Self {
        self.tenant.ref_id = Some(ref_id.into());
        self
    }

    /// Optional `logindate` sent with login requests
    pub fn login_date(mut self, login_date: impl Into<String>) -> Self {
        self.login_date = Some(login_date.into());
        self
    }

    /// Optional `timezoneoffset` sent with login requests
    pub fn timezone_offset(mut self, timezone_offset: impl Into<String>) -> Self {
        self.timezone_offset = Some(timezone_offset.into());
        self
    }

    /// Route requests to the sandbox gateway instead of the production one
    pub fn sandbox(mut self, sandbox: bool) -> Self {
        self.sandbox = sandbox;
        self
    }

    /// Run the auto-login chain during client construction
    pub fn auto_login(mut self, auto_login: bool) -> Self {
        self.auto_login = auto_login;
        self
    }

    /// Index into the bare-login `objs` array used when resolving a tenant
    /// context during auto-login (default 0)
    pub fn login_objs(mut self, index: usize) -> Self {
        self.login_objs = index;
        self
    }

    /// Transport-level response encoding knob. Recorded for transports that
    /// honor it; independent of the fixed windows-1253 body decode.
    pub fn response_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.response_encoding = encoding.into();
        self
    }

    /// Per-request timeout applied to the underlying HTTP client
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Validate the configuration and produce the normalized production and
    /// sandbox service URLs. Runs before any network I/O.
    pub(crate) fn validate(&self) -> SoftoneResult<(Url, Url)> {
        if self.url.is_empty() {
            return Err(SoftoneError::configuration("Url required"));
        }
        if self.username.is_empty() {
            return Err(SoftoneError::configuration("Username is required"));
        }
        if self.password.is_empty() {
            return Err(SoftoneError::configuration("Password is required"));
        }
        if self.app_id.is_null() || self.app_id.as_str().is_some_and(str::is_empty) {
            return Err(SoftoneError::configuration("AppId is required"));
        }

        let service_url = normalize_service_url(&self.url)?;

        let dev_url = match &self.dev_url {
            Some(raw) => normalize_service_url(raw)?,
            None => derive_dev_url(&service_url)?,
        };

        Ok((service_url, dev_url))
    }
}

/// Normalize a gateway URL: require the https scheme, keep only the origin
/// and append the fixed service path.
fn normalize_service_url(raw: &str) -> SoftoneResult<Url> {
    let parsed = Url::parse(raw)?;
    if parsed.scheme() != "https" {
        return Err(SoftoneError::configuration("URL protocol must be https"));
    }

    let origin = parsed.origin().ascii_serialization();
    Ok(Url::parse(&format!("{origin}{SERVICE_PATH}"))?)
}

/// Derive the sandbox URL by prefixing the production host with `dev-`.
fn derive_dev_url(service_url: &Url) -> SoftoneResult<Url> {
    let host = service_url
        .host_str()
        .ok_or_else(|| SoftoneError::configuration("URL has no host"))?;

    let authority = match service_url.port() {
        Some(port) => format!("dev-{host}:{port}"),
        None => format!("dev-{host}"),
    };

    Ok(Url::parse(&format!("https://{authority}{SERVICE_PATH}"))?)
}
