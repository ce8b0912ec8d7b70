use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Device a page is fetched as. Selects the user agent and partitions the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeviceProfile {
    #[default]
    Desktop,
    Mobile,
}

impl DeviceProfile {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Desktop => "DESKTOP",
            Self::Mobile => "MOBILE",
        }
    }
}

impl fmt::Display for DeviceProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DeviceProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "desktop" => Ok(Self::Desktop),
            "mobile" => Ok(Self::Mobile),
            other => Err(format!("unknown device profile: {other}")),
        }
    }
}

/// Protocol selector used when composing the canonical URL.
///
/// `None` defers to the configured default protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Protocol {
    #[default]
    None,
    Http,
    Https,
}

impl Protocol {
    /// Scheme name, or `None` when the configured default applies.
    pub fn scheme(&self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Http => Some("http"),
            Self::Https => Some("https"),
        }
    }
}

impl FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "" | "none" => Ok(Self::None),
            "http" => Ok(Self::Http),
            "https" => Ok(Self::Https),
            other => Err(format!("unknown protocol: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
    Trace,
}

impl HttpMethod {
    pub fn as_reqwest(&self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Delete => reqwest::Method::DELETE,
            Self::Patch => reqwest::Method::PATCH,
            Self::Head => reqwest::Method::HEAD,
            Self::Options => reqwest::Method::OPTIONS,
            Self::Trace => reqwest::Method::TRACE,
        }
    }

    /// Form pairs travel in the query string for these methods.
    pub fn sends_form_as_query(&self) -> bool {
        matches!(self, Self::Get | Self::Head | Self::Options | Self::Trace)
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "DELETE" => Ok(Self::Delete),
            "PATCH" => Ok(Self::Patch),
            "HEAD" => Ok(Self::Head),
            "OPTIONS" => Ok(Self::Options),
            "TRACE" => Ok(Self::Trace),
            other => Err(format!("unknown http method: {other}")),
        }
    }
}

/// Cookies sent explicitly with a request. Empty means none are sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CookieSet(pub BTreeMap<String, String>);

impl CookieSet {
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.0.insert(name.to_string(), value.to_string());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Value for a `Cookie` request header (`a=1; b=2`).
    pub fn header_value(&self) -> Option<String> {
        if self.0.is_empty() {
            return None;
        }
        let pairs: Vec<String> = self.0.iter().map(|(k, v)| format!("{k}={v}")).collect();
        Some(pairs.join("; "))
    }
}

/// Everything a caller declares about one fetch.
///
/// Unset timeout, retry count, referrer and prefix resolve from
/// [`Config`](crate::config::Config) when the engine runs the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    url: String,
    method: HttpMethod,
    form: Vec<(String, String)>,
    device: DeviceProfile,
    referrer: Option<String>,
    timeout: Option<Duration>,
    retries_on_timeout: Option<u32>,
    cookies: CookieSet,
    protocol: Protocol,
    prefix: Option<String>,
    port: Option<String>,
    test_identity: String,
}

impl FetchRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: HttpMethod::Get,
            form: Vec::new(),
            device: DeviceProfile::Desktop,
            referrer: None,
            timeout: None,
            retries_on_timeout: None,
            cookies: CookieSet::empty(),
            protocol: Protocol::None,
            prefix: None,
            port: None,
            test_identity: String::new(),
        }
    }

    pub fn with_method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_form(mut self, form: Vec<(String, String)>) -> Self {
        self.form = form;
        self
    }

    pub fn with_device(mut self, device: DeviceProfile) -> Self {
        self.device = device;
        self
    }

    pub fn with_referrer(mut self, referrer: impl Into<String>) -> Self {
        self.referrer = Some(referrer.into());
        self
    }

    /// A zero duration keeps the configured timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = (!timeout.is_zero()).then_some(timeout);
        self
    }

    /// Zero keeps the configured retry count.
    pub fn with_retries_on_timeout(mut self, retries: u32) -> Self {
        self.retries_on_timeout = (retries > 0).then_some(retries);
        self
    }

    pub fn with_cookies(mut self, cookies: CookieSet) -> Self {
        self.cookies = cookies;
        self
    }

    pub fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = protocol;
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn with_port(mut self, port: impl Into<String>) -> Self {
        self.port = Some(port.into());
        self
    }

    pub fn with_test_identity(mut self, identity: impl Into<String>) -> Self {
        self.test_identity = identity.into();
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }
    pub fn method(&self) -> HttpMethod {
        self.method
    }
    pub fn form(&self) -> &[(String, String)] {
        &self.form
    }
    pub fn device(&self) -> DeviceProfile {
        self.device
    }
    pub fn referrer(&self) -> Option<&str> {
        self.referrer.as_deref()
    }
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
    pub fn retries_on_timeout(&self) -> Option<u32> {
        self.retries_on_timeout
    }
    pub fn cookies(&self) -> &CookieSet {
        &self.cookies
    }
    pub fn protocol(&self) -> Protocol {
        self.protocol
    }
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }
    pub fn port(&self) -> Option<&str> {
        self.port.as_deref()
    }
    pub fn test_identity(&self) -> &str {
        &self.test_identity
    }
}

/// Cache identity of a fetched page: canonical URL plus device.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub url: String,
    pub device: DeviceProfile,
}

impl CacheKey {
    pub fn new(url: impl Into<String>, device: DeviceProfile) -> Self {
        Self {
            url: url.into(),
            device,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.url, self.device)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}
impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }
    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}
