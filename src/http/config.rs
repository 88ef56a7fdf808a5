//! Server configuration.
//!
//! Messages, identification and timing are plain fields set through
//! builder-style methods. Buffer capacities that size arrays are const generics on
//! [`WebServer`](super::WebServer) instead.

/// Default read timeout in milliseconds.
pub const DEFAULT_READ_TIMEOUT_MS: u32 = 1000;

/// Default TCP port.
pub const DEFAULT_PORT: u16 = 80;

/// Default server identification, sent as `Server: microweb/<version>`.
pub const DEFAULT_SERVER_NAME: &str = concat!("microweb/", env!("CARGO_PKG_VERSION"));

/// Default body of the `400 Bad Request` response.
pub const DEFAULT_FAIL_MESSAGE: &str = "<h1>EPIC FAIL</h1>";

/// Default body of the `401` response.
pub const DEFAULT_AUTH_MESSAGE: &str = "<h1>401 Unauthorized</h1>";

/// Default body of the `500 Internal Server Error` response.
pub const DEFAULT_SERVER_ERROR_MESSAGE: &str = "<h1>500 Internal Server Error</h1>";

/// Default realm announced in `WWW-Authenticate`.
pub const DEFAULT_AUTH_REALM: &str = "microweb";

/// Runtime configuration of a [`WebServer`](super::WebServer).
///
/// # Examples
///
/// ```rust
/// use microweb::http::Config;
///
/// let config = Config::new()
///     .url_prefix("/app")
///     .port(8080)
///     .read_timeout_ms(500)
///     .suppress_server_header(true);
///
/// assert_eq!(config.url_prefix, "/app");
/// assert!(config.server_header().is_none());
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Only URLs starting with this prefix are dispatched to commands.
    pub url_prefix: &'static str,
    /// Port passed to [`Listen::listen`](crate::network::Listen::listen).
    pub port: u16,
    /// How long a single read may wait for the next byte.
    pub read_timeout_ms: u32,
    /// Value of the `Server` response header.
    pub server_name: &'static str,
    /// Omit the `Server` response header entirely.
    pub suppress_server_header: bool,
    /// Body of the `400 Bad Request` response.
    pub fail_message: &'static str,
    /// Body of the `401` response.
    pub auth_message: &'static str,
    /// Realm announced in `WWW-Authenticate`.
    pub auth_realm: &'static str,
    /// Body of the `500 Internal Server Error` response.
    pub server_error_message: &'static str,
    /// Bytes served for `/favicon.ico`.
    pub favicon: &'static [u8],
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Configuration with all defaults: prefix `/`, port 80, 1 s timeout.
    pub const fn new() -> Self {
        Self {
            url_prefix: "/",
            port: DEFAULT_PORT,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
            server_name: DEFAULT_SERVER_NAME,
            suppress_server_header: false,
            fail_message: DEFAULT_FAIL_MESSAGE,
            auth_message: DEFAULT_AUTH_MESSAGE,
            auth_realm: DEFAULT_AUTH_REALM,
            server_error_message: DEFAULT_SERVER_ERROR_MESSAGE,
            favicon: &[],
        }
    }

    /// Set the URL prefix commands are mounted under.
    pub const fn url_prefix(mut self, prefix: &'static str) -> Self {
        self.url_prefix = prefix;
        self
    }

    /// Set the listening port.
    pub const fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the per-read timeout.
    pub const fn read_timeout_ms(mut self, timeout: u32) -> Self {
        self.read_timeout_ms = timeout;
        self
    }

    /// Set the `Server` header value.
    pub const fn server_name(mut self, name: &'static str) -> Self {
        self.server_name = name;
        self
    }

    /// Suppress the `Server` header.
    pub const fn suppress_server_header(mut self, suppress: bool) -> Self {
        self.suppress_server_header = suppress;
        self
    }

    /// Set the `400` body.
    pub const fn fail_message(mut self, message: &'static str) -> Self {
        self.fail_message = message;
        self
    }

    /// Set the `401` body.
    pub const fn auth_message(mut self, message: &'static str) -> Self {
        self.auth_message = message;
        self
    }

    /// Set the authentication realm.
    pub const fn auth_realm(mut self, realm: &'static str) -> Self {
        self.auth_realm = realm;
        self
    }

    /// Set the `500` body.
    pub const fn server_error_message(mut self, message: &'static str) -> Self {
        self.server_error_message = message;
        self
    }

    /// Set the favicon payload.
    pub const fn favicon(mut self, icon: &'static [u8]) -> Self {
        self.favicon = icon;
        self
    }

    /// The `Server` header value, or `None` when suppressed.
    pub fn server_header(&self) -> Option<&'static str> {
        if self.suppress_server_header {
            None
        } else {
            Some(self.server_name)
        }
    }
}
