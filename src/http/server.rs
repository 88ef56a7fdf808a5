//! The connection loop.

use super::config::Config;
use super::dispatch::{CommandTable, Route};
use super::error::Error;
use super::session::Session;
use super::Method;
use crate::network::Listen;
use crate::system::Clock;

/// Handler for a verb, the default route and failures.
///
/// Receives the request method, the URL tail and whether the whole URL fit in
/// the buffer.
pub type CommandFn<C, K> = fn(&mut Session<'_, C, K>, Method, &str, bool) -> Result<(), Error>;

/// Handler for paths no verb matched, with the path split into segments and
/// the query string as tail.
pub type PathCommandFn<C, K> =
    fn(&mut Session<'_, C, K>, Method, &[&str], &str, bool) -> Result<(), Error>;

const ROBOTS_BODY: &str = "User-agent: *\r\nDisallow: /\r\n";
const FAVICON_CACHE: &str = "Cache-Control: max-age=31536000, public\r\n";

/// A single-connection HTTP/1.0 server.
///
/// `COMMANDS` is the command table capacity, `SEGMENTS` the most path
/// segments passed to the path handler and `OUT` the size of the output
/// buffer.
pub struct WebServer<
    L: Listen,
    K: Clock,
    const COMMANDS: usize = 8,
    const SEGMENTS: usize = 8,
    const OUT: usize = 32,
> {
    listener: L,
    clock: K,
    config: Config,
    default_command: CommandFn<L::Connection, K>,
    failure_command: CommandFn<L::Connection, K>,
    commands: CommandTable<CommandFn<L::Connection, K>, COMMANDS>,
    path_command: Option<PathCommandFn<L::Connection, K>>,
    output: [u8; OUT],
}

impl<L, K, const COMMANDS: usize, const SEGMENTS: usize, const OUT: usize>
    WebServer<L, K, COMMANDS, SEGMENTS, OUT>
where
    L: Listen,
    K: Clock,
{
    /// A server with no commands. Every request gets the `400` page until
    /// handlers are registered.
    pub fn new(listener: L, clock: K, config: Config) -> Self {
        Self {
            listener,
            clock,
            config,
            default_command: default_fail,
            failure_command: default_fail,
            commands: CommandTable::new(),
            path_command: None,
            output: [0; OUT],
        }
    }

    /// Start listening on the configured port.
    pub fn begin(&mut self) -> Result<(), Error> {
        self.listener
            .listen(self.config.port)
            .map_err(|_| Error::ListenError)?;
        debug!("listening on port {}", self.config.port);
        Ok(())
    }

    /// The active configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The listener, e.g. to inspect or reconfigure the network stack.
    pub fn listener_mut(&mut self) -> &mut L {
        &mut self.listener
    }

    /// The clock handed to every connection.
    pub fn clock(&self) -> &K {
        &self.clock
    }

    /// Handler for the bare prefix, `/` and `/?query`.
    pub fn set_default_command(&mut self, command: CommandFn<L::Connection, K>) {
        self.default_command = command;
    }

    /// Handler for invalid methods, foreign prefixes and unmatched paths. It
    /// receives the full URL as its tail.
    pub fn set_failure_command(&mut self, command: CommandFn<L::Connection, K>) {
        self.failure_command = command;
    }

    /// Register a handler for URLs starting with `verb`.
    pub fn add_command(&mut self, verb: &'static str, command: CommandFn<L::Connection, K>) -> Result<(), Error> {
        self.commands.add(verb, command)
    }

    /// Handler for paths that match no verb.
    pub fn set_url_path_command(&mut self, command: PathCommandFn<L::Connection, K>) {
        self.path_command = Some(command);
    }

    /// Serve one pending connection, if any.
    ///
    /// `url` receives the request URL; a URL longer than the buffer is
    /// truncated and handlers are told it is incomplete. Returns `Ok(false)`
    /// when no client was waiting. A handler that fails before writing
    /// anything gets the `500` page sent for it, unless the connection itself
    /// failed.
    pub fn process_connection(&mut self, url: &mut [u8]) -> Result<bool, Error> {
        let conn = match self.listener.accept() {
            Ok(Some(conn)) => conn,
            Ok(None) => return Ok(false),
            Err(_) => return Err(Error::AcceptError),
        };
        trace!("connection accepted");

        let mut session = Session::new(conn, &self.clock, &self.config, &mut self.output);
        let line = session.read_request(url);
        let (url, valid) = url_str(&url[..line.len]);
        let complete = line.is_complete() && valid;
        let method = line.method;
        debug!("{} {}", method.as_str(), url);

        let result = if url == "/robots.txt" {
            no_robots(&mut session, method)
        } else if url == "/favicon.ico" && !self.config.favicon.is_empty() {
            favicon(&mut session, method)
        } else if method == Method::Invalid {
            (self.failure_command)(&mut session, method, url, complete)
        } else if let Some(path) = url.strip_prefix(self.config.url_prefix) {
            match self.commands.route::<SEGMENTS>(path) {
                Route::Default { tail } => {
                    trace!("default command");
                    (self.default_command)(&mut session, method, tail, complete)
                }
                Route::Command { handler, tail } => {
                    trace!("command, tail {}", tail);
                    handler(&mut session, method, tail, complete)
                }
                Route::Segments { segments, tail } => match self.path_command {
                    Some(command) => {
                        trace!("path command, {} segments", segments.len());
                        command(&mut session, method, &segments, tail, complete)
                    }
                    None => {
                        debug!("no route for {}", url);
                        (self.failure_command)(&mut session, method, url, complete)
                    }
                },
            }
        } else {
            (self.failure_command)(&mut session, method, url, complete)
        };

        if let Err(err) = result {
            warn!("handler failed: {:?}", err);
            let transport_lost = matches!(err, Error::ConnectionClosed | Error::WriteError);
            if !transport_lost && !session.response_started() && session.http_server_error().is_err() {
                debug!("could not send error page");
            }
        }
        session.close();
        Ok(true)
    }
}

/// The longest valid UTF-8 prefix of `bytes`, and whether that is all of it.
fn url_str(bytes: &[u8]) -> (&str, bool) {
    match core::str::from_utf8(bytes) {
        Ok(url) => (url, true),
        Err(err) => (
            core::str::from_utf8(&bytes[..err.valid_up_to()]).unwrap_or_default(),
            false,
        ),
    }
}

fn default_fail<C, K>(session: &mut Session<'_, C, K>, _: Method, _: &str, _: bool) -> Result<(), Error>
where
    C: crate::network::Connection,
    K: Clock,
{
    session.http_fail()
}

fn no_robots<C, K>(session: &mut Session<'_, C, K>, method: Method) -> Result<(), Error>
where
    C: crate::network::Connection,
    K: Clock,
{
    session.http_success("text/plain", None)?;
    if method != Method::Head {
        session.print(ROBOTS_BODY)?;
    }
    Ok(())
}

fn favicon<C, K>(session: &mut Session<'_, C, K>, method: Method) -> Result<(), Error>
where
    C: crate::network::Connection,
    K: Clock,
{
    session.http_success("image/x-icon", Some(FAVICON_CACHE))?;
    if method != Method::Head {
        let icon = session.config().favicon;
        session.write_bytes(icon)?;
    }
    Ok(())
}

impl<L, K, const COMMANDS: usize, const SEGMENTS: usize, const OUT: usize> core::fmt::Debug
    for WebServer<L, K, COMMANDS, SEGMENTS, OUT>
where
    L: Listen,
    K: Clock,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WebServer")
            .field("config", &self.config)
            .field("commands", &self.commands.len())
            .field("path_command", &self.path_command.is_some())
            .finish()
    }
}
