//! Serves a small settings page from the host, the same way a board would.
//!
//! Run it and open <http://127.0.0.1:8080/>.

use core::fmt::Write as _;
use heapless::Vec;
use microweb::http::{Config, Error, Method, Scan, Session, WebServer};
use microweb::network::{Close, Connection, Listen, Read, Write};
use microweb::network::error::Error as NetError;
use microweb::system::{Clock, Uptime};
use serde::Serialize;
use std::io::{ErrorKind, Read as _, Write as _};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

static LED: AtomicBool = AtomicBool::new(false);

struct HostConnection {
    stream: TcpStream,
    eof: bool,
}

impl Read for HostConnection {
    type Error = NetError;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        match self.stream.read(buf) {
            Ok(0) => {
                self.eof = true;
                Ok(0)
            }
            Ok(n) => Ok(n),
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => Ok(0),
            Err(_) => Err(NetError::ReadError),
        }
    }
}

impl Write for HostConnection {
    type Error = NetError;

    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.stream.write(buf).map_err(|_| NetError::WriteError)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.stream.flush().map_err(|_| NetError::WriteError)
    }
}

impl Close for HostConnection {
    type Error = NetError;

    fn close(self) -> Result<(), Self::Error> {
        self.stream
            .shutdown(Shutdown::Both)
            .map_err(|_| NetError::ConnectionClosed)
    }
}

impl Connection for HostConnection {
    fn is_connected(&self) -> bool {
        !self.eof
    }
}

#[derive(Default)]
struct HostListener {
    inner: Option<TcpListener>,
}

impl Listen for HostListener {
    type Connection = HostConnection;
    type Error = NetError;

    fn listen(&mut self, port: u16) -> Result<(), Self::Error> {
        let listener = TcpListener::bind(("127.0.0.1", port)).map_err(|_| NetError::BindError)?;
        listener.set_nonblocking(true).map_err(|_| NetError::BindError)?;
        self.inner = Some(listener);
        Ok(())
    }

    fn accept(&mut self) -> Result<Option<Self::Connection>, Self::Error> {
        let listener = self.inner.as_ref().ok_or(NetError::NotOpen)?;
        match listener.accept() {
            Ok((stream, _)) => {
                stream.set_nonblocking(false).map_err(|_| NetError::ReadError)?;
                stream
                    .set_read_timeout(Some(Duration::from_millis(1)))
                    .map_err(|_| NetError::ReadError)?;
                Ok(Some(HostConnection { stream, eof: false }))
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => Ok(None),
            Err(_) => Err(NetError::ReadError),
        }
    }
}

struct HostClock(Instant);

impl Clock for HostClock {
    fn now_ms(&self) -> u64 {
        self.0.elapsed().as_millis() as u64
    }
}

type Sess<'s> = Session<'s, HostConnection, HostClock>;

fn index(session: &mut Sess<'_>, method: Method, _: &str, _: bool) -> Result<(), Error> {
    session.http_success("text/html; charset=utf-8", None)?;
    if method == Method::Head {
        return Ok(());
    }
    session.print("<html><body><h1>Hello, World!</h1><form method='post' action='/led'>")?;
    session.check_box("led", "on", "LED", LED.load(Ordering::Relaxed))?;
    session.print("<input type='submit' value='Apply'/></form>")?;
    write!(session, "<p>up {}</p></body></html>", Uptime::from_millis(now_ms()))?;
    Ok(())
}

fn led(session: &mut Sess<'_>, method: Method, _: &str, _: bool) -> Result<(), Error> {
    if method != Method::Post {
        return session.http_see_other("/");
    }
    let mut on = false;
    let mut name: Vec<u8, 16> = Vec::new();
    let mut value: Vec<u8, 16> = Vec::new();
    while session.read_post_param(&mut name, &mut value) {
        on |= &name[..] == b"led" && &value[..] == b"on";
    }
    LED.store(on, Ordering::Relaxed);
    session.http_see_other("/")
}

#[derive(Serialize)]
struct Status<'a> {
    led: bool,
    uptime: &'a str,
}

fn status(session: &mut Sess<'_>, _: Method, _: &str, _: bool) -> Result<(), Error> {
    let uptime = Uptime::from_millis(now_ms());
    session.send_json(&Status {
        led: LED.load(Ordering::Relaxed),
        uptime: uptime.as_str(),
    })
}

fn now_ms() -> u64 {
    static START: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();
    START.get_or_init(Instant::now).elapsed().as_millis() as u64
}

fn main() -> Result<(), Error> {
    let config = Config::new().port(8080);
    let mut server: WebServer<_, _> = WebServer::new(HostListener::default(), HostClock(Instant::now()), config);
    server.set_default_command(index);
    server.add_command("index.html", index)?;
    server.add_command("led", led)?;
    server.add_command("status.json", status)?;
    server.begin()?;
    println!("listening on http://127.0.0.1:8080/");

    let mut url = [0u8; 64];
    loop {
        if !server.process_connection(&mut url)? {
            std::thread::sleep(Duration::from_millis(1));
        }
    }
}
