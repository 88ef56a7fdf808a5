//! Scripted transport for driving the server without a network.

#![allow(dead_code)]

use microweb::network::error::Error;
use microweb::network::{Close, Connection, Listen, Read, Write};
use microweb::system::Clock;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

/// What the server did to one connection.
#[derive(Debug, Default)]
pub struct Wire {
    pub output: Vec<u8>,
    pub writes: usize,
    pub closed: bool,
}

impl Wire {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }
}

#[derive(Debug)]
pub struct MockConnection {
    input: Vec<u8>,
    pos: usize,
    hold_open: bool,
    wire: Rc<RefCell<Wire>>,
}

impl MockConnection {
    /// A client that sends `input` and then hangs up.
    pub fn new(input: &[u8]) -> (Self, Rc<RefCell<Wire>>) {
        let wire = Rc::new(RefCell::new(Wire::default()));
        let conn = Self {
            input: input.to_vec(),
            pos: 0,
            hold_open: false,
            wire: wire.clone(),
        };
        (conn, wire)
    }

    /// Keep the connection open after the input runs out.
    pub fn hold_open(mut self) -> Self {
        self.hold_open = true;
        self
    }
}

impl Read for MockConnection {
    type Error = Error;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if self.wire.borrow().closed {
            return Err(Error::NotOpen);
        }
        let len = buf.len().min(self.input.len() - self.pos);
        buf[..len].copy_from_slice(&self.input[self.pos..self.pos + len]);
        self.pos += len;
        Ok(len)
    }
}

impl Write for MockConnection {
    type Error = Error;

    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        let mut wire = self.wire.borrow_mut();
        if wire.closed {
            return Err(Error::NotOpen);
        }
        wire.output.extend_from_slice(buf);
        wire.writes += 1;
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl Close for MockConnection {
    type Error = Error;

    fn close(self) -> Result<(), Self::Error> {
        self.wire.borrow_mut().closed = true;
        Ok(())
    }
}

impl Connection for MockConnection {
    fn is_connected(&self) -> bool {
        self.hold_open || self.pos < self.input.len()
    }
}

#[derive(Debug, Default)]
pub struct MockListener {
    pub pending: VecDeque<MockConnection>,
    pub port: Option<u16>,
}

impl MockListener {
    /// Queue a client sending `request` and return its wire.
    pub fn connect(&mut self, request: &[u8]) -> Rc<RefCell<Wire>> {
        let (conn, wire) = MockConnection::new(request);
        self.pending.push_back(conn);
        wire
    }
}

impl Listen for MockListener {
    type Connection = MockConnection;
    type Error = Error;

    fn listen(&mut self, port: u16) -> Result<(), Self::Error> {
        self.port = Some(port);
        Ok(())
    }

    fn accept(&mut self) -> Result<Option<Self::Connection>, Self::Error> {
        Ok(self.pending.pop_front())
    }
}

/// A clock that moves forward a fixed step every time it is read.
#[derive(Debug, Default)]
pub struct StepClock {
    now: Cell<u64>,
}

impl Clock for StepClock {
    fn now_ms(&self) -> u64 {
        let now = self.now.get();
        self.now.set(now + 5);
        now
    }
}
