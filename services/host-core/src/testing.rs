//! An in-memory duplex byte pipe, used only by this crate's own tests to
//! stand in for a real serial port. Modeled on the way `firmata-rs` drives
//! its `Board` through anything implementing `Read + Write` -- here the
//! "firmware" end is just a test-scripted peer rather than a real board.
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::rc::Rc;
use std::cell::RefCell;

type Queue = Rc<RefCell<VecDeque<u8>>>;

pub struct PipeEnd {
    inbound: Queue,
    outbound: Queue,
}

impl PipeEnd {
    /// Two ends of one pipe: whatever is written to one shows up for
    /// reading on the other.
    pub fn pair() -> (PipeEnd, PipeEnd) {
        let a_to_b: Queue = Rc::new(RefCell::new(VecDeque::new()));
        let b_to_a: Queue = Rc::new(RefCell::new(VecDeque::new()));
        (
            PipeEnd { inbound: b_to_a.clone(), outbound: a_to_b.clone() },
            PipeEnd { inbound: a_to_b, outbound: b_to_a },
        )
    }

    /// Drain everything the peer has written so far, for assertions.
    pub fn take_received(&self) -> Vec<u8> {
        self.inbound.borrow_mut().drain(..).collect()
    }

    /// Queue bytes up for the peer's next read, simulating a firmware
    /// reply.
    pub fn queue_reply(&self, bytes: &[u8]) {
        self.outbound.borrow_mut().extend(bytes.iter().copied());
    }
}

impl Read for PipeEnd {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut q = self.inbound.borrow_mut();
        let n = buf.len().min(q.len());
        for slot in buf.iter_mut().take(n) {
            *slot = q.pop_front().unwrap();
        }
        Ok(n)
    }
}

impl Write for PipeEnd {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.outbound.borrow_mut().extend(buf.iter().copied());
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
