//! In-memory serial links for host tests

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use rclink_hal::{SerialRx, SerialTx};
use rclink_protocol::frame::encode_frame;

type Wire = Rc<RefCell<VecDeque<u8>>>;

/// One end of a bidirectional byte pipe
///
/// `capacity` bounds how many bytes may sit unread on the outgoing wire,
/// which is how tests throttle a link.
pub struct PipeEnd {
    inbound: Wire,
    outbound: Wire,
    capacity: usize,
    written: Rc<RefCell<Vec<u8>>>,
}

impl PipeEnd {
    /// Everything this end has ever written
    pub fn written(&self) -> Vec<u8> {
        self.written.borrow().clone()
    }

    /// Inject raw bytes as if the peer had sent them
    pub fn inject(&self, bytes: &[u8]) {
        self.inbound.borrow_mut().extend(bytes.iter().copied());
    }

    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
    }
}

impl SerialRx for PipeEnd {
    type Error = ();

    fn read_nonblocking(&mut self, buf: &mut [u8]) -> Result<usize, ()> {
        let mut inbound = self.inbound.borrow_mut();
        let n = buf.len().min(inbound.len());
        for (slot, byte) in buf.iter_mut().zip(inbound.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

impl SerialTx for PipeEnd {
    type Error = ();

    fn write_nonblocking(&mut self, data: &[u8]) -> Result<usize, ()> {
        let mut outbound = self.outbound.borrow_mut();
        let room = self.capacity.saturating_sub(outbound.len());
        let n = data.len().min(room);
        outbound.extend(data[..n].iter().copied());
        self.written.borrow_mut().extend_from_slice(&data[..n]);
        Ok(n)
    }
}

/// Two connected ends with unlimited capacity
pub fn pipe() -> (PipeEnd, PipeEnd) {
    let a_to_b: Wire = Rc::default();
    let b_to_a: Wire = Rc::default();
    let a = PipeEnd {
        inbound: b_to_a.clone(),
        outbound: a_to_b.clone(),
        capacity: usize::MAX,
        written: Rc::default(),
    };
    let b = PipeEnd {
        inbound: a_to_b,
        outbound: b_to_a,
        capacity: usize::MAX,
        written: Rc::default(),
    };
    (a, b)
}

/// A standalone end: `inject` feeds it, writes go nowhere
pub fn loose_end() -> PipeEnd {
    pipe().0
}

/// Encode a frame into a Vec
pub fn frame(id: u8, last_seen: u8, payload: &[u8]) -> Vec<u8> {
    let mut buf = [0u8; 64];
    let len = encode_frame(id, last_seen, payload, &mut buf).expect("frame fits");
    buf[..len].to_vec()
}
