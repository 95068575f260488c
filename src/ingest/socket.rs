//! The datagram-source collaborator contract (spec.md §1 "Out of scope:
//! ... supplies the physical transport"; SPEC_FULL.md's ambient
//! narrowing of the C5 ingest loop's socket set into a trait so the loop
//! is testable without real multicast sockets).

use std::time::Duration;

/// One physical line's receive side. Implementations are expected to be
/// non-blocking with respect to the loop's 100 ms select timeout
/// (spec.md §4.5 "Loop").
pub trait DatagramSource {
    /// Blocks up to `timeout` for a datagram; `Ok(None)` on timeout with
    /// no traffic. Returns the number of bytes written into `buf`.
    fn recv(&mut self, buf: &mut [u8], timeout: Duration) -> std::io::Result<Option<usize>>;
}

#[cfg(feature = "net")]
pub use net::UdpDatagramSource;

#[cfg(feature = "net")]
mod net {
    use super::DatagramSource;
    use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};
    use std::time::Duration;

    /// A real `std::net::UdpSocket`-backed source, joined to a multicast
    /// group at construction (spec.md §6 `a_lines[i]`/`b_lines[i]`).
    pub struct UdpDatagramSource {
        socket: UdpSocket,
    }

    impl UdpDatagramSource {
        /// Opens and joins `address:port` on `interface` (spec.md §6
        /// per-line multicast join parameters).
        pub fn join(address: Ipv4Addr, port: u16, interface: Ipv4Addr) -> std::io::Result<Self> {
            let bind_addr = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port);
            let socket = UdpSocket::bind(bind_addr)?;
            socket.join_multicast_v4(&address, &interface)?;
            socket.set_nonblocking(false)?;
            Ok(UdpDatagramSource { socket })
        }

        pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
            self.socket.local_addr()
        }
    }

    impl DatagramSource for UdpDatagramSource {
        fn recv(&mut self, buf: &mut [u8], timeout: Duration) -> std::io::Result<Option<usize>> {
            self.socket.set_read_timeout(Some(timeout))?;
            match self.socket.recv(buf) {
                Ok(n) => Ok(Some(n)),
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock || e.kind() == std::io::ErrorKind::TimedOut => Ok(None),
                Err(e) => Err(e),
            }
        }
    }
}

/// An in-memory queue of pre-built datagrams, used by tests and by the
/// replay-driven property tests (spec.md §8 "Verified by replaying
/// captured A/B traces").
#[derive(Debug, Default)]
pub struct QueueDatagramSource {
    pending: std::collections::VecDeque<Vec<u8>>,
}

impl QueueDatagramSource {
    pub fn new() -> Self {
        QueueDatagramSource::default()
    }

    pub fn push(&mut self, datagram: Vec<u8>) {
        self.pending.push_back(datagram);
    }
}

impl DatagramSource for QueueDatagramSource {
    fn recv(&mut self, buf: &mut [u8], _timeout: Duration) -> std::io::Result<Option<usize>> {
        match self.pending.pop_front() {
            Some(datagram) => {
                let n = datagram.len().min(buf.len());
                buf[..n].copy_from_slice(&datagram[..n]);
                Ok(Some(n))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_source_replays_in_order() {
        let mut q = QueueDatagramSource::new();
        q.push(vec![1, 2, 3]);
        q.push(vec![4, 5]);
        let mut buf = [0u8; 8];
        let n1 = q.recv(&mut buf, Duration::from_millis(100)).unwrap().unwrap();
        assert_eq!(&buf[..n1], &[1, 2, 3]);
        let n2 = q.recv(&mut buf, Duration::from_millis(100)).unwrap().unwrap();
        assert_eq!(&buf[..n2], &[4, 5]);
        assert!(q.recv(&mut buf, Duration::from_millis(100)).unwrap().is_none());
    }
}
