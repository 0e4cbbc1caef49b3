//! Port allocation for the worker process.

use std::net::TcpListener;

use thiserror::Error;
use tracing::debug;

/// Errors from port allocation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PortError {
    /// `start > end`.
    #[error("Invalid port range {start}-{end}")]
    InvalidRange { start: u16, end: u16 },

    /// Every port in the window is taken.
    #[error("No available ports in range {start}-{end}")]
    Exhausted { start: u16, end: u16 },

    /// The primary port has no `primary + 1` neighbour.
    #[error("Port {0} leaves no room for a management port")]
    NoManagementPort(u16),
}

/// Ports handed to one worker launch.
///
/// The management port is derived as `primary + 1` and is NOT checked for
/// availability. It can collide with an unrelated listener; the worker then
/// fails to bind it and the crash surfaces through the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortPair {
    pub primary: u16,
    pub management: u16,
}

/// Check if a port is available by attempting to bind to it on loopback.
/// The listener is dropped immediately, which releases the port.
pub fn is_port_available(port: u16) -> bool {
    match TcpListener::bind(("127.0.0.1", port)) {
        Ok(listener) => listener.local_addr().is_ok(),
        Err(_) => false,
    }
}

/// Return the first bindable port in `[start, end]`.
///
/// The scan stops at the first success. The range is never widened.
pub fn find_available_port(start: u16, end: u16) -> Result<u16, PortError> {
    if start > end {
        return Err(PortError::InvalidRange { start, end });
    }

    for port in start..=end {
        if is_port_available(port) {
            debug!(port = %port, "Allocated available port");
            return Ok(port);
        }
        debug!(port = %port, "Port unavailable on system, skipping");
    }

    Err(PortError::Exhausted { start, end })
}

/// Allocate the primary port from the window and derive the management port.
pub fn allocate_port_pair(start: u16, end: u16) -> Result<PortPair, PortError> {
    let primary = find_available_port(start, end)?;
    let management = primary
        .checked_add(1)
        .ok_or(PortError::NoManagementPort(primary))?;
    Ok(PortPair {
        primary,
        management,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Find `n` consecutive ports that are currently free, holding none of them.
    fn free_block(n: u16) -> u16 {
        let mut base = 41_000u16;
        loop {
            if (base..base + n).all(is_port_available) {
                return base;
            }
            base += n;
        }
    }

    #[test]
    fn test_skips_occupied_ports() {
        let base = free_block(4);
        let _a = TcpListener::bind(("127.0.0.1", base)).unwrap();
        let _b = TcpListener::bind(("127.0.0.1", base + 1)).unwrap();

        assert_eq!(find_available_port(base, base + 3), Ok(base + 2));
    }

    #[test]
    fn test_exhausted_when_all_occupied() {
        let base = free_block(4);
        let _held: Vec<TcpListener> = (base..base + 4)
            .map(|p| TcpListener::bind(("127.0.0.1", p)).unwrap())
            .collect();

        assert_eq!(
            find_available_port(base, base + 3),
            Err(PortError::Exhausted {
                start: base,
                end: base + 3
            })
        );
    }

    #[test]
    fn test_released_port_is_reusable() {
        let base = free_block(1);
        assert_eq!(find_available_port(base, base), Ok(base));
        // The probe listener was dropped, so binding again succeeds
        assert!(TcpListener::bind(("127.0.0.1", base)).is_ok());
    }

    #[test]
    fn test_inverted_range() {
        assert_eq!(
            find_available_port(9000, 8999),
            Err(PortError::InvalidRange {
                start: 9000,
                end: 8999
            })
        );
    }

    #[test]
    fn test_management_port_is_primary_plus_one() {
        let base = free_block(2);
        let pair = allocate_port_pair(base, base + 1).unwrap();
        assert_eq!(pair.primary, base);
        assert_eq!(pair.management, base + 1);
    }
}
