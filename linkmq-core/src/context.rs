//! Shared transport context management.
//!
//! Connections in one process share a single transport context: inter-thread
//! transfer is cheaper when both ends live in the same context, and contexts
//! are expensive to create.
//!
//! [`SharedContext`] owns that context and counts the connections that use
//! it:
//!
//! - [`acquire`](SharedContext::acquire) returns the live context, creating
//!   it on first use with double-checked locking.
//! - [`release`](SharedContext::release) drops one reference; the last one
//!   out destroys the context.
//!
//! The counter is bumped inside `acquire` rather than after the socket is
//! open, so a context handed to a connection that is still initializing is
//! already counted and cannot be torn down under it. A failed `init_conn`
//! gives its reference back with `release`.

use crate::error::TransportError;
use crate::transport::Transport;
use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, warn};

/// Reference-counted, lazily created transport context.
pub struct SharedContext<T: Transport> {
    transport: T,
    handle: RwLock<Option<T::Context>>,
    open: AtomicUsize,
}

impl<T: Transport> SharedContext<T> {
    /// Create a manager for `transport`. No context exists until the first
    /// `acquire`.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            handle: RwLock::new(None),
            open: AtomicUsize::new(0),
        }
    }

    /// The transport this manager creates contexts with.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Take a reference on the context, creating it if needed.
    ///
    /// Every successful call must be paired with one [`release`](Self::release).
    ///
    /// # Errors
    ///
    /// Returns the transport's error if the context cannot be created. No
    /// reference is held in that case.
    pub fn acquire(&self) -> Result<T::Context, TransportError> {
        self.open.fetch_add(1, Ordering::AcqRel);

        // Context already exists: a shared read lock is enough
        if let Some(context) = self.handle.read().as_ref() {
            return Ok(context.clone());
        }

        let mut handle = self.handle.write();
        // Someone may have created the context while we waited for the lock
        if let Some(context) = handle.as_ref() {
            return Ok(context.clone());
        }

        match self.transport.create_context() {
            Ok(context) => {
                debug!("[{}] Context created", self.transport.name());
                *handle = Some(context.clone());
                Ok(context)
            }
            Err(e) => {
                drop(handle);
                self.release();
                Err(e)
            }
        }
    }

    /// Drop one reference. Destroys the context when none remain.
    pub fn release(&self) {
        let previous = self
            .open
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));

        match previous {
            Ok(1) => {}
            Ok(_) => return,
            Err(_) => {
                warn!("[{}] Context released more often than acquired", self.transport.name());
                return;
            }
        }

        let mut handle = self.handle.write();
        // Another thread may have acquired since our decrement
        if self.open.load(Ordering::Acquire) != 0 {
            return;
        }
        if let Some(context) = handle.take() {
            self.transport.destroy_context(context);
            debug!("[{}] Context destroyed", self.transport.name());
        }
    }

    /// Number of references currently held.
    pub fn open_connections(&self) -> usize {
        self.open.load(Ordering::Acquire)
    }

    /// Returns true if a context currently exists.
    pub fn is_live(&self) -> bool {
        self.handle.read().is_some()
    }
}

impl<T: Transport> fmt::Debug for SharedContext<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedContext")
            .field("transport", &self.transport.name())
            .field("open_connections", &self.open_connections())
            .field("live", &self.is_live())
            .finish()
    }
}
