//! The lookup service.
//!
//! [`GeoIpService`] owns the active database set. Request paths snapshot the
//! set under a short read lock and run their lookups without holding it.
//! Refresh builds a complete new set and swaps it in under the write lock.
//! A replaced set is released only after the lock is dropped, and its readers
//! stay alive until the last in-flight snapshot finishes with them.

use std::net::IpAddr;
use std::sync::{Arc, RwLock};

use crate::geoip::database::Resolver;
use crate::geoip::types::GeoIpMetadata;
use crate::variables::VariableSink;

/// Ordered collection of loaded databases, queried in activation order.
///
/// Never mutated once installed; refresh replaces it wholesale.
#[derive(Default)]
pub struct ActiveSet {
    entries: Vec<Box<dyn Resolver>>,
}

impl ActiveSet {
    /// An empty set; lookups against it are no-ops.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Appends `resolver` after every entry already present.
    pub fn push(&mut self, resolver: Box<dyn Resolver>) {
        self.entries.push(resolver);
    }

    /// Number of databases in the set.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set holds no database.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in activation order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Resolver> {
        self.entries.iter().map(|e| e.as_ref())
    }

    /// Metadata of every entry, in activation order.
    pub fn metadata(&self) -> Vec<GeoIpMetadata> {
        self.iter().map(|r| r.metadata().clone()).collect()
    }
}

impl FromIterator<Box<dyn Resolver>> for ActiveSet {
    fn from_iter<I: IntoIterator<Item = Box<dyn Resolver>>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl std::fmt::Debug for ActiveSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.iter().map(|r| &r.metadata().edition))
            .finish()
    }
}

/// Resolves client addresses against the currently active databases.
///
/// Construct one per process, share it behind an `Arc`, and pass it to the
/// request-handling boundary.
#[derive(Debug, Default)]
pub struct GeoIpService {
    active: RwLock<Arc<ActiveSet>>,
}

impl GeoIpService {
    /// Creates a service with no active database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a service serving `set`.
    pub fn with_active_set(set: ActiveSet) -> Self {
        Self {
            active: RwLock::new(Arc::new(set)),
        }
    }

    /// Current active set. The read lock is held only for the clone.
    pub fn snapshot(&self) -> Arc<ActiveSet> {
        match self.active.read() {
            Ok(guard) => Arc::clone(&*guard),
            Err(poisoned) => {
                log::error!("GeoIP active set lock poisoned, serving last installed set");
                Arc::clone(&*poisoned.into_inner())
            }
        }
    }

    /// Queries every active database for `ip` and merges the results into `sink`.
    ///
    /// Later databases win on shared keys. Errors from one database are logged
    /// and do not stop the others.
    pub fn lookup(&self, ip: IpAddr, sink: &mut VariableSink) {
        let snapshot = self.snapshot();
        for resolver in snapshot.iter() {
            if let Err(e) = resolver.resolve(ip, sink) {
                log::error!("{}", e);
            }
        }
    }

    /// Primes `sink` with every default, records the client address, then looks it up.
    ///
    /// `None` means the client address could not be determined; `ip_address`
    /// stays empty and no lookup runs.
    pub fn resolve(&self, ip: Option<IpAddr>, sink: &mut VariableSink) {
        crate::geoip::prime_defaults(sink);
        if let Some(ip) = ip {
            sink.set("ip_address", ip.to_string());
            self.lookup(ip, sink);
        }
    }

    /// Installs `set` and returns the one it replaced.
    ///
    /// The write lock covers only the pointer swap. Callers release the
    /// returned set with [`retire`] once they no longer need it.
    pub fn replace(&self, set: ActiveSet) -> Arc<ActiveSet> {
        let next = Arc::new(set);
        let mut guard = match self.active.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        std::mem::replace(&mut *guard, next)
    }

    /// Swaps in `set` and releases the previous one.
    pub fn install(&self, set: ActiveSet) {
        let count = set.len();
        let previous = self.replace(set);
        log::info!("Installed {} geoip database reader(s)", count);
        retire(previous);
    }

    /// Empties the active set and releases every reader.
    pub fn close(&self) {
        log::debug!("closing geoip database readers");
        retire(self.replace(ActiveSet::empty()));
    }

    /// Whether at least one database is active.
    pub fn is_enabled(&self) -> bool {
        !self.snapshot().is_empty()
    }

    /// Metadata of the active databases, in activation order.
    pub fn metadata(&self) -> Vec<GeoIpMetadata> {
        self.snapshot().metadata()
    }
}

/// Releases a replaced set. Readers still referenced by an in-flight lookup
/// are freed when that lookup drops its snapshot.
pub fn retire(set: Arc<ActiveSet>) {
    if set.is_empty() {
        return;
    }
    match Arc::try_unwrap(set) {
        Ok(set) => log::debug!("Closed {} retired geoip database reader(s)", set.len()),
        Err(shared) => log::debug!(
            "Retired {} geoip database reader(s), still in use by {} lookup(s)",
            shared.len(),
            Arc::strong_count(&shared) - 1
        ),
    }
}
