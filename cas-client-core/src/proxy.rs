use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Proxy-granting tickets delivered by the CAS server on the `pgtUrl` callback,
/// keyed by their `PGTIOU`.
///
/// The callback always lands before the matching `serviceValidate` answer, so
/// entries only need to live for the duration of one login.
#[derive(Debug)]
pub struct ProxyGrantingTickets {
    ttl: Duration,
    entries: Mutex<HashMap<String, (String, Instant)>>,
}

impl ProxyGrantingTickets {
    pub fn new(ttl: Duration) -> Self {
        ProxyGrantingTickets {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn insert(&self, iou: &str, proxy_granting_ticket: &str) {
        let mut entries = self.entries();
        let ttl = self.ttl;
        entries.retain(|_, (_, received)| received.elapsed() < ttl);
        entries.insert(
            iou.to_string(),
            (proxy_granting_ticket.to_string(), Instant::now()),
        );
    }

    /// Removes and returns the ticket matching `iou`, unless it expired.
    pub fn take(&self, iou: &str) -> Option<String> {
        match self.entries().remove(iou) {
            Some((ticket, received)) if received.elapsed() < self.ttl => Some(ticket),
            Some(_) => {
                debug!("Proxy-granting ticket for {} expired", iou);
                None
            }
            None => None,
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, (String, Instant)>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ProxyGrantingTickets {
    fn default() -> Self {
        ProxyGrantingTickets::new(Duration::from_secs(60))
    }
}
