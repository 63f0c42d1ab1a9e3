use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::domain::cart::Cart;
use crate::domain::errors::DomainError;

const MAX_SESSION_LEN: usize = 128;
pub const DEFAULT_MAX_SESSIONS: usize = 10_000;
pub const DEFAULT_IDLE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug)]
struct Entry {
    cart: Cart,
    touched: Instant,
    /// Write order, breaks ties between equal `touched` instants.
    seq: u64,
}

/// Session-keyed carts held in process memory. Carts idle for longer than
/// `idle_ttl` are dropped, and once `max_sessions` carts are held the least
/// recently touched one makes room for a new session.
#[derive(Debug)]
pub struct CartStore {
    carts: Mutex<HashMap<String, Entry>>,
    max_sessions: usize,
    idle_ttl: Duration,
    writes: AtomicU64,
}

impl Default for CartStore {
    fn default() -> Self {
        Self::with_limits(DEFAULT_MAX_SESSIONS, DEFAULT_IDLE_TTL)
    }
}

fn check_session(session: &str) -> Result<(), DomainError> {
    let well_formed = !session.is_empty()
        && session.len() <= MAX_SESSION_LEN
        && session
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if well_formed {
        Ok(())
    } else {
        Err(DomainError::InvalidInput("invalid cart session id".into()))
    }
}

impl CartStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(max_sessions: usize, idle_ttl: Duration) -> Self {
        Self {
            carts: Mutex::new(HashMap::new()),
            max_sessions: max_sessions.max(1),
            idle_ttl,
            writes: AtomicU64::new(0),
        }
    }

    fn carts(&self) -> Result<MutexGuard<'_, HashMap<String, Entry>>, DomainError> {
        self.carts
            .lock()
            .map_err(|_| DomainError::Internal("cart store lock poisoned".into()))
    }

    fn is_live(&self, entry: &Entry, now: Instant) -> bool {
        now.duration_since(entry.touched) < self.idle_ttl
    }

    /// Drops idle carts, then the oldest ones until a new session fits.
    fn make_room(&self, carts: &mut HashMap<String, Entry>, now: Instant) {
        carts.retain(|_, entry| self.is_live(entry, now));
        while carts.len() >= self.max_sessions {
            let oldest = carts
                .iter()
                .min_by_key(|(_, entry)| (entry.touched, entry.seq))
                .map(|(session, _)| session.clone());
            match oldest {
                Some(session) => {
                    log::debug!("Evicting cart {}", session);
                    carts.remove(&session);
                }
                None => break,
            }
        }
    }

    /// An unknown or expired session reads as an empty cart.
    pub fn get(&self, session: &str) -> Result<Cart, DomainError> {
        check_session(session)?;
        let now = Instant::now();
        Ok(self
            .carts()?
            .get(session)
            .filter(|entry| self.is_live(entry, now))
            .map(|entry| entry.cart.clone())
            .unwrap_or_default())
    }

    /// Applies `change` to the session's cart; nothing is stored if it fails.
    pub fn update<F>(&self, session: &str, change: F) -> Result<Cart, DomainError>
    where
        F: FnOnce(&mut Cart) -> Result<(), DomainError>,
    {
        check_session(session)?;
        let now = Instant::now();
        let mut carts = self.carts()?;
        let mut cart = carts
            .get(session)
            .filter(|entry| self.is_live(entry, now))
            .map(|entry| entry.cart.clone())
            .unwrap_or_default();
        change(&mut cart)?;

        if cart.is_empty() {
            carts.remove(session);
        } else {
            if !carts.contains_key(session) {
                self.make_room(&mut carts, now);
            }
            carts.insert(
                session.to_string(),
                Entry {
                    cart: cart.clone(),
                    touched: now,
                    seq: self.writes.fetch_add(1, Ordering::Relaxed),
                },
            );
        }
        Ok(cart)
    }

    pub fn clear(&self, session: &str) -> Result<(), DomainError> {
        check_session(session)?;
        self.carts()?.remove(session);
        Ok(())
    }

    /// Clears the cart only if it still matches what was checked out.
    pub fn clear_if_unchanged(&self, session: &str, checked_out: &Cart) -> Result<bool, DomainError> {
        check_session(session)?;
        let mut carts = self.carts()?;
        if carts.get(session).map(|entry| &entry.cart) == Some(checked_out) {
            carts.remove(session);
            return Ok(true);
        }
        Ok(false)
    }

    pub fn session_count(&self) -> Result<usize, DomainError> {
        Ok(self.carts()?.len())
    }
}
