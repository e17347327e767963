use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use tracing::{info, warn};

use crate::backend::Backend;
use crate::db::Preferences;
use crate::models::User;
use crate::store::{AppStore, StoreError};

const LOAD_ATTEMPTS: u32 = 3;
const LOAD_BACKOFF: Duration = Duration::from_millis(100);

/// Owns the shared application state for one session.
///
/// Built once at startup and torn down with the session; views never
/// touch the store directly, they hold [`AppHandle`]s obtained from
/// [`AppContext::handle`]. State mutations that need the backend (user
/// load, login) go through the context; everything else goes through a
/// handle. Single-threaded by construction, matching the UI event loop
/// it backs.
pub struct AppContext {
    store: Rc<RefCell<AppStore>>,
    backend: Box<dyn Backend>,
}

impl AppContext {
    /// Build the context in the logged-out state. The persisted theme is
    /// restored here; the user is not loaded until
    /// [`load_current_user`](Self::load_current_user) runs.
    pub fn init(backend: Box<dyn Backend>, prefs: Preferences) -> Result<Self, StoreError> {
        let store = AppStore::new(prefs)?;
        Ok(Self {
            store: Rc::new(RefCell::new(store)),
            backend,
        })
    }

    /// A weak handle for views. Using it after the context is closed
    /// fails with [`StoreError::ContextClosed`].
    pub fn handle(&self) -> AppHandle {
        AppHandle {
            store: Rc::downgrade(&self.store),
        }
    }

    pub fn with<T>(&self, f: impl FnOnce(&AppStore) -> T) -> T {
        f(&self.store.borrow())
    }

    pub fn with_mut<T>(&self, f: impl FnOnce(&mut AppStore) -> T) -> T {
        f(&mut self.store.borrow_mut())
    }

    /// Ask the backend for the current user and log them in.
    ///
    /// Transient network failures are retried with doubling backoff, up
    /// to three attempts; rejected credentials fail immediately. On
    /// final failure the store is left logged out and the error is
    /// returned for the caller to surface.
    pub async fn load_current_user(&self) -> Result<(), StoreError> {
        let mut attempt = 1;
        let user = loop {
            match self.backend.fetch_user().await {
                Ok(user) => break user,
                Err(err) if err.is_transient() && attempt < LOAD_ATTEMPTS => {
                    warn!(%err, attempt, "user load failed, retrying");
                    tokio::time::sleep(LOAD_BACKOFF * 2u32.pow(attempt - 1)).await;
                    attempt += 1;
                }
                Err(err) => {
                    warn!(%err, attempt, "user load failed, staying logged out");
                    return Err(err.into());
                }
            }
        };
        self.set_user(Some(user)).await
    }

    /// Replace the current user. A new user brings their chat list along
    /// (fetched here, applied as one transition); `None` logs out. If
    /// the chat fetch fails the store reverts to logged out and the
    /// error is surfaced.
    pub async fn set_user(&self, user: Option<User>) -> Result<(), StoreError> {
        match user {
            Some(user) => {
                let chats = match self.backend.fetch_chats(&user.id).await {
                    Ok(chats) => chats,
                    Err(err) => {
                        self.store.borrow_mut().logout();
                        return Err(err.into());
                    }
                };
                info!(user = %user.name, chats = chats.len(), "logged in");
                self.store.borrow_mut().apply_user(Some(user), chats);
                Ok(())
            }
            None => {
                info!("logged out");
                self.store.borrow_mut().logout();
                Ok(())
            }
        }
    }

    /// Tear the session down. Outstanding handles start failing with
    /// [`StoreError::ContextClosed`].
    pub fn close(self) {
        info!("app context closed");
    }
}

/// A view's entry point into the store. Cheap to clone, safe to keep
/// across the session boundary: once the owning [`AppContext`] is gone,
/// every access fails fast instead of reading stale state.
#[derive(Clone)]
pub struct AppHandle {
    store: Weak<RefCell<AppStore>>,
}

impl AppHandle {
    pub fn with<T>(&self, f: impl FnOnce(&AppStore) -> T) -> Result<T, StoreError> {
        let store = self.store.upgrade().ok_or(StoreError::ContextClosed)?;
        let out = f(&store.borrow());
        Ok(out)
    }

    pub fn with_mut<T>(&self, f: impl FnOnce(&mut AppStore) -> T) -> Result<T, StoreError> {
        let store = self.store.upgrade().ok_or(StoreError::ContextClosed)?;
        let out = f(&mut store.borrow_mut());
        Ok(out)
    }
}
