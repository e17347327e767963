//! Shared application state for a web chat client: the current user,
//! their chat list, the selected chat, and the light/dark theme.
//!
//! One [`AppContext`] is built per session and owns the [`AppStore`];
//! views read and mutate state through [`AppHandle`]s. Chat data comes
//! from an injected [`Backend`] (currently [`SampleBackend`]'s canned
//! data); the only durable state is the theme, kept in [`Preferences`].

mod backend;
mod context;
mod db;
mod models;
mod store;

pub use backend::{Backend, BackendError, SampleBackend};
pub use context::{AppContext, AppHandle};
pub use db::Preferences;
pub use models::{Chat, Message, Theme, User};
pub use store::{AppStore, StoreError, THEME_KEY};
