use tracing::debug;

use crate::db::Preferences;
use crate::models::{Chat, Theme, User};

/// Key of the one persisted preference.
pub const THEME_KEY: &str = "theme";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("app state accessed outside an active AppContext")]
    ContextClosed,
    #[error("selected chat {0} is not in the current chat list")]
    UnknownChat(String),
    #[error("preferences store error: {0}")]
    Prefs(#[from] rusqlite::Error),
    #[error(transparent)]
    Backend(#[from] crate::backend::BackendError),
}

/// Shared application state: current user, chat list, selection, and
/// theme, plus the dark-mode flag the web client mirrors onto the
/// document root.
///
/// Every setter runs its side effects synchronously before returning,
/// so any read that follows a setter observes settled state. The
/// selection is held as a chat id and resolved by lookup; it never owns
/// a chat of its own.
pub struct AppStore {
    prefs: Preferences,
    user: Option<User>,
    chats: Vec<Chat>,
    selected: Option<String>,
    theme: Theme,
    dark_mode: bool,
}

impl AppStore {
    /// Build a store in the logged-out state, restoring the persisted
    /// theme. An absent or unrecognized stored value falls back to
    /// light, and the slot and flag are re-synced so all three agree
    /// from the first read on.
    pub fn new(prefs: Preferences) -> Result<Self, StoreError> {
        let theme = prefs
            .get(THEME_KEY)?
            .and_then(|value| Theme::parse(&value))
            .unwrap_or_default();
        let mut store = Self {
            prefs,
            user: None,
            chats: Vec::new(),
            selected: None,
            theme,
            dark_mode: false,
        };
        store.sync_theme()?;
        Ok(store)
    }

    // ── Reads ──

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn chats(&self) -> &[Chat] {
        &self.chats
    }

    /// Resolves the selection against the current chat list.
    pub fn selected_chat(&self) -> Option<&Chat> {
        let id = self.selected.as_deref()?;
        self.chats.iter().find(|chat| chat.id == id)
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// The flag the web client applies as the document-root `dark` class.
    pub fn dark_mode(&self) -> bool {
        self.dark_mode
    }

    pub fn is_logged_in(&self) -> bool {
        self.user.is_some()
    }

    pub fn preferences(&self) -> &Preferences {
        &self.prefs
    }

    // ── Transitions ──

    /// Replace the user and derive the dependent chat state in one step:
    /// a user brings their chat list with its first entry selected, no
    /// user means an empty list and no selection.
    pub fn apply_user(&mut self, user: Option<User>, chats: Vec<Chat>) {
        match user {
            Some(user) => {
                self.selected = chats.first().map(|chat| chat.id.clone());
                self.chats = chats;
                self.user = Some(user);
            }
            None => {
                self.user = None;
                self.chats = Vec::new();
                self.selected = None;
            }
        }
    }

    pub fn logout(&mut self) {
        self.apply_user(None, Vec::new());
    }

    /// Wholesale replacement of the chat list. A selection that no
    /// longer resolves against the new list is cleared.
    pub fn set_chats(&mut self, chats: Vec<Chat>) {
        self.chats = chats;
        if let Some(id) = self.selected.as_deref() {
            if !self.chats.iter().any(|chat| chat.id == id) {
                self.selected = None;
            }
        }
    }

    /// Point the selection at a chat already present in the list.
    pub fn set_selected_chat(&mut self, id: Option<&str>) -> Result<(), StoreError> {
        if let Some(id) = id {
            if !self.chats.iter().any(|chat| chat.id == id) {
                return Err(StoreError::UnknownChat(id.to_string()));
            }
        }
        self.selected = id.map(str::to_string);
        Ok(())
    }

    /// Set the theme, mirror the dark flag, and persist the slot before
    /// returning. Repeating the same value is harmless.
    pub fn set_theme(&mut self, theme: Theme) -> Result<(), StoreError> {
        self.theme = theme;
        self.sync_theme()
    }

    fn sync_theme(&mut self) -> Result<(), StoreError> {
        self.dark_mode = self.theme.is_dark();
        self.prefs.set(THEME_KEY, self.theme.as_str())?;
        debug!(theme = self.theme.as_str(), "theme persisted");
        Ok(())
    }
}
