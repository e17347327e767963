use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use chat_box::{
    AppContext, Backend, BackendError, Chat, Preferences, SampleBackend, StoreError, Theme, User,
    THEME_KEY,
};

fn sample_context() -> AppContext {
    AppContext::init(
        Box::new(SampleBackend::new()),
        Preferences::open_in_memory().unwrap(),
    )
    .unwrap()
}

/// Fails `fetch_user` with a transient error a fixed number of times
/// before delegating to the sample data.
struct FlakyBackend {
    inner: SampleBackend,
    failures_left: AtomicU32,
}

impl FlakyBackend {
    fn new(failures: u32) -> Self {
        Self {
            inner: SampleBackend::new(),
            failures_left: AtomicU32::new(failures),
        }
    }
}

#[async_trait]
impl Backend for FlakyBackend {
    async fn fetch_user(&self) -> Result<User, BackendError> {
        if self.failures_left.load(Ordering::SeqCst) > 0 {
            self.failures_left.fetch_sub(1, Ordering::SeqCst);
            return Err(BackendError::Network("connection reset".into()));
        }
        self.inner.fetch_user().await
    }

    async fn fetch_chats(&self, user_id: &str) -> Result<Vec<Chat>, BackendError> {
        self.inner.fetch_chats(user_id).await
    }
}

/// Always rejects the credentials.
struct ExpiredSession;

#[async_trait]
impl Backend for ExpiredSession {
    async fn fetch_user(&self) -> Result<User, BackendError> {
        Err(BackendError::Auth("session expired".into()))
    }

    async fn fetch_chats(&self, _user_id: &str) -> Result<Vec<Chat>, BackendError> {
        Err(BackendError::Auth("session expired".into()))
    }
}

#[tokio::test]
async fn starts_logged_out_before_the_load_resolves() {
    let ctx = sample_context();
    ctx.with(|store| {
        assert!(store.user().is_none());
        assert!(store.chats().is_empty());
        assert!(store.selected_chat().is_none());
    });
}

#[tokio::test]
async fn load_populates_user_chats_and_selection() {
    let ctx = sample_context();
    ctx.load_current_user().await.unwrap();

    ctx.with(|store| {
        assert_eq!(store.user().map(|u| u.name.as_str()), Some("Great Stack"));
        assert!(!store.chats().is_empty());
        assert_eq!(
            store.selected_chat().map(|c| c.id.as_str()),
            Some(store.chats()[0].id.as_str()),
        );
    });
}

#[tokio::test]
async fn setting_the_user_to_none_logs_out() {
    let ctx = sample_context();
    ctx.load_current_user().await.unwrap();
    ctx.set_user(None).await.unwrap();

    ctx.with(|store| {
        assert!(store.user().is_none());
        assert!(store.chats().is_empty());
        assert!(store.selected_chat().is_none());
    });
}

#[tokio::test]
async fn theme_changes_persist_and_mirror_the_dark_flag() {
    let ctx = sample_context();
    let handle = ctx.handle();

    handle.with_mut(|store| store.set_theme(Theme::Dark)).unwrap().unwrap();
    ctx.with(|store| {
        assert!(store.dark_mode());
        assert_eq!(
            store.preferences().get(THEME_KEY).unwrap().as_deref(),
            Some("dark")
        );
    });

    handle.with_mut(|store| store.set_theme(Theme::Light)).unwrap().unwrap();
    ctx.with(|store| {
        assert!(!store.dark_mode());
        assert_eq!(
            store.preferences().get(THEME_KEY).unwrap().as_deref(),
            Some("light")
        );
    });
}

#[tokio::test]
async fn transient_load_failures_are_retried() {
    let ctx = AppContext::init(
        Box::new(FlakyBackend::new(2)),
        Preferences::open_in_memory().unwrap(),
    )
    .unwrap();
    ctx.load_current_user().await.unwrap();

    ctx.with(|store| assert!(store.is_logged_in()));
}

#[tokio::test]
async fn exhausted_retries_leave_the_store_logged_out() {
    let backend = Box::new(FlakyBackend::new(10));
    let ctx = AppContext::init(backend, Preferences::open_in_memory().unwrap()).unwrap();

    let err = ctx.load_current_user().await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::Backend(BackendError::Network(_))
    ));
    ctx.with(|store| assert!(!store.is_logged_in()));
}

#[tokio::test]
async fn auth_failures_are_not_retried() {
    let ctx = AppContext::init(
        Box::new(ExpiredSession),
        Preferences::open_in_memory().unwrap(),
    )
    .unwrap();

    let err = ctx.load_current_user().await.unwrap_err();
    assert!(matches!(err, StoreError::Backend(BackendError::Auth(_))));
    ctx.with(|store| assert!(!store.is_logged_in()));
}

#[tokio::test]
async fn selection_is_validated_through_a_handle() {
    let ctx = sample_context();
    ctx.load_current_user().await.unwrap();
    let handle = ctx.handle();

    let err = handle
        .with_mut(|store| store.set_selected_chat(Some("no-such-chat")))
        .unwrap()
        .unwrap_err();
    assert!(matches!(err, StoreError::UnknownChat(_)));
}

#[tokio::test]
async fn a_handle_outliving_its_context_fails_fast() {
    let ctx = sample_context();
    let handle = ctx.handle();
    ctx.close();

    let err = handle.with(|store| store.theme()).unwrap_err();
    assert!(matches!(err, StoreError::ContextClosed));
}
