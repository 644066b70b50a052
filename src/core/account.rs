//! Anonymous sign-up shared by the account form and `whispi signup`.

use tracing::info;

use crate::api::WhispiBackend;
use crate::core::session_store::SessionStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedAccount {
    pub uid: String,
    pub device_id: String,
}

/// Create a user, onboard it with this device, then store the uid.
///
/// `on_created` runs once the uid exists and onboarding is about to start.
/// The uid is only persisted after onboarding succeeds.
pub async fn create_anonymous_account<F>(
    backend: &dyn WhispiBackend,
    store: &SessionStore,
    display_name: &str,
    birth_year: i32,
    on_created: F,
) -> Result<CreatedAccount, String>
where
    F: FnOnce(&str),
{
    let uid = backend
        .create_anonymous_user()
        .await
        .map_err(|err| err.to_string())?;
    on_created(&uid);

    let device_id = store.ensure_device_id().map_err(|err| err.to_string())?;
    backend
        .onboard_user(&uid, &device_id, display_name, birth_year)
        .await
        .map_err(|err| err.to_string())?;
    store.save_uid(&uid).map_err(|err| err.to_string())?;

    info!(%uid, "account onboarded");
    Ok(CreatedAccount { uid, device_id })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{CREATE_ANONYMOUS_USER, ONBOARD_USER};
    use crate::utils::test_utils::FakeBackend;
    use std::cell::Cell;
    use tempfile::TempDir;

    #[tokio::test]
    async fn progress_fires_between_create_and_onboard() {
        let dir = TempDir::new().expect("tempdir");
        let store = SessionStore::new(dir.path().join("session.toml"));
        let backend = FakeBackend {
            created_uid: "u-new".into(),
            ..FakeBackend::default()
        }
        .fail(ONBOARD_USER, 400, "too young");

        let seen = Cell::new(None);
        let result =
            create_anonymous_account(&backend, &store, "Ada", 1990, |uid| seen.set(Some(uid.to_string())))
                .await;

        assert_eq!(result, Err("too young".to_string()));
        assert_eq!(seen.take().as_deref(), Some("u-new"));
        assert_eq!(backend.calls()[0], format!("{CREATE_ANONYMOUS_USER}:"));
        assert_eq!(store.load().expect("load").uid, None);
    }
}
