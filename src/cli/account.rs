use std::error::Error;

use crate::api::WhispiBackend;
use crate::core::account::create_anonymous_account;
use crate::core::app::actions::{CREATING_ACCOUNT, SETTING_UP_ACCOUNT, UID_REQUIRED};
use crate::core::app::forms::{current_year, validate_account_input};
use crate::core::config::path_display;
use crate::core::session_store::SessionStore;

pub fn login(store: &SessionStore, uid: &str) -> Result<(), String> {
    let uid = uid.trim();
    if uid.is_empty() {
        return Err(UID_REQUIRED.to_string());
    }
    store
        .save_uid(uid)
        .map_err(|err| format!("Failed to save session: {err}"))?;
    println!("✅ Signed in as {uid}");
    Ok(())
}

pub async fn signup(
    backend: &dyn WhispiBackend,
    store: &SessionStore,
    display_name: &str,
    birth_year: &str,
) -> Result<(), String> {
    let (name, year) = validate_account_input(display_name, birth_year, current_year())?;

    println!("{CREATING_ACCOUNT}");
    let account = create_anonymous_account(backend, store, &name, year, |_| {
        println!("{SETTING_UP_ACCOUNT}");
    })
    .await
    .map_err(|message| format!("Failed to create account: {message}"))?;

    println!("✅ Account created");
    println!("   uid: {}", account.uid);
    Ok(())
}

pub fn whoami(store: &SessionStore) -> Result<(), Box<dyn Error>> {
    let state = store.load()?;
    println!("Session ({}):", path_display(store.path()));
    println!("  uid: {}", state.uid.as_deref().unwrap_or("(not signed in)"));
    println!(
        "  device id: {}",
        state.device_id.as_deref().unwrap_or("(not generated yet)")
    );
    Ok(())
}

pub fn logout(store: &SessionStore) -> Result<(), Box<dyn Error>> {
    if store.load()?.uid.is_none() {
        println!("Not signed in.");
        return Ok(());
    }
    store.clear_uid()?;
    println!("✅ Signed out");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{CREATE_ANONYMOUS_USER, ONBOARD_USER};
    use crate::utils::test_utils::FakeBackend;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> SessionStore {
        SessionStore::new(dir.path().join("session.toml"))
    }

    #[test]
    fn login_trims_and_persists() {
        let dir = TempDir::new().expect("tempdir");
        let store = store(&dir);
        login(&store, "  u42 ").expect("login");
        assert_eq!(store.load().expect("load").uid.as_deref(), Some("u42"));
    }

    #[test]
    fn blank_login_is_rejected() {
        let dir = TempDir::new().expect("tempdir");
        assert_eq!(login(&store(&dir), "   "), Err(UID_REQUIRED.to_string()));
    }

    #[tokio::test]
    async fn signup_validates_before_calling_the_backend() {
        let dir = TempDir::new().expect("tempdir");
        let backend = FakeBackend::default();
        let result = signup(&backend, &store(&dir), "Ada", "18").await;
        assert_eq!(result, Err("Please enter a valid birth year.".to_string()));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn signup_stores_the_new_uid() {
        let dir = TempDir::new().expect("tempdir");
        let store = store(&dir);
        let backend = FakeBackend {
            created_uid: "u-new".into(),
            ..FakeBackend::default()
        };
        signup(&backend, &store, " Ada ", "1990").await.expect("signup");

        let state = store.load().expect("load");
        assert_eq!(state.uid.as_deref(), Some("u-new"));
        let device = state.device_id.expect("device id");
        assert_eq!(
            backend.calls(),
            vec![
                format!("{CREATE_ANONYMOUS_USER}:"),
                format!("{ONBOARD_USER}:u-new:{device}:Ada:1990"),
            ]
        );
    }

    #[test]
    fn logout_keeps_the_device_id() {
        let dir = TempDir::new().expect("tempdir");
        let store = store(&dir);
        store.save_uid("u1").expect("save");
        store
            .ensure_device_id_with(|| "device_x".into())
            .expect("device");
        logout(&store).expect("logout");
        let state = store.load().expect("load");
        assert_eq!(state.uid, None);
        assert_eq!(state.device_id.as_deref(), Some("device_x"));
    }
}
