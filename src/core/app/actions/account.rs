use std::time::{Duration, Instant};

use tracing::{error, info};

use super::session::set_user;
use super::{abandon_send, reload_user_chats, AppAction, AppCommand};
use crate::core::app::forms::{current_year, validate_account_input};
use crate::core::app::{AccountForm, App, LoginForm, Modal};

pub const CREATING_ACCOUNT: &str = "Creating anonymous account...";
pub const SETTING_UP_ACCOUNT: &str = "Setting up account...";
pub const ACCOUNT_CREATED: &str = "Account created.";
const BUSY_SENDING: &str = "Wait for the current reply to finish first.";
const ACCOUNT_CLOSE_DELAY: Duration = Duration::from_secs(2);

pub(super) fn handle_account_action(app: &mut App, action: AppAction) -> Option<AppCommand> {
    match action {
        AppAction::OpenAccountForm => {
            if app.send.is_in_flight() {
                app.show_error(BUSY_SENDING);
                return None;
            }
            app.modal = Modal::Account(AccountForm::default());
            None
        }
        AppAction::AccountFormInput { ch } => {
            if let Some(form) = app.account_form_mut().filter(|f| !f.is_locked()) {
                form.active_value_mut().push(ch);
            }
            None
        }
        AppAction::AccountFormBackspace => {
            if let Some(form) = app.account_form_mut().filter(|f| !f.is_locked()) {
                form.active_value_mut().pop();
            }
            None
        }
        AppAction::AccountFormNextField => {
            if let Some(form) = app.account_form_mut() {
                form.next_field();
            }
            None
        }
        AppAction::SubmitAccount => submit_account(app, current_year()),
        AppAction::AccountProgress { status } => {
            if let Some(form) = app.account_form_mut() {
                form.status = status;
            }
            None
        }
        AppAction::AccountCreated { uid, device_id } => {
            info!(%uid, "anonymous account created");
            abandon_send(app);
            app.session.uid = Some(uid);
            app.device_id = Some(device_id);
            app.user_chats.clear();
            app.current_character = None;
            app.current_conversation_id = None;
            app.messages.clear();
            if let Some(form) = app.account_form_mut() {
                form.submitting = false;
                form.status = ACCOUNT_CREATED.to_string();
                form.close_at = Some(Instant::now() + ACCOUNT_CLOSE_DELAY);
            }
            reload_user_chats(app)
        }
        AppAction::AccountFailed { message } => {
            error!(%message, "account creation failed");
            if let Some(form) = app.account_form_mut() {
                form.submitting = false;
                form.status = format!("Failed to create account: {message}");
            }
            None
        }
        AppAction::OpenLoginForm => {
            app.modal = Modal::Login(LoginForm {
                uid: app.session.uid.clone().unwrap_or_default(),
            });
            None
        }
        AppAction::LoginInput { ch } => {
            if let Some(form) = app.login_form_mut() {
                form.uid.push(ch);
            }
            None
        }
        AppAction::LoginBackspace => {
            if let Some(form) = app.login_form_mut() {
                form.uid.pop();
            }
            None
        }
        AppAction::SubmitLogin => {
            let uid = app.login_form_mut().map(|form| form.uid.clone())?;
            set_user(app, &uid)
        }
        AppAction::CloseModal => {
            let busy = match &app.modal {
                Modal::Account(form) => form.submitting,
                Modal::CharacterPicker(picker) => picker.selecting,
                _ => false,
            };
            if !busy {
                app.modal = Modal::None;
            }
            None
        }
        _ => unreachable!("non-account action routed to account handler"),
    }
}

fn submit_account(app: &mut App, year: i32) -> Option<AppCommand> {
    let form = app.account_form_mut()?;
    if form.is_locked() {
        return None;
    }
    match validate_account_input(&form.display_name, &form.birth_year, year) {
        Ok((display_name, birth_year)) => {
            form.submitting = true;
            form.status = CREATING_ACCOUNT.to_string();
            Some(AppCommand::CreateAccount {
                display_name,
                birth_year,
            })
        }
        Err(message) => {
            form.status = message;
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::app::{apply_action, SendState};
    use crate::core::character::test_character;
    use crate::utils::test_utils::create_test_app;

    fn open_filled_form(name: &str, year: &str) -> App {
        let mut app = create_test_app();
        apply_action(&mut app, AppAction::OpenAccountForm);
        for ch in name.chars() {
            apply_action(&mut app, AppAction::AccountFormInput { ch });
        }
        apply_action(&mut app, AppAction::AccountFormNextField);
        for ch in year.chars() {
            apply_action(&mut app, AppAction::AccountFormInput { ch });
        }
        app
    }

    fn form(app: &App) -> &AccountForm {
        match &app.modal {
            Modal::Account(form) => form,
            other => panic!("expected account form, got {other:?}"),
        }
    }

    #[test]
    fn invalid_input_reports_on_form_status_not_banner() {
        let mut app = open_filled_form("Ada", "1850");
        let cmd = apply_action(&mut app, AppAction::SubmitAccount);
        assert!(cmd.is_none());
        assert_eq!(form(&app).status, "Please enter a valid birth year.");
        assert!(!form(&app).submitting);
        assert!(app.banner.is_none());
    }

    #[test]
    fn valid_input_starts_account_creation() {
        let mut app = open_filled_form(" Ada ", "1990");
        let cmd = apply_action(&mut app, AppAction::SubmitAccount);
        assert!(matches!(
            cmd,
            Some(AppCommand::CreateAccount { ref display_name, birth_year: 1990 }) if display_name == "Ada"
        ));
        assert!(form(&app).submitting);
        assert_eq!(form(&app).status, CREATING_ACCOUNT);

        // Locked while the request runs.
        apply_action(&mut app, AppAction::AccountFormInput { ch: 'x' });
        assert_eq!(form(&app).birth_year, "1990");
        assert!(apply_action(&mut app, AppAction::SubmitAccount).is_none());
        apply_action(&mut app, AppAction::CloseModal);
        assert!(matches!(app.modal, Modal::Account(_)));
    }

    #[test]
    fn success_adopts_uid_and_schedules_close() {
        let mut app = open_filled_form("Ada", "1990");
        apply_action(&mut app, AppAction::SubmitAccount);
        apply_action(
            &mut app,
            AppAction::AccountProgress {
                status: SETTING_UP_ACCOUNT.into(),
            },
        );
        assert_eq!(form(&app).status, SETTING_UP_ACCOUNT);

        let cmd = apply_action(
            &mut app,
            AppAction::AccountCreated {
                uid: "new-uid".into(),
                device_id: "device_x".into(),
            },
        );
        assert!(matches!(cmd, Some(AppCommand::LoadUserChats { uid }) if uid == "new-uid"));
        assert_eq!(app.session.uid.as_deref(), Some("new-uid"));
        assert_eq!(app.device_id.as_deref(), Some("device_x"));
        assert_eq!(form(&app).status, ACCOUNT_CREATED);
        assert!(form(&app).close_at.is_some());
    }

    #[test]
    fn account_created_mid_stream_abandons_the_old_reply() {
        let mut app = open_filled_form("Ada", "1990");
        apply_action(&mut app, AppAction::SubmitAccount);
        app.current_character = Some(test_character("c1", "Ada"));
        let old_id = match apply_action(
            &mut app,
            AppAction::SubmitMessage {
                message: "hello".into(),
            },
        ) {
            Some(AppCommand::SpawnStream(params)) => params.stream_id,
            _ => panic!("expected a stream to be spawned"),
        };
        let token = app.session.stream_cancel_token.clone().unwrap();

        apply_action(
            &mut app,
            AppAction::AccountCreated {
                uid: "new-uid".into(),
                device_id: "device_x".into(),
            },
        );
        assert_eq!(app.send, SendState::Idle);
        assert!(token.is_cancelled());
        assert!(app.messages.is_empty());

        for action in [
            AppAction::StreamChunk {
                content: "late".into(),
                stream_id: old_id,
            },
            AppAction::StreamComplete {
                content: "late!".into(),
                stream_id: old_id,
            },
            AppAction::StreamEnded { stream_id: old_id },
        ] {
            assert!(apply_action(&mut app, action).is_none());
        }
        assert!(app.messages.is_empty());
        assert_eq!(app.send, SendState::Idle);
    }

    #[test]
    fn account_form_stays_closed_while_a_reply_streams() {
        let mut app = create_test_app();
        app.send = SendState::Sending { typing: true };
        apply_action(&mut app, AppAction::OpenAccountForm);
        assert!(!app.modal.is_open());
        assert_eq!(
            app.banner.as_ref().map(|b| b.message.as_str()),
            Some(BUSY_SENDING)
        );
    }

    #[test]
    fn picker_stays_open_while_a_chat_is_being_selected() {
        let mut app = create_test_app();
        apply_action(&mut app, AppAction::OpenCharacterPicker);
        app.picker_mut().unwrap().selecting = true;
        apply_action(&mut app, AppAction::CloseModal);
        assert!(app.picker().is_some());

        app.picker_mut().unwrap().selecting = false;
        apply_action(&mut app, AppAction::CloseModal);
        assert!(!app.modal.is_open());
    }

    #[test]
    fn failure_unlocks_form_with_prefixed_status() {
        let mut app = open_filled_form("Ada", "1990");
        apply_action(&mut app, AppAction::SubmitAccount);
        apply_action(
            &mut app,
            AppAction::AccountFailed {
                message: "quota".into(),
            },
        );
        assert_eq!(form(&app).status, "Failed to create account: quota");
        assert!(!form(&app).submitting);
    }

    #[test]
    fn login_form_submits_through_set_user() {
        let mut app = create_test_app();
        app.session.uid = None;
        apply_action(&mut app, AppAction::OpenLoginForm);
        for ch in "u9".chars() {
            apply_action(&mut app, AppAction::LoginInput { ch });
        }
        let cmd = apply_action(&mut app, AppAction::SubmitLogin);
        assert!(matches!(cmd, Some(AppCommand::PersistUid { uid }) if uid == "u9"));
        assert!(matches!(app.modal, Modal::None));
    }
}
