use tracing::error;

use super::ExecutorContext;
use crate::core::account::create_anonymous_account;
use crate::core::app::actions::SETTING_UP_ACCOUNT;
use crate::core::app::AppAction;

/// Create an anonymous user, onboard it with this device, and store the uid.
pub async fn create_account(ctx: &ExecutorContext, display_name: &str, birth_year: i32) {
    let result = create_anonymous_account(
        ctx.backend.as_ref(),
        &ctx.store,
        display_name,
        birth_year,
        |_| {
            ctx.dispatch(AppAction::AccountProgress {
                status: SETTING_UP_ACCOUNT.to_string(),
            })
        },
    )
    .await;

    match result {
        Ok(account) => ctx.dispatch(AppAction::AccountCreated {
            uid: account.uid,
            device_id: account.device_id,
        }),
        Err(message) => {
            error!(%message, "account creation failed");
            ctx.dispatch(AppAction::AccountFailed { message });
        }
    }
}
