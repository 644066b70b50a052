use std::error::Error;

use tracing::{info, warn};

use crate::api::WhispiClient;
use crate::core::app::{App, SessionContext};
use crate::core::config::Config;
use crate::core::session_store::SessionStore;

pub struct ChatBootstrap {
    pub app: App,
    pub client: WhispiClient,
    pub store: SessionStore,
}

/// Load configuration and the stored session, and build the initial app.
pub fn bootstrap_app(api_base_url: Option<&str>) -> Result<ChatBootstrap, Box<dyn Error>> {
    let config = Config::load()?;
    let client = WhispiClient::from_config(&config, api_base_url)?;
    let store = SessionStore::open_default()?;

    let state = match store.load() {
        Ok(state) => state,
        Err(err) => {
            // An unreadable session file starts the client signed out.
            warn!(error = %err, "ignoring unreadable session file");
            Default::default()
        }
    };
    info!(base_url = client.base_url(), signed_in = state.uid.is_some(), "starting chat");

    let session = SessionContext::new(client.clone(), state.uid).with_config(&config);
    let app = App::new(session, state.device_id);
    Ok(ChatBootstrap { app, client, store })
}
