//! Minimal bot host.
//!
//! Owns the plugin's active/inactive state and routes chat lines to it. A
//! configuration problem never reaches chat users: it is logged and the
//! plugin simply stays inactive.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{error, info, warn};

use super::{ChatCommand, SocialSupport, PLUGIN_NAME};
use crate::config::{PluginSettings, SocialSupportConfig};
use crate::error::PluginError;
use crate::store::KeyValueStore;

/// Hosts at most one active [`SocialSupport`] instance.
#[derive(Default)]
pub struct PluginHost {
    plugin: Option<SocialSupport>,
}

impl PluginHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates `raw` and activates the plugin against the real APIs.
    ///
    /// Returns whether the plugin is active afterwards.
    pub async fn activate(
        &mut self,
        raw: Option<&HashMap<String, String>>,
        store: Arc<dyn KeyValueStore>,
        settings: PluginSettings,
    ) -> bool {
        let Some(raw) = raw else {
            info!("SocialSupport is not configured - plugin not activating.");
            self.plugin = None;
            return false;
        };

        let result = match SocialSupportConfig::from_map(raw) {
            Ok(config) => SocialSupport::activate(&config, store, settings).await,
            Err(e) => Err(PluginError::from(e)),
        };
        self.install(result)
    }

    /// Activates an already built plugin result, logging failures.
    pub fn install(&mut self, result: Result<SocialSupport, PluginError>) -> bool {
        match result {
            Ok(plugin) => {
                self.plugin = Some(plugin);
                true
            }
            Err(PluginError::Config(e)) => {
                info!(error = %e, "SocialSupport configuration rejected - plugin not activating.");
                self.plugin = None;
                false
            }
            Err(e) => {
                warn!(error = %e, "SocialSupport failed to activate");
                self.plugin = None;
                false
            }
        }
    }

    pub fn deactivate(&mut self) {
        if self.plugin.take().is_some() {
            info!("SocialSupport deactivated.");
        }
    }

    pub fn is_active(&self) -> bool {
        self.plugin.is_some()
    }

    /// Names of active plugins.
    pub fn active_plugin_names(&self) -> Vec<&'static str> {
        if self.is_active() {
            vec![PLUGIN_NAME]
        } else {
            Vec::new()
        }
    }

    pub fn plugin(&self) -> Option<&SocialSupport> {
        self.plugin.as_ref()
    }

    /// Routes one chat line from `sender`.
    ///
    /// Returns `None` when no active plugin handles the line.
    pub async fn dispatch(&self, sender: &str, line: &str) -> Option<Vec<String>> {
        let plugin = self.plugin.as_ref()?;
        let command = ChatCommand::parse(line)?;

        match plugin.run_command(command, sender).await {
            Ok(lines) => Some(lines),
            Err(e) => {
                error!(command = command.name(), sender = sender, error = %e, "Command failed");
                Some(vec![format!("Sorry, train {} failed: {e}", command.name())])
            }
        }
    }
}
