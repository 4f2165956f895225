//! Handing a finished URI to an email client.

use std::path::PathBuf;
use std::process::Command;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{MailtoError, Result};
use crate::format::MailtoUrl;
use crate::settings::ClientApp;

/// Opens a `mailto:` URI.
pub trait Launcher {
    /// Open `uri` in `app`, or in the system's default handler when `app`
    /// is `None`.
    fn launch(&self, app: Option<&ClientApp>, uri: &MailtoUrl) -> Result<()>;
}

/// Reports which client the system uses for `mailto:`.
pub trait DefaultClient {
    /// Bundle ID of the current default client, if it can be determined.
    fn current_default_client(&self) -> Option<String>;
}

/// Launches through the platform opener (`open` on macOS, `xdg-open`
/// elsewhere).
#[derive(Debug, Clone, Default)]
pub struct OpenLauncher;

impl OpenLauncher {
    fn command(app: Option<&ClientApp>, uri: &MailtoUrl) -> Command {
        if cfg!(target_os = "macos") {
            let mut cmd = Command::new("open");
            match app {
                Some(ClientApp {
                    path: Some(path), ..
                }) => {
                    cmd.arg("-a").arg(path);
                }
                Some(ClientApp {
                    name: Some(name), ..
                }) => {
                    cmd.arg("-a").arg(name);
                }
                Some(ClientApp {
                    bundle_id: Some(id),
                    ..
                }) => {
                    cmd.arg("-b").arg(id);
                }
                _ => {}
            }
            cmd.arg(uri.as_str());
            cmd
        } else {
            if app.is_some() {
                warn!("Choosing a client is only supported on macOS, using the default handler");
            }
            let mut cmd = Command::new("xdg-open");
            cmd.arg(uri.as_str());
            cmd
        }
    }
}

impl Launcher for OpenLauncher {
    fn launch(&self, app: Option<&ClientApp>, uri: &MailtoUrl) -> Result<()> {
        let app_label = app
            .and_then(ClientApp::launch_target)
            .unwrap_or_else(|| "default client".to_string());
        let mut cmd = Self::command(app, uri);
        debug!(command = ?cmd, "Launching email client");

        let launch_error = |reason: String| MailtoError::Launch {
            app: app_label.clone(),
            uri: uri.to_string(),
            reason,
        };
        let status = cmd.status().map_err(|e| launch_error(e.to_string()))?;
        if !status.success() {
            return Err(launch_error(format!("opener exited with {status}")));
        }
        Ok(())
    }
}

/// Prints the URI instead of opening it.
#[derive(Debug, Clone, Default)]
pub struct PrintLauncher;

impl Launcher for PrintLauncher {
    fn launch(&self, _app: Option<&ClientApp>, uri: &MailtoUrl) -> Result<()> {
        println!("{uri}");
        Ok(())
    }
}

#[derive(Deserialize)]
struct LaunchServices {
    #[serde(rename = "LSHandlers", default)]
    handlers: Vec<LaunchServicesHandler>,
}

#[derive(Deserialize)]
struct LaunchServicesHandler {
    #[serde(rename = "LSHandlerURLScheme")]
    scheme: Option<String>,
    #[serde(rename = "LSHandlerRoleAll")]
    role_all: Option<String>,
}

/// The default client from the LaunchServices preferences, falling back to
/// a configured bundle ID.
#[derive(Debug, Clone)]
pub struct SystemDefaultClient {
    plist_path: Option<PathBuf>,
    fallback: Option<String>,
}

impl SystemDefaultClient {
    pub fn new(fallback: Option<String>) -> Self {
        let plist_path = dirs::home_dir().map(|home| {
            home.join("Library/Preferences/com.apple.LaunchServices/com.apple.launchservices.secure.plist")
        });
        Self {
            plist_path,
            fallback,
        }
    }

    /// Only the configured fallback is consulted.
    pub fn configured(fallback: Option<String>) -> Self {
        Self {
            plist_path: None,
            fallback,
        }
    }

    fn read_launch_services(&self) -> Option<String> {
        let path = self.plist_path.as_ref().filter(|p| p.exists())?;
        let output = Command::new("plutil")
            .args(["-convert", "json", "-o", "-"])
            .arg(path)
            .output()
            .map_err(|e| warn!(error = %e, "Could not run plutil"))
            .ok()?;
        if !output.status.success() {
            warn!(path = %path.display(), "plutil could not read LaunchServices preferences");
            return None;
        }
        mailto_handler(&output.stdout)
    }
}

impl DefaultClient for SystemDefaultClient {
    fn current_default_client(&self) -> Option<String> {
        self.read_launch_services().or_else(|| self.fallback.clone())
    }
}

/// Bundle ID registered for the `mailto` scheme in LaunchServices JSON.
fn mailto_handler(json: &[u8]) -> Option<String> {
    let services: LaunchServices = serde_json::from_slice(json)
        .map_err(|e| warn!(error = %e, "Unexpected LaunchServices format"))
        .ok()?;
    services
        .handlers
        .into_iter()
        .find(|h| h.scheme.as_deref() == Some("mailto"))
        .and_then(|h| h.role_all)
}
