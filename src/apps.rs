//! Installed email clients.
//!
//! Applications are found with Spotlight (`mdfind`) in `/Applications` and
//! `~/Applications`. An app counts as an email client when its `Info.plist`
//! registers the `mailto` URL scheme.

use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{MailtoError, Result};
use crate::settings::ClientApp;

/// Finds email clients on this machine.
pub trait ClientCatalog {
    /// Installed apps that handle `mailto:`, sorted by name.
    fn mail_clients(&self) -> Result<Vec<ClientApp>>;

    /// Describe the app bundle at `path`.
    fn app_at(&self, path: &Path) -> Result<ClientApp>;
}

#[derive(Debug, Default, Deserialize)]
struct BundleInfo {
    #[serde(rename = "CFBundleIdentifier")]
    bundle_id: Option<String>,
    #[serde(rename = "CFBundleURLTypes", default)]
    url_types: Vec<UrlType>,
}

#[derive(Debug, Deserialize)]
struct UrlType {
    #[serde(rename = "CFBundleURLSchemes", default)]
    schemes: Vec<String>,
}

impl BundleInfo {
    fn handles_mailto(&self) -> bool {
        self.url_types
            .iter()
            .flat_map(|t| &t.schemes)
            .any(|scheme| scheme.eq_ignore_ascii_case("mailto"))
    }
}

/// Spotlight-backed catalog.
#[derive(Debug, Clone)]
pub struct SpotlightCatalog {
    search_dirs: Vec<PathBuf>,
}

impl Default for SpotlightCatalog {
    fn default() -> Self {
        let mut search_dirs = vec![PathBuf::from("/Applications")];
        if let Some(home) = dirs::home_dir() {
            search_dirs.push(home.join("Applications"));
        }
        Self { search_dirs }
    }
}

impl SpotlightCatalog {
    pub fn new(search_dirs: Vec<PathBuf>) -> Self {
        Self { search_dirs }
    }

    fn installed_apps(&self) -> Result<Vec<PathBuf>> {
        if !cfg!(target_os = "macos") {
            return Err(MailtoError::Discovery(
                "installed apps can only be listed on macOS".to_string(),
            ));
        }
        let mut cmd = Command::new("mdfind");
        for dir in self.search_dirs.iter().filter(|d| d.exists()) {
            cmd.arg("-onlyin").arg(dir);
        }
        cmd.arg("kind:application");
        debug!(command = ?cmd, "Listing installed apps");

        let output = cmd
            .output()
            .map_err(|e| MailtoError::Discovery(format!("mdfind: {e}")))?;
        if !output.status.success() {
            return Err(MailtoError::Discovery(format!(
                "mdfind exited with {}",
                output.status
            )));
        }
        Ok(app_paths(&String::from_utf8_lossy(&output.stdout)))
    }
}

impl ClientCatalog for SpotlightCatalog {
    fn mail_clients(&self) -> Result<Vec<ClientApp>> {
        let mut clients: Vec<ClientApp> = self
            .installed_apps()?
            .into_iter()
            .filter_map(|path| {
                let info = read_bundle_info(&path)?;
                info.handles_mailto()
                    .then(|| ClientApp::from_path(&path, info.bundle_id))
            })
            .collect();
        clients.sort_by_key(|app| app.display_name().to_lowercase());
        debug!(count = clients.len(), "Found email clients");
        Ok(clients)
    }

    fn app_at(&self, path: &Path) -> Result<ClientApp> {
        if !path.exists() {
            return Err(MailtoError::io(
                path,
                std::io::Error::from(std::io::ErrorKind::NotFound),
            ));
        }
        let bundle_id = read_bundle_info(path).and_then(|info| info.bundle_id);
        if bundle_id.is_none() {
            warn!(path = %path.display(), "No bundle ID found, rules will be looked up by name");
        }
        Ok(ClientApp::from_path(path, bundle_id))
    }
}

/// One path per line of `mdfind` output.
fn app_paths(listing: &str) -> Vec<PathBuf> {
    listing
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(PathBuf::from)
        .collect()
}

fn read_bundle_info(app: &Path) -> Option<BundleInfo> {
    let plist = app.join("Contents").join("Info.plist");
    if !plist.exists() {
        return None;
    }
    let output = Command::new("plutil")
        .args(["-convert", "json", "-o", "-"])
        .arg(&plist)
        .output()
        .map_err(|e| warn!(error = %e, "Could not run plutil"))
        .ok()?;
    if !output.status.success() {
        debug!(path = %plist.display(), "plutil could not read Info.plist");
        return None;
    }
    parse_bundle_info(&output.stdout)
}

fn parse_bundle_info(json: &[u8]) -> Option<BundleInfo> {
    serde_json::from_slice(json)
        .map_err(|e| debug!(error = %e, "Unexpected Info.plist format"))
        .ok()
}

/// Clients whose name matches `query`, ignoring case: prefix matches first,
/// then substring matches, each in catalog order.
pub fn select_clients<'a>(query: &str, clients: &'a [ClientApp]) -> Vec<&'a ClientApp> {
    let query = query.trim().to_lowercase();
    let names: Vec<String> = clients
        .iter()
        .map(|app| app.display_name().to_lowercase())
        .collect();

    let prefix = clients
        .iter()
        .zip(&names)
        .filter(|(_, name)| name.starts_with(&query));
    let substring = clients
        .iter()
        .zip(&names)
        .filter(|(_, name)| !name.starts_with(&query) && name.contains(&query));
    prefix.chain(substring).map(|(app, _)| app).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<ClientApp> {
        vec![
            ClientApp::from_path(Path::new("/Applications/Airmail 5.app"), Some("it.bloop.airmail2".into())),
            ClientApp::from_path(Path::new("/Applications/Mail.app"), Some("com.apple.mail".into())),
            ClientApp::from_path(Path::new("/Applications/Mailbox.app"), Some("com.orchestra.Mailbox".into())),
            ClientApp::from_path(Path::new("/Applications/Spark.app"), Some("com.readdle.smartemail-Mac".into())),
        ]
    }

    fn names(apps: &[&ClientApp]) -> Vec<String> {
        apps.iter().map(|a| a.display_name().to_string()).collect()
    }

    #[test]
    fn test_prefix_matches_come_first() {
        let clients = catalog();
        assert_eq!(
            names(&select_clients("MAIL", &clients)),
            vec!["Mail", "Mailbox", "Airmail 5"]
        );
    }

    #[test]
    fn test_substring_only_and_no_match() {
        let clients = catalog();
        assert_eq!(names(&select_clients("par", &clients)), vec!["Spark"]);
        assert!(select_clients("thunderbird", &clients).is_empty());
        assert_eq!(select_clients("", &clients).len(), clients.len());
    }

    #[test]
    fn test_bundle_info_mailto_scheme() {
        let json = br#"{
            "CFBundleIdentifier": "it.bloop.airmail2",
            "CFBundleURLTypes": [
                {"CFBundleURLName": "Web", "CFBundleURLSchemes": ["airmail"]},
                {"CFBundleURLName": "Email", "CFBundleURLSchemes": ["MAILTO"]}
            ]
        }"#;
        let info = parse_bundle_info(json).expect("parse");
        assert_eq!(info.bundle_id.as_deref(), Some("it.bloop.airmail2"));
        assert!(info.handles_mailto());

        let editor = parse_bundle_info(br#"{"CFBundleIdentifier": "com.example.editor"}"#)
            .expect("parse");
        assert!(!editor.handles_mailto());
        assert!(parse_bundle_info(b"<plist>").is_none());
    }

    #[test]
    fn test_app_paths_from_listing() {
        let listing = "/Applications/Mail.app\n\n/Users/me/Applications/Airmail 5.app\n";
        assert_eq!(
            app_paths(listing),
            vec![
                PathBuf::from("/Applications/Mail.app"),
                PathBuf::from("/Users/me/Applications/Airmail 5.app"),
            ]
        );
    }

    #[test]
    fn test_app_at_derives_name() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = dir.path().join("Postbox.app");
        std::fs::create_dir_all(app.join("Contents")).expect("mkdir");

        let client = SpotlightCatalog::new(vec![dir.path().to_path_buf()])
            .app_at(&app)
            .expect("app_at");
        assert_eq!(client.name.as_deref(), Some("Postbox"));
        assert_eq!(client.path.as_deref(), Some(app.as_path()));
        assert_eq!(client.bundle_id, None);
    }

    #[test]
    fn test_app_at_missing_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = SpotlightCatalog::default().app_at(&dir.path().join("Gone.app"));
        assert!(matches!(result, Err(MailtoError::Io { .. })));
    }
}
