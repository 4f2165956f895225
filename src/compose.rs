//! From an accumulated recipient argument to an open compose window.
//!
//! The launcher hands over the text built up by autocompletion, e.g.
//! `"bob@example.com, sue@example.com, "`. Names are filled in from the
//! contact list, the client is picked (saved choice first, then the system
//! default), its rules are looked up and the URI is built and opened.

use tracing::{debug, info, warn};

use crate::contacts::name_for;
use crate::error::{MailtoError, Result};
use crate::format::{EscapePolicy, Formatter, MailtoUrl, RuleTable};
use crate::launch::{DefaultClient, Launcher};
use crate::model::address::Recipient;
use crate::model::contact::Contact;
use crate::search::is_valid_email;
use crate::settings::{ClientApp, Settings};

/// The outcome of composing.
#[derive(Debug)]
pub struct Composition {
    pub url: MailtoUrl,
    /// The client the URI was formatted for; `None` means the system
    /// handler with default rules.
    pub client: Option<ClientApp>,
    /// Segments that were skipped as invalid addresses.
    pub warnings: Vec<MailtoError>,
}

/// Builds and opens `mailto:` URIs for the selected client.
#[derive(Debug, Clone, Copy)]
pub struct Composer<'a> {
    rules: &'a RuleTable,
    escape: EscapePolicy,
    subject: Option<&'a str>,
}

impl<'a> Composer<'a> {
    pub fn new(rules: &'a RuleTable) -> Self {
        Self {
            rules,
            escape: EscapePolicy::default(),
            subject: None,
        }
    }

    pub fn with_escape_policy(mut self, escape: EscapePolicy) -> Self {
        self.escape = escape;
        self
    }

    pub fn with_subject(mut self, subject: Option<&'a str>) -> Self {
        self.subject = subject;
        self
    }

    /// The saved client, else the system default.
    pub fn resolve_client(
        &self,
        settings: &Settings,
        default_client: &dyn DefaultClient,
    ) -> Option<ClientApp> {
        if let Some(app) = &settings.client {
            debug!(?app, "Using selected client");
            return Some(app.clone());
        }
        let bundle_id = default_client.current_default_client()?;
        debug!(bundle_id = %bundle_id, "Using system default client");
        Some(ClientApp::from_bundle_id(&bundle_id))
    }

    /// Build the URI without launching anything.
    pub fn build(
        &self,
        argument: &str,
        contacts: &[Contact],
        settings: &Settings,
        default_client: &dyn DefaultClient,
    ) -> Composition {
        let (recipients, warnings) = resolve_recipients(argument, contacts);
        let client = self.resolve_client(settings, default_client);
        let client_id = client
            .as_ref()
            .and_then(|app| app.bundle_id.as_deref().or(app.name.as_deref()));
        let rules = self.rules.lookup(client_id);

        let url = Formatter::new(rules)
            .with_escape_policy(self.escape)
            .format(&recipients, settings.use_names, self.subject);

        Composition {
            url,
            client,
            warnings,
        }
    }

    /// Build the URI and hand it to `launcher`.
    pub fn compose(
        &self,
        argument: &str,
        contacts: &[Contact],
        settings: &Settings,
        default_client: &dyn DefaultClient,
        launcher: &dyn Launcher,
    ) -> Result<Composition> {
        let composition = self.build(argument, contacts, settings, default_client);
        for warning in &composition.warnings {
            warn!("{warning}");
        }
        launcher.launch(composition.client.as_ref(), &composition.url)?;
        info!(uri = %composition.url, "Opened compose window");
        Ok(composition)
    }
}

/// Split the argument into recipients, filling in missing names from
/// `contacts`. Invalid segments are returned as warnings.
pub fn resolve_recipients(
    argument: &str,
    contacts: &[Contact],
) -> (Vec<Recipient>, Vec<MailtoError>) {
    let mut recipients = Vec::new();
    let mut warnings = Vec::new();

    for mut recipient in Recipient::parse_list(argument) {
        if !is_valid_email(&recipient.email) {
            warnings.push(MailtoError::InvalidRecipient(recipient.email));
            continue;
        }
        if recipient.name.is_none() {
            recipient.name = name_for(contacts, &recipient.email).map(str::to_string);
        }
        recipients.push(recipient);
    }

    (recipients, warnings)
}
