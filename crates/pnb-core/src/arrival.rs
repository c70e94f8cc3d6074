use std::sync::OnceLock;

use chrono::Local;
use regex::Regex;

use crate::{dispatch::Dispatcher, domain::Package, events::InboundEmail, Result};

fn pickup_code_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)pickup\s*code\s*(\d+)").expect("pickup code pattern is valid")
    })
}

/// First numeric token following "pickup code" (any case, any whitespace in
/// between, including line breaks).
pub fn extract_pickup_code(body: &str) -> Option<String> {
    pickup_code_re()
        .captures(body)
        .map(|caps| caps[1].to_string())
}

impl Dispatcher {
    /// Handle one email notification forwarded by the mailbox watcher.
    ///
    /// With a recognizable pickup code: persist a package and notify every
    /// subscriber. Without one: escalate the raw body to the admins so a
    /// human can intervene, and create nothing.
    pub async fn handle_email(&self, email: &InboundEmail) -> Result<()> {
        let Some(code) = extract_pickup_code(&email.body) else {
            return self.escalate_unparsed(email).await;
        };

        let package = Package::new(self.ids.next(), code, Local::now().date_naive());
        self.store.add_package(&package).await?;
        tracing::info!(package = %package, "new package registered");

        let note = format!(
            "Package {id} has arrived (pickup code {code}). Send 'claim package {id}' once you have collected it.",
            id = package.id,
            code = package.code,
        );
        for user in self.store.list_users().await? {
            self.reply(&user.id, &note).await;
        }
        Ok(())
    }

    async fn escalate_unparsed(&self, email: &InboundEmail) -> Result<()> {
        tracing::warn!(title = %email.title, "no pickup code found in email; escalating to admins");
        let note = format!("No pickup code found in email:\n{}", email.body);
        for admin in self.store.list_admins().await? {
            self.reply(&admin.id, &note).await;
        }
        Ok(())
    }
}
