use std::sync::Arc;

use crate::{
    domain::{PackageIdAllocator, Role, User, UserId},
    events::InboundMessage,
    ports::{NotifierPort, ProfilePort, StorePort},
    Result,
};

pub const HELP_TEXT: &str = "Package Notifier Bot supports the following commands\n\
* list packages - list all uncollected packages\n\
* claim package <id> - mark a package as collected\n\
* unsubscribe - stop receiving notifications\n\
* help - show this help text";

pub const HELP_TEXT_ADMIN: &str = "Package Notifier Bot supports the following commands\n\
* list packages - list all uncollected packages\n\
* claim package <id> - mark a package as collected\n\
* unsubscribe - stop receiving notifications\n\
* help - show this help text\n\
* list users - list all subscribed users\n\
* remove user <name> - unsubscribe another user";

pub const NOT_SUBSCRIBED_TEXT: &str =
    "To subscribe to package notifier bot, please respond with the correct password.";

pub const UNKNOWN_CMD_TEXT: &str = "Sorry, I don't know how to help with that.";

pub const NO_PACKAGES_TEXT: &str = "No uncollected packages.";

/// The two shared secrets that trigger self-registration.
#[derive(Clone, Debug)]
pub struct Passphrases {
    pub member: String,
    pub admin: String,
}

/// Interprets inbound events against user/package state and replies through
/// the notifier port. One instance per process, shared across requests.
pub struct Dispatcher {
    pub(crate) store: Arc<dyn StorePort>,
    pub(crate) notifier: Arc<dyn NotifierPort>,
    pub(crate) profiles: Arc<dyn ProfilePort>,
    pub(crate) ids: Arc<PackageIdAllocator>,
    passphrases: Passphrases,
}

impl Dispatcher {
    pub fn new(
        store: Arc<dyn StorePort>,
        notifier: Arc<dyn NotifierPort>,
        profiles: Arc<dyn ProfilePort>,
        ids: Arc<PackageIdAllocator>,
        passphrases: Passphrases,
    ) -> Self {
        Self {
            store,
            notifier,
            profiles,
            ids,
            passphrases,
        }
    }

    /// Handle one message from the messaging platform.
    ///
    /// Every rejected or failed command still produces exactly one reply to
    /// the sender. Store failures propagate; delivery failures do not.
    pub async fn handle_message(&self, msg: &InboundMessage) -> Result<()> {
        let raw = msg.text.as_deref().unwrap_or("").trim();
        let normalized = raw.to_lowercase();
        let sender_id = UserId(msg.sender_id.clone());

        let Some(sender) = self.store.find_user(&sender_id).await? else {
            return self.handle_unregistered(&sender_id, &normalized).await;
        };

        tracing::debug!(sender = %sender.id, command = %normalized, "dispatching command");

        // Literal commands first, then the two argument-taking prefixes;
        // a string that matches both resolves in favor of the literal.
        match normalized.as_str() {
            "help" => {
                let text = match sender.role {
                    Role::Member => HELP_TEXT,
                    Role::Admin => HELP_TEXT_ADMIN,
                };
                self.reply(&sender.id, text).await;
                Ok(())
            }
            "list packages" => self.list_packages(&sender).await,
            "unsubscribe" => self.unsubscribe(&sender).await,
            "list users" => match sender.role {
                Role::Admin => self.list_users(&sender).await,
                Role::Member => {
                    self.reply(&sender.id, UNKNOWN_CMD_TEXT).await;
                    Ok(())
                }
            },
            _ if normalized.starts_with("claim package") => {
                self.claim_package(&sender, &normalized).await
            }
            _ if normalized.starts_with("remove user") => match sender.role {
                Role::Admin => self.remove_user(&sender, raw).await,
                Role::Member => {
                    self.reply(&sender.id, UNKNOWN_CMD_TEXT).await;
                    Ok(())
                }
            },
            _ => {
                self.reply(&sender.id, UNKNOWN_CMD_TEXT).await;
                Ok(())
            }
        }
    }

    async fn handle_unregistered(&self, sender_id: &UserId, normalized: &str) -> Result<()> {
        if normalized == self.passphrases.member.to_lowercase() {
            return self.register(sender_id, Role::Member).await;
        }
        if normalized == self.passphrases.admin.to_lowercase() {
            return self.register(sender_id, Role::Admin).await;
        }
        self.reply(sender_id, NOT_SUBSCRIBED_TEXT).await;
        Ok(())
    }

    async fn list_packages(&self, sender: &User) -> Result<()> {
        let packages = self.store.list_uncollected_packages().await?;
        if packages.is_empty() {
            self.reply(&sender.id, NO_PACKAGES_TEXT).await;
            return Ok(());
        }
        for package in &packages {
            self.reply(&sender.id, &package.to_string()).await;
        }
        Ok(())
    }

    async fn claim_package(&self, sender: &User, normalized: &str) -> Result<()> {
        // Lenient tokenization: the id is whatever the third token parses to.
        let id = normalized
            .split_whitespace()
            .nth(2)
            .and_then(|token| token.parse::<i64>().ok());
        let Some(id) = id else {
            self.reply(&sender.id, UNKNOWN_CMD_TEXT).await;
            return Ok(());
        };

        let Some(package) = self.store.find_package(id).await? else {
            self.reply(&sender.id, &format!("No package found with id {id}."))
                .await;
            return Ok(());
        };

        self.store.mark_collected(&package).await?;
        self.reply(&sender.id, &format!("Package {id} marked as collected."))
            .await;
        Ok(())
    }

    async fn unsubscribe(&self, sender: &User) -> Result<()> {
        self.store.remove_user(sender).await?;
        self.reply(&sender.id, "You have been unsubscribed.").await;
        tracing::info!(user = %sender, "user unsubscribed");
        Ok(())
    }

    async fn remove_user(&self, sender: &User, raw: &str) -> Result<()> {
        // The remainder keeps any extra separating whitespace; trim it off
        // so the name lookup sees what the admin typed.
        let name = raw.splitn(3, char::is_whitespace).nth(2).map(str::trim);
        let Some(name) = name.filter(|n| !n.is_empty()) else {
            self.reply(&sender.id, UNKNOWN_CMD_TEXT).await;
            return Ok(());
        };

        let Some(target) = self.store.find_user_by_name(name).await? else {
            self.reply(&sender.id, &format!("No user found with name {name}."))
                .await;
            return Ok(());
        };

        self.store.remove_user(&target).await?;
        self.reply(&sender.id, &format!("Removed user {}.", target.name))
            .await;
        tracing::info!(user = %target, removed_by = %sender.id, "user removed");
        Ok(())
    }

    async fn list_users(&self, sender: &User) -> Result<()> {
        let users = self.store.list_users().await?;
        let mut lines = vec!["Subscribed users:".to_string()];
        lines.extend(users.iter().map(ToString::to_string));
        self.reply(&sender.id, &lines.join("\n")).await;
        Ok(())
    }

    /// Best-effort send: a failed delivery is the transport's problem, never
    /// a reason to abort the rest of a handler's effects.
    pub(crate) async fn reply(&self, recipient: &UserId, text: &str) {
        if let Err(e) = self.notifier.send(recipient, text).await {
            tracing::warn!(recipient = %recipient, error = %e, "failed to deliver message");
        }
    }
}
