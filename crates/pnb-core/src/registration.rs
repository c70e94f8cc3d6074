use crate::{
    dispatch::Dispatcher,
    domain::{Role, User, UserId},
    Result,
};

/// Used when the profile lookup fails; a subscription with a bad name beats
/// no subscription.
const PLACEHOLDER_NAME: &str = "New User";

pub const WELCOME_MEMBER_TEXT: &str = "Welcome! You are now subscribed to package \
notifications. Send 'help' to see available commands.";

pub const WELCOME_ADMIN_TEXT: &str = "Welcome! You are now subscribed to package \
notifications as an admin. Send 'help' to see available commands.";

impl Dispatcher {
    /// Provision a new user for a sender that matched a passphrase.
    ///
    /// The dispatcher only calls this for senders the store does not know.
    /// Two concurrent registrations for the same id can still race; the
    /// loser surfaces the store's duplicate-key error to the transport,
    /// which logs and drops the event.
    pub(crate) async fn register(&self, sender_id: &UserId, role: Role) -> Result<()> {
        let name = match self.profiles.resolve_display_name(sender_id).await {
            Ok(name) => name,
            Err(e) => {
                tracing::warn!(sender = %sender_id, error = %e, "profile lookup failed; using placeholder name");
                PLACEHOLDER_NAME.to_string()
            }
        };

        let user = User {
            id: sender_id.clone(),
            name,
            role,
        };
        self.store.add_user(&user).await?;

        let text = match role {
            Role::Member => WELCOME_MEMBER_TEXT,
            Role::Admin => WELCOME_ADMIN_TEXT,
        };
        self.reply(sender_id, text).await;
        tracing::info!(user = %user, "registered new user");
        Ok(())
    }
}
