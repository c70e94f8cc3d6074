/// Core error type.
///
/// Adapter crates map their library errors into this type so the dispatcher
/// can tell the one case it deliberately lets escape (`DuplicateUser`, the
/// registration race) from the ones it turns into user-facing replies.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    /// A user with this id already exists. Raised by the store on the
    /// accepted double-registration race; the transport logs and drops it.
    #[error("duplicate user id: {0}")]
    DuplicateUser(String),

    /// Removal of a user the store does not have.
    #[error("no user with id: {0}")]
    UnknownUser(String),

    #[error("storage error: {0}")]
    Store(String),

    #[error("delivery error: {0}")]
    Delivery(String),

    #[error("profile lookup error: {0}")]
    Profile(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
