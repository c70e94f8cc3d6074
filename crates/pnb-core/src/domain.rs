use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::NaiveDate;

/// Messaging-platform user id (opaque, stable).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Closed role set. Gated commands match on this exhaustively so a new role
/// becomes a compile error at every gate, not a silently-open door.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    Member,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Member => f.write_str("member"),
            Self::Admin => f.write_str("admin"),
        }
    }
}

/// A subscribed user. `id` is the natural key; equality is on all fields.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub role: Role,
}

impl User {
    pub fn member(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: UserId(id.into()),
            name: name.into(),
            role: Role::Member,
        }
    }

    pub fn admin(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: UserId(id.into()),
            name: name.into(),
            role: Role::Admin,
        }
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(User {}, id {}, {})", self.name, self.id, self.role)
    }
}

/// A package awaiting (or past) pickup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Package {
    pub id: i64,
    pub code: String,
    pub received: NaiveDate,
    pub collected: bool,
}

impl Package {
    pub fn new(id: i64, code: impl Into<String>, received: NaiveDate) -> Self {
        Self {
            id,
            code: code.into(),
            received,
            collected: false,
        }
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(Package {}, code {}, received {}, collected {})",
            self.id, self.code, self.received, self.collected
        )
    }
}

/// Process-wide package-id allocator.
///
/// Seeded exactly once at startup from the store's current maximum id so ids
/// stay strictly increasing across restarts. Allocation is a single atomic
/// increment; the store remains the source of truth for persisted ids.
#[derive(Debug)]
pub struct PackageIdAllocator {
    next: AtomicI64,
}

impl PackageIdAllocator {
    pub fn seeded(max_persisted_id: i64) -> Self {
        Self {
            next: AtomicI64::new(max_persisted_id + 1),
        }
    }

    pub fn next(&self) -> i64 {
        self.next.fetch_add(1, Ordering::SeqCst)
    }
}
