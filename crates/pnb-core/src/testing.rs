//! In-memory port implementations for the core tests.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;
use chrono::{Local, NaiveDate};

use crate::{
    dispatch::{Dispatcher, Passphrases},
    domain::{Package, PackageIdAllocator, Role, User, UserId},
    errors::Error,
    events::InboundMessage,
    ports::{NotifierPort, ProfilePort, StorePort},
    Result,
};

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn msg(sender_id: &str, text: &str) -> InboundMessage {
    InboundMessage {
        sender_id: sender_id.to_string(),
        text: Some(text.to_string()),
        has_attachment: false,
    }
}

/// Dispatcher wired to the in-memory ports, with the allocator seeded at 100
/// so allocated ids are easy to tell apart from fixture ids.
pub fn dispatcher(
    store: Arc<MemStore>,
    notifier: Arc<RecordingNotifier>,
    profiles: Arc<StubProfiles>,
) -> Dispatcher {
    Dispatcher::new(
        store,
        notifier,
        profiles,
        Arc::new(PackageIdAllocator::seeded(100)),
        Passphrases {
            member: "hedwig".to_string(),
            admin: "errol".to_string(),
        },
    )
}

#[derive(Default)]
pub struct MemStore {
    pub users: Mutex<HashMap<String, User>>,
    pub packages: Mutex<HashMap<i64, Package>>,
}

impl MemStore {
    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn with(users: Vec<User>, packages: Vec<Package>) -> Arc<Self> {
        let store = Self::default();
        {
            let mut map = store.users.lock().unwrap();
            for user in users {
                map.insert(user.id.0.clone(), user);
            }
        }
        {
            let mut map = store.packages.lock().unwrap();
            for package in packages {
                map.insert(package.id, package);
            }
        }
        store.into_arc()
    }

    fn users_sorted(&self) -> Vec<User> {
        let mut users: Vec<User> = self.users.lock().unwrap().values().cloned().collect();
        users.sort_by(|a, b| a.id.0.cmp(&b.id.0));
        users
    }
}

#[async_trait]
impl StorePort for MemStore {
    async fn find_user(&self, id: &UserId) -> Result<Option<User>> {
        Ok(self.users.lock().unwrap().get(&id.0).cloned())
    }

    async fn find_user_by_name(&self, name: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        Ok(self.users_sorted())
    }

    async fn list_admins(&self) -> Result<Vec<User>> {
        Ok(self
            .users_sorted()
            .into_iter()
            .filter(|u| u.role == Role::Admin)
            .collect())
    }

    async fn add_user(&self, user: &User) -> Result<()> {
        let mut users = self.users.lock().unwrap();
        if users.contains_key(&user.id.0) {
            return Err(Error::DuplicateUser(user.id.0.clone()));
        }
        users.insert(user.id.0.clone(), user.clone());
        Ok(())
    }

    async fn remove_user(&self, user: &User) -> Result<()> {
        self.users
            .lock()
            .unwrap()
            .remove(&user.id.0)
            .map(|_| ())
            .ok_or_else(|| Error::UnknownUser(user.id.0.clone()))
    }

    async fn find_package(&self, id: i64) -> Result<Option<Package>> {
        Ok(self.packages.lock().unwrap().get(&id).cloned())
    }

    async fn add_package(&self, package: &Package) -> Result<()> {
        self.packages
            .lock()
            .unwrap()
            .insert(package.id, package.clone());
        Ok(())
    }

    async fn list_uncollected_packages(&self) -> Result<Vec<Package>> {
        let mut packages: Vec<Package> = self
            .packages
            .lock()
            .unwrap()
            .values()
            .filter(|p| !p.collected)
            .cloned()
            .collect();
        packages.sort_by_key(|p| p.id);
        Ok(packages)
    }

    async fn mark_collected(&self, package: &Package) -> Result<()> {
        if let Some(stored) = self.packages.lock().unwrap().get_mut(&package.id) {
            stored.collected = true;
        }
        Ok(())
    }

    async fn max_package_id(&self) -> Result<i64> {
        Ok(self
            .packages
            .lock()
            .unwrap()
            .keys()
            .copied()
            .max()
            .unwrap_or(0))
    }
}

/// Records every delivery attempt; optionally fails the first one to check
/// that reply loops keep going.
#[derive(Default)]
pub struct RecordingNotifier {
    delivered: Mutex<Vec<(String, String)>>,
    attempts: AtomicUsize,
    fail_first: AtomicBool,
}

impl RecordingNotifier {
    pub fn failing_first() -> Arc<Self> {
        let notifier = Self::default();
        notifier.fail_first.store(true, Ordering::SeqCst);
        Arc::new(notifier)
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.delivered.lock().unwrap().clone()
    }

    pub fn sent_to(&self, recipient: &str) -> Vec<String> {
        self.delivered
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| id == recipient)
            .map(|(_, text)| text.clone())
            .collect()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NotifierPort for RecordingNotifier {
    async fn send(&self, recipient: &UserId, text: &str) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_first.swap(false, Ordering::SeqCst) {
            return Err(Error::Delivery("injected failure".to_string()));
        }
        self.delivered
            .lock()
            .unwrap()
            .push((recipient.0.clone(), text.to_string()));
        Ok(())
    }
}

pub struct StubProfiles {
    names: HashMap<String, String>,
    fail: bool,
}

impl StubProfiles {
    pub fn empty() -> Arc<Self> {
        Arc::new(Self {
            names: HashMap::new(),
            fail: false,
        })
    }

    pub fn with_name(id: &str, name: &str) -> Arc<Self> {
        let mut names = HashMap::new();
        names.insert(id.to_string(), name.to_string());
        Arc::new(Self { names, fail: false })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            names: HashMap::new(),
            fail: true,
        })
    }
}

#[async_trait]
impl ProfilePort for StubProfiles {
    async fn resolve_display_name(&self, id: &UserId) -> Result<String> {
        if self.fail {
            return Err(Error::Profile("injected failure".to_string()));
        }
        self.names
            .get(&id.0)
            .cloned()
            .ok_or_else(|| Error::Profile(format!("no profile for {id}")))
    }
}
