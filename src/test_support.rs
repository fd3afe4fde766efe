//! Test support utilities shared across unit and integration tests.

use std::collections::{HashMap, VecDeque};
use std::env;
use std::ffi::OsString;
use std::sync::{Arc, Mutex, MutexGuard as StdMutexGuard};

use tokio::sync::{Mutex as AsyncMutex, MutexGuard};

use crate::api::{ApiFuture, CloudApi, ServerRecord, VolumeParams, VolumeRecord, VolumeStatus};
use crate::disk::NameGenerator;
use crate::openstack::OpenStackApiError;

fn lock<T>(mutex: &Mutex<T>) -> StdMutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Scripted cloud API double that returns pre-seeded outcomes in FIFO order
/// and records every call it receives.
///
/// Used to drive deterministic provisioning outcomes without network access.
#[derive(Clone, Debug, Default)]
pub struct ScriptedCloud {
    create_responses: Arc<Mutex<VecDeque<Result<VolumeRecord, OpenStackApiError>>>>,
    lookup_responses: Arc<Mutex<VecDeque<Result<Option<VolumeRecord>, OpenStackApiError>>>>,
    delete_responses: Arc<Mutex<VecDeque<Result<(), OpenStackApiError>>>>,
    servers: Arc<Mutex<HashMap<String, ServerRecord>>>,
    create_calls: Arc<Mutex<Vec<VolumeParams>>>,
    lookup_calls: Arc<Mutex<Vec<String>>>,
    delete_calls: Arc<Mutex<Vec<String>>>,
    server_calls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedCloud {
    /// Creates a double with no queued responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful create response for a volume with the given id and
    /// status.
    pub fn push_created(&self, volume_id: &str, status: &str) {
        lock(&self.create_responses).push_back(Ok(volume_record(volume_id, status)));
    }

    /// Queues a failing create response.
    pub fn push_create_error(&self, error: OpenStackApiError) {
        lock(&self.create_responses).push_back(Err(error));
    }

    /// Queues a lookup response observing the volume in the given status.
    pub fn push_lookup(&self, volume_id: &str, status: &str) {
        lock(&self.lookup_responses).push_back(Ok(Some(volume_record(volume_id, status))));
    }

    /// Queues a lookup response where the provider no longer knows the volume.
    pub fn push_lookup_gone(&self) {
        lock(&self.lookup_responses).push_back(Ok(None));
    }

    /// Queues a failing lookup response.
    pub fn push_lookup_error(&self, error: OpenStackApiError) {
        lock(&self.lookup_responses).push_back(Err(error));
    }

    /// Queues a failing delete response. Deletes succeed by default.
    pub fn push_delete_error(&self, error: OpenStackApiError) {
        lock(&self.delete_responses).push_back(Err(error));
    }

    /// Registers a server for zone-inheritance lookups.
    pub fn insert_server(&self, server_id: &str, availability_zone: Option<&str>) {
        lock(&self.servers).insert(
            server_id.to_owned(),
            ServerRecord {
                id: server_id.to_owned(),
                availability_zone: availability_zone.map(str::to_owned),
            },
        );
    }

    /// Returns the parameters of every create call recorded so far.
    #[must_use]
    pub fn create_calls(&self) -> Vec<VolumeParams> {
        lock(&self.create_calls).clone()
    }

    /// Returns the volume ids of every lookup recorded so far.
    #[must_use]
    pub fn lookup_calls(&self) -> Vec<String> {
        lock(&self.lookup_calls).clone()
    }

    /// Returns the volume ids of every delete recorded so far.
    #[must_use]
    pub fn delete_calls(&self) -> Vec<String> {
        lock(&self.delete_calls).clone()
    }

    /// Returns the server ids of every server fetch recorded so far.
    #[must_use]
    pub fn server_calls(&self) -> Vec<String> {
        lock(&self.server_calls).clone()
    }
}

fn volume_record(volume_id: &str, status: &str) -> VolumeRecord {
    VolumeRecord {
        id: volume_id.to_owned(),
        status: VolumeStatus::from(status.to_owned()),
        availability_zone: None,
    }
}

impl CloudApi for ScriptedCloud {
    type Error = OpenStackApiError;

    fn create_volume<'a>(
        &'a self,
        params: &'a VolumeParams,
    ) -> ApiFuture<'a, VolumeRecord, Self::Error> {
        Box::pin(async move {
            lock(&self.create_calls).push(params.clone());
            lock(&self.create_responses)
                .pop_front()
                .unwrap_or_else(|| {
                    Err(OpenStackApiError::Provider {
                        message: String::from("no scripted create response available"),
                    })
                })
        })
    }

    fn get_volume<'a>(
        &'a self,
        volume_id: &'a str,
    ) -> ApiFuture<'a, Option<VolumeRecord>, Self::Error> {
        Box::pin(async move {
            lock(&self.lookup_calls).push(volume_id.to_owned());
            lock(&self.lookup_responses).pop_front().unwrap_or(Ok(None))
        })
    }

    fn delete_volume<'a>(&'a self, volume_id: &'a str) -> ApiFuture<'a, (), Self::Error> {
        Box::pin(async move {
            lock(&self.delete_calls).push(volume_id.to_owned());
            lock(&self.delete_responses).pop_front().unwrap_or(Ok(()))
        })
    }

    fn get_server<'a>(&'a self, server_id: &'a str) -> ApiFuture<'a, ServerRecord, Self::Error> {
        Box::pin(async move {
            lock(&self.server_calls).push(server_id.to_owned());
            lock(&self.servers).get(server_id).cloned().ok_or_else(|| {
                OpenStackApiError::ServerNotFound {
                    server_id: server_id.to_owned(),
                }
            })
        })
    }
}

/// Name generator that always returns the same token, so tests can assert
/// exact display names.
#[derive(Clone, Debug)]
pub struct FixedNames {
    token: String,
}

impl FixedNames {
    /// Creates a generator returning `token` on every call.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl NameGenerator for FixedNames {
    fn unique_name(&self) -> String {
        self.token.clone()
    }
}

/// Global mutex used to serialise environment mutation in tests.
pub static ENV_LOCK: AsyncMutex<()> = AsyncMutex::const_new(());

/// Guard that holds the env mutex and cleans up variables on drop.
pub struct EnvGuard {
    previous: Vec<(String, Option<OsString>)>,
    _guard: MutexGuard<'static, ()>,
}

impl EnvGuard {
    /// Sets multiple environment variables while holding a global mutex.
    pub async fn set_vars(pairs: &[(&str, &str)]) -> Self {
        let guard = ENV_LOCK.lock().await;
        let mut previous = Vec::with_capacity(pairs.len());
        for (key, value) in pairs {
            let old = env::var_os(key);
            // SAFETY: Environment mutation is serialised by `ENV_LOCK`, preventing races.
            unsafe { env::set_var(key, value) };
            previous.push(((*key).to_owned(), old));
        }

        Self {
            previous,
            _guard: guard,
        }
    }

    /// Sets a single environment variable while holding the global mutex.
    pub async fn set_var(key: &str, value: &str) -> Self {
        Self::set_vars(&[(key, value)]).await
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, old) in &self.previous {
            // SAFETY: Environment mutation is serialised by holding `_guard`.
            unsafe {
                match old {
                    Some(val) => env::set_var(key, val),
                    None => env::remove_var(key),
                }
            }
        }
    }
}
