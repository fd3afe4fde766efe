//! Disk provisioning operations for the CPI surface.
//!
//! The provisioning workflow validates the requested size, resolves
//! availability-zone policy, issues one volume-create call through the
//! [`CloudApi`] seam, and polls the created volume until the provider
//! reports it `available`. Deletion mirrors the flow: one delete call, then
//! polling until the volume disappears.

use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::time::sleep;
use tracing::debug;
use uuid::Uuid;

use crate::api::{CloudApi, DiskOptions, VolumeParams, VolumeStatus};

const MIB_PER_GIB: u64 = 1024;
const MIN_DISK_SIZE_GIB: u64 = 1;
const MAX_DISK_SIZE_GIB: u64 = 1024;
const POLL_INTERVAL: Duration = Duration::from_secs(5);
const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(300);

/// Errors surfaced while provisioning or removing disks.
#[derive(Debug, Error)]
pub enum CloudError<ApiError>
where
    ApiError: std::error::Error + 'static,
{
    /// Raised when the rounded size falls below the provider minimum.
    #[error("Minimum disk size is 1 GiB")]
    BelowMinimumSize,
    /// Raised when the rounded size exceeds the provider maximum.
    #[error("Maximum disk size is 1 TiB")]
    AboveMaximumSize,
    /// Remote-backend failure, passed through unchanged.
    #[error(transparent)]
    Api(ApiError),
    /// Raised when a volume settles in a state it cannot recover from.
    #[error("volume {volume_id} entered state {status} while waiting for {target}")]
    UnexpectedStatus {
        /// Volume being waited on.
        volume_id: String,
        /// State the provider reported.
        status: VolumeStatus,
        /// State the waiter needed.
        target: VolumeStatus,
    },
    /// Raised when a wait loop exhausts its deadline.
    #[error("timeout waiting for {action} on volume {volume_id}")]
    Timeout {
        /// Action being waited on.
        action: String,
        /// Volume being waited on.
        volume_id: String,
    },
    /// Raised when deletion leaves the volume visible in the API.
    #[error("volume {volume_id} still present after deletion")]
    ResidualVolume {
        /// Volume that should have disappeared.
        volume_id: String,
    },
}

/// Produces the unique token embedded in generated display names.
pub trait NameGenerator {
    /// Returns a fresh token; successive calls must not repeat.
    fn unique_name(&self) -> String;
}

/// Default generator backed by UUIDv4.
#[derive(Clone, Copy, Debug, Default)]
pub struct UuidNames;

impl NameGenerator for UuidNames {
    fn unique_name(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Immutable adapter-wide settings, fixed at construction.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DiskSettings {
    /// When set, data disks never inherit the availability zone of their
    /// reference server and no server lookup is performed.
    pub ignore_server_availability_zone: bool,
    /// Deadline for the poll-until-ready and poll-until-gone loops.
    pub wait_timeout: Duration,
}

impl Default for DiskSettings {
    fn default() -> Self {
        Self {
            ignore_server_availability_zone: false,
            wait_timeout: DEFAULT_WAIT_TIMEOUT,
        }
    }
}

/// Provisions disks through a [`CloudApi`] implementation.
#[derive(Clone, Debug)]
pub struct DiskProvisioner<A, N = UuidNames> {
    api: A,
    names: N,
    ignore_server_availability_zone: bool,
    poll_interval: Duration,
    wait_timeout: Duration,
}

impl<A: CloudApi> DiskProvisioner<A> {
    /// Creates a provisioner with the default UUID name generator.
    #[must_use]
    pub const fn new(api: A, settings: DiskSettings) -> Self {
        Self {
            api,
            names: UuidNames,
            ignore_server_availability_zone: settings.ignore_server_availability_zone,
            poll_interval: POLL_INTERVAL,
            wait_timeout: settings.wait_timeout,
        }
    }
}

impl<A, N> DiskProvisioner<A, N>
where
    A: CloudApi,
    N: NameGenerator,
{
    /// Substitutes the unique-name generator, keeping everything else.
    #[must_use]
    pub fn with_name_generator<M: NameGenerator>(self, names: M) -> DiskProvisioner<A, M> {
        DiskProvisioner {
            api: self.api,
            names,
            ignore_server_availability_zone: self.ignore_server_availability_zone,
            poll_interval: self.poll_interval,
            wait_timeout: self.wait_timeout,
        }
    }

    /// Overrides the polling interval.
    ///
    /// This is primarily used by tests to keep wait scenarios fast.
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Overrides the wait deadline.
    ///
    /// This is primarily used by tests to keep timeout scenarios fast.
    #[must_use]
    pub const fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }

    /// Creates a detachable data disk and returns its identifier.
    ///
    /// `size_mib` is rounded up to whole GiB. When `server_id` is supplied
    /// and zone inheritance is enabled (the default), the disk lands in the
    /// reference server's availability zone.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::BelowMinimumSize`] or
    /// [`CloudError::AboveMaximumSize`] when the rounded size leaves
    /// [1 GiB, 1 TiB], [`CloudError::Api`] when a remote call fails, and a
    /// wait error when the volume never reaches `available`.
    pub async fn create_disk(
        &self,
        size_mib: u64,
        options: &DiskOptions,
        server_id: Option<&str>,
    ) -> Result<String, CloudError<A::Error>> {
        let size = rounded_size_gib(size_mib)?;
        let params = VolumeParams {
            display_name: self.display_name(),
            display_description: Some(String::new()),
            size,
            volume_type: options.volume_type.clone(),
            image_ref: None,
            availability_zone: self.inherited_zone(server_id).await?,
        };
        self.create_and_wait(params).await
    }

    /// Creates a bootable disk from `image_id` and returns its identifier.
    ///
    /// The availability zone, when supplied, is attached verbatim; no server
    /// lookup takes place and the zone is not validated against the backend.
    ///
    /// # Errors
    ///
    /// Same contract as [`Self::create_disk`].
    pub async fn create_boot_disk(
        &self,
        size_mib: u64,
        image_id: &str,
        availability_zone: Option<&str>,
        options: &DiskOptions,
    ) -> Result<String, CloudError<A::Error>> {
        let size = rounded_size_gib(size_mib)?;
        let params = VolumeParams {
            display_name: self.display_name(),
            display_description: None,
            size,
            volume_type: options.volume_type.clone(),
            image_ref: Some(image_id.to_owned()),
            availability_zone: availability_zone.map(str::to_owned),
        };
        self.create_and_wait(params).await
    }

    /// Deletes a disk and waits until the provider no longer reports it.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::Api`] when the delete call fails and
    /// [`CloudError::ResidualVolume`] when the volume remains visible at the
    /// deadline.
    pub async fn delete_disk(&self, volume_id: &str) -> Result<(), CloudError<A::Error>> {
        debug!(volume_id, "deleting volume");
        self.api
            .delete_volume(volume_id)
            .await
            .map_err(CloudError::Api)?;
        self.wait_until_gone(volume_id).await
    }

    /// Reports whether the provider still knows the given disk.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::Api`] when the lookup fails.
    pub async fn has_disk(&self, volume_id: &str) -> Result<bool, CloudError<A::Error>> {
        let volume = self
            .api
            .get_volume(volume_id)
            .await
            .map_err(CloudError::Api)?;
        Ok(volume.is_some())
    }

    fn display_name(&self) -> String {
        format!("volume-{}", self.names.unique_name())
    }

    async fn inherited_zone(
        &self,
        server_id: Option<&str>,
    ) -> Result<Option<String>, CloudError<A::Error>> {
        let Some(server_id) = server_id else {
            return Ok(None);
        };
        if self.ignore_server_availability_zone {
            return Ok(None);
        }
        let server = self
            .api
            .get_server(server_id)
            .await
            .map_err(CloudError::Api)?;
        Ok(server.availability_zone)
    }

    async fn create_and_wait(&self, params: VolumeParams) -> Result<String, CloudError<A::Error>> {
        debug!(
            display_name = %params.display_name,
            size_gib = params.size,
            zone = params.availability_zone.as_deref().unwrap_or("-"),
            "creating volume"
        );
        let volume = self
            .api
            .create_volume(&params)
            .await
            .map_err(CloudError::Api)?;
        self.wait_until_available(&volume.id).await?;
        debug!(volume_id = %volume.id, "volume available");
        Ok(volume.id)
    }

    async fn wait_until_available(&self, volume_id: &str) -> Result<(), CloudError<A::Error>> {
        let deadline = Instant::now() + self.wait_timeout;
        while Instant::now() <= deadline {
            let Some(volume) = self
                .api
                .get_volume(volume_id)
                .await
                .map_err(CloudError::Api)?
            else {
                sleep(self.poll_interval).await;
                continue;
            };

            match volume.status {
                VolumeStatus::Available => return Ok(()),
                VolumeStatus::Error => {
                    return Err(CloudError::UnexpectedStatus {
                        volume_id: volume_id.to_owned(),
                        status: VolumeStatus::Error,
                        target: VolumeStatus::Available,
                    });
                }
                _ => sleep(self.poll_interval).await,
            }
        }

        Err(CloudError::Timeout {
            action: String::from("wait_until_available"),
            volume_id: volume_id.to_owned(),
        })
    }

    async fn wait_until_gone(&self, volume_id: &str) -> Result<(), CloudError<A::Error>> {
        let deadline = Instant::now() + self.wait_timeout;
        while Instant::now() <= deadline {
            if self
                .api
                .get_volume(volume_id)
                .await
                .map_err(CloudError::Api)?
                .is_none()
            {
                return Ok(());
            }
            sleep(self.poll_interval).await;
        }

        Err(CloudError::ResidualVolume {
            volume_id: volume_id.to_owned(),
        })
    }
}

fn rounded_size_gib<E>(size_mib: u64) -> Result<u64, CloudError<E>>
where
    E: std::error::Error + 'static,
{
    let size_gib = size_mib.div_ceil(MIB_PER_GIB);
    if size_gib < MIN_DISK_SIZE_GIB {
        return Err(CloudError::BelowMinimumSize);
    }
    if size_gib > MAX_DISK_SIZE_GIB {
        return Err(CloudError::AboveMaximumSize);
    }
    Ok(size_gib)
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use super::*;

    fn rounded(size_mib: u64) -> Result<u64, CloudError<Infallible>> {
        rounded_size_gib(size_mib)
    }

    #[test]
    fn rounds_exact_multiples_without_change() {
        assert!(matches!(rounded(1024), Ok(1)));
        assert!(matches!(rounded(2048), Ok(2)));
        assert!(matches!(rounded(1024 * 1024), Ok(1024)));
    }

    #[test]
    fn rounds_fractional_remainders_up() {
        assert!(matches!(rounded(2049), Ok(3)));
        assert!(matches!(rounded(1025), Ok(2)));
    }

    #[test]
    fn rejects_sizes_below_one_gib() {
        let error = rounded(100).expect_err("must reject");
        assert_eq!(error.to_string(), "Minimum disk size is 1 GiB");
        assert!(matches!(rounded(0), Err(CloudError::BelowMinimumSize)));
    }

    #[test]
    fn rejects_sizes_above_one_tib() {
        let error = rounded(2000 * 1024).expect_err("must reject");
        assert_eq!(error.to_string(), "Maximum disk size is 1 TiB");
        assert!(matches!(
            rounded(1024 * 1024 + 1),
            Err(CloudError::AboveMaximumSize)
        ));
    }

    #[test]
    fn uuid_names_do_not_repeat() {
        let names = UuidNames;
        assert_ne!(names.unique_name(), names.unique_name());
    }
}
