//! Command-line interface definitions for the `oscpi` binary.
//!
//! This module centralises the clap parser structures so both the main binary
//! and the build script can reuse them when generating the manual page.

use clap::Parser;

/// Top-level CLI for the `oscpi` binary.
#[derive(Debug, Parser)]
#[command(
    name = "oscpi",
    about = "Provision disks on an OpenStack-compatible cloud",
    arg_required_else_help = true
)]
pub(crate) enum Cli {
    /// Create a detachable data disk and print its identifier.
    #[command(name = "create-disk", about = "Create a data disk")]
    CreateDisk(CreateDiskCommand),
    /// Create a bootable disk from an image and print its identifier.
    #[command(name = "create-boot-disk", about = "Create a boot disk from an image")]
    CreateBootDisk(CreateBootDiskCommand),
    /// Delete a disk and wait until it is gone.
    #[command(name = "delete-disk", about = "Delete a disk")]
    DeleteDisk(DeleteDiskCommand),
    /// Report whether a disk still exists.
    #[command(name = "has-disk", about = "Check whether a disk exists")]
    HasDisk(HasDiskCommand),
}

/// Arguments for the `oscpi create-disk` subcommand.
#[derive(Debug, Parser)]
pub(crate) struct CreateDiskCommand {
    /// Requested size in MiB; rounded up to whole GiB before the request.
    #[arg(long, value_name = "MIB")]
    pub(crate) size_mib: u64,
    /// Provider volume type to request.
    #[arg(long = "type", value_name = "TYPE")]
    pub(crate) volume_type: Option<String>,
    /// Reference server whose availability zone the disk should inherit.
    ///
    /// Inheritance is skipped when `ignore_server_availability_zone` is set
    /// in configuration.
    #[arg(long, value_name = "SERVER_ID")]
    pub(crate) server: Option<String>,
}

/// Arguments for the `oscpi create-boot-disk` subcommand.
#[derive(Debug, Parser)]
pub(crate) struct CreateBootDiskCommand {
    /// Requested size in MiB; rounded up to whole GiB before the request.
    #[arg(long, value_name = "MIB")]
    pub(crate) size_mib: u64,
    /// Source image reference for the boot volume.
    #[arg(long, value_name = "IMAGE_ID")]
    pub(crate) image: String,
    /// Availability zone, passed through to the provider verbatim.
    #[arg(long, value_name = "ZONE")]
    pub(crate) zone: Option<String>,
    /// Provider volume type to request.
    #[arg(long = "type", value_name = "TYPE")]
    pub(crate) volume_type: Option<String>,
}

/// Arguments for the `oscpi delete-disk` subcommand.
#[derive(Debug, Parser)]
pub(crate) struct DeleteDiskCommand {
    /// Identifier of the disk to delete.
    #[arg(value_name = "VOLUME_ID")]
    pub(crate) volume_id: String,
}

/// Arguments for the `oscpi has-disk` subcommand.
#[derive(Debug, Parser)]
pub(crate) struct HasDiskCommand {
    /// Identifier of the disk to look up.
    #[arg(value_name = "VOLUME_ID")]
    pub(crate) volume_id: String,
}
