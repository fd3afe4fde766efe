//! Binary entry point for the `oscpi` CLI.

use std::io::{self, Write};
use std::process;

use clap::Parser;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use oscpi::{
    CloudConfig, CloudError, DiskOptions, DiskProvisioner, OpenStackApi, OpenStackApiError,
};

mod cli;

use cli::{Cli, CreateBootDiskCommand, CreateDiskCommand, DeleteDiskCommand, HasDiskCommand};

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("backend error: {0}")]
    Backend(String),
    #[error("disk operation failed: {0}")]
    Disk(#[from] CloudError<OpenStackApiError>),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let exit_code = match dispatch(cli).await {
        Ok(code) => code,
        Err(err) => {
            report_error(&err);
            1
        }
    };

    process::exit(exit_code);
}

async fn dispatch(cli: Cli) -> Result<i32, CliError> {
    let provisioner = build_provisioner()?;
    match cli {
        Cli::CreateDisk(command) => create_disk(&provisioner, command).await,
        Cli::CreateBootDisk(command) => create_boot_disk(&provisioner, command).await,
        Cli::DeleteDisk(command) => delete_disk(&provisioner, command).await,
        Cli::HasDisk(command) => has_disk(&provisioner, command).await,
    }
}

fn build_provisioner() -> Result<DiskProvisioner<OpenStackApi>, CliError> {
    let config =
        CloudConfig::load_without_cli_args().map_err(|err| CliError::Config(err.to_string()))?;
    let api = OpenStackApi::new(&config).map_err(|err| CliError::Backend(err.to_string()))?;
    Ok(DiskProvisioner::new(api, config.as_settings()))
}

async fn create_disk(
    provisioner: &DiskProvisioner<OpenStackApi>,
    command: CreateDiskCommand,
) -> Result<i32, CliError> {
    let options = DiskOptions {
        volume_type: command.volume_type,
    };
    let volume_id = provisioner
        .create_disk(command.size_mib, &options, command.server.as_deref())
        .await?;
    print_line(&volume_id);
    Ok(0)
}

async fn create_boot_disk(
    provisioner: &DiskProvisioner<OpenStackApi>,
    command: CreateBootDiskCommand,
) -> Result<i32, CliError> {
    let options = DiskOptions {
        volume_type: command.volume_type,
    };
    let volume_id = provisioner
        .create_boot_disk(
            command.size_mib,
            &command.image,
            command.zone.as_deref(),
            &options,
        )
        .await?;
    print_line(&volume_id);
    Ok(0)
}

async fn delete_disk(
    provisioner: &DiskProvisioner<OpenStackApi>,
    command: DeleteDiskCommand,
) -> Result<i32, CliError> {
    provisioner.delete_disk(&command.volume_id).await?;
    Ok(0)
}

async fn has_disk(
    provisioner: &DiskProvisioner<OpenStackApi>,
    command: HasDiskCommand,
) -> Result<i32, CliError> {
    let present = provisioner.has_disk(&command.volume_id).await?;
    print_line(if present { "true" } else { "false" });
    Ok(i32::from(!present))
}

fn print_line(text: &str) {
    writeln!(io::stdout(), "{text}").ok();
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "{err}").ok();
}
