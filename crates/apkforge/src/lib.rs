//! # apkforge
//!
//! Command-line orchestrator for packaging Android apps. It sequences the
//! external tools (gradle, adb, sdkmanager) through `apkforge-core`:
//!
//! ```bash
//! # Generate the gradle project bundle for the app
//! apkforge create
//!
//! # Build the debug APK
//! apkforge build
//!
//! # Install and launch on a device
//! apkforge run -d emulator-5554
//! ```
//!
//! Every command verifies the environment first (supported runtime, then a
//! provisioned SDK) and surfaces failures as a single human-readable
//! message. There are no automatic retries; re-running the command is the
//! retry path.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use apkforge_core::{
    AdbDeployer, ApkBuilder, AppDescriptor, Fetcher, HttpFetcher, MAIN_ACTIVITY, ProcessRunner,
    ProjectLayout, SdkLayout, SdkProvisioner, ToolRunner, scaffold, verify_runtime,
};

use config::ProjectConfig;

pub mod config;

/// Android provisioning, build, and deployment orchestrator.
#[derive(Parser, Debug)]
#[command(name = "apkforge", author, version, about = "Build and deploy Android apps", long_about = None)]
struct Cli {
    /// Print verbose output including all external commands
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the Android project bundle for the app.
    Create,
    /// Build the Android APK.
    Build {
        /// Optional output path for a JSON build receipt
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Run the app on a connected or emulated device.
    Run {
        /// The device to target, formatted for adb
        #[arg(long, short = 'd')]
        device: Option<String>,
        /// Optional output path for a JSON run receipt
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Resolve the distributable artifact for store packaging.
    Package,
    /// Hand the artifact off to store tooling.
    Publish,
}

/// Shared capabilities every command handler receives explicitly.
pub struct Services {
    pub runner: Box<dyn ToolRunner>,
    pub fetcher: Box<dyn Fetcher>,
    pub sdk: SdkLayout,
    pub verbose: bool,
}

impl Services {
    /// Production wiring: blocking subprocesses, HTTP downloads, and the
    /// per-user SDK root.
    pub fn from_host(verbose: bool) -> Result<Self> {
        Ok(Self {
            runner: Box::new(ProcessRunner::new(verbose)),
            fetcher: Box::new(HttpFetcher::new()),
            sdk: SdkLayout::default_root()?,
            verbose,
        })
    }
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let services = Services::from_host(cli.verbose)?;
    let (config, config_path) = ProjectConfig::discover()?;
    let project_dir = config_path
        .parent()
        .context("config file has no parent directory")?;
    let project = ProjectLayout::new(project_dir);
    let app = config.descriptor();

    match cli.command {
        Command::Create => cmd_create(&services, &config, &project, &app),
        Command::Build { report } => {
            cmd_build(&services, &config, &project, &app, report.as_deref())
        }
        Command::Run { device, report } => cmd_run(
            &services,
            &config,
            &project,
            &app,
            device.as_deref(),
            report.as_deref(),
        ),
        Command::Package => cmd_package(&project, &app),
        Command::Publish => cmd_publish(&project, &app),
    }
}

fn provisioner<'a>(services: &'a Services) -> SdkProvisioner<'a> {
    SdkProvisioner::new(
        services.sdk.clone(),
        services.fetcher.as_ref(),
        services.runner.as_ref(),
    )
    .verbose(services.verbose)
}

/// Environment preconditions every command shares: a supported runtime,
/// then a provisioned SDK. Nothing is downloaded when the runtime check
/// fails.
fn verify_tools(services: &Services, config: &ProjectConfig) -> Result<()> {
    verify_runtime(&config.app.runtime)?;
    provisioner(services).ensure()?;
    Ok(())
}

fn cmd_create(
    services: &Services,
    config: &ProjectConfig,
    project: &ProjectLayout,
    app: &AppDescriptor,
) -> Result<()> {
    verify_tools(services, config)?;
    let bundle = scaffold::generate_bundle(app, project)?;
    println!("[{}] Created {}", app.name, bundle.display());
    Ok(())
}

fn cmd_build(
    services: &Services,
    config: &ProjectConfig,
    project: &ProjectLayout,
    app: &AppDescriptor,
    report: Option<&Path>,
) -> Result<()> {
    verify_tools(services, config)?;
    let builder = ApkBuilder::new(&services.sdk, project, services.runner.as_ref());
    let artifact = builder.build(app)?;
    println!("[{}] Built {}", app.name, artifact.display());
    if let Some(path) = report {
        write_report(path, &receipt(app, &artifact, None))?;
    }
    Ok(())
}

fn cmd_run(
    services: &Services,
    config: &ProjectConfig,
    project: &ProjectLayout,
    app: &AppDescriptor,
    device: Option<&str>,
    report: Option<&Path>,
) -> Result<()> {
    verify_tools(services, config)?;
    provisioner(services).ensure_components()?;

    let artifact = project.binary_path(app);
    if !artifact.is_file() {
        bail!(
            "no built APK at {}; run `apkforge build` first",
            artifact.display()
        );
    }

    let deployer = AdbDeployer::new(&services.sdk, services.runner.as_ref());
    deployer.deploy(device, &artifact, &app.package_id(), MAIN_ACTIVITY)?;
    println!("[{}] Started {}", app.name, app.package_id());
    if let Some(path) = report {
        write_report(path, &receipt(app, &artifact, device))?;
    }
    Ok(())
}

fn cmd_package(project: &ProjectLayout, app: &AppDescriptor) -> Result<()> {
    let artifact = resolve_distribution(project, app)?;
    println!("[{}] Distribution artifact: {}", app.name, artifact.display());
    Ok(())
}

fn cmd_publish(project: &ProjectLayout, app: &AppDescriptor) -> Result<()> {
    let artifact = resolve_distribution(project, app)?;
    println!(
        "[{}] Publishing is handled by the store tooling; upload {}",
        app.name,
        artifact.display()
    );
    Ok(())
}

fn resolve_distribution(project: &ProjectLayout, app: &AppDescriptor) -> Result<PathBuf> {
    let artifact = project.distribution_path(app);
    if !artifact.is_file() {
        bail!(
            "no built APK at {}; run `apkforge build` first",
            artifact.display()
        );
    }
    Ok(artifact)
}

/// Machine-readable record of a completed build or run.
#[derive(Debug, Serialize)]
struct Receipt {
    app: String,
    package: String,
    artifact: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    device: Option<String>,
    generated_at: String,
}

fn receipt(app: &AppDescriptor, artifact: &Path, device: Option<&str>) -> Receipt {
    let generated_at = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "unknown".to_string());
    Receipt {
        app: app.name.clone(),
        package: app.package_id(),
        artifact: artifact.to_path_buf(),
        device: device.map(ToOwned::to_owned),
        generated_at,
    }
}

fn write_report(path: &Path, receipt: &Receipt) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {}", parent.display()))?;
    }
    let contents = serde_json::to_string_pretty(receipt).context("serializing receipt")?;
    fs::write(path, contents).with_context(|| format!("writing receipt {}", path.display()))?;
    Ok(())
}
