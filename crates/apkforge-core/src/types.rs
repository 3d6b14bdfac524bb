//! Core types for apkforge-core.
//!
//! This module defines the types shared across the orchestration pipeline:
//!
//! - [`ForgeError`] - Error taxonomy for provisioning, build, and deployment
//! - [`AppDescriptor`] - Identity of a buildable application

use serde::{Deserialize, Serialize};

/// Error taxonomy for apkforge operations.
///
/// Every stage of the pipeline surfaces failures through this enum. None of
/// the variants are retried internally; re-running the command is the retry
/// path for everything that is retryable at all.
#[derive(Debug, thiserror::Error)]
pub enum ForgeError {
    /// The project was authored against a support runtime this tool cannot
    /// package. There is no in-tool remediation; the runtime has to be
    /// changed externally.
    #[error(
        "found support runtime {found}; Android packaging currently requires runtime {required}"
    )]
    EnvironmentMismatch { found: String, required: String },

    /// The transport layer could not complete a download (connection refused,
    /// DNS failure, timeout). Fatal for this invocation; re-running the
    /// command retries the download.
    #[error("network failure while {0}; check your connection and re-run the command")]
    Network(String),

    /// An external tool exited non-zero or could not be started. Carries the
    /// command line and whatever the tool wrote before failing.
    #[error("{command} failed:\n{output}")]
    Tool { command: String, output: String },

    /// No target device was supplied. The message includes the commands for
    /// listing and creating devices.
    #[error("{0}")]
    MissingTarget(String),

    /// The device bridge does not know the requested device identifier.
    #[error("{0}")]
    DeviceNotFound(String),

    /// The build tool failed for a specific application, with its captured
    /// diagnostic output attached.
    #[error("error while building app {app}:\n{output}")]
    Build { app: String, output: String },

    /// The downloaded SDK archive could not be read or extracted.
    #[error("invalid SDK archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Identity of a buildable application.
///
/// Owned by the project configuration; the orchestration core only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppDescriptor {
    /// Machine-readable app name (e.g. "helloworld").
    pub name: String,
    /// Display name (e.g. "Hello World"); also names the gradle bundle
    /// directory.
    pub formal_name: String,
    /// Reverse-domain bundle prefix (e.g. "com.example").
    pub bundle: String,
}

impl AppDescriptor {
    /// Identity of the installed application on a device, used to address it
    /// for stop and start operations.
    ///
    /// This must match the applicationId the build embeds into the APK; the
    /// generated project bundle guarantees that, hand-edited ones must keep
    /// the two in sync.
    pub fn package_id(&self) -> String {
        format!("{}.{}", self.bundle, self.name)
    }
}
