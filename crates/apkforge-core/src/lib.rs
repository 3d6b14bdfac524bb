//! # apkforge-core
//!
//! Orchestration core for packaging Android apps: provisioning the Android
//! SDK, building APKs with gradle, and deploying them to a connected or
//! emulated device over adb.
//!
//! ## Overview
//!
//! The pipeline is strictly sequential and re-entrant:
//!
//! 1. **Verify** - the project's declared support runtime must match the
//!    version this tool can package ([`verify_runtime`])
//! 2. **Provision** - download, extract, and license the SDK under a fixed
//!    per-user root, skipping everything when a prior run completed
//!    ([`SdkProvisioner`])
//! 3. **Build** - drive `gradlew assembleDebug` against the app's project
//!    bundle with the SDK location injected ([`ApkBuilder`])
//! 4. **Deploy** - install, force-stop, and start the app on one device
//!    ([`AdbDeployer`])
//!
//! External tools are reached through two capability interfaces,
//! [`ToolRunner`] for subprocesses and [`Fetcher`] for downloads, so command
//! handlers receive their collaborators explicitly and tests can substitute
//! recording fakes.
//!
//! ## Caller responsibilities
//!
//! Everything blocks until the driven tool finishes; there is no cancellation
//! and no internal retry (re-invoking a command is the retry path). The SDK
//! root, the artifact location, and the target device are treated as singly
//! owned per invocation; concurrent invocations against the same toolchain
//! or device are not locked against.

pub mod build;
pub mod deploy;
pub mod exec;
pub mod fetch;
pub mod layout;
pub mod provision;
pub mod scaffold;
pub mod types;

#[cfg(test)]
pub(crate) mod testutil;

pub use build::{ApkBuilder, SDK_ROOT_ENV};
pub use deploy::{AdbDeployer, MAIN_ACTIVITY};
pub use exec::{ProcessRunner, ToolInvocation, ToolOutput, ToolRunner, overlay_env};
pub use fetch::{Fetcher, HttpFetcher};
pub use layout::{ProjectLayout, SdkLayout};
pub use provision::{SUPPORTED_RUNTIME, SdkProvisioner, verify_runtime};
pub use types::{AppDescriptor, ForgeError};
