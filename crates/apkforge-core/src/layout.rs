//! Fixed filesystem layout of the SDK toolchain and of app project bundles.
//!
//! Once provisioning has succeeded, every dependent tool path is derivable
//! from the SDK root by a fixed relative sub-path; nothing here probes the
//! filesystem beyond the provisioning sentinel.

use std::fs;
use std::path::{Path, PathBuf};

use crate::types::{AppDescriptor, ForgeError};

/// Version tag of the command-line tools archive Google publishes. Archives
/// under this tag have been available since 2017 and self-update in place.
pub const SDK_TOOLS_VERSION: &str = "4333796";

/// Sentinel written only after license acceptance succeeds. Its presence is
/// the provisioner's whole idempotence guard; a crash mid-provisioning leaves
/// no sentinel and the next run starts over.
pub(crate) const PROVISIONED_SENTINEL: &str = ".provisioned";

/// Root of the installed Android SDK plus the fixed relative locations of its
/// bundled tools. Created once per machine, never mutated afterwards.
#[derive(Debug, Clone)]
pub struct SdkLayout {
    root: PathBuf,
}

impl SdkLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Per-user default: `~/.apkforge/tools/android-sdk`.
    pub fn default_root() -> Result<Self, ForgeError> {
        let home = dirs::home_dir()
            .ok_or_else(|| ForgeError::Config("cannot determine the home directory".into()))?;
        Ok(Self::new(
            home.join(".apkforge").join("tools").join("android-sdk"),
        ))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Download cache for SDK archives, next to the SDK root.
    pub fn cache_dir(&self) -> PathBuf {
        self.root
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.root.clone())
    }

    pub fn tools_bin(&self) -> PathBuf {
        self.root.join("tools").join("bin")
    }

    pub fn sdkmanager(&self) -> PathBuf {
        self.tools_bin().join("sdkmanager")
    }

    pub fn avdmanager(&self) -> PathBuf {
        self.tools_bin().join("avdmanager")
    }

    pub fn adb(&self) -> PathBuf {
        self.root.join("platform-tools").join("adb")
    }

    pub fn emulator_dir(&self) -> PathBuf {
        self.root.join("emulator")
    }

    pub fn emulator(&self) -> PathBuf {
        self.emulator_dir().join("emulator")
    }

    pub(crate) fn sentinel(&self) -> PathBuf {
        self.root.join(PROVISIONED_SENTINEL)
    }

    /// True once a prior provisioning run completed, licenses included.
    pub fn is_provisioned(&self) -> bool {
        self.sentinel().is_file()
    }

    /// The SDK tools archive URL for a host OS name (`linux`, `darwin`, or
    /// `windows`).
    pub fn download_url(host_os: &str) -> String {
        format!(
            "https://dl.google.com/android/repository/sdk-tools-{host_os}-{SDK_TOOLS_VERSION}.zip"
        )
    }

    /// Host OS name in the form the archive URL expects.
    pub fn host_os() -> &'static str {
        match std::env::consts::OS {
            "macos" => "darwin",
            "windows" => "windows",
            _ => "linux",
        }
    }
}

/// Resolves per-app paths inside a project directory.
#[derive(Debug, Clone)]
pub struct ProjectLayout {
    base: PathBuf,
}

impl ProjectLayout {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// The gradle project bundle for one app.
    pub fn bundle_dir(&self, app: &AppDescriptor) -> PathBuf {
        self.base.join("android").join(&app.formal_name)
    }

    /// Fixed artifact location; rebuilds overwrite it in place.
    pub fn binary_path(&self, app: &AppDescriptor) -> PathBuf {
        self.bundle_dir(app)
            .join("app")
            .join("build")
            .join("outputs")
            .join("apk")
            .join("debug")
            .join("app-debug.apk")
    }

    /// Store distribution uses the debug APK as-is.
    pub fn distribution_path(&self, app: &AppDescriptor) -> PathBuf {
        self.binary_path(app)
    }
}

/// Sets owner-execute on a file. Extraction and build output do not carry
/// executable bits reliably across platforms; Windows has no bit to fix, so
/// this is a no-op there.
pub(crate) fn mark_executable(path: &Path) -> Result<(), ForgeError> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755))?;
    }
    #[cfg(not(unix))]
    {
        let _ = path;
    }
    Ok(())
}
