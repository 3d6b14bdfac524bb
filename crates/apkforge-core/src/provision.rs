//! SDK provisioning: download, extract, fix permissions, accept licenses.
//!
//! The pipeline is re-entrant. Completion is recorded by a sentinel file
//! written only after license acceptance succeeds, so a run that crashed
//! mid-extraction is re-provisioned from the start on the next invocation
//! (the download and extraction both overwrite).

use std::fs;
use std::path::Path;

use crate::exec::{ToolInvocation, ToolRunner};
use crate::fetch::Fetcher;
use crate::layout::{SDK_TOOLS_VERSION, SdkLayout, mark_executable};
use crate::types::ForgeError;

/// Support runtime version the bundled app template embeds. Projects
/// declaring any other runtime cannot be packaged until the template catches
/// up.
pub const SUPPORTED_RUNTIME: &str = "3.7";

/// Components the run pathway needs on top of the base SDK tools.
const EMULATOR_COMPONENTS: [&str; 4] = [
    "platforms;android-28",
    "system-images;android-28;default;x86",
    "emulator",
    "platform-tools",
];

/// Checks the project's declared support runtime against the version this
/// tool can package. Nothing is downloaded or executed on mismatch.
pub fn verify_runtime(found: &str) -> Result<(), ForgeError> {
    if found != SUPPORTED_RUNTIME {
        return Err(ForgeError::EnvironmentMismatch {
            found: found.to_string(),
            required: SUPPORTED_RUNTIME.to_string(),
        });
    }
    Ok(())
}

/// Installs and licenses the Android SDK under a fixed per-user root.
pub struct SdkProvisioner<'a> {
    layout: SdkLayout,
    fetcher: &'a dyn Fetcher,
    runner: &'a dyn ToolRunner,
    verbose: bool,
}

impl<'a> SdkProvisioner<'a> {
    pub fn new(layout: SdkLayout, fetcher: &'a dyn Fetcher, runner: &'a dyn ToolRunner) -> Self {
        Self {
            layout,
            fetcher,
            runner,
            verbose: false,
        }
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn layout(&self) -> &SdkLayout {
        &self.layout
    }

    /// Ensures the SDK is installed and licensed. Idempotent: returns
    /// immediately, with no filesystem or network activity, when a prior run
    /// completed.
    ///
    /// Fresh path, in order: download the OS-matched tools archive, extract
    /// it fully into the SDK root, delete the archive, set owner-execute on
    /// every entry under `tools/bin`, accept all licenses non-interactively,
    /// write the completion sentinel. License rejection is fatal; there is no
    /// fallback.
    pub fn ensure(&self) -> Result<(), ForgeError> {
        if self.layout.is_provisioned() {
            return Ok(());
        }

        println!("Setting up the Android SDK...");
        let url = SdkLayout::download_url(SdkLayout::host_os());
        let archive = self
            .fetcher
            .download(&url, &self.layout.cache_dir())
            .map_err(|err| match err {
                ForgeError::Network(_) => {
                    ForgeError::Network(format!("downloading the Android SDK from {url}"))
                }
                other => other,
            })?;

        self.extract(&archive)?;
        // The archive has no purpose once extracted.
        fs::remove_file(&archive)?;
        self.fix_tool_permissions()?;
        self.accept_licenses()?;
        fs::write(
            self.layout.sentinel(),
            format!("sdk-tools {SDK_TOOLS_VERSION}\n"),
        )?;
        Ok(())
    }

    /// Run pathway extra: the emulator plus a default system image, fetched
    /// through the SDK's own package manager when absent. Failure is fatal
    /// like any other tool failure.
    pub fn ensure_components(&self) -> Result<(), ForgeError> {
        if self.layout.emulator_dir().exists() {
            return Ok(());
        }
        println!("Ensuring the Android emulator and system image are present...");
        let invocation = ToolInvocation::new(self.layout.sdkmanager())
            .args(EMULATOR_COMPONENTS)
            .cwd(self.layout.root());
        self.runner.run(&invocation)?;
        Ok(())
    }

    fn extract(&self, archive: &Path) -> Result<(), ForgeError> {
        if self.verbose {
            println!(
                "  extracting {} into {}",
                archive.display(),
                self.layout.root().display()
            );
        }
        fs::create_dir_all(self.layout.root())?;
        let file = fs::File::open(archive)?;
        let mut sdk_zip = zip::ZipArchive::new(file)?;
        sdk_zip.extract(self.layout.root())?;
        Ok(())
    }

    /// Zip extraction does not carry executable bits across platforms, so
    /// every tool binary gets owner-execute set here; no-op on Windows.
    fn fix_tool_permissions(&self) -> Result<(), ForgeError> {
        let tools_bin = self.layout.tools_bin();
        for entry in fs::read_dir(&tools_bin)? {
            mark_executable(&entry?.path())?;
        }
        Ok(())
    }

    fn accept_licenses(&self) -> Result<(), ForgeError> {
        println!("Ensuring all Android SDK licenses are accepted...");
        let invocation = ToolInvocation::new(self.layout.sdkmanager())
            .arg("--licenses")
            .cwd(self.layout.root())
            .stdin("y\n".repeat(100));
        self.runner.run(&invocation)?;
        Ok(())
    }
}
