//! Gradle build invocation.

use std::path::PathBuf;

use crate::exec::{ToolInvocation, ToolRunner};
use crate::layout::{ProjectLayout, SdkLayout, mark_executable};
use crate::types::{AppDescriptor, ForgeError};

/// Environment variable gradle reads to locate the SDK. Merged over the
/// inherited environment, never replacing it.
pub const SDK_ROOT_ENV: &str = "ANDROID_SDK_ROOT";

/// Drives `gradlew` against an app's project bundle.
pub struct ApkBuilder<'a> {
    sdk: &'a SdkLayout,
    project: &'a ProjectLayout,
    runner: &'a dyn ToolRunner,
}

impl<'a> ApkBuilder<'a> {
    pub fn new(sdk: &'a SdkLayout, project: &'a ProjectLayout, runner: &'a dyn ToolRunner) -> Self {
        Self {
            sdk,
            project,
            runner,
        }
    }

    /// Builds the debug APK for `app` and returns the artifact path.
    ///
    /// Builds are destructive overwrites of a fixed output location, never
    /// versioned. On a non-zero gradle exit the captured build output is
    /// attached to the error. The artifact is marked executable on success;
    /// gradle's own output permission bits are not guaranteed.
    pub fn build(&self, app: &AppDescriptor) -> Result<PathBuf, ForgeError> {
        let bundle_dir = self.project.bundle_dir(app);
        println!("[{}] Building Android APK...", app.name);

        let invocation = ToolInvocation::new("./gradlew")
            .arg("assembleDebug")
            .cwd(&bundle_dir)
            .env(SDK_ROOT_ENV, self.sdk.root().display().to_string());
        if let Err(err) = self.runner.run(&invocation) {
            let output = match err {
                ForgeError::Tool { output, .. } => output,
                other => return Err(other),
            };
            return Err(ForgeError::Build {
                app: app.name.clone(),
                output,
            });
        }

        let artifact = self.project.binary_path(app);
        if !artifact.is_file() {
            return Err(ForgeError::Build {
                app: app.name.clone(),
                output: format!(
                    "gradle reported success but no APK exists at {}",
                    artifact.display()
                ),
            });
        }
        mark_executable(&artifact)?;
        Ok(artifact)
    }
}
