//! APK deployment over the device bridge.
//!
//! A deployment is three bridge calls against one device, strictly in order:
//! install, force-stop, start. A failed install short-circuits the rest; a
//! failure after install leaves the app installed and stopped, with no
//! rollback.

use std::path::Path;

use crate::exec::{ToolInvocation, ToolRunner};
use crate::layout::SdkLayout;
use crate::types::ForgeError;

/// Entry-point activity every generated project bundle ships.
pub const MAIN_ACTIVITY: &str = "org.apkforge.android.MainActivity";

/// Commands for listing and creating devices, shown whenever the requested
/// device is missing or unknown. Built from the real tool paths so the lines
/// can be pasted as-is.
fn device_help(sdk: &SdkLayout) -> String {
    format!(
        "\
You can get a list of valid devices by running this command and looking in
the first column of output.

$ {adb} devices -l

If you do not see any devices, you can create one by running these commands:

$ {sdkmanager} \"platforms;android-28\" \\
    \"system-images;android-28;default;x86\" \"emulator\" \"platform-tools\"

$ {avdmanager} --verbose create avd --name robotfriend \\
    --abi x86 --package 'system-images;android-28;default;x86' --device pixel

$ {emulator} -avd robotfriend &

Then use adb to find the device name by running the first command again and
looking in the first column of output.",
        adb = sdk.adb().display(),
        sdkmanager = sdk.sdkmanager().display(),
        avdmanager = sdk.avdmanager().display(),
        emulator = sdk.emulator().display(),
    )
}

/// adb reports an unknown serial as `error: device '<id>' not found`; older
/// builds say `device not found`.
fn reports_unknown_device(output: &str, device: &str) -> bool {
    output.contains(&format!("device '{device}' not found"))
        || output.contains("device not found")
}

/// Drives adb install / force-stop / start against one device.
///
/// Device validity is only established by the bridge calls themselves;
/// nothing is cached across invocations.
pub struct AdbDeployer<'a> {
    sdk: &'a SdkLayout,
    runner: &'a dyn ToolRunner,
}

impl<'a> AdbDeployer<'a> {
    pub fn new(sdk: &'a SdkLayout, runner: &'a dyn ToolRunner) -> Self {
        Self { sdk, runner }
    }

    /// Installs `apk` on `device`, force-stops any running instance of
    /// `package`, and starts `activity`.
    ///
    /// A missing or empty device identifier fails before any bridge call;
    /// this tool deliberately neither enumerates nor auto-selects devices.
    pub fn deploy(
        &self,
        device: Option<&str>,
        apk: &Path,
        package: &str,
        activity: &str,
    ) -> Result<(), ForgeError> {
        let device = match device.filter(|id| !id.is_empty()) {
            Some(id) => id,
            None => {
                return Err(ForgeError::MissingTarget(format!(
                    "Please specify the device to run the app on by passing -d device_name.\n\n{}",
                    device_help(self.sdk)
                )));
            }
        };

        self.install(device, apk)?;
        self.force_stop(device, package)?;
        self.start(device, package, activity)?;
        Ok(())
    }

    fn bridge(&self, device: &str) -> ToolInvocation {
        ToolInvocation::new(self.sdk.adb()).arg("-s").arg(device)
    }

    fn install(&self, device: &str, apk: &Path) -> Result<(), ForgeError> {
        println!("Installing {} on {device}...", apk.display());
        let invocation = self
            .bridge(device)
            .arg("install")
            .arg("-r")
            .arg(apk.display().to_string());
        match self.runner.run(&invocation) {
            Ok(_) => Ok(()),
            Err(ForgeError::Tool { output, .. }) if reports_unknown_device(&output, device) => {
                Err(ForgeError::DeviceNotFound(format!(
                    "Device {device} not found.\n\n{}",
                    device_help(self.sdk)
                )))
            }
            Err(other) => Err(other),
        }
    }

    /// Ensures the activity launches fresh instead of resuming. force-stop
    /// itself exits zero when nothing was running; only a bridge crash is an
    /// error here.
    fn force_stop(&self, device: &str, package: &str) -> Result<(), ForgeError> {
        let invocation = self
            .bridge(device)
            .args(["shell", "am", "force-stop"])
            .arg(package);
        self.runner.run(&invocation)?;
        Ok(())
    }

    fn start(&self, device: &str, package: &str, activity: &str) -> Result<(), ForgeError> {
        println!("Starting {package} on {device}...");
        let invocation = self
            .bridge(device)
            .args(["shell", "am", "start", "-n"])
            .arg(format!("{package}/{activity}"))
            .args(["-a", "android.intent.action.MAIN", "-c", "android.intent.category.LAUNCHER"]);
        self.runner.run(&invocation)?;
        Ok(())
    }
}
