//! Project bundle generation from the embedded gradle template.

use std::fs;
use std::path::{Path, PathBuf};

use include_dir::{Dir, DirEntry, include_dir};

use crate::layout::{ProjectLayout, mark_executable};
use crate::types::{AppDescriptor, ForgeError};

static ANDROID_TEMPLATE: Dir = include_dir!("$CARGO_MANIFEST_DIR/templates/android");

/// Template variable replaced in every rendered file.
struct TemplateVar {
    name: &'static str,
    value: String,
}

/// Renders the gradle project bundle for `app` under the project directory
/// and returns its path. Refuses to overwrite an existing bundle.
pub fn generate_bundle(
    app: &AppDescriptor,
    project: &ProjectLayout,
) -> Result<PathBuf, ForgeError> {
    let bundle_dir = project.bundle_dir(app);
    if bundle_dir.exists() {
        return Err(ForgeError::Config(format!(
            "project bundle already exists at {}",
            bundle_dir.display()
        )));
    }

    let vars = [
        TemplateVar {
            name: "formal_name",
            value: app.formal_name.clone(),
        },
        TemplateVar {
            name: "package",
            value: app.package_id(),
        },
    ];
    render_dir(&ANDROID_TEMPLATE, &bundle_dir, &vars)?;
    // The wrapper shim arrives from the embedded template without its
    // executable bit.
    mark_executable(&bundle_dir.join("gradlew"))?;
    Ok(bundle_dir)
}

fn render_dir(dir: &Dir, out_root: &Path, vars: &[TemplateVar]) -> Result<(), ForgeError> {
    for entry in dir.entries() {
        match entry {
            DirEntry::Dir(sub) => render_dir(sub, out_root, vars)?,
            DirEntry::File(file) => {
                let relative = file.path();
                let text = std::str::from_utf8(file.contents()).map_err(|_| {
                    ForgeError::Config(format!(
                        "template {} is not valid UTF-8",
                        relative.display()
                    ))
                })?;
                let rendered = render_template(text, vars);
                ensure_fully_rendered(&rendered, relative)?;

                let out_path = out_root.join(relative);
                if let Some(parent) = out_path.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&out_path, rendered)?;
            }
        }
    }
    Ok(())
}

fn render_template(text: &str, vars: &[TemplateVar]) -> String {
    let mut rendered = text.to_string();
    for var in vars {
        rendered = rendered.replace(&format!("{{{{{}}}}}", var.name), &var.value);
    }
    rendered
}

fn ensure_fully_rendered(content: &str, path: &Path) -> Result<(), ForgeError> {
    if content.contains("{{") {
        return Err(ForgeError::Config(format!(
            "unreplaced placeholder in template {}",
            path.display()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> AppDescriptor {
        AppDescriptor {
            name: "helloworld".into(),
            formal_name: "Hello World".into(),
            bundle: "com.example".into(),
        }
    }

    #[test]
    fn bundle_renders_with_no_unreplaced_placeholders() {
        let dir = tempfile::tempdir().unwrap();
        let project = ProjectLayout::new(dir.path());
        let bundle = generate_bundle(&app(), &project).unwrap();
        assert_eq!(bundle, project.bundle_dir(&app()));

        for file in [
            "settings.gradle",
            "build.gradle",
            "gradle.properties",
            "gradlew",
            "app/build.gradle",
            "app/src/main/AndroidManifest.xml",
            "app/src/main/res/values/strings.xml",
        ] {
            let path = bundle.join(file);
            let contents = fs::read_to_string(&path)
                .unwrap_or_else(|_| panic!("missing rendered file {file}"));
            assert!(!contents.contains("{{"), "{file} has unreplaced placeholders");
        }

        let gradle = fs::read_to_string(bundle.join("app/build.gradle")).unwrap();
        assert!(gradle.contains("applicationId 'com.example.helloworld'"));
        let manifest =
            fs::read_to_string(bundle.join("app/src/main/AndroidManifest.xml")).unwrap();
        assert!(manifest.contains("package=\"com.example.helloworld\""));
    }

    #[test]
    fn existing_bundle_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let project = ProjectLayout::new(dir.path());
        fs::create_dir_all(project.bundle_dir(&app())).unwrap();
        let err = generate_bundle(&app(), &project).unwrap_err();
        assert!(matches!(err, ForgeError::Config(_)), "got {err:?}");
    }

    #[cfg(unix)]
    #[test]
    fn gradle_wrapper_shim_is_executable() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let project = ProjectLayout::new(dir.path());
        let bundle = generate_bundle(&app(), &project).unwrap();
        let mode = fs::metadata(bundle.join("gradlew"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o111, 0o111);
    }

    #[test]
    fn render_template_substitutes_every_occurrence() {
        let vars = [TemplateVar {
            name: "package",
            value: "com.example.app".into(),
        }];
        let rendered = render_template("id '{{package}}' // {{package}}", &vars);
        assert_eq!(rendered, "id 'com.example.app' // com.example.app");
    }
}
