//! # Build File Schema and Parsing
//!
//! This module defines the data structures that represent a build file, and
//! the logic that turns one into a [`BuildSession`].
//!
//! ## Key Components
//!
//! - **`BuildFile`**: The whole file, a list of features.
//!
//! - **`FeatureConfig`**: One feature. It can add toggles, sliders and puppets
//!   to the menu (registering their parameters in the FX controller), and
//!   merge whole menu documents into the composed menu.
//!
//! ## Example
//!
//! ```yaml
//! features:
//!   - name: Hat
//!     priority: 0
//!     toggles:
//!       - { path: "Clothing/Hat", param: HatOn, icon: hat }
//!     sliders:
//!       - { path: "Clothing/Hat Size", param: HatSize }
//!     merge_menus:
//!       - { file: hat_menu.yaml, prefix: "Clothing", param_prefix: "Hat_" }
//! ```
//!
//! Referenced documents (menus and controllers) are read as JSON when their
//! extension is `.json` and as YAML otherwise.

use crate::controller::NumberParam;
use crate::error::{Error, Result};
use crate::menu::{MenuManager, MenuTree};
use crate::session::{BuildContext, BuildSession};
use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A complete build file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildFile {
    #[serde(default)]
    pub features: Vec<FeatureConfig>,
}

fn default_toggle_value() -> f32 {
    1.0
}

/// A menu toggle bound to a bool parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToggleConfig {
    /// Slash-separated menu path; the last segment is the control name
    pub path: String,
    pub param: String,
    #[serde(default = "default_toggle_value")]
    pub value: f32,
    #[serde(default)]
    pub icon: Option<String>,
}

/// A radial slider bound to a float parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SliderConfig {
    pub path: String,
    pub param: String,
    #[serde(default)]
    pub icon: Option<String>,
}

/// A two-axis puppet. Either axis may be left unbound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PuppetConfig {
    pub path: String,
    #[serde(default)]
    pub x: Option<String>,
    #[serde(default)]
    pub y: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
}

/// A menu document to merge into the composed menu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeMenuConfig {
    /// Path to the menu document, relative to the build file's directory
    pub file: PathBuf,
    /// Menu path the document's root is merged into
    #[serde(default)]
    pub prefix: String,
    /// Prepended to every non-empty parameter name in the merged controls
    #[serde(default)]
    pub param_prefix: Option<String>,
}

/// One feature of a build file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Name used in logs and error messages
    #[serde(default)]
    pub name: String,
    /// Lower priorities run first
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub toggles: Vec<ToggleConfig>,
    #[serde(default)]
    pub sliders: Vec<SliderConfig>,
    #[serde(default)]
    pub puppets: Vec<PuppetConfig>,
    #[serde(default)]
    pub merge_menus: Vec<MergeMenuConfig>,
}

impl FeatureConfig {
    /// The name to report, falling back to the feature's position.
    pub fn display_name(&self, index: usize) -> String {
        if self.name.is_empty() {
            format!("feature #{}", index + 1)
        } else {
            self.name.clone()
        }
    }

    /// Apply this feature to a running session.
    ///
    /// Menu documents are resolved against `base_dir` and loaded here, so a
    /// missing file fails the build like any other action.
    pub fn apply(&self, ctx: &mut BuildContext, base_dir: &Path) -> Result<()> {
        for toggle in &self.toggles {
            if toggle.param.is_empty() {
                return Err(Error::builder(format!(
                    "Toggle '{}' does not have a parameter",
                    toggle.path
                )));
            }
            let param = ctx.fx.new_bool(&toggle.param, false);
            ctx.menu
                .new_menu_toggle(&toggle.path, &param, toggle.value, toggle.icon.clone());
        }

        for slider in &self.sliders {
            if slider.param.is_empty() {
                return Err(Error::builder(format!(
                    "Slider '{}' does not have a parameter",
                    slider.path
                )));
            }
            let param = ctx.fx.new_float(&slider.param, 0.0);
            ctx.menu
                .new_menu_slider(&slider.path, &param, slider.icon.clone());
        }

        for puppet in &self.puppets {
            let mut axis = |name: &Option<String>| {
                name.as_deref()
                    .filter(|n| !n.is_empty())
                    .map(|n| ctx.fx.new_float(n, 0.0))
            };
            let x = axis(&puppet.x);
            let y = axis(&puppet.y);
            ctx.menu.new_menu_puppet(
                &puppet.path,
                x.as_ref().map(|p| p as &dyn NumberParam),
                y.as_ref().map(|p| p as &dyn NumberParam),
                puppet.icon.clone(),
            );
        }

        for merge in &self.merge_menus {
            merge_menu_file(&mut ctx.menu, merge, base_dir)?;
        }
        Ok(())
    }
}

fn merge_menu_file(menu: &mut MenuManager, merge: &MergeMenuConfig, base_dir: &Path) -> Result<()> {
    let path = base_dir.join(&merge.file);
    debug!("Merging menu {} into '{}'", path.display(), merge.prefix);
    let source: MenuTree = load_document(&path)?;
    source.validate()?;

    let prefix = crate::path::split_path(&merge.prefix);
    match merge.param_prefix.as_deref() {
        Some(param_prefix) => {
            let rewrite: &dyn Fn(&str) -> String = &|name: &str| {
                if name.is_empty() {
                    String::new()
                } else {
                    format!("{}{}", param_prefix, name)
                }
            };
            menu.merge_menu(&prefix, &source, Some(rewrite));
        }
        None => menu.merge_menu(&prefix, &source, None),
    }
    Ok(())
}

impl BuildFile {
    /// Register every feature as an action of `session`.
    pub fn register(&self, session: &mut BuildSession, base_dir: &Path) {
        for (index, feature) in self.features.iter().enumerate() {
            let feature = feature.clone();
            let base_dir = base_dir.to_path_buf();
            session.add_feature(feature.display_name(index), feature.priority, move |ctx| {
                feature.apply(ctx, &base_dir)
            });
        }
    }
}

/// Parse a build file from a YAML string.
pub fn parse(yaml_content: &str) -> Result<BuildFile> {
    let build: BuildFile = serde_yaml::from_str(yaml_content)?;
    for (index, feature) in build.features.iter().enumerate() {
        if let Some(merge) = feature.merge_menus.iter().find(|m| m.file.as_os_str().is_empty()) {
            return Err(Error::ConfigParse {
                message: format!(
                    "{} merges a menu with no file (prefix '{}')",
                    feature.display_name(index),
                    merge.prefix
                ),
                hint: Some("Set `file` to the path of a menu document".to_string()),
            });
        }
    }
    Ok(build)
}

/// Read and parse a build file.
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<BuildFile> {
    let content = std::fs::read_to_string(path).map_err(Error::Io)?;
    parse(&content)
}

/// Load a menu or controller document, choosing JSON or YAML by extension.
pub fn load_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(Error::Io)?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        Ok(serde_json::from_str(&content)?)
    } else {
        from_yaml_str(&content)
    }
}

/// Parse a YAML document whose enums are written as single-key maps
/// (`clip: idle`) rather than `!tag` values.
pub fn from_yaml_str<T: DeserializeOwned>(content: &str) -> Result<T> {
    let de = serde_yaml::Deserializer::from_str(content);
    Ok(serde_yaml::with::singleton_map_recursive::deserialize(de)?)
}

/// Serialize to YAML in the same single-key-map form [`from_yaml_str`] reads.
pub fn to_yaml_string<T: Serialize>(value: &T) -> Result<String> {
    let mut out = Vec::new();
    {
        let mut ser = serde_yaml::Serializer::new(&mut out);
        serde_yaml::with::singleton_map_recursive::serialize(value, &mut ser)?;
    }
    Ok(String::from_utf8_lossy(&out).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::{ParameterValue, VfController};
    use crate::menu::ControlKind;
    use std::fs;

    fn run(build: &BuildFile, base_dir: &Path) -> crate::session::BuildOutput {
        let mut session = BuildSession::new(MenuTree::default(), VfController::empty("FX"));
        build.register(&mut session, base_dir);
        session.run().unwrap()
    }

    #[test]
    fn test_parse_defaults() {
        let yaml = r#"
features:
  - name: Hat
    toggles:
      - path: Clothing/Hat
        param: HatOn
"#;
        let build = parse(yaml).unwrap();
        let feature = &build.features[0];
        assert_eq!(feature.priority, 0);
        assert_eq!(feature.toggles[0].value, 1.0);
        assert_eq!(feature.toggles[0].icon, None);
        assert!(feature.sliders.is_empty());
    }

    #[test]
    fn test_parse_rejects_merge_without_file() {
        let yaml = r#"
features:
  - merge_menus:
      - file: ""
        prefix: Clothing
"#;
        let err = parse(yaml).unwrap_err();
        let display = err.to_string();
        assert!(display.contains("feature #1"));
        assert!(display.contains("hint:"));
    }

    #[test]
    fn test_empty_file_is_no_features() {
        assert_eq!(parse("{}").unwrap(), BuildFile::default());
    }

    #[test]
    fn test_features_build_menu_and_params() {
        let yaml = r#"
features:
  - name: Look
    priority: 1
    puppets:
      - { path: Look, x: LookX }
  - name: Hat
    toggles:
      - { path: "Clothing/Hat", param: HatOn, icon: hat }
    sliders:
      - { path: "Clothing/Hat Size", param: HatSize }
"#;
        let build = parse(yaml).unwrap();
        let output = run(&build, Path::new("."));

        // Look runs last but was declared first
        let root: Vec<_> = output.menu.controls_of(output.menu.root).collect();
        assert_eq!(root[0].name, "Look");
        assert_eq!(root[0].kind, ControlKind::TwoAxisPuppet);
        assert_eq!(root[0].sub_parameters, vec!["LookX".to_string(), String::new()]);
        assert_eq!(root[1].name, "Clothing");

        let clothing = output.menu.find_folder(output.menu.root, "Clothing").unwrap();
        assert_eq!(output.menu.menu(clothing).name, "VRCF_Menu_Clothing");
        let hat: Vec<_> = output.menu.controls_of(clothing).collect();
        assert_eq!(hat[0].parameter.as_deref(), Some("HatOn"));
        assert_eq!(hat[0].icon.as_deref(), Some("hat"));
        assert_eq!(hat[1].kind, ControlKind::Slider);

        assert_eq!(output.fx.get_param("HatOn").unwrap().value, ParameterValue::Bool(false));
        assert_eq!(output.fx.get_param("HatSize").unwrap().value, ParameterValue::Float(0.0));
        assert!(output.fx.get_param("LookX").is_some());
    }

    #[test]
    fn test_toggle_without_param_is_builder_failure() {
        let build = parse("features: [{ name: Hat, toggles: [{ path: Hat, param: '' }] }]").unwrap();
        let mut session = BuildSession::new(MenuTree::default(), VfController::empty("FX"));
        build.register(&mut session, Path::new("."));
        let failure = session.safe_run().unwrap_err();
        assert_eq!(failure.message, "Toggle 'Hat' does not have a parameter");
    }

    #[test]
    fn test_merge_menu_file_with_param_prefix() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("hat.json"),
            r#"{
  "root": 0,
  "menus": [{ "name": "Hat Menu", "controls": [0] }],
  "controls": [{ "name": "On", "kind": "toggle", "parameter": "On" }]
}"#,
        )
        .unwrap();
        let yaml = r#"
features:
  - merge_menus:
      - { file: hat.json, prefix: Clothing, param_prefix: Hat_ }
"#;
        let output = run(&parse(yaml).unwrap(), dir.path());
        let clothing = output.menu.find_folder(output.menu.root, "Clothing").unwrap();
        let merged: Vec<_> = output.menu.controls_of(clothing).collect();
        assert_eq!(merged[0].parameter.as_deref(), Some("Hat_On"));
    }

    #[test]
    fn test_override_controller_yaml_round_trip() {
        use crate::controller::{Motion, RuntimeController};

        let yaml = r#"
override:
  name: Outfit
  overrides:
    idle: idle_outfit
  controller:
    controller:
      name: FX
      layers:
        - name: Base
          state_machine:
            name: Base
            states:
              - id: 1
                name: Idle
                motion:
                  clip: idle
        - name: Mirror
          synced_layer_index: 0
          synced_motion_overrides:
            1:
              clip: idle_mirror
      parameters:
        - name: Speed
          default:
            float: 0.5
        - name: Jump
          default: trigger
"#;
        let rc: RuntimeController = from_yaml_str(yaml).unwrap();
        let (clips, inner) = rc.clone().split_override().unwrap();
        assert_eq!(clips["idle"], "idle_outfit");
        let Some(RuntimeController::Controller(ctrl)) = inner else {
            panic!("expected a wrapped controller");
        };
        let base = ctrl.layers[0].state_machine.as_ref().unwrap();
        assert_eq!(base.states[0].motion, Some(Motion::clip("idle")));
        assert_eq!(ctrl.parameters[0].value, ParameterValue::Float(0.5));
        assert_eq!(ctrl.parameters[1].value, ParameterValue::Trigger);

        let written = to_yaml_string(&rc).unwrap();
        assert!(written.contains("clip: idle_mirror"));
        assert!(!written.contains('!'));
        let back: RuntimeController = from_yaml_str(&written).unwrap();
        assert_eq!(back, rc);
    }

    #[test]
    fn test_load_yaml_controller_document() {
        use crate::controller::RuntimeController;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fx.yaml");
        fs::write(&path, "controller:\n  name: FX\n").unwrap();
        let rc: RuntimeController = load_document(&path).unwrap();
        assert!(matches!(rc, RuntimeController::Controller(ref c) if c.name == "FX"));
    }

    #[test]
    fn test_missing_menu_file_fails_build() {
        let dir = tempfile::tempdir().unwrap();
        let build = parse("features: [{ merge_menus: [{ file: nope.yaml }] }]").unwrap();
        let mut session = BuildSession::new(MenuTree::default(), VfController::empty("FX"));
        build.register(&mut session, dir.path());
        let failure = session.safe_run().unwrap_err();
        assert!(matches!(failure.error.root_cause(), Error::Io(_)));
    }
}
