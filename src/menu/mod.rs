//! Menu tree data model
//!
//! Menus are stored in an arena. A [`MenuTree`] owns every [`MenuNode`] and
//! every [`MenuControl`]; nodes refer to their controls and folder controls
//! refer to their child node by id. This lets a tree share a submenu between
//! two folders, or link back to an ancestor, without any reference cycles in
//! Rust ownership.
//!
//! ## Submodules
//!
//! - `sort` - sources of sort positions for newly created controls
//! - `manager` - [`MenuManager`], which composes fragments into one tree

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub mod manager;
pub mod sort;

pub use manager::MenuManager;
pub use sort::{SequenceCounter, SortSource};

/// Index of a menu node inside its [`MenuTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MenuId(pub usize);

/// Index of a control inside its [`MenuTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ControlId(pub usize);

/// What a menu control does when selected.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlKind {
    Button,
    #[default]
    Toggle,
    /// Single-axis radial control
    Slider,
    TwoAxisPuppet,
    FourAxisPuppet,
    /// Opens another menu
    FolderLink,
}

impl ControlKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlKind::Button => "button",
            ControlKind::Toggle => "toggle",
            ControlKind::Slider => "slider",
            ControlKind::TwoAxisPuppet => "two_axis_puppet",
            ControlKind::FourAxisPuppet => "four_axis_puppet",
            ControlKind::FolderLink => "folder_link",
        }
    }
}

/// One entry in a menu.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MenuControl {
    pub name: String,
    pub kind: ControlKind,
    /// Parameter driven directly by the control (toggles, buttons, folders)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter: Option<String>,
    /// Parameters driven by the axes of sliders and puppets
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sub_parameters: Vec<String>,
    pub value: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    /// Child menu of a folder control
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_menu: Option<MenuId>,
}

impl MenuControl {
    /// Create a control of the given kind with no parameters.
    pub fn new(name: impl Into<String>, kind: ControlKind) -> Self {
        Self {
            name: name.into(),
            kind,
            ..Self::default()
        }
    }

    /// Whether this is a folder control with a materialized child menu.
    pub fn is_linked_folder(&self) -> bool {
        self.kind == ControlKind::FolderLink && self.sub_menu.is_some()
    }

    /// All parameter names referenced by this control, in order.
    pub fn parameter_names(&self) -> impl Iterator<Item = &str> {
        self.parameter
            .iter()
            .chain(self.sub_parameters.iter())
            .map(String::as_str)
    }
}

/// One menu level: an ordered list of controls.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MenuNode {
    /// Logical name of the menu, used for diagnostics
    pub name: String,
    pub controls: Vec<ControlId>,
}

/// An arena holding a graph of menus rooted at [`MenuTree::root`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MenuTree {
    pub root: MenuId,
    pub menus: Vec<MenuNode>,
    #[serde(default)]
    pub controls: Vec<MenuControl>,
}

impl Default for MenuTree {
    fn default() -> Self {
        Self::new("VRCF_Menu")
    }
}

impl MenuTree {
    /// Create a tree containing a single empty root menu.
    pub fn new(root_name: impl Into<String>) -> Self {
        Self {
            root: MenuId(0),
            menus: vec![MenuNode {
                name: root_name.into(),
                controls: Vec::new(),
            }],
            controls: Vec::new(),
        }
    }

    /// Allocate a new, empty menu node under a logical name.
    pub fn add_menu(&mut self, name: impl Into<String>) -> MenuId {
        self.menus.push(MenuNode {
            name: name.into(),
            controls: Vec::new(),
        });
        MenuId(self.menus.len() - 1)
    }

    /// Store a control without attaching it to any menu.
    pub fn add_control(&mut self, control: MenuControl) -> ControlId {
        self.controls.push(control);
        ControlId(self.controls.len() - 1)
    }

    /// Store a control and append it to `menu`.
    pub fn push_control(&mut self, menu: MenuId, control: MenuControl) -> ControlId {
        let id = self.add_control(control);
        self.menus[menu.0].controls.push(id);
        id
    }

    /// Append an existing folder control to `parent` pointing at `child`.
    pub fn push_folder(&mut self, parent: MenuId, name: impl Into<String>, child: MenuId) -> ControlId {
        let mut control = MenuControl::new(name, ControlKind::FolderLink);
        control.sub_menu = Some(child);
        self.push_control(parent, control)
    }

    pub fn menu(&self, id: MenuId) -> &MenuNode {
        &self.menus[id.0]
    }

    pub fn menu_mut(&mut self, id: MenuId) -> &mut MenuNode {
        &mut self.menus[id.0]
    }

    pub fn control(&self, id: ControlId) -> &MenuControl {
        &self.controls[id.0]
    }

    pub fn control_mut(&mut self, id: ControlId) -> &mut MenuControl {
        &mut self.controls[id.0]
    }

    /// Iterate the controls of a menu in order.
    pub fn controls_of(&self, menu: MenuId) -> impl Iterator<Item = &MenuControl> {
        self.menus[menu.0].controls.iter().map(|id| &self.controls[id.0])
    }

    /// Find the direct child folder of `menu` named `name`, if it is linked.
    pub fn find_folder(&self, menu: MenuId, name: &str) -> Option<MenuId> {
        self.controls_of(menu)
            .find(|c| c.kind == ControlKind::FolderLink && c.name == name)
            .and_then(|c| c.sub_menu)
    }

    /// Every menu reachable from the root, each visited once, in pre-order.
    pub fn reachable_menus(&self) -> Vec<MenuId> {
        let mut order = Vec::new();
        let mut visited = HashSet::new();
        self.collect_reachable(self.root, &mut order, &mut visited);
        order
    }

    fn collect_reachable(&self, menu: MenuId, order: &mut Vec<MenuId>, visited: &mut HashSet<MenuId>) {
        if !visited.insert(menu) {
            return;
        }
        order.push(menu);
        for control in self.controls_of(menu) {
            if let Some(child) = control.sub_menu {
                self.collect_reachable(child, order, visited);
            }
        }
    }

    /// Check that every id in the tree points at something that exists.
    pub fn validate(&self) -> crate::error::Result<()> {
        let bad = |message: String| crate::error::Error::ConfigParse {
            message,
            hint: Some("menu and control ids are indexes into the 'menus' and 'controls' lists".to_string()),
        };
        if self.root.0 >= self.menus.len() {
            return Err(bad(format!("root menu {} does not exist", self.root.0)));
        }
        for (index, menu) in self.menus.iter().enumerate() {
            for control in &menu.controls {
                if control.0 >= self.controls.len() {
                    return Err(bad(format!("menu {} lists missing control {}", index, control.0)));
                }
            }
        }
        for (index, control) in self.controls.iter().enumerate() {
            if let Some(sub) = control.sub_menu {
                if sub.0 >= self.menus.len() {
                    return Err(bad(format!("control {} links missing menu {}", index, sub.0)));
                }
            }
        }
        Ok(())
    }
}
