//! Menu composition
//!
//! [`MenuManager`] owns the composed menu tree. Features use it to create
//! folders and leaf controls by path, and to merge whole foreign menus into
//! the tree. All of these only ever append; the final order of every menu is
//! decided once, by [`MenuManager::sort_menu`].
//!
//! ## Merging
//!
//! Foreign menus may share submenus or link back to an ancestor. Merging keeps
//! a `seen` map from each foreign menu to the destination menu created for it.
//! A folder whose foreign child was already seen is re-linked to the existing
//! destination instead of being copied again, so cycles terminate and shared
//! menus stay shared.
//!
//! Sibling folders with the same name are told apart with `.dup.<N>` path
//! segments, numbered in order of first appearance. The first one (N = 0)
//! lands in a same-named folder that already exists in the destination.

use log::debug;
use std::collections::HashMap;

use super::sort::SortSource;
use super::{ControlId, ControlKind, MenuControl, MenuId, MenuTree};
use crate::controller::params::{AnimParam, NumberParam};
use crate::path::{dup_segment, menu_asset_name, parse_folder_segment, split_path};

/// Hook applied to every parameter name copied into the composed menu.
pub type ParamRewrite<'a> = &'a dyn Fn(&str) -> String;

/// Builds one composed menu tree out of many feature fragments.
pub struct MenuManager {
    tree: MenuTree,
    sort_source: Box<dyn SortSource>,
    sort_positions: HashMap<ControlId, i32>,
}

impl std::fmt::Debug for MenuManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MenuManager")
            .field("tree", &self.tree)
            .field("sort_positions", &self.sort_positions)
            .finish_non_exhaustive()
    }
}

impl MenuManager {
    /// Wrap `tree`. Every control created from now on is stamped with a
    /// position from `sort_source`. Controls already in `tree` have none.
    pub fn new(tree: MenuTree, sort_source: impl SortSource + 'static) -> Self {
        Self {
            tree,
            sort_source: Box::new(sort_source),
            sort_positions: HashMap::new(),
        }
    }

    pub fn raw(&self) -> &MenuTree {
        &self.tree
    }

    pub fn raw_mut(&mut self) -> &mut MenuTree {
        &mut self.tree
    }

    pub fn into_tree(self) -> MenuTree {
        self.tree
    }

    /// The sort position recorded for a control, if it was created here.
    pub fn sort_position(&self, control: ControlId) -> Option<i32> {
        self.sort_positions.get(&control).copied()
    }

    fn attach(&mut self, menu: MenuId, control: MenuControl, position: i32) -> ControlId {
        let id = self.tree.push_control(menu, control);
        self.sort_positions.insert(id, position);
        id
    }

    /// Resolve the menu at `path`.
    ///
    /// Each segment selects a folder control among the current menu's direct
    /// children, honouring a `.dup.<N>` suffix. When `create_if_missing` is
    /// set, missing folder controls and missing child menus are created;
    /// otherwise `None` is returned as soon as something is missing.
    ///
    /// `create_from`, when given, is cloned (with `rewrite` applied to its
    /// parameters) to make the final folder control if it has to be created,
    /// so icons and styles of imported folders survive.
    pub fn get_submenu<S: AsRef<str>>(
        &mut self,
        path: &[S],
        create_if_missing: bool,
        create_from: Option<&MenuControl>,
        rewrite: Option<ParamRewrite<'_>>,
    ) -> Option<MenuId> {
        let mut current = self.tree.root;
        for (i, segment) in path.iter().enumerate() {
            let folder = parse_folder_segment(segment.as_ref());

            let existing = self
                .tree
                .menu(current)
                .controls
                .iter()
                .copied()
                .filter(|id| {
                    let control = self.tree.control(*id);
                    control.kind == ControlKind::FolderLink && control.name == folder.name
                })
                .nth(folder.offset);

            let folder_control = match existing {
                Some(id) => id,
                None => {
                    if !create_if_missing {
                        return None;
                    }
                    let position = self.sort_source.next_position();
                    let mut control = match create_from {
                        Some(from) if i == path.len() - 1 => clone_control(from, rewrite),
                        _ => MenuControl::default(),
                    };
                    control.name = folder.name.to_string();
                    control.kind = ControlKind::FolderLink;
                    control.sub_menu = None;
                    self.attach(current, control, position)
                }
            };

            current = match self.tree.control(folder_control).sub_menu {
                Some(menu) => menu,
                None => {
                    if !create_if_missing {
                        return None;
                    }
                    let name = menu_asset_name(&path[..=i]);
                    debug!("Creating menu {}", name);
                    let menu = self.tree.add_menu(name);
                    self.tree.control_mut(folder_control).sub_menu = Some(menu);
                    menu
                }
            };
        }
        Some(current)
    }

    /// Resolve the menu at `path`, creating whatever is missing.
    pub fn get_or_create_submenu<S: AsRef<str>>(&mut self, path: &[S]) -> MenuId {
        let root = self.tree.root;
        self.get_submenu(path, true, None, None).unwrap_or(root)
    }

    /// Resolve the menu at `path` without creating anything.
    pub fn find_submenu<S: AsRef<str>>(&mut self, path: &[S]) -> Option<MenuId> {
        self.get_submenu(path, false, None, None)
    }

    /// Append a new control at `path`; the last segment is its name.
    ///
    /// An empty path puts a control with an empty name in the root menu.
    pub fn new_menu_item(&mut self, path: &str) -> ControlId {
        let mut split = split_path(path);
        if split.is_empty() {
            split.push(String::new());
        }
        let position = self.sort_source.next_position();
        let name = split.pop().unwrap_or_default();
        let menu = self.get_or_create_submenu(&split);
        self.attach(menu, MenuControl::new(name, ControlKind::Toggle), position)
    }

    pub fn new_menu_toggle(
        &mut self,
        path: &str,
        param: &dyn AnimParam,
        value: f32,
        icon: Option<String>,
    ) -> ControlId {
        let id = self.new_menu_item(path);
        let control = self.tree.control_mut(id);
        control.kind = ControlKind::Toggle;
        control.parameter = Some(param.name().to_string());
        control.value = value;
        control.icon = icon;
        id
    }

    pub fn new_menu_slider(
        &mut self,
        path: &str,
        param: &dyn NumberParam,
        icon: Option<String>,
    ) -> ControlId {
        let id = self.new_menu_item(path);
        let control = self.tree.control_mut(id);
        control.kind = ControlKind::Slider;
        control.sub_parameters = vec![param.name().to_string()];
        control.icon = icon;
        id
    }

    /// Append a two-axis puppet. A missing axis is bound to the empty name.
    pub fn new_menu_puppet(
        &mut self,
        path: &str,
        x: Option<&dyn NumberParam>,
        y: Option<&dyn NumberParam>,
        icon: Option<String>,
    ) -> ControlId {
        let id = self.new_menu_item(path);
        let axis = |p: Option<&dyn NumberParam>| p.map(|p| p.name().to_string()).unwrap_or_default();
        let control = self.tree.control_mut(id);
        control.kind = ControlKind::TwoAxisPuppet;
        control.sub_parameters = vec![axis(x), axis(y)];
        control.icon = icon;
        id
    }

    /// Merge the whole of `source` into the root menu.
    pub fn merge_menu_root(&mut self, source: &MenuTree, rewrite: Option<ParamRewrite<'_>>) {
        self.merge_menu(&[] as &[String], source, rewrite);
    }

    /// Merge the whole of `source` into the menu at `prefix`.
    pub fn merge_menu<S: AsRef<str>>(
        &mut self,
        prefix: &[S],
        source: &MenuTree,
        rewrite: Option<ParamRewrite<'_>>,
    ) {
        let prefix: Vec<String> = prefix.iter().map(|s| s.as_ref().to_string()).collect();
        let mut seen = HashMap::new();
        self.merge_menu_from(&prefix, source, source.root, rewrite, &mut seen);
    }

    /// Merge the foreign menu `from` into the menu at `prefix`.
    ///
    /// `seen` maps foreign menus to the destination menus already made for
    /// them and must be shared across one whole merge.
    pub fn merge_menu_from(
        &mut self,
        prefix: &[String],
        source: &MenuTree,
        from: MenuId,
        rewrite: Option<ParamRewrite<'_>>,
        seen: &mut HashMap<MenuId, MenuId>,
    ) {
        let to = self.get_or_create_submenu(prefix);
        seen.insert(from, to);

        let mut submenu_count: HashMap<&str, usize> = HashMap::new();
        for &control_id in &source.menu(from).controls {
            let from_control = source.control(control_id);
            let from_submenu = match from_control.kind {
                ControlKind::FolderLink => from_control.sub_menu,
                _ => None,
            };

            let Some(from_submenu) = from_submenu else {
                let position = self.sort_source.next_position();
                self.attach(to, clone_control(from_control, rewrite), position);
                continue;
            };

            // re-linked folders occupy a same-named slot in `to` as well
            let dup_id = *submenu_count
                .entry(from_control.name.as_str())
                .and_modify(|count| *count += 1)
                .or_insert(0);

            if let Some(&target) = seen.get(&from_submenu) {
                debug!(
                    "Re-linking folder '{}' to already merged menu {}",
                    from_control.name,
                    self.tree.menu(target).name
                );
                let position = self.sort_source.next_position();
                let mut control = clone_control(from_control, rewrite);
                control.sub_menu = Some(target);
                self.attach(to, control, position);
                continue;
            }

            let mut child_prefix = prefix.to_vec();
            child_prefix.push(dup_segment(&from_control.name, dup_id));
            self.get_submenu(&child_prefix, true, Some(from_control), rewrite);
            self.merge_menu_from(&child_prefix, source, from_submenu, rewrite, seen);
        }
    }

    /// Stable-sort every reachable menu by recorded sort position.
    ///
    /// Controls without a recorded position sort as position 0.
    pub fn sort_menu(&mut self) {
        for menu in self.tree.reachable_menus() {
            let positions = &self.sort_positions;
            self.tree
                .menu_mut(menu)
                .controls
                .sort_by_key(|id| positions.get(id).copied().unwrap_or(0));
        }
    }
}

/// Copy a control, passing its parameters through `rewrite`.
///
/// The child menu link is never copied; the caller decides where it points.
pub fn clone_control(from: &MenuControl, rewrite: Option<ParamRewrite<'_>>) -> MenuControl {
    let rename = |name: &String| match rewrite {
        Some(rewrite) => rewrite(name),
        None => name.clone(),
    };
    MenuControl {
        name: from.name.clone(),
        kind: from.kind,
        parameter: from.parameter.as_ref().map(rename),
        sub_parameters: from.sub_parameters.iter().map(rename).collect(),
        value: from.value,
        icon: from.icon.clone(),
        style: from.style.clone(),
        labels: from.labels.clone(),
        sub_menu: None,
    }
}
