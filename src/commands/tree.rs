//! # Tree Command Implementation
//!
//! This module implements the `tree` subcommand, which displays a menu
//! document as a hierarchy. The `compose` command reuses the same rendering
//! for its default output.
//!
//! Every menu's contents are shown once. Links back to an ancestor and
//! further links to an already shown menu are marked instead of expanded,
//! so cyclic and shared menus print in finite space.
//!
//! This command is a safe, read-only operation that does not modify any files.

use anyhow::Result;
use clap::Args;
use ptree::{print_tree, TreeItem};
use std::collections::HashSet;
use std::path::PathBuf;

use avatar_compose::config;
use avatar_compose::menu::{MenuControl, MenuId, MenuTree};

/// Display a menu document as a tree
#[derive(Args, Debug)]
pub struct TreeArgs {
    /// Path to the menu document (YAML, or JSON by extension).
    #[arg(value_name = "MENU")]
    pub menu: PathBuf,
}

/// Execute the `tree` command.
pub fn execute(args: TreeArgs) -> Result<()> {
    let menu: MenuTree = config::load_document(&args.menu).map_err(|e| {
        anyhow::anyhow!("Failed to load menu from {}: {}", args.menu.display(), e)
    })?;
    menu.validate()?;
    print_menu(&menu)
}

/// Print `menu` to stdout as a tree.
pub fn print_menu(menu: &MenuTree) -> Result<()> {
    let root = build_tree_node(menu);
    print_tree(&root).map_err(|e| anyhow::anyhow!("Failed to display tree: {}", e))?;
    Ok(())
}

/// Render `menu` into a string.
#[cfg(test)]
fn render_menu(menu: &MenuTree) -> Result<String> {
    let mut out = Vec::new();
    ptree::write_tree(&build_tree_node(menu), &mut out)?;
    Ok(String::from_utf8_lossy(&out).into_owned())
}

/// Build the display tree for a whole menu.
pub fn build_tree_node(menu: &MenuTree) -> TreeNode {
    let mut walk = MenuWalk::default();
    TreeNode {
        label: menu.menu(menu.root).name.clone(),
        children: walk.menu_children(menu, menu.root),
    }
}

/// Tracks which menus are open on the current path and which were already
/// expanded elsewhere, so each menu's contents appear once.
#[derive(Default)]
struct MenuWalk {
    ancestors: HashSet<MenuId>,
    expanded: HashSet<MenuId>,
}

impl MenuWalk {
    fn menu_children(&mut self, menu: &MenuTree, id: MenuId) -> Vec<TreeNode> {
        self.ancestors.insert(id);
        self.expanded.insert(id);
        let children = menu
            .controls_of(id)
            .map(|control| {
                let label = control_label(control);
                match control.sub_menu {
                    Some(sub) if self.ancestors.contains(&sub) => TreeNode {
                        label: format!("{} (links back to {})", label, menu.menu(sub).name),
                        children: Vec::new(),
                    },
                    Some(sub) if self.expanded.contains(&sub) => TreeNode {
                        label: format!("{} (same as {} above)", label, menu.menu(sub).name),
                        children: Vec::new(),
                    },
                    Some(sub) => TreeNode {
                        label,
                        children: self.menu_children(menu, sub),
                    },
                    None => TreeNode {
                        label,
                        children: Vec::new(),
                    },
                }
            })
            .collect();
        self.ancestors.remove(&id);
        children
    }
}

fn control_label(control: &MenuControl) -> String {
    let params: Vec<&str> = control.parameter_names().filter(|p| !p.is_empty()).collect();
    if params.is_empty() {
        format!("{} [{}]", control.name, control.kind.as_str())
    } else {
        format!(
            "{} [{}] {}",
            control.name,
            control.kind.as_str(),
            params.join(", ")
        )
    }
}

/// Tree node structure for ptree visualization
#[derive(Clone, Debug)]
pub struct TreeNode {
    label: String,
    children: Vec<TreeNode>,
}

impl TreeItem for TreeNode {
    type Child = TreeNode;

    fn write_self<W: std::io::Write>(
        &self,
        f: &mut W,
        _style: &ptree::Style,
    ) -> std::io::Result<()> {
        write!(f, "{}", self.label)
    }

    fn children(&self) -> std::borrow::Cow<'_, [Self::Child]> {
        std::borrow::Cow::Borrowed(&self.children)
    }
}
