//! # Avatar Compose Library
//!
//! This library composes the outputs of many independent avatar features
//! into one result: a single hierarchical menu and a set of normalized
//! animation controllers. It is used by the `avatar-compose` command-line
//! tool, but the engine does not depend on any host or file format.
//!
//! ## Quick Example
//!
//! ```
//! use avatar_compose::controller::VfController;
//! use avatar_compose::menu::{MenuManager, MenuTree, SequenceCounter};
//!
//! let mut fx = VfController::empty("FX");
//! let mut menu = MenuManager::new(MenuTree::default(), SequenceCounter::default());
//!
//! let hat = fx.new_bool("HatOn", false);
//! menu.new_menu_toggle("Clothing/Hat", &hat, 1.0, None);
//! let size = fx.new_float("HatSize", 0.0);
//! menu.new_menu_slider("Clothing/Hat Size", &size, None);
//! menu.sort_menu();
//!
//! let tree = menu.into_tree();
//! let clothing = tree.find_folder(tree.root, "Clothing").unwrap();
//! assert_eq!(tree.menu(clothing).name, "VRCF_Menu_Clothing");
//! assert_eq!(tree.controls_of(clothing).count(), 2);
//! assert_eq!(fx.parameters().len(), 2);
//! ```
//!
//! ## Core Concepts
//!
//! - **Menus (`menu`)**: An arena of menus and controls. `MenuManager`
//!   creates folders and leaves by slash-separated path, merges foreign menu
//!   trees (cycles and shared submenus included), and sorts every menu by the
//!   position stamped on each control when it was created.
//! - **Paths (`path`)**: Path splitting with `\/` escapes, the `.dup.<N>`
//!   suffix that tells same-named sibling folders apart, and generated menu
//!   names.
//! - **Controllers (`controller`)**: Animation controllers made of layers,
//!   each with its own state machine and mask. `VfController` loads a copy of
//!   a host controller and normalizes it so features can edit it freely.
//! - **Sessions (`session`)**: Runs feature actions by priority against a
//!   shared menu and FX controller and turns failures into user-facing
//!   messages.
//! - **Build files (`config`)**: The YAML schema the CLI reads features from.

pub mod config;
pub mod controller;
pub mod error;
pub mod menu;
pub mod path;
pub mod session;

#[cfg(test)]
mod menu_proptest;
