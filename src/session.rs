//! # Build Sessions
//!
//! A build session runs feature actions against one shared menu and one
//! shared FX controller. Each feature registers an action with a priority;
//! actions run lowest priority first, and features with equal priority run
//! in registration order.
//!
//! While an action runs, every menu control it creates is stamped with the
//! feature's number, so the final menu groups controls by feature no matter
//! which action created them.
//!
//! ## Failures
//!
//! [`BuildSession::run`] stops at the first failing action and returns its
//! error wrapped in [`Error::Action`]. [`BuildSession::safe_run`] is the
//! top-level entry point: it logs the whole error chain, turns the failure
//! into a [`BuildFailure`] with a message fit for the person who configured
//! the avatar, and drops the partial output.

use log::{debug, error, info};

use crate::controller::VfController;
use crate::error::{Error, Result};
use crate::menu::sort::SharedPosition;
use crate::menu::{MenuManager, MenuTree};

/// Shared state handed to every feature action.
#[derive(Debug)]
pub struct BuildContext {
    pub menu: MenuManager,
    pub fx: VfController,
}

type ActionFn = Box<dyn FnOnce(&mut BuildContext) -> Result<()>>;

struct FeatureAction {
    priority: i32,
    feature_number: usize,
    name: String,
    run: ActionFn,
}

/// What a successful session produced.
#[derive(Debug)]
pub struct BuildOutput {
    pub menu: MenuTree,
    pub fx: VfController,
}

/// A failed session, ready to be shown to a user.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct BuildFailure {
    /// Builder messages verbatim; anything else prefixed with a generic notice
    pub message: String,
    #[source]
    pub error: Error,
}

/// Runs prioritized feature actions over a shared menu and FX controller.
pub struct BuildSession {
    context: BuildContext,
    position: SharedPosition,
    actions: Vec<FeatureAction>,
}

impl BuildSession {
    pub fn new(menu: MenuTree, fx: VfController) -> Self {
        let position = SharedPosition::new();
        Self {
            context: BuildContext {
                menu: MenuManager::new(menu, position.clone()),
                fx,
            },
            position,
            actions: Vec::new(),
        }
    }

    /// Register a feature with a single action and return its number.
    pub fn add_feature<F>(&mut self, name: impl Into<String>, priority: i32, action: F) -> usize
    where
        F: FnOnce(&mut BuildContext) -> Result<()> + 'static,
    {
        let feature_number = self.actions.len();
        self.actions.push(FeatureAction {
            priority,
            feature_number,
            name: name.into(),
            run: Box::new(action),
        });
        feature_number
    }

    pub fn feature_count(&self) -> usize {
        self.actions.len()
    }

    /// Run every action and sort the resulting menu.
    pub fn run(self) -> Result<BuildOutput> {
        let BuildSession {
            mut context,
            position,
            mut actions,
        } = self;

        actions.sort_by_key(|action| action.priority);
        for action in actions {
            debug!(
                "Running {} (feature {}, priority {})",
                action.name, action.feature_number, action.priority
            );
            position.set(i32::try_from(action.feature_number).unwrap_or(i32::MAX));
            (action.run)(&mut context).map_err(|e| {
                e.in_action(format!("{} (feature {})", action.name, action.feature_number))
            })?;
        }

        context.menu.sort_menu();
        info!("Build finished");
        Ok(BuildOutput {
            menu: context.menu.into_tree(),
            fx: context.fx,
        })
    }

    /// Run the session, converting any failure into a [`BuildFailure`].
    pub fn safe_run(self) -> std::result::Result<BuildOutput, BuildFailure> {
        self.run().map_err(|err| {
            error!("Build failed: {}", error_chain(&err));
            let cause = err.root_cause();
            let message = match cause {
                Error::Builder { message } => message.clone(),
                other => format!("avatar-compose encountered an error.\n\n{}", other),
            };
            BuildFailure {
                message,
                error: err,
            }
        })
    }
}

/// Every message in an error's source chain, outermost first.
fn error_chain(err: &Error) -> String {
    let mut chain = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        chain.push_str("\n  caused by: ");
        chain.push_str(&cause.to_string());
        source = cause.source();
    }
    chain
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn session() -> BuildSession {
        BuildSession::new(MenuTree::default(), VfController::empty("FX"))
    }

    fn names(output: &BuildOutput) -> Vec<String> {
        output
            .menu
            .controls_of(output.menu.root)
            .map(|c| c.name.clone())
            .collect()
    }

    #[test]
    fn test_actions_run_by_priority_then_registration() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut session = session();
        for (name, priority) in [("late", 10), ("first", 0), ("second", 0)] {
            let order = order.clone();
            session.add_feature(name, priority, move |_| {
                order.borrow_mut().push(name);
                Ok(())
            });
        }
        session.run().unwrap();
        assert_eq!(*order.borrow(), vec!["first", "second", "late"]);
    }

    #[test]
    fn test_menu_is_grouped_by_feature_number() {
        let mut session = session();
        // runs last, but was registered first
        session.add_feature("A", 5, |ctx| {
            let param = ctx.fx.new_bool("A", false);
            ctx.menu.new_menu_toggle("A", &param, 1.0, None);
            Ok(())
        });
        session.add_feature("B", 0, |ctx| {
            let param = ctx.fx.new_bool("B", false);
            ctx.menu.new_menu_toggle("B", &param, 1.0, None);
            Ok(())
        });
        let output = session.run().unwrap();
        assert_eq!(names(&output), vec!["A", "B"]);
        assert_eq!(output.fx.parameters().len(), 2);
    }

    #[test]
    fn test_builder_failure_message_is_verbatim() {
        let mut session = session();
        session.add_feature("Hat", 0, |_| Err(Error::builder("Hat toggle needs a parameter")));
        let failure = session.safe_run().unwrap_err();
        assert_eq!(failure.message, "Hat toggle needs a parameter");
        assert!(matches!(failure.error, Error::Action { .. }));
        assert!(failure.error.is_builder_failure());
    }

    #[test]
    fn test_other_failures_get_generic_message() {
        let mut session = session();
        session.add_feature("Broken", 0, |ctx| {
            ctx.fx.require_layer(3)?;
            Ok(())
        });
        let failure = session.safe_run().unwrap_err();
        assert!(failure.message.starts_with("avatar-compose encountered an error."));
        assert!(failure.message.contains("Layer 3 not found"));
    }

    #[test]
    fn test_failure_stops_later_actions_and_logs_chain() {
        testing_logger::setup();
        let ran = Rc::new(RefCell::new(false));
        let mut session = session();
        session.add_feature("Bad", 0, |_| Err(Error::builder("nope")));
        let ran_clone = ran.clone();
        session.add_feature("Later", 1, move |_| {
            *ran_clone.borrow_mut() = true;
            Ok(())
        });
        assert!(session.safe_run().is_err());
        assert!(!*ran.borrow());
        testing_logger::validate(|logs| {
            assert!(logs.iter().any(|l| l.level == log::Level::Error
                && l.body.contains("Failed to apply Bad (feature 0)")
                && l.body.contains("caused by: nope")));
        });
    }

    #[test]
    fn test_feature_numbers() {
        let mut session = session();
        assert_eq!(session.add_feature("a", 0, |_| Ok(())), 0);
        assert_eq!(session.add_feature("b", 0, |_| Ok(())), 1);
        assert_eq!(session.feature_count(), 2);
    }
}
