//! Property-based tests for menu composition and controller normalization.
//!
//! These tests use proptest to generate random inputs and verify that
//! invariants hold for all of them.

#[cfg(test)]
mod proptest_tests {
    use crate::controller::{
        AnimatorController, AvatarMask, BodyPart, ControllerLayer, LayerType, VfController,
    };
    use crate::menu::{MenuManager, MenuTree, SequenceCounter};
    use crate::path::{join_path, parse_folder_segment, split_path};
    use proptest::prelude::*;

    fn segment() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9/._-][a-zA-Z0-9 /._-]{0,7}"
    }

    fn menu_path() -> impl Strategy<Value = String> {
        prop::collection::vec("[A-C]{1,2}", 1..4).prop_map(|segments| segments.join("/"))
    }

    fn mask() -> impl Strategy<Value = Option<AvatarMask>> {
        prop::option::of(prop::collection::vec(any::<bool>(), 13).prop_map(|bits| {
            let mut mask = AvatarMask::all_enabled("mask");
            for (part, enabled) in BodyPart::ALL.iter().zip(bits) {
                mask.set_enabled(*part, enabled);
            }
            mask
        }))
    }

    // ============================================================================
    // path property tests
    // ============================================================================

    proptest! {
        /// Property: joining then splitting gives back the original segments
        #[test]
        fn split_inverts_join(segments in prop::collection::vec(segment(), 1..5)) {
            prop_assert_eq!(split_path(&join_path(&segments)), segments);
        }

        /// Property: a path without escapes has one more segment than slashes
        #[test]
        fn split_counts_slashes(path in "[a-z]{1,3}(/[a-z]{0,3}){0,4}") {
            let slashes = path.matches('/').count();
            prop_assert_eq!(split_path(&path).len(), slashes + 1);
        }

        /// Property: a numeric dup suffix is always split off
        #[test]
        fn dup_suffix_parses(name in "[a-zA-Z ]{1,8}", offset in 0usize..1000) {
            let segment = format!("{}.dup.{}", name, offset);
            let parsed = parse_folder_segment(&segment);
            prop_assert_eq!(parsed.name, name.as_str());
            prop_assert_eq!(parsed.offset, offset);
        }
    }

    // ============================================================================
    // menu property tests
    // ============================================================================

    proptest! {
        /// Property: sorting an already sorted menu changes nothing
        #[test]
        fn sort_is_idempotent(
            entries in prop::collection::vec((menu_path(), -3i32..3), 0..20)
        ) {
            let positions: Vec<i32> = entries.iter().map(|(_, p)| *p).collect();
            let mut next = positions.into_iter().cycle();
            let mut manager = MenuManager::new(MenuTree::default(), move || next.next().unwrap_or(0));
            for (path, _) in &entries {
                manager.new_menu_item(path);
            }
            manager.sort_menu();
            let once = manager.raw().clone();
            manager.sort_menu();
            prop_assert_eq!(manager.raw(), &once);
        }

        /// Property: resolving a path a second time creates nothing
        #[test]
        fn ancestor_creation_is_idempotent(path in menu_path()) {
            let segments = split_path(&path);
            let mut manager = MenuManager::new(MenuTree::default(), SequenceCounter::default());
            let first = manager.get_or_create_submenu(&segments);
            let snapshot = manager.raw().clone();
            let second = manager.get_or_create_submenu(&segments);
            prop_assert_eq!(first, second);
            prop_assert_eq!(manager.raw(), &snapshot);
        }

        /// Property: every leaf lands in the menu its parent path resolves to
        #[test]
        fn leaves_land_under_their_parent(paths in prop::collection::vec(menu_path(), 1..10)) {
            let mut manager = MenuManager::new(MenuTree::default(), SequenceCounter::default());
            for path in &paths {
                let control = manager.new_menu_item(path);
                let mut segments = split_path(path);
                let name = segments.pop().unwrap_or_default();
                let parent = manager.find_submenu(&segments);
                prop_assert!(parent.is_some());
                let parent = parent.unwrap_or(manager.raw().root);
                prop_assert!(manager.raw().menu(parent).controls.contains(&control));
                prop_assert_eq!(&manager.raw().control(control).name, &name);
            }
        }
    }

    // ============================================================================
    // controller property tests
    // ============================================================================

    proptest! {
        /// Property: asking for a parameter again never adds a second one
        #[test]
        fn new_param_is_idempotent(names in prop::collection::vec("[a-d]", 1..12)) {
            let mut ctrl = VfController::empty("FX");
            for name in &names {
                ctrl.new_bool(name, false);
            }
            let count = ctrl.parameters().len();
            for name in &names {
                ctrl.new_bool(name, true);
            }
            prop_assert_eq!(ctrl.parameters().len(), count);
            let mut unique = names.clone();
            unique.sort();
            unique.dedup();
            prop_assert_eq!(count, unique.len());
        }

        /// Property: applying the base mask again is a no-op
        #[test]
        fn base_mask_is_a_fixed_point(
            masks in prop::collection::vec(mask(), 1..5),
            fx in any::<bool>(),
        ) {
            let layers = masks
                .into_iter()
                .enumerate()
                .map(|(i, mask)| ControllerLayer {
                    mask,
                    ..ControllerLayer::new(format!("L{}", i))
                })
                .collect();
            let mut ctrl = VfController::from(AnimatorController {
                name: "ctrl".to_string(),
                layers,
                parameters: Vec::new(),
            });
            let layer_type = if fx { LayerType::Fx } else { LayerType::Gesture };
            ctrl.apply_base_mask(layer_type);
            let once = ctrl.clone();
            ctrl.apply_base_mask(layer_type);
            prop_assert_eq!(ctrl, once);
        }
    }
}
