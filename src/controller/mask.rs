//! Layer masks
//!
//! A mask enables or disables humanoid body parts for a layer and can
//! optionally restrict which transform paths the layer may animate. Masks
//! combine by intersection: something stays enabled only if both masks enable
//! it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Humanoid body regions a mask can switch on or off.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyPart {
    Root,
    Body,
    Head,
    LeftLeg,
    RightLeg,
    LeftArm,
    RightArm,
    LeftFingers,
    RightFingers,
    LeftFootIk,
    RightFootIk,
    LeftHandIk,
    RightHandIk,
}

impl BodyPart {
    pub const ALL: [BodyPart; 13] = [
        BodyPart::Root,
        BodyPart::Body,
        BodyPart::Head,
        BodyPart::LeftLeg,
        BodyPart::RightLeg,
        BodyPart::LeftArm,
        BodyPart::RightArm,
        BodyPart::LeftFingers,
        BodyPart::RightFingers,
        BodyPart::LeftFootIk,
        BodyPart::RightFootIk,
        BodyPart::LeftHandIk,
        BodyPart::RightHandIk,
    ];

    fn bit(self) -> u16 {
        1 << (self as u16)
    }
}

const ALL_BITS: u16 = (1 << BodyPart::ALL.len()) - 1;

/// Which body parts and transforms a layer may animate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "MaskRepr", into = "MaskRepr")]
pub struct AvatarMask {
    pub name: String,
    enabled: u16,
    /// Transform paths the layer may animate. `None` means no restriction.
    transforms: Option<BTreeSet<String>>,
}

impl Default for AvatarMask {
    fn default() -> Self {
        Self::all_enabled("")
    }
}

impl AvatarMask {
    /// A mask that enables every body part and every transform.
    pub fn all_enabled(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: ALL_BITS,
            transforms: None,
        }
    }

    /// The mask synthesized for an FX controller whose base layer has none.
    pub fn default_fx() -> Self {
        Self::all_enabled("Default FX Mask")
    }

    pub fn is_enabled(&self, part: BodyPart) -> bool {
        self.enabled & part.bit() != 0
    }

    pub fn set_enabled(&mut self, part: BodyPart, enabled: bool) {
        if enabled {
            self.enabled |= part.bit();
        } else {
            self.enabled &= !part.bit();
        }
    }

    pub fn transforms(&self) -> Option<&BTreeSet<String>> {
        self.transforms.as_ref()
    }

    /// Restrict the mask to exactly these transform paths.
    pub fn restrict_transforms<I, S>(&mut self, paths: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.transforms = Some(paths.into_iter().map(Into::into).collect());
    }

    /// Whether the mask lets a layer animate `path`.
    pub fn allows_transform(&self, path: &str) -> bool {
        self.transforms.as_ref().map_or(true, |t| t.contains(path))
    }

    /// Keep only what both masks enable. Updates `self` in place.
    pub fn intersect_with(&mut self, other: &AvatarMask) {
        self.enabled &= other.enabled;
        self.transforms = match (self.transforms.take(), &other.transforms) {
            (None, None) => None,
            (Some(mine), None) => Some(mine),
            (None, Some(theirs)) => Some(theirs.clone()),
            (Some(mine), Some(theirs)) => Some(mine.intersection(theirs).cloned().collect()),
        };
    }
}

#[derive(Serialize, Deserialize)]
struct MaskRepr {
    #[serde(default)]
    name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    disabled: Vec<BodyPart>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    transforms: Option<BTreeSet<String>>,
}

impl From<MaskRepr> for AvatarMask {
    fn from(repr: MaskRepr) -> Self {
        let mut mask = AvatarMask::all_enabled(repr.name);
        for part in repr.disabled {
            mask.set_enabled(part, false);
        }
        mask.transforms = repr.transforms;
        mask
    }
}

impl From<AvatarMask> for MaskRepr {
    fn from(mask: AvatarMask) -> Self {
        Self {
            disabled: BodyPart::ALL
                .into_iter()
                .filter(|p| !mask.is_enabled(*p))
                .collect(),
            name: mask.name,
            transforms: mask.transforms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_enabled() {
        let mask = AvatarMask::all_enabled("m");
        assert!(BodyPart::ALL.iter().all(|p| mask.is_enabled(*p)));
        assert!(mask.allows_transform("Armature/Hips"));
    }

    #[test]
    fn test_intersect_body_parts() {
        let mut a = AvatarMask::all_enabled("a");
        a.set_enabled(BodyPart::Head, false);
        let mut b = AvatarMask::all_enabled("b");
        b.set_enabled(BodyPart::LeftArm, false);

        a.intersect_with(&b);
        assert!(!a.is_enabled(BodyPart::Head));
        assert!(!a.is_enabled(BodyPart::LeftArm));
        assert!(a.is_enabled(BodyPart::RightArm));
        assert_eq!(a.name, "a");
    }

    #[test]
    fn test_intersect_transforms() {
        let mut a = AvatarMask::all_enabled("a");
        let mut b = AvatarMask::all_enabled("b");
        b.restrict_transforms(["Hat", "Tail"]);

        a.intersect_with(&b);
        assert!(a.allows_transform("Hat"));
        assert!(!a.allows_transform("Ears"));

        let mut c = AvatarMask::all_enabled("c");
        c.restrict_transforms(["Tail", "Ears"]);
        a.intersect_with(&c);
        assert_eq!(
            a.transforms().unwrap().iter().collect::<Vec<_>>(),
            vec!["Tail"]
        );
    }

    #[test]
    fn test_intersect_is_idempotent() {
        let mut base = AvatarMask::all_enabled("base");
        base.set_enabled(BodyPart::Body, false);
        base.restrict_transforms(["Hat"]);
        let mut mask = base.clone();
        mask.intersect_with(&base);
        assert_eq!(mask, base);
    }

    #[test]
    fn test_yaml_lists_disabled_parts() {
        let mut mask = AvatarMask::all_enabled("m");
        mask.set_enabled(BodyPart::LeftFingers, false);
        let yaml = serde_yaml::to_string(&mask).unwrap();
        assert!(yaml.contains("left_fingers"));

        let back: AvatarMask = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, mask);
    }
}
