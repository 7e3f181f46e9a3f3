//! Plane/component to logical channel mapping.
//!
//! A [`ChannelMap`] is built once when a decoder opens its source and is
//! never mutated afterwards. Each stored component gets a logical name
//! `"<plane>.<component>"`, with the short component names `r/g/b/a`
//! expanded to `red/green/blue/alpha` and an unnamed component read as
//! `red`. The logical name is then resolved, first match wins:
//!
//! | Logical name            | Channel(s)                                     |
//! |-------------------------|------------------------------------------------|
//! | `y` / `Y` (luminance)   | `Red`, plus `Green` and `Blue` unless luminance-only |
//! | `C.red` ... `C.alpha`   | `Red`, `Green`, `Blue`, `Alpha`                |
//! | `Pz.red`                | `Z`                                            |
//! | anything else           | [`Channel::named`] of the logical name         |
//!
//! When two components resolve to the same channel the earlier one keeps
//! it and the later pair is recorded as shadowed. `DeepFront` and
//! `DeepBack` are always derived; `Z` is derived when no `Pz.red` backs it.
//!
//! # Example
//!
//! ```rust
//! use deeprat_core::{BitDepth, Channel, PlaneInfo};
//! use deeprat_io::{ChannelMap, ChannelMapOptions};
//!
//! let planes = [
//!     PlaneInfo::new("C", ["r", "g", "b", "a"], BitDepth::F16),
//!     PlaneInfo::new("Of", ["r", "g", "b"], BitDepth::F16),
//! ];
//! let map = ChannelMap::build(&planes, ChannelMapOptions::default());
//!
//! assert_eq!(map.get(&Channel::Alpha).unwrap().component, 3);
//! assert!(map.get(&Channel::named("Of.green")).is_some());
//! assert!(map.is_derived(&Channel::Z));
//! ```

use std::collections::HashMap;
use std::fmt;

use deeprat_core::{Channel, ChannelSet, PlaneInfo};
use serde::{Deserialize, Serialize};
use smallvec::{smallvec, SmallVec};
use tracing::{debug, warn};

/// Reserved name of the color plane.
pub const COLOR_PLANE: &str = "C";
/// Reserved name of the depth plane.
pub const DEPTH_PLANE: &str = "Pz";
/// Reserved name of the accumulated opacity plane.
pub const OPACITY_PLANE: &str = "Of";

/// A stored component address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlaneComponent {
    /// Plane index in the source's plane list.
    pub plane: usize,
    /// Component index within the plane.
    pub component: usize,
}

impl PlaneComponent {
    /// Creates a component address.
    #[inline]
    pub const fn new(plane: usize, component: usize) -> Self {
        Self { plane, component }
    }
}

impl fmt::Display for PlaneComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.plane, self.component)
    }
}

/// Options for [`ChannelMap::build`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelMapOptions {
    /// Luminance lands in `Red` only, without green/blue expansion.
    pub luminance_only: bool,
}

impl ChannelMapOptions {
    /// Sets luminance-only mapping.
    pub fn with_luminance_only(mut self, luminance_only: bool) -> Self {
        self.luminance_only = luminance_only;
        self
    }
}

/// A component that lost its channel to an earlier one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shadowed {
    /// The contested channel.
    pub channel: Channel,
    /// The pair that was dropped.
    pub pair: PlaneComponent,
    /// The pair that keeps the channel.
    pub winner: PlaneComponent,
}

/// Immutable logical-channel lookup table for one source.
#[derive(Debug, Clone, Default)]
pub struct ChannelMap {
    entries: HashMap<Channel, PlaneComponent>,
    /// Mapped channels in the order they were first assigned.
    order: Vec<Channel>,
    derived: ChannelSet,
    shadowed: Vec<Shadowed>,
    unmapped: Vec<PlaneComponent>,
    color_plane: Option<usize>,
    depth_plane: Option<usize>,
    opacity_plane: Option<usize>,
}

/// Expands a short component name to its long form.
pub fn normalize_component(name: &str) -> &str {
    match name {
        "" | "r" => "red",
        "g" => "green",
        "b" => "blue",
        "a" => "alpha",
        other => other,
    }
}

/// Logical name of a stored component: `"<plane>.<component>"`.
pub fn logical_name(plane: &str, component: &str) -> String {
    format!("{}.{}", plane, normalize_component(component))
}

fn is_luminance(name: &str) -> bool {
    name == "y" || name == "Y"
}

/// Channels a logical name resolves to.
fn lookup(
    logical: &str,
    raw_component: &str,
    options: ChannelMapOptions,
) -> SmallVec<[Channel; 3]> {
    if is_luminance(logical) || is_luminance(raw_component) {
        return if options.luminance_only {
            smallvec![Channel::Red]
        } else {
            smallvec![Channel::Red, Channel::Green, Channel::Blue]
        };
    }
    match logical {
        "C.red" => smallvec![Channel::Red],
        "C.green" => smallvec![Channel::Green],
        "C.blue" => smallvec![Channel::Blue],
        "C.alpha" => smallvec![Channel::Alpha],
        "Pz.red" => smallvec![Channel::Z],
        other => smallvec![Channel::named(other)],
    }
}

impl ChannelMap {
    /// Builds the map for an ordered plane list.
    ///
    /// Never fails: components that cannot be named are recorded as
    /// unmapped and logged.
    pub fn build(planes: &[PlaneInfo], options: ChannelMapOptions) -> Self {
        let mut map = Self::default();

        for (p, plane) in planes.iter().enumerate() {
            match plane.name.as_str() {
                COLOR_PLANE if map.color_plane.is_none() => map.color_plane = Some(p),
                DEPTH_PLANE if map.depth_plane.is_none() => map.depth_plane = Some(p),
                OPACITY_PLANE if map.opacity_plane.is_none() => map.opacity_plane = Some(p),
                _ => {}
            }

            for c in 0..plane.component_count() {
                let pair = PlaneComponent::new(p, c);
                if plane.name.is_empty() {
                    warn!(plane = p, component = c, "component has no plane name, leaving it unmapped");
                    map.unmapped.push(pair);
                    continue;
                }

                let raw = plane.component_name(c);
                let logical = logical_name(&plane.name, raw);
                for channel in lookup(&logical, raw, options) {
                    map.assign(channel, pair);
                }
            }
        }

        map.derived.insert(Channel::DeepFront);
        map.derived.insert(Channel::DeepBack);
        if !map.entries.contains_key(&Channel::Z) {
            map.derived.insert(Channel::Z);
        }

        debug!(
            mapped = map.entries.len(),
            shadowed = map.shadowed.len(),
            unmapped = map.unmapped.len(),
            "channel map built"
        );
        map
    }

    fn assign(&mut self, channel: Channel, pair: PlaneComponent) {
        if let Some(&winner) = self.entries.get(&channel) {
            debug!(%channel, %pair, %winner, "channel already mapped, shadowing");
            self.shadowed.push(Shadowed {
                channel,
                pair,
                winner,
            });
            return;
        }
        self.order.push(channel.clone());
        self.entries.insert(channel, pair);
    }

    /// Backing pair of `channel`, if it is mapped.
    #[inline]
    pub fn get(&self, channel: &Channel) -> Option<PlaneComponent> {
        self.entries.get(channel).copied()
    }

    /// Returns `true` if `channel` is computed at decode time.
    #[inline]
    pub fn is_derived(&self, channel: &Channel) -> bool {
        self.derived.contains(channel)
    }

    /// Channels computed at decode time.
    pub fn derived(&self) -> &ChannelSet {
        &self.derived
    }

    /// Mapped channels with their pairs, in assignment order.
    pub fn iter(&self) -> impl Iterator<Item = (&Channel, PlaneComponent)> + '_ {
        self.order.iter().map(|c| (c, self.entries[c]))
    }

    /// Number of mapped channels.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is mapped.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pairs that lost a collision.
    pub fn shadowed(&self) -> &[Shadowed] {
        &self.shadowed
    }

    /// Pairs that could not be named.
    pub fn unmapped(&self) -> &[PlaneComponent] {
        &self.unmapped
    }

    /// Every mapped channel.
    pub fn mapped_channels(&self) -> ChannelSet {
        self.order.iter().cloned().collect()
    }

    /// Index of the `C` plane.
    pub fn color_plane(&self) -> Option<usize> {
        self.color_plane
    }

    /// Index of the `Pz` plane.
    pub fn depth_plane(&self) -> Option<usize> {
        self.depth_plane
    }

    /// Index of the `Of` plane.
    pub fn opacity_plane(&self) -> Option<usize> {
        self.opacity_plane
    }

    /// Groups requested channels by backing pair.
    ///
    /// Each group lists the pair and the output slots (indices into
    /// `requested`) that alias it, so the pair is read once and copied.
    /// Groups are ordered by the first slot that uses them. Derived and
    /// unmapped channels are left out.
    pub fn alias_groups(&self, requested: &ChannelSet) -> Vec<AliasGroup> {
        let mut groups: Vec<AliasGroup> = Vec::new();
        for (slot, channel) in requested.iter().enumerate() {
            let Some(pair) = self.get(channel) else {
                continue;
            };
            match groups.iter_mut().find(|g| g.pair == pair) {
                Some(group) => group.slots.push(slot),
                None => groups.push(AliasGroup {
                    pair,
                    slots: smallvec![slot],
                }),
            }
        }
        groups
    }
}

/// Requested output slots that share one backing pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasGroup {
    /// Backing pair.
    pub pair: PlaneComponent,
    /// Output slots, first one is decoded and the rest copied.
    pub slots: SmallVec<[usize; 4]>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use deeprat_core::BitDepth;

    fn plane(name: &str, comps: &[&str]) -> PlaneInfo {
        PlaneInfo::new(name, comps.iter().copied(), BitDepth::F32)
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize_component("r"), "red");
        assert_eq!(normalize_component(""), "red");
        assert_eq!(normalize_component("a"), "alpha");
        assert_eq!(normalize_component("u"), "u");
        assert_eq!(logical_name("Pz", ""), "Pz.red");
    }

    #[test]
    fn test_standard_planes() {
        let planes = [plane("C", &["r", "g", "b", "a"]), plane("Pz", &["r"])];
        let map = ChannelMap::build(&planes, ChannelMapOptions::default());

        assert_eq!(map.get(&Channel::Red), Some(PlaneComponent::new(0, 0)));
        assert_eq!(map.get(&Channel::Blue), Some(PlaneComponent::new(0, 2)));
        assert_eq!(map.get(&Channel::Z), Some(PlaneComponent::new(1, 0)));
        assert!(!map.is_derived(&Channel::Z));
        assert!(map.is_derived(&Channel::DeepFront));
        assert_eq!(map.color_plane(), Some(0));
        assert_eq!(map.depth_plane(), Some(1));
        assert_eq!(map.opacity_plane(), None);
    }

    #[test]
    fn test_named_channels() {
        let planes = [plane("Of", &["r", "g", "b"]), plane("N", &["x", "y2"])];
        let map = ChannelMap::build(&planes, ChannelMapOptions::default());
        assert_eq!(map.get(&Channel::named("Of.blue")), Some(PlaneComponent::new(0, 2)));
        assert_eq!(map.get(&Channel::named("N.x")), Some(PlaneComponent::new(1, 0)));
        assert_eq!(map.get(&Channel::Red), None);
        assert_eq!(map.opacity_plane(), Some(0));
    }

    #[test]
    fn test_luminance_expansion() {
        let planes = [plane("L", &["Y"])];
        let full = ChannelMap::build(&planes, ChannelMapOptions::default());
        let pair = PlaneComponent::new(0, 0);
        assert_eq!(full.get(&Channel::Red), Some(pair));
        assert_eq!(full.get(&Channel::Green), Some(pair));
        assert_eq!(full.get(&Channel::Blue), Some(pair));

        let lum = ChannelMap::build(&planes, ChannelMapOptions::default().with_luminance_only(true));
        assert_eq!(lum.get(&Channel::Red), Some(pair));
        assert_eq!(lum.get(&Channel::Green), None);
    }

    #[test]
    fn test_first_pair_wins() {
        let planes = [plane("C", &["r", "g", "b", "a"]), plane("C", &["r"])];
        let map = ChannelMap::build(&planes, ChannelMapOptions::default());
        assert_eq!(map.get(&Channel::Red), Some(PlaneComponent::new(0, 0)));
        assert_eq!(map.shadowed().len(), 1);
        assert_eq!(map.shadowed()[0].pair, PlaneComponent::new(1, 0));
        assert_eq!(map.shadowed()[0].winner, PlaneComponent::new(0, 0));
    }

    #[test]
    fn test_unnamed_plane_is_unmapped() {
        let planes = [plane("", &["r", "g"]), plane("C", &["r"])];
        let map = ChannelMap::build(&planes, ChannelMapOptions::default());
        assert_eq!(map.unmapped().len(), 2);
        assert_eq!(map.get(&Channel::Red), Some(PlaneComponent::new(1, 0)));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_every_pair_exists() {
        let planes = [
            plane("C", &["r", "g", "b", "a"]),
            plane("Pz", &["r", "g"]),
            plane("Of", &["r", "g", "b"]),
        ];
        let map = ChannelMap::build(&planes, ChannelMapOptions::default());
        for (_, pair) in map.iter() {
            assert!(pair.plane < planes.len());
            assert!(pair.component < planes[pair.plane].component_count());
        }
    }

    #[test]
    fn test_alias_groups() {
        let planes = [plane("L", &["y"]), plane("Pz", &["r"])];
        let map = ChannelMap::build(&planes, ChannelMapOptions::default());
        let requested: ChannelSet = "r,z,g,front,b".parse().unwrap();
        let groups = map.alias_groups(&requested);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].pair, PlaneComponent::new(0, 0));
        assert_eq!(groups[0].slots.as_slice(), &[0, 2, 4]);
        assert_eq!(groups[1].slots.as_slice(), &[1]);
    }
}
