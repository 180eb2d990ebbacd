//! Turns a player's "use" click on a block into a disguise gesture.
//!
//! Gestures, checked in this order:
//! 1. Removal: sneaking with an empty hand on a disguised block, or any click
//!    on a location armed by the previous event of the same gesture.
//! 2. Capture: sneaking with a blank capture item on an eligible block.
//!    Records the block on the item.
//! 3. Apply: a stamped capture item on a block without a disguise.
//!
//! Anything else passes through to the host.
//!
//! Deciding a gesture only reads the host. Everything that mutates the host
//! is returned as [`Effect`]s and performed by [`Interaction::perform_effects`],
//! after the caller has released its locks.

use rand::Rng;
use rand::rngs::StdRng;
use veilmc_format::EntryUpdate;
use veilmc_world::{
    CaptureItem, CaptureStamp, Coordinate, DisguiseEntry, EligibilityPolicy, GesturePhase, HeldItem, Location,
    PendingToggles, Player, SoundCue, SpatialStateStore, WorldAccess,
};

use crate::config::DisguiseConfig;

const PICKUP_SOUND: &str = "minecraft:entity.item.pickup";

/// Which copy of the store this process owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// The server. Mutates the store and broadcasts.
    Authoritative,
    /// A client. Only ever mutated by incoming sync messages.
    Replica,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Not a disguise gesture; the host handles the click as usual.
    Pass,
    /// Claimed, but nothing changed.
    Claimed,
    /// Second event of a two-phase gesture; swallowed.
    Debounced,
    Removed(DisguiseEntry),
    Captured(CaptureStamp),
    Applied(DisguiseEntry),
}

impl Outcome {
    /// Whether the host should cancel its default handling.
    pub fn is_claimed(&self) -> bool {
        !matches!(self, Outcome::Pass)
    }
}

/// A host mutation decided by a gesture.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Sound { at: [f64; 3], cue: SoundCue },
    StampHeld(CaptureStamp),
    ShrinkHeld(u32),
    SwingArm,
    /// Give `item` to the player with a pickup cue, or drop it at `drop_at`
    /// when the inventory is full.
    Reward { item: CaptureItem, pitch: f32, drop_at: [f64; 3] },
}

/// Result of one interaction: what happened, what to send, and what the
/// host still has to do.
#[derive(Debug)]
pub struct Interaction {
    pub outcome: Outcome,
    pub broadcast: Option<EntryUpdate>,
    pub notify_swing: bool,
    pub effects: Vec<Effect>,
}

impl Interaction {
    fn local(outcome: Outcome) -> Self {
        Self {
            outcome,
            broadcast: None,
            notify_swing: false,
            effects: Vec::new(),
        }
    }

    fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }

    /// Run the pending host effects, in order.
    pub fn perform_effects(&mut self, world: &mut dyn WorldAccess, player: &mut dyn Player) {
        for effect in self.effects.drain(..) {
            match effect {
                Effect::Sound { at, cue } => world.play_sound(at, &cue),
                Effect::StampHeld(stamp) => player.stamp_main_hand(stamp),
                Effect::ShrinkHeld(count) => player.shrink_main_hand(count),
                Effect::SwingArm => player.swing_arm(),
                Effect::Reward { item, pitch, drop_at } => {
                    if player.give(item.clone()) {
                        world.play_sound(player.position(), &SoundCue::new(PICKUP_SOUND, 0.2, pitch));
                    } else {
                        world.spawn_item(drop_at, item, player.name());
                    }
                }
            }
        }
    }
}

pub struct InteractionController<'a> {
    pub side: Side,
    pub store: &'a mut SpatialStateStore,
    pub pending: &'a mut PendingToggles,
    pub policy: &'a EligibilityPolicy,
    pub config: &'a DisguiseConfig,
    pub rng: &'a mut StdRng,
}

impl InteractionController<'_> {
    pub fn handle(&mut self, world: &dyn WorldAccess, player: &dyn Player, coord: Coordinate) -> Interaction {
        let location = Location::new(world.partition(), coord);
        let held = player.main_hand();
        let disguised = self.store.has(world, coord, self.policy);

        if (disguised && held.is_empty() && player.is_sneaking()) || self.pending.is_armed(&location) {
            return self.removal(world, player, location);
        }

        let HeldItem::Capture(CaptureItem { stamp }) = held else {
            return Interaction::local(Outcome::Pass);
        };
        match stamp {
            None if player.is_sneaking() => self.capture(world, coord),
            Some(stamp) if !disguised => self.apply(world, player, location, &stamp),
            _ => Interaction::local(Outcome::Pass),
        }
    }

    fn removal(&mut self, world: &dyn WorldAccess, player: &dyn Player, location: Location) -> Interaction {
        if self.side == Side::Replica {
            return Interaction::local(Outcome::Claimed);
        }
        if self.pending.advance(location) == GesturePhase::Second {
            return Interaction::local(Outcome::Debounced);
        }

        let Location { partition, coord } = location;
        let Some(entry) = self.store.remove(partition, coord) else {
            return Interaction::local(Outcome::Claimed);
        };

        let mut effects = Vec::new();
        if player.game_mode().consumes_items() {
            let color = world.map_color(&entry.displayed, coord);
            effects.push(Effect::Reward {
                item: CaptureItem::stamped(CaptureStamp::from_state(&entry.displayed, color)),
                pitch: ((self.rng.gen_range(0.0..1.0f32) - self.rng.gen_range(0.0..1.0f32)) * 0.7 + 1.0) * 2.0,
                drop_at: [coord.x as f64 + 0.5, coord.y as f64 + 1.0, coord.z as f64 + 0.5],
            });
        }

        Interaction {
            outcome: Outcome::Removed(entry),
            broadcast: Some(EntryUpdate::remove(partition, coord)),
            notify_swing: false,
            effects,
        }
    }

    fn capture(&mut self, world: &dyn WorldAccess, coord: Coordinate) -> Interaction {
        let target = world.block_at(coord);
        if !self.policy.can_be_mirrored(&target) {
            return Interaction::local(Outcome::Pass);
        }

        let stamp = CaptureStamp::from_state(&target, world.map_color(&target, coord));
        Interaction::local(Outcome::Captured(stamp.clone())).with_effects([
            Effect::StampHeld(stamp),
            Effect::SwingArm,
            Effect::Sound {
                at: coord.center(),
                cue: self.config.capture_sound.clone(),
            },
        ])
    }

    fn apply(
        &mut self,
        world: &dyn WorldAccess,
        player: &dyn Player,
        location: Location,
        stamp: &CaptureStamp,
    ) -> Interaction {
        let Location { partition, coord } = location;
        let Some(displayed) = stamp.state().filter(|state| !state.is_air()) else {
            return Interaction::local(Outcome::Claimed);
        };
        let underlying = world.block_at(coord);
        if !self.policy.can_be_mirrored(&displayed) || !self.policy.can_host_disguise(&underlying) {
            return Interaction::local(Outcome::Claimed);
        }

        if self.side == Side::Replica {
            return Interaction::local(Outcome::Claimed).with_effects([Effect::Sound {
                at: coord.center(),
                cue: self.config.apply_sound.clone(),
            }]);
        }

        self.store.put(partition, coord, displayed.clone(), underlying.clone());
        let mut effects = Vec::new();
        if player.game_mode().consumes_items() && self.pending.advance(location) == GesturePhase::First {
            effects.push(Effect::ShrinkHeld(1));
        }
        effects.push(Effect::SwingArm);

        Interaction {
            outcome: Outcome::Applied(DisguiseEntry::new(displayed.clone(), underlying.clone())),
            broadcast: Some(EntryUpdate::apply(partition, coord, displayed, underlying)),
            notify_swing: true,
            effects,
        }
    }
}
