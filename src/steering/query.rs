//! Collaborator contracts the steering core calls into.
//!
//! The physics engine, the broad-phase index and the faction system all live
//! outside the core. Behaviors only see these traits, and the driver passes
//! concrete implementations in explicitly.

use bevy::prelude::*;

/// Collision layers for filtering spatial queries.
pub mod layers {
    pub const NONE: u32 = 0;
    pub const AGENT: u32 = 1 << 0;
    pub const OBSTACLE: u32 = 1 << 1;
    pub const BOUNDARY: u32 = 1 << 2;
    pub const STATIC: u32 = OBSTACLE | BOUNDARY;
    pub const ALL: u32 = u32::MAX;
}

/// Result of a swept-circle cast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CastHit {
    pub point: Vec2,
    /// Unit surface normal, pointing back toward the caster.
    pub normal: Vec2,
    pub distance: f32,
    pub entity: Option<Entity>,
}

/// How a collider pushes things away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColliderShape {
    /// A solid body; nearby agents are pushed away from its position.
    #[default]
    Solid,
    /// An enclosing wall (composite/edge collider); nearby agents are pushed
    /// back toward its position, i.e. inward.
    Boundary,
}

/// One collider touched by an overlap query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlapHit {
    pub entity: Option<Entity>,
    pub position: Vec2,
    pub radius: f32,
    pub is_trigger: bool,
    pub shape: ColliderShape,
}

/// Physics-side queries. Calls are synchronous and must be cheap enough to
/// run every tick, per agent, per whisker.
pub trait SpatialQuery {
    fn circle_cast(
        &self,
        origin: Vec2,
        radius: f32,
        direction: Vec2,
        max_distance: f32,
        mask: u32,
    ) -> Option<CastHit>;

    /// Collect every collider overlapping the circle into `out`.
    ///
    /// `out` is cleared first; the caller owns the buffer so repeated queries
    /// do not allocate.
    fn circle_overlap_all(&self, origin: Vec2, radius: f32, mask: u32, out: &mut Vec<OverlapHit>);
}

/// Broad-phase lookup of nearby agents.
pub trait CandidateProvider {
    /// Collect entities near `point` into `out` (cleared first), skipping `exclude`.
    ///
    /// Results may include agents slightly outside `radius`; behaviors apply
    /// their own distance tests.
    fn agents_in_radius(&self, point: Vec2, radius: f32, exclude: Option<Entity>, out: &mut Vec<Entity>);
}

/// Faction check used to filter group behaviors.
pub trait Friendliness {
    fn is_friendly(&self, a: Entity, b: Entity) -> bool;
}

/// Faction id. Agents sharing an id are friends.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Faction(pub u8);

/// Which candidates a group behavior considers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum CandidateFilter {
    #[default]
    All,
    Friendly,
    Hostile,
}

impl CandidateFilter {
    pub fn accepts<F: Friendliness + ?Sized>(self, friendliness: &F, me: Entity, other: Entity) -> bool {
        match self {
            CandidateFilter::All => true,
            CandidateFilter::Friendly => friendliness.is_friendly(me, other),
            CandidateFilter::Hostile => !friendliness.is_friendly(me, other),
        }
    }
}

/// Friendliness lookup over a precomputed entity → faction table.
pub struct FactionFriendliness<'a> {
    factions: &'a rustc_hash::FxHashMap<Entity, Faction>,
}

impl<'a> FactionFriendliness<'a> {
    pub fn new(factions: &'a rustc_hash::FxHashMap<Entity, Faction>) -> Self {
        Self { factions }
    }
}

impl Friendliness for FactionFriendliness<'_> {
    /// Agents without a faction are nobody's friend.
    fn is_friendly(&self, a: Entity, b: Entity) -> bool {
        match (self.factions.get(&a), self.factions.get(&b)) {
            (Some(fa), Some(fb)) => fa == fb,
            _ => false,
        }
    }
}
