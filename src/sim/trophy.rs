//! Trophy objective: a goal item the organism must find to win

use rand::Rng;
use serde::Serialize;

use crate::core::config::TrophyConfig;
use crate::core::types::{Cardinal, GridPos, Terrain};
use crate::world::World;

/// Coarse distance bucket reported to policies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceBand {
    VeryClose,
    Close,
    Moderate,
    Far,
}

/// Warmer/colder feedback relative to the previous tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Warmth {
    Warmer,
    Colder,
    Same,
}

/// Proximity hint surfaced in the observation
#[derive(Debug, Clone, Serialize)]
pub struct TrophyHint {
    #[serde(rename = "trophy_distance_approx")]
    pub distance_approx: DistanceBand,
    #[serde(rename = "trophy_temperature", skip_serializing_if = "Option::is_none")]
    pub temperature: Option<Warmth>,
    #[serde(rename = "trophy_direction", skip_serializing_if = "Option::is_none")]
    pub direction: Option<Cardinal>,
}

/// Trophy placement and hint state
pub struct Trophy {
    enabled: bool,
    pub pos: GridPos,
    pub found: bool,
    hint_interval: u64,
    warm_cold_enabled: bool,
    prev_distance: f64,
}

impl Trophy {
    /// Place the trophy at least `min_distance_from_spawn` (Manhattan)
    /// from the player, never on water. If 2000 rejection samples fail,
    /// fall back to the spawn point reflected across the map center.
    pub fn place(config: &TrophyConfig, world: &mut World, player_spawn: GridPos) -> Trophy {
        let mut trophy = Trophy {
            enabled: config.enabled,
            pos: GridPos::new(-1, -1),
            found: false,
            hint_interval: config.hint_interval,
            warm_cold_enabled: config.warm_cold_enabled,
            prev_distance: 9999.0,
        };
        if !config.enabled {
            return trophy;
        }

        let (w, h) = (world.width as i32, world.height as i32);
        for _ in 0..2000 {
            let x = world.rng.gen_range(3..w - 3);
            let y = world.rng.gen_range(3..h - 3);
            let pos = GridPos::new(x, y);
            if pos.manhattan(player_spawn) >= config.min_distance_from_spawn
                && world.terrain_at(pos) != Terrain::Water
            {
                trophy.pos = pos;
                return trophy;
            }
        }

        trophy.pos = GridPos::new(
            (w - player_spawn.x - 1).clamp(3, w - 4),
            (h - player_spawn.y - 1).clamp(3, h - 4),
        );
        tracing::warn!(pos = ?trophy.pos, "trophy placement fell back to reflected point");
        trophy
    }

    /// Check whether the player has reached the trophy (Chebyshev <= 1).
    ///
    /// The transition fires exactly once; later calls return false.
    pub fn check_found(&mut self, player: GridPos) -> bool {
        if !self.enabled || self.found {
            return false;
        }
        if player.chebyshev(self.pos) <= 1 {
            self.found = true;
            return true;
        }
        false
    }

    /// Generate the per-tick proximity hint.
    ///
    /// The cardinal direction is deliberately emitted only every
    /// `hint_interval` ticks; policies must remember it in between.
    pub fn hint(&mut self, player: GridPos, step: u64) -> Option<TrophyHint> {
        if !self.enabled {
            return None;
        }

        let dist = player.euclidean(self.pos);

        let distance_approx = if dist < 5.0 {
            DistanceBand::VeryClose
        } else if dist < 15.0 {
            DistanceBand::Close
        } else if dist < 30.0 {
            DistanceBand::Moderate
        } else {
            DistanceBand::Far
        };

        // The ±0.5 dead-zone keeps the hint from flickering on moves
        // that leave the distance essentially unchanged.
        let temperature = self.warm_cold_enabled.then(|| {
            if dist < self.prev_distance - 0.5 {
                Warmth::Warmer
            } else if dist > self.prev_distance + 0.5 {
                Warmth::Colder
            } else {
                Warmth::Same
            }
        });

        let direction = (step % self.hint_interval == 0).then(|| {
            let dx = self.pos.x - player.x;
            let dy = self.pos.y - player.y;
            if dx.abs() > dy.abs() {
                if dx > 0 {
                    Cardinal::E
                } else {
                    Cardinal::W
                }
            } else if dy > 0 {
                Cardinal::S
            } else {
                Cardinal::N
            }
        });

        self.prev_distance = dist;

        Some(TrophyHint {
            distance_approx,
            temperature,
            direction,
        })
    }
}
