//! World generation: procedural terrain, elevation, water, vegetation
//!
//! All grid state lives here. Static fields (terrain, elevation, soil,
//! movement cost, water mask, distance-to-water) are fixed at
//! generation; only the environmental fields in `climate` mutate per
//! tick. Generation is a pure function of (config, seed).

pub mod climate;
pub mod noise;

use std::collections::VecDeque;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::core::config::Config;
use crate::core::types::{GridPos, Soil, Terrain, VegetationKind};
use crate::world::noise::fractal_noise;

/// Sentinel distance when no water exists anywhere on the map
pub const DIST_TO_WATER_FAR: u32 = 9999;

/// Grid-level world state, row-major `width * height` arrays
pub struct World {
    pub width: usize,
    pub height: usize,

    // Static after generation
    pub elevation: Vec<f64>,
    pub terrain: Vec<Terrain>,
    pub soil: Vec<Soil>,
    pub vegetation_kind: Vec<VegetationKind>,
    pub water_mask: Vec<bool>,
    pub wildlife_risk: Vec<f64>,
    pub shelter_quality: Vec<f64>,
    pub movement_cost: Vec<f64>,
    pub dist_to_water: Vec<u32>,

    // Updated each tick by `climate::advance`
    pub air_temp_c: Vec<f64>,
    pub humidity: Vec<f64>,
    pub precip_prob: Vec<f64>,
    pub water_availability: Vec<f64>,
    pub vegetation_biomass: Vec<f64>,

    /// The episode's deterministic random stream. World generation,
    /// climate noise, hazards, and hunter patrol all draw from it in a
    /// fixed call order.
    pub rng: ChaCha8Rng,
}

impl World {
    /// Generate a world from config and seed.
    pub fn generate(config: &Config, seed: u64) -> World {
        let width = config.map.width;
        let height = config.map.height;
        let cells = width * height;
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        // Elevation: fractal noise scaled to 0-3000 m
        let elevation: Vec<f64> = fractal_noise(
            width,
            height,
            &mut rng,
            config.map.elevation_octaves,
            config.map.elevation_scale,
        )
        .into_iter()
        .map(|v| v * 3000.0)
        .collect();

        let mut world = World {
            width,
            height,
            elevation,
            terrain: vec![Terrain::Plains; cells],
            soil: vec![Soil::Loamy; cells],
            vegetation_kind: vec![VegetationKind::None; cells],
            water_mask: vec![false; cells],
            wildlife_risk: vec![0.0; cells],
            shelter_quality: vec![0.0; cells],
            movement_cost: vec![1.0; cells],
            dist_to_water: vec![DIST_TO_WATER_FAR; cells],
            air_temp_c: vec![0.0; cells],
            humidity: vec![0.0; cells],
            precip_prob: vec![0.0; cells],
            water_availability: vec![0.0; cells],
            vegetation_biomass: vec![0.0; cells],
            rng,
        };

        world.assign_terrain(config);
        world.place_water_bodies(config);
        world.init_cell_properties();
        world.compute_dist_to_water();

        tracing::debug!(
            width,
            height,
            seed,
            water_cells = world.water_mask.iter().filter(|&&w| w).count(),
            "world generated"
        );

        world
    }

    /// Assign terrain via cumulative weight thresholds on fractal noise.
    fn assign_terrain(&mut self, config: &Config) {
        let noise = fractal_noise(self.width, self.height, &mut self.rng, 3, 0.08);
        let cum = config.map.terrain_weights.cumulative();

        for i in 0..self.terrain.len() {
            let val = noise[i];
            let bucket = cum.iter().position(|&c| val < c).unwrap_or(cum.len() - 1);
            self.terrain[i] = Terrain::ALL[bucket];
        }
    }

    /// Paint lakes and carve rivers, overriding the noise terrain.
    fn place_water_bodies(&mut self, config: &Config) {
        let (w, h) = (self.width as i32, self.height as i32);

        // Lakes: circular blobs at random interior points
        for _ in 0..config.map.num_lakes {
            let cy = self.rng.gen_range(5..h - 5);
            let cx = self.rng.gen_range(5..w - 5);
            let radius = self.rng.gen_range(2..6);
            for dy in -radius..=radius {
                for dx in -radius..=radius {
                    let (nx, ny) = (cx + dx, cy + dy);
                    if self.in_bounds(nx, ny) && dx * dx + dy * dy <= radius * radius {
                        let idx = self.idx(nx, ny);
                        self.terrain[idx] = Terrain::Water;
                        self.water_mask[idx] = true;
                    }
                }
            }
        }

        // Rivers: randomized steepest-descent walks. A 30% chance of a
        // non-optimal step keeps rivers from running perfectly straight.
        for _ in 0..config.map.num_rivers {
            let mut y = self.rng.gen_range(0..h);
            let mut x = self.rng.gen_range(0..w);
            for _ in 0..self.width.max(self.height) {
                if !self.in_bounds(x, y) {
                    break;
                }
                let idx = self.idx(x, y);
                self.terrain[idx] = Terrain::Water;
                self.water_mask[idx] = true;

                let mut best_e = self.elevation[idx];
                let mut best_d = (0i32, 1i32);
                for (dy, dx) in [(-1, 0), (1, 0), (0, -1), (0, 1)] {
                    let (nx, ny) = (x + dx, y + dy);
                    if self.in_bounds(nx, ny) {
                        let ne = self.elevation[self.idx(nx, ny)];
                        if ne < best_e || self.rng.gen::<f64>() < 0.3 {
                            best_e = ne;
                            best_d = (dy, dx);
                        }
                    }
                }
                y += best_d.0;
                x += best_d.1;
            }
        }
    }

    /// Derive per-cell properties from terrain, with independent jitter.
    fn init_cell_properties(&mut self) {
        for i in 0..self.terrain.len() {
            let t = self.terrain[i];

            let soils = t.soils();
            self.soil[i] = soils[self.rng.gen_range(0..soils.len())];

            let veg_kinds = t.vegetation_kinds();
            let veg = veg_kinds[self.rng.gen_range(0..veg_kinds.len())];
            self.vegetation_kind[i] = veg;
            let (lo, hi) = veg.initial_biomass();
            self.vegetation_biomass[i] = if hi > lo { self.rng.gen_range(lo..hi) } else { 0.0 };

            self.wildlife_risk[i] =
                (t.wildlife_base() * self.rng.gen_range(0.5..1.5)).clamp(0.0, 1.0);
            self.shelter_quality[i] =
                (t.shelter_base() * self.rng.gen_range(0.5..1.5)).clamp(0.0, 1.0);
            self.movement_cost[i] = t.movement_cost();

            if self.water_mask[i] {
                self.water_availability[i] = 1.0;
            }
        }
    }

    /// Multi-source 4-connected BFS from every water cell.
    fn compute_dist_to_water(&mut self) {
        let mut queue: VecDeque<(i32, i32)> = VecDeque::new();
        for y in 0..self.height as i32 {
            for x in 0..self.width as i32 {
                let idx = self.idx(x, y);
                if self.water_mask[idx] {
                    self.dist_to_water[idx] = 0;
                    queue.push_back((x, y));
                }
            }
        }

        while let Some((cx, cy)) = queue.pop_front() {
            let next = self.dist_to_water[self.idx(cx, cy)] + 1;
            for (dx, dy) in [(0, -1), (0, 1), (-1, 0), (1, 0)] {
                let (nx, ny) = (cx + dx, cy + dy);
                if !self.in_bounds(nx, ny) {
                    continue;
                }
                let idx = self.idx(nx, ny);
                if next < self.dist_to_water[idx] {
                    self.dist_to_water[idx] = next;
                    queue.push_back((nx, ny));
                }
            }
        }
    }

    #[inline]
    pub fn idx(&self, x: i32, y: i32) -> usize {
        y as usize * self.width + x as usize
    }

    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && (x as usize) < self.width && y >= 0 && (y as usize) < self.height
    }

    pub fn terrain_at(&self, pos: GridPos) -> Terrain {
        self.terrain[self.idx(pos.x, pos.y)]
    }

    /// Find a reasonable spawn point: non-water, non-mountain.
    pub fn find_spawn_point(&mut self) -> GridPos {
        let (w, h) = (self.width as i32, self.height as i32);
        for _ in 0..1000 {
            let x = self.rng.gen_range(5..w - 5);
            let y = self.rng.gen_range(5..h - 5);
            let t = self.terrain[self.idx(x, y)];
            if t != Terrain::Water && t != Terrain::Mountain {
                return GridPos::new(x, y);
            }
        }
        // Fallback: center
        GridPos::new(w / 2, h / 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_fields_populated() {
        let config = Config::default();
        let world = World::generate(&config, 99);
        assert_eq!(world.elevation.len(), 80 * 60);
        for &e in &world.elevation {
            assert!((0.0..=3000.0).contains(&e), "elevation {} out of range", e);
        }
        for &r in &world.wildlife_risk {
            assert!((0.0..=1.0).contains(&r));
        }
        for &m in &world.movement_cost {
            assert!(m >= 1.0);
        }
    }

    #[test]
    fn test_water_mask_matches_terrain() {
        let config = Config::default();
        let world = World::generate(&config, 5);
        for i in 0..world.water_mask.len() {
            if world.water_mask[i] {
                assert_eq!(world.terrain[i], Terrain::Water);
                assert_eq!(world.dist_to_water[i], 0);
                assert_eq!(world.water_availability[i], 1.0);
            }
        }
    }

    #[test]
    fn test_dist_to_water_gradient() {
        let config = Config::default();
        let world = World::generate(&config, 5);
        // Any non-water cell adjacent to water must have distance 1
        for y in 0..world.height as i32 {
            for x in 0..world.width as i32 {
                let d = world.dist_to_water[world.idx(x, y)];
                if d == 0 || d == DIST_TO_WATER_FAR {
                    continue;
                }
                let min_neighbor = [(0, -1), (0, 1), (-1, 0), (1, 0)]
                    .iter()
                    .filter(|&&(dx, dy)| world.in_bounds(x + dx, y + dy))
                    .map(|&(dx, dy)| world.dist_to_water[world.idx(x + dx, y + dy)])
                    .min()
                    .unwrap();
                assert_eq!(d, min_neighbor + 1, "BFS distance not tight at ({x},{y})");
            }
        }
    }

    #[test]
    fn test_no_water_saturates_distance() {
        let mut config = Config::default();
        config.map.num_lakes = 0;
        config.map.num_rivers = 0;
        // Weight everything away from water terrain
        config.map.terrain_weights.water = 0.0;
        let world = World::generate(&config, 3);
        if !world.water_mask.iter().any(|&w| w) {
            assert!(world.dist_to_water.iter().all(|&d| d == DIST_TO_WATER_FAR));
        }
    }

    #[test]
    fn test_spawn_point_habitable() {
        let config = Config::default();
        let mut world = World::generate(&config, 11);
        let spawn = world.find_spawn_point();
        let t = world.terrain_at(spawn);
        assert_ne!(t, Terrain::Water);
        assert_ne!(t, Terrain::Mountain);
    }
}
