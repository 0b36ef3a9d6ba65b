//! Environment dynamics: temperature, humidity, precipitation, water,
//! vegetation
//!
//! Time is derived exactly from the step index every call. Accumulating
//! hours across calls would drift under floating point and break replay
//! determinism.

use std::f64::consts::PI;

use rand::Rng;
use rand_distr::StandardNormal;
use serde::Serialize;

use crate::core::config::Config;
use crate::world::World;

/// Derived wall-clock for a given step
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TimeInfo {
    pub step: u64,
    pub day_of_year: u32,
    pub hour: u32,
    pub total_hours: f64,
}

/// Exact time derivation for a step index.
pub fn time_info(step: u64, config: &Config) -> TimeInfo {
    let total_hours = config.sim.start_hour + step as f64 * config.sim.dt_hours;
    let hour = total_hours % 24.0;
    let day = (config.sim.start_day + total_hours / 24.0) % 365.0;
    TimeInfo {
        step,
        day_of_year: day as u32,
        hour: hour as u32,
        total_hours,
    }
}

/// Update all environmental fields for the current step.
///
/// Mutates only the time-varying fields; terrain, elevation, and the
/// distance-to-water map are never touched.
pub fn advance(world: &mut World, step: u64, config: &Config) {
    let dt = config.sim.dt_hours;
    let total_hours = config.sim.start_hour + step as f64 * dt;
    let hour = total_hours % 24.0;
    let day = (config.sim.start_day + total_hours / 24.0) % 365.0;

    update_temperature(world, hour, day, config);
    update_humidity(world);
    update_precipitation(world, day);
    update_water_availability(world);
    update_vegetation(world, dt);
}

fn update_temperature(world: &mut World, hour: f64, day: f64, config: &Config) {
    let cc = &config.climate;
    let temp_ext = config.difficulty.temperature_extremity;
    let seasonal_phase = (2.0 * PI * day / 365.0).sin();
    // Phase shifted so the diurnal peak lands in the afternoon
    let diurnal_phase = (2.0 * PI * hour / 24.0 - PI / 2.0).sin();

    for i in 0..world.air_temp_c.len() {
        let t = world.terrain[i];
        let base = t.base_temp_c() - cc.lapse_rate * (world.elevation[i] / 1000.0);
        let seasonal = t.seasonal_amp() * temp_ext * seasonal_phase;
        let diurnal = t.diurnal_amp() * temp_ext * diurnal_phase;
        let noise = world.rng.sample::<f64, _>(StandardNormal) * cc.temp_noise_sigma;
        world.air_temp_c[i] = base + seasonal + diurnal + noise;
    }
}

fn update_humidity(world: &mut World) {
    for i in 0..world.humidity.len() {
        let base = world.terrain[i].base_humidity();
        let water_boost = 0.3 * (-(world.dist_to_water[i] as f64) / 5.0).exp();
        world.humidity[i] = (base + water_boost).min(1.0);
    }
}

fn update_precipitation(world: &mut World, day: f64) {
    // Seasonal factor peaks mid-year
    let season_factor = 0.5 + 0.5 * (2.0 * PI * day / 365.0 - PI / 4.0).sin();
    for i in 0..world.precip_prob.len() {
        world.precip_prob[i] = world.humidity[i] * season_factor * 0.3;
    }
}

fn update_water_availability(world: &mut World) {
    for i in 0..world.water_availability.len() {
        if world.water_mask[i] {
            world.water_availability[i] = 1.0;
            continue;
        }
        let dist = world.dist_to_water[i] as f64;
        let proximity = 0.6 * (-dist / 4.0).exp();
        let rain_contrib = world.precip_prob[i] * 0.4;
        let evap = ((world.air_temp_c[i] - 15.0) / 40.0).max(0.0) * 0.3;
        world.water_availability[i] = (proximity + rain_contrib - evap).clamp(0.0, 1.0);
    }
}

fn update_vegetation(world: &mut World, dt: f64) {
    for i in 0..world.vegetation_biomass.len() {
        let mut biomass = world.vegetation_biomass[i];
        if biomass <= 0.0 {
            // Small chance of regrowth in good conditions
            if world.water_availability[i] > 0.3 {
                biomass = 0.01;
            } else {
                continue;
            }
        }

        let water_f = world.water_availability[i];
        let temp = world.air_temp_c[i];
        // Temperature factor: peaks at 20°C, Gaussian falloff
        let temp_f = (-((temp - 20.0).powi(2)) / (2.0 * 15.0f64.powi(2))).exp();
        let soil_f = world.soil[i].growth_factor();

        let growth_rate = soil_f * water_f * temp_f * 0.01;
        biomass += growth_rate * biomass * (1.0 - biomass) * dt;

        // Combined drought and heat loss
        if water_f < 0.1 && temp > 30.0 {
            biomass -= 0.005 * dt;
        }

        world.vegetation_biomass[i] = biomass.clamp(0.0, 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_is_pure_function_of_step() {
        let config = Config::default();
        let a = time_info(100, &config);
        let b = time_info(100, &config);
        assert_eq!(a.hour, b.hour);
        assert_eq!(a.day_of_year, b.day_of_year);
        // start_hour 6 + 100 steps of 1h = 106h -> hour 10
        assert_eq!(a.hour, 10);
    }

    #[test]
    fn test_day_wraps_at_year_end() {
        let mut config = Config::default();
        config.sim.start_day = 364.0;
        let t = time_info(48, &config);
        assert!(t.day_of_year < 365);
    }

    #[test]
    fn test_advance_touches_only_dynamic_fields() {
        let config = Config::default();
        let mut world = World::generate(&config, 17);
        let terrain = world.terrain.clone();
        let elevation = world.elevation.clone();
        let dist = world.dist_to_water.clone();

        advance(&mut world, 0, &config);
        advance(&mut world, 1, &config);

        assert_eq!(world.terrain, terrain);
        assert_eq!(world.elevation, elevation);
        assert_eq!(world.dist_to_water, dist);
    }

    #[test]
    fn test_fields_stay_in_range_after_advance() {
        let config = Config::default();
        let mut world = World::generate(&config, 17);
        for step in 0..24 {
            advance(&mut world, step, &config);
        }
        for i in 0..world.humidity.len() {
            assert!((0.0..=1.0).contains(&world.humidity[i]));
            assert!((0.0..=1.0).contains(&world.precip_prob[i]));
            assert!((0.0..=1.0).contains(&world.water_availability[i]));
            assert!((0.0..=1.0).contains(&world.vegetation_biomass[i]));
        }
    }

    #[test]
    fn test_water_cells_fully_available() {
        let config = Config::default();
        let mut world = World::generate(&config, 23);
        advance(&mut world, 5, &config);
        for i in 0..world.water_mask.len() {
            if world.water_mask[i] {
                assert_eq!(world.water_availability[i], 1.0);
            }
        }
    }
}
