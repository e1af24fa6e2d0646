//! Per-tick evolution of the shared ambient environment.

use greenhouse_core::{ClimateConfig, Environment, PERCENT_RANGE, TEMPERATURE_RANGE};

/// Advance the environment one tick under its current actuator settings.
///
/// Irrigation adds moisture in proportion to its intensity; with it off the
/// greenhouse dries at a fixed rate. Ventilation removes a share of the
/// deviation from the setpoint proportional to fan speed. Light and actuator
/// settings pass through untouched.
pub fn step(env: &Environment, config: &ClimateConfig) -> Environment {
    let (pct_lo, pct_hi) = PERCENT_RANGE;
    let (temp_lo, temp_hi) = TEMPERATURE_RANGE;

    let moisture = if env.irrigation_on {
        env.moisture + env.irrigation_intensity * config.irrigation_factor
    } else {
        env.moisture - config.drying_rate
    };

    let temperature = if env.ventilation_on {
        let deviation = env.temperature - config.ventilation_setpoint;
        env.temperature - deviation * env.ventilation_speed * config.ventilation_factor
    } else {
        env.temperature
    };

    Environment {
        moisture: moisture.clamp(pct_lo, pct_hi),
        temperature: temperature.clamp(temp_lo, temp_hi),
        ..*env
    }
}
