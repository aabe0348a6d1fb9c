//! Synthetic telemetry payloads
//!
//! Every field is drawn independently and uniformly from its documented
//! range and rounded to two decimals.

use std::{ops::RangeInclusive, time::Duration};

use chrono::{DateTime, Utc};
use rand::Rng;

use super::{
    entity::{Message, Payload},
    error::PublishError,
};

pub const TEMPERATURE_RANGE: RangeInclusive<f64> = 20.0..=35.0;
pub const HUMIDITY_RANGE: RangeInclusive<f64> = 40.0..=80.0;
pub const PRESSURE_RANGE: RangeInclusive<f64> = 990.0..=1020.0;
pub const LIGHT_RANGE: RangeInclusive<f64> = 100.0..=1000.0;

pub const CPU_USAGE_RANGE: RangeInclusive<f64> = 10.0..=90.0;
pub const MEMORY_USAGE_RANGE: RangeInclusive<f64> = 30.0..=85.0;
pub const DISK_USAGE_RANGE: RangeInclusive<f64> = 40.0..=95.0;
pub const NETWORK_SPEED_RANGE: RangeInclusive<f64> = 1.0..=100.0;
pub const ACTIVE_CONNECTIONS_RANGE: RangeInclusive<u32> = 1..=50;

/// Slow-series payload
#[derive(Debug, Clone, PartialEq)]
pub struct SensorReading {
    /// °C
    pub temperature: f64,
    /// %
    pub humidity: f64,
    /// hPa
    pub pressure: f64,
    /// lux
    pub light: f64,
    /// Cadence the reading was published at
    pub interval: Duration,
}

/// Fast-series payload
#[derive(Debug, Clone, PartialEq)]
pub struct SystemStats {
    pub cpu_usage: f64,
    pub memory_usage: f64,
    pub disk_usage: f64,
    /// Mbit/s
    pub network_speed: f64,
    pub active_connections: u32,
    pub interval: Duration,
}

/// Produces one message per publish iteration
pub trait PayloadGenerator: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    fn generate(&self, now: DateTime<Utc>) -> Result<Message, PublishError>;
}

fn sample(rng: &mut impl Rng, range: RangeInclusive<f64>) -> f64 {
    (rng.random_range(range) * 100.0).round() / 100.0
}

/// Generates `sensor_data` messages
#[derive(Debug, Clone)]
pub struct SensorDataGenerator {
    interval: Duration,
}

impl SensorDataGenerator {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl PayloadGenerator for SensorDataGenerator {
    fn name(&self) -> &'static str {
        "sensor_data"
    }

    fn generate(&self, now: DateTime<Utc>) -> Result<Message, PublishError> {
        let mut rng = rand::rng();
        let reading = SensorReading {
            temperature: sample(&mut rng, TEMPERATURE_RANGE),
            humidity: sample(&mut rng, HUMIDITY_RANGE),
            pressure: sample(&mut rng, PRESSURE_RANGE),
            light: sample(&mut rng, LIGHT_RANGE),
            interval: self.interval,
        };
        Ok(Message::new(Payload::SensorData(reading), now))
    }
}

/// Generates `system_stats` messages
#[derive(Debug, Clone)]
pub struct SystemStatsGenerator {
    interval: Duration,
}

impl SystemStatsGenerator {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl PayloadGenerator for SystemStatsGenerator {
    fn name(&self) -> &'static str {
        "system_stats"
    }

    fn generate(&self, now: DateTime<Utc>) -> Result<Message, PublishError> {
        let mut rng = rand::rng();
        let stats = SystemStats {
            cpu_usage: sample(&mut rng, CPU_USAGE_RANGE),
            memory_usage: sample(&mut rng, MEMORY_USAGE_RANGE),
            disk_usage: sample(&mut rng, DISK_USAGE_RANGE),
            network_speed: sample(&mut rng, NETWORK_SPEED_RANGE),
            active_connections: rng.random_range(ACTIVE_CONNECTIONS_RANGE),
            interval: self.interval,
        };
        Ok(Message::new(Payload::SystemStats(stats), now))
    }
}
