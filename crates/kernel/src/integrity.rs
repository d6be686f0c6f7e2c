//! Periodic alpha audit of particles and obstacles.
//!
//! Every `interval` ticks the monitor counts live, non-exempt samples whose
//! alpha the active [`AlphaPolicy`] rejects. A non-zero count is handed to the
//! [`IntegritySink`], which by default latches a sticky flag.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

use crate::config::WorldConfig;

/// Something with an alpha the monitor can audit.
pub trait AlphaSample {
    /// Samples that are not live are skipped.
    fn is_live(&self) -> bool {
        true
    }

    /// Samples allowed to hold any alpha right now.
    fn is_exempt(&self) -> bool;

    fn alpha(&self) -> f32;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleKind {
    Particle,
    Obstacle,
}

/// Decides which alpha values are anomalous. Swappable at runtime.
pub trait AlphaPolicy: Send + Sync {
    fn version(&self) -> u32;
    fn is_anomalous(&self, kind: SampleKind, alpha: f32) -> bool;
}

/// Rejects non-finite alpha and alpha below a per-kind floor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlphaFloorPolicy {
    pub particle_floor: f32,
    pub obstacle_floor: f32,
}

impl AlphaFloorPolicy {
    pub fn from_config(config: &WorldConfig) -> Self {
        Self {
            particle_floor: config.particle_alpha_floor,
            obstacle_floor: config.obstacle_alpha_floor,
        }
    }
}

impl AlphaPolicy for AlphaFloorPolicy {
    fn version(&self) -> u32 {
        1
    }

    fn is_anomalous(&self, kind: SampleKind, alpha: f32) -> bool {
        let floor = match kind {
            SampleKind::Particle => self.particle_floor,
            SampleKind::Obstacle => self.obstacle_floor,
        };
        !alpha.is_finite() || alpha < floor
    }
}

/// Result of one scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
    pub tick: u64,
    pub policy_version: u32,
    pub particle_failures: usize,
    pub obstacle_failures: usize,
}

impl ScanReport {
    pub fn failures(&self) -> usize {
        self.particle_failures + self.obstacle_failures
    }
}

/// Receives scans that found anomalies.
pub trait IntegritySink: Send + Sync {
    fn raise(&self, report: &ScanReport);
    fn is_flagged(&self) -> bool;
}

/// Latches on the first anomaly and never clears.
#[derive(Debug, Default)]
pub struct StickyFlag {
    flagged: AtomicBool,
}

impl IntegritySink for StickyFlag {
    fn raise(&self, report: &ScanReport) {
        if !self.flagged.swap(true, Ordering::SeqCst) {
            tracing::warn!(
                tick = report.tick,
                particles = report.particle_failures,
                obstacles = report.obstacle_failures,
                "integrity flag raised"
            );
        }
    }

    fn is_flagged(&self) -> bool {
        self.flagged.load(Ordering::SeqCst)
    }
}

pub struct IntegrityMonitor {
    interval: u64,
    ticks: u64,
    scans: u64,
    policy: Box<dyn AlphaPolicy>,
    sink: Arc<dyn IntegritySink>,
}

impl std::fmt::Debug for IntegrityMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntegrityMonitor")
            .field("interval", &self.interval)
            .field("ticks", &self.ticks)
            .field("scans", &self.scans)
            .field("policy_version", &self.policy.version())
            .field("flagged", &self.sink.is_flagged())
            .finish()
    }
}

impl IntegrityMonitor {
    /// An interval of 0 is treated as 1.
    pub fn new(interval: u64, policy: Box<dyn AlphaPolicy>, sink: Arc<dyn IntegritySink>) -> Self {
        Self {
            interval: interval.max(1),
            ticks: 0,
            scans: 0,
            policy,
            sink,
        }
    }

    /// Floor policy from `config` reporting into a fresh [`StickyFlag`].
    pub fn from_config(config: &WorldConfig) -> Self {
        Self::new(
            config.integrity_interval,
            Box::new(AlphaFloorPolicy::from_config(config)),
            Arc::new(StickyFlag::default()),
        )
    }

    pub fn interval(&self) -> u64 {
        self.interval
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn scans(&self) -> u64 {
        self.scans
    }

    pub fn is_flagged(&self) -> bool {
        self.sink.is_flagged()
    }

    pub fn policy_version(&self) -> u32 {
        self.policy.version()
    }

    pub fn set_policy(&mut self, policy: Box<dyn AlphaPolicy>) {
        tracing::debug!(
            from = self.policy.version(),
            to = policy.version(),
            "alpha policy replaced"
        );
        self.policy = policy;
    }

    /// Advance one tick; scans on every `interval`-th tick and returns the report.
    pub fn tick<'p, 'o, P, O>(
        &mut self,
        particles: impl IntoIterator<Item = &'p P>,
        obstacles: impl IntoIterator<Item = &'o O>,
    ) -> Option<ScanReport>
    where
        P: AlphaSample + 'p,
        O: AlphaSample + 'o,
    {
        self.ticks += 1;
        if self.ticks % self.interval != 0 {
            return None;
        }
        self.scans += 1;
        let report = ScanReport {
            tick: self.ticks,
            policy_version: self.policy.version(),
            particle_failures: self.count_failures(particles, SampleKind::Particle),
            obstacle_failures: self.count_failures(obstacles, SampleKind::Obstacle),
        };
        tracing::trace!(tick = report.tick, failures = report.failures(), "integrity scan");
        if report.failures() > 0 {
            self.sink.raise(&report);
        }
        Some(report)
    }

    fn count_failures<'s, S: AlphaSample + 's>(
        &self,
        samples: impl IntoIterator<Item = &'s S>,
        kind: SampleKind,
    ) -> usize {
        samples
            .into_iter()
            .filter(|s| s.is_live() && !s.is_exempt() && self.policy.is_anomalous(kind, s.alpha()))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Particle;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Capture {
        reports: Mutex<Vec<ScanReport>>,
    }

    impl IntegritySink for Capture {
        fn raise(&self, report: &ScanReport) {
            self.reports.lock().unwrap().push(*report);
        }

        fn is_flagged(&self) -> bool {
            !self.reports.lock().unwrap().is_empty()
        }
    }

    struct Opaque;

    impl AlphaSample for Opaque {
        fn is_exempt(&self) -> bool {
            false
        }

        fn alpha(&self) -> f32 {
            1.0
        }
    }

    fn particle(alpha: f32) -> Particle {
        Particle {
            active: true,
            fade: false,
            alpha,
        }
    }

    fn monitor(interval: u64) -> (IntegrityMonitor, Arc<Capture>) {
        let sink = Arc::new(Capture::default());
        let policy = AlphaFloorPolicy {
            particle_floor: 0.5,
            obstacle_floor: 0.5,
        };
        (IntegrityMonitor::new(interval, Box::new(policy), sink.clone()), sink)
    }

    #[test]
    fn scans_only_on_interval() {
        let (mut m, _) = monitor(180);
        let none: [Opaque; 0] = [];
        for _ in 0..179 {
            assert!(m.tick(&none, &none).is_none());
        }
        let report = m.tick(&none, &none).unwrap();
        assert_eq!(report.tick, 180);
        assert_eq!(m.scans(), 1);
    }

    #[test]
    fn anomaly_reaches_sink() {
        let (mut m, sink) = monitor(1);
        let particles = [particle(1.0), particle(0.1), particle(f32::NAN)];
        let report = m.tick(&particles, &[Opaque]).unwrap();
        assert_eq!(report.particle_failures, 2);
        assert_eq!(report.obstacle_failures, 0);
        assert!(m.is_flagged());
        assert_eq!(sink.reports.lock().unwrap().len(), 1);
    }

    #[test]
    fn inactive_and_fading_particles_are_skipped() {
        let (mut m, sink) = monitor(1);
        let particles = [
            Particle {
                active: false,
                fade: false,
                alpha: 0.0,
            },
            Particle {
                active: true,
                fade: true,
                alpha: 0.0,
            },
        ];
        let none: [Opaque; 0] = [];
        let report = m.tick(&particles, &none).unwrap();
        assert_eq!(report.failures(), 0);
        assert!(sink.reports.lock().unwrap().is_empty());
    }

    #[test]
    fn sticky_flag_stays_set() {
        let flag = StickyFlag::default();
        assert!(!flag.is_flagged());
        let report = ScanReport {
            tick: 180,
            policy_version: 1,
            particle_failures: 1,
            obstacle_failures: 0,
        };
        flag.raise(&report);
        flag.raise(&report);
        assert!(flag.is_flagged());
    }

    #[test]
    fn policy_can_be_swapped() {
        struct Strict;
        impl AlphaPolicy for Strict {
            fn version(&self) -> u32 {
                2
            }
            fn is_anomalous(&self, _kind: SampleKind, alpha: f32) -> bool {
                alpha < 1.0
            }
        }

        let (mut m, _) = monitor(1);
        let particles = [particle(0.9)];
        let none: [Opaque; 0] = [];
        assert_eq!(m.tick(&particles, &none).unwrap().failures(), 0);
        m.set_policy(Box::new(Strict));
        let report = m.tick(&particles, &none).unwrap();
        assert_eq!(report.policy_version, 2);
        assert_eq!(report.failures(), 1);
    }

    #[test]
    fn zero_interval_scans_every_tick() {
        let m = IntegrityMonitor::from_config(&WorldConfig {
            integrity_interval: 0,
            ..WorldConfig::default()
        });
        assert_eq!(m.interval(), 1);
    }
}
