//! SNR Proxy
//!
//! Rough detection signal-to-noise for TOI candidates, which ship without a
//! model SNR. Parametric and uncalibrated: bright stars approach the noise
//! floor and noise grows exponentially with TESS magnitude.

/// Per-hour noise of the brightest stars (ppm)
pub const DEFAULT_NOISE_FLOOR_PPM: f64 = 60.0;

/// Noise assumed when the magnitude is unknown (ppm)
pub const MISSING_MAGNITUDE_NOISE_PPM: f64 = 200.0;

/// Upper bound on the per-hour noise (ppm)
pub const MAX_NOISE_PPM: f64 = 1e5;

/// Magnitude at which noise equals the floor
pub const REFERENCE_MAGNITUDE: f64 = 10.0;

/// Length of one TESS sector (days)
pub const OBSERVATION_WINDOW_DAYS: f64 = 27.4;

/// Spacing of effectively independent points inside a transit (hours)
pub const POINT_SPACING_HOURS: f64 = 0.5;

/// Per-hour noise estimate in ppm for a star of the given magnitude
pub fn noise_ppm_from_tmag(tmag: Option<f64>, noise_floor: f64) -> f64 {
    let Some(tmag) = tmag else {
        return MISSING_MAGNITUDE_NOISE_PPM;
    };

    let noise = noise_floor * 10f64.powf(0.2 * (tmag - REFERENCE_MAGNITUDE));
    // Upper bound wins if a custom floor exceeds it
    noise.max(noise_floor).min(MAX_NOISE_PPM)
}

/// Transits seen in one observation window, at least one.
///
/// A missing or non-positive period counts as a single transit.
pub fn transit_count(period_days: Option<f64>) -> f64 {
    match period_days {
        Some(period) if period > 0.0 => (OBSERVATION_WINDOW_DAYS / period).floor().max(1.0),
        _ => 1.0,
    }
}

/// Independent points inside one transit, at least one
pub fn points_in_transit(duration_hours: Option<f64>) -> f64 {
    duration_hours
        .map(|hours| (hours / POINT_SPACING_HOURS).max(1.0))
        .unwrap_or(1.0)
}

/// Measurements of one TOI row that feed the proxy
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TransitObservation {
    pub depth_ppm: Option<f64>,
    pub period_days: Option<f64>,
    pub duration_hours: Option<f64>,
    pub tmag: Option<f64>,
}

impl TransitObservation {
    /// `depth / noise_per_transit * sqrt(n_transits)`, or `None` without a depth
    pub fn snr_proxy(&self, noise_floor: f64) -> Option<f64> {
        let depth = self.depth_ppm?;

        let n_transits = transit_count(self.period_days);
        let noise_per_hour = noise_ppm_from_tmag(self.tmag, noise_floor);
        let noise_per_transit = noise_per_hour / points_in_transit(self.duration_hours).sqrt();

        Some(depth / noise_per_transit * n_transits.sqrt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9 * b.abs().max(1.0)
    }

    #[test]
    fn test_noise_missing_magnitude() {
        assert_eq!(noise_ppm_from_tmag(None, DEFAULT_NOISE_FLOOR_PPM), 200.0);
    }

    #[test]
    fn test_noise_at_reference_is_floor() {
        assert_eq!(noise_ppm_from_tmag(Some(10.0), DEFAULT_NOISE_FLOOR_PPM), 60.0);
        // Brighter stars never drop below the floor
        assert_eq!(noise_ppm_from_tmag(Some(4.0), DEFAULT_NOISE_FLOOR_PPM), 60.0);
    }

    #[test]
    fn test_noise_grows_with_magnitude() {
        assert!(approx_eq(noise_ppm_from_tmag(Some(15.0), 60.0), 600.0));

        let mut previous = 0.0;
        for step in 0..200 {
            let tmag = step as f64 * 0.25;
            let noise = noise_ppm_from_tmag(Some(tmag), DEFAULT_NOISE_FLOOR_PPM);
            assert!(noise >= previous, "noise decreased at tmag {}", tmag);
            assert!(noise <= MAX_NOISE_PPM);
            previous = noise;
        }
        assert_eq!(noise_ppm_from_tmag(Some(40.0), DEFAULT_NOISE_FLOOR_PPM), MAX_NOISE_PPM);
    }

    #[test]
    fn test_transit_count() {
        assert_eq!(transit_count(Some(10.0)), 2.0);
        assert_eq!(transit_count(Some(1.0)), 27.0);
        assert_eq!(transit_count(Some(100.0)), 1.0);
        assert_eq!(transit_count(Some(0.0)), 1.0);
        assert_eq!(transit_count(Some(-3.0)), 1.0);
        assert_eq!(transit_count(None), 1.0);
    }

    #[test]
    fn test_points_in_transit() {
        assert_eq!(points_in_transit(Some(2.0)), 4.0);
        assert_eq!(points_in_transit(Some(0.2)), 1.0);
        assert_eq!(points_in_transit(None), 1.0);
    }

    #[test]
    fn test_snr_proxy() {
        // 4 points → noise 60 / 2 = 30 ppm; 2 transits → 500 / 30 * sqrt(2)
        let obs = TransitObservation {
            depth_ppm: Some(500.0),
            period_days: Some(10.0),
            duration_hours: Some(2.0),
            tmag: Some(10.0),
        };
        let snr = obs.snr_proxy(DEFAULT_NOISE_FLOOR_PPM).unwrap();
        assert!(approx_eq(snr, 500.0 / 30.0 * 2f64.sqrt()));
    }

    #[test]
    fn test_snr_proxy_missing_inputs() {
        let no_depth = TransitObservation {
            depth_ppm: None,
            period_days: Some(10.0),
            duration_hours: Some(2.0),
            tmag: Some(10.0),
        };
        assert_eq!(no_depth.snr_proxy(DEFAULT_NOISE_FLOOR_PPM), None);

        // Only depth known: one transit, one point, fallback noise
        let depth_only = TransitObservation {
            depth_ppm: Some(400.0),
            ..Default::default()
        };
        assert_eq!(depth_only.snr_proxy(DEFAULT_NOISE_FLOOR_PPM), Some(2.0));
    }
}
