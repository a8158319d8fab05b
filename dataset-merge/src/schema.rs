//! Column mappings from each catalog onto the unified training schema

/// Unified columns, in output order
pub const UNIFIED_COLUMNS: [&str; 11] = [
    "disposition",
    "period",
    "duration",
    "depth",
    "planet_radius",
    "stellar_temperature",
    "stellar_gravity",
    "stellar_radius",
    "magnitude",
    "snr",
    "equilibrium_temp",
];

/// Kepler Objects of Interest → unified
pub const KOI_COLUMNS: [(&str, &str); 11] = [
    ("koi_disposition", "disposition"),
    ("koi_period", "period"),
    ("koi_duration", "duration"),
    ("koi_depth", "depth"),
    ("koi_prad", "planet_radius"),
    ("koi_steff", "stellar_temperature"),
    ("koi_slogg", "stellar_gravity"),
    ("koi_srad", "stellar_radius"),
    ("koi_kepmag", "magnitude"),
    ("koi_model_snr", "snr"),
    ("koi_teq", "equilibrium_temp"),
];

/// TESS Objects of Interest → unified. `snr_proxy` is derived, not read.
pub const TOI_COLUMNS: [(&str, &str); 11] = [
    ("tfopwg_disp", "disposition"),
    ("pl_orbper", "period"),
    ("pl_trandurh", "duration"),
    ("pl_trandep", "depth"),
    ("pl_rade", "planet_radius"),
    ("st_teff", "stellar_temperature"),
    ("st_logg", "stellar_gravity"),
    ("st_rad", "stellar_radius"),
    ("st_tmag", "magnitude"),
    (SNR_PROXY_COLUMN, "snr"),
    ("pl_eqt", "equilibrium_temp"),
];

// TOI source columns feeding the SNR proxy
pub const TOI_DEPTH_PPM: &str = "pl_trandep";
pub const TOI_PERIOD_DAYS: &str = "pl_orbper";
pub const TOI_DURATION_HOURS: &str = "pl_trandurh";
pub const TOI_TMAG: &str = "st_tmag";

pub const SNR_PROXY_COLUMN: &str = "snr_proxy";
