//! Environment-driven knobs for the compression pipeline (§4.6).

use std::time::Duration;

use crate::config::{env_bool, env_f64, env_string, env_u64};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Light,
    Balanced,
    Strong,
}

impl Profile {
    fn from_env(raw: &str) -> Self {
        match raw {
            "light" => Profile::Light,
            "strong" => Profile::Strong,
            _ => Profile::Balanced,
        }
    }

    /// The Ghostscript device preset this profile prefers.
    pub fn gs_preset(self) -> &'static str {
        match self {
            Profile::Strong => "screen",
            Profile::Light | Profile::Balanced => "ebook",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompressionConfig {
    pub timeout_override_seconds: u64,
    pub timeout_base_seconds: u64,
    pub timeout_per_mb_seconds: f64,
    pub timeout_per_page_seconds: f64,
    pub timeout_max_seconds: u64,
    pub timeout_probe_pages: u64,
    pub timeout_probe_max_seconds: u64,
    pub profile: Profile,
    pub auto_image_heavy: bool,
    pub gs_passthrough_jpeg: bool,
    pub gs_min_size_mb: u64,
    pub gs_preset_override: Option<String>,
    pub gs_extra_flags: bool,
    pub use_zopfli: bool,
    pub enable_image_opt: bool,
    pub enable_pdfsizeopt: bool,
    pub enable_jbig2: bool,
    pub qpdf_oi_quality: u64,
    pub qpdf_oi_min_width: u64,
    pub qpdf_oi_min_height: u64,
    pub qpdf_oi_min_area: u64,
    pub qpdf_oi_keep_inline_images: bool,
    pub parallelism: u64,
    pub savings_threshold_fraction: f64,
    pub min_savings_bytes: u64,
    pub mutool_object_streams: bool,
}

impl CompressionConfig {
    pub fn from_env() -> Self {
        Self {
            timeout_override_seconds: env_u64("ZENPDF_COMPRESS_TIMEOUT_SECONDS", 0),
            timeout_base_seconds: env_u64("ZENPDF_COMPRESS_TIMEOUT_BASE_SECONDS", 120),
            timeout_per_mb_seconds: env_f64("ZENPDF_COMPRESS_TIMEOUT_PER_MB_SECONDS", 3.0),
            timeout_per_page_seconds: env_f64("ZENPDF_COMPRESS_TIMEOUT_PER_PAGE_SECONDS", 1.5),
            timeout_max_seconds: env_u64("ZENPDF_COMPRESS_TIMEOUT_MAX_SECONDS", 900),
            timeout_probe_pages: env_u64("ZENPDF_COMPRESS_TIMEOUT_PROBE_PAGES", 5),
            timeout_probe_max_seconds: env_u64("ZENPDF_COMPRESS_TIMEOUT_PROBE_MAX_SECONDS", 30),
            profile: Profile::from_env(&env_string("ZENPDF_COMPRESS_PROFILE", "balanced")),
            auto_image_heavy: env_bool("ZENPDF_COMPRESS_AUTO_IMAGE_HEAVY", true),
            gs_passthrough_jpeg: env_bool("ZENPDF_COMPRESS_GS_PASSTHROUGH_JPEG", false),
            gs_min_size_mb: env_u64("ZENPDF_COMPRESS_GS_MIN_SIZE_MB", 5),
            gs_preset_override: {
                let v = env_string("ZENPDF_COMPRESS_GS_PRESET", "");
                if v.is_empty() { None } else { Some(v) }
            },
            gs_extra_flags: env_bool("ZENPDF_COMPRESS_GS_EXTRA_FLAGS", false),
            use_zopfli: env_bool("ZENPDF_COMPRESS_USE_ZOPFLI", false),
            enable_image_opt: env_bool("ZENPDF_COMPRESS_ENABLE_IMAGE_OPT", false),
            enable_pdfsizeopt: env_bool("ZENPDF_COMPRESS_ENABLE_PDFSIZEOPT", false),
            enable_jbig2: env_bool("ZENPDF_COMPRESS_ENABLE_JBIG2", false),
            qpdf_oi_quality: env_u64("ZENPDF_QPDF_OI_QUALITY", 40),
            qpdf_oi_min_width: env_u64("ZENPDF_QPDF_OI_MIN_WIDTH", 128),
            qpdf_oi_min_height: env_u64("ZENPDF_QPDF_OI_MIN_HEIGHT", 128),
            qpdf_oi_min_area: env_u64("ZENPDF_QPDF_OI_MIN_AREA", 16384),
            qpdf_oi_keep_inline_images: env_bool("ZENPDF_QPDF_OI_KEEP_INLINE_IMAGES", false),
            parallelism: env_u64("ZENPDF_COMPRESS_PARALLELISM", 1),
            savings_threshold_fraction: env_f64("ZENPDF_COMPRESS_SAVINGS_THRESHOLD_PCT", 0.08),
            min_savings_bytes: env_u64("ZENPDF_COMPRESS_MIN_SAVINGS_BYTES", 200_000),
            mutool_object_streams: env_bool("ZENPDF_MUTOOL_OBJECT_STREAMS", false),
        }
    }

    /// `timeout := override if set, else min(max, base + sizeMb*perMb + pages*perPage)`.
    pub fn timeout_for(&self, size_mb: u64, pages: u64) -> Duration {
        if self.timeout_override_seconds > 0 {
            return Duration::from_secs(self.timeout_override_seconds);
        }
        let computed = self.timeout_base_seconds as f64
            + size_mb as f64 * self.timeout_per_mb_seconds
            + pages as f64 * self.timeout_per_page_seconds;
        let bounded = computed.min(self.timeout_max_seconds as f64).max(0.0);
        Duration::from_secs_f64(bounded)
    }

    /// `probeTimeout := min(probeMax, max(10, 0.25*timeout))`.
    pub fn probe_timeout_for(&self, timeout: Duration) -> Duration {
        let quarter = timeout.as_secs_f64() * 0.25;
        let bounded = quarter.max(10.0).min(self.timeout_probe_max_seconds as f64);
        Duration::from_secs_f64(bounded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_formula_uses_base_plus_coefficients() {
        let cfg = CompressionConfig {
            timeout_override_seconds: 0,
            timeout_base_seconds: 120,
            timeout_per_mb_seconds: 3.0,
            timeout_per_page_seconds: 1.5,
            timeout_max_seconds: 900,
            ..CompressionConfig::from_env()
        };
        let timeout = cfg.timeout_for(10, 20);
        assert_eq!(timeout.as_secs(), 120 + 30 + 30);
    }

    #[test]
    fn timeout_formula_is_capped_at_max() {
        let cfg = CompressionConfig {
            timeout_override_seconds: 0,
            timeout_base_seconds: 120,
            timeout_per_mb_seconds: 3.0,
            timeout_per_page_seconds: 1.5,
            timeout_max_seconds: 200,
            ..CompressionConfig::from_env()
        };
        let timeout = cfg.timeout_for(1000, 1000);
        assert_eq!(timeout.as_secs(), 200);
    }

    #[test]
    fn explicit_override_wins_over_formula() {
        let cfg = CompressionConfig {
            timeout_override_seconds: 42,
            ..CompressionConfig::from_env()
        };
        assert_eq!(cfg.timeout_for(999, 999).as_secs(), 42);
    }

    #[test]
    fn probe_timeout_is_quarter_of_timeout_bounded_by_10_and_probe_max() {
        let cfg = CompressionConfig {
            timeout_probe_max_seconds: 30,
            ..CompressionConfig::from_env()
        };
        assert_eq!(cfg.probe_timeout_for(Duration::from_secs(20)).as_secs(), 10);
        assert_eq!(cfg.probe_timeout_for(Duration::from_secs(200)).as_secs(), 30);
    }
}
