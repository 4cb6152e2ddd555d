//! Flat-rate storage pricing for supported registries.
//!
//! Rates are published per-GB-month figures, not billing data. Lookups
//! never fail: an unknown region falls back to the provider default, an
//! unknown provider to the global default.

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Global fallback rate in USD per GB-month
const DEFAULT_RATE: f64 = 0.10;

/// Per-GB monthly storage rates in USD, keyed by provider then region.
/// A `"default"` row covers regions not listed explicitly.
static STORAGE_RATES: &[(&str, &[(&str, f64)])] = &[
    // ECR is $0.10/GB/month in all regions
    ("ecr", &[("default", 0.10)]),
    (
        "artifactregistry",
        &[
            ("us", 0.10),
            ("europe", 0.10),
            ("asia", 0.10),
            ("us-central1", 0.10),
            ("us-east1", 0.10),
            ("us-east4", 0.10),
            ("us-west1", 0.10),
            ("us-west2", 0.10),
            ("europe-west1", 0.10),
            ("europe-west2", 0.10),
            ("europe-west4", 0.10),
            ("asia-east1", 0.10),
            ("asia-southeast1", 0.10),
            ("default", 0.10),
        ],
    ),
];

/// Monthly storage cost in USD for `size_bytes` stored with the given
/// provider in the given region.
///
/// Linear in `size_bytes` for a fixed rate; zero bytes costs exactly zero.
#[must_use]
pub fn monthly_storage_cost(provider: &str, region: &str, size_bytes: u64) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let size_gb = size_bytes as f64 / BYTES_PER_GB;
    size_gb * rate_per_gb(provider, region)
}

/// Per-GB monthly rate for a provider/region pair
fn rate_per_gb(provider: &str, region: &str) -> f64 {
    let Some((_, regions)) = STORAGE_RATES.iter().find(|(p, _)| *p == provider) else {
        return DEFAULT_RATE;
    };

    regions
        .iter()
        .find(|(r, _)| *r == region)
        .or_else(|| regions.iter().find(|(r, _)| *r == "default"))
        .map_or(DEFAULT_RATE, |(_, rate)| *rate)
}
