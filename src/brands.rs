//! Brand-tier bucketing.
//!
//! Requests may name an abstract brand tier instead of a concrete brand.
//! At startup all brands observed in a catalog CSV are partitioned into
//! four price quartiles, and each tier resolves to the first candidate of
//! its quartile. The table is a deterministic, total function of the
//! `(brand, price)` observations and is never mutated after construction.

use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};

use crate::error::{Result, RewearError};

/// Catalog column holding the brand identifier.
const BRAND_COLUMN: &str = "Brand_ID";
/// Catalog column holding the observed sale price.
const PRICE_COLUMN: &str = "Item_Price_USD";

/// Coarse market segment, mapped onto a price quartile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrandTier {
    FastFashion,
    MidRange,
    Sustainable,
    Luxury,
}

impl BrandTier {
    /// All tiers, in quartile order.
    pub const ALL: [BrandTier; 4] = [
        BrandTier::FastFashion,
        BrandTier::MidRange,
        BrandTier::Sustainable,
        BrandTier::Luxury,
    ];

    /// The 1-based price quartile this tier maps to.
    pub fn quartile(&self) -> usize {
        match self {
            BrandTier::FastFashion => 1,
            BrandTier::MidRange => 2,
            BrandTier::Sustainable => 3,
            BrandTier::Luxury => 4,
        }
    }

    /// Canonical snake_case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            BrandTier::FastFashion => "fast_fashion",
            BrandTier::MidRange => "mid_range",
            BrandTier::Sustainable => "sustainable",
            BrandTier::Luxury => "luxury",
        }
    }
}

impl std::fmt::Display for BrandTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BrandTier {
    type Err = RewearError;

    /// Parse a tier name, case-insensitively, treating `-` and `_` alike.
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "fast_fashion" => Ok(BrandTier::FastFashion),
            "mid_range" => Ok(BrandTier::MidRange),
            "sustainable" => Ok(BrandTier::Sustainable),
            "luxury" => Ok(BrandTier::Luxury),
            _ => Err(RewearError::unknown_label("brand_type", s)),
        }
    }
}

#[derive(Debug, Clone)]
struct BrandStat {
    brand: String,
    median_price: f64,
    count: usize,
}

/// Brands partitioned into price quartiles, with a resolved candidate
/// list per tier.
#[derive(Debug, Clone, Default)]
pub struct BrandBucketTable {
    quartiles: [Vec<String>; 4],
    tiers: [Vec<String>; 4],
}

impl BrandBucketTable {
    /// A table with no brands; every tier resolves to `None`.
    pub fn empty() -> Self {
        BrandBucketTable::default()
    }

    /// Build the table from `(brand, price)` observations.
    ///
    /// Steps: group by brand and take the median price and observation
    /// count; sort ascending by median; cut into 4 contiguous quartiles
    /// of `max(1, n/4)` brands (the last absorbs the remainder); inside
    /// each quartile prefer higher observation counts, then lower
    /// medians; finally resolve each tier to its quartile, probing
    /// offsets +1, -1, +2, -2 when the target quartile is empty.
    pub fn from_observations<I, S>(observations: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut grouped: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        for (brand, price) in observations {
            grouped.entry(brand.into()).or_default().push(price);
        }

        let mut stats: Vec<BrandStat> = grouped
            .into_iter()
            .filter(|(_, prices)| !prices.is_empty())
            .map(|(brand, mut prices)| {
                prices.sort_by(f64::total_cmp);
                BrandStat {
                    brand,
                    median_price: median_of_sorted(&prices),
                    count: prices.len(),
                }
            })
            .collect();

        if stats.is_empty() {
            return BrandBucketTable::empty();
        }

        stats.sort_by(|a, b| a.median_price.total_cmp(&b.median_price));

        let n = stats.len();
        let quartile_size = (n / 4).max(1);
        let mut buckets: [Vec<BrandStat>; 4] = Default::default();
        for (i, stat) in stats.into_iter().enumerate() {
            let q = (i / quartile_size + 1).min(4);
            buckets[q - 1].push(stat);
        }

        for bucket in &mut buckets {
            bucket.sort_by(|a, b| {
                b.count
                    .cmp(&a.count)
                    .then(a.median_price.total_cmp(&b.median_price))
            });
        }

        let quartiles = buckets.map(|bucket| {
            bucket
                .into_iter()
                .map(|stat| stat.brand)
                .collect::<Vec<String>>()
        });

        let mut tiers: [Vec<String>; 4] = Default::default();
        for tier in BrandTier::ALL {
            let q = tier.quartile();
            let mut candidates = &quartiles[q - 1];
            if candidates.is_empty() {
                for offset in [1i64, -1, 2, -2] {
                    let alt = q as i64 + offset;
                    if (1..=4).contains(&alt) {
                        let bucket = &quartiles[(alt - 1) as usize];
                        if !bucket.is_empty() {
                            candidates = bucket;
                            break;
                        }
                    }
                }
            }
            tiers[tier.quartile() - 1] = candidates.clone();
        }

        BrandBucketTable { quartiles, tiers }
    }

    /// Build the table from a catalog CSV with `Brand_ID` and
    /// `Item_Price_USD` columns.
    ///
    /// Rows without a brand are skipped; rows whose price is present but
    /// unparsable are skipped; an empty price field counts as 0.
    pub fn from_catalog_csv(path: &Path) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)?;

        let headers = reader.headers()?.clone();
        let brand_idx = headers
            .iter()
            .position(|h| h == BRAND_COLUMN)
            .ok_or_else(|| {
                RewearError::dataset(format!(
                    "missing {BRAND_COLUMN} column in {}",
                    path.display()
                ))
            })?;
        let price_idx = headers
            .iter()
            .position(|h| h == PRICE_COLUMN)
            .ok_or_else(|| {
                RewearError::dataset(format!(
                    "missing {PRICE_COLUMN} column in {}",
                    path.display()
                ))
            })?;

        let mut observations: Vec<(String, f64)> = Vec::new();
        for row in reader.records() {
            let row = row?;
            let brand = match row.get(brand_idx) {
                Some(b) if !b.is_empty() => b.to_string(),
                _ => continue,
            };
            let price_field = row.get(price_idx).unwrap_or("");
            let price = if price_field.is_empty() {
                0.0
            } else {
                match price_field.parse::<f64>() {
                    Ok(p) => p,
                    Err(_) => continue,
                }
            };
            observations.push((brand, price));
        }

        Ok(BrandBucketTable::from_observations(observations))
    }

    /// Brands of the 1-based quartile `q`, in candidate order.
    pub fn quartile(&self, q: usize) -> &[String] {
        match q {
            1..=4 => &self.quartiles[q - 1],
            _ => &[],
        }
    }

    /// The ordered candidate list for a tier, after fallback resolution.
    pub fn candidates(&self, tier: BrandTier) -> &[String] {
        &self.tiers[tier.quartile() - 1]
    }

    /// The representative brand for a tier: its first candidate.
    pub fn resolve(&self, tier: BrandTier) -> Option<&str> {
        self.candidates(tier).first().map(|s| s.as_str())
    }

    /// Total number of distinct brands in the table.
    pub fn brand_count(&self) -> usize {
        self.quartiles.iter().map(|q| q.len()).sum()
    }

    /// Whether the table holds no brands at all.
    pub fn is_empty(&self) -> bool {
        self.brand_count() == 0
    }
}

/// Median of an ascending-sorted slice; mean of the two middle values
/// for even lengths.
fn median_of_sorted(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}
