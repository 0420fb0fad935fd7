//! Feature profiles and the fitted encoder set.
//!
//! A trained model is only usable if requests can reproduce the exact
//! feature vector it was trained on. The two server variants historically
//! fed different vectors, so the schema is made explicit: every model is
//! stamped with a [`FeatureProfile`], and servers refuse artifacts whose
//! profile they cannot feed.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::dataset::ClothingRecord;
use crate::encoding::LabelEncoder;
use crate::error::{Result, RewearError};

/// The named, ordered feature list a model is trained with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureProfile {
    /// `[category, material, brand, price, wear_frequency]`, served by
    /// the `serve-api` variant.
    Api,
    /// `[category, material, brand, price]`, served by the `serve-web`
    /// variant.
    Web,
    /// All eight encoded categoricals plus all six numeric columns. The
    /// offline evaluation profile; not servable.
    Full,
}

impl FeatureProfile {
    /// Ordered feature names for this profile.
    pub fn feature_names(&self) -> &'static [&'static str] {
        match self {
            FeatureProfile::Api => &["category", "material", "brand", "price", "wear_frequency"],
            FeatureProfile::Web => &["category", "material", "brand", "price"],
            FeatureProfile::Full => &[
                "material",
                "brand",
                "category",
                "condition",
                "seasonality",
                "certifications",
                "eco_friendly_manufacturing",
                "recycling_programs",
                "carbon_footprint_mt",
                "water_usage_liters",
                "waste_production_kg",
                "wear_frequency",
                "usability_score",
                "price",
            ],
        }
    }

    /// Number of features in this profile.
    pub fn arity(&self) -> usize {
        self.feature_names().len()
    }

    /// Whether a prediction server can assemble this profile's vector
    /// from a request payload.
    pub fn is_servable(&self) -> bool {
        !matches!(self, FeatureProfile::Full)
    }

    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureProfile::Api => "api",
            FeatureProfile::Web => "web",
            FeatureProfile::Full => "full",
        }
    }

    /// Assemble a feature vector from request-supplied values, in this
    /// profile's training order.
    pub fn request_vector(
        &self,
        category_code: usize,
        material_code: usize,
        brand_code: usize,
        price: f64,
        wear_frequency: Option<f64>,
    ) -> Result<Vec<f64>> {
        match self {
            FeatureProfile::Api => {
                let wear = wear_frequency.ok_or_else(|| {
                    RewearError::invalid_argument("expected_wear_frequency is required")
                })?;
                Ok(vec![
                    category_code as f64,
                    material_code as f64,
                    brand_code as f64,
                    price,
                    wear,
                ])
            }
            FeatureProfile::Web => Ok(vec![
                category_code as f64,
                material_code as f64,
                brand_code as f64,
                price,
            ]),
            FeatureProfile::Full => Err(RewearError::invalid_argument(
                "the full feature profile is not servable",
            )),
        }
    }
}

impl fmt::Display for FeatureProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeatureProfile {
    type Err = RewearError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "api" => Ok(FeatureProfile::Api),
            "web" => Ok(FeatureProfile::Web),
            "full" => Ok(FeatureProfile::Full),
            other => Err(RewearError::invalid_argument(format!(
                "unknown feature profile '{other}' (expected api, web, or full)"
            ))),
        }
    }
}

/// The eight categorical feature encoders fitted from a dataset.
///
/// The target encoder is kept separately in the artifact bundle; together
/// they make up the nine encoder artifacts on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncoderSet {
    pub category: LabelEncoder,
    pub material: LabelEncoder,
    pub brand: LabelEncoder,
    pub condition: LabelEncoder,
    pub seasonality: LabelEncoder,
    pub certifications: LabelEncoder,
    pub eco_friendly_manufacturing: LabelEncoder,
    pub recycling_programs: LabelEncoder,
}

impl EncoderSet {
    /// Fit all eight feature encoders from dataset rows.
    pub fn fit(records: &[ClothingRecord]) -> Result<Self> {
        Ok(EncoderSet {
            category: LabelEncoder::fit("category", records.iter().map(|r| r.category.as_str()))?,
            material: LabelEncoder::fit("material", records.iter().map(|r| r.material.as_str()))?,
            brand: LabelEncoder::fit("brand", records.iter().map(|r| r.brand.as_str()))?,
            condition: LabelEncoder::fit(
                "condition",
                records.iter().map(|r| r.condition.as_str()),
            )?,
            seasonality: LabelEncoder::fit(
                "seasonality",
                records.iter().map(|r| r.seasonality.as_str()),
            )?,
            certifications: LabelEncoder::fit(
                "certifications",
                records.iter().map(|r| r.certifications.as_str()),
            )?,
            eco_friendly_manufacturing: LabelEncoder::fit(
                "eco_friendly_manufacturing",
                records.iter().map(|r| r.eco_friendly_manufacturing.as_str()),
            )?,
            recycling_programs: LabelEncoder::fit(
                "recycling_programs",
                records.iter().map(|r| r.recycling_programs.as_str()),
            )?,
        })
    }

    /// All encoders in a fixed order, for persistence.
    pub fn all(&self) -> [&LabelEncoder; 8] {
        [
            &self.category,
            &self.material,
            &self.brand,
            &self.condition,
            &self.seasonality,
            &self.certifications,
            &self.eco_friendly_manufacturing,
            &self.recycling_programs,
        ]
    }

    /// Encode a dataset row into the feature vector for `profile`.
    pub fn feature_vector(
        &self,
        record: &ClothingRecord,
        profile: FeatureProfile,
    ) -> Result<Vec<f64>> {
        let category = self.category.encode(&record.category)? as f64;
        let material = self.material.encode(&record.material)? as f64;
        let brand = self.brand.encode(&record.brand)? as f64;

        match profile {
            FeatureProfile::Api => Ok(vec![
                category,
                material,
                brand,
                record.price,
                record.wear_frequency,
            ]),
            FeatureProfile::Web => Ok(vec![category, material, brand, record.price]),
            FeatureProfile::Full => Ok(vec![
                material,
                brand,
                category,
                self.condition.encode(&record.condition)? as f64,
                self.seasonality.encode(&record.seasonality)? as f64,
                self.certifications.encode(&record.certifications)? as f64,
                self.eco_friendly_manufacturing
                    .encode(&record.eco_friendly_manufacturing)? as f64,
                self.recycling_programs.encode(&record.recycling_programs)? as f64,
                record.carbon_footprint_mt,
                record.water_usage_liters,
                record.waste_production_kg,
                record.wear_frequency,
                record.usability_score,
                record.price,
            ]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> ClothingRecord {
        ClothingRecord {
            material: "Cotton".to_string(),
            brand: "Acme".to_string(),
            category: "Shirt".to_string(),
            condition: "New".to_string(),
            seasonality: "Summer".to_string(),
            certifications: "GOTS".to_string(),
            eco_friendly_manufacturing: "Yes".to_string(),
            recycling_programs: "Yes".to_string(),
            carbon_footprint_mt: 1.5,
            water_usage_liters: 200.0,
            waste_production_kg: 0.3,
            wear_frequency: 4.0,
            usability_score: 0.8,
            price: 25.0,
            usability_class: "High".to_string(),
        }
    }

    #[test]
    fn test_profile_arity_matches_names() {
        for profile in [FeatureProfile::Api, FeatureProfile::Web, FeatureProfile::Full] {
            assert_eq!(profile.arity(), profile.feature_names().len());
        }
        assert_eq!(FeatureProfile::Api.arity(), 5);
        assert_eq!(FeatureProfile::Web.arity(), 4);
        assert_eq!(FeatureProfile::Full.arity(), 14);
    }

    #[test]
    fn test_profile_parse_round_trip() {
        for profile in [FeatureProfile::Api, FeatureProfile::Web, FeatureProfile::Full] {
            assert_eq!(profile.as_str().parse::<FeatureProfile>().unwrap(), profile);
        }
        assert!("ensemble".parse::<FeatureProfile>().is_err());
    }

    #[test]
    fn test_feature_vector_matches_request_vector() {
        let records = vec![record()];
        let encoders = EncoderSet::fit(&records).unwrap();
        let r = record();

        for profile in [FeatureProfile::Api, FeatureProfile::Web] {
            let from_record = encoders.feature_vector(&r, profile).unwrap();
            let from_request = profile
                .request_vector(
                    encoders.category.encode(&r.category).unwrap(),
                    encoders.material.encode(&r.material).unwrap(),
                    encoders.brand.encode(&r.brand).unwrap(),
                    r.price,
                    Some(r.wear_frequency),
                )
                .unwrap();
            assert_eq!(from_record, from_request);
        }
    }

    #[test]
    fn test_api_profile_requires_wear_frequency() {
        let err = FeatureProfile::Api.request_vector(0, 0, 0, 1.0, None).unwrap_err();
        assert!(err.to_string().contains("expected_wear_frequency"));
    }

    #[test]
    fn test_full_profile_is_not_servable() {
        assert!(!FeatureProfile::Full.is_servable());
        assert!(FeatureProfile::Full.request_vector(0, 0, 0, 1.0, None).is_err());
    }
}
