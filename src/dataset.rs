//! Training dataset loading.
//!
//! The dataset is a CSV with a fixed schema: eight categorical columns,
//! six numeric columns, and the usability-class target. The first row is
//! the header; each subsequent row becomes a [`ClothingRecord`].

use std::path::Path;

use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};

use crate::error::{Result, RewearError};

/// One row of the sustainable-fashion dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClothingRecord {
    /// Fabric the item is made of.
    #[serde(rename = "Material_Type")]
    pub material: String,
    /// Concrete brand identifier.
    #[serde(rename = "Brand_ID")]
    pub brand: String,
    /// Garment category (jacket, shirt, ...). Request payloads call this
    /// field `category`.
    #[serde(rename = "Clothing_Type")]
    pub category: String,
    #[serde(rename = "Condition")]
    pub condition: String,
    #[serde(rename = "Seasonality")]
    pub seasonality: String,
    #[serde(rename = "Certifications")]
    pub certifications: String,
    #[serde(rename = "Eco_Friendly_Manufacturing")]
    pub eco_friendly_manufacturing: String,
    #[serde(rename = "Recycling_Programs")]
    pub recycling_programs: String,
    #[serde(rename = "Carbon_Footprint_MT")]
    pub carbon_footprint_mt: f64,
    #[serde(rename = "Water_Usage_Liters")]
    pub water_usage_liters: f64,
    #[serde(rename = "Waste_Production_KG")]
    pub waste_production_kg: f64,
    #[serde(rename = "Wear_Frequency_Numeric")]
    pub wear_frequency: f64,
    #[serde(rename = "Usability_Score")]
    pub usability_score: f64,
    #[serde(rename = "Item_Price_USD")]
    pub price: f64,
    /// Target label: one of the usability classes (Low / Medium / High).
    #[serde(rename = "Usability_Class")]
    pub usability_class: String,
}

/// An in-memory training dataset.
#[derive(Debug, Clone)]
pub struct Dataset {
    records: Vec<ClothingRecord>,
}

impl Dataset {
    /// Load a dataset from a CSV file.
    ///
    /// Fields are trimmed; a file with a header but no data rows is an
    /// error, since nothing can be fitted from it.
    pub fn load_csv(path: &Path) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)?;

        let mut records = Vec::new();
        for row in reader.deserialize::<ClothingRecord>() {
            records.push(row?);
        }

        if records.is_empty() {
            return Err(RewearError::dataset(format!(
                "no data rows in {}",
                path.display()
            )));
        }

        Ok(Dataset { records })
    }

    /// Build a dataset from already-parsed records.
    pub fn from_records(records: Vec<ClothingRecord>) -> Self {
        Dataset { records }
    }

    /// The rows of the dataset.
    pub fn records(&self) -> &[ClothingRecord] {
        &self.records
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset has no rows.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Per-row `(brand, price)` observations, as consumed by the brand
    /// bucketing table.
    pub fn brand_observations(&self) -> impl Iterator<Item = (&str, f64)> {
        self.records
            .iter()
            .map(|r| (r.brand.as_str(), r.price))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const HEADER: &str = "Material_Type,Brand_ID,Clothing_Type,Condition,Seasonality,Certifications,Eco_Friendly_Manufacturing,Recycling_Programs,Carbon_Footprint_MT,Water_Usage_Liters,Waste_Production_KG,Wear_Frequency_Numeric,Usability_Score,Item_Price_USD,Usability_Class";

    fn write_csv(rows: &[&str]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{HEADER}").unwrap();
        for row in rows {
            writeln!(file, "{row}").unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_csv() {
        let file = write_csv(&[
            "Cotton,Acme,Shirt,New,Summer,GOTS,Yes,Yes,1.5,200.0,0.3,4.0,0.8,25.0,High",
            "Polyester,Bolt,Jacket,Used,Winter,None,No,No,3.2,90.0,1.1,1.0,0.2,60.0,Low",
        ]);

        let dataset = Dataset::load_csv(file.path()).unwrap();
        assert_eq!(dataset.len(), 2);

        let first = &dataset.records()[0];
        assert_eq!(first.material, "Cotton");
        assert_eq!(first.brand, "Acme");
        assert_eq!(first.category, "Shirt");
        assert_eq!(first.price, 25.0);
        assert_eq!(first.usability_class, "High");
    }

    #[test]
    fn test_empty_dataset_is_an_error() {
        let file = write_csv(&[]);
        let err = Dataset::load_csv(file.path()).unwrap_err();
        assert!(matches!(err, RewearError::Dataset(_)));
    }

    #[test]
    fn test_brand_observations() {
        let file = write_csv(&[
            "Cotton,Acme,Shirt,New,Summer,GOTS,Yes,Yes,1.5,200.0,0.3,4.0,0.8,25.0,High",
            "Wool,Acme,Coat,New,Winter,None,No,Yes,2.0,150.0,0.5,2.0,0.6,35.0,Medium",
        ]);

        let dataset = Dataset::load_csv(file.path()).unwrap();
        let obs: Vec<_> = dataset.brand_observations().collect();
        assert_eq!(obs, vec![("Acme", 25.0), ("Acme", 35.0)]);
    }
}
