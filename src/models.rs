// Read-only projections of the remote Carapis vehicle entity. These mirror
// the upstream JSON; they are never mutated locally, only replaced wholesale
// when a fetch resolves.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BrandRef {
    pub name: Option<String>,
    pub slug: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ModelRef {
    pub name: Option<String>,
    pub slug: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PhotoRef {
    pub url: Option<String>,
}

// One row of the catalog list response.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct VehicleSummary {
    pub listing_id: String,
    pub year: Option<u32>,
    pub brand: Option<BrandRef>,
    pub vehicle_model: Option<ModelRef>,
    pub model_group: Option<ModelRef>,
    pub price_usd: Option<u64>,
    pub price_krw: Option<u64>,
    pub mileage: Option<u64>,
    pub fuel_type: Option<String>,
    pub transmission: Option<String>,
    pub investment_grade: Option<String>,
    pub risk_level: Option<String>,
    pub is_verified: Option<bool>,
    pub main_photo: Option<PhotoRef>,
    pub location: Option<String>,
}

// Full detail-page payload, keyed by listing id upstream.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct VehicleDetail {
    pub listing_id: String,
    pub year: Option<u32>,
    pub brand: Option<BrandRef>,
    pub vehicle_model: Option<ModelRef>,
    pub model_group: Option<ModelRef>,
    // price is in units of 10,000 KRW when price_usd is absent
    pub price: Option<u64>,
    pub price_usd: Option<u64>,
    pub mileage: Option<u64>,
    pub fuel_type: Option<String>,
    pub transmission: Option<String>,
    pub investment_grade: Option<String>,
    pub risk_level: Option<String>,
    pub is_verified: Option<bool>,
    pub main_photo: Option<PhotoRef>,
    pub location: Option<String>,
    pub displacement: Option<u32>,
    pub color: Option<String>,
    pub seat_count: Option<u32>,
    pub body_type: Option<String>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
}

// List API response shape: { count, results }.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct VehicleListPage {
    pub count: u64,
    pub results: Vec<VehicleSummary>,
}

// Turns an enum token like "plug_in_hybrid" into "Plug In Hybrid".
pub fn humanize(token: &str) -> String {
    let mut out = String::with_capacity(token.len());
    let mut at_word_start = true;
    for ch in token.chars() {
        if ch == '_' {
            out.push(' ');
            at_word_start = true;
        } else if at_word_start {
            out.extend(ch.to_uppercase());
            at_word_start = false;
        } else {
            out.push(ch);
        }
    }
    out
}

fn compose_title(year: Option<u32>, brand: &Option<BrandRef>, model: &Option<ModelRef>) -> String {
    let mut parts: Vec<String> = Vec::new();
    if let Some(y) = year {
        parts.push(y.to_string());
    }
    if let Some(name) = brand.as_ref().and_then(|b| b.name.clone()) {
        parts.push(name);
    }
    if let Some(name) = model.as_ref().and_then(|m| m.name.clone()) {
        parts.push(name);
    }
    parts.join(" ")
}

impl VehicleSummary {
    // "2021 Hyundai Sonata"; empty when nothing is known
    pub fn title(&self) -> String {
        compose_title(self.year, &self.brand, &self.vehicle_model)
    }
}

impl VehicleDetail {
    pub fn title(&self) -> String {
        let title = compose_title(self.year, &self.brand, &self.vehicle_model);
        if title.is_empty() {
            "Vehicle Details".to_string()
        } else {
            title
        }
    }
}

// Chip severity for an investment grade: A* is good, B* middling, the rest bad.
pub fn grade_class(grade: &str) -> &'static str {
    if grade.starts_with('A') {
        "success"
    } else if grade.starts_with('B') {
        "warning"
    } else {
        "error"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn humanize_splits_tokens_into_capitalized_words() {
        assert_eq!(humanize("plug_in_hybrid"), "Plug In Hybrid");
        assert_eq!(humanize("diesel"), "Diesel");
        assert_eq!(humanize(""), "");
    }

    #[test]
    fn summary_title_skips_missing_parts() {
        let vehicle = VehicleSummary {
            listing_id: "enc-1".into(),
            year: Some(2021),
            brand: Some(BrandRef {
                name: Some("Hyundai".into()),
                slug: Some("hyundai".into()),
            }),
            ..Default::default()
        };
        assert_eq!(vehicle.title(), "2021 Hyundai");
    }

    #[test]
    fn list_page_parses_partial_payloads() {
        let page: VehicleListPage =
            serde_json::from_str(r#"{"count": 2, "results": [{"listing_id": "a"}]}"#)
                .expect("partial rows should deserialize");
        assert_eq!(page.count, 2);
        assert_eq!(page.results.len(), 1);
        assert!(page.results[0].year.is_none());
    }

    #[test]
    fn grade_class_buckets_by_leading_letter() {
        assert_eq!(grade_class("A+"), "success");
        assert_eq!(grade_class("B-"), "warning");
        assert_eq!(grade_class("F"), "error");
    }
}
