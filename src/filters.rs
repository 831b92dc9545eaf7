// Filter state and its projections.
//
// FilterState is a mirror of the navigation query string, never the source
// of truth: every recognized key is read back from the query with a default
// when absent, and serializing the state merges it over an existing query.
// CatalogQuery is the typed payload actually sent to the list API, with
// numeric fields parsed out of the query strings (absent when malformed).

use serde::Serialize;

use crate::nav::QueryMap;

pub const PAGE_KEY: &str = "page";
pub const PAGE_SIZE_KEY: &str = "page_size";
pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const DEFAULT_ORDERING: &str = "-created_at";

// --- Filter fields ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    Search,
    FuelType,
    Transmission,
    YearMin,
    YearMax,
    PriceMin,
    PriceMax,
    MileageMax,
    InvestmentGrade,
    RiskLevel,
    IsVerified,
    Ordering,
    Color,
    Location,
    AccidentCount,
    OwnerChanges,
    VehicleModelSlug,
}

impl FilterField {
    pub const ALL: [FilterField; 17] = [
        FilterField::Search,
        FilterField::FuelType,
        FilterField::Transmission,
        FilterField::YearMin,
        FilterField::YearMax,
        FilterField::PriceMin,
        FilterField::PriceMax,
        FilterField::MileageMax,
        FilterField::InvestmentGrade,
        FilterField::RiskLevel,
        FilterField::IsVerified,
        FilterField::Ordering,
        FilterField::Color,
        FilterField::Location,
        FilterField::AccidentCount,
        FilterField::OwnerChanges,
        FilterField::VehicleModelSlug,
    ];

    // The query-string key for this field.
    pub fn key(self) -> &'static str {
        match self {
            FilterField::Search => "search",
            FilterField::FuelType => "fuel_type",
            FilterField::Transmission => "transmission",
            FilterField::YearMin => "year_min",
            FilterField::YearMax => "year_max",
            FilterField::PriceMin => "price_min",
            FilterField::PriceMax => "price_max",
            FilterField::MileageMax => "mileage_max",
            FilterField::InvestmentGrade => "investment_grade",
            FilterField::RiskLevel => "risk_level",
            FilterField::IsVerified => "is_verified",
            FilterField::Ordering => "ordering",
            FilterField::Color => "color",
            FilterField::Location => "location",
            FilterField::AccidentCount => "accident_count",
            FilterField::OwnerChanges => "owner_changes",
            FilterField::VehicleModelSlug => "vehicle_model_slug",
        }
    }

    pub fn default_value(self) -> &'static str {
        match self {
            FilterField::Ordering => DEFAULT_ORDERING,
            _ => "",
        }
    }
}

// --- Filter state ---

// Flat field -> string mapping; empty string means "unset". Derived entirely
// from the current navigation query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState {
    pub search: String,
    pub fuel_type: String,
    pub transmission: String,
    pub year_min: String,
    pub year_max: String,
    pub price_min: String,
    pub price_max: String,
    pub mileage_max: String,
    pub investment_grade: String,
    pub risk_level: String,
    pub is_verified: String,
    pub ordering: String,
    pub color: String,
    pub location: String,
    pub accident_count: String,
    pub owner_changes: String,
    pub vehicle_model_slug: String,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            search: String::new(),
            fuel_type: String::new(),
            transmission: String::new(),
            year_min: String::new(),
            year_max: String::new(),
            price_min: String::new(),
            price_max: String::new(),
            mileage_max: String::new(),
            investment_grade: String::new(),
            risk_level: String::new(),
            is_verified: String::new(),
            ordering: DEFAULT_ORDERING.to_string(),
            color: String::new(),
            location: String::new(),
            accident_count: String::new(),
            owner_changes: String::new(),
            vehicle_model_slug: String::new(),
        }
    }
}

impl FilterState {
    // One-way, idempotent projection of the query string: each recognized
    // key is read, missing or empty keys fall back to their defaults.
    pub fn from_query(query: &QueryMap) -> Self {
        let mut state = FilterState::default();
        for field in FilterField::ALL {
            let value = query
                .get(field.key())
                .map(String::as_str)
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| field.default_value());
            state.set(field, value);
        }
        state
    }

    pub fn get(&self, field: FilterField) -> &str {
        match field {
            FilterField::Search => &self.search,
            FilterField::FuelType => &self.fuel_type,
            FilterField::Transmission => &self.transmission,
            FilterField::YearMin => &self.year_min,
            FilterField::YearMax => &self.year_max,
            FilterField::PriceMin => &self.price_min,
            FilterField::PriceMax => &self.price_max,
            FilterField::MileageMax => &self.mileage_max,
            FilterField::InvestmentGrade => &self.investment_grade,
            FilterField::RiskLevel => &self.risk_level,
            FilterField::IsVerified => &self.is_verified,
            FilterField::Ordering => &self.ordering,
            FilterField::Color => &self.color,
            FilterField::Location => &self.location,
            FilterField::AccidentCount => &self.accident_count,
            FilterField::OwnerChanges => &self.owner_changes,
            FilterField::VehicleModelSlug => &self.vehicle_model_slug,
        }
    }

    pub fn set(&mut self, field: FilterField, value: &str) {
        let slot = match field {
            FilterField::Search => &mut self.search,
            FilterField::FuelType => &mut self.fuel_type,
            FilterField::Transmission => &mut self.transmission,
            FilterField::YearMin => &mut self.year_min,
            FilterField::YearMax => &mut self.year_max,
            FilterField::PriceMin => &mut self.price_min,
            FilterField::PriceMax => &mut self.price_max,
            FilterField::MileageMax => &mut self.mileage_max,
            FilterField::InvestmentGrade => &mut self.investment_grade,
            FilterField::RiskLevel => &mut self.risk_level,
            FilterField::IsVerified => &mut self.is_verified,
            FilterField::Ordering => &mut self.ordering,
            FilterField::Color => &mut self.color,
            FilterField::Location => &mut self.location,
            FilterField::AccidentCount => &mut self.accident_count,
            FilterField::OwnerChanges => &mut self.owner_changes,
            FilterField::VehicleModelSlug => &mut self.vehicle_model_slug,
        };
        *slot = value.to_string();
    }

    // Merge this state over an existing query: non-empty values are written,
    // empty ones remove their key. Keys outside the recognized set are left
    // untouched.
    pub fn merge_into(&self, query: &mut QueryMap) {
        for field in FilterField::ALL {
            let value = self.get(field);
            if value.is_empty() {
                query.remove(field.key());
            } else {
                query.insert(field.key().to_string(), value.to_string());
            }
        }
    }

    // The state as a standalone query (no pagination keys).
    pub fn to_query(&self) -> QueryMap {
        let mut query = QueryMap::new();
        self.merge_into(&mut query);
        query
    }

    // Number of filters the user has actually narrowed by.
    pub fn active_count(&self) -> usize {
        FilterField::ALL
            .iter()
            .filter(|field| {
                let value = self.get(**field);
                !value.is_empty() && value != field.default_value()
            })
            .count()
    }
}

// --- Sort tokens ---

// The list API accepts a fixed set of sort tokens; anything else is coerced
// to the default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum SortOrder {
    #[default]
    #[serde(rename = "-created_at")]
    NewestFirst,
    #[serde(rename = "created_at")]
    OldestFirst,
    #[serde(rename = "price")]
    PriceAsc,
    #[serde(rename = "-price")]
    PriceDesc,
    #[serde(rename = "year")]
    YearAsc,
    #[serde(rename = "-year")]
    YearDesc,
    #[serde(rename = "mileage")]
    MileageAsc,
    #[serde(rename = "-mileage")]
    MileageDesc,
}

impl SortOrder {
    pub const ALL: [SortOrder; 8] = [
        SortOrder::NewestFirst,
        SortOrder::OldestFirst,
        SortOrder::PriceAsc,
        SortOrder::PriceDesc,
        SortOrder::YearAsc,
        SortOrder::YearDesc,
        SortOrder::MileageAsc,
        SortOrder::MileageDesc,
    ];

    pub fn token(self) -> &'static str {
        match self {
            SortOrder::NewestFirst => "-created_at",
            SortOrder::OldestFirst => "created_at",
            SortOrder::PriceAsc => "price",
            SortOrder::PriceDesc => "-price",
            SortOrder::YearAsc => "year",
            SortOrder::YearDesc => "-year",
            SortOrder::MileageAsc => "mileage",
            SortOrder::MileageDesc => "-mileage",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortOrder::NewestFirst => "Newest First",
            SortOrder::OldestFirst => "Oldest First",
            SortOrder::PriceAsc => "Price Low to High",
            SortOrder::PriceDesc => "Price High to Low",
            SortOrder::YearAsc => "Year Old to New",
            SortOrder::YearDesc => "Year New to Old",
            SortOrder::MileageAsc => "Mileage Low to High",
            SortOrder::MileageDesc => "Mileage High to Low",
        }
    }

    pub fn parse(token: &str) -> Option<SortOrder> {
        SortOrder::ALL.into_iter().find(|o| o.token() == token)
    }
}

// --- Filter option tables (rendered into the catalog filter form) ---

pub const FUEL_TYPE_OPTIONS: &[(&str, &str)] = &[
    ("gasoline", "Gasoline"),
    ("diesel", "Diesel"),
    ("hybrid", "Hybrid"),
    ("plug_in_hybrid", "Plug-in Hybrid"),
    ("electric", "Electric"),
    ("hydrogen", "Hydrogen"),
    ("cng", "CNG"),
    ("lpg", "LPG"),
    ("gasoline_electric", "Gasoline/Electric"),
    ("diesel_electric", "Diesel/Electric"),
    ("lpg_electric", "LPG/Electric"),
];

pub const TRANSMISSION_OPTIONS: &[(&str, &str)] = &[
    ("manual", "Manual"),
    ("automatic", "Automatic"),
    ("cvt", "CVT"),
    ("semi_automatic", "Semi-Automatic"),
    ("semi_auto", "Semi-Auto"),
    ("dct", "DCT"),
];

pub const COLOR_OPTIONS: &[(&str, &str)] = &[
    ("white", "White"),
    ("black", "Black"),
    ("gray", "Gray"),
    ("silver", "Silver"),
    ("red", "Red"),
    ("blue", "Blue"),
    ("yellow", "Yellow"),
    ("green", "Green"),
    ("brown", "Brown"),
    ("purple", "Purple"),
    ("orange", "Orange"),
    ("pink", "Pink"),
    ("gold", "Gold"),
    ("beige", "Beige"),
    ("maroon", "Maroon"),
    ("bronze", "Bronze"),
];

pub const INVESTMENT_GRADE_OPTIONS: &[(&str, &str)] = &[
    ("A+", "A+ (Excellent)"),
    ("A", "A (Very Good)"),
    ("A-", "A- (Good Plus)"),
    ("B+", "B+ (Good)"),
    ("B", "B (Above Average)"),
    ("B-", "B- (Average Plus)"),
    ("C+", "C+ (Average)"),
    ("C", "C (Below Average)"),
    ("C-", "C- (Poor Plus)"),
    ("D+", "D+ (Poor Plus)"),
    ("D", "D (Poor)"),
    ("D-", "D- (Very Poor)"),
    ("F", "F (Avoid)"),
];

pub const RISK_LEVEL_OPTIONS: &[(&str, &str)] = &[
    ("very_low", "Very Low"),
    ("low", "Low"),
    ("medium", "Medium"),
    ("high", "High"),
    ("very_high", "Very High"),
];

// --- Catalog query (typed list-API payload) ---

fn parse_u32(value: Option<&String>) -> Option<u32> {
    value.and_then(|v| v.trim().parse::<u32>().ok())
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.filter(|v| !v.is_empty()).cloned()
}

// Boolean-as-string: exactly "true"/"false" count, anything else is unset.
fn parse_bool_literal(value: Option<&String>) -> Option<bool> {
    match value.map(String::as_str) {
        Some("true") => Some(true),
        Some("false") => Some(false),
        _ => None,
    }
}

// The request payload for the list API. Serialized straight into the request
// query string; absent options are omitted entirely.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogQuery {
    pub page: u32,
    pub page_size: u32,
    pub ordering: SortOrder,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand_slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_group_slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuel_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transmission: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year_min: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year_max: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_min: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_max: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mileage_max: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub investment_grade: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_verified: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accident_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_changes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_model_slug: Option<String>,
}

impl Default for CatalogQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            ordering: SortOrder::default(),
            brand_slug: None,
            model_group_slug: None,
            search: None,
            fuel_type: None,
            transmission: None,
            year_min: None,
            year_max: None,
            price_min: None,
            price_max: None,
            mileage_max: None,
            investment_grade: None,
            risk_level: None,
            is_verified: None,
            color: None,
            location: None,
            accident_count: None,
            owner_changes: None,
            vehicle_model_slug: None,
        }
    }
}

impl CatalogQuery {
    // Derive the typed payload from a navigation query. Malformed numeric
    // strings mean "no constraint"; they never fail the request.
    pub fn from_query(query: &QueryMap) -> Self {
        Self {
            page: parse_u32(query.get(PAGE_KEY)).filter(|p| *p >= 1).unwrap_or(1),
            page_size: parse_u32(query.get(PAGE_SIZE_KEY))
                .filter(|s| *s >= 1)
                .unwrap_or(DEFAULT_PAGE_SIZE),
            ordering: query
                .get("ordering")
                .and_then(|t| SortOrder::parse(t))
                .unwrap_or_default(),
            brand_slug: non_empty(query.get("brand_slug")),
            model_group_slug: non_empty(query.get("model_group_slug")),
            search: non_empty(query.get("search")),
            fuel_type: non_empty(query.get("fuel_type")),
            transmission: non_empty(query.get("transmission")),
            year_min: parse_u32(query.get("year_min")),
            year_max: parse_u32(query.get("year_max")),
            price_min: parse_u32(query.get("price_min")),
            price_max: parse_u32(query.get("price_max")),
            mileage_max: parse_u32(query.get("mileage_max")),
            investment_grade: non_empty(query.get("investment_grade")),
            risk_level: non_empty(query.get("risk_level")),
            is_verified: parse_bool_literal(query.get("is_verified")),
            color: non_empty(query.get("color")),
            location: non_empty(query.get("location")),
            accident_count: parse_u32(query.get("accident_count")),
            owner_changes: parse_u32(query.get("owner_changes")),
            vehicle_model_slug: non_empty(query.get("vehicle_model_slug")),
        }
    }

    // Catalog pages scoped by path carry their brand/model as slugs; path
    // parameters win over query-string slugs when both are present.
    pub fn with_route_slugs(mut self, brand: Option<&str>, model: Option<&str>) -> Self {
        if let Some(brand) = brand.filter(|s| !s.is_empty()) {
            self.brand_slug = Some(brand.to_string());
        }
        if let Some(model) = model.filter(|s| !s.is_empty()) {
            self.model_group_slug = Some(model.to_string());
        }
        self
    }
}

// --- Query transforms ---
//
// Shared by the filter synchronizer and the server-rendered chip/pagination
// links, so both commit the same shapes. Every transform resets pagination:
// a narrower or wider result set starts back at page 1.

// The query with exactly one key deleted.
pub fn query_without(query: &QueryMap, key: &str) -> QueryMap {
    let mut next = query.clone();
    next.remove(key);
    next.insert(PAGE_KEY.to_string(), "1".to_string());
    next
}

// The query with every recognized filter key removed. Keys outside the
// recognized set survive.
pub fn query_cleared(query: &QueryMap) -> QueryMap {
    let mut next = query.clone();
    for field in FilterField::ALL {
        next.remove(field.key());
    }
    next.insert(PAGE_KEY.to_string(), "1".to_string());
    next
}

// The same filters, a different page.
pub fn query_at_page(query: &QueryMap, page: u32) -> QueryMap {
    let mut next = query.clone();
    next.insert(PAGE_KEY.to_string(), page.to_string());
    next
}

// --- Active filter chips ---

// Derived, read-only projection of the query minus pagination keys; used
// only to render removable filter chips.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveFilterEntry {
    pub key: String,
    pub value: String,
    pub label: String,
}

pub fn active_filters(query: &QueryMap) -> Vec<ActiveFilterEntry> {
    query
        .iter()
        .filter(|(key, value)| {
            key.as_str() != PAGE_KEY && key.as_str() != PAGE_SIZE_KEY && !value.is_empty()
        })
        .map(|(key, value)| ActiveFilterEntry {
            key: key.clone(),
            value: value.clone(),
            label: filter_label(key, value),
        })
        .collect()
}

pub fn filter_label(key: &str, value: &str) -> String {
    match key {
        "search" => format!("Search: \"{value}\""),
        "body_type" => format!("Body: {value}"),
        "fuel_type" => format!("Fuel: {value}"),
        "transmission" => format!("Transmission: {value}"),
        "year_min" => format!("Year: from {value}"),
        "year_max" => format!("Year: to {value}"),
        "price_min" => format!("Price: from {value}만원"),
        "price_max" => format!("Price: to {value}만원"),
        "mileage_max" => format!("Max Mileage: {value}km"),
        "investment_grade" => format!("Grade: {value}"),
        "risk_level" => format!("Risk: {value}"),
        "status" => format!("Status: {value}"),
        "is_verified" => {
            if value == "true" {
                "Verified Only".to_string()
            } else {
                "Not Verified".to_string()
            }
        }
        "ordering" => format!("Sort: {value}"),
        _ => format!("{key}: {value}"),
    }
}
