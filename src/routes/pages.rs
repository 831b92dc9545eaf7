// Page handlers: landing, catalog grid, vehicle detail, not-found fallback.
// Each handler parses the navigation query, fetches through the API layer,
// precomputes a flat view model (plain strings and bools) and renders an
// askama template.

use askama::Template;
use axum::{
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Response},
};

use crate::AppState;
use crate::encar_api::VehicleApi;
use crate::error::{AppError, AppResult, not_found_response};
use crate::filters::{
    ActiveFilterEntry, CatalogQuery, COLOR_OPTIONS, FUEL_TYPE_OPTIONS, FilterState,
    INVESTMENT_GRADE_OPTIONS, RISK_LEVEL_OPTIONS, SortOrder, TRANSMISSION_OPTIONS,
    active_filters, query_at_page, query_cleared, query_without,
};
use crate::models::{VehicleDetail, VehicleListPage, VehicleSummary, grade_class, humanize};
use crate::nav::{QueryMap, encode_query, routes};

// --- Templates & view models ---

#[derive(Template)]
#[template(path = "landing.html")]
struct LandingTemplate {
    page_title: String,
    app_name: String,
    description: String,
    catalog_href: &'static str,
}

#[derive(Template)]
#[template(path = "catalog.html")]
struct CatalogTemplate {
    page_title: String,
    total_count: u64,
    cards: Vec<VehicleCardView>,
    chips: Vec<ChipView>,
    form: FilterFormView,
    pager: PagerView,
}

#[derive(Template)]
#[template(path = "vehicle.html")]
struct VehicleTemplate {
    page_title: String,
    heading: String,
    price: String,
    photo_url: String,
    rows: Vec<DetailRowView>,
    chips: Vec<CardChipView>,
}

// Removable active-filter chip above the result grid.
struct ChipView {
    label: String,
    remove_href: String,
}

// Severity-classed chip on a vehicle card (grade / risk / verified).
struct CardChipView {
    label: String,
    class: String,
}

struct VehicleCardView {
    href: String,
    title: String,
    price_usd: String,
    price_krw: String,
    mileage: String,
    fuel: String,
    transmission: String,
    location: String,
    photo_url: String,
    chips: Vec<CardChipView>,
}

struct SelectOptionView {
    value: String,
    label: String,
    selected: bool,
}

struct FilterFormView {
    action: String,
    active_count: usize,
    clear_href: String,
    search: String,
    year_min: String,
    year_max: String,
    price_min: String,
    price_max: String,
    mileage_max: String,
    location: String,
    accident_count: String,
    owner_changes: String,
    vehicle_model_slug: String,
    ordering_options: Vec<SelectOptionView>,
    fuel_options: Vec<SelectOptionView>,
    transmission_options: Vec<SelectOptionView>,
    color_options: Vec<SelectOptionView>,
    grade_options: Vec<SelectOptionView>,
    risk_options: Vec<SelectOptionView>,
    verified_options: Vec<SelectOptionView>,
}

struct PagerView {
    pages: u64,
    current: u32,
    prev_href: String,
    next_href: String,
}

struct DetailRowView {
    label: &'static str,
    value: String,
}

// --- Formatting helpers ---

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn round_to_thousand(n: u64) -> u64 {
    ((n + 500) / 1000) * 1000
}

fn format_usd(n: u64) -> String {
    format!("${}", group_thousands(round_to_thousand(n)))
}

fn format_krw(n: u64) -> String {
    format!("₩{}", group_thousands(round_to_thousand(n)))
}

fn format_km(n: u64) -> String {
    format!("{} km", group_thousands(round_to_thousand(n)))
}

fn humanize_or_na(value: &Option<String>) -> String {
    match value {
        Some(token) if !token.is_empty() => humanize(token),
        _ => "Not available".to_string(),
    }
}

fn href_for(path: &str, query: &QueryMap) -> String {
    let encoded = encode_query(query);
    if encoded.is_empty() {
        path.to_string()
    } else {
        format!("{path}?{encoded}")
    }
}

// --- View assembly ---

fn card_chips(
    grade: &Option<String>,
    risk: &Option<String>,
    verified: Option<bool>,
) -> Vec<CardChipView> {
    let mut chips = Vec::new();
    if let Some(grade) = grade.as_deref().filter(|g| !g.is_empty()) {
        chips.push(CardChipView {
            label: format!("Grade: {grade}"),
            class: grade_class(grade).to_string(),
        });
    }
    if let Some(risk) = risk.as_deref().filter(|r| !r.is_empty()) {
        chips.push(CardChipView {
            label: format!("Risk: {risk}"),
            class: "outline".to_string(),
        });
    }
    if verified == Some(true) {
        chips.push(CardChipView {
            label: "Verified".to_string(),
            class: "success".to_string(),
        });
    }
    chips
}

// Card link: the full catalog route when brand/model slugs are known,
// otherwise the short /v/ form.
fn detail_href(vehicle: &VehicleSummary) -> String {
    let brand = vehicle
        .brand
        .as_ref()
        .and_then(|b| b.slug.as_deref())
        .unwrap_or_default();
    let model = vehicle
        .model_group
        .as_ref()
        .and_then(|m| m.slug.as_deref())
        .unwrap_or_default();

    let full = if brand.is_empty() || model.is_empty() {
        Err(crate::nav::RouteError::MissingParam("brand"))
    } else {
        routes::VEHICLE.instantiate(&[
            ("brand", brand),
            ("model", model),
            ("vehicle_id", vehicle.listing_id.as_str()),
        ])
    };
    full.unwrap_or_else(|_| {
        routes::VEHICLE_SHORT
            .instantiate(&[("vehicle_id", vehicle.listing_id.as_str())])
            .unwrap_or_else(|_| "/catalog".to_string())
    })
}

fn build_card(vehicle: &VehicleSummary) -> VehicleCardView {
    VehicleCardView {
        href: detail_href(vehicle),
        title: vehicle.title(),
        price_usd: format_usd(vehicle.price_usd.unwrap_or(0)),
        price_krw: match vehicle.price_krw {
            Some(krw) if krw > 0 => format_krw(krw),
            _ => String::new(),
        },
        mileage: format_km(vehicle.mileage.unwrap_or(0)),
        fuel: humanize_or_na(&vehicle.fuel_type),
        transmission: humanize_or_na(&vehicle.transmission),
        location: vehicle.location.clone().unwrap_or_default(),
        photo_url: vehicle
            .main_photo
            .as_ref()
            .and_then(|p| p.url.clone())
            .unwrap_or_default(),
        chips: card_chips(
            &vehicle.investment_grade,
            &vehicle.risk_level,
            vehicle.is_verified,
        ),
    }
}

fn select_options(table: &[(&str, &str)], current: &str) -> Vec<SelectOptionView> {
    // Leading "All" entry clears the field.
    let mut options = vec![SelectOptionView {
        value: String::new(),
        label: "All".to_string(),
        selected: current.is_empty(),
    }];
    options.extend(table.iter().map(|(value, label)| SelectOptionView {
        value: value.to_string(),
        label: label.to_string(),
        selected: current == *value,
    }));
    options
}

fn ordering_options(current: &str) -> Vec<SelectOptionView> {
    SortOrder::ALL
        .into_iter()
        .map(|order| SelectOptionView {
            value: order.token().to_string(),
            label: order.label().to_string(),
            selected: current == order.token(),
        })
        .collect()
}

fn build_form(path: &str, state: &FilterState, query: &QueryMap) -> FilterFormView {
    FilterFormView {
        action: path.to_string(),
        active_count: state.active_count(),
        clear_href: href_for(path, &query_cleared(query)),
        search: state.search.clone(),
        year_min: state.year_min.clone(),
        year_max: state.year_max.clone(),
        price_min: state.price_min.clone(),
        price_max: state.price_max.clone(),
        mileage_max: state.mileage_max.clone(),
        location: state.location.clone(),
        accident_count: state.accident_count.clone(),
        owner_changes: state.owner_changes.clone(),
        vehicle_model_slug: state.vehicle_model_slug.clone(),
        ordering_options: ordering_options(&state.ordering),
        fuel_options: select_options(FUEL_TYPE_OPTIONS, &state.fuel_type),
        transmission_options: select_options(TRANSMISSION_OPTIONS, &state.transmission),
        color_options: select_options(COLOR_OPTIONS, &state.color),
        grade_options: select_options(INVESTMENT_GRADE_OPTIONS, &state.investment_grade),
        risk_options: select_options(RISK_LEVEL_OPTIONS, &state.risk_level),
        verified_options: select_options(
            &[("true", "Verified Only"), ("false", "Not Verified")],
            &state.is_verified,
        ),
    }
}

fn build_chips(path: &str, query: &QueryMap) -> Vec<ChipView> {
    active_filters(query)
        .into_iter()
        .map(|ActiveFilterEntry { key, label, .. }| ChipView {
            remove_href: href_for(path, &query_without(query, &key)),
            label,
        })
        .collect()
}

fn build_pager(path: &str, query: &QueryMap, payload: &CatalogQuery, total_count: u64) -> PagerView {
    let pages = total_count.div_ceil(u64::from(payload.page_size)).max(1);
    let current = payload.page;
    let prev_href = if current > 1 {
        href_for(path, &query_at_page(query, current - 1))
    } else {
        String::new()
    };
    let next_href = if u64::from(current) < pages {
        href_for(path, &query_at_page(query, current + 1))
    } else {
        String::new()
    };
    PagerView {
        pages,
        current,
        prev_href,
        next_href,
    }
}

fn catalog_page_title(brand: Option<&str>, model: Option<&str>) -> String {
    match (brand, model) {
        (Some(brand), Some(model)) => format!("{brand} {model} Catalog"),
        (Some(brand), None) => format!("{brand} Catalog"),
        _ => "Vehicle Catalog".to_string(),
    }
}

fn catalog_view(
    path: &str,
    query: &QueryMap,
    brand: Option<&str>,
    model: Option<&str>,
    payload: &CatalogQuery,
    listing: VehicleListPage,
) -> CatalogTemplate {
    let state = FilterState::from_query(query);
    CatalogTemplate {
        page_title: catalog_page_title(brand, model),
        total_count: listing.count,
        cards: listing.results.iter().map(build_card).collect(),
        chips: build_chips(path, query),
        form: build_form(path, &state, query),
        pager: build_pager(path, query, payload, listing.count),
    }
}

fn render<T: Template>(template: T) -> AppResult<Html<String>> {
    match template.render() {
        Ok(html) => Ok(Html(html)),
        Err(e) => {
            tracing::error!("Failed to render template: {}", e);
            Err(AppError::Internal(anyhow::Error::new(e)))
        }
    }
}

// --- Handlers ---

pub async fn landing_page(State(app_state): State<AppState>) -> AppResult<impl IntoResponse> {
    let app = &app_state.settings.app;
    render(LandingTemplate {
        page_title: app.title.clone(),
        app_name: app.name.clone(),
        description: app.description.clone(),
        catalog_href: routes::CATALOG.path(),
    })
}

async fn render_catalog(
    app_state: &AppState,
    path: String,
    query: QueryMap,
    brand: Option<String>,
    model: Option<String>,
) -> AppResult<Html<String>> {
    let payload =
        CatalogQuery::from_query(&query).with_route_slugs(brand.as_deref(), model.as_deref());

    // An upstream failure degrades to the zero-count state; the page itself
    // still renders.
    let listing = match app_state.api.list_vehicles(&payload).await {
        Ok(listing) => listing,
        Err(e) => {
            tracing::error!("Failed to fetch catalog page: {:?}", e);
            VehicleListPage::default()
        }
    };

    render(catalog_view(
        &path,
        &query,
        brand.as_deref(),
        model.as_deref(),
        &payload,
        listing,
    ))
}

pub async fn catalog_index(
    State(app_state): State<AppState>,
    Query(query): Query<QueryMap>,
) -> AppResult<impl IntoResponse> {
    render_catalog(
        &app_state,
        routes::CATALOG.path().to_string(),
        query,
        None,
        None,
    )
    .await
}

pub async fn catalog_brand(
    State(app_state): State<AppState>,
    Path(brand): Path<String>,
    Query(query): Query<QueryMap>,
) -> AppResult<impl IntoResponse> {
    let path = routes::CATALOG_BRAND
        .instantiate(&[("brand", &brand)])
        .map_err(anyhow::Error::new)?;
    render_catalog(&app_state, path, query, Some(brand), None).await
}

pub async fn catalog_model(
    State(app_state): State<AppState>,
    Path((brand, model)): Path<(String, String)>,
    Query(query): Query<QueryMap>,
) -> AppResult<impl IntoResponse> {
    let path = routes::CATALOG_MODEL
        .instantiate(&[("brand", &brand), ("model", &model)])
        .map_err(anyhow::Error::new)?;
    render_catalog(&app_state, path, query, Some(brand), Some(model)).await
}

fn detail_view(vehicle: &VehicleDetail) -> VehicleTemplate {
    let price = if let Some(usd) = vehicle.price_usd.filter(|p| *p > 0) {
        format_usd(usd)
    } else if let Some(krw) = vehicle.price.filter(|p| *p > 0) {
        format!("{}만원", group_thousands(krw))
    } else {
        "Price not available".to_string()
    };

    let mut rows = vec![
        DetailRowView {
            label: "Mileage",
            value: match vehicle.mileage {
                Some(km) => format!("{}km", group_thousands(km)),
                None => "Not available".to_string(),
            },
        },
        DetailRowView {
            label: "Fuel",
            value: humanize_or_na(&vehicle.fuel_type),
        },
        DetailRowView {
            label: "Transmission",
            value: humanize_or_na(&vehicle.transmission),
        },
    ];
    if let Some(year) = vehicle.year {
        rows.push(DetailRowView {
            label: "Year",
            value: year.to_string(),
        });
    }
    if let Some(displacement) = vehicle.displacement {
        rows.push(DetailRowView {
            label: "Engine",
            value: format!("{displacement}cc"),
        });
    }
    if let Some(color) = vehicle.color.as_deref().filter(|c| !c.is_empty()) {
        rows.push(DetailRowView {
            label: "Color",
            value: humanize(color),
        });
    }
    if let Some(seats) = vehicle.seat_count {
        rows.push(DetailRowView {
            label: "Seats",
            value: seats.to_string(),
        });
    }
    if let Some(body) = vehicle.body_type.as_deref().filter(|b| !b.is_empty()) {
        rows.push(DetailRowView {
            label: "Body Type",
            value: humanize(body),
        });
    }

    VehicleTemplate {
        page_title: vehicle
            .meta_title
            .clone()
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| vehicle.title()),
        heading: vehicle.title(),
        price,
        photo_url: vehicle
            .main_photo
            .as_ref()
            .and_then(|p| p.url.clone())
            .unwrap_or_default(),
        rows,
        chips: card_chips(
            &vehicle.investment_grade,
            &vehicle.risk_level,
            vehicle.is_verified,
        ),
    }
}

async fn render_vehicle(app_state: &AppState, vehicle_id: String) -> AppResult<Html<String>> {
    // A missing id is a not-found page, not a server error.
    if vehicle_id.is_empty() {
        return Err(AppError::NotFound);
    }
    let vehicle = app_state
        .api
        .get_vehicle(&vehicle_id)
        .await?
        .ok_or(AppError::NotFound)?;
    render(detail_view(&vehicle))
}

pub async fn vehicle_page(
    State(app_state): State<AppState>,
    Path((_brand, _model, vehicle_id)): Path<(String, String, String)>,
) -> AppResult<impl IntoResponse> {
    render_vehicle(&app_state, vehicle_id).await
}

pub async fn vehicle_short_page(
    State(app_state): State<AppState>,
    Path(vehicle_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    render_vehicle(&app_state, vehicle_id).await
}

// Router fallback for every unknown path.
pub async fn not_found() -> Response {
    not_found_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BrandRef, ModelRef, PhotoRef};

    fn summary(id: &str, year: u32) -> VehicleSummary {
        VehicleSummary {
            listing_id: id.to_string(),
            year: Some(year),
            brand: Some(BrandRef {
                name: Some("Hyundai".into()),
                slug: Some("hyundai".into()),
            }),
            vehicle_model: Some(ModelRef {
                name: Some("Sonata".into()),
                slug: Some("sonata".into()),
            }),
            model_group: Some(ModelRef {
                name: Some("Sonata".into()),
                slug: Some("sonata".into()),
            }),
            price_usd: Some(18_400),
            price_krw: Some(24_300_000),
            mileage: Some(48_211),
            fuel_type: Some("gasoline".into()),
            transmission: Some("automatic".into()),
            investment_grade: Some("A".into()),
            risk_level: Some("low".into()),
            is_verified: Some(true),
            main_photo: Some(PhotoRef {
                url: Some("/media/photos/1.jpg".into()),
            }),
            location: Some("Seoul".into()),
        }
    }

    fn query_of(pairs: &[(&str, &str)]) -> QueryMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn initial_catalog_render_shows_all_seeded_cards() {
        let listing = VehicleListPage {
            count: 3,
            results: vec![summary("a", 2019), summary("b", 2020), summary("c", 2021)],
        };
        let query = query_of(&[("page", "1")]);
        let payload = CatalogQuery::from_query(&query);
        let html = catalog_view("/catalog", &query, None, None, &payload, listing)
            .render()
            .expect("catalog template renders");

        assert!(html.contains("Found 3 vehicles"));
        assert_eq!(html.matches("class=\"card\"").count(), 3);
        assert!(html.contains("/catalog/hyundai/sonata/a"));
    }

    #[test]
    fn zero_count_render_falls_back_to_no_results() {
        let query = QueryMap::new();
        let payload = CatalogQuery::from_query(&query);
        let html = catalog_view(
            "/catalog",
            &query,
            None,
            None,
            &payload,
            VehicleListPage::default(),
        )
        .render()
        .expect("empty catalog renders");
        assert!(html.contains("Found 0 vehicles"));
        assert!(html.contains("No vehicles found"));
    }

    #[test]
    fn chip_links_drop_their_key_and_reset_the_page() {
        let query = query_of(&[("fuel_type", "diesel"), ("year_min", "2015"), ("page", "3")]);
        let chips = build_chips("/catalog", &query);
        let fuel = chips
            .iter()
            .find(|c| c.label == "Fuel: diesel")
            .expect("fuel chip present");
        assert!(fuel.remove_href.contains("year_min=2015"));
        assert!(fuel.remove_href.contains("page=1"));
        assert!(!fuel.remove_href.contains("fuel_type"));
    }

    #[test]
    fn detail_href_falls_back_to_the_short_route() {
        let mut vehicle = summary("enc-9", 2018);
        vehicle.brand = None;
        assert_eq!(detail_href(&vehicle), "/v/enc-9");
        assert_eq!(detail_href(&summary("enc-9", 2018)), "/catalog/hyundai/sonata/enc-9");
    }

    #[test]
    fn prices_round_to_the_nearest_thousand() {
        assert_eq!(format_usd(18_400), "$18,000");
        assert_eq!(format_usd(18_600), "$19,000");
        assert_eq!(format_km(48_211), "48,000 km");
    }

    #[test]
    fn select_options_mark_the_current_value() {
        let options = select_options(FUEL_TYPE_OPTIONS, "diesel");
        assert!(options[0].selected == false && options[0].label == "All");
        let diesel = options.iter().find(|o| o.value == "diesel").expect("diesel option");
        assert!(diesel.selected);
    }

    #[test]
    fn dynamic_titles_follow_the_route_scope() {
        assert_eq!(catalog_page_title(None, None), "Vehicle Catalog");
        assert_eq!(catalog_page_title(Some("kia"), None), "kia Catalog");
        assert_eq!(catalog_page_title(Some("kia"), Some("ev6")), "kia ev6 Catalog");
    }

    #[test]
    fn pager_links_preserve_filters() {
        let query = query_of(&[("fuel_type", "diesel"), ("page", "2")]);
        let payload = CatalogQuery::from_query(&query);
        let pager = build_pager("/catalog", &query, &payload, 55);
        assert_eq!(pager.pages, 3);
        assert!(pager.prev_href.contains("page=1"));
        assert!(pager.next_href.contains("page=3"));
        assert!(pager.next_href.contains("fuel_type=diesel"));
    }
}
