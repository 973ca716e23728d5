//! In-memory drug database backend.
//!
//! Serves the REST surface the client core talks to: filtered listing,
//! categories, single-drug CRUD and two liveness endpoints. State lives in a
//! `RwLock<BTreeMap>` keyed by drug id and is lost on shutdown.

use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{info, warn};

pub const DEFAULT_LIMIT: i64 = 100;
pub const MAX_LIMIT: i64 = 1000;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Drug {
    pub id: String,
    pub name: String,
    pub category: String,
    pub description: String,
    pub active_ingredients: Vec<String>,
    pub dosage_forms: Vec<String>,
    pub side_effects: Vec<String>,
    pub contraindications: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /drugs`. Missing fields are reported as field errors rather
/// than a deserialization failure.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateDrug {
    pub id: Option<String>,
    pub name: String,
    pub category: String,
    pub description: String,
    pub active_ingredients: Vec<String>,
    pub dosage_forms: Vec<String>,
    pub side_effects: Vec<String>,
    pub contraindications: Vec<String>,
}

/// Body of `PUT /drugs/{id}`. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateDrug {
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub active_ingredients: Option<Vec<String>>,
    pub dosage_forms: Option<Vec<String>>,
    pub side_effects: Option<Vec<String>>,
    pub contraindications: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub name: Option<String>,
    pub category: Option<String>,
    pub ingredient: Option<String>,
    pub created_after: Option<String>,
    pub created_before: Option<String>,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

pub type Db = Arc<RwLock<BTreeMap<String, Drug>>>;

/// Error responses in the `{"detail": ..}` shape, with per-field messages
/// under `errors` for validation failures.
#[derive(Debug)]
pub enum AppError {
    NotFound,
    Conflict(String),
    Invalid(BTreeMap<String, String>),
    Malformed(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound => {
                (StatusCode::NOT_FOUND, Json(json!({ "detail": "Drug not found" }))).into_response()
            }
            AppError::Conflict(id) => (
                StatusCode::CONFLICT,
                Json(json!({ "detail": format!("Drug '{id}' already exists") })),
            )
                .into_response(),
            AppError::Invalid(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "detail": "Validation failed", "errors": errors })),
            )
                .into_response(),
            AppError::Malformed(message) => {
                (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({ "detail": message }))).into_response()
            }
        }
    }
}

pub fn app() -> Router {
    router(Db::default())
}

/// Router pre-loaded with the sample catalogue.
pub fn seeded_app() -> Router {
    let now = Utc::now();
    let drugs = sample_drugs()
        .into_iter()
        .map(|input| {
            let drug = new_drug(slugify(&input.name), input, now);
            (drug.id.clone(), drug)
        })
        .collect();
    router(Arc::new(RwLock::new(drugs)))
}

fn router(db: Db) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/drugs", get(list_drugs).post(create_drug))
        .route("/drugs/{id}", get(get_drug).put(update_drug).delete(delete_drug))
        .route("/categories", get(list_categories))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_seeded(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, seeded_app()).await
}

/// Lower-case `name` and replace whitespace runs with `-`.
pub fn slugify(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

async fn root() -> Json<serde_json::Value> {
    Json(json!({
        "message": "Welcome to the Drug Database API",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy", "version": env!("CARGO_PKG_VERSION") }))
}

async fn list_drugs(
    State(db): State<Db>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Vec<Drug>>, AppError> {
    let Query(params) = params.map_err(|e| AppError::Malformed(e.body_text()))?;

    let mut errors = BTreeMap::new();
    let skip = params.skip.unwrap_or(0);
    if skip < 0 {
        errors.insert("skip".to_string(), "skip must be greater than or equal to 0".to_string());
    }
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
    if !(1..=MAX_LIMIT).contains(&limit) {
        errors.insert("limit".to_string(), format!("limit must be between 1 and {MAX_LIMIT}"));
    }
    let after = parse_bound(&params.created_after, "created_after", &mut errors);
    let before = parse_bound(&params.created_before, "created_before", &mut errors);
    if !errors.is_empty() {
        return Err(AppError::Invalid(errors));
    }

    let drugs = db.read().await;
    let mut matched: Vec<Drug> = drugs
        .values()
        .filter(|d| contains(&d.name, &params.name))
        .filter(|d| contains(&d.category, &params.category))
        .filter(|d| match &params.ingredient {
            Some(_) => d.active_ingredients.iter().any(|i| contains(i, &params.ingredient)),
            None => true,
        })
        .filter(|d| after.map_or(true, |a| d.created_at >= a))
        .filter(|d| before.map_or(true, |b| d.created_at <= b))
        .cloned()
        .collect();
    matched.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));

    Ok(Json(
        matched
            .into_iter()
            .skip(skip as usize)
            .take(limit as usize)
            .collect(),
    ))
}

async fn list_categories(State(db): State<Db>) -> Json<Vec<String>> {
    let drugs = db.read().await;
    let mut names: Vec<String> = drugs.values().map(|d| d.category.clone()).collect();
    names.sort();
    names.dedup();
    Json(names)
}

async fn get_drug(State(db): State<Db>, Path(id): Path<String>) -> Result<Json<Drug>, AppError> {
    let drugs = db.read().await;
    drugs.get(&id).cloned().map(Json).ok_or(AppError::NotFound)
}

async fn create_drug(
    State(db): State<Db>,
    input: Result<Json<CreateDrug>, JsonRejection>,
) -> Result<(StatusCode, Json<Drug>), AppError> {
    let Json(mut input) = input.map_err(|e| AppError::Malformed(e.body_text()))?;
    trim_create(&mut input);
    let errors = validate_create(&input);
    if !errors.is_empty() {
        warn!(?errors, "rejected drug");
        return Err(AppError::Invalid(errors));
    }

    let id = match input.id.take().filter(|id| !id.trim().is_empty()) {
        Some(id) => id,
        None => slugify(&input.name),
    };
    let mut drugs = db.write().await;
    if drugs.contains_key(&id) {
        return Err(AppError::Conflict(id));
    }
    let drug = new_drug(id, input, Utc::now());
    drugs.insert(drug.id.clone(), drug.clone());
    info!(drug_id = %drug.id, "created drug");
    Ok((StatusCode::CREATED, Json(drug)))
}

async fn update_drug(
    State(db): State<Db>,
    Path(id): Path<String>,
    input: Result<Json<UpdateDrug>, JsonRejection>,
) -> Result<Json<Drug>, AppError> {
    let Json(input) = input.map_err(|e| AppError::Malformed(e.body_text()))?;
    let errors = validate_update(&input);
    if !errors.is_empty() {
        return Err(AppError::Invalid(errors));
    }

    let mut drugs = db.write().await;
    let drug = drugs.get_mut(&id).ok_or(AppError::NotFound)?;
    if let Some(name) = input.name {
        drug.name = name.trim().to_string();
    }
    if let Some(category) = input.category {
        drug.category = category.trim().to_string();
    }
    if let Some(description) = input.description {
        drug.description = description.trim().to_string();
    }
    if let Some(items) = input.active_ingredients {
        drug.active_ingredients = items;
    }
    if let Some(items) = input.dosage_forms {
        drug.dosage_forms = items;
    }
    if let Some(items) = input.side_effects {
        drug.side_effects = items;
    }
    if let Some(items) = input.contraindications {
        drug.contraindications = items;
    }
    drug.updated_at = Utc::now().max(drug.created_at);
    info!(drug_id = %drug.id, "updated drug");
    Ok(Json(drug.clone()))
}

async fn delete_drug(State(db): State<Db>, Path(id): Path<String>) -> Result<StatusCode, AppError> {
    let mut drugs = db.write().await;
    drugs.remove(&id).ok_or(AppError::NotFound)?;
    info!(drug_id = %id, "deleted drug");
    Ok(StatusCode::NO_CONTENT)
}

fn new_drug(id: String, input: CreateDrug, now: DateTime<Utc>) -> Drug {
    Drug {
        id,
        name: input.name,
        category: input.category,
        description: input.description,
        active_ingredients: input.active_ingredients,
        dosage_forms: input.dosage_forms,
        side_effects: input.side_effects,
        contraindications: input.contraindications,
        created_at: now,
        updated_at: now,
    }
}

fn trim_create(input: &mut CreateDrug) {
    input.name = input.name.trim().to_string();
    input.category = input.category.trim().to_string();
    input.description = input.description.trim().to_string();
}

fn validate_create(input: &CreateDrug) -> BTreeMap<String, String> {
    let mut errors = BTreeMap::new();
    let mut require = |field: &str, ok: bool, message: &str| {
        if !ok {
            errors.insert(field.to_string(), message.to_string());
        }
    };
    require("name", !input.name.is_empty(), "Name cannot be empty");
    require("category", !input.category.is_empty(), "Category cannot be empty");
    require("description", !input.description.is_empty(), "Description cannot be empty");
    require(
        "active_ingredients",
        !input.active_ingredients.is_empty(),
        "At least one active ingredient is required",
    );
    require(
        "dosage_forms",
        !input.dosage_forms.is_empty(),
        "At least one dosage form is required",
    );
    errors
}

fn validate_update(input: &UpdateDrug) -> BTreeMap<String, String> {
    let mut errors = BTreeMap::new();
    let blank = |value: &Option<String>| value.as_deref().is_some_and(|v| v.trim().is_empty());
    if blank(&input.name) {
        errors.insert("name".to_string(), "Name cannot be empty".to_string());
    }
    if blank(&input.category) {
        errors.insert("category".to_string(), "Category cannot be empty".to_string());
    }
    if input.active_ingredients.as_ref().is_some_and(Vec::is_empty) {
        errors.insert(
            "active_ingredients".to_string(),
            "At least one active ingredient is required".to_string(),
        );
    }
    if input.dosage_forms.as_ref().is_some_and(Vec::is_empty) {
        errors.insert(
            "dosage_forms".to_string(),
            "At least one dosage form is required".to_string(),
        );
    }
    errors
}

fn contains(haystack: &str, needle: &Option<String>) -> bool {
    match needle.as_deref().map(str::trim) {
        Some(n) if !n.is_empty() => haystack.to_lowercase().contains(&n.to_lowercase()),
        _ => true,
    }
}

/// Accepts `YYYY-MM-DD` (midnight UTC), RFC 3339 or a naive ISO-8601 datetime.
fn parse_bound(
    value: &Option<String>,
    field: &str,
    errors: &mut BTreeMap<String, String>,
) -> Option<DateTime<Utc>> {
    let raw = value.as_deref().map(str::trim).filter(|v| !v.is_empty())?;
    let parsed = DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|dt| dt.and_utc())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc())
        });
    if parsed.is_none() {
        errors.insert(field.to_string(), format!("invalid date: {raw}"));
    }
    parsed
}

fn sample_drugs() -> Vec<CreateDrug> {
    let owned = |items: &[&str]| -> Vec<String> { items.iter().map(|s| s.to_string()).collect() };
    vec![
        CreateDrug {
            id: None,
            name: "Amoxicillin".into(),
            category: "Antibiotics".into(),
            description: "A penicillin antibiotic that fights bacteria".into(),
            active_ingredients: owned(&["Amoxicillin Trihydrate"]),
            dosage_forms: owned(&["Capsule", "Tablet", "Oral suspension"]),
            side_effects: owned(&["Diarrhea", "Stomach upset", "Nausea", "Vomiting", "Rash"]),
            contraindications: owned(&["Penicillin allergy", "Mononucleosis"]),
        },
        CreateDrug {
            id: None,
            name: "Ibuprofen".into(),
            category: "Analgesics".into(),
            description: "Reduces inflammation and treats pain or fever".into(),
            active_ingredients: owned(&["Ibuprofen"]),
            dosage_forms: owned(&["Tablet", "Capsule", "Oral suspension", "Topical gel"]),
            side_effects: owned(&["Upset stomach", "Heartburn", "Dizziness", "Headache"]),
            contraindications: owned(&["Aspirin allergy", "Heart failure", "Stomach ulcers"]),
        },
        CreateDrug {
            id: None,
            name: "Lisinopril".into(),
            category: "Cardiovascular".into(),
            description: "ACE inhibitor that treats high blood pressure".into(),
            active_ingredients: owned(&["Lisinopril"]),
            dosage_forms: owned(&["Tablet"]),
            side_effects: owned(&["Dizziness", "Headache", "Dry cough", "Fatigue"]),
            contraindications: owned(&["Pregnancy", "History of angioedema", "Kidney disease"]),
        },
        CreateDrug {
            id: None,
            name: "Metformin".into(),
            category: "Antidiabetic".into(),
            description: "Used to treat type 2 diabetes".into(),
            active_ingredients: owned(&["Metformin Hydrochloride"]),
            dosage_forms: owned(&["Tablet", "Extended-release tablet"]),
            side_effects: owned(&["Nausea", "Diarrhea", "Stomach upset", "Metallic taste"]),
            contraindications: owned(&["Kidney disease", "Liver disease", "Heart failure"]),
        },
    ]
}
