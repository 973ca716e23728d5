//! Typed drug and category operations.
//!
//! # Design
//! Each operation is split into a `build_*` method that produces an
//! `HttpRequest` (pure, no I/O) and a call through the `Dispatcher`, which
//! executes and classifies it. Errors are propagated untouched; translating
//! them for people is the job of `presentation` and `dialog`.

use std::time::Duration;

use tracing::{debug, info};

use crate::classify::decode;
use crate::config::ClientConfig;
use crate::dispatch::Dispatcher;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest};
use crate::transport::{Transport, UreqTransport};
use crate::types::{Category, CategoryEntry, Drug, DrugDraft, DrugFilter};

/// Client for the drug REST API.
#[derive(Debug, Clone)]
pub struct DrugClient<T = UreqTransport> {
    base_url: String,
    max_search_results: u32,
    dispatcher: Dispatcher<T>,
}

impl DrugClient<UreqTransport> {
    /// Client using the configured base URL, timeout and result cap.
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::with_transport(&config.api_url, UreqTransport::new(config.request_timeout))
            .with_max_search_results(config.max_search_results)
    }

    /// Client with a plain `ureq` transport and the given timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self::with_transport(base_url, UreqTransport::new(timeout))
    }
}

impl<T: Transport> DrugClient<T> {
    pub fn with_transport(base_url: &str, transport: T) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            max_search_results: u32::MAX,
            dispatcher: Dispatcher::new(transport),
        }
    }

    /// Cap every `limit` sent by `list_drugs`.
    pub fn with_max_search_results(mut self, max: u32) -> Self {
        self.max_search_results = max;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        self.dispatcher.transport()
    }

    pub fn build_list_drugs(&self, filter: &DrugFilter) -> HttpRequest {
        let mut filter = filter.clone();
        if let Some(limit) = filter.limit {
            if limit > self.max_search_results {
                debug!(limit, max = self.max_search_results, "clamping search limit");
                filter.limit = Some(self.max_search_results);
            }
        }
        let query = filter.to_query_string();
        let url = if query.is_empty() {
            format!("{}/drugs", self.base_url)
        } else {
            format!("{}/drugs?{query}", self.base_url)
        };
        HttpRequest::new(HttpMethod::Get, url)
    }

    pub fn build_get_drug(&self, id: &str) -> HttpRequest {
        HttpRequest::new(HttpMethod::Get, self.drug_url(id))
    }

    pub fn build_list_categories(&self) -> HttpRequest {
        HttpRequest::new(HttpMethod::Get, format!("{}/categories", self.base_url))
    }

    pub fn build_create_drug(&self, draft: &DrugDraft) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(draft).map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(HttpRequest::new(HttpMethod::Post, format!("{}/drugs", self.base_url)).with_body(body))
    }

    pub fn build_update_drug(&self, id: &str, draft: &DrugDraft) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(draft).map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(HttpRequest::new(HttpMethod::Put, self.drug_url(id)).with_body(body))
    }

    pub fn build_delete_drug(&self, id: &str) -> HttpRequest {
        HttpRequest::new(HttpMethod::Delete, self.drug_url(id))
    }

    pub fn list_drugs(&self, filter: &DrugFilter) -> Result<Vec<Drug>, ApiError> {
        decode(self.dispatcher.dispatch(self.build_list_drugs(filter))?)
    }

    /// Fetch one drug; a missing id fails with `ApiError::NotFound`.
    pub fn get_drug(&self, id: &str) -> Result<Drug, ApiError> {
        decode(self.dispatcher.dispatch(self.build_get_drug(id))?)
    }

    pub fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        let entries: Vec<CategoryEntry> =
            decode(self.dispatcher.dispatch(self.build_list_categories())?)?;
        Ok(entries.into_iter().map(Category::from).collect())
    }

    pub fn create_drug(&self, draft: &DrugDraft) -> Result<Drug, ApiError> {
        decode(self.dispatcher.dispatch(self.build_create_drug(draft)?)?)
    }

    pub fn update_drug(&self, id: &str, draft: &DrugDraft) -> Result<Drug, ApiError> {
        decode(self.dispatcher.dispatch(self.build_update_drug(id, draft)?)?)
    }

    pub fn delete_drug(&self, id: &str) -> Result<(), ApiError> {
        info!(drug_id = id, "deleting drug");
        self.dispatcher.dispatch(self.build_delete_drug(id))?;
        info!(drug_id = id, "drug deleted");
        Ok(())
    }

    fn drug_url(&self, id: &str) -> String {
        format!("{}/drugs/{}", self.base_url, urlencoding::encode(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpResponse;
    use crate::transport::testing::StubTransport;

    const DRUG: &str = r#"{"id":"ibuprofen","name":"Ibuprofen","category":"Analgesics","description":"Pain","active_ingredients":["Ibuprofen"],"dosage_forms":["Tablet"],"side_effects":[],"contraindications":[],"created_at":"2024-01-01T00:00:00Z","updated_at":"2024-01-01T00:00:00Z"}"#;

    fn client() -> DrugClient<StubTransport> {
        DrugClient::with_transport("http://localhost:8000", StubTransport::default())
    }

    fn stubbed(responses: Vec<HttpResponse>) -> DrugClient<StubTransport> {
        DrugClient::with_transport(
            "http://localhost:8000",
            StubTransport::with(responses.into_iter().map(Ok).collect()),
        )
    }

    fn draft() -> DrugDraft {
        DrugDraft {
            name: "Ibuprofen".into(),
            category: "Analgesics".into(),
            description: "Pain".into(),
            active_ingredients: vec!["Ibuprofen".into()],
            dosage_forms: vec!["Tablet".into()],
            side_effects: vec![],
            contraindications: vec![],
        }
    }

    #[test]
    fn build_list_drugs_without_filter_has_no_query() {
        let req = client().build_list_drugs(&DrugFilter::default());
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://localhost:8000/drugs");
        assert!(req.body.is_none());
        assert!(req.headers.is_empty());
    }

    #[test]
    fn build_list_drugs_skips_empty_values() {
        let filter = DrugFilter {
            name: Some("".into()),
            ingredient: Some("ibu".into()),
            skip: Some(0),
            ..DrugFilter::default()
        };
        let req = client().build_list_drugs(&filter);
        assert_eq!(req.url, "http://localhost:8000/drugs?ingredient=ibu&skip=0");
    }

    #[test]
    fn build_list_drugs_clamps_limit() {
        let client = client().with_max_search_results(100);
        let req = client.build_list_drugs(&DrugFilter {
            limit: Some(5000),
            ..DrugFilter::default()
        });
        assert_eq!(req.url, "http://localhost:8000/drugs?limit=100");
    }

    #[test]
    fn build_get_drug_encodes_id() {
        let req = client().build_get_drug("a b/c");
        assert_eq!(req.url, "http://localhost:8000/drugs/a%20b%2Fc");
    }

    #[test]
    fn build_create_drug_produces_json_body() {
        let req = client().build_create_drug(&draft()).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost:8000/drugs");
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["name"], "Ibuprofen");
        assert_eq!(body["active_ingredients"][0], "Ibuprofen");
    }

    #[test]
    fn build_update_and_delete_target_the_drug() {
        let update = client().build_update_drug("ibuprofen", &draft()).unwrap();
        assert_eq!(update.method, HttpMethod::Put);
        assert_eq!(update.url, "http://localhost:8000/drugs/ibuprofen");
        let delete = client().build_delete_drug("ibuprofen");
        assert_eq!(delete.method, HttpMethod::Delete);
        assert!(delete.body.is_none());
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let client = DrugClient::with_transport("http://localhost:8000/", StubTransport::default());
        assert_eq!(client.build_list_categories().url, "http://localhost:8000/categories");
    }

    #[test]
    fn get_drug_decodes_payload() {
        let drug = stubbed(vec![HttpResponse::json(200, DRUG)]).get_drug("ibuprofen").unwrap();
        assert_eq!(drug.name, "Ibuprofen");
    }

    #[test]
    fn get_drug_not_found_is_distinct() {
        let err = stubbed(vec![HttpResponse::json(404, r#"{"detail":"Drug not found"}"#)])
            .get_drug("gone")
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn list_categories_accepts_names() {
        let categories = stubbed(vec![HttpResponse::json(200, r#"["Antibiotics","Pain Relief"]"#)])
            .list_categories()
            .unwrap();
        assert_eq!(categories[1].id, "pain-relief");
        assert_eq!(categories[1].name, "Pain Relief");
    }

    #[test]
    fn delete_drug_accepts_no_content() {
        let client = stubbed(vec![HttpResponse::new(204, "")]);
        client.delete_drug("ibuprofen").unwrap();
        assert_eq!(client.transport().calls(), 1);
    }

    #[test]
    fn list_drugs_bad_json() {
        let err = stubbed(vec![HttpResponse::json(200, "not json")])
            .list_drugs(&DrugFilter::default())
            .unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }
}
