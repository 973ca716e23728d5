//! Drug draft form state and submit-time validation.
//!
//! Validation runs once per submit attempt over the whole form, never per
//! keystroke. Multi-valued groups are edited one token at a time.

use std::collections::BTreeMap;
use std::fmt;

use tracing::warn;

use crate::error::FieldErrors;
use crate::types::{Drug, DrugDraft};

/// Form fields that can carry an error message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FormField {
    Name,
    Category,
    Description,
    ActiveIngredients,
    DosageForms,
    SideEffects,
    Contraindications,
}

impl FormField {
    pub const ALL: [FormField; 7] = [
        FormField::Name,
        FormField::Category,
        FormField::Description,
        FormField::ActiveIngredients,
        FormField::DosageForms,
        FormField::SideEffects,
        FormField::Contraindications,
    ];

    /// Wire name of the field in drug payloads.
    pub fn key(&self) -> &'static str {
        match self {
            FormField::Name => "name",
            FormField::Category => "category",
            FormField::Description => "description",
            FormField::ActiveIngredients => "active_ingredients",
            FormField::DosageForms => "dosage_forms",
            FormField::SideEffects => "side_effects",
            FormField::Contraindications => "contraindications",
        }
    }

    /// Resolve a backend error key, accepting snake_case or camelCase.
    pub fn from_key(key: &str) -> Option<Self> {
        let normalized: String = key.chars().filter(|c| *c != '_').collect::<String>().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|field| field.key().replace('_', "") == normalized)
    }

    fn required_message(&self) -> &'static str {
        match self {
            FormField::Name => "Name is required",
            FormField::Category => "Category is required",
            FormField::Description => "Description is required",
            FormField::ActiveIngredients => "At least one active ingredient is required",
            FormField::DosageForms => "At least one dosage form is required",
            FormField::SideEffects => "Side effects are required",
            FormField::Contraindications => "Contraindications are required",
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Local, pre-submission validation failure. Never reaches the network.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{}", .0.required_message())]
    MissingField(FormField),
}

impl ValidationError {
    pub fn field(&self) -> FormField {
        match self {
            ValidationError::MissingField(field) => *field,
        }
    }
}

/// An ordered list edited by "add one token, remove by position".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenList {
    items: Vec<String>,
}

impl TokenList {
    pub fn from_items(items: &[String]) -> Self {
        Self {
            items: items.to_vec(),
        }
    }

    /// Append the trimmed token; blank input is ignored. Returns whether
    /// anything was added.
    pub fn add(&mut self, token: &str) -> bool {
        let token = token.trim();
        if token.is_empty() {
            return false;
        }
        self.items.push(token.to_string());
        true
    }

    /// Remove the token at `index`, if there is one.
    pub fn remove(&mut self, index: usize) -> Option<String> {
        (index < self.items.len()).then(|| self.items.remove(index))
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

/// Editable drug draft plus the error state shown next to each field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrugForm {
    pub name: String,
    /// An existing category picked from the list.
    pub category: Option<String>,
    /// A user-typed new category; wins over `category` when non-blank.
    pub new_category: Option<String>,
    pub description: String,
    pub active_ingredients: TokenList,
    pub dosage_forms: TokenList,
    pub side_effects: TokenList,
    pub contraindications: TokenList,
    errors: BTreeMap<FormField, String>,
}

impl DrugForm {
    /// Empty form for creating a drug.
    pub fn new() -> Self {
        Self::default()
    }

    /// Form pre-populated from an existing drug.
    pub fn for_edit(drug: &Drug) -> Self {
        Self {
            name: drug.name.clone(),
            category: Some(drug.category.clone()),
            new_category: None,
            description: drug.description.clone(),
            active_ingredients: TokenList::from_items(&drug.active_ingredients),
            dosage_forms: TokenList::from_items(&drug.dosage_forms),
            side_effects: TokenList::from_items(&drug.side_effects),
            contraindications: TokenList::from_items(&drug.contraindications),
            errors: BTreeMap::new(),
        }
    }

    /// The token list behind `field`, if it is a list field.
    pub fn list_mut(&mut self, field: FormField) -> Option<&mut TokenList> {
        match field {
            FormField::ActiveIngredients => Some(&mut self.active_ingredients),
            FormField::DosageForms => Some(&mut self.dosage_forms),
            FormField::SideEffects => Some(&mut self.side_effects),
            FormField::Contraindications => Some(&mut self.contraindications),
            FormField::Name | FormField::Category | FormField::Description => None,
        }
    }

    pub fn errors(&self) -> &BTreeMap<FormField, String> {
        &self.errors
    }

    pub fn error(&self, field: FormField) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    /// The category that would be submitted.
    pub fn effective_category(&self) -> Option<&str> {
        non_blank(self.new_category.as_deref()).or_else(|| non_blank(self.category.as_deref()))
    }

    /// Validate the whole form, replacing the error state.
    ///
    /// On success returns the draft to submit, with text fields trimmed.
    pub fn validate(&mut self) -> Result<DrugDraft, Vec<ValidationError>> {
        let mut missing = Vec::new();
        if self.name.trim().is_empty() {
            missing.push(FormField::Name);
        }
        if self.effective_category().is_none() {
            missing.push(FormField::Category);
        }
        if self.description.trim().is_empty() {
            missing.push(FormField::Description);
        }
        if self.active_ingredients.is_empty() {
            missing.push(FormField::ActiveIngredients);
        }
        if self.dosage_forms.is_empty() {
            missing.push(FormField::DosageForms);
        }

        let errors: Vec<ValidationError> =
            missing.into_iter().map(ValidationError::MissingField).collect();
        self.errors = errors
            .iter()
            .map(|e| (e.field(), e.to_string()))
            .collect();

        if !errors.is_empty() {
            for e in &errors {
                warn!(field = %e.field(), message = %e, "validation error");
            }
            return Err(errors);
        }

        Ok(DrugDraft {
            name: self.name.trim().to_string(),
            category: self.effective_category().unwrap_or_default().to_string(),
            description: self.description.trim().to_string(),
            active_ingredients: self.active_ingredients.items().to_vec(),
            dosage_forms: self.dosage_forms.items().to_vec(),
            side_effects: self.side_effects.items().to_vec(),
            contraindications: self.contraindications.items().to_vec(),
        })
    }

    /// Replace the error state with backend field errors.
    ///
    /// Returns the messages whose keys match no form field.
    pub fn apply_server_errors(&mut self, field_errors: &FieldErrors) -> Vec<String> {
        self.errors.clear();
        let mut unmatched = Vec::new();
        for (key, message) in field_errors {
            match FormField::from_key(key) {
                Some(field) => {
                    self.errors.insert(field, message.clone());
                }
                None => unmatched.push(format!("{key}: {message}")),
            }
        }
        unmatched
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> DrugForm {
        let mut form = DrugForm::new();
        form.name = "  Amoxicillin ".into();
        form.category = Some("Antibiotics".into());
        form.description = "A penicillin antibiotic".into();
        form.active_ingredients.add("Amoxicillin Trihydrate");
        form.dosage_forms.add("Capsule");
        form
    }

    #[test]
    fn empty_form_reports_every_required_field() {
        let mut form = DrugForm::new();
        let errors = form.validate().unwrap_err();
        let fields: Vec<FormField> = errors.iter().map(ValidationError::field).collect();
        assert_eq!(
            fields,
            vec![
                FormField::Name,
                FormField::Category,
                FormField::Description,
                FormField::ActiveIngredients,
                FormField::DosageForms,
            ]
        );
        assert_eq!(form.error(FormField::Name), Some("Name is required"));
        assert_eq!(form.error(FormField::SideEffects), None);
    }

    #[test]
    fn whitespace_only_text_is_missing() {
        let mut form = filled();
        form.description = "   ".into();
        let errors = form.validate().unwrap_err();
        assert_eq!(errors, vec![ValidationError::MissingField(FormField::Description)]);
    }

    #[test]
    fn missing_ingredients_is_tagged_to_that_field() {
        let mut form = filled();
        form.active_ingredients.remove(0);
        let errors = form.validate().unwrap_err();
        assert_eq!(errors, vec![ValidationError::MissingField(FormField::ActiveIngredients)]);
        assert_eq!(
            form.error(FormField::ActiveIngredients),
            Some("At least one active ingredient is required")
        );
    }

    #[test]
    fn new_category_satisfies_and_wins() {
        let mut form = filled();
        form.category = None;
        form.new_category = Some("Penicillins".into());
        let draft = form.validate().unwrap();
        assert_eq!(draft.category, "Penicillins");

        form.category = Some("Antibiotics".into());
        form.new_category = Some("  ".into());
        assert_eq!(form.validate().unwrap().category, "Antibiotics");
    }

    #[test]
    fn valid_form_produces_trimmed_draft_and_clears_errors() {
        let mut form = DrugForm::new();
        assert!(form.validate().is_err());
        form = DrugForm { errors: form.errors.clone(), ..filled() };
        let draft = form.validate().unwrap();
        assert_eq!(draft.name, "Amoxicillin");
        assert!(draft.side_effects.is_empty());
        assert!(form.errors().is_empty());
    }

    #[test]
    fn token_list_ignores_blank_and_removes_by_position() {
        let mut list = TokenList::default();
        assert!(!list.add("   "));
        assert!(list.add(" Rash "));
        assert!(list.add("Nausea"));
        assert_eq!(list.items(), ["Rash".to_string(), "Nausea".to_string()]);
        assert_eq!(list.remove(5), None);
        assert_eq!(list.remove(0).as_deref(), Some("Rash"));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn list_mut_reaches_only_list_fields() {
        let mut form = DrugForm::new();
        form.list_mut(FormField::SideEffects).unwrap().add("Dizziness");
        assert_eq!(form.side_effects.items(), ["Dizziness".to_string()]);
        assert!(form.list_mut(FormField::Description).is_none());
    }

    #[test]
    fn server_errors_replace_local_errors() {
        let mut form = DrugForm::new();
        let _ = form.validate();
        let mut server = FieldErrors::new();
        server.insert("activeIngredients".into(), "Unknown ingredient".into());
        server.insert("strength".into(), "Not supported".into());

        let unmatched = form.apply_server_errors(&server);
        assert_eq!(form.errors().len(), 1);
        assert_eq!(form.error(FormField::ActiveIngredients), Some("Unknown ingredient"));
        assert_eq!(unmatched, vec!["strength: Not supported".to_string()]);
    }

    #[test]
    fn field_keys_resolve_in_both_cases() {
        assert_eq!(FormField::from_key("dosage_forms"), Some(FormField::DosageForms));
        assert_eq!(FormField::from_key("dosageForms"), Some(FormField::DosageForms));
        assert_eq!(FormField::from_key("name"), Some(FormField::Name));
        assert_eq!(FormField::from_key("id"), None);
    }

    #[test]
    fn edit_form_copies_drug() {
        let drug: Drug = serde_json::from_value(serde_json::json!({
            "id": "ibuprofen", "name": "Ibuprofen", "category": "Analgesics",
            "description": "Pain", "active_ingredients": ["Ibuprofen"],
            "dosage_forms": ["Tablet", "Gel"], "side_effects": ["Heartburn"],
            "contraindications": [], "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        }))
        .unwrap();
        let mut form = DrugForm::for_edit(&drug);
        assert_eq!(form.dosage_forms.len(), 2);
        let draft = form.validate().unwrap();
        assert_eq!(draft.side_effects, vec!["Heartburn".to_string()]);
        assert_eq!(draft.category, "Analgesics");
    }
}
