//! Plain-text rendering of drugs, toasts and form state.

use std::fmt::Write;

use drugdb_core::{Category, Drug, DrugForm, FallbackView, Toast, ToastVariant, ValidationError};

pub fn toast(toast: &Toast) -> String {
    let marker = match toast.variant {
        ToastVariant::Default => "*",
        ToastVariant::Destructive => "!",
    };
    format!("{marker} {}: {}\n", toast.title, toast.description)
}

pub fn drug_table(drugs: &[Drug]) -> String {
    if drugs.is_empty() {
        return "No drugs found.\n".to_string();
    }
    let id_width = drugs.iter().map(|d| d.id.len()).max().unwrap_or(0).max(2);
    let name_width = drugs.iter().map(|d| d.name.len()).max().unwrap_or(0).max(4);

    let mut out = format!("{:id_width$}  {:name_width$}  CATEGORY\n", "ID", "NAME");
    for drug in drugs {
        let _ = writeln!(out, "{:id_width$}  {:name_width$}  {}", drug.id, drug.name, drug.category);
    }
    out
}

pub fn drug_detail(drug: &Drug) -> String {
    let mut out = format!("{} ({})\n", drug.name, drug.id);
    let _ = writeln!(out, "Category: {}", drug.category);
    let _ = writeln!(out, "{}", drug.description);
    for (label, items) in [
        ("Active ingredients", &drug.active_ingredients),
        ("Dosage forms", &drug.dosage_forms),
        ("Side effects", &drug.side_effects),
        ("Contraindications", &drug.contraindications),
    ] {
        if !items.is_empty() {
            let _ = writeln!(out, "{label}: {}", items.join(", "));
        }
    }
    let _ = writeln!(
        out,
        "Updated: {}",
        drug.updated_at.format("%Y-%m-%d %H:%M UTC")
    );
    out
}

pub fn categories(categories: &[Category]) -> String {
    if categories.is_empty() {
        return "No categories found.\n".to_string();
    }
    categories.iter().fold(String::new(), |mut out, c| {
        let _ = writeln!(out, "{}  {}", c.id, c.name);
        out
    })
}

pub fn validation_errors(errors: &[ValidationError]) -> String {
    errors.iter().fold(String::new(), |mut out, e| {
        let _ = writeln!(out, "  {}: {e}", e.field());
        out
    })
}

/// Errors currently attached to the form, one per field.
pub fn form_errors(form: &DrugForm) -> String {
    form.errors().iter().fold(String::new(), |mut out, (field, message)| {
        let _ = writeln!(out, "  {field}: {message}");
        out
    })
}

pub fn fallback(view: &FallbackView, show_detail: bool) -> String {
    let mut out = format!("{}\n{}\n", view.title, view.description);
    if show_detail && !view.detail.is_empty() {
        let _ = writeln!(out, "  {}", view.detail);
    }
    let _ = writeln!(out, "[{}]", view.action_label);
    out
}
