//! Built-in sample catalogue shown when the backend cannot be reached and
//! `mock_data_fallback` is enabled.

use chrono::{DateTime, TimeZone, Utc};

use crate::types::{Drug, DrugFilter};

pub const FALLBACK_NOTICE: &str = "Backend unavailable. Showing sample data.";

#[allow(clippy::too_many_arguments)]
fn sample(
    id: &str,
    name: &str,
    category: &str,
    description: &str,
    ingredients: &[&str],
    forms: &[&str],
    side_effects: &[&str],
    contraindications: &[&str],
) -> Drug {
    let seeded: DateTime<Utc> = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().unwrap_or_default();
    let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
    Drug {
        id: id.to_string(),
        name: name.to_string(),
        category: category.to_string(),
        description: description.to_string(),
        active_ingredients: owned(ingredients),
        dosage_forms: owned(forms),
        side_effects: owned(side_effects),
        contraindications: owned(contraindications),
        created_at: seeded,
        updated_at: seeded,
    }
}

/// The sample catalogue, ordered by name.
pub fn sample_drugs() -> Vec<Drug> {
    vec![
        sample(
            "amoxicillin",
            "Amoxicillin",
            "Antibiotics",
            "A penicillin antibiotic that fights bacteria",
            &["Amoxicillin Trihydrate"],
            &["Capsule", "Tablet", "Oral suspension"],
            &["Diarrhea", "Stomach upset", "Nausea", "Vomiting", "Rash"],
            &["Penicillin allergy", "Mononucleosis"],
        ),
        sample(
            "ibuprofen",
            "Ibuprofen",
            "Analgesics",
            "Reduces inflammation and treats pain or fever",
            &["Ibuprofen"],
            &["Tablet", "Capsule", "Oral suspension", "Topical gel"],
            &["Upset stomach", "Heartburn", "Dizziness", "Headache"],
            &["Aspirin allergy", "Heart failure", "Stomach ulcers"],
        ),
        sample(
            "lisinopril",
            "Lisinopril",
            "Cardiovascular",
            "ACE inhibitor that treats high blood pressure",
            &["Lisinopril"],
            &["Tablet"],
            &["Dizziness", "Headache", "Dry cough", "Fatigue"],
            &["Pregnancy", "History of angioedema", "Kidney disease"],
        ),
        sample(
            "metformin",
            "Metformin",
            "Antidiabetic",
            "Used to treat type 2 diabetes",
            &["Metformin Hydrochloride"],
            &["Tablet", "Extended-release tablet"],
            &["Nausea", "Diarrhea", "Stomach upset", "Metallic taste"],
            &["Kidney disease", "Liver disease", "Heart failure"],
        ),
    ]
}

/// Sample drugs matching the text filters and paging of `filter`.
///
/// Date bounds are ignored; every sample shares one timestamp.
pub fn sample_drugs_matching(filter: &DrugFilter) -> Vec<Drug> {
    let contains = |haystack: &str, needle: &Option<String>| match needle {
        Some(n) if !n.trim().is_empty() => haystack.to_lowercase().contains(&n.trim().to_lowercase()),
        _ => true,
    };
    let skip = filter.skip.unwrap_or(0) as usize;
    let limit = filter.limit.map_or(usize::MAX, |l| l as usize);
    sample_drugs()
        .into_iter()
        .filter(|d| contains(&d.name, &filter.name))
        .filter(|d| contains(&d.category, &filter.category))
        .filter(|d| d.active_ingredients.iter().any(|i| contains(i, &filter.ingredient)))
        .skip(skip)
        .take(limit)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogue_is_sorted_and_complete() {
        let drugs = sample_drugs();
        let names: Vec<_> = drugs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["Amoxicillin", "Ibuprofen", "Lisinopril", "Metformin"]);
        assert!(drugs.iter().all(|d| !d.active_ingredients.is_empty() && !d.dosage_forms.is_empty()));
    }

    #[test]
    fn filters_apply_case_insensitively() {
        assert_eq!(sample_drugs_matching(&DrugFilter::by_name("PROF")).len(), 1);

        let filter = DrugFilter {
            ingredient: Some("hydrochloride".into()),
            ..DrugFilter::default()
        };
        let matched = sample_drugs_matching(&filter);
        assert_eq!(matched[0].id, "metformin");
    }

    #[test]
    fn paging_skips_and_limits() {
        let page = sample_drugs_matching(&DrugFilter::default().page(2, 3));
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].name, "Metformin");
    }
}
