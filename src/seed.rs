//! Datos de prueba opcionales (`--seed`).

use anyhow::{Context, Result};
use chrono::{TimeZone, Utc};
use mongodb::{bson::doc, bson::DateTime, Database};
use tracing::info;

use crate::models::ReviewDocument;
use crate::schema::REVIEWS;

/// Opiniones de ejemplo; el enriquecimiento queda pendiente.
pub fn sample_reviews() -> Vec<ReviewDocument> {
    let review_date = Utc
        .with_ymd_and_hms(2025, 1, 15, 0, 0, 0)
        .single()
        .map(|d| DateTime::from_millis(d.timestamp_millis()))
        .unwrap_or_else(DateTime::now);

    let mut review = ReviewDocument::new(
        999,
        "Este es un comentario de prueba para validar la estructura de la base de datos.",
        review_date,
    );
    review.professor_name = Some("Profesor de Prueba".to_string());
    review.professor_slug = Some("profesor-de-prueba".to_string());
    review.course = Some("Curso de Prueba".to_string());
    review.scraper_version = Some("1.0.0".to_string());
    vec![review]
}

/// Inserta las opiniones de ejemplo que falten. Devuelve cuántas se insertaron.
pub async fn seed_reviews(db: &Database) -> Result<usize> {
    let collection = db.collection::<ReviewDocument>(REVIEWS);
    let mut inserted = 0;

    for review in sample_reviews() {
        let existing = collection
            .find_one(doc! {
                "professor_id": review.professor_id,
                "comment_text": review.comment_text.as_str(),
            })
            .await
            .context("No se pudo comprobar el documento de prueba")?;
        if existing.is_some() {
            continue;
        }
        collection
            .insert_one(&review)
            .await
            .context("No se pudo insertar el documento de prueba")?;
        inserted += 1;
    }

    info!("✓ {inserted} documento(s) de prueba insertado(s)");
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_review_is_complete_and_pending() {
        let reviews = sample_reviews();
        assert_eq!(reviews.len(), 1);
        let review = &reviews[0];
        assert_eq!(review.professor_id, 999);
        assert_eq!(review.review_id, None);
        assert_eq!(review.professor_slug.as_deref(), Some("profesor-de-prueba"));
        assert_eq!(review.review_date.timestamp_millis(), 1_736_899_200_000);
        assert!(review.is_pending_sentiment());
        assert!(review.is_pending_categorization());
        assert!(review.char_length.unwrap() > 0);
    }
}
