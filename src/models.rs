//! Modelos de dominio: documentos de `opiniones` y de `sentimiento_cache`.
//!
//! Los bloques de enriquecimiento nacen vacíos (`analyzed: false`, resto a
//! `null`) y los rellenan una única vez los procesos externos de análisis.

use mongodb::bson::{DateTime, Document};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub const DEFAULT_SOURCE: &str = "misprofesores.com";
pub const DEFAULT_SCRAPER_VERSION: &str = "1.2.0";

/// Idioma del comentario. También es el `language_override` del índice de texto.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Es,
    En,
}

/// Clasificación del sentimiento general (Módulo 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentClass {
    Positive,
    Neutral,
    Negative,
}

/// Valoración de una categoría (Módulo 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Valuation {
    Pos,
    Neg,
    Neutro,
}

/// Pesos del modelo para cada clase; cada uno en [0, 1].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SentimentWeights {
    pub positive: Option<f64>,
    pub negative: Option<f64>,
    pub neutral: Option<f64>,
}

/// Bloque de enriquecimiento A: sentimiento general.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SentimentAnalysis {
    pub analyzed: bool,
    pub classification: Option<SentimentClass>,
    pub weights: Option<SentimentWeights>,
    pub confidence: Option<f64>,
    pub model_version: Option<String>,
    pub analyzed_at: Option<DateTime>,
    pub processing_time_ms: Option<i32>,
}

/// Juicio sobre una categoría concreta (calidad didáctica, evaluación, empatía).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryJudgment {
    pub valuation: Option<Valuation>,
    pub confidence: Option<f64>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// Bloque de enriquecimiento B: categorización.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Categorization {
    pub analyzed: bool,
    pub didactic_quality: Option<CategoryJudgment>,
    pub evaluation_method: Option<CategoryJudgment>,
    pub empathy: Option<CategoryJudgment>,
    pub model_version: Option<String>,
    pub analyzed_at: Option<DateTime>,
    pub processing_time_ms: Option<i32>,
}

/// Documento de la colección `opiniones`.
///
/// Los campos opcionales no anulables se omiten en vez de guardarse como `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewDocument {
    pub professor_id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub professor_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub professor_slug: Option<String>,
    pub review_id: Option<i32>,
    pub review_date: DateTime,
    pub course: Option<String>,
    pub comment_text: String,
    #[serde(default)]
    pub language: Language,
    pub char_length: Option<i32>,
    pub word_length: Option<i32>,
    #[serde(default)]
    pub sentiment: SentimentAnalysis,
    #[serde(default)]
    pub categorization: Categorization,
    pub embedding: Option<Vec<f64>>,
    pub extraction_date: DateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scraper_version: Option<String>,
}

impl ReviewDocument {
    /// Opinión recién extraída: contadores calculados y enriquecimiento pendiente.
    pub fn new(professor_id: i32, comment_text: impl Into<String>, review_date: DateTime) -> Self {
        let comment_text = comment_text.into();
        let char_length = i32::try_from(comment_text.chars().count()).ok();
        let word_length = i32::try_from(comment_text.split_whitespace().count()).ok();

        Self {
            professor_id,
            professor_name: None,
            professor_slug: None,
            review_id: None,
            review_date,
            course: None,
            comment_text,
            language: Language::Es,
            char_length,
            word_length,
            sentiment: SentimentAnalysis::default(),
            categorization: Categorization::default(),
            embedding: None,
            extraction_date: DateTime::now(),
            source: Some(DEFAULT_SOURCE.to_string()),
            scraper_version: Some(DEFAULT_SCRAPER_VERSION.to_string()),
        }
    }

    pub fn is_pending_sentiment(&self) -> bool {
        !self.sentiment.analyzed
    }

    pub fn is_pending_categorization(&self) -> bool {
        !self.categorization.analyzed
    }
}

/// Documento de la colección `sentimiento_cache`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub text_hash: String,
    pub result: Document,
    pub hits: i32,
    pub created_at: DateTime,
    pub last_used: DateTime,
}

impl CacheEntry {
    pub fn new(text: &str, result: Document) -> Self {
        let now = DateTime::now();
        Self {
            text_hash: text_hash(text),
            result,
            hits: 0,
            created_at: now,
            last_used: now,
        }
    }
}

/// SHA-256 del texto en hexadecimal: la clave de la caché.
pub fn text_hash(text: &str) -> String {
    format!("{:x}", Sha256::digest(text.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::{doc, to_document, Bson};

    #[test]
    fn new_review_has_pending_enrichment_blocks() {
        let review = ReviewDocument::new(42, "Explica muy bien la materia", DateTime::now());
        let stored = to_document(&review).unwrap();

        assert_eq!(
            stored.get_document("sentiment").unwrap(),
            &doc! {
                "analyzed": false,
                "classification": Bson::Null,
                "weights": Bson::Null,
                "confidence": Bson::Null,
                "model_version": Bson::Null,
                "analyzed_at": Bson::Null,
                "processing_time_ms": Bson::Null,
            }
        );
        let categorization = stored.get_document("categorization").unwrap();
        assert_eq!(categorization.get_bool("analyzed").unwrap(), false);
        assert_eq!(categorization.get("empathy"), Some(&Bson::Null));
        assert!(review.is_pending_sentiment());
        assert!(review.is_pending_categorization());
    }

    #[test]
    fn new_review_counts_characters_and_words() {
        let review = ReviewDocument::new(1, "Muy buena   profesora, clases dinámicas", DateTime::now());
        assert_eq!(review.char_length, Some(39));
        assert_eq!(review.word_length, Some(5));
        assert_eq!(review.language, Language::Es);
        assert_eq!(review.source.as_deref(), Some("misprofesores.com"));
    }

    #[test]
    fn integer_fields_are_stored_as_int32() {
        let mut review = ReviewDocument::new(7, "ok", DateTime::now());
        review.review_id = Some(15);
        let stored = to_document(&review).unwrap();
        assert!(matches!(stored.get("professor_id"), Some(Bson::Int32(7))));
        assert!(matches!(stored.get("review_id"), Some(Bson::Int32(15))));
        assert!(matches!(stored.get("review_date"), Some(Bson::DateTime(_))));
        assert!(!stored.contains_key("professor_name"));
        assert_eq!(stored.get("course"), Some(&Bson::Null));
    }

    #[test]
    fn enums_use_stored_spelling() {
        let judgment = CategoryJudgment {
            valuation: Some(Valuation::Neutro),
            confidence: Some(0.8),
            keywords: vec!["explica bien".into()],
        };
        let stored = to_document(&judgment).unwrap();
        assert_eq!(stored.get_str("valuation").unwrap(), "NEUTRO");

        let analysis = SentimentAnalysis {
            analyzed: true,
            classification: Some(SentimentClass::Negative),
            ..Default::default()
        };
        let stored = to_document(&analysis).unwrap();
        assert_eq!(stored.get_str("classification").unwrap(), "negative");

        let mut review = ReviewDocument::new(1, "good teacher", DateTime::now());
        review.language = Language::En;
        assert_eq!(to_document(&review).unwrap().get_str("language").unwrap(), "en");
    }

    #[test]
    fn text_hash_is_sha256_hex() {
        assert_eq!(
            text_hash("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(text_hash("hola").len(), 64);
        assert_ne!(text_hash("hola"), text_hash("Hola"));
    }

    #[test]
    fn cache_entry_starts_unused() {
        let entry = CacheEntry::new("texto", doc! { "classification": "positive" });
        assert_eq!(entry.hits, 0);
        assert_eq!(entry.created_at, entry.last_used);
        assert_eq!(entry.text_hash, text_hash("texto"));
    }
}
