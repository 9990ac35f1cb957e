//! Definición declarativa del esquema: colecciones, validadores e índices.
//!
//! Índices de `opiniones`:
//! - `{ professor_id: 1, review_date: -1 }` - historial paginado por profesor
//! - `{ sentiment.analyzed: 1 }` parcial (`false`) - cola de trabajo del Módulo 1
//! - `{ categorization.analyzed: 1 }` parcial (`false`) - cola del Módulo 2
//! - `{ sentiment.classification: 1 }`
//! - `{ categorization.*.valuation: 1 }` - las tres valoraciones
//! - texto completo sobre `comment_text` (peso 10) y `course` (peso 5)
//! - `{ course: 1 }`, `{ review_date: -1 }`, `{ professor_slug: 1 }`
//! - `{ review_id: 1 }` único para valores numéricos
//!
//! Índices de `sentimiento_cache`: `text_hash` único y TTL de 90 días sobre `last_used`.

use std::time::Duration;

use mongodb::{
    bson::{doc, Bson, Document},
    options::{IndexOptions, ValidationAction, ValidationLevel},
    IndexModel,
};

pub const SCHEMA_VERSION: &str = "1.1.0";

pub const REVIEWS: &str = "opiniones";
pub const SENTIMENT_CACHE: &str = "sentimiento_cache";

pub const EMBEDDING_DIMENSIONS: i32 = 768;
pub const CACHE_TTL: Duration = Duration::from_secs(7_776_000);

pub const REVIEW_REQUIRED_FIELDS: [&str; 4] =
    ["professor_id", "comment_text", "review_date", "extraction_date"];

/// Una colección con su validador y sus índices. Aplicarla dos veces no cambia nada.
#[derive(Debug, Clone)]
pub struct CollectionDef {
    pub name: &'static str,
    pub validator: Option<Document>,
    pub validation_level: Option<ValidationLevel>,
    pub validation_action: Option<ValidationAction>,
    pub indexes: Vec<IndexModel>,
}

/// Colecciones en el orden en que se aplican.
pub fn collections() -> Vec<CollectionDef> {
    vec![reviews_collection(), cache_collection()]
}

pub fn reviews_collection() -> CollectionDef {
    CollectionDef {
        name: REVIEWS,
        validator: Some(review_validator()),
        validation_level: Some(ValidationLevel::Moderate),
        validation_action: Some(ValidationAction::Warn),
        indexes: review_indexes(),
    }
}

pub fn cache_collection() -> CollectionDef {
    CollectionDef {
        name: SENTIMENT_CACHE,
        validator: Some(cache_validator()),
        validation_level: None,
        validation_action: None,
        indexes: cache_indexes(),
    }
}

fn probability() -> Document {
    doc! { "bsonType": ["double", "null"], "minimum": 0, "maximum": 1 }
}

fn non_negative_int() -> Document {
    doc! { "bsonType": ["int", "null"], "minimum": 0 }
}

fn category_judgment(description: &str) -> Document {
    doc! {
        "bsonType": ["object", "null"],
        "description": description,
        "properties": {
            "valuation": { "enum": ["POS", "NEG", "NEUTRO", Bson::Null] },
            "confidence": probability(),
            "keywords": { "bsonType": "array", "items": { "bsonType": "string" } },
        },
    }
}

fn enrichment_metadata(block: &mut Document) {
    block.insert("model_version", doc! { "bsonType": ["string", "null"] });
    block.insert("analyzed_at", doc! { "bsonType": ["date", "null"] });
    block.insert("processing_time_ms", non_negative_int());
}

/// `$jsonSchema` de `opiniones`.
pub fn review_validator() -> Document {
    let mut sentiment = doc! {
        "analyzed": { "bsonType": "bool", "description": "procesado por el Módulo 1" },
        "classification": { "enum": ["positive", "neutral", "negative", Bson::Null] },
        "weights": {
            "bsonType": ["object", "null"],
            "properties": {
                "positive": probability(),
                "negative": probability(),
                "neutral": probability(),
            },
        },
        "confidence": probability(),
    };
    enrichment_metadata(&mut sentiment);

    let mut categorization = doc! {
        "analyzed": { "bsonType": "bool", "description": "procesado por el Módulo 2" },
        "didactic_quality": category_judgment("calidad didáctica"),
        "evaluation_method": category_judgment("método de evaluación"),
        "empathy": category_judgment("empatía"),
    };
    enrichment_metadata(&mut categorization);

    let required: Vec<Bson> = REVIEW_REQUIRED_FIELDS.iter().map(|f| Bson::from(*f)).collect();

    doc! {
        "$jsonSchema": {
            "bsonType": "object",
            "required": required,
            "properties": {
                "professor_id": { "bsonType": "int", "description": "id del profesor en PostgreSQL" },
                "professor_name": { "bsonType": "string" },
                "professor_slug": { "bsonType": "string" },
                "review_id": { "bsonType": ["int", "null"], "description": "id de la reseña en PostgreSQL" },
                "review_date": { "bsonType": "date" },
                "course": { "bsonType": ["string", "null"] },
                "comment_text": { "bsonType": "string", "minLength": 1 },
                "language": { "enum": ["es", "en"] },
                "char_length": non_negative_int(),
                "word_length": non_negative_int(),
                "sentiment": { "bsonType": "object", "properties": sentiment },
                "categorization": { "bsonType": "object", "properties": categorization },
                "embedding": {
                    "bsonType": ["array", "null"],
                    "minItems": EMBEDDING_DIMENSIONS,
                    "maxItems": EMBEDDING_DIMENSIONS,
                    "items": { "bsonType": "double" },
                },
                "extraction_date": { "bsonType": "date" },
                "source": { "bsonType": "string" },
                "scraper_version": { "bsonType": "string" },
            },
        }
    }
}

/// `$jsonSchema` de `sentimiento_cache`.
pub fn cache_validator() -> Document {
    doc! {
        "$jsonSchema": {
            "bsonType": "object",
            "required": ["text_hash", "result"],
            "properties": {
                "text_hash": { "bsonType": "string", "description": "SHA-256 del texto" },
                "result": { "bsonType": "object" },
                "hits": { "bsonType": "int", "minimum": 0 },
                "created_at": { "bsonType": "date" },
                "last_used": { "bsonType": "date" },
            },
        }
    }
}

fn named(name: &str) -> IndexOptions {
    IndexOptions::builder().name(name.to_string()).build()
}

fn index(keys: Document, options: IndexOptions) -> IndexModel {
    IndexModel::builder().keys(keys).options(options).build()
}

pub fn review_indexes() -> Vec<IndexModel> {
    vec![
        index(
            doc! { "professor_id": 1, "review_date": -1 },
            named("idx_profesor_fecha"),
        ),
        index(
            doc! { "sentiment.analyzed": 1 },
            IndexOptions::builder()
                .name("idx_sentimiento_analizado".to_string())
                .partial_filter_expression(doc! { "sentiment.analyzed": false })
                .build(),
        ),
        index(
            doc! { "categorization.analyzed": 1 },
            IndexOptions::builder()
                .name("idx_categorizacion_analizado".to_string())
                .partial_filter_expression(doc! { "categorization.analyzed": false })
                .build(),
        ),
        index(
            doc! { "sentiment.classification": 1 },
            named("idx_sentimiento_clasificacion"),
        ),
        index(
            doc! {
                "categorization.didactic_quality.valuation": 1,
                "categorization.evaluation_method.valuation": 1,
                "categorization.empathy.valuation": 1,
            },
            named("idx_categorizacion_valoraciones"),
        ),
        index(
            doc! { "comment_text": "text", "course": "text" },
            IndexOptions::builder()
                .name("idx_fulltext".to_string())
                .weights(doc! { "comment_text": 10, "course": 5 })
                .default_language("spanish".to_string())
                .language_override("language".to_string())
                .build(),
        ),
        index(doc! { "course": 1 }, named("idx_curso")),
        index(doc! { "review_date": -1 }, named("idx_fecha_opinion")),
        // Un índice `sparse` sí indexa los `null` explícitos; el filtro por tipo
        // deja fuera tanto los documentos sin campo como los `review_id: null`.
        index(
            doc! { "review_id": 1 },
            IndexOptions::builder()
                .name("idx_resenia_id_unique".to_string())
                .unique(true)
                .partial_filter_expression(doc! { "review_id": { "$type": "number" } })
                .build(),
        ),
        index(doc! { "professor_slug": 1 }, named("idx_profesor_slug")),
    ]
}

pub fn cache_indexes() -> Vec<IndexModel> {
    vec![
        index(
            doc! { "text_hash": 1 },
            IndexOptions::builder()
                .name("idx_text_hash_unique".to_string())
                .unique(true)
                .build(),
        ),
        index(
            doc! { "last_used": 1 },
            IndexOptions::builder()
                .name("idx_ttl_last_used".to_string())
                .expire_after(CACHE_TTL)
                .build(),
        ),
    ]
}

/// Nombre declarado de un índice.
pub fn index_name(model: &IndexModel) -> Option<&str> {
    model.options.as_ref().and_then(|o| o.name.as_deref())
}
