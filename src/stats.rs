//! Lectura de metadatos: colecciones, índices y `dbStats`.

use std::fmt;

use anyhow::{Context, Result};
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Bson, Document},
    Database, IndexModel,
};

/// Índice leído del servidor, con sus propiedades relevantes.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexInfo {
    pub name: String,
    pub unique: bool,
    pub partial: bool,
    pub ttl_secs: Option<u64>,
}

impl From<&IndexModel> for IndexInfo {
    fn from(model: &IndexModel) -> Self {
        let options = model.options.as_ref();
        Self {
            name: options
                .and_then(|o| o.name.clone())
                .unwrap_or_else(|| model.keys.to_string()),
            unique: options.and_then(|o| o.unique).unwrap_or(false),
            partial: options.is_some_and(|o| o.partial_filter_expression.is_some()),
            ttl_secs: options.and_then(|o| o.expire_after).map(|d| d.as_secs()),
        }
    }
}

impl fmt::Display for IndexInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        let mut tags = Vec::new();
        if self.unique {
            tags.push("único".to_string());
        }
        if self.partial {
            tags.push("parcial".to_string());
        }
        if let Some(secs) = self.ttl_secs {
            tags.push(format!("TTL {secs}s"));
        }
        if !tags.is_empty() {
            write!(f, " ({})", tags.join(", "))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CollectionStats {
    pub name: String,
    pub indexes: Vec<IndexInfo>,
}

/// Estadísticas de la base de datos tras la inicialización.
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseStats {
    pub collections: Vec<CollectionStats>,
    pub data_size_bytes: f64,
    pub index_size_bytes: f64,
    pub collection_count: i64,
    pub object_count: i64,
}

impl DatabaseStats {
    pub fn index_count(&self, collection: &str) -> usize {
        self.collections
            .iter()
            .find(|c| c.name == collection)
            .map_or(0, |c| c.indexes.len())
    }

    /// Completa los tamaños y contadores a partir de la respuesta de `dbStats`.
    fn with_db_stats(collections: Vec<CollectionStats>, raw: &Document) -> Self {
        Self {
            collections,
            data_size_bytes: number_field(raw, "dataSize"),
            index_size_bytes: number_field(raw, "indexSize"),
            collection_count: number_field(raw, "collections") as i64,
            object_count: number_field(raw, "objects") as i64,
        }
    }
}

impl fmt::Display for DatabaseStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Colecciones creadas:")?;
        for coll in &self.collections {
            writeln!(f, "  - {}", coll.name)?;
        }
        writeln!(f)?;
        writeln!(f, "Índices por colección:")?;
        for coll in &self.collections {
            writeln!(f, "  {}: {} índices", coll.name, coll.indexes.len())?;
            for index in &coll.indexes {
                writeln!(f, "    · {index}")?;
            }
        }
        writeln!(f)?;
        writeln!(f, "Estadísticas de la base de datos:")?;
        writeln!(f, "  - Tamaño de datos: {:.2} KB", self.data_size_bytes / 1024.0)?;
        writeln!(f, "  - Tamaño de índices: {:.2} KB", self.index_size_bytes / 1024.0)?;
        writeln!(f, "  - Colecciones: {}", self.collection_count)?;
        write!(f, "  - Documentos totales: {}", self.object_count)
    }
}

/// Lee colecciones, índices y `dbStats` de la base de datos.
pub async fn collect(db: &Database) -> Result<DatabaseStats> {
    let mut names = db
        .list_collection_names()
        .await
        .context("No se pudieron listar las colecciones")?;
    names.sort();

    let mut collections = Vec::with_capacity(names.len());
    for name in names {
        let models: Vec<IndexModel> = db
            .collection::<Document>(&name)
            .list_indexes()
            .await
            .with_context(|| format!("No se pudieron listar los índices de '{name}'"))?
            .try_collect()
            .await?;
        collections.push(CollectionStats {
            indexes: models.iter().map(IndexInfo::from).collect(),
            name,
        });
    }

    let raw = db
        .run_command(doc! { "dbStats": 1 })
        .await
        .context("Falló dbStats")?;

    Ok(DatabaseStats::with_db_stats(collections, &raw))
}

/// `dbStats` devuelve enteros o dobles según el tamaño y la versión del servidor.
fn number_field(doc: &Document, key: &str) -> f64 {
    match doc.get(key) {
        Some(Bson::Int32(v)) => f64::from(*v),
        Some(Bson::Int64(v)) => *v as f64,
        Some(Bson::Double(v)) => *v,
        _ => 0.0,
    }
}
