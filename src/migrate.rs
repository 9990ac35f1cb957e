//! Aplicación idempotente de las definiciones de `schema`.
//!
//! API pública:
//!   - `apply(&Database, &CollectionDef)`
//!   - `ensure_collection(&Database, &CollectionDef)`
//!   - `ensure_indexes(&Collection<Document>, &[IndexModel])`.

use anyhow::{Context, Result};
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, to_bson, Bson, Document},
    Collection, Database, IndexModel,
};
use tracing::{info, warn};

use crate::mongo_client::{
    server_error_code, INDEX_KEY_SPECS_CONFLICT, INDEX_OPTIONS_CONFLICT, NAMESPACE_EXISTS,
};
use crate::schema::{index_name, CollectionDef};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionOutcome {
    Created,
    Updated,
}

/// Resultado de aplicar una colección.
#[derive(Debug, Clone)]
pub struct MigrationReport {
    pub collection: String,
    pub outcome: CollectionOutcome,
    pub indexes_ensured: usize,
    pub indexes_rebuilt: Vec<String>,
    pub total_indexes: usize,
}

/// Crea (o actualiza) la colección y todos sus índices.
pub async fn apply(db: &Database, def: &CollectionDef) -> Result<MigrationReport> {
    let outcome = ensure_collection(db, def).await?;
    let collection = db.collection::<Document>(def.name);
    let indexes_rebuilt = ensure_indexes(&collection, &def.indexes).await?;
    let total_indexes = collection
        .list_index_names()
        .await
        .with_context(|| format!("No se pudieron listar los índices de '{}'", def.name))?
        .len();

    Ok(MigrationReport {
        collection: def.name.to_string(),
        outcome,
        indexes_ensured: def.indexes.len(),
        indexes_rebuilt,
        total_indexes,
    })
}

/// Garantiza que la colección exista con el validador declarado.
pub async fn ensure_collection(db: &Database, def: &CollectionDef) -> Result<CollectionOutcome> {
    if collection_exists(db, def.name).await? {
        info!("Colección '{}' ya existe.", def.name);
        update_validator(db, def).await?;
        return Ok(CollectionOutcome::Updated);
    }

    let mut create = db.create_collection(def.name);
    if let Some(validator) = &def.validator {
        create = create.validator(validator.clone());
    }
    if let Some(level) = def.validation_level.clone() {
        create = create.validation_level(level);
    }
    if let Some(action) = def.validation_action.clone() {
        create = create.validation_action(action);
    }

    match create.await {
        Ok(()) => {
            info!("✓ Colección '{}' creada con validación", def.name);
            Ok(CollectionOutcome::Created)
        }
        // Otro proceso la creó entre la comprobación y la creación.
        Err(err) if server_error_code(&err) == Some(NAMESPACE_EXISTS) => {
            update_validator(db, def).await?;
            Ok(CollectionOutcome::Updated)
        }
        Err(err) => {
            Err(err).with_context(|| format!("No se pudo crear la colección '{}'", def.name))
        }
    }
}

async fn collection_exists(db: &Database, name: &str) -> Result<bool> {
    let names = db
        .list_collection_names()
        .filter(doc! { "name": name })
        .await
        .context("No se pudieron listar las colecciones")?;
    Ok(names.iter().any(|n| n == name))
}

/// Vuelve a aplicar el validador sobre una colección existente (`collMod`).
async fn update_validator(db: &Database, def: &CollectionDef) -> Result<()> {
    let Some(command) = coll_mod_command(def)? else {
        return Ok(());
    };
    db.run_command(command)
        .await
        .with_context(|| format!("No se pudo actualizar el validador de '{}'", def.name))?;
    info!("✓ Validador de '{}' actualizado", def.name);
    Ok(())
}

fn coll_mod_command(def: &CollectionDef) -> Result<Option<Document>> {
    let Some(validator) = &def.validator else {
        return Ok(None);
    };
    let mut command = doc! { "collMod": def.name, "validator": validator.clone() };
    if let Some(level) = &def.validation_level {
        command.insert("validationLevel", to_bson(level)?);
    }
    if let Some(action) = &def.validation_action {
        command.insert("validationAction", to_bson(action)?);
    }
    Ok(Some(command))
}

/// Crea cada índice; si choca con uno existente (mismo nombre con otra
/// definición, misma clave con otro nombre, u otro índice de texto), elimina el
/// existente y vuelve a crear el declarado. Devuelve los nombres reconstruidos.
pub async fn ensure_indexes(
    collection: &Collection<Document>,
    models: &[IndexModel],
) -> Result<Vec<String>> {
    let mut rebuilt = Vec::new();

    for model in models {
        let name = index_name(model).unwrap_or("<sin nombre>").to_string();
        match collection.create_index(model.clone()).await {
            Ok(_) => info!("  ✓ Índice '{name}' asegurado en '{}'", collection.name()),
            Err(err)
                if matches!(
                    server_error_code(&err),
                    Some(INDEX_OPTIONS_CONFLICT) | Some(INDEX_KEY_SPECS_CONFLICT)
                ) =>
            {
                let existing: Vec<IndexModel> = collection
                    .list_indexes()
                    .await
                    .with_context(|| {
                        format!("No se pudieron listar los índices de '{}'", collection.name())
                    })?
                    .try_collect()
                    .await?;
                let Some(stale) = conflicting_index(&existing, model) else {
                    return Err(err).with_context(|| {
                        format!("No se pudo crear el índice '{name}' en '{}'", collection.name())
                    });
                };

                warn!("⚠ Índice '{stale}' choca con '{name}'; se reconstruye.");
                collection
                    .drop_index(&stale)
                    .await
                    .with_context(|| format!("No se pudo eliminar el índice '{stale}'"))?;
                collection
                    .create_index(model.clone())
                    .await
                    .with_context(|| format!("No se pudo recrear el índice '{name}'"))?;
                rebuilt.push(name);
            }
            Err(err) => {
                return Err(err).with_context(|| {
                    format!("No se pudo crear el índice '{name}' en '{}'", collection.name())
                });
            }
        }
    }

    Ok(rebuilt)
}

/// Índice existente que impide crear `model`. Primero por nombre; después por
/// patrón de claves. Una colección admite un único índice de texto y el
/// servidor lo guarda como `{_fts: "text", _ftsx: 1}`, así que dos índices de
/// texto siempre chocan. `_id_` nunca se considera.
fn conflicting_index(existing: &[IndexModel], model: &IndexModel) -> Option<String> {
    let wanted = index_name(model);
    let candidates = move || {
        existing
            .iter()
            .filter_map(|e| index_name(e).map(|n| (n, e)))
            .filter(|(n, _)| *n != "_id_")
    };

    candidates()
        .find(|(n, _)| Some(*n) == wanted)
        .or_else(|| {
            candidates().find(|(_, e)| {
                same_keys(&e.keys, &model.keys) || (is_text(&e.keys) && is_text(&model.keys))
            })
        })
        .map(|(n, _)| n.to_string())
}

fn is_text(keys: &Document) -> bool {
    keys.values().any(|v| v.as_str() == Some("text"))
}

/// El servidor puede devolver `1` como entero o doble.
fn same_keys(a: &Document, b: &Document) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b.iter())
            .all(|((ka, va), (kb, vb))| ka == kb && key_value(va) == key_value(vb))
}

fn key_value(value: &Bson) -> Bson {
    match value {
        Bson::Int32(v) => Bson::Double(f64::from(*v)),
        Bson::Int64(v) => Bson::Double(*v as f64),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{cache_collection, reviews_collection};

    #[test]
    fn coll_mod_carries_validation_mode() {
        let command = coll_mod_command(&reviews_collection()).unwrap().unwrap();
        assert_eq!(command.get_str("collMod").unwrap(), "opiniones");
        assert_eq!(command.get_str("validationLevel").unwrap(), "moderate");
        assert_eq!(command.get_str("validationAction").unwrap(), "warn");
        assert!(command.get_document("validator").unwrap().contains_key("$jsonSchema"));
    }

    #[test]
    fn coll_mod_keeps_server_defaults_for_cache() {
        let command = coll_mod_command(&cache_collection()).unwrap().unwrap();
        assert_eq!(command.get_str("collMod").unwrap(), "sentimiento_cache");
        assert!(!command.contains_key("validationLevel"));
        assert!(!command.contains_key("validationAction"));
    }

    fn server_index(keys: Document, name: &str) -> IndexModel {
        IndexModel::builder()
            .keys(keys)
            .options(
                mongodb::options::IndexOptions::builder()
                    .name(name.to_string())
                    .build(),
            )
            .build()
    }

    fn declared(name: &str) -> IndexModel {
        crate::schema::review_indexes()
            .into_iter()
            .find(|m| index_name(m) == Some(name))
            .unwrap()
    }

    #[test]
    fn conflict_by_name_wins() {
        let existing = vec![
            server_index(doc! { "_id": 1 }, "_id_"),
            server_index(doc! { "course": 1 }, "old_curso"),
            server_index(doc! { "course": -1 }, "idx_curso"),
        ];
        assert_eq!(
            conflicting_index(&existing, &declared("idx_curso")).as_deref(),
            Some("idx_curso")
        );
    }

    #[test]
    fn conflict_by_keys_under_another_name() {
        let existing = vec![
            server_index(doc! { "_id": 1 }, "_id_"),
            server_index(doc! { "course": 1.0 }, "old_curso"),
        ];
        assert_eq!(
            conflicting_index(&existing, &declared("idx_curso")).as_deref(),
            Some("old_curso")
        );
    }

    #[test]
    fn any_text_index_conflicts_with_ours() {
        let existing = vec![
            server_index(doc! { "_id": 1 }, "_id_"),
            server_index(doc! { "_fts": "text", "_ftsx": 1 }, "idx_fulltext_comentario_curso"),
        ];
        assert_eq!(
            conflicting_index(&existing, &declared("idx_fulltext")).as_deref(),
            Some("idx_fulltext_comentario_curso")
        );
        assert_eq!(conflicting_index(&existing, &declared("idx_curso")), None);
    }

    #[test]
    fn id_index_is_never_a_conflict() {
        let existing = vec![server_index(doc! { "_id": 1 }, "_id_")];
        let model = server_index(doc! { "_id": 1 }, "otro");
        assert_eq!(conflicting_index(&existing, &model), None);
    }

    #[test]
    fn no_validator_means_no_coll_mod() {
        let mut def = cache_collection();
        def.validator = None;
        assert!(coll_mod_command(&def).unwrap().is_none());
    }
}
