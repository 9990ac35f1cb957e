//! Inicialización completa, de principio a fin:
//!   1. Colección `opiniones` con validación y sus índices.
//!   2. Colección `sentimiento_cache` con índice TTL.
//!   3. Datos de prueba (opcional).
//!   4. Validación y estadísticas.
//!   5. Usuario de aplicación.

use std::fmt;

use anyhow::Result;
use chrono::Utc;
use mongodb::Database;
use tracing::info;

use crate::{
    config::AppConfig,
    migrate::{self, MigrationReport},
    schema::{self, REVIEWS},
    seed,
    stats::{self, DatabaseStats},
    users::{self, UserOutcome},
};

/// Resumen de una ejecución.
#[derive(Debug, Clone)]
pub struct SetupReport {
    pub database: String,
    pub migrations: Vec<MigrationReport>,
    pub seeded: Option<usize>,
    pub stats: DatabaseStats,
    pub app_user: String,
    pub user: UserOutcome,
}

impl fmt::Display for SetupReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Base de datos: {}", self.database)?;
        writeln!(f, "Versión: {}", schema::SCHEMA_VERSION)?;
        writeln!(f, "Fecha: {}", Utc::now().to_rfc2822())?;
        writeln!(f)?;
        writeln!(f, "Resumen:")?;
        writeln!(f, "  - Colecciones: {}", self.stats.collections.len())?;
        writeln!(
            f,
            "  - Índices en \"{}\": {}",
            REVIEWS,
            self.stats.index_count(REVIEWS)
        )?;
        writeln!(f, "  - Validación de esquema: Activa (modo: moderate)")?;
        if let Some(seeded) = self.seeded {
            writeln!(f, "  - Documentos de prueba insertados: {seeded}")?;
        }
        write!(f, "  - Usuario de aplicación: {} ({})", self.app_user, self.user)
    }
}

/// Ejecuta la inicialización sobre `db`. Sólo el paso del usuario está protegido:
/// cualquier otro error se propaga.
pub async fn run(db: &Database, cfg: &AppConfig) -> Result<SetupReport> {
    let mut migrations = Vec::new();
    for (step, def) in schema::collections().iter().enumerate() {
        info!("{}. Aplicando colección \"{}\"...", step + 1, def.name);
        let report = migrate::apply(db, def).await?;
        info!(
            "Total de índices en \"{}\": {}",
            report.collection, report.total_indexes
        );
        migrations.push(report);
    }

    let seeded = if cfg.seed {
        info!("3. Insertando datos de prueba...");
        Some(seed::seed_reviews(db).await?)
    } else {
        info!("3. Datos de prueba omitidos (se poblarán con el scraper)");
        None
    };

    info!("4. Validando estructura de la base de datos...");
    let stats = stats::collect(db).await?;
    info!(
        "✓ {} colecciones, {} documentos",
        stats.collection_count, stats.object_count
    );

    info!("5. Configurando usuario de aplicación en MongoDB...");
    let user = users::ensure_app_user(db, &cfg.app_user, &cfg.app_password).await;

    Ok(SetupReport {
        database: db.name().to_string(),
        migrations,
        seeded,
        stats,
        app_user: cfg.app_user.clone(),
        user,
    })
}
