#![allow(dead_code)]
//! Utilidades compartidas para las pruebas contra un MongoDB real.
//!
//! Las pruebas necesitan `MONGO_TEST_URI`; cada una usa
//! una base de datos propia que se elimina al terminar.

use std::env;
use std::sync::Once;
use std::time::Duration;

use mongodb::{bson::doc, Database};
use sentiment_uam_schema::config::AppConfig;
use sentiment_uam_schema::mongo_client;
use uuid::Uuid;

static INIT: Once = Once::new();

pub fn setup_tracing() {
    INIT.call_once(|| {
        dotenvy::dotenv().ok();
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

/// Base de datos aislada para una prueba.
pub struct TestDb {
    pub db: Database,
    pub cfg: AppConfig,
}

impl TestDb {
    /// `None` si no hay servidor configurado.
    pub async fn new() -> Option<Self> {
        setup_tracing();
        let Ok(uri) = env::var("MONGO_TEST_URI") else {
            tracing::warn!("⚠ MONGO_TEST_URI no definida; la prueba no comprueba nada");
            return None;
        };

        let suffix = Uuid::new_v4().simple().to_string();
        let mut cfg = AppConfig::from_lookup(|_| None).expect("configuración por defecto");
        cfg.mongo_uri = uri;
        cfg.database = format!("test_schema_{}", &suffix[..12]);
        cfg.app_user = format!("test_user_{}", &suffix[..8]);
        cfg.app_password = "test_password".to_string();
        cfg.server_selection_timeout = Duration::from_secs(5);

        let db = mongo_client::connect_from_config(&cfg)
            .await
            .expect("conexión a MONGO_TEST_URI");
        Some(Self { db, cfg })
    }

    pub async fn cleanup(self) {
        let _ = self.db.run_command(doc! { "dropAllUsersFromDatabase": 1 }).await;
        let _ = self.db.drop().await;
    }
}
