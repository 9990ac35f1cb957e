//! Usuario de aplicación: `readWrite` + `dbAdmin` sobre la base de datos destino.

use std::fmt;

use mongodb::{
    bson::{doc, Document},
    Database,
};
use tracing::{error, info, warn};

use crate::mongo_client::{server_error_code, USER_ALREADY_EXISTS};

pub const ROLES: [&str; 2] = ["readWrite", "dbAdmin"];
pub const MECHANISM: &str = "SCRAM-SHA-256";

/// Resultado de `ensure_app_user`. Ningún caso interrumpe la inicialización.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserOutcome {
    Created,
    AlreadyExists,
    Failed(String),
}

impl fmt::Display for UserOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "creado"),
            Self::AlreadyExists => write!(f, "ya existía"),
            Self::Failed(msg) => write!(f, "error ({msg})"),
        }
    }
}

/// Crea el usuario si no existe.
pub async fn ensure_app_user(db: &Database, user: &str, password: &str) -> UserOutcome {
    let database = db.name();

    match user_exists(db, user).await {
        Ok(true) => {
            warn!("⚠ Usuario \"{user}\" ya existe - omitiendo creación");
            return UserOutcome::AlreadyExists;
        }
        Ok(false) => {}
        // Sin permiso para `usersInfo` todavía puede intentarse la creación.
        Err(err) => warn!("No se pudo consultar usersInfo: {err}"),
    }

    let outcome = match db.run_command(create_user_command(user, password, database)).await {
        Ok(_) => UserOutcome::Created,
        Err(err) => classify_create_error(server_error_code(&err), &err.to_string()),
    };

    match &outcome {
        UserOutcome::Created => {
            info!("✓ Usuario \"{user}\" creado exitosamente");
            info!("  - Base de datos: {database}");
            info!("  - Roles: {}", ROLES.join(", "));
            info!("  - Autenticación: {}", MECHANISM);
        }
        UserOutcome::AlreadyExists => warn!("⚠ Usuario \"{user}\" ya existe - omitiendo creación"),
        UserOutcome::Failed(msg) => error!("❌ Error al crear usuario: {msg}"),
    }
    outcome
}

async fn user_exists(db: &Database, user: &str) -> mongodb::error::Result<bool> {
    let reply = db
        .run_command(doc! { "usersInfo": { "user": user, "db": db.name() } })
        .await?;
    Ok(reply.get_array("users").is_ok_and(|users| !users.is_empty()))
}

fn create_user_command(user: &str, password: &str, database: &str) -> Document {
    let roles: Vec<Document> = ROLES
        .iter()
        .map(|role| doc! { "role": *role, "db": database })
        .collect();
    doc! {
        "createUser": user,
        "pwd": password,
        "roles": roles,
        "mechanisms": [MECHANISM],
    }
}

fn classify_create_error(code: Option<i32>, message: &str) -> UserOutcome {
    match code {
        Some(USER_ALREADY_EXISTS) => UserOutcome::AlreadyExists,
        _ => UserOutcome::Failed(message.to_string()),
    }
}
