//! Interfaz de línea de comandos.

use clap::Parser;

use crate::config::AppConfig;

/// Inicializa la base de datos MongoDB de SentimentInsightUAM.
#[derive(Debug, Parser)]
#[command(name = "sentiment-uam-schema", version, about)]
pub struct Cli {
    /// Base de datos destino (por defecto: MONGO_DB o sentiment_uam_nlp)
    pub database: Option<String>,

    /// Cadena de conexión con permisos de administración
    #[arg(long, env = "MONGO_URI")]
    pub uri: Option<String>,

    /// Inserta los documentos de prueba
    #[arg(long)]
    pub seed: bool,
}

impl Cli {
    /// Aplica los argumentos sobre la configuración cargada del entorno.
    pub fn apply(self, mut cfg: AppConfig) -> AppConfig {
        if let Some(database) = self.database.filter(|d| !d.trim().is_empty()) {
            cfg.database = database;
        }
        if let Some(uri) = self.uri.filter(|u| !u.trim().is_empty()) {
            cfg.mongo_uri = uri;
        }
        cfg.seed = self.seed;
        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> AppConfig {
        AppConfig::from_lookup(|_| None).unwrap()
    }

    #[test]
    fn positional_database_overrides_environment() {
        let cli = Cli::try_parse_from(["sentiment-uam-schema", "pruebas_db"]).unwrap();
        let cfg = cli.apply(base());
        assert_eq!(cfg.database, "pruebas_db");
        assert!(!cfg.seed);
    }

    #[test]
    fn no_arguments_keeps_configuration() {
        let cli = Cli::try_parse_from(["sentiment-uam-schema"]).unwrap();
        let cfg = cli.apply(base());
        assert_eq!(cfg.database, "sentiment_uam_nlp");
    }

    #[test]
    fn seed_and_uri_flags() {
        let cli = Cli::try_parse_from([
            "sentiment-uam-schema",
            "--seed",
            "--uri",
            "mongodb://otro:27017",
        ])
        .unwrap();
        let cfg = cli.apply(base());
        assert!(cfg.seed);
        assert_eq!(cfg.mongo_uri, "mongodb://otro:27017");
    }
}
