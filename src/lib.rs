//! Inicialización de MongoDB para SentimentInsightUAM: validadores, índices,
//! caché con expiración y usuario de aplicación.

pub mod cli;
pub mod config;
pub mod migrate;
pub mod models;
pub mod mongo_client;
pub mod schema;
pub mod seed;
pub mod setup;
pub mod stats;
pub mod users;
