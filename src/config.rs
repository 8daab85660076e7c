// src/config.rs

use std::env;
use std::path::PathBuf;
use dotenvy::dotenv;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub static_dir: PathBuf,
    pub questions_path: PathBuf,
    pub topics_path: PathBuf,
    pub rust_log: String,
    pub port: u16,
    /// Delay the client should wait before following a deep-link redirect.
    pub redirect_delay_ms: u64,
    /// Idle quiz sessions older than this are evicted.
    pub session_ttl_secs: i64,
    pub allowed_origins: Vec<String>,
}

impl Config {
    /// Reads the environment. Invalid numeric values fall back to their
    /// defaults and are returned as warnings, to be logged once tracing is up.
    pub fn from_env() -> (Self, Vec<String>) {
        dotenv().ok();
        let mut warnings = Vec::new();

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://quiz.db?mode=rwc".to_string());

        let static_dir = PathBuf::from(env::var("STATIC_DIR").unwrap_or_else(|_| "static".to_string()));

        let questions_path = env::var("QUESTIONS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| static_dir.join("questions.json"));

        let topics_path = env::var("TOPICS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| static_dir.join("learningTopics.json"));

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_else(|_| {
                vec![
                    "http://localhost:3000".to_string(),
                    "http://127.0.0.1:3000".to_string(),
                ]
            });

        let config = Self {
            database_url,
            static_dir,
            questions_path,
            topics_path,
            rust_log,
            port: parse_var("PORT", 3000, &mut warnings),
            redirect_delay_ms: parse_var("REDIRECT_DELAY_MS", 2000, &mut warnings),
            session_ttl_secs: parse_var("SESSION_TTL_SECS", 86_400, &mut warnings),
            allowed_origins,
        };

        (config, warnings)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T, warnings: &mut Vec<String>) -> T {
    parse_value(name, env::var(name).ok().as_deref(), default, warnings)
}

fn parse_value<T: std::str::FromStr>(
    name: &str,
    raw: Option<&str>,
    default: T,
    warnings: &mut Vec<String>,
) -> T {
    match raw {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warnings.push(format!("Ignoring invalid {}={:?}, using default", name, raw));
            default
        }),
        None => default,
    }
}
