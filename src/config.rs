use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub accounts_file: PathBuf,
    pub host: String,
    pub port: u16,
    pub environment: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let accounts_file = std::env::var("ACCOUNTS_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("accounts.json"));
        let host = std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port = std::env::var("PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(3000);
        let environment = std::env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        Self {
            accounts_file,
            host,
            port,
            environment,
        }
    }
}
