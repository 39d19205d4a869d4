use clap::Parser;
use std::path::PathBuf;

/// Command-line flags, each with an environment fallback.
#[derive(Debug, Parser)]
#[command(
    name = "valuequest-server",
    version,
    about = "ValueQuest learning backend (Axum + SQLite)"
)]
pub struct ServerArgs {
    /// Directory holding the SQLite database.
    #[arg(long, env = "VALUEQUEST_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0")]
    pub bind_addr: String,

    /// HS256 secret for ID tokens. Empty disables authentication.
    #[arg(long, env = "AUTH_TOKEN_SECRET", default_value = "", hide_env_values = true)]
    pub token_secret: String,

    /// Expected `aud` of ID tokens; also fixes the expected issuer.
    #[arg(long, env = "FIREBASE_PROJECT_ID")]
    pub project_id: Option<String>,

    /// Public URL, used for logging only.
    #[arg(long, env = "BASE_URL")]
    pub base_url: Option<String>,
}

impl ServerArgs {
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    pub fn app_config(&self) -> AppConfig {
        let base_url = self
            .base_url
            .clone()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| format!("http://localhost:{}", self.port));
        AppConfig {
            token_secret: self.token_secret.clone(),
            project_id: self.project_id.clone().filter(|s| !s.is_empty()),
            base_url,
        }
    }
}

/// Server configuration shared with handlers.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub token_secret: String,
    pub project_id: Option<String>,
    pub base_url: String,
}

impl AppConfig {
    pub fn auth_enabled(&self) -> bool {
        !self.token_secret.is_empty()
    }
}
