use std::env;

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_GROQ_BASE_URL: &str = "https://api.groq.com";
pub const GROQ_API_KEY_VAR: &str = "GROQ_API_KEY";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub groq: GroqConfig,
    pub upstreams: Upstreams,
}

/// Provider settings. The API key is looked up on every call unless
/// `api_key` pins one.
#[derive(Debug, Clone)]
pub struct GroqConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub api_key_var: String,
}

impl GroqConfig {
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| env::var(&self.api_key_var).ok())
            .filter(|key| !key.is_empty())
    }
}

impl Default for GroqConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GROQ_BASE_URL.to_string(),
            api_key: None,
            api_key_var: GROQ_API_KEY_VAR.to_string(),
        }
    }
}

/// Base URLs of the externally served sub-applications.
#[derive(Debug, Clone, Default)]
pub struct Upstreams {
    pub admin: Option<String>,
    pub auth: Option<String>,
    pub insect: Option<String>,
    pub plant: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let port = non_empty("PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        let base_url = non_empty("GROQ_BASE_URL")
            .map(|value| value.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_GROQ_BASE_URL.to_string());

        Self {
            port,
            groq: GroqConfig {
                base_url,
                ..GroqConfig::default()
            },
            upstreams: Upstreams {
                admin: non_empty("ADMIN_UPSTREAM"),
                auth: non_empty("AUTH_UPSTREAM"),
                insect: non_empty("INSECT_UPSTREAM"),
                plant: non_empty("PLANT_UPSTREAM"),
            },
        }
    }
}
