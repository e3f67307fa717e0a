use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub debug_mode: bool,
    pub allowed_origins: Vec<String>,
    pub openai: OpenAiSettings,
    pub search: SearchSettings,
    pub quiz: QuizSettings,
}

#[derive(Debug, Clone)]
pub struct OpenAiSettings {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub validator_model: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchBackend {
    /// Brave Search web results; needs `SEARCH_API_KEY`.
    Brave,
    /// DuckDuckGo Instant Answer API; keyless, topic lookups only.
    DuckDuckGo,
}

impl SearchBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchBackend::Brave => "brave",
            SearchBackend::DuckDuckGo => "duckduckgo",
        }
    }

    fn default_base_url(&self) -> &'static str {
        match self {
            SearchBackend::Brave => "https://api.search.brave.com/res/v1",
            SearchBackend::DuckDuckGo => "https://api.duckduckgo.com",
        }
    }
}

impl std::str::FromStr for SearchBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "brave" => Ok(SearchBackend::Brave),
            "duckduckgo" | "ddg" => Ok(SearchBackend::DuckDuckGo),
            other => Err(format!("unknown search provider '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchSettings {
    pub backend: SearchBackend,
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout: Duration,
    pub max_snippets: usize,
}

/// Bounds and knobs for quiz generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSettings {
    pub default_num_questions: usize,
    pub min_num_questions: usize,
    pub max_num_questions: usize,
    pub shuffle_options: bool,
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            default_num_questions: 3,
            min_num_questions: 1,
            max_num_questions: 10,
            shuffle_options: false,
        }
    }
}

impl QuizSettings {
    pub fn contains(&self, num_questions: usize) -> bool {
        (self.min_num_questions..=self.max_num_questions).contains(&num_questions)
    }

    fn check(&self) -> Result<()> {
        if self.min_num_questions == 0 {
            return Err(Error::Config(
                "MIN_NUM_QUESTIONS must be at least 1".to_string(),
            ));
        }
        if self.min_num_questions > self.max_num_questions {
            return Err(Error::Config(format!(
                "MIN_NUM_QUESTIONS ({}) exceeds MAX_NUM_QUESTIONS ({})",
                self.min_num_questions, self.max_num_questions
            )));
        }
        if !self.contains(self.default_num_questions) {
            return Err(Error::Config(format!(
                "DEFAULT_NUM_QUESTIONS ({}) must lie within [{}, {}]",
                self.default_num_questions, self.min_num_questions, self.max_num_questions
            )));
        }
        Ok(())
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source so tests
    /// never have to touch the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars { lookup };

        let model = vars.get_or("OPENAI_MODEL", "gpt-4o-mini");
        let openai = OpenAiSettings {
            api_key: vars.get("OPENAI_API_KEY")?,
            base_url: vars
                .get_or("OPENAI_BASE_URL", "https://api.openai.com/v1")
                .trim_end_matches('/')
                .to_string(),
            validator_model: vars.get_or("VALIDATOR_OPENAI_MODEL", &model),
            model,
            timeout: Duration::from_secs(vars.parse_or("OPENAI_TIMEOUT_SECS", 120)?),
        };

        let search_key = vars.get("SEARCH_API_KEY").ok();
        let backend = match vars.get("SEARCH_PROVIDER") {
            Ok(raw) => raw
                .parse::<SearchBackend>()
                .map_err(|e| Error::Config(format!("Invalid value for SEARCH_PROVIDER: {}", e)))?,
            Err(_) if search_key.is_some() => SearchBackend::Brave,
            Err(_) => SearchBackend::DuckDuckGo,
        };
        if backend == SearchBackend::Brave && search_key.is_none() {
            return Err(Error::Config(
                "SEARCH_API_KEY is required when SEARCH_PROVIDER is brave".to_string(),
            ));
        }
        let search = SearchSettings {
            backend,
            api_key: search_key,
            base_url: vars
                .get_or("SEARCH_BASE_URL", backend.default_base_url())
                .trim_end_matches('/')
                .to_string(),
            timeout: Duration::from_secs(vars.parse_or("SEARCH_TIMEOUT_SECS", 20)?),
            max_snippets: vars.parse_or("SEARCH_MAX_SNIPPETS", 5)?,
        };

        let quiz = QuizSettings {
            default_num_questions: vars.parse_or("DEFAULT_NUM_QUESTIONS", 3)?,
            min_num_questions: vars.parse_or("MIN_NUM_QUESTIONS", 1)?,
            max_num_questions: vars.parse_or("MAX_NUM_QUESTIONS", 10)?,
            shuffle_options: vars.flag("SHUFFLE_OPTIONS"),
        };
        quiz.check()?;

        let allowed_origins = vars
            .get_or("ALLOWED_ORIGINS", "*")
            .split(',')
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();

        Ok(Self {
            host: vars.get_or("HOST", "0.0.0.0"),
            port: vars.parse_or("PORT", 5000)?,
            debug_mode: vars.flag("DEBUG_MODE"),
            allowed_origins,
            openai,
            search,
            quiz,
        })
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| Error::Config(format!("Invalid bind address: {}", e)))
    }
}

struct Vars<F> {
    lookup: F,
}

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, name: &str) -> Result<String> {
        (self.lookup)(name)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| Error::Config(format!("Missing environment variable: {}", name)))
    }

    fn get_or(&self, name: &str, default: &str) -> String {
        self.get(name).unwrap_or_else(|_| default.to_string())
    }

    fn parse_or<T>(&self, name: &str, default: T) -> Result<T>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(name) {
            Ok(raw) => raw
                .trim()
                .parse()
                .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
            Err(_) => Ok(default),
        }
    }

    fn flag(&self, name: &str) -> bool {
        self.get(name)
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
            .unwrap_or(false)
    }
}
