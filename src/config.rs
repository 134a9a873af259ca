use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::classifier::{DEFAULT_MAX_INPUT_CHARS, HuggingFaceConfig, huggingface};
use crate::error::GitnovaError;
use crate::github::{GitHubConfig, client::GITHUB_API_URL};
use crate::judge::DEFAULT_MODELS;
use crate::llm::{GROQ_API_KEY_ENV, GROQ_API_URL, GroqConfig};
use crate::store::{ISSUES_TABLE, SUPABASE_KEY_ENV, SUPABASE_URL_ENV, SupabaseConfig};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    /// Judge candidates but never write to or delete from the store
    pub dry_run: bool,
    pub pipeline: PipelineConfig,
    pub categories: Vec<CategoryConfig>,
    pub github: SourceConfig,
    pub classifier: ClassifierConfig,
    pub judge: JudgeConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Open issues requested per repository
    pub fetch_per_repo: u32,
    /// Classifier scores below this are discarded
    pub local_min_confidence: f64,
    /// Candidates sent to the judge per category
    pub judge_batch_limit: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fetch_per_repo: 30,
            local_min_confidence: 0.30,
            judge_batch_limit: 15,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryConfig {
    pub name: String,
    pub repos: Vec<String>,
}

impl CategoryConfig {
    pub fn new(name: &str, repos: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            repos: repos.iter().map(|r| r.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub api_base: String,
    pub list_timeout_secs: u64,
    pub state_timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            api_base: GITHUB_API_URL.to_string(),
            list_timeout_secs: 10,
            state_timeout_secs: 5,
        }
    }
}

impl SourceConfig {
    pub fn client_config(&self) -> GitHubConfig {
        GitHubConfig {
            api_base: self.api_base.clone(),
            list_timeout: Duration::from_secs(self.list_timeout_secs),
            state_timeout: Duration::from_secs(self.state_timeout_secs),
            ..GitHubConfig::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub endpoint: String,
    pub model: String,
    pub max_input_chars: usize,
    pub timeout_secs: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            endpoint: huggingface::HF_INFERENCE_URL.to_string(),
            model: huggingface::DEFAULT_ZERO_SHOT_MODEL.to_string(),
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
            timeout_secs: 30,
        }
    }
}

impl ClassifierConfig {
    pub fn model_config(&self) -> HuggingFaceConfig {
        HuggingFaceConfig {
            endpoint: self.endpoint.clone(),
            model: self.model.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JudgeConfig {
    pub base_url: String,
    /// Tried in order, most capable first
    pub models: Vec<String>,
    /// Sleep before every judge call
    pub pacing_ms: u64,
    pub max_body_chars: usize,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            base_url: GROQ_API_URL.to_string(),
            models: DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
            pacing_ms: 7000,
            max_body_chars: 6000,
            temperature: 0.1,
            timeout_secs: 60,
        }
    }
}

impl JudgeConfig {
    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn client_config(&self) -> GroqConfig {
        GroqConfig::default()
            .with_base_url(self.base_url.clone())
            .with_timeout(self.timeout())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Supabase,
    Sqlite,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub table: String,
    pub sqlite_path: PathBuf,
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Supabase,
            table: ISSUES_TABLE.to_string(),
            sqlite_path: dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("gitnova")
                .join("gitnova.db"),
            timeout_secs: 15,
        }
    }
}

impl StoreConfig {
    pub fn supabase_config(&self, url: &str) -> SupabaseConfig {
        SupabaseConfig::new(url)
            .with_table(self.table.clone())
            .with_timeout(Duration::from_secs(self.timeout_secs))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            dry_run: false,
            pipeline: PipelineConfig::default(),
            categories: default_categories(),
            github: SourceConfig::default(),
            classifier: ClassifierConfig::default(),
            judge: JudgeConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

/// The built-in category map.
pub fn default_categories() -> Vec<CategoryConfig> {
    vec![
        CategoryConfig::new(
            "Frontend",
            &[
                "facebook/react",
                "shadcn-ui/ui",
                "vercel/next.js",
                "tailwindlabs/tailwindcss",
                "mui/material-ui",
                "sveltejs/svelte",
                "vuejs/core",
                "remix-run/remix",
                "solidjs/solid",
                "withastro/astro",
                "freeCodeCamp/freeCodeCamp",
                "storybookjs/storybook",
                "appsmithorg/appsmith",
            ],
        ),
        CategoryConfig::new(
            "Machine Learning",
            &[
                "pytorch/pytorch",
                "huggingface/transformers",
                "langchain-ai/langchain",
                "tensorflow/tensorflow",
                "karpathy/nanoGPT",
                "openai/whisper",
                "microsoft/DeepSpeed",
                "ray-project/ray",
                "huggingface/diffusers",
                "scikit-learn/scikit-learn",
                "keras-team/keras",
                "streamlit/streamlit",
            ],
        ),
        CategoryConfig::new(
            "Backend",
            &[
                "fastapi/fastapi",
                "django/django",
                "nestjs/nest",
                "expressjs/express",
                "tiangolo/sqlmodel",
                "pallets/flask",
                "rails/rails",
                "laravel/laravel",
                "strapi/strapi",
                "go-gorm/gorm",
                "RocketChat/Rocket.Chat",
                "supabase/supabase",
                "redis/redis",
            ],
        ),
        CategoryConfig::new(
            "DevOps",
            &[
                "microsoft/vscode",
                "docker/cli",
                "kubernetes/kubernetes",
                "ansible/ansible",
                "prometheus/prometheus",
                "grafana/grafana",
                "hashicorp/terraform",
                "jenkinsci/jenkins",
                "gitlabhq/gitlabhq",
                "elastic/elasticsearch",
                "moby/moby",
            ],
        ),
        CategoryConfig::new(
            "Data Science",
            &[
                "pandas-dev/pandas",
                "apache/spark",
                "apache/arrow",
                "plotly/plotly.py",
                "matplotlib/matplotlib",
                "ydataai/ydata-profiling",
                "seleniumhq/selenium",
                "scrapy/scrapy",
            ],
        ),
        CategoryConfig::new(
            "Mobile",
            &[
                "flutter/flutter",
                "facebook/react-native",
                "ionic-team/ionic-framework",
                "expo/expo",
                "airbnb/lottie-android",
                "square/retrofit",
                "realm/realm-swift",
                "skylot/jadx",
            ],
        ),
    ]
}

impl Config {
    /// Load configuration with fallback chain
    ///
    /// A config file that exists but cannot be read or parsed is an error,
    /// never silently replaced by the defaults.
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        let project_name = env!("CARGO_PKG_NAME");
        let file_name = format!("{}.yml", project_name);

        // Primary location: ~/.config/<project>/<project>.yml
        let primary = dirs::config_dir().map(|dir| dir.join(project_name).join(&file_name));

        // Fallback location: ./<project>.yml
        let fallback = PathBuf::from(&file_name);

        Self::load_with_fallbacks(config_path, primary.as_deref(), &fallback)
    }

    fn load_with_fallbacks(explicit: Option<&PathBuf>, primary: Option<&Path>, fallback: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        for candidate in primary.into_iter().chain(std::iter::once(fallback)) {
            if candidate.exists() {
                return Self::load_from_file(candidate)
                    .context(format!("Failed to load config from {}", candidate.display()));
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        config.validate()?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> std::result::Result<(), GitnovaError> {
        let confidence = self.pipeline.local_min_confidence;
        if !(0.0..=1.0).contains(&confidence) {
            return Err(GitnovaError::Config(format!(
                "pipeline.local_min_confidence must be within [0, 1], got {}",
                confidence
            )));
        }
        if self.judge.models.is_empty() {
            return Err(GitnovaError::Config("judge.models must name at least one model".to_string()));
        }
        if let Some(unnamed) = self.categories.iter().position(|c| c.name.trim().is_empty()) {
            return Err(GitnovaError::Config(format!("categories[{}] has no name", unnamed)));
        }
        Ok(())
    }

    pub fn category(&self, name: &str) -> Option<&CategoryConfig> {
        self.categories.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }
}

/// Store credentials for the Supabase backend.
#[derive(Clone)]
pub struct SupabaseCredentials {
    pub url: String,
    pub key: String,
}

impl SupabaseCredentials {
    /// Credentials `backend` needs, read from the environment. Only the
    /// Supabase backend needs any.
    pub fn from_env(backend: StoreBackend) -> std::result::Result<Option<Self>, GitnovaError> {
        Self::from_lookup(backend, |name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(backend: StoreBackend, lookup: F) -> std::result::Result<Option<Self>, GitnovaError>
    where
        F: Fn(&str) -> Option<String>,
    {
        match backend {
            StoreBackend::Supabase => Ok(Some(Self {
                url: required_secret(&lookup, SUPABASE_URL_ENV)?,
                key: required_secret(&lookup, SUPABASE_KEY_ENV)?,
            })),
            StoreBackend::Sqlite => Ok(None),
        }
    }
}

/// Blank values count as missing.
fn optional_secret<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name).filter(|v| !v.trim().is_empty())
}

fn required_secret<F>(lookup: &F, name: &str) -> std::result::Result<String, GitnovaError>
where
    F: Fn(&str) -> Option<String>,
{
    optional_secret(lookup, name).ok_or_else(|| GitnovaError::MissingSecret {
        env_var: name.to_string(),
    })
}

/// Credentials read from the environment.
#[derive(Clone)]
pub struct Secrets {
    pub groq_api_key: String,
    /// Present whenever the Supabase backend is selected
    pub supabase: Option<SupabaseCredentials>,
    pub github_token: Option<String>,
    pub hf_token: Option<String>,
}

impl Secrets {
    pub fn from_env(backend: StoreBackend) -> std::result::Result<Self, GitnovaError> {
        Self::from_lookup(backend, |name| std::env::var(name).ok())
    }

    /// Resolve secrets through `lookup`. Blank values count as missing.
    pub fn from_lookup<F>(backend: StoreBackend, lookup: F) -> std::result::Result<Self, GitnovaError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let supabase = SupabaseCredentials::from_lookup(backend, &lookup)?;

        Ok(Self {
            groq_api_key: required_secret(&lookup, GROQ_API_KEY_ENV)?,
            supabase,
            github_token: optional_secret(&lookup, crate::github::GITHUB_TOKEN_ENV),
            hf_token: optional_secret(&lookup, huggingface::HF_API_TOKEN_ENV),
        })
    }
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("supabase", &self.supabase.is_some())
            .field("github_token", &self.github_token.is_some())
            .field("hf_token", &self.hf_token.is_some())
            .finish_non_exhaustive()
    }
}
