#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub log_level: String,
    pub newsapi_key: Option<String>,
    pub newsapi_base_url: String,
    pub newsapi_language: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub fetch_timeout_secs: u64,
    pub fetch_user_agent: String,
    pub fetch_max_concurrent_sources: usize,
    pub rank_cluster_threshold: f64,
    pub rank_dedup_threshold: f64,
    pub rank_cluster_weight: f64,
    pub rank_decay: f64,
    pub rank_weight_feed: f64,
    pub rank_weight_sitemap: f64,
    pub rank_weight_search_api: f64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field(
                "newsapi_key",
                &self.newsapi_key.as_ref().map(|_| "[redacted]"),
            )
            .field("newsapi_base_url", &self.newsapi_base_url)
            .field("newsapi_language", &self.newsapi_language)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("fetch_user_agent", &self.fetch_user_agent)
            .field(
                "fetch_max_concurrent_sources",
                &self.fetch_max_concurrent_sources,
            )
            .field("rank_cluster_threshold", &self.rank_cluster_threshold)
            .field("rank_dedup_threshold", &self.rank_dedup_threshold)
            .field("rank_cluster_weight", &self.rank_cluster_weight)
            .field("rank_decay", &self.rank_decay)
            .field("rank_weight_feed", &self.rank_weight_feed)
            .field("rank_weight_sitemap", &self.rank_weight_sitemap)
            .field("rank_weight_search_api", &self.rank_weight_search_api)
            .finish()
    }
}
