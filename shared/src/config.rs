use tracing::warn;
use url::Url;

pub struct Config {
    pub host: String,
    pub port: u16,
    pub namespace: String,
    pub version: String,
    pub origin: Url,
    pub seed_paths: Vec<String>,
    pub offline_path: String,
    pub same_origin_only: bool,
    pub data_dir: String,
}

impl Config {
    const DEFAULT_NAMESPACE: &str = "bunker-site";
    const DEFAULT_VERSION: &str = "1.0.0";
    const DEFAULT_ORIGIN: &str = "http://localhost:8080";
    const DEFAULT_OFFLINE_PATH: &str = "/offline/index.html";
    const DEFAULT_DATA_DIR: &str = "./data";

    pub fn from_env() -> Self {
        let host = std::env::var("BUNKER_HOST").unwrap_or_else(|_| "localhost".to_string());
        let port = std::env::var("BUNKER_PORT")
            .unwrap_or_else(|_| "3030".to_string())
            .parse::<u16>()
            .unwrap_or(3030);
        let origin = std::env::var("BUNKER_ORIGIN")
            .ok()
            .and_then(|raw| match Url::parse(&raw) {
                Ok(url) => Some(url),
                Err(e) => {
                    warn!("BUNKER_ORIGIN '{}' is not a valid URL ({}), using default", raw, e);
                    None
                }
            })
            .unwrap_or_else(|| {
                Url::parse(Self::DEFAULT_ORIGIN).expect("default origin must parse")
            });
        let offline_path = std::env::var("BUNKER_OFFLINE_PATH")
            .unwrap_or_else(|_| Self::DEFAULT_OFFLINE_PATH.to_string());
        Self {
            host,
            port,
            namespace: std::env::var("BUNKER_NAMESPACE")
                .unwrap_or_else(|_| Self::DEFAULT_NAMESPACE.to_string()),
            version: std::env::var("BUNKER_VERSION")
                .unwrap_or_else(|_| Self::DEFAULT_VERSION.to_string()),
            origin,
            seed_paths: std::env::var("BUNKER_SEED_PATHS")
                .unwrap_or_else(|_| format!("/,{}", offline_path))
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            offline_path,
            same_origin_only: std::env::var("BUNKER_SAME_ORIGIN_ONLY")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
            data_dir: std::env::var("BUNKER_DATA_DIR")
                .unwrap_or_else(|_| Self::DEFAULT_DATA_DIR.to_string()),
        }
    }

    /// Seed paths resolved against the origin. Paths that do not join cleanly
    /// are skipped with a warning rather than aborting startup.
    pub fn seed_urls(&self) -> Vec<Url> {
        self.seed_paths
            .iter()
            .filter_map(|path| match self.origin.join(path) {
                Ok(url) => Some(url),
                Err(e) => {
                    warn!("Seed path '{}' does not resolve against origin: {}", path, e);
                    None
                }
            })
            .collect()
    }

    pub fn offline_url(&self) -> Url {
        self.origin
            .join(&self.offline_path)
            .unwrap_or_else(|_| self.origin.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            host: "localhost".to_string(),
            port: 3030,
            namespace: "bunker-site".to_string(),
            version: "2.1.0".to_string(),
            origin: Url::parse("https://example.org").unwrap(),
            seed_paths: vec!["/".to_string(), "/offline/index.html".to_string()],
            offline_path: "/offline/index.html".to_string(),
            same_origin_only: true,
            data_dir: "./data".to_string(),
        }
    }

    #[test]
    fn seed_paths_resolve_against_origin() {
        let config = test_config();
        let urls = config.seed_urls();
        assert_eq!(urls.len(), 2);
        assert_eq!(urls[0].as_str(), "https://example.org/");
        assert_eq!(urls[1].as_str(), "https://example.org/offline/index.html");
    }

    #[test]
    fn offline_url_is_origin_scoped() {
        let config = test_config();
        assert_eq!(
            config.offline_url().as_str(),
            "https://example.org/offline/index.html"
        );
    }
}
