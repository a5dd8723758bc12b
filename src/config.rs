//! Config handling

use tracing::log::LevelFilter;
use url::Url;

/// Sets up logging based on the debug flag
pub fn setup_logging(debug: bool) -> Result<(), Box<std::io::Error>> {
    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let mut logger = simple_logger::SimpleLogger::new().with_level(level);
    if !debug {
        logger = logger
            .with_module_level("tracing", LevelFilter::Warn)
            .with_module_level("rustls", LevelFilter::Info)
            .with_module_level("hyper_util", LevelFilter::Info)
            .with_module_level("reqwest", LevelFilter::Info)
            .with_module_level("usvg", LevelFilter::Warn)
            .with_module_level("h2", LevelFilter::Info);
    }
    logger.init().map_err(|err| {
        eprintln!("Failed to initialize logger: {}", err);
        Box::new(std::io::Error::other(err))
    })
}

/// Where and with which models the provider is reached.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderConfig {
    /// API root, without a trailing slash
    pub api_base: String,
    /// model producing background images
    pub image_model: String,
    /// model answering magic edits and title polish
    pub text_model: String,
}

impl ProviderConfig {
    /// Validates the API base and normalises it.
    pub fn new(
        api_base: &str,
        image_model: &str,
        text_model: &str,
    ) -> Result<Self, url::ParseError> {
        let parsed = Url::parse(api_base.trim())?;
        Ok(Self {
            api_base: parsed.as_str().trim_end_matches('/').to_string(),
            image_model: image_model.trim().to_string(),
            text_model: text_model.trim().to_string(),
        })
    }

    /// `generateContent` endpoint for a model.
    pub fn endpoint(&self, model: &str) -> String {
        let model = model.strip_prefix("models/").unwrap_or(model);
        format!("{}/models/{}:generateContent", self.api_base, model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_strips_models_prefix_and_trailing_slash() {
        let config =
            ProviderConfig::new("http://127.0.0.1:8080/v1beta/", "models/img", "txt").unwrap();
        assert_eq!(config.api_base, "http://127.0.0.1:8080/v1beta");
        assert_eq!(
            config.endpoint(&config.image_model),
            "http://127.0.0.1:8080/v1beta/models/img:generateContent"
        );
        assert_eq!(
            config.endpoint("txt"),
            "http://127.0.0.1:8080/v1beta/models/txt:generateContent"
        );
    }

    #[test]
    fn rejects_invalid_api_base() {
        assert!(ProviderConfig::new("not a url", "a", "b").is_err());
    }
}
