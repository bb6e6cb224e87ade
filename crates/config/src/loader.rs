use std::path::Path;

use crate::{Config, error::Error};

pub(crate) fn load<P: AsRef<Path>>(path: P) -> crate::Result<Config> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;

    validate_api_url(&config)?;

    Ok(config)
}

fn validate_api_url(config: &Config) -> crate::Result<()> {
    let url = &config.api.url;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::InvalidApiUrl {
            url: url.to_string(),
            reason: format!("unsupported scheme `{}`, expected http or https", url.scheme()),
        });
    }

    if url.host_str().is_none() {
        return Err(Error::InvalidApiUrl {
            url: url.to_string(),
            reason: "missing host".to_string(),
        });
    }

    Ok(())
}
