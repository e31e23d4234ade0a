use url::{ParseError, Url};

use crate::{Error, RetrieveConfig};

/// Computes the request URL.
///
/// Absolute URLs are used as-is; anything else is resolved against
/// `config.base_url`. Each of `config.params` is then set on the query
/// string, replacing every existing parameter of the same name.
pub fn build_url(config: &RetrieveConfig) -> Result<Url, Error> {
    let mut url = match Url::parse(&config.url) {
        Ok(url) => url,
        Err(ParseError::RelativeUrlWithoutBase) => resolve_relative(config)?,
        Err(e) => {
            tracing::error!("Invalid URL `{}`: {}", config.url, e);
            return Err(Error::Config(format!("invalid url `{}`: {}", config.url, e)));
        }
    };

    if let Some(params) = config.params.as_deref().filter(|params| !params.is_empty()) {
        set_query_params(&mut url, params);
    }

    Ok(url)
}

fn resolve_relative(config: &RetrieveConfig) -> Result<Url, Error> {
    let base = config.base_url.as_deref().ok_or_else(|| {
        Error::Config(format!(
            "relative url `{}` needs a base url",
            config.url
        ))
    })?;
    let base = Url::parse(base)
        .map_err(|e| Error::Config(format!("invalid base url `{}`: {}", base, e)))?;
    base.join(&config.url)
        .map_err(|e| Error::Config(format!("invalid url `{}`: {}", config.url, e)))
}

fn set_query_params(url: &mut Url, params: &[(String, String)]) {
    let mut pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();

    for (name, value) in params {
        match pairs.iter().position(|(existing, _)| existing == name) {
            Some(first) => {
                pairs[first].1 = value.clone();
                let mut index = 0;
                pairs.retain(|(existing, _)| {
                    let keep = index == first || existing != name;
                    index += 1;
                    keep
                });
            }
            None => pairs.push((name.clone(), value.clone())),
        }
    }

    url.query_pairs_mut().clear().extend_pairs(pairs);
}
