//! Public and signed link construction
//!
//! Public links never touch the network: they are the configured base joined
//! with the object key. Signed links come from the backend and may be moved
//! onto a different base (usually a CDN in front of the bucket).

use url::Url;

use crate::config::AdapterConfig;
use crate::error::Error;
use crate::path::percent_encode_path;
use crate::Result;

fn parse_base(value: &str, what: &str) -> Result<Url> {
    let value = value.trim();
    let with_scheme = if value.contains("://") {
        value.to_string()
    } else {
        format!("https://{value}")
    };

    let mut url = Url::parse(&with_scheme)
        .map_err(|err| Error::invalid_config(format!("{what} {value:?} is not a valid url: {err}")))?;
    if url.cannot_be_a_base() || url.host_str().is_none() {
        return Err(Error::invalid_config(format!("{what} {value:?} has no host")));
    }
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

/// Base URL for unsigned links, in order of precedence:
/// explicit `url` > bucket-scoped endpoint > endpoint with bucket applied.
fn public_base(config: &AdapterConfig) -> Result<Url> {
    if let Some(url) = &config.url {
        return parse_base(url, "url");
    }
    if config.endpoint.trim().is_empty() {
        return Err(Error::invalid_config("endpoint must be specified"));
    }

    let mut base = parse_base(&config.endpoint, "endpoint")?;
    if config.bucket_endpoint {
        return Ok(base);
    }
    if config.bucket.trim().is_empty() {
        return Err(Error::invalid_config("bucket must be specified"));
    }

    if config.path_style {
        let path = format!(
            "{}/{}",
            base.path().trim_end_matches('/'),
            percent_encode_path(&config.bucket)
        );
        base.set_path(&path);
    } else {
        let host = format!("{}.{}", config.bucket, base.host_str().unwrap_or_default());
        base.set_host(Some(&host))
            .map_err(|err| Error::invalid_config(format!("invalid bucket host {host}: {err}")))?;
    }
    Ok(base)
}

/// Base joined with the encoded key by plain concatenation. Going through
/// `Url` again would resolve `.` and `..` segments.
fn join_key(base: &Url, key: &str) -> String {
    let base = base.as_str().trim_end_matches('/');
    if key.is_empty() {
        format!("{base}/")
    } else {
        format!("{base}/{}", percent_encode_path(key))
    }
}

#[derive(Debug, Clone)]
pub struct LinkBuilder {
    public: Url,
    temporary: Option<Url>,
}

impl LinkBuilder {
    pub fn new(config: &AdapterConfig) -> Result<Self> {
        let temporary = config
            .temporary_url
            .as_deref()
            .map(|base| parse_base(base, "temporary_url"))
            .transpose()?;

        Ok(Self {
            public: public_base(config)?,
            temporary,
        })
    }

    pub fn public_base(&self) -> &str {
        self.public.as_str()
    }

    /// Unsigned link for an object key.
    pub fn public_url(&self, key: &str) -> String {
        join_key(&self.public, key)
    }

    /// Move a backend signed URL onto the `temporary_url` base, keeping its
    /// query (the signature). Without an override the URL is returned as is.
    pub fn graft_signed(&self, key: &str, signed: &str) -> std::result::Result<String, url::ParseError> {
        let Some(base) = &self.temporary else {
            return Ok(signed.to_string());
        };

        let signed = Url::parse(signed)?;
        let mut url = join_key(base, key);
        if let Some(query) = signed.query() {
            url.push('?');
            url.push_str(query);
        }
        Ok(url)
    }
}
