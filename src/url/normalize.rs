use crate::UrlError;
use url::Url;

/// Normalizes a URL into its canonical identity
///
/// Two URLs that normalize to the same string are the same page for the whole
/// crawl: the frontier, the result set, the error set and the cache are all
/// keyed by this value.
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Only `http` and `https` are accepted, and a host is required
/// 3. The host is lowercased and a default port dropped (done by the parser)
/// 4. Dot segments are resolved and an empty path becomes `/`
/// 5. Remove fragment (everything after #)
/// 6. Sort query parameters by key, then by value, and re-encode them
/// 7. Remove empty query string (trailing ?)
///
/// Unlike many crawlers this keeps trailing slashes and every query
/// parameter: `/docs` and `/docs/` are different resources on most servers.
///
/// # Examples
///
/// ```
/// use deepcrawl::url::normalize_url;
///
/// let url = normalize_url("HTTPS://Example.COM?b=2&a=1#top").unwrap();
/// assert_eq!(url, "https://example.com/?a=1&b=2");
/// ```
pub fn normalize_url(url_str: &str) -> Result<String, UrlError> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;
    normalize_parsed(url).map(String::from)
}

/// Normalizes an already parsed URL
pub fn normalize_parsed(mut url: Url) -> Result<Url, UrlError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost);
    }

    if url.path().is_empty() {
        url.set_path("/");
    }

    url.set_fragment(None);

    if url.query().is_some() {
        let params = sorted_query_params(&url);

        if params.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(params);
        }
    }

    Ok(url)
}

/// Decodes the query string and sorts its pairs by key, then value
fn sorted_query_params(url: &Url) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    params.sort();
    params
}
