use nsid_types::Did;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client as HttpClient;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{ResolveError, ResolveResult};

static DID_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"did=(did:[a-z0-9]+:[A-Za-z0-9._:%-]+)").expect("valid DID token pattern"));

#[derive(Debug, Deserialize)]
struct DohResponse {
    #[serde(rename = "Answer", default)]
    answer: Vec<DohAnswer>,
}

#[derive(Debug, Deserialize)]
struct DohAnswer {
    #[serde(default)]
    data: String,
}

/// Name of the TXT record that publishes the authority of an NSID.
///
/// The name segment is dropped and the remaining authority is reversed:
/// `uk.skyblur.post` is looked up at `_lexicon.skyblur.uk`.
pub fn lexicon_txt_name(nsid: &str) -> ResolveResult<String> {
    let mut parts: Vec<&str> = nsid.trim().split('.').collect();
    if parts.len() < 2 || parts.iter().any(|p| p.is_empty()) {
        return Err(ResolveError::MalformedInput(format!(
            "NSID needs at least two segments: {}",
            nsid
        )));
    }

    parts.reverse();
    Ok(format!("_lexicon.{}", parts[1..].join(".")))
}

/// Pull the `did=` token out of concatenated TXT data, ignoring quoting
pub fn extract_did(txt: &str) -> Option<Did> {
    let unquoted = txt.replace('"', "");
    let captures = DID_TOKEN.captures(&unquoted)?;
    Did::parse(&captures[1]).ok()
}

/// Looks up NSID authorities with DNS-over-HTTPS TXT queries
#[derive(Clone)]
pub struct DnsTxtResolver {
    http_client: HttpClient,
    doh_url: String,
}

impl DnsTxtResolver {
    pub fn new(http_client: HttpClient, doh_url: impl Into<String>) -> Self {
        Self {
            http_client,
            doh_url: doh_url.into(),
        }
    }

    /// Issue one TXT query and return the raw `data` fields of the answer
    pub async fn lookup_txt(&self, name: &str) -> ResolveResult<Vec<String>> {
        let url = format!("{}/resolve", self.doh_url.trim_end_matches('/'));
        debug!("DoH TXT lookup {} via {}", name, url);

        let response = self
            .http_client
            .get(&url)
            .query(&[("name", name), ("type", "TXT")])
            .send()
            .await
            .map_err(|e| ResolveError::NetworkFailure(format!("DNS lookup for {} failed: {}", name, e)))?;

        if !response.status().is_success() {
            return Err(ResolveError::ResolutionFailed(format!(
                "DNS service returned {} for {}",
                response.status(),
                name
            )));
        }

        let body: DohResponse = response
            .json()
            .await
            .map_err(|e| ResolveError::ResolutionFailed(format!("Invalid DNS answer for {}: {}", name, e)))?;

        Ok(body.answer.into_iter().map(|a| a.data).collect())
    }

    /// Resolve the DID that publishes schemas for `nsid`. Probes exactly one name.
    pub async fn resolve_operator(&self, nsid: &str) -> ResolveResult<Did> {
        let txt_name = lexicon_txt_name(nsid)?;
        let answers = self.lookup_txt(&txt_name).await?;

        if answers.is_empty() {
            return Err(ResolveError::NotFound(format!("No TXT record at {}", txt_name)));
        }

        let did = extract_did(&answers.concat())
            .ok_or_else(|| ResolveError::NotFound(format!("No did= entry in TXT record at {}", txt_name)))?;

        info!("Resolved authority of {} to {}", nsid, did);
        Ok(did)
    }
}
