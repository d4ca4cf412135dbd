//! Earth Engine REST session.
//!
//! A [`Session`] is created once with [`Session::initialize`] and then passed by
//! reference to every query. Authentication that fails during initialization is
//! re-run exactly once; later failures propagate to the caller.

use std::path::PathBuf;

use futures::{stream, TryStreamExt};
use log::{info, warn};
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

use super::{
    filter::{constant, invocation},
    Feature, Filter,
};

pub const API_ROOT: &str = "https://earthengine.googleapis.com/v1";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const PAGE_SIZE: usize = 1000;

#[derive(Error, Debug)]
pub enum EarthEngineError {
    #[error("IO error {0}")]
    IOError(#[from] std::io::Error),

    #[error("HTTP error {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("credentials error {0}")]
    CredentialsError(String),

    #[error("Earth Engine request failed with status {status}: {message}")]
    RequestError { status: u16, message: String },
}

pub type Result<T> = std::result::Result<T, EarthEngineError>;

/// Something that can produce an OAuth access token.
pub trait Authenticator {
    async fn authenticate(&self, client: &reqwest::Client) -> Result<String>;
}

/// A pre-issued access token, e.g. from `gcloud auth print-access-token`.
pub struct StaticToken(pub String);

impl Authenticator for StaticToken {
    async fn authenticate(&self, _client: &reqwest::Client) -> Result<String> {
        if self.0.trim().is_empty() {
            return Err(EarthEngineError::CredentialsError("empty access token".to_string()));
        }
        Ok(self.0.trim().to_string())
    }
}

#[derive(Debug, Deserialize)]
struct StoredCredentials {
    refresh_token: String,
    client_id: Option<String>,
    client_secret: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Exchanges the refresh token stored by `earthengine authenticate` for an access
/// token.
pub struct RefreshTokenFlow {
    pub credentials_path: PathBuf,
}

impl RefreshTokenFlow {
    pub fn new(credentials_path: Option<PathBuf>) -> Result<Self> {
        let credentials_path = match credentials_path {
            Some(path) => path,
            None => default_credentials_path().ok_or_else(|| {
                EarthEngineError::CredentialsError("no home directory".to_string())
            })?,
        };
        Ok(RefreshTokenFlow { credentials_path })
    }

    fn read_credentials(&self) -> Result<StoredCredentials> {
        let text = std::fs::read_to_string(&self.credentials_path)?;
        serde_json::from_str(&text).map_err(|e| {
            EarthEngineError::CredentialsError(format!(
                "{}: {}",
                self.credentials_path.display(),
                e
            ))
        })
    }
}

impl Authenticator for RefreshTokenFlow {
    async fn authenticate(&self, client: &reqwest::Client) -> Result<String> {
        let credentials = self.read_credentials()?;
        let mut form = vec![
            ("grant_type", "refresh_token".to_string()),
            ("refresh_token", credentials.refresh_token),
        ];
        if let Some(id) = credentials.client_id {
            form.push(("client_id", id));
        }
        if let Some(secret) = credentials.client_secret {
            form.push(("client_secret", secret));
        }

        let response = client.post(TOKEN_URL).form(&form).send().await?;
        let response = check_status(response).await?;
        let token: TokenResponse = response.json().await?;

        Ok(token.access_token)
    }
}

/// `~/.config/earthengine/credentials`, where the Earth Engine CLI stores its token.
pub fn default_credentials_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".config").join("earthengine").join("credentials"))
}

/// Authenticated handle to one Earth Engine cloud project.
pub struct Session {
    client: reqwest::Client,
    token: String,
    project: String,
    api_root: String,
}

impl Session {
    pub async fn initialize<A: Authenticator>(project: &str, auth: &A) -> Result<Session> {
        let client = reqwest::Client::new();

        let token = match auth.authenticate(&client).await {
            Ok(token) => token,
            Err(e) => {
                warn!("Authentication required ({}). Proceeding to authenticate...", e);
                auth.authenticate(&client).await?
            }
        };
        info!("Google Earth Engine initialized for project `{}`", project);

        Ok(Session {
            client,
            token,
            project: project.to_string(),
            api_root: API_ROOT.to_string(),
        })
    }

    /// All features of `collection` matching `filter`, following page tokens.
    pub async fn compute_features(&self, collection: &str, filter: &Filter) -> Result<Vec<Feature>> {
        let url = format!(
            "{}/projects/{}/table:computeFeatures",
            self.api_root, self.project
        );
        let expression = filtered_collection(collection, filter);

        // state is the token of the next page to fetch, `None` once exhausted
        let pages = stream::try_unfold(Some(None::<String>), |state| {
            let (url, expression) = (&url, &expression);
            async move {
                let Some(page_token) = state else {
                    return Ok(None);
                };
                let page = self.fetch_page(url, expression, page_token.as_deref()).await?;
                let next = page.next_page_token.filter(|t| !t.is_empty()).map(Some);
                Ok::<_, EarthEngineError>(Some((page.features, next)))
            }
        });
        let pages: Vec<Vec<Feature>> = pages.try_collect().await?;

        Ok(pages.into_iter().flatten().collect())
    }

    async fn fetch_page(
        &self,
        url: &str,
        expression: &Value,
        page_token: Option<&str>,
    ) -> Result<FeaturePage> {
        let mut body = json!({ "expression": expression, "pageSize": PAGE_SIZE });
        if let Some(token) = page_token {
            body["pageToken"] = Value::String(token.to_string());
        }

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;

        Ok(check_status(response).await?.json().await?)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeaturePage {
    #[serde(default)]
    features: Vec<Feature>,
    next_page_token: Option<String>,
}

/// Expression graph for `FeatureCollection(collection).filter(filter)`.
pub fn filtered_collection(collection: &str, filter: &Filter) -> Value {
    let table = invocation(
        "Collection.loadTable",
        json!({ "tableId": constant(collection) }),
    );
    let filtered = invocation(
        "Collection.filter",
        json!({ "collection": table, "filter": filter.to_expression() }),
    );
    json!({ "result": "0", "values": { "0": filtered } })
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(EarthEngineError::RequestError {
        status: status.as_u16(),
        message,
    })
}

// -- Tests -------------------------------------------------------------------
