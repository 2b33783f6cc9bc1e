//! Yandex Music API adapter.

use std::collections::HashMap;
use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use super::{Catalog, CatalogError};
use crate::download::default_user_agent;
use crate::model::{Playlist, PlaylistSummary, Track};

/// Public API endpoint used when the config does not override it.
pub const DEFAULT_API_URL: &str = "https://api.music.yandex.net";

const REQUEST_TIMEOUT_SECS: u64 = 30;
const SIGN_SALT: &str = "XGRlBW9FXlekgbPrRHuSiA";
const PREFERRED_CODEC: &str = "mp3";

static XML_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"<(\w+)>([^<]*)</\w+>").expect("valid regex")
});

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    result: Option<T>,
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    name: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct AccountStatus {
    account: Account,
}

#[derive(Debug, Deserialize)]
struct Account {
    uid: u64,
}

#[derive(Debug, Deserialize)]
struct RawPlaylistSummary {
    kind: u64,
    title: String,
}

#[derive(Debug, Deserialize)]
struct RawPlaylist {
    kind: u64,
    title: String,
    #[serde(default)]
    tracks: Vec<RawPlaylistEntry>,
}

#[derive(Debug, Deserialize)]
struct RawPlaylistEntry {
    track: RawTrack,
}

#[derive(Debug, Deserialize)]
struct RawTrack {
    id: RawId,
    #[serde(default)]
    title: String,
    #[serde(default)]
    artists: Vec<RawArtist>,
    available: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(u64),
    Text(String),
}

#[derive(Debug, Deserialize)]
struct RawArtist {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DownloadInfo {
    codec: String,
    #[serde(default)]
    bitrate_in_kbps: u32,
    download_info_url: String,
}

impl RawId {
    fn parse(self) -> Result<u64, CatalogError> {
        match self {
            Self::Number(id) => Ok(id),
            Self::Text(raw) => raw
                .trim()
                .parse()
                .map_err(|_| CatalogError::InvalidTrackId { raw }),
        }
    }
}

impl RawTrack {
    fn into_track(self) -> Result<Track, CatalogError> {
        let id = self.id.parse()?;
        let artists = self.artists.into_iter().map(|a| a.name).collect();
        let track = Track::new(id, self.title, artists);
        Ok(if self.available == Some(false) {
            track.unavailable()
        } else {
            track
        })
    }
}

/// [`Catalog`] talking to the Yandex Music REST API with an OAuth token.
#[derive(Debug, Clone)]
pub struct YandexCatalog {
    client: reqwest::Client,
    base_url: String,
    uid: u64,
}

impl YandexCatalog {
    /// Builds an authenticated client and looks up the account's user id.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Config`] for a malformed token or API URL and
    /// any request error from the account status call.
    #[instrument(skip(token))]
    pub async fn connect(token: &str, api_url: &str) -> Result<Self, CatalogError> {
        Url::parse(api_url)
            .map_err(|e| CatalogError::config(format!("invalid api_url '{api_url}': {e}")))?;

        let mut auth = HeaderValue::from_str(&format!("OAuth {token}"))
            .map_err(|_| CatalogError::config("token contains invalid header characters"))?;
        auth.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(default_user_agent())
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| CatalogError::config(format!("failed to build HTTP client: {e}")))?;

        let mut catalog = Self {
            client,
            base_url: api_url.trim_end_matches('/').to_string(),
            uid: 0,
        };
        let status: AccountStatus = catalog.get_result("/account/status").await?;
        catalog.uid = status.account.uid;
        debug!(uid = catalog.uid, "connected to catalog");
        Ok(catalog)
    }

    /// User id of the authenticated account.
    #[must_use]
    pub fn uid(&self) -> u64 {
        self.uid
    }

    async fn get_result<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, CatalogError> {
        let url = format!("{}{endpoint}", self.base_url);
        debug!(url = %url, "catalog request");
        let body = self.get_bytes(endpoint, &url).await?;
        decode_envelope(endpoint, body.status, &body.bytes)
    }

    async fn get_bytes(&self, endpoint: &str, url: &str) -> Result<RawBody, CatalogError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CatalogError::request(endpoint, e))?;
        let status = response.status().as_u16();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| CatalogError::request(endpoint, e))?;
        Ok(RawBody {
            status,
            bytes: bytes.to_vec(),
        })
    }
}

struct RawBody {
    status: u16,
    bytes: Vec<u8>,
}

fn decode_envelope<T: DeserializeOwned>(
    endpoint: &str,
    status: u16,
    body: &[u8],
) -> Result<T, CatalogError> {
    let success = (200..300).contains(&status);
    match serde_json::from_slice::<Envelope<T>>(body) {
        Ok(Envelope {
            error: Some(error), ..
        }) => Err(CatalogError::Api {
            endpoint: endpoint.to_string(),
            name: error.name,
            message: error.message,
        }),
        _ if !success => Err(CatalogError::HttpStatus {
            endpoint: endpoint.to_string(),
            status,
        }),
        Ok(Envelope {
            result: Some(result),
            ..
        }) => Ok(result),
        Ok(_) => Err(CatalogError::decode(endpoint, "missing result")),
        Err(e) => Err(CatalogError::decode(endpoint, e.to_string())),
    }
}

fn best_download_info(infos: Vec<DownloadInfo>) -> Option<DownloadInfo> {
    infos
        .into_iter()
        .filter(|info| info.codec == PREFERRED_CODEC)
        .max_by_key(|info| info.bitrate_in_kbps)
}

fn xml_fields(body: &str) -> HashMap<&str, &str> {
    XML_FIELD
        .captures_iter(body)
        .filter_map(|caps| Some((caps.get(1)?.as_str(), caps.get(2)?.as_str())))
        .collect()
}

/// Builds the signed storage URL from the download-info XML document.
fn signed_url(endpoint: &str, xml: &str) -> Result<String, CatalogError> {
    let fields = xml_fields(xml);
    let field = |name: &str| {
        fields
            .get(name)
            .copied()
            .ok_or_else(|| CatalogError::decode(endpoint, format!("download info lacks <{name}>")))
    };
    let host = field("host")?;
    let path = field("path")?;
    let ts = field("ts")?;
    let s = field("s")?;

    let unrooted = path.strip_prefix('/').unwrap_or(path);
    let sign = md5::compute(format!("{SIGN_SALT}{unrooted}{s}"));
    Ok(format!("https://{host}/get-mp3/{sign:x}/{ts}{path}"))
}

#[async_trait]
impl Catalog for YandexCatalog {
    #[instrument(skip(self))]
    async fn list_playlists(&self) -> Result<Vec<PlaylistSummary>, CatalogError> {
        let endpoint = format!("/users/{}/playlists/list", self.uid);
        let raw: Vec<RawPlaylistSummary> = self.get_result(&endpoint).await?;
        Ok(raw
            .into_iter()
            .map(|p| PlaylistSummary::new(p.kind, p.title))
            .collect())
    }

    #[instrument(skip(self))]
    async fn get_playlist(&self, id: u64) -> Result<Playlist, CatalogError> {
        let endpoint = format!("/users/{}/playlists/{id}", self.uid);
        let raw: RawPlaylist = self.get_result(&endpoint).await?;
        let tracks = raw
            .tracks
            .into_iter()
            .map(|entry| entry.track.into_track())
            .collect::<Result<Vec<_>, _>>()?;
        debug!(tracks = tracks.len(), "playlist fetched");
        Ok(Playlist::new(raw.kind, raw.title, tracks))
    }

    #[instrument(skip(self))]
    async fn resolve_download_url(&self, track_id: u64) -> Result<String, CatalogError> {
        let endpoint = format!("/tracks/{track_id}/download-info");
        let infos: Vec<DownloadInfo> = self.get_result(&endpoint).await?;
        let info =
            best_download_info(infos).ok_or(CatalogError::Unavailable { track_id })?;
        debug!(bitrate = info.bitrate_in_kbps, "selected download variant");

        let body = self
            .get_bytes(&endpoint, &info.download_info_url)
            .await?;
        if !(200..300).contains(&body.status) {
            return Err(CatalogError::HttpStatus {
                endpoint,
                status: body.status,
            });
        }
        signed_url(&endpoint, &String::from_utf8_lossy(&body.bytes))
    }
}
