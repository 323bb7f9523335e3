use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Deserialize;
use std::fmt;
use url::Url;

/// Session authentifiée, construite une fois au démarrage puis injectée
/// dans le client REST.
#[derive(Clone)]
pub struct Session {
    base_url: Url,
    token: Option<String>,
}

/// Revendications utiles du jeton (payload JWT non vérifié).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenClaims {
    #[serde(default, alias = "id", alias = "_id")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

impl Session {
    /// `base_url` est normalisée avec un `/` final pour que les chemins
    /// relatifs s'y ajoutent.
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, url::ParseError> {
        let mut raw = base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        Ok(Self {
            base_url: Url::parse(&raw)?,
            token: token.filter(|t| !t.trim().is_empty()),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Décode le payload du jeton ; `None` si absent ou illisible.
    pub fn claims(&self) -> Option<TokenClaims> {
        let token = self.token.as_deref()?;
        let payload = token.split('.').nth(1)?;
        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    /// URL absolue d'une ressource servie par l'API (photos).
    pub fn resolve_asset(&self, path: &str) -> Option<String> {
        let path = path.trim();
        if path.is_empty() {
            return None;
        }
        if path.starts_with("http://") || path.starts_with("https://") {
            return Some(path.to_string());
        }
        self.base_url.join(path).ok().map(String::from)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("base_url", &self.base_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
