// FICHIER : caddie/src/remote/http.rs

use super::contract::{SubstitutionPatch, SyncCartRequest};
use super::{CartService, OptimizerService, RemoteError, RemoteResult, SessionIdentity};
use crate::caddie_error;
use crate::cart_engine::model::{Cart, CartSummary};
use crate::optimizer::request::OptimizationRequest;
use crate::optimizer::result::ApiResponse;
use crate::utils::net_client::{get_client, post_json_with_retry, send_empty, send_json};
use crate::utils::prelude::*;
use crate::utils::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use url::Url;

const ANONYMOUS_HEADER: &str = "x-anonymous-id";

/// Base d'URL normalisée (toujours terminée par `/` pour que `join` conserve le préfixe).
fn normalize_base(base_url: &str) -> CaddieResult<Url> {
    let mut raw = base_url.trim().to_string();
    if !raw.ends_with('/') {
        raw.push('/');
    }
    match Url::parse(&raw) {
        Ok(url) => Ok(url),
        Err(e) => caddie_error!(
            "ERR_CONFIG_API_URL",
            error = e,
            context = json!({ "base_url": base_url })
        ),
    }
}

fn session_headers(identity: &SessionIdentity) -> CaddieResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    let (name, value) = match identity {
        SessionIdentity::Anonymous(id) => (HeaderName::from_static(ANONYMOUS_HEADER), id.clone()),
        SessionIdentity::Token(token) => (AUTHORIZATION, format!("Bearer {}", token)),
    };
    match HeaderValue::from_str(&value) {
        Ok(v) => {
            headers.insert(name, v);
            Ok(headers)
        }
        Err(e) => caddie_error!(
            "ERR_CONFIG_SESSION_HEADER",
            error = e,
            context = json!({ "header": name.as_str() })
        ),
    }
}

/// Client du service panier REST.
#[derive(Debug, Clone)]
pub struct HttpCartService {
    base: Url,
    headers: HeaderMap,
}

impl HttpCartService {
    pub fn new(base_url: &str, identity: SessionIdentity) -> CaddieResult<Self> {
        Ok(Self {
            base: normalize_base(base_url)?,
            headers: session_headers(&identity)?,
        })
    }

    pub fn from_config(identity: SessionIdentity) -> CaddieResult<Self> {
        Self::new(&AppConfig::get().api.base_url, identity)
    }

    fn endpoint(&self, path: &str) -> RemoteResult<Url> {
        self.base
            .join(path)
            .map_err(|e| RemoteError::Transport(format!("URL invalide '{}' : {}", path, e)))
    }
}

#[async_trait]
impl CartService for HttpCartService {
    #[instrument(skip(self))]
    async fn fetch_active_cart(&self) -> RemoteResult<Option<Cart>> {
        let url = self.endpoint("carts/active")?;
        let request = get_client().get(url).headers(self.headers.clone());
        match send_json::<Cart>(request).await {
            Ok(cart) => Ok(Some(cart)),
            // Aucun panier actif : état normal
            Err(RemoteError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    #[instrument(skip(self))]
    async fn list_carts(&self) -> RemoteResult<Vec<CartSummary>> {
        let url = self.endpoint("carts")?;
        send_json(get_client().get(url).headers(self.headers.clone())).await
    }

    #[instrument(skip(self))]
    async fn create_cart(&self, name: &str) -> RemoteResult<Cart> {
        let url = self.endpoint("carts")?;
        let request = get_client()
            .post(url)
            .headers(self.headers.clone())
            .json(&json!({ "name": name }));
        send_json(request).await
    }

    #[instrument(skip(self))]
    async fn rename_cart(&self, cart_id: &str, name: &str) -> RemoteResult<Cart> {
        let url = self.endpoint(&format!("carts/{}", cart_id))?;
        let request = get_client()
            .patch(url)
            .headers(self.headers.clone())
            .json(&json!({ "name": name }));
        send_json(request).await
    }

    #[instrument(skip(self))]
    async fn delete_cart(&self, cart_id: &str) -> RemoteResult<()> {
        let url = self.endpoint(&format!("carts/{}", cart_id))?;
        send_empty(get_client().delete(url).headers(self.headers.clone())).await
    }

    #[instrument(skip(self))]
    async fn switch_cart(&self, cart_id: &str) -> RemoteResult<Cart> {
        let url = self.endpoint(&format!("carts/{}/activate", cart_id))?;
        send_json(get_client().post(url).headers(self.headers.clone())).await
    }

    #[instrument(skip(self, request), fields(cart_id = %request.cart_id, items = request.items.len()))]
    async fn sync_cart(&self, request: &SyncCartRequest) -> RemoteResult<Cart> {
        let url = self.endpoint(&format!("carts/{}/items", request.cart_id))?;
        let builder = get_client()
            .put(url)
            .headers(self.headers.clone())
            .json(request);
        send_json(builder).await
    }

    #[instrument(skip(self))]
    async fn patch_substitution(
        &self,
        item_id: &str,
        substitution_id: &str,
        patch: &SubstitutionPatch,
    ) -> RemoteResult<()> {
        let url = self.endpoint(&format!(
            "cart-items/{}/substitutions/{}",
            item_id, substitution_id
        ))?;
        let request = get_client()
            .patch(url)
            .headers(self.headers.clone())
            .json(patch);
        send_empty(request).await
    }

    #[instrument(skip(self))]
    async fn delete_substitution(&self, item_id: &str, substitution_id: &str) -> RemoteResult<()> {
        let url = self.endpoint(&format!(
            "cart-items/{}/substitutions/{}",
            item_id, substitution_id
        ))?;
        send_empty(get_client().delete(url).headers(self.headers.clone())).await
    }
}

/// Client de l'optimiseur, avec nouvelles tentatives sur erreurs transitoires.
#[derive(Debug, Clone)]
pub struct HttpOptimizer {
    endpoint: Url,
    headers: HeaderMap,
    max_retries: u32,
}

impl HttpOptimizer {
    pub fn new(base_url: &str, identity: SessionIdentity, max_retries: u32) -> CaddieResult<Self> {
        let base = normalize_base(base_url)?;
        let endpoint = match base.join("optimize") {
            Ok(url) => url,
            Err(e) => caddie_error!(
                "ERR_CONFIG_API_URL",
                error = e,
                context = json!({ "base_url": base_url })
            ),
        };
        Ok(Self {
            endpoint,
            headers: session_headers(&identity)?,
            max_retries,
        })
    }

    pub fn from_config(identity: SessionIdentity) -> CaddieResult<Self> {
        let api = &AppConfig::get().api;
        Self::new(&api.base_url, identity, api.optimizer_retries)
    }
}

#[async_trait]
impl OptimizerService for HttpOptimizer {
    #[instrument(skip(self, request), fields(groups = request.items.len()))]
    async fn optimize(&self, request: &OptimizationRequest) -> RemoteResult<ApiResponse> {
        post_json_with_retry(
            self.endpoint.as_str(),
            request,
            &self.headers,
            self.max_retries,
        )
        .await
    }
}

// --- TESTS UNITAIRES ---
