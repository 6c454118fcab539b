// FICHIER : caddie/src/utils/net.rs

use crate::remote::RemoteError;
use crate::utils::config::AppConfig;
use reqwest::{header::HeaderMap, Client, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Singleton : Le client HTTP est réutilisé pour bénéficier du pool de connexions.
static GLOBAL_CLIENT: OnceLock<Client> = OnceLock::new();

/// Récupère l'instance unique du client HTTP global.
pub fn get_client() -> &'static Client {
    GLOBAL_CLIENT.get_or_init(|| {
        let timeout = AppConfig::try_get()
            .map(|c| c.api.timeout_secs)
            .unwrap_or(30);
        Client::builder()
            .timeout(Duration::from_secs(timeout))
            .pool_idle_timeout(Duration::from_secs(90))
            .user_agent(concat!("Caddie-Core/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("❌ CRITICAL: Impossible d'initialiser le client HTTP global")
    })
}

/// Envoie la requête et désérialise un corps JSON en cas de succès.
/// Les réponses non-2xx sont décodées en `RemoteError` (genre + message).
pub async fn send_json<R: DeserializeOwned>(request: RequestBuilder) -> Result<R, RemoteError> {
    let response = request.send().await?;
    let status = response.status();

    if status.is_success() {
        return response
            .json::<R>()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()));
    }

    let body = response.text().await.unwrap_or_default();
    Err(RemoteError::from_status(status.as_u16(), &body))
}

/// Variante pour les routes qui ne renvoient rien d'utile (204, DELETE...).
pub async fn send_empty(request: RequestBuilder) -> Result<(), RemoteError> {
    let response = request.send().await?;
    let status = response.status();

    if status.is_success() {
        return Ok(());
    }

    let body = response.text().await.unwrap_or_default();
    Err(RemoteError::from_status(status.as_u16(), &body))
}

/// Envoie une requête POST JSON avec en-têtes de session et stratégie de Retry.
/// Seules les erreurs transitoires (5xx, transport, 429) sont retentées.
#[instrument(skip(body, headers), fields(url = %url))]
pub async fn post_json_with_retry<T: Serialize, R: DeserializeOwned>(
    url: &str,
    body: &T,
    headers: &HeaderMap,
    max_retries: u32,
) -> Result<R, RemoteError> {
    let client = get_client();
    let max_retries = max_retries.max(1);
    let mut attempt = 0;
    let mut delay = Duration::from_millis(250);

    loop {
        attempt += 1;
        debug!("Requête POST {}/{} vers {}", attempt, max_retries, url);

        let request = client.post(url).headers(headers.clone()).json(body);
        match send_json::<R>(request).await {
            Ok(data) => return Ok(data),
            Err(e) if e.is_transient() && attempt < max_retries => {
                warn!(
                    "Échec transitoire (Tentative {}/{}) sur {} : {}",
                    attempt, max_retries, url, e
                );
            }
            Err(e) => return Err(e),
        }

        // Backoff exponentiel avant la prochaine tentative
        tokio::time::sleep(delay).await;
        delay = std::cmp::min(delay * 2, Duration::from_secs(5));
    }
}

// --- TESTS UNITAIRES ---
