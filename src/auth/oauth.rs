use oauth2::TokenResponse;
use oauth2::basic::BasicClient;
use oauth2::reqwest::http_client;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, PkceCodeChallenge,
    RedirectUrl, RefreshToken, Scope, TokenUrl,
};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::{Duration, Instant};
use tiny_http::{Response, Server};
use url::Url;

use crate::auth::client_secret::{ClientSecret as ClientRegistration, DEFAULT_AUTH_URI};
use crate::error::{Result, SyncError};

const CALLBACK_TIMEOUT: Duration = Duration::from_secs(120);

/// Tokens returned by the oauth flow (in-memory)
pub struct Tokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<u64>,
}

/// Exchange a refresh token for a new access token using the oauth2 crate
pub fn refresh_access_token(
    client_id: &str,
    client_secret: Option<&str>,
    token_uri: &str,
    refresh_token: &str,
) -> Result<Tokens> {
    let oauth_client = build_client(client_id, client_secret, DEFAULT_AUTH_URI, token_uri)?;

    let rt = RefreshToken::new(refresh_token.to_string());
    let token = oauth_client
        .exchange_refresh_token(&rt)
        .request(http_client)
        .map_err(|e| SyncError::auth(format!("token refresh failed: {e}")))?;

    Ok(Tokens {
        access_token: token.access_token().secret().to_string(),
        refresh_token: token.refresh_token().map(|r| r.secret().to_string()),
        expires_in: token.expires_in().map(|d| d.as_secs()),
    })
}

/// Perform Authorization Code + PKCE flow. Opens system browser and captures code via tiny server.
pub fn perform_pkce_flow(
    registration: &ClientRegistration,
    redirect_uri: &str,
    scopes: &[&str],
) -> Result<Tokens> {
    let redirect = Url::parse(redirect_uri)
        .map_err(|e| SyncError::config(format!("invalid redirect_uri '{redirect_uri}': {e}")))?;
    let host = redirect
        .host_str()
        .ok_or_else(|| SyncError::config(format!("redirect_uri missing host: {redirect_uri}")))?
        .to_string();
    let port = redirect.port_or_known_default().ok_or_else(|| {
        SyncError::config(format!("redirect_uri missing/unknown port: {redirect_uri}"))
    })?;

    let bind_ip: IpAddr = match host.as_str() {
        "localhost" | "127.0.0.1" => IpAddr::V4(Ipv4Addr::LOCALHOST),
        other => other.parse::<IpAddr>().map_err(|_| {
            SyncError::config(format!(
                "redirect_uri host must be localhost/127.0.0.1 or an IP: {other}"
            ))
        })?,
    };
    let bind_addr = SocketAddr::new(bind_ip, port);

    // Listen before opening the browser so the redirect cannot arrive first.
    let server = Server::http(bind_addr).map_err(|e| {
        SyncError::auth(format!("failed to bind OAuth callback server on {bind_addr}: {e}"))
    })?;

    let oauth_client = build_client(
        &registration.client_id,
        registration.client_secret.as_deref(),
        &registration.auth_uri,
        &registration.token_uri,
    )?
    .set_redirect_uri(
        RedirectUrl::new(redirect_uri.to_string())
            .map_err(|e| SyncError::config(format!("invalid redirect_uri: {e}")))?,
    );

    let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();
    let (auth_url, csrf_token) = oauth_client
        .authorize_url(CsrfToken::new_random)
        .add_scopes(scopes.iter().map(|s| Scope::new(s.to_string())))
        .add_extra_param("access_type", "offline")
        .add_extra_param("prompt", "consent")
        .set_pkce_challenge(pkce_challenge)
        .url();

    println!("Open this URL in your browser:\n{auth_url}");
    if let Err(e) = open::that(auth_url.as_str()) {
        log::warn!("could not open browser automatically: {e}");
    }

    let code = wait_for_code(&server, &host, port, csrf_token.secret())?;

    let token = oauth_client
        .exchange_code(AuthorizationCode::new(code))
        .set_pkce_verifier(pkce_verifier)
        .request(http_client)
        .map_err(|e| {
            log::debug!("token exchange error: {e:#?}");
            SyncError::auth(format!("token exchange failed: {e}"))
        })?;

    Ok(Tokens {
        access_token: token.access_token().secret().to_string(),
        refresh_token: token.refresh_token().map(|r| r.secret().to_string()),
        expires_in: token.expires_in().map(|d| d.as_secs()),
    })
}

fn build_client(
    client_id: &str,
    client_secret: Option<&str>,
    auth_uri: &str,
    token_uri: &str,
) -> Result<BasicClient> {
    let auth_url = AuthUrl::new(auth_uri.to_string())
        .map_err(|e| SyncError::auth(format!("invalid auth uri '{auth_uri}': {e}")))?;
    let token_url = TokenUrl::new(token_uri.to_string())
        .map_err(|e| SyncError::auth(format!("invalid token uri '{token_uri}': {e}")))?;
    Ok(BasicClient::new(
        ClientId::new(client_id.to_string()),
        client_secret.map(|s| ClientSecret::new(s.to_string())),
        auth_url,
        Some(token_url),
    ))
}

fn wait_for_code(server: &Server, host: &str, port: u16, expected_state: &str) -> Result<String> {
    let wait_until = Instant::now() + CALLBACK_TIMEOUT;

    while Instant::now() < wait_until {
        let Ok(maybe_request) = server.recv_timeout(Duration::from_millis(500)) else {
            continue;
        };
        let Some(request) = maybe_request else {
            continue;
        };

        // request.url() is a path+query like "/callback?code=...&state=..."
        let full = format!("http://{}:{}{}", host, port, request.url());
        match callback_code(&full, expected_state) {
            Some(code) => {
                let _ = request.respond(Response::from_string(
                    "Authorization received. You can close this tab.",
                ));
                return Ok(code);
            }
            None => {
                let _ = request.respond(Response::from_string(
                    "No valid code found in redirect. You can close this tab.",
                ));
            }
        }
    }

    Err(SyncError::auth("no authorization code received within timeout"))
}

/// Code from a redirect URL, if its `state` matches.
fn callback_code(url: &str, expected_state: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let mut code = None;
    let mut state = None;
    for (k, v) in parsed.query_pairs() {
        match k.as_ref() {
            "code" => code = Some(v.into_owned()),
            "state" => state = Some(v.into_owned()),
            _ => {}
        }
    }
    if state.as_deref() != Some(expected_state) {
        return None;
    }
    code
}
