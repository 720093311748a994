use anyhow::Result;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::advice::{Metric, PvPStatSnapshot};
use crate::config::AdvisorConfig;
use crate::error::AdvisorError;
use crate::http_client::{StatusError, fetch_json, http_client};
use crate::identity::PlayerIdentity;

const API_KEY_HEADER: &str = "X-API-Key";
const PROFILES_COMPONENT: &str = "100";
const PRIMARY_CHARACTER: &str = "0";
const SUCCESS_CODE: i64 = 1;

/// The two lookups the advisor needs for one player.
pub trait StatsSource {
    fn fetch_display_name(&self, identity: &PlayerIdentity) -> Result<String, AdvisorError>;
    fn fetch_pvp_stats(&self, identity: &PlayerIdentity) -> Result<PvPStatSnapshot, AdvisorError>;
}

/// Bungie.net Platform API client. Every request carries the configured key.
pub struct BungieClient {
    http: Client,
    api_key: String,
    api_base: String,
}

impl BungieClient {
    pub fn new(config: &AdvisorConfig) -> Result<Self> {
        Ok(Self {
            http: http_client(config.timeout)?,
            api_key: config.api_key.clone(),
            api_base: config.api_base.clone(),
        })
    }

    pub fn profile_url(&self, identity: &PlayerIdentity) -> String {
        format!(
            "{}/Destiny2/{}/Profile/{}/?components={PROFILES_COMPONENT}",
            self.api_base,
            identity.platform_type(),
            identity.membership_id()
        )
    }

    pub fn stats_url(&self, identity: &PlayerIdentity) -> String {
        format!(
            "{}/Destiny2/{}/Account/{}/Character/{PRIMARY_CHARACTER}/Stats/",
            self.api_base,
            identity.platform_type(),
            identity.membership_id()
        )
    }

    fn get(&self, url: &str) -> Result<String> {
        debug!(%url, "bungie request");
        fetch_json(&self.http, url, &[(API_KEY_HEADER, self.api_key.as_str())])
    }
}

impl StatsSource for BungieClient {
    fn fetch_display_name(&self, identity: &PlayerIdentity) -> Result<String, AdvisorError> {
        let body = self.get(&self.profile_url(identity)).map_err(|err| {
            warn!(error = %format!("{err:#}"), "profile request failed");
            AdvisorError::IdentityLookupFailed(transport_message(&err))
        })?;
        parse_display_name_json(&body)
    }

    fn fetch_pvp_stats(&self, identity: &PlayerIdentity) -> Result<PvPStatSnapshot, AdvisorError> {
        let body = self.get(&self.stats_url(identity)).map_err(|err| {
            warn!(error = %format!("{err:#}"), "stats request failed");
            AdvisorError::StatsLookupFailed(transport_message(&err))
        })?;
        parse_pvp_stats_json(&body)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Envelope {
    #[serde(default)]
    error_code: Option<i64>,
    #[serde(default)]
    error_status: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl Envelope {
    fn failure(&self) -> Option<String> {
        let code = self.error_code?;
        if code == SUCCESS_CODE {
            return None;
        }
        let status = self.error_status.as_deref().unwrap_or("UnknownError");
        Some(match self.message.as_deref().and_then(non_empty) {
            Some(message) => format!("{status}: {message}"),
            None => format!("{status} (code {code})"),
        })
    }
}

/// Extracts `Response.profile.data.userInfo.bungieGlobalDisplayName`.
pub fn parse_display_name_json(raw: &str) -> Result<String, AdvisorError> {
    let root = decode(raw).map_err(AdvisorError::IdentityLookupFailed)?;
    check_envelope(&root).map_err(AdvisorError::IdentityLookupFailed)?;

    let name = walk(
        &root,
        &["Response", "profile", "data", "userInfo", "bungieGlobalDisplayName"],
    )
    .ok_or_else(|| {
        AdvisorError::IdentityLookupFailed("profile response has no display name".to_string())
    })?;
    let name = name.as_str().ok_or_else(|| {
        AdvisorError::IdentityLookupFailed(format!("display name is not a string: {name}"))
    })?;
    non_empty(name)
        .map(str::to_string)
        .ok_or_else(|| AdvisorError::IdentityLookupFailed("display name is empty".to_string()))
}

/// Extracts the four `Response.allPvP.allTime.<metric>.basic.value` leaves.
pub fn parse_pvp_stats_json(raw: &str) -> Result<PvPStatSnapshot, AdvisorError> {
    let root = decode(raw).map_err(AdvisorError::StatsLookupFailed)?;
    check_envelope(&root).map_err(AdvisorError::StatsLookupFailed)?;

    let all_time = walk(&root, &["Response", "allPvP", "allTime"]).ok_or_else(|| {
        AdvisorError::MalformedStatsPayload("no all-time PvP stats in response".to_string())
    })?;

    Ok(PvPStatSnapshot {
        average_kill_distance: metric_value(all_time, Metric::KillDistance)?,
        average_lifespan_seconds: metric_value(all_time, Metric::Lifespan)?,
        kills_deaths_ratio: metric_value(all_time, Metric::KillsDeaths)?,
        win_loss_ratio: metric_value(all_time, Metric::WinLoss)?,
    })
}

fn metric_value(all_time: &Value, metric: Metric) -> Result<f64, AdvisorError> {
    let key = metric.stat_key();
    let leaf = walk(all_time, &[key, "basic", "value"])
        .ok_or_else(|| AdvisorError::MalformedStatsPayload(format!("missing `{key}`")))?;
    leaf.as_f64()
        .filter(|v| v.is_finite())
        .ok_or_else(|| {
            AdvisorError::MalformedStatsPayload(format!("`{key}` is not a number: {leaf}"))
        })
}

fn decode(raw: &str) -> Result<Value, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Err("empty response body".to_string());
    }
    serde_json::from_str(trimmed).map_err(|err| format!("invalid json: {err}"))
}

fn check_envelope(root: &Value) -> Result<(), String> {
    let envelope = Envelope::deserialize(root).map_err(|err| format!("bad envelope: {err}"))?;
    match envelope.failure() {
        Some(message) => Err(message),
        None => Ok(()),
    }
}

fn walk<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |node, key| node.get(*key))
}

fn transport_message(err: &anyhow::Error) -> String {
    if let Some(status) = err.downcast_ref::<StatusError>() {
        if let Some(message) = decode(&status.body)
            .ok()
            .and_then(|root| check_envelope(&root).err())
        {
            return format!("http {}: {message}", status.status);
        }
    }
    if let Some(req) = err.chain().find_map(|e| e.downcast_ref::<reqwest::Error>()) {
        if req.is_timeout() {
            return "request timed out".to_string();
        }
        if req.is_connect() {
            return "could not connect to Bungie.net".to_string();
        }
    }
    err.to_string()
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    use super::{BungieClient, Envelope, StatsSource, walk};
    use crate::config::AdvisorConfig;
    use crate::error::AdvisorError;
    use crate::identity::{PlayerIdentity, resolve_profile_url};

    /// One-connection HTTP server; hands the request head back over `rx`.
    fn stub_server(status_line: &'static str, body: &'static str) -> (String, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub");
        let base = format!("http://{}/Platform", listener.local_addr().expect("stub addr"));
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept");
            let _ = tx.send(read_head(&mut stream));
            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes());
        });
        (base, rx)
    }

    fn read_head(stream: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = stream.read(&mut chunk).expect("read request");
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn client_for(base: &str, timeout_secs: &str) -> BungieClient {
        let cfg = AdvisorConfig::from_lookup(|key| match key {
            "BUNGIE_API_KEY" => Some("KEY123".to_string()),
            "BUNGIE_API_BASE" => Some(base.to_string()),
            "BUNGIE_TIMEOUT_SECS" => Some(timeout_secs.to_string()),
            _ => None,
        })
        .expect("config");
        BungieClient::new(&cfg).expect("client")
    }

    fn player() -> PlayerIdentity {
        resolve_profile_url("User/Profile/3/42").expect("id")
    }

    fn request_line(head: &str) -> &str {
        head.lines().next().unwrap_or_default()
    }

    #[test]
    fn stats_request_sends_key_and_maps_503() {
        let (base, rx) = stub_server("503 Service Unavailable", "down");
        let err = client_for(&base, "5")
            .fetch_pvp_stats(&player())
            .expect_err("503 must fail");
        assert_eq!(
            err,
            AdvisorError::StatsLookupFailed("http 503 Service Unavailable: down".to_string())
        );

        let head = rx.recv().expect("request head");
        assert_eq!(
            request_line(&head),
            "GET /Platform/Destiny2/3/Account/42/Character/0/Stats/ HTTP/1.1"
        );
        assert!(head.to_ascii_lowercase().contains("x-api-key: key123"));
    }

    #[test]
    fn profile_request_surfaces_error_envelope() {
        let (base, rx) = stub_server(
            "503 Service Unavailable",
            r#"{"ErrorCode":5,"ErrorStatus":"SystemDisabled","Message":"Down for maintenance."}"#,
        );
        let err = client_for(&base, "5")
            .fetch_display_name(&player())
            .expect_err("503 must fail");
        assert_eq!(
            err,
            AdvisorError::IdentityLookupFailed(
                "http 503 Service Unavailable: SystemDisabled: Down for maintenance.".to_string()
            )
        );

        let head = rx.recv().expect("request head");
        assert_eq!(
            request_line(&head),
            "GET /Platform/Destiny2/3/Profile/42/?components=100 HTTP/1.1"
        );
        assert!(head.to_ascii_lowercase().contains("x-api-key: key123"));
    }

    #[test]
    fn profile_request_returns_display_name() {
        let (base, _rx) = stub_server(
            "200 OK",
            r#"{"Response":{"profile":{"data":{"userInfo":{"bungieGlobalDisplayName":"Guardian"}}}},"ErrorCode":1,"ErrorStatus":"Success","Message":"Ok"}"#,
        );
        let name = client_for(&base, "5")
            .fetch_display_name(&player())
            .expect("display name");
        assert_eq!(name, "Guardian");
    }

    #[test]
    fn silent_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub");
        let base = format!("http://{}/Platform", listener.local_addr().expect("stub addr"));
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept");
            read_head(&mut stream);
            thread::sleep(Duration::from_secs(5));
        });

        let err = client_for(&base, "1")
            .fetch_pvp_stats(&player())
            .expect_err("no answer");
        assert_eq!(err, AdvisorError::StatsLookupFailed("request timed out".to_string()));
    }

    #[test]
    fn refused_connection_is_a_lookup_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let base = format!("http://{}/Platform", listener.local_addr().expect("addr"));
        drop(listener);

        let err = client_for(&base, "5")
            .fetch_display_name(&player())
            .expect_err("nothing listening");
        assert_eq!(
            err,
            AdvisorError::IdentityLookupFailed("could not connect to Bungie.net".to_string())
        );
    }

    #[test]
    fn endpoints_interpolate_identity() {
        let cfg = AdvisorConfig::from_lookup(|key| match key {
            "BUNGIE_API_KEY" => Some("k".to_string()),
            "BUNGIE_API_BASE" => Some("https://example.test/Platform".to_string()),
            _ => None,
        })
        .expect("config");
        let client = BungieClient::new(&cfg).expect("client");
        let id = resolve_profile_url("User/Profile/3/4611686018467896383").expect("id");
        assert_eq!(
            client.profile_url(&id),
            "https://example.test/Platform/Destiny2/3/Profile/4611686018467896383/?components=100"
        );
        assert_eq!(
            client.stats_url(&id),
            "https://example.test/Platform/Destiny2/3/Account/4611686018467896383/Character/0/Stats/"
        );
    }

    #[test]
    fn envelope_success_is_not_a_failure() {
        let ok = Envelope {
            error_code: Some(1),
            error_status: Some("Success".to_string()),
            message: Some("Ok".to_string()),
        };
        assert!(ok.failure().is_none());

        let bad = Envelope {
            error_code: Some(217),
            error_status: Some("UserCannotResolveCentralAccount".to_string()),
            message: Some("Cannot find account".to_string()),
        };
        assert_eq!(
            bad.failure().as_deref(),
            Some("UserCannotResolveCentralAccount: Cannot find account")
        );
    }

    #[test]
    fn walk_stops_at_missing_key() {
        let value = serde_json::json!({"a": {"b": 1}});
        assert!(walk(&value, &["a", "b"]).is_some());
        assert!(walk(&value, &["a", "c"]).is_none());
    }
}
