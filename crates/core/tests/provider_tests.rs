// ═══════════════════════════════════════════════════════════════════
// Provider Tests — Registry, open.er-api, Frankfurter, Yahoo spark
// ═══════════════════════════════════════════════════════════════════

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use pnl_monitor_core::errors::CoreError;
use pnl_monitor_core::models::settings::{RateSourceKind, Settings};
use pnl_monitor_core::providers::frankfurter::FrankfurterProvider;
use pnl_monitor_core::providers::open_er_api::OpenErApiProvider;
use pnl_monitor_core::providers::registry::ProviderRegistry;
use pnl_monitor_core::providers::traits::{CloseSeries, MarketDataSource, RateProvider};
use pnl_monitor_core::providers::yahoo_finance::YahooFinanceProvider;

// ═══════════════════════════════════════════════════════════════════
// Test Helpers — local HTTP server, mock providers
// ═══════════════════════════════════════════════════════════════════

const TIMEOUT: Duration = Duration::from_secs(5);

/// reqwest picks up proxy settings from the environment at build time;
/// requests to the local server must go direct.
fn clear_proxy_env() {
    for var in ["HTTP_PROXY", "http_proxy", "HTTPS_PROXY", "https_proxy", "ALL_PROXY", "all_proxy"] {
        std::env::remove_var(var);
    }
}

/// Serve exactly one HTTP response on a random local port.
/// Returns the base URL and a handle yielding the raw request line.
async fn serve_once(
    status: u16,
    body: &'static str,
) -> (String, tokio::task::JoinHandle<String>) {
    clear_proxy_env();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = vec![0u8; 8192];
        let n = socket.read(&mut buf).await.unwrap();
        let request = String::from_utf8_lossy(&buf[..n]).to_string();
        let reason = if status == 200 { "OK" } else { "Error" };
        let response = format!(
            "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        request.lines().next().unwrap_or_default().to_string()
    });
    (format!("http://{addr}"), handle)
}

/// A local port with nothing listening on it.
async fn closed_port_url() -> String {
    clear_proxy_env();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

/// Accepts a connection and never answers.
async fn silent_server_url() -> String {
    clear_proxy_env();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (_socket, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;
    });
    format!("http://{addr}")
}

struct FixedRate {
    name: String,
    rate: f64,
}

#[async_trait]
impl RateProvider for FixedRate {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get_rate(&self, _base: &str, _quote: &str) -> Result<f64, CoreError> {
        Ok(self.rate)
    }
}

struct NoMarketData;

#[async_trait]
impl MarketDataSource for NoMarketData {
    fn name(&self) -> &str {
        "NoMarketData"
    }

    async fn intraday_closes(
        &self,
        _tickers: &[String],
    ) -> Result<HashMap<String, CloseSeries>, CoreError> {
        Ok(HashMap::new())
    }

    async fn daily_close(&self, _ticker: &str) -> Result<Option<f64>, CoreError> {
        Ok(None)
    }

    async fn latest_price(&self, ticker: &str) -> Result<f64, CoreError> {
        Err(CoreError::Api {
            provider: "NoMarketData".into(),
            message: format!("no quote for {ticker}"),
        })
    }
}

// ═══════════════════════════════════════════════════════════════════
// ProviderRegistry
// ═══════════════════════════════════════════════════════════════════

mod registry {
    use super::*;

    #[test]
    fn new_creates_empty_registry() {
        let registry = ProviderRegistry::new();
        assert!(registry.rate_providers().is_empty());
        assert!(registry.market_data().is_none());
    }

    #[test]
    fn default_creates_empty_registry() {
        let registry = ProviderRegistry::default();
        assert!(registry.rate_provider_names().is_empty());
    }

    #[test]
    fn rate_providers_keep_registration_order() {
        let mut registry = ProviderRegistry::new();
        registry.register_rate_provider(Box::new(FixedRate { name: "first".into(), rate: 7.1 }));
        registry.register_rate_provider(Box::new(FixedRate { name: "second".into(), rate: 7.2 }));
        assert_eq!(registry.rate_provider_names(), vec!["first", "second"]);
    }

    #[test]
    fn set_market_data_replaces_source() {
        let mut registry = ProviderRegistry::new();
        registry.set_market_data(Box::new(NoMarketData));
        assert_eq!(registry.market_data().unwrap().name(), "NoMarketData");
    }

    #[test]
    fn defaults_follow_configured_source_order() {
        let mut settings = Settings::default();
        settings.rates.sources = vec![RateSourceKind::Frankfurter, RateSourceKind::OpenErApi];
        let registry = ProviderRegistry::new_with_defaults(&settings);
        assert_eq!(registry.rate_provider_names(), vec!["Frankfurter", "open.er-api"]);
        assert_eq!(registry.market_data().unwrap().name(), "Yahoo Finance");
    }

    #[test]
    fn defaults_with_no_rate_sources() {
        let mut settings = Settings::default();
        settings.rates.sources.clear();
        let registry = ProviderRegistry::new_with_defaults(&settings);
        assert!(registry.rate_providers().is_empty());
    }
}

// ═══════════════════════════════════════════════════════════════════
// open.er-api
// ═══════════════════════════════════════════════════════════════════

mod open_er_api {
    use super::*;

    #[tokio::test]
    async fn parses_cny_rate() {
        let (url, request) = serve_once(
            200,
            r#"{"result":"success","base_code":"USD","rates":{"USD":1,"CNY":7.2345,"EUR":0.92}}"#,
        )
        .await;
        let provider = OpenErApiProvider::with_base_url(url, TIMEOUT);

        let rate = provider.get_rate("usd", "cny").await.unwrap();
        assert!((rate - 7.2345).abs() < 1e-12);
        assert!(request.await.unwrap().starts_with("GET /v6/latest/USD "));
    }

    #[tokio::test]
    async fn same_currency_is_one_without_request() {
        let provider = OpenErApiProvider::with_base_url(closed_port_url().await, TIMEOUT);
        assert_eq!(provider.get_rate("USD", "usd").await.unwrap(), 1.0);
    }

    #[tokio::test]
    async fn non_success_status_is_api_error() {
        let (url, _) = serve_once(503, r#"{"result":"error"}"#).await;
        let provider = OpenErApiProvider::with_base_url(url, TIMEOUT);

        let err = provider.get_rate("USD", "CNY").await.unwrap_err();
        assert!(matches!(err, CoreError::Api { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn error_result_is_api_error() {
        let (url, _) = serve_once(200, r#"{"result":"error","error-type":"unsupported-code"}"#).await;
        let provider = OpenErApiProvider::with_base_url(url, TIMEOUT);

        let err = provider.get_rate("USD", "CNY").await.unwrap_err();
        assert!(err.to_string().contains("unsupported-code"));
    }

    #[tokio::test]
    async fn missing_currency_is_parse_error() {
        let (url, _) = serve_once(200, r#"{"result":"success","rates":{"EUR":0.92}}"#).await;
        let provider = OpenErApiProvider::with_base_url(url, TIMEOUT);

        let err = provider.get_rate("USD", "CNY").await.unwrap_err();
        assert!(matches!(err, CoreError::Parse { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn malformed_body_is_parse_error() {
        let (url, _) = serve_once(200, "<html>maintenance</html>").await;
        let provider = OpenErApiProvider::with_base_url(url, TIMEOUT);

        let err = provider.get_rate("USD", "CNY").await.unwrap_err();
        assert!(matches!(err, CoreError::Parse { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn zero_rate_is_rejected() {
        let (url, _) = serve_once(200, r#"{"result":"success","rates":{"CNY":0}}"#).await;
        let provider = OpenErApiProvider::with_base_url(url, TIMEOUT);

        assert!(provider.get_rate("USD", "CNY").await.is_err());
    }

    #[tokio::test]
    async fn connection_refused_is_network_error() {
        let provider = OpenErApiProvider::with_base_url(closed_port_url().await, TIMEOUT);

        let err = provider.get_rate("USD", "CNY").await.unwrap_err();
        assert!(matches!(err, CoreError::Network(_)), "got {err:?}");
        assert!(err.is_unreachable());
    }

    #[tokio::test]
    async fn slow_upstream_is_timeout() {
        let provider = OpenErApiProvider::with_base_url(
            silent_server_url().await,
            Duration::from_millis(300),
        );

        let err = provider.get_rate("USD", "CNY").await.unwrap_err();
        assert!(matches!(err, CoreError::Timeout(_)), "got {err:?}");
    }
}

// ═══════════════════════════════════════════════════════════════════
// Frankfurter
// ═══════════════════════════════════════════════════════════════════

mod frankfurter {
    use super::*;

    #[tokio::test]
    async fn parses_rate_and_sends_query() {
        let (url, request) = serve_once(
            200,
            r#"{"amount":1.0,"base":"USD","date":"2025-01-15","rates":{"CNY":7.3312}}"#,
        )
        .await;
        let provider = FrankfurterProvider::with_base_url(url, TIMEOUT);

        let rate = provider.get_rate("USD", "CNY").await.unwrap();
        assert!((rate - 7.3312).abs() < 1e-12);

        let line = request.await.unwrap();
        assert!(line.starts_with("GET /latest?"), "request line: {line}");
        assert!(line.contains("base=USD"));
        assert!(line.contains("symbols=CNY"));
    }

    #[tokio::test]
    async fn unknown_currency_404() {
        let (url, _) = serve_once(404, r#"{"message":"not found"}"#).await;
        let provider = FrankfurterProvider::with_base_url(url, TIMEOUT);

        let err = provider.get_rate("USD", "XXX").await.unwrap_err();
        assert!(matches!(err, CoreError::Api { .. }), "got {err:?}");
        assert!(err.to_string().contains("404"));
    }

    #[tokio::test]
    async fn missing_rates_table_is_parse_error() {
        let (url, _) = serve_once(200, r#"{"amount":1.0}"#).await;
        let provider = FrankfurterProvider::with_base_url(url, TIMEOUT);

        let err = provider.get_rate("USD", "CNY").await.unwrap_err();
        assert!(matches!(err, CoreError::Parse { .. }), "got {err:?}");
    }

    #[test]
    fn provider_name() {
        let provider = FrankfurterProvider::new(TIMEOUT);
        assert_eq!(provider.name(), "Frankfurter");
    }
}

// ═══════════════════════════════════════════════════════════════════
// Yahoo Finance — batch spark endpoint
// ═══════════════════════════════════════════════════════════════════

mod yahoo_spark {
    use super::*;

    const SPARK_BODY: &str = r#"{"spark":{"result":[
        {"symbol":"AAA","response":[{"meta":{"symbol":"AAA"},"timestamp":[1,2,3],
            "indicators":{"quote":[{"close":[2.5,3.0,null]}]}}]},
        {"symbol":"BBB","response":[{"meta":{"symbol":"BBB"},"timestamp":[1,2],
            "indicators":{"quote":[{"close":[null,null]}]}}]}
    ],"error":null}}"#;

    fn provider(url: String) -> YahooFinanceProvider {
        YahooFinanceProvider::new(TIMEOUT)
            .unwrap()
            .with_spark_base_url(url)
    }

    #[tokio::test]
    async fn parses_close_series_per_symbol() {
        let (url, request) = serve_once(200, SPARK_BODY).await;
        let yahoo = provider(url);

        let tickers = vec!["AAA".to_string(), "BBB".to_string(), "ZZZ".to_string()];
        let series = yahoo.intraday_closes(&tickers).await.unwrap();

        assert_eq!(series["AAA"], vec![Some(2.5), Some(3.0), None]);
        assert_eq!(series["BBB"], vec![None, None]);
        assert!(!series.contains_key("ZZZ"));

        let line = request.await.unwrap();
        assert!(line.starts_with("GET /v7/finance/spark?"), "request line: {line}");
        assert!(line.contains("interval=1m"));
        assert!(line.contains("range=1d"));
    }

    #[tokio::test]
    async fn null_series_does_not_drop_other_symbols() {
        let (url, _) = serve_once(
            200,
            r#"{"spark":{"result":[
                {"symbol":"AAA","response":[{"indicators":{"quote":[{"close":[2.5,3.0]}]}}]},
                {"symbol":"BBB","response":[{"indicators":{"quote":[{"close":null}]}}]},
                {"symbol":"CCC","response":null}
            ],"error":null}}"#,
        )
        .await;
        let yahoo = provider(url);

        let tickers = vec!["AAA".to_string(), "BBB".to_string(), "CCC".to_string()];
        let series = yahoo.intraday_closes(&tickers).await.unwrap();

        assert_eq!(series["AAA"], vec![Some(2.5), Some(3.0)]);
        assert!(series["BBB"].is_empty());
        assert!(series["CCC"].is_empty());
    }

    #[tokio::test]
    async fn malformed_entry_skipped() {
        let (url, _) = serve_once(
            200,
            r#"{"spark":{"result":[
                {"symbol":"AAA","response":[{"indicators":{"quote":[{"close":[4.0]}]}}]},
                {"symbol":42,"response":"garbage"}
            ],"error":null}}"#,
        )
        .await;
        let yahoo = provider(url);

        let series = yahoo
            .intraday_closes(&["AAA".to_string(), "BBB".to_string()])
            .await
            .unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series["AAA"], vec![Some(4.0)]);
    }

    #[tokio::test]
    async fn empty_ticker_list_makes_no_request() {
        let yahoo = provider(closed_port_url().await);
        let series = yahoo.intraday_closes(&[]).await.unwrap();
        assert!(series.is_empty());
    }

    #[tokio::test]
    async fn spark_error_payload_is_api_error() {
        let (url, _) = serve_once(
            200,
            r#"{"spark":{"result":null,"error":{"code":"Bad Request","description":"Missing symbols"}}}"#,
        )
        .await;
        let yahoo = provider(url);

        let err = yahoo.intraday_closes(&["AAA".to_string()]).await.unwrap_err();
        assert!(err.to_string().contains("Missing symbols"));
    }

    #[tokio::test]
    async fn rate_limited_is_api_error() {
        let (url, _) = serve_once(429, "Too Many Requests").await;
        let yahoo = provider(url);

        let err = yahoo.intraday_closes(&["AAA".to_string()]).await.unwrap_err();
        assert!(matches!(err, CoreError::Api { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn unreachable_host_is_network_error() {
        let yahoo = provider(closed_port_url().await);

        let err = yahoo.intraday_closes(&["AAA".to_string()]).await.unwrap_err();
        assert!(err.is_unreachable(), "got {err:?}");
    }
}
