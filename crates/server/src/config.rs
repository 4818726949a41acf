use abraflexi_core::policy::parse_truthy;
use abraflexi_core::AccessGate;
use abraflexi_sdk::{ClientConfig, Credentials};
use anyhow::{bail, Context, Result};
use clap::Parser;
use std::time::Duration;
use url::Url;

/// Command line / environment configuration
#[derive(Parser, Debug, Clone)]
#[command(name = "abraflexi-mcp", version)]
#[command(about = "MCP server exposing the AbraFlexi ERP REST API as tools", long_about = None)]
pub struct Args {
    /// AbraFlexi server URL (e.g. https://demo.flexibee.eu:5434)
    #[arg(long, env = "ABRAFLEXI_URL")]
    pub url: Option<String>,

    /// Company (database) identifier
    #[arg(long, env = "ABRAFLEXI_COMPANY")]
    pub company: Option<String>,

    /// Login name
    #[arg(long, env = "ABRAFLEXI_LOGIN")]
    pub login: Option<String>,

    /// Password
    #[arg(long, env = "ABRAFLEXI_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Existing session id, used instead of login and password
    #[arg(long = "auth-session-id", env = "ABRAFLEXI_AUTHSESSID", hide_env_values = true)]
    pub auth_session_id: Option<String>,

    /// Request timeout in seconds
    #[arg(long, env = "ABRAFLEXI_TIMEOUT", default_value_t = 300)]
    pub timeout: u64,

    /// Block create/update/delete tools (true/1/yes)
    #[arg(long = "read-only", env = "READ_ONLY", default_value = "true")]
    pub read_only: String,

    /// Transport: stdio or streamable-http
    #[arg(long, env = "ABRAFLEXI_MCP_TRANSPORT", default_value = "stdio")]
    pub transport: String,

    /// Host to bind to (streamable-http)
    #[arg(long, env = "ABRAFLEXI_MCP_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on (streamable-http)
    #[arg(long, env = "ABRAFLEXI_MCP_PORT", default_value_t = 8000)]
    pub port: u16,

    /// Serve HTTP without sessions (true/1/yes)
    #[arg(long, env = "ABRAFLEXI_MCP_STATELESS_HTTP", default_value = "false")]
    pub stateless: String,

    /// Seconds an HTTP session may stay idle before it is dropped
    #[arg(long = "session-ttl", env = "ABRAFLEXI_MCP_SESSION_TTL", default_value_t = 3600)]
    pub session_ttl: u64,

    /// HTTP authentication type; only no-auth is supported
    #[arg(long = "auth-type", env = "AUTH_TYPE")]
    pub auth_type: Option<String>,

    /// Enable debug logging (true/1/yes)
    #[arg(long, env = "DEBUG", default_value = "false")]
    pub debug: String,

    /// Check connectivity to AbraFlexi and exit
    #[arg(long)]
    pub check: bool,
}

impl Args {
    pub fn debug_enabled(&self) -> bool {
        parse_truthy(&self.debug)
    }
}

/// Validated server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub client: ClientConfig,
    pub gate: AccessGate,
    pub transport: TransportConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportConfig {
    Stdio,
    StreamableHttp(HttpConfig),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
    pub stateless: bool,
    pub session_ttl: Duration,
}

impl HttpConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl ServerConfig {
    pub fn from_args(args: &Args) -> Result<Self> {
        let url = required(args.url.as_deref(), "ABRAFLEXI_URL")?;
        let base_url =
            Url::parse(url).with_context(|| format!("ABRAFLEXI_URL is not a valid URL: {}", url))?;
        if base_url.scheme() != "http" && base_url.scheme() != "https" {
            bail!("ABRAFLEXI_URL must use http or https, got {}", base_url.scheme());
        }
        let company = required(args.company.as_deref(), "ABRAFLEXI_COMPANY")?;

        let mut client = ClientConfig::new(base_url, company, credentials(args)?);
        if args.timeout == 0 {
            bail!("ABRAFLEXI_TIMEOUT must be a positive number of seconds");
        }
        client.timeout = Duration::from_secs(args.timeout);

        Ok(Self {
            client,
            gate: AccessGate::new(parse_truthy(&args.read_only)),
            transport: transport(args)?,
        })
    }

    /// Log the effective configuration without secrets.
    pub fn log_summary(&self) {
        tracing::info!(
            url = %self.client.base_url,
            company = %self.client.company,
            auth = %self.client.credentials.describe(),
            timeout_secs = self.client.timeout.as_secs(),
            read_only = self.gate.is_read_only(),
            "AbraFlexi connection configured"
        );
        match &self.transport {
            TransportConfig::Stdio => tracing::info!("Transport: stdio"),
            TransportConfig::StreamableHttp(http) => tracing::info!(
                addr = %http.addr(),
                stateless = http.stateless,
                session_ttl_secs = http.session_ttl.as_secs(),
                "Transport: streamable-http"
            ),
        }
    }
}

fn required<'a>(value: Option<&'a str>, name: &str) -> Result<&'a str> {
    match value.map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => bail!("{} is required", name),
    }
}

/// A session id wins over login and password.
fn credentials(args: &Args) -> Result<Credentials> {
    let present = |v: &Option<String>| v.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string);

    if let Some(session) = present(&args.auth_session_id) {
        return Ok(Credentials::Session(session));
    }
    match (present(&args.login), args.password.clone().filter(|p| !p.is_empty())) {
        (Some(login), Some(password)) => Ok(Credentials::Basic { login, password }),
        _ => bail!(
            "Either ABRAFLEXI_AUTHSESSID or both ABRAFLEXI_LOGIN and ABRAFLEXI_PASSWORD must be set"
        ),
    }
}

fn transport(args: &Args) -> Result<TransportConfig> {
    match args.transport.trim().to_ascii_lowercase().as_str() {
        "stdio" => Ok(TransportConfig::Stdio),
        "streamable-http" => {
            let auth_type = args.auth_type.as_deref().map(str::trim).unwrap_or_default();
            if !auth_type.eq_ignore_ascii_case("no-auth") {
                bail!("AUTH_TYPE must be set to no-auth for the streamable-http transport");
            }
            if args.session_ttl == 0 {
                bail!("ABRAFLEXI_MCP_SESSION_TTL must be a positive number of seconds");
            }
            Ok(TransportConfig::StreamableHttp(HttpConfig {
                host: args.host.clone(),
                port: args.port,
                stateless: parse_truthy(&args.stateless),
                session_ttl: Duration::from_secs(args.session_ttl),
            }))
        }
        other => bail!(
            "Unsupported ABRAFLEXI_MCP_TRANSPORT '{}': expected stdio or streamable-http",
            other
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> Args {
        Args {
            url: Some("https://demo.flexibee.eu:5434".to_string()),
            company: Some("demo".to_string()),
            login: Some("winstrom".to_string()),
            password: Some("winstrom".to_string()),
            auth_session_id: None,
            timeout: 300,
            read_only: "true".to_string(),
            transport: "stdio".to_string(),
            host: "127.0.0.1".to_string(),
            port: 8000,
            stateless: "false".to_string(),
            session_ttl: 3600,
            auth_type: None,
            debug: "false".to_string(),
            check: false,
        }
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_args(&args()).unwrap();
        assert!(config.gate.is_read_only());
        assert_eq!(config.transport, TransportConfig::Stdio);
        assert_eq!(config.client.company, "demo");
        assert_eq!(config.client.timeout, Duration::from_secs(300));
        assert!(matches!(config.client.credentials, Credentials::Basic { .. }));
    }

    #[test]
    fn test_read_only_toggle() {
        for (value, read_only) in [("false", false), ("0", false), ("YES", true), ("1", true)] {
            let mut a = args();
            a.read_only = value.to_string();
            assert_eq!(ServerConfig::from_args(&a).unwrap().gate.is_read_only(), read_only, "{value}");
        }
    }

    #[test]
    fn test_missing_connection_settings() {
        let mut a = args();
        a.url = None;
        let err = ServerConfig::from_args(&a).unwrap_err();
        assert!(err.to_string().contains("ABRAFLEXI_URL"));

        let mut a = args();
        a.company = Some("  ".to_string());
        let err = ServerConfig::from_args(&a).unwrap_err();
        assert!(err.to_string().contains("ABRAFLEXI_COMPANY"));

        let mut a = args();
        a.password = None;
        let err = ServerConfig::from_args(&a).unwrap_err();
        assert!(err.to_string().contains("ABRAFLEXI_AUTHSESSID"));
    }

    #[test]
    fn test_session_id_wins() {
        let mut a = args();
        a.auth_session_id = Some("abc123".to_string());
        let config = ServerConfig::from_args(&a).unwrap();
        assert!(matches!(config.client.credentials, Credentials::Session(ref s) if s == "abc123"));
    }

    #[test]
    fn test_http_transport_requires_no_auth() {
        let mut a = args();
        a.transport = "streamable-http".to_string();
        assert!(ServerConfig::from_args(&a).is_err());

        a.auth_type = Some("no-auth".to_string());
        a.stateless = "true".to_string();
        a.port = 9000;
        let config = ServerConfig::from_args(&a).unwrap();
        assert_eq!(
            config.transport,
            TransportConfig::StreamableHttp(HttpConfig {
                host: "127.0.0.1".to_string(),
                port: 9000,
                stateless: true,
                session_ttl: Duration::from_secs(3600),
            })
        );

        a.session_ttl = 0;
        assert!(ServerConfig::from_args(&a).is_err());
    }

    #[test]
    fn test_rejects_unknown_transport_and_bad_url() {
        let mut a = args();
        a.transport = "sse".to_string();
        assert!(ServerConfig::from_args(&a).is_err());

        let mut a = args();
        a.url = Some("ftp://demo".to_string());
        assert!(ServerConfig::from_args(&a).is_err());
    }

    #[test]
    fn test_cli_parsing() {
        let args = Args::try_parse_from([
            "abraflexi-mcp",
            "--url",
            "https://x.example",
            "--company",
            "acme",
            "--auth-session-id",
            "s",
            "--read-only",
            "no",
            "--check",
        ])
        .unwrap();
        assert!(args.check);
        let config = ServerConfig::from_args(&args).unwrap();
        assert!(!config.gate.is_read_only());
    }
}
