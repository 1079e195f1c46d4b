use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelemetryProtocol {
    Grpc,
    HttpProtobuf,
}

impl TelemetryProtocol {
    /// `http` and `http/protobuf` select HTTP; anything else is gRPC.
    fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "http" | "http/protobuf" => TelemetryProtocol::HttpProtobuf,
            _ => TelemetryProtocol::Grpc,
        }
    }
}

/// Shape of stdout log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Plain,
}

impl LogFormat {
    fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "text" | "pretty" | "plain" => LogFormat::Plain,
            _ => LogFormat::Json,
        }
    }
}

/// OTLP export target. Present only when export is switched on and an endpoint is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtlpTarget {
    pub endpoint: String,
    pub protocol: TelemetryProtocol,
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub service_name: String,
    pub service_version: String,
    pub environment: String,
    pub log_format: LogFormat,
    pub otlp: Option<OtlpTarget>,
}

impl TelemetryConfig {
    pub fn from_env(service_name: &str, service_version: &str) -> Self {
        Self::from_lookup(service_name, service_version, |name| env::var(name).ok())
    }

    pub fn from_lookup<F>(service_name: &str, service_version: &str, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let set = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let export = set("ENABLE_OTEL")
            .is_some_and(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"));
        let otlp = set("OTEL_EXPORTER_OTLP_ENDPOINT")
            .filter(|_| export)
            .map(|endpoint| OtlpTarget {
                endpoint: endpoint.trim().to_string(),
                protocol: set("OTEL_EXPORTER_OTLP_PROTOCOL")
                    .map(|raw| TelemetryProtocol::parse(&raw))
                    .unwrap_or(TelemetryProtocol::Grpc),
            });

        Self {
            service_name: set("OTEL_SERVICE_NAME").unwrap_or_else(|| service_name.to_string()),
            service_version: set("OTEL_SERVICE_VERSION")
                .unwrap_or_else(|| service_version.to_string()),
            environment: set("OTEL_RESOURCE_ATTRIBUTES")
                .and_then(|attrs| resource_attribute(&attrs, "deployment.environment"))
                .or_else(|| set("DEPLOYMENT_ENV"))
                .unwrap_or_else(|| "dev".into()),
            log_format: set("LOG_FORMAT")
                .map(|raw| LogFormat::parse(&raw))
                .unwrap_or(LogFormat::Json),
            otlp,
        }
    }
}

/// Picks `key` out of a `k=v,k=v` resource attribute list.
fn resource_attribute(attrs: &str, key: &str) -> Option<String> {
    attrs.split(',').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        (k.trim() == key).then(|| v.trim().to_string())
    })
}
