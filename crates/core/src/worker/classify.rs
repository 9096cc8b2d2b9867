//! Request classification rules.
//!
//! A pure function from (method, URL, navigation flag, destination) to a
//! caching decision. Rules are order-sensitive and the first match wins:
//!
//! 1. API prefix or upstream metadata host -> bypass
//! 2. Navigation / document -> network-first against `static`
//! 3. Image CDN -> cache-first against `images`
//! 4. Font provider -> stale-while-revalidate against `runtime`
//! 5. Same origin as the shell -> stale-while-revalidate against `static`
//! 6. Anything else -> stale-while-revalidate against `runtime`
//!
//! The classifier is built once from `AppConfig` and never mutated.

use url::Url;

use crate::Error;
use crate::config::AppConfig;

/// The read/write policy applied to a request against a partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    CacheFirst,
    NetworkFirst,
    StaleWhileRevalidate,
}

/// What the requested resource will be used for, mirroring the destination
/// hint a browser attaches to subresource requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Destination {
    Document,
    Image,
    Font,
    Script,
    Style,
    #[default]
    Other,
}

/// An intercepted outgoing request, as seen by the cache manager.
#[derive(Debug, Clone)]
pub struct RequestInfo {
    pub method: String,
    pub url: Url,
    /// True for top-level page navigations.
    pub navigation: bool,
    pub destination: Destination,
}

impl RequestInfo {
    /// A plain GET subresource request.
    pub fn get(url: Url) -> Self {
        Self { method: "GET".to_string(), url, navigation: false, destination: Destination::Other }
    }

    /// A top-level navigation request.
    pub fn navigate(url: Url) -> Self {
        Self { method: "GET".to_string(), url, navigation: true, destination: Destination::Document }
    }
}

/// The outcome of classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Skip the cache layer entirely; the request goes straight to the
    /// network and errors surface directly to the caller.
    Bypass,
    /// Serve via the given strategy against the given partition.
    Handle { strategy: Strategy, partition: String },
}

/// Version-tagged partition names for the three logical roles.
#[derive(Debug, Clone)]
pub struct PartitionNames {
    version: String,
}

impl PartitionNames {
    pub fn new(version: &str) -> Self {
        Self { version: version.to_string() }
    }

    /// App-shell partition (root document, stylesheet, script bundle).
    pub fn static_assets(&self) -> String {
        format!("reelgate-static-{}", self.version)
    }

    /// Misc cross-origin assets and fonts.
    pub fn runtime(&self) -> String {
        format!("reelgate-runtime-{}", self.version)
    }

    /// Poster art from the image CDN.
    pub fn images(&self) -> String {
        format!("reelgate-images-{}", self.version)
    }

    /// The set of names that survive activation.
    pub fn keep_set(&self) -> Vec<String> {
        vec![self.static_assets(), self.runtime(), self.images()]
    }
}

/// Immutable classification configuration, constructed once at startup.
#[derive(Debug, Clone)]
pub struct Classifier {
    api_prefix: String,
    upstream_api_host: String,
    image_cdn_origin: Url,
    font_origins: Vec<Url>,
    shell_origin: Url,
    partitions: PartitionNames,
}

fn same_origin(a: &Url, b: &Url) -> bool {
    a.scheme() == b.scheme() && a.host_str() == b.host_str() && a.port_or_known_default() == b.port_or_known_default()
}

impl Classifier {
    /// Build the classifier from validated configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        let parse = |s: &str| Url::parse(s).map_err(|e| Error::InvalidUrl(format!("{s}: {e}")));

        Ok(Self {
            api_prefix: config.api_prefix.clone(),
            upstream_api_host: config.upstream_api_host.clone(),
            image_cdn_origin: parse(&config.image_cdn_origin)?,
            font_origins: config
                .font_origins
                .iter()
                .map(|o| parse(o))
                .collect::<Result<Vec<_>, _>>()?,
            shell_origin: parse(&config.shell_origin)?,
            partitions: PartitionNames::new(&config.cache_version),
        })
    }

    pub fn partitions(&self) -> &PartitionNames {
        &self.partitions
    }

    pub fn shell_origin(&self) -> &Url {
        &self.shell_origin
    }

    pub fn image_cdn_origin(&self) -> &Url {
        &self.image_cdn_origin
    }

    /// The root-document URL used as the last network-first fallback.
    pub fn shell_root(&self) -> Url {
        let mut root = self.shell_origin.clone();
        root.set_path("/");
        root
    }

    /// Classify one intercepted request.
    ///
    /// Bypass wins over everything, regardless of method or destination.
    pub fn classify(&self, req: &RequestInfo) -> Decision {
        if req.url.path().starts_with(&self.api_prefix)
            || req.url.host_str() == Some(self.upstream_api_host.as_str())
        {
            return Decision::Bypass;
        }

        if req.navigation || req.destination == Destination::Document {
            return Decision::Handle {
                strategy: Strategy::NetworkFirst,
                partition: self.partitions.static_assets(),
            };
        }

        if same_origin(&req.url, &self.image_cdn_origin) {
            return Decision::Handle { strategy: Strategy::CacheFirst, partition: self.partitions.images() };
        }

        if self.font_origins.iter().any(|o| same_origin(&req.url, o)) {
            return Decision::Handle {
                strategy: Strategy::StaleWhileRevalidate,
                partition: self.partitions.runtime(),
            };
        }

        if same_origin(&req.url, &self.shell_origin) {
            return Decision::Handle {
                strategy: Strategy::StaleWhileRevalidate,
                partition: self.partitions.static_assets(),
            };
        }

        Decision::Handle { strategy: Strategy::StaleWhileRevalidate, partition: self.partitions.runtime() }
    }
}
