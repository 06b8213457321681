//! Mapping a stage policy and the client's preference-ordered codings to a decision.

use crate::codec::Codec;
use crate::error::Error;
use http::HeaderValue;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, trace};

/// Coding used when the client accepts anything (`*`).
pub const DEFAULT_CODING: &str = "br";

/// A content-coding name as it appears in `Content-Encoding`.
///
/// The name is kept verbatim: `x-gzip` stays `x-gzip` even though it is compressed with gzip.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Coding(String);

impl Coding {
    /// Creates a coding from a name that can be written into a header value.
    pub fn new(name: impl Into<String>) -> Result<Self, Error> {
        let name = name.into();
        if name.is_empty() || name.contains(',') || HeaderValue::from_str(&name).is_err() {
            return Err(Error::InvalidCoding(name));
        }
        Ok(Self(name))
    }

    /// Returns the coding name.
    pub fn name(&self) -> &str {
        &self.0
    }

    /// Returns the compressor used for this coding.
    pub fn codec(&self) -> Codec {
        Codec::for_coding(&self.0)
    }
}

impl From<Codec> for Coding {
    fn from(codec: Codec) -> Self {
        Self(codec.content_encoding().to_owned())
    }
}

impl fmt::Display for Coding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-stage compression policy.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Policy {
    /// Follow the client's preference order.
    #[default]
    Auto,
    /// Always use this coding, whatever the client accepts.
    Explicit(Coding),
}

impl FromStr for Policy {
    type Err = Error;

    /// Parses the configuration surface: `auto`, `br`, `deflate`, `gzip` or `x-gzip`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().to_ascii_lowercase();
        match value.as_str() {
            "auto" => Ok(Policy::Auto),
            "br" | "deflate" | "gzip" | "x-gzip" => Ok(Policy::Explicit(Coding(value))),
            _ => Err(Error::UnknownPolicy(s.to_owned())),
        }
    }
}

/// Outcome of negotiation for one stage and one response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Leave the body untouched.
    Identity,
    /// Compress the body and record this coding.
    Compress(Coding),
}

impl Decision {
    /// Returns the chosen coding, if any.
    pub fn coding(&self) -> Option<&Coding> {
        match self {
            Decision::Identity => None,
            Decision::Compress(coding) => Some(coding),
        }
    }

    /// Consumes the decision, returning the chosen coding, if any.
    pub fn into_coding(self) -> Option<Coding> {
        match self {
            Decision::Identity => None,
            Decision::Compress(coding) => Some(coding),
        }
    }
}

/// Chooses a coding for a stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Negotiator {
    default_coding: Coding,
}

impl Negotiator {
    /// Creates a negotiator that resolves `*` to `default_coding`.
    pub fn new(default_coding: Coding) -> Self {
        Self { default_coding }
    }

    /// Returns the coding `*` resolves to.
    pub fn default_coding(&self) -> &Coding {
        &self.default_coding
    }

    /// Decides how a response should be encoded.
    ///
    /// An explicit policy wins outright. In auto mode the tokens are scanned in order:
    /// `identity` and `compress` are skipped, `*` resolves to the default coding, and any
    /// other token is adopted as-is. Running out of tokens means no compression.
    pub fn decide<I, T>(&self, policy: &Policy, tokens: I) -> Decision
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let coding = match policy {
            Policy::Explicit(coding) => return Decision::Compress(coding.clone()),
            Policy::Auto => self.scan(tokens),
        };

        match coding {
            Some(coding) => {
                debug!(coding = %coding, "negotiated content coding");
                Decision::Compress(coding)
            }
            None => {
                debug!("no acceptable content coding, leaving body as is");
                Decision::Identity
            }
        }
    }

    fn scan<I, T>(&self, tokens: I) -> Option<Coding>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        for token in tokens {
            match token.as_ref() {
                "identity" | "compress" => continue,
                "*" => return Some(self.default_coding.clone()),
                other => match Coding::new(other) {
                    Ok(coding) => return Some(coding),
                    Err(_) => trace!(token = other, "skipping malformed coding token"),
                },
            }
        }
        None
    }
}

impl Default for Negotiator {
    fn default() -> Self {
        Self::new(Coding(DEFAULT_CODING.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coding(name: &str) -> Coding {
        Coding::new(name).unwrap()
    }

    fn auto(tokens: &[&str]) -> Decision {
        Negotiator::default().decide(&Policy::Auto, tokens)
    }

    #[test]
    fn test_explicit_policy_ignores_client() {
        let negotiator = Negotiator::default();
        let policy = Policy::Explicit(coding("gzip"));

        for tokens in [vec![], vec!["identity"], vec!["br", "deflate"], vec!["*"]] {
            assert_eq!(
                negotiator.decide(&policy, &tokens),
                Decision::Compress(coding("gzip"))
            );
        }
    }

    #[test]
    fn test_auto_identity_only() {
        assert_eq!(auto(&["identity"]), Decision::Identity);
    }

    #[test]
    fn test_auto_empty() {
        assert_eq!(auto(&[]), Decision::Identity);
    }

    #[test]
    fn test_auto_compress_is_inert() {
        assert_eq!(auto(&["compress"]), Decision::Identity);
        assert_eq!(auto(&["compress", "deflate"]), Decision::Compress(coding("deflate")));
    }

    #[test]
    fn test_auto_wildcard_uses_default() {
        assert_eq!(auto(&["*"]), Decision::Compress(coding(DEFAULT_CODING)));

        let negotiator = Negotiator::new(coding("gzip"));
        assert_eq!(
            negotiator.decide(&Policy::Auto, ["identity", "*", "br"]),
            Decision::Compress(coding("gzip"))
        );
    }

    #[test]
    fn test_auto_first_non_skipped_token_wins() {
        assert_eq!(
            auto(&["compress", "identity", "x-gzip"]),
            Decision::Compress(coding("x-gzip"))
        );
        assert_eq!(auto(&["deflate", "br"]), Decision::Compress(coding("deflate")));
    }

    #[test]
    fn test_auto_adopts_unknown_token_verbatim() {
        let decision = auto(&["zstd", "gzip"]);
        assert_eq!(decision, Decision::Compress(coding("zstd")));
        assert_eq!(decision.coding().unwrap().codec(), Codec::Gzip);
    }

    #[test]
    fn test_auto_skips_malformed_token() {
        assert_eq!(auto(&["", "br"]), Decision::Compress(coding("br")));
    }

    #[test]
    fn test_decide_is_repeatable() {
        let negotiator = Negotiator::default();
        let tokens = ["identity", "gzip", "br"];
        let first = negotiator.decide(&Policy::Auto, tokens);
        let second = negotiator.decide(&Policy::Auto, tokens);
        assert_eq!(first, second);
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("auto".parse::<Policy>().unwrap(), Policy::Auto);
        assert_eq!(
            " X-Gzip ".parse::<Policy>().unwrap(),
            Policy::Explicit(coding("x-gzip"))
        );
        assert_eq!(
            "br".parse::<Policy>().unwrap(),
            Policy::Explicit(coding("br"))
        );
        assert!(matches!(
            "zstd".parse::<Policy>(),
            Err(Error::UnknownPolicy(name)) if name == "zstd"
        ));
    }

    #[test]
    fn test_invalid_coding_names() {
        assert!(Coding::new("").is_err());
        assert!(Coding::new("gzip, br").is_err());
        assert!(Coding::new("bad\nname").is_err());
        assert_eq!(Coding::from(Codec::Brotli).name(), "br");
    }
}
