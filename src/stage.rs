//! Compression stages and their composition over [`ResponseSink`]s.
//!
//! Stages run in registration order. Each one wraps the sink it was handed, so the producer
//! writes into the last stage's compressor first and the first stage's compressor sits right
//! in front of the real sink. Every stage prepends its coding to `Content-Encoding`, which
//! leaves the header listing codings in the order they were applied to the bytes.

use crate::error::Error;
use crate::history;
use crate::negotiate::{Coding, Decision, Negotiator, Policy};
use crate::sink::{BoxSink, CompressedSink};
use http::header::CONTENT_LENGTH;
use tracing::debug;

/// One configured compression point.
#[derive(Debug, Clone, Default)]
pub struct CompressionStage {
    policy: Policy,
    negotiator: Negotiator,
}

impl CompressionStage {
    /// Creates a stage with the given policy and the default wildcard coding.
    pub fn new(policy: Policy) -> Self {
        Self {
            policy,
            negotiator: Negotiator::default(),
        }
    }

    /// Sets the coding a `*` in the client's preferences resolves to.
    pub fn default_coding(mut self, coding: Coding) -> Self {
        self.negotiator = Negotiator::new(coding);
        self
    }

    /// Returns the stage's policy.
    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Decides what this stage would do for the given acceptable codings.
    pub fn decide<I, T>(&self, tokens: I) -> Decision
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        self.negotiator.decide(&self.policy, tokens)
    }

    /// Runs the stage for one response.
    ///
    /// Without a coding the sink comes back untouched. Otherwise the coding is recorded,
    /// the now-wrong `Content-Length` is dropped, and the returned sink compresses into
    /// `sink`.
    pub fn apply<I, T>(&self, tokens: I, mut sink: BoxSink) -> Result<BoxSink, Error>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let Decision::Compress(coding) = self.decide(tokens) else {
            return Ok(sink);
        };

        let headers = sink.headers_mut();
        history::prepend(headers, &coding)?;
        headers.remove(CONTENT_LENGTH);

        let codec = coding.codec();
        debug!(
            coding = %coding,
            codec = codec.content_encoding(),
            "decorating response sink"
        );
        Ok(Box::new(CompressedSink::new(sink, codec)))
    }
}

/// Stages applied to every response, in registration order.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    stages: Vec<CompressionStage>,
}

impl Pipeline {
    /// Creates an empty pipeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a stage after the existing ones.
    pub fn stage(mut self, stage: CompressionStage) -> Self {
        self.stages.push(stage);
        self
    }

    /// Returns the registered stages.
    pub fn stages(&self) -> &[CompressionStage] {
        &self.stages
    }

    /// Runs every stage against `sink`, returning the sink the body producer should write to.
    pub fn apply<T>(&self, tokens: &[T], sink: BoxSink) -> Result<BoxSink, Error>
    where
        T: AsRef<str>,
    {
        self.stages
            .iter()
            .try_fold(sink, |sink, stage| stage.apply(tokens, sink))
    }
}

impl FromIterator<CompressionStage> for Pipeline {
    fn from_iter<I: IntoIterator<Item = CompressionStage>>(iter: I) -> Self {
        Self {
            stages: iter.into_iter().collect(),
        }
    }
}
