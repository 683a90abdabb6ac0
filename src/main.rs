//! Menu Profitability Predictor - Main Entry Point
//!
//! Loads the trained artifacts once, then answers JSON requests read from
//! stdin with one JSON line per request line on stdout.

use anyhow::{Context, Result};
use menu_profitability::{
    config::{AppConfig, LoggingConfig},
    consumer::{RequestConsumer, RequestLine},
    metrics::PipelineMetrics,
    producer::{ResponseLine, ResponseProducer},
    ArtifactCache, InferencePipeline,
};
use std::io;
use std::time::Instant;
use tracing::{debug, info, warn};

fn main() -> Result<()> {
    let config = AppConfig::load()?;
    init_logging(&config.logging)?;

    info!("Starting Menu Profitability Predictor");
    info!(
        dir = %config.artifacts.dir,
        classifier = %config.artifacts.classifier,
        "Configuration loaded"
    );

    let cache = ArtifactCache::new(config.artifacts.clone());
    let artifacts = cache
        .get_or_load()
        .context("Failed to load trained artifacts")?;
    let pipeline = InferencePipeline::new(artifacts);
    let metrics = PipelineMetrics::new();

    let mut consumer = RequestConsumer::new(io::stdin().lock());
    let mut producer = ResponseProducer::new(io::stdout().lock());

    while let Some((line_number, parsed)) = consumer.next_line()? {
        let response = match parsed {
            Ok(line) => answer(&pipeline, &metrics, line_number, &line),
            Err(e) => {
                warn!(line = line_number, error = %e, "Failed to deserialize request");
                metrics.record_failure(1);
                ResponseLine::error(format!("invalid request: {}", e))
            }
        };
        producer.publish(&response)?;
    }

    info!("Input closed, shutting down...");
    metrics.print_summary();

    Ok(())
}

fn answer(
    pipeline: &InferencePipeline,
    metrics: &PipelineMetrics,
    line_number: u64,
    line: &RequestLine,
) -> ResponseLine {
    let start = Instant::now();

    match pipeline.predict_batch(line.requests()) {
        Ok(responses) => {
            let latency = start.elapsed();
            metrics.record_batch(latency, responses.iter().map(|r| r.label.as_str()));

            debug!(
                line = line_number,
                batch = responses.len(),
                latency_us = latency.as_micros() as u64,
                "Request answered"
            );

            if line.is_batch() {
                ResponseLine::Batch(responses)
            } else {
                match responses.into_iter().next() {
                    Some(response) => ResponseLine::Single(response),
                    None => ResponseLine::error("classifier returned no prediction"),
                }
            }
        }
        Err(e) => {
            warn!(line = line_number, error = %e, "Inference failed");
            metrics.record_failure(line.requests().len() as u64);
            ResponseLine::error(e)
        }
    }
}

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(format!("menu_profitability={}", logging.level).parse()?);

    // stdout carries responses, so logs go to stderr
    if logging.format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
    }

    Ok(())
}
