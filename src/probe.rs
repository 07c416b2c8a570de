//! Concurrent acquisition of measurement values.
//!
//! Probes are independent, so a plugin checking several targets runs them side by side. The
//! [ProbeExecutor] bounds how many run at once and gives all of them one common deadline;
//! a probe which hasn't finished by then fails with [ProbeError::Timeout].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::sync::Semaphore;
use tokio::time::Instant;

use crate::{Measurement, ProbeError};

/// Something which can produce one value for a measurement.
#[async_trait]
pub trait Probe: Send + Sync {
    /// Label of the measurement the value belongs to.
    fn label(&self) -> &str;

    async fn acquire(&self) -> Result<f64, ProbeError>;
}

/// The value a probe produced, or why it didn't.
#[derive(Debug)]
pub struct ProbeOutcome {
    pub label: String,
    pub value: Result<f64, ProbeError>,
}

impl ProbeOutcome {
    pub fn into_measurement(self) -> Measurement {
        Measurement::from_probe(self.label, self.value)
    }
}

#[derive(Debug, Clone)]
pub struct ProbeExecutor {
    workers: usize,
    timeout: Duration,
}

impl ProbeExecutor {
    /// `workers` is clamped to at least one.
    pub fn new(workers: usize, timeout: Duration) -> Self {
        ProbeExecutor {
            workers: workers.max(1),
            timeout,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Runs all probes on a fresh single threaded runtime and blocks until every probe has a
    /// result. Outcomes are in the same order as `probes`.
    pub fn run(&self, probes: Vec<Box<dyn Probe>>) -> Vec<ProbeOutcome> {
        match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime.block_on(self.run_async(probes)),
            Err(err) => {
                tracing::error!(%err, "could not start probe runtime");
                probes
                    .iter()
                    .map(|probe| ProbeOutcome {
                        label: probe.label().to_owned(),
                        value: Err(ProbeError::Unavailable(format!(
                            "could not start probe runtime: {}",
                            err
                        ))),
                    })
                    .collect()
            }
        }
    }

    pub async fn run_async(&self, probes: Vec<Box<dyn Probe>>) -> Vec<ProbeOutcome> {
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let deadline = Instant::now() + self.timeout;

        let tasks = probes.into_iter().map(|probe| {
            let semaphore = semaphore.clone();
            async move {
                let work = async {
                    match semaphore.acquire().await {
                        Ok(_permit) => {
                            tracing::debug!(label = probe.label(), "starting probe");
                            probe.acquire().await
                        }
                        Err(_) => Err(ProbeError::Unavailable("probe pool closed".to_owned())),
                    }
                };

                let value = tokio::time::timeout_at(deadline, work)
                    .await
                    .unwrap_or(Err(ProbeError::Timeout {
                        after: self.timeout,
                    }));

                if let Err(ref err) = value {
                    tracing::info!(label = probe.label(), %err, "probe failed");
                }

                ProbeOutcome {
                    label: probe.label().to_owned(),
                    value,
                }
            }
        });

        futures::future::join_all(tasks).await
    }
}

/// Measures how long it takes to open a TCP connection, in seconds.
#[derive(Debug, Clone)]
pub struct TcpConnectProbe {
    label: String,
    host: String,
    port: u16,
}

impl TcpConnectProbe {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        TcpConnectProbe {
            label: format!("port_{}", port),
            host: host.into(),
            port,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

#[async_trait]
impl Probe for TcpConnectProbe {
    fn label(&self) -> &str {
        &self.label
    }

    async fn acquire(&self) -> Result<f64, ProbeError> {
        let target = format!("{}:{}", self.host, self.port);

        let addrs: Vec<_> = tokio::net::lookup_host(target.as_str())
            .await
            .map_err(|err| ProbeError::Resolve {
                target: self.host.clone(),
                reason: err.to_string(),
            })?
            .collect();

        if addrs.is_empty() {
            return Err(ProbeError::Resolve {
                target: self.host.clone(),
                reason: "no addresses found".to_owned(),
            });
        }

        let started = Instant::now();
        let _stream = TcpStream::connect(&addrs[..])
            .await
            .map_err(|source| ProbeError::Connect { target, source })?;

        // microsecond resolution is plenty for perfdata
        let secs = started.elapsed().as_secs_f64();
        Ok((secs * 1e6).round() / 1e6)
    }
}
