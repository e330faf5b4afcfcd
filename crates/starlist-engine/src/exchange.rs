//! Cross-process star exchange.
//!
//! Every process owns a disjoint set of blocks, but every process keeps a
//! record of every star. Before each pass the processes swap their local
//! stars as encoded transfer-buffer batches in a synchronous all-gather;
//! the records received from peers become ghosts.
//!
//! [`StarExchange`] is the transport seam. [`LocalExchange`] serves a
//! single process, [`ChannelExchange`] connects in-process endpoints over
//! crossbeam channels (one endpoint per simulated process, each on its
//! own thread).

use std::error::Error;
use std::fmt;

use crossbeam_channel::{unbounded, Receiver, Sender};
use starlist_codec::{decode_batch, encode_all, encode_batch, from_buffer, CodecError};

use crate::population::StarPopulation;

/// Errors from the exchange transport.
#[derive(Debug)]
pub enum ExchangeError {
    /// A peer endpoint was dropped before the barrier completed.
    Disconnected {
        /// Rank of the missing peer.
        peer: usize,
    },
    /// A peer sent a batch that does not decode.
    Malformed {
        /// Rank of the sender.
        peer: usize,
        /// Decoder failure.
        source: CodecError,
    },
}

impl fmt::Display for ExchangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected { peer } => write!(f, "peer {peer} disconnected"),
            Self::Malformed { peer, source } => {
                write!(f, "malformed batch from peer {peer}: {source}")
            }
        }
    }
}

impl Error for ExchangeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Disconnected { .. } => None,
            Self::Malformed { source, .. } => Some(source),
        }
    }
}

/// Synchronous all-gather over opaque byte batches.
pub trait StarExchange {
    /// This process's rank, in `0..size()`.
    fn rank(&self) -> usize;

    /// Number of participating processes.
    fn size(&self) -> usize;

    /// Contribute `local` and receive every process's contribution,
    /// indexed by rank. Blocks until every peer has contributed.
    fn all_gather(&mut self, local: Vec<u8>) -> Result<Vec<Vec<u8>>, ExchangeError>;
}

/// Single-process exchange: the gather returns the local batch.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalExchange;

impl StarExchange for LocalExchange {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn all_gather(&mut self, local: Vec<u8>) -> Result<Vec<Vec<u8>>, ExchangeError> {
        Ok(vec![local])
    }
}

/// One endpoint of an in-process exchange group.
///
/// Each ordered pair of ranks has its own channel, so batches from one
/// peer arrive in the order that peer sent them even when another peer
/// runs a round ahead.
#[derive(Debug)]
pub struct ChannelExchange {
    rank: usize,
    outbound: Vec<Option<Sender<Vec<u8>>>>,
    inbound: Vec<Option<Receiver<Vec<u8>>>>,
}

impl ChannelExchange {
    /// Build a fully connected group of `size` endpoints, in rank order.
    pub fn group(size: usize) -> Vec<ChannelExchange> {
        let mut endpoints: Vec<ChannelExchange> = (0..size)
            .map(|rank| ChannelExchange {
                rank,
                outbound: (0..size).map(|_| None).collect(),
                inbound: (0..size).map(|_| None).collect(),
            })
            .collect();
        for from in 0..size {
            for to in 0..size {
                if from == to {
                    continue;
                }
                let (tx, rx) = unbounded();
                endpoints[from].outbound[to] = Some(tx);
                endpoints[to].inbound[from] = Some(rx);
            }
        }
        endpoints
    }
}

impl StarExchange for ChannelExchange {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.outbound.len()
    }

    fn all_gather(&mut self, local: Vec<u8>) -> Result<Vec<Vec<u8>>, ExchangeError> {
        for (peer, tx) in self.outbound.iter().enumerate() {
            if let Some(tx) = tx {
                tx.send(local.clone())
                    .map_err(|_| ExchangeError::Disconnected { peer })?;
            }
        }
        let mut gathered = Vec::with_capacity(self.inbound.len());
        for (peer, rx) in self.inbound.iter().enumerate() {
            match rx {
                Some(rx) => {
                    gathered.push(rx.recv().map_err(|_| ExchangeError::Disconnected { peer })?)
                }
                None => gathered.push(local.clone()),
            }
        }
        Ok(gathered)
    }
}

/// Encode the population's local stars as one wire batch.
pub fn encode_local(population: &StarPopulation) -> Result<Vec<u8>, CodecError> {
    let buffers = encode_all(population.values().filter(|s| !s.is_ghost()));
    let mut bytes = Vec::new();
    encode_batch(&mut bytes, &buffers)?;
    Ok(bytes)
}

/// Swap local stars with every peer and assemble the full population.
///
/// Stars are laid out in rank order, so every process sees the same
/// sequence of identifiers. Records received from peers carry no mirror
/// reference: they are ghosts on this process.
pub fn gather_population(
    local: StarPopulation,
    exchange: &mut dyn StarExchange,
) -> Result<StarPopulation, ExchangeError> {
    let rank = exchange.rank();
    let encoded = encode_local(&local).map_err(|source| ExchangeError::Malformed {
        peer: rank,
        source,
    })?;
    let batches = exchange.all_gather(encoded)?;

    let mut own = local.into_stars().into_iter();
    let mut gathered = StarPopulation::new();
    let mut ghosts = 0;
    for (peer, batch) in batches.iter().enumerate() {
        if peer == rank {
            for star in own.by_ref() {
                let _ = gathered.push(star);
            }
            continue;
        }
        let buffers = decode_batch(&mut batch.as_slice())
            .map_err(|source| ExchangeError::Malformed { peer, source })?;
        ghosts += buffers.len();
        for buffer in &buffers {
            let _ = gathered.push(from_buffer(buffer));
        }
    }
    log::debug!(
        "rank {rank}: received {ghosts} ghost star(s) from {} peer(s)",
        batches.len().saturating_sub(1)
    );
    Ok(gathered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use starlist_core::{Star, StarId};
    use starlist_test_utils::{embedded_star, ghost_star};
    use std::thread;

    fn population(stars: impl IntoIterator<Item = Star>) -> StarPopulation {
        let mut pop = StarPopulation::new();
        for star in stars {
            let _ = pop.push(star);
        }
        pop
    }

    #[test]
    fn local_exchange_keeps_population() {
        let pop = population([
            embedded_star(1, 1, 7, 1.0, [0.5; 3]),
            embedded_star(2, 1, 7, 1.0, [0.5; 3]),
        ]);
        let gathered = gather_population(pop, &mut LocalExchange).unwrap();
        let ids: Vec<_> = gathered.values().map(|s| s.id.0).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(gathered.ghosts(), 0);
    }

    #[test]
    fn encode_local_skips_ghosts() {
        let pop = population([
            embedded_star(1, 1, 7, 1.0, [0.5; 3]),
            ghost_star(2, 3, 7, 1.0),
        ]);
        let bytes = encode_local(&pop).unwrap();
        let decoded = decode_batch(&mut bytes.as_slice()).unwrap();
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].identifier, 1);
    }

    #[test]
    fn channel_group_gathers_by_rank() {
        let handles: Vec<_> = ChannelExchange::group(3)
            .into_iter()
            .map(|mut ex| {
                thread::spawn(move || {
                    let mine = vec![ex.rank() as u8];
                    let first = ex.all_gather(mine).unwrap();
                    let second = ex.all_gather(vec![10 + ex.rank() as u8]).unwrap();
                    (first, second)
                })
            })
            .collect();
        for h in handles {
            let (first, second) = h.join().unwrap();
            assert_eq!(first, vec![vec![0], vec![1], vec![2]]);
            assert_eq!(second, vec![vec![10], vec![11], vec![12]]);
        }
    }

    #[test]
    fn dropped_peer_is_disconnected() {
        let mut group = ChannelExchange::group(2);
        let _ = group.pop();
        let mut survivor = group.pop().unwrap();
        assert!(matches!(
            survivor.all_gather(Vec::new()),
            Err(ExchangeError::Disconnected { peer: 1 })
        ));
    }

    #[test]
    fn peers_become_ghosts_in_rank_order() {
        let handles: Vec<_> = ChannelExchange::group(2)
            .into_iter()
            .map(|mut ex| {
                thread::spawn(move || {
                    let id = ex.rank() as u64 + 1;
                    let pop = population([embedded_star(id, id as u32, 7, 2.0, [0.5; 3])]);
                    (ex.rank(), gather_population(pop, &mut ex).unwrap())
                })
            })
            .collect();
        for h in handles {
            let (rank, gathered) = h.join().unwrap();
            let ids: Vec<_> = gathered.values().map(|s| s.id).collect();
            assert_eq!(ids, vec![StarId(1), StarId(2)]);
            assert_eq!(gathered.ghosts(), 1);
            let local = gathered.values().find(|s| !s.is_ghost()).unwrap();
            assert_eq!(local.id, StarId(rank as u64 + 1));
            let ghost = gathered.values().find(|s| s.is_ghost()).unwrap();
            assert_eq!(ghost.mass, 2.0);
        }
    }
}
