use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::client::{Block, ChainSource};
use crate::config::SchedulerConfig;
use crate::error::Result;
use crate::history::BlockPointer;

/// Current polling cadence, shown in the dashboard header.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pacing {
    pub poll_interval_secs: f64,
    pub average_block_time_secs: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// The next height was fetched and its commit is ready to record.
    Recorded(BlockPointer),
    /// The chain has not produced a new height yet.
    Waiting,
}

/// Walks the consumer chain one height at a time and tunes the poll interval
/// towards the observed block time.
pub struct BlockScheduler {
    config: SchedulerConfig,
    current_height: Option<u64>,
    last_proposer: Option<String>,
    last_block_time: Option<DateTime<Utc>>,
    block_time_deltas: VecDeque<f64>,
    average_block_time: f64,
    poll_interval: f64,
}

impl BlockScheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            current_height: None,
            last_proposer: None,
            last_block_time: None,
            block_time_deltas: VecDeque::with_capacity(config.block_time_window + 1),
            average_block_time: config.initial_block_time_secs,
            poll_interval: config.initial_poll_interval_secs,
            config,
        }
    }

    pub fn current_height(&self) -> Option<u64> {
        self.current_height
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.poll_interval.max(0.0)).unwrap_or(Duration::MAX)
    }

    pub fn pacing(&self) -> Pacing {
        Pacing {
            poll_interval_secs: self.poll_interval,
            average_block_time_secs: self.average_block_time,
        }
    }

    /// One fetch cycle.
    ///
    /// The first call starts from the latest block. Afterwards, whenever the
    /// chain is ahead, exactly `current + 1` is fetched so no height is ever
    /// skipped. Errors leave the scheduler state untouched.
    pub async fn tick<S: ChainSource + ?Sized>(&mut self, source: &S) -> Result<TickOutcome> {
        let latest = source.latest_block().await?;

        let block = match self.current_height {
            None => latest,
            Some(current) if latest.height > current => source.block_at_height(current + 1).await?,
            Some(_) => {
                self.back_off();
                return Ok(TickOutcome::Waiting);
            }
        };

        Ok(TickOutcome::Recorded(self.advance(block)))
    }

    /// Lengthen the poll interval by one step.
    pub fn back_off(&mut self) {
        self.poll_interval += self.config.poll_step_secs;
    }

    fn advance(&mut self, block: Block) -> BlockPointer {
        let is_first = self.current_height.is_none();

        self.observe_block_time(block.time);
        if !is_first
            && self.poll_interval > self.average_block_time
            && self.poll_interval > self.config.min_poll_interval_secs
        {
            self.poll_interval -= self.config.poll_step_secs;
        }

        // The commit in block H belongs to H-1, proposed by the previous block's proposer
        let pointer = BlockPointer {
            height: block.commit_height,
            proposer_address_hex: self.last_proposer.take(),
            commit_signer_addresses_hex: block.commit_signers,
            timestamp: block.time,
        };

        self.last_proposer = Some(block.proposer_address);
        self.current_height = Some(block.height);
        pointer
    }

    fn observe_block_time(&mut self, time: DateTime<Utc>) {
        if let Some(previous) = self.last_block_time {
            let delta = (time - previous).num_milliseconds() as f64 / 1000.0;
            self.block_time_deltas.push_back(delta);
            while self.block_time_deltas.len() > self.config.block_time_window.max(1) {
                self.block_time_deltas.pop_front();
            }
            self.average_block_time =
                self.block_time_deltas.iter().sum::<f64>() / self.block_time_deltas.len() as f64;
        }
        self.last_block_time = Some(time);
    }
}

/// Messages from the fetch task to the dashboard loop.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchEvent {
    Block { pointer: BlockPointer, pacing: Pacing },
    Waiting { pacing: Pacing },
    Failed { reason: String, pacing: Pacing },
}

/// Run the scheduler on its own task until the receiving side goes away.
///
/// A failed fetch is reported, backs the poll interval off and is retried on
/// the next cycle for the same height.
pub fn spawn_fetch_loop<S>(
    source: Arc<S>,
    mut scheduler: BlockScheduler,
    events: mpsc::UnboundedSender<FetchEvent>,
) -> JoinHandle<()>
where
    S: ChainSource + ?Sized + 'static,
{
    tokio::spawn(async move {
        info!(
            "Block fetch loop started (poll interval {:.1}s)",
            scheduler.pacing().poll_interval_secs
        );

        loop {
            let event = match scheduler.tick(source.as_ref()).await {
                Ok(TickOutcome::Recorded(pointer)) => {
                    debug!("Fetched commit for height {}", pointer.height);
                    FetchEvent::Block {
                        pointer,
                        pacing: scheduler.pacing(),
                    }
                }
                Ok(TickOutcome::Waiting) => FetchEvent::Waiting {
                    pacing: scheduler.pacing(),
                },
                Err(e) => {
                    scheduler.back_off();
                    warn!(
                        "Block fetch failed after height {:?}: {}",
                        scheduler.current_height(),
                        e
                    );
                    FetchEvent::Failed {
                        reason: e.to_string(),
                        pacing: scheduler.pacing(),
                    }
                }
            };

            if events.send(event).is_err() {
                debug!("Dashboard closed, stopping fetch loop");
                break;
            }

            tokio::time::sleep(scheduler.poll_interval()).await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ConsumerValidator, ProviderValidator};
    use crate::error::MonitorError;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
    use std::sync::Mutex;

    /// In-memory chain producing one block per `block_time_ms`.
    struct MockChain {
        latest: AtomicU64,
        block_time_ms: i64,
        fail_next: AtomicBool,
        requested: Mutex<Vec<u64>>,
    }

    impl MockChain {
        fn new(latest: u64, block_time_ms: i64) -> Self {
            Self {
                latest: AtomicU64::new(latest),
                block_time_ms,
                fail_next: AtomicBool::new(false),
                requested: Mutex::new(Vec::new()),
            }
        }

        fn block(&self, height: u64) -> Block {
            let genesis = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
            Block {
                height,
                time: genesis + chrono::Duration::milliseconds(self.block_time_ms * height as i64),
                proposer_address: format!("P{}", height),
                commit_height: height - 1,
                commit_signers: HashSet::from([format!("P{}", height - 1), "V".to_string()]),
            }
        }

        fn check_failure(&self) -> Result<()> {
            if self.fail_next.swap(false, Ordering::SeqCst) {
                return Err(MonitorError::Decode {
                    endpoint: "mock".to_string(),
                    reason: "injected".to_string(),
                });
            }
            Ok(())
        }
    }

    #[async_trait]
    impl ChainSource for MockChain {
        async fn chain_id(&self) -> Result<String> {
            Ok("consumer-1".to_string())
        }

        async fn provider_validators(&self) -> Result<Vec<ProviderValidator>> {
            Ok(Vec::new())
        }

        async fn consumer_validators(&self) -> Result<Vec<ConsumerValidator>> {
            Ok(Vec::new())
        }

        async fn latest_block(&self) -> Result<Block> {
            self.check_failure()?;
            Ok(self.block(self.latest.load(Ordering::SeqCst)))
        }

        async fn block_at_height(&self, height: u64) -> Result<Block> {
            self.requested.lock().unwrap().push(height);
            Ok(self.block(height))
        }
    }

    fn recorded(outcome: TickOutcome) -> BlockPointer {
        match outcome {
            TickOutcome::Recorded(pointer) => pointer,
            TickOutcome::Waiting => panic!("expected a recorded block"),
        }
    }

    #[tokio::test]
    async fn test_first_tick_starts_at_latest() {
        let chain = MockChain::new(100, 1000);
        let mut scheduler = BlockScheduler::new(SchedulerConfig::default());

        let pointer = recorded(scheduler.tick(&chain).await.unwrap());

        assert_eq!(pointer.height, 99);
        assert_eq!(pointer.proposer_address_hex, None);
        assert_eq!(scheduler.current_height(), Some(100));
        assert_eq!(scheduler.pacing().poll_interval_secs, 2.0);
    }

    #[tokio::test]
    async fn test_never_skips_a_height() {
        let chain = MockChain::new(100, 1000);
        let mut scheduler = BlockScheduler::new(SchedulerConfig::default());
        scheduler.tick(&chain).await.unwrap();

        chain.latest.store(105, Ordering::SeqCst);
        let first = recorded(scheduler.tick(&chain).await.unwrap());
        let second = recorded(scheduler.tick(&chain).await.unwrap());

        assert_eq!(*chain.requested.lock().unwrap(), vec![101, 102]);
        assert_eq!(first.height, 100);
        assert_eq!(first.proposer_address_hex.as_deref(), Some("P100"));
        // stamped with the carrying block's header time
        assert_eq!(first.timestamp, chain.block(101).time);
        assert_eq!(second.height, 101);
        assert_eq!(second.proposer_address_hex.as_deref(), Some("P101"));
    }

    #[tokio::test]
    async fn test_waiting_backs_off() {
        let chain = MockChain::new(50, 1000);
        let mut scheduler = BlockScheduler::new(SchedulerConfig::default());
        scheduler.tick(&chain).await.unwrap();

        assert_eq!(scheduler.tick(&chain).await.unwrap(), TickOutcome::Waiting);
        assert_eq!(scheduler.pacing().poll_interval_secs, 2.5);
        assert_eq!(scheduler.tick(&chain).await.unwrap(), TickOutcome::Waiting);
        assert_eq!(scheduler.pacing().poll_interval_secs, 3.0);
    }

    #[tokio::test]
    async fn test_converges_to_block_time() {
        let chain = MockChain::new(10, 1000);
        let mut scheduler = BlockScheduler::new(SchedulerConfig::default());
        scheduler.tick(&chain).await.unwrap();

        chain.latest.store(20, Ordering::SeqCst);
        scheduler.tick(&chain).await.unwrap();
        assert_eq!(scheduler.pacing().average_block_time_secs, 1.0);
        assert_eq!(scheduler.pacing().poll_interval_secs, 1.5);

        scheduler.tick(&chain).await.unwrap();
        assert_eq!(scheduler.pacing().poll_interval_secs, 1.0);

        // Floor reached
        scheduler.tick(&chain).await.unwrap();
        assert_eq!(scheduler.pacing().poll_interval_secs, 1.0);
    }

    #[tokio::test]
    async fn test_slow_chain_keeps_interval() {
        let chain = MockChain::new(10, 6000);
        let mut scheduler = BlockScheduler::new(SchedulerConfig::default());
        scheduler.tick(&chain).await.unwrap();

        chain.latest.store(12, Ordering::SeqCst);
        scheduler.tick(&chain).await.unwrap();

        assert_eq!(scheduler.pacing().average_block_time_secs, 6.0);
        assert_eq!(scheduler.pacing().poll_interval_secs, 2.0);
    }

    #[tokio::test]
    async fn test_delta_window_is_bounded() {
        let config = SchedulerConfig {
            block_time_window: 3,
            ..SchedulerConfig::default()
        };
        let chain = MockChain::new(1, 2000);
        let mut scheduler = BlockScheduler::new(config);
        scheduler.tick(&chain).await.unwrap();

        chain.latest.store(100, Ordering::SeqCst);
        for _ in 0..10 {
            scheduler.tick(&chain).await.unwrap();
        }

        assert_eq!(scheduler.block_time_deltas.len(), 3);
        assert_eq!(scheduler.pacing().average_block_time_secs, 2.0);
    }

    #[test]
    fn test_poll_interval_saturates() {
        let config = SchedulerConfig {
            initial_poll_interval_secs: 1e30,
            ..SchedulerConfig::default()
        };
        let scheduler = BlockScheduler::new(config);
        assert_eq!(scheduler.poll_interval(), Duration::MAX);
    }

    #[tokio::test]
    async fn test_failure_leaves_state_intact() {
        let chain = MockChain::new(30, 1000);
        let mut scheduler = BlockScheduler::new(SchedulerConfig::default());
        scheduler.tick(&chain).await.unwrap();

        chain.latest.store(31, Ordering::SeqCst);
        chain.fail_next.store(true, Ordering::SeqCst);
        assert!(scheduler.tick(&chain).await.is_err());
        assert_eq!(scheduler.current_height(), Some(30));

        let pointer = recorded(scheduler.tick(&chain).await.unwrap());
        assert_eq!(pointer.height, 30);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_loop_reports_blocks_and_failures() {
        let chain = Arc::new(MockChain::new(7, 1000));
        chain.fail_next.store(true, Ordering::SeqCst);
        let (tx, mut rx) = mpsc::unbounded_channel();

        let handle = spawn_fetch_loop(chain.clone(), BlockScheduler::new(SchedulerConfig::default()), tx);

        match rx.recv().await.unwrap() {
            FetchEvent::Failed { pacing, .. } => assert_eq!(pacing.poll_interval_secs, 2.5),
            other => panic!("unexpected event {:?}", other),
        }
        match rx.recv().await.unwrap() {
            FetchEvent::Block { pointer, .. } => assert_eq!(pointer.height, 6),
            other => panic!("unexpected event {:?}", other),
        }

        drop(rx);
        handle.await.unwrap();
    }
}
