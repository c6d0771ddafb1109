//! Single-node runtime: lifecycle, per-task processing and status reporting.
//!
//! A node composes the scoring policy, its peer table and (optionally) a shared
//! [`ClusterScheduler`]. Collaborators are injected through the traits in
//! [`crate::ports`].
mod connect;
mod process;

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Instant,
};

use fabric_model::{NetworkStats, NodeConfig, NodeStatus, PeerHello, ScoringStats, TaskId, Tier};
use tracing::info;

use crate::{
    context::ClusterContext,
    entitlement::StaticTierResolver,
    peers::PeerRegistry,
    ports::{Executor, Fulfillment, Generator, PeerConnector, TierResolver},
    scheduler::ClusterScheduler,
    scoring::ScoringPolicy,
    state::{TaskBook, TaskRecord},
};

/// Reputation a node starts with.
pub const INITIAL_REPUTATION: f64 = 50.0;

#[derive(Debug)]
struct RunState {
    running: bool,
    started_at: Option<Instant>,
    tasks_processed: u64,
    tasks_completed: u64,
    reputation: f64,
    scoring: ScoringStats,
}

pub struct NodeRuntime {
    config: NodeConfig,
    public_key: String,
    policy: ScoringPolicy,
    ctx: ClusterContext,
    peers: Arc<PeerRegistry>,
    scheduler: Option<Arc<ClusterScheduler>>,
    resolver: Arc<dyn TierResolver>,
    generator: Arc<dyn Generator>,
    executor: Arc<dyn Executor>,
    fulfillment: Option<Arc<dyn Fulfillment>>,
    connector: Option<Arc<dyn PeerConnector>>,
    book: TaskBook,
    state: Mutex<RunState>,
}

impl NodeRuntime {
    /// Create a stopped node. Every caller resolves to the free tier until a resolver is set.
    pub fn new(
        config: NodeConfig,
        generator: Arc<dyn Generator>,
        executor: Arc<dyn Executor>,
    ) -> Self {
        let ctx = ClusterContext::default();
        let policy =
            ScoringPolicy::new(config.admission_threshold).with_jitter(config.score_jitter);
        let public_key = if config.public_key.is_empty() {
            generate_key(&ctx)
        } else {
            config.public_key.clone()
        };
        Self {
            book: TaskBook::new(config.task_book_limit),
            public_key,
            policy,
            ctx,
            peers: Arc::new(PeerRegistry::new()),
            scheduler: None,
            resolver: Arc::new(StaticTierResolver::new(Tier::free())),
            generator,
            executor,
            fulfillment: None,
            connector: None,
            state: Mutex::new(RunState {
                running: false,
                started_at: None,
                tasks_processed: 0,
                tasks_completed: 0,
                reputation: INITIAL_REPUTATION,
                scoring: ScoringStats::default(),
            }),
            config,
        }
    }

    /// Replace the context (metrics and entropy) and return the updated node.
    ///
    /// Without a configured public key, the key is redrawn from the new entropy source.
    pub fn with_context(mut self, ctx: ClusterContext) -> Self {
        if self.config.public_key.is_empty() {
            self.public_key = generate_key(&ctx);
        }
        self.ctx = ctx;
        self
    }

    pub fn with_scheduler(mut self, scheduler: Arc<ClusterScheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn TierResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_fulfillment(mut self, fulfillment: Arc<dyn Fulfillment>) -> Self {
        self.fulfillment = Some(fulfillment);
        self
    }

    pub fn with_connector(mut self, connector: Arc<dyn PeerConnector>) -> Self {
        self.connector = Some(connector);
        self
    }

    pub fn with_policy(mut self, policy: ScoringPolicy) -> Self {
        self.policy = policy;
        self
    }

    fn lock(&self) -> MutexGuard<'_, RunState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start the node; returns `false` if it was already running.
    ///
    /// Resets the uptime origin and the per-run counters.
    pub fn start(&self) -> bool {
        let mut st = self.lock();
        if st.running {
            return false;
        }
        st.running = true;
        st.started_at = Some(Instant::now());
        st.tasks_processed = 0;
        st.tasks_completed = 0;
        st.scoring = ScoringStats::default();
        info!(node = %self.config.node_id, address = %self.config.address(), "node started");
        true
    }

    /// Stop the node; returns `false` if it was not running.
    pub fn stop(&self) -> bool {
        let mut st = self.lock();
        if !st.running {
            return false;
        }
        st.running = false;
        info!(node = %self.config.node_id, "node stopped");
        true
    }

    pub fn is_running(&self) -> bool {
        self.lock().running
    }

    pub fn node_id(&self) -> &str {
        &self.config.node_id
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn policy(&self) -> &ScoringPolicy {
        &self.policy
    }

    pub fn scheduler(&self) -> Option<&Arc<ClusterScheduler>> {
        self.scheduler.as_ref()
    }

    /// Shared handle to the peer table.
    pub fn peers(&self) -> &Arc<PeerRegistry> {
        &self.peers
    }

    /// Greeting this node sends to (and answers) peers.
    pub fn hello(&self) -> PeerHello {
        PeerHello {
            node_id: self.config.node_id.clone(),
            public_key: self.public_key.clone(),
            version: self.config.version.clone(),
        }
    }

    /// Lifecycle of a recently processed task.
    pub fn task_record(&self, id: &TaskId) -> Option<TaskRecord> {
        self.book.get(id)
    }

    fn uptime_secs(st: &RunState) -> u64 {
        match (st.running, st.started_at) {
            (true, Some(at)) => at.elapsed().as_secs(),
            _ => 0,
        }
    }

    pub fn status(&self) -> NodeStatus {
        let st = self.lock();
        NodeStatus {
            node_id: self.config.node_id.clone(),
            address: self.config.address(),
            running: st.running,
            uptime_secs: Self::uptime_secs(&st),
            peers: self.peers.count(),
            tasks_completed: st.tasks_completed,
            reputation: st.reputation,
        }
    }

    pub fn network_stats(&self) -> NetworkStats {
        let st = self.lock();
        NetworkStats {
            nodes: 1 + self.peers.count(),
            tasks_processed: st.tasks_processed,
            scoring: st.scoring.clone(),
            uptime_secs: Self::uptime_secs(&st),
        }
    }

    fn adjust_reputation(&self, delta: f64) -> f64 {
        let mut st = self.lock();
        st.reputation = (st.reputation + delta).clamp(0.0, 100.0);
        st.reputation
    }
}

fn generate_key(ctx: &ClusterContext) -> String {
    let e = ctx.entropy();
    let hi = (e.unit() * u64::MAX as f64) as u64;
    let lo = (e.unit() * u64::MAX as f64) as u64;
    format!("{hi:016x}{lo:016x}")
}


#[cfg(test)]
pub(crate) mod testing {
    //! Collaborator doubles shared by the node tests.
    use std::{
        sync::atomic::{AtomicU32, Ordering},
        time::Duration,
    };

    use async_trait::async_trait;
    use fabric_model::{FulfillmentRequest, GenerationRequest, PeerAck, PeerHello, TaskId};

    use crate::{
        error::CollaboratorError,
        ports::{Executor, Fulfillment, Generator, PeerConnector, Work},
    };

    pub struct DirectExecutor;

    #[async_trait]
    impl Executor for DirectExecutor {
        fn name(&self) -> &'static str {
            "direct"
        }

        async fn submit(&self, work: Work) -> Result<String, CollaboratorError> {
            work.await
        }
    }

    pub struct Echo;

    #[async_trait]
    impl Generator for Echo {
        fn name(&self) -> &'static str {
            "echo"
        }

        async fn generate(&self, request: GenerationRequest) -> Result<String, CollaboratorError> {
            Ok(format!("done: {}", request.prompt))
        }
    }

    pub struct Broken;

    #[async_trait]
    impl Generator for Broken {
        fn name(&self) -> &'static str {
            "broken"
        }

        async fn generate(&self, _: GenerationRequest) -> Result<String, CollaboratorError> {
            Err(CollaboratorError::Failed("model offline".into()))
        }
    }

    pub struct Slow(pub Duration);

    #[async_trait]
    impl Generator for Slow {
        fn name(&self) -> &'static str {
            "slow"
        }

        async fn generate(&self, _: GenerationRequest) -> Result<String, CollaboratorError> {
            tokio::time::sleep(self.0).await;
            Ok("late".into())
        }
    }

    pub struct Courier {
        pub fail: bool,
    }

    #[async_trait]
    impl Fulfillment for Courier {
        async fn dispatch(
            &self,
            _: &TaskId,
            order_id: &str,
            _: &FulfillmentRequest,
            _: f64,
            _: bool,
        ) -> Result<String, CollaboratorError> {
            if self.fail {
                Err(CollaboratorError::Unavailable("no drones".into()))
            } else {
                Ok(format!("delivery-{order_id}"))
            }
        }
    }

    /// Accepts handshakes for addresses starting with `ok`; fails the first `flaky` calls.
    #[derive(Default)]
    pub struct FakeConnector {
        pub flaky: u32,
        pub calls: AtomicU32,
    }

    #[async_trait]
    impl PeerConnector for FakeConnector {
        async fn handshake(
            &self,
            address: &str,
            _: &PeerHello,
        ) -> Result<PeerAck, CollaboratorError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.flaky {
                return Err(CollaboratorError::Failed("connection reset".into()));
            }
            if let Some(rest) = address.strip_prefix("ok") {
                Ok(PeerAck::ok(format!("peer{rest}"), "k"))
            } else if address.starts_with("hang") {
                std::future::pending::<()>().await;
                unreachable!()
            } else {
                Err(CollaboratorError::Failed("connection refused".into()))
            }
        }
    }
}
