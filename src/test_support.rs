//! Test support utilities shared across unit and integration tests.

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::env;
use std::ffi::OsString;
use std::fmt;
use std::future::{Ready, ready};
use std::net::IpAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex as StdMutex, PoisonError};

use tokio::sync::{Mutex, MutexGuard};

use crate::converge::{Classify, ErrorClass};
use crate::reverse_dns::{Resolve, ResolveError, ResolveFuture};
use crate::scaleway::{
    ApiFuture, FlexibleIp, InstanceIpApi, NodeRecord, PoolApi, PoolRecord, Region,
    ScalewayApiError, Zone,
};

fn lock<T>(mutex: &StdMutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Error returned by [`ScriptedQuery`] steps.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ScriptedError {
    /// Classification reported to the poller.
    pub class: ErrorClass,
    /// Message rendered in diagnostics.
    pub message: String,
}

impl ScriptedError {
    /// Builds a transient error.
    #[must_use]
    pub fn transient(message: &str) -> Self {
        Self {
            class: ErrorClass::Transient,
            message: message.to_owned(),
        }
    }

    /// Builds a not-found error.
    #[must_use]
    pub fn not_found(message: &str) -> Self {
        Self {
            class: ErrorClass::NotFound,
            message: message.to_owned(),
        }
    }

    /// Builds a permanent error.
    #[must_use]
    pub fn permanent(message: &str) -> Self {
        Self {
            class: ErrorClass::Permanent,
            message: message.to_owned(),
        }
    }
}

impl fmt::Display for ScriptedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl Classify for ScriptedError {
    fn class(&self) -> ErrorClass {
        self.class
    }
}

/// Remote read that replays pre-seeded results in FIFO order.
///
/// Once the script runs out the fallback set with
/// [`ScriptedQuery::then_repeat`] is returned forever; without one, every
/// further call yields a transient "script exhausted" error.
#[derive(Debug)]
pub struct ScriptedQuery<S> {
    steps: StdMutex<VecDeque<Result<S, ScriptedError>>>,
    fallback: Option<Result<S, ScriptedError>>,
    calls: AtomicU32,
}

impl<S: Clone> ScriptedQuery<S> {
    /// Creates a query replaying `steps`.
    pub fn new(steps: impl IntoIterator<Item = Result<S, ScriptedError>>) -> Self {
        Self {
            steps: StdMutex::new(steps.into_iter().collect()),
            fallback: None,
            calls: AtomicU32::new(0),
        }
    }

    /// Creates a query yielding the given states in order.
    #[must_use]
    pub fn states(states: impl IntoIterator<Item = S>) -> Self {
        Self::new(states.into_iter().map(Ok))
    }

    /// Result returned once the scripted steps are used up.
    #[must_use]
    pub fn then_repeat(mut self, result: Result<S, ScriptedError>) -> Self {
        self.fallback = Some(result);
        self
    }

    /// Produces the next scripted result.
    pub fn next(&self) -> Ready<Result<S, ScriptedError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = lock(&self.steps).pop_front();
        ready(step.unwrap_or_else(|| {
            self.fallback
                .clone()
                .unwrap_or_else(|| Err(ScriptedError::transient("script exhausted")))
        }))
    }

    /// Number of times [`ScriptedQuery::next`] has been called.
    #[must_use]
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

/// Resolver answering from a per-name script.
///
/// The last scripted answer for a name is sticky; unknown names fail with
/// a resolution error.
#[derive(Debug, Default)]
pub struct ScriptedResolver {
    answers: StdMutex<HashMap<String, VecDeque<Result<Vec<IpAddr>, ResolveError>>>>,
    lookups: AtomicU32,
}

impl ScriptedResolver {
    /// Creates a resolver with no answers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an answer for `name`.
    pub fn push_addresses(&self, name: &str, addresses: &[IpAddr]) {
        lock(&self.answers)
            .entry(name.to_owned())
            .or_default()
            .push_back(Ok(addresses.to_vec()));
    }

    /// Queues a lookup failure for `name`.
    pub fn push_failure(&self, name: &str, message: &str) {
        lock(&self.answers)
            .entry(name.to_owned())
            .or_default()
            .push_back(Err(ResolveError::new(name, message)));
    }

    /// Number of lookups performed so far.
    #[must_use]
    pub fn lookups(&self) -> u32 {
        self.lookups.load(Ordering::SeqCst)
    }

    fn answer(&self, name: &str) -> Result<Vec<IpAddr>, ResolveError> {
        let mut answers = lock(&self.answers);
        let Some(queue) = answers.get_mut(name) else {
            return Err(ResolveError::new(name, "no such host"));
        };
        if queue.len() > 1 {
            queue
                .pop_front()
                .unwrap_or_else(|| Err(ResolveError::new(name, "no such host")))
        } else {
            queue
                .front()
                .cloned()
                .unwrap_or_else(|| Err(ResolveError::new(name, "no such host")))
        }
    }
}

impl Resolve for ScriptedResolver {
    fn lookup<'a>(&'a self, name: &'a str) -> ResolveFuture<'a> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let answer = self.answer(name);
        Box::pin(async move { answer })
    }
}

/// In-memory Instance API holding flexible IPs keyed by identifier.
#[derive(Debug, Default)]
pub struct FakeInstanceApi {
    ips: StdMutex<HashMap<String, FlexibleIp>>,
    reverse_updates: StdMutex<Vec<(String, Option<String>)>>,
    failure: StdMutex<Option<ScalewayApiError>>,
}

impl FakeInstanceApi {
    /// Creates an API with no IPs.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an IP with no reverse.
    pub fn insert_ip(&self, id: &str, address: IpAddr) {
        lock(&self.ips).insert(
            id.to_owned(),
            FlexibleIp {
                id: id.to_owned(),
                address,
                reverse: None,
            },
        );
    }

    /// Removes an IP, so later calls see a 403 as the Instance API does.
    pub fn remove_ip(&self, id: &str) {
        lock(&self.ips).remove(id);
    }

    /// Makes every following call fail with `error`.
    pub fn fail_with(&self, error: ScalewayApiError) {
        *lock(&self.failure) = Some(error);
    }

    /// Reverse updates sent so far, as `(ip id, reverse)` pairs.
    #[must_use]
    pub fn reverse_updates(&self) -> Vec<(String, Option<String>)> {
        lock(&self.reverse_updates).clone()
    }

    /// Current reverse of an IP.
    #[must_use]
    pub fn reverse_of(&self, id: &str) -> Option<String> {
        lock(&self.ips).get(id).and_then(|ip| ip.reverse.clone())
    }

    fn find(&self, ip: &str) -> Result<FlexibleIp, ScalewayApiError> {
        if let Some(error) = lock(&self.failure).clone() {
            return Err(error);
        }
        let ips = lock(&self.ips);
        ips.get(ip)
            .or_else(|| ips.values().find(|candidate| candidate.address.to_string() == ip))
            .cloned()
            .ok_or_else(|| ScalewayApiError::Http {
                status: 403,
                message: String::from("ip not found"),
            })
    }
}

impl InstanceIpApi for FakeInstanceApi {
    fn get_ip<'a>(&'a self, _zone: &'a Zone, ip: &'a str) -> ApiFuture<'a, FlexibleIp> {
        let result = self.find(ip);
        Box::pin(async move { result })
    }

    fn set_ip_reverse<'a>(
        &'a self,
        _zone: &'a Zone,
        ip_id: &'a str,
        reverse: Option<&'a str>,
    ) -> ApiFuture<'a, FlexibleIp> {
        let result = self.find(ip_id).map(|found| {
            lock(&self.reverse_updates).push((found.id.clone(), reverse.map(str::to_owned)));
            let mut ips = lock(&self.ips);
            let entry = ips.entry(found.id.clone()).or_insert(found);
            entry.reverse = reverse.map(str::to_owned);
            entry.clone()
        });
        Box::pin(async move { result })
    }
}

/// Kubernetes API double replaying pool and node reads.
///
/// The last scripted pool read and node listing are sticky, so a script of
/// `[scaling, ready]` keeps answering `ready` afterwards.
#[derive(Debug, Default)]
pub struct FakePoolApi {
    pools: StdMutex<VecDeque<Result<PoolRecord, ScalewayApiError>>>,
    nodes: StdMutex<VecDeque<Vec<NodeRecord>>>,
    resizes: StdMutex<Vec<u32>>,
    deletions: AtomicU32,
    pool_reads: AtomicU32,
}

impl FakePoolApi {
    /// Creates an API with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a pool read.
    pub fn push_pool(&self, status: &str, size: u32) {
        lock(&self.pools).push_back(Ok(pool_record(status, size)));
    }

    /// Queues a pool read failing with `error`.
    pub fn push_pool_error(&self, error: ScalewayApiError) {
        lock(&self.pools).push_back(Err(error));
    }

    /// Queues a node listing given as `(id, status)` pairs.
    pub fn push_nodes(&self, nodes: &[(&str, &str)]) {
        lock(&self.nodes).push_back(
            nodes
                .iter()
                .map(|(id, status)| node_record(id, status))
                .collect(),
        );
    }

    /// Sizes requested through [`PoolApi::update_pool_size`].
    #[must_use]
    pub fn resizes(&self) -> Vec<u32> {
        lock(&self.resizes).clone()
    }

    /// Number of deletions requested.
    #[must_use]
    pub fn deletions(&self) -> u32 {
        self.deletions.load(Ordering::SeqCst)
    }

    /// Number of pool reads performed.
    #[must_use]
    pub fn pool_reads(&self) -> u32 {
        self.pool_reads.load(Ordering::SeqCst)
    }

    fn next_pool(&self) -> Result<PoolRecord, ScalewayApiError> {
        self.pool_reads.fetch_add(1, Ordering::SeqCst);
        next_sticky(&mut lock(&self.pools)).unwrap_or_else(|| {
            Err(ScalewayApiError::Http {
                status: 404,
                message: String::from("pool not found"),
            })
        })
    }

    fn next_nodes(&self) -> Vec<NodeRecord> {
        next_sticky(&mut lock(&self.nodes)).unwrap_or_default()
    }
}

fn next_sticky<T: Clone>(queue: &mut VecDeque<T>) -> Option<T> {
    if queue.len() > 1 {
        queue.pop_front()
    } else {
        queue.front().cloned()
    }
}

impl PoolApi for FakePoolApi {
    fn get_pool<'a>(&'a self, _region: &'a Region, _pool_id: &'a str) -> ApiFuture<'a, PoolRecord> {
        let result = self.next_pool();
        Box::pin(async move { result })
    }

    fn list_pool_nodes<'a>(
        &'a self,
        _region: &'a Region,
        _pool_id: &'a str,
    ) -> ApiFuture<'a, Vec<NodeRecord>> {
        let nodes = self.next_nodes();
        Box::pin(async move { Ok(nodes) })
    }

    fn update_pool_size<'a>(
        &'a self,
        _region: &'a Region,
        _pool_id: &'a str,
        size: u32,
    ) -> ApiFuture<'a, PoolRecord> {
        lock(&self.resizes).push(size);
        Box::pin(async move { Ok(pool_record("scaling", size)) })
    }

    fn delete_pool<'a>(
        &'a self,
        _region: &'a Region,
        _pool_id: &'a str,
    ) -> ApiFuture<'a, PoolRecord> {
        self.deletions.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move { Ok(pool_record("deleting", 0)) })
    }
}

/// Builds a pool record with the fixed test identifier `pool-1`.
#[must_use]
pub fn pool_record(status: &str, size: u32) -> PoolRecord {
    PoolRecord {
        id: String::from("pool-1"),
        name: String::from("default"),
        status: status.to_owned(),
        size,
    }
}

/// Builds a node record named after its identifier.
#[must_use]
pub fn node_record(id: &str, status: &str) -> NodeRecord {
    NodeRecord {
        id: id.to_owned(),
        name: id.to_owned(),
        status: status.to_owned(),
    }
}

/// Global mutex used to serialise environment mutation in tests.
pub static ENV_LOCK: Mutex<()> = Mutex::const_new(());

/// Guard that holds the env mutex and restores variables on drop.
pub struct EnvGuard {
    previous: Vec<(String, Option<OsString>)>,
    _guard: MutexGuard<'static, ()>,
}

impl EnvGuard {
    /// Sets and removes environment variables while holding a global mutex.
    /// A `None` value removes the variable for the guard's lifetime.
    pub async fn set_vars(pairs: &[(&str, Option<&str>)]) -> Self {
        debug_assert!(
            {
                let mut seen = BTreeSet::new();
                pairs.iter().all(|(key, _)| seen.insert(*key))
            },
            "duplicate environment variable keys passed to EnvGuard::set_vars"
        );

        let guard = ENV_LOCK.lock().await;
        let mut previous = Vec::with_capacity(pairs.len());
        for (key, value) in pairs {
            previous.push(((*key).to_owned(), env::var_os(key)));
            // SAFETY: Environment mutation is serialised by `ENV_LOCK`, preventing races.
            unsafe {
                match value {
                    Some(val) => env::set_var(key, val),
                    None => env::remove_var(key),
                }
            }
        }

        Self {
            previous,
            _guard: guard,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, old) in &self.previous {
            // SAFETY: Environment mutation is serialised by holding `_guard`.
            unsafe {
                match old {
                    Some(val) => env::set_var(key, val),
                    None => env::remove_var(key),
                }
            }
        }
    }
}
