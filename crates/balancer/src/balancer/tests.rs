use crate::{
    Balancer, BalancerConfig, LogEntry, PoolScaler, RandomRequests, Request, RequestSource,
    RunSummary, SleepProvider, Step, TimeSource, WorkerId, WorkerPool,
};
use core::cell::Cell;
use core::time::Duration;

/// Advances by `step` milliseconds on every reading.
struct StepClock {
    now: Cell<u64>,
    step: u64,
}

impl StepClock {
    fn new(step: u64) -> Self {
        Self {
            now: Cell::new(0),
            step,
        }
    }
}

impl TimeSource for StepClock {
    fn current_millis(&self) -> u64 {
        let now = self.now.get();
        self.now.set(now + self.step);
        now
    }
}

/// Hands out `10.0.<n / 256>.<n % 256>` addresses with one unit of work.
#[derive(Default)]
struct Sequential {
    issued: u32,
}

impl RequestSource for Sequential {
    fn next_request(&mut self) -> Request {
        let n = self.issued;
        self.issued += 1;
        Request::new(format!("10.0.{}.{}", n / 256, n % 256), 1)
    }
}

struct NoSleep;
impl SleepProvider for NoSleep {
    async fn sleep_for(_dur: Duration) {}
}

fn config() -> BalancerConfig {
    BalancerConfig {
        scaler: PoolScaler::new(1),
        ..BalancerConfig::default()
    }
}

fn balancer(workers: usize, pending: Vec<Request>) -> Balancer<Sequential> {
    Balancer::with_state(
        WorkerPool::with_workers(workers),
        pending,
        config(),
        Sequential::default(),
    )
}

fn ids<S: RequestSource>(balancer: &Balancer<S>) -> Vec<WorkerId> {
    balancer.pool().ids().collect()
}

#[test]
fn initial_state_is_prefilled() {
    let balancer = Balancer::new(3, config(), Sequential::default());
    assert_eq!(ids(&balancer), vec![0, 1, 2]);
    assert_eq!(balancer.pending_len(), 300);
    assert!(balancer.log().is_empty());
}

#[test]
fn completion_reports_request_work() {
    let mut balancer = balancer(1, vec![Request::new("10.1.1.1", 37)]);
    match balancer.step() {
        Step::Completed(completion) => {
            assert_eq!(completion.worker(), 0);
            assert_eq!(completion.source(), "10.1.1.1");
            assert_eq!(completion.cycles(), 37);
        }
        other => panic!("expected completion, got {other:?}"),
    }
    assert_eq!(
        balancer.log()[0].to_string(),
        "completed request (ID: 0): 10.1.1.1 in 37 cycles"
    );
}

#[test]
fn blocked_requests_never_reach_a_worker() {
    let mut balancer = balancer(
        3,
        vec![
            Request::new("200.145.7.7", 10),
            Request::new("10.0.0.1", 10),
            Request::new("200.145.0.1", 10),
        ],
    );

    assert_eq!(balancer.step(), Step::Blocked);
    // the front worker was not engaged, so it is still at the front
    assert_eq!(ids(&balancer), vec![0, 1, 2]);

    assert!(matches!(balancer.step(), Step::Completed(c) if c.worker() == 0));
    assert_eq!(ids(&balancer), vec![1, 2, 0]);

    assert_eq!(balancer.step(), Step::Blocked);
    assert_eq!(ids(&balancer), vec![1, 2, 0]);

    let lines: Vec<String> = balancer.log().iter().map(ToString::to_string).collect();
    assert_eq!(
        lines,
        vec![
            "BLOCKED IP: 200.145.7.7 REQUEST DISMISSED",
            "completed request (ID: 0): 10.0.0.1 in 10 cycles",
            "BLOCKED IP: 200.145.0.1 REQUEST DISMISSED",
        ]
    );
    assert!(balancer.log().iter().all(|entry| match entry {
        LogEntry::Completed(c) => !c.source().starts_with("200.145."),
        _ => true,
    }));
}

#[test]
fn malformed_addresses_are_dropped_and_logged() {
    let mut balancer = balancer(
        1,
        vec![Request::new("300.1.1.1", 4), Request::new("10.0.0.2", 4)],
    );
    assert_eq!(balancer.step(), Step::Rejected);
    assert!(matches!(balancer.step(), Step::Completed(_)));
    assert_eq!(
        balancer.log()[0],
        LogEntry::Rejected {
            source: "300.1.1.1".into()
        }
    );
    assert_eq!(balancer.summary().rejected, 1);
}

#[test]
fn requests_leave_in_arrival_order_across_workers() {
    let pending: Vec<Request> = (1..=6)
        .map(|n| Request::new(format!("10.9.9.{n}"), n))
        .collect();
    let mut balancer = balancer(2, pending);

    let served: Vec<(WorkerId, String)> = (0..6)
        .map(|_| match balancer.step() {
            Step::Completed(c) => (c.worker(), c.source().to_owned()),
            other => panic!("expected completion, got {other:?}"),
        })
        .collect();

    assert_eq!(
        served,
        vec![
            (0, "10.9.9.1".to_owned()),
            (1, "10.9.9.2".to_owned()),
            (0, "10.9.9.3".to_owned()),
            (1, "10.9.9.4".to_owned()),
            (0, "10.9.9.5".to_owned()),
            (1, "10.9.9.6".to_owned()),
        ]
    );
}

#[test]
fn arrival_fires_when_queue_length_is_a_multiple_of_five() {
    // 6 pending -> 5 after dispatch -> one arrival -> 6
    let mut balancer = balancer(1, vec![Request::new("10.0.0.1", 1); 6]);
    balancer.step();
    assert_eq!(balancer.pending_len(), 6);
    assert_eq!(
        balancer.pending().last().map(Request::source),
        Some("10.0.0.0")
    );

    // 6 -> 5 again, so it fires again; 7 -> 6 would not
    balancer.step();
    assert_eq!(balancer.pending_len(), 6);
    assert_eq!(balancer.summary().arrivals, 2);
}

#[test]
fn arrivals_reseed_an_emptied_queue() {
    let mut balancer = balancer(1, vec![Request::new("10.0.0.1", 1)]);
    balancer.step();
    assert_eq!(balancer.pending_len(), 1);
    balancer.step();
    assert_eq!(balancer.pending_len(), 1);
}

#[test]
fn blocked_iterations_still_trigger_arrivals() {
    let mut balancer = balancer(1, vec![Request::new("200.145.1.1", 1)]);
    assert_eq!(balancer.step(), Step::Blocked);
    assert_eq!(balancer.pending_len(), 1);
}

#[test]
fn overload_grows_the_pool_with_fresh_identities() {
    // 100 pending, 1 worker: after dispatch 99 remain, ratio 99 -> grow 9
    let mut balancer = balancer(1, vec![Request::new("10.0.0.1", 1); 100]);
    balancer.step();
    assert_eq!(balancer.pending_len(), 99);
    assert_eq!(ids(&balancer), (0..10).collect::<Vec<_>>());
    assert_eq!(balancer.summary().workers_added, 9);
}

#[test]
fn light_load_shrinks_from_the_front() {
    // 200 pending, 10 workers: after dispatch 199 remain, ratio 19 -> shrink 2
    let mut balancer = balancer(10, vec![Request::new("10.0.0.1", 1); 200]);
    balancer.step();
    assert_eq!(ids(&balancer), vec![3, 4, 5, 6, 7, 8, 9, 0]);
    assert_eq!(balancer.summary().workers_removed, 2);
}

#[test]
fn moderate_load_keeps_the_pool() {
    // 501 pending, 10 workers: after dispatch 500 remain, ratio 50
    let mut balancer = balancer(10, vec![Request::new("10.0.0.1", 1); 501]);
    for _ in 0..3 {
        balancer.step();
        assert_eq!(balancer.pool().len(), 10);
    }
}

#[test]
fn identities_stay_unique_across_scaling() {
    let mut balancer = Balancer::new(4, config(), RandomRequests::seeded(11));
    let mut seen = std::collections::HashSet::new();
    for _ in 0..5_000 {
        balancer.step();
        let current = ids(&balancer);
        let unique: std::collections::HashSet<_> = current.iter().copied().collect();
        assert_eq!(unique.len(), current.len());
        seen.extend(current);
    }
    let max = seen.iter().copied().max().unwrap_or(0);
    assert_eq!(seen.len() as u64, max + 1);
}

#[test]
fn empty_queue_stays_idle_until_deadline() {
    let mut balancer = balancer(1, Vec::new());
    let mut ticks = Vec::new();
    let summary = balancer.run(&StepClock::new(1), Duration::from_millis(10), |tick| {
        ticks.push(tick)
    });

    assert_eq!(summary.iterations, 10);
    assert_eq!(summary.idle_ticks, 10);
    assert_eq!(summary.entries(), 0);
    assert_eq!(ticks, vec![Duration::from_millis(1); 10]);
    assert!(balancer.log().is_empty());
    assert_eq!(summary.pool_size, 1);
}

#[test]
fn empty_pool_stays_idle() {
    let mut balancer = balancer(0, vec![Request::new("10.0.0.1", 1); 3]);
    assert_eq!(balancer.step(), Step::Idle);
    assert_eq!(balancer.pending_len(), 3);
    assert!(balancer.log().is_empty());
}

#[test]
fn run_checks_deadline_once_per_iteration() {
    let mut balancer = Balancer::new(2, config(), Sequential::default());
    let summary = balancer.run(&StepClock::new(2), Duration::from_millis(20), |_| {});
    assert_eq!(summary.iterations, 10);
    assert_eq!(summary.completed, 10);
    assert_eq!(balancer.log().len(), 10);
}

#[test]
fn seeded_runs_are_reproducible() {
    let run = |seed| {
        let mut balancer = Balancer::new(3, config(), RandomRequests::seeded(seed));
        balancer.run(&StepClock::new(1), Duration::from_millis(500), |_| {});
        balancer.drain_log()
    };
    let first = run(5);
    assert_eq!(first.len(), 500);
    assert_eq!(first, run(5));
    assert_ne!(first, run(6));
}

#[test]
fn drain_log_empties_the_log() {
    let mut balancer = balancer(1, vec![Request::new("10.0.0.1", 1); 2]);
    balancer.step();
    balancer.step();
    assert_eq!(balancer.drain_log().len(), 2);
    assert!(balancer.log().is_empty());
}

#[test]
fn summary_counts_every_outcome() {
    let mut balancer = balancer(
        1,
        vec![
            Request::new("10.0.0.1", 1),
            Request::new("200.145.0.1", 1),
            Request::new("bogus", 1),
            Request::new("10.0.0.2", 1),
            Request::new("10.0.0.3", 1),
            Request::new("10.0.0.4", 1),
            Request::new("10.0.0.5", 1),
        ],
    );
    // the second and third steps leave five pending, so each triggers an arrival
    for _ in 0..3 {
        balancer.step();
    }
    let summary = balancer.summary();
    assert_eq!(
        summary,
        RunSummary {
            iterations: 3,
            idle_ticks: 0,
            completed: 1,
            blocked: 1,
            rejected: 1,
            arrivals: 2,
            workers_added: 0,
            workers_removed: 0,
            pool_size: 1,
            pending: 6,
        }
    );
}

#[tokio::test]
async fn async_run_matches_sync_run() {
    let mut sync = Balancer::new(2, config(), RandomRequests::seeded(21));
    sync.run(&StepClock::new(1), Duration::from_millis(50), |_| {});

    let mut async_ = Balancer::new(2, config(), RandomRequests::seeded(21));
    let summary = async_
        .run_async::<NoSleep, _>(&StepClock::new(1), Duration::from_millis(50))
        .await;

    assert_eq!(summary, sync.summary());
    assert_eq!(async_.log(), sync.log());
}

#[tokio::test]
async fn async_run_idles_through_the_sleep_provider() {
    let mut balancer = balancer(1, Vec::new());
    let summary = balancer
        .run_async::<NoSleep, _>(&StepClock::new(5), Duration::from_millis(25))
        .await;
    assert_eq!(summary.iterations, 5);
    assert_eq!(summary.idle_ticks, 5);
}
