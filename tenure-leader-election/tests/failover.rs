//! Two competing processes sharing one lock directory

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tempfile::TempDir;
use tenure_leader_election::{
    DistributedLock, ElectionConfig, ElectionState, LeaderElectionService,
};
use tenure_lock::{ActorIdentity, Clock, FileLock, LockConfig, ManualClock};
use tokio_util::sync::CancellationToken;

const LOCK_NAME: &str = "services/leader";
const TIMEOUT: Duration = Duration::from_secs(10);
const POLL: Duration = Duration::from_secs(5);

struct Contender {
    service: LeaderElectionService,
    events: Arc<Mutex<Vec<bool>>>,
}

fn contender(dir: &TempDir, pid: u32, clock: Arc<dyn Clock>, timeout: Duration) -> Contender {
    let config = LockConfig::new(timeout)
        .with_directory(dir.path())
        .with_actor(ActorIdentity::new(pid, format!("contender-{}", pid)))
        .with_clock(clock);
    let lock = FileLock::create(LOCK_NAME, config).unwrap();

    let election = ElectionConfig::new().with_poll_interval(POLL);
    let service = LeaderElectionService::new(Arc::new(lock), election).unwrap();

    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    service.subscribe(move |event| sink.lock().unwrap().push(event.is_leader));

    Contender { service, events }
}

#[test_log::test(tokio::test)]
async fn test_standby_never_leads_while_leader_refreshes() {
    let dir = TempDir::new().unwrap();
    let clock = Arc::new(ManualClock::default());
    let a = contender(&dir, 1, clock.clone(), TIMEOUT);
    let b = contender(&dir, 2, clock.clone(), TIMEOUT);

    assert!(a.service.poll().await);
    for _ in 0..10 {
        assert!(!b.service.poll().await);
        clock.advance(POLL);
        assert!(a.service.poll().await);
    }

    assert_eq!(*a.events.lock().unwrap(), vec![true]);
    assert!(b.events.lock().unwrap().is_empty());
    assert_eq!(b.service.state(), ElectionState::Standby);
}

#[test_log::test(tokio::test)]
async fn test_standby_takes_over_after_timeout() {
    let dir = TempDir::new().unwrap();
    let clock = Arc::new(ManualClock::default());
    let a = contender(&dir, 1, clock.clone(), TIMEOUT);
    let b = contender(&dir, 2, clock.clone(), TIMEOUT);

    assert!(a.service.poll().await);
    assert!(!b.service.poll().await);

    // A stops refreshing. Age 5 and exactly 10 are still live.
    clock.advance(POLL);
    assert!(!b.service.poll().await);
    clock.advance(POLL);
    assert!(!b.service.poll().await);

    clock.advance(Duration::from_secs(1));
    assert!(b.service.poll().await);
    assert_eq!(*b.events.lock().unwrap(), vec![true]);

    // A wakes up and learns it lost the lock.
    assert!(!a.service.poll().await);
    assert_eq!(*a.events.lock().unwrap(), vec![true, false]);
}

#[test_log::test(tokio::test)]
async fn test_release_hands_over_without_waiting() {
    let dir = TempDir::new().unwrap();
    let clock = Arc::new(ManualClock::default());
    let a = contender(&dir, 1, clock.clone(), TIMEOUT);
    let b = contender(&dir, 2, clock.clone(), TIMEOUT);

    assert!(a.service.poll().await);
    assert!(!b.service.poll().await);

    a.service
        .lock()
        .release(&CancellationToken::new())
        .await
        .unwrap();
    assert!(b.service.poll().await);
}

#[test_log::test(tokio::test)]
async fn test_background_loops_fail_over() {
    let dir = TempDir::new().unwrap();
    let timeout = Duration::from_millis(400);
    let poll = Duration::from_millis(50);

    let make = |pid: u32| {
        let config = LockConfig::new(timeout)
            .with_directory(dir.path())
            .with_actor(ActorIdentity::new(pid, "looping"));
        let lock: Arc<dyn DistributedLock> = Arc::new(FileLock::create(LOCK_NAME, config).unwrap());
        let service =
            LeaderElectionService::new(lock, ElectionConfig::new().with_poll_interval(poll))
                .unwrap();
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        service.subscribe(move |event| {
            let _ = tx.send(event.is_leader);
        });
        (service, rx)
    };

    let (a, mut a_events) = make(1);
    a.start().unwrap();
    let a_first = tokio::time::timeout(Duration::from_secs(5), a_events.recv())
        .await
        .unwrap();
    assert_eq!(a_first, Some(true));

    let (b, mut b_events) = make(2);
    b.start().unwrap();

    // Several lock timeouts pass while A keeps refreshing.
    tokio::time::sleep(timeout * 3).await;
    assert!(b_events.try_recv().is_err());
    assert!(!b.is_leader());

    // A stops without releasing; B takes over once the record goes stale.
    a.stop();
    a.stopped().await;
    let b_first = tokio::time::timeout(Duration::from_secs(5), b_events.recv())
        .await
        .unwrap();
    assert_eq!(b_first, Some(true));

    b.stop();
    b.stopped().await;
}
