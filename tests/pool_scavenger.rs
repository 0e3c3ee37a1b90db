use std::thread;
use std::time::Duration;

mod support;

use support::{TestDriver, options};

#[test]
fn trims_idle_sessions_back_to_init_size() -> anyhow::Result<()> {
    support::init_logging();
    let driver = TestDriver::new();
    let pool = options(2, 6)
        .acquire_timeout(Duration::from_secs(2))
        .max_idle_time(Duration::from_secs(1))
        .open_with(driver.clone())?;

    // Burst to max_size, then go fully idle.
    let burst: Vec<_> = (0..6).map(|_| pool.acquire()).collect::<Result<_, _>>()?;
    assert_eq!(pool.size(), 6);
    drop(burst);
    assert_eq!(pool.num_idle(), 6);

    thread::sleep(Duration::from_secs(3));

    assert_eq!(pool.size(), 2);
    assert_eq!(pool.num_idle(), 2);

    // The survivors are healthy.
    let mut conn = pool.acquire()?;
    assert!(conn.healthy());
    Ok(())
}

#[test]
fn never_trims_below_init_size() -> anyhow::Result<()> {
    let driver = TestDriver::new();
    let pool = options(2, 2)
        .max_idle_time(Duration::from_millis(300))
        .open_with(driver)?;

    thread::sleep(Duration::from_secs(1));

    assert_eq!(pool.size(), 2);
    assert_eq!(pool.num_idle(), 2);
    Ok(())
}

#[test]
fn revives_broken_idle_sessions() -> anyhow::Result<()> {
    let driver = TestDriver::new();
    let pool = options(2, 2)
        .max_idle_time(Duration::from_millis(300))
        .open_with(driver.clone())?;

    driver.kill_all();
    thread::sleep(Duration::from_secs(1));

    // Both sessions were reopened in place, not trimmed.
    assert_eq!(pool.size(), 2);
    assert_eq!(pool.num_idle(), 2);
    assert_eq!(driver.opened(), 4);

    let mut conn = pool.acquire()?;
    assert!(conn.healthy());
    Ok(())
}

#[test]
fn drops_idle_sessions_that_cannot_be_reopened() -> anyhow::Result<()> {
    let driver = TestDriver::new();
    let pool = options(2, 2)
        .acquire_timeout(Duration::from_secs(2))
        .max_idle_time(Duration::from_millis(300))
        .open_with(driver.clone())?;

    // Both idle sessions die and their reopens fail; once the failures are
    // used up the producer can top the pool back up on demand.
    driver.kill_all();
    driver.fail_next_connects(2);
    thread::sleep(Duration::from_secs(1));

    assert!(driver.closed() >= 2);
    let mut conn = pool.acquire()?;
    assert!(conn.healthy());
    assert!(pool.size() >= 1);
    Ok(())
}
