use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant, SystemTime};

use tz_snowflake::{decode, Generator, IdError, TimeSource, TimeUnit};

const EPOCH_MS: i64 = 1_600_000_000_000;

fn next_id_with_backoff<T: TimeSource>(generator: &Generator<T>) -> i64 {
    loop {
        match generator.next_id() {
            Ok(id) => return id,
            Err(IdError::SequenceExhausted { .. }) => thread::sleep(generator.unit().tick()),
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
}

#[test]
fn decoded_fields_are_plausible() {
    let generator = Generator::system(11, EPOCH_MS, TimeUnit::Milliseconds).unwrap();

    let before = TimeUnit::Milliseconds.read(SystemTime::now()) - EPOCH_MS;
    let ids: Vec<i64> = (0..1_000).map(|_| next_id_with_backoff(&generator)).collect();
    let after = TimeUnit::Milliseconds.read(SystemTime::now()) - EPOCH_MS;

    for id in ids {
        assert!(id > 0);
        let fields = decode(id);
        assert_eq!(fields.machine_id, 11);
        assert!(fields.sequence <= tz_snowflake::layout::MAX_SEQUENCE);
        assert!(fields.random <= tz_snowflake::layout::MAX_RANDOM);
        assert!(fields.time_bucket >= before, "{} < {before}", fields.time_bucket);
        assert!(fields.time_bucket <= after, "{} > {after}", fields.time_bucket);
        assert!(fields.unix_time(EPOCH_MS) >= EPOCH_MS);
    }
}

#[test]
fn ids_from_one_instance_are_unique_and_sortable_by_time() {
    let generator = Generator::system(0, 0, TimeUnit::Milliseconds).unwrap();
    let ids: Vec<i64> = (0..50_000).map(|_| next_id_with_backoff(&generator)).collect();

    let unique: HashSet<i64> = ids.iter().copied().collect();
    assert_eq!(unique.len(), ids.len());

    // 时间字段单调不减
    let buckets: Vec<i64> = ids.iter().map(|id| decode(*id).time_bucket).collect();
    assert!(buckets.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn instances_with_different_machine_ids_never_collide() {
    let handles: Vec<_> = [1, 2]
        .into_iter()
        .map(|machine_id| {
            thread::spawn(move || {
                let generator = Generator::system(machine_id, 0, TimeUnit::Seconds).unwrap();
                let mut ids = Vec::new();
                // 秒级单位下很快就会用完序号，只取一个桶的量
                while ids.len() < 16_384 {
                    match generator.next_id() {
                        Ok(id) => ids.push(id),
                        Err(IdError::SequenceExhausted { .. }) => thread::sleep(Duration::from_millis(10)),
                        Err(e) => panic!("unexpected error: {e}"),
                    }
                }
                ids
            })
        })
        .collect();

    let mut seen = HashSet::new();
    for handle in handles {
        for id in handle.join().unwrap() {
            assert!(seen.insert(id), "collision on {id}");
        }
    }
    assert_eq!(seen.len(), 2 * 16_384);
}

#[test]
fn shared_instance_serializes_callers() {
    let generator = Arc::new(Generator::system(6, 0, TimeUnit::Milliseconds).unwrap());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let generator = Arc::clone(&generator);
            thread::spawn(move || (0..5_000).map(|_| next_id_with_backoff(&generator)).collect::<Vec<_>>())
        })
        .collect();

    let mut seen = HashSet::new();
    for handle in handles {
        for id in handle.join().unwrap() {
            assert!(seen.insert(id), "duplicate {id}");
        }
    }
    assert_eq!(seen.len(), 20_000);
}

#[test]
fn cached_generator_lifecycle() {
    let generator = Generator::cached(8, 0, TimeUnit::Milliseconds).unwrap();
    assert!(generator.start());
    assert!(!generator.start());

    let now = TimeUnit::Milliseconds.read(SystemTime::now());
    let id = next_id_with_backoff(&generator);
    let fields = decode(id);
    assert_eq!(fields.machine_id, 8);
    assert!((now - fields.time_bucket).abs() <= 1_000);

    generator.stop();
    assert!(!generator.is_running());
    // 等旧线程做完可能正在进行的最后一次刷新
    thread::sleep(Duration::from_millis(5));

    // 停止后仍可以用最后缓存的时间继续发号
    let frozen = generator.time_source().current_bucket();
    let after_stop = decode(generator.next_id().unwrap());
    assert_eq!(after_stop.time_bucket, frozen);
    thread::sleep(Duration::from_millis(10));
    assert_eq!(generator.time_source().current_bucket(), frozen);
}

#[test]
fn cached_generator_restarts_immediately_after_stop() {
    let generator = Generator::cached(9, 0, TimeUnit::Milliseconds).unwrap();
    assert!(generator.start());
    thread::sleep(Duration::from_millis(3));
    generator.stop();
    assert!(generator.start());

    // 重启后时间继续前进，不会卡在同一个桶里
    let first = decode(next_id_with_backoff(&generator)).time_bucket;
    let deadline = Instant::now() + Duration::from_secs(2);
    loop {
        let bucket = decode(next_id_with_backoff(&generator)).time_bucket;
        if bucket > first {
            break;
        }
        assert!(Instant::now() < deadline, "cached clock stuck at {first}");
        thread::sleep(Duration::from_millis(1));
    }
    generator.stop();
}
