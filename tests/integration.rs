//! End-to-end dispatcher scenarios, run against real `tokio::time` rather
//! than a simulated clock, following the host's own scheduler test style.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rucron::{DiscardLogger, JobContext, Logger, SchedulerBuilder};

#[derive(Clone, Default)]
struct CapturingLogger {
    lines: Arc<Mutex<Vec<String>>>,
}

impl CapturingLogger {
    fn contains(&self, needle: &str) -> bool {
        self.lines.lock().unwrap().iter().any(|l| l.contains(needle))
    }
}

impl Logger for CapturingLogger {
    fn info(&self, msg: &str, fields: &[(&str, &str)]) {
        let mut line = msg.to_string();
        for (k, v) in fields {
            line.push_str(&format!(" {k}={v}"));
        }
        self.lines.lock().unwrap().push(line);
    }

    fn error(&self, err: &(dyn std::error::Error + 'static), msg: &str, fields: &[(&str, &str)]) {
        let mut line = format!("{msg}: {err}");
        for (k, v) in fields {
            line.push_str(&format!(" {k}={v}"));
        }
        self.lines.lock().unwrap().push(line);
    }
}

#[tokio::test]
async fn empty_scheduler_stops_within_a_second() {
    let scheduler: rucron::Scheduler<()> = SchedulerBuilder::new(())
        .with_seconds()
        .with_logger(Arc::new(DiscardLogger))
        .build();

    scheduler.start();
    let start = tokio::time::Instant::now();
    scheduler.stop().await;
    assert!(start.elapsed() < Duration::from_millis(1050));
}

#[tokio::test]
async fn single_per_second_job_fires_exactly_once() {
    let scheduler: rucron::Scheduler<()> = SchedulerBuilder::new(())
        .with_seconds()
        .with_logger(Arc::new(DiscardLogger))
        .build();

    let runs = Arc::new(AtomicUsize::new(0));
    let runs2 = Arc::clone(&runs);
    scheduler
        .add_func(
            "* * * * * *",
            move |_ctx: JobContext<()>| {
                let runs = Arc::clone(&runs2);
                async move {
                    runs.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            },
            Vec::new(),
        )
        .unwrap();

    scheduler.start();
    tokio::time::sleep(Duration::from_millis(1050)).await;
    scheduler.stop().await;

    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn removing_before_first_fire_prevents_invocation() {
    let scheduler: rucron::Scheduler<()> = SchedulerBuilder::new(())
        .with_seconds()
        .with_logger(Arc::new(DiscardLogger))
        .build();

    let runs = Arc::new(AtomicUsize::new(0));
    let runs2 = Arc::clone(&runs);
    let id = scheduler
        .add_func(
            "* * * * * *",
            move |_ctx: JobContext<()>| {
                let runs = Arc::clone(&runs2);
                async move {
                    runs.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            },
            Vec::new(),
        )
        .unwrap();
    scheduler.remove(id);

    scheduler.start();
    tokio::time::sleep(Duration::from_millis(1050)).await;
    scheduler.stop().await;

    assert_eq!(runs.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn snapshot_orders_far_future_entries_last() {
    let scheduler: rucron::Scheduler<()> = SchedulerBuilder::new(())
        .with_seconds()
        .with_logger(Arc::new(DiscardLogger))
        .build();

    scheduler
        .add_job("0 0 0 1 1 ?", Arc::new(rucron::NoopJob), Vec::new())
        .unwrap();
    scheduler
        .add_job("0 0 0 31 12 ?", Arc::new(rucron::NoopJob), Vec::new())
        .unwrap();
    scheduler
        .add_job("* * * * * ?", Arc::new(rucron::NoopJob), Vec::new())
        .unwrap();
    scheduler
        .add_func(
            "@every 1s",
            |_ctx: JobContext<()>| async move { Ok(()) },
            Vec::new(),
        )
        .unwrap();
    scheduler
        .add_func(
            "@every 5m",
            |_ctx: JobContext<()>| async move { Ok(()) },
            Vec::new(),
        )
        .unwrap();
    scheduler
        .add_func(
            "@every 5h",
            |_ctx: JobContext<()>| async move { Ok(()) },
            Vec::new(),
        )
        .unwrap();

    scheduler.start();
    tokio::time::sleep(Duration::from_millis(1100)).await;
    let snapshot = scheduler.entries().await;
    scheduler.stop().await;

    assert_eq!(snapshot.len(), 6);
    for pair in snapshot.windows(2) {
        match (pair[0].next(), pair[1].next()) {
            (Some(a), Some(b)) => assert!(a <= b),
            (Some(_), None) => {}
            (None, None) => {}
            (None, Some(_)) => panic!("a None-next entry sorted before a real one"),
        }
    }
}

#[tokio::test]
async fn concurrent_add_while_running_does_not_catch_up() {
    let scheduler: rucron::Scheduler<()> = SchedulerBuilder::new(())
        .with_seconds()
        .with_logger(Arc::new(DiscardLogger))
        .build();

    scheduler.start();
    tokio::time::sleep(Duration::from_millis(5000)).await;

    let runs = Arc::new(AtomicUsize::new(0));
    let runs2 = Arc::clone(&runs);
    scheduler
        .add_func(
            "* * * * * *",
            move |_ctx: JobContext<()>| {
                let runs = Arc::clone(&runs2);
                async move {
                    runs.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            },
            Vec::new(),
        )
        .unwrap();

    tokio::time::sleep(Duration::from_millis(1050)).await;
    scheduler.stop().await;

    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn graceful_stop_waits_for_a_slow_job() {
    let scheduler: rucron::Scheduler<()> = SchedulerBuilder::new(())
        .with_seconds()
        .with_logger(Arc::new(DiscardLogger))
        .build();

    scheduler
        .add_func(
            "* * * * * *",
            |_ctx: JobContext<()>| async move {
                tokio::time::sleep(Duration::from_secs(2)).await;
                Ok(())
            },
            Vec::new(),
        )
        .unwrap();

    scheduler.start();
    tokio::time::sleep(Duration::from_millis(1050)).await;

    let start = tokio::time::Instant::now();
    scheduler.stop().await;
    let elapsed = start.elapsed();

    assert!(elapsed >= Duration::from_millis(750));
    assert!(elapsed <= Duration::from_millis(2500));
}

#[tokio::test]
async fn recovery_middleware_logs_the_panic_message_and_keeps_dispatching() {
    let logger = CapturingLogger::default();
    let scheduler: rucron::Scheduler<()> = SchedulerBuilder::new(())
        .with_seconds()
        .with_logger(Arc::new(logger.clone()))
        .with_base_middlewares(vec![rucron::middlewares::recovery(Arc::new(
            logger.clone(),
        ))])
        .build();

    scheduler
        .add_func(
            "* * * * * *",
            |_ctx: JobContext<()>| async move {
                panic!("YOLO");
                #[allow(unreachable_code)]
                Ok(())
            },
            Vec::new(),
        )
        .unwrap();

    scheduler.start();
    tokio::time::sleep(Duration::from_millis(1050)).await;
    scheduler.stop().await;

    assert!(logger.contains("YOLO"));
}

#[tokio::test(flavor = "multi_thread")]
async fn no_overlapping_skips_some_of_a_hundred_concurrent_invocations() {
    let logger = CapturingLogger::default();
    let runs = Arc::new(AtomicUsize::new(0));
    let runs2 = Arc::clone(&runs);

    let job: rucron::JobRef<()> = Arc::new(rucron::FnJob::new(move |_ctx: JobContext<()>| {
        let runs = Arc::clone(&runs2);
        async move {
            runs.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(2)).await;
            Ok(())
        }
    }));

    let wrapped = rucron::middlewares::skip_if_still_running::<()>(Arc::new(logger.clone()))(job);

    let mut handles = Vec::with_capacity(100);
    for _ in 0..100 {
        let wrapped = Arc::clone(&wrapped);
        handles.push(tokio::spawn(async move {
            wrapped.run(JobContext::new(())).await
        }));
    }
    for h in handles {
        h.await.unwrap().unwrap();
    }

    assert!(runs.load(Ordering::SeqCst) < 100);
    assert!(logger.contains("still running"));
}
