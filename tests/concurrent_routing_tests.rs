/// Concurrent routing tests
///
/// Routing decisions must never leak between calls running in parallel or
/// between consecutive calls on a reused worker.
/// Run with: cargo test --test concurrent_routing_tests

use db_router::{RouteSpec, RoutingDecision, ShardConfig, ShardRouter, context};
use futures::future::join_all;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tokio::sync::Barrier;

fn router() -> ShardRouter {
    let mut router = ShardRouter::new(ShardConfig::new(4, 8, "userId").unwrap());
    router.register("app.UserDao", RouteSpec::default_key().split_table(true));
    router
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_tasks_see_only_their_own_decision() {
    let router = Arc::new(router());
    let num_tasks = 32;
    let barrier = Arc::new(Barrier::new(num_tasks));
    let mut handles = vec![];

    for task_id in 0..num_tasks {
        let router = Arc::clone(&router);
        let barrier = Arc::clone(&barrier);

        handles.push(tokio::spawn(async move {
            let key = format!("user:{}", task_id);
            let expected = router.decide(&key);

            let seen = router
                .call("app.UserDao.queryUser", &[&key], move || async move {
                    // every task is inside its call before anyone proceeds
                    barrier.wait().await;
                    tokio::task::yield_now().await;
                    tokio::time::sleep(Duration::from_millis(1)).await;
                    Ok(context::current().and_then(|ctx| ctx.decision()))
                })
                .await
                .unwrap();

            assert_eq!(seen, Some(expected), "Task {} observed a foreign decision", task_id);
            assert!(!context::in_scope());
        }));
    }

    for result in join_all(handles).await {
        result.unwrap();
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_reused_workers_start_clean() {
    let router = Arc::new(router());
    let mut handles = vec![];

    for task_id in 0..8 {
        let router = Arc::clone(&router);
        handles.push(tokio::spawn(async move {
            let shared: &ShardRouter = &router;
            for i in 0..50 {
                let key = format!("user:{}:{}", task_id, i);
                let expected = router.decide(&key);

                let seen = router
                    .call("app.UserDao.insertUser", &[&key], || async {
                        tokio::task::yield_now().await;
                        Ok(context::current().and_then(|ctx| ctx.decision()))
                    })
                    .await
                    .unwrap();
                assert_eq!(seen, Some(expected));

                // an unrouted call on the same worker sees nothing
                let leftover = router
                    .call("app.Unrouted.call", &[], move || async move {
                        Ok(shared.current_source_key())
                    })
                    .await
                    .unwrap();
                assert_eq!(leftover, None);
            }
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }
}

#[test]
fn test_parallel_threads_blocking_calls() {
    let router = Arc::new(router());
    let mut handles = vec![];

    for thread_id in 0..8 {
        let router = Arc::clone(&router);
        handles.push(thread::spawn(move || {
            for i in 0..200 {
                let key = format!("{}-{}", thread_id, i);
                let expected = router.decide(&key);

                let (seen, sql) = router
                    .call_blocking("app.UserDao.queryUser", &[&key], || {
                        thread::yield_now();
                        let sql = router
                            .prepare_statement("app.UserDao.queryUser", "select * from user")?;
                        Ok((context::current().and_then(|ctx| ctx.decision()), sql))
                    })
                    .unwrap();

                assert_eq!(seen, Some(expected));
                assert_eq!(sql, format!("select * from user_{}", expected.tb_key()));
                assert_eq!(context::current(), None);
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_failed_call_does_not_leak_into_next_call() {
    let router = router();

    let failed: db_router::Result<()> =
        router.call_blocking("app.UserDao.insertUser", &[&"user:1"], || {
            router.prepare_statement("app.UserDao.insertUser", "select 1")?;
            Ok(())
        });
    assert!(failed.is_err());

    let next = router
        .call_blocking("app.Unrouted.call", &[], || Ok(router.current_source_key()))
        .unwrap();
    assert_eq!(next, None);
}

#[test]
fn test_panicking_call_does_not_leak() {
    let router = Arc::new(router());

    let panicking = Arc::clone(&router);
    let result = thread::spawn(move || {
        std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _: db_router::Result<()> =
                panicking.call_blocking("app.UserDao.insertUser", &[&"user:1"], || {
                    panic!("driver failure");
                });
        }))
        .is_err()
    })
    .join()
    .unwrap();
    assert!(result);

    assert_eq!(context::current(), None);
    let decision: Option<RoutingDecision> = router
        .call_blocking("app.Unrouted.call", &[], || {
            Ok(context::current().and_then(|ctx| ctx.decision()))
        })
        .unwrap();
    assert_eq!(decision, None);
}
