use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use syringe::{Injectable, Injector};

struct Pool {
    id: usize,
}

impl Injectable for Pool {}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_singleton_resolution() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let counter = Arc::new(AtomicUsize::new(0));
    let module_counter = counter.clone();
    let injector = Injector::builder()
        .configure(move |binder| {
            let counter = module_counter.clone();
            binder
                .bind::<Pool>()
                .to_provider(move |_| {
                    std::thread::sleep(Duration::from_millis(20));
                    let id = counter.fetch_add(1, Ordering::SeqCst);
                    Ok(Arc::new(Pool { id }))
                })
                .in_singleton_scope();
        })
        .build()
        .unwrap();

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let injector = injector.clone();
            tokio::task::spawn_blocking(move || injector.get_instance::<Pool>())
        })
        .collect();
    let mut pools = Vec::new();
    for handle in handles {
        pools.push(handle.await.unwrap().unwrap());
    }

    assert_eq!(counter.load(Ordering::SeqCst), 1);
    assert!(pools.iter().all(|pool| Arc::ptr_eq(pool, &pools[0])));
    assert_eq!(pools[0].id, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_unscoped_resolution() {
    let counter = Arc::new(AtomicUsize::new(0));
    let module_counter = counter.clone();
    let injector = Injector::builder()
        .configure(move |binder| {
            let counter = module_counter.clone();
            binder.bind::<Pool>().to_provider(move |_| {
                let id = counter.fetch_add(1, Ordering::SeqCst);
                Ok(Arc::new(Pool { id }))
            });
        })
        .build()
        .unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let injector = injector.clone();
            tokio::spawn(async move { injector.get_instance::<Pool>().map(|pool| pool.id) })
        })
        .collect();
    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap().unwrap());
    }
    ids.sort();

    assert_eq!(ids, (0..8).collect::<Vec<_>>());
    assert_eq!(counter.load(Ordering::SeqCst), 8);
}
