use pathcpu_r3::core::prelude::*;
use pathcpu_r3::scenes::*;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn create_cache(update_spp: u32, tracer: ProceduralPhotonTracer) -> Arc<PhotonGICache> {
    let params = PhotonGICacheParams {
        enabled: true,
        max_photon_count: 2000,
        update_spp,
        lookup_radius: 0.1,
    };
    let scene: Arc<dyn Scene> = Arc::new(ProceduralScene::new("photongi"));
    let tracer: Arc<dyn PhotonTracer> = Arc::new(tracer);
    let cache = Arc::new(PhotonGICache::new(&params, &scene, &tracer));
    cache.preprocess(&NoProgress).unwrap();
    return cache;
}

#[test]
fn photongi_preprocess_builds_snapshot() {
    let cache = create_cache(0, ProceduralPhotonTracer::new());
    assert_eq!(cache.get_version(), 1);
    let snapshot = cache.snapshot();
    assert!(!snapshot.is_empty());
    let scene = ProceduralScene::new("photongi");
    let p = Point3f::new(0.0625, 0.9375, 0.0);
    let n = Normal3f::new(0.0, 0.0, 1.0);
    let radiance = snapshot.get_radiance(&p, &n).unwrap();
    let expected = scene.indirect_light(0.0625, 0.9375).y();
    assert!((radiance.y() - expected).abs() < 0.5 * expected);
    // opposite hemisphere sees nothing
    let back = Normal3f::new(0.0, 0.0, -1.0);
    assert!(snapshot.get_radiance(&p, &back).is_none());
    // a second preprocess is a no-op
    cache.preprocess(&NoProgress).unwrap();
    assert_eq!(cache.get_version(), 1);
}

#[test]
fn photongi_withdrawal_completes_quorum() {
    const THREADS: usize = 4;
    let cache = create_cache(1, ProceduralPhotonTracer::new());
    cache.start_run(THREADS);
    let refreshed = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..THREADS - 1)
        .map(|i| {
            let cache = cache.clone();
            let refreshed = refreshed.clone();
            thread::spawn(move || {
                if cache.update(i, 1) {
                    refreshed.fetch_add(1, Ordering::SeqCst);
                }
                cache.finish_update(i);
            })
        })
        .collect();

    // the last thread exits without reaching the refresh point
    thread::sleep(Duration::from_millis(50));
    cache.finish_update(THREADS - 1);
    cache.finish_update(THREADS - 1);

    let start = Instant::now();
    for h in handles {
        h.join().unwrap();
    }
    assert!(start.elapsed() < Duration::from_secs(30));
    assert_eq!(refreshed.load(Ordering::SeqCst), THREADS - 1);
    assert_eq!(cache.get_version(), 2);
    assert_eq!(cache.get_last_update_spp(), 1);
    assert_eq!(cache.get_active_thread_count(), 0);
    assert!(!cache.is_finished());
}

#[test]
fn photongi_refresh_is_not_due_before_stride() {
    let cache = create_cache(4, ProceduralPhotonTracer::new());
    cache.start_run(1);
    assert!(!cache.update(0, 3));
    assert_eq!(cache.get_version(), 1);
    assert!(cache.update(0, 4));
    assert_eq!(cache.get_version(), 2);
    assert!(!cache.update(0, 7));
    assert!(cache.update(0, 8));
    assert_eq!(cache.get_version(), 3);
}

#[test]
fn photongi_failed_rebuild_finishes_cache() {
    let tracer = ProceduralPhotonTracer {
        fail_on_pass: Some(1),
    };
    let cache = create_cache(1, tracer);
    cache.start_run(2);
    let other = {
        let cache = cache.clone();
        thread::spawn(move || {
            cache.update(1, 1);
            cache.finish_update(1);
        })
    };
    cache.update(0, 1);
    cache.finish_update(0);
    other.join().unwrap();

    assert!(cache.is_finished());
    assert_eq!(cache.get_version(), 1);
    assert!(matches!(cache.take_error(), Some(RenderError::PhotonGI(_))));
    assert!(cache.take_error().is_none());
    // the previous snapshot stays usable
    assert!(!cache.snapshot().is_empty());
}

#[test]
fn photongi_interrupt_skips_rebuild() {
    let cache = create_cache(1, ProceduralPhotonTracer::new());
    cache.start_run(1);
    cache.interrupt();
    assert!(!cache.update(0, 10));
    assert_eq!(cache.get_version(), 1);
    cache.start_run(1);
    assert!(cache.update(0, 10));
    assert_eq!(cache.get_version(), 2);
}
