use pathcpu_r3::core::prelude::*;
use pathcpu_r3::engines::*;
use pathcpu_r3::scenes::*;

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn create_config(width: u32, height: u32, threads: usize, haltspp: u32) -> RenderConfig {
    let mut config = RenderConfig {
        film_width: width,
        film_height: height,
        thread_count: threads,
        ..Default::default()
    };
    config.halt.spp = haltspp;
    return config;
}

fn create_engine(config: &RenderConfig, tracer: Option<ProceduralPhotonTracer>) -> RenderEngine {
    let scene: Arc<dyn Scene> = Arc::new(ProceduralScene::new("engine"));
    let transport: Arc<dyn LightTransport> =
        Arc::new(ProceduralTransport::new(config.film_width, config.film_height));
    let tracer = tracer.map(|t| Arc::new(t) as Arc<dyn PhotonTracer>);
    return RenderEngine::new(config, &scene, &transport, tracer);
}

fn assert_image_is_finite(film: &Film) {
    let rgb = film.get_image_rgb();
    assert!(rgb.iter().all(|v| v.is_finite()));
    assert!(rgb.iter().any(|v| *v > 0.0));
}

#[test]
fn engine_state_machine() {
    let config = create_config(16, 16, 4, 0);
    let mut engine = create_engine(&config, None);
    assert_eq!(engine.get_state(), EngineState::Stopped);
    assert!(matches!(engine.pause(), Err(RenderError::InvalidState(_))));
    assert!(matches!(engine.resume(), Err(RenderError::InvalidState(_))));
    assert!(engine.stop().is_ok());

    engine.start().unwrap();
    assert_eq!(engine.get_state(), EngineState::Running);
    assert_eq!(engine.get_thread_count(), 4);
    assert!(matches!(engine.start(), Err(RenderError::InvalidState(_))));
    assert_eq!(engine.get_thread_count(), 4);
    assert!(engine.resume().is_ok());

    thread::sleep(Duration::from_millis(100));
    engine.pause().unwrap();
    assert_eq!(engine.get_state(), EngineState::Paused);
    assert!(engine.pause().is_ok());
    assert!(matches!(engine.start(), Err(RenderError::InvalidState(_))));

    // in flight samples land right after the pause, then nothing moves
    let film = engine.get_film();
    thread::sleep(Duration::from_millis(250));
    let paused_count = film.get_total_sample_count();
    assert!(paused_count > 0);
    thread::sleep(Duration::from_millis(300));
    assert_eq!(film.get_total_sample_count(), paused_count);

    engine.resume().unwrap();
    assert_eq!(engine.get_state(), EngineState::Running);
    thread::sleep(Duration::from_millis(200));
    assert!(film.get_total_sample_count() > paused_count);

    engine.stop().unwrap();
    assert_eq!(engine.get_state(), EngineState::Stopped);
    assert_eq!(engine.get_thread_count(), 0);
    assert_eq!(film.get_convergence(), 0.0);
    let stopped_count = film.get_total_sample_count();
    thread::sleep(Duration::from_millis(100));
    assert_eq!(film.get_total_sample_count(), stopped_count);
    assert!(engine.stop().is_ok());
    assert_image_is_finite(&film);
}

#[test]
fn engine_stops_at_haltspp() {
    for sampler in [SamplerType::Random, SamplerType::Sobol, SamplerType::Metropolis] {
        let mut config = create_config(8, 8, 3, 4);
        config.sampler_type = sampler;
        let mut engine = create_engine(&config, None);
        engine.start().unwrap();
        engine.wait_for_done().unwrap();
        assert_eq!(engine.get_state(), EngineState::Stopped);
        assert!(engine.has_done());

        let film = engine.get_film();
        assert_eq!(film.get_convergence(), 1.0);
        assert!(film.get_samples_per_pixel() >= 4.0);
        assert!(engine.get_rendering_time() > 0.0);
        assert!(engine.get_total_samples_per_second() > 0.0);
        assert_image_is_finite(&film);
    }
}

#[test]
fn engine_has_done_after_halt() {
    let config = create_config(8, 8, 2, 2);
    let mut engine = create_engine(&config, None);
    engine.start().unwrap();
    while !engine.has_done() {
        thread::sleep(Duration::from_millis(10));
    }
    // threads exited on their own, the engine still needs a stop
    assert_eq!(engine.get_state(), EngineState::Running);
    engine.stop().unwrap();
    assert_eq!(engine.get_film().get_convergence(), 1.0);
}

#[test]
fn engine_rejects_bad_configuration() {
    let mut config = create_config(8, 8, 2, 1);
    config.sampler_type = SamplerType::Metropolis;
    config.hybrid_back_forward = true;
    let mut engine = create_engine(&config, None);
    assert!(matches!(engine.start(), Err(RenderError::Config(_))));
    assert_eq!(engine.get_state(), EngineState::Stopped);
    assert_eq!(engine.get_thread_count(), 0);

    let mut config = create_config(8, 8, 2, 1);
    config.photongi.enabled = true;
    let mut engine = create_engine(&config, None);
    assert!(matches!(engine.start(), Err(RenderError::Config(_))));
    assert_eq!(engine.get_state(), EngineState::Stopped);

    let mut config = create_config(8, 8, 2, 1);
    config.engine_type = RenderEngineType::from_name("BIDIRVMCPU").unwrap();
    let mut engine = create_engine(&config, None);
    assert!(matches!(engine.start(), Err(RenderError::Config(_))));
}

#[test]
fn engine_hybrid_with_photongi_refresh() {
    let mut config = create_config(16, 16, 4, 6);
    config.hybrid_back_forward = true;
    config.clamping_max_variance = 100.0;
    config.photongi.enabled = true;
    config.photongi.max_photon_count = 5000;
    config.photongi.update_spp = 2;
    let mut engine = create_engine(&config, Some(ProceduralPhotonTracer::new()));
    engine.start().unwrap();
    engine.wait_for_done().unwrap();

    let film = engine.get_film();
    assert_eq!(film.get_convergence(), 1.0);
    assert!(film.get_total_light_sample_count() > 0);
    let cache = engine.get_photon_gi_cache().unwrap();
    assert!(cache.get_version() >= 2);
    assert_eq!(cache.get_active_thread_count(), 0);
    assert_image_is_finite(&film);
}

#[test]
fn engine_reports_photongi_failure() {
    let mut config = create_config(8, 8, 3, 0);
    config.photongi.enabled = true;
    config.photongi.max_photon_count = 1000;
    config.photongi.update_spp = 1;
    let tracer = ProceduralPhotonTracer {
        fail_on_pass: Some(1),
    };
    let mut engine = create_engine(&config, Some(tracer));
    engine.start().unwrap();
    let result = engine.wait_for_done();
    assert!(matches!(result, Err(RenderError::PhotonGI(_))));
    assert_eq!(engine.get_state(), EngineState::Stopped);
}

#[test]
fn engine_restart_keeps_accumulating() {
    let config = create_config(8, 8, 2, 0);
    let mut engine = create_engine(&config, None);
    engine.start().unwrap();
    thread::sleep(Duration::from_millis(100));
    engine.stop().unwrap();
    let film = engine.get_film();
    let first = film.get_total_sample_count();
    assert!(first > 0);

    engine.start().unwrap();
    thread::sleep(Duration::from_millis(100));
    engine.stop().unwrap();
    assert!(film.get_total_sample_count() > first);
}

fn mean_luminance(film: &Film) -> f64 {
    let rgb = film.get_image_rgb();
    let sum: f64 = rgb
        .chunks(3)
        .map(|c| (0.212671 * c[0] + 0.715160 * c[1] + 0.072169 * c[2]) as f64)
        .sum();
    return sum / film.get_pixel_count() as f64;
}

// Largest relative difference between `resumed` and twice `saved`, over the
// pixels the saved film covers. Zero means the resumed run replayed the
// saved samples.
fn max_doubling_error(saved: &[Float], resumed: &[Float]) -> Float {
    let mut max_err: Float = 0.0;
    for (a, b) in saved.iter().zip(resumed.iter()) {
        if *a > 1e-3 {
            max_err = Float::max(max_err, (b - 2.0 * a).abs() / a);
        }
    }
    return max_err;
}

#[test]
fn engine_resumes_saved_film() {
    let dir = tempfile::tempdir().unwrap();
    let channel = FilmChannel::RadiancePerPixelNormalized(0);
    for sampler in [SamplerType::Random, SamplerType::Sobol] {
        let path = dir.path().join(format!("resume-{}.flm", sampler));

        let mut config = create_config(8, 8, 1, 2);
        config.sampler_type = sampler;
        let mut engine = create_engine(&config, None);
        engine.start().unwrap();
        engine.wait_for_done().unwrap();
        let saved_count = engine.get_film().get_total_eye_sample_count();
        let saved = engine.get_film().get_channel_data(&channel).unwrap();
        save_film(&engine.get_film(), &path).unwrap();

        let mut config = create_config(8, 8, 1, 4);
        config.sampler_type = sampler;
        let mut engine = create_engine(&config, None);
        engine.set_film(load_film(&path).unwrap()).unwrap();
        assert_eq!(engine.get_film().get_total_eye_sample_count(), saved_count);
        engine.start().unwrap();
        assert!(engine.set_film(load_film(&path).unwrap()).is_err());
        engine.wait_for_done().unwrap();
        let film = engine.get_film();
        assert!(film.get_samples_per_pixel() >= 4.0);

        // the second half holds new samples, not a copy of the first
        let resumed = film.get_channel_data(&channel).unwrap();
        assert!(max_doubling_error(&saved, &resumed) > 1e-3, "{} replayed", sampler);
    }

    let wrong = create_config(4, 8, 2, 6);
    let mut engine = create_engine(&wrong, None);
    let path = dir.path().join("resume-RANDOM.flm");
    assert!(matches!(
        engine.set_film(load_film(&path).unwrap()),
        Err(RenderError::Config(_))
    ));
}

#[test]
fn engine_stop_is_prompt() {
    let config = create_config(16, 16, 4, 0);
    let limit = PAUSE_POLL_INTERVAL * 2;

    let mut engine = create_engine(&config, None);
    engine.start().unwrap();
    thread::sleep(Duration::from_millis(50));
    let start = Instant::now();
    engine.stop().unwrap();
    assert!(start.elapsed() < limit, "stop took {:?}", start.elapsed());

    engine.start().unwrap();
    thread::sleep(Duration::from_millis(50));
    engine.pause().unwrap();
    thread::sleep(Duration::from_millis(30));
    let start = Instant::now();
    engine.stop().unwrap();
    assert!(start.elapsed() < limit, "stop while paused took {:?}", start.elapsed());
    assert_eq!(engine.get_state(), EngineState::Stopped);
}

#[test]
fn engine_threads_exit_soon_after_convergence() {
    let config = create_config(16, 16, 4, 100);
    let mut engine = create_engine(&config, None);
    let film = engine.get_film();
    engine.start().unwrap();
    while film.get_convergence() < 1.0 {
        thread::sleep(Duration::from_millis(1));
    }
    let converged = Instant::now();
    while !engine.has_done() {
        thread::sleep(Duration::from_millis(1));
    }
    assert!(
        converged.elapsed() < PAUSE_POLL_INTERVAL,
        "threads took {:?} to exit",
        converged.elapsed()
    );
    engine.wait_for_done().unwrap();
    assert_eq!(film.get_convergence(), 1.0);
    assert!(film.get_samples_per_pixel() >= 100.0);
}

#[test]
fn engine_pause_keeps_image_statistics() {
    let mut config = create_config(16, 16, 4, 64);
    config.clamping_max_variance = 16.0;

    let mut engine = create_engine(&config, None);
    engine.start().unwrap();
    engine.wait_for_done().unwrap();
    let reference = mean_luminance(&engine.get_film());

    let mut engine = create_engine(&config, None);
    engine.start().unwrap();
    let mut pauses = 0;
    loop {
        thread::sleep(Duration::from_millis(2));
        engine.pause().unwrap();
        thread::sleep(Duration::from_millis(10));
        engine.resume().unwrap();
        pauses += 1;
        if engine.has_done() {
            break;
        }
    }
    engine.wait_for_done().unwrap();
    let film = engine.get_film();
    assert!(pauses > 0);
    assert_eq!(film.get_convergence(), 1.0);
    assert_image_is_finite(&film);

    let paused = mean_luminance(&film);
    assert!(reference > 0.0);
    assert!(
        (paused - reference).abs() / reference < 0.05,
        "mean luminance {} vs {}",
        paused,
        reference
    );
}

#[test]
fn engine_cancellation_token_and_drop() {
    let config = create_config(8, 8, 2, 0);
    let mut engine = create_engine(&config, None);
    engine.start().unwrap();
    engine.get_cancellation_token().cancel();
    engine.wait_for_done().unwrap();
    assert_eq!(engine.get_state(), EngineState::Stopped);

    // dropping a running engine joins its threads
    let mut engine = create_engine(&config, None);
    engine.start().unwrap();
    thread::sleep(Duration::from_millis(50));
    drop(engine);
}
