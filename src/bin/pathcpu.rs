use clap::*;

use pathcpu_r3::core::config::*;
use pathcpu_r3::core::error::*;
use pathcpu_r3::core::film::*;
use pathcpu_r3::core::integrator::LightTransport;
use pathcpu_r3::core::misc::*;
use pathcpu_r3::core::param_set::*;
use pathcpu_r3::core::photongi::PhotonTracer;
use pathcpu_r3::core::scene::Scene;
use pathcpu_r3::core::stats;
use pathcpu_r3::engines::*;
use pathcpu_r3::scenes::*;

use std::env;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::thread;
use std::thread::available_parallelism;
use std::time::Duration;

use log::*;

#[derive(Debug, Parser)]
#[clap(author, about, version)]
struct CommandOptions {
    /// Film width.
    #[arg(long, default_value = "640")]
    pub width: u32,

    /// Film height.
    #[arg(long, default_value = "480")]
    pub height: u32,

    /// Stop after this many samples per pixel. 0 disables the criterion.
    #[arg(long, default_value = "16")]
    pub haltspp: u32,

    /// Stop after this many seconds. 0 disables the criterion.
    #[arg(long, default_value = "0")]
    pub halttime: f64,

    /// Stop once the estimated noise is below this value. 0 disables the criterion.
    #[arg(long, default_value = "0")]
    pub haltthreshold: f64,

    /// RANDOM, SOBOL or METROPOLIS.
    #[arg(long, default_value = "RANDOM", value_name = "type")]
    pub sampler: String,

    /// Use specified number of threads for rendering.
    #[arg(short = 'j', long = "nthreads", value_name = "num")]
    pub nthreads: Option<u32>,

    /// Seed of every random number sequence.
    #[arg(long, default_value = "1")]
    pub seed: u32,

    /// Maximum variance of a sample, 0 disables clamping.
    #[arg(long, default_value = "0")]
    pub clamp: f64,

    /// Add caustic light paths traced by a Metropolis light sampler.
    #[arg(long, default_value = "false")]
    pub hybrid: bool,

    /// Use the photon GI cache for indirect light.
    #[arg(long, default_value = "false")]
    pub photongi: bool,

    /// Rebuild the photon GI cache every this many samples per pixel.
    #[arg(long, default_value = "0", value_name = "spp")]
    pub updatespp: u32,

    /// Write the final image to the given filename.
    #[arg(short, long, value_name = "filename", default_value = "pathcpu.png")]
    pub outfile: PathBuf,

    /// Save the film to continue the render later. Without a path the film
    /// is saved in the per-user config directory.
    #[arg(long = "save-film", value_name = "filename", num_args = 0..=1)]
    pub save_film: Option<Option<PathBuf>>,

    /// Continue rendering into a saved film.
    #[arg(long = "resume-film", value_name = "filename")]
    pub resume_film: Option<PathBuf>,

    /// Extra configuration property, may be repeated.
    #[arg(short = 'D', long = "property", value_name = "key=value")]
    pub properties: Vec<String>,

    /// Suppress all text output other than error messages.
    #[clap(long, default_value = "false")]
    pub quiet: bool,

    /// Log messages at or above this level (0 -> INFO,
    /// 1 -> WARNING, 2 -> ERROR, 3-> FATAL).
    #[arg(long, value_name = "num")]
    pub minloglevel: Option<i32>,
}

fn init_logger(opts: &CommandOptions) {
    if let Some(minloglevel) = opts.minloglevel {
        const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
        let log_level = LOG_LEVELS[(minloglevel + 2).clamp(0, 4) as usize];
        env::set_var("RUST_LOG", log_level);
    } else {
        //default log level : warn
        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_owned());
        env::set_var("RUST_LOG", log_level);
    }

    env_logger::Builder::from_default_env()
        .format_target(false)
        .format_module_path(false)
        .init();
}

fn add_property(props: &mut Properties, definition: &str) -> Result<(), RenderError> {
    let (key, value) = definition
        .split_once('=')
        .ok_or_else(|| RenderError::Config(format!("Malformed property: {}", definition)))?;
    let key = key.trim();
    let value = value.trim();
    if let Ok(b) = value.parse::<bool>() {
        props.add_bool(key, b);
    } else if let Ok(i) = value.parse::<i64>() {
        props.add_int(key, i);
    } else if let Ok(f) = value.parse::<f64>() {
        props.add_float(key, f);
    } else {
        props.add_string(key, value);
    }
    Ok(())
}

fn create_properties(opts: &CommandOptions) -> Result<Properties, RenderError> {
    let mut props = Properties::new();
    props.add_string("renderengine.type", "PATHCPU");
    props.add_int("renderengine.seed", opts.seed as i64);
    if let Some(nthreads) = opts.nthreads {
        props.add_int("native.threads.count", nthreads as i64);
    }
    props.add_int("film.width", opts.width as i64);
    props.add_int("film.height", opts.height as i64);
    props.add_string("film.outputs.0.type", "RGB");
    props.add_string("film.outputs.0.filename", &opts.outfile.to_string_lossy());
    props.add_string("sampler.type", &opts.sampler.to_uppercase());
    props.add_float("path.clamping.variance.maxvalue", opts.clamp);
    props.add_bool("path.hybridbackforward.enable", opts.hybrid);
    props.add_int("batch.haltspp", opts.haltspp as i64);
    props.add_float("batch.halttime", opts.halttime);
    props.add_float("batch.haltthreshold", opts.haltthreshold);
    props.add_bool("path.photongi.enable", opts.photongi);
    props.add_int("path.photongi.updatespp", opts.updatespp as i64);
    for definition in opts.properties.iter() {
        add_property(&mut props, definition)?;
    }
    return Ok(props);
}

fn get_film_path(scene_name: &str, opts: &CommandOptions) -> Option<PathBuf> {
    match opts.save_film.as_ref() {
        Some(Some(path)) => Some(path.clone()),
        Some(None) => {
            let file_name = sanitize_file_name(scene_name) + ".flm";
            Some(get_config_dir().join(file_name))
        }
        None => None,
    }
}

fn save_film_to(film: &Film, path: &Path) -> Result<(), RenderError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    save_film(film, path)?;
    info!("Saved film to {}", path.display());
    Ok(())
}

fn render_scene(opts: &CommandOptions) -> Result<(), RenderError> {
    let props = create_properties(opts)?;
    debug!("Configuration:\n{}", props);
    let config = RenderConfig::from_properties(&props)?;
    if !config.halt.is_enabled() {
        warn!("No halt condition is set, the render only ends with the process.");
    }

    let scene: Arc<dyn Scene> = Arc::new(ProceduralScene::new("procedural"));
    let transport: Arc<dyn LightTransport> =
        Arc::new(ProceduralTransport::new(config.film_width, config.film_height));
    let tracer: Arc<dyn PhotonTracer> = Arc::new(ProceduralPhotonTracer::new());

    let mut engine = RenderEngine::new(&config, &scene, &transport, Some(tracer));
    if let Some(path) = opts.resume_film.as_ref() {
        engine.set_film(load_film(path)?)?;
        info!("Resuming film {}", path.display());
    }
    if !opts.quiet && config.photongi.enabled {
        engine.set_preprocess_progress(Arc::new(ProgressReporter::new(
            config.photongi.max_photon_count as usize,
            "PhotonGI",
        )));
    }

    engine.start()?;
    if !opts.quiet {
        const PROGRESS_TOTAL: usize = 1000;
        let reporter = ProgressReporter::new(PROGRESS_TOTAL, "Rendering");
        let film = engine.get_film();
        while !engine.has_done() {
            thread::sleep(Duration::from_millis(250));
            let convergence = film.get_convergence() as f64;
            reporter.set_position((convergence * PROGRESS_TOTAL as f64) as usize);
        }
        reporter.finish();
    }
    engine.wait_for_done()?;

    let film = engine.get_film();
    if !opts.quiet {
        println!(
            "\n{} samples in {:.2} secs, {:.0} samples/sec, {:.1} spp",
            film.get_total_sample_count(),
            engine.get_rendering_time(),
            engine.get_total_samples_per_second(),
            film.get_samples_per_pixel()
        );
        stats::print_stats();
    }

    save_outputs(&film, &config.outputs)?;
    if let Some(path) = get_film_path(scene.name(), opts) {
        save_film_to(&film, &path)?;
    }
    return Ok(());
}

pub fn main() {
    let opts = CommandOptions::parse();
    init_logger(&opts);
    stats::clear_stats();
    if !opts.quiet {
        let nthreads = available_parallelism().map(|n| n.get()).unwrap_or(1);
        let version = env!("CARGO_PKG_VERSION");
        println!("pathcpu-r3 version {} [Detected {} cores]", version, nthreads);
        println!();
    }
    if let Err(e) = render_scene(&opts) {
        error!("{}", e);
        eprintln!("{}", e);
        process::exit(-1);
    }
}
