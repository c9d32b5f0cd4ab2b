use clap::Parser;
use tracing_subscriber::FmtSubscriber;

use portal_network::export::PlacementReport;
use portal_network::render::{render_overlay, render_terrain_mask, save_image, OverlayStyle};
use portal_network::seeds::RunSeeds;
use portal_network::{MapSource, PlannerParams, PlannerSession};

#[derive(Parser, Debug)]
#[command(name = "portal_network")]
#[command(about = "Place portals on a map so every region of land has one nearby")]
struct Args {
    /// Map image path, or an embedded data:image/...;base64 URI
    map: String,

    /// Number of portals to place
    #[arg(short = 'n', long, default_value = "5")]
    portals: usize,

    /// Random seed (uses random seed if not specified)
    #[arg(short, long)]
    seed: Option<u64>,

    /// How many calculate runs to perform (each gets its own derived seed)
    #[arg(long, default_value = "1")]
    runs: u64,

    /// Load planner parameters from a JSON file
    #[arg(long)]
    config: Option<String>,

    /// Parameter preset: default, fast or precise
    #[arg(long, default_value = "default")]
    preset: String,

    /// Maximum working width in pixels (overrides config)
    #[arg(long)]
    max_width: Option<u32>,

    /// Maximum optimization rounds, 1-20 (overrides config)
    #[arg(long)]
    max_iterations: Option<usize>,

    /// Write the map with portal markers to this PNG
    #[arg(long)]
    overlay: Option<String>,

    /// Portal icon drawn on the overlay instead of the red marker
    #[arg(long)]
    icon: Option<String>,

    /// Glow intensity for the overlay (0.0-0.7)
    #[arg(long, default_value = "0.7")]
    pulse: f32,

    /// Write the land/water classification to this PNG
    #[arg(long)]
    export_mask: Option<String>,

    /// Write a JSON report of the placement
    #[arg(long)]
    export_json: Option<String>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn build_params(args: &Args) -> portal_network::Result<PlannerParams> {
    let mut params = match &args.config {
        Some(path) => PlannerParams::from_json_file(path)?,
        None => match args.preset.as_str() {
            "fast" => PlannerParams::fast(),
            "precise" => PlannerParams::precise(),
            "default" => PlannerParams::default(),
            other => {
                return Err(portal_network::PlannerError::Config(format!(
                    "unknown preset '{}' (expected default, fast or precise)",
                    other
                )))
            }
        },
    };

    if let Some(w) = args.max_width {
        params.max_width = w;
    }
    if let Some(i) = args.max_iterations {
        params.max_iterations = i;
    }
    params.validate()?;
    Ok(params)
}

fn run(args: &Args) -> portal_network::Result<()> {
    let params = build_params(args)?;
    let source = MapSource::parse(&args.map)?;
    let mut session = PlannerSession::new(source, params)?;
    println!(
        "Map loaded. Working size: {}x{}",
        session.working_image().width(),
        session.working_image().height()
    );

    let seeds = args.seed.map(RunSeeds::from_master).unwrap_or_default();
    println!("Using seed: {}", seeds);

    let runs = args.runs.max(1);
    for run in 0..runs {
        let run_seed = seeds.for_run(run);
        let mut rng = seeds.rng_for_run(run);
        if runs > 1 {
            println!("Run {} of {} (seed {})", run + 1, runs, run_seed);
        }

        let Some(placement) =
            session.calculate(args.portals, &mut rng, |phase| println!("{}", phase.status_text()))?
        else {
            println!("Run superseded; results discarded");
            continue;
        };

        if placement.used_fallback_grid {
            println!("No land detected; portals placed over a uniform grid");
        }
        println!(
            "Placed {} portals over {} land points ({:.1}% land) in {} rounds{}",
            placement.portals.len(),
            placement.land_points,
            placement.land_fraction * 100.0,
            placement.outcome.iterations,
            if placement.outcome.converged { "" } else { " (round limit reached)" }
        );
        for portal in &placement.portals {
            println!("  {}", portal.label());
        }
    }

    let Some(placement) = session.placement() else {
        return Ok(());
    };

    if let Some(ref path) = args.overlay {
        let mut style = OverlayStyle {
            pulse: args.pulse.clamp(0.0, 1.0),
            icon: None,
        };
        if let Some(ref icon) = args.icon {
            style = style.with_icon_file(icon)?;
        }
        let overlay = render_overlay(session.working_image(), &placement.portals, &style);
        save_image(overlay, path)?;
        println!("Exported portal overlay to {}", path);
    }

    if let Some(ref path) = args.export_mask {
        if let Some(scan) = session.terrain() {
            save_image(render_terrain_mask(scan), path)?;
            println!("Exported terrain mask to {}", path);
        }
    }

    if let Some(ref path) = args.export_json {
        let seed = seeds.for_run(runs - 1);
        let report = PlacementReport::new(placement, &session.source().origin, Some(seed));
        report.write_json(path)?;
        println!("Exported placement report to {}", path);
    }

    Ok(())
}

fn main() {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(match args.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        })
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to install logger: {}", e);
    }

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
