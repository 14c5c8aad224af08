//! Marga demo - plans a route across a field split by standing crop.
//!
//! The vehicle starts west of a strip of 35% fruit and wants to reach the
//! east headland. Each failed attempt hands the context back to the retry
//! callback, which allows 10% more fruit, until the strip can be crossed or
//! the retry budget runs out.
//!
//! Usage: `marga-demo [config.toml]` (falls back to `marga.toml`, then defaults)

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use marga::{
    CallbackRegistration, Cell, DebugVisualization, GridCoord, GridEngineFactory, MargaConfig,
    PathfinderController, PathfinderResult, Point2D, Pose2D, Result, SearchContext, TerrainGrid,
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

type Controller = PathfinderController<GridEngineFactory>;

/// Simulated scheduler tick.
const TICK_DT: f32 = 0.02;
const MAX_TICKS: usize = 10_000;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("marga=info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let config = if let Some(path) = args.get(1) {
        info!("Loading configuration from {}", path);
        MargaConfig::load(Path::new(path))?
    } else if Path::new("marga.toml").exists() {
        info!("Loading configuration from marga.toml");
        MargaConfig::load(Path::new("marga.toml"))?
    } else {
        info!("Using default configuration");
        MargaConfig::default()
    };

    let grid = build_field();
    info!(
        "Field: {}x{} cells at {:.1} m",
        grid.width(),
        grid.height(),
        grid.resolution()
    );

    let mut factory = GridEngineFactory::new(Rc::new(grid), config.grid.clone());
    factory.set_vehicle_pose(Pose2D::new(3.0, 20.0, 0.0));
    let mut controller = PathfinderController::new(factory);

    let outcome: Rc<RefCell<Option<PathfinderResult>>> = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&outcome);
    controller.register_callbacks(
        CallbackRegistration::new(config.controller.owner.clone(), move |_: &mut Controller, result| {
            *sink.borrow_mut() = Some(result);
        })
        .with_retry(|ctl: &mut Controller, context, is_last, attempt| {
            let relaxed = context.max_fruit_percent + 10.0;
            info!(
                "Retry {}{}: allowing {:.0}% fruit",
                attempt,
                if is_last { " (last)" } else { "" },
                relaxed
            );
            if let Err(e) = ctl.retry(context.max_fruit_percent(relaxed)) {
                warn!("Could not restart search: {}", e);
            }
        }),
    );

    let context = SearchContext::from_config(&config.context);
    controller.find_path_to_goal(
        context,
        Pose2D::new(57.0, 20.0, 0.0),
        config.controller.default_retry_budget,
    )?;

    let mut viz = DebugVisualization::default();
    let mut ticks = 0;
    while controller.is_active() && ticks < MAX_TICKS {
        controller.update(TICK_DT);
        ticks += 1;

        viz.clear();
        controller.draw_nodes(&mut viz);
        debug!("Tick {}: {} open nodes", ticks, viz.search_nodes.len());
    }
    if controller.is_active() {
        warn!("Search still running after {} ticks, cancelling", ticks);
        controller.reset();
    }

    match outcome.borrow_mut().take() {
        Some(result) if result.success => {
            let course = result.course.unwrap_or_default();
            info!(
                "Route found: {} waypoints, {:.1} m, {} retries, {} ticks",
                course.len(),
                course.total_length(),
                result.retries,
                ticks
            );
        }
        Some(result) => warn!(
            "No route: {} after {} retries",
            result.outcome().as_str(),
            result.retries
        ),
        None => warn!("Request ended without a result"),
    }

    Ok(())
}

/// 60 x 40 m field with a north-south strip of standing crop, a fruit heap,
/// and a barn on the south edge.
fn build_field() -> TerrainGrid {
    let mut grid = TerrainGrid::new(60, 40, 1.0, Point2D::new(0.0, 0.0));
    grid.fill_rect(
        GridCoord::new(28, 0),
        GridCoord::new(33, 39),
        Cell::Field { field: 1, fruit: 35 },
    );
    grid.fill_rect(GridCoord::new(40, 18), GridCoord::new(42, 22), Cell::FruitHeap);
    grid.fill_rect(GridCoord::new(10, 0), GridCoord::new(18, 6), Cell::Blocked);
    grid.fill_rect(GridCoord::new(0, 36), GridCoord::new(59, 39), Cell::OffField);
    grid
}
