//! Headless picking demo
//!
//! Builds a small scene, starts the picking service and plays the three
//! viewer roles: the main thread renders, a UI thread feeds synthetic
//! pointer and key events, and a script on the worker pool blocks in
//! `start_selection` and `start_selection_on_plane`.
//!
//! Usage: `pick_demo [config.toml|config.ron]`

use crossbeam::channel::Receiver;
use std::sync::{Arc, PoisonError, RwLock};
use std::thread;
use std::time::{Duration, Instant};
use viewer_engine::config::{Config, ConfigError, ViewerConfig};
use viewer_engine::foundation::logging;
use viewer_engine::foundation::math::constants::HALF_PI;
use viewer_engine::foundation::math::{Mat4, Mat4Ext, Point3};
use viewer_engine::foundation::workers::{WorkerPool, WorkerPoolError};
use viewer_engine::input::{KeyEvent, Modifiers, NamedKey, PointerEvent};
use viewer_engine::picking::{GroundPlane, PickingError, PickingHandle, PickingService, RedrawRequest, SelectionMode};
use viewer_engine::render::{
    ndc_to_pixel, GeometryKind, LineSet, PointCloud, PolyMesh, Rasterizer, RenderError, SceneRenderer,
};
use viewer_engine::scene::{NodeId, SceneError, SceneGraph};

const WIDTH: u32 = 320;
const HEIGHT: u32 = 240;
const FRAME: Duration = Duration::from_millis(16);
const DEMO_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
enum DemoError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("picking error: {0}")]
    Picking(#[from] PickingError),
    #[error("scene error: {0}")]
    Scene(#[from] SceneError),
    #[error("render error: {0}")]
    Render(#[from] RenderError),
    #[error("worker pool error: {0}")]
    Pool(#[from] WorkerPoolError),
    #[error("selection script ended without a result")]
    ScriptLost,
    #[error("demo did not finish within {0:?}")]
    Timeout(Duration),
}

type ScriptOutcome = Result<(Vec<NodeId>, Option<Point3>), PickingError>;

/// Camera looking straight down the y axis at the ground plane
fn top_down_camera(plane: &GroundPlane) -> Mat4 {
    let aspect = WIDTH as f32 / HEIGHT as f32;
    let half_depth = (plane.max[1] - plane.min[1]) * 0.6;
    let half_width = half_depth * aspect;
    Mat4::new_orthographic(-half_width, half_width, -half_depth, half_depth, -50.0, 50.0) * Mat4::rotation_x(-HALF_PI)
}

/// Window position of a world point, at the pixel centre
fn screen_position(view_projection: &Mat4, point: &Point3) -> (f64, f64) {
    let clip = view_projection.transform_homogeneous(point);
    let (x, y) = ndc_to_pixel(clip.x / clip.w, clip.y / clip.w, WIDTH, HEIGHT);
    (f64::from(x) + 0.5, f64::from(y) + 0.5)
}

struct DemoScene {
    graph: SceneGraph,
    root: NodeId,
    parts: Vec<NodeId>,
}

fn build_scene(config: &ViewerConfig) -> Result<DemoScene, DemoError> {
    let mut graph = config.render.scene_graph();
    let root = graph.insert_root("assembly");

    let mut parts = Vec::new();
    for (i, x) in [-3.0_f32, 0.0, 3.0].into_iter().enumerate() {
        let part = graph.spawn_child(root, format!("block-{i}"))?;
        graph.attach_geometry(part, PolyMesh::cuboid([0.5, 0.5, 0.5]))?;
        graph.set_translation(part, &[x, 0.0, 0.0])?;
        parts.push(part);
    }

    let markers = graph.spawn_child(root, "markers")?;
    let points = (-2..=2).map(|i| Point3::new(i as f32 * 1.5, 0.0, 3.0)).collect();
    graph.attach_geometry(markers, PointCloud::new(points))?;
    graph.node_mut(markers)?.display.show_points = true;

    let outline = graph.spawn_child(root, "outline")?;
    let corners = vec![
        Point3::new(-4.0, 0.0, -2.0),
        Point3::new(4.0, 0.0, -2.0),
        Point3::new(4.0, 0.0, 2.0),
        Point3::new(-4.0, 0.0, 2.0),
        Point3::new(-4.0, 0.0, -2.0),
    ];
    graph.attach_geometry(outline, LineSet::polyline(corners))?;

    log::info!("scene built with {} nodes", graph.len());
    Ok(DemoScene { graph, root, parts })
}

/// Selection script: pick blocks, then a spot on the ground
fn selection_script(picking: &PickingHandle) -> ScriptOutcome {
    log::info!("script: select blocks, press Enter when done");
    let blocks = picking.start_selection(&[GeometryKind::Mesh], SelectionMode::Multi)?;
    log::info!("script: got {} block(s)", blocks.len());

    log::info!("script: click the ground plane");
    let spot = picking.start_selection_on_plane(true)?;
    Ok((blocks, spot))
}

fn wait_until_waiting(picking: &PickingHandle) -> bool {
    let deadline = Instant::now() + DEMO_TIMEOUT;
    while !picking.is_waiting() {
        if Instant::now() > deadline {
            return false;
        }
        thread::sleep(Duration::from_millis(5));
    }
    true
}

fn click(picking: &PickingHandle, (x, y): (f64, f64), modifiers: Modifiers) {
    picking.handle_pointer(&PointerEvent::moved(x, y, modifiers));
    picking.handle_pointer(&PointerEvent::pressed(x, y, modifiers));
    picking.handle_pointer(&PointerEvent::released(x, y, modifiers));
}

/// Synthetic user: clicks two blocks, Enter, then a ground point
fn drive_ui(picking: PickingHandle, view_projection: Mat4, targets: Vec<Point3>, ground: Point3) {
    if !wait_until_waiting(&picking) {
        log::warn!("ui: script never started waiting");
        return;
    }

    for target in &targets {
        let before = picking.selected().len();
        click(&picking, screen_position(&view_projection, target), Modifiers::empty());
        let deadline = Instant::now() + DEMO_TIMEOUT;
        while picking.selected().len() == before && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
    }
    picking.handle_key(&KeyEvent::pressed(NamedKey::Enter));

    // Enter clears the wait; the script then starts the plane pick
    if !wait_until_waiting(&picking) {
        log::warn!("ui: plane pick never started");
        return;
    }
    click(&picking, screen_position(&view_projection, &ground), Modifiers::empty());
}

/// Render thread: publish armed picks and redraw until the script reports
fn render_loop(
    picking: &PickingHandle,
    raster: &mut Rasterizer,
    renderer: &SceneRenderer,
    redraws: &Receiver<RedrawRequest>,
    outcome: &Receiver<ScriptOutcome>,
) -> Result<ScriptOutcome, DemoError> {
    let deadline = Instant::now() + DEMO_TIMEOUT;
    let mut frames = 0_u64;
    loop {
        if Instant::now() > deadline {
            return Err(DemoError::Timeout(DEMO_TIMEOUT));
        }

        crossbeam::select! {
            recv(outcome) -> result => {
                log::info!("render: {frames} frame(s) drawn");
                return result.map_err(|_| DemoError::ScriptLost);
            }
            recv(redraws) -> _ => {
                let scene = picking.scene();
                let scene = scene.read().unwrap_or_else(PoisonError::into_inner);
                let draws = raster.render_scene(&scene, renderer)?;
                frames += 1;
                log::debug!("render: frame {frames}, {draws} draw(s)");
            }
            default(FRAME) => {}
        }

        if picking.render_frame(raster) {
            log::debug!("render: published pick frame");
        }
    }
}

fn run() -> Result<(), DemoError> {
    let config = match std::env::args().nth(1) {
        Some(path) => ViewerConfig::load_from_file(path)?,
        None => ViewerConfig::default().with_plane(GroundPlane::new([-5.0, -5.0], [5.0, 5.0], 0.0)),
    };
    config.validate()?;
    logging::init_with_level(&config.engine.log_level);

    let DemoScene { graph, root, parts } = build_scene(&config)?;
    let scene = Arc::new(RwLock::new(graph));
    let pool = Arc::new(WorkerPool::new(config.engine.worker_threads)?);
    let service = PickingService::new(&config, Arc::clone(&scene), pool)?;
    service.resize(WIDTH, HEIGHT);
    let registered = service.register_subtree(root)?;
    log::info!("{} pickable node(s)", registered.len());

    let view_projection = top_down_camera(&config.plane);
    let mut raster = Rasterizer::new(WIDTH, HEIGHT).with_view_projection(view_projection);
    let renderer = config.render.scene_renderer();

    let targets = {
        let graph = scene.read().unwrap_or_else(PoisonError::into_inner);
        [parts[0], parts[2]]
            .iter()
            .map(|id| graph.world_matrix(*id).map(|world| world.transform_point(&Point3::origin())))
            .collect::<Result<Vec<_>, _>>()?
    };
    let ground = Point3::new(2.0, 0.0, -3.0);

    let outcome = service.run_script(|picking| selection_script(&picking))?;
    let ui = {
        let picking = service.handle();
        thread::spawn(move || drive_ui(picking, view_projection, targets, ground))
    };

    let redraws = service.redraw_requests();
    let result = render_loop(&service, &mut raster, &renderer, &redraws, &outcome)?;
    if ui.join().is_err() {
        log::warn!("ui thread panicked");
    }

    let (blocks, spot) = result?;
    let graph = scene.read().unwrap_or_else(PoisonError::into_inner);
    for id in &blocks {
        log::info!("selected {}", graph.node(*id)?.name());
    }
    match spot {
        Some(point) => log::info!("ground pick at ({:.1}, {:.1}, {:.1})", point.x, point.y, point.z),
        None => log::info!("no ground point picked"),
    }
    Ok(())
}

fn main() {
    if let Err(err) = run() {
        log::error!("{err}");
        eprintln!("pick_demo failed: {err}");
        std::process::exit(1);
    }
}
