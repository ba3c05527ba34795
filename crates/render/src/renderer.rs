use glam::Vec2;
use sandbox_common::{ObjectId, SceneLayer};
use sandbox_scene::{CompositeSprite, ImageSource, Scene, SceneObject, Sprite};
use std::cmp::Reverse;
use std::fmt::Write;

/// The part of the world a frame shows.
#[derive(Debug, Clone, Copy)]
pub struct RenderView {
    /// World point at the centre of the view.
    pub center: Vec2,
    pub zoom: f32,
    /// Visible area in meters at zoom 1.
    pub size: Vec2,
}

impl Default for RenderView {
    fn default() -> Self {
        Self {
            center: Vec2::ZERO,
            zoom: 1.0,
            size: Vec2::new(100.0, 75.0),
        }
    }
}

/// A frame producer over a read-only scene.
pub trait Renderer {
    type Output;

    /// Render one frame from the given scene and view.
    fn render(&self, scene: &Scene, view: &RenderView) -> Self::Output;
}

/// Something drawn as one unit.
#[derive(Debug, Clone, Copy)]
pub enum Drawable<'a> {
    Sprite(&'a Sprite),
    Composite(&'a CompositeSprite),
    /// One layer of a tile map.
    MapLayer(&'a CompositeSprite),
}

#[derive(Debug, Clone, Copy)]
pub struct RenderItem<'a> {
    pub object: ObjectId,
    pub layer: SceneLayer,
    pub drawable: Drawable<'a>,
}

/// Everything drawable in the scene, back to front.
///
/// Higher layers are drawn first. Within a layer, objects draw in id order
/// and map layers keep their map order.
pub fn render_queue(scene: &Scene) -> Vec<RenderItem<'_>> {
    let mut queue = Vec::new();
    for (object, obj) in scene.objects() {
        match obj {
            SceneObject::Sprite(s) => queue.push(RenderItem {
                object,
                layer: s.layer(),
                drawable: Drawable::Sprite(s),
            }),
            SceneObject::Composite(c) => queue.push(RenderItem {
                object,
                layer: c.layer(),
                drawable: Drawable::Composite(c),
            }),
            SceneObject::Map(m) => queue.extend(m.layers().iter().map(|l| RenderItem {
                object,
                layer: l.layer(),
                drawable: Drawable::MapLayer(l),
            })),
        }
    }
    queue.sort_by_key(|item| (Reverse(item.layer), item.object));
    queue
}

/// Writes the render queue as text, one line per drawable.
#[derive(Debug, Default)]
pub struct DebugTextRenderer;

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, scene: &Scene, view: &RenderView) -> String {
        let queue = render_queue(scene);
        tracing::trace!(items = queue.len(), "rendering debug frame");

        let mut out = String::new();
        let _ = writeln!(
            out,
            "=== Scene (tick={}, objects={}) ===",
            scene.tick(),
            scene.len()
        );
        let _ = writeln!(
            out,
            "Camera: center=({:.2}, {:.2}) zoom={:.2} view={:.1}x{:.1}",
            view.center.x, view.center.y, view.zoom, view.size.x, view.size.y
        );
        for item in &queue {
            let _ = write!(out, "  [{}] layer={:>2} ", item.object, item.layer.index());
            let _ = match item.drawable {
                Drawable::Sprite(s) => {
                    let p = s.position();
                    let size = s.size();
                    writeln!(
                        out,
                        "sprite {} pos=({:.2}, {:.2}) size=({:.2}, {:.2}) image={}",
                        s.name().unwrap_or("-"),
                        p.x,
                        p.y,
                        size.x,
                        size.y,
                        describe_image(s.image())
                    )
                }
                Drawable::Composite(c) => {
                    writeln!(out, "composite {} items={}", c.name(), c.len())
                }
                Drawable::MapLayer(l) => {
                    writeln!(out, "map-layer {} tiles={}", l.name(), l.len())
                }
            };
        }
        out
    }
}

fn describe_image(image: &ImageSource) -> String {
    match image {
        ImageSource::None => "none".into(),
        ImageSource::Image { asset, frame } => format!("{asset}#{frame}"),
        ImageSource::Animation(asset) => format!("anim:{asset}"),
    }
}
