//! On-screen frame statistics
//!
//! A bordered box in the bottom-left corner. The compact form shows the
//! frame rate; the extended form adds primitive and sample counts, GPU time
//! and physics time. The box is five untextured quads: background, then
//! left, right, top and bottom borders, each one pixel thick.

use crate::foundation::collections::QuadKey;
use crate::foundation::math::{white, Vec4};
use crate::render::{FrameStats, QuadElement, UntexturedQuads};
use crate::ui::font::FontId;

use super::core::{Visibility, Visible, ZOrder, ZOrdered};
use super::text::TextString;
use super::{WidgetContext, WidgetResult};

const BACKGROUND: usize = 0;
const LEFT_BORDER: usize = 1;
const RIGHT_BORDER: usize = 2;
const TOP_BORDER: usize = 3;
const BOTTOM_BORDER: usize = 4;
const QUADS: usize = 5;

const BOX_WIDTH: f32 = 0.325;

/// One line of the statistics box, bottom to top
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatLine {
    /// Frames per second
    Fps,
    /// Primitives drawn
    Primitives,
    /// Samples passed
    Samples,
    /// GPU time
    GpuTime,
    /// Physics time
    PhysicsTime,
}

impl StatLine {
    const ALL: [Self; 5] = [Self::Fps, Self::Primitives, Self::Samples, Self::GpuTime, Self::PhysicsTime];

    const fn prefix(self) -> &'static str {
        match self {
            Self::Fps => "FPS: ",
            Self::Primitives => "Primitives: ",
            Self::Samples => "Samples: ",
            Self::GpuTime => "GPU Time: ",
            Self::PhysicsTime => "Phys Time: ",
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

/// Per-frame numbers shown by [`Statistics`]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameSample {
    /// Frames per second
    pub fps: f32,
    /// Primitives drawn
    pub primitives: u64,
    /// Samples passed
    pub samples: u64,
    /// GPU time in milliseconds
    pub gpu_time_ms: f32,
}

impl FrameSample {
    /// Sample from the overlay's own render statistics, two triangles per quad
    pub fn from_frame(fps: f32, stats: &FrameStats) -> Self {
        Self {
            fps,
            primitives: 2 * stats.quads() as u64,
            ..Self::default()
        }
    }
}

/// Statistics overlay
#[derive(Debug)]
pub struct Statistics {
    quads: QuadKey,
    lines: Vec<TextString>,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    extended: bool,
    z: ZOrder,
    visibility: Visibility,
}

impl Statistics {
    /// Z-order of a new box; the text goes 5 below
    pub const DEFAULT_Z: f32 = 100.0;

    /// Create the hidden, compact box
    pub fn new(ctx: &mut WidgetContext<'_>, font: FontId) -> WidgetResult<Self> {
        let x = -1.0 + 2.0 * ctx.pixel_width();
        let y = -1.0 + ctx.pixel_height();
        let line_height = ctx.font(font)?.line_height();

        let green = Vec4::new(0.0, 1.0, 0.0, 1.0);
        let mut lines = Vec::with_capacity(StatLine::ALL.len());
        for line in StatLine::ALL {
            let text = format!("{}<>", line.prefix());
            let line_y = y + line.index() as f32 * line_height;
            let mut string = TextString::new(ctx, font, &text, x, line_y)?;
            string.set_color(ctx, if line == StatLine::Fps { white() } else { green });
            lines.push(string);
        }

        let mut quads = UntexturedQuads::new(QUADS);
        quads.set_quad_color(BACKGROUND, &Vec4::new(0.2, 0.2, 0.2, 0.8));
        for border in [LEFT_BORDER, RIGHT_BORDER, TOP_BORDER, BOTTOM_BORDER] {
            quads.set_quad_color(border, &Vec4::new(0.0, 1.0, 0.0, 0.8));
        }
        let quads = ctx.layers.untextured.insert(quads);

        let mut statistics = Self {
            quads,
            lines,
            x,
            y,
            width: BOX_WIDTH,
            height: line_height,
            extended: false,
            z: ZOrder::default(),
            visibility: Visibility::HIDDEN,
        };
        statistics.update_positions(ctx);
        statistics.set_z(ctx, Self::DEFAULT_Z);
        Ok(statistics)
    }

    /// Draw the box and the lines of the current form
    pub fn show(&mut self, ctx: &mut WidgetContext<'_>) -> WidgetResult<()> {
        self.visibility.set(true);
        ctx.layers.untextured.show(self.quads)?;
        self.show_lines(ctx)
    }

    /// Stop drawing the box and every line
    pub fn hide(&mut self, ctx: &mut WidgetContext<'_>) {
        self.visibility.set(false);
        ctx.layers.untextured.hide(self.quads);
        for line in &mut self.lines {
            line.hide(ctx);
        }
    }

    /// Switch to the tall form with every line
    pub fn show_extended(&mut self, ctx: &mut WidgetContext<'_>) -> WidgetResult<()> {
        self.extended = true;
        self.height = StatLine::ALL.len() as f32 * self.line_height();
        self.update_positions(ctx);
        if self.visibility.is_shown() {
            self.show_lines(ctx)?;
        }
        Ok(())
    }

    /// Switch back to the frame rate only
    pub fn hide_extended(&mut self, ctx: &mut WidgetContext<'_>) {
        self.extended = false;
        self.height = self.line_height();
        self.update_positions(ctx);
        for line in &mut self.lines[StatLine::Primitives.index()..] {
            line.hide(ctx);
        }
    }

    /// Whether the tall form is selected
    pub const fn is_extended(&self) -> bool {
        self.extended
    }

    /// Refresh the displayed numbers; a hidden box is left untouched
    pub fn update(&mut self, ctx: &mut WidgetContext<'_>, sample: &FrameSample) -> WidgetResult<()> {
        if !self.visibility.is_shown() {
            return Ok(());
        }
        self.set_line(ctx, StatLine::Fps, &format!("{:.0}", sample.fps))?;
        if self.extended {
            self.set_line(ctx, StatLine::Primitives, &sample.primitives.to_string())?;
            self.set_line(ctx, StatLine::Samples, &sample.samples.to_string())?;
            self.set_line(ctx, StatLine::GpuTime, &format!("{:.3} ms", sample.gpu_time_ms))?;
        }
        Ok(())
    }

    /// Physics time arrives on its own schedule, in microseconds
    pub fn set_physics_time(&mut self, ctx: &mut WidgetContext<'_>, micros: f32) -> WidgetResult<()> {
        self.set_line(ctx, StatLine::PhysicsTime, &format!("{micros:.0} us"))
    }

    /// Z-order of the box; the text goes 5 below
    pub fn set_z(&mut self, ctx: &mut WidgetContext<'_>, z: f32) {
        self.z = ZOrder::from_f32(z);
        if let Some(quads) = ctx.layers.untextured.get_mut(self.quads) {
            quads.geometry_mut().set_all_depths(z);
        }
        let text_z = self.z.below(5);
        for line in &mut self.lines {
            line.set_z_order(ctx, text_z);
        }
    }

    /// Destroy the quads and every line
    pub fn release(&mut self, ctx: &mut WidgetContext<'_>) {
        self.hide(ctx);
        ctx.layers.untextured.remove(self.quads);
        for line in &mut self.lines {
            line.release(ctx);
        }
    }

    /// Text of one line
    pub fn line(&self, line: StatLine) -> &str {
        self.lines.get(line.index()).map_or("", TextString::text)
    }

    /// String of one line
    pub fn line_string(&self, line: StatLine) -> Option<&TextString> {
        self.lines.get(line.index())
    }

    /// Key of the box quads in the untextured layer
    pub const fn quad_key(&self) -> QuadKey {
        self.quads
    }

    fn line_height(&self) -> f32 {
        self.lines.first().map_or(0.0, TextString::height)
    }

    fn show_lines(&mut self, ctx: &mut WidgetContext<'_>) -> WidgetResult<()> {
        let shown = if self.extended { self.lines.len() } else { 1 };
        for line in &mut self.lines[..shown] {
            line.show(ctx)?;
        }
        Ok(())
    }

    fn set_line(&mut self, ctx: &mut WidgetContext<'_>, line: StatLine, value: &str) -> WidgetResult<()> {
        match self.lines.get_mut(line.index()) {
            Some(string) => string.set_text(ctx, &format!("{}{value}", line.prefix())),
            None => Ok(()),
        }
    }

    fn update_positions(&self, ctx: &mut WidgetContext<'_>) {
        let (px, py) = (ctx.pixel_width(), ctx.pixel_height());
        let (x, y, w, h) = (self.x, self.y, self.width, self.height);
        let Some(quads) = ctx.layers.untextured.get_mut(self.quads) else {
            return;
        };
        let geometry = quads.geometry_mut();
        geometry.set_corner_positions(BACKGROUND, x - px, y - py, w + 2.0 * px, h + 2.0 * py);
        geometry.set_corner_positions(LEFT_BORDER, x - 2.0 * px, y - 2.0 * py, px, h + 4.0 * py);
        geometry.set_corner_positions(RIGHT_BORDER, x + w + px, y - 2.0 * py, px, h + 4.0 * py);
        geometry.set_corner_positions(BOTTOM_BORDER, x - 2.0 * px, y - 2.0 * py, w + 4.0 * px, py);
        geometry.set_corner_positions(TOP_BORDER, x - 2.0 * px, y + h + 2.0 * py, w + 4.0 * px, py);
    }
}

impl ZOrdered for Statistics {
    fn z_order(&self) -> ZOrder {
        self.z
    }
}

impl Visible for Statistics {
    fn visibility(&self) -> Visibility {
        self.visibility
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::widgets::test_support::Fixture;
    use approx::assert_relative_eq;

    #[test]
    fn test_compact_and_extended_lines() {
        let mut fixture = Fixture::new();
        let mut ctx = fixture.context();
        let mut stats = Statistics::new(&mut ctx, Fixture::FONT).expect("statistics");

        stats.show(&mut ctx).expect("show");
        let shown = |ctx: &WidgetContext<'_>, stats: &Statistics, line| {
            let key = stats.line_string(line).expect("line").glyph_key();
            ctx.layers.text.is_shown(key)
        };
        assert!(shown(&ctx, &stats, StatLine::Fps));
        assert!(!shown(&ctx, &stats, StatLine::GpuTime));

        stats.show_extended(&mut ctx).expect("extend");
        assert!(shown(&ctx, &stats, StatLine::PhysicsTime));

        stats.hide_extended(&mut ctx);
        assert!(shown(&ctx, &stats, StatLine::Fps));
        assert!(!shown(&ctx, &stats, StatLine::Samples));
        assert!(ctx.layers.untextured.is_shown(stats.quad_key()));

        stats.hide(&mut ctx);
        assert!(!shown(&ctx, &stats, StatLine::Fps));
        assert!(!ctx.layers.untextured.is_shown(stats.quad_key()));
    }

    #[test]
    fn test_update_only_when_visible() {
        let mut fixture = Fixture::new();
        let mut ctx = fixture.context();
        let mut stats = Statistics::new(&mut ctx, Fixture::FONT).expect("statistics");
        let sample = FrameSample {
            fps: 59.7,
            primitives: 12,
            samples: 3,
            gpu_time_ms: 1.5,
        };

        stats.update(&mut ctx, &sample).expect("update");
        assert_eq!(stats.line(StatLine::Fps), "FPS: <>");

        stats.show(&mut ctx).expect("show");
        stats.update(&mut ctx, &sample).expect("update");
        assert_eq!(stats.line(StatLine::Fps), "FPS: 60");
        assert_eq!(stats.line(StatLine::Primitives), "Primitives: <>");

        stats.show_extended(&mut ctx).expect("extend");
        stats.update(&mut ctx, &sample).expect("update");
        assert_eq!(stats.line(StatLine::Primitives), "Primitives: 12");
        assert_eq!(stats.line(StatLine::GpuTime), "GPU Time: 1.500 ms");

        stats.set_physics_time(&mut ctx, 250.0).expect("physics");
        assert_eq!(stats.line(StatLine::PhysicsTime), "Phys Time: 250 us");
    }

    #[test]
    fn test_text_sits_below_box() {
        let mut fixture = Fixture::new();
        let mut ctx = fixture.context();
        let mut stats = Statistics::new(&mut ctx, Fixture::FONT).expect("statistics");
        stats.set_z(&mut ctx, 20.0);
        assert_eq!(stats.z_order().raw(), 20);
        let fps = stats.line_string(StatLine::Fps).expect("fps");
        assert_eq!(fps.z_order().raw(), 15);
    }

    #[test]
    fn test_lines_stack_upwards() {
        let mut fixture = Fixture::new();
        let mut ctx = fixture.context();
        let stats = Statistics::new(&mut ctx, Fixture::FONT).expect("statistics");
        let fps = stats.line_string(StatLine::Fps).expect("fps");
        let primitives = stats.line_string(StatLine::Primitives).expect("primitives");
        assert_relative_eq!(primitives.y() - fps.y(), fps.height(), epsilon = 1e-6);
    }

    #[test]
    fn test_sample_from_frame() {
        let mut stats = FrameStats::default();
        stats.untextured.quads = 3;
        stats.text.quads = 4;
        let sample = FrameSample::from_frame(30.0, &stats);
        assert_eq!(sample.primitives, 14);
    }
}
