use std::path::Path;

use image::Rgb;

use super::ArtifactError;
use super::canvas::{BLACK, Canvas, GRID, MUTED, WHITE};
use crate::ml::metrics::RocCurve;

pub const ROC_WIDTH: u32 = 800;
pub const ROC_HEIGHT: u32 = 600;
const MARGIN: f32 = 60.0;

/// Series colors, assigned in input order.
pub const PALETTE: [Rgb<u8>; 4] = [
    Rgb([31, 119, 180]),
    Rgb([255, 127, 14]),
    Rgb([44, 160, 44]),
    Rgb([214, 39, 40]),
];

/// Render ROC curves over a chance diagonal, one color per series.
pub fn render_roc(curves: &[(&str, &RocCurve)]) -> Result<Canvas, ArtifactError> {
    if curves.iter().all(|(_, curve)| curve.is_empty()) {
        return Err(ArtifactError::Empty("no ROC points to plot".to_string()));
    }
    let mut canvas = Canvas::new(ROC_WIDTH, ROC_HEIGHT, WHITE);
    let left = MARGIN;
    let right = ROC_WIDTH as f32 - MARGIN;
    let top = MARGIN / 2.0;
    let bottom = ROC_HEIGHT as f32 - MARGIN;
    let to_px = |fpr: f32, tpr: f32| {
        (
            left + fpr.clamp(0.0, 1.0) * (right - left),
            bottom - tpr.clamp(0.0, 1.0) * (bottom - top),
        )
    };

    for tick in 1..5 {
        let t = tick as f32 / 5.0;
        canvas.line(to_px(t, 0.0), to_px(t, 1.0), GRID);
        canvas.line(to_px(0.0, t), to_px(1.0, t), GRID);
    }
    canvas.dashed_line(to_px(0.0, 0.0), to_px(1.0, 1.0), MUTED, 6.0);

    for (idx, (_, curve)) in curves.iter().enumerate() {
        let color = PALETTE[idx % PALETTE.len()];
        for (x, y) in curve.fpr.windows(2).zip(curve.tpr.windows(2)) {
            canvas.thick_line(to_px(x[0], y[0]), to_px(x[1], y[1]), color, 2.0);
        }
    }

    canvas.stroke_rect(
        left as i64,
        top as i64,
        (right - left) as u32 + 1,
        (bottom - top) as u32 + 1,
        BLACK,
    );
    // Legend swatches, lower right, in series order.
    for idx in 0..curves.len() {
        let y = bottom as i64 - 24 - 18 * (curves.len() - 1 - idx) as i64;
        canvas.fill_rect(right as i64 - 40, y, 28, 10, PALETTE[idx % PALETTE.len()]);
    }
    Ok(canvas)
}

/// Render and save the ROC plot as PNG.
pub fn write_roc_plot(path: &Path, curves: &[(&str, &RocCurve)]) -> Result<(), ArtifactError> {
    let canvas = render_roc(curves)?;
    canvas.save_png(path)?;
    tracing::debug!(path = %path.display(), series = curves.len(), "Wrote ROC plot");
    Ok(())
}
