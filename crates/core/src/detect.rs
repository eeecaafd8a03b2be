use crate::calibration::Calibration;
use crate::platform::Screen;
use crate::rig::{BoardScanner, Detector};
use crate::types::*;
use crate::logger;

/// Half-width of the square sampled around a point.
const SAMPLE_RADIUS: i32 = 4;

/// Average RGB over every pixel of a capture.
/// Capture is always BGRA byte order.
fn mean_rgb(capture: &Capture) -> Option<[f64; 3]> {
    let mut sum = [0u64; 3];
    let mut n = 0u64;
    for y in 0..capture.height {
        for x in 0..capture.width {
            let idx = (y * capture.bytes_per_row + x * 4) as usize;
            let Some(px) = capture.data.get(idx..idx + 4) else { continue };
            sum[0] += px[2] as u64;
            sum[1] += px[1] as u64;
            sum[2] += px[0] as u64;
            n += 1;
        }
    }
    if n == 0 {
        return None;
    }
    Some([
        sum[0] as f64 / n as f64,
        sum[1] as f64 / n as f64,
        sum[2] as f64 / n as f64,
    ])
}

/// Nearest reference colour within `tolerance` (Euclidean RGB distance).
pub fn classify_capture(capture: &Capture, tolerance: f64) -> Option<PieceType> {
    let rgb = mean_rgb(capture)?;
    PieceType::ALL
        .iter()
        .map(|&p| {
            let r = p.reference_rgb();
            let d = (0..3)
                .map(|i| (rgb[i] - r[i] as f64).powi(2))
                .sum::<f64>()
                .sqrt();
            (p, d)
        })
        .filter(|&(_, d)| d <= tolerance)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(p, _)| p)
}

/// Colour detector backed by screen captures.
pub struct ScreenDetector {
    screen: Box<dyn Screen>,
    tolerance: f64,
    #[cfg(feature = "debug-capture")]
    misses: u32,
}

impl ScreenDetector {
    pub fn new(screen: Box<dyn Screen>, tolerance: f64) -> Self {
        Self {
            screen,
            tolerance,
            #[cfg(feature = "debug-capture")]
            misses: 0,
        }
    }

    #[cfg(feature = "debug-capture")]
    fn dump_miss(&mut self, capture: &Capture) {
        self.misses += 1;
        let mut rgba = Vec::with_capacity((capture.width * capture.height * 4) as usize);
        for y in 0..capture.height {
            for x in 0..capture.width {
                let idx = (y * capture.bytes_per_row + x * 4) as usize;
                match capture.data.get(idx..idx + 4) {
                    Some(px) => rgba.extend_from_slice(&[px[2], px[1], px[0], 255]),
                    None => rgba.extend_from_slice(&[0, 0, 0, 255]),
                }
            }
        }
        let path = format!("logs/miss-{}.png", self.misses);
        match image::RgbaImage::from_raw(capture.width, capture.height, rgba) {
            Some(img) => {
                if let Err(e) = img.save(&path) {
                    logger::warn_p("detect", &format!("failed to save {}: {}", path, e));
                }
            }
            None => logger::warn_p("detect", "capture buffer too small to dump"),
        }
    }
}

impl Detector for ScreenDetector {
    fn classify_at(&mut self, at: Point) -> Option<PieceType> {
        let capture = self.screen.capture(CaptureRect::around(at, SAMPLE_RADIUS))?;
        let piece = classify_capture(&capture, self.tolerance);
        if piece.is_none() {
            logger::debug_p("detect", &format!("no match at ({}, {})", at.x, at.y));
            #[cfg(feature = "debug-capture")]
            self.dump_miss(&capture);
        }
        piece
    }
}

/// Reads the board by classifying the centre of every cell.
pub struct ScreenScanner {
    screen: Box<dyn Screen>,
    calibration: Calibration,
    tolerance: f64,
}

impl ScreenScanner {
    pub fn new(screen: Box<dyn Screen>, calibration: Calibration, tolerance: f64) -> Self {
        Self { screen, calibration, tolerance }
    }
}

impl BoardScanner for ScreenScanner {
    fn scan_board(&mut self) -> RawGrid {
        let mut grid = EMPTY_GRID;
        for (r, row) in grid.iter_mut().enumerate() {
            for (c, cell) in row.iter_mut().enumerate() {
                let at = self.calibration.cell_center((r, c));
                *cell = self
                    .screen
                    .capture(CaptureRect::around(at, SAMPLE_RADIUS))
                    .and_then(|cap| classify_capture(&cap, self.tolerance));
            }
        }
        grid
    }
}
