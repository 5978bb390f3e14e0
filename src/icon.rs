use eframe::egui::viewport::IconData;

const BAR_HEIGHTS: [f32; 5] = [0.35, 0.65, 1.0, 0.65, 0.35];

// Rounded square with a violet vertical gradient and a white five-bar waveform
pub fn generate_icon(size: u32) -> IconData {
    let w = size;
    let h = size;
    let mut rgba = vec![0u8; (w * h * 4) as usize];
    let s = size as f32;
    let corner = s * 0.22;
    let inset = s * 0.06;

    let bar_w = s * 0.08;
    let gap = s * 0.05;
    let total = bar_w * BAR_HEIGHTS.len() as f32 + gap * (BAR_HEIGHTS.len() - 1) as f32;
    let left = (s - total) * 0.5;
    let max_half = s * 0.26;

    for y in 0..h {
        for x in 0..w {
            let idx = ((y * w + x) * 4) as usize;
            let px = x as f32 + 0.5;
            let py = y as f32 + 0.5;

            if !in_rounded_rect(px, py, inset, s - inset, corner) {
                continue;
            }
            let t = py / s;
            rgba[idx] = lerp(132.0, 64.0, t) as u8;
            rgba[idx + 1] = lerp(72.0, 30.0, t) as u8;
            rgba[idx + 2] = lerp(240.0, 150.0, t) as u8;
            rgba[idx + 3] = 255;

            if in_waveform(px, py, left, bar_w, gap, s * 0.5, max_half) {
                rgba[idx] = 255;
                rgba[idx + 1] = 255;
                rgba[idx + 2] = 255;
            }
        }
    }

    IconData { rgba, width: w, height: h }
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 { a + (b - a) * t.clamp(0.0, 1.0) }

fn in_rounded_rect(px: f32, py: f32, lo: f32, hi: f32, r: f32) -> bool {
    if px < lo || py < lo || px > hi || py > hi {
        return false;
    }
    let cx = px.clamp(lo + r, hi - r);
    let cy = py.clamp(lo + r, hi - r);
    let (dx, dy) = (px - cx, py - cy);
    dx * dx + dy * dy <= r * r
}

fn in_waveform(px: f32, py: f32, left: f32, bar_w: f32, gap: f32, mid: f32, max_half: f32) -> bool {
    let rel = px - left;
    if rel < 0.0 {
        return false;
    }
    let slot = (rel / (bar_w + gap)) as usize;
    if slot >= BAR_HEIGHTS.len() || rel - slot as f32 * (bar_w + gap) > bar_w {
        return false;
    }
    (py - mid).abs() <= max_half * BAR_HEIGHTS[slot]
}
