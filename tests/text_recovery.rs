use boxscan::{
    Attempt, OcrEngine, OcrError, PreprocessConfig, RotationSchedule, TextRecovery, Vocabulary,
};
use image::{GrayImage, Rgb, RgbImage};

/// Returns the scripted outputs in order, then empty strings.
struct Scripted {
    outputs: Vec<&'static str>,
    calls: usize,
}

impl Scripted {
    fn new(outputs: Vec<&'static str>) -> Self {
        Self { outputs, calls: 0 }
    }
}

impl OcrEngine for Scripted {
    fn read_text(&mut self, _image: &GrayImage) -> Result<String, OcrError> {
        let out = self.outputs.get(self.calls).copied().unwrap_or("");
        self.calls += 1;
        Ok(out.to_owned())
    }
}

struct Broken {
    calls: usize,
}

impl OcrEngine for Broken {
    fn read_text(&mut self, _image: &GrayImage) -> Result<String, OcrError> {
        self.calls += 1;
        Err(OcrError::Recognition("engine crashed".to_owned()))
    }
}

/// Reads "BIANCO" only when the foreground stroke lies horizontally.
///
/// Orientation comes from second-order moments of the bright pixels, which
/// makes the engine a stand-in for OCR that only reads upright text.
struct UprightOracle {
    tolerance_deg: f32,
    calls: usize,
}

impl OcrEngine for UprightOracle {
    fn read_text(&mut self, image: &GrayImage) -> Result<String, OcrError> {
        self.calls += 1;
        let (mut n, mut sx, mut sy) = (0.0f64, 0.0f64, 0.0f64);
        for (x, y, p) in image.enumerate_pixels() {
            if p[0] > 127 {
                n += 1.0;
                sx += x as f64;
                sy += y as f64;
            }
        }
        if n < 10.0 {
            return Ok(String::new());
        }
        let (mx, my) = (sx / n, sy / n);
        let (mut mu20, mut mu02, mut mu11) = (0.0f64, 0.0f64, 0.0f64);
        for (x, y, p) in image.enumerate_pixels() {
            if p[0] > 127 {
                let dx = x as f64 - mx;
                let dy = y as f64 - my;
                mu20 += dx * dx;
                mu02 += dy * dy;
                mu11 += dx * dy;
            }
        }
        let theta = (0.5 * (2.0 * mu11).atan2(mu20 - mu02)).to_degrees() as f32;
        let folded = theta.rem_euclid(180.0);
        let off_axis = folded.min(180.0 - folded);
        if off_axis <= self.tolerance_deg {
            Ok("BIANCO".to_owned())
        } else {
            Ok("III".to_owned())
        }
    }
}

fn stripes() -> RgbImage {
    RgbImage::from_fn(48, 24, |x, _| {
        if x % 6 < 3 {
            Rgb([15, 15, 15])
        } else {
            Rgb([235, 235, 235])
        }
    })
}

/// White bar on black through the centre, `angle_deg` clockwise from horizontal
/// in image coordinates (y down).
fn bar(angle_deg: f32) -> RgbImage {
    let size = 121u32;
    let c = (size as f32 - 1.0) * 0.5;
    let (s, co) = angle_deg.to_radians().sin_cos();
    RgbImage::from_fn(size, size, |x, y| {
        let dx = x as f32 - c;
        let dy = y as f32 - c;
        let along = dx * co + dy * s;
        let across = -dx * s + dy * co;
        if along.abs() <= 48.0 && across.abs() <= 3.5 {
            Rgb([255, 255, 255])
        } else {
            Rgb([0, 0, 0])
        }
    })
}

#[test]
fn direct_read_needs_no_rotation() {
    let mut engine = Scripted::new(vec!["PICOLLO"]);
    let recovery = TextRecovery::default();
    let found = recovery.recover(&mut engine, &stripes()).unwrap();
    assert_eq!(found.entry, "PICOLLO");
    assert_eq!(found.attempt, Attempt::Direct);
    assert_eq!(engine.calls, 1);
}

#[test]
fn hit_on_third_rotation_stops_the_schedule() {
    let mut engine = Scripted::new(vec!["", "xx", "ORA", "  noise ORAFIO noise "]);
    let recovery = TextRecovery::default();
    let found = recovery.recover(&mut engine, &stripes()).unwrap();
    assert_eq!(found.text, "noise ORAFIO noise");
    assert_eq!(found.entry, "ORAFIO");
    assert_eq!(
        found.attempt,
        Attempt::Rotated {
            index: 3,
            angle_deg: 90.0
        }
    );
    assert_eq!(engine.calls, 4);
}

#[test]
fn text_outside_vocabulary_is_rejected() {
    let mut engine = Scripted::new(vec!["ESPRESSO"; 12]);
    let recovery = TextRecovery::default();
    assert!(recovery.recover(&mut engine, &stripes()).is_none());
    assert_eq!(engine.calls, 12);
}

#[test]
fn custom_vocabulary_is_honoured() {
    let vocabulary = Vocabulary::new(["ristretto"]);
    let recovery = TextRecovery::new(
        vocabulary,
        RotationSchedule::default(),
        PreprocessConfig::default(),
    );
    let mut engine = Scripted::new(vec!["Ristretto"]);
    let found = recovery.recover(&mut engine, &stripes()).unwrap();
    assert_eq!(found.entry, "RISTRETTO");
}

#[test]
fn engine_failure_abandons_region() {
    let mut engine = Broken { calls: 0 };
    assert!(TextRecovery::default()
        .recover(&mut engine, &stripes())
        .is_none());
    assert_eq!(engine.calls, 1);
}

#[test]
fn zero_rotations_means_single_attempt() {
    let recovery = TextRecovery::new(
        Vocabulary::default(),
        RotationSchedule {
            rotations: 0,
            step_deg: 30.0,
        },
        PreprocessConfig::default(),
    );
    let mut engine = Scripted::new(vec!["", "DOLCE"]);
    assert!(recovery.recover(&mut engine, &stripes()).is_none());
    assert_eq!(engine.calls, 1);
}

#[test]
fn thirty_degree_schedule_recovers_sixty_degree_offset() {
    let region = bar(60.0);
    let schedule = RotationSchedule::default();
    assert!(schedule.covers(60.0, 8.0));

    let mut engine = UprightOracle {
        tolerance_deg: 8.0,
        calls: 0,
    };
    let recovery = TextRecovery::new(Vocabulary::default(), schedule, PreprocessConfig::default());
    let found = recovery.recover(&mut engine, &region).unwrap();
    assert_eq!(found.entry, "BIANCO");
    assert_eq!(
        found.attempt,
        Attempt::Rotated {
            index: 2,
            angle_deg: 60.0
        }
    );
    assert_eq!(engine.calls, 3);
}

#[test]
fn coarse_schedule_misses_sixty_degree_offset() {
    let region = bar(60.0);
    let schedule = RotationSchedule {
        rotations: 3,
        step_deg: 45.0,
    };
    assert!(!schedule.covers(60.0, 8.0));

    let mut engine = UprightOracle {
        tolerance_deg: 8.0,
        calls: 0,
    };
    let recovery = TextRecovery::new(Vocabulary::default(), schedule, PreprocessConfig::default());
    assert!(recovery.recover(&mut engine, &region).is_none());
    assert_eq!(engine.calls, 4);
}

#[test]
fn upright_bar_reads_directly() {
    let mut engine = UprightOracle {
        tolerance_deg: 8.0,
        calls: 0,
    };
    let found = TextRecovery::default()
        .recover(&mut engine, &bar(0.0))
        .unwrap();
    assert_eq!(found.attempt, Attempt::Direct);
}
