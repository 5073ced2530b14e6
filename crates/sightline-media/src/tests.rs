//! Scan loop tests against mocked face capabilities and scripted videos.
//!
//! Every frame carries its id in the red channel of pixel (0, 0); the mocked
//! locator looks the id up to decide which faces to return. The mocked
//! embedder reads a code from the face pixels and turns it into an
//! embedding whose cosine with the target `[1, 0]` is a chosen face score.

#[cfg(test)]
mod scan_loop_tests {
    use image::{Rgb, RgbImage};
    use sightline_models::{FaceBox, MatchKind, Region};
    use std::collections::{HashMap, VecDeque};
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use crate::annotate::{FACE_ONLY_COLOR, FULL_MATCH_COLOR};
    use crate::capability::{
        MockFaceEmbedder, MockFaceLocator, ModelCapabilities, VideoOpener, VideoSource,
    };
    use crate::config::{BodyGeometry, ScanConfig};
    use crate::error::{MediaError, MediaResult};
    use crate::regions::estimate_regions;
    use crate::scan::{scan_many, MatchOutcome, ScanControl, Scanner, Sighting};
    use crate::target::TargetDescriptor;

    const W: u32 = 200;
    const H: u32 = 200;
    const BACKGROUND: [u8; 3] = [128, 128, 128];
    const RED: [u8; 3] = [220, 20, 20];
    const BLUE: [u8; 3] = [0, 0, 200];

    // Face codes and the face score the mocked embedder produces for them.
    const STRONG: u8 = 10; // 0.90
    const MODERATE: u8 = 20; // 0.65
    const WEAK: u8 = 30; // 0.45
    const STRANGER: u8 = 40; // 0.20
    const LOOKALIKE: u8 = 50; // 0.70
    const BORDERLINE: u8 = 60; // 0.50
    const BROKEN: u8 = 70; // wrong embedding length

    fn face_score(code: u8) -> f32 {
        match code {
            STRONG => 0.9,
            MODERATE => 0.65,
            WEAK => 0.45,
            STRANGER => 0.2,
            LOOKALIKE => 0.7,
            BORDERLINE => 0.5,
            _ => 0.0,
        }
    }

    #[derive(Clone, Copy)]
    struct Person {
        face: FaceBox,
        code: u8,
        shirt: [u8; 3],
        pants: [u8; 3],
    }

    fn left(code: u8, shirt: [u8; 3]) -> Person {
        Person {
            face: FaceBox::new(60, 20, 20, 20),
            code,
            shirt,
            pants: BACKGROUND,
        }
    }

    fn right(code: u8, shirt: [u8; 3]) -> Person {
        Person {
            face: FaceBox::new(130, 20, 20, 20),
            code,
            shirt,
            pants: BACKGROUND,
        }
    }

    fn paint(image: &mut RgbImage, region: &Region, rgb: [u8; 3]) {
        for y in region.y1..region.y2 {
            for x in region.x1..region.x2 {
                image.put_pixel(x, y, Rgb(rgb));
            }
        }
    }

    /// Frames plus the face boxes the locator reports for each frame id.
    struct Script {
        frames: Vec<RgbImage>,
        faces: HashMap<u8, Vec<FaceBox>>,
    }

    fn script(frames: &[Vec<Person>]) -> Script {
        let mut images = Vec::new();
        let mut faces = HashMap::new();
        for (id, people) in frames.iter().enumerate() {
            let id = id as u8;
            let mut image = RgbImage::from_pixel(W, H, Rgb(BACKGROUND));
            for person in people {
                let regions = estimate_regions(&person.face, &BodyGeometry::default(), W, H, true);
                paint(&mut image, &regions.shirt, person.shirt);
                if let Some(pants) = regions.pants {
                    paint(&mut image, &pants, person.pants);
                }
                paint(&mut image, &person.face.clip(W, H), [person.code, 0, 0]);
            }
            image.put_pixel(0, 0, Rgb([id, BACKGROUND[1], BACKGROUND[2]]));
            images.push(image);
            faces.insert(id, people.iter().map(|p| p.face).collect());
        }
        Script {
            frames: images,
            faces,
        }
    }

    fn locator_for(faces: HashMap<u8, Vec<FaceBox>>) -> MockFaceLocator {
        let mut locator = MockFaceLocator::new();
        locator.expect_name().return_const("scripted");
        locator
            .expect_locate()
            .returning(move |frame| Ok(faces.get(&frame.get_pixel(0, 0)[0]).cloned().unwrap_or_default()));
        locator
    }

    fn embedder() -> MockFaceEmbedder {
        let mut embedder = MockFaceEmbedder::new();
        embedder.expect_name().return_const("scripted");
        embedder.expect_input_size().return_const((16u32, 16u32));
        embedder.expect_embed().returning(|crop| {
            let code = crop.get_pixel(8, 8)[0];
            if code == BROKEN {
                return Ok(vec![1.0, 0.0, 0.0]);
            }
            let s = face_score(code);
            Ok(vec![s, (1.0 - s * s).sqrt()])
        });
        embedder
    }

    fn scanner_with(locator: MockFaceLocator, config: ScanConfig) -> Scanner {
        let caps = ModelCapabilities::new(Arc::new(locator), Arc::new(embedder()));
        Scanner::new(Arc::new(caps), config)
    }

    fn scanner(faces: HashMap<u8, Vec<FaceBox>>) -> Scanner {
        scanner_with(locator_for(faces), ScanConfig::default())
    }

    fn target(shirt: &str, pants: &str) -> TargetDescriptor {
        TargetDescriptor::new(vec![1.0, 0.0], shirt, pants)
    }

    #[derive(Default)]
    struct VideoUsage {
        reads: AtomicUsize,
        skips: AtomicUsize,
        released: AtomicBool,
    }

    struct ScriptedVideo {
        fps: f64,
        frames: VecDeque<RgbImage>,
        usage: Arc<VideoUsage>,
    }

    impl ScriptedVideo {
        fn new(fps: f64, frames: Vec<RgbImage>) -> (Self, Arc<VideoUsage>) {
            let usage = Arc::new(VideoUsage::default());
            let video = Self {
                fps,
                frames: frames.into(),
                usage: usage.clone(),
            };
            (video, usage)
        }
    }

    impl VideoSource for ScriptedVideo {
        fn fps(&self) -> f64 {
            self.fps
        }

        fn next_frame(&mut self) -> MediaResult<Option<RgbImage>> {
            self.usage.reads.fetch_add(1, Ordering::SeqCst);
            Ok(self.frames.pop_front())
        }

        fn skip_frame(&mut self) -> MediaResult<bool> {
            self.usage.skips.fetch_add(1, Ordering::SeqCst);
            Ok(self.frames.pop_front().is_some())
        }
    }

    impl Drop for ScriptedVideo {
        fn drop(&mut self) {
            self.usage.released.store(true, Ordering::SeqCst);
        }
    }

    #[derive(Default)]
    struct ScriptedOpener {
        videos: Mutex<HashMap<PathBuf, ScriptedVideo>>,
        opens: AtomicUsize,
    }

    impl ScriptedOpener {
        fn with(path: &str, video: ScriptedVideo) -> Self {
            let opener = Self::default();
            opener.add(path, video);
            opener
        }

        fn add(&self, path: &str, video: ScriptedVideo) {
            self.videos.lock().unwrap().insert(PathBuf::from(path), video);
        }
    }

    impl VideoOpener for ScriptedOpener {
        fn open(&self, path: &Path) -> MediaResult<Box<dyn VideoSource>> {
            self.opens.fetch_add(1, Ordering::SeqCst);
            self.videos
                .lock()
                .unwrap()
                .remove(path)
                .map(|v| Box::new(v) as Box<dyn VideoSource>)
                .ok_or_else(|| MediaError::unreadable_video(path.display().to_string()))
        }
    }

    fn full_match(outcome: &MatchOutcome) -> &Sighting {
        match outcome {
            MatchOutcome::FullMatch(sighting) => sighting,
            other => panic!("expected a full match, got {other:?}"),
        }
    }

    #[test]
    fn test_reference_without_face_never_opens_video() {
        let mut locator = MockFaceLocator::new();
        locator.expect_name().return_const("scripted");
        locator.expect_locate().times(1).returning(|_| Ok(vec![]));
        let scanner = scanner_with(locator, ScanConfig::default());

        let (video, usage) = ScriptedVideo::new(1.0, script(&[vec![]]).frames);
        let opener = ScriptedOpener::with("cam.mp4", video);
        let photo = RgbImage::from_pixel(64, 64, Rgb(BACKGROUND));

        let err = scanner
            .search(&opener, Path::new("cam.mp4"), &photo, "red", "none", &ScanControl::new())
            .unwrap_err();

        assert!(matches!(err, MediaError::NoFaceInReference));
        assert_eq!(opener.opens.load(Ordering::SeqCst), 0);
        assert_eq!(usage.reads.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_no_detection_passes_gate_is_no_match() {
        let s = script(&[
            vec![left(STRANGER, RED)],
            vec![left(STRANGER, RED), right(STRANGER, RED)],
            vec![],
        ]);
        let scanner = scanner(s.faces);
        let (mut video, _) = ScriptedVideo::new(1.0, s.frames);

        let report = scanner.scan(&mut video, &target("red", "none")).unwrap();

        assert!(matches!(report.outcome, MatchOutcome::NoMatch));
        assert_eq!(report.stats.frames_sampled, 3);
        assert_eq!(report.stats.faces_located, 3);
        assert_eq!(report.stats.detections_gated, 0);
    }

    #[test]
    fn test_strong_face_and_shirt_halts_at_match_frame() {
        // fps 2: frames 0, 2, 4 and 6 are sampled
        let s = script(&[
            vec![],
            vec![left(STRONG, RED)],
            vec![left(WEAK, BLUE)],
            vec![],
            vec![left(STRONG, RED)],
            vec![],
            vec![left(STRONG, RED)],
            vec![],
        ]);
        let scanner = scanner(s.faces);
        let (mut video, usage) = ScriptedVideo::new(2.0, s.frames);

        let report = scanner.scan(&mut video, &target("red", "none")).unwrap();
        let sighting = full_match(&report.outcome);

        assert_eq!(sighting.sample.frame_index, 4);
        assert_eq!(sighting.sample.timestamp_seconds, 2.0);
        assert!((sighting.scores.face_score - 0.9).abs() < 1e-6);
        assert_eq!(sighting.scores.clothing_score, Some(1.0));
        assert!((sighting.scores.final_score - 0.93).abs() < 1e-6);
        assert_eq!(sighting.kind, MatchKind::FullMatch);

        // nothing after frame 4 was decoded
        assert_eq!(usage.reads.load(Ordering::SeqCst), 3);
        assert_eq!(usage.skips.load(Ordering::SeqCst), 2);
        assert_eq!(video.frames.len(), 3);

        // the returned frame is annotated
        assert_eq!(*sighting.sample.image.get_pixel(60, 30), FULL_MATCH_COLOR);
    }

    #[test]
    fn test_dont_care_shirt_matches_on_face_alone() {
        let s = script(&[vec![left(MODERATE, BLUE)]]);
        let scanner = scanner(s.faces);
        let (mut video, _) = ScriptedVideo::new(25.0, s.frames);

        let report = scanner.scan(&mut video, &target("none", "none")).unwrap();
        let sighting = full_match(&report.outcome);

        assert!((sighting.scores.final_score - 0.755).abs() < 1e-6);
    }

    #[test]
    fn test_weak_face_is_unclassified_and_scan_continues() {
        let s = script(&[vec![left(WEAK, BLUE)], vec![left(STRONG, RED)]]);
        let scanner = scanner(s.faces);
        let (mut video, _) = ScriptedVideo::new(1.0, s.frames);

        let report = scanner.scan(&mut video, &target("red", "none")).unwrap();
        let sighting = full_match(&report.outcome);

        assert_eq!(sighting.sample.frame_index, 1);
        assert_eq!(report.stats.detections_gated, 2);
        assert_eq!(report.stats.face_only_matches, 0);
    }

    #[test]
    fn test_face_only_match_is_reported_but_not_returned() {
        let s = script(&[vec![left(LOOKALIKE, BLUE)], vec![]]);
        let scanner = scanner(s.faces);
        let (mut video, usage) = ScriptedVideo::new(1.0, s.frames);

        let mut seen = Vec::new();
        let report = scanner
            .scan_with(&mut video, &target("red", "none"), &ScanControl::new(), |sighting| {
                seen.push((sighting.kind, *sighting.sample.image.get_pixel(60, 30)))
            })
            .unwrap();

        assert!(matches!(report.outcome, MatchOutcome::NoMatch));
        assert_eq!(seen, vec![(MatchKind::FaceOnlyMatch, FACE_ONLY_COLOR)]);
        assert_eq!(report.stats.face_only_matches, 1);
        assert_eq!(usage.reads.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_face_only_annotation_does_not_leak_into_frame() {
        let s = script(&[vec![left(LOOKALIKE, BLUE), right(STRONG, RED)]]);
        let scanner = scanner(s.faces);
        let (mut video, _) = ScriptedVideo::new(1.0, s.frames);

        let mut kinds = Vec::new();
        let report = scanner
            .scan_with(&mut video, &target("red", "none"), &ScanControl::new(), |sighting| {
                kinds.push(sighting.kind)
            })
            .unwrap();
        let sighting = full_match(&report.outcome);

        assert_eq!(kinds, vec![MatchKind::FaceOnlyMatch, MatchKind::FullMatch]);
        assert_eq!(sighting.detection.face, FaceBox::new(130, 20, 20, 20));
        assert_ne!(*sighting.sample.image.get_pixel(60, 30), FACE_ONLY_COLOR);
    }

    #[test]
    fn test_first_detection_wins_within_frame() {
        let s = script(&[vec![left(STRONG, RED), right(STRONG, RED)]]);
        let scanner = scanner(s.faces);
        let (mut video, _) = ScriptedVideo::new(1.0, s.frames);

        let report = scanner.scan(&mut video, &target("red", "none")).unwrap();

        assert_eq!(full_match(&report.outcome).detection.face, FaceBox::new(60, 20, 20, 20));
    }

    #[test]
    fn test_pant_colour_contributes_when_requested() {
        let mut wrong = left(BORDERLINE, RED);
        wrong.pants = RED;
        let mut right_pants = left(BORDERLINE, RED);
        right_pants.pants = BLUE;

        let s = script(&[vec![wrong], vec![right_pants]]);
        let scanner = scanner(s.faces);
        let (mut video, _) = ScriptedVideo::new(1.0, s.frames);

        let report = scanner.scan(&mut video, &target("red", "blue")).unwrap();
        let sighting = full_match(&report.outcome);

        // 0.7 * 0.5 + 0.3 * 1.0; the first frame only reached 0.5
        assert_eq!(sighting.sample.frame_index, 1);
        assert!((sighting.scores.final_score - 0.65).abs() < 1e-6);
        assert!(sighting.regions.pants.is_some());
    }

    #[test]
    fn test_off_frame_detection_is_skipped_quietly() {
        let mut faces = HashMap::new();
        faces.insert(0u8, vec![FaceBox::new(500, 500, 20, 20), FaceBox::new(60, 20, 20, 20)]);
        let mut s = script(&[vec![left(STRONG, RED)]]);
        s.faces = faces;
        let scanner = scanner(s.faces);
        let (mut video, _) = ScriptedVideo::new(1.0, s.frames);

        let report = scanner.scan(&mut video, &target("red", "none")).unwrap();

        assert!(report.outcome.is_match());
        assert_eq!(report.stats.skipped_boundary, 1);
        assert_eq!(report.stats.skipped_errors, 0);
    }

    #[test]
    fn test_embedding_fault_skips_detection() {
        let s = script(&[vec![left(BROKEN, RED), right(STRONG, RED)]]);
        let scanner = scanner(s.faces);
        let (mut video, _) = ScriptedVideo::new(1.0, s.frames);

        let report = scanner.scan(&mut video, &target("red", "none")).unwrap();

        assert!(report.outcome.is_match());
        assert_eq!(report.stats.skipped_errors, 1);
    }

    #[test]
    fn test_locator_failures_abort_after_budget() {
        let mut locator = MockFaceLocator::new();
        locator.expect_name().return_const("scripted");
        locator
            .expect_locate()
            .times(3)
            .returning(|_| Err(MediaError::detection_failed("inference error")));
        let scanner = scanner_with(locator, ScanConfig::default());

        let s = script(&[vec![], vec![], vec![], vec![], vec![]]);
        let (mut video, _) = ScriptedVideo::new(1.0, s.frames);

        let err = scanner.scan(&mut video, &target("red", "none")).unwrap_err();
        assert!(matches!(err, MediaError::DetectionFailed(_)));
    }

    #[test]
    fn test_empty_video_is_unreadable() {
        let scanner = scanner(HashMap::new());
        let (mut video, _) = ScriptedVideo::new(30.0, Vec::new());

        let err = scanner.scan(&mut video, &target("red", "none")).unwrap_err();
        assert!(matches!(err, MediaError::EmptyOrUnreadableVideo(_)));
    }

    #[test]
    fn test_unknown_frame_rate_samples_every_frame() {
        let s = script(&[vec![], vec![], vec![left(STRONG, RED)]]);
        let scanner = scanner(s.faces);
        let (mut video, usage) = ScriptedVideo::new(f64::NAN, s.frames);

        let report = scanner.scan(&mut video, &target("red", "none")).unwrap();
        let sighting = full_match(&report.outcome);

        assert_eq!(report.stats.stride, 1);
        assert_eq!(sighting.sample.timestamp_seconds, 2.0);
        assert_eq!(usage.skips.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_cancelled_scan_releases_video() {
        let s = script(&[vec![], vec![left(STRONG, RED)]]);
        let scanner = scanner(s.faces);
        let (video, usage) = ScriptedVideo::new(1.0, s.frames);
        let opener = ScriptedOpener::with("cam.mp4", video);

        let (cancel_tx, cancel_rx) = tokio::sync::watch::channel(false);
        cancel_tx.send(true).unwrap();
        let control = ScanControl::new().with_cancel(cancel_rx);

        let err = scanner
            .scan_path(&opener, Path::new("cam.mp4"), &target("red", "none"), &control, |_| {})
            .unwrap_err();

        assert!(matches!(err, MediaError::Cancelled));
        assert!(usage.released.load(Ordering::SeqCst));
    }

    #[test]
    fn test_expired_deadline_times_out() {
        let s = script(&[vec![left(STRONG, RED)]]);
        let scanner = scanner(s.faces);
        let (mut video, usage) = ScriptedVideo::new(1.0, s.frames);

        let err = scanner
            .scan_with(&mut video, &target("red", "none"), &ScanControl::new().with_timeout(0), |_| {})
            .unwrap_err();

        assert!(matches!(err, MediaError::Timeout(0)));
        assert_eq!(usage.reads.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_configured_timeout_applies_without_caller_deadline() {
        let s = script(&[vec![left(STRONG, RED)]]);
        let scanner = scanner_with(locator_for(s.faces), ScanConfig::default().with_timeout(0));
        let (mut video, usage) = ScriptedVideo::new(1.0, s.frames);

        let err = scanner
            .scan_with(&mut video, &target("red", "none"), &ScanControl::new(), |_| {})
            .unwrap_err();

        assert!(matches!(err, MediaError::Timeout(0)));
        assert_eq!(usage.reads.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_garment_colour_decides_between_full_and_face_only() {
        // Same face twice: blue shirt first (face-only), red shirt next (full match)
        let s = script(&[vec![left(MODERATE, BLUE)], vec![left(MODERATE, RED)]]);
        let scanner = scanner(s.faces);
        let (mut video, _usage) = ScriptedVideo::new(1.0, s.frames);
        let mut kinds = Vec::new();

        let report = scanner
            .scan_with(&mut video, &target("red", "none"), &ScanControl::new(), |sighting| {
                kinds.push(sighting.kind)
            })
            .unwrap();

        assert_eq!(kinds, vec![MatchKind::FaceOnlyMatch, MatchKind::FullMatch]);
        let sighting = full_match(&report.outcome);
        assert_eq!(sighting.sample.frame_index, 1);
        assert_eq!(sighting.scores.clothing_score, Some(1.0));
    }

    #[test]
    fn test_video_released_after_match() {
        let s = script(&[vec![left(STRONG, RED)], vec![]]);
        let scanner = scanner(s.faces);
        let (video, usage) = ScriptedVideo::new(1.0, s.frames);
        let opener = ScriptedOpener::with("cam.mp4", video);

        let report = scanner
            .scan_path(&opener, Path::new("cam.mp4"), &target("red", "none"), &ScanControl::new(), |_| {})
            .unwrap();

        assert!(report.outcome.is_match());
        assert!(usage.released.load(Ordering::SeqCst));
    }

    #[test]
    fn test_scan_many_scans_each_video_independently() {
        let hit = script(&[vec![left(STRONG, RED)]]);
        let miss = script(&[vec![left(STRANGER, RED)]]);
        // both videos have a single frame 0 with a face in the same place
        let scanner = scanner(hit.faces);

        let opener = ScriptedOpener::default();
        opener.add("hit.mp4", ScriptedVideo::new(1.0, hit.frames).0);
        opener.add("miss.mp4", ScriptedVideo::new(1.0, miss.frames).0);

        let paths = vec![
            PathBuf::from("hit.mp4"),
            PathBuf::from("miss.mp4"),
            PathBuf::from("missing.mp4"),
        ];
        let matched = Mutex::new(Vec::new());
        let results = scan_many(
            &scanner,
            &opener,
            &paths,
            &target("red", "none"),
            &ScanControl::new(),
            |path, _| matched.lock().unwrap().push(path.to_path_buf()),
        );

        assert_eq!(results.len(), 3);
        assert!(results[0].result.as_ref().unwrap().outcome.is_match());
        assert!(!results[1].result.as_ref().unwrap().outcome.is_match());
        assert!(matches!(
            results[2].result,
            Err(MediaError::EmptyOrUnreadableVideo(_))
        ));
        assert_eq!(*matched.lock().unwrap(), vec![PathBuf::from("hit.mp4")]);
    }
}
