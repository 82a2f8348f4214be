// tests/recording_pipeline.rs

use waveform_recorder::capture::SampleFormat;
use waveform_recorder::encoder::container::to_pcm16;
use waveform_recorder::waveform::{DecimationBuffer, RenderPath, SelectionModel, ViewWindow};
use waveform_recorder::{EngineConfig, RecordingSession, ResampleMode};

fn stereo_sine(frames: usize, rate: f32) -> Vec<f32> {
    let mut out = Vec::with_capacity(frames * 2);
    for i in 0..frames {
        let t = i as f32 / rate;
        out.push((t * 440.0 * std::f32::consts::TAU).sin() * 0.6);
        out.push((t * 220.0 * std::f32::consts::TAU).sin() * 0.3);
    }
    out
}

#[test]
fn recorded_file_reads_back_with_an_independent_parser() {
    let mut session = RecordingSession::new(EngineConfig::default());
    session.start(44_100, 2).unwrap();
    let audio = stereo_sine(44_100, 44_100.0);
    for chunk in audio.chunks(2048) {
        session.push_interleaved(chunk).unwrap();
    }
    let rec = session.stop().unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(&rec.filename);
    rec.file.write_to(&path).unwrap();

    let mut reader = hound::WavReader::open(&path).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.channels, 2);
    assert_eq!(spec.sample_rate, 44_100);
    assert_eq!(spec.bits_per_sample, 16);
    assert_eq!(spec.sample_format, hound::SampleFormat::Int);

    let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
    assert_eq!(samples.len(), audio.len());
    for (got, want) in samples.iter().zip(&audio).step_by(97) {
        assert_eq!(*got, to_pcm16(*want));
    }
}

#[test]
fn sinc_export_resamples_both_channels() {
    let config = EngineConfig {
        resample_mode: ResampleMode::Sinc,
        export_sample_rate: Some(16_000),
        ..Default::default()
    };
    let mut session = RecordingSession::new(config);
    session.start(48_000, 2).unwrap();
    session.push_interleaved(&stereo_sine(48_000, 48_000.0)).unwrap();
    let rec = session.stop().unwrap();

    let reader = hound::WavReader::new(std::io::Cursor::new(rec.file.into_bytes())).unwrap();
    assert_eq!(reader.spec().sample_rate, 16_000);
    assert_eq!(reader.spec().channels, 2);
    assert_eq!(reader.duration(), 16_000);
}

#[test]
fn byte_chunks_feed_the_waveform() {
    let mut session = RecordingSession::new(EngineConfig::default());
    session.start(48_000, 1).unwrap();
    let bytes: Vec<u8> = (0..48_000)
        .flat_map(|i| (((i as f32 * 0.02).sin() * 16_000.0) as i16).to_le_bytes())
        .collect();
    for chunk in bytes.chunks(9600) {
        session.push_bytes(chunk, SampleFormat::I16).unwrap();
    }
    let update = session.draw(None).unwrap().unwrap();
    assert_eq!(update.decimation_factor, 10);
    assert_eq!(update.total_blocks, 4800);
    assert_eq!(update.stats.path, RenderPath::Aggregate);
    assert!((update.duration_secs - 1.0).abs() < 1e-9);
}

#[test]
fn documented_scenarios() {
    // 48 kHz against a 5 kHz target decimates by 10
    let buf = DecimationBuffer::new(48_000.0, 5000.0);
    assert_eq!(buf.decimation_factor(), 10);

    // 10 000 blocks on 800 px at zoom 1 is 12.5 blocks per pixel
    let mut view = ViewWindow::new(800, 1.5);
    view.set_total(10_000);
    view.scroll_to_latest();
    assert_eq!(view.samples_per_pixel(), 12.5);

    // one zoom step around the middle
    view.zoom_by_steps(1.0, Some(0.5));
    assert!((view.zoom_factor() - 1.5).abs() < 1e-12);
    assert_eq!(view.visible_samples(), 6667);
    let rel = (5000.0 - view.view_start() as f64) / view.visible_samples() as f64;
    assert!((rel - 0.5).abs() < 1e-3);

    // backwards drag is normalized; duration uses the block rate
    let rate = buf.effective_rate();
    let mut sel = SelectionModel::new(0.01);
    sel.begin(100);
    sel.update(50);
    assert!(sel.commit(rate));
    let range = sel.range().unwrap();
    assert_eq!((range.start, range.end), (50, 100));
    assert!((sel.duration_secs(rate) - 50.0 / 4800.0).abs() < 1e-12);
}
