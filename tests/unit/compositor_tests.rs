/*!
 * Tests for timed audio compositing
 */

use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use vttspeak::compositor::{composite_span, Compositor, MeasuredClip};
use vttspeak::errors::CompositionError;
use vttspeak::media::{AudioEncoding, AudioNode};
use vttspeak::synthesis_service::AudioClip;
use crate::common::mock_media::{FailOn, FakeMediaBackend, FAKE_MP3};

fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

/// Test that the span is offset plus measured duration, in any input order
#[tokio::test]
async fn test_compose_files_withTwoClips_shouldSpanLatestEnd() -> Result<()> {
    let backend = Arc::new(
        FakeMediaBackend::new()
            .with_duration("a.mp3", ms(1000))
            .with_duration("b.mp3", ms(450)),
    );
    let compositor = Compositor::new(backend.clone(), AudioEncoding::default());

    let forward = compositor
        .compose_files(&["a.mp3", "b.mp3"], &[ms(0), ms(1000)])
        .await?;
    let reversed = compositor
        .compose_files(&["b.mp3", "a.mp3"], &[ms(1000), ms(0)])
        .await?;

    assert_eq!(forward.span, ms(1450));
    assert_eq!(reversed.span, ms(1450));
    assert_eq!(&forward.bytes[..], FAKE_MP3);
    assert!(!forward.is_empty());
    Ok(())
}

/// Test the three-clip span for every input order
#[tokio::test]
async fn test_compose_files_withThreeClipsInAnyOrder_shouldSpan1450ms() -> Result<()> {
    let backend = Arc::new(
        FakeMediaBackend::new()
            .with_duration("a.mp3", ms(400))
            .with_duration("b.mp3", ms(300))
            .with_duration("c.mp3", ms(250)),
    );
    let compositor = Compositor::new(backend.clone(), AudioEncoding::default());

    let pairs = [("a.mp3", ms(0)), ("b.mp3", ms(500)), ("c.mp3", ms(1200))];
    let orders = [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];
    for order in orders {
        let files: Vec<&str> = order.iter().map(|&i| pairs[i].0).collect();
        let offsets: Vec<Duration> = order.iter().map(|&i| pairs[i].1).collect();

        let stream = compositor.compose_files(&files, &offsets).await?;
        assert_eq!(stream.span, ms(1450), "order {:?}", order);
    }

    // Each composite probes its own clips and builds one graph
    assert_eq!(backend.probes().len(), 18);
    assert_eq!(backend.graphs().len(), 6);
    Ok(())
}

/// Test that a late, short clip does not end the track early
#[tokio::test]
async fn test_compose_files_withEarlyLongClip_shouldKeepItsTail() -> Result<()> {
    let backend = Arc::new(
        FakeMediaBackend::new()
            .with_duration("long.mp3", ms(5000))
            .with_duration("short.mp3", ms(200)),
    );
    let compositor = Compositor::new(backend, AudioEncoding::default());

    let stream = compositor
        .compose_files(&["long.mp3", "short.mp3"], &[ms(0), ms(1000)])
        .await?;

    assert_eq!(stream.span, ms(5000));
    Ok(())
}

/// Test that mismatched counts are rejected before any probing
#[tokio::test]
async fn test_compose_files_withCountMismatch_shouldFailEarly() {
    let backend = Arc::new(FakeMediaBackend::new());
    let compositor = Compositor::new(backend.clone(), AudioEncoding::default());

    let result = compositor
        .compose_files(&["a.mp3", "b.mp3"], &[ms(0), ms(1000), ms(2000)])
        .await;

    assert!(matches!(
        result,
        Err(CompositionError::CountMismatch { clips: 2, offsets: 3 })
    ));
    assert!(backend.probes().is_empty());
    assert!(backend.graphs().is_empty());
}

/// Test that nothing to composite is an error
#[tokio::test]
async fn test_compose_withNoClips_shouldFail() {
    let compositor = Compositor::new(Arc::new(FakeMediaBackend::new()), AudioEncoding::default());
    let result = compositor.compose(&[]).await;
    assert!(matches!(result, Err(CompositionError::NoClips)));
}

/// Test that a single clip is encoded without a mix step
#[tokio::test]
async fn test_compose_withSingleClip_shouldNotMix() -> Result<()> {
    let backend = Arc::new(FakeMediaBackend::new().with_duration("solo.mp3", ms(700)));
    let compositor = Compositor::new(backend.clone(), AudioEncoding::default());

    let clips = vec![AudioClip {
        index: 0,
        start_offset: ms(300),
        path: PathBuf::from("solo.mp3"),
    }];
    let stream = compositor.compose(&clips).await?;

    assert_eq!(stream.span, ms(1000));
    let graphs = backend.graphs();
    assert_eq!(graphs.len(), 1);
    assert!(!graphs[0].nodes().iter().any(|n| matches!(n, AudioNode::Mix { .. })));
    assert_eq!(
        graphs[0].nodes()[0],
        AudioNode::Delay {
            source: vttspeak::media::StreamRef::Input(0),
            delay: ms(300)
        }
    );
    Ok(())
}

/// Test that probe and encode failures surface as composition errors
#[tokio::test]
async fn test_compose_files_withBackendFailures_shouldReportStage() {
    let probe_fails = Compositor::new(
        Arc::new(FakeMediaBackend::new().failing_on(FailOn::Probe)),
        AudioEncoding::default(),
    );
    match probe_fails.compose_files(&["x.mp3"], &[ms(0)]).await {
        Err(CompositionError::Probe { path, .. }) => assert_eq!(path, PathBuf::from("x.mp3")),
        other => panic!("expected probe failure, got {:?}", other),
    }

    let encode_fails = Compositor::new(
        Arc::new(FakeMediaBackend::new().failing_on(FailOn::Encode)),
        AudioEncoding::default(),
    );
    assert!(matches!(
        encode_fails.compose_files(&["x.mp3"], &[ms(0)]).await,
        Err(CompositionError::Media(_))
    ));
}

/// Test the span helper directly
#[test]
fn test_composite_span_withClips_shouldTakeMaximumEnd() {
    let clips = vec![
        MeasuredClip {
            path: PathBuf::from("a"),
            offset: ms(2000),
            duration: ms(100),
        },
        MeasuredClip {
            path: PathBuf::from("b"),
            offset: ms(0),
            duration: ms(2500),
        },
    ];
    assert_eq!(composite_span(&clips), ms(2500));
    assert_eq!(composite_span(&[]), Duration::ZERO);
}
