/*!
 * End-to-end pipeline tests against the mock provider and fake media
 */

use anyhow::Result;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use vttspeak::app_config::Config;
use vttspeak::errors::{AppError, ParseError, SynthesisError};
use vttspeak::media::{AudioNode, StreamRef};
use vttspeak::providers::mock::MockProvider;
use vttspeak::Controller;
use crate::common::{self, mock_media::{FakeMediaBackend, FAKE_MP3, FAKE_MP4}};

fn controller(provider: &Arc<MockProvider>, backend: &Arc<FakeMediaBackend>) -> Controller {
    common::init_test_logging();
    Controller::with_components(Config::default(), provider.clone(), backend.clone()).with_progress(false)
}

/// Test a full audio run: one request per cue, clips delayed to their cue starts
#[tokio::test]
async fn test_run_withTwoCueAudioOutput_shouldMixAtCueStarts() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "input.vtt")?;
    let output = temp_dir.path().join("out.mp3");

    let provider = Arc::new(MockProvider::tone(Duration::from_millis(1000)));
    let backend = Arc::new(FakeMediaBackend::new());
    controller(&provider, &backend).run(&input, &output).await?;

    assert_eq!(fs::read(&output)?, FAKE_MP3);
    assert_eq!(provider.request_count(), 2);
    let texts: Vec<String> = provider.requests().into_iter().map(|r| r.text).collect();
    assert_eq!(texts, vec!["Hello", "World"]);
    assert!(provider.requests().iter().all(|r| r.voice.language_code == "ja"));

    let graphs = backend.graphs();
    assert_eq!(graphs.len(), 1);
    let delays: Vec<Duration> = graphs[0]
        .nodes()
        .iter()
        .filter_map(|node| match node {
            AudioNode::Delay { delay, .. } => Some(*delay),
            _ => None,
        })
        .collect();
    assert_eq!(delays, vec![Duration::ZERO, Duration::from_millis(5000)]);
    assert!(graphs[0].nodes().contains(&AudioNode::Mix {
        left: StreamRef::Node(0),
        right: StreamRef::Node(1)
    }));

    // Clips lived in the run's scratch directory, which is gone now
    let clip_dirs: Vec<PathBuf> = graphs[0]
        .inputs()
        .iter()
        .filter_map(|p| p.parent().map(|d| d.to_path_buf()))
        .collect();
    assert_eq!(clip_dirs[0], clip_dirs[1]);
    assert!(!clip_dirs[0].exists());
    Ok(())
}

/// Test a full video run through the fake renderer
#[tokio::test]
async fn test_run_withMp4Output_shouldRenderVideo() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "input.vtt")?;
    let output = temp_dir.path().join("out.mp4");

    let provider = Arc::new(MockProvider::tone(Duration::from_millis(500)));
    let backend = Arc::new(FakeMediaBackend::new());
    controller(&provider, &backend).run(&input, &output).await?;

    assert_eq!(fs::read(&output)?, FAKE_MP4);
    assert_eq!(backend.jobs().len(), 1);
    Ok(())
}

/// Test that a provider failure aborts the run without output
#[tokio::test]
async fn test_run_withProviderFailure_shouldAbortWithoutOutput() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "input.vtt")?;
    let output = temp_dir.path().join("out.mp3");

    let provider = Arc::new(MockProvider::fail_at(1, Duration::from_millis(100)));
    let backend = Arc::new(FakeMediaBackend::new());
    let result = controller(&provider, &backend).run(&input, &output).await;

    assert!(matches!(
        result,
        Err(AppError::Synthesis(SynthesisError::Provider { index: 1, .. }))
    ));
    assert!(!output.exists());
    assert!(backend.graphs().is_empty());
    Ok(())
}

/// Test that parse errors stop the run before any synthesis
#[tokio::test]
async fn test_run_withInvalidHeader_shouldFailBeforeSynthesis() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(
        temp_dir.path(),
        "input.vtt",
        "1\n00:00:00.000 --> 00:00:01.000\nHello\n",
    )?;
    let output = temp_dir.path().join("out.mp3");

    let provider = Arc::new(MockProvider::tone(Duration::from_millis(100)));
    let backend = Arc::new(FakeMediaBackend::new());
    let result = controller(&provider, &backend).run(&input, &output).await;

    assert!(matches!(result, Err(AppError::Parse(ParseError::InvalidHeader))));
    assert_eq!(provider.request_count(), 0);
    Ok(())
}

/// Test that a file without cues cannot be composited
#[tokio::test]
async fn test_run_withNoCues_shouldFailComposition() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(temp_dir.path(), "input.vtt", "WEBVTT\n")?;
    let output = temp_dir.path().join("out.mp3");

    let provider = Arc::new(MockProvider::tone(Duration::from_millis(100)));
    let backend = Arc::new(FakeMediaBackend::new());
    let result = controller(&provider, &backend).run(&input, &output).await;

    assert!(matches!(result, Err(AppError::Composition(_))));
    assert!(!output.exists());
    Ok(())
}

/// Test that a missing input file is reported as such
#[tokio::test]
async fn test_run_withMissingInput_shouldFailWithFileError() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let provider = Arc::new(MockProvider::tone(Duration::from_millis(100)));
    let backend = Arc::new(FakeMediaBackend::new());

    let result = controller(&provider, &backend)
        .run(&temp_dir.path().join("absent.vtt"), &temp_dir.path().join("out.mp3"))
        .await;

    assert!(matches!(result, Err(AppError::File(_))));
    Ok(())
}
