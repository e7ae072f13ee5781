//! CLI command implementations

use anyhow::{bail, Context, Result};
use choreo::{animate_group, FrameRate, ObjectGroup, OffsetSink, RecordingSink, RenderOptions, Scene};
use choreoconf::{ChoreoConfig, ConfigSources, OutputFormat};
use keycurves::{CombinePolicy, Combiner};
use midi_perform::{ingest_smf, note_name, FeedbackCollector, Performance, Track};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::output::RenderOutput;

pub struct RenderArgs {
    pub midi: PathBuf,
    pub scene: PathBuf,
    pub tracks: Vec<String>,
    pub output: Option<PathBuf>,
    pub format: OutputFormat,
}

fn read_performance(path: &Path, diagnostics: &mut FeedbackCollector) -> Result<Performance> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    ingest_smf(&bytes, diagnostics).with_context(|| format!("Failed to ingest {}", path.display()))
}

fn combiner(config: &ChoreoConfig) -> Result<Combiner> {
    let policy: CombinePolicy = config
        .combine
        .policy
        .parse()
        .with_context(|| format!("Invalid combine.policy '{}'", config.combine.policy))?;
    Ok(Combiner {
        policy,
        rest_value: config.combine.rest_value,
        prune_count: config.combine.prune_count,
    })
}

/// Pair every group with its track: the group's `track` key, then a track
/// named like the group, then the next `--track` argument.
pub fn bind_tracks<'a>(
    scene: &'a Scene,
    performance: &'a Performance,
    explicit: &[String],
) -> Result<Vec<(&'a ObjectGroup, &'a Track)>> {
    let mut explicit = explicit.iter();
    let mut bindings = Vec::with_capacity(scene.groups.len());

    for group in &scene.groups {
        let track = match &group.track {
            Some(name) => performance.find_track(name).with_context(|| {
                format!(
                    "Group '{}' wants track '{}'; available: {}",
                    group.name,
                    name,
                    performance.track_names().join(", ")
                )
            })?,
            None => match performance.find_track(&group.name) {
                Some(track) => track,
                None => {
                    let Some(name) = explicit.next() else {
                        bail!(
                            "No track for group '{}'. Add `track = ...` to the group or pass --track.\n\
                             Available tracks: {}",
                            group.name,
                            performance.track_names().join(", ")
                        );
                    };
                    performance
                        .find_track(name)
                        .with_context(|| format!("No track named '{}'", name))?
                }
            },
        };
        tracing::info!(group = %group.name, track = %track.name, "bound group");
        bindings.push((group, track));
    }

    Ok(bindings)
}

/// Animate every scene group and write the keyframe stream
pub fn render(config: &ChoreoConfig, args: RenderArgs) -> Result<()> {
    let mut diagnostics = FeedbackCollector::new();
    let performance = read_performance(&args.midi, &mut diagnostics)?;
    let scene = Scene::load(&args.scene, &mut diagnostics)
        .with_context(|| format!("Failed to load scene {}", args.scene.display()))?;

    let options = RenderOptions {
        rate: FrameRate::new(config.render.fps, config.render.fps_base),
        combiner: combiner(config)?,
    };

    let mut sink = OffsetSink::new(RecordingSink::new(), config.render.frame_offset as f64);
    let mut reports = Vec::new();
    for (group, track) in bind_tracks(&scene, &performance, &args.tracks)? {
        let report = animate_group(group, track, &mut sink, &options, &mut diagnostics)
            .with_context(|| format!("Failed to animate group '{}'", group.name))?;
        reports.push(report);
    }

    let output = RenderOutput {
        fps: options.rate.fps(),
        frame_offset: config.render.frame_offset,
        groups: reports,
        diagnostics: diagnostics.into_feedback(),
        events: sink.into_inner().events,
    };

    match &args.output {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            output.write(&mut writer, args.format)?;
            writer.flush()?;
        }
        None => {
            let stdout = io::stdout();
            let mut writer = stdout.lock();
            output.write(&mut writer, args.format)?;
            writer.flush()?;
        }
    }

    tracing::info!(
        groups = output.groups.len(),
        events = output.events.len(),
        format = %args.format,
        "render finished"
    );
    Ok(())
}

/// List tracks with note counts and the notes they use
pub fn tracks(midi: &Path) -> Result<()> {
    let mut diagnostics = FeedbackCollector::new();
    let performance = read_performance(midi, &mut diagnostics)?;

    for track in performance.iter() {
        let notes: Vec<String> = track
            .all_used_notes()
            .into_iter()
            .map(|n| format!("{}({})", n, note_name(n)))
            .collect();
        println!("{}\t{} notes\t{}", track.name, track.notes.len(), notes.join(" "));
    }
    Ok(())
}

/// Print the effective configuration, noting which sources contributed
pub fn show_config(config: &ChoreoConfig, sources: &ConfigSources) {
    for path in &sources.files {
        println!("# from file: {}", path.display());
    }
    for var in &sources.env_overrides {
        println!("# from env: {}", var);
    }
    print!("{}", config.to_toml());
}
