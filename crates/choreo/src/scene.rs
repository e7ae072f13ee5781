//! Object groups, their note mappings and templates.
//!
//! A scene is written in TOML and resolved into [`ObjectGroup`]s with
//! shared [`AnimationTemplate`]s. Structural mistakes fail the load;
//! objects missing their template or hit offset are reported and the load
//! carries on.

use crate::channel::ChannelPath;
use crate::template::{AnimationTemplate, ChannelCurve};
use crate::{Error, Result};
use keycurves::{CombinePolicy, Keyframe};
use midi_perform::{parse_note_numbers, DiagnosticSink, Feedback};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

/// Which scheduling strategy a group uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstrumentFamily {
    /// Each object samples its template every frame while a note is active
    #[default]
    Evaluate,
    /// A fixed pool of proxies, one per simultaneously airborne note
    Projectile,
    /// Template keys are shifted per note and merged with a combination policy
    Keyframed,
}

/// An object driven by notes.
#[derive(Debug, Clone)]
pub struct AnimatedObject {
    pub name: String,
    pub notes: Vec<u8>,
    /// Frames into the template that line up with the note onset
    pub hit_offset: f64,
    /// 0 disables velocity scaling
    pub velocity_intensity: f64,
    pub location: [f64; 3],
    pub rotation: [f64; 3],
    pub template: Arc<AnimationTemplate>,
}

impl AnimatedObject {
    pub fn new(name: impl Into<String>, notes: Vec<u8>, template: Arc<AnimationTemplate>) -> Self {
        Self {
            name: name.into(),
            notes,
            hit_offset: 0.0,
            velocity_intensity: 0.0,
            location: [0.0; 3],
            rotation: [0.0; 3],
            template,
        }
    }

    pub fn with_hit_offset(mut self, hit_offset: f64) -> Self {
        self.hit_offset = hit_offset;
        self
    }

    pub fn with_location(mut self, location: [f64; 3]) -> Self {
        self.location = location;
        self
    }

    pub fn with_velocity_intensity(mut self, intensity: f64) -> Self {
        self.velocity_intensity = intensity;
        self
    }

    /// Multiplier applied to template values for a note of this velocity.
    pub fn velocity_scale(&self, velocity: u8) -> f64 {
        if self.velocity_intensity == 0.0 {
            1.0
        } else {
            velocity as f64 / 127.0 * self.velocity_intensity
        }
    }
}

/// Objects animated together from one track.
#[derive(Debug, Clone)]
pub struct ObjectGroup {
    pub name: String,
    pub family: InstrumentFamily,
    /// Overrides the configured policy for keyframed groups
    pub combine: Option<CombinePolicy>,
    /// Name stem for projectile proxies
    pub proxy_prefix: String,
    /// Track to bind to, when it differs from the group name
    pub track: Option<String>,
    pub objects: Vec<AnimatedObject>,
}

impl ObjectGroup {
    pub fn new(name: impl Into<String>, family: InstrumentFamily) -> Self {
        Self {
            name: name.into(),
            family,
            combine: None,
            proxy_prefix: "projectile".to_string(),
            track: None,
            objects: Vec::new(),
        }
    }

    pub fn with_object(mut self, object: AnimatedObject) -> Self {
        self.objects.push(object);
        self
    }

    /// Note number to indices of the objects it drives.
    pub fn note_map(&self) -> HashMap<u8, Vec<usize>> {
        let mut map: HashMap<u8, Vec<usize>> = HashMap::new();
        for (index, object) in self.objects.iter().enumerate() {
            for note in &object.notes {
                map.entry(*note).or_default().push(index);
            }
        }
        map
    }

    /// Fatal structural checks: an object listing one note twice, and a
    /// group that maps no notes at all.
    pub fn validate(&self) -> Result<()> {
        for object in &self.objects {
            let mut seen = HashSet::new();
            for note in &object.notes {
                if !seen.insert(*note) {
                    return Err(Error::DuplicateMapping {
                        group: self.name.clone(),
                        object: object.name.clone(),
                        note: *note,
                    });
                }
            }
        }
        if self.objects.iter().all(|o| o.notes.is_empty()) {
            return Err(Error::EmptyGroup(self.name.clone()));
        }
        Ok(())
    }
}

/// A resolved scene.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub groups: Vec<ObjectGroup>,
    pub templates: BTreeMap<String, Arc<AnimationTemplate>>,
}

impl Scene {
    pub fn load(path: impl AsRef<Path>, diagnostics: &mut dyn DiagnosticSink) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "loading scene");
        Self::from_toml_str(&text, diagnostics)
    }

    pub fn from_toml_str(text: &str, diagnostics: &mut dyn DiagnosticSink) -> Result<Self> {
        let file: SceneFile = toml::from_str(text).map_err(|e| Error::Scene(e.to_string()))?;
        file.resolve(diagnostics)
    }

    pub fn group(&self, name: &str) -> Option<&ObjectGroup> {
        self.groups.iter().find(|g| g.name == name)
    }
}

/// Scene document as written.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SceneFile {
    #[serde(default, rename = "group")]
    pub groups: Vec<GroupSpec>,
    #[serde(default, rename = "template")]
    pub templates: BTreeMap<String, TemplateSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GroupSpec {
    pub name: String,
    #[serde(default)]
    pub family: InstrumentFamily,
    pub combine: Option<CombinePolicy>,
    pub proxy_prefix: Option<String>,
    pub track: Option<String>,
    #[serde(default, rename = "object")]
    pub objects: Vec<ObjectSpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NoteSpec {
    Number(u8),
    Text(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObjectSpec {
    pub name: String,
    pub notes: NoteSpec,
    pub hit_offset: Option<f64>,
    #[serde(default)]
    pub velocity_intensity: f64,
    #[serde(default)]
    pub location: [f64; 3],
    #[serde(default)]
    pub rotation: [f64; 3],
    pub template: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TemplateSpec {
    #[serde(default)]
    pub release_offset: f64,
    #[serde(default, rename = "curve")]
    pub curves: Vec<CurveSpec>,
    #[serde(default, rename = "release_curve")]
    pub release_curves: Vec<CurveSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurveSpec {
    pub channel: String,
    pub keys: Vec<Keyframe>,
}

fn resolve_curves(specs: &[CurveSpec]) -> Result<Vec<ChannelCurve>> {
    specs
        .iter()
        .map(|c| -> Result<ChannelCurve> {
            Ok(ChannelCurve::new(c.channel.parse::<ChannelPath>()?, c.keys.clone()))
        })
        .collect()
}

impl SceneFile {
    pub fn resolve(self, diagnostics: &mut dyn DiagnosticSink) -> Result<Scene> {
        let mut templates = BTreeMap::new();
        for (name, spec) in &self.templates {
            let template = AnimationTemplate::new(
                name.clone(),
                resolve_curves(&spec.curves)?,
                resolve_curves(&spec.release_curves)?,
                spec.release_offset,
            )?;
            templates.insert(name.clone(), Arc::new(template));
        }

        let mut seen_groups = HashSet::new();
        let mut groups = Vec::with_capacity(self.groups.len());
        for spec in self.groups {
            if !seen_groups.insert(spec.name.clone()) {
                return Err(Error::Scene(format!("group '{}' is defined twice", spec.name)));
            }
            groups.push(resolve_group(spec, &templates, diagnostics)?);
        }

        tracing::info!(
            groups = groups.len(),
            templates = templates.len(),
            "scene resolved"
        );
        Ok(Scene { groups, templates })
    }
}

fn resolve_group(
    spec: GroupSpec,
    templates: &BTreeMap<String, Arc<AnimationTemplate>>,
    diagnostics: &mut dyn DiagnosticSink,
) -> Result<ObjectGroup> {
    let mut group = ObjectGroup::new(spec.name, spec.family);
    group.combine = spec.combine;
    group.track = spec.track;
    if let Some(prefix) = spec.proxy_prefix {
        group.proxy_prefix = prefix;
    }

    let mut seen_objects = HashSet::new();
    for object in spec.objects {
        if !seen_objects.insert(object.name.clone()) {
            return Err(Error::Scene(format!(
                "object '{}' appears twice in group '{}'",
                object.name, group.name
            )));
        }

        let notes = match &object.notes {
            NoteSpec::Number(n) if *n <= 127 => vec![*n],
            NoteSpec::Number(n) => {
                return Err(Error::Scene(format!(
                    "object '{}': note {n} is out of range",
                    object.name
                )))
            }
            NoteSpec::Text(text) => parse_note_numbers(text).map_err(|bad| {
                Error::Scene(format!(
                    "object '{}': '{bad}' is not a note number or name",
                    object.name
                ))
            })?,
        };

        let Some(template) = object.template.as_ref().and_then(|t| templates.get(t)) else {
            diagnostics.report(
                Feedback::error(format!(
                    "object '{}' in group '{}' has no usable template; skipped",
                    object.name, group.name
                ))
                .with_suggestion("set `template` to a name defined under [template.*]"),
            );
            continue;
        };

        let hit_offset = object.hit_offset.unwrap_or_else(|| {
            diagnostics.report(Feedback::warning(format!(
                "object '{}' has no hit_offset; using 0",
                object.name
            )));
            0.0
        });

        group.objects.push(AnimatedObject {
            name: object.name,
            notes,
            hit_offset,
            velocity_intensity: object.velocity_intensity,
            location: object.location,
            rotation: object.rotation,
            template: Arc::clone(template),
        });
    }

    group.validate()?;
    Ok(group)
}
