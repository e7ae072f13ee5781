//! Per-object channel accumulation.
//!
//! Several notes can drive one object at once. Each frame every active note
//! evaluates its curves at its own local time and folds the result into the
//! object's accumulator; the accumulator is then committed as keyframes.
//! Rotation, properties, shape keys and relative locations add up. An
//! absolute location is a position, so the last contributor sets it.

use crate::channel::{Axis, ChannelPath};
use crate::sink::KeyframeSink;
use crate::template::ChannelCurve;
use std::collections::BTreeMap;

/// How location curves relate to the object's position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationMode {
    /// Curves hold world positions; axes without a contribution stay at rest
    Absolute,
    /// Curves are offsets from a reference location (pooled proxies)
    Relative,
}

#[derive(Debug, Clone)]
pub struct AnimationProcessor {
    target: String,
    mode: LocationMode,
    rest_location: [f64; 3],
    rest_rotation: [f64; 3],

    location: [f64; 3],
    location_touched: [bool; 3],
    rotation: [f64; 3],
    properties: BTreeMap<String, f64>,
    shape_keys: BTreeMap<String, f64>,

    // set once a curve of that kind has contributed; kept until the processor is dropped
    writes_location: bool,
    writes_rotation: bool,
}

impl AnimationProcessor {
    pub fn new(
        target: impl Into<String>,
        mode: LocationMode,
        rest_location: [f64; 3],
        rest_rotation: [f64; 3],
    ) -> Self {
        Self {
            target: target.into(),
            mode,
            rest_location,
            rest_rotation,
            location: [0.0; 3],
            location_touched: [false; 3],
            rotation: [0.0; 3],
            properties: BTreeMap::new(),
            shape_keys: BTreeMap::new(),
            writes_location: false,
            writes_rotation: false,
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Clear this frame's contributions. The set of written channels is kept.
    pub fn begin_frame(&mut self) {
        self.location = [0.0; 3];
        self.location_touched = [false; 3];
        self.rotation = [0.0; 3];
        self.properties.values_mut().for_each(|v| *v = 0.0);
        self.shape_keys.values_mut().for_each(|v| *v = 0.0);
    }

    /// Fold every curve's value at local time `delta`, multiplied by `scale`.
    pub fn accumulate(&mut self, curves: &[ChannelCurve], delta: f64, scale: f64) {
        for curve in curves {
            let Some(value) = keycurves::evaluate(&curve.keys, delta) else {
                continue;
            };
            let value = value * scale;
            match &curve.channel {
                ChannelPath::Location(axis) => {
                    match self.mode {
                        LocationMode::Absolute => self.location[axis.index()] = value,
                        LocationMode::Relative => self.location[axis.index()] += value,
                    }
                    self.location_touched[axis.index()] = true;
                    self.writes_location = true;
                }
                ChannelPath::Rotation(axis) => {
                    self.rotation[axis.index()] += value;
                    self.writes_rotation = true;
                }
                ChannelPath::Property(name) => {
                    *self.properties.entry(name.clone()).or_insert(0.0) += value;
                }
                ChannelPath::ShapeKey(name) => {
                    *self.shape_keys.entry(name.clone()).or_insert(0.0) += value;
                }
            }
        }
    }

    pub fn location_value(&self, axis: Axis) -> f64 {
        let i = axis.index();
        match self.mode {
            LocationMode::Absolute if self.location_touched[i] => self.location[i],
            LocationMode::Absolute => self.rest_location[i],
            LocationMode::Relative => self.rest_location[i] + self.location[i],
        }
    }

    pub fn rotation_value(&self, axis: Axis) -> f64 {
        self.rest_rotation[axis.index()] + self.rotation[axis.index()]
    }

    /// Write every channel any curve has contributed to. Returns the key count.
    pub fn commit(&self, frame: f64, sink: &mut dyn KeyframeSink) -> usize {
        let mut written = 0;
        if self.writes_location {
            for axis in Axis::ALL {
                sink.set_keyframe(
                    &self.target,
                    &ChannelPath::Location(axis),
                    frame,
                    self.location_value(axis),
                );
                written += 1;
            }
        }
        if self.writes_rotation {
            for axis in Axis::ALL {
                sink.set_keyframe(
                    &self.target,
                    &ChannelPath::Rotation(axis),
                    frame,
                    self.rotation_value(axis),
                );
                written += 1;
            }
        }
        for (name, value) in &self.properties {
            sink.set_keyframe(&self.target, &ChannelPath::Property(name.clone()), frame, *value);
            written += 1;
        }
        for (name, value) in &self.shape_keys {
            sink.set_keyframe(&self.target, &ChannelPath::ShapeKey(name.clone()), frame, *value);
            written += 1;
        }
        written
    }
}
