// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Class id → class name resolution
//!
//! A label table is bundled with every loaded model. It comes from, in
//! order of preference:
//! - an explicit labels file (`.txt` one name per line, or `.json`)
//! - the `names` entry of the Ultralytics ONNX metadata
//! - the 80-class COCO label set

use anyhow::{Context, Result};
use regex::Regex;
use std::collections::BTreeMap;
use std::path::Path;

/// The 80 COCO class names, in Ultralytics id order
pub const COCO_CLASSES: [&str; 80] = [
    "person", "bicycle", "car", "motorcycle", "airplane", "bus", "train", "truck", "boat",
    "traffic light", "fire hydrant", "stop sign", "parking meter", "bench", "bird", "cat", "dog",
    "horse", "sheep", "cow", "elephant", "bear", "zebra", "giraffe", "backpack", "umbrella",
    "handbag", "tie", "suitcase", "frisbee", "skis", "snowboard", "sports ball", "kite",
    "baseball bat", "baseball glove", "skateboard", "surfboard", "tennis racket", "bottle",
    "wine glass", "cup", "fork", "knife", "spoon", "bowl", "banana", "apple", "sandwich", "orange",
    "broccoli", "carrot", "hot dog", "pizza", "donut", "cake", "chair", "couch", "potted plant",
    "bed", "dining table", "toilet", "tv", "laptop", "mouse", "remote", "keyboard", "cell phone",
    "microwave", "oven", "toaster", "sink", "refrigerator", "book", "clock", "vase", "scissors",
    "teddy bear", "hair drier", "toothbrush",
];

/// Fixed mapping from integer class id to human-readable name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelTable {
    names: BTreeMap<u32, String>,
}

impl Default for LabelTable {
    fn default() -> Self {
        Self::coco()
    }
}

impl LabelTable {
    pub fn new(names: BTreeMap<u32, String>) -> Self {
        Self { names }
    }

    /// Build a table from names listed in id order
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names = names
            .into_iter()
            .enumerate()
            .map(|(id, name)| (id as u32, name.into()))
            .collect();
        Self { names }
    }

    pub fn coco() -> Self {
        Self::from_names(COCO_CLASSES)
    }

    /// Parse the Ultralytics `names` metadata value, e.g. `{0: 'person', 1: 'bicycle'}`
    ///
    /// Returns `None` when the string contains no `id: 'name'` entries.
    pub fn from_ultralytics_metadata(value: &str) -> Option<Self> {
        let entry = Regex::new(r#"(\d+)\s*:\s*(?:'([^']*)'|"([^"]*)")"#).ok()?;

        let names: BTreeMap<u32, String> = entry
            .captures_iter(value)
            .filter_map(|caps| {
                let id = caps.get(1)?.as_str().parse::<u32>().ok()?;
                let name = caps.get(2).or_else(|| caps.get(3))?.as_str().to_string();
                Some((id, name))
            })
            .collect();

        if names.is_empty() {
            None
        } else {
            Some(Self { names })
        }
    }

    /// Load a labels file
    ///
    /// `.json` files hold either an array of names or an object keyed by
    /// class id. Any other extension is read as plain text, one name per
    /// non-blank line.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read labels file {}", path.display()))?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let table = if is_json {
            Self::from_json(&content)
                .with_context(|| format!("Invalid labels JSON in {}", path.display()))?
        } else {
            Self::from_names(
                content
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty()),
            )
        };

        if table.is_empty() {
            anyhow::bail!("Labels file {} contains no class names", path.display());
        }

        Ok(table)
    }

    fn from_json(content: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(content)?;
        match value {
            serde_json::Value::Array(items) => {
                let names = items
                    .into_iter()
                    .map(|item| match item {
                        serde_json::Value::String(name) => Ok(name),
                        other => Err(anyhow::anyhow!("expected string label, got {}", other)),
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(Self::from_names(names))
            }
            serde_json::Value::Object(map) => {
                let mut names = BTreeMap::new();
                for (key, item) in map {
                    let id = key
                        .parse::<u32>()
                        .with_context(|| format!("class id '{}' is not an integer", key))?;
                    let name = item
                        .as_str()
                        .ok_or_else(|| anyhow::anyhow!("label for class {} is not a string", id))?;
                    names.insert(id, name.to_string());
                }
                Ok(Self { names })
            }
            _ => anyhow::bail!("expected an array or object of labels"),
        }
    }

    /// Resolve a class id to its name
    ///
    /// Ids missing from the table resolve to `class_{id}`.
    pub fn name(&self, class_id: u32) -> String {
        self.names
            .get(&class_id)
            .cloned()
            .unwrap_or_else(|| format!("class_{}", class_id))
    }

    pub fn get(&self, class_id: u32) -> Option<&str> {
        self.names.get(&class_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn as_map(&self) -> &BTreeMap<u32, String> {
        &self.names
    }
}
