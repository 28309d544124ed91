// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Parser for `.pts` contact point files.

Layout of a file:

```text
<header>
<header>
<number of points N>
<electrode><contact>\t<x>\t<y>\t<z>      (N lines)
```

The electrode label is the leading non-digit part of the first field and the
contact id the trailing digits, e.g. `LA12` is contact `12` of electrode `LA`.
The subject id is the part of the file name before the first `_`.
*/

use ahash::AHashMap;
use std::path::Path;

use crate::error::{FeatureError, FeatureResult};

const COUNT_LINE: usize = 2;

/// Contact points of one electrode, in file order
#[derive(Debug, Clone, PartialEq)]
pub struct ElectrodePoints {
    pub electrode_id: String,
    pub contacts: Vec<(String, [f64; 3])>,
}

/// Parsed content of one `.pts` file
#[derive(Debug, Clone, PartialEq)]
pub struct PointsFile {
    pub subject_id: String,
    pub electrodes: Vec<ElectrodePoints>,
}

impl PointsFile {
    pub fn point_count(&self) -> usize {
        self.electrodes.iter().map(|e| e.contacts.len()).sum()
    }
}

/// Subject id encoded in a points file name
pub fn subject_id(file_name: &str) -> String {
    let base = Path::new(file_name)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(file_name);
    base.split('_').next().unwrap_or(base).to_string()
}

/// Parse the bytes of a points file
///
/// # Errors
/// `MalformedPoints` for invalid UTF-8, a missing or non-numeric point count,
/// fewer point lines than announced and unparsable point lines.
/// `DuplicateContactPoint` if a contact id repeats within an electrode.
pub fn parse_points(file_name: &str, bytes: &[u8]) -> FeatureResult<PointsFile> {
    let malformed = |line: usize, reason: String| FeatureError::MalformedPoints {
        file: file_name.to_string(),
        line,
        reason,
    };

    let text = std::str::from_utf8(bytes).map_err(|e| malformed(0, e.to_string()))?;
    let lines: Vec<&str> = text.split('\n').collect();

    let count_line = lines
        .get(COUNT_LINE)
        .ok_or_else(|| malformed(COUNT_LINE + 1, "missing point count".to_string()))?;
    let count: usize = count_line
        .trim()
        .parse()
        .map_err(|_| malformed(COUNT_LINE + 1, format!("invalid point count '{}'", count_line.trim())))?;

    let subject = subject_id(file_name);
    let mut electrodes: Vec<ElectrodePoints> = Vec::new();
    let mut by_label: AHashMap<String, usize> = AHashMap::new();

    for offset in 0..count {
        let index = COUNT_LINE + 1 + offset;
        let line_number = index + 1;
        let line = lines
            .get(index)
            .ok_or_else(|| malformed(line_number, format!("expected {} points, found {}", count, offset)))?;
        let (electrode_id, contact_id, coord) =
            parse_point_line(line).map_err(|reason| malformed(line_number, reason))?;

        let slot = *by_label.entry(electrode_id.clone()).or_insert_with(|| {
            electrodes.push(ElectrodePoints {
                electrode_id: electrode_id.clone(),
                contacts: Vec::new(),
            });
            electrodes.len() - 1
        });
        let electrode = &mut electrodes[slot];
        if electrode.contacts.iter().any(|(id, _)| *id == contact_id) {
            return Err(FeatureError::DuplicateContactPoint {
                subject,
                electrode: electrode_id,
                contact: contact_id,
            });
        }
        electrode.contacts.push((contact_id, coord));
    }

    Ok(PointsFile {
        subject_id: subject,
        electrodes,
    })
}

fn parse_point_line(line: &str) -> Result<(String, String, [f64; 3]), String> {
    let fields: Vec<&str> = line.trim().split('\t').collect();
    if fields.len() < 4 {
        return Err(format!("expected a label and 3 coordinates, found {} fields", fields.len()));
    }
    let (electrode_id, contact_id) = split_label(fields[0])?;

    let mut coord = [0.0f64; 3];
    for (axis, field) in fields[1..4].iter().enumerate() {
        coord[axis] = field
            .trim()
            .parse()
            .map_err(|_| format!("invalid coordinate '{}'", field))?;
    }
    Ok((electrode_id, contact_id, coord))
}

fn split_label(label: &str) -> Result<(String, String), String> {
    let label = label.trim();
    let split = label
        .find(|c: char| c.is_ascii_digit())
        .ok_or_else(|| format!("label '{}' has no contact number", label))?;
    let (electrode, contact) = label.split_at(split);
    if electrode.is_empty() || !contact.chars().all(|c| c.is_ascii_digit()) {
        return Err(format!("label '{}' is not <electrode><contact number>", label));
    }
    Ok((electrode.to_string(), contact.to_string()))
}
