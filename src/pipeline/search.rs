// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 merlin contributors

//! Runner-type queries over a flat unit list
//!
//! Units whose runner cannot be resolved are skipped, never fatal. Callers
//! that need to surface those units should resolve them directly.

use std::collections::BTreeMap;

use crate::pipeline::{PipelineUnit, RunnerType};

/// Units of the given runner type, in original order
pub fn find_by_runner_type(units: &[PipelineUnit], runner_type: RunnerType) -> Vec<&PipelineUnit> {
    units
        .iter()
        .filter(|unit| match unit.runner_type() {
            Ok(t) => t == runner_type,
            Err(e) => {
                tracing::debug!(unit = %unit.id, error = %e, "skipping unresolvable unit");
                false
            }
        })
        .collect()
}

/// Count of units per resolved runner type
pub fn runner_type_histogram(units: &[PipelineUnit]) -> BTreeMap<RunnerType, usize> {
    let mut histogram = BTreeMap::new();

    for unit in units {
        match unit.runner_type() {
            Ok(t) => *histogram.entry(t).or_insert(0) += 1,
            Err(e) => tracing::debug!(unit = %unit.id, error = %e, "skipping unresolvable unit"),
        }
    }

    histogram
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(id: &str, runner_type: Option<RunnerType>) -> PipelineUnit {
        let mut unit = PipelineUnit {
            id: id.into(),
            ..Default::default()
        };
        if let Some(t) = runner_type {
            unit.set_reference(t, format!("ref-{}", id));
        }
        unit
    }

    #[test]
    fn test_find_sftp_uploaders_in_order() {
        let units = vec![
            unit("cmd", Some(RunnerType::Command)),
            unit("up1", Some(RunnerType::SftpUploader)),
            unit("zip", Some(RunnerType::Zip)),
            unit("down", Some(RunnerType::SftpDownloader)),
            unit("up2", Some(RunnerType::SftpUploader)),
        ];

        let found: Vec<&str> = find_by_runner_type(&units, RunnerType::SftpUploader)
            .iter()
            .map(|u| u.id.as_str())
            .collect();

        assert_eq!(found, vec!["up1", "up2"]);
    }

    #[test]
    fn test_find_skips_unresolvable_units() {
        let mut ambiguous = unit("both", Some(RunnerType::Zip));
        ambiguous.set_reference(RunnerType::Unzip, "u");
        let units = vec![unit("none", None), ambiguous, unit("zip", Some(RunnerType::Zip))];

        let found = find_by_runner_type(&units, RunnerType::Zip);

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "zip");
    }

    #[test]
    fn test_histogram() {
        let units = vec![
            unit("a", Some(RunnerType::Command)),
            unit("b", Some(RunnerType::Command)),
            unit("c", Some(RunnerType::QueryQueue)),
            unit("d", Some(RunnerType::CallPipeline)),
            unit("broken", None),
        ];

        let histogram = runner_type_histogram(&units);

        assert_eq!(histogram.get(&RunnerType::Command), Some(&2));
        assert_eq!(histogram.get(&RunnerType::QueryQueue), Some(&1));
        assert_eq!(histogram.get(&RunnerType::CallPipeline), Some(&1));
        assert_eq!(histogram.get(&RunnerType::Zip), None);
        assert_eq!(histogram.values().sum::<usize>(), 4);
    }

    #[test]
    fn test_empty_list() {
        assert!(find_by_runner_type(&[], RunnerType::Command).is_empty());
        assert!(runner_type_histogram(&[]).is_empty());
    }
}
