// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 merlin contributors

//! YAML → pipeline import
//!
//! The document is read as a generic YAML value first so that every problem
//! can be collected before anything is built. A document with any problem is
//! rejected as a whole.

use std::collections::{HashMap, HashSet};

use serde_yaml::Value;

use crate::document::schema::{DependencyEdge, Position, RunnerConfig};
use crate::errors::{MerlinError, MerlinResult};
use crate::pipeline::{ExecutionPolicy, Pipeline, PipelineUnit, RunnerType, Snapshot, UnitGraph};

/// A unit whose fields all decoded
struct DecodedUnit {
    id: String,
    parent_unit_id: Option<String>,
    position: Position,
    policy: ExecutionPolicy,
    runner: RunnerConfig,
}

/// Problems found while reading a document
#[derive(Default)]
struct Problems(Vec<String>);

impl Problems {
    fn push(&mut self, message: impl Into<String>) {
        let message = message.into();
        if !self.0.contains(&message) {
            self.0.push(message);
        }
    }

    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Parse a pipeline document back into a pipeline and its flat units
pub fn from_text(text: &str) -> MerlinResult<Snapshot> {
    let root: Value = serde_yaml::from_str(text)
        .map_err(|e| MerlinError::malformed([format!("Document is not valid YAML: {}", e)]))?;

    if !root.is_mapping() {
        return Err(MerlinError::malformed([
            "Document must be a mapping with `pipeline`, `units` and `dependencies` sections",
        ]));
    }

    let mut problems = Problems::default();

    let pipeline = decode_pipeline(root.get("pipeline"), &mut problems);
    let (declared, units) = decode_units(root.get("units"), &mut problems);
    let edges = decode_edges(root.get("dependencies"), &mut problems);
    let parents = resolve_parents(&declared, &units, &edges, &mut problems);

    check_cycles(&declared, &parents, &mut problems);

    let (Some(pipeline), true) = (pipeline, problems.is_empty()) else {
        tracing::debug!(problems = problems.0.len(), "rejected pipeline document");
        return Err(MerlinError::MalformedDocument { errors: problems.0 });
    };

    let units: Vec<PipelineUnit> = units
        .into_iter()
        .map(|decoded| {
            let parent = parents.get(&decoded.id).cloned();
            build_unit(&pipeline, decoded, parent)
        })
        .collect();

    tracing::debug!(pipeline = %pipeline.name, units = units.len(), "imported pipeline document");

    Ok(Snapshot { pipeline, units })
}

fn build_unit(pipeline: &Pipeline, decoded: DecodedUnit, parent: Option<String>) -> PipelineUnit {
    let mut unit = PipelineUnit {
        id: decoded.id,
        pipeline_id: pipeline.id.clone(),
        parent_unit_id: parent,
        policy: decoded.policy,
        pos_x: decoded.position.x,
        pos_y: decoded.position.y,
        ..Default::default()
    };

    unit.set_reference(decoded.runner.runner_type(), decoded.runner.reference());
    if let Some(detail) = decoded.runner.into_detail() {
        unit.set_detail(detail);
    }

    unit
}

/// Non-blank string or number scalar
fn scalar_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn decode_pipeline(value: Option<&Value>, problems: &mut Problems) -> Option<Pipeline> {
    let value = match value {
        None | Some(Value::Null) => {
            problems.push("Missing `pipeline` section");
            return None;
        }
        Some(v) if !v.is_mapping() => {
            problems.push("`pipeline` must be a mapping");
            return None;
        }
        Some(v) => v,
    };

    let mut complete = true;
    if scalar_string(value.get("name")).is_none() {
        problems.push("Pipeline `name` is required");
        complete = false;
    }
    if scalar_string(value.get("agentId")).is_none() {
        problems.push("Pipeline `agentId` is required");
        complete = false;
    }
    if !complete {
        return None;
    }

    match serde_yaml::from_value::<Pipeline>(value.clone()) {
        Ok(pipeline) => Some(pipeline),
        Err(e) => {
            problems.push(format!("Invalid `pipeline` section: {}", e));
            None
        }
    }
}

/// Decode the unit list, returning every declared id and the units that decoded fully
fn decode_units(value: Option<&Value>, problems: &mut Problems) -> (Vec<String>, Vec<DecodedUnit>) {
    let mut declared = Vec::new();
    let mut units = Vec::new();

    let items = match value {
        None | Some(Value::Null) => {
            problems.push("Missing `units` section");
            return (declared, units);
        }
        Some(Value::Sequence(items)) => items,
        Some(_) => {
            problems.push("`units` must be a list");
            return (declared, units);
        }
    };

    let mut seen = HashSet::new();
    for (index, item) in items.iter().enumerate() {
        if !item.is_mapping() {
            problems.push(format!("Unit #{} must be a mapping", index + 1));
            continue;
        }

        let id = scalar_string(item.get("id"));
        let label = id.clone().unwrap_or_else(|| format!("#{}", index + 1));

        match &id {
            Some(id) => {
                if !seen.insert(id.clone()) {
                    problems.push(format!("Duplicate unit id: '{}'", id));
                }
                declared.push(id.clone());
            }
            None => problems.push(format!("Unit #{}: `id` is required", index + 1)),
        }

        if let (Some(id), Some(unit)) = (id, decode_unit(item, &label, problems)) {
            units.push(DecodedUnit { id, ..unit });
        }
    }

    (declared, units)
}

/// Decode everything but the id; reports under `label`
fn decode_unit(item: &Value, label: &str, problems: &mut Problems) -> Option<DecodedUnit> {
    let runner_type = match item.get("type") {
        None | Some(Value::Null) => {
            problems.push(format!("Unit '{}': `type` is required", label));
            None
        }
        Some(v) => match v.as_str().map(str::parse::<RunnerType>) {
            Some(Ok(t)) => Some(t),
            _ => {
                problems.push(format!(
                    "Unit '{}': unknown runner type '{}'",
                    label,
                    serde_yaml::to_string(v).unwrap_or_default().trim()
                ));
                None
            }
        },
    };

    let position = match item.get("position") {
        None | Some(Value::Null) => {
            problems.push(format!("Unit '{}': `position` is required", label));
            None
        }
        Some(v) => serde_yaml::from_value::<Position>(v.clone())
            .map_err(|e| problems.push(format!("Unit '{}': invalid `position`: {}", label, e)))
            .ok(),
    };

    let policy = match item.get("policy") {
        None | Some(Value::Null) => {
            problems.push(format!("Unit '{}': `policy` block is required", label));
            None
        }
        Some(v) if !v.is_mapping() => {
            problems.push(format!("Unit '{}': `policy` must be a mapping", label));
            None
        }
        Some(v) => serde_yaml::from_value::<ExecutionPolicy>(v.clone())
            .map_err(|e| problems.push(format!("Unit '{}': invalid `policy`: {}", label, e)))
            .ok(),
    };

    let runner = runner_type.and_then(|t| match item.get("config") {
        None | Some(Value::Null) => {
            problems.push(format!("Unit '{}': `config` block is required", label));
            None
        }
        Some(v) => match RunnerConfig::decode(t, v.clone()) {
            Ok(runner) if runner.reference().trim().is_empty() => {
                problems.push(format!("Unit '{}': `config.reference` is required", label));
                None
            }
            Ok(runner) => Some(runner),
            Err(e) => {
                problems.push(format!("Unit '{}': invalid {} `config`: {}", label, t, e));
                None
            }
        },
    });

    let parent_unit_id = match item.get("parentUnitId") {
        None | Some(Value::Null) => None,
        Some(v) => match scalar_string(Some(v)) {
            Some(parent) => Some(parent),
            None if v.as_str().is_some() => None,
            None => {
                problems.push(format!("Unit '{}': `parentUnitId` must be a string", label));
                None
            }
        },
    };

    Some(DecodedUnit {
        id: String::new(),
        parent_unit_id,
        position: position?,
        policy: policy?,
        runner: runner?,
    })
}

fn decode_edges(value: Option<&Value>, problems: &mut Problems) -> Vec<DependencyEdge> {
    let items = match value {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::Sequence(items)) => items,
        Some(_) => {
            problems.push("`dependencies` must be a list");
            return Vec::new();
        }
    };

    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| {
            serde_yaml::from_value::<DependencyEdge>(item.clone())
                .map_err(|e| problems.push(format!("Dependency #{}: {}", index + 1, e)))
                .ok()
        })
        .collect()
}

/// Report parent cycles over every declared unit and the merged parent links
///
/// Self-parents are reported where the link is read, so only cycles of two
/// or more units are added here.
fn check_cycles(declared: &[String], parents: &HashMap<String, String>, problems: &mut Problems) {
    let links: Vec<PipelineUnit> = declared
        .iter()
        .map(|id| PipelineUnit {
            id: id.clone(),
            parent_unit_id: parents.get(id).cloned(),
            ..Default::default()
        })
        .collect();

    for members in UnitGraph::build(&links).cycles() {
        if members.len() > 1 {
            problems.push(format!("Parent cycle between units: {}", members.join(", ")));
        }
    }
}

/// Check every parent reference and merge `parentUnitId` with the edge list
fn resolve_parents(
    declared: &[String],
    units: &[DecodedUnit],
    edges: &[DependencyEdge],
    problems: &mut Problems,
) -> HashMap<String, String> {
    let ids: HashSet<&str> = declared.iter().map(String::as_str).collect();
    let mut parents: HashMap<String, String> = HashMap::new();

    for edge in edges {
        if edge.from == edge.to {
            problems.push(format!("Unit '{}' cannot be its own parent", edge.to));
        }

        for endpoint in [&edge.from, &edge.to] {
            if !ids.contains(endpoint.as_str()) {
                problems.push(format!(
                    "Dependency '{}' -> '{}' references unknown unit '{}'",
                    edge.from, edge.to, endpoint
                ));
            }
        }

        match parents.get(&edge.to).cloned() {
            Some(existing) if existing != edge.from => problems.push(format!(
                "Unit '{}' has more than one parent in `dependencies` ('{}' and '{}')",
                edge.to, existing, edge.from
            )),
            Some(_) => {}
            None => {
                parents.insert(edge.to.clone(), edge.from.clone());
            }
        }
    }

    for unit in units {
        let Some(parent) = &unit.parent_unit_id else {
            continue;
        };

        if parent == &unit.id {
            problems.push(format!("Unit '{}' cannot be its own parent", unit.id));
        } else if !ids.contains(parent.as_str()) {
            problems.push(format!(
                "Unit '{}' references unknown parent unit '{}'",
                unit.id, parent
            ));
        }

        match parents.get(&unit.id).cloned() {
            Some(from_edge) if &from_edge != parent => problems.push(format!(
                "Unit '{}': parentUnitId '{}' disagrees with dependency from '{}'",
                unit.id, parent, from_edge
            )),
            _ => {
                parents.insert(unit.id.clone(), parent.clone());
            }
        }
    }

    parents
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::to_text;
    use crate::pipeline::{
        build_forest, Command, FileStream, PipelineCall, QueryQueue, QueryStatement, SftpLink,
        SftpTransfer, SqlConnection, Unzip, Zip, ZipFileStream,
    };

    const MINIMAL: &str = r#"
pipeline:
  id: p1
  name: nightly
  agentId: agent-1
units:
  - id: a
    type: Command
    position: { x: 0, y: 0 }
    policy: { timeoutMilliseconds: 1000 }
    config: { reference: c1 }
  - id: b
    type: QueryQueue
    position: { x: 0, y: 100 }
    policy: { timeoutMilliseconds: 1000 }
    config: { reference: q1 }
dependencies:
  - { from: a, to: b }
"#;

    fn problems_of(text: &str) -> Vec<String> {
        match from_text(text) {
            Err(MerlinError::MalformedDocument { errors }) => errors,
            other => panic!("Expected MalformedDocument, got {:?}", other),
        }
    }

    fn policy(timeout: i64) -> ExecutionPolicy {
        ExecutionPolicy {
            timeout_milliseconds: timeout,
            ..Default::default()
        }
    }

    fn resolved_pipeline() -> (Pipeline, Vec<PipelineUnit>) {
        let pipeline = Pipeline {
            id: "p1".into(),
            name: "nightly".into(),
            description: Some("All runner kinds".into()),
            agent_id: Some("agent-1".into()),
            abort_on_timeout: true,
            disposable: true,
            ..Default::default()
        };

        let base = |id: &str, parent: Option<&str>| PipelineUnit {
            id: id.into(),
            pipeline_id: "p1".into(),
            parent_unit_id: parent.map(String::from),
            policy: ExecutionPolicy {
                retry_count: 2,
                retry_after_milliseconds: 250,
                timeout_milliseconds: 30_000,
                continue_on_error: true,
                abort_on_error: false,
                abort_on_timeout: true,
            },
            pos_x: 12.5,
            pos_y: -3.25,
            ..Default::default()
        };

        let mut command = base("u-command", None);
        command.command_id = Some("c1".into());
        command.command = Some(Command {
            id: "c1".into(),
            name: Some("extract".into()),
            target: "/opt/extract.sh".into(),
            args: Some("--full".into()),
            working_directory: Some("/opt".into()),
            raw_script: false,
            instant: true,
            return_output: true,
            return_output_type: Some("text".into()),
        });

        let mut queue = base("u-queue", Some("u-command"));
        queue.query_queue_id = Some("q1".into());
        queue.query_queue = Some(QueryQueue {
            id: "q1".into(),
            name: Some("load".into()),
            statements: vec![QueryStatement {
                id: "st1".into(),
                order: 1,
                statement: "SELECT * FROM orders".into(),
                output_path: Some("/data/orders.csv".into()),
                return_output: false,
                separator: Some(";".into()),
                chunk_size: Some(10_000),
                encoding: Some("UTF-8".into()),
                date_format: Some("%Y-%m-%d".into()),
                sql_connection: Some(SqlConnection {
                    id: "conn1".into(),
                    name: "warehouse".into(),
                    driver: "postgres".into(),
                    connection_string: "postgres://warehouse/db".into(),
                }),
            }],
        });

        let link = SftpLink {
            id: "l1".into(),
            name: "partner".into(),
            server: "sftp.example.com".into(),
            port: 2222,
            user: "merlin".into(),
        };
        let stream = FileStream {
            input: "/data/orders.csv".into(),
            output: "/incoming/orders.csv".into(),
            return_output: true,
        };

        let mut upload = base("u-upload", Some("u-queue"));
        upload.sftp_uploader_id = Some("up1".into());
        upload.sftp_uploader = Some(SftpTransfer {
            id: "up1".into(),
            name: Some("push".into()),
            link: Some(link.clone()),
            file_streams: vec![stream.clone()],
        });

        let mut download = base("u-download", Some("u-command"));
        download.sftp_downloader_id = Some("down1".into());
        download.sftp_downloader = Some(SftpTransfer {
            id: "down1".into(),
            name: Some("pull".into()),
            link: Some(link),
            file_streams: vec![stream.clone()],
        });

        let mut zip = base("u-zip", Some("u-download"));
        zip.zip_id = Some("z1".into());
        zip.zip = Some(Zip {
            id: "z1".into(),
            name: Some("pack".into()),
            output_name: Some("orders.zip".into()),
            output_path: Some("/archive".into()),
            file_streams: vec![ZipFileStream {
                input: "/incoming".into(),
                wildcard_expression: Some("*.csv".into()),
            }],
        });

        let mut unzip = base("u-unzip", Some("u-zip"));
        unzip.unzip_id = Some("uz1".into());
        unzip.unzip = Some(Unzip {
            id: "uz1".into(),
            name: Some("unpack".into()),
            input: Some("/archive/orders.zip".into()),
            output: Some("/restore".into()),
            file_streams: vec![stream],
        });

        let mut call = base("u-call", Some("u-unzip"));
        call.call_pipeline_id = Some("p2".into());
        call.call_pipeline = Some(PipelineCall {
            id: "p2".into(),
            name: Some("cleanup".into()),
            description: Some("Removes temporary files".into()),
        });

        (pipeline, vec![command, queue, upload, download, zip, unzip, call])
    }

    #[test]
    fn test_minimal_document() {
        let snapshot = from_text(MINIMAL).unwrap();

        assert_eq!(snapshot.pipeline.name, "nightly");
        assert_eq!(snapshot.units.len(), 2);
        assert_eq!(snapshot.units[0].command_id.as_deref(), Some("c1"));
        assert_eq!(snapshot.units[1].parent_unit_id.as_deref(), Some("a"));
        assert_eq!(snapshot.units[1].pipeline_id, "p1");
        assert!(snapshot.units[1].query_queue.is_none());

        let forest = build_forest(&snapshot.units);
        assert_eq!(forest.count_units(), 2);
        assert_eq!(forest.max_depth(), 2);
    }

    #[test]
    fn test_round_trip_all_runner_types() {
        let (pipeline, units) = resolved_pipeline();

        let text = to_text(&pipeline, &units).unwrap();
        let snapshot = from_text(&text).unwrap();

        assert_eq!(snapshot.pipeline, pipeline);
        assert_eq!(snapshot.units, units);
    }

    #[test]
    fn test_round_trip_keeps_ids_edges_and_types_when_unresolved() {
        let (pipeline, mut units) = resolved_pipeline();
        for unit in &mut units {
            unit.command = None;
            unit.zip = None;
        }

        let snapshot = from_text(&to_text(&pipeline, &units).unwrap()).unwrap();

        for (before, after) in units.iter().zip(&snapshot.units) {
            assert_eq!(before.id, after.id);
            assert_eq!(before.parent_unit_id, after.parent_unit_id);
            assert_eq!(before.runner_type().unwrap(), after.runner_type().unwrap());
        }
        assert!(snapshot.units[0].command.is_none());
        assert!(snapshot.units[1].query_queue.is_some());
    }

    #[test]
    fn test_export_twice_imports_equal() {
        let (pipeline, units) = resolved_pipeline();

        let first = from_text(&to_text(&pipeline, &units).unwrap()).unwrap();
        let second = from_text(&to_text(&pipeline, &units).unwrap()).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_units_section() {
        let problems = problems_of(
            r#"
pipeline:
  name: nightly
  agentId: agent-1
"#,
        );

        assert_eq!(problems, vec!["Missing `units` section"]);
    }

    #[test]
    fn test_problems_are_collected_not_fail_fast() {
        let problems = problems_of(
            r#"
pipeline:
  description: no name here
units:
  - id: a
    type: Shell
    position: { x: 0, y: 0 }
  - type: Command
    position: { x: 0, y: 0 }
    policy: {}
    config: { reference: c1 }
  - id: c
    type: Zip
    parentUnitId: ghost
    position: { x: 0, y: 0 }
    policy: {}
    config: { reference: z1 }
dependencies:
  - { from: a, to: nowhere }
"#,
        );

        let expected = [
            "Pipeline `name` is required",
            "Pipeline `agentId` is required",
            "Unit 'a': unknown runner type 'Shell'",
            "Unit 'a': `policy` block is required",
            "Unit #2: `id` is required",
            "Dependency 'a' -> 'nowhere' references unknown unit 'nowhere'",
            "Unit 'c' references unknown parent unit 'ghost'",
        ];
        for message in expected {
            assert!(problems.iter().any(|p| p == message), "missing {:?} in {:#?}", message, problems);
        }
        assert_eq!(problems.len(), expected.len());
    }

    #[test]
    fn test_conflicting_parents() {
        let problems = problems_of(
            r#"
pipeline: { name: p, agentId: a1 }
units:
  - { id: a, type: Command, position: { x: 0, y: 0 }, policy: {}, config: { reference: c1 } }
  - { id: b, type: Command, position: { x: 0, y: 0 }, policy: {}, config: { reference: c2 } }
  - { id: c, type: Command, parentUnitId: a, position: { x: 0, y: 0 }, policy: {}, config: { reference: c3 } }
dependencies:
  - { from: b, to: c }
  - { from: a, to: b }
  - { from: c, to: b }
"#,
        );

        assert_eq!(
            problems,
            vec![
                "Unit 'b' has more than one parent in `dependencies` ('a' and 'c')",
                "Unit 'c': parentUnitId 'a' disagrees with dependency from 'b'",
            ]
        );
    }

    #[test]
    fn test_numeric_ids_are_accepted() {
        let text = MINIMAL.replace("config: { reference: q1 }", "config: { reference: 1042 }");
        let snapshot = from_text(&text).unwrap();

        assert_eq!(snapshot.units[1].query_queue_id.as_deref(), Some("1042"));
    }

    #[test]
    fn test_parent_from_either_source() {
        let text = MINIMAL.replace("dependencies:\n  - { from: a, to: b }\n", "")
            .replace("    type: QueryQueue\n", "    type: QueryQueue\n    parentUnitId: a\n");
        let snapshot = from_text(&text).unwrap();
        assert_eq!(snapshot.units[1].parent_unit_id.as_deref(), Some("a"));

        let edges_only = MINIMAL.to_string();
        let snapshot = from_text(&edges_only).unwrap();
        assert_eq!(snapshot.units[1].parent_unit_id.as_deref(), Some("a"));
    }

    #[test]
    fn test_duplicate_ids_and_cycles() {
        let problems = problems_of(
            r#"
pipeline: { name: p, agentId: a1 }
units:
  - { id: a, type: Command, position: { x: 0, y: 0 }, policy: {}, config: { reference: c1 } }
  - { id: a, type: Command, position: { x: 0, y: 0 }, policy: {}, config: { reference: c2 } }
"#,
        );
        assert_eq!(problems, vec!["Duplicate unit id: 'a'"]);

        let problems = problems_of(
            r#"
pipeline: { name: p, agentId: a1 }
units:
  - { id: x, parentUnitId: y, type: Command, position: { x: 0, y: 0 }, policy: {}, config: { reference: c1 } }
  - { id: y, parentUnitId: x, type: Command, position: { x: 0, y: 0 }, policy: {}, config: { reference: c2 } }
"#,
        );
        assert_eq!(problems, vec!["Parent cycle between units: x, y"]);
    }

    #[test]
    fn test_cycles_reported_with_other_problems() {
        let problems = problems_of(
            r#"
pipeline: { name: p }
units:
  - { id: root, type: Command, position: { x: 0, y: 0 }, policy: {}, config: { reference: c0 } }
  - { id: x, type: Command, position: { x: 0, y: 0 }, policy: {}, config: { reference: c1 } }
  - { id: y, parentUnitId: x, type: Command, position: { x: 0, y: 0 }, policy: {}, config: { reference: c2 } }
  - { id: w, parentUnitId: root, type: Command, position: { x: 0, y: 0 }, config: { reference: c4 } }
  - { id: z, parentUnitId: z, type: Command, position: { x: 0, y: 0 }, policy: {}, config: { reference: c3 } }
dependencies:
  - { from: y, to: x }
"#,
        );

        assert_eq!(
            problems,
            vec![
                "Pipeline `agentId` is required",
                "Unit 'w': `policy` block is required",
                "Unit 'z' cannot be its own parent",
                "Parent cycle between units: x, y",
            ]
        );
    }

    #[test]
    fn test_not_a_document() {
        assert_eq!(problems_of("").len(), 1);
        assert_eq!(problems_of("- just\n- a list\n").len(), 1);
        assert!(problems_of("pipeline: [unclosed")[0].starts_with("Document is not valid YAML"));
    }

    #[test]
    fn test_missing_reference_and_bad_config() {
        let problems = problems_of(
            r#"
pipeline: { name: p, agentId: a1 }
units:
  - { id: a, type: Command, position: { x: 0, y: 0 }, policy: {}, config: { reference: "" } }
  - { id: b, type: Zip, position: { x: 0, y: 0 }, policy: {} }
  - { id: c, type: Unzip, position: { x: 0, y: 0 }, policy: {}, config: [1, 2] }
"#,
        );

        assert_eq!(problems.len(), 3);
        assert_eq!(problems[0], "Unit 'a': `config.reference` is required");
        assert_eq!(problems[1], "Unit 'b': `config` block is required");
        assert!(problems[2].starts_with("Unit 'c': invalid Unzip `config`"));
    }
}
