//! The layout engine: walks one process container, assigns every node a
//! deterministic position and size, and appends BPMNShape/BPMNEdge records to
//! the document's plane container (creating diagram and plane when absent).

use std::collections::BTreeMap;

use log::info;
use once_cell::sync::Lazy;
use thiserror::Error;

use crate::config::LayoutConfig;
use crate::model::{ElementKind, SequenceFlow, NS_DC, NS_DD, NS_DI, NS_MODEL};
use crate::xml::{Document, Element};

/// Suffix appended to an element id to form its visual record id.
const RECORD_ID_SUFFIX: &str = "_di";

const DIAGRAM_ID: &str = "BPMNDiagram_1";
const PLANE_ID: &str = "BPMNPlane_1";
const DEFAULT_PROCESS_ID: &str = "Process_1";

/// Waypoints are a fixed placeholder, not derived from the connected shapes.
/// Downstream modelers re-route edges on first open; kept for compatibility.
const PLACEHOLDER_WAYPOINTS: [(i32, i32); 2] = [(100, 100), (200, 100)];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: i32,
    pub height: i32,
    pub expanded: bool,
}

const FALLBACK_DIMENSIONS: Dimensions = Dimensions {
    width: 100,
    height: 80,
    expanded: false,
};

/// Fixed kind -> size policy. Data, not a type hierarchy; kinds outside the
/// table fall back to 100x80.
static DIMENSION_POLICY: Lazy<BTreeMap<ElementKind, Dimensions>> = Lazy::new(|| {
    let sized = |width, height| Dimensions {
        width,
        height,
        expanded: false,
    };
    BTreeMap::from([
        (ElementKind::StartEvent, sized(36, 36)),
        (ElementKind::EndEvent, sized(36, 36)),
        (ElementKind::IntermediateThrowEvent, sized(36, 36)),
        (ElementKind::IntermediateCatchEvent, sized(36, 36)),
        (ElementKind::BoundaryEvent, sized(36, 36)),
        (ElementKind::ServiceTask, sized(100, 80)),
        (ElementKind::UserTask, sized(100, 80)),
        (ElementKind::SendTask, sized(100, 80)),
        (ElementKind::ReceiveTask, sized(100, 80)),
        (ElementKind::BusinessRuleTask, sized(100, 80)),
        (ElementKind::CallActivity, sized(130, 90)),
        (ElementKind::ExclusiveGateway, sized(50, 50)),
        (ElementKind::ParallelGateway, sized(50, 50)),
        (ElementKind::InclusiveGateway, sized(50, 50)),
        (
            ElementKind::SubProcess,
            Dimensions {
                width: 350,
                height: 300,
                expanded: true,
            },
        ),
        (ElementKind::Task, sized(100, 80)),
    ])
});

/// Pure table lookup; every kind resolves to some dimensions.
pub fn lookup_dimensions(kind: &ElementKind) -> Dimensions {
    DIMENSION_POLICY
        .get(kind)
        .copied()
        .unwrap_or(FALLBACK_DIMENSIONS)
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GenerateError {
    #[error("no process found in document")]
    NoProcessFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationResult {
    pub shapes: usize,
    pub edges: usize,
}

/// One rectangle per node, tagged with the owning element's id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeRecord {
    pub element_id: String,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub expanded: Option<bool>,
}

impl ShapeRecord {
    fn into_element(self) -> Element {
        let mut shape = Element::new(NS_DI, "BPMNShape");
        shape.set_attr("id", &format!("{}{RECORD_ID_SUFFIX}", self.element_id));
        shape.set_attr("bpmnElement", &self.element_id);
        if let Some(expanded) = self.expanded {
            shape.set_attr("isExpanded", if expanded { "true" } else { "false" });
        }
        let mut bounds = Element::new(NS_DC, "Bounds");
        bounds.set_attr("x", &self.x.to_string());
        bounds.set_attr("y", &self.y.to_string());
        bounds.set_attr("width", &self.width.to_string());
        bounds.set_attr("height", &self.height.to_string());
        shape.children.push(bounds);
        shape
    }
}

/// One polyline per connection, tagged with the owning flow's id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeRecord {
    pub flow_id: String,
    pub waypoints: Vec<(i32, i32)>,
}

impl EdgeRecord {
    fn into_element(self) -> Element {
        let mut edge = Element::new(NS_DI, "BPMNEdge");
        edge.set_attr("id", &format!("{}{RECORD_ID_SUFFIX}", self.flow_id));
        edge.set_attr("bpmnElement", &self.flow_id);
        for (x, y) in self.waypoints {
            let mut waypoint = Element::new(NS_DD, "waypoint");
            waypoint.set_attr("x", &x.to_string());
            waypoint.set_attr("y", &y.to_string());
            edge.children.push(waypoint);
        }
        edge
    }
}

/// Bare element kind with namespace qualification stripped.
pub fn resolve_element_kind(element: &Element) -> ElementKind {
    ElementKind::from_tag(&element.name.local)
}

/// Find the diagram/plane containers, creating whichever is missing. Will not
/// create a second diagram or plane, but does not deduplicate shape or edge
/// records inside an existing plane.
pub fn locate_or_create_plane(doc: &mut Document) -> &mut Element {
    let process_id = doc
        .root
        .descendant(NS_MODEL, "process")
        .and_then(|process| process.attr("id"))
        .unwrap_or(DEFAULT_PROCESS_ID)
        .to_string();

    if doc.root.descendant(NS_DI, "BPMNDiagram").is_none() {
        let mut diagram = Element::new(NS_DI, "BPMNDiagram");
        diagram.set_attr("id", DIAGRAM_ID);
        doc.root.children.push(diagram);
    }
    let diagram = doc
        .root
        .descendant_mut(NS_DI, "BPMNDiagram")
        .expect("diagram container present after find-or-create");

    if diagram.descendant(NS_DI, "BPMNPlane").is_none() {
        let mut plane = Element::new(NS_DI, "BPMNPlane");
        plane.set_attr("id", PLANE_ID);
        plane.set_attr("bpmnElement", &process_id);
        diagram.children.push(plane);
    }
    diagram
        .descendant_mut(NS_DI, "BPMNPlane")
        .expect("plane container present after find-or-create")
}

/// One deterministic pass over the process's direct children: shapes for the
/// nodes in traversal order, then edges for the recorded sequence flows.
///
/// The only fatal condition is a document without a process container; that
/// path mutates nothing. Anonymous children are skipped, unknown kinds fall
/// back to default dimensions. Re-running on already-annotated output appends
/// duplicate records rather than updating in place.
pub fn generate(
    doc: &mut Document,
    config: &LayoutConfig,
) -> Result<GenerationResult, GenerateError> {
    let process = doc
        .root
        .descendant(NS_MODEL, "process")
        .ok_or(GenerateError::NoProcessFound)?;
    info!(
        "processing {} ({})",
        process.attr("id").unwrap_or(DEFAULT_PROCESS_ID),
        process.attr("name").unwrap_or_default()
    );

    let mut shapes: Vec<ShapeRecord> = Vec::new();
    let mut flows: Vec<SequenceFlow> = Vec::new();
    let mut index = 0usize;

    for child in &process.children {
        let Some(id) = child.attr("id") else {
            continue;
        };
        if id.is_empty() {
            continue;
        }

        let kind = resolve_element_kind(child);
        if kind == ElementKind::SequenceFlow {
            flows.push(SequenceFlow {
                id: id.to_string(),
                source: child.attr("sourceRef").map(str::to_string),
                target: child.attr("targetRef").map(str::to_string),
            });
            continue;
        }

        let (x, y) = config.position(index, 0, false);
        let dims = lookup_dimensions(&kind);
        info!(
            "shape {id}{RECORD_ID_SUFFIX}: {} at ({x}, {y})",
            kind.as_str()
        );
        shapes.push(ShapeRecord {
            element_id: id.to_string(),
            x,
            y,
            width: dims.width,
            height: dims.height,
            expanded: dims.expanded.then_some(true),
        });
        index += 1;
    }

    let result = GenerationResult {
        shapes: shapes.len(),
        edges: flows.len(),
    };

    let plane = locate_or_create_plane(doc);
    for shape in shapes {
        plane.children.push(shape.into_element());
    }
    for flow in flows {
        info!(
            "edge {}{RECORD_ID_SUFFIX}: {} -> {}",
            flow.id,
            flow.source.as_deref().unwrap_or("?"),
            flow.target.as_deref().unwrap_or("?")
        );
        let edge = EdgeRecord {
            flow_id: flow.id,
            waypoints: PLACEHOLDER_WAYPOINTS.to_vec(),
        };
        plane.children.push(edge.into_element());
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINEAR: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<bpmn:definitions xmlns:bpmn="http://www.omg.org/spec/BPMN/20100524/MODEL" id="Defs_1">
  <bpmn:process id="Process_Order" name="Order">
    <bpmn:startEvent id="Start_1" />
    <bpmn:serviceTask id="Task_1" name="Charge card" />
    <bpmn:endEvent id="End_1" />
    <bpmn:sequenceFlow id="Flow_1" sourceRef="Start_1" targetRef="Task_1" />
    <bpmn:sequenceFlow id="Flow_2" sourceRef="Task_1" targetRef="End_1" />
  </bpmn:process>
</bpmn:definitions>"#;

    fn parse(input: &str) -> Document {
        Document::parse(input).unwrap()
    }

    fn plane(doc: &Document) -> &Element {
        doc.root.descendant(NS_DI, "BPMNPlane").unwrap()
    }

    fn bounds(shape: &Element) -> (i32, i32, i32, i32) {
        let bounds = shape.descendant(NS_DC, "Bounds").unwrap();
        let get = |name: &str| bounds.attr(name).unwrap().parse::<i32>().unwrap();
        (get("x"), get("y"), get("width"), get("height"))
    }

    #[test]
    fn dimension_policy_matches_table() {
        let start = lookup_dimensions(&ElementKind::StartEvent);
        assert_eq!((start.width, start.height, start.expanded), (36, 36, false));
        let call = lookup_dimensions(&ElementKind::CallActivity);
        assert_eq!((call.width, call.height), (130, 90));
        let gateway = lookup_dimensions(&ElementKind::ParallelGateway);
        assert_eq!((gateway.width, gateway.height), (50, 50));
        let sub = lookup_dimensions(&ElementKind::SubProcess);
        assert_eq!((sub.width, sub.height, sub.expanded), (350, 300, true));
    }

    #[test]
    fn unknown_kinds_fall_back() {
        let dims = lookup_dimensions(&ElementKind::Other("adHocSubProcess".to_string()));
        assert_eq!(dims, FALLBACK_DIMENSIONS);
        assert_eq!(
            lookup_dimensions(&ElementKind::Other("adHocSubProcess".to_string())),
            dims
        );
    }

    #[test]
    fn generates_shapes_and_edges_for_linear_process() {
        let mut doc = parse(LINEAR);
        let result = generate(&mut doc, &LayoutConfig::default()).unwrap();
        assert_eq!(result, GenerationResult { shapes: 3, edges: 2 });

        let plane = plane(&doc);
        let shapes: Vec<&Element> = plane
            .children
            .iter()
            .filter(|child| child.is(NS_DI, "BPMNShape"))
            .collect();
        assert_eq!(shapes.len(), 3);

        assert_eq!(shapes[0].attr("id"), Some("Start_1_di"));
        assert_eq!(shapes[0].attr("bpmnElement"), Some("Start_1"));
        assert_eq!(bounds(shapes[0]), (160, 100, 36, 36));
        assert_eq!(bounds(shapes[1]), (310, 100, 100, 80));
        assert_eq!(shapes[2].attr("id"), Some("End_1_di"));
        assert_eq!(bounds(shapes[2]), (460, 100, 36, 36));

        let edges: Vec<&Element> = plane
            .children
            .iter()
            .filter(|child| child.is(NS_DI, "BPMNEdge"))
            .collect();
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0].attr("id"), Some("Flow_1_di"));
        assert_eq!(edges[0].attr("bpmnElement"), Some("Flow_1"));
        for edge in &edges {
            let waypoints: Vec<(&str, &str)> = edge
                .children
                .iter()
                .filter(|child| child.is(NS_DD, "waypoint"))
                .map(|wp| (wp.attr("x").unwrap(), wp.attr("y").unwrap()))
                .collect();
            assert_eq!(waypoints, vec![("100", "100"), ("200", "100")]);
        }
    }

    #[test]
    fn shapes_precede_edges_in_plane_order() {
        let mut doc = parse(LINEAR);
        generate(&mut doc, &LayoutConfig::default()).unwrap();
        let kinds: Vec<&str> = plane(&doc)
            .children
            .iter()
            .map(|child| child.name.local.as_str())
            .collect();
        assert_eq!(
            kinds,
            vec!["BPMNShape", "BPMNShape", "BPMNShape", "BPMNEdge", "BPMNEdge"]
        );
    }

    #[test]
    fn missing_process_is_fatal_and_mutates_nothing() {
        let mut doc = parse(
            r#"<bpmn:definitions xmlns:bpmn="http://www.omg.org/spec/BPMN/20100524/MODEL" id="Defs_1" />"#,
        );
        let before = doc.clone();
        let err = generate(&mut doc, &LayoutConfig::default()).unwrap_err();
        assert_eq!(err, GenerateError::NoProcessFound);
        assert_eq!(doc, before);
    }

    #[test]
    fn existing_diagram_and_plane_are_reused() {
        let annotated = r#"<?xml version="1.0" encoding="UTF-8"?>
<bpmn:definitions xmlns:bpmn="http://www.omg.org/spec/BPMN/20100524/MODEL"
    xmlns:bpmndi="http://www.omg.org/spec/BPMN/20100524/DI" id="Defs_1">
  <bpmn:process id="Process_1">
    <bpmn:startEvent id="Start_1" />
  </bpmn:process>
  <bpmndi:BPMNDiagram id="Diagram_Existing">
    <bpmndi:BPMNPlane id="Plane_Existing" bpmnElement="Process_1" />
  </bpmndi:BPMNDiagram>
</bpmn:definitions>"#;
        let mut doc = parse(annotated);
        generate(&mut doc, &LayoutConfig::default()).unwrap();

        let diagrams: Vec<&Element> = doc
            .root
            .children
            .iter()
            .filter(|child| child.is(NS_DI, "BPMNDiagram"))
            .collect();
        assert_eq!(diagrams.len(), 1);
        assert_eq!(diagrams[0].attr("id"), Some("Diagram_Existing"));

        let plane = plane(&doc);
        assert_eq!(plane.attr("id"), Some("Plane_Existing"));
        assert_eq!(plane.children.len(), 1);
        assert_eq!(plane.children[0].attr("id"), Some("Start_1_di"));
    }

    #[test]
    fn plane_is_created_when_absent() {
        let mut doc = parse(LINEAR);
        generate(&mut doc, &LayoutConfig::default()).unwrap();
        let diagram = doc.root.descendant(NS_DI, "BPMNDiagram").unwrap();
        assert_eq!(diagram.attr("id"), Some("BPMNDiagram_1"));
        let plane = plane(&doc);
        assert_eq!(plane.attr("id"), Some("BPMNPlane_1"));
        assert_eq!(plane.attr("bpmnElement"), Some("Process_Order"));
    }

    #[test]
    fn anonymous_children_are_skipped_without_advancing_the_index() {
        let mut doc = parse(
            r#"<bpmn:definitions xmlns:bpmn="http://www.omg.org/spec/BPMN/20100524/MODEL" id="Defs_1">
  <bpmn:process id="Process_1">
    <bpmn:startEvent id="Start_1" />
    <bpmn:userTask />
    <bpmn:serviceTask id="" />
    <bpmn:endEvent id="End_1" />
  </bpmn:process>
</bpmn:definitions>"#,
        );
        let result = generate(&mut doc, &LayoutConfig::default()).unwrap();
        assert_eq!(result.shapes, 2);

        let plane = plane(&doc);
        // End_1 takes index 1, not 3: the skipped elements never counted.
        assert_eq!(plane.children[1].attr("id"), Some("End_1_di"));
        assert_eq!(bounds(&plane.children[1]).0, 310);
    }

    #[test]
    fn subprocess_shape_carries_expanded_flag() {
        let mut doc = parse(
            r#"<bpmn:definitions xmlns:bpmn="http://www.omg.org/spec/BPMN/20100524/MODEL" id="Defs_1">
  <bpmn:process id="Process_1">
    <bpmn:subProcess id="Sub_1" />
    <bpmn:serviceTask id="Task_1" />
  </bpmn:process>
</bpmn:definitions>"#,
        );
        generate(&mut doc, &LayoutConfig::default()).unwrap();
        let plane = plane(&doc);
        assert_eq!(plane.children[0].attr("isExpanded"), Some("true"));
        assert_eq!(bounds(&plane.children[0]), (160, 100, 350, 300));
        assert_eq!(plane.children[1].attr("isExpanded"), None);
    }

    #[test]
    fn unknown_node_kinds_get_fallback_dimensions() {
        let mut doc = parse(
            r#"<bpmn:definitions xmlns:bpmn="http://www.omg.org/spec/BPMN/20100524/MODEL" id="Defs_1">
  <bpmn:process id="Process_1">
    <bpmn:adHocSubProcess id="AdHoc_1" />
  </bpmn:process>
</bpmn:definitions>"#,
        );
        let result = generate(&mut doc, &LayoutConfig::default()).unwrap();
        assert_eq!(result.shapes, 1);
        assert_eq!(bounds(&plane(&doc).children[0]), (160, 100, 100, 80));
    }

    #[test]
    fn rerun_appends_duplicate_records() {
        let mut doc = parse(LINEAR);
        generate(&mut doc, &LayoutConfig::default()).unwrap();
        generate(&mut doc, &LayoutConfig::default()).unwrap();
        assert_eq!(plane(&doc).children.len(), 10);
    }

    #[test]
    fn repeated_generation_is_deterministic() {
        let mut first = parse(LINEAR);
        let mut second = parse(LINEAR);
        generate(&mut first, &LayoutConfig::default()).unwrap();
        generate(&mut second, &LayoutConfig::default()).unwrap();
        assert_eq!(first.to_xml(), second.to_xml());
    }
}
